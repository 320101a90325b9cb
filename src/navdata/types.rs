use serde::{Deserialize, Serialize};
use std::fmt;

/// Geographic position in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub long: f64,
}

impl Coordinates {
    pub fn new(lat: f64, long: f64) -> Self {
        Self { lat, long }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixKind {
    Waypoint,
    VhfNavaid,
    NdbNavaid,
    Airport,
    Runway,
}

/// A point a leg can terminate at
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fix {
    pub ident: String,
    pub database_id: String,
    pub location: Coordinates,
    #[serde(default = "default_fix_kind")]
    pub kind: FixKind,
}

fn default_fix_kind() -> FixKind {
    FixKind::Waypoint
}

impl Fix {
    pub fn waypoint(ident: &str, database_id: &str, location: Coordinates) -> Self {
        Self {
            ident: ident.to_string(),
            database_id: database_id.to_string(),
            location,
            kind: FixKind::Waypoint,
        }
    }

    /// Same database entry, ignoring position refreshes
    pub fn same_as(&self, other: &Fix) -> bool {
        self.database_id == other.database_id
    }
}

/// ARINC 424 path terminators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LegType {
    AF,
    CA,
    CD,
    CF,
    CI,
    CR,
    DF,
    FA,
    FC,
    FD,
    FM,
    HA,
    HF,
    HM,
    IF,
    PI,
    RF,
    TF,
    VA,
    VD,
    VI,
    VM,
    VR,
}

impl fmt::Display for LegType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnDirection {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AltitudeDescriptor {
    At,
    AtOrAbove,
    AtOrBelow,
    Between,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AltitudeConstraint {
    pub descriptor: AltitudeDescriptor,
    pub altitude1: f64,
    #[serde(default)]
    pub altitude2: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeedDescriptor {
    Mandatory,
    Minimum,
    Maximum,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedConstraint {
    pub descriptor: SpeedDescriptor,
    pub speed: f64,
}

/// One leg of a procedure as stored in the database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcedureLeg {
    #[serde(rename = "type")]
    pub leg_type: LegType,
    #[serde(default)]
    pub waypoint: Option<Fix>,
    #[serde(default)]
    pub course: Option<f64>,
    #[serde(default)]
    pub length: Option<f64>,
    #[serde(default)]
    pub turn_direction: Option<TurnDirection>,
    #[serde(default)]
    pub altitude: Option<AltitudeConstraint>,
    #[serde(default)]
    pub speed: Option<SpeedConstraint>,
    #[serde(default)]
    pub overfly: bool,
}

impl ProcedureLeg {
    pub fn to_fix(leg_type: LegType, fix: Fix) -> Self {
        Self {
            leg_type,
            waypoint: Some(fix),
            course: None,
            length: None,
            turn_direction: None,
            altitude: None,
            speed: None,
            overfly: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcedureTransition {
    pub ident: String,
    pub database_id: String,
    pub legs: Vec<ProcedureLeg>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcedureKind {
    Departure,
    Arrival,
    Approach,
}

impl fmt::Display for ProcedureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcedureKind::Departure => write!(f, "departure"),
            ProcedureKind::Arrival => write!(f, "arrival"),
            ProcedureKind::Approach => write!(f, "approach"),
        }
    }
}

/// SID, STAR or approach. Unused parts stay empty for the kinds that
/// don't have them (approaches have `vias` and `missed_legs` instead of
/// runway/enroute transitions).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Procedure {
    pub ident: String,
    pub database_id: String,
    pub kind: ProcedureKind,
    #[serde(default)]
    pub runway_ident: Option<String>,
    #[serde(default)]
    pub runway_transitions: Vec<ProcedureTransition>,
    #[serde(default)]
    pub legs: Vec<ProcedureLeg>,
    #[serde(default)]
    pub enroute_transitions: Vec<ProcedureTransition>,
    #[serde(default)]
    pub vias: Vec<ProcedureTransition>,
    #[serde(default)]
    pub missed_legs: Vec<ProcedureLeg>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Runway {
    pub ident: String,
    pub database_id: String,
    pub threshold: Coordinates,
    pub bearing: f64,
    #[serde(default)]
    pub length: f64,
}

impl Runway {
    pub fn fix(&self) -> Fix {
        Fix {
            ident: self.ident.clone(),
            database_id: self.database_id.clone(),
            location: self.threshold,
            kind: FixKind::Runway,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Airport {
    pub ident: String,
    pub database_id: String,
    pub location: Coordinates,
    #[serde(default)]
    pub elevation: f64,
    #[serde(default)]
    pub runways: Vec<Runway>,
    #[serde(default)]
    pub departures: Vec<Procedure>,
    #[serde(default)]
    pub arrivals: Vec<Procedure>,
    #[serde(default)]
    pub approaches: Vec<Procedure>,
}

impl Airport {
    pub fn fix(&self) -> Fix {
        Fix {
            ident: self.ident.clone(),
            database_id: self.database_id.clone(),
            location: self.location,
            kind: FixKind::Airport,
        }
    }

    pub fn runway(&self, ident: &str) -> Option<&Runway> {
        self.runways.iter().find(|r| r.ident == ident)
    }

    pub fn procedures(&self, kind: ProcedureKind) -> &[Procedure] {
        match kind {
            ProcedureKind::Departure => &self.departures,
            ProcedureKind::Arrival => &self.arrivals,
            ProcedureKind::Approach => &self.approaches,
        }
    }
}

/// Named airway as an ordered list of fixes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Airway {
    pub ident: String,
    pub database_id: String,
    pub fixes: Vec<Fix>,
}

impl Airway {
    pub fn position_of(&self, fix: &Fix) -> Option<usize> {
        self.fixes.iter().position(|f| f.same_as(fix))
    }
}
