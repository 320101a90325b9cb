use serde::{Deserialize, Serialize};
use std::fmt;

use super::segments::SegmentKind;
use crate::error::{FlightPlanError, Result};
use crate::navdata::{
    Airport, AltitudeConstraint, AltitudeDescriptor, Coordinates, Fix, FixKind, LegType,
    ProcedureLeg, Runway, SpeedConstraint, TurnDirection,
};

const MIN_CONSTRAINT_ALTITUDE: f64 = -2_000.0;
const MAX_CONSTRAINT_ALTITUDE: f64 = 45_000.0;
const MIN_CONSTRAINT_SPEED: f64 = 90.0;
const MAX_CONSTRAINT_SPEED: f64 = 399.0;

pub const TURNING_POINT_IDENT: &str = "T-P";

/// Which profile a constraint applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaypointConstraintType {
    #[default]
    Unknown,
    Climb,
    Descent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HoldType {
    Computed,
    Database,
    Pilot,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldData {
    pub inbound_magnetic_course: f64,
    pub turn_direction: TurnDirection,
    #[serde(default)]
    pub distance: Option<f64>,
    #[serde(default)]
    pub time: Option<f64>,
    pub hold_type: HoldType,
}

/// Cruise step-climb (or step-descent) annotation on a leg
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CruiseStep {
    pub to_altitude: f64,
}

/// Geometry filled in by the guidance layer
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegCalculations {
    pub distance: f64,
    pub cumulative_distance: f64,
    pub bearing: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegFlags {
    pub direct_to_turning_point: bool,
    pub direct_to_abeam: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegDefinition {
    pub leg_type: LegType,
    pub waypoint: Option<Fix>,
    pub course: Option<f64>,
    pub length: Option<f64>,
    pub turn_direction: Option<TurnDirection>,
    pub altitude: Option<AltitudeConstraint>,
    pub speed: Option<SpeedConstraint>,
    pub overfly: bool,
    pub airway: Option<String>,
}

impl LegDefinition {
    fn to_fix(leg_type: LegType, fix: Fix) -> Self {
        Self {
            leg_type,
            waypoint: Some(fix),
            course: None,
            length: None,
            turn_direction: None,
            altitude: None,
            speed: None,
            overfly: false,
            airway: None,
        }
    }
}

/// One terminated navigation leg.
///
/// `segment` is a non-owning back reference to the segment kind the leg
/// lives in; cloning into another segment goes through [`FlightPlanLeg::clone_for`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightPlanLeg {
    segment: SegmentKind,
    ident: String,
    annotation: String,
    definition: LegDefinition,
    flags: LegFlags,
    constraint_type: WaypointConstraintType,
    modified_hold: Option<HoldData>,
    default_hold: Option<HoldData>,
    cruise_step: Option<CruiseStep>,
    calculated: Option<LegCalculations>,
}

impl FlightPlanLeg {
    fn new(segment: SegmentKind, ident: String, annotation: String, definition: LegDefinition) -> Self {
        Self {
            segment,
            ident,
            annotation,
            definition,
            flags: LegFlags::default(),
            constraint_type: WaypointConstraintType::Unknown,
            modified_hold: None,
            default_hold: None,
            cruise_step: None,
            calculated: None,
        }
    }

    pub fn from_procedure_leg(
        segment: SegmentKind,
        leg: &ProcedureLeg,
        procedure_ident: &str,
        constraint_type: WaypointConstraintType,
    ) -> Self {
        let definition = LegDefinition {
            leg_type: leg.leg_type,
            waypoint: leg.waypoint.clone(),
            course: leg.course,
            length: leg.length,
            turn_direction: leg.turn_direction,
            altitude: leg.altitude,
            speed: leg.speed,
            overfly: leg.overfly,
            airway: None,
        };

        let mut new_leg = Self::new(
            segment,
            procedure_leg_ident(leg),
            procedure_ident.to_string(),
            definition,
        );
        new_leg.constraint_type = constraint_type;

        if new_leg.is_hx() {
            let hold = HoldData {
                inbound_magnetic_course: leg.course.unwrap_or(0.0),
                turn_direction: leg.turn_direction.unwrap_or(TurnDirection::Right),
                distance: leg.length,
                time: None,
                hold_type: HoldType::Database,
            };
            new_leg.default_hold = Some(hold);
        }

        new_leg
    }

    pub fn from_enroute_fix(segment: SegmentKind, fix: &Fix, airway: Option<&str>, leg_type: LegType) -> Self {
        let mut definition = LegDefinition::to_fix(leg_type, fix.clone());
        definition.airway = airway.map(str::to_string);

        Self::new(
            segment,
            fix.ident.clone(),
            airway.unwrap_or_default().to_string(),
            definition,
        )
    }

    /// Initial fix for the origin: the runway threshold if one is known, the
    /// airport reference point otherwise
    pub fn origin(segment: SegmentKind, airport: &Airport, runway: Option<&Runway>) -> Self {
        let fix = runway.map(Runway::fix).unwrap_or_else(|| airport.fix());
        Self::new(
            segment,
            fix.ident.clone(),
            airport.ident.clone(),
            LegDefinition::to_fix(LegType::IF, fix),
        )
    }

    pub fn destination(segment: SegmentKind, airport: &Airport, runway: Option<&Runway>) -> Self {
        let fix = runway.map(Runway::fix).unwrap_or_else(|| airport.fix());
        Self::new(
            segment,
            fix.ident.clone(),
            airport.ident.clone(),
            LegDefinition::to_fix(LegType::TF, fix),
        )
    }

    /// Synthetic start point of a direct-to at present position
    pub fn turning_point(segment: SegmentKind, ppos: Coordinates, true_track: f64) -> Self {
        let fix = Fix {
            ident: TURNING_POINT_IDENT.to_string(),
            database_id: TURNING_POINT_IDENT.to_string(),
            location: ppos,
            kind: FixKind::Waypoint,
        };
        let mut definition = LegDefinition::to_fix(LegType::IF, fix);
        definition.course = Some(true_track);

        let mut leg = Self::new(segment, TURNING_POINT_IDENT.to_string(), String::new(), definition);
        leg.flags.direct_to_turning_point = true;
        leg
    }

    pub fn direct_to(segment: SegmentKind, fix: &Fix) -> Self {
        Self::new(
            segment,
            fix.ident.clone(),
            String::new(),
            LegDefinition::to_fix(LegType::DF, fix.clone()),
        )
    }

    /// Point abeam a fix that a direct-to bypassed
    pub fn abeam(segment: SegmentKind, bypassed: &Fix, location: Coordinates) -> Self {
        let ident: String = format!("AB{}", bypassed.ident).chars().take(7).collect();
        let fix = Fix {
            ident: ident.clone(),
            database_id: format!("ABEAM-{}", bypassed.database_id),
            location,
            kind: FixKind::Waypoint,
        };

        let mut leg = Self::new(segment, ident, String::new(), LegDefinition::to_fix(LegType::TF, fix));
        leg.flags.direct_to_abeam = true;
        leg
    }

    pub fn manual_hold(segment: SegmentKind, fix: &Fix, hold: HoldData) -> Self {
        let mut definition = LegDefinition::to_fix(LegType::HM, fix.clone());
        definition.course = Some(hold.inbound_magnetic_course);
        definition.turn_direction = Some(hold.turn_direction);
        definition.length = hold.distance;

        Self::new(segment, fix.ident.clone(), String::new(), definition)
    }

    /// Deep copy re-parented to another segment
    pub fn clone_for(&self, segment: SegmentKind) -> Self {
        let mut leg = self.clone();
        leg.segment = segment;
        leg
    }

    pub fn segment(&self) -> SegmentKind {
        self.segment
    }

    pub fn ident(&self) -> &str {
        &self.ident
    }

    /// Originating procedure or airway
    pub fn annotation(&self) -> &str {
        &self.annotation
    }

    pub fn definition(&self) -> &LegDefinition {
        &self.definition
    }

    pub fn leg_type(&self) -> LegType {
        self.definition.leg_type
    }

    pub fn flags(&self) -> LegFlags {
        self.flags
    }

    pub fn constraint_type(&self) -> WaypointConstraintType {
        self.constraint_type
    }

    pub fn altitude_constraint(&self) -> Option<&AltitudeConstraint> {
        self.definition.altitude.as_ref()
    }

    pub fn speed_constraint(&self) -> Option<&SpeedConstraint> {
        self.definition.speed.as_ref()
    }

    pub fn overfly(&self) -> bool {
        self.definition.overfly
    }

    pub fn airway(&self) -> Option<&str> {
        self.definition.airway.as_deref()
    }

    pub fn cruise_step(&self) -> Option<&CruiseStep> {
        self.cruise_step.as_ref()
    }

    pub fn modified_hold(&self) -> Option<&HoldData> {
        self.modified_hold.as_ref()
    }

    pub fn default_hold(&self) -> Option<&HoldData> {
        self.default_hold.as_ref()
    }

    pub fn calculated(&self) -> Option<&LegCalculations> {
        self.calculated.as_ref()
    }

    pub fn set_calculated(&mut self, calculated: Option<LegCalculations>) {
        self.calculated = calculated;
    }

    pub fn termination_waypoint(&self) -> Option<&Fix> {
        self.definition.waypoint.as_ref()
    }

    /// Course, track or direct to a fix
    pub fn is_fx(&self) -> bool {
        matches!(self.leg_type(), LegType::CF | LegType::DF | LegType::TF)
    }

    pub fn is_hx(&self) -> bool {
        matches!(self.leg_type(), LegType::HA | LegType::HF | LegType::HM)
    }

    /// Manually terminated legs never connect to what follows
    pub fn is_vectors(&self) -> bool {
        matches!(self.leg_type(), LegType::FM | LegType::VM)
    }

    pub fn is_turning_point(&self) -> bool {
        self.flags.direct_to_turning_point
    }

    pub fn terminates_with_waypoint(&self, fix: &Fix) -> bool {
        self.termination_waypoint().is_some_and(|wpt| wpt.same_as(fix))
    }

    /// Same terminating fix, path terminator and originating procedure
    pub fn is_same_leg(&self, other: &FlightPlanLeg) -> bool {
        let same_fix = match (self.termination_waypoint(), other.termination_waypoint()) {
            (Some(a), Some(b)) => a.same_as(b),
            (None, None) => self.ident == other.ident,
            _ => false,
        };

        same_fix && self.leg_type() == other.leg_type() && self.annotation == other.annotation
    }

    /// Turns an initial fix into a direct track from whatever precedes it
    pub(crate) fn convert_to_track(&mut self) {
        if self.leg_type() == LegType::IF {
            self.definition.leg_type = LegType::TF;
        }
    }

    pub(crate) fn set_altitude_constraint(
        &mut self,
        constraint: Option<AltitudeConstraint>,
        constraint_type: WaypointConstraintType,
    ) -> Result<()> {
        if let Some(constraint) = &constraint {
            validate_altitude(constraint.altitude1)?;
            match (constraint.descriptor, constraint.altitude2) {
                (AltitudeDescriptor::Between, Some(lower)) => {
                    validate_altitude(lower)?;
                    if lower > constraint.altitude1 {
                        return Err(FlightPlanError::InvalidConstraint(format!(
                            "window lower limit {} above upper limit {}",
                            lower, constraint.altitude1
                        )));
                    }
                }
                (AltitudeDescriptor::Between, None) => {
                    return Err(FlightPlanError::InvalidConstraint(
                        "window constraint needs two altitudes".to_string(),
                    ));
                }
                _ => {}
            }
        }

        self.definition.altitude = constraint;
        if constraint.is_some() {
            self.constraint_type = constraint_type;
        }
        Ok(())
    }

    pub(crate) fn set_altitude_descriptor(&mut self, descriptor: AltitudeDescriptor) -> Result<()> {
        let mut constraint = self.definition.altitude.ok_or_else(|| {
            FlightPlanError::InvalidConstraint(format!("{} has no altitude constraint", self.ident))
        })?;

        constraint.descriptor = descriptor;
        if descriptor != AltitudeDescriptor::Between {
            constraint.altitude2 = None;
        }

        let constraint_type = self.constraint_type;
        self.set_altitude_constraint(Some(constraint), constraint_type)
    }

    pub(crate) fn set_speed_constraint(
        &mut self,
        constraint: Option<SpeedConstraint>,
        constraint_type: WaypointConstraintType,
    ) -> Result<()> {
        if let Some(constraint) = &constraint {
            if !(MIN_CONSTRAINT_SPEED..=MAX_CONSTRAINT_SPEED).contains(&constraint.speed) {
                return Err(FlightPlanError::InvalidConstraint(format!(
                    "speed {} outside {}-{}",
                    constraint.speed, MIN_CONSTRAINT_SPEED, MAX_CONSTRAINT_SPEED
                )));
            }
        }

        self.definition.speed = constraint;
        if constraint.is_some() {
            self.constraint_type = constraint_type;
        }
        Ok(())
    }

    pub(crate) fn set_overfly(&mut self, overfly: bool) -> Result<()> {
        if overfly && self.termination_waypoint().is_none() {
            return Err(FlightPlanError::precondition(format!(
                "Cannot overfly {} which does not end at a fix",
                self.ident
            )));
        }
        self.definition.overfly = overfly;
        Ok(())
    }

    pub(crate) fn set_cruise_step(&mut self, step: Option<CruiseStep>) -> Result<()> {
        if let Some(step) = &step {
            validate_altitude(step.to_altitude)?;
        }
        self.cruise_step = step;
        Ok(())
    }

    pub(crate) fn set_airway(&mut self, airway: &str) {
        self.definition.airway = Some(airway.to_string());
        self.annotation = airway.to_string();
    }

    /// Applies a pilot hold edit; the computed default is only recorded once
    pub(crate) fn edit_hold(&mut self, modified: HoldData, default: HoldData) {
        self.apply_hold(&modified);
        self.modified_hold = Some(modified);
        if self.default_hold.is_none() {
            self.default_hold = Some(default);
        }
    }

    pub(crate) fn set_default_hold(&mut self, default: HoldData) {
        if self.default_hold.is_none() {
            self.default_hold = Some(default);
        }
    }

    /// Holds edited by the pilot always become manually terminated
    pub(crate) fn convert_to_manual_hold(&mut self) {
        self.definition.leg_type = LegType::HM;
    }

    pub(crate) fn definition_mut(&mut self) -> &mut LegDefinition {
        &mut self.definition
    }

    pub(crate) fn revert_hold(&mut self) -> Result<()> {
        let default = self.default_hold.ok_or_else(|| {
            FlightPlanError::precondition(format!("Hold at {} has no computed default", self.ident))
        })?;
        self.apply_hold(&default);
        self.modified_hold = None;
        Ok(())
    }

    fn apply_hold(&mut self, hold: &HoldData) {
        self.definition.course = Some(hold.inbound_magnetic_course);
        self.definition.turn_direction = Some(hold.turn_direction);
        self.definition.length = hold.distance;
    }

    /// Moves a direct-to turning point to where the turn actually happened
    pub(crate) fn refresh_turning_point(&mut self, ppos: Coordinates) -> bool {
        if !self.flags.direct_to_turning_point {
            return false;
        }
        if let Some(waypoint) = self.definition.waypoint.as_mut() {
            waypoint.location = ppos;
        }
        true
    }

    /// Takes over constraints from a duplicate that is about to be dropped
    pub(crate) fn absorb_constraints(&mut self, other: &FlightPlanLeg) {
        if self.definition.altitude.is_none() && other.definition.altitude.is_some() {
            self.definition.altitude = other.definition.altitude;
            self.constraint_type = other.constraint_type;
        }
        if self.definition.speed.is_none() {
            self.definition.speed = other.definition.speed;
        }
        self.definition.overfly |= other.definition.overfly;
    }
}

fn validate_altitude(altitude: f64) -> Result<()> {
    if !(MIN_CONSTRAINT_ALTITUDE..=MAX_CONSTRAINT_ALTITUDE).contains(&altitude) {
        return Err(FlightPlanError::InvalidConstraint(format!(
            "altitude {} outside {}-{}",
            altitude, MIN_CONSTRAINT_ALTITUDE, MAX_CONSTRAINT_ALTITUDE
        )));
    }
    Ok(())
}

/// Display ident for a procedure leg, synthesised for legs without a fix
fn procedure_leg_ident(leg: &ProcedureLeg) -> String {
    match leg.leg_type {
        LegType::CA | LegType::VA | LegType::FA => leg
            .altitude
            .map(|alt| format!("({:.0})", alt.altitude1))
            .unwrap_or_else(|| "(ALT)".to_string()),
        LegType::FM | LegType::VM => "MANUAL".to_string(),
        LegType::CI | LegType::VI => "INTCPT".to_string(),
        LegType::CD | LegType::VD | LegType::FD => leg
            .length
            .map(|d| format!("({:.0})", d))
            .unwrap_or_else(|| "(DIST)".to_string()),
        _ => leg
            .waypoint
            .as_ref()
            .map(|fix| fix.ident.clone())
            .unwrap_or_else(|| "(UNKN)".to_string()),
    }
}

/// Entry of a flattened leg sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "element", rename_all = "snake_case")]
pub enum FlightPlanElement {
    Leg(FlightPlanLeg),
    Discontinuity,
}

impl FlightPlanElement {
    pub fn is_discontinuity(&self) -> bool {
        matches!(self, FlightPlanElement::Discontinuity)
    }

    pub fn as_leg(&self) -> Option<&FlightPlanLeg> {
        match self {
            FlightPlanElement::Leg(leg) => Some(leg),
            FlightPlanElement::Discontinuity => None,
        }
    }

    pub fn as_leg_mut(&mut self) -> Option<&mut FlightPlanLeg> {
        match self {
            FlightPlanElement::Leg(leg) => Some(leg),
            FlightPlanElement::Discontinuity => None,
        }
    }

    pub fn terminates_with_waypoint(&self, fix: &Fix) -> bool {
        self.as_leg().is_some_and(|leg| leg.terminates_with_waypoint(fix))
    }

    pub(crate) fn clone_for(&self, segment: SegmentKind) -> Self {
        match self {
            FlightPlanElement::Leg(leg) => FlightPlanElement::Leg(leg.clone_for(segment)),
            FlightPlanElement::Discontinuity => FlightPlanElement::Discontinuity,
        }
    }
}

impl From<FlightPlanLeg> for FlightPlanElement {
    fn from(leg: FlightPlanLeg) -> Self {
        FlightPlanElement::Leg(leg)
    }
}

impl fmt::Display for FlightPlanElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlightPlanElement::Discontinuity => write!(f, "---- F-PLN DISCONTINUITY ----"),
            FlightPlanElement::Leg(leg) => {
                write!(f, "{:<7} {}", leg.ident, leg.leg_type())?;
                if !leg.annotation.is_empty() {
                    write!(f, " {}", leg.annotation)?;
                }
                if let Some(alt) = leg.altitude_constraint() {
                    let sign = match alt.descriptor {
                        AltitudeDescriptor::At => "",
                        AltitudeDescriptor::AtOrAbove => "+",
                        AltitudeDescriptor::AtOrBelow => "-",
                        AltitudeDescriptor::Between => "W",
                    };
                    write!(f, " {}{:.0}", sign, alt.altitude1)?;
                }
                if let Some(spd) = leg.speed_constraint() {
                    write!(f, " {:.0}KT", spd.speed)?;
                }
                if leg.overfly() {
                    write!(f, " OVFY")?;
                }
                if let Some(step) = leg.cruise_step() {
                    write!(f, " STEP FL{:03.0}", step.to_altitude / 100.0)?;
                }
                Ok(())
            }
        }
    }
}
