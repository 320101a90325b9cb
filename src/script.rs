//! Line-based command language driving a [`FlightPlanService`], used by
//! the CLI. One command per line; `#` starts a comment.
//!
//! ```text
//! CITY KJFK KLAX KSFO
//! SID GAYEL4
//! INSERT 3 MERIT
//! DIR SLT ABEAM
//! TMPY INSERT
//! ```

use anyhow::{bail, Context, Result};
use regex::{Captures, Regex};
use std::sync::{Arc, OnceLock};
use tracing::debug;

use crate::flightplan::{HoldData, HoldType};
use crate::manager::FlightPlanIndex;
use crate::navdata::{Coordinates, NavigationDatabase, TurnDirection};
use crate::position::{PositionProvider, StaticPosition};
use crate::service::FlightPlanService;

macro_rules! pattern {
    ($re:literal) => {{
        static RE: OnceLock<Regex> = OnceLock::new();
        RE.get_or_init(|| Regex::new($re).unwrap())
    }};
}

/// Procedure-backed selection a script can change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcedureSlot {
    Departure,
    DepartureRunway,
    DepartureTransition,
    ArrivalTransition,
    Arrival,
    ApproachVia,
    Approach,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CityPair { from: String, to: String, alternate: Option<String> },
    Origin(String),
    Destination(String),
    Alternate(String),
    OriginRunway(String),
    DestinationRunway(String),
    Procedure { slot: ProcedureSlot, id: Option<String> },
    Insert { at: usize, fix: String },
    Next { at: usize, fix: String },
    Delete { at: usize },
    DirectTo { fix: String, abeam: bool },
    NewDest { at: usize, icao: String },
    AirwayStart { at: usize },
    Airway(String),
    AirwayExit(String),
    Altitude { at: usize, altitude: Option<f64>, descent: bool },
    Speed { at: usize, speed: Option<f64>, descent: bool },
    Overfly { at: usize },
    Step { at: usize, altitude: Option<f64> },
    Hold { at: usize, course: f64, turn: TurnDirection, distance: Option<f64> },
    EnableAltn { at: usize },
    InsertTemporary,
    EraseTemporary,
    InsertUplink,
    Reset,
    Sequence,
    Position { lat: f64, long: f64, track: Option<f64> },
    Print,
}

fn index(c: &Captures, group: usize) -> Result<usize> {
    c[group].parse().with_context(|| format!("Bad index: {}", &c[group]))
}

/// `CLR` clears a value
fn value_or_clear(c: &Captures, group: usize) -> Result<Option<f64>> {
    match &c[group] {
        "CLR" => Ok(None),
        raw => Ok(Some(raw.parse().with_context(|| format!("Bad value: {}", raw))?)),
    }
}

fn float(raw: &str) -> Result<f64> {
    raw.parse().with_context(|| format!("Bad number: {}", raw))
}

/// Parses one line. Blank lines and comments give `None`.
pub fn parse_line(line: &str) -> Result<Option<Command>> {
    let line = line.split('#').next().unwrap_or_default().trim().to_ascii_uppercase();
    if line.is_empty() {
        return Ok(None);
    }

    if let Some(c) = pattern!(r"^CITY\s+(\w{4})\s+(\w{4})(?:\s+(\w{4}))?$").captures(&line) {
        return Ok(Some(Command::CityPair {
            from: c[1].to_string(),
            to: c[2].to_string(),
            alternate: c.get(3).map(|m| m.as_str().to_string()),
        }));
    }
    if let Some(c) = pattern!(r"^(ORIGIN|DEST)\s+RWY\s+(\w+)$").captures(&line) {
        let ident = c[2].to_string();
        return Ok(Some(match &c[1] {
            "ORIGIN" => Command::OriginRunway(ident),
            _ => Command::DestinationRunway(ident),
        }));
    }
    if let Some(c) = pattern!(r"^(ORIGIN|DEST|ALTN)\s+(\w{4})$").captures(&line) {
        let icao = c[2].to_string();
        return Ok(Some(match &c[1] {
            "ORIGIN" => Command::Origin(icao),
            "DEST" => Command::Destination(icao),
            _ => Command::Alternate(icao),
        }));
    }
    if let Some(c) = pattern!(r"^(SID|SID RWY|SID TRANS|STAR TRANS|STAR|VIA|APPR)\s+(\S+)$").captures(&line) {
        let slot = match &c[1] {
            "SID" => ProcedureSlot::Departure,
            "SID RWY" => ProcedureSlot::DepartureRunway,
            "SID TRANS" => ProcedureSlot::DepartureTransition,
            "STAR TRANS" => ProcedureSlot::ArrivalTransition,
            "STAR" => ProcedureSlot::Arrival,
            "VIA" => ProcedureSlot::ApproachVia,
            _ => ProcedureSlot::Approach,
        };
        let id = Some(c[2].to_string()).filter(|id| id != "NONE");
        return Ok(Some(Command::Procedure { slot, id }));
    }
    if let Some(c) = pattern!(r"^INSERT\s+(\d+)\s+(\w+)$").captures(&line) {
        return Ok(Some(Command::Insert { at: index(&c, 1)?, fix: c[2].to_string() }));
    }
    if let Some(c) = pattern!(r"^NEXT\s+(\d+)\s+(\w+)$").captures(&line) {
        return Ok(Some(Command::Next { at: index(&c, 1)?, fix: c[2].to_string() }));
    }
    if let Some(c) = pattern!(r"^DELETE\s+(\d+)$").captures(&line) {
        return Ok(Some(Command::Delete { at: index(&c, 1)? }));
    }
    if let Some(c) = pattern!(r"^DIR\s+(\w+)(\s+ABEAM)?$").captures(&line) {
        return Ok(Some(Command::DirectTo { fix: c[1].to_string(), abeam: c.get(2).is_some() }));
    }
    if let Some(c) = pattern!(r"^NEWDEST\s+(\d+)\s+(\w{4})$").captures(&line) {
        return Ok(Some(Command::NewDest { at: index(&c, 1)?, icao: c[2].to_string() }));
    }
    if let Some(c) = pattern!(r"^AWY\s+START\s+(\d+)$").captures(&line) {
        return Ok(Some(Command::AirwayStart { at: index(&c, 1)? }));
    }
    if let Some(c) = pattern!(r"^AWY\s+EXIT\s+(\w+)$").captures(&line) {
        return Ok(Some(Command::AirwayExit(c[1].to_string())));
    }
    if let Some(c) = pattern!(r"^AWY\s+(\w+)$").captures(&line) {
        return Ok(Some(Command::Airway(c[1].to_string())));
    }
    if let Some(c) = pattern!(r"^(ALT|SPD)\s+(\d+)\s+(\d+|CLR)(\s+DES)?$").captures(&line) {
        let (at, value, descent) = (index(&c, 2)?, value_or_clear(&c, 3)?, c.get(4).is_some());
        return Ok(Some(match &c[1] {
            "ALT" => Command::Altitude { at, altitude: value, descent },
            _ => Command::Speed { at, speed: value, descent },
        }));
    }
    if let Some(c) = pattern!(r"^OVFY\s+(\d+)$").captures(&line) {
        return Ok(Some(Command::Overfly { at: index(&c, 1)? }));
    }
    if let Some(c) = pattern!(r"^STEP\s+(\d+)\s+(\d+|CLR)$").captures(&line) {
        return Ok(Some(Command::Step { at: index(&c, 1)?, altitude: value_or_clear(&c, 2)? }));
    }
    if let Some(c) = pattern!(r"^HOLD\s+(\d+)\s+(\d{1,3})\s*([LR])(?:\s+(\d+(?:\.\d+)?))?$").captures(&line) {
        let turn = if &c[3] == "L" { TurnDirection::Left } else { TurnDirection::Right };
        return Ok(Some(Command::Hold {
            at: index(&c, 1)?,
            course: float(&c[2])?,
            turn,
            distance: c.get(4).map(|m| float(m.as_str())).transpose()?,
        }));
    }
    if let Some(c) = pattern!(r"^ENABLE\s+ALTN\s+(\d+)$").captures(&line) {
        return Ok(Some(Command::EnableAltn { at: index(&c, 1)? }));
    }
    if let Some(c) = pattern!(r"^PPOS\s+(-?\d+(?:\.\d+)?)\s+(-?\d+(?:\.\d+)?)(?:\s+(\d+(?:\.\d+)?))?$").captures(&line) {
        return Ok(Some(Command::Position {
            lat: float(&c[1])?,
            long: float(&c[2])?,
            track: c.get(3).map(|m| float(m.as_str())).transpose()?,
        }));
    }

    let command = match line.as_str() {
        "TMPY INSERT" => Command::InsertTemporary,
        "TMPY ERASE" => Command::EraseTemporary,
        "UPLINK INSERT" => Command::InsertUplink,
        "RESET" => Command::Reset,
        "SEQUENCE" => Command::Sequence,
        "PRINT" => Command::Print,
        _ => bail!("Unknown command: {}", line),
    };
    Ok(Some(command))
}

/// Executes commands against the active plan (edits land in the temporary
/// plan as the service decides)
pub struct ScriptRunner {
    service: FlightPlanService,
    database: Arc<dyn NavigationDatabase>,
    position: Arc<StaticPosition>,
}

impl ScriptRunner {
    pub fn new(service: FlightPlanService, database: Arc<dyn NavigationDatabase>, position: Arc<StaticPosition>) -> Self {
        Self {
            service,
            database,
            position,
        }
    }

    pub fn service(&self) -> &FlightPlanService {
        &self.service
    }

    /// Runs one line. Returns whether it held a command.
    pub fn run_line(&mut self, line: &str) -> Result<bool> {
        match parse_line(line)? {
            Some(command) => {
                self.execute(&command)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn execute(&mut self, command: &Command) -> Result<()> {
        debug!("[SCRIPT] {:?}", command);
        const ACT: FlightPlanIndex = FlightPlanIndex::Active;
        let fps = &mut self.service;

        match command {
            Command::CityPair { from, to, alternate } => fps.new_city_pair(from, to, alternate.as_deref(), ACT)?,
            Command::Origin(icao) => fps.set_origin_airport(icao, ACT)?,
            Command::Destination(icao) => fps.set_destination_airport(icao, ACT, false)?,
            Command::Alternate(icao) => fps.set_alternate(icao, ACT)?,
            Command::OriginRunway(ident) => fps.set_origin_runway(ident, ACT, false)?,
            Command::DestinationRunway(ident) => fps.set_destination_runway(ident, ACT, false)?,
            Command::Procedure { slot, id } => {
                let id = id.as_deref();
                match slot {
                    ProcedureSlot::Departure => fps.set_departure_procedure(id, ACT, false)?,
                    ProcedureSlot::DepartureRunway => fps.set_departure_runway_transition(id, ACT, false)?,
                    ProcedureSlot::DepartureTransition => fps.set_departure_enroute_transition(id, ACT, false)?,
                    ProcedureSlot::ArrivalTransition => fps.set_arrival_enroute_transition(id, ACT, false)?,
                    ProcedureSlot::Arrival => fps.set_arrival(id, ACT, false)?,
                    ProcedureSlot::ApproachVia => fps.set_approach_via(id, ACT, false)?,
                    ProcedureSlot::Approach => fps.set_approach(id, ACT, false)?,
                }
            }
            Command::Insert { at, fix } => {
                let fix = self.database.fix(fix)?;
                fps.insert_waypoint_before(*at, &fix, ACT, false)?;
            }
            Command::Next { at, fix } => {
                let fix = self.database.fix(fix)?;
                fps.next_waypoint(*at, &fix, ACT, false)?;
            }
            Command::Delete { at } => fps.delete_element_at(*at, ACT, false)?,
            Command::DirectTo { fix, abeam } => {
                let fix = self.database.fix(fix)?;
                fps.direct_to(&fix, *abeam, ACT)?;
            }
            Command::NewDest { at, icao } => fps.new_dest(*at, icao, ACT, false)?,
            Command::AirwayStart { at } => fps.start_airway_entry(*at, ACT, false)?,
            Command::Airway(ident) => fps.add_airway(ident, ACT, false)?,
            Command::AirwayExit(ident) => {
                let fix = self.database.fix(ident)?;
                fps.add_airway_exit(&fix, ACT, false)?;
            }
            Command::Altitude { at, altitude, descent } => fps.set_altitude_at(*at, *altitude, *descent, ACT, false)?,
            Command::Speed { at, speed, descent } => fps.set_speed_at(*at, *speed, *descent, ACT, false)?,
            Command::Overfly { at } => {
                fps.toggle_overfly_at(*at, ACT, false)?;
            }
            Command::Step { at, altitude: Some(altitude) } => fps.add_or_update_cruise_step(*at, *altitude, ACT, false)?,
            Command::Step { at, altitude: None } => fps.remove_cruise_step(*at, ACT, false)?,
            Command::Hold { at, course, turn, distance } => {
                let computed = HoldData {
                    inbound_magnetic_course: *course,
                    turn_direction: *turn,
                    distance: None,
                    time: Some(1.0),
                    hold_type: HoldType::Computed,
                };
                let pilot = HoldData {
                    distance: *distance,
                    time: if distance.is_some() { None } else { Some(1.0) },
                    hold_type: HoldType::Pilot,
                    ..computed
                };
                fps.add_or_edit_manual_hold(*at, pilot, Some(pilot), computed, ACT, false)?;
            }
            Command::EnableAltn { at } => fps.enable_altn(*at, ACT)?,
            Command::InsertTemporary => fps.temporary_insert()?,
            Command::EraseTemporary => fps.temporary_delete()?,
            Command::InsertUplink => fps.uplink_insert()?,
            Command::Reset => fps.reset()?,
            Command::Sequence => {
                fps.sequence()?;
            }
            Command::Position { lat, long, track } => {
                let track = track.unwrap_or_else(|| self.position.true_track());
                self.position.set(Coordinates::new(*lat, *long), track);
            }
            Command::Print => {}
        }
        Ok(())
    }
}
