#![allow(dead_code)]

use std::sync::Arc;

use fms_flightplan_rust::config::FpmConfig;
use fms_flightplan_rust::flightplan::FlightPlan;
use fms_flightplan_rust::manager::FlightPlanIndex;
use fms_flightplan_rust::navdata::{
    Airport, Airway, AltitudeConstraint, AltitudeDescriptor, Coordinates, Fix, FixKind, LegType,
    NavigationDatabase, Procedure, ProcedureKind, ProcedureLeg, ProcedureTransition, Runway,
    StaticNavigationDatabase,
};
use fms_flightplan_rust::position::StaticPosition;
use fms_flightplan_rust::service::FlightPlanService;

const FIXES: &[(&str, f64, f64)] = &[
    ("DPK", 40.79, -73.30),
    ("CRI", 40.61, -73.95),
    ("GAYEL", 41.40, -74.35),
    ("SAX", 41.07, -74.54),
    ("PSB", 40.92, -77.99),
    ("DJB", 41.36, -82.16),
    ("BVT", 40.56, -87.07),
    ("IRK", 40.14, -92.59),
    ("HBU", 38.45, -107.04),
    ("TNP", 34.11, -115.77),
    ("ANJLL", 34.10, -117.00),
    ("SEAVU", 34.20, -117.50),
    ("SMO", 34.01, -118.46),
    ("FUELR", 33.95, -118.00),
    ("SKOLL", 33.95, -118.15),
    ("FALLT", 33.95, -118.30),
    ("SUZZI", 33.96, -118.10),
    ("WPT1", 39.50, -100.00),
];

pub fn fix(ident: &str) -> Fix {
    let (_, lat, long) = FIXES
        .iter()
        .find(|(i, _, _)| *i == ident)
        .copied()
        .unwrap_or_else(|| panic!("no fixture fix {}", ident));
    Fix {
        ident: ident.to_string(),
        database_id: format!("W{}", ident),
        location: Coordinates::new(lat, long),
        kind: FixKind::Waypoint,
    }
}

fn to(leg_type: LegType, ident: &str) -> ProcedureLeg {
    ProcedureLeg::to_fix(leg_type, fix(ident))
}

fn to_runway(leg_type: LegType, runway: &Runway) -> ProcedureLeg {
    ProcedureLeg::to_fix(leg_type, runway.fix())
}

/// Course to an altitude, no fix
fn climb_to(altitude: f64) -> ProcedureLeg {
    let mut leg = to(LegType::CA, "DPK");
    leg.waypoint = None;
    leg.course = Some(40.0);
    leg.altitude = Some(AltitudeConstraint {
        descriptor: AltitudeDescriptor::AtOrAbove,
        altitude1: altitude,
        altitude2: None,
    });
    leg
}

fn runway(airport: &str, ident: &str, lat: f64, long: f64, bearing: f64) -> Runway {
    Runway {
        ident: ident.to_string(),
        database_id: format!("R{}{}", airport, ident),
        threshold: Coordinates::new(lat, long),
        bearing,
        length: 3000.0,
    }
}

fn transition(id_prefix: &str, ident: &str, legs: Vec<ProcedureLeg>) -> ProcedureTransition {
    ProcedureTransition {
        ident: ident.to_string(),
        database_id: format!("T{}{}", id_prefix, ident),
        legs,
    }
}

fn procedure(airport: &str, kind: ProcedureKind, ident: &str, legs: Vec<ProcedureLeg>) -> Procedure {
    Procedure {
        ident: ident.to_string(),
        database_id: format!("P{}{}", airport, ident),
        kind,
        runway_ident: None,
        runway_transitions: Vec::new(),
        legs,
        enroute_transitions: Vec::new(),
        vias: Vec::new(),
        missed_legs: Vec::new(),
    }
}

fn airport(ident: &str, lat: f64, long: f64, runways: Vec<Runway>) -> Airport {
    Airport {
        ident: ident.to_string(),
        database_id: format!("A{}", ident),
        location: Coordinates::new(lat, long),
        elevation: 0.0,
        runways,
        departures: Vec::new(),
        arrivals: Vec::new(),
        approaches: Vec::new(),
    }
}

fn kjfk() -> Airport {
    let mut kjfk = airport(
        "KJFK",
        40.64,
        -73.78,
        vec![
            runway("KJFK", "RW04L", 40.62, -73.79, 44.0),
            runway("KJFK", "RW31L", 40.65, -73.76, 314.0),
        ],
    );

    let mut gayel = procedure(
        "KJFK",
        ProcedureKind::Departure,
        "GAYEL4",
        vec![to(LegType::IF, "DPK"), to(LegType::TF, "GAYEL")],
    );
    gayel.runway_transitions = vec![
        transition("KJFKGAYEL4", "RW04L", vec![climb_to(1500.0), to(LegType::DF, "DPK")]),
        transition(
            "KJFKGAYEL4",
            "RW31L",
            vec![climb_to(1500.0), to(LegType::DF, "CRI"), to(LegType::TF, "DPK")],
        ),
    ];
    gayel.enroute_transitions = vec![transition(
        "KJFKGAYEL4",
        "SAX",
        vec![to(LegType::IF, "GAYEL"), to(LegType::TF, "SAX")],
    )];

    let mut vectors = procedure("KJFK", ProcedureKind::Departure, "SKORR5", vec![climb_to(2000.0)]);
    let mut heading = to(LegType::VM, "DPK");
    heading.waypoint = None;
    heading.course = Some(220.0);
    vectors.legs.push(heading);

    kjfk.departures = vec![gayel, vectors];
    kjfk
}

fn klax() -> Airport {
    let rw25l = runway("KLAX", "RW25L", 33.94, -118.40, 250.0);
    let rw24r = runway("KLAX", "RW24R", 33.95, -118.40, 250.0);
    let mut klax = airport("KLAX", 33.94, -118.41, vec![rw25l.clone(), rw24r.clone()]);

    let mut anjll = procedure(
        "KLAX",
        ProcedureKind::Arrival,
        "ANJLL4",
        vec![to(LegType::IF, "ANJLL"), to(LegType::TF, "SEAVU"), to(LegType::TF, "SMO")],
    );
    anjll.enroute_transitions = vec![transition(
        "KLAXANJLL4",
        "TNP",
        vec![to(LegType::IF, "TNP"), to(LegType::TF, "ANJLL")],
    )];
    anjll.runway_transitions = vec![
        transition("KLAXANJLL4", "RW25L", vec![to(LegType::IF, "SMO"), to(LegType::TF, "FUELR")]),
        transition("KLAXANJLL4", "RW24R", vec![to(LegType::IF, "SMO"), to(LegType::TF, "SUZZI")]),
    ];

    let mut ils25l = procedure(
        "KLAX",
        ProcedureKind::Approach,
        "I25L",
        vec![
            to(LegType::IF, "SKOLL"),
            to(LegType::TF, "FALLT"),
            to_runway(LegType::TF, &rw25l),
        ],
    );
    ils25l.runway_ident = Some("RW25L".to_string());
    ils25l.vias = vec![transition(
        "KLAXI25L",
        "FUELR",
        vec![to(LegType::IF, "FUELR"), to(LegType::TF, "SKOLL")],
    )];
    ils25l.missed_legs = vec![climb_to(2000.0), to(LegType::DF, "SMO")];

    let mut rnav24r = procedure(
        "KLAX",
        ProcedureKind::Approach,
        "R24R",
        vec![to(LegType::IF, "SUZZI"), to_runway(LegType::TF, &rw24r)],
    );
    rnav24r.runway_ident = Some("RW24R".to_string());
    rnav24r.missed_legs = vec![climb_to(2000.0)];

    klax.arrivals = vec![anjll];
    klax.approaches = vec![ils25l, rnav24r];
    klax
}

pub fn database() -> StaticNavigationDatabase {
    let mut db = StaticNavigationDatabase::new();
    db.add_airport(kjfk());
    db.add_airport(klax());
    db.add_airport(airport(
        "KSFO",
        37.62,
        -122.38,
        vec![runway("KSFO", "RW28L", 37.61, -122.36, 284.0)],
    ));
    db.add_airport(airport(
        "KBOS",
        42.36,
        -71.01,
        vec![runway("KBOS", "RW22L", 42.37, -71.00, 215.0)],
    ));

    for (ident, _, _) in FIXES {
        db.add_fix(fix(ident));
    }

    db.add_airway(Airway {
        ident: "J80".to_string(),
        database_id: "EJ80".to_string(),
        fixes: ["SAX", "PSB", "DJB", "BVT"].iter().map(|i| fix(i)).collect(),
    });
    db.add_airway(Airway {
        ident: "J64".to_string(),
        database_id: "EJ64".to_string(),
        fixes: ["DJB", "IRK", "HBU"].iter().map(|i| fix(i)).collect(),
    });
    db
}

pub struct Harness {
    pub fps: FlightPlanService,
    pub position: Arc<StaticPosition>,
    pub database: Arc<dyn NavigationDatabase>,
}

pub fn harness(config: FpmConfig) -> Harness {
    let database: Arc<dyn NavigationDatabase> = Arc::new(database());
    let position = Arc::new(StaticPosition::new(Coordinates::new(10.0, 20.0), 90.0));
    let mut fps = FlightPlanService::new(Arc::clone(&database), position.clone(), config, 256);
    fps.create_flight_plans().expect("fresh service");
    Harness {
        fps,
        position,
        database,
    }
}

pub fn a320() -> Harness {
    harness(FpmConfig::a320_honeywell_h3())
}

/// Flattened idents, `---` for discontinuities
pub fn idents(plan: &FlightPlan) -> Vec<String> {
    plan.elements()
        .map(|element| match element.as_leg() {
            Some(leg) => leg.ident().to_string(),
            None => "---".to_string(),
        })
        .collect()
}

pub const ACT: FlightPlanIndex = FlightPlanIndex::Active;
pub const TMPY: FlightPlanIndex = FlightPlanIndex::Temporary;

/// KJFK to KLAX through `fixes`, committed to the active plan
pub fn route(harness: &mut Harness, fixes: &[&str]) -> anyhow::Result<()> {
    harness.fps.new_city_pair("KJFK", "KLAX", None, ACT)?;
    for (n, ident) in fixes.iter().enumerate() {
        harness.fps.insert_waypoint_before(n + 1, &fix(ident), ACT, false)?;
    }
    if harness.fps.has_temporary() {
        harness.fps.temporary_insert()?;
    }
    Ok(())
}

pub const ROUTE: &[&str] = &["SAX", "PSB", "DJB", "IRK", "HBU", "WPT1"];
