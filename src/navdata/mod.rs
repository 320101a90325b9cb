mod database;
mod types;

pub use database::{NavDataFile, NavigationDatabase, StaticNavigationDatabase};
pub use types::{
    Airport, Airway, AltitudeConstraint, AltitudeDescriptor, Coordinates, Fix, FixKind, LegType,
    Procedure, ProcedureKind, ProcedureLeg, ProcedureTransition, Runway, SpeedConstraint,
    SpeedDescriptor, TurnDirection,
};
