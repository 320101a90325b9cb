//! Flight plan engine for an Airbus-style FMS: multi-slot plan store,
//! temporary-plan revisions, procedure segments and restringing.

pub mod config;
pub mod error;
pub mod flightplan;
pub mod manager;
pub mod navdata;
pub mod position;
pub mod script;
pub mod service;
pub mod utils;

pub use config::FpmConfig;
pub use error::{ErrorKind, FlightPlanError, Result};
pub use flightplan::{FlightPlan, FlightPlanElement, FlightPlanLeg, SegmentKind};
pub use manager::{FlightPlanEvent, FlightPlanIndex, FlightPlanManager, FlightPlanSyncEvent};
pub use navdata::{NavigationDatabase, StaticNavigationDatabase};
pub use position::{PositionProvider, StaticPosition};
pub use service::{FlightPlanService, SharedFlightPlanService};
