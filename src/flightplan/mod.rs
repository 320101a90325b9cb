mod fix_info;
mod legs;
mod pending;
mod pending_airways;
mod performance;
mod plan;
mod restring;
mod segments;

pub use fix_info::{FixInfoEntry, FixInfoRadial, FixInfoRadius, FIX_INFO_SLOTS};
pub use legs::{
    CruiseStep, FlightPlanElement, FlightPlanLeg, HoldData, HoldType, LegCalculations, LegDefinition,
    LegFlags, WaypointConstraintType, TURNING_POINT_IDENT,
};
pub use pending_airways::{PendingAirwayElement, PendingAirways};
pub use performance::PerformanceData;
pub use plan::FlightPlan;
pub use segments::{FlightPlanSegment, SegmentClass, SegmentKind, SelectedProcedure};
