mod procedure;

pub(crate) use procedure::{resolve_procedure, ProcedureContext, ResolvedProcedure};

use serde::{Deserialize, Serialize};
use std::fmt;

use super::legs::{FlightPlanElement, FlightPlanLeg};
use crate::navdata::LegType;

/// Position of a segment in a flight plan. The declaration order is the
/// order segments are flattened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentKind {
    Origin,
    DepartureRunwayTransition,
    Departure,
    DepartureEnrouteTransition,
    Enroute,
    ArrivalEnrouteTransition,
    Arrival,
    ArrivalRunwayTransition,
    ApproachVia,
    Approach,
    Destination,
    MissedApproach,
}

impl SegmentKind {
    pub const ALL: [SegmentKind; 12] = [
        SegmentKind::Origin,
        SegmentKind::DepartureRunwayTransition,
        SegmentKind::Departure,
        SegmentKind::DepartureEnrouteTransition,
        SegmentKind::Enroute,
        SegmentKind::ArrivalEnrouteTransition,
        SegmentKind::Arrival,
        SegmentKind::ArrivalRunwayTransition,
        SegmentKind::ApproachVia,
        SegmentKind::Approach,
        SegmentKind::Destination,
        SegmentKind::MissedApproach,
    ];

    pub fn position(self) -> usize {
        self as usize
    }

    pub fn class(self) -> SegmentClass {
        match self {
            SegmentKind::Origin
            | SegmentKind::DepartureRunwayTransition
            | SegmentKind::Departure
            | SegmentKind::DepartureEnrouteTransition => SegmentClass::Departure,
            SegmentKind::Enroute => SegmentClass::Enroute,
            _ => SegmentClass::Arrival,
        }
    }

    /// Segments backed by a database procedure or transition
    pub fn is_procedure(self) -> bool {
        !matches!(
            self,
            SegmentKind::Origin | SegmentKind::Enroute | SegmentKind::Destination
        )
    }

    /// Pilot waypoints may be inserted here
    pub fn accepts_manual_legs(self) -> bool {
        !matches!(
            self,
            SegmentKind::Origin | SegmentKind::Destination | SegmentKind::MissedApproach
        )
    }
}

impl fmt::Display for SegmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentClass {
    Departure,
    Enroute,
    Arrival,
}

/// Reference to the database entry a segment was built from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedProcedure {
    pub ident: String,
    pub database_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightPlanSegment {
    kind: SegmentKind,
    all_legs: Vec<FlightPlanElement>,
    strung: bool,
    procedure: Option<SelectedProcedure>,
}

impl FlightPlanSegment {
    pub fn new(kind: SegmentKind) -> Self {
        Self {
            kind,
            all_legs: Vec::new(),
            strung: true,
            procedure: None,
        }
    }

    pub fn kind(&self) -> SegmentKind {
        self.kind
    }

    pub fn class(&self) -> SegmentClass {
        self.kind.class()
    }

    pub fn all_legs(&self) -> &[FlightPlanElement] {
        &self.all_legs
    }

    pub fn len(&self) -> usize {
        self.all_legs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all_legs.is_empty()
    }

    pub fn procedure(&self) -> Option<&SelectedProcedure> {
        self.procedure.as_ref()
    }

    pub fn is_strung(&self) -> bool {
        self.strung
    }

    pub(crate) fn legs_mut(&mut self) -> &mut Vec<FlightPlanElement> {
        &mut self.all_legs
    }

    pub(crate) fn set_strung(&mut self, strung: bool) {
        self.strung = strung;
    }

    /// Swaps the procedure selection and, unless `skip_update_legs` is set,
    /// rebuilds the leg list from it. Returns whether the legs changed.
    pub(crate) fn set_procedure(&mut self, resolved: Option<ResolvedProcedure>, skip_update_legs: bool) -> bool {
        let Some(resolved) = resolved else {
            self.procedure = None;
            if skip_update_legs {
                return false;
            }
            return self.clear_legs();
        };

        self.procedure = Some(resolved.selection.clone());
        if skip_update_legs {
            return false;
        }

        let mapped: Vec<FlightPlanLeg> = resolved
            .legs
            .iter()
            .map(|leg| {
                FlightPlanLeg::from_procedure_leg(self.kind, leg, &resolved.selection.ident, resolved.constraint_type)
            })
            .collect();

        self.all_legs.clear();

        // A segment never begins with a leg lacking a fixed start point
        if let Some(first) = mapped.first().filter(|leg| leg.is_fx()) {
            if let Some(fix) = first.termination_waypoint() {
                let initial = FlightPlanLeg::from_enroute_fix(self.kind, fix, None, LegType::IF);
                self.all_legs.push(initial.into());
            }
        }

        self.all_legs.extend(mapped.into_iter().map(FlightPlanElement::from));
        self.strung = false;
        true
    }

    /// Replaces the legs wholesale, re-parenting them to this segment
    pub(crate) fn set_legs(&mut self, legs: Vec<FlightPlanElement>) {
        self.all_legs = legs.iter().map(|element| element.clone_for(self.kind)).collect();
        self.strung = false;
    }

    pub(crate) fn insert(&mut self, position: usize, element: FlightPlanElement) {
        let element = element.clone_for(self.kind);
        self.all_legs.insert(position, element);
    }

    pub(crate) fn clear_legs(&mut self) -> bool {
        let had_legs = !self.all_legs.is_empty();
        self.all_legs.clear();
        self.strung = true;
        had_legs
    }

    /// Drops the procedure reference along with the legs
    pub(crate) fn reset(&mut self) -> bool {
        self.procedure = None;
        self.clear_legs()
    }

    /// Same selection and same sequence of legs, ignoring constraint edits
    pub(crate) fn same_layout(&self, other: &FlightPlanSegment) -> bool {
        self.procedure == other.procedure
            && self.all_legs.len() == other.all_legs.len()
            && self.all_legs.iter().zip(&other.all_legs).all(|pair| match pair {
                (FlightPlanElement::Leg(a), FlightPlanElement::Leg(b)) => a.is_same_leg(b),
                (FlightPlanElement::Discontinuity, FlightPlanElement::Discontinuity) => true,
                _ => false,
            })
    }
}
