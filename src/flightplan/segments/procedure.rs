use super::{SegmentKind, SelectedProcedure};
use crate::error::{FlightPlanError, Result};
use crate::flightplan::legs::WaypointConstraintType;
use crate::navdata::{Airport, Procedure, ProcedureLeg, ProcedureTransition, Runway};

/// What a segment needs to know about its plan to look a procedure up
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ProcedureContext<'a> {
    pub origin_airport: Option<&'a Airport>,
    pub origin_runway: Option<&'a Runway>,
    pub departure: Option<&'a Procedure>,
    pub destination_airport: Option<&'a Airport>,
    pub destination_runway: Option<&'a Runway>,
    pub arrival: Option<&'a Procedure>,
    pub approach: Option<&'a Procedure>,
}

/// A procedure looked up and ready to be mapped into legs
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ResolvedProcedure {
    pub selection: SelectedProcedure,
    pub legs: Vec<ProcedureLeg>,
    pub constraint_type: WaypointConstraintType,
}

impl ResolvedProcedure {
    fn from_procedure(procedure: &Procedure, legs: &[ProcedureLeg], constraint_type: WaypointConstraintType) -> Self {
        Self {
            selection: SelectedProcedure {
                ident: procedure.ident.clone(),
                database_id: procedure.database_id.clone(),
            },
            legs: legs.to_vec(),
            constraint_type,
        }
    }

    fn from_transition(transition: &ProcedureTransition, constraint_type: WaypointConstraintType) -> Self {
        Self {
            selection: SelectedProcedure {
                ident: transition.ident.clone(),
                database_id: transition.database_id.clone(),
            },
            legs: transition.legs.clone(),
            constraint_type,
        }
    }
}

fn matches_id(ident: &str, database_id: &str, wanted: &str) -> bool {
    database_id == wanted || ident == wanted
}

fn find_procedure<'a>(procedures: &'a [Procedure], wanted: &str) -> Option<&'a Procedure> {
    procedures.iter().find(|p| matches_id(&p.ident, &p.database_id, wanted))
}

fn find_transition<'a>(transitions: &'a [ProcedureTransition], wanted: &str) -> Option<&'a ProcedureTransition> {
    transitions.iter().find(|t| matches_id(&t.ident, &t.database_id, wanted))
}

fn require<'a, T>(value: Option<&'a T>, message: &str) -> Result<&'a T> {
    value.ok_or_else(|| FlightPlanError::precondition(message))
}

/// Looks up the procedure or transition `database_id` for a segment kind.
///
/// Each kind knows which part of the plan it hangs off (airport, SID, STAR
/// or approach) and which profile its constraints belong to.
pub(crate) fn resolve_procedure(
    kind: SegmentKind,
    ctx: &ProcedureContext<'_>,
    database_id: &str,
) -> Result<ResolvedProcedure> {
    use WaypointConstraintType::{Climb, Descent};

    match kind {
        SegmentKind::Departure => {
            let origin = require(ctx.origin_airport, "Cannot set departure without origin airport")?;
            let departure = find_procedure(&origin.departures, database_id)
                .ok_or_else(|| FlightPlanError::not_found("departure", format!("{} {}", origin.ident, database_id)))?;
            Ok(ResolvedProcedure::from_procedure(departure, &departure.legs, Climb))
        }
        SegmentKind::DepartureRunwayTransition => {
            let origin = require(ctx.origin_airport, "Cannot set departure runway without origin airport")?;
            let departure = require(ctx.departure, "Cannot set departure runway transition without departure")?;
            let transition = find_transition(&departure.runway_transitions, database_id).ok_or_else(|| {
                FlightPlanError::not_found(
                    "departure runway transition",
                    format!("{} {} {}", origin.ident, departure.ident, database_id),
                )
            })?;
            Ok(ResolvedProcedure::from_transition(transition, Climb))
        }
        SegmentKind::DepartureEnrouteTransition => {
            let origin = require(ctx.origin_airport, "Cannot set departure enroute transition without origin airport")?;
            let departure = require(ctx.departure, "Cannot set departure enroute transition without departure")?;
            let transition = find_transition(&departure.enroute_transitions, database_id).ok_or_else(|| {
                FlightPlanError::not_found(
                    "departure enroute transition",
                    format!("{} {} {}", origin.ident, departure.ident, database_id),
                )
            })?;
            Ok(ResolvedProcedure::from_transition(transition, Climb))
        }
        SegmentKind::ArrivalEnrouteTransition => {
            let (destination, arrival) = match (ctx.destination_airport, ctx.arrival) {
                (Some(destination), Some(arrival)) => (destination, arrival),
                _ => {
                    return Err(FlightPlanError::precondition(
                        "Cannot set arrival enroute transition without destination airport and STAR",
                    ))
                }
            };
            let transition = find_transition(&arrival.enroute_transitions, database_id).ok_or_else(|| {
                FlightPlanError::not_found(
                    "arrival enroute transition",
                    format!("{} {} {}", destination.ident, arrival.ident, database_id),
                )
            })?;
            Ok(ResolvedProcedure::from_transition(transition, Descent))
        }
        SegmentKind::Arrival => {
            let destination = require(ctx.destination_airport, "Cannot set arrival without destination airport")?;
            let arrival = find_procedure(&destination.arrivals, database_id).ok_or_else(|| {
                FlightPlanError::not_found("arrival", format!("{} {}", destination.ident, database_id))
            })?;
            Ok(ResolvedProcedure::from_procedure(arrival, &arrival.legs, Descent))
        }
        SegmentKind::ArrivalRunwayTransition => {
            let destination = require(ctx.destination_airport, "Cannot set arrival runway transition without destination airport")?;
            let arrival = require(ctx.arrival, "Cannot set arrival runway transition without STAR")?;
            let transition = find_transition(&arrival.runway_transitions, database_id).ok_or_else(|| {
                FlightPlanError::not_found(
                    "arrival runway transition",
                    format!("{} {} {}", destination.ident, arrival.ident, database_id),
                )
            })?;
            Ok(ResolvedProcedure::from_transition(transition, Descent))
        }
        SegmentKind::ApproachVia => {
            let destination = require(ctx.destination_airport, "Cannot set approach via without destination airport")?;
            let approach = require(ctx.approach, "Cannot set approach via without approach")?;
            let via = find_transition(&approach.vias, database_id).ok_or_else(|| {
                FlightPlanError::not_found(
                    "approach via",
                    format!("{} {} {}", destination.ident, approach.ident, database_id),
                )
            })?;
            Ok(ResolvedProcedure::from_transition(via, Descent))
        }
        SegmentKind::Approach => {
            let destination = require(ctx.destination_airport, "Cannot set approach without destination airport")?;
            let approach = find_procedure(&destination.approaches, database_id).ok_or_else(|| {
                FlightPlanError::not_found("approach", format!("{} {}", destination.ident, database_id))
            })?;
            Ok(ResolvedProcedure::from_procedure(approach, &approach.legs, Descent))
        }
        SegmentKind::MissedApproach => {
            let destination = require(ctx.destination_airport, "Cannot set missed approach without destination airport")?;
            let approach = find_procedure(&destination.approaches, database_id).ok_or_else(|| {
                FlightPlanError::not_found("approach", format!("{} {}", destination.ident, database_id))
            })?;
            Ok(ResolvedProcedure::from_procedure(approach, &approach.missed_legs, Climb))
        }
        SegmentKind::Origin | SegmentKind::Enroute | SegmentKind::Destination => Err(
            FlightPlanError::precondition(format!("{} segment has no procedures", kind)),
        ),
    }
}
