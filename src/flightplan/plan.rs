use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use super::fix_info::{slot_offset, FixInfoEntry, FIX_INFO_SLOTS};
use super::legs::{CruiseStep, FlightPlanElement, FlightPlanLeg, HoldData, LegDefinition, WaypointConstraintType};
use super::pending::{PendingOperation, PendingOperations};
use super::pending_airways::PendingAirways;
use super::performance::PerformanceData;
use super::restring::{restring, RestringScope};
use super::segments::{resolve_procedure, FlightPlanSegment, ProcedureContext, SegmentKind, SelectedProcedure};
use crate::error::{FlightPlanError, Result};
use crate::manager::{EventPublisher, FlightPlanEvent, FlightPlanIndex};
use crate::navdata::{
    Airport, AltitudeConstraint, AltitudeDescriptor, Coordinates, Fix, LegType, NavigationDatabase,
    Procedure, ProcedureKind, Runway, SpeedConstraint, SpeedDescriptor,
};
use crate::utils::navigation::abeam_point;

const DEPARTURE_PROCEDURE_SEGMENTS: [SegmentKind; 3] = [
    SegmentKind::DepartureRunwayTransition,
    SegmentKind::Departure,
    SegmentKind::DepartureEnrouteTransition,
];

const ARRIVAL_PROCEDURE_SEGMENTS: [SegmentKind; 6] = [
    SegmentKind::ArrivalEnrouteTransition,
    SegmentKind::Arrival,
    SegmentKind::ArrivalRunwayTransition,
    SegmentKind::ApproachVia,
    SegmentKind::Approach,
    SegmentKind::MissedApproach,
];

/// Where a new element goes when it sits on a segment boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InsertBias {
    Following,
    Preceding,
}

/// A complete route: segments in fixed order plus the data hanging off it.
///
/// Every public mutation is all-or-nothing. It runs against the live plan,
/// drains the operations it queued (rebuilds, then restrings) and cleans up
/// discontinuities; if any step fails the plan is put back exactly as it was
/// and no event is published.
#[derive(Clone)]
pub struct FlightPlan {
    index: FlightPlanIndex,
    is_alternate: bool,
    segments: Vec<FlightPlanSegment>,
    origin_airport: Option<Airport>,
    origin_runway: Option<Runway>,
    destination_airport: Option<Airport>,
    destination_runway: Option<Runway>,
    alternate: Option<Box<FlightPlan>>,
    fix_info: [Option<FixInfoEntry>; FIX_INFO_SLOTS],
    performance: PerformanceData,
    active_leg_index: usize,
    pending_airways: Option<PendingAirways>,
    operations: PendingOperations,
    outbox: Vec<FlightPlanEvent>,
    database: Arc<dyn NavigationDatabase>,
    events: EventPublisher,
}

impl FlightPlan {
    pub fn new(index: FlightPlanIndex, database: Arc<dyn NavigationDatabase>, events: EventPublisher) -> Self {
        Self::build(index, false, database, events)
    }

    fn build(
        index: FlightPlanIndex,
        is_alternate: bool,
        database: Arc<dyn NavigationDatabase>,
        events: EventPublisher,
    ) -> Self {
        Self {
            index,
            is_alternate,
            segments: SegmentKind::ALL.iter().map(|kind| FlightPlanSegment::new(*kind)).collect(),
            origin_airport: None,
            origin_runway: None,
            destination_airport: None,
            destination_runway: None,
            alternate: None,
            fix_info: Default::default(),
            performance: PerformanceData::default(),
            active_leg_index: 1,
            pending_airways: None,
            operations: PendingOperations::default(),
            outbox: Vec::new(),
            database,
            events,
        }
    }

    /// Deep copy placed in another manager slot
    pub fn clone_for(&self, index: FlightPlanIndex) -> Self {
        let mut copy = self.clone();
        copy.index = index;
        if let Some(alternate) = copy.alternate.as_mut() {
            alternate.index = index;
        }
        copy.outbox.clear();
        copy
    }

    // ---- Accessors ----

    pub fn index(&self) -> FlightPlanIndex {
        self.index
    }

    pub fn is_alternate(&self) -> bool {
        self.is_alternate
    }

    pub fn segments(&self) -> &[FlightPlanSegment] {
        &self.segments
    }

    pub fn segment(&self, kind: SegmentKind) -> &FlightPlanSegment {
        &self.segments[kind.position()]
    }

    fn segment_mut(&mut self, kind: SegmentKind) -> &mut FlightPlanSegment {
        &mut self.segments[kind.position()]
    }

    pub fn origin_airport(&self) -> Option<&Airport> {
        self.origin_airport.as_ref()
    }

    pub fn origin_runway(&self) -> Option<&Runway> {
        self.origin_runway.as_ref()
    }

    pub fn destination_airport(&self) -> Option<&Airport> {
        self.destination_airport.as_ref()
    }

    pub fn destination_runway(&self) -> Option<&Runway> {
        self.destination_runway.as_ref()
    }

    /// Selection of a procedure-backed segment
    pub fn procedure(&self, kind: SegmentKind) -> Option<&SelectedProcedure> {
        self.segment(kind).procedure()
    }

    pub fn alternate(&self) -> Option<&FlightPlan> {
        self.alternate.as_deref()
    }

    pub fn alternate_mut(&mut self) -> Option<&mut FlightPlan> {
        self.alternate.as_deref_mut()
    }

    pub fn performance(&self) -> &PerformanceData {
        &self.performance
    }

    pub fn active_leg_index(&self) -> usize {
        self.active_leg_index
    }

    pub fn pending_airways(&self) -> Option<&PendingAirways> {
        self.pending_airways.as_ref()
    }

    /// Fix info entry in a 1-based slot
    pub fn fix_info(&self, slot: usize) -> Result<Option<&FixInfoEntry>> {
        Ok(self.fix_info[slot_offset(slot)?].as_ref())
    }

    /// The flattened leg sequence
    pub fn elements(&self) -> impl Iterator<Item = &FlightPlanElement> + '_ {
        self.segments.iter().flat_map(|segment| segment.all_legs())
    }

    pub fn all_legs(&self) -> Vec<FlightPlanElement> {
        self.elements().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.segments.iter().map(FlightPlanSegment::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn maybe_element_at(&self, index: usize) -> Option<&FlightPlanElement> {
        let (position, local) = self.locate(index)?;
        self.segments[position].all_legs().get(local)
    }

    pub fn element_at(&self, index: usize) -> Result<&FlightPlanElement> {
        self.maybe_element_at(index).ok_or(FlightPlanError::IndexOutOfRange {
            index,
            len: self.len(),
        })
    }

    pub fn leg_at(&self, index: usize) -> Result<&FlightPlanLeg> {
        self.element_at(index)?
            .as_leg()
            .ok_or_else(|| FlightPlanError::precondition(format!("Element {} is a discontinuity", index)))
    }

    pub fn active_leg(&self) -> Option<&FlightPlanLeg> {
        self.maybe_element_at(self.active_leg_index).and_then(FlightPlanElement::as_leg)
    }

    /// Segment kind of the element at a flattened index
    pub fn segment_kind_at(&self, index: usize) -> Option<SegmentKind> {
        self.locate(index).map(|(position, _)| SegmentKind::ALL[position])
    }

    pub fn contains_waypoint(&self, fix: &Fix) -> bool {
        self.elements().any(|element| element.terminates_with_waypoint(fix))
    }

    fn locate(&self, index: usize) -> Option<(usize, usize)> {
        let mut offset = 0;
        for (position, segment) in self.segments.iter().enumerate() {
            if index < offset + segment.len() {
                return Some((position, index - offset));
            }
            offset += segment.len();
        }
        None
    }

    fn offset_of(&self, position: usize) -> usize {
        self.segments[..position].iter().map(FlightPlanSegment::len).sum()
    }

    fn element_at_mut(&mut self, index: usize) -> Result<&mut FlightPlanElement> {
        let len = self.len();
        let (position, local) = self.locate(index).ok_or(FlightPlanError::IndexOutOfRange { index, len })?;
        Ok(&mut self.segments[position].legs_mut()[local])
    }

    fn leg_at_mut(&mut self, index: usize) -> Result<&mut FlightPlanLeg> {
        self.element_at_mut(index)?
            .as_leg_mut()
            .ok_or_else(|| FlightPlanError::precondition(format!("Element {} is a discontinuity", index)))
    }

    fn selected_procedure(&self, kind: SegmentKind) -> Option<&Procedure> {
        let selection = self.segment(kind).procedure()?;
        let (airport, procedure_kind) = match kind {
            SegmentKind::Departure => (self.origin_airport.as_ref()?, ProcedureKind::Departure),
            SegmentKind::Arrival => (self.destination_airport.as_ref()?, ProcedureKind::Arrival),
            SegmentKind::Approach => (self.destination_airport.as_ref()?, ProcedureKind::Approach),
            _ => return None,
        };
        airport
            .procedures(procedure_kind)
            .iter()
            .find(|p| p.database_id == selection.database_id)
    }

    fn procedure_context(&self) -> ProcedureContext<'_> {
        ProcedureContext {
            origin_airport: self.origin_airport.as_ref(),
            origin_runway: self.origin_runway.as_ref(),
            departure: self.selected_procedure(SegmentKind::Departure),
            destination_airport: self.destination_airport.as_ref(),
            destination_runway: self.destination_runway.as_ref(),
            arrival: self.selected_procedure(SegmentKind::Arrival),
            approach: self.selected_procedure(SegmentKind::Approach),
        }
    }

    // ---- Transactions ----

    fn transact<T>(&mut self, operation: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let snapshot = self.clone();

        let result = operation(self).and_then(|value| {
            self.settle()?;
            Ok(value)
        });

        match result {
            Ok(value) => {
                self.publish_changes(&snapshot);
                Ok(value)
            }
            Err(err) => {
                debug!("[FLIGHTPLAN] {} edit rolled back: {}", self.index, err);
                *self = snapshot;
                Err(err)
            }
        }
    }

    /// Drains queued operations and restores the discontinuity invariants
    fn settle(&mut self) -> Result<()> {
        while let Some(operation) = self.operations.next() {
            match operation {
                PendingOperation::RebuildDeparture => self.rebuild_departure()?,
                PendingOperation::RebuildArrivalAndApproach => self.rebuild_arrival_and_approach()?,
                PendingOperation::RestringDeparture => restring(&mut self.segments, RestringScope::Departure),
                PendingOperation::RestringArrival => restring(&mut self.segments, RestringScope::Arrival),
            }
        }
        debug_assert!(self.operations.is_empty());
        self.normalize_discontinuities();
        Ok(())
    }

    fn publish_changes(&mut self, before: &FlightPlan) {
        let mut events = Vec::new();
        self.collect_changes(Some(before), &mut events);
        for event in events {
            self.events.publish(event);
        }
    }

    fn collect_changes(&mut self, before: Option<&FlightPlan>, events: &mut Vec<FlightPlanEvent>) {
        for segment in &self.segments {
            let unchanged = match before {
                Some(before) => before.segment(segment.kind()).same_layout(segment),
                None => segment.is_empty(),
            };
            if !unchanged {
                events.push(FlightPlanEvent::SegmentLegsChanged {
                    plan: self.index,
                    alternate: self.is_alternate,
                    segment: segment.kind(),
                });
            }
        }

        if before.map(|b| b.active_leg_index) != Some(self.active_leg_index) && !self.is_alternate {
            events.push(FlightPlanEvent::ActiveLegChanged {
                plan: self.index,
                index: self.active_leg_index,
            });
        }

        events.append(&mut self.outbox);

        let previous_alternate = before.and_then(|b| b.alternate.as_deref());
        if let Some(alternate) = self.alternate.as_deref_mut() {
            alternate.collect_changes(previous_alternate, events);
        } else if let Some(removed) = previous_alternate {
            for segment in removed.segments.iter().filter(|s| !s.is_empty()) {
                events.push(FlightPlanEvent::SegmentLegsChanged {
                    plan: self.index,
                    alternate: true,
                    segment: segment.kind(),
                });
            }
        }
    }

    fn notify_leg_edited(&mut self, index: usize) {
        self.outbox.push(FlightPlanEvent::LegDefinitionEdited {
            plan: self.index,
            alternate: self.is_alternate,
            index,
        });
    }

    // ---- Airports and runways ----

    pub fn set_origin_airport(&mut self, icao: &str) -> Result<()> {
        self.transact(|plan| {
            let airport = plan.database.airport(icao)?;
            plan.load_origin(airport);
            Ok(())
        })
    }

    fn load_origin(&mut self, airport: Airport) {
        info!("[FLIGHTPLAN] {} origin set to {}", self.index, airport.ident);

        self.origin_runway = None;
        for kind in DEPARTURE_PROCEDURE_SEGMENTS {
            self.segment_mut(kind).reset();
        }

        let leg = FlightPlanLeg::origin(SegmentKind::Origin, &airport, None);
        self.origin_airport = Some(airport);
        self.segment_mut(SegmentKind::Origin).set_legs(vec![leg.into()]);
        self.operations.enqueue_for(SegmentKind::Origin);
    }

    pub fn set_origin_runway(&mut self, ident: &str) -> Result<()> {
        self.transact(|plan| {
            let airport = plan
                .origin_airport
                .as_ref()
                .ok_or_else(|| FlightPlanError::precondition("Cannot set origin runway without origin airport"))?;
            let runway = find_runway(airport, ident)?;

            info!("[FLIGHTPLAN] {} origin runway set to {}", plan.index, runway.ident);
            let leg = FlightPlanLeg::origin(SegmentKind::Origin, airport, Some(&runway));
            plan.origin_runway = Some(runway);
            plan.segment_mut(SegmentKind::Origin).set_legs(vec![leg.into()]);
            plan.operations.enqueue_for(SegmentKind::Origin);
            Ok(())
        })
    }

    pub fn set_destination_airport(&mut self, icao: &str) -> Result<()> {
        self.transact(|plan| {
            let airport = plan.database.airport(icao)?;
            plan.replace_destination(airport)
        })
    }

    fn replace_destination(&mut self, airport: Airport) -> Result<()> {
        if let Some(alternate) = self.alternate.as_deref_mut() {
            alternate.load_origin(airport.clone());
            alternate.settle()?;
        }
        self.load_destination(airport);
        Ok(())
    }

    fn load_destination(&mut self, airport: Airport) {
        info!("[FLIGHTPLAN] {} destination set to {}", self.index, airport.ident);

        self.destination_runway = None;
        for kind in ARRIVAL_PROCEDURE_SEGMENTS {
            self.segment_mut(kind).reset();
        }

        let leg = FlightPlanLeg::destination(SegmentKind::Destination, &airport, None);
        self.destination_airport = Some(airport);
        self.segment_mut(SegmentKind::Destination).set_legs(vec![leg.into()]);
        self.operations.enqueue_for(SegmentKind::Destination);
    }

    pub fn set_destination_runway(&mut self, ident: &str) -> Result<()> {
        self.transact(|plan| {
            let airport = plan
                .destination_airport
                .as_ref()
                .ok_or_else(|| FlightPlanError::precondition("Cannot set destination runway without destination airport"))?;
            let runway = find_runway(airport, ident)?;
            plan.apply_destination_runway(runway);
            Ok(())
        })
    }

    fn apply_destination_runway(&mut self, runway: Runway) {
        let Some(airport) = self.destination_airport.as_ref() else {
            return;
        };
        info!("[FLIGHTPLAN] {} destination runway set to {}", self.index, runway.ident);

        // An approach to another runway no longer applies
        let approach_mismatch = self
            .selected_procedure(SegmentKind::Approach)
            .and_then(|approach| approach.runway_ident.as_deref())
            .is_some_and(|ident| ident != runway.ident);

        let leg = FlightPlanLeg::destination(SegmentKind::Destination, airport, Some(&runway));
        self.destination_runway = Some(runway);
        self.segment_mut(SegmentKind::Destination).set_legs(vec![leg.into()]);

        if approach_mismatch {
            for kind in [SegmentKind::ApproachVia, SegmentKind::Approach, SegmentKind::MissedApproach] {
                self.segment_mut(kind).reset();
            }
        }
        self.operations.enqueue_for(SegmentKind::Destination);
    }

    /// Creates the alternate plan, flown from this plan's destination
    pub fn set_alternate_destination_airport(&mut self, icao: &str) -> Result<()> {
        self.transact(|plan| {
            let destination = plan.destination_airport.clone().ok_or_else(|| {
                FlightPlanError::precondition("Cannot set alternate destination without destination airport")
            })?;
            let airport = plan.database.airport(icao)?;

            let mut alternate = FlightPlan::build(plan.index, true, Arc::clone(&plan.database), plan.events.clone());
            alternate.load_origin(destination);
            alternate.load_destination(airport);
            alternate.settle()?;

            plan.alternate = Some(Box::new(alternate));
            Ok(())
        })
    }

    pub fn delete_alternate_flight_plan(&mut self) -> Result<()> {
        self.transact(|plan| {
            plan.alternate = None;
            Ok(())
        })
    }

    // ---- Procedures ----

    pub fn set_departure(&mut self, database_id: Option<&str>) -> Result<()> {
        self.transact(|plan| plan.set_segment_procedure(SegmentKind::Departure, database_id))
    }

    /// Picks a runway transition of the selected departure explicitly
    pub fn set_departure_runway(&mut self, database_id: Option<&str>) -> Result<()> {
        self.transact(|plan| plan.set_segment_procedure(SegmentKind::DepartureRunwayTransition, database_id))
    }

    pub fn set_departure_enroute_transition(&mut self, database_id: Option<&str>) -> Result<()> {
        self.transact(|plan| plan.set_segment_procedure(SegmentKind::DepartureEnrouteTransition, database_id))
    }

    pub fn set_arrival_enroute_transition(&mut self, database_id: Option<&str>) -> Result<()> {
        self.transact(|plan| plan.set_segment_procedure(SegmentKind::ArrivalEnrouteTransition, database_id))
    }

    pub fn set_arrival(&mut self, database_id: Option<&str>) -> Result<()> {
        self.transact(|plan| plan.set_segment_procedure(SegmentKind::Arrival, database_id))
    }

    pub fn set_approach_via(&mut self, database_id: Option<&str>) -> Result<()> {
        self.transact(|plan| plan.set_segment_procedure(SegmentKind::ApproachVia, database_id))
    }

    pub fn set_approach(&mut self, database_id: Option<&str>) -> Result<()> {
        self.transact(|plan| {
            plan.set_segment_procedure(SegmentKind::Approach, database_id)?;

            let runway = plan
                .selected_procedure(SegmentKind::Approach)
                .and_then(|approach| approach.runway_ident.as_deref())
                .and_then(|ident| plan.destination_airport.as_ref()?.runway(ident))
                .cloned();
            if let Some(runway) = runway {
                if plan.destination_runway.as_ref() != Some(&runway) {
                    plan.apply_destination_runway(runway);
                }
            }
            Ok(())
        })
    }

    fn set_segment_procedure(&mut self, kind: SegmentKind, database_id: Option<&str>) -> Result<()> {
        let resolved = match database_id {
            Some(id) => Some(resolve_procedure(kind, &self.procedure_context(), id)?),
            None => None,
        };

        match &resolved {
            Some(r) => info!("[FLIGHTPLAN] {} {} set to {}", self.index, kind, r.selection.ident),
            None => info!("[FLIGHTPLAN] {} {} cleared", self.index, kind),
        }

        self.segment_mut(kind).set_procedure(resolved, false);
        self.operations.enqueue_for(kind);
        Ok(())
    }

    /// Restores a segment as it was saved, selection and legs together.
    ///
    /// The legs are taken as given: nothing is rebuilt from the database and
    /// no restring is queued, so a plan loaded segment by segment from the
    /// bottom up does not churn through intermediate states.
    pub fn load_segment(
        &mut self,
        kind: SegmentKind,
        database_id: Option<&str>,
        legs: Vec<FlightPlanElement>,
    ) -> Result<()> {
        self.transact(|plan| {
            let resolved = match database_id {
                Some(id) => Some(resolve_procedure(kind, &plan.procedure_context(), id)?),
                None => None,
            };

            let segment = plan.segment_mut(kind);
            segment.set_procedure(resolved, true);
            segment.set_legs(legs);
            segment.set_strung(true);
            debug!("[FLIGHTPLAN] {} {} loaded", plan.index, kind);
            Ok(())
        })
    }

    /// Brings a dependent segment to `wanted`, leaving it alone if that is
    /// already the selection
    fn sync_segment(&mut self, kind: SegmentKind, wanted: Option<&str>) -> Result<()> {
        let current = self.segment(kind).procedure().map(|p| p.database_id.as_str());
        if current == wanted {
            return Ok(());
        }
        self.set_segment_procedure(kind, wanted)
    }

    fn rebuild_departure(&mut self) -> Result<()> {
        let departure = self.selected_procedure(SegmentKind::Departure).cloned();

        let runway_transition = match (&departure, &self.origin_runway) {
            (Some(departure), Some(runway)) => departure
                .runway_transitions
                .iter()
                .find(|t| t.ident == runway.ident)
                .map(|t| t.database_id.clone()),
            _ => None,
        };
        self.sync_segment(SegmentKind::DepartureRunwayTransition, runway_transition.as_deref())?;

        let still_valid = |selection: &SelectedProcedure| {
            departure
                .as_ref()
                .is_some_and(|d| d.enroute_transitions.iter().any(|t| t.database_id == selection.database_id))
        };
        if self.procedure(SegmentKind::DepartureEnrouteTransition).is_some_and(|s| !still_valid(s)) {
            self.sync_segment(SegmentKind::DepartureEnrouteTransition, None)?;
        }
        Ok(())
    }

    fn rebuild_arrival_and_approach(&mut self) -> Result<()> {
        let arrival = self.selected_procedure(SegmentKind::Arrival).cloned();
        let approach = self.selected_procedure(SegmentKind::Approach).cloned();

        let transition_valid = |selection: &SelectedProcedure| {
            arrival
                .as_ref()
                .is_some_and(|a| a.enroute_transitions.iter().any(|t| t.database_id == selection.database_id))
        };
        if self.procedure(SegmentKind::ArrivalEnrouteTransition).is_some_and(|s| !transition_valid(s)) {
            self.sync_segment(SegmentKind::ArrivalEnrouteTransition, None)?;
        }

        let runway_transition = match (&arrival, &self.destination_runway) {
            (Some(arrival), Some(runway)) => arrival
                .runway_transitions
                .iter()
                .find(|t| t.ident == runway.ident)
                .map(|t| t.database_id.clone()),
            _ => None,
        };
        self.sync_segment(SegmentKind::ArrivalRunwayTransition, runway_transition.as_deref())?;

        let via_valid = |selection: &SelectedProcedure| {
            approach
                .as_ref()
                .is_some_and(|a| a.vias.iter().any(|v| v.database_id == selection.database_id))
        };
        if self.procedure(SegmentKind::ApproachVia).is_some_and(|s| !via_valid(s)) {
            self.sync_segment(SegmentKind::ApproachVia, None)?;
        }

        let missed = approach.as_ref().map(|a| a.database_id.clone());
        self.sync_segment(SegmentKind::MissedApproach, missed.as_deref())?;
        Ok(())
    }

    // ---- Element primitives ----

    /// Segment and local position a new element at flattened `index` goes to
    fn insertion_point(&self, index: usize, bias: InsertBias) -> Result<(usize, usize)> {
        let following = self
            .locate(index)
            .filter(|(position, _)| SegmentKind::ALL[*position].accepts_manual_legs());
        let preceding = index
            .checked_sub(1)
            .and_then(|i| self.locate(i))
            .filter(|(position, _)| SegmentKind::ALL[*position].accepts_manual_legs())
            .map(|(position, local)| (position, local + 1));

        let chosen = match bias {
            InsertBias::Following => following.or(preceding),
            InsertBias::Preceding => preceding.or(following),
        };
        if let Some(point) = chosen {
            return Ok(point);
        }

        // Between two segments that take no manual legs, use the (empty) enroute
        let before = index
            .checked_sub(1)
            .and_then(|i| self.segment_kind_at(i))
            .unwrap_or(SegmentKind::Origin);
        let after = self.segment_kind_at(index).unwrap_or(SegmentKind::MissedApproach);
        if before <= SegmentKind::Enroute && SegmentKind::Enroute <= after {
            let enroute = SegmentKind::Enroute.position();
            return Ok((enroute, self.segments[enroute].len()));
        }

        Err(FlightPlanError::precondition(format!(
            "Cannot insert an element at index {}",
            index
        )))
    }

    fn insert_element(&mut self, position: usize, local: usize, element: FlightPlanElement) -> usize {
        let index = self.offset_of(position) + local;
        self.segments[position].insert(local, element);
        if index < self.active_leg_index {
            self.active_leg_index += 1;
        }
        index
    }

    fn remove_element(&mut self, index: usize) -> Option<FlightPlanElement> {
        let (position, local) = self.locate(index)?;
        let removed = self.segments[position].legs_mut().remove(local);
        if index < self.active_leg_index {
            self.active_leg_index -= 1;
        }
        Some(removed)
    }

    /// Removes `[start, end)`
    fn remove_range(&mut self, start: usize, end: usize) {
        for _ in start..end {
            self.remove_element(start);
        }
    }

    fn convert_to_track_at(&mut self, index: usize) {
        if let Ok(leg) = self.leg_at_mut(index) {
            leg.convert_to_track();
        }
    }

    /// Drops leading, trailing and doubled discontinuities
    fn normalize_discontinuities(&mut self) {
        loop {
            let discos: Vec<bool> = self.elements().map(FlightPlanElement::is_discontinuity).collect();
            let target = if discos.first() == Some(&true) {
                Some(0)
            } else if discos.last() == Some(&true) {
                Some(discos.len() - 1)
            } else {
                discos.windows(2).position(|w| w[0] && w[1]).map(|i| i + 1)
            };

            match target {
                Some(index) => {
                    self.remove_element(index);
                }
                None => break,
            }
        }
    }

    /// Moves whatever is left of the arrival side into the enroute segment
    fn redistribute_arrival_legs(&mut self) {
        let mut moved = Vec::new();
        for kind in SegmentKind::ALL.into_iter().filter(|k| *k > SegmentKind::Enroute) {
            let segment = self.segment_mut(kind);
            moved.extend(segment.legs_mut().drain(..));
            segment.reset();
        }

        let enroute = self.segment_mut(SegmentKind::Enroute);
        for element in moved {
            let position = enroute.len();
            enroute.insert(position, element);
        }
    }

    /// Drops the selection of departure segments a truncation left without
    /// legs. A runway transition whose SID went away keeps its legs but
    /// loses its selection.
    fn reset_emptied_departure_segments(&mut self) {
        for kind in DEPARTURE_PROCEDURE_SEGMENTS {
            if self.segment(kind).is_empty() && self.segment(kind).procedure().is_some() {
                debug!("[FLIGHTPLAN] {} {} cleared by truncation", self.index, kind);
                self.segment_mut(kind).reset();
            }
        }

        let orphaned = self.segment(SegmentKind::Departure).procedure().is_none()
            && self.segment(SegmentKind::DepartureRunwayTransition).procedure().is_some();
        if orphaned {
            self.segment_mut(SegmentKind::DepartureRunwayTransition).set_procedure(None, true);
        }
    }

    // ---- Lateral revisions ----

    pub fn insert_waypoint_before(&mut self, index: usize, fix: &Fix) -> Result<()> {
        self.transact(|plan| {
            if index == 0 {
                return Err(FlightPlanError::precondition("Cannot insert a waypoint before the origin"));
            }
            if index > plan.len() {
                return Err(FlightPlanError::IndexOutOfRange { index, len: plan.len() });
            }

            let (position, local) = plan.insertion_point(index, InsertBias::Following)?;
            let leg = FlightPlanLeg::from_enroute_fix(SegmentKind::ALL[position], fix, None, LegType::TF);
            let inserted = plan.insert_element(position, local, leg.into());
            plan.convert_to_track_at(inserted + 1);

            debug!("[FLIGHTPLAN] {} inserted {} at {}", plan.index, fix.ident, inserted);
            Ok(())
        })
    }

    /// Makes `fix` the waypoint after `index`, skipping ahead to it if it is
    /// already further down the route
    pub fn next_waypoint(&mut self, index: usize, fix: &Fix) -> Result<()> {
        self.transact(|plan| {
            let leg = plan.leg_at(index)?;
            if leg.segment() >= SegmentKind::Destination {
                return Err(FlightPlanError::precondition("Cannot insert a waypoint after the destination"));
            }

            let downstream = (index + 1..plan.len()).find(|&i| {
                plan.segment_kind_at(i).is_some_and(|k| k < SegmentKind::Destination)
                    && plan.maybe_element_at(i).is_some_and(|e| e.terminates_with_waypoint(fix))
            });

            if let Some(found) = downstream {
                plan.remove_range(index + 1, found);
                plan.convert_to_track_at(index + 1);
                return Ok(());
            }

            let (position, local) = plan.insertion_point(index + 1, InsertBias::Preceding)?;
            let leg = FlightPlanLeg::from_enroute_fix(SegmentKind::ALL[position], fix, None, LegType::TF);
            let inserted = plan.insert_element(position, local, leg.into());

            let followed_by_leg = plan.maybe_element_at(inserted + 1).is_some_and(|e| !e.is_discontinuity());
            if followed_by_leg {
                plan.insert_element(position, local + 1, FlightPlanElement::Discontinuity);
            }
            Ok(())
        })
    }

    pub fn remove_element_at(&mut self, index: usize) -> Result<()> {
        self.transact(|plan| {
            let element = plan.element_at(index)?.clone();
            let previous = index.checked_sub(1).and_then(|i| plan.maybe_element_at(i)).cloned();
            let next = plan.maybe_element_at(index + 1).cloned();

            match element {
                FlightPlanElement::Leg(leg) => {
                    if index == 0 || matches!(leg.segment(), SegmentKind::Origin | SegmentKind::Destination) {
                        return Err(FlightPlanError::precondition(format!(
                            "Cannot delete {} which bounds the route",
                            leg.ident()
                        )));
                    }

                    let previous_is_leg = previous.as_ref().is_some_and(|e| !e.is_discontinuity());
                    let next_is_leg = next.as_ref().is_some_and(|e| !e.is_discontinuity());
                    let both_discos = previous.as_ref().is_some_and(FlightPlanElement::is_discontinuity)
                        && next.as_ref().is_some_and(FlightPlanElement::is_discontinuity);

                    if previous_is_leg && next_is_leg {
                        *plan.element_at_mut(index)? = FlightPlanElement::Discontinuity;
                    } else if both_discos {
                        plan.remove_range(index, index + 2);
                    } else {
                        plan.remove_element(index);
                    }
                    debug!("[FLIGHTPLAN] {} removed {} at {}", plan.index, leg.ident(), index);
                }
                FlightPlanElement::Discontinuity => {
                    let after_manual_leg = previous
                        .as_ref()
                        .and_then(FlightPlanElement::as_leg)
                        .is_some_and(FlightPlanLeg::is_vectors);
                    if after_manual_leg {
                        return Err(FlightPlanError::precondition(
                            "Cannot clear a discontinuity after a manually terminated leg",
                        ));
                    }

                    plan.remove_element(index);
                    plan.convert_to_track_at(index);
                }
            }
            Ok(())
        })
    }

    /// Flies from present position straight to `fix`.
    ///
    /// The turning point takes the active slot and the leg after it
    /// becomes the new active leg. With `with_abeam`, every bypassed fix
    /// that lies abeam the new path is kept as a synthetic point.
    pub fn direct_to(&mut self, ppos: Coordinates, true_track: f64, fix: &Fix, with_abeam: bool) -> Result<()> {
        self.transact(|plan| {
            let active = plan.active_leg_index;
            if active > plan.len() {
                return Err(FlightPlanError::precondition("No active leg to fly a direct from"));
            }

            let in_missed = plan.segment_kind_at(active) == Some(SegmentKind::MissedApproach);
            let target = (active..plan.len()).find(|&i| {
                (in_missed || plan.segment_kind_at(i) != Some(SegmentKind::MissedApproach))
                    && plan.maybe_element_at(i).is_some_and(|e| e.terminates_with_waypoint(fix))
            });

            info!("[FLIGHTPLAN] {} direct to {} from {:?}", plan.index, fix.ident, ppos);

            let Some(target) = target else {
                let (position, local) = plan.insertion_point(active, InsertBias::Following)?;
                let kind = SegmentKind::ALL[position];
                let followed = plan.maybe_element_at(active).is_some_and(|e| !e.is_discontinuity());

                let mut elements = vec![
                    FlightPlanLeg::turning_point(kind, ppos, true_track).into(),
                    FlightPlanLeg::direct_to(kind, fix).into(),
                ];
                if followed {
                    elements.push(FlightPlanElement::Discontinuity);
                }
                for (n, element) in elements.into_iter().enumerate() {
                    plan.segments[position].insert(local + n, element);
                }
                plan.active_leg_index = active + 1;
                return Ok(());
            };

            let bypassed: Vec<Fix> = if with_abeam {
                (active..target)
                    .filter_map(|i| plan.maybe_element_at(i).and_then(FlightPlanElement::as_leg))
                    .filter(|leg| !leg.is_turning_point() && !leg.flags().direct_to_abeam)
                    .filter_map(|leg| leg.termination_waypoint().cloned())
                    .collect()
            } else {
                Vec::new()
            };

            plan.remove_range(active, target);

            let target_kind = plan.segment_kind_at(active).unwrap_or(SegmentKind::Enroute);
            if target_kind != SegmentKind::Destination {
                let previous = plan.leg_at(active)?.clone();
                let mut direct = FlightPlanLeg::direct_to(target_kind, fix);
                direct.absorb_constraints(&previous);
                *plan.element_at_mut(active)? = direct.into();
            }

            let (position, local) = plan.insertion_point(active, InsertBias::Following)?;
            let kind = SegmentKind::ALL[position];
            let mut elements: Vec<FlightPlanElement> = vec![FlightPlanLeg::turning_point(kind, ppos, true_track).into()];
            elements.extend(bypassed.iter().filter_map(|bypassed| {
                abeam_point(ppos, fix.location, bypassed.location)
                    .map(|location| FlightPlanLeg::abeam(kind, bypassed, location).into())
            }));

            for (n, element) in elements.into_iter().enumerate() {
                plan.segments[position].insert(local + n, element);
            }
            plan.active_leg_index = active + 1;
            Ok(())
        })
    }

    /// Truncates the route after `index` and diverts to a new destination
    pub fn new_dest(&mut self, index: usize, icao: &str) -> Result<()> {
        self.transact(|plan| {
            let airport = plan.database.airport(icao)?;
            let leg = plan.leg_at(index)?;
            if leg.segment() >= SegmentKind::Destination {
                return Err(FlightPlanError::precondition("Cannot divert from the destination or beyond"));
            }

            let len = plan.len();
            plan.remove_range(index + 1, len);
            plan.redistribute_arrival_legs();
            plan.reset_emptied_departure_segments();
            plan.replace_destination(airport)?;

            let (position, local) = plan.insertion_point(index + 1, InsertBias::Preceding)?;
            plan.insert_element(position, local, FlightPlanElement::Discontinuity);
            plan.operations.enqueue_for(SegmentKind::Enroute);
            Ok(())
        })
    }

    /// Switches the route over to the alternate, joining it at
    /// `index_in_alternate`. Everything after the active leg is replaced.
    pub fn enable_altn(&mut self, index_in_alternate: usize) -> Result<()> {
        self.transact(|plan| {
            let alternate = plan.alternate.take().ok_or_else(|| {
                FlightPlanError::precondition("Cannot enable alternate with no alternate destination defined")
            })?;
            if index_in_alternate >= alternate.len() {
                return Err(FlightPlanError::IndexOutOfRange {
                    index: index_in_alternate,
                    len: alternate.len(),
                });
            }

            info!("[FLIGHTPLAN] {} enabling alternate at {}", plan.index, index_in_alternate);

            let len = plan.len();
            plan.remove_range(plan.active_leg_index + 1, len);
            plan.redistribute_arrival_legs();
            plan.reset_emptied_departure_segments();

            let carried: Vec<FlightPlanElement> = (index_in_alternate..alternate.len())
                .filter(|&i| {
                    alternate
                        .segment_kind_at(i)
                        .is_some_and(|k| k > SegmentKind::Origin && k <= SegmentKind::Enroute)
                })
                .filter_map(|i| alternate.maybe_element_at(i).cloned())
                .collect();

            let ends_with_leg = plan.elements().last().is_some_and(|e| !e.is_discontinuity());
            let enroute = plan.segment_mut(SegmentKind::Enroute);
            if ends_with_leg && !carried.is_empty() {
                enroute.legs_mut().push(FlightPlanElement::Discontinuity);
            }
            for element in carried {
                let position = enroute.len();
                enroute.insert(position, element);
            }
            enroute.set_strung(false);

            plan.destination_airport = alternate.destination_airport.clone();
            plan.destination_runway = alternate.destination_runway.clone();
            for kind in SegmentKind::ALL.into_iter().filter(|k| *k > SegmentKind::Enroute) {
                let mut segment = alternate.segment(kind).clone();
                segment.set_strung(false);
                plan.segments[kind.position()] = segment;
            }

            plan.operations.enqueue(PendingOperation::RebuildArrivalAndApproach);
            plan.operations.enqueue(PendingOperation::RestringArrival);
            Ok(())
        })
    }

    // ---- Holds ----

    /// Edits the hold at or right after `index`, or inserts a manual hold
    /// after it. Returns the index of the hold.
    pub fn add_or_edit_manual_hold(
        &mut self,
        index: usize,
        desired: HoldData,
        modified: Option<HoldData>,
        default: HoldData,
    ) -> Result<usize> {
        self.transact(|plan| {
            let next_is_hold = plan
                .maybe_element_at(index + 1)
                .and_then(FlightPlanElement::as_leg)
                .is_some_and(FlightPlanLeg::is_hx);
            let leg = plan.leg_at(index)?;
            let at_hold = leg.is_hx();
            let fix = leg.termination_waypoint().cloned();

            let existing = if next_is_hold {
                Some(index + 1)
            } else if at_hold {
                Some(index)
            } else {
                None
            };

            if let Some(at) = existing {
                let hold = plan.leg_at_mut(at)?;
                hold.convert_to_manual_hold();
                match modified {
                    Some(modified) => hold.edit_hold(modified, default),
                    None => hold.set_default_hold(default),
                }
                plan.notify_leg_edited(at);
                return Ok(at);
            }

            let fix = fix.ok_or_else(|| FlightPlanError::precondition("Cannot hold at a leg that does not end at a fix"))?;

            let (position, local) = plan.insertion_point(index + 1, InsertBias::Preceding)?;
            let mut hold = FlightPlanLeg::manual_hold(SegmentKind::ALL[position], &fix, desired);
            match modified {
                Some(modified) => hold.edit_hold(modified, default),
                None => hold.set_default_hold(default),
            }
            Ok(plan.insert_element(position, local, hold.into()))
        })
    }

    pub fn revert_hold_to_computed(&mut self, index: usize) -> Result<()> {
        self.transact(|plan| {
            let leg = plan.leg_at_mut(index)?;
            if !leg.is_hx() {
                return Err(FlightPlanError::precondition(format!("{} is not a hold", leg.ident())));
            }
            leg.revert_hold()?;
            plan.notify_leg_edited(index);
            Ok(())
        })
    }

    // ---- Leg edits ----

    fn edit_leg<T>(&mut self, index: usize, edit: impl FnOnce(&mut FlightPlanLeg) -> Result<T>) -> Result<T> {
        self.transact(|plan| {
            let value = edit(plan.leg_at_mut(index)?)?;
            plan.notify_leg_edited(index);
            Ok(value)
        })
    }

    pub fn set_altitude_constraint_at(
        &mut self,
        index: usize,
        constraint: Option<AltitudeConstraint>,
        is_descent: bool,
    ) -> Result<()> {
        self.edit_leg(index, |leg| leg.set_altitude_constraint(constraint, constraint_type(is_descent)))
    }

    /// Pilot altitude entry: at-or-above when descending, at-or-below when climbing
    pub fn set_altitude_at(&mut self, index: usize, altitude: Option<f64>, is_descent: bool) -> Result<()> {
        let constraint = altitude.map(|altitude1| AltitudeConstraint {
            descriptor: if is_descent {
                AltitudeDescriptor::AtOrAbove
            } else {
                AltitudeDescriptor::AtOrBelow
            },
            altitude1,
            altitude2: None,
        });
        self.set_altitude_constraint_at(index, constraint, is_descent)
    }

    pub fn set_altitude_description_at(&mut self, index: usize, descriptor: AltitudeDescriptor) -> Result<()> {
        self.edit_leg(index, |leg| leg.set_altitude_descriptor(descriptor))
    }

    pub fn set_speed_at(&mut self, index: usize, speed: Option<f64>, is_descent: bool) -> Result<()> {
        let constraint = speed.map(|speed| SpeedConstraint {
            descriptor: SpeedDescriptor::Maximum,
            speed,
        });
        self.edit_leg(index, |leg| leg.set_speed_constraint(constraint, constraint_type(is_descent)))
    }

    pub fn add_or_update_cruise_step(&mut self, index: usize, to_altitude: f64) -> Result<()> {
        self.edit_leg(index, |leg| leg.set_cruise_step(Some(CruiseStep { to_altitude })))
    }

    pub fn remove_cruise_step(&mut self, index: usize) -> Result<()> {
        self.edit_leg(index, |leg| {
            if leg.cruise_step().is_none() {
                return Err(FlightPlanError::precondition(format!("No cruise step at {}", leg.ident())));
            }
            leg.set_cruise_step(None)
        })
    }

    pub fn set_overfly_at(&mut self, index: usize, overfly: bool) -> Result<()> {
        self.edit_leg(index, |leg| leg.set_overfly(overfly))
    }

    /// Returns the new overfly state
    pub fn toggle_overfly_at(&mut self, index: usize) -> Result<bool> {
        self.edit_leg(index, |leg| {
            let overfly = !leg.overfly();
            leg.set_overfly(overfly)?;
            Ok(overfly)
        })
    }

    /// Raw edit of a leg definition, bypassing constraint validation
    pub fn edit_leg_definition(&mut self, index: usize, edit: impl FnOnce(&mut LegDefinition)) -> Result<()> {
        self.edit_leg(index, |leg| {
            edit(leg.definition_mut());
            Ok(())
        })
    }

    /// Moves a direct-to turning point right before the active leg to `ppos`
    pub(crate) fn refresh_turning_point(&mut self, ppos: Coordinates) -> Result<bool> {
        let Some(from) = self.active_leg_index.checked_sub(1) else {
            return Ok(false);
        };
        let is_turning_point = self
            .maybe_element_at(from)
            .and_then(FlightPlanElement::as_leg)
            .is_some_and(FlightPlanLeg::is_turning_point);
        if !is_turning_point {
            return Ok(false);
        }
        self.edit_leg(from, |leg| Ok(leg.refresh_turning_point(ppos)))
    }

    // ---- Active leg ----

    pub fn set_active_leg_index(&mut self, index: usize) -> Result<()> {
        self.transact(|plan| {
            plan.leg_at(index)?;
            plan.active_leg_index = index;
            Ok(())
        })
    }

    /// Advances the active leg by one. Returns the new active index.
    pub fn sequence(&mut self) -> Result<usize> {
        self.transact(|plan| {
            let next = plan.active_leg_index + 1;
            match plan.maybe_element_at(next) {
                None => Err(FlightPlanError::precondition("No leg left to sequence")),
                Some(FlightPlanElement::Discontinuity) => {
                    Err(FlightPlanError::precondition("Cannot sequence into a discontinuity"))
                }
                Some(FlightPlanElement::Leg(_)) => {
                    plan.active_leg_index = next;
                    Ok(next)
                }
            }
        })
    }

    // ---- Airway entry ----

    pub fn start_airway_entry(&mut self, index: usize) -> Result<()> {
        self.transact(|plan| {
            let leg = plan.leg_at(index)?;
            if leg.segment() >= SegmentKind::Destination {
                return Err(FlightPlanError::precondition("Cannot enter an airway after the destination"));
            }
            let from = leg
                .termination_waypoint()
                .cloned()
                .ok_or_else(|| FlightPlanError::precondition("Airway entry needs a leg ending at a fix"))?;

            plan.pending_airways = Some(PendingAirways::new(index, from));
            Ok(())
        })
    }

    pub fn add_airway(&mut self, ident: &str) -> Result<()> {
        self.transact(|plan| {
            let database = Arc::clone(&plan.database);
            plan.pending_airways_mut()?.add_airway(database.as_ref(), ident)
        })
    }

    pub fn add_airway_exit(&mut self, exit: &Fix) -> Result<()> {
        self.transact(|plan| plan.pending_airways_mut()?.add_airway_exit(exit))
    }

    fn pending_airways_mut(&mut self) -> Result<&mut PendingAirways> {
        self.pending_airways
            .as_mut()
            .ok_or_else(|| FlightPlanError::precondition("No airway entry in progress"))
    }

    pub fn discard_pending_airways(&mut self) {
        self.pending_airways = None;
    }

    /// Splices the pending airways into the route after the revision point
    pub fn finalize_pending_airways(&mut self) -> Result<()> {
        self.transact(|plan| {
            let Some(pending) = plan.pending_airways.take() else {
                return Ok(());
            };
            let revision = pending.revision_index();
            let (position, _) = plan.insertion_point(revision + 1, InsertBias::Preceding)?;
            let mut legs = pending.legs(SegmentKind::ALL[position]);
            let Some(exit) = legs.last().and_then(|leg| leg.termination_waypoint()).cloned() else {
                return Ok(());
            };

            let downstream = (revision + 1..plan.len()).find(|&i| {
                plan.segment_kind_at(i).is_some_and(|k| k < SegmentKind::Destination)
                    && plan.maybe_element_at(i).is_some_and(|e| e.terminates_with_waypoint(&exit))
            });

            let join_disco = match downstream {
                Some(found) => {
                    plan.remove_range(revision + 1, found);
                    if let Some(exit_leg) = legs.pop() {
                        let existing = plan.leg_at_mut(revision + 1)?;
                        if let Some(airway) = exit_leg.airway() {
                            existing.set_airway(airway);
                        }
                        existing.convert_to_track();
                    }
                    false
                }
                None => plan.maybe_element_at(revision + 1).is_some_and(|e| !e.is_discontinuity()),
            };

            info!("[FLIGHTPLAN] {} airways finalized with {} legs", plan.index, legs.len());

            let (position, local) = plan.insertion_point(revision + 1, InsertBias::Preceding)?;
            let count = legs.len();
            for (n, leg) in legs.into_iter().enumerate() {
                plan.insert_element(position, local + n, leg.into());
            }
            if join_disco {
                plan.insert_element(position, local + count, FlightPlanElement::Discontinuity);
            }
            Ok(())
        })
    }

    // ---- Fix info and performance ----

    pub fn set_fix_info_entry(&mut self, slot: usize, entry: Option<FixInfoEntry>) -> Result<()> {
        self.transact(|plan| {
            let offset = slot_offset(slot)?;
            if let Some(entry) = &entry {
                entry.validate()?;
            }
            plan.fix_info[offset] = entry;
            plan.outbox.push(FlightPlanEvent::FixInfoChanged { plan: plan.index, slot });
            Ok(())
        })
    }

    pub fn edit_fix_info_entry(&mut self, slot: usize, edit: impl FnOnce(&mut FixInfoEntry)) -> Result<()> {
        self.transact(|plan| {
            let offset = slot_offset(slot)?;
            let entry = plan.fix_info[offset]
                .as_mut()
                .ok_or_else(|| FlightPlanError::precondition(format!("Fix info slot {} is empty", slot)))?;
            edit(entry);
            entry.validate()?;
            plan.outbox.push(FlightPlanEvent::FixInfoChanged { plan: plan.index, slot });
            Ok(())
        })
    }

    pub fn set_performance_data(&mut self, data: PerformanceData) {
        self.edit_performance_data(|current| *current = data);
    }

    pub fn edit_performance_data(&mut self, edit: impl FnOnce(&mut PerformanceData)) {
        edit(&mut self.performance);
        self.events.publish(FlightPlanEvent::PerformanceDataChanged { plan: self.index });
    }
}

fn constraint_type(is_descent: bool) -> WaypointConstraintType {
    if is_descent {
        WaypointConstraintType::Descent
    } else {
        WaypointConstraintType::Climb
    }
}

/// Accepts both "RW27R" and "27R"
fn find_runway(airport: &Airport, ident: &str) -> Result<Runway> {
    let ident = ident.trim().to_ascii_uppercase();
    let full = if ident.starts_with("RW") {
        ident
    } else {
        format!("RW{}", ident)
    };
    airport
        .runway(&full)
        .cloned()
        .ok_or_else(|| FlightPlanError::not_found("runway", format!("{} {}", airport.ident, full)))
}

impl fmt::Debug for FlightPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlightPlan")
            .field("index", &self.index)
            .field("is_alternate", &self.is_alternate)
            .field("origin", &self.origin_airport.as_ref().map(|a| &a.ident))
            .field("destination", &self.destination_airport.as_ref().map(|a| &a.ident))
            .field("active_leg_index", &self.active_leg_index)
            .field("legs", &self.len())
            .field("alternate", &self.alternate)
            .finish()
    }
}

impl fmt::Display for FlightPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ident = |airport: Option<&Airport>| airport.map(|a| a.ident.clone()).unwrap_or_else(|| "----".to_string());
        writeln!(
            f,
            "{}{} {}/{}",
            self.index,
            if self.is_alternate { " ALTN" } else { "" },
            ident(self.origin_airport()),
            ident(self.destination_airport())
        )?;

        for (i, element) in self.elements().enumerate() {
            let marker = if i == self.active_leg_index { '>' } else { ' ' };
            writeln!(f, "{}{:>3} {}", marker, i, element)?;
        }
        Ok(())
    }
}
