mod shared;

pub use shared::SharedFlightPlanService;

use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::config::FpmConfig;
use crate::error::{FlightPlanError, Result};
use crate::flightplan::{FixInfoEntry, FlightPlan, HoldData, LegDefinition, PerformanceData};
use crate::manager::{FlightPlanIndex, FlightPlanManager, FlightPlanSyncEvent};
use crate::navdata::{AltitudeConstraint, AltitudeDescriptor, Fix, NavigationDatabase};
use crate::position::PositionProvider;

/// Entry point for everything that edits flight plans.
///
/// Structural edits aimed at the active plan are redirected to a temporary
/// copy which the pilot then inserts or erases. Which edit categories do
/// this depends on the aircraft's [`FpmConfig`].
pub struct FlightPlanService {
    manager: FlightPlanManager,
    config: FpmConfig,
    position: Arc<dyn PositionProvider>,
}

impl FlightPlanService {
    pub fn new(
        database: Arc<dyn NavigationDatabase>,
        position: Arc<dyn PositionProvider>,
        config: FpmConfig,
        event_capacity: usize,
    ) -> Self {
        Self {
            manager: FlightPlanManager::new(database, event_capacity),
            config,
            position,
        }
    }

    pub fn config(&self) -> &FpmConfig {
        &self.config
    }

    pub fn manager(&self) -> &FlightPlanManager {
        &self.manager
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FlightPlanSyncEvent> {
        self.manager.subscribe()
    }

    /// Creates the empty active, uplink and secondary plans
    pub fn create_flight_plans(&mut self) -> Result<()> {
        self.manager.create(FlightPlanIndex::Active)?;
        self.manager.create(FlightPlanIndex::Uplink)?;
        for n in 1..=self.config.num_secondary_plans {
            self.manager.create(FlightPlanIndex::Secondary(n))?;
        }
        Ok(())
    }

    pub fn reset(&mut self) -> Result<()> {
        info!("[FPS] Resetting all flight plans");
        self.manager.delete_all();
        self.create_flight_plans()
    }

    // ---- Accessors ----

    pub fn active(&self) -> Result<&FlightPlan> {
        self.manager.get(FlightPlanIndex::Active)
    }

    pub fn temporary(&self) -> Result<&FlightPlan> {
        self.manager.get(FlightPlanIndex::Temporary)
    }

    /// The plan the pilot is looking at: the temporary one if it exists
    pub fn active_or_temporary(&self) -> Result<&FlightPlan> {
        if self.has_temporary() {
            self.temporary()
        } else {
            self.active()
        }
    }

    pub fn uplink(&self) -> Result<&FlightPlan> {
        self.manager.get(FlightPlanIndex::Uplink)
    }

    pub fn secondary(&self, n: usize) -> Result<&FlightPlan> {
        self.manager.get(FlightPlanIndex::Secondary(n))
    }

    pub fn get(&self, index: FlightPlanIndex) -> Result<&FlightPlan> {
        self.manager.get(index)
    }

    pub fn has_active(&self) -> bool {
        self.manager.has(FlightPlanIndex::Active)
    }

    pub fn has_temporary(&self) -> bool {
        self.manager.has(FlightPlanIndex::Temporary)
    }

    pub fn has_uplink(&self) -> bool {
        self.manager.has(FlightPlanIndex::Uplink)
    }

    pub fn has_secondary(&self, n: usize) -> bool {
        self.manager.has(FlightPlanIndex::Secondary(n))
    }

    pub fn active_leg_index(&self) -> Result<usize> {
        Ok(self.active()?.active_leg_index())
    }

    // ---- Plan routing ----

    /// Index an edit aimed at `index` actually applies to
    pub fn prepare_destructive_modification(&mut self, index: FlightPlanIndex) -> Result<FlightPlanIndex> {
        if index != FlightPlanIndex::Active {
            return Ok(index);
        }
        if !self.has_temporary() {
            debug!("[FPS] Opening temporary flight plan");
            self.manager.copy(FlightPlanIndex::Active, FlightPlanIndex::Temporary)?;
        }
        Ok(FlightPlanIndex::Temporary)
    }

    fn plan_mut(&mut self, index: FlightPlanIndex, alternate: bool) -> Result<&mut FlightPlan> {
        let plan = self.manager.get_mut(index)?;
        if !alternate {
            return Ok(plan);
        }
        plan.alternate_mut()
            .ok_or_else(|| FlightPlanError::precondition(format!("{} has no alternate flight plan", index)))
    }

    fn destructive(&mut self, index: FlightPlanIndex, alternate: bool) -> Result<&mut FlightPlan> {
        let target = self.prepare_destructive_modification(index)?;
        self.plan_mut(target, alternate)
    }

    /// Routes through a temporary plan only when `use_temporary` is set
    fn configurable(&mut self, use_temporary: bool, index: FlightPlanIndex, alternate: bool) -> Result<&mut FlightPlan> {
        if use_temporary {
            self.destructive(index, alternate)
        } else {
            self.plan_mut(index, alternate)
        }
    }

    // ---- Temporary and uplink ----

    /// Commits the temporary plan to the active slot
    pub fn temporary_insert(&mut self) -> Result<()> {
        if !self.has_temporary() {
            return Err(FlightPlanError::precondition(
                "Cannot insert temporary flight plan when none exists",
            ));
        }

        let ppos = self.position.position();
        let temporary = self.manager.get_mut(FlightPlanIndex::Temporary)?;
        temporary.finalize_pending_airways()?;
        if let Some(alternate) = temporary.alternate_mut() {
            alternate.finalize_pending_airways()?;
        }
        if temporary.refresh_turning_point(ppos)? {
            debug!("[FPS] Turning point moved to {:?}", ppos);
        }

        self.manager.copy(FlightPlanIndex::Temporary, FlightPlanIndex::Active)?;
        self.manager.delete(FlightPlanIndex::Temporary);
        info!("[FPS] Temporary flight plan inserted");
        Ok(())
    }

    pub fn temporary_delete(&mut self) -> Result<()> {
        if !self.has_temporary() {
            return Err(FlightPlanError::precondition(
                "Cannot delete temporary flight plan when none exists",
            ));
        }
        self.manager.delete(FlightPlanIndex::Temporary);
        info!("[FPS] Temporary flight plan erased");
        Ok(())
    }

    /// Activates the uplinked plan, discarding any edit in progress
    pub fn uplink_insert(&mut self) -> Result<()> {
        if !self.has_uplink() {
            return Err(FlightPlanError::precondition("Cannot insert uplink flight plan when none exists"));
        }

        self.manager.copy(FlightPlanIndex::Uplink, FlightPlanIndex::Active)?;
        self.manager.delete(FlightPlanIndex::Uplink);
        self.manager.delete(FlightPlanIndex::Temporary);
        info!("[FPS] Uplink flight plan inserted");
        Ok(())
    }

    // ---- Multi-step edits ----

    /// Replaces the plan at `index` with a fresh one between two airports.
    ///
    /// Each step commits on its own: if the destination turns out to be
    /// unknown, the new plan keeps its origin.
    pub fn new_city_pair(
        &mut self,
        from: &str,
        to: &str,
        alternate: Option<&str>,
        index: FlightPlanIndex,
    ) -> Result<()> {
        if index == FlightPlanIndex::Temporary {
            return Err(FlightPlanError::precondition("Cannot set a city pair on the temporary flight plan"));
        }
        info!("[FPS] New city pair {}/{} on {}", from, to, index);

        if index == FlightPlanIndex::Active {
            self.manager.delete(FlightPlanIndex::Temporary);
        }
        self.manager.delete(index);
        self.manager.create(index)?;

        let plan = self.manager.get_mut(index)?;
        plan.set_origin_airport(from)?;
        plan.set_destination_airport(to)?;
        if let Some(alternate) = alternate {
            plan.set_alternate_destination_airport(alternate)?;
        }
        Ok(())
    }

    pub fn set_alternate(&mut self, icao: &str, index: FlightPlanIndex) -> Result<()> {
        if index == FlightPlanIndex::Temporary {
            return Err(FlightPlanError::precondition("Cannot set an alternate on the temporary flight plan"));
        }
        self.plan_mut(index, false)?.set_alternate_destination_airport(icao)
    }

    pub fn delete_alternate(&mut self, index: FlightPlanIndex) -> Result<()> {
        self.destructive(index, false)?.delete_alternate_flight_plan()
    }

    // ---- Airports, runways and procedures ----

    pub fn set_origin_airport(&mut self, icao: &str, index: FlightPlanIndex) -> Result<()> {
        self.destructive(index, false)?.set_origin_airport(icao)
    }

    pub fn set_origin_runway(&mut self, ident: &str, index: FlightPlanIndex, alternate: bool) -> Result<()> {
        self.destructive(index, alternate)?.set_origin_runway(ident)
    }

    pub fn set_destination_airport(&mut self, icao: &str, index: FlightPlanIndex, alternate: bool) -> Result<()> {
        self.destructive(index, alternate)?.set_destination_airport(icao)
    }

    pub fn set_destination_runway(&mut self, ident: &str, index: FlightPlanIndex, alternate: bool) -> Result<()> {
        self.destructive(index, alternate)?.set_destination_runway(ident)
    }

    pub fn set_departure_procedure(&mut self, id: Option<&str>, index: FlightPlanIndex, alternate: bool) -> Result<()> {
        self.destructive(index, alternate)?.set_departure(id)
    }

    pub fn set_departure_runway_transition(
        &mut self,
        id: Option<&str>,
        index: FlightPlanIndex,
        alternate: bool,
    ) -> Result<()> {
        self.destructive(index, alternate)?.set_departure_runway(id)
    }

    pub fn set_departure_enroute_transition(
        &mut self,
        id: Option<&str>,
        index: FlightPlanIndex,
        alternate: bool,
    ) -> Result<()> {
        self.destructive(index, alternate)?.set_departure_enroute_transition(id)
    }

    pub fn set_arrival_enroute_transition(
        &mut self,
        id: Option<&str>,
        index: FlightPlanIndex,
        alternate: bool,
    ) -> Result<()> {
        self.destructive(index, alternate)?.set_arrival_enroute_transition(id)
    }

    pub fn set_arrival(&mut self, id: Option<&str>, index: FlightPlanIndex, alternate: bool) -> Result<()> {
        self.destructive(index, alternate)?.set_arrival(id)
    }

    pub fn set_approach_via(&mut self, id: Option<&str>, index: FlightPlanIndex, alternate: bool) -> Result<()> {
        self.destructive(index, alternate)?.set_approach_via(id)
    }

    pub fn set_approach(&mut self, id: Option<&str>, index: FlightPlanIndex, alternate: bool) -> Result<()> {
        self.destructive(index, alternate)?.set_approach(id)
    }

    // ---- Lateral revisions ----

    pub fn insert_waypoint_before(
        &mut self,
        at: usize,
        fix: &Fix,
        index: FlightPlanIndex,
        alternate: bool,
    ) -> Result<()> {
        self.destructive(index, alternate)?.insert_waypoint_before(at, fix)
    }

    pub fn next_waypoint(&mut self, at: usize, fix: &Fix, index: FlightPlanIndex, alternate: bool) -> Result<()> {
        self.destructive(index, alternate)?.next_waypoint(at, fix)
    }

    pub fn new_dest(&mut self, at: usize, icao: &str, index: FlightPlanIndex, alternate: bool) -> Result<()> {
        self.destructive(index, alternate)?.new_dest(at, icao)
    }

    pub fn delete_element_at(&mut self, at: usize, index: FlightPlanIndex, alternate: bool) -> Result<()> {
        if !self.config.allow_revisions_on_tmpy && index == FlightPlanIndex::Temporary {
            return Err(FlightPlanError::precondition(
                "Cannot delete an element of the temporary flight plan",
            ));
        }
        let use_temporary = self.config.tmpy_on_delete_waypoint;
        self.configurable(use_temporary, index, alternate)?.remove_element_at(at)
    }

    /// Direct from present position to `fix`
    pub fn direct_to(&mut self, fix: &Fix, with_abeam: bool, index: FlightPlanIndex) -> Result<()> {
        let ppos = self.position.position();
        let track = self.position.true_track();
        self.destructive(index, false)?.direct_to(ppos, track, fix, with_abeam)
    }

    pub fn enable_altn(&mut self, at: usize, index: FlightPlanIndex) -> Result<()> {
        self.destructive(index, false)?.enable_altn(at)
    }

    // ---- Holds ----

    pub fn add_or_edit_manual_hold(
        &mut self,
        at: usize,
        desired: HoldData,
        modified: Option<HoldData>,
        default: HoldData,
        index: FlightPlanIndex,
        alternate: bool,
    ) -> Result<usize> {
        self.destructive(index, alternate)?
            .add_or_edit_manual_hold(at, desired, modified, default)
    }

    pub fn revert_hold_to_computed(&mut self, at: usize, index: FlightPlanIndex, alternate: bool) -> Result<()> {
        self.destructive(index, alternate)?.revert_hold_to_computed(at)
    }

    // ---- Airways ----

    pub fn start_airway_entry(&mut self, at: usize, index: FlightPlanIndex, alternate: bool) -> Result<()> {
        self.destructive(index, alternate)?.start_airway_entry(at)
    }

    pub fn add_airway(&mut self, ident: &str, index: FlightPlanIndex, alternate: bool) -> Result<()> {
        self.destructive(index, alternate)?.add_airway(ident)
    }

    pub fn add_airway_exit(&mut self, exit: &Fix, index: FlightPlanIndex, alternate: bool) -> Result<()> {
        self.destructive(index, alternate)?.add_airway_exit(exit)
    }

    // ---- Vertical revisions ----

    pub fn set_altitude_at(
        &mut self,
        at: usize,
        altitude: Option<f64>,
        is_descent: bool,
        index: FlightPlanIndex,
        alternate: bool,
    ) -> Result<()> {
        let use_temporary = self.config.tmpy_on_constraint_edit;
        self.configurable(use_temporary, index, alternate)?
            .set_altitude_at(at, altitude, is_descent)
    }

    pub fn set_altitude_constraint_at(
        &mut self,
        at: usize,
        constraint: Option<AltitudeConstraint>,
        is_descent: bool,
        index: FlightPlanIndex,
        alternate: bool,
    ) -> Result<()> {
        let use_temporary = self.config.tmpy_on_constraint_edit;
        self.configurable(use_temporary, index, alternate)?
            .set_altitude_constraint_at(at, constraint, is_descent)
    }

    pub fn set_altitude_description_at(
        &mut self,
        at: usize,
        descriptor: AltitudeDescriptor,
        index: FlightPlanIndex,
        alternate: bool,
    ) -> Result<()> {
        let use_temporary = self.config.tmpy_on_constraint_edit;
        self.configurable(use_temporary, index, alternate)?
            .set_altitude_description_at(at, descriptor)
    }

    pub fn set_speed_at(
        &mut self,
        at: usize,
        speed: Option<f64>,
        is_descent: bool,
        index: FlightPlanIndex,
        alternate: bool,
    ) -> Result<()> {
        let use_temporary = self.config.tmpy_on_constraint_edit;
        self.configurable(use_temporary, index, alternate)?
            .set_speed_at(at, speed, is_descent)
    }

    pub fn add_or_update_cruise_step(
        &mut self,
        at: usize,
        to_altitude: f64,
        index: FlightPlanIndex,
        alternate: bool,
    ) -> Result<()> {
        let use_temporary = self.config.tmpy_on_constraint_edit;
        self.configurable(use_temporary, index, alternate)?
            .add_or_update_cruise_step(at, to_altitude)
    }

    pub fn remove_cruise_step(&mut self, at: usize, index: FlightPlanIndex, alternate: bool) -> Result<()> {
        let use_temporary = self.config.tmpy_on_constraint_edit;
        self.configurable(use_temporary, index, alternate)?.remove_cruise_step(at)
    }

    pub fn edit_leg_definition(
        &mut self,
        at: usize,
        edit: impl FnOnce(&mut LegDefinition),
        index: FlightPlanIndex,
        alternate: bool,
    ) -> Result<()> {
        self.plan_mut(index, alternate)?.edit_leg_definition(at, edit)
    }

    pub fn set_overfly_at(&mut self, at: usize, overfly: bool, index: FlightPlanIndex, alternate: bool) -> Result<()> {
        let use_temporary = self.config.tmpy_on_overfly;
        self.configurable(use_temporary, index, alternate)?.set_overfly_at(at, overfly)
    }

    pub fn toggle_overfly_at(&mut self, at: usize, index: FlightPlanIndex, alternate: bool) -> Result<bool> {
        let use_temporary = self.config.tmpy_on_overfly;
        self.configurable(use_temporary, index, alternate)?.toggle_overfly_at(at)
    }

    // ---- Fix info and performance ----

    fn fix_info_plan(&mut self, index: FlightPlanIndex) -> Result<&mut FlightPlan> {
        if !self.config.allow_non_active_fix_infos && index != FlightPlanIndex::Active {
            return Err(FlightPlanError::precondition(format!(
                "Fix info entries are only available on the active flight plan, not {}",
                index
            )));
        }
        self.plan_mut(index, false)
    }

    pub fn set_fix_info_entry(&mut self, slot: usize, entry: Option<FixInfoEntry>, index: FlightPlanIndex) -> Result<()> {
        self.fix_info_plan(index)?.set_fix_info_entry(slot, entry)
    }

    pub fn edit_fix_info_entry(
        &mut self,
        slot: usize,
        edit: impl FnOnce(&mut FixInfoEntry),
        index: FlightPlanIndex,
    ) -> Result<()> {
        self.fix_info_plan(index)?.edit_fix_info_entry(slot, edit)
    }

    pub fn set_performance_data(&mut self, data: PerformanceData, index: FlightPlanIndex) -> Result<()> {
        self.plan_mut(index, false)?.set_performance_data(data);
        Ok(())
    }

    pub fn edit_performance_data(
        &mut self,
        edit: impl FnOnce(&mut PerformanceData),
        index: FlightPlanIndex,
    ) -> Result<()> {
        self.plan_mut(index, false)?.edit_performance_data(edit);
        Ok(())
    }

    // ---- Active leg ----

    pub fn set_active_leg_index(&mut self, at: usize, index: FlightPlanIndex) -> Result<()> {
        self.plan_mut(index, false)?.set_active_leg_index(at)
    }

    /// Sequences the active plan's active leg
    pub fn sequence(&mut self) -> Result<usize> {
        let next = self.plan_mut(FlightPlanIndex::Active, false)?.sequence()?;
        debug!("[FPS] Sequenced to leg {}", next);
        Ok(next)
    }

    /// Whether any live plan still references `fix`
    pub fn is_waypoint_in_use(&self, fix: &Fix) -> bool {
        [
            FlightPlanIndex::Active,
            FlightPlanIndex::Temporary,
            FlightPlanIndex::FIRST_SECONDARY,
        ]
        .into_iter()
        .filter_map(|index| self.manager.get(index).ok())
        .any(|plan| plan.contains_waypoint(fix) || plan.alternate().is_some_and(|a| a.contains_waypoint(fix)))
    }
}
