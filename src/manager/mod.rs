mod events;
mod index;

pub use events::{EventPublisher, FlightPlanEvent, FlightPlanSyncEvent};
pub use index::FlightPlanIndex;

use rand::Rng;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::info;

use crate::error::{FlightPlanError, Result};
use crate::flightplan::FlightPlan;
use crate::navdata::NavigationDatabase;

/// Store of flight plans keyed by slot.
///
/// Every plan created here shares the manager's navigation database and
/// event publisher, so all change events of one manager carry the same
/// sync id.
pub struct FlightPlanManager {
    plans: BTreeMap<FlightPlanIndex, FlightPlan>,
    database: Arc<dyn NavigationDatabase>,
    events: EventPublisher,
}

impl FlightPlanManager {
    pub fn new(database: Arc<dyn NavigationDatabase>, event_capacity: usize) -> Self {
        let sync_id = rand::thread_rng().gen_range(0..10_000);
        info!("[FPM] Created manager with sync id {}", sync_id);

        Self {
            plans: BTreeMap::new(),
            database,
            events: EventPublisher::new(sync_id, event_capacity),
        }
    }

    pub fn sync_id(&self) -> u32 {
        self.events.origin()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FlightPlanSyncEvent> {
        self.events.subscribe()
    }

    pub(crate) fn publisher(&self) -> EventPublisher {
        self.events.clone()
    }

    pub fn has(&self, index: FlightPlanIndex) -> bool {
        self.plans.contains_key(&index)
    }

    pub fn get(&self, index: FlightPlanIndex) -> Result<&FlightPlan> {
        self.plans.get(&index).ok_or(FlightPlanError::PlanAbsent(index))
    }

    pub fn get_mut(&mut self, index: FlightPlanIndex) -> Result<&mut FlightPlan> {
        self.plans.get_mut(&index).ok_or(FlightPlanError::PlanAbsent(index))
    }

    /// Slots currently holding a plan, in slot order
    pub fn indices(&self) -> Vec<FlightPlanIndex> {
        self.plans.keys().copied().collect()
    }

    pub fn create(&mut self, index: FlightPlanIndex) -> Result<()> {
        if index == FlightPlanIndex::Secondary(0) {
            return Err(FlightPlanError::precondition("Secondary plans are numbered from 1"));
        }
        if self.has(index) {
            return Err(FlightPlanError::PlanExists(index));
        }

        let plan = FlightPlan::new(index, Arc::clone(&self.database), self.events.clone());
        self.plans.insert(index, plan);

        info!("[FPM] Created flight plan {}", index);
        self.events.publish(FlightPlanEvent::Created { plan: index });
        Ok(())
    }

    /// Removes a plan. Deleting an absent slot is a no-op.
    pub fn delete(&mut self, index: FlightPlanIndex) {
        if self.plans.remove(&index).is_some() {
            info!("[FPM] Deleted flight plan {}", index);
            self.events.publish(FlightPlanEvent::Deleted { plan: index });
        }
    }

    pub fn delete_all(&mut self) {
        let indices = self.indices();
        for index in indices {
            self.delete(index);
        }
    }

    /// Deep copy of `from` into `to`, replacing whatever `to` held
    pub fn copy(&mut self, from: FlightPlanIndex, to: FlightPlanIndex) -> Result<()> {
        let copy = self.get(from)?.clone_for(to);
        self.plans.insert(to, copy);

        info!("[FPM] Copied flight plan {} to {}", from, to);
        self.events.publish(FlightPlanEvent::Copied { from, to });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navdata::StaticNavigationDatabase;

    fn manager() -> FlightPlanManager {
        FlightPlanManager::new(Arc::new(StaticNavigationDatabase::new()), 32)
    }

    #[test]
    fn test_create_twice_fails() {
        let mut fpm = manager();
        fpm.create(FlightPlanIndex::Active).unwrap();
        assert_eq!(
            fpm.create(FlightPlanIndex::Active),
            Err(FlightPlanError::PlanExists(FlightPlanIndex::Active))
        );
        assert!(fpm.create(FlightPlanIndex::Secondary(0)).is_err());
    }

    #[test]
    fn test_delete_is_always_legal() {
        let mut fpm = manager();
        fpm.delete(FlightPlanIndex::Uplink);
        fpm.create(FlightPlanIndex::Uplink).unwrap();
        fpm.delete(FlightPlanIndex::Uplink);
        assert!(!fpm.has(FlightPlanIndex::Uplink));
        assert!(matches!(
            fpm.get(FlightPlanIndex::Uplink),
            Err(FlightPlanError::PlanAbsent(FlightPlanIndex::Uplink))
        ));
    }

    #[test]
    fn test_copy_retags_plan() {
        let mut fpm = manager();
        fpm.create(FlightPlanIndex::Active).unwrap();
        fpm.copy(FlightPlanIndex::Active, FlightPlanIndex::Temporary).unwrap();

        assert_eq!(fpm.get(FlightPlanIndex::Temporary).unwrap().index(), FlightPlanIndex::Temporary);
        assert_eq!(fpm.indices(), vec![FlightPlanIndex::Active, FlightPlanIndex::Temporary]);
        assert!(fpm.copy(FlightPlanIndex::Uplink, FlightPlanIndex::Active).is_err());
    }

    #[test]
    fn test_events_carry_sync_id() {
        let mut fpm = manager();
        let mut rx = fpm.subscribe();
        fpm.create(FlightPlanIndex::Active).unwrap();

        let event = rx.try_recv().unwrap();
        assert_eq!(event.origin, fpm.sync_id());
        assert_eq!(event.event, FlightPlanEvent::Created { plan: FlightPlanIndex::Active });
    }
}
