use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, MutexGuard};

use super::FlightPlanService;
use crate::manager::{EventPublisher, FlightPlanSyncEvent};

/// Cloneable async handle to a [`FlightPlanService`].
///
/// Every edit takes the lock for its whole duration, so edits from
/// different tasks are applied one at a time in lock order.
#[derive(Clone)]
pub struct SharedFlightPlanService {
    inner: Arc<Mutex<FlightPlanService>>,
    events: EventPublisher,
}

impl SharedFlightPlanService {
    pub fn new(service: FlightPlanService) -> Self {
        // Subscribing should never wait on the lock
        let events = service.manager().publisher();
        Self {
            inner: Arc::new(Mutex::new(service)),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FlightPlanSyncEvent> {
        self.events.subscribe()
    }

    pub async fn lock(&self) -> MutexGuard<'_, FlightPlanService> {
        self.inner.lock().await
    }

    /// Runs `f` with exclusive access to the service
    pub async fn with<R>(&self, f: impl FnOnce(&mut FlightPlanService) -> R) -> R {
        let mut service = self.inner.lock().await;
        f(&mut service)
    }
}
