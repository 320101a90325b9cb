use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

use super::FlightPlanIndex;
use crate::flightplan::SegmentKind;

/// What changed in which plan
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FlightPlanEvent {
    Created {
        plan: FlightPlanIndex,
    },
    Deleted {
        plan: FlightPlanIndex,
    },
    Copied {
        from: FlightPlanIndex,
        to: FlightPlanIndex,
    },
    SegmentLegsChanged {
        plan: FlightPlanIndex,
        alternate: bool,
        segment: SegmentKind,
    },
    ActiveLegChanged {
        plan: FlightPlanIndex,
        index: usize,
    },
    LegDefinitionEdited {
        plan: FlightPlanIndex,
        alternate: bool,
        index: usize,
    },
    FixInfoChanged {
        plan: FlightPlanIndex,
        slot: usize,
    },
    PerformanceDataChanged {
        plan: FlightPlanIndex,
    },
}

/// An event stamped with the manager instance it came from
#[derive(Debug, Clone, Serialize)]
pub struct FlightPlanSyncEvent {
    pub origin: u32,
    pub at: DateTime<Utc>,
    pub event: FlightPlanEvent,
}

/// Sending half of the change feed, shared by a manager and its plans
#[derive(Debug, Clone)]
pub struct EventPublisher {
    sender: broadcast::Sender<FlightPlanSyncEvent>,
    origin: u32,
}

impl EventPublisher {
    pub fn new(origin: u32, capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender, origin }
    }

    pub fn origin(&self) -> u32 {
        self.origin
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FlightPlanSyncEvent> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: FlightPlanEvent) {
        debug!("[FPM] {:?}", event);
        let sync = FlightPlanSyncEvent {
            origin: self.origin,
            at: Utc::now(),
            event,
        };
        // No receivers is fine
        let _ = self.sender.send(sync);
    }
}
