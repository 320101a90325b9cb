use super::segments::{SegmentClass, SegmentKind};

/// Follow-up work queued by a mutation and drained before it returns
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum PendingOperation {
    RebuildDeparture,
    RebuildArrivalAndApproach,
    RestringDeparture,
    RestringArrival,
}

impl PendingOperation {
    /// Operations a change to `kind` invalidates
    pub(crate) fn for_segment(kind: SegmentKind) -> &'static [PendingOperation] {
        match kind.class() {
            SegmentClass::Departure => &[PendingOperation::RebuildDeparture, PendingOperation::RestringDeparture],
            SegmentClass::Enroute => &[PendingOperation::RestringDeparture, PendingOperation::RestringArrival],
            SegmentClass::Arrival => &[
                PendingOperation::RebuildArrivalAndApproach,
                PendingOperation::RestringArrival,
            ],
        }
    }
}

/// Ordered set of pending operations. Rebuilds always drain before
/// restrings since a rebuild can repopulate a segment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct PendingOperations {
    queued: Vec<PendingOperation>,
}

impl PendingOperations {
    pub(crate) fn enqueue(&mut self, operation: PendingOperation) {
        if !self.queued.contains(&operation) {
            self.queued.push(operation);
        }
    }

    pub(crate) fn enqueue_for(&mut self, kind: SegmentKind) {
        for operation in PendingOperation::for_segment(kind) {
            self.enqueue(*operation);
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.queued.is_empty()
    }

    /// Takes the next operation in drain order
    pub(crate) fn next(&mut self) -> Option<PendingOperation> {
        let (position, _) = self.queued.iter().enumerate().min_by_key(|(_, op)| **op)?;
        Some(self.queued.remove(position))
    }
}
