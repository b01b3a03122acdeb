use crate::id::LocationId;
use std::collections::BTreeSet;

/// Locations whose machine groups are stale and must be rediscovered.
///
/// Event handlers only ever [`mark`](ReloadQueue::mark); the scheduler
/// [`drain`](ReloadQueue::drain)s the whole queue at a tick boundary.
/// Marking a location that is already queued is a no-op.
#[derive(Debug, Clone, Default)]
pub struct ReloadQueue {
    queued: BTreeSet<LocationId>,
}

impl ReloadQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&mut self, location: LocationId) {
        self.queued.insert(location);
    }

    /// Queue every location yielded by `locations`.
    pub fn mark_all(&mut self, locations: impl IntoIterator<Item = LocationId>) {
        self.queued.extend(locations);
    }

    pub fn is_queued(&self, location: LocationId) -> bool {
        self.queued.contains(&location)
    }

    pub fn len(&self) -> usize {
        self.queued.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queued.is_empty()
    }

    /// Take every queued location in ascending order, leaving the queue empty.
    pub fn drain(&mut self) -> Vec<LocationId> {
        std::mem::take(&mut self.queued).into_iter().collect()
    }

    pub fn clear(&mut self) {
        self.queued.clear();
    }
}
