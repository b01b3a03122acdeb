//! World events consumed by the scheduler and notices produced for players.
//!
//! [`WorldEvent`]s are pushed in by the host from its own callbacks. The
//! scheduler never rebuilds inside a handler; it only queues locations.
//!
//! [`Notice`]s go the other way: when a cycle fails the scheduler records a
//! short message in a fixed-size [`NoticeBuffer`] which the host drains and
//! shows however it likes. When the buffer is full the oldest notice is
//! overwritten.

use crate::id::{ItemTypeId, LocationId};

// ---------------------------------------------------------------------------
// World events
// ---------------------------------------------------------------------------

/// A change in the host world that may invalidate machine groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorldEvent {
    /// A save was loaded. Every location is stale.
    WorldLoaded,
    /// Locations were added or removed.
    LocationListChanged,
    /// Objects were placed, removed or moved in one location.
    LocationObjectsChanged { location: LocationId },
    /// Items entered or left the player's inventory while in `location`.
    /// Only relevant when one of them can be laid down as a connector.
    InventoryChanged {
        location: LocationId,
        items: Vec<ItemTypeId>,
    },
}

// ---------------------------------------------------------------------------
// Notices
// ---------------------------------------------------------------------------

/// A short, user-facing description of a failed cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Scheduler tick the failure happened on.
    pub tick: u64,
    /// `"rebuild"` or `"automate"`.
    pub operation: &'static str,
    pub message: String,
}

/// Fixed-capacity ring of notices.
#[derive(Debug, Clone)]
pub struct NoticeBuffer {
    notices: Vec<Option<Notice>>,
    /// Write position (wraps around).
    head: usize,
    len: usize,
    total_written: u64,
}

impl NoticeBuffer {
    /// Create a ring with the given capacity. A capacity of 0 is clamped to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            notices: (0..capacity).map(|_| None).collect(),
            head: 0,
            len: 0,
            total_written: 0,
        }
    }

    /// Push a notice. If full, the oldest notice is dropped.
    pub fn push(&mut self, notice: Notice) {
        self.notices[self.head] = Some(notice);
        self.head = (self.head + 1) % self.capacity();
        if self.len < self.capacity() {
            self.len += 1;
        }
        self.total_written += 1;
    }

    /// Remove and return every stored notice, oldest first.
    pub fn drain(&mut self) -> Vec<Notice> {
        let capacity = self.capacity();
        let start = (self.head + capacity - self.len) % capacity;
        let mut out = Vec::with_capacity(self.len);
        for i in 0..self.len {
            if let Some(notice) = self.notices[(start + i) % capacity].take() {
                out.push(notice);
            }
        }
        self.len = 0;
        out
    }

    pub fn capacity(&self) -> usize {
        self.notices.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Total notices written since creation (including dropped).
    pub fn total_written(&self) -> u64 {
        self.total_written
    }

    /// Discard stored notices and reset counters.
    pub fn clear(&mut self) {
        self.notices.iter_mut().for_each(|slot| *slot = None);
        self.head = 0;
        self.len = 0;
        self.total_written = 0;
    }
}
