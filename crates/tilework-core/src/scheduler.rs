//! The scheduler: owns every location's machine groups and drives them.
//!
//! # Lifecycle of a location
//!
//! ```text
//! Unloaded --event--> Queued --cycle--> Built --event--> Queued --cycle--> ...
//!                                         \--location gone--> Unloaded
//! ```
//!
//! Events only ever queue locations. Rebuilds and automation happen together
//! in a *cycle*, which runs once every `tick_interval` ticks:
//!
//! 1. **Rebuild** -- drain the reload queue and rediscover each queued
//!    location, ascending by id. A table entry is replaced only on success.
//! 2. **Automate** -- run every stored group against the world.
//!
//! A cycle is one recoverable unit. Failure is logged, recorded as a
//! [`Notice`], and reported as [`TickOutcome::Failed`]; the next cycle runs
//! as normal.

use crate::connector::ConnectorRegistry;
use crate::dirty::ReloadQueue;
use crate::discovery::{DiscoveryError, discover_groups};
use crate::event::{Notice, NoticeBuffer, WorldEvent};
use crate::group::{AutomationError, AutomationReport, MachineGroup};
use crate::id::LocationId;
use crate::world::World;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, error, info, warn};

/// Ticks between cycles when nothing else is configured.
pub const DEFAULT_TICK_INTERVAL: u32 = 60;

/// Notices kept before the oldest is overwritten.
pub const NOTICE_CAPACITY: usize = 32;

// ---------------------------------------------------------------------------
// Configuration and results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Ticks between cycles. Zero behaves like one.
    pub tick_interval: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }
}

impl SchedulerConfig {
    pub fn effective_interval(&self) -> u32 {
        self.tick_interval.max(1)
    }
}

/// A failed cycle.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CycleError {
    #[error("rebuilding {location:?} failed: {source}")]
    Rebuild {
        location: LocationId,
        source: DiscoveryError,
    },
    #[error("automating {location:?} failed: {source}")]
    Automation {
        location: LocationId,
        source: AutomationError,
    },
}

impl CycleError {
    /// Name of the phase that failed.
    pub fn operation(&self) -> &'static str {
        match self {
            CycleError::Rebuild { .. } => "rebuild",
            CycleError::Automation { .. } => "automate",
        }
    }

    pub fn location(&self) -> LocationId {
        match self {
            CycleError::Rebuild { location, .. } | CycleError::Automation { location, .. } => {
                *location
            }
        }
    }

    fn notice_message(&self) -> String {
        match self {
            CycleError::Rebuild { location, .. } => format!(
                "Automation couldn't scan location {}. It will try again shortly.",
                location.0
            ),
            CycleError::Automation { location, .. } => format!(
                "Automation stopped in location {}. It will try again shortly.",
                location.0
            ),
        }
    }
}

/// What a successful cycle did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Locations whose groups were replaced, ascending.
    pub locations_rebuilt: Vec<LocationId>,
    pub groups_automated: usize,
    pub automation: AutomationReport,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// No cycle this tick.
    Waiting { remaining: u32 },
    Completed(CycleReport),
    /// The cycle failed; see the notices.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocationStatus {
    /// No groups stored and nothing queued.
    Unloaded,
    /// Waiting for the next cycle to rebuild it.
    Queued,
    /// Groups are stored and current as far as the scheduler knows.
    Built,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct Scheduler {
    config: SchedulerConfig,
    connectors: ConnectorRegistry,
    groups: BTreeMap<LocationId, Vec<MachineGroup>>,
    reload: ReloadQueue,
    countdown: u32,
    tick: u64,
    notices: NoticeBuffer,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig, connectors: ConnectorRegistry) -> Self {
        Self {
            countdown: config.effective_interval(),
            config,
            connectors,
            groups: BTreeMap::new(),
            reload: ReloadQueue::new(),
            tick: 0,
            notices: NoticeBuffer::new(NOTICE_CAPACITY),
        }
    }

    /// Forget all groups, queued work and notices. Call on world unload.
    pub fn shutdown(&mut self) {
        self.groups.clear();
        self.reload.clear();
        self.notices.clear();
        self.countdown = self.config.effective_interval();
        self.tick = 0;
        debug!("scheduler shut down");
    }

    // -----------------------------------------------------------------------
    // Events
    // -----------------------------------------------------------------------

    /// React to a world change by queueing the affected locations.
    pub fn handle_event(&mut self, event: &WorldEvent, world: &impl World) {
        match event {
            WorldEvent::WorldLoaded | WorldEvent::LocationListChanged => {
                let existing: BTreeSet<LocationId> = world.location_ids().into_iter().collect();
                self.groups.retain(|id, _| existing.contains(id));
                self.reload.mark_all(existing);
            }
            WorldEvent::LocationObjectsChanged { location } => {
                self.reload.mark(*location);
            }
            WorldEvent::InventoryChanged { location, items } => {
                if items.iter().any(|&item| self.connectors.is_connector_item(item)) {
                    self.reload.mark(*location);
                }
            }
        }
        debug!(queued = self.reload.len(), ?event, "world event handled");
    }

    // -----------------------------------------------------------------------
    // Tick
    // -----------------------------------------------------------------------

    /// Advance the countdown and run a cycle when it expires.
    pub fn tick(&mut self, world: &mut impl World) -> TickOutcome {
        self.tick += 1;
        self.countdown = self.countdown.saturating_sub(1);
        if self.countdown > 0 {
            return TickOutcome::Waiting {
                remaining: self.countdown,
            };
        }
        self.countdown = self.config.effective_interval();

        match self.run_cycle(world) {
            Ok(report) => TickOutcome::Completed(report),
            Err(err) => {
                error!(
                    operation = err.operation(),
                    location = ?err.location(),
                    tick = self.tick,
                    "{err}"
                );
                self.notices.push(Notice {
                    tick: self.tick,
                    operation: err.operation(),
                    message: err.notice_message(),
                });
                TickOutcome::Failed
            }
        }
    }

    /// Rebuild queued locations, then automate every stored group.
    fn run_cycle(&mut self, world: &mut impl World) -> Result<CycleReport, CycleError> {
        let mut report = CycleReport::default();

        let queued = self.reload.drain();
        for (index, &location) in queued.iter().enumerate() {
            let Some(loc) = world.location(location) else {
                if self.groups.remove(&location).is_some() {
                    debug!(?location, "discarded groups of unloaded location");
                }
                continue;
            };
            match discover_groups(loc, &self.connectors) {
                Ok(groups) => {
                    info!(?location, groups = groups.len(), "rebuilt machine groups");
                    self.groups.insert(location, groups);
                    report.locations_rebuilt.push(location);
                }
                Err(source) => {
                    self.reload.mark_all(queued[index..].iter().copied());
                    return Err(CycleError::Rebuild { location, source });
                }
            }
        }

        for (&location, groups) in &self.groups {
            let Some(loc) = world.location_mut(location) else {
                warn!(?location, "stored location missing from world, queued for rebuild");
                self.reload.mark(location);
                continue;
            };
            for group in groups {
                let moved = match group.automate(loc) {
                    Ok(moved) => moved,
                    Err(source) => {
                        if source.is_stale() {
                            self.reload.mark(location);
                        }
                        return Err(CycleError::Automation { location, source });
                    }
                };
                report.automation.merge(moved);
                report.groups_automated += 1;
            }
        }

        debug!(
            tick = self.tick,
            groups = report.groups_automated,
            stored = report.automation.items_stored,
            pulled = report.automation.items_pulled,
            started = report.automation.machines_started,
            "automation cycle complete"
        );
        Ok(report)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Stored groups of a location. Empty if none are stored.
    pub fn groups(&self, location: LocationId) -> &[MachineGroup] {
        self.groups.get(&location).map_or(&[], Vec::as_slice)
    }

    /// Locations with a stored group table, ascending.
    pub fn locations(&self) -> impl Iterator<Item = LocationId> + '_ {
        self.groups.keys().copied()
    }

    pub fn location_status(&self, location: LocationId) -> LocationStatus {
        if self.reload.is_queued(location) {
            LocationStatus::Queued
        } else if self.groups.contains_key(&location) {
            LocationStatus::Built
        } else {
            LocationStatus::Unloaded
        }
    }

    /// Number of locations waiting for a rebuild.
    pub fn pending_reloads(&self) -> usize {
        self.reload.len()
    }

    /// Take every notice produced since the last drain, oldest first.
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.notices.drain()
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn connectors(&self) -> &ConnectorRegistry {
        &self.connectors
    }

    /// Ticks seen since construction or the last shutdown.
    pub fn current_tick(&self) -> u64 {
        self.tick
    }
}
