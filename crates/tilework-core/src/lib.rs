//! Tilework Core -- tile-grid machine automation for farming and crafting games.
//!
//! Machines and containers placed next to each other, or linked by configured
//! floor coverings ("connectors"), form *machine groups*. Once a group exists,
//! finished output is moved from its machines into its containers and its
//! machines are refilled from those same containers, without the player
//! touching anything.
//!
//! # Cycle
//!
//! The host calls [`scheduler::Scheduler::tick`] once per game tick. Every
//! `tick_interval` ticks a cycle runs:
//!
//! 1. **Rebuild** -- every location queued by a [`event::WorldEvent`] is
//!    flood-filled into groups by [`discovery::discover_groups`].
//! 2. **Automate** -- [`group::MachineGroup::automate`] runs for every stored
//!    group of every location.
//!
//! A failing cycle is logged, turned into a [`event::Notice`], and the next
//! cycle runs as usual.
//!
//! # Host integration
//!
//! The engine does not own the world. The host implements
//! [`world::World`] and [`world::Location`] over its own data and
//! [`machine::Machine`] / [`machine::Container`] for its objects. The
//! in-memory [`grid::GridWorld`] is a complete reference implementation:
//!
//! ```rust,ignore
//! let mut world = GridWorld::new();
//! let farm = world.add_location(LocationId(0));
//! farm.place_machine(furnace, TileArea::single(TilePos::new(4, 5)))?;
//! farm.set_floor(TilePos::new(5, 5), FloorId(5));
//!
//! let mut scheduler = Scheduler::new(
//!     SchedulerConfig::default(),
//!     ConnectorRegistry::from_names(["GravelPath"]),
//! );
//! scheduler.handle_event(&WorldEvent::WorldLoaded, &world);
//! loop {
//!     world.advance(1);
//!     scheduler.tick(&mut world);
//! }
//! ```
//!
//! # Key Types
//!
//! - [`scheduler::Scheduler`] -- Group table, reload queue and tick countdown.
//! - [`discovery::discover_groups`] -- Flood-fill clustering of a location.
//! - [`group::MachineGroup`] -- One cluster and its automation pass.
//! - [`connector::ConnectorRegistry`] -- Which floors act as connectors.
//! - [`grid::LocationGrid`] -- In-memory location with a tile index.

pub mod builder;
pub mod connector;
pub mod dirty;
pub mod discovery;
pub mod event;
pub mod grid;
pub mod group;
pub mod id;
pub mod item;
pub mod machine;
pub mod scheduler;
pub mod tile;
pub mod world;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
