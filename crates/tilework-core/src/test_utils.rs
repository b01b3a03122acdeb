//! Shared test helpers for unit tests, integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]`.

use crate::connector::ConnectorRegistry;
use crate::grid::LocationGrid;
use crate::id::*;
use crate::item::{Chest, ItemStack};
use crate::machine::{Container, Machine, Recipe, RecipeMachine, SourceMachine};
use crate::tile::{TileArea, TilePos};
use crate::world::{EntityInfo, Location, World};
use std::collections::BTreeMap;

// ===========================================================================
// Locations
// ===========================================================================

pub fn farm() -> LocationId {
    LocationId(0)
}
pub fn cellar() -> LocationId {
    LocationId(1)
}
pub fn greenhouse() -> LocationId {
    LocationId(2)
}

// ===========================================================================
// Item types
// ===========================================================================

pub fn wood() -> ItemTypeId {
    ItemTypeId(388)
}
pub fn honey() -> ItemTypeId {
    ItemTypeId(340)
}
pub fn copper_ore() -> ItemTypeId {
    ItemTypeId(378)
}
pub fn coal() -> ItemTypeId {
    ItemTypeId(382)
}
pub fn copper_bar() -> ItemTypeId {
    ItemTypeId(334)
}

/// Item placed to lay gravel paths.
pub fn gravel_item() -> ItemTypeId {
    ItemTypeId(407)
}

// ===========================================================================
// Floors
// ===========================================================================

pub fn gravel() -> FloorId {
    FloorId(5)
}
pub fn wood_floor() -> FloorId {
    FloorId(0)
}

/// Registry recognizing gravel paths only.
pub fn gravel_registry() -> ConnectorRegistry {
    ConnectorRegistry::from_names(["GravelPath"])
}

// ===========================================================================
// Geometry
// ===========================================================================

/// A 1x1 area at (x, y).
pub fn at(x: i32, y: i32) -> TileArea {
    TileArea::single(TilePos::new(x, y))
}

pub fn pos(x: i32, y: i32) -> TilePos {
    TilePos::new(x, y)
}

// ===========================================================================
// Entities
// ===========================================================================

pub fn chest(capacity: u32) -> Chest {
    Chest::new("chest", capacity)
}

/// 5 copper ore + 1 coal -> 1 copper bar over 30 ticks.
pub fn furnace() -> RecipeMachine {
    RecipeMachine::new(
        "furnace",
        Recipe {
            inputs: vec![ItemStack::new(copper_ore(), 5), ItemStack::new(coal(), 1)],
            output: ItemStack::new(copper_bar(), 1),
            duration: 30,
        },
    )
}

/// One honey every `duration` ticks.
pub fn bee_house(duration: u32) -> SourceMachine {
    SourceMachine::new("bee house", ItemStack::new(honey(), 1), duration)
}

/// A source machine with `quantity` of `item` already waiting.
pub fn ready_source(item: ItemTypeId, quantity: u32) -> SourceMachine {
    SourceMachine::ready("tapper", ItemStack::new(item, quantity), 100)
}

// ===========================================================================
// Queries
// ===========================================================================

/// Quantity of `item` in the chest `entity`, or 0 if it is not a chest.
pub fn chest_count(grid: &LocationGrid, entity: EntityId, item: ItemTypeId) -> u32 {
    grid.container_as::<Chest>(entity)
        .map_or(0, |c| c.count(item))
}

// ===========================================================================
// Inconsistent worlds
// ===========================================================================

/// A [`LocationGrid`] that can be made to report a tile occupied by an entity
/// it knows nothing about, so discovery fails on it.
#[derive(Debug)]
pub struct HauntedLocation {
    pub grid: LocationGrid,
    phantom: Option<TilePos>,
}

impl HauntedLocation {
    pub fn new(id: LocationId) -> Self {
        Self {
            grid: LocationGrid::new(id),
            phantom: None,
        }
    }

    /// Report `pos` as occupied by an unknown entity.
    pub fn haunt(&mut self, pos: TilePos) {
        self.phantom = Some(pos);
    }

    pub fn exorcise(&mut self) {
        self.phantom = None;
    }
}

impl Location for HauntedLocation {
    fn id(&self) -> LocationId {
        self.grid.id()
    }

    fn entity_tiles(&self) -> Vec<TilePos> {
        let mut tiles = self.grid.entity_tiles();
        tiles.extend(self.phantom);
        tiles
    }

    fn entity_at(&self, pos: TilePos) -> Option<EntityId> {
        if self.phantom == Some(pos) {
            return Some(EntityId::default());
        }
        self.grid.entity_at(pos)
    }

    fn entity_info(&self, entity: EntityId) -> Option<EntityInfo> {
        self.grid.entity_info(entity)
    }

    fn floor_at(&self, pos: TilePos) -> Option<FloorId> {
        self.grid.floor_at(pos)
    }

    fn machine_mut(&mut self, entity: EntityId) -> Option<&mut dyn Machine> {
        self.grid.machine_mut(entity)
    }

    fn container_mut(&mut self, entity: EntityId) -> Option<&mut dyn Container> {
        self.grid.container_mut(entity)
    }
}

/// A world of [`HauntedLocation`]s.
#[derive(Debug, Default)]
pub struct HauntedWorld {
    locations: BTreeMap<LocationId, HauntedLocation>,
}

impl HauntedWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create a location.
    pub fn add_location(&mut self, id: LocationId) -> &mut HauntedLocation {
        self.locations
            .entry(id)
            .or_insert_with(|| HauntedLocation::new(id))
    }
}

impl World for HauntedWorld {
    type Location = HauntedLocation;

    fn location_ids(&self) -> Vec<LocationId> {
        self.locations.keys().copied().collect()
    }

    fn location(&self, id: LocationId) -> Option<&HauntedLocation> {
        self.locations.get(&id)
    }

    fn location_mut(&mut self, id: LocationId) -> Option<&mut HauntedLocation> {
        self.locations.get_mut(&id)
    }
}
