//! In-memory world: a tile index of placed machines and containers plus a
//! floor layer, per location.
//!
//! [`LocationGrid`] keeps a bidirectional mapping:
//! - `tiles`: position -> entity (which entity occupies each tile)
//! - `areas`: entity -> footprint
//!
//! Floors live in their own layer and may sit under entities.

use crate::id::{EntityId, FloorId, LocationId};
use crate::machine::{Container, Machine};
use crate::tile::{TileArea, TilePos};
use crate::world::{EntityInfo, EntityKind, Location, World};
use slotmap::{SecondaryMap, SlotMap};
use std::collections::BTreeMap;

/// An entity stored in a [`LocationGrid`].
#[derive(Debug)]
pub enum GridEntity {
    Machine(Box<dyn Machine>),
    Container(Box<dyn Container>),
}

impl GridEntity {
    pub fn kind(&self) -> EntityKind {
        match self {
            GridEntity::Machine(_) => EntityKind::Machine,
            GridEntity::Container(_) => EntityKind::Container,
        }
    }
}

/// Errors from grid placement.
#[derive(Debug, thiserror::Error)]
pub enum GridError {
    #[error("tile {0:?} is occupied")]
    Occupied(TilePos),
    #[error("entity is not placed on the grid")]
    NotPlaced,
}

// ---------------------------------------------------------------------------
// LocationGrid
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct LocationGrid {
    id: LocationId,
    entities: SlotMap<EntityId, GridEntity>,
    areas: SecondaryMap<EntityId, TileArea>,
    tiles: BTreeMap<TilePos, EntityId>,
    floors: BTreeMap<TilePos, FloorId>,
}

impl LocationGrid {
    pub fn new(id: LocationId) -> Self {
        Self {
            id,
            entities: SlotMap::with_key(),
            areas: SecondaryMap::new(),
            tiles: BTreeMap::new(),
            floors: BTreeMap::new(),
        }
    }

    // -- Placement --

    pub fn place_machine(
        &mut self,
        machine: impl Machine + 'static,
        area: TileArea,
    ) -> Result<EntityId, GridError> {
        self.place(GridEntity::Machine(Box::new(machine)), area)
    }

    pub fn place_container(
        &mut self,
        container: impl Container + 'static,
        area: TileArea,
    ) -> Result<EntityId, GridError> {
        self.place(GridEntity::Container(Box::new(container)), area)
    }

    /// Place an entity on every tile of `area`. Fails without side effects if
    /// any tile is already taken.
    pub fn place(&mut self, entity: GridEntity, area: TileArea) -> Result<EntityId, GridError> {
        if let Some(taken) = area.tiles().find(|t| self.tiles.contains_key(t)) {
            return Err(GridError::Occupied(taken));
        }

        let id = self.entities.insert(entity);
        for tile in area.tiles() {
            self.tiles.insert(tile, id);
        }
        self.areas.insert(id, area);
        Ok(id)
    }

    /// Remove an entity from the grid and hand it back.
    pub fn remove(&mut self, entity: EntityId) -> Result<GridEntity, GridError> {
        let area = self.areas.remove(entity).ok_or(GridError::NotPlaced)?;
        for tile in area.tiles() {
            self.tiles.remove(&tile);
        }
        self.entities.remove(entity).ok_or(GridError::NotPlaced)
    }

    /// Check if an entity with the given area fits.
    pub fn can_place(&self, area: TileArea) -> bool {
        area.tiles().all(|tile| !self.tiles.contains_key(&tile))
    }

    // -- Floors --

    /// Lay a floor covering. Returns the floor it replaced.
    pub fn set_floor(&mut self, pos: TilePos, floor: FloorId) -> Option<FloorId> {
        self.floors.insert(pos, floor)
    }

    pub fn clear_floor(&mut self, pos: TilePos) -> Option<FloorId> {
        self.floors.remove(&pos)
    }

    // -- Queries --

    pub fn machine(&self, entity: EntityId) -> Option<&dyn Machine> {
        match self.entities.get(entity) {
            Some(GridEntity::Machine(m)) => Some(m.as_ref()),
            _ => None,
        }
    }

    pub fn container(&self, entity: EntityId) -> Option<&dyn Container> {
        match self.entities.get(entity) {
            Some(GridEntity::Container(c)) => Some(c.as_ref()),
            _ => None,
        }
    }

    /// Downcast a machine to its concrete type.
    pub fn machine_as<T: 'static>(&self, entity: EntityId) -> Option<&T> {
        self.machine(entity)?.as_any().downcast_ref::<T>()
    }

    /// Downcast a container to its concrete type.
    pub fn container_as<T: 'static>(&self, entity: EntityId) -> Option<&T> {
        self.container(entity)?.as_any().downcast_ref::<T>()
    }

    /// Advance every machine's production by `ticks`.
    pub fn advance_machines(&mut self, ticks: u32) {
        for entity in self.entities.values_mut() {
            if let GridEntity::Machine(m) = entity {
                m.advance(ticks);
            }
        }
    }

    /// Number of placed entities.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Number of occupied tiles.
    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }
}

impl Location for LocationGrid {
    fn id(&self) -> LocationId {
        self.id
    }

    fn entity_tiles(&self) -> Vec<TilePos> {
        self.tiles.keys().copied().collect()
    }

    fn entity_at(&self, pos: TilePos) -> Option<EntityId> {
        self.tiles.get(&pos).copied()
    }

    fn entity_info(&self, entity: EntityId) -> Option<EntityInfo> {
        Some(EntityInfo {
            kind: self.entities.get(entity)?.kind(),
            area: *self.areas.get(entity)?,
        })
    }

    fn floor_at(&self, pos: TilePos) -> Option<FloorId> {
        self.floors.get(&pos).copied()
    }

    fn machine_mut(&mut self, entity: EntityId) -> Option<&mut dyn Machine> {
        match self.entities.get_mut(entity) {
            Some(GridEntity::Machine(m)) => Some(m.as_mut()),
            _ => None,
        }
    }

    fn container_mut(&mut self, entity: EntityId) -> Option<&mut dyn Container> {
        match self.entities.get_mut(entity) {
            Some(GridEntity::Container(c)) => Some(c.as_mut()),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// GridWorld
// ---------------------------------------------------------------------------

/// A set of [`LocationGrid`]s keyed by location id.
#[derive(Debug, Default)]
pub struct GridWorld {
    locations: BTreeMap<LocationId, LocationGrid>,
}

impl GridWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the grid for a location.
    pub fn add_location(&mut self, id: LocationId) -> &mut LocationGrid {
        self.locations
            .entry(id)
            .or_insert_with(|| LocationGrid::new(id))
    }

    pub fn remove_location(&mut self, id: LocationId) -> Option<LocationGrid> {
        self.locations.remove(&id)
    }

    pub fn grid(&self, id: LocationId) -> Option<&LocationGrid> {
        self.locations.get(&id)
    }

    pub fn grid_mut(&mut self, id: LocationId) -> Option<&mut LocationGrid> {
        self.locations.get_mut(&id)
    }

    /// Advance every machine in every location.
    pub fn advance(&mut self, ticks: u32) {
        for grid in self.locations.values_mut() {
            grid.advance_machines(ticks);
        }
    }
}

impl World for GridWorld {
    type Location = LocationGrid;

    fn location_ids(&self) -> Vec<LocationId> {
        self.locations.keys().copied().collect()
    }

    fn location(&self, id: LocationId) -> Option<&LocationGrid> {
        self.locations.get(&id)
    }

    fn location_mut(&mut self, id: LocationId) -> Option<&mut LocationGrid> {
        self.locations.get_mut(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn place_single_and_multi_tile() {
        let mut grid = LocationGrid::new(farm());
        let chest = grid.place_container(chest(10), at(0, 0)).unwrap();
        let furnace = grid
            .place_machine(furnace(), TileArea::new(TilePos::new(1, 0), 2, 2))
            .unwrap();

        assert_eq!(grid.entity_at(TilePos::new(0, 0)), Some(chest));
        assert_eq!(grid.entity_at(TilePos::new(2, 1)), Some(furnace));
        assert_eq!(grid.entity_at(TilePos::new(3, 0)), None);
        assert_eq!(grid.entity_count(), 2);
        assert_eq!(grid.tile_count(), 5);

        let info = grid.entity_info(furnace).unwrap();
        assert_eq!(info.kind, EntityKind::Machine);
        assert_eq!(info.area.tile_count(), 4);
    }

    #[test]
    fn place_overlap_is_rejected() {
        let mut grid = LocationGrid::new(farm());
        grid.place_container(chest(10), at(1, 1)).unwrap();

        let result = grid.place_machine(furnace(), TileArea::new(TilePos::new(0, 0), 2, 2));
        assert!(matches!(result, Err(GridError::Occupied(p)) if p == TilePos::new(1, 1)));
        assert_eq!(grid.entity_count(), 1);
        assert!(!grid.can_place(TileArea::new(TilePos::new(0, 0), 2, 2)));
        assert!(grid.can_place(TileArea::new(TilePos::new(2, 2), 2, 2)));
    }

    #[test]
    fn remove_frees_tiles() {
        let mut grid = LocationGrid::new(farm());
        let id = grid
            .place_machine(furnace(), TileArea::new(TilePos::new(3, 3), 2, 2))
            .unwrap();

        let removed = grid.remove(id).unwrap();
        assert_eq!(removed.kind(), EntityKind::Machine);
        assert_eq!(grid.tile_count(), 0);
        assert!(grid.entity_info(id).is_none());
        assert!(matches!(grid.remove(id), Err(GridError::NotPlaced)));
    }

    #[test]
    fn floors_are_independent_of_entities() {
        let mut grid = LocationGrid::new(farm());
        let pos = TilePos::new(5, 5);
        assert_eq!(grid.set_floor(pos, gravel()), None);
        assert_eq!(grid.floor_at(pos), Some(gravel()));
        assert!(grid.entity_tiles().is_empty());
        assert_eq!(grid.clear_floor(pos), Some(gravel()));
        assert_eq!(grid.floor_at(pos), None);
    }

    #[test]
    fn typed_accessors_match_kind() {
        let mut grid = LocationGrid::new(farm());
        let c = grid.place_container(chest(10), at(0, 0)).unwrap();
        let m = grid.place_machine(furnace(), at(1, 0)).unwrap();

        assert!(grid.machine_mut(c).is_none());
        assert!(grid.container_mut(m).is_none());
        assert!(grid.machine_mut(m).is_some());
        assert!(grid.container_as::<crate::item::Chest>(c).is_some());
        assert!(grid.machine_as::<crate::machine::RecipeMachine>(m).is_some());
        assert!(grid.machine_as::<crate::machine::SourceMachine>(m).is_none());
    }

    #[test]
    fn world_tracks_locations() {
        let mut world = GridWorld::new();
        world.add_location(LocationId(2));
        world.add_location(LocationId(1));
        assert_eq!(world.location_ids(), vec![LocationId(1), LocationId(2)]);

        assert!(world.remove_location(LocationId(1)).is_some());
        assert_eq!(world.location_ids(), vec![LocationId(2)]);
        assert!(world.location(LocationId(1)).is_none());
    }

    #[test]
    fn advance_drives_machines() {
        let mut world = GridWorld::new();
        let grid = world.add_location(farm());
        let m = grid.place_machine(bee_house(3), at(0, 0)).unwrap();

        world.advance(4);
        let grid = world.grid_mut(farm()).unwrap();
        assert!(grid.machine_mut(m).unwrap().take_output().is_some());
    }
}
