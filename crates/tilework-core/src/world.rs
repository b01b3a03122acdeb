//! Observation interface between the engine and the host world.
//!
//! The engine never owns locations. Discovery reads a [`Location`] through
//! shared references; automation borrows one machine or container at a time
//! through the `*_mut` accessors.

use crate::id::{EntityId, FloorId, LocationId};
use crate::machine::{Container, Machine};
use crate::tile::{TileArea, TilePos};

/// What kind of automatable entity occupies a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Machine,
    Container,
}

/// Kind and footprint of an entity, as reported by a location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityInfo {
    pub kind: EntityKind,
    pub area: TileArea,
}

/// A single world area, as seen by the automation engine.
pub trait Location {
    fn id(&self) -> LocationId;

    /// Every tile occupied by a machine or container.
    fn entity_tiles(&self) -> Vec<TilePos>;

    /// The machine or container on a tile. Non-automatable objects are not
    /// reported.
    fn entity_at(&self, pos: TilePos) -> Option<EntityId>;

    fn entity_info(&self, entity: EntityId) -> Option<EntityInfo>;

    /// Floor covering on a tile, if any.
    fn floor_at(&self, pos: TilePos) -> Option<FloorId>;

    fn machine_mut(&mut self, entity: EntityId) -> Option<&mut dyn Machine>;

    fn container_mut(&mut self, entity: EntityId) -> Option<&mut dyn Container>;
}

/// The set of locations the host currently has loaded.
pub trait World {
    type Location: Location;

    fn location_ids(&self) -> Vec<LocationId>;

    fn location(&self, id: LocationId) -> Option<&Self::Location>;

    fn location_mut(&mut self, id: LocationId) -> Option<&mut Self::Location>;
}
