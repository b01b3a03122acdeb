use crate::group::MachineGroup;
use crate::id::{EntityId, LocationId};
use crate::tile::{TileArea, TilePos};
use std::collections::BTreeSet;

/// Accumulates the members of one group during a discovery pass.
///
/// All `add_*` calls are set inserts, so revisiting an entity or tile is
/// harmless. [`build`](MachineGroupBuilder::build) snapshots the current sets;
/// [`reset`](MachineGroupBuilder::reset) clears them for the next seed.
#[derive(Debug, Clone)]
pub struct MachineGroupBuilder {
    location: LocationId,
    machines: BTreeSet<EntityId>,
    containers: BTreeSet<EntityId>,
    connectors: BTreeSet<TilePos>,
    tiles: BTreeSet<TilePos>,
}

impl MachineGroupBuilder {
    pub fn new(location: LocationId) -> Self {
        Self {
            location,
            machines: BTreeSet::new(),
            containers: BTreeSet::new(),
            connectors: BTreeSet::new(),
            tiles: BTreeSet::new(),
        }
    }

    pub fn add_machine(&mut self, machine: EntityId) {
        self.machines.insert(machine);
    }

    pub fn add_container(&mut self, container: EntityId) {
        self.containers.insert(container);
    }

    /// Record a connector tile. The tile joins the group's tile set too.
    pub fn add_connector(&mut self, tile: TilePos) {
        self.connectors.insert(tile);
        self.tiles.insert(tile);
    }

    /// Record every tile of an entity footprint.
    pub fn add_tile_area(&mut self, area: TileArea) {
        self.tiles.extend(area.tiles());
    }

    pub fn has_tiles(&self) -> bool {
        !self.tiles.is_empty()
    }

    /// Whether any machine or container has been added.
    pub fn has_entities(&self) -> bool {
        !self.machines.is_empty() || !self.containers.is_empty()
    }

    pub fn contains_entity(&self, entity: EntityId) -> bool {
        self.machines.contains(&entity) || self.containers.contains(&entity)
    }

    /// Freeze the accumulated sets into a group.
    pub fn build(&self) -> MachineGroup {
        MachineGroup::new(
            self.location,
            self.machines.iter().copied().collect(),
            self.containers.iter().copied().collect(),
            self.connectors.iter().copied().collect(),
            self.tiles.clone(),
        )
    }

    pub fn reset(&mut self) {
        self.machines.clear();
        self.containers.clear();
        self.connectors.clear();
        self.tiles.clear();
    }
}
