//! Cluster discovery: flood-fill a location into machine groups.
//!
//! A tile is *automatable* if a machine or container stands on it, or if its
//! floor is a configured connector. Groups are the connected components of
//! automatable tiles under 4-directional adjacency. Reaching any tile of an
//! entity pulls in its whole footprint.
//!
//! Traversals only start from entity tiles, so a patch of connector floor
//! that touches no machine or container never becomes a group.

use crate::builder::MachineGroupBuilder;
use crate::connector::ConnectorRegistry;
use crate::group::MachineGroup;
use crate::id::{EntityId, LocationId};
use crate::tile::TilePos;
use crate::world::{EntityKind, Location};
use std::collections::{BTreeSet, VecDeque};

/// The location reported something it cannot back up.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiscoveryError {
    #[error("tile {tile:?} in {location:?} references unknown entity {entity:?}")]
    UnknownEntity {
        location: LocationId,
        tile: TilePos,
        entity: EntityId,
    },
    #[error("entity {entity:?} in {location:?} does not cover tile {tile:?} that reports it")]
    FootprintMismatch {
        location: LocationId,
        tile: TilePos,
        entity: EntityId,
    },
}

/// Partition a location's machines, containers and connector tiles into groups.
///
/// Group membership does not depend on the order `entity_tiles` yields tiles;
/// the order of the returned groups does.
pub fn discover_groups<L: Location + ?Sized>(
    location: &L,
    connectors: &ConnectorRegistry,
) -> Result<Vec<MachineGroup>, DiscoveryError> {
    let mut groups = Vec::new();
    let mut visited: BTreeSet<TilePos> = BTreeSet::new();
    let mut queue: VecDeque<TilePos> = VecDeque::new();
    let mut builder = MachineGroupBuilder::new(location.id());

    let is_connector = |pos: TilePos| {
        location
            .floor_at(pos)
            .is_some_and(|floor| connectors.is_connector_floor(floor))
    };
    let is_automatable = |pos: TilePos| location.entity_at(pos).is_some() || is_connector(pos);

    for seed in location.entity_tiles() {
        if !visited.insert(seed) {
            continue;
        }
        queue.push_back(seed);

        while let Some(tile) = queue.pop_front() {
            match location.entity_at(tile) {
                Some(entity) if !builder.contains_entity(entity) => {
                    let info = location
                        .entity_info(entity)
                        .ok_or(DiscoveryError::UnknownEntity {
                            location: location.id(),
                            tile,
                            entity,
                        })?;
                    if !info.area.contains(tile) {
                        return Err(DiscoveryError::FootprintMismatch {
                            location: location.id(),
                            tile,
                            entity,
                        });
                    }
                    match info.kind {
                        EntityKind::Machine => builder.add_machine(entity),
                        EntityKind::Container => builder.add_container(entity),
                    }
                    for covered in info.area.tiles() {
                        if location.entity_at(covered) != Some(entity) {
                            return Err(DiscoveryError::FootprintMismatch {
                                location: location.id(),
                                tile: covered,
                                entity,
                            });
                        }
                    }
                    builder.add_tile_area(info.area);
                    for covered in info.area.tiles() {
                        if visited.insert(covered) {
                            queue.push_back(covered);
                        }
                    }
                }
                Some(_) => {}
                None if is_connector(tile) => builder.add_connector(tile),
                None => {}
            }

            for neighbor in tile.neighbors_4() {
                if !visited.contains(&neighbor) && is_automatable(neighbor) {
                    visited.insert(neighbor);
                    queue.push_back(neighbor);
                }
            }
        }

        if builder.has_tiles() && builder.has_entities() {
            groups.push(builder.build());
        }
        builder.reset();
    }

    Ok(groups)
}
