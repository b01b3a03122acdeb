//! Connector registry: which floor coverings bridge machines and containers.
//!
//! A static catalog lists every floor type the engine knows how to treat as a
//! connector. The player's configuration picks a subset by name; only those
//! floors extend adjacency during discovery.

use crate::id::{FloorId, ItemTypeId};
use std::collections::{BTreeMap, BTreeSet};

/// A known connector: the placeable item and the floor it lays down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectorDef {
    pub name: &'static str,
    pub item: ItemTypeId,
    pub floor: FloorId,
}

const fn def(name: &'static str, item: u32, floor: u32) -> ConnectorDef {
    ConnectorDef {
        name,
        item: ItemTypeId(item),
        floor: FloorId(floor),
    }
}

/// Every floor covering that can act as a connector.
pub const CONNECTOR_CATALOG: &[ConnectorDef] = &[
    def("WoodFloor", 328, 0),
    def("StoneFloor", 329, 1),
    def("WeatheredFloor", 331, 2),
    def("CrystalFloor", 333, 3),
    def("StrawFloor", 401, 4),
    def("GravelPath", 407, 5),
    def("WoodPath", 405, 6),
    def("CrystalPath", 409, 7),
    def("CobblestonePath", 411, 8),
    def("SteppingStonePath", 415, 9),
    def("BrickFloor", 293, 10),
    def("RusticPlankFloor", 840, 11),
    def("StoneWalkwayFloor", 841, 12),
];

/// The configured subset of [`CONNECTOR_CATALOG`], keyed by item type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectorRegistry {
    by_item: BTreeMap<ItemTypeId, ConnectorDef>,
    floors: BTreeSet<FloorId>,
    unmatched: Vec<String>,
}

impl ConnectorRegistry {
    /// A registry that recognizes nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Resolve configured names against the built-in catalog.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::from_catalog(names, CONNECTOR_CATALOG)
    }

    /// Resolve configured names against an explicit catalog. Matching is
    /// case-insensitive and ignores surrounding whitespace.
    pub fn from_catalog<I, S>(names: I, catalog: &[ConnectorDef]) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut registry = Self::default();
        for name in names {
            let wanted = name.as_ref().trim();
            match catalog.iter().find(|d| d.name.eq_ignore_ascii_case(wanted)) {
                Some(found) => {
                    registry.by_item.insert(found.item, *found);
                    registry.floors.insert(found.floor);
                }
                None => registry.unmatched.push(wanted.to_string()),
            }
        }
        registry
    }

    pub fn get(&self, item: ItemTypeId) -> Option<&ConnectorDef> {
        self.by_item.get(&item)
    }

    pub fn is_connector_item(&self, item: ItemTypeId) -> bool {
        self.by_item.contains_key(&item)
    }

    pub fn is_connector_floor(&self, floor: FloorId) -> bool {
        self.floors.contains(&floor)
    }

    /// Item ids of every configured connector, ascending.
    pub fn item_ids(&self) -> impl Iterator<Item = ItemTypeId> + '_ {
        self.by_item.keys().copied()
    }

    /// Configured names that matched nothing in the catalog.
    pub fn unmatched(&self) -> &[String] {
        &self.unmatched
    }

    pub fn len(&self) -> usize {
        self.by_item.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_item.is_empty()
    }
}
