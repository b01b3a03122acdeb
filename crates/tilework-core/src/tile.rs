//! Tile coordinates, rectangular footprints and cardinal directions.

use serde::{Deserialize, Serialize};

/// A tile coordinate within a location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TilePos {
    pub x: i32,
    pub y: i32,
}

impl TilePos {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The tile one step away in the given direction.
    pub fn step(self, dir: Direction) -> Self {
        let (dx, dy) = dir.offset();
        Self::new(self.x + dx, self.y + dy)
    }

    /// The four orthogonally adjacent tiles, in N/E/S/W order.
    pub fn neighbors_4(self) -> [TilePos; 4] {
        Direction::all().map(|dir| self.step(dir))
    }
}

/// The rectangle of tiles occupied by a machine or container.
///
/// The origin is the top-left tile; a 0-sized area is treated as 1x1 so every
/// placed entity covers at least its origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileArea {
    pub origin: TilePos,
    pub width: u32,
    pub height: u32,
}

impl TileArea {
    pub fn new(origin: TilePos, width: u32, height: u32) -> Self {
        Self {
            origin,
            width: width.max(1),
            height: height.max(1),
        }
    }

    /// A 1x1 area at the given tile.
    pub fn single(origin: TilePos) -> Self {
        Self::new(origin, 1, 1)
    }

    /// Returns `true` if the tile lies inside this area.
    pub fn contains(&self, pos: TilePos) -> bool {
        let dx = pos.x - self.origin.x;
        let dy = pos.y - self.origin.y;
        dx >= 0 && dy >= 0 && (dx as u32) < self.width && (dy as u32) < self.height
    }

    /// Number of tiles covered.
    pub fn tile_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Iterate over every tile in the area, row by row.
    pub fn tiles(&self) -> impl Iterator<Item = TilePos> + use<> {
        let w = self.width as i32;
        let h = self.height as i32;
        let ox = self.origin.x;
        let oy = self.origin.y;
        (0..h).flat_map(move |dy| (0..w).map(move |dx| TilePos::new(ox + dx, oy + dy)))
    }
}

/// Cardinal directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    /// All four cardinal directions.
    pub fn all() -> [Direction; 4] {
        [
            Direction::North,
            Direction::East,
            Direction::South,
            Direction::West,
        ]
    }

    /// Offset for this direction. North is negative y.
    pub fn offset(&self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::East => (1, 0),
            Direction::South => (0, 1),
            Direction::West => (-1, 0),
        }
    }
}
