//! Tile grid queries.
//!
//! Blocks larger than one tile are anchored at an origin tile and extend
//! `-(size - 1) / 2` tiles down and left of it, so odd sizes are centered and
//! even sizes lean toward the positive axes.

use serde::{Deserialize, Serialize};

use crate::resources::ResourceId;

/// Integer tile coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct TileCoord {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl TileCoord {
    /// Create a tile coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Offset this coordinate, clamping at the edges of the `i32` range.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x.saturating_add(dx), self.y.saturating_add(dy))
    }
}

/// Per-tile resource lookup.
pub trait TileMap {
    /// The resource a drill would extract from this tile, if any.
    fn drop_at(&self, tile: TileCoord) -> Option<ResourceId>;
}

/// Offset from the origin tile to the lowest footprint tile.
const fn footprint_offset(size: u8) -> i32 {
    -((size as i32 - 1) / 2)
}

/// All tiles covered by a block of `size` anchored at `origin`.
#[must_use]
pub fn footprint(origin: TileCoord, size: u8) -> Vec<TileCoord> {
    let low = footprint_offset(size);
    let size = size as i32;
    let mut tiles = Vec::with_capacity((size * size).max(0) as usize);
    for dy in 0..size {
        for dx in 0..size {
            tiles.push(origin.offset(low + dx, low + dy));
        }
    }
    tiles
}

/// The ring of tiles sharing an edge with the footprint. Corners are excluded.
#[must_use]
pub fn perimeter(origin: TileCoord, size: u8) -> Vec<TileCoord> {
    let low = footprint_offset(size);
    let size = size as i32;
    let high = low + size - 1;
    let mut tiles = Vec::with_capacity((4 * size).max(0) as usize);
    for i in 0..size {
        tiles.push(origin.offset(low + i, low - 1));
        tiles.push(origin.offset(low + i, high + 1));
        tiles.push(origin.offset(low - 1, low + i));
        tiles.push(origin.offset(high + 1, low + i));
    }
    tiles
}

/// Dense rectangular resource map. Tiles outside the grid drop nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridMap {
    width: u32,
    height: u32,
    drops: Vec<Option<ResourceId>>,
}

impl GridMap {
    /// Create an empty map with no ore anywhere.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            drops: vec![None; (width as usize) * (height as usize)],
        }
    }

    /// Map width in tiles.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Map height in tiles.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    fn index(&self, tile: TileCoord) -> Option<usize> {
        let x = u32::try_from(tile.x).ok()?;
        let y = u32::try_from(tile.y).ok()?;
        if x >= self.width || y >= self.height {
            return None;
        }
        Some((y as usize) * (self.width as usize) + x as usize)
    }

    /// Check whether a tile lies on the map.
    #[must_use]
    pub fn contains(&self, tile: TileCoord) -> bool {
        self.index(tile).is_some()
    }

    /// Set or clear the ore on a tile. Returns false when the tile is off the map.
    pub fn set_drop(&mut self, tile: TileCoord, drop: Option<ResourceId>) -> bool {
        match self.index(tile) {
            Some(i) => {
                self.drops[i] = drop;
                true
            }
            None => false,
        }
    }

    /// Fill a rectangle with one ore.
    pub fn fill(&mut self, from: TileCoord, to: TileCoord, drop: Option<ResourceId>) {
        for y in from.y.min(to.y)..=from.y.max(to.y) {
            for x in from.x.min(to.x)..=from.x.max(to.x) {
                self.set_drop(TileCoord::new(x, y), drop);
            }
        }
    }
}

impl TileMap for GridMap {
    fn drop_at(&self, tile: TileCoord) -> Option<ResourceId> {
        self.index(tile).and_then(|i| self.drops[i])
    }
}
