//! Rectangular battlefield grid with 8-directional adjacency.
//!
//! Tiles are stored in row-major order. Every in-bounds coordinate maps to
//! exactly one tile; out-of-bounds lookups return `None`.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::TerrainTable;
use crate::math::Fixed;
use crate::terrain::{TerrainKind, TerrainProfile};
use crate::unit::{UnitClass, UnitId};

/// Direction offsets for 8-directional adjacency.
///
/// The order is fixed; neighbor enumeration, range rays and path search
/// all follow it so that ties resolve the same way on every run.
pub const DIRECTIONS: [(i32, i32); 8] = [
    (1, 0),   // East
    (1, 1),   // Southeast
    (0, 1),   // South
    (-1, 1),  // Southwest
    (-1, 0),  // West
    (-1, -1), // Northwest
    (0, -1),  // North
    (1, -1),  // Northeast
];

/// Errors raised while building a grid.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    /// Width or height is zero.
    #[error("Grid dimensions must be positive, got {width}x{height}")]
    ZeroSize {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },

    /// An ascii map row has the wrong length.
    #[error("Map row {row} has {found} tiles, expected {expected}")]
    RaggedRow {
        /// Row index.
        row: usize,
        /// Width of the first row.
        expected: usize,
        /// Width of this row.
        found: usize,
    },

    /// An ascii map contains an unknown glyph.
    #[error("Unknown terrain glyph '{glyph}' at ({x}, {y})")]
    UnknownGlyph {
        /// Offending character.
        glyph: char,
        /// Column.
        x: usize,
        /// Row.
        y: usize,
    },
}

/// Integer grid coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct TilePos {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl TilePos {
    /// Create a coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Coordinate shifted by an offset. May lie outside the grid.
    #[inline]
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Manhattan distance.
    #[must_use]
    pub const fn manhattan_distance(self, other: Self) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Chebyshev distance: steps needed when diagonals count as one.
    #[must_use]
    pub fn chebyshev_distance(self, other: Self) -> u32 {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }

    /// Whether `other` is one of the 8 surrounding coordinates.
    #[must_use]
    pub fn is_adjacent(self, other: Self) -> bool {
        self.chebyshev_distance(other) == 1
    }
}

impl fmt::Display for TilePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A single grid cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    pos: TilePos,
    terrain: TerrainKind,
    profile: TerrainProfile,
    occupant: Option<UnitId>,
}

impl Tile {
    /// Grid coordinate.
    #[must_use]
    pub const fn pos(&self) -> TilePos {
        self.pos
    }

    /// Current terrain.
    #[must_use]
    pub const fn terrain(&self) -> TerrainKind {
        self.terrain
    }

    /// Profile of the current terrain.
    #[must_use]
    pub const fn profile(&self) -> TerrainProfile {
        self.profile
    }

    /// Unit standing here, if any.
    #[must_use]
    pub const fn occupant(&self) -> Option<UnitId> {
        self.occupant
    }

    /// Whether a unit stands here.
    #[must_use]
    pub const fn is_occupied(&self) -> bool {
        self.occupant.is_some()
    }

    pub(crate) fn set_occupant(&mut self, occupant: Option<UnitId>) {
        self.occupant = occupant;
    }
}

/// Fixed-size battlefield grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    width: u32,
    height: u32,
    tiles: Vec<Tile>,
    table: TerrainTable,
}

impl Grid {
    /// Create an all-Plains grid using the default terrain table.
    ///
    /// # Panics
    ///
    /// Panics if `width` or `height` is zero.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        assert!(width > 0, "Grid width must be positive");
        assert!(height > 0, "Grid height must be positive");
        Self::build(width, height, TerrainTable::default(), |_, _| TerrainKind::Plains)
    }

    /// Create a grid whose terrain comes from a map source.
    ///
    /// `terrain_at` is called once per coordinate.
    pub fn from_fn<F>(width: u32, height: u32, table: TerrainTable, terrain_at: F) -> Result<Self, GridError>
    where
        F: FnMut(i32, i32) -> TerrainKind,
    {
        if width == 0 || height == 0 {
            return Err(GridError::ZeroSize { width, height });
        }
        Ok(Self::build(width, height, table, terrain_at))
    }

    /// Create a grid from ascii rows, one glyph per tile.
    ///
    /// See [`TerrainKind::glyph`] for the accepted characters.
    pub fn from_ascii<S: AsRef<str>>(rows: &[S], table: TerrainTable) -> Result<Self, GridError> {
        let parsed: Vec<Vec<char>> = rows.iter().map(|r| r.as_ref().trim().chars().collect()).collect();
        let expected = parsed.first().map_or(0, Vec::len);
        let mut kinds = Vec::with_capacity(expected * parsed.len());

        for (y, row) in parsed.iter().enumerate() {
            if row.len() != expected {
                return Err(GridError::RaggedRow {
                    row: y,
                    expected,
                    found: row.len(),
                });
            }
            for (x, &glyph) in row.iter().enumerate() {
                let kind = TerrainKind::from_glyph(glyph).ok_or(GridError::UnknownGlyph { glyph, x, y })?;
                kinds.push(kind);
            }
        }

        let width = u32::try_from(expected).unwrap_or(u32::MAX);
        let height = u32::try_from(parsed.len()).unwrap_or(u32::MAX);
        Self::from_fn(width, height, table, |x, y| {
            kinds[(y as usize) * expected + (x as usize)]
        })
    }

    fn build<F>(width: u32, height: u32, table: TerrainTable, mut terrain_at: F) -> Self
    where
        F: FnMut(i32, i32) -> TerrainKind,
    {
        let mut tiles = Vec::with_capacity((width as usize) * (height as usize));
        for y in 0..height as i32 {
            for x in 0..width as i32 {
                let terrain = terrain_at(x, y);
                tiles.push(Tile {
                    pos: TilePos::new(x, y),
                    terrain,
                    profile: table.profile(terrain),
                    occupant: None,
                });
            }
        }
        Self {
            width,
            height,
            tiles,
            table,
        }
    }

    /// Grid width in tiles.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Grid height in tiles.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Terrain table used for cost and bonus lookups.
    #[must_use]
    pub const fn table(&self) -> &TerrainTable {
        &self.table
    }

    /// Check if coordinates are within grid bounds.
    #[must_use]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }

    #[inline]
    fn index(&self, pos: TilePos) -> Option<usize> {
        if self.in_bounds(pos.x, pos.y) {
            Some((pos.y as usize) * (self.width as usize) + (pos.x as usize))
        } else {
            None
        }
    }

    /// Tile at `(x, y)`, or `None` outside the grid.
    #[must_use]
    pub fn tile_at(&self, x: i32, y: i32) -> Option<&Tile> {
        self.tile(TilePos::new(x, y))
    }

    /// Tile at `pos`, or `None` outside the grid.
    #[must_use]
    pub fn tile(&self, pos: TilePos) -> Option<&Tile> {
        self.index(pos).map(|i| &self.tiles[i])
    }

    pub(crate) fn tile_mut(&mut self, pos: TilePos) -> Option<&mut Tile> {
        let index = self.index(pos)?;
        Some(&mut self.tiles[index])
    }

    /// All tiles in row-major order.
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    /// In-bounds tiles adjacent to `pos`, in [`DIRECTIONS`] order.
    pub fn neighbors(&self, pos: TilePos) -> impl Iterator<Item = &Tile> + '_ {
        DIRECTIONS
            .iter()
            .filter_map(move |&(dx, dy)| self.tile(pos.offset(dx, dy)))
    }

    /// Convert every listed tile to `kind`.
    ///
    /// Costs and bonuses reflect the new terrain on the next query.
    /// Out-of-bounds coordinates are ignored.
    pub fn set_terrain(&mut self, positions: &[TilePos], kind: TerrainKind) {
        let profile = self.table.profile(kind);
        for &pos in positions {
            if let Some(tile) = self.tile_mut(pos) {
                tile.terrain = kind;
                tile.profile = profile;
            }
        }
    }

    /// Cost for `class` to enter `pos`.
    ///
    /// Returns `None` when out of bounds or impassable to that class.
    #[must_use]
    pub fn movement_cost(&self, pos: TilePos, class: UnitClass) -> Option<Fixed> {
        self.tile(pos)
            .and_then(|tile| self.table.movement_cost(tile.terrain, class))
    }

    /// Defense bonus for `class` standing on `pos`, or `None` out of bounds.
    #[must_use]
    pub fn defense_bonus(&self, pos: TilePos, class: UnitClass) -> Option<Fixed> {
        self.tile(pos)
            .map(|tile| self.table.defense_bonus(tile.terrain, class))
    }

    /// Render terrain as ascii rows.
    #[must_use]
    pub fn to_ascii(&self) -> Vec<String> {
        self.tiles
            .chunks(self.width as usize)
            .map(|row| row.iter().map(|t| t.terrain.glyph()).collect())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_creation() {
        let grid = Grid::new(10, 4);
        assert_eq!(grid.width(), 10);
        assert_eq!(grid.height(), 4);
        assert_eq!(grid.tiles().count(), 40);
        assert!(grid.tiles().all(|t| t.terrain() == TerrainKind::Plains));
    }

    #[test]
    fn test_tile_at_out_of_bounds_is_absent() {
        let grid = Grid::new(5, 5);
        assert!(grid.tile_at(0, 0).is_some());
        assert!(grid.tile_at(4, 4).is_some());
        assert!(grid.tile_at(5, 0).is_none());
        assert!(grid.tile_at(0, 5).is_none());
        assert!(grid.tile_at(-1, 2).is_none());
        assert_eq!(grid.tile_at(3, 2).map(Tile::pos), Some(TilePos::new(3, 2)));
    }

    #[test]
    fn test_neighbors_counts() {
        let grid = Grid::new(5, 5);
        assert_eq!(grid.neighbors(TilePos::new(0, 0)).count(), 3);
        assert_eq!(grid.neighbors(TilePos::new(2, 0)).count(), 5);
        assert_eq!(grid.neighbors(TilePos::new(2, 2)).count(), 8);
    }

    #[test]
    fn test_neighbors_order_is_stable() {
        let grid = Grid::new(3, 3);
        let first: Vec<TilePos> = grid.neighbors(TilePos::new(1, 1)).map(Tile::pos).collect();
        let second: Vec<TilePos> = grid.neighbors(TilePos::new(1, 1)).map(Tile::pos).collect();
        assert_eq!(first, second);
        assert_eq!(first[0], TilePos::new(2, 1));
        assert!(first.iter().all(|p| p.is_adjacent(TilePos::new(1, 1))));
    }

    #[test]
    fn test_set_terrain_updates_cost() {
        let mut grid = Grid::new(5, 5);
        let target = TilePos::new(2, 2);
        assert_eq!(grid.movement_cost(target, UnitClass::Knight), Some(Fixed::ONE));

        grid.set_terrain(&[target, TilePos::new(9, 9)], TerrainKind::Water);

        let tile = grid.tile(target).unwrap();
        assert_eq!(tile.terrain(), TerrainKind::Water);
        assert_eq!(tile.profile(), grid.table().profile(TerrainKind::Water));
        assert_eq!(grid.movement_cost(target, UnitClass::Knight), Some(Fixed::from_num(40)));
        assert_eq!(grid.movement_cost(target, UnitClass::Mage), None);
    }

    #[test]
    fn test_from_ascii() {
        let grid = Grid::from_ascii(&[".^T", "~:."], TerrainTable::default()).unwrap();
        assert_eq!(grid.width(), 3);
        assert_eq!(grid.height(), 2);
        assert_eq!(grid.tile_at(1, 0).unwrap().terrain(), TerrainKind::Mountains);
        assert_eq!(grid.tile_at(0, 1).unwrap().terrain(), TerrainKind::Water);
        assert_eq!(grid.to_ascii(), vec![".^T".to_string(), "~:.".to_string()]);
    }

    #[test]
    fn test_from_ascii_rejects_bad_maps() {
        assert_eq!(
            Grid::from_ascii(&["...", ".."], TerrainTable::default()),
            Err(GridError::RaggedRow {
                row: 1,
                expected: 3,
                found: 2
            })
        );
        assert_eq!(
            Grid::from_ascii(&[".x."], TerrainTable::default()),
            Err(GridError::UnknownGlyph { glyph: 'x', x: 1, y: 0 })
        );
        assert_eq!(
            Grid::from_ascii::<&str>(&[], TerrainTable::default()),
            Err(GridError::ZeroSize { width: 0, height: 0 })
        );
    }

    #[test]
    fn test_distances() {
        let a = TilePos::new(0, 0);
        let b = TilePos::new(3, 7);
        assert_eq!(a.manhattan_distance(b), 10);
        assert_eq!(a.chebyshev_distance(b), 7);
        assert!(a.is_adjacent(TilePos::new(1, 1)));
        assert!(!a.is_adjacent(a));
    }
}
