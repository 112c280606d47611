//! Terrain kinds and their static profiles.

use serde::{Deserialize, Serialize};

use crate::math::{decimal_serde, Fixed};

/// Terrain covering a single tile.
///
/// The set is closed: new terrain is added by adding a variant and a
/// profile for it in the [`TerrainTable`](crate::data::TerrainTable).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub enum TerrainKind {
    /// Open ground, cheapest to cross.
    #[default]
    Plains,
    /// High ground with the best cover.
    Mountains,
    /// Light cover, slows movement.
    Forest,
    /// Deep water.
    Water,
    /// Open sand, slow but offers no cover.
    Desert,
}

impl TerrainKind {
    /// Every terrain kind, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Plains,
        Self::Mountains,
        Self::Forest,
        Self::Water,
        Self::Desert,
    ];

    /// Dense index for table lookups.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Plains => 0,
            Self::Mountains => 1,
            Self::Forest => 2,
            Self::Water => 3,
            Self::Desert => 4,
        }
    }

    /// Character used for this terrain in ascii maps.
    #[must_use]
    pub const fn glyph(self) -> char {
        match self {
            Self::Plains => '.',
            Self::Mountains => '^',
            Self::Forest => 'T',
            Self::Water => '~',
            Self::Desert => ':',
        }
    }

    /// Parse an ascii map glyph.
    #[must_use]
    pub const fn from_glyph(glyph: char) -> Option<Self> {
        match glyph {
            '.' => Some(Self::Plains),
            '^' => Some(Self::Mountains),
            'T' => Some(Self::Forest),
            '~' => Some(Self::Water),
            ':' => Some(Self::Desert),
            _ => None,
        }
    }
}

/// Static per-kind terrain values, before any class modifier.
///
/// One profile exists per [`TerrainKind`]; tiles copy it when their
/// terrain is set and never mutate it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerrainProfile {
    /// Cost to enter a tile of this terrain.
    #[serde(with = "decimal_serde")]
    pub base_movement_cost: Fixed,
    /// Defense bonus granted to a unit standing here.
    #[serde(with = "decimal_serde")]
    pub base_defense_bonus: Fixed,
    /// Whether classes without an explicit modifier may enter.
    pub passable_by_default: bool,
}

impl TerrainProfile {
    /// Create a profile.
    #[must_use]
    pub const fn new(
        base_movement_cost: Fixed,
        base_defense_bonus: Fixed,
        passable_by_default: bool,
    ) -> Self {
        Self {
            base_movement_cost,
            base_defense_bonus,
            passable_by_default,
        }
    }
}
