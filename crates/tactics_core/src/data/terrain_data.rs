//! Terrain table: per-kind profiles plus per-class modifiers.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::math::{decimal_serde, ratio, Fixed};
use crate::terrain::{TerrainKind, TerrainProfile};
use crate::unit::UnitClass;

const TERRAIN_COUNT: usize = TerrainKind::ALL.len();
const CLASS_COUNT: usize = UnitClass::ALL.len();

/// Upper bound for every cost, bonus and multiplier in a table.
///
/// Effective costs are products of two of these, so they stay far below
/// the integer range of [`Fixed`].
pub const MAX_TERRAIN_VALUE: Fixed = Fixed::const_from_int(1000);

/// Errors raised while loading terrain data.
#[derive(Debug, Error)]
pub enum DataError {
    /// RON text could not be parsed.
    #[error("Failed to parse terrain data: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// A terrain kind has no profile.
    #[error("Missing terrain profile for {0:?}")]
    MissingProfile(TerrainKind),

    /// A terrain kind or modifier pair was listed twice.
    #[error("Duplicate entry: {0}")]
    Duplicate(String),

    /// A value is out of its allowed range.
    #[error("Invalid value for {field}: {value}")]
    InvalidValue {
        /// Which field was rejected.
        field: String,
        /// Rejected value, as written.
        value: Fixed,
    },
}

/// Profile entry as written in data files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileEntry {
    /// Terrain this profile describes.
    pub terrain: TerrainKind,
    /// Cost to enter a tile of this terrain.
    #[serde(with = "decimal_serde")]
    pub base_movement_cost: Fixed,
    /// Defense bonus granted to a unit standing here.
    #[serde(with = "decimal_serde")]
    pub base_defense_bonus: Fixed,
    /// Whether classes without an explicit modifier may enter.
    pub passable_by_default: bool,
}

impl ProfileEntry {
    fn profile(&self) -> TerrainProfile {
        TerrainProfile::new(
            self.base_movement_cost,
            self.base_defense_bonus,
            self.passable_by_default,
        )
    }
}

/// Movement cost multiplier for one (terrain, class) pair.
///
/// Listing a pair also grants passage on terrain that is not
/// passable by default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementModifier {
    /// Terrain the modifier applies to.
    pub terrain: TerrainKind,
    /// Class the modifier applies to.
    pub class: UnitClass,
    /// Multiplier on the base movement cost.
    #[serde(with = "decimal_serde")]
    pub multiplier: Fixed,
}

/// Defense bonus multiplier for one class on every terrain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefenseModifier {
    /// Class the modifier applies to.
    pub class: UnitClass,
    /// Multiplier on the base defense bonus.
    #[serde(with = "decimal_serde")]
    pub multiplier: Fixed,
}

/// Serialized shape of a [`TerrainTable`].
///
/// # Example RON
///
/// ```ron
/// TerrainTableData(
///     profiles: [
///         (terrain: Plains, base_movement_cost: "1", base_defense_bonus: "0", passable_by_default: true),
///     ],
///     movement_modifiers: [
///         (terrain: Mountains, class: Mage, multiplier: "2"),
///     ],
///     defense_modifiers: [
///         (class: Rogue, multiplier: "2"),
///     ],
/// )
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerrainTableData {
    /// One profile per terrain kind.
    pub profiles: Vec<ProfileEntry>,
    /// Class movement multipliers; unlisted pairs use 1.
    #[serde(default)]
    pub movement_modifiers: Vec<MovementModifier>,
    /// Class defense multipliers; unlisted classes use 1.
    #[serde(default)]
    pub defense_modifiers: Vec<DefenseModifier>,
}

/// Validated lookup table for terrain costs and bonuses.
///
/// Looked up by every cost and score query, never mutated once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TerrainTableData", into = "TerrainTableData")]
pub struct TerrainTable {
    profiles: [TerrainProfile; TERRAIN_COUNT],
    movement: [[Option<Fixed>; CLASS_COUNT]; TERRAIN_COUNT],
    defense: [Fixed; CLASS_COUNT],
}

impl TerrainTable {
    /// Load a table from RON text.
    pub fn from_ron_str(ron: &str) -> Result<Self, DataError> {
        let data: TerrainTableData = ron::from_str(ron)?;
        Self::try_from(data)
    }

    /// Static profile of a terrain kind.
    #[must_use]
    pub fn profile(&self, kind: TerrainKind) -> TerrainProfile {
        self.profiles[kind.index()]
    }

    /// Cost for `class` to enter terrain of `kind`.
    ///
    /// Returns `None` when the terrain is impassable to that class.
    #[must_use]
    pub fn movement_cost(&self, kind: TerrainKind, class: UnitClass) -> Option<Fixed> {
        let profile = self.profile(kind);
        match self.movement[kind.index()][class.index()] {
            Some(multiplier) => Some(profile.base_movement_cost.saturating_mul(multiplier)),
            None if profile.passable_by_default => Some(profile.base_movement_cost),
            None => None,
        }
    }

    /// Defense bonus for `class` standing on terrain of `kind`.
    #[must_use]
    pub fn defense_bonus(&self, kind: TerrainKind, class: UnitClass) -> Fixed {
        self.profile(kind)
            .base_defense_bonus
            .saturating_mul(self.defense[class.index()])
    }
}

impl Default for TerrainTable {
    fn default() -> Self {
        let profiles = [
            // Plains
            TerrainProfile::new(Fixed::ONE, Fixed::ZERO, true),
            // Mountains
            TerrainProfile::new(Fixed::const_from_int(3), Fixed::const_from_int(2), false),
            // Forest
            TerrainProfile::new(Fixed::const_from_int(2), Fixed::ONE, true),
            // Water
            TerrainProfile::new(Fixed::const_from_int(2), ratio(3, 2), false),
            // Desert
            TerrainProfile::new(Fixed::const_from_int(3), Fixed::ZERO, true),
        ];

        let mut movement = [[None; CLASS_COUNT]; TERRAIN_COUNT];
        movement[TerrainKind::Mountains.index()][UnitClass::Mage.index()] =
            Some(Fixed::const_from_int(2));
        movement[TerrainKind::Forest.index()][UnitClass::Rogue.index()] = Some(ratio(1, 2));
        movement[TerrainKind::Water.index()][UnitClass::Knight.index()] =
            Some(Fixed::const_from_int(20));
        movement[TerrainKind::Plains.index()][UnitClass::Blademaster.index()] = Some(ratio(1, 2));

        let mut defense = [Fixed::ONE; CLASS_COUNT];
        defense[UnitClass::Rogue.index()] = Fixed::const_from_int(2);
        defense[UnitClass::Mage.index()] = ratio(1, 2);

        Self {
            profiles,
            movement,
            defense,
        }
    }
}

impl TryFrom<TerrainTableData> for TerrainTable {
    type Error = DataError;

    fn try_from(data: TerrainTableData) -> Result<Self, Self::Error> {
        let mut profiles: [Option<TerrainProfile>; TERRAIN_COUNT] = [None; TERRAIN_COUNT];
        for entry in data.profiles {
            let slot = &mut profiles[entry.terrain.index()];
            if slot.is_some() {
                return Err(DataError::Duplicate(format!("profile {:?}", entry.terrain)));
            }
            if entry.base_movement_cost <= Fixed::ZERO || entry.base_movement_cost > MAX_TERRAIN_VALUE {
                return Err(DataError::InvalidValue {
                    field: format!("{:?}.base_movement_cost", entry.terrain),
                    value: entry.base_movement_cost,
                });
            }
            if entry.base_defense_bonus < Fixed::ZERO || entry.base_defense_bonus > MAX_TERRAIN_VALUE {
                return Err(DataError::InvalidValue {
                    field: format!("{:?}.base_defense_bonus", entry.terrain),
                    value: entry.base_defense_bonus,
                });
            }
            *slot = Some(entry.profile());
        }

        let mut resolved = [TerrainProfile::new(Fixed::ONE, Fixed::ZERO, true); TERRAIN_COUNT];
        for kind in TerrainKind::ALL {
            resolved[kind.index()] = profiles[kind.index()].ok_or(DataError::MissingProfile(kind))?;
        }

        let mut movement = [[None; CLASS_COUNT]; TERRAIN_COUNT];
        for modifier in data.movement_modifiers {
            if modifier.multiplier <= Fixed::ZERO || modifier.multiplier > MAX_TERRAIN_VALUE {
                return Err(DataError::InvalidValue {
                    field: format!("{:?}/{:?} movement multiplier", modifier.terrain, modifier.class),
                    value: modifier.multiplier,
                });
            }
            let slot = &mut movement[modifier.terrain.index()][modifier.class.index()];
            if slot.is_some() {
                return Err(DataError::Duplicate(format!(
                    "movement modifier {:?}/{:?}",
                    modifier.terrain, modifier.class
                )));
            }
            *slot = Some(modifier.multiplier);
        }

        let mut defense: [Option<Fixed>; CLASS_COUNT] = [None; CLASS_COUNT];
        for modifier in data.defense_modifiers {
            if modifier.multiplier < Fixed::ZERO || modifier.multiplier > MAX_TERRAIN_VALUE {
                return Err(DataError::InvalidValue {
                    field: format!("{:?} defense multiplier", modifier.class),
                    value: modifier.multiplier,
                });
            }
            let slot = &mut defense[modifier.class.index()];
            if slot.is_some() {
                return Err(DataError::Duplicate(format!(
                    "defense modifier {:?}",
                    modifier.class
                )));
            }
            *slot = Some(modifier.multiplier);
        }

        Ok(Self {
            profiles: resolved,
            movement,
            defense: defense.map(|m| m.unwrap_or(Fixed::ONE)),
        })
    }
}

impl From<TerrainTable> for TerrainTableData {
    fn from(table: TerrainTable) -> Self {
        let profiles = TerrainKind::ALL
            .iter()
            .map(|&terrain| {
                let profile = table.profile(terrain);
                ProfileEntry {
                    terrain,
                    base_movement_cost: profile.base_movement_cost,
                    base_defense_bonus: profile.base_defense_bonus,
                    passable_by_default: profile.passable_by_default,
                }
            })
            .collect();

        let mut movement_modifiers = Vec::new();
        for terrain in TerrainKind::ALL {
            for class in UnitClass::ALL {
                if let Some(multiplier) = table.movement[terrain.index()][class.index()] {
                    movement_modifiers.push(MovementModifier {
                        terrain,
                        class,
                        multiplier,
                    });
                }
            }
        }

        let defense_modifiers = UnitClass::ALL
            .iter()
            .filter(|class| table.defense[class.index()] != Fixed::ONE)
            .map(|&class| DefenseModifier {
                class,
                multiplier: table.defense[class.index()],
            })
            .collect();

        Self {
            profiles,
            movement_modifiers,
            defense_modifiers,
        }
    }
}
