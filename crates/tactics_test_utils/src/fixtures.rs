//! Test fixtures and helpers.
//!
//! Pre-built battlefields and a small builder for consistent testing.

use fixed::types::I32F32;
use tactics_core::battlefield::Battlefield;
use tactics_core::data::TerrainTable;
use tactics_core::grid::{Grid, TilePos};
use tactics_core::unit::{Side, UnitClass, UnitId, UnitStats};

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// A unit waiting to be deployed by [`BattlefieldBuilder`].
#[derive(Debug, Clone, Copy)]
struct Placement {
    side: Side,
    class: UnitClass,
    stats: UnitStats,
    pos: TilePos,
}

/// Builds battlefields from an ascii map and a unit list.
///
/// Units are deployed in the order they were added, so the returned ids
/// follow that order too.
#[derive(Debug, Clone)]
pub struct BattlefieldBuilder {
    rows: Vec<String>,
    table: TerrainTable,
    units: Vec<Placement>,
}

impl BattlefieldBuilder {
    /// All-Plains map of the given size.
    #[must_use]
    pub fn plains(width: usize, height: usize) -> Self {
        Self::ascii(&vec![".".repeat(width); height])
    }

    /// Map from ascii rows (see [`tactics_core::terrain::TerrainKind::glyph`]).
    #[must_use]
    pub fn ascii<S: AsRef<str>>(rows: &[S]) -> Self {
        Self {
            rows: rows.iter().map(|r| r.as_ref().to_string()).collect(),
            table: TerrainTable::default(),
            units: Vec::new(),
        }
    }

    /// Use a custom terrain table.
    #[must_use]
    pub fn table(mut self, table: TerrainTable) -> Self {
        self.table = table;
        self
    }

    /// Add a unit with its class's preset stats.
    #[must_use]
    pub fn unit(self, side: Side, class: UnitClass, x: i32, y: i32) -> Self {
        self.unit_with_stats(side, class, class.base_stats(), x, y)
    }

    /// Add a unit with explicit stats.
    #[must_use]
    pub fn unit_with_stats(mut self, side: Side, class: UnitClass, stats: UnitStats, x: i32, y: i32) -> Self {
        self.units.push(Placement {
            side,
            class,
            stats,
            pos: TilePos::new(x, y),
        });
        self
    }

    /// Build the battlefield and return the deployed ids in insertion order.
    ///
    /// # Panics
    ///
    /// Panics if the map is malformed or a unit cannot be deployed.
    #[must_use]
    pub fn build(self) -> (Battlefield, Vec<UnitId>) {
        let grid = Grid::from_ascii(&self.rows, self.table).expect("fixture map must be valid");
        let mut battlefield = Battlefield::new(grid);
        let ids = self
            .units
            .iter()
            .map(|p| {
                battlefield
                    .deploy(p.side, p.class, p.stats, p.pos)
                    .expect("fixture unit must be deployable")
            })
            .collect();
        (battlefield, ids)
    }
}

/// Knight stats with a custom movement budget and range.
#[must_use]
pub fn knight_with(movement: u32, range: u32) -> UnitStats {
    UnitStats {
        movement,
        range,
        ..UnitStats::knight()
    }
}

/// 5x5 Plains, AI knight at (0, 0) with movement 3 and range 1, player
/// mage at (2, 0).
///
/// Returns the battlefield, the knight and the enemy.
#[must_use]
pub fn knight_versus_mage() -> (Battlefield, UnitId, UnitId) {
    let (battlefield, ids) = BattlefieldBuilder::plains(5, 5)
        .unit_with_stats(Side::Ai, UnitClass::Knight, knight_with(3, 1), 0, 0)
        .unit(Side::Player, UnitClass::Mage, 2, 0)
        .build();
    (battlefield, ids[0], ids[1])
}

/// Same as [`knight_versus_mage`] but (1, 0) and (1, 1) are Mountains,
/// which knights cannot cross.
#[must_use]
pub fn knight_behind_mountains() -> (Battlefield, UnitId, UnitId) {
    let (battlefield, ids) = BattlefieldBuilder::ascii(&[".^...", ".^...", ".....", ".....", "....."])
        .unit_with_stats(Side::Ai, UnitClass::Knight, knight_with(3, 1), 0, 0)
        .unit(Side::Player, UnitClass::Mage, 2, 0)
        .build();
    (battlefield, ids[0], ids[1])
}

/// Mixed-terrain skirmish with two units per side, used by determinism
/// and benchmark runs.
#[must_use]
pub fn skirmish() -> Battlefield {
    let rows = [
        "....TT....",
        "..^^TT..~~",
        "..^.....~~",
        ":::...T...",
        "...TT.T.^.",
        ".......^^.",
        "~~..::....",
        "~~..::..TT",
    ];
    let (battlefield, _) = BattlefieldBuilder::ascii(&rows)
        .unit(Side::Player, UnitClass::Knight, 0, 0)
        .unit(Side::Player, UnitClass::Mage, 1, 3)
        .unit(Side::Ai, UnitClass::Rogue, 9, 7)
        .unit(Side::Ai, UnitClass::Blademaster, 9, 4)
        .build();
    battlefield
}
