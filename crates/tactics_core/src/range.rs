//! Ray-cast range queries.
//!
//! Walks the 8 principal directions outward from an origin. This is an
//! approximation of reach, not a cost-accurate flood fill: a ray ignores
//! detours, so a tile may be reported in movement range that no path of
//! that cost actually reaches. The pathfinder decides real legality.

use serde::{Deserialize, Serialize};

use crate::grid::{Grid, TilePos, DIRECTIONS};
use crate::math::Fixed;
use crate::unit::UnitClass;

/// What a range query is computing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeMode {
    /// Where a unit can move. Occupied tiles are skipped and every step
    /// consumes `1 + movement cost` of the budget. Impassable terrain ends
    /// the ray.
    Movement,
    /// What a unit can target. Every tile on the ray counts and each step
    /// consumes 1.
    Action,
}

/// Tiles within `range` of `origin` along the 8 principal directions.
///
/// The origin itself is never included. Rays are walked in
/// [`DIRECTIONS`] order and stop at the grid edge.
#[must_use]
pub fn tiles_in_range(
    grid: &Grid,
    class: UnitClass,
    origin: TilePos,
    range: u32,
    mode: RangeMode,
) -> Vec<TilePos> {
    let budget = Fixed::saturating_from_num(range);
    let mut result = Vec::new();

    for &(dx, dy) in &DIRECTIONS {
        let mut spent = Fixed::ZERO;
        let mut pos = origin;

        while spent < budget {
            pos = pos.offset(dx, dy);
            let Some(tile) = grid.tile(pos) else {
                break;
            };

            match mode {
                RangeMode::Action => {
                    result.push(pos);
                    spent = spent.saturating_add(Fixed::ONE);
                }
                RangeMode::Movement => {
                    let Some(cost) = grid.movement_cost(pos, class) else {
                        break;
                    };
                    if !tile.is_occupied() {
                        result.push(pos);
                    }
                    spent = spent.saturating_add(Fixed::ONE.saturating_add(cost));
                }
            }
        }
    }

    tracing::trace!(%origin, range, ?mode, found = result.len(), "Range query");
    result
}
