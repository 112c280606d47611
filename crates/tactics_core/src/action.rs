//! Class actions.
//!
//! Each class performs exactly one kind of action. The evaluator only
//! needs [`can_act_on`] and the unit's range; the concrete effect lives
//! in [`perform_action`].

use serde::{Deserialize, Serialize};

use crate::battlefield::{BattleError, Battlefield};
use crate::combat::{resolve_strike, CombatOutcome, CombatResolver};
use crate::grid::{Grid, TilePos};
use crate::terrain::TerrainKind;
use crate::unit::{Unit, UnitClass, UnitId};

/// What a class does to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Hit the unit on the target tile.
    Strike,
    /// Convert the tiles between the actor and the target.
    Terraform(TerrainKind),
}

impl UnitClass {
    /// The action this class performs.
    #[must_use]
    pub const fn action(self) -> ActionKind {
        match self {
            Self::Mage => ActionKind::Terraform(TerrainKind::Water),
            Self::Knight | Self::Rogue | Self::Blademaster => ActionKind::Strike,
        }
    }
}

/// Effect of a performed action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionOutcome {
    /// A strike was resolved.
    Strike(CombatOutcome),
    /// Terrain was converted.
    Terraform {
        /// New terrain.
        terrain: TerrainKind,
        /// Tiles that changed.
        tiles: Vec<TilePos>,
    },
}

/// Whether `actor` may target `pos`.
///
/// Only tiles holding an opposing unit are valid. Empty tiles, the actor
/// itself and allies are not.
#[must_use]
pub fn can_act_on(battlefield: &Battlefield, actor: &Unit, pos: TilePos) -> bool {
    battlefield
        .unit_at(pos)
        .is_some_and(|target| target.is_hostile_to(actor))
}

/// Tiles on the straight line from `origin` toward `target`, at steps
/// `1..range`, that lie inside the grid.
///
/// The direction is the sign of each axis difference, so off-axis targets
/// snap to the nearest of the 8 principal directions.
#[must_use]
pub fn action_line(grid: &Grid, origin: TilePos, target: TilePos, range: u32) -> Vec<TilePos> {
    let dx = (target.x - origin.x).signum();
    let dy = (target.y - origin.y).signum();
    let steps = i32::try_from(range).unwrap_or(i32::MAX);

    (1..steps)
        .map(|i| origin.offset(dx * i, dy * i))
        .filter(|&pos| grid.tile(pos).is_some())
        .collect()
}

/// Perform `actor`'s class action against `target` and mark it as acted.
///
/// Nothing changes if the actor has already acted or the target is not
/// valid for it.
pub fn perform_action<R: CombatResolver + ?Sized>(
    battlefield: &mut Battlefield,
    actor: UnitId,
    target: TilePos,
    resolver: &mut R,
) -> Result<ActionOutcome, BattleError> {
    let unit = battlefield
        .unit(actor)
        .ok_or(BattleError::UnknownUnit(actor))?;
    if !unit.turn_state().can_act() {
        return Err(BattleError::TurnSpent(actor));
    }
    if !can_act_on(battlefield, unit, target) {
        return Err(BattleError::InvalidTarget { unit: actor, pos: target });
    }
    let (class, origin, range) = (unit.class(), unit.pos(), unit.stats.range);

    let outcome = match class.action() {
        ActionKind::Strike => {
            let defender = battlefield
                .unit_at(target)
                .map(Unit::id)
                .ok_or(BattleError::InvalidTarget { unit: actor, pos: target })?;
            ActionOutcome::Strike(resolve_strike(battlefield, actor, defender, resolver)?)
        }
        ActionKind::Terraform(terrain) => {
            let tiles = action_line(battlefield.grid(), origin, target, range);
            battlefield.grid_mut().set_terrain(&tiles, terrain);
            tracing::debug!(unit = %actor, ?terrain, changed = tiles.len(), "Terraformed");
            ActionOutcome::Terraform { terrain, tiles }
        }
    };

    battlefield.unit_mut(actor)?.mark_acted();
    Ok(outcome)
}
