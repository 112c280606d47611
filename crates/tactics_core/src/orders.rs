//! Validated orders for human-controlled units.
//!
//! Orders go through the same range query and pathfinder the AI uses, so
//! both sides play by one set of rules. A rejected order changes nothing.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::action::{can_act_on, perform_action, ActionOutcome};
use crate::battlefield::{BattleError, Battlefield};
use crate::combat::CombatResolver;
use crate::grid::TilePos;
use crate::math::Fixed;
use crate::pathfinding::{find_path, path_cost};
use crate::range::{tiles_in_range, RangeMode};
use crate::unit::{Side, Unit, UnitId};

/// One instruction for one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "order", rename_all = "snake_case")]
pub enum Order {
    /// Walk to a tile.
    Move {
        /// Unit to move.
        unit: UnitId,
        /// Destination.
        to: TilePos,
    },
    /// Perform the unit's class action on a tile.
    Act {
        /// Acting unit.
        unit: UnitId,
        /// Target tile.
        target: TilePos,
    },
    /// End the unit's turn.
    Wait {
        /// Waiting unit.
        unit: UnitId,
    },
}

impl Order {
    /// Unit the order is for.
    #[must_use]
    pub const fn unit(&self) -> UnitId {
        match *self {
            Self::Move { unit, .. } | Self::Act { unit, .. } | Self::Wait { unit } => unit,
        }
    }
}

/// Why an order was rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OrderError {
    /// The unit belongs to the side that is not acting.
    #[error("Unit {unit} belongs to {owner:?}, but {active:?} is acting")]
    NotYourUnit {
        /// Ordered unit.
        unit: UnitId,
        /// Its side.
        owner: Side,
        /// Side allowed to give orders.
        active: Side,
    },

    /// The unit already moved this turn.
    #[error("Unit {0} has already moved")]
    AlreadyMoved(UnitId),

    /// The unit already acted this turn.
    #[error("Unit {0} has already acted")]
    AlreadyActed(UnitId),

    /// Destination is not in the unit's movement range.
    #[error("{to} is outside the movement range of unit {unit}")]
    OutOfMovementRange {
        /// Ordered unit.
        unit: UnitId,
        /// Requested destination.
        to: TilePos,
    },

    /// No route leads to the destination.
    #[error("Unit {unit} has no path to {to}")]
    Unreachable {
        /// Ordered unit.
        unit: UnitId,
        /// Requested destination.
        to: TilePos,
    },

    /// The cheapest route found costs more than the unit may spend.
    #[error("Path to {to} costs {cost}, unit {unit} can spend {budget}")]
    OverBudget {
        /// Ordered unit.
        unit: UnitId,
        /// Requested destination.
        to: TilePos,
        /// Route cost.
        cost: Fixed,
        /// Movement stat.
        budget: u32,
    },

    /// Target is not in the unit's action range.
    #[error("{target} is outside the action range of unit {unit}")]
    OutOfActionRange {
        /// Ordered unit.
        unit: UnitId,
        /// Requested target.
        target: TilePos,
    },

    /// Target tile holds nothing the unit can act on.
    #[error("Unit {unit} cannot act on {target}")]
    InvalidTarget {
        /// Ordered unit.
        unit: UnitId,
        /// Requested target.
        target: TilePos,
    },

    /// Battlefield rejected the change.
    #[error(transparent)]
    Battle(#[from] BattleError),
}

/// What an accepted order did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum OrderOutcome {
    /// The unit walked a route.
    Moved {
        /// Route walked, start and end inclusive.
        path: Vec<TilePos>,
        /// Total entry cost.
        #[serde(with = "crate::math::decimal_serde")]
        cost: Fixed,
    },
    /// The unit acted.
    Acted(ActionOutcome),
    /// The unit ended its turn.
    Waited,
}

impl Battlefield {
    /// Validate and apply an order given by `side`.
    pub fn apply_order<R: CombatResolver + ?Sized>(
        &mut self,
        side: Side,
        order: Order,
        resolver: &mut R,
    ) -> Result<OrderOutcome, OrderError> {
        let id = order.unit();
        let unit = self.unit(id).ok_or(BattleError::UnknownUnit(id))?;
        if unit.side() != side {
            return Err(OrderError::NotYourUnit {
                unit: id,
                owner: unit.side(),
                active: side,
            });
        }

        match order {
            Order::Move { to, .. } => {
                let path = self.validate_move(unit, to)?;
                let cost = self.apply_route(id, &path)?;
                tracing::debug!(unit = %id, %to, %cost, "Move order applied");
                Ok(OrderOutcome::Moved { path, cost })
            }
            Order::Act { target, .. } => {
                self.validate_action(unit, target)?;
                let outcome = perform_action(self, id, target, resolver)?;
                Ok(OrderOutcome::Acted(outcome))
            }
            Order::Wait { .. } => {
                self.finish_turn(id)?;
                Ok(OrderOutcome::Waited)
            }
        }
    }

    fn validate_move(&self, unit: &Unit, to: TilePos) -> Result<Vec<TilePos>, OrderError> {
        let id = unit.id();
        if !unit.turn_state().can_move() {
            return Err(OrderError::AlreadyMoved(id));
        }

        let in_range = tiles_in_range(
            self.grid(),
            unit.class(),
            unit.pos(),
            unit.stats.movement,
            RangeMode::Movement,
        );
        if !in_range.contains(&to) {
            return Err(OrderError::OutOfMovementRange { unit: id, to });
        }

        let path = find_path(self, unit, to);
        if path.is_empty() {
            return Err(OrderError::Unreachable { unit: id, to });
        }
        let cost = path_cost(self.grid(), unit.class(), &path)
            .ok_or(OrderError::Unreachable { unit: id, to })?;
        if cost > Fixed::saturating_from_num(unit.stats.movement) {
            return Err(OrderError::OverBudget {
                unit: id,
                to,
                cost,
                budget: unit.stats.movement,
            });
        }
        Ok(path)
    }

    fn validate_action(&self, unit: &Unit, target: TilePos) -> Result<(), OrderError> {
        let id = unit.id();
        if !unit.turn_state().can_act() {
            return Err(OrderError::AlreadyActed(id));
        }

        let in_range = tiles_in_range(
            self.grid(),
            unit.class(),
            unit.pos(),
            unit.stats.range,
            RangeMode::Action,
        );
        if !in_range.contains(&target) {
            return Err(OrderError::OutOfActionRange { unit: id, target });
        }
        if !can_act_on(self, unit, target) {
            return Err(OrderError::InvalidTarget { unit: id, target });
        }
        Ok(())
    }
}
