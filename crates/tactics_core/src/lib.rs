//! # Tactics Core
//!
//! Deterministic decision core for a turn-based grid tactics game.
//!
//! This crate contains **only** game logic:
//! - No rendering or animation
//! - No IO
//! - No randomness
//! - No floating-point math (uses fixed-point)
//! - No async; pacing between AI steps belongs to the host
//!
//! The same battlefield always yields the same ranges, paths and AI
//! choices, which keeps AI behavior reproducible and testable.
//!
//! ## Crate Structure
//!
//! - [`grid`] - Tiles, adjacency, terrain mutation
//! - [`battlefield`] - Unit roster and tile occupancy
//! - [`range`] - Ray-cast movement and action ranges
//! - [`pathfinding`] - Terrain-weighted A*
//! - [`ai`] - Move evaluation and AI turn sequencing
//! - [`orders`] - Validated orders for human-controlled units
//! - [`data`] - Terrain table loading and validation

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod action;
pub mod ai;
pub mod battlefield;
pub mod combat;
pub mod data;
pub mod error;
pub mod grid;
pub mod math;
pub mod orders;
pub mod pathfinding;
pub mod range;
pub mod rounds;
pub mod terrain;
pub mod unit;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::action::{can_act_on, perform_action, ActionKind, ActionOutcome};
    pub use crate::ai::{
        AiPhase, AiTurn, EvaluatorConfig, EvaluatorWeights, MoveCandidate, MoveEvaluator,
        TurnEvent,
    };
    pub use crate::battlefield::{BattleError, Battlefield};
    pub use crate::combat::{CombatOutcome, CombatResolver, StandardCombat};
    pub use crate::data::TerrainTable;
    pub use crate::error::{GameError, Result};
    pub use crate::grid::{Grid, GridError, Tile, TilePos};
    pub use crate::math::Fixed;
    pub use crate::orders::{Order, OrderError, OrderOutcome};
    pub use crate::pathfinding::{find_path, path_cost};
    pub use crate::range::{tiles_in_range, RangeMode};
    pub use crate::rounds::RoundTracker;
    pub use crate::terrain::{TerrainKind, TerrainProfile};
    pub use crate::unit::{Side, Unit, UnitClass, UnitId, UnitStats, UnitTurnState};
}
