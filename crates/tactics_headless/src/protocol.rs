//! JSON-lines protocol for headless runs.
//!
//! The runner writes one JSON object per line to stdout:
//!
//! # Protocol Flow
//!
//! 1. `ready` with the map size and the starting roster
//! 2. For every side turn: `turn_started`, one event per AI unit
//!    (`unit_resolved`, `unit_idle` or `unit_faulted`), then `turn_complete`
//! 3. `game_over` with the result and the survivors
//!
//! # Example Session
//!
//! ```text
//! <- {"type":"ready","version":"1.0","scenario":"Duel","width":5,"height":3,"units":[...]}
//! <- {"type":"turn_started","round":1,"side":"player"}
//! <- {"type":"turn_complete","round":1,"side":"player","resolved":0,"hash":1234}
//! <- {"type":"turn_started","round":1,"side":"ai"}
//! <- {"type":"unit_resolved","round":1,"unit":1,"path":[{"x":0,"y":0},{"x":1,"y":1}],...}
//! <- {"type":"turn_complete","round":1,"side":"ai","resolved":1,"hash":5678}
//! <- {"type":"game_over","result":"draw","rounds":10,"survivors":[...],"hash":9012}
//! ```

use serde::{Deserialize, Serialize};

use tactics_core::action::ActionOutcome;
use tactics_core::ai::{AiPhase, TurnEvent};
use tactics_core::battlefield::Battlefield;
use tactics_core::grid::TilePos;
use tactics_core::unit::{Side, Unit, UnitClass, UnitId};

/// Protocol version reported in `ready`.
pub const PROTOCOL_VERSION: &str = "1.0";

/// Events written by the headless runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Scenario loaded, about to play.
    Ready {
        version: String,
        scenario: String,
        width: u32,
        height: u32,
        units: Vec<UnitState>,
    },

    /// A side's turn began.
    TurnStarted { round: u32, side: Side },

    /// An AI unit moved, acted, or both.
    UnitResolved {
        round: u32,
        unit: UnitId,
        path: Vec<TilePos>,
        #[serde(skip_serializing_if = "Option::is_none")]
        action_target: Option<TilePos>,
        #[serde(skip_serializing_if = "Option::is_none")]
        outcome: Option<ActionOutcome>,
    },

    /// An AI unit stayed put and did nothing.
    UnitIdle { round: u32, unit: UnitId },

    /// Resolving an AI unit failed; the turn went on without it.
    UnitFaulted {
        round: u32,
        unit: UnitId,
        phase: AiPhase,
        error: String,
    },

    /// A side's turn ended.
    TurnComplete {
        round: u32,
        side: Side,
        resolved: u32,
        hash: u64,
    },

    /// The game ended.
    GameOver {
        result: GameResult,
        rounds: u32,
        survivors: Vec<UnitState>,
        hash: u64,
    },
}

/// Snapshot of one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitState {
    pub id: UnitId,
    pub side: Side,
    pub class: UnitClass,
    pub x: i32,
    pub y: i32,
    pub health: u32,
    pub max_health: u32,
}

impl From<&Unit> for UnitState {
    fn from(unit: &Unit) -> Self {
        Self {
            id: unit.id(),
            side: unit.side(),
            class: unit.class(),
            x: unit.pos().x,
            y: unit.pos().y,
            health: unit.stats.health,
            max_health: unit.stats.max_health,
        }
    }
}

/// How the game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameResult {
    /// Every AI unit is gone.
    PlayerVictory,
    /// Every player unit is gone.
    AiVictory,
    /// Round limit reached with both sides standing.
    Draw,
    /// Cancelled before the game could finish.
    Aborted,
}

impl GameResult {
    /// Result for a battlefield that is no longer being played.
    #[must_use]
    pub fn judge(battlefield: &Battlefield) -> Self {
        match (battlefield.is_defeated(Side::Player), battlefield.is_defeated(Side::Ai)) {
            (false, true) => Self::PlayerVictory,
            (true, false) => Self::AiVictory,
            _ => Self::Draw,
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

impl Event {
    /// Create a ready event from the starting battlefield.
    pub fn ready(scenario: &str, battlefield: &Battlefield) -> Self {
        Self::Ready {
            version: PROTOCOL_VERSION.to_string(),
            scenario: scenario.to_string(),
            width: battlefield.grid().width(),
            height: battlefield.grid().height(),
            units: snapshot(battlefield),
        }
    }

    /// Translate an AI turn event. `hash` is only used for turn completion.
    pub fn from_turn_event(round: u32, event: TurnEvent, hash: u64) -> Self {
        match event {
            TurnEvent::UnitResolved {
                unit,
                path,
                action_target,
                outcome,
            } => Self::UnitResolved {
                round,
                unit,
                path,
                action_target,
                outcome,
            },
            TurnEvent::UnitIdle { unit } => Self::UnitIdle { round, unit },
            TurnEvent::UnitFaulted { unit, phase, error } => Self::UnitFaulted {
                round,
                unit,
                phase,
                error,
            },
            TurnEvent::TurnComplete { side, resolved } => Self::TurnComplete {
                round,
                side,
                resolved,
                hash,
            },
        }
    }

    /// Serialize to JSON line (with newline).
    pub fn to_json_line(&self) -> String {
        let mut json = serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"type":"error","message":"Serialization failed: {e}"}}"#)
        });
        json.push('\n');
        json
    }
}

/// Every living unit, in id order.
pub fn snapshot(battlefield: &Battlefield) -> Vec<UnitState> {
    battlefield.units().map(UnitState::from).collect()
}
