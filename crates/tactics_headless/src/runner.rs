//! Headless game loop.
//!
//! Plays a scenario round by round. AI sides go through [`AiTurn`] one unit
//! at a time with a [`Pacer`] pause in between; a human side without a
//! controller simply waits. Every step is written out as a protocol
//! [`Event`].

use std::io::{self, Write};

use thiserror::Error;

use tactics_core::ai::{AiTurn, MoveEvaluator, TurnEvent};
use tactics_core::battlefield::Battlefield;
use tactics_core::combat::StandardCombat;
use tactics_core::error::GameError;
use tactics_core::orders::Order;
use tactics_core::rounds::RoundTracker;
use tactics_core::unit::{Side, UnitId};

use crate::pacer::{Pacer, Settle};
use crate::protocol::{snapshot, Event, GameResult};
use crate::scenario::{Scenario, ScenarioError};

/// Error type for a headless run.
#[derive(Error, Debug)]
pub enum RunError {
    /// Scenario could not be turned into a battlefield.
    #[error(transparent)]
    Scenario(#[from] ScenarioError),
    /// Core rejected an operation the runner relies on.
    #[error("Game error: {0}")]
    Game(#[from] GameError),
    /// Writing events failed.
    #[error("Failed to write event: {0}")]
    Io(#[from] io::Error),
}

/// Run options that override the scenario.
#[derive(Debug, Clone, Default)]
pub struct RunConfig {
    /// Round limit; the scenario's own limit when `None`.
    pub rounds: Option<u32>,
}

/// Final state of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSummary {
    /// How the game ended.
    pub result: GameResult,
    /// Rounds started.
    pub rounds: u32,
    /// Final battlefield hash.
    pub hash: u64,
}

/// Runs one scenario to completion.
pub struct GameRunner {
    name: String,
    battlefield: Battlefield,
    evaluator: MoveEvaluator,
    tracker: RoundTracker,
    max_rounds: u32,
    player_ai: bool,
}

impl GameRunner {
    /// Build the runner and its starting battlefield.
    pub fn new(scenario: &Scenario, config: &RunConfig) -> Result<Self, RunError> {
        Ok(Self {
            name: scenario.name.clone(),
            battlefield: scenario.build_battlefield()?,
            evaluator: scenario.evaluator(),
            tracker: RoundTracker::new(),
            max_rounds: config.rounds.unwrap_or(scenario.rounds),
            player_ai: scenario.player_ai,
        })
    }

    /// Current battlefield.
    #[must_use]
    pub const fn battlefield(&self) -> &Battlefield {
        &self.battlefield
    }

    /// Play until one side is wiped out, the round limit is hit, or the
    /// pacer reports cancellation.
    pub async fn run<W: Write>(&mut self, pacer: &mut Pacer, out: &mut W) -> Result<GameSummary, RunError> {
        emit(out, &Event::ready(&self.name, &self.battlefield))?;
        tracing::info!(scenario = %self.name, rounds = self.max_rounds, "Game started");

        let mut aborted = false;
        while self.tracker.round() <= self.max_rounds {
            let round = self.tracker.round();
            let side = self.tracker.active();
            emit(out, &Event::TurnStarted { round, side })?;

            if side == Side::Ai || self.player_ai {
                aborted = self.play_ai_turn(side, pacer, out).await?;
            } else {
                self.pass_turn(side, out)?;
            }

            if aborted || self.is_over() {
                break;
            }
            self.tracker.end_side_turn(&mut self.battlefield);
        }

        let result = if aborted {
            GameResult::Aborted
        } else {
            GameResult::judge(&self.battlefield)
        };
        let summary = GameSummary {
            result,
            rounds: self.tracker.round().min(self.max_rounds),
            hash: self.battlefield.state_hash(),
        };
        emit(
            out,
            &Event::GameOver {
                result,
                rounds: summary.rounds,
                survivors: snapshot(&self.battlefield),
                hash: summary.hash,
            },
        )?;
        tracing::info!(?result, rounds = summary.rounds, "Game over");
        Ok(summary)
    }

    /// Returns `true` if the turn was cancelled.
    async fn play_ai_turn<W: Write>(&mut self, side: Side, pacer: &mut Pacer, out: &mut W) -> Result<bool, RunError> {
        let round = self.tracker.round();
        let mut turn = AiTurn::begin(&mut self.battlefield, side, self.evaluator.clone());
        let mut combat = StandardCombat;
        let mut cancelled = false;

        while let Some(event) = turn.step(&mut self.battlefield, &mut combat) {
            let complete = matches!(event, TurnEvent::TurnComplete { .. });
            let hash = if complete { self.battlefield.state_hash() } else { 0 };
            emit(out, &Event::from_turn_event(round, event, hash))?;
            if complete {
                break;
            }
            if self.is_over() {
                turn.abort();
                continue;
            }
            if pacer.settle().await == Settle::Cancelled {
                tracing::warn!(?side, remaining = turn.remaining(), "Turn cancelled");
                turn.abort();
                cancelled = true;
            }
        }
        Ok(cancelled)
    }

    /// A side without a controller waits with every unit.
    fn pass_turn<W: Write>(&mut self, side: Side, out: &mut W) -> Result<(), RunError> {
        let units: Vec<UnitId> = self.battlefield.units_of(side).map(|u| u.id()).collect();
        for unit in units {
            self.battlefield
                .apply_order(side, Order::Wait { unit }, &mut StandardCombat)
                .map_err(GameError::from)?;
        }
        emit(
            out,
            &Event::TurnComplete {
                round: self.tracker.round(),
                side,
                resolved: 0,
                hash: self.battlefield.state_hash(),
            },
        )?;
        Ok(())
    }

    fn is_over(&self) -> bool {
        self.battlefield.is_defeated(Side::Player) || self.battlefield.is_defeated(Side::Ai)
    }
}

fn emit<W: Write>(out: &mut W, event: &Event) -> io::Result<()> {
    out.write_all(event.to_json_line().as_bytes())?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pacer::cancel_channel;
    use std::time::Duration;

    fn events(output: &[u8]) -> Vec<Event> {
        String::from_utf8_lossy(output)
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    fn duel(player_ai: bool, rounds: u32) -> Scenario {
        Scenario::from_ron_str(&format!(
            r#"Scenario(
                name: "Duel",
                map: [".....", ".....", "....."],
                units: [
                    (side: player, class: Mage, position: (4, 1)),
                    (side: ai, class: Knight, position: (0, 1)),
                ],
                rounds: {rounds},
                player_ai: {player_ai},
            )"#
        ))
        .unwrap()
    }

    #[tokio::test]
    async fn test_run_emits_protocol_in_order() {
        let mut runner = GameRunner::new(&duel(false, 2), &RunConfig::default()).unwrap();
        let mut out = Vec::new();
        let summary = runner.run(&mut Pacer::unpaced(), &mut out).await.unwrap();

        let events = events(&out);
        assert!(matches!(events.first(), Some(Event::Ready { width: 5, height: 3, .. })));
        assert_eq!(events[1], Event::TurnStarted { round: 1, side: Side::Player });
        assert!(matches!(
            events[2],
            Event::TurnComplete {
                round: 1,
                side: Side::Player,
                resolved: 0,
                ..
            }
        ));
        assert_eq!(events[3], Event::TurnStarted { round: 1, side: Side::Ai });
        assert!(matches!(events.last(), Some(Event::GameOver { .. })));
        assert_eq!(summary.hash, runner.battlefield().state_hash());
    }

    #[tokio::test]
    async fn test_round_override_and_draw() {
        let config = RunConfig { rounds: Some(1) };
        let mut runner = GameRunner::new(&duel(false, 9), &config).unwrap();
        let mut out = Vec::new();
        let summary = runner.run(&mut Pacer::unpaced(), &mut out).await.unwrap();

        // A knight with attack 4 cannot finish a mage in one round.
        assert_eq!(summary.result, GameResult::Draw);
        assert_eq!(summary.rounds, 1);
        let starts = events(&out)
            .into_iter()
            .filter(|e| matches!(e, Event::TurnStarted { .. }))
            .count();
        assert_eq!(starts, 2);
    }

    #[tokio::test]
    async fn test_runs_are_reproducible() {
        let mut first = Vec::new();
        let mut second = Vec::new();
        GameRunner::new(&duel(true, 4), &RunConfig::default())
            .unwrap()
            .run(&mut Pacer::unpaced(), &mut first)
            .await
            .unwrap();
        GameRunner::new(&duel(true, 4), &RunConfig::default())
            .unwrap()
            .run(&mut Pacer::unpaced(), &mut second)
            .await
            .unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_cancelled_run_is_aborted_and_consistent() {
        let scenario = Scenario::skirmish();
        let (handle, rx) = cancel_channel();
        let mut pacer = Pacer::new(Duration::from_secs(60), false, rx);
        handle.cancel();

        let mut runner = GameRunner::new(&scenario, &RunConfig::default()).unwrap();
        let mut out = Vec::new();
        let summary = runner.run(&mut pacer, &mut out).await.unwrap();

        assert_eq!(summary.result, GameResult::Aborted);
        assert!(runner.battlefield().occupancy_is_consistent());
        let resolved = events(&out)
            .into_iter()
            .filter(|e| {
                matches!(
                    e,
                    Event::UnitResolved { .. } | Event::UnitIdle { .. } | Event::UnitFaulted { .. }
                )
            })
            .count();
        // Only the first AI unit ran before the pause noticed.
        assert_eq!(resolved, 1);
    }
}
