//! One side's AI turn as a step queue.
//!
//! [`AiTurn`] resolves one unit per [`AiTurn::step`] call and reports
//! what happened as a [`TurnEvent`]. The caller owns pacing: it can
//! animate, sleep or skip between steps, and can [`AiTurn::abort`] at any
//! point. Every step completes its occupancy changes before returning, so
//! aborting between steps never leaves a half-moved unit.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::action::{perform_action, ActionOutcome};
use crate::ai::evaluator::MoveEvaluator;
use crate::battlefield::Battlefield;
use crate::combat::CombatResolver;
use crate::grid::TilePos;
use crate::pathfinding::find_path;
use crate::unit::{Side, UnitId};

/// Per-unit processing phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiPhase {
    /// Waiting in the queue.
    Idle,
    /// Choosing a move.
    Evaluating,
    /// Walking to the chosen destination.
    Moving,
    /// Acting on the chosen target.
    Acting,
    /// Finished for this turn.
    TurnComplete,
}

/// Something that happened during an AI turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TurnEvent {
    /// A unit moved, acted, or both.
    UnitResolved {
        /// Resolved unit.
        unit: UnitId,
        /// Route walked, start and end inclusive. Empty if it stayed.
        path: Vec<TilePos>,
        /// Tile acted on, if any.
        action_target: Option<TilePos>,
        /// Effect of the action, if any.
        outcome: Option<ActionOutcome>,
    },
    /// A unit had nothing worth doing and ended its turn in place.
    UnitIdle {
        /// Idle unit.
        unit: UnitId,
    },
    /// Resolving a unit failed. The turn carries on with the next unit.
    UnitFaulted {
        /// Faulting unit.
        unit: UnitId,
        /// Phase the failure happened in.
        phase: AiPhase,
        /// What went wrong.
        error: String,
    },
    /// Every queued unit has been processed.
    TurnComplete {
        /// Side whose turn ended.
        side: Side,
        /// Number of units that moved or acted.
        resolved: u32,
    },
}

struct UnitFault {
    phase: AiPhase,
    error: String,
}

impl UnitFault {
    fn new(phase: AiPhase, error: impl ToString) -> Self {
        Self {
            phase,
            error: error.to_string(),
        }
    }
}

/// Queue of units still to be resolved in one side's turn.
#[derive(Debug, Clone)]
pub struct AiTurn {
    side: Side,
    queue: VecDeque<UnitId>,
    evaluator: MoveEvaluator,
    resolved: u32,
    phase: AiPhase,
    finished: bool,
}

impl AiTurn {
    /// Start `side`'s turn: reset its units and queue them in id order.
    pub fn begin(battlefield: &mut Battlefield, side: Side, evaluator: MoveEvaluator) -> Self {
        battlefield.reset_side(side);
        let queue: VecDeque<UnitId> = battlefield.units_of(side).map(|u| u.id()).collect();
        tracing::debug!(?side, units = queue.len(), "AI turn started");
        Self {
            side,
            queue,
            evaluator,
            resolved: 0,
            phase: AiPhase::Idle,
            finished: false,
        }
    }

    /// Side taking this turn.
    #[must_use]
    pub const fn side(&self) -> Side {
        self.side
    }

    /// Units still waiting.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    /// Phase of the unit most recently processed.
    #[must_use]
    pub const fn phase(&self) -> AiPhase {
        self.phase
    }

    /// Whether the turn-complete event has been emitted.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.finished
    }

    /// Drop every queued unit. The next step reports the turn complete.
    pub fn abort(&mut self) {
        if !self.queue.is_empty() {
            tracing::debug!(side = ?self.side, dropped = self.queue.len(), "AI turn aborted");
        }
        self.queue.clear();
    }

    /// Resolve the next unit.
    ///
    /// Units that died or already finished their turn are skipped without
    /// an event. Returns [`TurnEvent::TurnComplete`] once the queue is
    /// empty, then `None` on every later call.
    pub fn step<R: CombatResolver + ?Sized>(
        &mut self,
        battlefield: &mut Battlefield,
        resolver: &mut R,
    ) -> Option<TurnEvent> {
        if self.finished {
            return None;
        }

        while let Some(id) = self.queue.pop_front() {
            let Some(unit) = battlefield.unit(id) else {
                continue;
            };
            if !unit.is_alive() || unit.is_turn_over() {
                continue;
            }

            let event = match self.resolve_unit(battlefield, id, resolver) {
                Ok(event) => event,
                Err(fault) => {
                    tracing::warn!(
                        unit = %id,
                        phase = ?fault.phase,
                        error = %fault.error,
                        "AI unit faulted, continuing with next unit"
                    );
                    // Keep the unit from being picked up again this turn.
                    if let Err(e) = battlefield.finish_turn(id) {
                        tracing::warn!(unit = %id, error = %e, "Could not end faulted unit's turn");
                    }
                    TurnEvent::UnitFaulted {
                        unit: id,
                        phase: fault.phase,
                        error: fault.error,
                    }
                }
            };
            self.phase = AiPhase::TurnComplete;
            return Some(event);
        }

        self.finished = true;
        self.phase = AiPhase::Idle;
        tracing::debug!(side = ?self.side, resolved = self.resolved, "AI turn complete");
        Some(TurnEvent::TurnComplete {
            side: self.side,
            resolved: self.resolved,
        })
    }

    /// Step until the turn completes, collecting every event.
    pub fn run_to_end<R: CombatResolver + ?Sized>(
        &mut self,
        battlefield: &mut Battlefield,
        resolver: &mut R,
    ) -> Vec<TurnEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.step(battlefield, resolver) {
            events.push(event);
        }
        events
    }

    fn resolve_unit<R: CombatResolver + ?Sized>(
        &mut self,
        battlefield: &mut Battlefield,
        id: UnitId,
        resolver: &mut R,
    ) -> Result<TurnEvent, UnitFault> {
        self.phase = AiPhase::Evaluating;
        let Some(choice) = self.evaluator.find_best_move(battlefield, id) else {
            battlefield
                .finish_turn(id)
                .map_err(|e| UnitFault::new(AiPhase::Evaluating, e))?;
            return Ok(TurnEvent::UnitIdle { unit: id });
        };

        let start = battlefield
            .unit(id)
            .map(|u| u.pos())
            .ok_or_else(|| UnitFault::new(AiPhase::Evaluating, "unit vanished"))?;

        if choice.is_stay(start) && choice.target.is_none() {
            battlefield
                .finish_turn(id)
                .map_err(|e| UnitFault::new(AiPhase::Evaluating, e))?;
            return Ok(TurnEvent::UnitIdle { unit: id });
        }

        let mut path = Vec::new();
        if !choice.is_stay(start) {
            self.phase = AiPhase::Moving;
            let unit = battlefield
                .unit(id)
                .ok_or_else(|| UnitFault::new(AiPhase::Moving, "unit vanished"))?;
            path = find_path(battlefield, unit, choice.destination);
            if path.is_empty() {
                return Err(UnitFault::new(
                    AiPhase::Moving,
                    format!("no path to {}", choice.destination),
                ));
            }
            battlefield
                .apply_route(id, &path)
                .map_err(|e| UnitFault::new(AiPhase::Moving, e))?;
        }

        let mut outcome = None;
        if let Some(target) = choice.target {
            self.phase = AiPhase::Acting;
            outcome = Some(
                perform_action(battlefield, id, target, resolver)
                    .map_err(|e| UnitFault::new(AiPhase::Acting, e))?,
            );
        }

        self.resolved += 1;
        tracing::debug!(
            unit = %id,
            steps = path.len().saturating_sub(1),
            target = ?choice.target,
            "AI unit resolved"
        );

        Ok(TurnEvent::UnitResolved {
            unit: id,
            path,
            action_target: choice.target,
            outcome,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::evaluator::EvaluatorConfig;
    use crate::combat::{CombatResolver, StandardCombat};
    use crate::grid::Grid;
    use crate::unit::{Unit, UnitClass, UnitStats, UnitTurnState};

    struct Lethal;

    impl CombatResolver for Lethal {
        fn damage(&mut self, _attacker: &Unit, defender: &Unit) -> u32 {
            defender.stats.health
        }
    }

    #[test]
    fn test_turn_resolves_units_in_id_order_then_completes() {
        let mut bf = Battlefield::new(Grid::new(6, 6));
        let first = bf
            .deploy(Side::Ai, UnitClass::Knight, UnitStats::knight(), TilePos::new(0, 0))
            .unwrap();
        let second = bf
            .deploy(Side::Ai, UnitClass::Rogue, UnitStats::rogue(), TilePos::new(5, 5))
            .unwrap();
        bf.deploy(Side::Player, UnitClass::Mage, UnitStats::mage(), TilePos::new(2, 2))
            .unwrap();

        let mut turn = AiTurn::begin(&mut bf, Side::Ai, MoveEvaluator::default());
        let events = turn.run_to_end(&mut bf, &mut StandardCombat);

        let units: Vec<UnitId> = events
            .iter()
            .filter_map(|e| match e {
                TurnEvent::UnitResolved { unit, .. } | TurnEvent::UnitIdle { unit } => Some(*unit),
                _ => None,
            })
            .collect();
        assert_eq!(units, vec![first, second]);
        assert!(matches!(
            events.last(),
            Some(TurnEvent::TurnComplete { side: Side::Ai, .. })
        ));
        assert!(turn.is_finished());
        assert!(turn.step(&mut bf, &mut StandardCombat).is_none());
        assert!(bf.occupancy_is_consistent());
    }

    #[test]
    fn test_knight_walks_and_strikes() {
        let mut bf = Battlefield::new(Grid::new(5, 5));
        let knight = bf
            .deploy(
                Side::Ai,
                UnitClass::Knight,
                UnitStats {
                    movement: 3,
                    range: 1,
                    ..UnitStats::knight()
                },
                TilePos::new(0, 0),
            )
            .unwrap();
        let mage = bf
            .deploy(Side::Player, UnitClass::Mage, UnitStats::mage(), TilePos::new(2, 0))
            .unwrap();

        let mut turn = AiTurn::begin(&mut bf, Side::Ai, MoveEvaluator::default());
        let event = turn.step(&mut bf, &mut StandardCombat).unwrap();

        match event {
            TurnEvent::UnitResolved {
                unit,
                path,
                action_target,
                outcome,
            } => {
                assert_eq!(unit, knight);
                assert_eq!(path, vec![TilePos::new(0, 0), TilePos::new(1, 1)]);
                assert_eq!(action_target, Some(TilePos::new(2, 0)));
                assert!(matches!(outcome, Some(ActionOutcome::Strike(c)) if c.damage == 2));
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(bf.unit(knight).unwrap().turn_state(), UnitTurnState::Done);
        assert_eq!(bf.unit(mage).unwrap().stats.health, 18);
    }

    #[test]
    fn test_lone_unit_goes_idle() {
        let mut bf = Battlefield::new(Grid::new(1, 1));
        let knight = bf
            .deploy(Side::Ai, UnitClass::Knight, UnitStats::knight(), TilePos::new(0, 0))
            .unwrap();

        let mut turn = AiTurn::begin(&mut bf, Side::Ai, MoveEvaluator::default());
        assert_eq!(
            turn.step(&mut bf, &mut StandardCombat),
            Some(TurnEvent::UnitIdle { unit: knight })
        );
        assert!(bf.unit(knight).unwrap().is_turn_over());
    }

    #[test]
    fn test_lethal_strike_empties_the_next_turn() {
        let mut bf = Battlefield::new(Grid::new(3, 1));
        let striker = bf
            .deploy(Side::Player, UnitClass::Blademaster, UnitStats::blademaster(), TilePos::new(0, 0))
            .unwrap();
        let victim = bf
            .deploy(Side::Ai, UnitClass::Rogue, UnitStats::rogue(), TilePos::new(1, 0))
            .unwrap();

        let mut turn = AiTurn::begin(&mut bf, Side::Player, MoveEvaluator::default());
        let events = turn.run_to_end(&mut bf, &mut Lethal);

        assert!(matches!(
            &events[0],
            TurnEvent::UnitResolved { unit, path, .. } if *unit == striker && path.is_empty()
        ));
        assert!(bf.unit(victim).is_none());
        assert!(bf.is_defeated(Side::Ai));

        let mut ai_turn = AiTurn::begin(&mut bf, Side::Ai, MoveEvaluator::default());
        assert_eq!(
            ai_turn.step(&mut bf, &mut Lethal),
            Some(TurnEvent::TurnComplete {
                side: Side::Ai,
                resolved: 0
            })
        );
    }

    #[test]
    fn test_faulted_unit_does_not_stop_the_turn() {
        // The knight's movement ray passes over the mage to (2, 0), but the
        // mage blocks the only route there.
        let mut bf = Battlefield::new(Grid::new(4, 1));
        let knight = bf
            .deploy(
                Side::Ai,
                UnitClass::Knight,
                UnitStats {
                    movement: 3,
                    range: 2,
                    ..UnitStats::knight()
                },
                TilePos::new(0, 0),
            )
            .unwrap();
        let mage = bf
            .deploy(Side::Player, UnitClass::Mage, UnitStats::mage(), TilePos::new(1, 0))
            .unwrap();
        let rogue = bf
            .deploy(Side::Ai, UnitClass::Rogue, UnitStats::rogue(), TilePos::new(3, 0))
            .unwrap();

        let evaluator = MoveEvaluator::new(EvaluatorConfig {
            validate_reachability: false,
            ..EvaluatorConfig::default()
        });
        let mut turn = AiTurn::begin(&mut bf, Side::Ai, evaluator);
        let events = turn.run_to_end(&mut bf, &mut StandardCombat);

        assert_eq!(events.len(), 3);
        assert_eq!(
            events[0],
            TurnEvent::UnitFaulted {
                unit: knight,
                phase: AiPhase::Moving,
                error: "no path to (2, 0)".to_string(),
            }
        );
        assert!(matches!(
            &events[1],
            TurnEvent::UnitResolved { unit, path, action_target, .. }
                if *unit == rogue
                    && *path == vec![TilePos::new(3, 0), TilePos::new(2, 0)]
                    && *action_target == Some(TilePos::new(1, 0))
        ));
        assert_eq!(
            events[2],
            TurnEvent::TurnComplete {
                side: Side::Ai,
                resolved: 1
            }
        );

        let knight = bf.unit(knight).unwrap();
        assert_eq!(knight.pos(), TilePos::new(0, 0));
        assert!(knight.is_turn_over());
        assert_eq!(bf.unit(mage).unwrap().stats.health, 17);
        assert!(bf.occupancy_is_consistent());
    }

    #[test]
    fn test_abort_drains_queue_cleanly() {
        let mut bf = Battlefield::new(Grid::new(8, 8));
        for x in 0..4 {
            bf.deploy(Side::Ai, UnitClass::Knight, UnitStats::knight(), TilePos::new(x, 0))
                .unwrap();
        }
        bf.deploy(Side::Player, UnitClass::Mage, UnitStats::mage(), TilePos::new(4, 6))
            .unwrap();

        let mut turn = AiTurn::begin(&mut bf, Side::Ai, MoveEvaluator::default());
        turn.step(&mut bf, &mut StandardCombat).unwrap();
        assert_eq!(turn.remaining(), 3);

        turn.abort();

        assert_eq!(turn.remaining(), 0);
        assert!(matches!(
            turn.step(&mut bf, &mut StandardCombat),
            Some(TurnEvent::TurnComplete { .. })
        ));
        assert!(bf.occupancy_is_consistent());
    }

    #[test]
    fn test_begin_resets_side_flags() {
        let mut bf = Battlefield::new(Grid::new(3, 3));
        let id = bf
            .deploy(Side::Ai, UnitClass::Knight, UnitStats::knight(), TilePos::new(1, 1))
            .unwrap();
        bf.finish_turn(id).unwrap();

        let turn = AiTurn::begin(&mut bf, Side::Ai, MoveEvaluator::default());

        assert_eq!(turn.remaining(), 1);
        assert_eq!(bf.unit(id).unwrap().turn_state(), UnitTurnState::Fresh);
    }
}
