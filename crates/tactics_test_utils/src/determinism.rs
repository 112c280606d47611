//! Determinism testing utilities.
//!
//! Provides a harness for verifying that AI turns produce identical
//! results given identical battlefields.
//!
//! # Testing Strategy
//!
//! AI behavior must be reproducible so that a scenario can be replayed
//! and a failing test can be debugged. Sources of non-determinism include:
//!
//! - **Floating-point math**: We use fixed-point arithmetic via
//!   [`tactics_core::math::Fixed`] for every cost and score.
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   Units are always processed in sorted id order and the pathfinder
//!   never iterates its hash maps.
//!
//! - **Priority queue ties**: Equal A* scores are broken by insertion
//!   order, never by memory layout.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use tactics_core::ai::{AiTurn, MoveEvaluator, TurnEvent};
use tactics_core::battlefield::Battlefield;
use tactics_core::combat::StandardCombat;
use tactics_core::rounds::RoundTracker;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of rounds played per run.
    pub rounds: u32,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic game).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that every run ended identically, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "AI play is non-deterministic!\n\
                 Runs: {}\n\
                 Rounds: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.rounds,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Play `rounds` full rounds with both sides AI-controlled.
///
/// Returns every event emitted, in order.
pub fn play_rounds(battlefield: &mut Battlefield, rounds: u32, evaluator: &MoveEvaluator) -> Vec<TurnEvent> {
    let mut tracker = RoundTracker::new();
    let mut events = Vec::new();
    let mut combat = StandardCombat;

    while tracker.round() <= rounds {
        let side = tracker.active();
        let mut turn = AiTurn::begin(battlefield, side, evaluator.clone());
        events.extend(turn.run_to_end(battlefield, &mut combat));
        tracker.end_side_turn(battlefield);
    }
    events
}

/// Run a game multiple times from the same setup and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to play
/// * `rounds` - Full rounds (player then AI) per run
/// * `setup` - Function creating the initial battlefield
///
/// # Example
///
/// ```ignore
/// use tactics_test_utils::determinism::verify_determinism;
/// use tactics_test_utils::fixtures::skirmish;
///
/// verify_determinism(5, 4, skirmish).assert_deterministic();
/// ```
pub fn verify_determinism<F>(runs: usize, rounds: u32, setup: F) -> DeterminismResult
where
    F: Fn() -> Battlefield,
{
    let evaluator = MoveEvaluator::default();
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut battlefield = setup();
        let events = play_rounds(&mut battlefield, rounds, &evaluator);
        hashes.push(battlefield.state_hash() ^ compute_hash(&format!("{events:?}")));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        rounds,
    }
}

/// Play the same game on several threads at once and collect the final
/// state hashes.
///
/// Nothing is shared between threads; each builds its own battlefield.
pub fn run_parallel_games<F>(setup: F, games: usize, rounds: u32) -> DeterminismResult
where
    F: Fn() -> Battlefield + Sync,
{
    let hashes: Vec<u64> = thread::scope(|s| {
        let handles: Vec<_> = (0..games)
            .map(|_| {
                s.spawn(|| {
                    let mut battlefield = setup();
                    play_rounds(&mut battlefield, rounds, &MoveEvaluator::default());
                    battlefield.state_hash()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("game thread panicked"))
            .collect()
    });

    DeterminismResult {
        is_deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
        hashes,
        rounds,
    }
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for grids, units and positions.
///
/// These strategies generate random but reproducible inputs for
/// property-based testing of the tactical core.
pub mod strategies {
    use proptest::prelude::*;
    use tactics_core::terrain::TerrainKind;
    use tactics_core::unit::UnitClass;

    /// Any terrain kind.
    pub fn arb_terrain() -> impl Strategy<Value = TerrainKind> {
        prop_oneof![
            Just(TerrainKind::Plains),
            Just(TerrainKind::Mountains),
            Just(TerrainKind::Forest),
            Just(TerrainKind::Water),
            Just(TerrainKind::Desert),
        ]
    }

    /// Any unit class.
    pub fn arb_class() -> impl Strategy<Value = UnitClass> {
        prop_oneof![
            Just(UnitClass::Mage),
            Just(UnitClass::Knight),
            Just(UnitClass::Rogue),
            Just(UnitClass::Blademaster),
        ]
    }

    /// Grid dimensions from 1x1 to `max`x`max`.
    pub fn arb_size(max: u32) -> impl Strategy<Value = (u32, u32)> {
        (1..=max, 1..=max)
    }

    /// A coordinate inside a `width`x`height` grid.
    pub fn arb_pos_in(width: u32, height: u32) -> impl Strategy<Value = (i32, i32)> {
        (0..width as i32, 0..height as i32)
    }

    /// Ascii map rows of random terrain.
    pub fn arb_ascii_map(width: usize, height: usize) -> impl Strategy<Value = Vec<String>> {
        proptest::collection::vec(
            proptest::collection::vec(arb_terrain(), width)
                .prop_map(|row| row.into_iter().map(TerrainKind::glyph).collect::<String>()),
            height,
        )
    }

    /// Movement budgets from 0 to 20.
    pub fn arb_movement() -> impl Strategy<Value = u32> {
        0u32..=20
    }

    /// Health values (1-120), straddling the evaluator's reference health.
    pub fn arb_health() -> impl Strategy<Value = u32> {
        1u32..=120
    }
}
