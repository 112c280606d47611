//! Headless scenario runner for AI turn testing and CI verification.
//!
//! Loads a scenario, plays it with the tactical core's AI and streams
//! what happens as JSON lines. This enables:
//!
//! - **AI testing**: Watch the evaluator play without any graphics
//! - **CI verification**: Check that runs are reproducible end to end
//! - **Scenario validation**: Catch broken maps and placements early
//!
//! # Protocol
//!
//! - **stdout**: Game events (JSON, one per line)
//! - **stderr**: Logs (human-readable)
//!
//! See [`protocol`] module for the event format.
//!
//! # Example
//!
//! ```bash
//! # Run a scenario with a half-second pause between AI units
//! cargo run -p tactics_headless -- run --scenario scenarios/skirmish.ron --delay-ms 500
//!
//! # Check a scenario without playing it
//! cargo run -p tactics_headless -- validate --scenario scenarios/skirmish.ron
//! ```

pub mod pacer;
pub mod protocol;
pub mod runner;
pub mod scenario;

pub use pacer::{cancel_channel, CancelHandle, Pacer, Settle};
pub use protocol::{Event, GameResult, UnitState};
pub use runner::{GameRunner, GameSummary, RunConfig, RunError};
pub use scenario::{Scenario, ScenarioError, UnitPlacement};
