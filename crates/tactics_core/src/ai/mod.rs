//! Computer-controlled play: move evaluation and turn sequencing.

mod evaluator;
mod turn;

pub use evaluator::{EvaluatorConfig, EvaluatorWeights, MoveCandidate, MoveEvaluator};
pub use turn::{AiPhase, AiTurn, TurnEvent};
