//! Error types for the tactical core.

use thiserror::Error;

use crate::battlefield::BattleError;
use crate::data::DataError;
use crate::grid::GridError;
use crate::orders::OrderError;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for every fallible core operation.
///
/// Expected non-results (absent tiles, empty paths, no viable move) are
/// `Option`s or empty collections and never show up here.
#[derive(Debug, Error)]
pub enum GameError {
    /// Grid could not be built from the supplied map.
    #[error("Invalid map: {0}")]
    Grid(#[from] GridError),

    /// Occupancy or unit operation rejected.
    #[error("Battlefield error: {0}")]
    Battle(#[from] BattleError),

    /// Player order rejected.
    #[error("Order rejected: {0}")]
    Order(#[from] OrderError),

    /// Terrain data could not be loaded.
    #[error("Terrain data error: {0}")]
    Data(#[from] DataError),
}
