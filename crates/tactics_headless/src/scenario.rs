//! Scenario loading and configuration.
//!
//! Scenarios define the starting battlefield for headless runs: the ascii
//! terrain map, an optional terrain table and evaluator weights, where
//! each unit stands and how many rounds to play.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use tactics_core::ai::{EvaluatorConfig, EvaluatorWeights, MoveEvaluator};
use tactics_core::battlefield::Battlefield;
use tactics_core::data::TerrainTable;
use tactics_core::error::GameError;
use tactics_core::grid::{Grid, TilePos};
use tactics_core::unit::{Side, UnitClass, UnitStats};

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// The map or a unit placement is invalid.
    #[error("Invalid scenario: {0}")]
    Invalid(#[from] GameError),
    /// No units of one side, so the game is over before it starts.
    #[error("Scenario has no {0:?} units")]
    MissingSide(Side),
}

fn default_rounds() -> u32 {
    10
}

/// A complete scenario configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Terrain rows, one glyph per tile (`.` `^` `T` `~` `:`).
    pub map: Vec<String>,
    /// Terrain table override. The built-in table is used when absent.
    #[serde(default)]
    pub terrain: Option<TerrainTable>,
    /// Evaluator weight override.
    #[serde(default)]
    pub weights: Option<EvaluatorWeights>,
    /// Starting units, deployed in order.
    pub units: Vec<UnitPlacement>,
    /// Full rounds to play before the game is called a draw.
    #[serde(default = "default_rounds")]
    pub rounds: u32,
    /// Let the evaluator play the player side too.
    #[serde(default)]
    pub player_ai: bool,
}

impl Default for Scenario {
    fn default() -> Self {
        Self::skirmish()
    }
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        let scenario: Scenario = ron::from_str(&contents)?;
        Ok(scenario)
    }

    /// Load from a RON string (useful for embedded scenarios).
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        Ok(scenario)
    }

    /// Small mixed-terrain skirmish, two units a side.
    #[must_use]
    pub fn skirmish() -> Self {
        Self {
            name: "Border Skirmish".to_string(),
            description: "Knight and mage hold the west bank against a rogue and a blademaster"
                .to_string(),
            map: [
                "....TT....",
                "..^^TT..~~",
                "..^.....~~",
                ":::...T...",
                "...TT.T.^.",
                ".......^^.",
                "~~..::....",
                "~~..::..TT",
            ]
            .iter()
            .map(|row| (*row).to_string())
            .collect(),
            terrain: None,
            weights: None,
            units: vec![
                UnitPlacement::new(Side::Player, UnitClass::Knight, 0, 0),
                UnitPlacement::new(Side::Player, UnitClass::Mage, 1, 3),
                UnitPlacement::new(Side::Ai, UnitClass::Rogue, 9, 7),
                UnitPlacement::new(Side::Ai, UnitClass::Blademaster, 9, 4),
            ],
            rounds: default_rounds(),
            player_ai: false,
        }
    }

    /// Build the starting battlefield.
    ///
    /// Fails if the map is malformed, a unit cannot be placed, or one side
    /// has no units at all.
    pub fn build_battlefield(&self) -> Result<Battlefield, ScenarioError> {
        let table = self.terrain.clone().unwrap_or_default();
        let grid = Grid::from_ascii(&self.map, table).map_err(GameError::from)?;
        let mut battlefield = Battlefield::new(grid);

        for placement in &self.units {
            let stats = placement.stats.unwrap_or_else(|| placement.class.base_stats());
            let (x, y) = placement.position;
            battlefield
                .deploy(placement.side, placement.class, stats, TilePos::new(x, y))
                .map_err(GameError::from)?;
        }

        for side in [Side::Player, Side::Ai] {
            if battlefield.is_defeated(side) {
                return Err(ScenarioError::MissingSide(side));
            }
        }

        tracing::debug!(
            scenario = %self.name,
            width = battlefield.grid().width(),
            height = battlefield.grid().height(),
            units = self.units.len(),
            "Scenario battlefield built"
        );
        Ok(battlefield)
    }

    /// Evaluator configured with this scenario's weights.
    #[must_use]
    pub fn evaluator(&self) -> MoveEvaluator {
        MoveEvaluator::new(EvaluatorConfig {
            weights: self.weights.clone().unwrap_or_default(),
            ..EvaluatorConfig::default()
        })
    }
}

/// Placement of a unit at scenario start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitPlacement {
    /// Controlling side.
    pub side: Side,
    /// Unit class.
    pub class: UnitClass,
    /// Position (x, y).
    pub position: (i32, i32),
    /// Stat override. The class preset is used when absent.
    #[serde(default)]
    pub stats: Option<UnitStats>,
}

impl UnitPlacement {
    /// Create a unit placement with preset stats.
    #[must_use]
    pub fn new(side: Side, class: UnitClass, x: i32, y: i32) -> Self {
        Self {
            side,
            class,
            position: (x, y),
            stats: None,
        }
    }
}
