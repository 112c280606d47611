//! Move generation, scoring and selection for computer-controlled units.
//!
//! For one unit the evaluator enumerates destinations from the movement
//! range query plus the unit's own tile, and for each destination the
//! tiles in action range. Every destination gets
//!
//! ```text
//! move score = terrain score + threat score + strategic score + best action score
//! ```
//!
//! and the highest score wins. Equal scores keep the candidate found
//! first, so the choice is reproducible.

use serde::{Deserialize, Serialize};

use crate::action::can_act_on;
use crate::battlefield::Battlefield;
use crate::grid::TilePos;
use crate::math::{decimal_serde, Fixed};
use crate::pathfinding::{find_path, path_cost};
use crate::range::{tiles_in_range, RangeMode};
use crate::terrain::TerrainKind;
use crate::unit::{Unit, UnitId};

/// Tunable scoring weights.
///
/// Missing fields in a data file fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorWeights {
    /// Multiplier on the destination's defense bonus.
    #[serde(with = "decimal_serde")]
    pub terrain_defense: Fixed,
    /// Multiplier on the destination's movement cost (subtracted).
    #[serde(with = "decimal_serde")]
    pub terrain_cost: Fixed,
    /// Flat bonus when an opposing unit is attackable from the destination.
    /// Must dominate every other term.
    #[serde(with = "decimal_serde")]
    pub attack_threat_bonus: Fixed,
    /// Per in-bounds neighbor of the destination.
    #[serde(with = "decimal_serde")]
    pub neighbor: Fixed,
    /// Bonus for standing on Mountains.
    #[serde(with = "decimal_serde")]
    pub mountains_bonus: Fixed,
    /// Bonus for standing on Forest.
    #[serde(with = "decimal_serde")]
    pub forest_bonus: Fixed,
    /// Bonus for standing on Plains.
    #[serde(with = "decimal_serde")]
    pub plains_bonus: Fixed,
    /// Multiplier on the actor's attack stat.
    #[serde(with = "decimal_serde")]
    pub attack: Fixed,
    /// Multiplier on the target's missing health.
    #[serde(with = "decimal_serde")]
    pub health_deficit: Fixed,
    /// Health the deficit is measured from.
    pub reference_health: u32,
    /// Multiplier on the target's defense bonus (subtracted).
    #[serde(with = "decimal_serde")]
    pub target_defense: Fixed,
}

impl Default for EvaluatorWeights {
    fn default() -> Self {
        Self {
            terrain_defense: Fixed::from_num(10),
            terrain_cost: Fixed::from_num(5),
            attack_threat_bonus: Fixed::from_num(999),
            neighbor: Fixed::from_num(5),
            mountains_bonus: Fixed::from_num(15),
            forest_bonus: Fixed::from_num(10),
            plains_bonus: Fixed::from_num(5),
            attack: Fixed::from_num(10),
            health_deficit: Fixed::from_num(5),
            reference_health: 100,
            target_defense: Fixed::from_num(8),
        }
    }
}

impl EvaluatorWeights {
    /// Positional bonus for a terrain kind.
    #[must_use]
    pub fn terrain_kind_bonus(&self, kind: TerrainKind) -> Fixed {
        match kind {
            TerrainKind::Mountains => self.mountains_bonus,
            TerrainKind::Forest => self.forest_bonus,
            TerrainKind::Plains => self.plains_bonus,
            TerrainKind::Water | TerrainKind::Desert => Fixed::ZERO,
        }
    }
}

/// Evaluator settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorConfig {
    /// Scoring weights.
    pub weights: EvaluatorWeights,
    /// Drop destinations the pathfinder cannot reach within the unit's
    /// movement stat. The range query alone over-reports reach.
    pub validate_reachability: bool,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            weights: EvaluatorWeights::default(),
            validate_reachability: true,
        }
    }
}

/// One scored (destination, target) option for a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveCandidate {
    /// Unit being evaluated.
    pub unit: UnitId,
    /// Where the unit would end up. May be its current tile.
    pub destination: TilePos,
    /// Best valid action target from the destination, if any.
    pub target: Option<TilePos>,
    /// Combined score.
    #[serde(with = "decimal_serde")]
    pub score: Fixed,
}

impl MoveCandidate {
    /// Whether the candidate keeps the unit where it is.
    #[must_use]
    pub fn is_stay(&self, current: TilePos) -> bool {
        self.destination == current
    }
}

/// Scores and selects moves.
#[derive(Debug, Clone, Default)]
pub struct MoveEvaluator {
    config: EvaluatorConfig,
}

impl MoveEvaluator {
    /// Create an evaluator.
    #[must_use]
    pub fn new(config: EvaluatorConfig) -> Self {
        Self { config }
    }

    /// Evaluator settings.
    #[must_use]
    pub const fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    /// Every scored candidate for `unit`, in enumeration order.
    ///
    /// Destinations come from the movement range query in ray order,
    /// followed by the unit's own tile. An unknown or dead unit has no
    /// candidates.
    #[must_use]
    pub fn evaluate_all(&self, battlefield: &Battlefield, unit: UnitId) -> Vec<MoveCandidate> {
        let Some(unit) = battlefield.unit(unit).filter(|u| u.is_alive()) else {
            return Vec::new();
        };
        let grid = battlefield.grid();

        let mut destinations = tiles_in_range(
            grid,
            unit.class(),
            unit.pos(),
            unit.stats.movement,
            RangeMode::Movement,
        );
        if self.config.validate_reachability {
            destinations.retain(|&dest| Self::is_reachable(battlefield, unit, dest));
        }
        destinations.push(unit.pos());

        destinations
            .into_iter()
            .map(|destination| self.evaluate_destination(battlefield, unit, destination))
            .collect()
    }

    /// The highest-scoring candidate for `unit`, or `None` when it has
    /// no options at all.
    #[must_use]
    pub fn find_best_move(&self, battlefield: &Battlefield, unit: UnitId) -> Option<MoveCandidate> {
        let candidates = self.evaluate_all(battlefield, unit);
        let best = candidates.into_iter().reduce(|best, candidate| {
            if candidate.score > best.score {
                candidate
            } else {
                best
            }
        });

        if let Some(best) = &best {
            tracing::debug!(
                unit = %unit,
                destination = %best.destination,
                target = ?best.target,
                score = %best.score,
                "Best move selected"
            );
        }
        best
    }

    fn is_reachable(battlefield: &Battlefield, unit: &Unit, dest: TilePos) -> bool {
        let path = find_path(battlefield, unit, dest);
        if path.is_empty() {
            return false;
        }
        path_cost(battlefield.grid(), unit.class(), &path)
            .is_some_and(|cost| cost <= Fixed::saturating_from_num(unit.stats.movement))
    }

    fn evaluate_destination(
        &self,
        battlefield: &Battlefield,
        unit: &Unit,
        destination: TilePos,
    ) -> MoveCandidate {
        let action_tiles = tiles_in_range(
            battlefield.grid(),
            unit.class(),
            destination,
            unit.stats.range,
            RangeMode::Action,
        );

        let mut best_action: Option<(TilePos, Fixed)> = None;
        for &tile in &action_tiles {
            let Some(score) = self.action_score(battlefield, unit, tile) else {
                continue;
            };
            if best_action.map_or(true, |(_, best)| score > best) {
                best_action = Some((tile, score));
            }
        }

        let threat = if best_action.is_some() {
            self.config.weights.attack_threat_bonus
        } else {
            Fixed::ZERO
        };
        let score = self
            .terrain_score(battlefield, unit, destination)
            .saturating_add(threat)
            .saturating_add(self.strategic_score(battlefield, destination))
            .saturating_add(best_action.map_or(Fixed::ZERO, |(_, s)| s));

        MoveCandidate {
            unit: unit.id(),
            destination,
            target: best_action.map(|(tile, _)| tile),
            score,
        }
    }

    /// Defense bonus reward minus movement cost penalty at `pos`.
    ///
    /// Every score term saturates at the bounds of [`Fixed`] instead of
    /// overflowing, so extreme weights still rank moves in order.
    ///
    /// Impassable terrain contributes no cost; a unit can still be standing
    /// on it after the terrain changed underneath.
    #[must_use]
    pub fn terrain_score(&self, battlefield: &Battlefield, unit: &Unit, pos: TilePos) -> Fixed {
        let grid = battlefield.grid();
        let weights = &self.config.weights;
        let defense = grid.defense_bonus(pos, unit.class()).unwrap_or(Fixed::ZERO);
        let cost = grid.movement_cost(pos, unit.class()).unwrap_or(Fixed::ZERO);
        defense
            .saturating_mul(weights.terrain_defense)
            .saturating_sub(cost.saturating_mul(weights.terrain_cost))
    }

    /// Area control: neighbor count plus the terrain-kind bonus.
    #[must_use]
    pub fn strategic_score(&self, battlefield: &Battlefield, pos: TilePos) -> Fixed {
        let grid = battlefield.grid();
        let weights = &self.config.weights;
        let Some(tile) = grid.tile(pos) else {
            return Fixed::ZERO;
        };
        let neighbors = grid.neighbors(pos).count();
        Fixed::saturating_from_num(neighbors)
            .saturating_mul(weights.neighbor)
            .saturating_add(weights.terrain_kind_bonus(tile.terrain()))
    }

    /// Score for acting on `target`, or `None` if it is not a valid target.
    #[must_use]
    pub fn action_score(&self, battlefield: &Battlefield, unit: &Unit, target: TilePos) -> Option<Fixed> {
        if !can_act_on(battlefield, unit, target) {
            return None;
        }
        let defender = battlefield.unit_at(target)?;
        let weights = &self.config.weights;

        let deficit = weights.reference_health.saturating_sub(defender.stats.health);
        let cover = battlefield
            .grid()
            .defense_bonus(target, defender.class())
            .unwrap_or(Fixed::ZERO);

        Some(
            Fixed::saturating_from_num(unit.stats.attack)
                .saturating_mul(weights.attack)
                .saturating_add(Fixed::saturating_from_num(deficit).saturating_mul(weights.health_deficit))
                .saturating_sub(cover.saturating_mul(weights.target_defense)),
        )
    }
}
