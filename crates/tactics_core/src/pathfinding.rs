//! Terrain-weighted A* over the battlefield grid.
//!
//! All costs use fixed-point math so that identical battlefields always
//! produce identical routes.
//!
//! The heuristic scales Manhattan distance by the average entry cost
//! sampled along a straight walk to the goal. It can overestimate, so the
//! search favours speed over guaranteed optimality on mixed terrain. On
//! uniform terrain routes have Chebyshev length.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use crate::battlefield::Battlefield;
use crate::grid::{Grid, TilePos, DIRECTIONS};
use crate::math::Fixed;
use crate::unit::{Unit, UnitClass};

/// A node in the A* open set priority queue.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
struct AStarNode {
    pos: TilePos,
    /// f_score = g_score + heuristic.
    f_score: Fixed,
    /// Insertion sequence. Earlier pushes win ties on f_score.
    tie_breaker: u64,
}

impl Ord for AStarNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap, so reverse both comparisons.
        match other.f_score.cmp(&self.f_score) {
            Ordering::Equal => other.tie_breaker.cmp(&self.tie_breaker),
            ord => ord,
        }
    }
}

impl PartialOrd for AStarNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Terrain-aware distance estimate from `from` to `goal`.
///
/// Walks x first, then y, sampling the entry cost of every tile from
/// `from` (inclusive) up to `goal` (exclusive). Impassable samples are
/// skipped; with no samples the average is 1.
fn weighted_heuristic(grid: &Grid, class: UnitClass, from: TilePos, goal: TilePos) -> Fixed {
    if from == goal {
        return Fixed::ZERO;
    }

    let mut total = Fixed::ZERO;
    let mut samples = 0_i32;
    let mut cursor = from;
    while cursor != goal {
        if let Some(cost) = grid.movement_cost(cursor, class) {
            total = total.saturating_add(cost);
            samples += 1;
        }
        if cursor.x == goal.x {
            cursor.y += (goal.y - cursor.y).signum();
        } else {
            cursor.x += (goal.x - cursor.x).signum();
        }
    }

    let average = if samples == 0 {
        Fixed::ONE
    } else {
        total / Fixed::from_num(samples)
    };
    Fixed::saturating_from_num(from.manhattan_distance(goal)).saturating_mul(average)
}

/// Find a route for `unit` from its tile to `goal`.
///
/// The route starts at the unit's tile and ends at `goal`, both inclusive.
/// Each step enters an adjacent tile the unit may enter: allies can be
/// passed through, opposing units and impassable terrain cannot.
///
/// Returns an empty vector when no route exists, including when `goal` is
/// out of bounds or closed to the unit. A route to the unit's own tile is
/// just that tile.
#[must_use]
pub fn find_path(battlefield: &Battlefield, unit: &Unit, goal: TilePos) -> Vec<TilePos> {
    let start = unit.pos();
    if start == goal {
        return vec![start];
    }
    if !battlefield.can_enter(unit, goal) {
        return Vec::new();
    }

    let grid = battlefield.grid();
    let class = unit.class();

    let mut open_set: BinaryHeap<AStarNode> = BinaryHeap::new();
    let mut came_from: HashMap<TilePos, TilePos> = HashMap::new();
    let mut g_score: HashMap<TilePos, Fixed> = HashMap::new();
    let mut closed: HashSet<TilePos> = HashSet::new();
    let mut sequence = 0_u64;

    g_score.insert(start, Fixed::ZERO);
    open_set.push(AStarNode {
        pos: start,
        f_score: weighted_heuristic(grid, class, start, goal),
        tie_breaker: sequence,
    });

    while let Some(current) = open_set.pop() {
        if !closed.insert(current.pos) {
            // Stale entry for a node already expanded.
            continue;
        }

        if current.pos == goal {
            let path = reconstruct_path(&came_from, goal);
            tracing::trace!(
                unit = %unit.id(),
                %start,
                %goal,
                steps = path.len() - 1,
                expanded = closed.len(),
                "Path found"
            );
            return path;
        }

        let current_g = g_score.get(&current.pos).copied().unwrap_or(Fixed::MAX);

        for &(dx, dy) in &DIRECTIONS {
            let next = current.pos.offset(dx, dy);
            if closed.contains(&next) || !battlefield.can_enter(unit, next) {
                continue;
            }
            let Some(step_cost) = grid.movement_cost(next, class) else {
                continue;
            };

            let tentative_g = current_g.saturating_add(step_cost);
            let known_g = g_score.get(&next).copied().unwrap_or(Fixed::MAX);

            if tentative_g < known_g {
                came_from.insert(next, current.pos);
                g_score.insert(next, tentative_g);

                sequence += 1;
                open_set.push(AStarNode {
                    pos: next,
                    f_score: tentative_g.saturating_add(weighted_heuristic(grid, class, next, goal)),
                    tie_breaker: sequence,
                });
            }
        }
    }

    tracing::trace!(unit = %unit.id(), %start, %goal, "No path");
    Vec::new()
}

/// Total entry cost of a route for `class`: the sum of the movement costs
/// of every tile after the first.
///
/// Returns `None` if any step is out of bounds or impassable.
#[must_use]
pub fn path_cost(grid: &Grid, class: UnitClass, path: &[TilePos]) -> Option<Fixed> {
    path.iter()
        .skip(1)
        .try_fold(Fixed::ZERO, |total, &pos| {
            grid.movement_cost(pos, class).map(|cost| total.saturating_add(cost))
        })
}

/// Reconstruct path from came_from map.
fn reconstruct_path(came_from: &HashMap<TilePos, TilePos>, goal: TilePos) -> Vec<TilePos> {
    let mut path = vec![goal];
    let mut current = goal;

    while let Some(&prev) = came_from.get(&current) {
        path.push(prev);
        current = prev;
    }

    path.reverse();
    path
}
