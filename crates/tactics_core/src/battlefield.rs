//! Battlefield state: the grid plus every deployed unit.
//!
//! Tile occupancy and unit positions reference each other by index (tile
//! coordinate, unit id). All occupancy changes go through this module so
//! both sides are always updated together.

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use thiserror::Error;

use crate::grid::{Grid, TilePos};
use crate::math::Fixed;
use crate::unit::{Side, Unit, UnitClass, UnitId, UnitStats};

/// Errors raised by occupancy and unit operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BattleError {
    /// No unit with this id is deployed.
    #[error("Unknown unit {0}")]
    UnknownUnit(UnitId),

    /// The unit has no health left.
    #[error("Unit {0} is dead")]
    DeadUnit(UnitId),

    /// Coordinate lies outside the grid.
    #[error("Position {0} is out of bounds")]
    OutOfBounds(TilePos),

    /// Another unit already stands there.
    #[error("Position {pos} is occupied by unit {occupant}")]
    Occupied {
        /// Requested tile.
        pos: TilePos,
        /// Unit standing there.
        occupant: UnitId,
    },

    /// The unit's class cannot stand on that terrain.
    #[error("Position {pos} is impassable for {class:?}")]
    Impassable {
        /// Requested tile.
        pos: TilePos,
        /// Class of the unit.
        class: UnitClass,
    },

    /// The unit already used the move or action it attempted.
    #[error("Unit {0} cannot do that again this turn")]
    TurnSpent(UnitId),

    /// The tile does not hold a valid target for the unit.
    #[error("Unit {unit} cannot act on {pos}")]
    InvalidTarget {
        /// Acting unit.
        unit: UnitId,
        /// Requested target tile.
        pos: TilePos,
    },

    /// A stat lies outside the range the scoring math supports.
    #[error("Stat {field} = {value} exceeds the maximum of {max}", max = UnitStats::MAX_VALUE)]
    InvalidStats {
        /// Offending stat.
        field: &'static str,
        /// Rejected value.
        value: u32,
    },

    /// A route is empty, disconnected or does not start at the unit.
    #[error("Invalid route for unit {unit}: {reason}")]
    InvalidRoute {
        /// Unit being moved.
        unit: UnitId,
        /// What is wrong with the route.
        reason: String,
    },
}

/// The grid and the units standing on it.
#[derive(Debug, Clone)]
pub struct Battlefield {
    grid: Grid,
    units: BTreeMap<UnitId, Unit>,
    next_id: u32,
}

impl Battlefield {
    /// Create a battlefield with no units.
    #[must_use]
    pub fn new(grid: Grid) -> Self {
        Self {
            grid,
            units: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// The grid.
    #[must_use]
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Mutable grid access, for terrain changes.
    ///
    /// Occupancy cannot be changed through the grid.
    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    /// Place a new unit on an empty, enterable tile.
    ///
    /// Stats above [`UnitStats::MAX_VALUE`] are rejected.
    pub fn deploy(
        &mut self,
        side: Side,
        class: UnitClass,
        stats: UnitStats,
        pos: TilePos,
    ) -> Result<UnitId, BattleError> {
        if let Some((field, value)) = stats.out_of_range() {
            return Err(BattleError::InvalidStats { field, value });
        }
        self.check_destination(pos, class)?;

        let id = UnitId::new(self.next_id);
        self.next_id += 1;

        if let Some(tile) = self.grid.tile_mut(pos) {
            tile.set_occupant(Some(id));
        }
        self.units.insert(id, Unit::new(id, side, class, stats, pos));

        tracing::debug!(unit = %id, ?side, ?class, %pos, "Deployed unit");
        Ok(id)
    }

    /// Look up a unit.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    pub(crate) fn unit_mut(&mut self, id: UnitId) -> Result<&mut Unit, BattleError> {
        self.units.get_mut(&id).ok_or(BattleError::UnknownUnit(id))
    }

    /// All units, in id order.
    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    /// Units of one side, in id order.
    pub fn units_of(&self, side: Side) -> impl Iterator<Item = &Unit> {
        self.units.values().filter(move |u| u.side() == side)
    }

    /// Unit standing on `pos`.
    #[must_use]
    pub fn unit_at(&self, pos: TilePos) -> Option<&Unit> {
        self.grid
            .tile(pos)
            .and_then(|t| t.occupant())
            .and_then(|id| self.units.get(&id))
    }

    /// Whether `unit` may step onto `pos` while travelling.
    ///
    /// Tiles held by hostile units and terrain the unit's class cannot
    /// cross are closed. Allies may be passed through.
    #[must_use]
    pub fn can_enter(&self, unit: &Unit, pos: TilePos) -> bool {
        let Some(tile) = self.grid.tile(pos) else {
            return false;
        };
        if let Some(other) = tile.occupant().and_then(|id| self.units.get(&id)) {
            if other.is_hostile_to(unit) {
                return false;
            }
        }
        self.grid.movement_cost(pos, unit.class()).is_some()
    }

    fn check_destination(&self, pos: TilePos, class: UnitClass) -> Result<(), BattleError> {
        let tile = self.grid.tile(pos).ok_or(BattleError::OutOfBounds(pos))?;
        if let Some(occupant) = tile.occupant() {
            return Err(BattleError::Occupied { pos, occupant });
        }
        if self.grid.movement_cost(pos, class).is_none() {
            return Err(BattleError::Impassable { pos, class });
        }
        Ok(())
    }

    /// Move a unit to `to`, updating the tile and the unit together.
    ///
    /// Either both sides change or neither does. Relocating onto the
    /// unit's own tile is a no-op.
    pub fn relocate(&mut self, id: UnitId, to: TilePos) -> Result<(), BattleError> {
        let unit = self.units.get(&id).ok_or(BattleError::UnknownUnit(id))?;
        if !unit.is_alive() {
            return Err(BattleError::DeadUnit(id));
        }
        let from = unit.pos();
        if from == to {
            return Ok(());
        }
        self.check_destination(to, unit.class())?;

        if let Some(tile) = self.grid.tile_mut(from) {
            tile.set_occupant(None);
        }
        if let Some(tile) = self.grid.tile_mut(to) {
            tile.set_occupant(Some(id));
        }
        if let Some(unit) = self.units.get_mut(&id) {
            unit.set_pos(to);
        }

        #[cfg(feature = "debug-validation")]
        debug_assert!(self.occupancy_is_consistent(), "occupancy diverged after relocate");

        Ok(())
    }

    /// Walk a unit along a route and mark it as moved.
    ///
    /// The whole route is validated before anything changes: it must start
    /// at the unit, step between adjacent enterable tiles and end on an
    /// empty tile. Returns the total entry cost of the route.
    pub fn apply_route(&mut self, id: UnitId, route: &[TilePos]) -> Result<Fixed, BattleError> {
        let unit = self.units.get(&id).ok_or(BattleError::UnknownUnit(id))?;
        let invalid = |reason: &str| BattleError::InvalidRoute {
            unit: id,
            reason: reason.to_string(),
        };

        let (&first, rest) = route.split_first().ok_or_else(|| invalid("route is empty"))?;
        if first != unit.pos() {
            return Err(invalid("route does not start at the unit"));
        }

        let mut cost = Fixed::ZERO;
        let mut previous = first;
        for &step in rest {
            if !previous.is_adjacent(step) {
                return Err(invalid("route steps are not adjacent"));
            }
            if !self.can_enter(unit, step) {
                return Err(invalid("route crosses a closed tile"));
            }
            cost += self
                .grid
                .movement_cost(step, unit.class())
                .unwrap_or(Fixed::ZERO);
            previous = step;
        }

        self.relocate(id, previous)?;
        self.unit_mut(id)?.mark_moved();
        Ok(cost)
    }

    /// Take a unit off the battlefield, clearing its tile.
    pub fn remove_unit(&mut self, id: UnitId) -> Result<Unit, BattleError> {
        let unit = self.units.remove(&id).ok_or(BattleError::UnknownUnit(id))?;
        if let Some(tile) = self.grid.tile_mut(unit.pos()) {
            if tile.occupant() == Some(id) {
                tile.set_occupant(None);
            }
        }
        tracing::debug!(unit = %id, pos = %unit.pos(), "Removed unit");
        Ok(unit)
    }

    /// End a unit's turn without further moves or actions.
    pub fn finish_turn(&mut self, id: UnitId) -> Result<(), BattleError> {
        self.unit_mut(id)?.finish_turn();
        Ok(())
    }

    /// Reset the turn state of every unit on `side`.
    pub fn reset_side(&mut self, side: Side) {
        for unit in self.units.values_mut().filter(|u| u.side() == side) {
            unit.reset_turn();
        }
    }

    /// Whether every unit of `side` is done for this turn.
    #[must_use]
    pub fn side_turn_over(&self, side: Side) -> bool {
        self.units_of(side).all(Unit::is_turn_over)
    }

    /// Whether `side` has no units left.
    #[must_use]
    pub fn is_defeated(&self, side: Side) -> bool {
        self.units_of(side).next().is_none()
    }

    /// Check that every occupant points back at its tile and vice versa.
    #[must_use]
    pub fn occupancy_is_consistent(&self) -> bool {
        let units_ok = self.units.values().all(|unit| {
            self.grid
                .tile(unit.pos())
                .is_some_and(|t| t.occupant() == Some(unit.id()))
        });
        let tiles_ok = self.grid.tiles().all(|tile| match tile.occupant() {
            Some(id) => self.units.get(&id).is_some_and(|u| u.pos() == tile.pos()),
            None => true,
        });
        units_ok && tiles_ok
    }

    /// Hash of terrain, occupancy and unit state.
    ///
    /// Identical battlefields always hash the same; used to check that
    /// AI turns are reproducible.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        for tile in self.grid.tiles() {
            tile.terrain().hash(&mut hasher);
            tile.occupant().hash(&mut hasher);
        }
        for unit in self.units.values() {
            unit.hash(&mut hasher);
        }
        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::TerrainKind;

    fn field() -> Battlefield {
        Battlefield::new(Grid::new(5, 5))
    }

    #[test]
    fn test_deploy_sets_both_sides_of_occupancy() {
        let mut bf = field();
        let id = bf
            .deploy(Side::Ai, UnitClass::Knight, UnitStats::knight(), TilePos::new(1, 2))
            .unwrap();

        assert_eq!(bf.grid().tile_at(1, 2).unwrap().occupant(), Some(id));
        assert_eq!(bf.unit(id).unwrap().pos(), TilePos::new(1, 2));
        assert!(bf.occupancy_is_consistent());
    }

    #[test]
    fn test_deploy_rejects_bad_tiles() {
        let mut bf = field();
        let pos = TilePos::new(0, 0);
        let first = bf
            .deploy(Side::Ai, UnitClass::Knight, UnitStats::knight(), pos)
            .unwrap();

        assert_eq!(
            bf.deploy(Side::Player, UnitClass::Mage, UnitStats::mage(), pos),
            Err(BattleError::Occupied { pos, occupant: first })
        );
        assert_eq!(
            bf.deploy(Side::Player, UnitClass::Mage, UnitStats::mage(), TilePos::new(7, 0)),
            Err(BattleError::OutOfBounds(TilePos::new(7, 0)))
        );

        bf.grid_mut().set_terrain(&[TilePos::new(3, 3)], TerrainKind::Mountains);
        assert!(matches!(
            bf.deploy(Side::Player, UnitClass::Knight, UnitStats::knight(), TilePos::new(3, 3)),
            Err(BattleError::Impassable { .. })
        ));
    }

    #[test]
    fn test_deploy_rejects_stats_outside_fixed_point_domain() {
        let mut bf = field();
        let stats = UnitStats {
            movement: 3_000_000_000,
            ..UnitStats::knight()
        };
        assert_eq!(
            bf.deploy(Side::Ai, UnitClass::Knight, stats, TilePos::new(0, 0)),
            Err(BattleError::InvalidStats {
                field: "movement",
                value: 3_000_000_000
            })
        );

        let stats = UnitStats {
            attack: UnitStats::MAX_VALUE + 1,
            ..UnitStats::knight()
        };
        assert!(matches!(
            bf.deploy(Side::Ai, UnitClass::Knight, stats, TilePos::new(0, 0)),
            Err(BattleError::InvalidStats { field: "attack", .. })
        ));
        assert!(bf.grid().tile_at(0, 0).unwrap().occupant().is_none());

        let stats = UnitStats {
            attack: UnitStats::MAX_VALUE,
            ..UnitStats::knight()
        };
        assert!(bf
            .deploy(Side::Ai, UnitClass::Knight, stats, TilePos::new(0, 0))
            .is_ok());
    }

    #[test]
    fn test_relocate_is_atomic() {
        let mut bf = field();
        let a = bf
            .deploy(Side::Ai, UnitClass::Knight, UnitStats::knight(), TilePos::new(0, 0))
            .unwrap();
        let b = bf
            .deploy(Side::Ai, UnitClass::Knight, UnitStats::knight(), TilePos::new(1, 0))
            .unwrap();

        bf.relocate(a, TilePos::new(0, 1)).unwrap();
        assert!(bf.grid().tile_at(0, 0).unwrap().occupant().is_none());
        assert_eq!(bf.grid().tile_at(0, 1).unwrap().occupant(), Some(a));

        let err = bf.relocate(a, TilePos::new(1, 0)).unwrap_err();
        assert_eq!(
            err,
            BattleError::Occupied {
                pos: TilePos::new(1, 0),
                occupant: b
            }
        );
        assert_eq!(bf.unit(a).unwrap().pos(), TilePos::new(0, 1));
        assert!(bf.occupancy_is_consistent());
    }

    #[test]
    fn test_can_enter_passes_allies_but_not_enemies() {
        let mut bf = field();
        let mover = bf
            .deploy(Side::Ai, UnitClass::Knight, UnitStats::knight(), TilePos::new(0, 0))
            .unwrap();
        bf.deploy(Side::Ai, UnitClass::Mage, UnitStats::mage(), TilePos::new(1, 0))
            .unwrap();
        bf.deploy(Side::Player, UnitClass::Mage, UnitStats::mage(), TilePos::new(0, 1))
            .unwrap();

        let unit = bf.unit(mover).unwrap();
        assert!(bf.can_enter(unit, TilePos::new(1, 0)));
        assert!(!bf.can_enter(unit, TilePos::new(0, 1)));
        assert!(bf.can_enter(unit, TilePos::new(1, 1)));
        assert!(!bf.can_enter(unit, TilePos::new(-1, 0)));
    }

    #[test]
    fn test_apply_route_moves_and_marks() {
        let mut bf = field();
        let id = bf
            .deploy(Side::Ai, UnitClass::Knight, UnitStats::knight(), TilePos::new(0, 0))
            .unwrap();
        let route = [TilePos::new(0, 0), TilePos::new(1, 1), TilePos::new(2, 2)];

        let cost = bf.apply_route(id, &route).unwrap();

        assert_eq!(cost, Fixed::from_num(2));
        let unit = bf.unit(id).unwrap();
        assert_eq!(unit.pos(), TilePos::new(2, 2));
        assert!(!unit.turn_state().can_move());
        assert!(bf.occupancy_is_consistent());
    }

    #[test]
    fn test_apply_route_rejects_gaps_without_side_effects() {
        let mut bf = field();
        let id = bf
            .deploy(Side::Ai, UnitClass::Knight, UnitStats::knight(), TilePos::new(0, 0))
            .unwrap();
        let before = bf.state_hash();

        let err = bf
            .apply_route(id, &[TilePos::new(0, 0), TilePos::new(2, 2)])
            .unwrap_err();

        assert!(matches!(err, BattleError::InvalidRoute { .. }));
        assert_eq!(bf.state_hash(), before);
        assert!(bf.apply_route(id, &[]).is_err());
    }

    #[test]
    fn test_remove_unit_clears_tile() {
        let mut bf = field();
        let id = bf
            .deploy(Side::Player, UnitClass::Rogue, UnitStats::rogue(), TilePos::new(4, 4))
            .unwrap();
        bf.remove_unit(id).unwrap();
        assert!(bf.unit(id).is_none());
        assert!(bf.grid().tile_at(4, 4).unwrap().occupant().is_none());
        assert!(bf.is_defeated(Side::Player));
    }

    #[test]
    fn test_side_turn_tracking() {
        let mut bf = field();
        let a = bf
            .deploy(Side::Ai, UnitClass::Knight, UnitStats::knight(), TilePos::new(0, 0))
            .unwrap();
        assert!(!bf.side_turn_over(Side::Ai));
        bf.finish_turn(a).unwrap();
        assert!(bf.side_turn_over(Side::Ai));
        bf.reset_side(Side::Ai);
        assert!(!bf.side_turn_over(Side::Ai));
    }
}
