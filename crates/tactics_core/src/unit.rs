//! Units, their classes, stats and per-turn lifecycle.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::grid::TilePos;

/// Stable identifier of a deployed unit.
///
/// Assigned by the [`Battlefield`](crate::battlefield::Battlefield) in
/// deployment order, so sorting by id gives the fixed enumeration order
/// used by turn processing.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct UnitId(u32);

impl UnitId {
    /// Create a unit id.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw numeric value.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which side controls a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// Human-controlled side.
    Player,
    /// Computer-controlled side.
    Ai,
}

impl Side {
    /// The side this one fights against.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::Player => Self::Ai,
            Self::Ai => Self::Player,
        }
    }
}

/// Unit class. Drives terrain modifiers and the action a unit performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UnitClass {
    /// Ranged caster that reshapes terrain.
    Mage,
    /// Heavy melee fighter.
    Knight,
    /// Light skirmisher, at home in forests.
    Rogue,
    /// Swift duelist, fastest on open plains.
    Blademaster,
}

impl UnitClass {
    /// Every class, in declaration order.
    pub const ALL: [Self; 4] = [Self::Mage, Self::Knight, Self::Rogue, Self::Blademaster];

    /// Dense index for table lookups.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Mage => 0,
            Self::Knight => 1,
            Self::Rogue => 2,
            Self::Blademaster => 3,
        }
    }

    /// Default stats for a freshly deployed unit of this class.
    #[must_use]
    pub const fn base_stats(self) -> UnitStats {
        match self {
            Self::Mage => UnitStats::mage(),
            Self::Knight => UnitStats::knight(),
            Self::Rogue => UnitStats::rogue(),
            Self::Blademaster => UnitStats::blademaster(),
        }
    }
}

/// Combat and movement statistics of one unit.
///
/// Only `health` changes during play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitStats {
    /// Current health. The unit dies at zero.
    pub health: u32,
    /// Health at deployment.
    pub max_health: u32,
    /// Damage dealt before the defender's defense is subtracted.
    pub attack: u32,
    /// Flat damage reduction.
    pub defense: u32,
    /// Chance-to-dodge rating. Unused by the deterministic core.
    pub evasion: u32,
    /// Magic resistance rating. Unused by the deterministic core.
    pub resistance: u32,
    /// Action range in grid steps.
    pub range: u32,
    /// Movement budget in cost units.
    pub movement: u32,
}

impl UnitStats {
    /// Largest value any stat may hold.
    ///
    /// Scores and range budgets are computed in [`Fixed`](crate::math::Fixed),
    /// whose integer part is 32-bit signed; this keeps every stat and its
    /// weighted products well inside that domain.
    pub const MAX_VALUE: u32 = 1_000_000;

    /// First stat above [`Self::MAX_VALUE`], as `(field, value)`.
    #[must_use]
    pub fn out_of_range(&self) -> Option<(&'static str, u32)> {
        [
            ("health", self.health),
            ("max_health", self.max_health),
            ("attack", self.attack),
            ("defense", self.defense),
            ("evasion", self.evasion),
            ("resistance", self.resistance),
            ("range", self.range),
            ("movement", self.movement),
        ]
        .into_iter()
        .find(|&(_, value)| value > Self::MAX_VALUE)
    }

    /// Knight preset.
    #[must_use]
    pub const fn knight() -> Self {
        Self {
            health: 30,
            max_health: 30,
            attack: 4,
            defense: 6,
            evasion: 1,
            resistance: 0,
            range: 2,
            movement: 10,
        }
    }

    /// Mage preset.
    #[must_use]
    pub const fn mage() -> Self {
        Self {
            health: 20,
            max_health: 20,
            attack: 2,
            defense: 2,
            evasion: 3,
            resistance: 5,
            range: 4,
            movement: 10,
        }
    }

    /// Rogue preset.
    #[must_use]
    pub const fn rogue() -> Self {
        Self {
            health: 22,
            max_health: 22,
            attack: 5,
            defense: 3,
            evasion: 5,
            resistance: 1,
            range: 1,
            movement: 10,
        }
    }

    /// Blademaster preset.
    #[must_use]
    pub const fn blademaster() -> Self {
        Self {
            health: 26,
            max_health: 26,
            attack: 6,
            defense: 4,
            evasion: 3,
            resistance: 1,
            range: 1,
            movement: 10,
        }
    }
}

/// Per-turn lifecycle of a unit.
///
/// A unit may move once and act once per turn, in either order. It is
/// done once both happened or it explicitly ends its turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitTurnState {
    /// Neither moved nor acted.
    #[default]
    Fresh,
    /// Moved, may still act.
    Moved,
    /// Acted, may still move.
    Acted,
    /// Nothing left to do this turn.
    Done,
}

impl UnitTurnState {
    /// State after a completed move.
    #[must_use]
    pub const fn after_move(self) -> Self {
        match self {
            Self::Fresh | Self::Moved => Self::Moved,
            Self::Acted | Self::Done => Self::Done,
        }
    }

    /// State after a completed action.
    #[must_use]
    pub const fn after_action(self) -> Self {
        match self {
            Self::Fresh | Self::Acted => Self::Acted,
            Self::Moved | Self::Done => Self::Done,
        }
    }

    /// State after the unit gives up the rest of its turn.
    #[must_use]
    pub const fn finish(self) -> Self {
        Self::Done
    }

    /// Whether a move is still allowed.
    #[must_use]
    pub const fn can_move(self) -> bool {
        matches!(self, Self::Fresh | Self::Acted)
    }

    /// Whether an action is still allowed.
    #[must_use]
    pub const fn can_act(self) -> bool {
        matches!(self, Self::Fresh | Self::Moved)
    }

    /// Whether the unit is finished for this turn.
    #[must_use]
    pub const fn is_done(self) -> bool {
        matches!(self, Self::Done)
    }
}

/// A deployed unit.
///
/// The unit's tile is kept in sync with that tile's occupant by the
/// battlefield; nothing outside it can move a unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unit {
    id: UnitId,
    side: Side,
    class: UnitClass,
    /// Current statistics.
    pub stats: UnitStats,
    pos: TilePos,
    turn: UnitTurnState,
}

impl Unit {
    pub(crate) fn new(id: UnitId, side: Side, class: UnitClass, stats: UnitStats, pos: TilePos) -> Self {
        Self {
            id,
            side,
            class,
            stats,
            pos,
            turn: UnitTurnState::Fresh,
        }
    }

    /// Unit id.
    #[must_use]
    pub const fn id(&self) -> UnitId {
        self.id
    }

    /// Controlling side.
    #[must_use]
    pub const fn side(&self) -> Side {
        self.side
    }

    /// Unit class.
    #[must_use]
    pub const fn class(&self) -> UnitClass {
        self.class
    }

    /// Tile the unit stands on.
    #[must_use]
    pub const fn pos(&self) -> TilePos {
        self.pos
    }

    /// Turn lifecycle state.
    #[must_use]
    pub const fn turn_state(&self) -> UnitTurnState {
        self.turn
    }

    /// Whether the unit has nothing left to do this turn.
    #[must_use]
    pub const fn is_turn_over(&self) -> bool {
        self.turn.is_done()
    }

    /// Whether the unit is still alive.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.stats.health > 0
    }

    /// Whether `other` fights for the opposing side.
    #[must_use]
    pub fn is_hostile_to(&self, other: &Unit) -> bool {
        self.side != other.side
    }

    pub(crate) fn set_pos(&mut self, pos: TilePos) {
        self.pos = pos;
    }

    pub(crate) fn mark_moved(&mut self) {
        self.turn = self.turn.after_move();
    }

    pub(crate) fn mark_acted(&mut self) {
        self.turn = self.turn.after_action();
    }

    pub(crate) fn finish_turn(&mut self) {
        self.turn = self.turn.finish();
    }

    pub(crate) fn reset_turn(&mut self) {
        self.turn = UnitTurnState::Fresh;
    }

    /// Apply damage, flooring health at zero. Returns `true` if the unit died.
    pub(crate) fn take_damage(&mut self, amount: u32) -> bool {
        self.stats.health = self.stats.health.saturating_sub(amount);
        !self.is_alive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_state_requires_both_move_and_action() {
        let state = UnitTurnState::Fresh.after_move();
        assert_eq!(state, UnitTurnState::Moved);
        assert!(!state.is_done());
        assert!(state.can_act());
        assert!(!state.can_move());
        assert!(state.after_action().is_done());

        let state = UnitTurnState::Fresh.after_action();
        assert_eq!(state, UnitTurnState::Acted);
        assert!(state.after_move().is_done());
    }

    #[test]
    fn test_done_is_terminal() {
        assert_eq!(UnitTurnState::Done.after_move(), UnitTurnState::Done);
        assert_eq!(UnitTurnState::Done.after_action(), UnitTurnState::Done);
        assert!(!UnitTurnState::Done.can_move());
        assert!(!UnitTurnState::Done.can_act());
    }

    #[test]
    fn test_side_opponent() {
        assert_eq!(Side::Player.opponent(), Side::Ai);
        assert_eq!(Side::Ai.opponent(), Side::Player);
    }

    #[test]
    fn test_take_damage_floors_at_zero() {
        let mut unit = Unit::new(
            UnitId::new(1),
            Side::Ai,
            UnitClass::Knight,
            UnitStats::knight(),
            TilePos::new(0, 0),
        );
        assert!(!unit.take_damage(10));
        assert_eq!(unit.stats.health, 20);
        assert!(unit.take_damage(50));
        assert_eq!(unit.stats.health, 0);
        assert!(!unit.is_alive());
    }

    #[test]
    fn test_class_indices_are_dense() {
        for (i, class) in UnitClass::ALL.iter().enumerate() {
            assert_eq!(class.index(), i);
        }
    }
}
