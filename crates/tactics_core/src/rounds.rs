//! Alternating side turns.

use serde::{Deserialize, Serialize};

use crate::battlefield::Battlefield;
use crate::unit::Side;

/// Which side is active and which round is being played.
///
/// The player opens every round; the round counter advances each time
/// the player becomes active again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundTracker {
    active: Side,
    round: u32,
}

impl Default for RoundTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl RoundTracker {
    /// Round 1, player to act.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            active: Side::Player,
            round: 1,
        }
    }

    /// Side currently acting.
    #[must_use]
    pub const fn active(&self) -> Side {
        self.active
    }

    /// Current round, starting at 1.
    #[must_use]
    pub const fn round(&self) -> u32 {
        self.round
    }

    /// Hand the turn to the other side and reset that side's units.
    ///
    /// Returns the newly active side.
    pub fn end_side_turn(&mut self, battlefield: &mut Battlefield) -> Side {
        self.active = self.active.opponent();
        if self.active == Side::Player {
            self.round += 1;
        }
        battlefield.reset_side(self.active);
        tracing::debug!(active = ?self.active, round = self.round, "Side turn started");
        self.active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Grid, TilePos};
    use crate::unit::{UnitClass, UnitStats, UnitTurnState};

    #[test]
    fn test_rounds_advance_when_player_returns() {
        let mut bf = Battlefield::new(Grid::new(2, 2));
        let mut rounds = RoundTracker::new();
        assert_eq!((rounds.active(), rounds.round()), (Side::Player, 1));

        assert_eq!(rounds.end_side_turn(&mut bf), Side::Ai);
        assert_eq!(rounds.round(), 1);

        assert_eq!(rounds.end_side_turn(&mut bf), Side::Player);
        assert_eq!(rounds.round(), 2);
    }

    #[test]
    fn test_newly_active_side_is_reset() {
        let mut bf = Battlefield::new(Grid::new(2, 2));
        let ai = bf
            .deploy(Side::Ai, UnitClass::Rogue, UnitStats::rogue(), TilePos::new(0, 0))
            .unwrap();
        let player = bf
            .deploy(Side::Player, UnitClass::Knight, UnitStats::knight(), TilePos::new(1, 1))
            .unwrap();
        bf.finish_turn(ai).unwrap();
        bf.finish_turn(player).unwrap();

        let mut rounds = RoundTracker::new();
        rounds.end_side_turn(&mut bf);

        assert_eq!(bf.unit(ai).unwrap().turn_state(), UnitTurnState::Fresh);
        assert_eq!(bf.unit(player).unwrap().turn_state(), UnitTurnState::Done);
    }
}
