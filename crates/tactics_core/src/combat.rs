//! Strike resolution.
//!
//! The core decides who strikes whom; a [`CombatResolver`] decides how
//! much damage that does. Health, death and occupancy cleanup are always
//! applied here so the battlefield stays consistent whatever resolver is
//! plugged in.

use serde::{Deserialize, Serialize};

use crate::battlefield::{BattleError, Battlefield};
use crate::unit::{Unit, UnitId};

/// Computes damage for one strike.
pub trait CombatResolver {
    /// Damage `attacker` deals to `defender`.
    fn damage(&mut self, attacker: &Unit, defender: &Unit) -> u32;
}

/// Flat subtraction: `max(0, attack - defense)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardCombat;

impl CombatResolver for StandardCombat {
    fn damage(&mut self, attacker: &Unit, defender: &Unit) -> u32 {
        attacker.stats.attack.saturating_sub(defender.stats.defense)
    }
}

/// Result of a resolved strike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatOutcome {
    /// Striking unit.
    pub attacker: UnitId,
    /// Struck unit.
    pub defender: UnitId,
    /// Damage dealt.
    pub damage: u32,
    /// Defender health after the strike.
    pub defender_health: u32,
    /// Whether the defender died and was removed.
    pub defender_died: bool,
}

/// Resolve a strike and apply its result.
///
/// A defender brought to zero health is removed from its tile and from
/// the roster.
pub fn resolve_strike<R: CombatResolver + ?Sized>(
    battlefield: &mut Battlefield,
    attacker: UnitId,
    defender: UnitId,
    resolver: &mut R,
) -> Result<CombatOutcome, BattleError> {
    let striker = battlefield
        .unit(attacker)
        .ok_or(BattleError::UnknownUnit(attacker))?;
    let target = battlefield
        .unit(defender)
        .ok_or(BattleError::UnknownUnit(defender))?;
    let damage = resolver.damage(striker, target);

    let target = battlefield.unit_mut(defender)?;
    let died = target.take_damage(damage);
    let defender_health = target.stats.health;

    tracing::debug!(
        attacker = %attacker,
        defender = %defender,
        damage,
        defender_health,
        died,
        "Strike resolved"
    );

    if died {
        battlefield.remove_unit(defender)?;
    }

    Ok(CombatOutcome {
        attacker,
        defender,
        damage,
        defender_health,
        defender_died: died,
    })
}
