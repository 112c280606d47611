//! Fixed-point math utilities for deterministic evaluation.
//!
//! Movement costs, defense bonuses and AI scores all use fixed-point
//! arithmetic so that the same battlefield always produces the same
//! paths and the same chosen moves, on every platform.

use fixed::types::I32F32;

/// Fixed-point number type for all cost and score math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
/// Range: approximately -2,147,483,648 to 2,147,483,647
/// Precision: approximately 0.00000000023
pub type Fixed = I32F32;

/// Serde support for fixed-point numbers written as decimal strings.
///
/// Data files stay human-editable (`base_cost: "1.5"`) while parsing goes
/// through the exact decimal parser of [`Fixed`], never through floats.
pub mod decimal_serde {
    use super::Fixed;
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    /// Serialize a fixed-point number as its decimal string.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(value)
    }

    /// Deserialize a fixed-point number from a decimal string.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        text.trim()
            .parse::<Fixed>()
            .map_err(|e| D::Error::custom(format!("invalid fixed-point value '{text}': {e}")))
    }
}

/// Build a fixed-point value from a ratio of integers.
///
/// Used for constants such as `3 / 2` that have no integer form.
#[must_use]
pub fn ratio(numerator: i32, denominator: i32) -> Fixed {
    Fixed::from_num(numerator) / Fixed::from_num(denominator)
}
