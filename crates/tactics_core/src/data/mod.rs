//! Data structures for terrain configuration.
//!
//! This module contains pure data structures describing terrain costs and
//! class modifiers. Everything here can be deserialized from RON text.
//!
//! **Note:** This module contains no IO - it only defines data types.
//! File loading is handled by `tactics_headless`.

mod terrain_data;

pub use terrain_data::{
    DataError, DefenseModifier, MovementModifier, ProfileEntry, TerrainTable, TerrainTableData,
};
