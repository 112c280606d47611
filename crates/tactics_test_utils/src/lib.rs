//! # Tactics Test Utilities
//!
//! Shared testing utilities for all crates:
//! - Battlefield fixtures and reference scenarios
//! - Determinism test harness
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod determinism;
pub mod fixtures;

/// Re-export proptest for convenience.
pub use proptest;
