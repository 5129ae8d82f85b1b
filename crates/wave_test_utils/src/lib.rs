//! # Wave Test Utilities
//!
//! Shared testing utilities for all crates:
//! - Configuration fixtures and a scene that records every call
//! - Determinism test harness
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod determinism;
pub mod fixtures;

/// Re-export proptest for convenience.
pub use proptest;
