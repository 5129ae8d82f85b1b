//! Configuration data for the wave simulation.
//!
//! Pure data structures deserialized from RON, plus the derived
//! [`WaveTable`] that answers "how many hostiles in wave N".
//!
//! **Note:** This module contains no file IO. Text is handed in by the
//! caller (`wave_tools` reads it from disk).

mod sim_config;
mod tiers;

pub use sim_config::{AttackSpec, DefenderSpec, HostileTemplate, SimConfig, SpawnLocation};
pub use tiers::{tier_issues, TierSpec, WaveComposition, WaveTable, WaveTier, FIRST_WAVE};
