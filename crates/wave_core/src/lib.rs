//! # Wave Core
//!
//! Deterministic simulation core for a wave-based defense game.
//!
//! This crate contains **only** simulation logic:
//! - No rendering
//! - No file IO (configuration arrives as a string or parsed struct)
//! - No ambient randomness (a seeded `ChaCha8Rng` owned by the simulation)
//! - Fixed-point math for positions and distances
//!
//! Movement execution, animation and instantiation of visuals are
//! external collaborators reached through the traits in [`scene`].
//!
//! ## Crate Structure
//!
//! - [`scheduler`] - Wave progression, countdown, pause and forced advance
//! - [`allocation`] - Splitting a wave across spawn locations and kinds
//! - [`pool`] - Recycling store for hostile records
//! - [`combat`] - Generic targeting and attack state machine
//! - [`defenders`] - Towers and the player
//! - [`registry`] - Entity ids and the per-role live index
//! - [`scene`] - Traits the host implements (movement, cues, instances)
//! - [`events`] - Notification bus for presentation layers
//! - [`simulation`] - The context object that owns everything and ticks it
//! - [`config`] - Wave tiers, spawn locations, templates (RON)
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod allocation;
pub mod combat;
pub mod components;
pub mod config;
pub mod defenders;
pub mod error;
pub mod events;
pub mod math;
pub mod pool;
pub mod registry;
pub mod scene;
pub mod scheduler;
pub mod simulation;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::allocation::{allocate, LocationAllocation};
    pub use crate::combat::{AttackProfile, CombatState, DamageOutcome, Damageable, TargetingMode};
    pub use crate::components::{EntityId, Health, HostileKind, Role};
    pub use crate::config::{
        AttackSpec, DefenderSpec, HostileTemplate, SimConfig, SpawnLocation, TierSpec,
        WaveComposition, WaveTable,
    };
    pub use crate::defenders::{DefendedEntity, DefenderKind};
    pub use crate::error::{GameError, Result};
    pub use crate::events::{EventBus, WaveEvent};
    pub use crate::math::{Fixed, Percent, Vec2Fixed};
    pub use crate::pool::{EntityPool, HostileEntity};
    pub use crate::scene::{Cue, Instantiation, Movement, NullScene, Presentation, Scene};
    pub use crate::scheduler::{SchedulerPhase, WaveRunState, WaveScheduler};
    pub use crate::simulation::{Simulation, StrikeEvent, TickEvents};
}
