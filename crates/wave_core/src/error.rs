//! Error types for the wave simulation.

use thiserror::Error;

use crate::components::{EntityId, HostileKind};

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all wave simulation errors.
#[derive(Debug, Error)]
pub enum GameError {
    /// The wave tier table violates one of its structural invariants.
    #[error("Invalid wave tiers: {0}")]
    InvalidTiers(String),

    /// A percentage outside 0..=100 was supplied.
    #[error("Percentage out of range: {0} (expected 0-100)")]
    InvalidPercent(u32),

    /// Spawning was requested with no spawn locations configured.
    #[error("No spawn locations configured")]
    NoSpawnLocations,

    /// No hostile template is configured for a kind.
    #[error("No hostile template configured for {0:?}")]
    MissingTemplate(HostileKind),

    /// A hostile template lists no prefabs to instantiate.
    #[error("Hostile template for {0:?} has no prefabs")]
    NoPrefab(HostileKind),

    /// Invalid entity reference.
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    /// Configuration text parsing error.
    #[error("Failed to parse config '{origin}': {source}")]
    ConfigParse {
        /// Where the RON text came from (a path or `<string>`).
        origin: String,
        /// Underlying parse error.
        #[source]
        source: ron::error::SpannedError,
    },

    /// Configuration validation failed.
    #[error("Config validation failed: {0:?}")]
    InvalidConfig(Vec<String>),
}
