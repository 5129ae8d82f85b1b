//! Shared component types.
//!
//! Components are plain data. Behaviour lives in the owning modules
//! ([`crate::pool`], [`crate::defenders`], [`crate::combat`]).

use serde::{Deserialize, Serialize};

/// Unique identifier for entities.
///
/// Issued by [`crate::registry::EntityRegistry`]. Pooled hostiles keep
/// their id across lives, so a cached id must be dropped when its hostile
/// is released (see [`crate::defenders::DefenderSet::forget_target`]).
pub type EntityId = u64;

/// Hostile archetype. Each kind has its own recycle pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HostileKind {
    /// Closes to contact range before attacking.
    Melee,
    /// Stops at a distance before attacking.
    Ranged,
}

impl HostileKind {
    /// All kinds in spawn order (melee groups are spawned before ranged).
    pub const ALL: [HostileKind; 2] = [HostileKind::Melee, HostileKind::Ranged];

    /// Stable index, used for per-kind arrays.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            HostileKind::Melee => 0,
            HostileKind::Ranged => 1,
        }
    }
}

/// Role tag used by the registry in place of scene tag lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    /// Entities that hunt defended structures.
    Hostile,
    /// Towers and the player.
    Defender,
}

impl Role {
    /// The role this role hunts.
    #[must_use]
    pub const fn opposing(self) -> Self {
        match self {
            Role::Hostile => Role::Defender,
            Role::Defender => Role::Hostile,
        }
    }
}

/// Health component for damageable entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Health {
    /// Current health points.
    pub current: u32,
    /// Maximum health points.
    pub max: u32,
}

impl Health {
    /// Create new health component at full health.
    #[must_use]
    pub const fn new(max: u32) -> Self {
        Self { current: max, max }
    }

    /// Check if health is depleted.
    #[must_use]
    pub const fn is_depleted(&self) -> bool {
        self.current == 0
    }

    /// Check if entity is at full health.
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.current >= self.max
    }

    /// Apply damage, returning actual damage dealt.
    /// Uses saturating subtraction to prevent underflow.
    pub fn apply_damage(&mut self, amount: u32) -> u32 {
        let actual = amount.min(self.current);
        self.current -= actual;
        actual
    }

    /// Heal, returning actual amount healed. Never exceeds `max`.
    pub fn heal(&mut self, amount: u32) -> u32 {
        let headroom = self.max.saturating_sub(self.current);
        let actual = amount.min(headroom);
        self.current += actual;
        actual
    }

    /// Restore to full health.
    pub fn refill(&mut self) {
        self.current = self.max;
    }

    /// Get health as a percentage (0-100), for health bars.
    #[must_use]
    pub fn percentage(&self) -> u32 {
        if self.max == 0 {
            0
        } else {
            let pct = u64::from(self.current) * 100 / u64::from(self.max);
            u32::try_from(pct).unwrap_or(100)
        }
    }
}
