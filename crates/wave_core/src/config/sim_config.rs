//! Root simulation configuration.

use serde::{Deserialize, Serialize};

use super::tiers::{tier_issues, TierSpec};
use crate::combat::{AttackProfile, TargetingMode};
use crate::components::HostileKind;
use crate::defenders::DefenderKind;
use crate::error::{GameError, Result};
use crate::math::{fixed_decimal_serde, Fixed, Vec2Fixed};

/// A point hostiles spawn around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnLocation {
    /// Centre of the cluster.
    pub position: Vec2Fixed,

    /// Radius of the disk spawns are scattered in.
    #[serde(with = "fixed_decimal_serde", default = "default_cluster_radius")]
    pub cluster_radius: Fixed,
}

fn default_cluster_radius() -> Fixed {
    Fixed::from_num(2)
}

impl SpawnLocation {
    /// Spawn location with the default cluster radius.
    #[must_use]
    pub fn at(position: Vec2Fixed) -> Self {
        Self {
            position,
            cluster_radius: default_cluster_radius(),
        }
    }
}

/// Authored attack stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackSpec {
    /// Damage per strike.
    pub damage: u32,

    /// Attack range. Hostiles walk to their target and ignore this.
    #[serde(with = "fixed_decimal_serde", default = "default_range")]
    pub range: Fixed,

    /// Minimum ticks between strikes.
    pub cooldown_ticks: u64,
}

fn default_range() -> Fixed {
    Fixed::ZERO
}

impl AttackSpec {
    /// Runtime profile for the given targeting mode.
    #[must_use]
    pub const fn profile(&self, mode: TargetingMode) -> AttackProfile {
        AttackProfile {
            damage: self.damage,
            range: self.range,
            cooldown_ticks: self.cooldown_ticks,
            mode,
        }
    }
}

/// Template a hostile kind is built and reset from.
///
/// # Example RON
///
/// ```ron
/// HostileTemplate(
///     kind: Melee,
///     prefabs: ["grunt_a", "grunt_b"],
///     max_health: 40,
///     attack: AttackSpec(damage: 5, cooldown_ticks: 20),
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostileTemplate {
    /// Kind this template applies to.
    pub kind: HostileKind,

    /// Visual prefab ids; one is picked at random for each fresh instance.
    pub prefabs: Vec<String>,

    /// Health on spawn and on every reuse.
    pub max_health: u32,

    /// Attack stats.
    pub attack: AttackSpec,
}

impl HostileTemplate {
    /// Hostiles always walk to their target.
    #[must_use]
    pub const fn profile(&self) -> AttackProfile {
        self.attack.profile(TargetingMode::Approach)
    }
}

/// A tower or the player placed at start-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefenderSpec {
    /// Tower or player.
    pub kind: DefenderKind,

    /// Where it stands.
    pub position: Vec2Fixed,

    /// Tower health. Ignored for the player.
    #[serde(default)]
    pub max_health: u32,

    /// Attack stats.
    pub attack: AttackSpec,
}

/// Complete simulation configuration.
///
/// # Example RON
///
/// ```ron
/// SimConfig(
///     tick_rate: 20,
///     seed: 42,
///     tiers: [
///         (start_count: 5, added_per_wave: 2, waves_affected: 3),
///         (start_count: 20, added_per_wave: 1, is_infinite: true),
///     ],
///     spawn_locations: [(position: (x: 30.0, y: 0.0), cluster_radius: 2.5)],
///     hostiles: [...],
///     defenders: [...],
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Simulation ticks per second.
    #[serde(default = "default_tick_rate")]
    pub tick_rate: u32,

    /// Seconds between a wave completing and the next one starting.
    #[serde(default = "default_countdown_seconds")]
    pub countdown_seconds: u32,

    /// Ticks a dead hostile stays in the world before returning to the pool.
    #[serde(default = "default_despawn_delay_ticks")]
    pub despawn_delay_ticks: u64,

    /// Seed for cluster offsets and prefab choice.
    #[serde(default)]
    pub seed: u64,

    /// Wave tier table.
    pub tiers: Vec<TierSpec>,

    /// Spawn points, filled left to right.
    #[serde(default)]
    pub spawn_locations: Vec<SpawnLocation>,

    /// One template per hostile kind.
    #[serde(default)]
    pub hostiles: Vec<HostileTemplate>,

    /// Defenders placed when the simulation is built.
    #[serde(default)]
    pub defenders: Vec<DefenderSpec>,
}

const fn default_tick_rate() -> u32 {
    20
}

const fn default_countdown_seconds() -> u32 {
    5
}

const fn default_despawn_delay_ticks() -> u64 {
    60
}

impl SimConfig {
    /// Configuration with default timings and nothing else.
    #[must_use]
    pub fn with_tiers(tiers: Vec<TierSpec>) -> Self {
        Self {
            tick_rate: default_tick_rate(),
            countdown_seconds: default_countdown_seconds(),
            despawn_delay_ticks: default_despawn_delay_ticks(),
            seed: 0,
            tiers,
            spawn_locations: Vec::new(),
            hostiles: Vec::new(),
            defenders: Vec::new(),
        }
    }

    /// Parse RON text.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::ConfigParse`] if the text is not a valid config.
    pub fn from_ron_str(text: &str) -> Result<Self> {
        Self::parse(text, "<string>")
    }

    /// Parse RON text, naming `origin` (usually a path) in errors.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::ConfigParse`] if the text is not a valid config.
    pub fn parse(text: &str, origin: &str) -> Result<Self> {
        ron::from_str(text).map_err(|source| GameError::ConfigParse {
            origin: origin.to_string(),
            source,
        })
    }

    /// Serialize back to pretty RON.
    #[must_use]
    pub fn to_ron_string(&self) -> Option<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default()).ok()
    }

    /// Template for `kind`, if configured.
    #[must_use]
    pub fn template_for(&self, kind: HostileKind) -> Option<&HostileTemplate> {
        self.hostiles.iter().find(|t| t.kind == kind)
    }

    /// Problems that make the config unusable.
    ///
    /// [`crate::simulation::Simulation::new`] refuses configs with any of
    /// these.
    #[must_use]
    pub fn fatal_issues(&self) -> Vec<String> {
        let mut issues = tier_issues(&self.tiers);
        if self.tick_rate == 0 {
            issues.push("tick_rate must be positive".to_string());
        }
        issues
    }

    /// Validate internal consistency.
    ///
    /// Checks for:
    /// - Tier table invariants and a positive tick rate (fatal)
    /// - At least one spawn location
    /// - Exactly one template per hostile kind, each with prefabs and health
    /// - Towers with health, at most one player
    ///
    /// Returns every issue found; empty means the config is clean.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut issues = self.fatal_issues();

        if self.spawn_locations.is_empty() {
            issues.push("no spawn locations configured".to_string());
        }
        for (index, location) in self.spawn_locations.iter().enumerate() {
            if location.cluster_radius < Fixed::ZERO {
                issues.push(format!("spawn location {index} has a negative cluster radius"));
            }
        }

        for kind in HostileKind::ALL {
            match self.hostiles.iter().filter(|t| t.kind == kind).count() {
                0 => issues.push(format!("no hostile template for {kind:?}")),
                1 => {}
                n => issues.push(format!("{n} hostile templates for {kind:?}, expected one")),
            }
        }
        for template in &self.hostiles {
            if template.prefabs.is_empty() {
                issues.push(format!("hostile template {:?} has no prefabs", template.kind));
            }
            if template.max_health == 0 {
                issues.push(format!("hostile template {:?} has zero max_health", template.kind));
            }
        }

        let mut players = 0;
        for (index, defender) in self.defenders.iter().enumerate() {
            match defender.kind {
                DefenderKind::Tower if defender.max_health == 0 => {
                    issues.push(format!("tower {index} has zero max_health"));
                }
                DefenderKind::Tower => {}
                DefenderKind::Player => players += 1,
            }
        }
        if players > 1 {
            issues.push(format!("{players} players configured, expected at most one"));
        }

        issues
    }
}
