//! Test fixtures and helpers.
//!
//! Pre-built configurations and a scene double for consistent testing.

use fixed::types::I32F32;
use tracing::trace;
use wave_core::combat::AttackProfile;
use wave_core::components::{EntityId, HostileKind};
use wave_core::config::{AttackSpec, HostileTemplate, SimConfig, SpawnLocation, TierSpec};
use wave_core::math::Vec2Fixed;
use wave_core::scene::{Cue, Instantiation, Movement, Presentation};

/// The sample configuration shipped in `assets/data/waves.ron`.
pub const SAMPLE_CONFIG_RON: &str = include_str!("../../../assets/data/waves.ron");

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
#[must_use]
pub fn fixed_f(n: f64) -> I32F32 {
    I32F32::from_num(n)
}

/// Parse [`SAMPLE_CONFIG_RON`].
///
/// # Panics
///
/// Panics if the shipped sample does not parse.
#[must_use]
pub fn sample_config() -> SimConfig {
    SimConfig::parse(SAMPLE_CONFIG_RON, "assets/data/waves.ron").expect("sample config parses")
}

/// A template for `kind` with one prefab named after the kind.
#[must_use]
pub fn template(kind: HostileKind, max_health: u32, damage: u32, cooldown_ticks: u64) -> HostileTemplate {
    HostileTemplate {
        kind,
        prefabs: vec![format!("{kind:?}").to_lowercase()],
        max_health,
        attack: AttackSpec {
            damage,
            range: I32F32::ZERO,
            cooldown_ticks,
        },
    }
}

/// Tiers `{5, +2, 3 waves}` then infinite `{20, +1}`; waves 1, 3, 4 and 10
/// hold 7, 11, 21 and 27 hostiles.
#[must_use]
pub fn scenario_tiers() -> Vec<TierSpec> {
    vec![TierSpec::finite(5, 2, 3), TierSpec::infinite(20, 1)]
}

/// A small, fast config: scenario tiers, one spawn location at (10, 0),
/// 10-health hostiles, a short despawn delay.
#[must_use]
pub fn scenario_config(seed: u64) -> SimConfig {
    let mut config = SimConfig::with_tiers(scenario_tiers());
    config.seed = seed;
    config.despawn_delay_ticks = 5;
    config.spawn_locations = vec![SpawnLocation::at(Vec2Fixed::from_ints(10, 0))];
    config.hostiles = vec![
        template(HostileKind::Melee, 10, 3, 10),
        template(HostileKind::Ranged, 10, 2, 15),
    ];
    config
}

/// A tower that one-shots scenario hostiles within 30 units.
#[must_use]
pub fn killer_tower() -> AttackProfile {
    AttackProfile::within_range(10, fixed(30), 1)
}

/// One call made on a [`RecordingScene`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneCall {
    /// `create_instance`.
    Create {
        /// Entity.
        entity: EntityId,
        /// Kind.
        kind: HostileKind,
        /// Prefab chosen.
        prefab: String,
    },
    /// `reactivate_instance`.
    Reactivate {
        /// Entity.
        entity: EntityId,
    },
    /// `deactivate_instance`.
    Deactivate {
        /// Entity.
        entity: EntityId,
    },
    /// `set_destination`.
    Destination {
        /// Entity.
        entity: EntityId,
        /// Where to.
        position: Vec2Fixed,
    },
    /// `halt_and_hold`.
    Halt {
        /// Entity.
        entity: EntityId,
    },
    /// `play_cue`.
    Cue {
        /// Entity.
        entity: EntityId,
        /// Cue.
        cue: Cue,
    },
}

/// Scene double that records every call.
///
/// Arrival is a flag: with `arrived` set every entity is always at its
/// destination, without it nobody ever arrives.
#[derive(Debug, Clone, Default)]
pub struct RecordingScene {
    /// Calls in order.
    pub calls: Vec<SceneCall>,
    /// What `has_arrived` reports.
    pub arrived: bool,
}

impl RecordingScene {
    /// Scene where everyone is always in position.
    #[must_use]
    pub fn arriving() -> Self {
        Self {
            calls: Vec::new(),
            arrived: true,
        }
    }

    /// Scene where nobody ever reaches their destination.
    #[must_use]
    pub fn stalled() -> Self {
        Self::default()
    }

    /// Number of `cue` calls on any entity.
    #[must_use]
    pub fn cue_count(&self, cue: Cue) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, SceneCall::Cue { cue: c, .. } if *c == cue))
            .count()
    }

    /// Number of instances created.
    #[must_use]
    pub fn created(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, SceneCall::Create { .. }))
            .count()
    }

    /// Number of pooled instances put back into play.
    #[must_use]
    pub fn reactivated(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, SceneCall::Reactivate { .. }))
            .count()
    }

    fn record(&mut self, call: SceneCall) {
        trace!(?call, "scene call");
        self.calls.push(call);
    }
}

impl Movement for RecordingScene {
    fn set_destination(&mut self, entity: EntityId, position: Vec2Fixed) {
        self.record(SceneCall::Destination { entity, position });
    }

    fn has_arrived(&self, _entity: EntityId) -> bool {
        self.arrived
    }

    fn halt_and_hold(&mut self, entity: EntityId) {
        self.record(SceneCall::Halt { entity });
    }
}

impl Presentation for RecordingScene {
    fn play_cue(&mut self, entity: EntityId, cue: Cue) {
        self.record(SceneCall::Cue { entity, cue });
    }
}

impl Instantiation for RecordingScene {
    fn create_instance(&mut self, entity: EntityId, kind: HostileKind, prefab: &str, _position: Vec2Fixed) {
        self.record(SceneCall::Create {
            entity,
            kind,
            prefab: prefab.to_string(),
        });
    }

    fn reactivate_instance(&mut self, entity: EntityId, _position: Vec2Fixed) {
        self.record(SceneCall::Reactivate { entity });
    }

    fn deactivate_instance(&mut self, entity: EntityId) {
        self.record(SceneCall::Deactivate { entity });
    }
}
