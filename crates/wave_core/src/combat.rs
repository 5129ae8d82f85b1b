//! Generic targeting and attack state machine.
//!
//! The same [`Targeting`] machine drives hostiles hunting defenders and
//! defenders hunting hostiles. What differs between the two is captured by
//! the [`AttackProfile`] (damage, range, cooldown, [`TargetingMode`]) and by
//! the [`TargetView`] the caller hands in, which resolves cached ids and
//! lists live candidates of the opposing role.
//!
//! # State machine
//!
//! ```text
//! Idle ──(candidate found)──► Seeking ──(arrived)──► Engaging
//!  ▲                             │                      │
//!  └──────(target lost)──────────┴──────────────────────┘
//!
//! any ──(owner killed)──► Dead      (left only through `reset`)
//! ```
//!
//! `WithinRange` targeting skips `Seeking`: a candidate is only selected
//! when it is already inside the attack range.
//!
//! Every call to [`Targeting::step`] re-validates the cached target before
//! looking at the cooldown, so a target that died, was deactivated or
//! walked out of range is dropped before any attack is considered.

use serde::{Deserialize, Serialize};

use crate::components::EntityId;
use crate::math::{Fixed, Vec2Fixed};

/// How a combatant decides that a target is attackable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetingMode {
    /// Only candidates within `range` are selected; leaving range drops the
    /// target. Used by towers and the player.
    WithinRange,
    /// The nearest candidate is selected regardless of distance and the
    /// owner walks to it; attacks start once movement reports arrival.
    Approach,
}

/// Attack parameters for one combatant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttackProfile {
    /// Damage per strike.
    pub damage: u32,
    /// Attack range (only consulted in [`TargetingMode::WithinRange`]).
    #[serde(with = "crate::math::fixed_decimal_serde")]
    pub range: Fixed,
    /// Minimum ticks between strikes.
    pub cooldown_ticks: u64,
    /// Targeting mode.
    pub mode: TargetingMode,
}

impl AttackProfile {
    /// Profile for a defender that fires at anything inside `range`.
    #[must_use]
    pub const fn within_range(damage: u32, range: Fixed, cooldown_ticks: u64) -> Self {
        Self {
            damage,
            range,
            cooldown_ticks,
            mode: TargetingMode::WithinRange,
        }
    }

    /// Profile for a combatant that walks to its target before striking.
    #[must_use]
    pub const fn approach(damage: u32, cooldown_ticks: u64) -> Self {
        Self {
            damage,
            range: Fixed::ZERO,
            cooldown_ticks,
            mode: TargetingMode::Approach,
        }
    }
}

/// Lifecycle of a targeting machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CombatState {
    /// No target cached.
    #[default]
    Idle,
    /// Target cached, closing the distance.
    Seeking,
    /// Target cached and attackable.
    Engaging,
    /// The owner is dead or destroyed. Terminal until reset.
    Dead,
}

/// A live candidate returned by a [`TargetView`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    /// Candidate entity.
    pub id: EntityId,
    /// Candidate position.
    pub position: Vec2Fixed,
}

/// Result of resolving a cached target id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetStatus {
    /// Target is live at the given position.
    Active(Vec2Fixed),
    /// Target is unknown or has been deactivated (pooled, removed).
    Inactive,
    /// Target reports itself destroyed or dead.
    Destroyed,
}

/// Read-only access to the opposing role, supplied by the caller.
pub trait TargetView {
    /// All live, attackable candidates of the opposing role, in registry
    /// order. Order matters: distance ties go to the earlier candidate.
    fn candidates(&self) -> impl Iterator<Item = Candidate> + '_;

    /// Resolve a cached target id.
    fn status(&self, target: EntityId) -> TargetStatus;
}

/// Why a cached target was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LossReason {
    /// Target no longer resolves to a live entity.
    Inactive,
    /// Target is destroyed or dead.
    Destroyed,
    /// Target left attack range.
    OutOfRange,
}

/// What one call to [`Targeting::step`] decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombatStep {
    /// Owner is dead; nothing happens.
    Inert,
    /// No target and no candidate found.
    NoTarget,
    /// A new target was cached this tick.
    Acquired {
        /// The new target.
        target: EntityId,
        /// Where it was when acquired (movement destination for approach).
        position: Vec2Fixed,
    },
    /// The cached target was dropped this tick.
    Lost {
        /// The dropped target.
        target: EntityId,
        /// Why it was dropped.
        reason: LossReason,
    },
    /// Still walking towards the target.
    Approaching {
        /// The cached target.
        target: EntityId,
    },
    /// In position but the cooldown has not elapsed.
    Cooling {
        /// The cached target.
        target: EntityId,
    },
    /// Strike now. The caller applies the damage through [`Damageable`].
    Strike {
        /// The struck target.
        target: EntityId,
        /// Damage to apply.
        damage: u32,
    },
}

/// Per-combatant targeting state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Targeting {
    profile: AttackProfile,
    state: CombatState,
    target: Option<EntityId>,
    last_attack_tick: Option<u64>,
}

impl Targeting {
    /// Fresh machine in [`CombatState::Idle`].
    #[must_use]
    pub const fn new(profile: AttackProfile) -> Self {
        Self {
            profile,
            state: CombatState::Idle,
            target: None,
            last_attack_tick: None,
        }
    }

    /// Attack parameters.
    #[must_use]
    pub const fn profile(&self) -> &AttackProfile {
        &self.profile
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> CombatState {
        self.state
    }

    /// Cached target, if any.
    #[must_use]
    pub const fn target(&self) -> Option<EntityId> {
        self.target
    }

    /// Tick of the most recent strike.
    #[must_use]
    pub const fn last_attack_tick(&self) -> Option<u64> {
        self.last_attack_tick
    }

    /// Whether the owner is dead.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.state == CombatState::Dead
    }

    /// Whether the cooldown allows a strike at `now`.
    #[must_use]
    pub fn cooldown_ready(&self, now: u64) -> bool {
        match self.last_attack_tick {
            None => true,
            Some(last) => now >= last.saturating_add(self.profile.cooldown_ticks),
        }
    }

    /// Drop the cached target (e.g. after the caller observed it die).
    pub fn clear_target(&mut self) {
        self.target = None;
        if self.state != CombatState::Dead {
            self.state = CombatState::Idle;
        }
    }

    /// Enter the terminal [`CombatState::Dead`] state.
    pub fn kill(&mut self) {
        self.target = None;
        self.state = CombatState::Dead;
    }

    /// Return to a brand-new machine, as when a pooled hostile is reused.
    pub fn reset(&mut self, profile: AttackProfile) {
        *self = Self::new(profile);
    }

    /// Advance the machine by one tick.
    ///
    /// `arrived` is the movement collaborator's arrival flag and is only
    /// consulted in [`TargetingMode::Approach`].
    pub fn step<V: TargetView + ?Sized>(
        &mut self,
        now: u64,
        origin: Vec2Fixed,
        arrived: bool,
        view: &V,
    ) -> CombatStep {
        if self.state == CombatState::Dead {
            return CombatStep::Inert;
        }

        match self.target {
            None => self.seek(origin, view),
            Some(target) => self.engage(now, origin, arrived, target, view),
        }
    }

    fn seek<V: TargetView + ?Sized>(&mut self, origin: Vec2Fixed, view: &V) -> CombatStep {
        self.state = CombatState::Seeking;

        let max_range = match self.profile.mode {
            TargetingMode::WithinRange => Some(self.profile.range),
            TargetingMode::Approach => None,
        };

        let Some(chosen) = select_nearest(origin, max_range, view.candidates()) else {
            self.state = CombatState::Idle;
            return CombatStep::NoTarget;
        };

        self.target = Some(chosen.id);
        self.state = match self.profile.mode {
            TargetingMode::WithinRange => CombatState::Engaging,
            TargetingMode::Approach => CombatState::Seeking,
        };

        CombatStep::Acquired {
            target: chosen.id,
            position: chosen.position,
        }
    }

    fn engage<V: TargetView + ?Sized>(
        &mut self,
        now: u64,
        origin: Vec2Fixed,
        arrived: bool,
        target: EntityId,
        view: &V,
    ) -> CombatStep {
        let position = match view.status(target) {
            TargetStatus::Active(position) => position,
            TargetStatus::Inactive => return self.lose(target, LossReason::Inactive),
            TargetStatus::Destroyed => return self.lose(target, LossReason::Destroyed),
        };

        match self.profile.mode {
            TargetingMode::WithinRange => {
                let range_sq = self.profile.range.saturating_mul(self.profile.range);
                if origin.distance_squared(position) > range_sq {
                    return self.lose(target, LossReason::OutOfRange);
                }
            }
            TargetingMode::Approach => {
                if !arrived {
                    self.state = CombatState::Seeking;
                    return CombatStep::Approaching { target };
                }
            }
        }

        self.state = CombatState::Engaging;

        if !self.cooldown_ready(now) {
            return CombatStep::Cooling { target };
        }

        self.last_attack_tick = Some(now);
        CombatStep::Strike {
            target,
            damage: self.profile.damage,
        }
    }

    fn lose(&mut self, target: EntityId, reason: LossReason) -> CombatStep {
        self.clear_target();
        CombatStep::Lost { target, reason }
    }
}

/// Pick the nearest candidate to `origin`.
///
/// With `max_range` set, candidates farther than the range are skipped.
/// Distance ties keep the earlier candidate.
pub fn select_nearest<I>(origin: Vec2Fixed, max_range: Option<Fixed>, candidates: I) -> Option<Candidate>
where
    I: IntoIterator<Item = Candidate>,
{
    let max_sq = max_range.map(|range| range.saturating_mul(range));
    let mut best: Option<(Fixed, Candidate)> = None;

    for candidate in candidates {
        let dist_sq = origin.distance_squared(candidate.position);
        if max_sq.is_some_and(|max| dist_sq > max) {
            continue;
        }
        match best {
            Some((best_sq, _)) if dist_sq >= best_sq => {}
            _ => best = Some((dist_sq, candidate)),
        }
    }

    best.map(|(_, candidate)| candidate)
}

/// Outcome of a damage application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Target was already destroyed/dead, or cannot be damaged.
    Ignored,
    /// Damage applied, target still standing.
    Damaged {
        /// Health left.
        remaining: u32,
    },
    /// This hit took the target to zero. Reported exactly once per life.
    Destroyed,
}

/// Anything that can be struck.
pub trait Damageable {
    /// Apply damage. Must be a no-op once destroyed, and must return
    /// [`DamageOutcome::Destroyed`] only for the hit that crossed zero.
    fn take_damage(&mut self, amount: u32) -> DamageOutcome;

    /// Whether the entity has been destroyed or killed.
    fn is_destroyed(&self) -> bool;
}
