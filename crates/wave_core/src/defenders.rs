//! Defended entities: towers and the player.
//!
//! Towers have health and are destroyed at zero; the player is a
//! combatant that hostiles chase but whose health is outside the
//! simulation, so strikes against it are ignored.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::combat::{AttackProfile, DamageOutcome, Damageable, Targeting};
use crate::components::{EntityId, Health};
use crate::math::Vec2Fixed;

/// Kind of defended entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DefenderKind {
    /// Static structure with health.
    Tower,
    /// The player avatar. Never destroyed.
    Player,
}

/// A tower or the player.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DefendedEntity {
    id: EntityId,
    kind: DefenderKind,
    position: Vec2Fixed,
    health: Option<Health>,
    destroyed: bool,
    targeting: Targeting,
}

impl DefendedEntity {
    /// A tower at full health.
    #[must_use]
    pub const fn tower(id: EntityId, position: Vec2Fixed, max_health: u32, profile: AttackProfile) -> Self {
        Self {
            id,
            kind: DefenderKind::Tower,
            position,
            health: Some(Health::new(max_health)),
            destroyed: false,
            targeting: Targeting::new(profile),
        }
    }

    /// The player.
    #[must_use]
    pub const fn player(id: EntityId, position: Vec2Fixed, profile: AttackProfile) -> Self {
        Self {
            id,
            kind: DefenderKind::Player,
            position,
            health: None,
            destroyed: false,
            targeting: Targeting::new(profile),
        }
    }

    /// Entity id.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Tower or player.
    #[must_use]
    pub const fn kind(&self) -> DefenderKind {
        self.kind
    }

    /// Current position.
    #[must_use]
    pub const fn position(&self) -> Vec2Fixed {
        self.position
    }

    /// Move the entity (the player walks; towers normally do not).
    pub fn set_position(&mut self, position: Vec2Fixed) {
        self.position = position;
    }

    /// Tower health; `None` for the player.
    #[must_use]
    pub const fn health(&self) -> Option<&Health> {
        self.health.as_ref()
    }

    /// Targeting state.
    #[must_use]
    pub const fn targeting(&self) -> &Targeting {
        &self.targeting
    }

    /// Mutable targeting state.
    pub fn targeting_mut(&mut self) -> &mut Targeting {
        &mut self.targeting
    }

    /// Drop the cached target.
    pub fn reset_target(&mut self) {
        self.targeting.clear_target();
    }

    /// Restore tower health up to max. Returns the amount restored.
    ///
    /// Destroyed towers and the player are unaffected.
    pub fn repair(&mut self, amount: u32) -> u32 {
        if self.destroyed {
            return 0;
        }
        self.health.as_mut().map_or(0, |health| health.heal(amount))
    }
}

impl Damageable for DefendedEntity {
    fn take_damage(&mut self, amount: u32) -> DamageOutcome {
        if self.destroyed {
            return DamageOutcome::Ignored;
        }
        let Some(health) = self.health.as_mut() else {
            return DamageOutcome::Ignored;
        };

        health.apply_damage(amount);
        if health.is_depleted() {
            self.destroyed = true;
            self.targeting.kill();
            DamageOutcome::Destroyed
        } else {
            DamageOutcome::Damaged {
                remaining: health.current,
            }
        }
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}

/// All defended entities, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct DefenderSet {
    entities: BTreeMap<EntityId, DefendedEntity>,
}

impl DefenderSet {
    /// Empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a defender.
    pub fn insert(&mut self, entity: DefendedEntity) {
        self.entities.insert(entity.id(), entity);
    }

    /// Look up by id.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&DefendedEntity> {
        self.entities.get(&id)
    }

    /// Mutable lookup by id.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut DefendedEntity> {
        self.entities.get_mut(&id)
    }

    /// All defenders in id order.
    pub fn iter(&self) -> impl Iterator<Item = &DefendedEntity> {
        self.entities.values()
    }

    /// All defenders in id order, mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut DefendedEntity> {
        self.entities.values_mut()
    }

    /// Number of defenders, destroyed ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether there are no defenders.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Drop `target` from every defender caching it. Returns how many
    /// defenders let go.
    pub fn forget_target(&mut self, target: EntityId) -> usize {
        let mut cleared = 0;
        for defender in self.iter_mut() {
            if defender.targeting().target() == Some(target) {
                defender.reset_target();
                cleared += 1;
            }
        }
        cleared
    }

    /// Number of towers still standing.
    #[must_use]
    pub fn standing_towers(&self) -> usize {
        self.entities
            .values()
            .filter(|d| d.kind == DefenderKind::Tower && !d.destroyed)
            .count()
    }
}
