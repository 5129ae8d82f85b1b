//! Recycling store for hostile records.
//!
//! Hostiles are never destroyed. When one dies and its despawn delay has
//! passed it is released to the pool for its kind, and the next spawn of
//! that kind reuses it (oldest first) instead of creating a new instance.
//!
//! Every id the pool knows about is in exactly one of the live list or the
//! pool for its kind.

use std::collections::{BTreeMap, VecDeque};

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::combat::{DamageOutcome, Damageable, Targeting};
use crate::components::{EntityId, Health, HostileKind, Role};
use crate::config::{HostileTemplate, SpawnLocation};
use crate::error::{GameError, Result};
use crate::math::Vec2Fixed;
use crate::registry::EntityRegistry;
use crate::scene::Instantiation;

/// One hostile, live or pooled.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HostileEntity {
    id: EntityId,
    kind: HostileKind,
    prefab: String,
    position: Vec2Fixed,
    health: Health,
    targeting: Targeting,
}

impl HostileEntity {
    fn spawn(id: EntityId, prefab: String, position: Vec2Fixed, template: &HostileTemplate) -> Self {
        Self {
            id,
            kind: template.kind,
            prefab,
            position,
            health: Health::new(template.max_health),
            targeting: Targeting::new(template.profile()),
        }
    }

    /// Back to spawn condition: full health, no target, no cooldown stamp.
    fn reset(&mut self, template: &HostileTemplate, position: Vec2Fixed) {
        self.position = position;
        self.health = Health::new(template.max_health);
        self.targeting.reset(template.profile());
    }

    /// Entity id.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Hostile kind.
    #[must_use]
    pub const fn kind(&self) -> HostileKind {
        self.kind
    }

    /// Prefab chosen when the instance was first created.
    #[must_use]
    pub fn prefab(&self) -> &str {
        &self.prefab
    }

    /// Last reported position.
    #[must_use]
    pub const fn position(&self) -> Vec2Fixed {
        self.position
    }

    /// Update the position (reported back by movement).
    pub fn set_position(&mut self, position: Vec2Fixed) {
        self.position = position;
    }

    /// Health.
    #[must_use]
    pub const fn health(&self) -> &Health {
        &self.health
    }

    /// Targeting state; its lifecycle doubles as the hostile's.
    #[must_use]
    pub const fn targeting(&self) -> &Targeting {
        &self.targeting
    }

    /// Mutable targeting state.
    pub fn targeting_mut(&mut self) -> &mut Targeting {
        &mut self.targeting
    }

    /// Whether the hostile is dead (possibly still awaiting despawn).
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.targeting.is_dead()
    }

    /// Kill outright regardless of health. Returns `false` if already dead.
    pub fn kill(&mut self) -> bool {
        if self.is_dead() {
            return false;
        }
        self.health.current = 0;
        self.targeting.kill();
        true
    }
}

impl Damageable for HostileEntity {
    fn take_damage(&mut self, amount: u32) -> DamageOutcome {
        if self.is_dead() {
            return DamageOutcome::Ignored;
        }

        self.health.apply_damage(amount);
        if self.health.is_depleted() {
            self.targeting.kill();
            DamageOutcome::Destroyed
        } else {
            DamageOutcome::Damaged {
                remaining: self.health.current,
            }
        }
    }

    fn is_destroyed(&self) -> bool {
        self.is_dead()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Membership {
    Live,
    Pooled,
}

/// Owner of every hostile record.
#[derive(Debug, Clone, Default)]
pub struct EntityPool {
    records: BTreeMap<EntityId, HostileEntity>,
    membership: BTreeMap<EntityId, Membership>,
    live: Vec<EntityId>,
    pooled: [VecDeque<EntityId>; 2],
}

impl EntityPool {
    /// Empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Put a hostile of `kind` into play around `location`.
    ///
    /// Reuses the oldest pooled instance of the kind if there is one,
    /// otherwise registers a new id and asks the scene to create an
    /// instance from a randomly chosen prefab.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::MissingTemplate`] if `templates` has no entry
    /// for `kind`, and [`GameError::NoPrefab`] if its prefab list is empty.
    pub fn acquire<R, S>(
        &mut self,
        kind: HostileKind,
        location: &SpawnLocation,
        templates: &[HostileTemplate],
        rng: &mut R,
        registry: &mut EntityRegistry,
        scene: &mut S,
    ) -> Result<EntityId>
    where
        R: Rng + ?Sized,
        S: Instantiation + ?Sized,
    {
        let template = templates
            .iter()
            .find(|t| t.kind == kind)
            .ok_or(GameError::MissingTemplate(kind))?;
        if template.prefabs.is_empty() {
            return Err(GameError::NoPrefab(kind));
        }

        let position = location.position + Vec2Fixed::random_in_disk(rng, location.cluster_radius);

        let id = if let Some(id) = self.pooled[kind.index()].pop_front() {
            if let Some(record) = self.records.get_mut(&id) {
                record.reset(template, position);
            }
            registry.reactivate(id);
            scene.reactivate_instance(id, position);
            debug!(id, ?kind, "reused pooled hostile");
            id
        } else {
            let prefab = template
                .prefabs
                .choose(rng)
                .cloned()
                .ok_or(GameError::NoPrefab(kind))?;
            let id = registry.register(Role::Hostile);
            scene.create_instance(id, kind, &prefab, position);
            self.records
                .insert(id, HostileEntity::spawn(id, prefab, position, template));
            debug!(id, ?kind, "created hostile");
            id
        };

        self.membership.insert(id, Membership::Live);
        self.live.push(id);

        #[cfg(feature = "debug-validation")]
        self.assert_consistent();

        Ok(id)
    }

    /// Return a live hostile to the pool for its kind.
    ///
    /// Returns `false` (and does nothing) if `id` is unknown or already
    /// pooled.
    pub fn release<S>(&mut self, id: EntityId, registry: &mut EntityRegistry, scene: &mut S) -> bool
    where
        S: Instantiation + ?Sized,
    {
        if self.membership.get(&id) != Some(&Membership::Live) {
            return false;
        }
        let Some(kind) = self.records.get(&id).map(HostileEntity::kind) else {
            return false;
        };

        self.live.retain(|&other| other != id);
        self.membership.insert(id, Membership::Pooled);
        self.pooled[kind.index()].push_back(id);
        registry.deactivate(id);
        scene.deactivate_instance(id);
        debug!(id, ?kind, "released hostile to pool");

        #[cfg(feature = "debug-validation")]
        self.assert_consistent();

        true
    }

    /// Hostiles in the live set, dead bodies awaiting despawn included.
    #[must_use]
    pub fn living_count(&self) -> usize {
        self.live.len()
    }

    /// Pooled instances of `kind`.
    #[must_use]
    pub fn pooled_count(&self, kind: HostileKind) -> usize {
        self.pooled[kind.index()].len()
    }

    /// Instances ever created.
    #[must_use]
    pub fn total_created(&self) -> usize {
        self.records.len()
    }

    /// Live ids in spawn order.
    #[must_use]
    pub fn live_ids(&self) -> &[EntityId] {
        &self.live
    }

    /// Whether `id` is in the live set.
    #[must_use]
    pub fn is_live(&self, id: EntityId) -> bool {
        self.membership.get(&id) == Some(&Membership::Live)
    }

    /// Whether `id` is waiting in a pool.
    #[must_use]
    pub fn is_pooled(&self, id: EntityId) -> bool {
        self.membership.get(&id) == Some(&Membership::Pooled)
    }

    /// Record for `id`, live or pooled.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&HostileEntity> {
        self.records.get(&id)
    }

    /// Mutable record for `id`.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut HostileEntity> {
        self.records.get_mut(&id)
    }

    /// Live records in spawn order.
    pub fn live(&self) -> impl Iterator<Item = &HostileEntity> {
        self.live.iter().filter_map(|id| self.records.get(id))
    }

    #[cfg(feature = "debug-validation")]
    fn assert_consistent(&self) {
        let pooled: usize = self.pooled.iter().map(VecDeque::len).sum();
        assert_eq!(
            self.live.len() + pooled,
            self.records.len(),
            "hostile membership out of sync"
        );
        for id in &self.live {
            assert_eq!(self.membership.get(id), Some(&Membership::Live));
        }
        for id in self.pooled.iter().flatten() {
            assert_eq!(self.membership.get(id), Some(&Membership::Pooled));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::CombatState;
    use crate::config::AttackSpec;
    use crate::math::Fixed;
    use crate::scene::NullScene;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    struct Harness {
        pool: EntityPool,
        registry: EntityRegistry,
        rng: ChaCha8Rng,
        scene: NullScene,
        templates: Vec<HostileTemplate>,
        location: SpawnLocation,
    }

    impl Harness {
        fn new() -> Self {
            let template = |kind, prefab: &str| HostileTemplate {
                kind,
                prefabs: vec![prefab.to_string()],
                max_health: 40,
                attack: AttackSpec {
                    damage: 5,
                    range: Fixed::ZERO,
                    cooldown_ticks: 10,
                },
            };
            Self {
                pool: EntityPool::new(),
                registry: EntityRegistry::new(),
                rng: ChaCha8Rng::seed_from_u64(1),
                scene: NullScene,
                templates: vec![
                    template(HostileKind::Melee, "grunt"),
                    template(HostileKind::Ranged, "archer"),
                ],
                location: SpawnLocation::at(Vec2Fixed::from_ints(10, 10)),
            }
        }

        fn acquire(&mut self, kind: HostileKind) -> EntityId {
            self.pool
                .acquire(
                    kind,
                    &self.location,
                    &self.templates,
                    &mut self.rng,
                    &mut self.registry,
                    &mut self.scene,
                )
                .unwrap()
        }

        fn release(&mut self, id: EntityId) -> bool {
            self.pool.release(id, &mut self.registry, &mut self.scene)
        }
    }

    #[test]
    fn test_acquire_creates_then_reuses_fifo() {
        let mut h = Harness::new();
        let a = h.acquire(HostileKind::Melee);
        let b = h.acquire(HostileKind::Melee);
        assert_eq!(h.pool.total_created(), 2);

        assert!(h.release(a));
        assert!(h.release(b));
        assert_eq!(h.pool.pooled_count(HostileKind::Melee), 2);

        assert_eq!(h.acquire(HostileKind::Melee), a);
        assert_eq!(h.acquire(HostileKind::Melee), b);
        assert_eq!(h.pool.total_created(), 2);
    }

    #[test]
    fn test_pools_are_per_kind() {
        let mut h = Harness::new();
        let melee = h.acquire(HostileKind::Melee);
        h.release(melee);

        let ranged = h.acquire(HostileKind::Ranged);
        assert_ne!(ranged, melee);
        assert_eq!(h.pool.pooled_count(HostileKind::Melee), 1);
        assert_eq!(h.pool.get(ranged).unwrap().prefab(), "archer");
    }

    #[test]
    fn test_release_is_idempotent() {
        let mut h = Harness::new();
        let id = h.acquire(HostileKind::Ranged);

        assert!(h.release(id));
        assert!(!h.release(id));
        assert!(!h.release(999));
        assert_eq!(h.pool.pooled_count(HostileKind::Ranged), 1);
        assert_eq!(h.pool.living_count(), 0);
    }

    #[test]
    fn test_membership_is_exclusive() {
        let mut h = Harness::new();
        let id = h.acquire(HostileKind::Melee);
        assert!(h.pool.is_live(id) && !h.pool.is_pooled(id));
        assert!(h.registry.is_live(id));

        h.release(id);
        assert!(!h.pool.is_live(id) && h.pool.is_pooled(id));
        assert!(!h.registry.is_live(id));
    }

    #[test]
    fn test_reuse_resets_state() {
        let mut h = Harness::new();
        let id = h.acquire(HostileKind::Melee);

        let record = h.pool.get_mut(id).unwrap();
        assert_eq!(record.take_damage(100), DamageOutcome::Destroyed);
        assert_eq!(record.take_damage(100), DamageOutcome::Ignored);
        assert!(record.is_dead());

        h.release(id);
        assert_eq!(h.acquire(HostileKind::Melee), id);

        let record = h.pool.get(id).unwrap();
        assert!(record.health().is_full());
        assert_eq!(record.targeting().state(), CombatState::Idle);
        assert_eq!(record.targeting().target(), None);
        assert_eq!(record.targeting().last_attack_tick(), None);
    }

    #[test]
    fn test_spawn_positions_inside_cluster() {
        let mut h = Harness::new();
        let radius_sq = h.location.cluster_radius * h.location.cluster_radius;
        for _ in 0..50 {
            let id = h.acquire(HostileKind::Melee);
            let position = h.pool.get(id).unwrap().position();
            assert!(position.distance_squared(h.location.position) <= radius_sq);
        }
    }

    #[test]
    fn test_missing_template() {
        let mut h = Harness::new();
        h.templates.retain(|t| t.kind == HostileKind::Melee);
        let result = h.pool.acquire(
            HostileKind::Ranged,
            &h.location,
            &h.templates,
            &mut h.rng,
            &mut h.registry,
            &mut h.scene,
        );
        assert!(matches!(result, Err(GameError::MissingTemplate(HostileKind::Ranged))));
        assert_eq!(h.pool.living_count(), 0);
    }

    #[test]
    fn test_empty_prefab_list_spawns_nothing() {
        let mut h = Harness::new();
        h.templates[0].prefabs.clear();
        let result = h.pool.acquire(
            HostileKind::Melee,
            &h.location,
            &h.templates,
            &mut h.rng,
            &mut h.registry,
            &mut h.scene,
        );
        assert!(matches!(result, Err(GameError::NoPrefab(HostileKind::Melee))));
        assert_eq!(h.pool.total_created(), 0);
        assert_eq!(h.registry.issued(), 0);

        h.acquire(HostileKind::Ranged);
        assert_eq!(h.pool.living_count(), 1);
    }

    #[test]
    fn test_kill_is_once() {
        let mut h = Harness::new();
        let id = h.acquire(HostileKind::Melee);
        let record = h.pool.get_mut(id).unwrap();
        assert!(record.kill());
        assert!(!record.kill());
        assert!(record.health().is_depleted());
    }
}
