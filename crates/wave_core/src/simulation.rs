//! The simulation context: owns every component and ticks it.
//!
//! # System Execution Order
//!
//! Each tick, systems run in this order:
//! 1. **Defenders** - towers and the player pick targets and fire
//! 2. **Hostiles** - hostiles pick targets, walk, strike
//! 3. **Despawn** - dead hostiles whose delay ran out return to the pool;
//!    the wave completes when the live set empties
//! 4. **Scheduler** - countdown to the next wave
//!
//! Within a system, entities are processed in a fixed order (defenders by
//! id, hostiles by spawn order), so two simulations built from the same
//! config and seed stay identical.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use crate::combat::{
    AttackProfile, Candidate, CombatStep, DamageOutcome, Damageable, TargetStatus, TargetView,
    TargetingMode,
};
use crate::components::{EntityId, HostileKind, Role};
use crate::config::{SimConfig, WaveTable, FIRST_WAVE};
use crate::defenders::{DefendedEntity, DefenderKind, DefenderSet};
use crate::error::{GameError, Result};
use crate::events::{EventBus, WaveEvent};
use crate::math::Vec2Fixed;
use crate::pool::{EntityPool, HostileEntity};
use crate::registry::EntityRegistry;
use crate::scene::{Cue, Scene};
use crate::scheduler::{SchedulerPhase, WaveContext, WaveScheduler};

/// One strike resolved this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrikeEvent {
    /// Who struck.
    pub attacker: EntityId,
    /// Who was struck.
    pub target: EntityId,
    /// Damage dealt by the strike.
    pub damage: u32,
    /// What the damage did.
    pub outcome: DamageOutcome,
}

/// Events generated during a tick.
#[derive(Debug, Clone, Default)]
pub struct TickEvents {
    /// Strikes, in resolution order.
    pub strikes: Vec<StrikeEvent>,
    /// Hostiles that died this tick.
    pub deaths: Vec<EntityId>,
    /// Towers destroyed this tick.
    pub destroyed_towers: Vec<EntityId>,
    /// Hostiles returned to the pool this tick.
    pub released: Vec<EntityId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct DespawnTimer {
    entity: EntityId,
    remaining: u64,
}

/// Live hostiles as seen by defenders.
struct HostileTargets<'a> {
    registry: &'a EntityRegistry,
    pool: &'a EntityPool,
}

impl TargetView for HostileTargets<'_> {
    fn candidates(&self) -> impl Iterator<Item = Candidate> + '_ {
        self.registry
            .live(Role::Hostile)
            .iter()
            .filter_map(|&id| self.pool.get(id))
            .filter(|hostile| !hostile.is_dead())
            .map(|hostile| Candidate {
                id: hostile.id(),
                position: hostile.position(),
            })
    }

    fn status(&self, target: EntityId) -> TargetStatus {
        if !self.registry.is_live(target) {
            return TargetStatus::Inactive;
        }
        match self.pool.get(target) {
            Some(hostile) if hostile.is_dead() => TargetStatus::Destroyed,
            Some(hostile) => TargetStatus::Active(hostile.position()),
            None => TargetStatus::Inactive,
        }
    }
}

/// Standing defenders as seen by hostiles.
struct DefenderTargets<'a> {
    registry: &'a EntityRegistry,
    defenders: &'a DefenderSet,
}

impl TargetView for DefenderTargets<'_> {
    fn candidates(&self) -> impl Iterator<Item = Candidate> + '_ {
        self.registry
            .live(Role::Defender)
            .iter()
            .filter_map(|&id| self.defenders.get(id))
            .filter(|defender| !defender.is_destroyed())
            .map(|defender| Candidate {
                id: defender.id(),
                position: defender.position(),
            })
    }

    fn status(&self, target: EntityId) -> TargetStatus {
        if !self.registry.is_live(target) {
            return TargetStatus::Inactive;
        }
        match self.defenders.get(target) {
            Some(defender) if defender.is_destroyed() => TargetStatus::Destroyed,
            Some(defender) => TargetStatus::Active(defender.position()),
            None => TargetStatus::Inactive,
        }
    }
}

/// The wave simulation.
///
/// Owns all state and advances it deterministically. The host supplies a
/// [`Scene`] on every call that may move, spawn or animate something.
#[derive(Debug)]
pub struct Simulation {
    tick: u64,
    config: SimConfig,
    scheduler: WaveScheduler,
    pool: EntityPool,
    defenders: DefenderSet,
    registry: EntityRegistry,
    rng: ChaCha8Rng,
    events: EventBus,
    despawn: Vec<DespawnTimer>,
}

impl Simulation {
    /// Build a simulation and place the configured defenders.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidTiers`] for a broken tier table and
    /// [`GameError::InvalidConfig`] for any other fatal issue. Non-fatal
    /// issues (no spawn locations, missing templates) are logged and
    /// surface later as empty waves.
    pub fn new(config: SimConfig) -> Result<Self> {
        let table = WaveTable::new(&config.tiers)?;
        let fatal = config.fatal_issues();
        if !fatal.is_empty() {
            return Err(GameError::InvalidConfig(fatal));
        }
        for issue in config.validate() {
            warn!(%issue, "configuration issue");
        }

        let scheduler = WaveScheduler::new(table, config.tick_rate, config.countdown_seconds);
        let mut sim = Self {
            tick: 0,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            scheduler,
            pool: EntityPool::new(),
            defenders: DefenderSet::new(),
            registry: EntityRegistry::new(),
            events: EventBus::new(),
            despawn: Vec::new(),
            config,
        };

        for spec in sim.config.defenders.clone() {
            let profile = spec.attack.profile(TargetingMode::WithinRange);
            match spec.kind {
                DefenderKind::Tower => sim.add_tower(spec.position, spec.max_health, profile),
                DefenderKind::Player => sim.add_player(spec.position, profile),
            };
        }

        Ok(sim)
    }

    /// Place a tower.
    pub fn add_tower(&mut self, position: Vec2Fixed, max_health: u32, profile: AttackProfile) -> EntityId {
        let id = self.registry.register(Role::Defender);
        self.defenders
            .insert(DefendedEntity::tower(id, position, max_health, profile));
        id
    }

    /// Place the player.
    pub fn add_player(&mut self, position: Vec2Fixed, profile: AttackProfile) -> EntityId {
        let id = self.registry.register(Role::Defender);
        self.defenders
            .insert(DefendedEntity::player(id, position, profile));
        id
    }

    fn with_context<S, T>(
        &mut self,
        scene: &mut S,
        f: impl FnOnce(&mut WaveScheduler, &mut WaveContext<'_, S>) -> T,
    ) -> T
    where
        S: Scene + ?Sized,
    {
        let mut ctx = WaveContext {
            pool: &mut self.pool,
            registry: &mut self.registry,
            rng: &mut self.rng,
            locations: &self.config.spawn_locations,
            templates: &self.config.hostiles,
            scene,
            events: &mut self.events,
        };
        f(&mut self.scheduler, &mut ctx)
    }

    /// Start the first wave. Ignored once a wave has started.
    pub fn start<S: Scene + ?Sized>(&mut self, scene: &mut S) {
        if self.scheduler.phase() != SchedulerPhase::Idle {
            warn!(wave = self.scheduler.current_wave(), "simulation already started");
            return;
        }
        self.with_context(scene, |scheduler, ctx| scheduler.start_wave(FIRST_WAVE, ctx));
    }

    /// Advance the simulation by one tick.
    pub fn tick<S: Scene + ?Sized>(&mut self, scene: &mut S) -> TickEvents {
        let now = self.tick;
        let mut events = TickEvents::default();

        // 1. Defenders
        self.run_defender_system(now, scene, &mut events);

        // 2. Hostiles
        self.run_hostile_system(now, scene, &mut events);

        // 3. Despawn timers and wave completion
        self.run_despawn_system(scene, &mut events);

        // 4. Scheduler countdown
        self.with_context(scene, |scheduler, ctx| scheduler.tick(ctx));

        self.tick += 1;

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            debug!(tick = self.tick, state_hash = hash, "Simulation state hash");
        }

        events
    }

    fn run_defender_system<S: Scene + ?Sized>(&mut self, now: u64, scene: &mut S, events: &mut TickEvents) {
        let ids: Vec<EntityId> = self.defenders.iter().map(DefendedEntity::id).collect();

        for id in ids {
            let (origin, mut targeting) = match self.defenders.get(id) {
                Some(defender) if !defender.is_destroyed() => (defender.position(), *defender.targeting()),
                _ => continue,
            };

            let view = HostileTargets {
                registry: &self.registry,
                pool: &self.pool,
            };
            let step = targeting.step(now, origin, true, &view);

            if let Some(defender) = self.defenders.get_mut(id) {
                *defender.targeting_mut() = targeting;
            }

            if let CombatStep::Strike { target, damage } = step {
                scene.play_cue(id, Cue::Attack);
                self.strike_hostile(id, target, damage, scene, events);
            }
        }
    }

    fn run_hostile_system<S: Scene + ?Sized>(&mut self, now: u64, scene: &mut S, events: &mut TickEvents) {
        let ids = self.pool.live_ids().to_vec();

        for id in ids {
            let (origin, mut targeting) = match self.pool.get(id) {
                Some(hostile) if !hostile.is_dead() => (hostile.position(), *hostile.targeting()),
                _ => continue,
            };

            let view = DefenderTargets {
                registry: &self.registry,
                defenders: &self.defenders,
            };
            let step = targeting.step(now, origin, scene.has_arrived(id), &view);

            if let Some(hostile) = self.pool.get_mut(id) {
                *hostile.targeting_mut() = targeting;
            }

            match step {
                CombatStep::Acquired { position, .. } => scene.set_destination(id, position),
                CombatStep::Strike { target, damage } => {
                    scene.play_cue(id, Cue::Attack);
                    self.strike_defender(id, target, damage, scene, events);
                }
                _ => {}
            }
        }
    }

    fn strike_hostile<S: Scene + ?Sized>(
        &mut self,
        attacker: EntityId,
        target: EntityId,
        damage: u32,
        scene: &mut S,
        events: &mut TickEvents,
    ) {
        let Some(hostile) = self.pool.get_mut(target) else {
            return;
        };
        let outcome = hostile.take_damage(damage);
        events.strikes.push(StrikeEvent {
            attacker,
            target,
            damage,
            outcome,
        });

        if outcome == DamageOutcome::Destroyed {
            self.on_hostile_death(target, scene);
            events.deaths.push(target);
        }
    }

    fn strike_defender<S: Scene + ?Sized>(
        &mut self,
        attacker: EntityId,
        target: EntityId,
        damage: u32,
        scene: &mut S,
        events: &mut TickEvents,
    ) {
        let Some(defender) = self.defenders.get_mut(target) else {
            return;
        };
        let outcome = defender.take_damage(damage);
        events.strikes.push(StrikeEvent {
            attacker,
            target,
            damage,
            outcome,
        });

        if outcome == DamageOutcome::Destroyed {
            self.registry.deactivate(target);
            scene.play_cue(target, Cue::Destroyed);
            events.destroyed_towers.push(target);
            info!(tower = target, "tower destroyed");
        }
    }

    fn on_hostile_death<S: Scene + ?Sized>(&mut self, id: EntityId, scene: &mut S) {
        scene.halt_and_hold(id);
        scene.play_cue(id, Cue::Death);
        self.despawn.push(DespawnTimer {
            entity: id,
            remaining: self.config.despawn_delay_ticks,
        });
        debug!(id, "hostile died");
    }

    fn run_despawn_system<S: Scene + ?Sized>(&mut self, scene: &mut S, events: &mut TickEvents) {
        let mut due = Vec::new();
        self.despawn.retain_mut(|timer| {
            if timer.remaining == 0 {
                due.push(timer.entity);
                false
            } else {
                timer.remaining -= 1;
                true
            }
        });

        for id in due {
            if self.pool.release(id, &mut self.registry, scene) {
                // The id comes back on reuse; nobody may keep aiming at it.
                self.defenders.forget_target(id);
                events.released.push(id);
                self.events.publish(WaveEvent::PopulationChanged {
                    living: self.pool.living_count(),
                });
            }
        }

        if !events.released.is_empty()
            && self.pool.living_count() == 0
            && self.scheduler.phase() == SchedulerPhase::WaveActive
        {
            self.scheduler.on_wave_complete(&mut self.events);
        }
    }

    /// Flip the pause flag. Returns the new value.
    pub fn toggle_pause(&mut self) -> bool {
        self.scheduler.toggle_pause()
    }

    /// Skip the countdown (if any) and start the next wave now.
    pub fn force_next_wave<S: Scene + ?Sized>(&mut self, scene: &mut S) {
        self.with_context(scene, |scheduler, ctx| scheduler.force_next_wave(ctx));
    }

    /// Kill every live hostile and clear every defender's target.
    ///
    /// Killed hostiles take the normal death path, despawn delay included.
    /// Returns the ids killed.
    pub fn kill_all_hostiles<S: Scene + ?Sized>(&mut self, scene: &mut S) -> Vec<EntityId> {
        let mut killed = Vec::new();
        for id in self.pool.live_ids().to_vec() {
            if self.pool.get_mut(id).is_some_and(HostileEntity::kill) {
                self.on_hostile_death(id, scene);
                killed.push(id);
            }
        }
        for defender in self.defenders.iter_mut() {
            defender.reset_target();
        }
        info!(count = killed.len(), "killed all hostiles");
        killed
    }

    /// Restore up to `amount` health to a tower. Returns the amount restored.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::EntityNotFound`] if `id` is not a defender.
    pub fn repair_tower(&mut self, id: EntityId, amount: u32) -> Result<u32> {
        self.defenders
            .get_mut(id)
            .map(|defender| defender.repair(amount))
            .ok_or(GameError::EntityNotFound(id))
    }

    /// Record a position reported by movement.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::EntityNotFound`] for unknown ids.
    pub fn set_position(&mut self, id: EntityId, position: Vec2Fixed) -> Result<()> {
        let updated = match self.registry.role_of(id) {
            Some(Role::Hostile) => self.pool.get_mut(id).map(|h| h.set_position(position)),
            Some(Role::Defender) => self.defenders.get_mut(id).map(|d| d.set_position(position)),
            None => None,
        };
        updated.ok_or(GameError::EntityNotFound(id))
    }

    /// Register a callback for every [`WaveEvent`].
    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: FnMut(&WaveEvent) + 'static,
    {
        self.events.subscribe(callback);
    }

    /// Take buffered [`WaveEvent`]s.
    pub fn drain_events(&mut self) -> Vec<WaveEvent> {
        self.events.drain()
    }

    /// Get current tick number.
    #[must_use]
    pub const fn get_tick(&self) -> u64 {
        self.tick
    }

    /// Configuration the simulation was built from.
    #[must_use]
    pub const fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Last wave started; 0 before [`Simulation::start`].
    #[must_use]
    pub const fn current_wave(&self) -> u32 {
        self.scheduler.current_wave()
    }

    /// Scheduler phase.
    #[must_use]
    pub const fn phase(&self) -> SchedulerPhase {
        self.scheduler.phase()
    }

    /// Whether the countdown is frozen.
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.scheduler.is_paused()
    }

    /// Whole seconds left before the next wave, while counting down.
    #[must_use]
    pub fn countdown_remaining(&self) -> Option<u32> {
        self.scheduler.countdown_seconds()
    }

    /// Hostiles in the live set, bodies awaiting despawn included.
    #[must_use]
    pub fn living_count(&self) -> usize {
        self.pool.living_count()
    }

    /// Hostile record by id.
    #[must_use]
    pub fn hostile(&self, id: EntityId) -> Option<&HostileEntity> {
        self.pool.get(id)
    }

    /// Live hostiles in spawn order.
    pub fn hostiles(&self) -> impl Iterator<Item = &HostileEntity> {
        self.pool.live()
    }

    /// Hostile store.
    #[must_use]
    pub const fn pool(&self) -> &EntityPool {
        &self.pool
    }

    /// Defender by id.
    #[must_use]
    pub fn defender(&self, id: EntityId) -> Option<&DefendedEntity> {
        self.defenders.get(id)
    }

    /// All defenders in id order.
    pub fn defenders(&self) -> impl Iterator<Item = &DefendedEntity> {
        self.defenders.iter()
    }

    /// Compute a deterministic hash of the simulation state.
    ///
    /// Two simulations with identical state produce identical hashes.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.tick.hash(&mut hasher);
        self.scheduler.phase().hash(&mut hasher);
        self.scheduler.run_state().hash(&mut hasher);

        self.pool.living_count().hash(&mut hasher);
        for hostile in self.pool.live() {
            hostile.hash(&mut hasher);
        }
        for kind in HostileKind::ALL {
            self.pool.pooled_count(kind).hash(&mut hasher);
        }

        for defender in self.defenders.iter() {
            defender.hash(&mut hasher);
        }

        self.despawn.hash(&mut hasher);
        self.rng.get_word_pos().hash(&mut hasher);

        hasher.finish()
    }
}
