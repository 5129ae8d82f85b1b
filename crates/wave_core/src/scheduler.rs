//! Wave progression: start, completion, countdown, pause and forced advance.
//!
//! # Phases
//!
//! ```text
//! Idle ─start─► Spawning ─► WaveActive ─complete─► Countdown ─expire─► Spawning …
//!                                 ▲                    │
//!                                 └────force_next──────┘
//! ```
//!
//! The countdown is measured in ticks (`countdown_seconds * tick_rate`) and
//! only advances on unpaused ticks. A [`WaveEvent::CountdownTick`] is
//! published when the countdown starts and whenever the rounded-up number
//! of seconds left changes; `0` is published once on expiry.

use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::allocation::allocate;
use crate::components::HostileKind;
use crate::config::{HostileTemplate, SpawnLocation, WaveComposition, WaveTable};
use crate::events::{EventBus, WaveEvent};
use crate::pool::EntityPool;
use crate::registry::EntityRegistry;
use crate::scene::Instantiation;

/// Where the scheduler is in the wave cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SchedulerPhase {
    /// No wave started yet.
    #[default]
    Idle,
    /// Populating the current wave.
    Spawning,
    /// Waiting for the live set to empty.
    WaveActive,
    /// Counting down to the next wave.
    Countdown,
}

/// Run state owned by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct WaveRunState {
    /// Last wave started; 0 before the first.
    pub current_wave: u32,
    /// Whether the countdown is frozen.
    pub is_paused: bool,
    /// Ticks left before the next wave, while counting down.
    pub countdown_remaining: Option<u64>,
}

/// Everything the scheduler touches while spawning.
pub struct WaveContext<'a, S: ?Sized> {
    /// Hostile store.
    pub pool: &'a mut EntityPool,
    /// Id issuer and role index.
    pub registry: &'a mut EntityRegistry,
    /// Seeded randomness for scatter and prefab choice.
    pub rng: &'a mut ChaCha8Rng,
    /// Spawn points, in fill order.
    pub locations: &'a [SpawnLocation],
    /// Per-kind templates.
    pub templates: &'a [HostileTemplate],
    /// Instantiation collaborator.
    pub scene: &'a mut S,
    /// Notification bus.
    pub events: &'a mut EventBus,
}

/// Drives the wave cycle.
#[derive(Debug, Clone)]
pub struct WaveScheduler {
    table: WaveTable,
    tick_rate: u32,
    countdown_ticks: u64,
    phase: SchedulerPhase,
    state: WaveRunState,
    last_announced: Option<u32>,
}

impl WaveScheduler {
    /// New idle scheduler.
    #[must_use]
    pub fn new(table: WaveTable, tick_rate: u32, countdown_seconds: u32) -> Self {
        Self {
            table,
            tick_rate: tick_rate.max(1),
            countdown_ticks: u64::from(countdown_seconds) * u64::from(tick_rate.max(1)),
            phase: SchedulerPhase::Idle,
            state: WaveRunState::default(),
            last_announced: None,
        }
    }

    /// Tier table.
    #[must_use]
    pub fn table(&self) -> &WaveTable {
        &self.table
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> SchedulerPhase {
        self.phase
    }

    /// Run state snapshot.
    #[must_use]
    pub const fn run_state(&self) -> WaveRunState {
        self.state
    }

    /// Last wave started; 0 before the first.
    #[must_use]
    pub const fn current_wave(&self) -> u32 {
        self.state.current_wave
    }

    /// Whether the countdown is frozen.
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.state.is_paused
    }

    /// Whole seconds left in the countdown, rounded up.
    #[must_use]
    pub fn countdown_seconds(&self) -> Option<u32> {
        self.state
            .countdown_remaining
            .map(|ticks| self.seconds_for(ticks))
    }

    fn seconds_for(&self, ticks: u64) -> u32 {
        u32::try_from(ticks.div_ceil(u64::from(self.tick_rate))).unwrap_or(u32::MAX)
    }

    /// Start wave `wave`: announce it, spawn it, announce the population.
    ///
    /// Does nothing (beyond a warning) if no tier governs `wave`. A wave
    /// that ends up with nobody alive completes immediately.
    pub fn start_wave<S: Instantiation + ?Sized>(&mut self, wave: u32, ctx: &mut WaveContext<'_, S>) {
        let Some(composition) = self.table.composition(wave) else {
            warn!(wave, "no tier governs wave; not starting it");
            return;
        };

        self.state.current_wave = wave;
        self.state.countdown_remaining = None;
        self.last_announced = None;
        self.phase = SchedulerPhase::Spawning;

        info!(wave, total = composition.total_count, "starting wave");
        ctx.events.publish(WaveEvent::WaveChanged { wave });

        spawn_wave(&composition, ctx);

        let living = ctx.pool.living_count();
        ctx.events.publish(WaveEvent::PopulationChanged { living });
        self.phase = SchedulerPhase::WaveActive;

        if living == 0 {
            info!(wave, "wave spawned nobody; completing it");
            self.on_wave_complete(ctx.events);
        }
    }

    /// The live set emptied: (re)start the countdown to the next wave.
    pub fn on_wave_complete(&mut self, events: &mut EventBus) {
        let seconds = self.seconds_for(self.countdown_ticks);
        self.state.countdown_remaining = Some(self.countdown_ticks);
        self.last_announced = Some(seconds);
        self.phase = SchedulerPhase::Countdown;

        info!(wave = self.state.current_wave, seconds, "wave complete");
        events.publish(WaveEvent::CountdownTick {
            seconds_remaining: seconds,
        });
    }

    /// Advance the countdown by one tick, starting the next wave on expiry.
    pub fn tick<S: Instantiation + ?Sized>(&mut self, ctx: &mut WaveContext<'_, S>) {
        if self.state.is_paused {
            return;
        }
        let Some(remaining) = self.state.countdown_remaining else {
            return;
        };

        let remaining = remaining.saturating_sub(1);
        if remaining == 0 {
            self.state.countdown_remaining = None;
            self.last_announced = None;
            ctx.events.publish(WaveEvent::CountdownTick {
                seconds_remaining: 0,
            });
            self.advance(ctx);
            return;
        }

        self.state.countdown_remaining = Some(remaining);
        let seconds = self.seconds_for(remaining);
        if self.last_announced != Some(seconds) {
            self.last_announced = Some(seconds);
            ctx.events.publish(WaveEvent::CountdownTick {
                seconds_remaining: seconds,
            });
        }
    }

    /// Flip the pause flag. The countdown is kept, only frozen.
    pub fn toggle_pause(&mut self) -> bool {
        self.state.is_paused = !self.state.is_paused;
        info!(paused = self.state.is_paused, "toggled pause");
        self.state.is_paused
    }

    /// Drop any countdown silently and start the next wave now.
    pub fn force_next_wave<S: Instantiation + ?Sized>(&mut self, ctx: &mut WaveContext<'_, S>) {
        self.state.countdown_remaining = None;
        self.last_announced = None;
        self.advance(ctx);
    }

    fn advance<S: Instantiation + ?Sized>(&mut self, ctx: &mut WaveContext<'_, S>) {
        match self.state.current_wave.checked_add(1) {
            Some(next) => self.start_wave(next, ctx),
            None => warn!("wave counter exhausted"),
        }
    }
}

fn spawn_wave<S: Instantiation + ?Sized>(composition: &WaveComposition, ctx: &mut WaveContext<'_, S>) {
    let allocations = match allocate(composition.total_count, composition.melee_percent, ctx.locations) {
        Ok(allocations) => allocations,
        Err(err) => {
            warn!(wave = composition.wave, %err, "cannot spawn wave");
            return;
        }
    };

    for (location, allocation) in ctx.locations.iter().zip(&allocations) {
        for kind in HostileKind::ALL {
            for _ in 0..allocation.count(kind) {
                let spawned = ctx.pool.acquire(
                    kind,
                    location,
                    ctx.templates,
                    &mut *ctx.rng,
                    &mut *ctx.registry,
                    &mut *ctx.scene,
                );
                if let Err(err) = spawned {
                    warn!(wave = composition.wave, ?kind, %err, "skipping spawn group");
                    break;
                }
            }
        }
    }
}
