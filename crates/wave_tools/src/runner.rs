//! Headless simulation runs.
//!
//! [`LinearMovement`] stands in for a navigation system: hostiles walk in a
//! straight line at a fixed speed and arrive when they reach their
//! destination exactly.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info};
use wave_core::combat::{DamageOutcome, Damageable};
use wave_core::components::{EntityId, HostileKind};
use wave_core::config::SimConfig;
use wave_core::defenders::DefenderKind;
use wave_core::events::WaveEvent;
use wave_core::math::{Fixed, Vec2Fixed};
use wave_core::scene::{Cue, Instantiation, Movement, Presentation};
use wave_core::simulation::Simulation;

use crate::validate::ToolResult;

#[derive(Debug, Clone, Copy)]
struct Walker {
    position: Vec2Fixed,
    destination: Option<Vec2Fixed>,
}

/// Scene that moves hostiles in straight lines.
///
/// Entities it never created (defenders) count as arrived.
#[derive(Debug, Clone)]
pub struct LinearMovement {
    speed: Fixed,
    walkers: BTreeMap<EntityId, Walker>,
    cues: BTreeMap<Cue, u64>,
}

impl LinearMovement {
    /// Movement at `speed` units per tick.
    #[must_use]
    pub fn new(speed: Fixed) -> Self {
        Self {
            speed,
            walkers: BTreeMap::new(),
            cues: BTreeMap::new(),
        }
    }

    /// Current position of a walker.
    #[must_use]
    pub fn position(&self, entity: EntityId) -> Option<Vec2Fixed> {
        self.walkers.get(&entity).map(|w| w.position)
    }

    /// Times `cue` was played.
    #[must_use]
    pub fn cue_count(&self, cue: Cue) -> u64 {
        self.cues.get(&cue).copied().unwrap_or(0)
    }

    /// Move every walker one step. Returns the walkers that moved and
    /// where they are now.
    pub fn advance(&mut self) -> Vec<(EntityId, Vec2Fixed)> {
        let mut moved = Vec::new();
        for (&entity, walker) in &mut self.walkers {
            let Some(destination) = walker.destination else {
                continue;
            };
            if walker.position == destination {
                continue;
            }

            let offset = destination - walker.position;
            walker.position = if offset.length() <= self.speed {
                destination
            } else {
                walker.position + offset.normalize().scale(self.speed)
            };
            moved.push((entity, walker.position));
        }
        moved
    }
}

impl Movement for LinearMovement {
    fn set_destination(&mut self, entity: EntityId, position: Vec2Fixed) {
        if let Some(walker) = self.walkers.get_mut(&entity) {
            walker.destination = Some(position);
        }
    }

    fn has_arrived(&self, entity: EntityId) -> bool {
        self.walkers
            .get(&entity)
            .map_or(true, |w| w.destination.map_or(true, |d| d == w.position))
    }

    fn halt_and_hold(&mut self, entity: EntityId) {
        if let Some(walker) = self.walkers.get_mut(&entity) {
            walker.destination = None;
        }
    }
}

impl Presentation for LinearMovement {
    fn play_cue(&mut self, _entity: EntityId, cue: Cue) {
        *self.cues.entry(cue).or_insert(0) += 1;
    }
}

impl Instantiation for LinearMovement {
    fn create_instance(&mut self, entity: EntityId, _kind: HostileKind, _prefab: &str, position: Vec2Fixed) {
        self.walkers.insert(
            entity,
            Walker {
                position,
                destination: None,
            },
        );
    }

    fn reactivate_instance(&mut self, entity: EntityId, position: Vec2Fixed) {
        self.walkers.insert(
            entity,
            Walker {
                position,
                destination: None,
            },
        );
    }

    fn deactivate_instance(&mut self, entity: EntityId) {
        self.walkers.remove(&entity);
    }
}

/// Options for [`run`].
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    /// Ticks to simulate after the first wave spawns.
    pub ticks: u64,
    /// Replaces the config seed when set.
    pub seed: Option<u64>,
    /// Hostile walking speed in units per tick.
    pub speed: Fixed,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            ticks: 1_200,
            seed: None,
            speed: Fixed::from_num(0.5),
        }
    }
}

/// A wave event stamped with the tick it was published on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimedEvent {
    /// Simulation tick.
    pub tick: u64,
    /// The event.
    pub event: WaveEvent,
}

/// Totals from a headless run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Seed the run used.
    pub seed: u64,
    /// Ticks simulated.
    pub ticks: u64,
    /// Last wave started.
    pub final_wave: u32,
    /// Hostiles alive at the end.
    pub living: usize,
    /// Hostile bodies ever created.
    pub hostiles_created: usize,
    /// Strikes resolved.
    pub strikes: usize,
    /// Strikes that dealt damage.
    pub damaging_strikes: usize,
    /// Hostiles killed.
    pub hostile_deaths: usize,
    /// Towers destroyed.
    pub towers_destroyed: usize,
    /// Towers still standing.
    pub towers_standing: usize,
    /// State hash at the end.
    pub state_hash: u64,
    /// Every wave event in publish order; serialized separately.
    #[serde(skip)]
    pub events: Vec<TimedEvent>,
}

/// Run `config` headless for `options.ticks` ticks.
///
/// # Errors
///
/// Returns [`crate::ToolError::Config`] if the simulation rejects the config.
pub fn run(mut config: SimConfig, options: &RunOptions) -> ToolResult<RunSummary> {
    if let Some(seed) = options.seed {
        config.seed = seed;
    }
    let seed = config.seed;

    let mut sim = Simulation::new(config)?;
    let mut scene = LinearMovement::new(options.speed);
    sim.start(&mut scene);

    let mut events: Vec<TimedEvent> = sim
        .drain_events()
        .into_iter()
        .map(|event| TimedEvent { tick: 0, event })
        .collect();
    let mut strikes = 0;
    let mut damaging_strikes = 0;
    let mut hostile_deaths = 0;
    let mut towers_destroyed = 0;

    for _ in 0..options.ticks {
        let tick = sim.get_tick();
        let outcome = sim.tick(&mut scene);

        for (entity, position) in scene.advance() {
            sim.set_position(entity, position)?;
        }

        strikes += outcome.strikes.len();
        damaging_strikes += outcome
            .strikes
            .iter()
            .filter(|s| s.outcome != DamageOutcome::Ignored)
            .count();
        hostile_deaths += outcome.deaths.len();
        towers_destroyed += outcome.destroyed_towers.len();

        for event in sim.drain_events() {
            debug!(tick, ?event, "wave event");
            events.push(TimedEvent { tick, event });
        }
    }

    let summary = RunSummary {
        seed,
        ticks: options.ticks,
        final_wave: sim.current_wave(),
        living: sim.living_count(),
        hostiles_created: sim.pool().total_created(),
        strikes,
        damaging_strikes,
        hostile_deaths,
        towers_destroyed,
        towers_standing: sim
            .defenders()
            .filter(|d| d.kind() == DefenderKind::Tower && !d.is_destroyed())
            .count(),
        state_hash: sim.state_hash(),
        events,
    };
    info!(
        waves = summary.final_wave,
        deaths = summary.hostile_deaths,
        towers = summary.towers_standing,
        "run finished"
    );
    Ok(summary)
}
