//! Collaborator traits implemented by whatever hosts the simulation.
//!
//! The core never moves entities, renders or plays animation. It asks a
//! [`Scene`] to do so and reads back arrival and positions.

use serde::{Deserialize, Serialize};

use crate::components::{EntityId, HostileKind};
use crate::math::Vec2Fixed;

/// Presentation cue, fire-and-forget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Cue {
    /// An entity struck its target.
    Attack,
    /// A hostile died.
    Death,
    /// A tower was destroyed.
    Destroyed,
}

/// Steering and arrival detection.
pub trait Movement {
    /// Start walking `entity` towards `position`.
    fn set_destination(&mut self, entity: EntityId, position: Vec2Fixed);

    /// Whether `entity` has reached its destination.
    fn has_arrived(&self, entity: EntityId) -> bool;

    /// Stop `entity` where it stands and keep it there.
    fn halt_and_hold(&mut self, entity: EntityId);
}

/// Animation and audio triggers.
pub trait Presentation {
    /// Play `cue` on `entity`.
    fn play_cue(&mut self, entity: EntityId, cue: Cue) {
        let _ = (entity, cue);
    }
}

/// Visual instance management for hostiles.
pub trait Instantiation {
    /// Create the visual for a brand-new hostile.
    fn create_instance(&mut self, entity: EntityId, kind: HostileKind, prefab: &str, position: Vec2Fixed);

    /// A pooled hostile was put back into play at `position`.
    fn reactivate_instance(&mut self, entity: EntityId, position: Vec2Fixed) {
        let _ = (entity, position);
    }

    /// A hostile was returned to the pool.
    fn deactivate_instance(&mut self, entity: EntityId) {
        let _ = entity;
    }
}

/// Everything the simulation needs from its host.
pub trait Scene: Movement + Presentation + Instantiation {}

impl<T: Movement + Presentation + Instantiation + ?Sized> Scene for T {}

/// Scene that does nothing and reports every entity as arrived.
///
/// Useful headless: hostiles strike their target on the tick after
/// acquiring it.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullScene;

impl Movement for NullScene {
    fn set_destination(&mut self, _entity: EntityId, _position: Vec2Fixed) {}

    fn has_arrived(&self, _entity: EntityId) -> bool {
        true
    }

    fn halt_and_hold(&mut self, _entity: EntityId) {}
}

impl Presentation for NullScene {}

impl Instantiation for NullScene {
    fn create_instance(&mut self, _entity: EntityId, _kind: HostileKind, _prefab: &str, _position: Vec2Fixed) {}
}
