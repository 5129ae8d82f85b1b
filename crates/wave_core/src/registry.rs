//! Entity id allocation and the per-role live index.
//!
//! Targeting asks "which entities of role R are live", in a stable order.
//! The registry answers that without any scene-level tag lookup.

use std::collections::BTreeMap;

use crate::components::{EntityId, Role};

const fn slot(role: Role) -> usize {
    match role {
        Role::Hostile => 0,
        Role::Defender => 1,
    }
}

/// Issues ids and tracks which entities are live.
#[derive(Debug, Clone, Default)]
pub struct EntityRegistry {
    next_id: EntityId,
    roles: BTreeMap<EntityId, Role>,
    live: [Vec<EntityId>; 2],
}

impl EntityRegistry {
    /// Empty registry. The first id issued is 1.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a fresh id for `role` and mark it live.
    pub fn register(&mut self, role: Role) -> EntityId {
        self.next_id += 1;
        let id = self.next_id;
        self.roles.insert(id, role);
        self.live[slot(role)].push(id);
        id
    }

    /// Mark a known, inactive entity live again (appended to the order).
    ///
    /// Returns `false` for unknown or already live ids.
    pub fn reactivate(&mut self, id: EntityId) -> bool {
        let Some(&role) = self.roles.get(&id) else {
            return false;
        };
        let live = &mut self.live[slot(role)];
        if live.contains(&id) {
            return false;
        }
        live.push(id);
        true
    }

    /// Remove an entity from its live list. The id stays known.
    ///
    /// Returns `false` for unknown or already inactive ids.
    pub fn deactivate(&mut self, id: EntityId) -> bool {
        let Some(&role) = self.roles.get(&id) else {
            return false;
        };
        let live = &mut self.live[slot(role)];
        match live.iter().position(|&other| other == id) {
            Some(index) => {
                live.remove(index);
                true
            }
            None => false,
        }
    }

    /// Live entities of `role`, in activation order.
    #[must_use]
    pub fn live(&self, role: Role) -> &[EntityId] {
        &self.live[slot(role)]
    }

    /// Whether `id` is currently live.
    #[must_use]
    pub fn is_live(&self, id: EntityId) -> bool {
        self.roles
            .get(&id)
            .is_some_and(|&role| self.live[slot(role)].contains(&id))
    }

    /// Role an id was issued for.
    #[must_use]
    pub fn role_of(&self, id: EntityId) -> Option<Role> {
        self.roles.get(&id).copied()
    }

    /// Total ids ever issued.
    #[must_use]
    pub fn issued(&self) -> usize {
        self.roles.len()
    }
}
