//! Entity store
//!
//! Wraps the entity arena with creation-order bookkeeping and two-phase
//! termination. `request_terminate` only flags an entity; slots are freed by
//! [`World::reap`](crate::world::World::reap) at the start of the next tick,
//! so a handle that was valid when a tick began stays readable until it
//! ends.

use crate::arena::Arena;
use crate::entity::Entity;
use crate::handle::EntityHandle;
use std::collections::HashSet;

#[derive(Debug, Clone, Default)]
pub struct EntityStore {
    arena: Arena<EntityHandle, Entity>,
    /// Live handles in creation order.
    order: Vec<EntityHandle>,
    pending: Vec<EntityHandle>,
    next_serial: u64,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, mut entity: Entity) -> EntityHandle {
        entity.serial = self.next_serial;
        self.next_serial += 1;
        let handle = self.arena.insert(entity);
        self.order.push(handle);
        handle
    }

    /// The handle refers to a stored entity, terminated or not.
    pub fn exists(&self, handle: EntityHandle) -> bool {
        self.arena.contains(handle)
    }

    /// Stored and not waiting to be reaped.
    pub fn is_active(&self, handle: EntityHandle) -> bool {
        self.arena.get(handle).is_some_and(Entity::is_active)
    }

    pub fn get(&self, handle: EntityHandle) -> Option<&Entity> {
        self.arena.get(handle)
    }

    pub fn get_mut(&mut self, handle: EntityHandle) -> Option<&mut Entity> {
        self.arena.get_mut(handle)
    }

    /// Two distinct entities at once.
    pub fn get2_mut(&mut self, a: EntityHandle, b: EntityHandle) -> Option<(&mut Entity, &mut Entity)> {
        self.arena.get2_mut(a, b)
    }

    /// Flag an entity for removal at the next reap.
    pub fn request_terminate(&mut self, handle: EntityHandle) -> bool {
        let Some(entity) = self.arena.get_mut(handle) else {
            return false;
        };
        if !entity.terminate_requested {
            entity.terminate_requested = true;
            self.pending.push(handle);
            tracing::trace!(?handle, "termination requested");
        }
        true
    }

    pub fn pending(&self) -> &[EntityHandle] {
        &self.pending
    }

    pub(crate) fn take_pending(&mut self) -> Vec<EntityHandle> {
        std::mem::take(&mut self.pending)
    }

    /// Free the slots of `handles`; returns how many were removed.
    pub(crate) fn remove_all(&mut self, handles: &[EntityHandle]) -> usize {
        let doomed: HashSet<EntityHandle> = handles.iter().copied().collect();
        let removed = handles
            .iter()
            .filter(|handle| self.arena.remove(**handle).is_some())
            .count();
        self.order.retain(|handle| !doomed.contains(handle));
        removed
    }

    /// Handles in creation order, including terminated ones.
    pub fn handles(&self) -> impl Iterator<Item = EntityHandle> + '_ {
        self.order.iter().copied()
    }

    /// Active handles in creation order, fixed at the time of the call.
    pub fn snapshot(&self) -> Vec<EntityHandle> {
        self.order
            .iter()
            .copied()
            .filter(|handle| self.is_active(*handle))
            .collect()
    }

    /// Entities in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityHandle, &Entity)> {
        self.order
            .iter()
            .filter_map(|handle| self.arena.get(*handle).map(|entity| (*handle, entity)))
    }

    /// Entities in slot order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (EntityHandle, &mut Entity)> {
        self.arena.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec3;
    use crate::profile::{Profile, ProfileId};
    use crate::team::TeamId;

    fn entity() -> Entity {
        Entity::from_profile(ProfileId(0), &Profile::named("Thing"), Vec3::ZERO, TeamId::NULL)
    }

    #[test]
    fn terminate_is_deferred() {
        let mut store = EntityStore::new();
        let a = store.insert(entity());
        let b = store.insert(entity());
        assert!(store.request_terminate(a));
        assert!(store.request_terminate(a));
        assert_eq!(store.pending(), &[a]);
        assert!(store.exists(a));
        assert!(!store.is_active(a));
        assert_eq!(store.snapshot(), vec![b]);

        let pending = store.take_pending();
        assert_eq!(store.remove_all(&pending), 1);
        assert!(!store.exists(a));

        // The freed slot is reused under a new generation.
        let c = store.insert(entity());
        assert_eq!(c.index(), a.index());
        assert_ne!(c, a);
        assert!(!store.exists(a));
        assert_eq!(store.handles().collect::<Vec<_>>(), vec![b, c]);
        assert!(store.get(c).expect("c").serial > store.get(b).expect("b").serial);
    }
}
