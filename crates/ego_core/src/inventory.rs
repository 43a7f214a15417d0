//! Hands and backpack
//!
//! An item handle lives in at most one place at a time: the left hand, the
//! right hand, or one backpack slot. Held items carry `attached_to`, packed
//! items carry `in_pack_of`, and every operation here keeps both sides of
//! that link in step.

use crate::alert::AlertFlags;
use crate::entity::Hand;
use crate::handle::EntityHandle;
use crate::world::World;
use thiserror::Error;

pub const INVENTORY_SLOTS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InventoryError {
    #[error("inventory is full")]
    Full,
    #[error("slot {0} already holds an item")]
    SlotOccupied(usize),
    #[error("slot {0} is empty")]
    EmptySlot(usize),
    #[error("slot {0} is out of range")]
    InvalidSlot(usize),
    #[error("hand is already holding an item")]
    HandOccupied,
    #[error("hand is empty")]
    HandEmpty,
    #[error("item is kursed")]
    Kursed,
    #[error("entity is not an item")]
    NotAnItem,
    #[error("item is already held")]
    AlreadyHeld,
    #[error("item is already packed")]
    AlreadyPacked,
    #[error("owner does not exist")]
    MissingOwner,
    #[error("owner is carried by the item")]
    CarriedByItem,
}

/// Outcome of a successful add.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InventoryAdd {
    /// Stored whole in a slot.
    Stored { slot: usize },
    /// Fully merged into an existing stack; the item is terminated.
    Merged { into: EntityHandle },
    /// Topped up a stack; the item keeps the overflow and stays free.
    PartiallyMerged { into: EntityHandle, remaining: i32 },
}

/// Fixed-size backpack of optional item handles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Inventory {
    slots: [Option<EntityHandle>; INVENTORY_SLOTS],
}

impl Inventory {
    pub fn get(&self, slot: usize) -> Option<EntityHandle> {
        self.slots.get(slot).copied().flatten()
    }

    pub fn first_free(&self) -> Option<usize> {
        self.slots.iter().position(Option::is_none)
    }

    pub fn position(&self, item: EntityHandle) -> Option<usize> {
        self.slots.iter().position(|slot| *slot == Some(item))
    }

    pub fn contains(&self, item: EntityHandle) -> bool {
        self.position(item).is_some()
    }

    pub fn count(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn is_full(&self) -> bool {
        self.first_free().is_none()
    }

    /// Lazy, restartable view of the packed items as `(slot, item)`.
    pub fn iter(&self) -> impl Iterator<Item = (usize, EntityHandle)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(slot, item)| item.map(|item| (slot, item)))
    }

    fn put(&mut self, slot: usize, item: EntityHandle) -> Result<(), InventoryError> {
        match self.slots.get_mut(slot) {
            None => Err(InventoryError::InvalidSlot(slot)),
            Some(Some(_)) => Err(InventoryError::SlotOccupied(slot)),
            Some(cell) => {
                *cell = Some(item);
                Ok(())
            }
        }
    }

    fn take(&mut self, slot: usize) -> Result<EntityHandle, InventoryError> {
        match self.slots.get_mut(slot) {
            None => Err(InventoryError::InvalidSlot(slot)),
            Some(cell) => cell.take().ok_or(InventoryError::EmptySlot(slot)),
        }
    }

    pub(crate) fn forget(&mut self, item: EntityHandle) {
        for cell in self.slots.iter_mut() {
            if *cell == Some(item) {
                *cell = None;
            }
        }
    }
}

impl World {
    fn check_free_item(&self, owner: EntityHandle, item: EntityHandle) -> Result<(), InventoryError> {
        if !self.entities.exists(owner) {
            return Err(InventoryError::MissingOwner);
        }
        let entity = self.entities.get(item).ok_or(InventoryError::NotAnItem)?;
        if item == owner || !entity.item.is_item {
            return Err(InventoryError::NotAnItem);
        }
        if entity.attached_to.is_some() {
            return Err(InventoryError::AlreadyHeld);
        }
        if entity.in_pack_of.is_some() {
            return Err(InventoryError::AlreadyPacked);
        }
        if self.carriers(owner).any(|carrier| carrier == item) {
            return Err(InventoryError::CarriedByItem);
        }
        Ok(())
    }

    /// Holders and pack owners above `handle`, innermost first.
    pub fn carriers(&self, handle: EntityHandle) -> impl Iterator<Item = EntityHandle> + '_ {
        let limit = self.entities.len();
        std::iter::successors(self.carrier_of(handle), move |current| self.carrier_of(*current)).take(limit)
    }

    fn carrier_of(&self, handle: EntityHandle) -> Option<EntityHandle> {
        self.entities
            .get(handle)
            .and_then(|entity| entity.attached_to.or(entity.in_pack_of))
    }

    /// Stack in `owner`'s pack that `item` could merge into.
    pub fn has_stack(&self, owner: EntityHandle, item: EntityHandle) -> Option<(usize, EntityHandle)> {
        let candidate = self.entities.get(item)?;
        if !candidate.item.stackable {
            return None;
        }
        let profile = candidate.profile;
        self.find_item(owner, |handle, entity| {
            handle != item
                && entity.profile == profile
                && entity.item.stackable
                && entity.item.ammo < entity.item.ammo_max
        })
    }

    /// First packed item matching `predicate`.
    pub fn find_item<F>(&self, owner: EntityHandle, mut predicate: F) -> Option<(usize, EntityHandle)>
    where
        F: FnMut(EntityHandle, &crate::entity::Entity) -> bool,
    {
        let pack = &self.entities.get(owner)?.inventory;
        pack.iter().find(|(_, handle)| {
            self.entities
                .get(*handle)
                .is_some_and(|entity| predicate(*handle, entity))
        })
    }

    /// Put a free item into `owner`'s pack, merging stacks first.
    pub fn inventory_add(&mut self, owner: EntityHandle, item: EntityHandle) -> Result<InventoryAdd, InventoryError> {
        self.check_free_item(owner, item)?;

        if let Some((_, stack)) = self.has_stack(owner, item) {
            let (stack_entity, item_entity) = self
                .entities
                .get2_mut(stack, item)
                .ok_or(InventoryError::NotAnItem)?;
            let space = (stack_entity.item.ammo_max - stack_entity.item.ammo).max(0);
            let moved = space.min(item_entity.item.ammo.max(0));
            stack_entity.item.ammo += moved;
            item_entity.item.ammo -= moved;
            let remaining = item_entity.item.ammo;
            tracing::trace!(?owner, ?item, ?stack, moved, remaining, "merged stack");
            if remaining <= 0 {
                self.entities.request_terminate(item);
                return Ok(InventoryAdd::Merged { into: stack });
            }
            return Ok(InventoryAdd::PartiallyMerged {
                into: stack,
                remaining,
            });
        }

        let slot = self
            .entities
            .get(owner)
            .and_then(|entity| entity.inventory.first_free())
            .ok_or(InventoryError::Full)?;
        self.inventory_add_to_slot(owner, item, slot)?;
        Ok(InventoryAdd::Stored { slot })
    }

    /// Put a free item into a specific slot without stacking.
    pub fn inventory_add_to_slot(&mut self, owner: EntityHandle, item: EntityHandle, slot: usize) -> Result<(), InventoryError> {
        self.check_free_item(owner, item)?;
        let (owner_entity, item_entity) = self
            .entities
            .get2_mut(owner, item)
            .ok_or(InventoryError::MissingOwner)?;
        owner_entity.inventory.put(slot, item)?;
        item_entity.in_pack_of = Some(owner);
        item_entity.pos = owner_entity.pos;
        item_entity.vel = glam::Vec3::ZERO;
        item_entity.item.equipped = false;
        Ok(())
    }

    /// Take an item out of a slot, leaving it free at the owner's feet.
    pub fn inventory_remove(&mut self, owner: EntityHandle, slot: usize, ignore_kurse: bool) -> Result<EntityHandle, InventoryError> {
        let item = self
            .entities
            .get(owner)
            .ok_or(InventoryError::MissingOwner)?
            .inventory
            .get(slot)
            .ok_or(InventoryError::EmptySlot(slot))?;
        let kursed = self.entities.get(item).is_some_and(|entity| entity.item.kursed);
        let (owner_entity, item_entity) = self
            .entities
            .get2_mut(owner, item)
            .ok_or(InventoryError::NotAnItem)?;
        if kursed && !ignore_kurse {
            owner_entity.ai.raise(AlertFlags::NOTTAKENOUT);
            return Err(InventoryError::Kursed);
        }
        owner_entity.inventory.take(slot)?;
        item_entity.in_pack_of = None;
        item_entity.pos = owner_entity.pos;
        item_entity.ai.raise(AlertFlags::TAKENOUT);
        Ok(item)
    }

    /// Pick up a free item into an empty hand.
    pub fn grab(&mut self, owner: EntityHandle, item: EntityHandle, hand: Hand) -> Result<(), InventoryError> {
        self.check_free_item(owner, item)?;
        let (owner_entity, item_entity) = self
            .entities
            .get2_mut(owner, item)
            .ok_or(InventoryError::MissingOwner)?;
        if owner_entity.held(hand).is_some() {
            return Err(InventoryError::HandOccupied);
        }
        owner_entity.held[hand as usize] = Some(item);
        item_entity.attached_to = Some(owner);
        item_entity.pos = owner_entity.pos;
        item_entity.vel = glam::Vec3::ZERO;
        item_entity.team = owner_entity.team;
        item_entity.ai.raise(AlertFlags::GRABBED);
        Ok(())
    }

    /// Let go of the item in `hand`.
    pub fn drop_item(&mut self, owner: EntityHandle, hand: Hand, ignore_kurse: bool) -> Result<EntityHandle, InventoryError> {
        let owner_entity = self.entities.get(owner).ok_or(InventoryError::MissingOwner)?;
        let item = owner_entity.held(hand).ok_or(InventoryError::HandEmpty)?;
        let (owner_entity, item_entity) = self
            .entities
            .get2_mut(owner, item)
            .ok_or(InventoryError::NotAnItem)?;
        if item_entity.item.kursed && !ignore_kurse {
            owner_entity.ai.raise(AlertFlags::NOTDROPPED);
            return Err(InventoryError::Kursed);
        }
        owner_entity.held[hand as usize] = None;
        item_entity.attached_to = None;
        item_entity.pos = owner_entity.pos;
        item_entity.vel = owner_entity.vel;
        item_entity.team = item_entity.base_team;
        item_entity.item.equipped = false;
        item_entity.ai.raise(AlertFlags::DROPPED);
        Ok(item)
    }

    /// Move the item in `hand` into the pack.
    pub fn put_away(&mut self, owner: EntityHandle, hand: Hand, ignore_kurse: bool) -> Result<InventoryAdd, InventoryError> {
        let owner_entity = self.entities.get(owner).ok_or(InventoryError::MissingOwner)?;
        let item = owner_entity.held(hand).ok_or(InventoryError::HandEmpty)?;
        let kursed = self.entities.get(item).is_some_and(|entity| entity.item.kursed);
        if kursed && !ignore_kurse {
            if let Some(entity) = self.entities.get_mut(owner) {
                entity.ai.raise(AlertFlags::NOTPUTAWAY);
            }
            return Err(InventoryError::Kursed);
        }
        let stacks = self.has_stack(owner, item).is_some();
        if !stacks && self.entities.get(owner).is_some_and(|entity| entity.inventory.is_full()) {
            return Err(InventoryError::Full);
        }
        self.release_from_hand(owner, hand);
        let result = self.inventory_add(owner, item);
        match result {
            Ok(InventoryAdd::PartiallyMerged { .. }) | Err(_) => {
                // Overflow goes back into the hand it came from.
                self.reattach(owner, item, hand);
            }
            Ok(_) => {}
        }
        result
    }

    /// Move a packed item into an empty hand.
    pub fn take_out(&mut self, owner: EntityHandle, slot: usize, hand: Hand, ignore_kurse: bool) -> Result<EntityHandle, InventoryError> {
        let held = self
            .entities
            .get(owner)
            .ok_or(InventoryError::MissingOwner)?
            .held(hand);
        if held.is_some() {
            return Err(InventoryError::HandOccupied);
        }
        let item = self.inventory_remove(owner, slot, ignore_kurse)?;
        self.grab(owner, item, hand)?;
        Ok(item)
    }

    /// Exchange the item in `hand` with the item in `slot`; either may be empty.
    pub fn swap_item(&mut self, owner: EntityHandle, slot: usize, hand: Hand, ignore_kurse: bool) -> Result<(), InventoryError> {
        let owner_entity = self.entities.get(owner).ok_or(InventoryError::MissingOwner)?;
        if slot >= INVENTORY_SLOTS {
            return Err(InventoryError::InvalidSlot(slot));
        }
        let in_hand = owner_entity.held(hand);
        let in_slot = owner_entity.inventory.get(slot);
        if in_hand.is_none() && in_slot.is_none() {
            return Err(InventoryError::EmptySlot(slot));
        }
        let kursed = |handle: Option<EntityHandle>| {
            handle
                .and_then(|handle| self.entities.get(handle))
                .is_some_and(|entity| entity.item.kursed)
        };
        if !ignore_kurse {
            let flag = if kursed(in_hand) {
                Some(AlertFlags::NOTPUTAWAY)
            } else if kursed(in_slot) {
                Some(AlertFlags::NOTTAKENOUT)
            } else {
                None
            };
            if let Some(flag) = flag {
                if let Some(entity) = self.entities.get_mut(owner) {
                    entity.ai.raise(flag);
                }
                return Err(InventoryError::Kursed);
            }
        }

        let from_slot = match in_slot {
            Some(_) => Some(self.inventory_remove(owner, slot, true)?),
            None => None,
        };
        if let Some(item) = in_hand {
            self.release_from_hand(owner, hand);
            self.inventory_add_to_slot(owner, item, slot)?;
        }
        if let Some(item) = from_slot {
            self.grab(owner, item, hand)?;
        }
        Ok(())
    }

    fn release_from_hand(&mut self, owner: EntityHandle, hand: Hand) {
        let Some(item) = self.entities.get(owner).and_then(|entity| entity.held(hand)) else {
            return;
        };
        if let Some(entity) = self.entities.get_mut(owner) {
            entity.held[hand as usize] = None;
        }
        if let Some(entity) = self.entities.get_mut(item) {
            entity.attached_to = None;
        }
    }

    fn reattach(&mut self, owner: EntityHandle, item: EntityHandle, hand: Hand) {
        if let Some((owner_entity, item_entity)) = self.entities.get2_mut(owner, item) {
            if owner_entity.held(hand).is_none() && item_entity.is_free() {
                owner_entity.held[hand as usize] = Some(item);
                item_entity.attached_to = Some(owner);
            }
        }
    }

    /// Undo every hand/pack link touching `handle`. Packed items are
    /// terminated with their owner; held items fall to the ground.
    pub(crate) fn unlink_all(&mut self, handle: EntityHandle) {
        for hand in Hand::BOTH {
            match self.drop_item(handle, hand, true) {
                Ok(_) | Err(InventoryError::HandEmpty) => {}
                Err(error) => tracing::warn!(?handle, ?hand, %error, "held item not released"),
            }
        }

        let packed: Vec<EntityHandle> = self
            .entities
            .get(handle)
            .map(|entity| entity.inventory.iter().map(|(_, item)| item).collect())
            .unwrap_or_default();
        for item in packed {
            self.entities.request_terminate(item);
        }

        let Some(entity) = self.entities.get(handle) else {
            return;
        };
        let holder = entity.attached_to;
        let pack_owner = entity.in_pack_of;
        if let Some(holder) = holder.and_then(|holder| self.entities.get_mut(holder)) {
            for slot in holder.held.iter_mut() {
                if *slot == Some(handle) {
                    *slot = None;
                }
            }
        }
        if let Some(owner) = pack_owner.and_then(|owner| self.entities.get_mut(owner)) {
            owner.inventory.forget(handle);
        }
        if let Some(entity) = self.entities.get_mut(handle) {
            entity.attached_to = None;
            entity.in_pack_of = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{Vec3, FACE_NORTH};
    use crate::profile::{Profile, ProfileId};

    fn setup() -> (World, EntityHandle, ProfileId) {
        let mut world = World::default();
        let hero = world.profiles.register(Profile::named("Hero"));
        let mut arrows = Profile::named("Arrows");
        arrows.item.is_item = true;
        arrows.item.stackable = true;
        arrows.item.ammo_max = 8;
        let arrows = world.profiles.register(arrows);
        let owner = world.spawn(hero, Vec3::ZERO, None, 0, FACE_NORTH).expect("spawn");
        (world, owner, arrows)
    }

    fn spawn_item(world: &mut World, profile: ProfileId, ammo: i32) -> EntityHandle {
        let handle = world.spawn(profile, Vec3::ZERO, None, 0, FACE_NORTH).expect("spawn");
        world.entities.get_mut(handle).expect("exists").item.ammo = ammo;
        handle
    }

    fn locations(world: &World, owner: EntityHandle, item: EntityHandle) -> usize {
        let entity = world.entities.get(owner).expect("owner");
        entity.held.iter().filter(|held| **held == Some(item)).count()
            + usize::from(entity.inventory.contains(item))
    }

    #[test]
    fn stack_overflow_stays_with_original_item() {
        let (mut world, owner, arrows) = setup();
        let stack = spawn_item(&mut world, arrows, 6);
        assert_eq!(world.inventory_add(owner, stack), Ok(InventoryAdd::Stored { slot: 0 }));

        let extra = spawn_item(&mut world, arrows, 5);
        assert_eq!(
            world.inventory_add(owner, extra),
            Ok(InventoryAdd::PartiallyMerged {
                into: stack,
                remaining: 3
            })
        );
        assert_eq!(world.entities.get(stack).expect("stack").item.ammo, 8);
        assert_eq!(world.entities.get(extra).expect("extra").item.ammo, 3);
        assert!(world.entities.get(extra).expect("extra").is_free());
    }

    #[test]
    fn full_merge_terminates_item() {
        let (mut world, owner, arrows) = setup();
        let stack = spawn_item(&mut world, arrows, 2);
        world.inventory_add(owner, stack).expect("stored");
        let extra = spawn_item(&mut world, arrows, 3);
        assert_eq!(world.inventory_add(owner, extra), Ok(InventoryAdd::Merged { into: stack }));
        assert!(world.entities.get(extra).expect("pending reap").terminate_requested);
    }

    #[test]
    fn occupied_slot_is_rejected() {
        let (mut world, owner, arrows) = setup();
        let first = spawn_item(&mut world, arrows, 8);
        let second = spawn_item(&mut world, arrows, 8);
        world.inventory_add_to_slot(owner, first, 2).expect("empty slot");
        assert_eq!(world.inventory_add_to_slot(owner, second, 2), Err(InventoryError::SlotOccupied(2)));
        assert!(world.entities.get(second).expect("second").is_free());
    }

    #[test]
    fn kursed_items_raise_alerts() {
        let (mut world, owner, arrows) = setup();
        let item = spawn_item(&mut world, arrows, 8);
        world.entities.get_mut(item).expect("item").item.kursed = true;
        world.grab(owner, item, Hand::Left).expect("grab");

        assert_eq!(world.put_away(owner, Hand::Left, false), Err(InventoryError::Kursed));
        assert!(world.entities.get(owner).expect("owner").ai.is_alerted(AlertFlags::NOTPUTAWAY));
        assert_eq!(locations(&world, owner, item), 1);

        world.put_away(owner, Hand::Left, true).expect("override");
        assert_eq!(world.inventory_remove(owner, 0, false), Err(InventoryError::Kursed));
        assert!(world.entities.get(owner).expect("owner").ai.is_alerted(AlertFlags::NOTTAKENOUT));
        assert_eq!(world.inventory_remove(owner, 0, true), Ok(item));
        assert!(world.entities.get(item).expect("item").is_free());
    }

    #[test]
    fn swap_keeps_locations_exclusive() {
        let (mut world, owner, arrows) = setup();
        let sword = spawn_item(&mut world, arrows, 8);
        let shield = spawn_item(&mut world, arrows, 8);
        world.grab(owner, sword, Hand::Right).expect("grab");
        world.inventory_add_to_slot(owner, shield, 4).expect("pack");

        world.swap_item(owner, 4, Hand::Right, false).expect("swap");
        let entity = world.entities.get(owner).expect("owner");
        assert_eq!(entity.held(Hand::Right), Some(shield));
        assert_eq!(entity.inventory.get(4), Some(sword));
        assert_eq!(locations(&world, owner, sword), 1);
        assert_eq!(locations(&world, owner, shield), 1);
        assert_eq!(world.entities.get(sword).expect("sword").in_pack_of, Some(owner));
        assert_eq!(world.entities.get(shield).expect("shield").attached_to, Some(owner));
    }

    #[test]
    fn items_cannot_carry_their_carrier() {
        let (mut world, owner, arrows) = setup();
        let bag = spawn_item(&mut world, arrows, 8);
        let knife = spawn_item(&mut world, arrows, 8);
        world.grab(bag, knife, Hand::Left).expect("bag holds knife");

        assert_eq!(world.inventory_add(knife, bag), Err(InventoryError::CarriedByItem));
        assert_eq!(world.grab(knife, bag, Hand::Right), Err(InventoryError::CarriedByItem));
        assert_eq!(world.inventory_add_to_slot(knife, bag, 0), Err(InventoryError::CarriedByItem));
        assert!(world.entities.get(bag).expect("bag").is_free());

        // Deeper chains are refused too.
        world.grab(owner, bag, Hand::Right).expect("owner holds bag");
        assert_eq!(world.carriers(knife).collect::<Vec<_>>(), vec![bag, owner]);
        let extra = spawn_item(&mut world, arrows, 8);
        world.grab(knife, extra, Hand::Left).expect("knife holds extra");
        assert_eq!(world.grab(extra, owner, Hand::Left), Err(InventoryError::NotAnItem));
        world.entities.get_mut(owner).expect("owner").item.is_item = true;
        assert_eq!(world.inventory_add(extra, owner), Err(InventoryError::CarriedByItem));

        world.sync_attached(owner);
        assert_eq!(locations(&world, bag, knife), 1);
    }

    #[test]
    fn find_item_by_predicate() {
        let (mut world, owner, arrows) = setup();
        let item = spawn_item(&mut world, arrows, 1);
        world.inventory_add_to_slot(owner, item, 3).expect("pack");
        assert_eq!(world.find_item(owner, |_, entity| entity.item.ammo == 1), Some((3, item)));
        assert_eq!(world.find_item(owner, |_, entity| entity.item.ammo == 2), None);
    }
}
