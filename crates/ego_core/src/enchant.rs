//! Enchantments
//!
//! An enchant binds a definition to a target entity. Stat modifiers are
//! additive and remembered exactly as applied, so removal restores the
//! target even when a clamp cut the original change short.

use crate::arena::Arena;
use crate::handle::{EnchantHandle, EntityHandle};
use crate::world::World;
use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnchantId(pub u16);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnchantDef {
    pub name: String,
    /// Lifetime in ticks; `None` lasts until removed.
    pub duration: Option<u32>,
    /// Life taken from the target each second (8.8); negative heals.
    pub life_drain: i32,
    pub mana_drain: i32,
    pub strength: i32,
    pub wisdom: i32,
    pub intelligence: i32,
    pub dexterity: i32,
    pub life_max: i32,
    pub mana_max: i32,
    pub defense: i32,
    pub remove_when_owner_dies: bool,
}

/// Deltas actually written to the target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Applied {
    strength: i32,
    wisdom: i32,
    intelligence: i32,
    dexterity: i32,
    life_max: i32,
    mana_max: i32,
    defense: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Enchant {
    pub def: EnchantId,
    pub target: EntityHandle,
    pub owner: Option<EntityHandle>,
    pub remaining: Option<u32>,
    applied: Applied,
}

#[derive(Debug, Clone, Default)]
pub struct EnchantStore {
    defs: Vec<EnchantDef>,
    arena: Arena<EnchantHandle, Enchant>,
}

impl EnchantStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, def: EnchantDef) -> EnchantId {
        let id = EnchantId(self.defs.len() as u16);
        tracing::debug!(name = %def.name, id = id.0, "registered enchant");
        self.defs.push(def);
        id
    }

    pub fn def(&self, id: EnchantId) -> Option<&EnchantDef> {
        self.defs.get(id.0 as usize)
    }

    pub fn get(&self, handle: EnchantHandle) -> Option<&Enchant> {
        self.arena.get(handle)
    }

    pub fn exists(&self, handle: EnchantHandle) -> bool {
        self.arena.contains(handle)
    }

    pub fn iter(&self) -> impl Iterator<Item = (EnchantHandle, &Enchant)> {
        self.arena.iter()
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }
}

impl World {
    /// Enchant `target` with definition `id`.
    pub fn enchant_add(&mut self, id: EnchantId, target: EntityHandle, owner: Option<EntityHandle>) -> Option<EnchantHandle> {
        let def = self.enchants.def(id)?.clone();
        let entity = self.entities.get_mut(target)?;
        if !entity.alive {
            return None;
        }

        let stats = &mut entity.stats;
        let (old_life_max, old_mana_max) = (stats.life_max, stats.mana_max);
        stats.strength += def.strength;
        stats.wisdom += def.wisdom;
        stats.intelligence += def.intelligence;
        stats.dexterity += def.dexterity;
        stats.life_max = (stats.life_max + def.life_max).max(1);
        stats.mana_max = (stats.mana_max + def.mana_max).max(0);
        let applied_life_max = stats.life_max - old_life_max;
        let applied_mana_max = stats.mana_max - old_mana_max;
        stats.clamp();
        let defense = (entity.defense as i32 + def.defense).clamp(0, 255);
        let applied = Applied {
            strength: def.strength,
            wisdom: def.wisdom,
            intelligence: def.intelligence,
            dexterity: def.dexterity,
            life_max: applied_life_max,
            mana_max: applied_mana_max,
            defense: defense - entity.defense as i32,
        };
        entity.defense = defense as u8;

        let handle = self.enchants.arena.insert(Enchant {
            def: id,
            target,
            owner,
            remaining: def.duration,
            applied,
        });
        entity.enchants.push(handle);
        tracing::trace!(?target, ?owner, enchant = %def.name, "enchant added");
        Some(handle)
    }

    /// Remove an enchant and revert its modifiers.
    pub fn enchant_remove(&mut self, handle: EnchantHandle) -> bool {
        let Some(enchant) = self.enchants.arena.remove(handle) else {
            return false;
        };
        if let Some(entity) = self.entities.get_mut(enchant.target) {
            let applied = enchant.applied;
            let stats = &mut entity.stats;
            stats.strength -= applied.strength;
            stats.wisdom -= applied.wisdom;
            stats.intelligence -= applied.intelligence;
            stats.dexterity -= applied.dexterity;
            stats.life_max = (stats.life_max - applied.life_max).max(1);
            stats.mana_max = (stats.mana_max - applied.mana_max).max(0);
            stats.clamp();
            entity.defense = (entity.defense as i32 - applied.defense).clamp(0, 255) as u8;
            entity.enchants.retain(|other| *other != handle);
        }
        tracing::trace!(?handle, "enchant removed");
        true
    }

    /// Remove enchants cast by `owner`; with `only_flagged`, only those that
    /// end with their owner.
    pub fn enchant_remove_owned_by(&mut self, owner: EntityHandle, only_flagged: bool) -> usize {
        let doomed: Vec<EnchantHandle> = self
            .enchants
            .iter()
            .filter(|(_, enchant)| enchant.owner == Some(owner))
            .filter(|(_, enchant)| {
                !only_flagged
                    || self
                        .enchants
                        .def(enchant.def)
                        .is_some_and(|def| def.remove_when_owner_dies)
            })
            .map(|(handle, _)| handle)
            .collect();
        doomed.iter().filter(|handle| self.enchant_remove(**handle)).count()
    }

    /// Does `target` carry an enchant, optionally of a given definition?
    pub fn has_enchant(&self, target: EntityHandle, id: Option<EnchantId>) -> bool {
        let Some(entity) = self.entities.get(target) else {
            return false;
        };
        entity.enchants.iter().any(|handle| {
            self.enchants
                .get(*handle)
                .is_some_and(|enchant| id.map_or(true, |id| enchant.def == id))
        })
    }

    /// Count down durations and apply per-second drains.
    pub fn update_enchants(&mut self, second_boundary: bool) {
        let handles: Vec<EnchantHandle> = self.enchants.iter().map(|(handle, _)| handle).collect();
        for handle in handles {
            let Some(enchant) = self.enchants.arena.get_mut(handle) else {
                continue;
            };
            let (target, owner, def_id) = (enchant.target, enchant.owner, enchant.def);
            if !self.entities.exists(target) {
                self.enchants.arena.remove(handle);
                continue;
            }
            if let Some(remaining) = enchant.remaining.as_mut() {
                *remaining = remaining.saturating_sub(1);
                if *remaining == 0 {
                    self.enchant_remove(handle);
                    continue;
                }
            }
            if !second_boundary {
                continue;
            }
            let Some(def) = self.enchants.def(def_id) else {
                continue;
            };
            let (life_drain, mana_drain) = (def.life_drain, def.mana_drain);
            if mana_drain != 0 {
                if let Some(entity) = self.entities.get_mut(target) {
                    entity.stats.mana = entity.stats.mana.saturating_sub(mana_drain).clamp(0, entity.stats.mana_max);
                }
            }
            if life_drain < 0 {
                self.heal(target, -life_drain);
            } else if life_drain > 0 {
                let dead = self.entities.get_mut(target).is_some_and(|entity| {
                    if !entity.alive {
                        return false;
                    }
                    entity.stats.life = entity.stats.life.saturating_sub(life_drain).clamp(0, entity.stats.life_max);
                    entity.stats.life == 0
                });
                if dead {
                    self.kill(target, owner);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{int_to_fp8, Vec3, FACE_NORTH};
    use crate::profile::Profile;

    fn world_with_target() -> (World, EntityHandle) {
        let mut world = World::default();
        let profile = world.profiles.register(Profile::named("Target"));
        let target = world.spawn(profile, Vec3::ZERO, None, 0, FACE_NORTH).expect("spawn");
        (world, target)
    }

    #[test]
    fn removal_reverts_modifiers() {
        let (mut world, target) = world_with_target();
        let before = world.entities.get(target).expect("target").stats;
        let id = world.enchants.register(EnchantDef {
            name: "Might".into(),
            strength: int_to_fp8(5),
            life_max: int_to_fp8(10),
            defense: 300,
            ..EnchantDef::default()
        });
        let handle = world.enchant_add(id, target, None).expect("enchanted");
        let during = world.entities.get(target).expect("target");
        assert_eq!(during.stats.strength, before.strength + int_to_fp8(5));
        assert_eq!(during.defense, 255);
        assert!(world.has_enchant(target, Some(id)));

        assert!(world.enchant_remove(handle));
        let after = world.entities.get(target).expect("target");
        assert_eq!(after.stats.strength, before.strength);
        assert_eq!(after.stats.life_max, before.life_max);
        assert_eq!(after.defense, 0);
        assert!(!world.has_enchant(target, None));
    }

    #[test]
    fn duration_expires() {
        let (mut world, target) = world_with_target();
        let id = world.enchants.register(EnchantDef {
            duration: Some(2),
            ..EnchantDef::default()
        });
        world.enchant_add(id, target, None).expect("enchanted");
        world.update_enchants(false);
        assert!(world.has_enchant(target, Some(id)));
        world.update_enchants(false);
        assert!(!world.has_enchant(target, Some(id)));
        assert!(world.enchants.is_empty());
    }

    #[test]
    fn drain_can_kill() {
        let (mut world, target) = world_with_target();
        let id = world.enchants.register(EnchantDef {
            life_drain: int_to_fp8(100),
            ..EnchantDef::default()
        });
        world.enchant_add(id, target, None).expect("enchanted");
        world.update_enchants(true);
        let entity = world.entities.get(target).expect("target");
        assert!(!entity.alive);
        assert_eq!(entity.stats.life, 0);
    }
}
