//! Entity data model

use crate::ai::AiState;
use crate::damage::{ContactDamage, DamageModifier, DAMAGE_TYPE_COUNT};
use crate::handle::{EnchantHandle, EntityHandle};
use crate::inventory::Inventory;
use crate::math::{Facing, Vec3};
use crate::profile::{Idsz, Profile, ProfileId};
use crate::team::TeamId;
use serde::{Deserialize, Serialize};

/// Collision volume: an octagonal prism standing on the entity's position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bumper {
    /// Half-width along the x and y axes.
    pub size: f32,
    /// Half-width along the two diagonals.
    pub size_big: f32,
    pub height: f32,
}

impl Bumper {
    pub fn new(size: f32, height: f32) -> Self {
        Self {
            size,
            size_big: size * std::f32::consts::SQRT_2,
            height,
        }
    }
}

impl Default for Bumper {
    fn default() -> Self {
        Self::new(30.0, 60.0)
    }
}

/// Which hand an item is held in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hand {
    Left = 0,
    Right = 1,
}

impl Hand {
    pub const BOTH: [Hand; 2] = [Hand::Left, Hand::Right];

    pub fn from_i32(value: i32) -> Hand {
        if value == 0 {
            Hand::Left
        } else {
            Hand::Right
        }
    }

    pub fn other(self) -> Hand {
        match self {
            Hand::Left => Hand::Right,
            Hand::Right => Hand::Left,
        }
    }
}

/// Stat block. Life, mana, their returns and the four attributes are 8.8
/// fixed point; money, experience and level are plain integers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub life: i32,
    pub life_max: i32,
    pub life_return: i32,
    pub mana: i32,
    pub mana_max: i32,
    pub mana_return: i32,
    pub strength: i32,
    pub wisdom: i32,
    pub intelligence: i32,
    pub dexterity: i32,
    pub money: i32,
    pub experience: i32,
    pub level: i32,
}

impl Stats {
    /// Keep life and mana inside `[0, max]`.
    pub fn clamp(&mut self) {
        self.life_max = self.life_max.max(0);
        self.mana_max = self.mana_max.max(0);
        self.life = self.life.clamp(0, self.life_max);
        self.mana = self.mana.clamp(0, self.mana_max);
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicsProps {
    pub weight: f32,
    pub dampen: f32,
    pub bump_dampen: f32,
    pub platform: bool,
    pub can_use_platforms: bool,
    pub flying: bool,
    pub speed: f32,
}

impl PhysicsProps {
    /// Inverse mass used to split collision corrections.
    pub fn inverse_mass(&self, min_extent: f32) -> f32 {
        if self.weight >= crate::profile::WEIGHT_IMMOVABLE || !self.weight.is_finite() {
            0.0
        } else {
            self.bump_dampen.clamp(0.0, 1.0) / self.weight.max(min_extent)
        }
    }
}

/// Item-specific properties.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemProps {
    pub is_item: bool,
    pub kursed: bool,
    pub stackable: bool,
    pub ammo: i32,
    pub ammo_max: i32,
    pub equipped: bool,
}

#[derive(Debug, Clone)]
pub struct Entity {
    pub profile: ProfileId,
    pub class_name: String,
    pub ids: [Idsz; 2],
    /// Creation order; stable across slot reuse.
    pub serial: u64,
    /// Tick on which the entity was spawned.
    pub spawn_tick: u64,
    pub pos: Vec3,
    pub old_pos: Vec3,
    pub vel: Vec3,
    pub spawn_pos: Vec3,
    pub facing: Facing,
    pub bumper: Bumper,
    pub team: TeamId,
    pub base_team: TeamId,
    pub alive: bool,
    pub terminate_requested: bool,
    pub skin: u8,
    pub stats: Stats,
    pub phys: PhysicsProps,
    pub item: ItemProps,
    pub held: [Option<EntityHandle>; 2],
    pub inventory: Inventory,
    /// Holder when this entity is an item in someone's hand.
    pub attached_to: Option<EntityHandle>,
    /// Owner when this entity is packed in someone's inventory.
    pub in_pack_of: Option<EntityHandle>,
    pub on_platform: Option<EntityHandle>,
    pub on_ground: bool,
    pub damage_mods: [DamageModifier; DAMAGE_TYPE_COUNT],
    pub defense: u8,
    pub invictus: bool,
    pub contact_damage: Option<ContactDamage>,
    pub experience_value: i32,
    pub enchants: Vec<EnchantHandle>,
    pub ai: AiState,
}

impl Entity {
    /// Instantiate a profile at a position.
    pub fn from_profile(id: ProfileId, profile: &Profile, pos: Vec3, team: TeamId) -> Self {
        let stats = Stats {
            life: profile.life,
            life_max: profile.life,
            life_return: profile.life_return,
            mana: profile.mana,
            mana_max: profile.mana,
            mana_return: profile.mana_return,
            strength: profile.strength,
            wisdom: profile.wisdom,
            intelligence: profile.intelligence,
            dexterity: profile.dexterity,
            money: profile.money,
            experience: 0,
            level: 1,
        };
        Self {
            profile: id,
            class_name: profile.class_name.clone(),
            ids: [profile.parent_id, profile.type_id],
            serial: 0,
            spawn_tick: 0,
            pos,
            old_pos: pos,
            vel: Vec3::ZERO,
            spawn_pos: pos,
            facing: 0,
            bumper: profile.bumper,
            team,
            base_team: team,
            alive: true,
            terminate_requested: false,
            skin: 0,
            stats,
            phys: PhysicsProps {
                weight: profile.weight,
                dampen: profile.dampen,
                bump_dampen: profile.bump_dampen,
                platform: profile.platform,
                can_use_platforms: profile.can_use_platforms,
                flying: profile.flying,
                speed: profile.speed,
            },
            item: profile.item,
            held: [None; 2],
            inventory: Inventory::default(),
            attached_to: None,
            in_pack_of: None,
            on_platform: None,
            on_ground: false,
            damage_mods: profile.damage_mods,
            defense: profile.defense,
            invictus: profile.invictus,
            contact_damage: profile.contact_damage,
            experience_value: profile.experience_value,
            enchants: Vec::new(),
            ai: AiState::default(),
        }
    }

    pub fn held(&self, hand: Hand) -> Option<EntityHandle> {
        self.held[hand as usize]
    }

    /// Free-floating: not held in a hand and not packed away.
    pub fn is_free(&self) -> bool {
        self.attached_to.is_none() && self.in_pack_of.is_none()
    }

    /// Eligible for physics and scripts this tick.
    pub fn is_active(&self) -> bool {
        !self.terminate_requested
    }

    pub fn has_id(&self, id: Idsz) -> bool {
        id != crate::profile::IDSZ_NONE && self.ids.contains(&id)
    }

    /// Top surface height, used for platforms.
    pub fn top(&self) -> f32 {
        self.pos.z + self.bumper.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_profile_copies_stats() {
        let mut profile = Profile::named("Goblin");
        profile.life = 20 << 8;
        profile.platform = true;
        let entity = Entity::from_profile(ProfileId(3), &profile, Vec3::ONE, TeamId::EVIL);
        assert_eq!(entity.stats.life, entity.stats.life_max);
        assert!(entity.phys.platform);
        assert!(entity.is_free());
        assert_eq!(entity.team, TeamId::EVIL);
    }

    #[test]
    fn immovable_has_zero_inverse_mass() {
        let mut profile = Profile::named("Door");
        profile.weight = crate::profile::WEIGHT_IMMOVABLE;
        let entity = Entity::from_profile(ProfileId(0), &profile, Vec3::ZERO, TeamId::NULL);
        assert_eq!(entity.phys.inverse_mass(0.001), 0.0);
    }

    #[test]
    fn stats_clamp() {
        let mut stats = Stats {
            life: -50,
            life_max: 100,
            mana: 500,
            mana_max: 10,
            ..Stats::default()
        };
        stats.clamp();
        assert_eq!(stats.life, 0);
        assert_eq!(stats.mana, 10);
    }
}
