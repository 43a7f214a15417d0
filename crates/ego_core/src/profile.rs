//! Spawn templates
//!
//! Profiles are parsed from module files by the surrounding shell; the core
//! only stores them and instantiates entities from them.

use crate::damage::{ContactDamage, DamageModifier, DAMAGE_TYPE_COUNT};
use crate::enchant::EnchantId;
use crate::entity::{Bumper, ItemProps};
use crate::particle::ParticleDef;
use crate::team::TeamId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProfileId(pub u16);

/// Index of a compiled script in the script library.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScriptId(pub u16);

/// Four-character identifier packed into 20 bits (5 bits per letter).
pub type Idsz = u32;

pub const IDSZ_NONE: Idsz = idsz("NONE");

/// Weight of scenery that collisions never displace.
pub const WEIGHT_IMMOVABLE: f32 = f32::MAX;

/// Pack a four-character identifier; characters outside `A..=_` wrap.
pub const fn idsz(text: &str) -> Idsz {
    let bytes = text.as_bytes();
    let mut packed = 0u32;
    let mut i = 0;
    while i < 4 {
        let c = if i < bytes.len() { bytes[i] } else { b'A' };
        let value = (c.to_ascii_uppercase().wrapping_sub(b'A') & 0x1F) as u32;
        packed = (packed << 5) | value;
        i += 1;
    }
    packed
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub class_name: String,
    /// Broad category id, e.g. `WEAP`.
    pub parent_id: Idsz,
    /// Specific type id, e.g. `SWOR`.
    pub type_id: Idsz,
    pub team: TeamId,
    /// 8.8 fixed point.
    pub life: i32,
    pub mana: i32,
    pub life_return: i32,
    pub mana_return: i32,
    pub strength: i32,
    pub wisdom: i32,
    pub intelligence: i32,
    pub dexterity: i32,
    pub money: i32,
    /// Experience granted to whoever kills this profile.
    pub experience_value: i32,
    pub bumper: Bumper,
    /// Mass for collision response; [`WEIGHT_IMMOVABLE`] never moves.
    pub weight: f32,
    /// Fraction of velocity kept on a bounce.
    pub dampen: f32,
    /// Fraction of a collision correction this entity accepts.
    pub bump_dampen: f32,
    pub platform: bool,
    pub can_use_platforms: bool,
    pub flying: bool,
    /// Walking speed toward waypoints, world units per tick.
    pub speed: f32,
    pub item: ItemProps,
    pub damage_mods: [DamageModifier; DAMAGE_TYPE_COUNT],
    /// 0..=255, scales incoming damage down.
    pub defense: u8,
    pub invictus: bool,
    pub contact_damage: Option<ContactDamage>,
    pub script: Option<ScriptId>,
    /// Enchant cast by `EnchantTarget` and friends.
    pub enchant: Option<EnchantId>,
    /// Particle kinds this profile can spawn, indexed by script argument.
    pub particles: Vec<ParticleDef>,
    pub skins: u8,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            class_name: String::new(),
            parent_id: IDSZ_NONE,
            type_id: IDSZ_NONE,
            team: TeamId::NULL,
            life: 10 << 8,
            mana: 0,
            life_return: 0,
            mana_return: 0,
            strength: 10 << 8,
            wisdom: 10 << 8,
            intelligence: 10 << 8,
            dexterity: 10 << 8,
            money: 0,
            experience_value: 10,
            bumper: Bumper::default(),
            weight: 100.0,
            dampen: 0.5,
            bump_dampen: 1.0,
            platform: false,
            can_use_platforms: true,
            flying: false,
            speed: 4.0,
            item: ItemProps::default(),
            damage_mods: [DamageModifier::default(); DAMAGE_TYPE_COUNT],
            defense: 0,
            invictus: false,
            contact_damage: None,
            script: None,
            enchant: None,
            particles: Vec::new(),
            skins: 1,
        }
    }
}

impl Profile {
    pub fn named(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            ..Self::default()
        }
    }

    pub fn has_id(&self, id: Idsz) -> bool {
        id != IDSZ_NONE && (self.parent_id == id || self.type_id == id)
    }
}

/// Registry of loaded profiles, indexed by [`ProfileId`].
#[derive(Debug, Clone, Default)]
pub struct ProfileRegistry {
    profiles: Vec<Profile>,
}

impl ProfileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, profile: Profile) -> ProfileId {
        let id = ProfileId(self.profiles.len() as u16);
        tracing::debug!(class = %profile.class_name, id = id.0, "registered profile");
        self.profiles.push(profile);
        id
    }

    pub fn get(&self, id: ProfileId) -> Option<&Profile> {
        self.profiles.get(id.0 as usize)
    }

    pub fn get_mut(&mut self, id: ProfileId) -> Option<&mut Profile> {
        self.profiles.get_mut(id.0 as usize)
    }

    pub fn find_by_class(&self, class_name: &str) -> Option<ProfileId> {
        self.profiles
            .iter()
            .position(|profile| profile.class_name == class_name)
            .map(|index| ProfileId(index as u16))
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}
