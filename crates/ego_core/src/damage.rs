//! Damage, healing and death
//!
//! Damage amounts are 8.8 fixed point. Every path keeps `life` inside
//! `[0, life_max]`, and death fires exactly once when life reaches zero.

use crate::alert::AlertFlags;
use crate::handle::EntityHandle;
use crate::inventory::InventoryError;
use crate::math::{facing_within, Facing, SimRng, QUADRANT_HALF};
use crate::team::TeamId;
use crate::world::World;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

pub const DAMAGE_TYPE_COUNT: usize = 8;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamageType {
    #[default]
    Slash = 0,
    Crush = 1,
    Poke = 2,
    Holy = 3,
    Evil = 4,
    Fire = 5,
    Ice = 6,
    Zap = 7,
}

impl DamageType {
    pub const ALL: [DamageType; DAMAGE_TYPE_COUNT] = [
        DamageType::Slash,
        DamageType::Crush,
        DamageType::Poke,
        DamageType::Holy,
        DamageType::Evil,
        DamageType::Fire,
        DamageType::Ice,
        DamageType::Zap,
    ];

    pub fn from_i32(value: i32) -> Option<DamageType> {
        usize::try_from(value)
            .ok()
            .and_then(|index| Self::ALL.get(index).copied())
    }

    pub fn name(self) -> &'static str {
        match self {
            DamageType::Slash => "SLASH",
            DamageType::Crush => "CRUSH",
            DamageType::Poke => "POKE",
            DamageType::Holy => "HOLY",
            DamageType::Evil => "EVIL",
            DamageType::Fire => "FIRE",
            DamageType::Ice => "ICE",
            DamageType::Zap => "ZAP",
        }
    }
}

/// Per-type resistance. A shift of 1 halves the damage, 2 quarters it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DamageModifier {
    pub shift: u8,
    /// Damage of this type heals instead.
    pub invert: bool,
    /// Damage of this type drains mana instead of life.
    pub mana: bool,
}

/// `base` plus a uniform roll in `[0, rand]`, both 8.8.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageRange {
    pub base: i32,
    pub rand: i32,
}

impl DamageRange {
    pub const fn fixed(base: i32) -> Self {
        Self { base, rand: 0 }
    }

    pub fn roll(&self, rng: &mut SimRng) -> i32 {
        self.base.saturating_add(rng.up_to(self.rand))
    }
}

/// Damage dealt on contact by an entity (spikes, thrown weapons).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactDamage {
    pub amount: DamageRange,
    pub damage_type: DamageType,
}

bitflags! {
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct DamageFlags: u8 {
        const IGNORE_INVICTUS = 1 << 0;
        const IGNORE_DEFENSE  = 1 << 1;
        /// Do not award experience for a kill.
        const NO_KILL_CREDIT  = 1 << 2;
    }
}

/// Attack directions relative to the victim's facing.
pub const ATK_FRONT: Facing = 0;
pub const ATK_RIGHT: Facing = 16384;
pub const ATK_BEHIND: Facing = 32768;
pub const ATK_LEFT: Facing = 49152;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackQuadrant {
    Front,
    Right,
    Behind,
    Left,
}

impl AttackQuadrant {
    /// Classify a relative attack direction into one of four 90° cones.
    pub fn from_direction(relative: Facing) -> AttackQuadrant {
        if facing_within(relative, ATK_FRONT, QUADRANT_HALF) {
            AttackQuadrant::Front
        } else if facing_within(relative, ATK_RIGHT, QUADRANT_HALF) {
            AttackQuadrant::Right
        } else if facing_within(relative, ATK_BEHIND, QUADRANT_HALF) {
            AttackQuadrant::Behind
        } else {
            AttackQuadrant::Left
        }
    }
}

/// Direction an attack arrives from, relative to the victim.
///
/// `travel` is the world facing the attack moves along; a blow travelling
/// against the victim's facing lands at `ATK_FRONT`.
pub fn relative_direction(travel: Facing, victim_facing: Facing) -> Facing {
    travel.wrapping_sub(victim_facing).wrapping_add(ATK_BEHIND)
}

/// `value * (255 - defense) / 255`, widened so any 8.8 amount fits.
fn scale_by_defense(value: i32, defense: u8) -> i32 {
    let scaled = i64::from(value) * (255 - i64::from(defense)) / 255;
    scaled.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

impl World {
    /// Apply damage to `target`; returns the life (or mana) actually removed.
    ///
    /// Negative results mean the damage type was inverted into healing.
    #[allow(clippy::too_many_arguments)]
    pub fn damage(
        &mut self,
        target: EntityHandle,
        direction: Facing,
        amount: DamageRange,
        damage_type: DamageType,
        team: TeamId,
        attacker: Option<EntityHandle>,
        flags: DamageFlags,
    ) -> i32 {
        let rolled = amount.roll(&mut self.rng);
        let Some(victim) = self.entities.get_mut(target) else {
            return 0;
        };
        if !victim.alive || rolled == 0 {
            return 0;
        }

        let modifier = victim.damage_mods[damage_type as usize];
        let mut value = rolled >> modifier.shift.min(15);
        if modifier.invert {
            value = value.saturating_neg();
        }
        if value < 0 {
            return -self.heal(target, value.saturating_neg());
        }

        let relative = relative_direction(direction, victim.facing);
        if victim.invictus
            && !flags.contains(DamageFlags::IGNORE_INVICTUS)
            && AttackQuadrant::from_direction(relative) == AttackQuadrant::Front
        {
            tracing::trace!(?target, "frontal damage blocked by invictus");
            return 0;
        }
        if !flags.contains(DamageFlags::IGNORE_DEFENSE) {
            value = scale_by_defense(value, victim.defense);
        }
        if value <= 0 {
            return 0;
        }

        victim.ai.attack_last = attacker;
        victim.ai.direction_last = relative;
        victim.ai.damage_type_last = damage_type;
        victim.ai.raise(AlertFlags::ATTACKED);

        let killed = if modifier.mana {
            victim.stats.mana = victim.stats.mana.saturating_sub(value).clamp(0, victim.stats.mana_max);
            false
        } else {
            victim.stats.life = victim.stats.life.saturating_sub(value).clamp(0, victim.stats.life_max);
            victim.stats.life == 0
        };

        if let Some(source) = attacker.filter(|source| *source != target) {
            if let Some(hitter) = self.entities.get_mut(source) {
                hitter.ai.hit_last = Some(target);
                hitter.ai.raise(AlertFlags::SCOREDAHIT);
            }
        }

        if killed {
            let credit = if flags.contains(DamageFlags::NO_KILL_CREDIT) {
                None
            } else {
                attacker
            };
            self.kill_with_team(target, credit, team);
        }
        value
    }

    /// Restore life; returns the amount actually gained.
    pub fn heal(&mut self, target: EntityHandle, amount: i32) -> i32 {
        let Some(entity) = self.entities.get_mut(target) else {
            return 0;
        };
        if !entity.alive || amount <= 0 {
            return 0;
        }
        let before = entity.stats.life;
        entity.stats.life = entity.stats.life.saturating_add(amount).clamp(0, entity.stats.life_max);
        entity.ai.raise(AlertFlags::HEALED);
        entity.stats.life - before
    }

    /// Kill `target` outright. Returns false if it was already dead.
    pub fn kill(&mut self, target: EntityHandle, killer: Option<EntityHandle>) -> bool {
        let team = killer
            .and_then(|handle| self.entities.get(handle))
            .map(|entity| entity.team)
            .unwrap_or(TeamId::DAMAGE);
        self.kill_with_team(target, killer, team)
    }

    fn kill_with_team(&mut self, target: EntityHandle, killer: Option<EntityHandle>, team: TeamId) -> bool {
        let Some(victim) = self.entities.get_mut(target) else {
            return false;
        };
        if !victim.alive {
            return false;
        }
        victim.alive = false;
        victim.stats.life = 0;
        victim.ai.attack_last = killer;
        victim.ai.raise(AlertFlags::KILLED);
        let victim_team = victim.team;
        let experience = victim.experience_value;
        tracing::debug!(?target, ?killer, "entity killed");

        for (handle, entity) in self.entities.iter_mut() {
            if handle != target && entity.ai.target == Some(target) {
                entity.ai.raise(AlertFlags::TARGETKILLED);
            }
        }

        if self.teams.leader(victim_team) == Some(target) {
            self.teams.set_leader(victim_team, None);
            for (_, entity) in self.entities.iter_mut() {
                if entity.team == victim_team {
                    entity.ai.raise(AlertFlags::LEADERKILLED);
                }
            }
        }
        self.teams.add_morale(victim_team, -1);

        if let Some(source) = killer.filter(|source| *source != target) {
            if self.teams.hates(team, victim_team) {
                if let Some(entity) = self.entities.get_mut(source) {
                    entity.stats.experience = entity.stats.experience.saturating_add(experience);
                }
            }
        }

        for hand in crate::entity::Hand::BOTH {
            match self.drop_item(target, hand, false) {
                Ok(_) | Err(InventoryError::HandEmpty) | Err(InventoryError::Kursed) => {}
                Err(error) => tracing::warn!(?target, ?hand, %error, "corpse could not drop item"),
            }
        }
        self.enchant_remove_owned_by(target, true);
        true
    }

    /// Bring a dead entity back at its spawn point with full life.
    pub fn respawn(&mut self, target: EntityHandle) -> bool {
        let Some(entity) = self.entities.get_mut(target) else {
            return false;
        };
        if entity.alive {
            return false;
        }
        entity.alive = true;
        entity.stats.life = entity.stats.life_max;
        entity.pos = entity.spawn_pos;
        entity.old_pos = entity.spawn_pos;
        entity.vel = glam::Vec3::ZERO;
        entity.ai.raise(AlertFlags::SPAWNED);
        self.teams.add_morale(entity.team, 1);
        true
    }

    /// Add (or remove) money, clamped to `[0, max_money]`.
    pub fn add_money(&mut self, target: EntityHandle, delta: i32) -> Option<i32> {
        let cap = self.settings.script.max_money;
        let entity = self.entities.get_mut(target)?;
        entity.stats.money = entity.stats.money.saturating_add(delta).clamp(0, cap);
        Some(entity.stats.money)
    }

    /// Spend mana; fails without spending if there is not enough.
    pub fn cost_mana(&mut self, target: EntityHandle, amount: i32) -> bool {
        let Some(entity) = self.entities.get_mut(target) else {
            return false;
        };
        if amount < 0 {
            entity.stats.mana = entity.stats.mana.saturating_sub(amount).clamp(0, entity.stats.mana_max);
            return true;
        }
        if entity.stats.mana < amount {
            return false;
        }
        entity.stats.mana -= amount;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{int_to_fp8, Vec3, FACE_NORTH, FACE_SOUTH};
    use crate::profile::Profile;
    use crate::settings::MAXMONEY;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    fn world_with(life: i32) -> (World, EntityHandle) {
        let mut world = World::default();
        let mut profile = Profile::named("Dummy");
        profile.life = life;
        let id = world.profiles.register(profile);
        let handle = world
            .spawn(id, Vec3::ZERO, None, 0, FACE_NORTH)
            .expect("profile exists");
        (world, handle)
    }

    #[test]
    fn damage_clamps_and_kills_once() {
        let (mut world, victim) = world_with(int_to_fp8(100));
        world.entities.get_mut(victim).expect("alive").stats.life = int_to_fp8(10);

        let dealt = world.damage(
            victim,
            FACE_NORTH,
            DamageRange::fixed(int_to_fp8(50)),
            DamageType::Slash,
            TeamId::EVIL,
            None,
            DamageFlags::empty(),
        );
        assert_eq!(dealt, int_to_fp8(50));
        let entity = world.entities.get(victim).expect("still stored");
        assert_eq!(entity.stats.life, 0);
        assert!(!entity.alive);
        assert!(entity.ai.is_alerted(AlertFlags::KILLED));

        // A second blow on the corpse neither damages nor re-kills.
        world.entities.get_mut(victim).expect("stored").ai.alert = AlertFlags::empty();
        let again = world.damage(
            victim,
            FACE_NORTH,
            DamageRange::fixed(int_to_fp8(50)),
            DamageType::Slash,
            TeamId::EVIL,
            None,
            DamageFlags::empty(),
        );
        assert_eq!(again, 0);
        assert!(!world.kill(victim, None));
        assert!(world.entities.get(victim).expect("stored").ai.alert.is_empty());
    }

    #[test]
    fn invictus_blocks_only_frontal_blows() {
        let (mut world, victim) = world_with(int_to_fp8(100));
        world.entities.get_mut(victim).expect("alive").invictus = true;
        let hit = |world: &mut World, travel: Facing, flags: DamageFlags| {
            world.damage(
                victim,
                travel,
                DamageRange::fixed(int_to_fp8(5)),
                DamageType::Poke,
                TeamId::EVIL,
                None,
                flags,
            )
        };

        // The victim faces north; a blow travelling south meets it head on.
        assert_eq!(hit(&mut world, FACE_SOUTH, DamageFlags::empty()), 0);
        assert_eq!(world.entities.get(victim).expect("alive").stats.life, int_to_fp8(100));

        assert_eq!(hit(&mut world, FACE_NORTH, DamageFlags::empty()), int_to_fp8(5));
        let entity = world.entities.get(victim).expect("alive");
        assert_eq!(AttackQuadrant::from_direction(entity.ai.direction_last), AttackQuadrant::Behind);

        assert_eq!(hit(&mut world, FACE_SOUTH, DamageFlags::IGNORE_INVICTUS), int_to_fp8(5));
        assert_eq!(world.entities.get(victim).expect("alive").stats.life, int_to_fp8(90));
    }

    #[test]
    fn huge_amounts_saturate() {
        for amount in [10_000_000, i32::MAX, i32::MIN] {
            let (mut world, victim) = world_with(int_to_fp8(100));
            world.entities.get_mut(victim).expect("alive").defense = 40;
            world.entities.get_mut(victim).expect("alive").damage_mods[DamageType::Ice as usize].invert = true;
            for damage_type in [DamageType::Slash, DamageType::Ice] {
                world.damage(
                    victim,
                    FACE_NORTH,
                    DamageRange { base: amount, rand: int_to_fp8(3) },
                    damage_type,
                    TeamId::EVIL,
                    None,
                    DamageFlags::empty(),
                );
            }
            let stats = world.entities.get(victim).expect("stored").stats;
            assert!((0..=stats.life_max).contains(&stats.life), "amount {amount}");
        }
        assert_eq!(scale_by_defense(i32::MAX, 0), i32::MAX);
        assert_eq!(scale_by_defense(i32::MAX, 255), 0);
    }

    #[test]
    fn life_and_money_stay_in_range() {
        let mut rng = SmallRng::seed_from_u64(0xd00d);
        for _ in 0..500 {
            let max = rng.gen_range(1..=int_to_fp8(200));
            let (mut world, handle) = world_with(max);
            let delta = rng.gen_range(-int_to_fp8(400)..=int_to_fp8(400));
            if delta >= 0 {
                world.damage(
                    handle,
                    FACE_NORTH,
                    DamageRange::fixed(delta),
                    DamageType::ALL[rng.gen_range(0..DAMAGE_TYPE_COUNT)],
                    TeamId::EVIL,
                    None,
                    DamageFlags::IGNORE_DEFENSE,
                );
            } else {
                world.heal(handle, -delta);
            }
            let money = world
                .add_money(handle, rng.gen_range(-20_000..=20_000))
                .expect("exists");
            let stats = world.entities.get(handle).expect("exists").stats;
            assert!((0..=stats.life_max).contains(&stats.life));
            assert!((0..=MAXMONEY).contains(&money));
        }
    }

    #[test]
    fn resistance_and_inversion() {
        let (mut world, handle) = world_with(int_to_fp8(100));
        {
            let entity = world.entities.get_mut(handle).expect("exists");
            entity.damage_mods[DamageType::Fire as usize].shift = 1;
            entity.damage_mods[DamageType::Holy as usize].invert = true;
            entity.stats.life = int_to_fp8(50);
        }
        let fire = world.damage(
            handle,
            FACE_NORTH,
            DamageRange::fixed(int_to_fp8(10)),
            DamageType::Fire,
            TeamId::EVIL,
            None,
            DamageFlags::empty(),
        );
        assert_eq!(fire, int_to_fp8(5));
        let holy = world.damage(
            handle,
            FACE_NORTH,
            DamageRange::fixed(int_to_fp8(10)),
            DamageType::Holy,
            TeamId::EVIL,
            None,
            DamageFlags::empty(),
        );
        assert_eq!(holy, -int_to_fp8(10));
        assert_eq!(world.entities.get(handle).expect("exists").stats.life, int_to_fp8(55));
    }

    #[test]
    fn attacker_scores_a_hit_and_gains_experience() {
        let (mut world, victim) = world_with(int_to_fp8(1));
        let hero_profile = world.profiles.register(Profile::named("Hero"));
        let hero = world
            .spawn(hero_profile, Vec3::X, Some(TeamId::GOOD), 0, FACE_NORTH)
            .expect("spawned");
        world.entities.get_mut(victim).expect("exists").team = TeamId::EVIL;

        world.damage(
            victim,
            FACE_SOUTH,
            DamageRange::fixed(int_to_fp8(5)),
            DamageType::Poke,
            TeamId::GOOD,
            Some(hero),
            DamageFlags::empty(),
        );
        let hero_state = world.entities.get(hero).expect("exists");
        assert!(hero_state.ai.is_alerted(AlertFlags::SCOREDAHIT));
        assert_eq!(hero_state.ai.hit_last, Some(victim));
        assert_eq!(hero_state.stats.experience, 10);
        let victim_state = world.entities.get(victim).expect("exists");
        assert_eq!(victim_state.ai.attack_last, Some(hero));
        assert_eq!(AttackQuadrant::from_direction(victim_state.ai.direction_last), AttackQuadrant::Front);
    }

    #[test]
    fn quadrants() {
        assert_eq!(AttackQuadrant::from_direction(ATK_BEHIND + 8000), AttackQuadrant::Behind);
        assert_eq!(AttackQuadrant::from_direction(ATK_LEFT), AttackQuadrant::Left);
        assert_eq!(AttackQuadrant::from_direction(65000), AttackQuadrant::Front);
        assert_eq!(relative_direction(FACE_NORTH, FACE_NORTH), ATK_BEHIND);
    }
}
