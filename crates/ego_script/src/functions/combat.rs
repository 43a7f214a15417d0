//! Damage, healing, particles and spawning

use super::{self_is, update_self, FunctionEntry};
use crate::context::ScriptContext;
use ego_core::glam::Vec3;
use ego_core::math::facing_to_vec;
use ego_core::{DamageFlags, DamageRange, DamageType, EntityHandle, Particle, ProfileId};

pub(super) const FUNCTIONS: &[FunctionEntry] = entries![
    "SetDamageType" => set_damage_type,
    "DamageTarget" => damage_target,
    "HealSelf" => heal_self,
    "HealTarget" => heal_target,
    "KillTarget" => kill_target,
    "CostTargetMana" => cost_target_mana,
    "CostAmmo" => cost_ammo,
    "GiveExperienceToTarget" => give_experience_to_target,
    "GiveMoneyToTarget" => give_money_to_target,
    "SpawnParticle" => spawn_particle,
    "SpawnAttachedParticle" => spawn_attached_particle,
    "SpawnExactParticle" => spawn_exact_particle,
    "SpawnCharacter" => spawn_character,
    "GoPoof" => go_poof,
    "PoofTarget" => poof_target,
    "IfTargetIsHurt" => if_target_is_hurt,
    "IfSelfIsHurt" => if_self_is_hurt,
];

/// Damage type for this entity's own attacks, from `argument`.
fn set_damage_type(ctx: &mut ScriptContext<'_>) -> bool {
    let Some(damage_type) = DamageType::from_i32(ctx.regs.argument) else {
        return false;
    };
    update_self(ctx, |me| me.ai.damage_type = damage_type)
}

/// Hit the target for `argument` (8.8) of this entity's damage type.
fn damage_target(ctx: &mut ScriptContext<'_>) -> bool {
    let Some(target) = ctx.target() else {
        return false;
    };
    let Some((team, damage_type)) = ctx.me().map(|me| (me.team, me.ai.damage_type)) else {
        return false;
    };
    let direction = ctx.turn_to(target).unwrap_or_default();
    let amount = DamageRange::fixed(ctx.regs.argument);
    let me = ctx.me;
    let dealt = ctx
        .world
        .damage(target, direction, amount, damage_type, team, Some(me), DamageFlags::empty());
    tracing::trace!(?me, ?target, dealt, "scripted damage");
    true
}

fn heal_self(ctx: &mut ScriptContext<'_>) -> bool {
    let me = ctx.me;
    let amount = ctx.regs.argument;
    if !ctx.world.is_alive(me) {
        return false;
    }
    ctx.world.heal(me, amount);
    true
}

fn heal_target(ctx: &mut ScriptContext<'_>) -> bool {
    let Some(target) = ctx.target().filter(|target| ctx.world.is_alive(*target)) else {
        return false;
    };
    ctx.world.heal(target, ctx.regs.argument);
    true
}

fn kill_target(ctx: &mut ScriptContext<'_>) -> bool {
    let Some(target) = ctx.target() else {
        return false;
    };
    let me = ctx.me;
    ctx.world.kill(target, Some(me))
}

/// Take `argument` mana from the target; fails when it has too little.
fn cost_target_mana(ctx: &mut ScriptContext<'_>) -> bool {
    let Some(target) = ctx.target() else {
        return false;
    };
    ctx.world.cost_mana(target, ctx.regs.argument)
}

fn cost_ammo(ctx: &mut ScriptContext<'_>) -> bool {
    match ctx.me_mut() {
        Some(me) if me.item.ammo > 0 => {
            me.item.ammo -= 1;
            true
        }
        _ => false,
    }
}

fn give_experience_to_target(ctx: &mut ScriptContext<'_>) -> bool {
    let amount = ctx.regs.argument;
    match ctx.target_entity_mut() {
        Some(target) => {
            target.stats.experience = target.stats.experience.saturating_add(amount).max(0);
            true
        }
        None => false,
    }
}

/// Hand over up to `argument` money; the amount actually moved goes into
/// `argument`.
fn give_money_to_target(ctx: &mut ScriptContext<'_>) -> bool {
    let Some(target) = ctx.target() else {
        return false;
    };
    let Some(purse) = ctx.me().map(|me| me.stats.money) else {
        return false;
    };
    let room = ctx
        .world
        .get(target)
        .map_or(0, |entity| ctx.world.settings.script.max_money - entity.stats.money)
        .max(0);
    let amount = ctx.regs.argument.clamp(0, purse).min(room);
    let me = ctx.me;
    ctx.world.add_money(me, -amount);
    ctx.world.add_money(target, amount);
    ctx.regs.argument = amount;
    true
}

/// Launch particle template `argument` of this entity's profile.
fn launch(ctx: &mut ScriptContext<'_>, pos: Option<Vec3>, attach: Option<EntityHandle>) -> bool {
    let index = ctx.regs.argument;
    let Some(me) = ctx.me() else {
        return false;
    };
    let Some(def) = usize::try_from(index)
        .ok()
        .and_then(|index| ctx.world.profiles.get(me.profile)?.particles.get(index))
    else {
        tracing::trace!(index, "no such particle template");
        return false;
    };
    let direction = facing_to_vec(me.facing);
    let vel = Vec3::new(direction.x, direction.y, 0.0) * def.speed;
    let mut particle = Particle::from_def(index, def, pos.unwrap_or(me.pos), vel, me.team);
    if let Some(holder) = attach {
        particle.attached_to = Some(holder);
        particle.vel = Vec3::ZERO;
    }
    let me = ctx.me;
    ctx.world.spawn_particle(me, particle).is_some()
}

fn spawn_particle(ctx: &mut ScriptContext<'_>) -> bool {
    launch(ctx, None, None)
}

fn spawn_attached_particle(ctx: &mut ScriptContext<'_>) -> bool {
    let me = ctx.me;
    launch(ctx, None, Some(me))
}

/// Particle at `(x, y)` with `distance` as height.
fn spawn_exact_particle(ctx: &mut ScriptContext<'_>) -> bool {
    let pos = Vec3::new(ctx.regs.x as f32, ctx.regs.y as f32, ctx.regs.distance as f32);
    launch(ctx, Some(pos), None)
}

/// Spawn profile `argument` at `(x, y)` facing `turn` on this entity's
/// team. The newcomer becomes the child and is owned by this entity.
fn spawn_character(ctx: &mut ScriptContext<'_>) -> bool {
    let Ok(profile) = u16::try_from(ctx.regs.argument).map(ProfileId) else {
        return false;
    };
    let Some(team) = ctx.me().map(|me| me.team) else {
        return false;
    };
    let pos = ctx.xy();
    let flying = ctx.world.profiles.get(profile).is_some_and(|template| template.flying);
    if ctx.world.mesh.blocks(pos, flying) {
        tracing::trace!(?pos, "spawn blocked by terrain");
        return false;
    }
    let facing = ctx.regs.turn as u16;
    let Some(child) = ctx.world.spawn(profile, pos, Some(team), 0, facing) else {
        return false;
    };
    let me = ctx.me;
    if let Some(spawned) = ctx.world.get_mut(child) {
        spawned.ai.owner = Some(me);
    }
    update_self(ctx, |me| me.ai.child = Some(child))
}

/// Remove this entity at the end of the tick.
fn go_poof(ctx: &mut ScriptContext<'_>) -> bool {
    let me = ctx.me;
    ctx.world.request_terminate(me)
}

fn poof_target(ctx: &mut ScriptContext<'_>) -> bool {
    let Some(target) = ctx.target() else {
        return false;
    };
    ctx.world.request_terminate(target)
}

fn if_target_is_hurt(ctx: &mut ScriptContext<'_>) -> bool {
    super::target_is(ctx, |target| target.alive && target.stats.life < target.stats.life_max)
}

fn if_self_is_hurt(ctx: &mut ScriptContext<'_>) -> bool {
    self_is(ctx, |me| me.alive && me.stats.life < me.stats.life_max)
}

#[cfg(test)]
mod tests {
    use crate::functions::test_support::{call, spawn, world};
    use ego_core::{DamageType, ParticleDef, Profile, Registers, TeamId};

    #[test]
    fn damage_clamps_and_kills_once() {
        let (mut world, body) = world();
        let me = spawn(&mut world, body, 500.0, 500.0, TeamId::EVIL);
        let victim = spawn(&mut world, body, 600.0, 500.0, TeamId::GOOD);
        world.get_mut(victim).expect("victim").stats.life = 512;
        world.get_mut(me).expect("me").ai.set_target(Some(victim));

        let regs = Registers {
            argument: 50 << 8,
            ..Registers::default()
        };
        assert!(call(&mut world, me, regs, "DamageTarget").0);
        let entity = world.get(victim).expect("victim");
        assert_eq!(entity.stats.life, 0);
        assert!(!entity.alive);
        assert!(!call(&mut world, me, regs, "KillTarget").0);
    }

    #[test]
    fn oversized_argument_still_lands() {
        let (mut world, body) = world();
        let me = spawn(&mut world, body, 500.0, 500.0, TeamId::EVIL);
        let victim = spawn(&mut world, body, 600.0, 500.0, TeamId::GOOD);
        world.get_mut(victim).expect("victim").defense = 10;
        world.get_mut(me).expect("me").ai.set_target(Some(victim));

        for argument in [10_000_000, i32::MAX] {
            let regs = Registers {
                argument,
                ..Registers::default()
            };
            assert!(call(&mut world, me, regs, "DamageTarget").0);
        }
        let entity = world.get(victim).expect("victim");
        assert_eq!(entity.stats.life, 0);
        assert!(!entity.alive);
    }

    #[test]
    fn damage_type_comes_from_argument() {
        let (mut world, body) = world();
        let me = spawn(&mut world, body, 500.0, 500.0, TeamId::EVIL);
        let fire = Registers {
            argument: DamageType::Fire as i32,
            ..Registers::default()
        };
        assert!(call(&mut world, me, fire, "SetDamageType").0);
        assert_eq!(world.get(me).expect("me").ai.damage_type, DamageType::Fire);
        let bogus = Registers {
            argument: 99,
            ..Registers::default()
        };
        assert!(!call(&mut world, me, bogus, "SetDamageType").0);
    }

    #[test]
    fn money_moves_within_limits() {
        let (mut world, body) = world();
        let me = spawn(&mut world, body, 500.0, 500.0, TeamId::EVIL);
        let other = spawn(&mut world, body, 600.0, 500.0, TeamId::EVIL);
        world.get_mut(me).expect("me").stats.money = 30;
        world.get_mut(me).expect("me").ai.set_target(Some(other));

        let regs = Registers {
            argument: 100,
            ..Registers::default()
        };
        let (ok, out) = call(&mut world, me, regs, "GiveMoneyToTarget");
        assert!(ok);
        assert_eq!(out.argument, 30);
        assert_eq!(world.get(me).expect("me").stats.money, 0);
        assert_eq!(world.get(other).expect("other").stats.money, 30);
    }

    #[test]
    fn spawned_character_is_child_and_owned() {
        let (mut world, body) = world();
        let me = spawn(&mut world, body, 500.0, 500.0, TeamId::EVIL);
        let regs = Registers {
            x: 700,
            y: 700,
            argument: body.0 as i32,
            ..Registers::default()
        };
        assert!(call(&mut world, me, regs, "SpawnCharacter").0);
        let child = world.get(me).expect("me").ai.child.expect("child");
        let spawned = world.get(child).expect("spawned");
        assert_eq!(spawned.ai.owner, Some(me));
        assert_eq!(spawned.team, TeamId::EVIL);

        let unknown = Registers {
            argument: 999,
            ..regs
        };
        assert!(!call(&mut world, me, unknown, "SpawnCharacter").0);
    }

    #[test]
    fn particles_come_from_the_profile() {
        let (mut world, _) = world();
        let mut caster = Profile::named("Caster");
        caster.particles.push(ParticleDef::default());
        let caster = world.profiles.register(caster);
        let me = spawn(&mut world, caster, 500.0, 500.0, TeamId::EVIL);

        assert!(call(&mut world, me, Registers::default(), "SpawnAttachedParticle").0);
        let missing = Registers {
            argument: 1,
            ..Registers::default()
        };
        assert!(!call(&mut world, me, missing, "SpawnParticle").0);
        let (_, particle) = world.particles.iter().next().expect("particle");
        assert_eq!(particle.owner, Some(me));
        assert_eq!(particle.attached_to, Some(me));
    }
}
