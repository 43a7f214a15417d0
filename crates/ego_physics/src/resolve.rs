//! Collision response
//!
//! Pairs are resolved in canonical order. Entity pairs are pushed apart
//! along the axis of least penetration (measured at the end of the tick)
//! with the correction split by inverse mass; riders are snapped onto their
//! platforms; particles and contact damage go through the world's damage
//! entry point; walls push walkers back out. Closing passages are finished
//! last, crushing whatever they caught.

use crate::octbox::{axis_normal, axis_to_world, OctBox, AXES, AXIS_Z};
use crate::pair::{CollisionPair, Participant};
use glam::Vec3;
use ego_core::math::facing_from_vec;
use ego_core::{
    AlertFlags, DamageFlags, DamageRange, DamageType, EntityHandle, ParticleHandle, PassageId, TeamId, World,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveStats {
    pub resolved: usize,
    pub platforms: usize,
    pub attacks: usize,
    pub blocked: usize,
    pub crushed: usize,
}

#[derive(Debug, Clone, Default)]
pub struct CollisionResolver {
    stats: ResolveStats,
}

impl CollisionResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> ResolveStats {
        self.stats
    }

    pub fn resolve(&mut self, world: &mut World, pairs: &[CollisionPair]) -> ResolveStats {
        let mut stats = ResolveStats::default();
        for pair in pairs {
            match (pair.b, pair.platform) {
                (Participant::Entity(b), Some(platform)) => {
                    let rider = if platform == b { pair.a } else { b };
                    if snap_to_platform(world, rider, platform) {
                        stats.platforms += 1;
                    }
                }
                (Participant::Entity(b), None) => {
                    if push_apart(world, pair.a, b) {
                        stats.resolved += 1;
                    }
                    if pair.tmin > 0.0 {
                        stats.attacks += usize::from(contact_attack(world, pair.a, b));
                        stats.attacks += usize::from(contact_attack(world, b, pair.a));
                    }
                }
                (Participant::Particle(particle), _) => {
                    stats.attacks += usize::from(particle_hit(world, pair.a, particle));
                }
                (Participant::Tile { tx, ty }, _) => {
                    if push_out_of_tile(world, pair.a, tx, ty) {
                        stats.blocked += 1;
                    }
                }
            }
        }

        let closing: Vec<PassageId> = world.passages.closing().collect();
        for id in closing {
            stats.crushed += crush_passage(world, id);
        }

        tracing::trace!(?stats, "resolution finished");
        self.stats = stats;
        stats
    }
}

/// Axis of least world-space penetration, if the boxes interpenetrate on
/// every axis. `horizontal_only` skips the z axis.
fn least_axis(depths: &[f32; AXES], horizontal_only: bool) -> Option<(usize, f32)> {
    let limit = if horizontal_only { AXIS_Z } else { AXES };
    if depths[..limit].iter().any(|depth| !(*depth > 0.0)) {
        return None;
    }
    (0..limit)
        .map(|axis| (axis, axis_to_world(axis, depths[axis])))
        .min_by(|x, y| x.1.total_cmp(&y.1))
}

/// Remove the part of `vel` heading along `normal`, reflecting it scaled by
/// `dampen`.
fn bounce(vel: &mut Vec3, normal: Vec3, dampen: f32) {
    let into = vel.dot(normal);
    if into > 0.0 {
        *vel -= normal * into * (1.0 + dampen.clamp(0.0, 1.0));
    }
}

fn push_apart(world: &mut World, a: EntityHandle, b: EntityHandle) -> bool {
    let min_extent = world.settings.physics.min_extent;
    let Some((ea, eb)) = world.entities.get2_mut(a, b) else {
        return false;
    };
    if !ea.is_active() || !eb.is_active() {
        return false;
    }
    ea.ai.bump_last = Some(b);
    ea.ai.raise(AlertFlags::BUMPED);
    eb.ai.bump_last = Some(a);
    eb.ai.raise(AlertFlags::BUMPED);

    let box_a = OctBox::from_bumper(ea.pos + ea.vel, &ea.bumper, min_extent);
    let box_b = OctBox::from_bumper(eb.pos + eb.vel, &eb.bumper, min_extent);
    let Some((axis, depth)) = least_axis(&box_a.overlap_depths(&box_b), false) else {
        return true;
    };
    let inv_a = ea.phys.inverse_mass(min_extent);
    let inv_b = eb.phys.inverse_mass(min_extent);
    let total = inv_a + inv_b;
    if !(total > f32::EPSILON) {
        return true;
    }
    let side = if box_b.center()[axis] >= box_a.center()[axis] { 1.0 } else { -1.0 };
    let normal = axis_normal(axis) * side;
    let depth = depth.max(min_extent);
    ea.pos -= normal * depth * (inv_a / total);
    eb.pos += normal * depth * (inv_b / total);
    if inv_a > 0.0 {
        bounce(&mut ea.vel, normal, ea.phys.dampen);
    }
    if inv_b > 0.0 {
        bounce(&mut eb.vel, -normal, eb.phys.dampen);
    }
    tracing::trace!(?a, ?b, axis, depth, "pushed apart");
    true
}

fn snap_to_platform(world: &mut World, rider: EntityHandle, platform: EntityHandle) -> bool {
    let Some((r, p)) = world.entities.get2_mut(rider, platform) else {
        return false;
    };
    if !r.is_active() || !p.is_active() {
        return false;
    }
    // A grounded platform's pending fall is cancelled by the floor.
    let lift = if p.on_ground { p.vel.z.max(0.0) } else { p.vel.z };
    r.pos.z = p.top() + lift;
    r.vel.z = 0.0;
    r.pos.x += p.vel.x;
    r.pos.y += p.vel.y;
    r.on_platform = Some(platform);
    r.on_ground = true;
    tracing::trace!(?rider, ?platform, z = r.pos.z, "rider snapped to platform");
    true
}

/// Deal `attacker`'s contact damage to `victim` if their teams are hostile.
fn contact_attack(world: &mut World, attacker: EntityHandle, victim: EntityHandle) -> bool {
    let Some(body) = world.entities.get(attacker) else {
        return false;
    };
    let Some(contact) = body.contact_damage else {
        return false;
    };
    let Some(target) = world.entities.get(victim) else {
        return false;
    };
    if !target.alive || !world.teams.hates(body.team, target.team) {
        return false;
    }
    let travel = target.pos - body.pos;
    let direction = facing_from_vec(travel.x, travel.y);
    let team = body.team;
    let credit = body.ai.owner.filter(|owner| world.entities.exists(*owner)).unwrap_or(attacker);
    world.damage(
        victim,
        direction,
        contact.amount,
        contact.damage_type,
        team,
        Some(credit),
        DamageFlags::empty(),
    );
    true
}

fn particle_hit(world: &mut World, entity: EntityHandle, handle: ParticleHandle) -> bool {
    let Some(particle) = world.particles.get(handle) else {
        return false;
    };
    if !particle.is_live() || !particle.does_damage() || particle.last_hit == Some(entity) {
        return false;
    }
    let Some(target) = world.entities.get(entity) else {
        return false;
    };
    if !target.alive || !world.teams.hates(particle.team, target.team) {
        return false;
    }
    let travel = if particle.vel.truncate().length_squared() > f32::EPSILON {
        particle.vel
    } else {
        target.pos - particle.pos
    };
    let direction = facing_from_vec(travel.x, travel.y);
    let (damage, damage_type, team, owner, pierce) = (
        particle.damage,
        particle.damage_type,
        particle.team,
        particle.owner,
        particle.pierce,
    );
    world.damage(entity, direction, damage, damage_type, team, owner, DamageFlags::empty());
    if let Some(particle) = world.particles.get_mut(handle) {
        particle.last_hit = Some(entity);
        if !pierce {
            particle.spent = true;
        }
    }
    true
}

fn push_out_of_tile(world: &mut World, handle: EntityHandle, tx: u32, ty: u32) -> bool {
    let min_extent = world.settings.physics.min_extent;
    let (min, max) = world.mesh.tile_bounds(tx, ty);
    let tile = OctBox::from_tile(min, max);
    let Some(entity) = world.entities.get_mut(handle) else {
        return false;
    };
    let end = OctBox::from_bumper(entity.pos + entity.vel, &entity.bumper, min_extent);
    let Some((axis, depth)) = least_axis(&end.overlap_depths(&tile), true) else {
        return false;
    };
    let tile_center = 0.5 * (min + max);
    let center = [tile_center.x, tile_center.y, tile_center.x + tile_center.y, tile_center.y - tile_center.x];
    let side = if end.center()[axis] >= center[axis] { 1.0 } else { -1.0 };
    let normal = axis_normal(axis) * side;
    entity.pos += normal * depth.max(min_extent);
    bounce(&mut entity.vel, -normal, entity.phys.dampen);
    entity.ai.raise(AlertFlags::BLOCKED);
    tracing::trace!(?handle, tx, ty, "pushed out of wall");
    true
}

/// Damage everything caught inside a closing passage, then shut it.
fn crush_passage(world: &mut World, id: PassageId) -> usize {
    let Some(rect) = world.passages.get(id).map(|passage| passage.rect) else {
        return 0;
    };
    let caught: Vec<EntityHandle> = world
        .entities
        .iter()
        .filter(|(_, entity)| {
            entity.is_active() && entity.is_free() && !entity.phys.platform && rect.contains_point(entity.pos, 0.0)
        })
        .map(|(handle, _)| handle)
        .collect();
    let amount = DamageRange::fixed(world.settings.physics.crush_damage);
    for victim in &caught {
        let facing = world.entities.get(*victim).map_or(0, |entity| entity.facing);
        world.damage(
            *victim,
            facing,
            amount,
            DamageType::Crush,
            TeamId::DAMAGE,
            None,
            DamageFlags::IGNORE_INVICTUS,
        );
        if let Some(entity) = world.entities.get_mut(*victim) {
            entity.ai.raise(AlertFlags::CRUSHED);
        }
        tracing::debug!(?victim, passage = id.0, "crushed by passage");
    }
    world.passages.finish_close(id, &mut world.mesh);
    caught.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::CollisionDetector;
    use ego_core::damage::ContactDamage;
    use ego_core::math::{int_to_fp8, FACE_NORTH};
    use ego_core::{Bumper, Particle, Passage, Profile, ProfileId, TileFx, TileRect, TILE_SIZE};

    fn world_with(profile: Profile) -> (World, ProfileId) {
        let mut world = World::default();
        let id = world.profiles.register(profile);
        (world, id)
    }

    fn step(world: &mut World) -> ResolveStats {
        world.time.advance_tick();
        let pairs = CollisionDetector::new(&world.settings.physics).detect(world);
        CollisionResolver::new().resolve(world, &pairs)
    }

    #[test]
    fn overlapping_bodies_separate_and_bump() {
        let (mut world, body) = world_with(Profile::named("Body"));
        let a = world.spawn(body, Vec3::new(500.0, 500.0, 0.0), None, 0, FACE_NORTH).expect("a");
        let b = world.spawn(body, Vec3::new(520.0, 500.0, 0.0), None, 0, FACE_NORTH).expect("b");
        let stats = step(&mut world);
        assert_eq!(stats.resolved, 1);
        let (pa, pb) = (world.get(a).expect("a").pos, world.get(b).expect("b").pos);
        assert!(pb.x - pa.x > 20.0);
        assert!(world.get(a).expect("a").ai.is_alerted(AlertFlags::BUMPED));
        assert_eq!(world.get(b).expect("b").ai.bump_last, Some(a));
    }

    #[test]
    fn immovable_bodies_do_not_move() {
        let mut statue = Profile::named("Statue");
        statue.weight = ego_core::profile::WEIGHT_IMMOVABLE;
        let (mut world, statue) = world_with(statue);
        let body = world.profiles.register(Profile::named("Body"));
        let fixed = world.spawn(statue, Vec3::new(500.0, 500.0, 0.0), None, 0, FACE_NORTH).expect("statue");
        let mover = world.spawn(body, Vec3::new(520.0, 500.0, 0.0), None, 0, FACE_NORTH).expect("body");
        step(&mut world);
        assert_eq!(world.get(fixed).expect("statue").pos, Vec3::new(500.0, 500.0, 0.0));
        assert!(world.get(mover).expect("body").pos.x > 520.0);
    }

    #[test]
    fn degenerate_bumpers_stay_finite() {
        let mut dot = Profile::named("Dot");
        dot.bumper = Bumper {
            size: 0.0,
            size_big: 0.0,
            height: 0.0,
        };
        dot.weight = 0.0;
        let (mut world, dot) = world_with(dot);
        let a = world.spawn(dot, Vec3::new(500.0, 500.0, 0.0), None, 0, FACE_NORTH).expect("a");
        let b = world.spawn(dot, Vec3::new(500.0, 500.0, 0.0), None, 0, FACE_NORTH).expect("b");
        step(&mut world);
        for handle in [a, b] {
            let entity = world.get(handle).expect("entity");
            assert!(entity.pos.is_finite());
            assert!(entity.vel.is_finite());
        }
    }

    #[test]
    fn rider_snaps_onto_platform() {
        let mut slab = Profile::named("Slab");
        slab.platform = true;
        slab.bumper = Bumper::new(40.0, 10.0);
        let (mut world, slab) = world_with(slab);
        let body = world.profiles.register(Profile::named("Body"));
        let platform = world.spawn(slab, Vec3::new(500.0, 500.0, 0.0), None, 0, FACE_NORTH).expect("slab");
        let rider = world.spawn(body, Vec3::new(500.0, 500.0, 12.0), None, 0, FACE_NORTH).expect("rider");
        world.get_mut(rider).expect("rider").vel.z = -5.0;

        let stats = step(&mut world);
        assert_eq!(stats.platforms, 1);
        let entity = world.get(rider).expect("rider");
        assert_eq!(entity.pos.z, 10.0);
        assert_eq!(entity.vel.z, 0.0);
        assert_eq!(entity.on_platform, Some(platform));
    }

    #[test]
    fn spikes_hurt_on_impact() {
        let mut spikes = Profile::named("Spikes");
        spikes.team = TeamId::DAMAGE;
        spikes.contact_damage = Some(ContactDamage {
            amount: DamageRange::fixed(int_to_fp8(3)),
            damage_type: DamageType::Poke,
        });
        let (mut world, spikes) = world_with(spikes);
        let body = world.profiles.register(Profile::named("Body"));
        let trap = world.spawn(spikes, Vec3::new(600.0, 500.0, 0.0), None, 0, FACE_NORTH).expect("trap");
        let victim = world
            .spawn(body, Vec3::new(500.0, 500.0, 0.0), Some(TeamId::GOOD), 0, FACE_NORTH)
            .expect("victim");
        world.get_mut(victim).expect("victim").vel.x = 60.0;

        let stats = step(&mut world);
        assert_eq!(stats.attacks, 1);
        let hurt = world.get(victim).expect("victim");
        assert_eq!(hurt.stats.life, hurt.stats.life_max - int_to_fp8(3));
        assert!(hurt.ai.is_alerted(AlertFlags::ATTACKED));
        assert_eq!(hurt.ai.attack_last, Some(trap));
        assert!(world.get(trap).expect("trap").ai.is_alerted(AlertFlags::SCOREDAHIT));
    }

    #[test]
    fn particles_skip_their_owner_and_hit_enemies() {
        let (mut world, body) = world_with(Profile::named("Body"));
        let archer = world
            .spawn(body, Vec3::new(500.0, 500.0, 0.0), Some(TeamId::GOOD), 0, FACE_NORTH)
            .expect("archer");
        let orc = world
            .spawn(body, Vec3::new(500.0, 570.0, 0.0), Some(TeamId::EVIL), 0, FACE_NORTH)
            .expect("orc");
        let mut arrow = Particle::new(0, Vec3::new(500.0, 500.0, 20.0), TeamId::GOOD);
        arrow.vel = Vec3::new(0.0, 40.0, 0.0);
        arrow.damage = DamageRange::fixed(int_to_fp8(2));
        let arrow = world.spawn_particle(archer, arrow).expect("arrow");

        let stats = step(&mut world);
        assert_eq!(stats.attacks, 1);
        assert!(world.particles.get(arrow).expect("arrow").spent);
        assert_eq!(world.get(archer).expect("archer").stats.life, world.get(archer).expect("archer").stats.life_max);
        assert!(world.get(orc).expect("orc").ai.is_alerted(AlertFlags::ATTACKED));
        assert!(world.get(archer).expect("archer").ai.is_alerted(AlertFlags::SCOREDAHIT));
    }

    #[test]
    fn walls_block_and_alert() {
        let (mut world, body) = world_with(Profile::named("Body"));
        world.mesh.add_fx(5, 4, TileFx::WALL);
        let walker = world
            .spawn(body, Vec3::new(4.5 * TILE_SIZE, 4.5 * TILE_SIZE, 0.0), None, 0, FACE_NORTH)
            .expect("walker");
        world.get_mut(walker).expect("walker").vel.x = 60.0;

        let stats = step(&mut world);
        assert_eq!(stats.blocked, 1);
        let entity = world.get(walker).expect("walker");
        assert!(entity.ai.is_alerted(AlertFlags::BLOCKED));
        assert!(entity.pos.x + entity.vel.x + entity.bumper.size <= 5.0 * TILE_SIZE + 0.01);
    }

    #[test]
    fn closing_passage_crushes_occupants() {
        let (mut world, body) = world_with(Profile::named("Body"));
        let door = world
            .passages
            .add(Passage::new(TileRect::new(2, 2, 2, 2), true), &mut world.mesh);
        let victim = world
            .spawn(body, Vec3::new(2.5 * TILE_SIZE, 2.5 * TILE_SIZE, 0.0), None, 0, FACE_NORTH)
            .expect("victim");
        assert!(world.close_passage(door));

        let stats = step(&mut world);
        assert_eq!(stats.crushed, 1);
        let entity = world.get(victim).expect("victim");
        assert!(entity.ai.is_alerted(AlertFlags::CRUSHED));
        assert!(entity.stats.life < entity.stats.life_max);
        assert!(!world.passages.is_open(door));
        assert!(world.mesh.blocks(entity.pos, false));
    }
}
