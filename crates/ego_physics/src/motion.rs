//! Movement
//!
//! `steer` runs before detection and turns AI intent (waypoints, turn mode,
//! gravity) into velocity. `integrate` runs after resolution and moves
//! everything by its velocity against the terrain. `update_particles` moves
//! and ages particles.

use glam::Vec3;
use ego_core::math::{facing_from_vec, turn_toward};
use ego_core::{AlertFlags, EntityHandle, TileFx, TurnMode, World};

/// Largest change of facing per tick when turning toward a heading.
pub const TURN_STEP: u16 = 2048;
/// Rotation per tick in [`TurnMode::Spin`].
pub const SPIN_STEP: u16 = 1024;

/// Below this horizontal speed the facing is left alone.
const STILL_SPEED: f32 = 0.01;

/// Apply waypoints, turning and gravity to every free entity.
pub fn steer(world: &mut World) {
    let radius = world.settings.physics.waypoint_radius;
    let gravity = world.settings.physics.gravity;

    for handle in world.entities.snapshot() {
        let target_pos = world
            .entities
            .get(handle)
            .and_then(|entity| entity.ai.target)
            .and_then(|target| world.entities.get(target))
            .map(|target| target.pos);
        let Some(entity) = world.entities.get_mut(handle) else {
            continue;
        };
        entity.on_platform = None;
        if !entity.is_free() {
            continue;
        }
        if !entity.pos.is_finite() || !entity.vel.is_finite() {
            tracing::warn!(?handle, pos = ?entity.pos, vel = ?entity.vel, "non-finite motion reset");
            if !entity.pos.is_finite() {
                entity.pos = entity.old_pos;
            }
            entity.vel = Vec3::ZERO;
        }

        if entity.alive {
            if let Some(point) = entity.ai.waypoints.current() {
                let offset = point - entity.pos.truncate();
                if offset.length() <= radius {
                    entity.ai.raise(AlertFlags::ATWAYPOINT);
                    if entity.ai.waypoints.advance() {
                        entity.ai.raise(AlertFlags::ATLASTWAYPOINT);
                    }
                } else {
                    let step = offset.normalize_or_zero() * entity.phys.speed;
                    entity.vel.x = step.x;
                    entity.vel.y = step.y;
                }
            }

            entity.facing = match entity.ai.turn_mode {
                TurnMode::Velocity if entity.vel.truncate().length() > STILL_SPEED => turn_toward(
                    entity.facing,
                    facing_from_vec(entity.vel.x, entity.vel.y),
                    TURN_STEP,
                ),
                TurnMode::WatchTarget => match target_pos {
                    Some(target) => {
                        let offset = target - entity.pos;
                        turn_toward(entity.facing, facing_from_vec(offset.x, offset.y), TURN_STEP)
                    }
                    None => entity.facing,
                },
                TurnMode::Spin => entity.facing.wrapping_add(SPIN_STEP),
                _ => entity.facing,
            };
        }

        if !entity.phys.flying {
            entity.vel.z += gravity;
        }
    }
}

/// Move every free entity by its velocity, keeping it out of walls and above
/// the floor, then carry held and packed items along.
pub fn integrate(world: &mut World) {
    let physics = &world.settings.physics;
    let mesh = &world.mesh;
    let mut holders: Vec<EntityHandle> = Vec::new();

    for (handle, entity) in world.entities.iter_mut() {
        if !entity.is_free() || !entity.is_active() {
            continue;
        }
        entity.old_pos = entity.pos;
        if !entity.vel.is_finite() {
            entity.vel = Vec3::ZERO;
        }
        let flying = entity.phys.flying;
        let dampen = entity.phys.dampen.clamp(0.0, 1.0);
        let mut next = entity.pos + entity.vel;

        if mesh.blocks(next, flying) {
            let slide_x = Vec3::new(next.x, entity.pos.y, next.z);
            let slide_y = Vec3::new(entity.pos.x, next.y, next.z);
            if !mesh.blocks(slide_x, flying) {
                next = slide_x;
                entity.vel.y = -entity.vel.y * dampen;
            } else if !mesh.blocks(slide_y, flying) {
                next = slide_y;
                entity.vel.x = -entity.vel.x * dampen;
            } else {
                next = Vec3::new(entity.pos.x, entity.pos.y, next.z);
                entity.vel.x = -entity.vel.x * dampen;
                entity.vel.y = -entity.vel.y * dampen;
            }
            entity.ai.raise(AlertFlags::BLOCKED);
            tracing::trace!(?handle, "blocked by terrain");
        }

        if entity.on_platform.is_none() {
            let floor = mesh.floor_height(next.x, next.y);
            if next.z <= floor {
                next.z = floor;
                if entity.vel.z < 0.0 {
                    if !entity.on_ground {
                        entity.ai.raise(AlertFlags::HITGROUND);
                    }
                    entity.vel.z = 0.0;
                }
                entity.on_ground = true;
            } else {
                entity.on_ground = false;
            }
        }

        let was_wet = mesh.fx_at(entity.pos.x, entity.pos.y).contains(TileFx::WATER);
        if !was_wet && mesh.fx_at(next.x, next.y).contains(TileFx::WATER) {
            entity.ai.raise(AlertFlags::INWATER);
        }

        let friction = if entity.on_ground {
            physics.ground_friction
        } else {
            physics.air_friction
        };
        entity.vel.x *= friction;
        entity.vel.y *= friction;
        entity.pos = next;

        if entity.held.iter().any(Option::is_some) || entity.inventory.count() > 0 {
            holders.push(handle);
        }
    }

    for holder in holders {
        world.sync_attached(holder);
    }
}

/// Move, age and expire particles. Returns how many were removed.
pub fn update_particles(world: &mut World) -> usize {
    let gravity = world.settings.physics.gravity;
    let mesh = &world.mesh;
    let entities = &world.entities;

    for (_, particle) in world.particles.iter_mut() {
        if !particle.is_live() {
            continue;
        }
        if let Some(holder) = particle.attached_to {
            match entities.get(holder).filter(|entity| entity.is_active()) {
                Some(entity) => {
                    particle.pos = entity.pos + particle.attach_offset;
                    particle.vel = entity.vel;
                }
                None => particle.spent = true,
            }
        } else {
            if particle.gravity {
                particle.vel.z += gravity;
            }
            let next = particle.pos + particle.vel;
            if !next.is_finite() || mesh.fx_at(next.x, next.y).contains(TileFx::WALL) {
                particle.spent = true;
            } else {
                particle.pos = next;
                let floor = mesh.floor_height(next.x, next.y);
                if particle.gravity && particle.pos.z <= floor {
                    particle.pos.z = floor;
                    particle.spent = true;
                }
            }
        }
        particle.lifetime = particle.lifetime.saturating_sub(1);
    }

    let expired = world.particles.expire();
    if expired > 0 {
        tracing::trace!(expired, "particles expired");
    }
    expired
}
