//! Particles
//!
//! Short-lived projectiles and spell effects. They live in their own arena,
//! move under the physics step and deliver damage on contact.

use crate::arena::Arena;
use crate::damage::{DamageRange, DamageType};
use crate::handle::{EntityHandle, ParticleHandle};
use crate::math::Vec3;
use crate::team::TeamId;
use crate::world::World;
use serde::{Deserialize, Serialize};

/// Particle template carried by a profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleDef {
    pub radius: f32,
    pub lifetime: u32,
    /// Launch speed along the spawner's facing, world units per tick.
    pub speed: f32,
    pub damage: DamageRange,
    pub damage_type: DamageType,
    pub pierce: bool,
    pub gravity: bool,
}

impl Default for ParticleDef {
    fn default() -> Self {
        Self {
            radius: 8.0,
            lifetime: 50,
            speed: 0.0,
            damage: DamageRange::default(),
            damage_type: DamageType::default(),
            pierce: false,
            gravity: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    /// Particle kind as numbered by the owning profile.
    pub kind: i32,
    pub pos: Vec3,
    pub vel: Vec3,
    pub radius: f32,
    /// Entity whose script spawned it; never hit by it.
    pub owner: Option<EntityHandle>,
    /// Follows this entity at `attach_offset` while attached.
    pub attached_to: Option<EntityHandle>,
    pub attach_offset: Vec3,
    pub team: TeamId,
    pub damage: DamageRange,
    pub damage_type: DamageType,
    /// Remaining ticks; the particle expires at zero.
    pub lifetime: u32,
    /// Keeps flying after the first hit.
    pub pierce: bool,
    pub gravity: bool,
    pub spawn_tick: u64,
    /// Last entity damaged, so a piercing particle hits each target once.
    pub last_hit: Option<EntityHandle>,
    pub spent: bool,
}

impl Particle {
    pub fn new(kind: i32, pos: Vec3, team: TeamId) -> Self {
        Self {
            kind,
            pos,
            vel: Vec3::ZERO,
            radius: 8.0,
            owner: None,
            attached_to: None,
            attach_offset: Vec3::ZERO,
            team,
            damage: DamageRange::default(),
            damage_type: DamageType::default(),
            lifetime: 50,
            pierce: false,
            gravity: false,
            spawn_tick: 0,
            last_hit: None,
            spent: false,
        }
    }

    /// Instantiate a template; `vel` is supplied by the spawner.
    pub fn from_def(kind: i32, def: &ParticleDef, pos: Vec3, vel: Vec3, team: TeamId) -> Self {
        Self {
            vel,
            radius: def.radius,
            damage: def.damage,
            damage_type: def.damage_type,
            lifetime: def.lifetime,
            pierce: def.pierce,
            gravity: def.gravity,
            ..Self::new(kind, pos, team)
        }
    }

    pub fn is_live(&self) -> bool {
        !self.spent && self.lifetime > 0
    }

    pub fn does_damage(&self) -> bool {
        self.damage.base > 0 || self.damage.rand > 0
    }
}

#[derive(Debug, Clone, Default)]
pub struct ParticleStore {
    arena: Arena<ParticleHandle, Particle>,
}

impl ParticleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, particle: Particle) -> ParticleHandle {
        self.arena.insert(particle)
    }

    pub fn get(&self, handle: ParticleHandle) -> Option<&Particle> {
        self.arena.get(handle)
    }

    pub fn get_mut(&mut self, handle: ParticleHandle) -> Option<&mut Particle> {
        self.arena.get_mut(handle)
    }

    pub fn exists(&self, handle: ParticleHandle) -> bool {
        self.arena.contains(handle)
    }

    pub fn remove(&mut self, handle: ParticleHandle) -> Option<Particle> {
        self.arena.remove(handle)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ParticleHandle, &Particle)> {
        self.arena.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (ParticleHandle, &mut Particle)> {
        self.arena.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Remove spent and expired particles; returns how many went.
    pub fn expire(&mut self) -> usize {
        let dead: Vec<ParticleHandle> = self
            .arena
            .iter()
            .filter(|(_, particle)| !particle.is_live())
            .map(|(handle, _)| handle)
            .collect();
        for handle in &dead {
            self.arena.remove(*handle);
        }
        dead.len()
    }

    /// Detach every particle following `entity`, dropping the attached ones.
    pub fn release_owner(&mut self, entity: EntityHandle) {
        for (_, particle) in self.arena.iter_mut() {
            if particle.attached_to == Some(entity) {
                particle.spent = true;
            }
            if particle.owner == Some(entity) {
                particle.owner = None;
            }
        }
    }
}

impl World {
    /// Spawn a particle owned by `owner`, inheriting its team.
    pub fn spawn_particle(&mut self, owner: EntityHandle, mut particle: Particle) -> Option<ParticleHandle> {
        let entity = self.entities.get(owner)?;
        if !particle.pos.is_finite() || !particle.vel.is_finite() {
            return None;
        }
        particle.owner = Some(owner);
        particle.team = entity.team;
        particle.spawn_tick = self.time.tick_count();
        if let Some(holder) = particle.attached_to {
            let base = self.entities.get(holder)?.pos;
            particle.pos = base + particle.attach_offset;
        }
        let handle = self.particles.insert(particle);
        tracing::trace!(?owner, ?handle, "particle spawned");
        Some(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expire_removes_spent() {
        let mut store = ParticleStore::new();
        let live = store.insert(Particle::new(0, Vec3::ZERO, TeamId::NULL));
        let mut spent = Particle::new(1, Vec3::ZERO, TeamId::NULL);
        spent.lifetime = 0;
        let spent = store.insert(spent);
        assert_eq!(store.expire(), 1);
        assert!(store.exists(live));
        assert!(!store.exists(spent));
    }
}
