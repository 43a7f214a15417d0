//! Simulation world
//!
//! Aggregates every store the tick mutates. Physics and scripts both work
//! through `&mut World`; nothing here is shared across threads.

use crate::alert::AlertFlags;
use crate::effect::EffectQueue;
use crate::enchant::EnchantStore;
use crate::entity::Entity;
use crate::handle::EntityHandle;
use crate::math::{Facing, SimRng, Vec3};
use crate::mesh::TerrainMesh;
use crate::particle::ParticleStore;
use crate::passage::PassageList;
use crate::profile::{ProfileId, ProfileRegistry};
use crate::settings::SimSettings;
use crate::store::EntityStore;
use crate::team::{TeamId, TeamTable};
use crate::time::SimulationTime;

#[derive(Debug, Clone)]
pub struct World {
    pub entities: EntityStore,
    pub particles: ParticleStore,
    pub enchants: EnchantStore,
    pub profiles: ProfileRegistry,
    pub mesh: TerrainMesh,
    pub passages: PassageList,
    pub teams: TeamTable,
    pub effects: EffectQueue,
    pub rng: SimRng,
    pub time: SimulationTime,
    pub settings: SimSettings,
}

impl World {
    pub fn new(settings: SimSettings, mesh: TerrainMesh) -> Self {
        Self {
            entities: EntityStore::new(),
            particles: ParticleStore::new(),
            enchants: EnchantStore::new(),
            profiles: ProfileRegistry::new(),
            mesh,
            passages: PassageList::new(),
            teams: TeamTable::new(),
            effects: EffectQueue::new(),
            rng: SimRng::new(settings.seed),
            time: SimulationTime::new(),
            settings,
        }
    }

    /// Instantiate `profile`. `team` overrides the profile's team.
    pub fn spawn(&mut self, profile: ProfileId, pos: Vec3, team: Option<TeamId>, skin: u8, facing: Facing) -> Option<EntityHandle> {
        if !pos.is_finite() {
            tracing::warn!(?pos, "refusing to spawn at a non-finite position");
            return None;
        }
        let template = self.profiles.get(profile)?;
        let team = team.unwrap_or(template.team);
        let mut entity = Entity::from_profile(profile, template, pos, team);
        entity.skin = skin % template.skins.max(1);
        entity.facing = facing;
        entity.spawn_tick = self.time.tick_count();
        entity.ai.raise(AlertFlags::SPAWNED);
        let is_item = entity.item.is_item;

        let handle = self.entities.insert(entity);
        if !is_item {
            if self.teams.leader(team).is_none() {
                self.teams.set_leader(team, Some(handle));
            }
            self.teams.add_morale(team, 1);
        }
        tracing::trace!(?handle, profile = profile.0, "spawned entity");
        Some(handle)
    }

    pub fn exists(&self, handle: EntityHandle) -> bool {
        self.entities.exists(handle)
    }

    pub fn get(&self, handle: EntityHandle) -> Option<&Entity> {
        self.entities.get(handle)
    }

    pub fn get_mut(&mut self, handle: EntityHandle) -> Option<&mut Entity> {
        self.entities.get_mut(handle)
    }

    /// Stored, alive and not waiting to be reaped.
    pub fn is_alive(&self, handle: EntityHandle) -> bool {
        self.entities
            .get(handle)
            .is_some_and(|entity| entity.alive && entity.is_active())
    }

    /// Move an entity instantly. Fails off the mesh or inside a wall.
    pub fn teleport(&mut self, target: EntityHandle, pos: Vec3, facing: Facing) -> bool {
        if !pos.is_finite() || self.mesh.tile_at(pos.x, pos.y).is_none() {
            return false;
        }
        let Some(entity) = self.entities.get(target) else {
            return false;
        };
        if self.mesh.blocks(pos, entity.phys.flying) {
            return false;
        }
        let floor = self.mesh.floor_height(pos.x, pos.y);
        let Some(entity) = self.entities.get_mut(target) else {
            return false;
        };
        let pos = Vec3::new(pos.x, pos.y, pos.z.max(floor));
        entity.pos = pos;
        entity.old_pos = pos;
        entity.facing = facing;
        entity.on_platform = None;
        self.sync_attached(target);
        true
    }

    pub fn request_terminate(&mut self, handle: EntityHandle) -> bool {
        self.entities.request_terminate(handle)
    }

    /// Remove every entity flagged for termination, cascading to what it
    /// held, carried and enchanted. Returns the number of entities freed.
    pub fn reap(&mut self) -> usize {
        let mut reaped = 0;
        loop {
            let pending = self.entities.take_pending();
            if pending.is_empty() {
                break;
            }
            for handle in &pending {
                self.unlink_all(*handle);
                let enchants = self
                    .entities
                    .get(*handle)
                    .map(|entity| entity.enchants.clone())
                    .unwrap_or_default();
                for enchant in enchants {
                    self.enchant_remove(enchant);
                }
                self.enchant_remove_owned_by(*handle, true);
                let led = self.teams.forget_leader(*handle);
                if !led.is_empty() {
                    tracing::trace!(?handle, ?led, "leader reaped");
                }
                self.particles.release_owner(*handle);
            }
            reaped += self.entities.remove_all(&pending);
        }
        if reaped > 0 {
            tracing::debug!(reaped, "reaped entities");
        }
        reaped
    }

    /// Reset alert bits of every entity that has already run its script.
    pub fn clear_alerts(&mut self) {
        for (_, entity) in self.entities.iter_mut() {
            if entity.ai.has_run {
                entity.ai.alert = AlertFlags::empty();
            }
        }
    }

    /// Tick-boundary bookkeeping. Returns the number of entities reaped.
    pub fn begin_tick(&mut self) -> usize {
        let reaped = self.reap();
        self.time.advance_tick();
        self.clear_alerts();
        for (_, entity) in self.entities.iter_mut() {
            if entity.ai.timer > 0 {
                entity.ai.timer -= 1;
            }
        }
        let second = self.time.is_second_boundary();
        if second {
            self.regenerate();
        }
        self.update_enchants(second);
        reaped
    }

    fn regenerate(&mut self) {
        for (_, entity) in self.entities.iter_mut() {
            if !entity.alive {
                continue;
            }
            let stats = &mut entity.stats;
            stats.life = stats.life.saturating_add(stats.life_return).clamp(0, stats.life_max);
            stats.mana = stats.mana.saturating_add(stats.mana_return).clamp(0, stats.mana_max);
        }
    }

    /// Horizontal distance between two entities.
    pub fn distance(&self, a: EntityHandle, b: EntityHandle) -> Option<f32> {
        let a = self.entities.get(a)?.pos;
        let b = self.entities.get(b)?.pos;
        Some(a.truncate().distance(b.truncate()))
    }

    /// Nearest free, living entity other than `from` accepted by `filter`.
    /// Ties go to the older entity.
    pub fn find_nearest<F>(&self, from: EntityHandle, radius: Option<f32>, mut filter: F) -> Option<EntityHandle>
    where
        F: FnMut(EntityHandle, &Entity) -> bool,
    {
        let origin = self.entities.get(from)?.pos.truncate();
        let limit = radius.map_or(f32::INFINITY, |radius| radius * radius);
        let mut best: Option<(f32, EntityHandle)> = None;
        for (handle, entity) in self.entities.iter() {
            if handle == from || !entity.alive || !entity.is_active() || !entity.is_free() {
                continue;
            }
            let distance = origin.distance_squared(entity.pos.truncate());
            if distance > limit || !filter(handle, entity) {
                continue;
            }
            if best.map_or(true, |(best_distance, _)| distance < best_distance) {
                best = Some((distance, handle));
            }
        }
        best.map(|(_, handle)| handle)
    }

    /// Active entities whose position lies within `radius` of `center`.
    pub fn entities_near(&self, center: Vec3, radius: f32) -> Vec<EntityHandle> {
        let limit = radius * radius;
        self.entities
            .iter()
            .filter(|(_, entity)| entity.is_active() && entity.pos.distance_squared(center) <= limit)
            .map(|(handle, _)| handle)
            .collect()
    }

    /// Tell every teammate of `caller` that it needs help.
    pub fn call_for_help(&mut self, caller: EntityHandle) -> usize {
        let Some(team) = self.entities.get(caller).map(|entity| entity.team) else {
            return 0;
        };
        let mut told = 0;
        for (handle, entity) in self.entities.iter_mut() {
            if handle != caller && entity.team == team && entity.alive {
                entity.ai.raise(AlertFlags::CALLEDFORHELP);
                told += 1;
            }
        }
        told
    }

    /// Give every living teammate of `issuer` an order. Each recipient gets
    /// its position in the chain as `order_counter`.
    pub fn issue_order(&mut self, issuer: EntityHandle, value: i32) -> usize {
        let Some(team) = self.entities.get(issuer).map(|entity| entity.team) else {
            return 0;
        };
        let recipients: Vec<EntityHandle> = self
            .entities
            .iter()
            .filter(|(handle, entity)| *handle != issuer && entity.team == team && entity.alive)
            .map(|(handle, _)| handle)
            .collect();
        for (counter, handle) in recipients.iter().enumerate() {
            if let Some(entity) = self.entities.get_mut(*handle) {
                entity.ai.order_value = value;
                entity.ai.order_counter = counter as i32;
                entity.ai.raise(AlertFlags::ORDERED);
            }
        }
        recipients.len()
    }

    /// Snap everything `holder` carries, at any depth, to its position.
    pub fn sync_attached(&mut self, holder: EntityHandle) {
        let Some(entity) = self.entities.get(holder) else {
            return;
        };
        let (pos, vel, facing) = (entity.pos, entity.vel, entity.facing);
        let mut pending = vec![holder];
        let mut visited = vec![holder];
        while let Some(current) = pending.pop() {
            let Some(entity) = self.entities.get(current) else {
                continue;
            };
            let carried: Vec<EntityHandle> = entity
                .held
                .iter()
                .flatten()
                .copied()
                .chain(entity.inventory.iter().map(|(_, item)| item))
                .filter(|item| !visited.contains(item))
                .collect();
            for item in carried {
                if let Some(entity) = self.entities.get_mut(item) {
                    entity.pos = pos;
                    entity.old_pos = pos;
                    entity.vel = vel;
                    entity.facing = facing;
                }
                visited.push(item);
                pending.push(item);
            }
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(SimSettings::default(), TerrainMesh::default())
    }
}
