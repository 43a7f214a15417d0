//! Collision detection
//!
//! Runs in two tiers. The coarse tier registers every free entity's swept
//! volume in the dynamic index and asks the terrain partition for nearby
//! blocking tiles. The fine tier sweeps each candidate pair of octagons
//! against each other over the tick to find when, if ever, they touch.
//! Rider/platform contact is checked separately before the general sweep.

use crate::bsp::{BlockingTile, TerrainBsp};
use crate::index::DynamicIndex;
use crate::octbox::{sweep_interval, OctBox, AXES};
use crate::pair::{canonicalize, CollisionPair, Participant};
use glam::Vec3;
use ego_core::{Entity, EntityHandle, PhysicsSettings, World};

/// Entity that takes part in detection this tick.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    handle: EntityHandle,
    bounds: OctBox,
    vel: Vec3,
    platform: bool,
    can_use_platforms: bool,
    flying: bool,
    bottom: f32,
    top: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DetectStats {
    pub candidates: usize,
    pub entity_pairs: usize,
    pub particle_pairs: usize,
    pub tile_pairs: usize,
}

#[derive(Debug, Clone)]
pub struct CollisionDetector {
    bsp: Option<TerrainBsp>,
    index: DynamicIndex,
    candidates: Vec<Candidate>,
    scratch: Vec<usize>,
    tiles: Vec<BlockingTile>,
    stats: DetectStats,
}

impl CollisionDetector {
    pub fn new(settings: &PhysicsSettings) -> Self {
        Self {
            bsp: None,
            index: DynamicIndex::new(settings.index_cell_size),
            candidates: Vec::new(),
            scratch: Vec::new(),
            tiles: Vec::new(),
            stats: DetectStats::default(),
        }
    }

    pub fn stats(&self) -> DetectStats {
        self.stats
    }

    /// Terrain partition, if one has been built.
    pub fn terrain(&self) -> Option<&TerrainBsp> {
        self.bsp.as_ref()
    }

    /// Does this entity take part in detection on `tick`?
    ///
    /// Held and packed entities ride along with their holder, terminated
    /// ones are on their way out, and anything spawned during `tick` waits
    /// for the next one.
    pub fn participates(entity: &Entity, tick: u64) -> bool {
        entity.is_active() && entity.is_free() && entity.spawn_tick < tick
    }

    /// Produce the canonical, duplicate-free list of pairs for this tick.
    pub fn detect(&mut self, world: &World) -> Vec<CollisionPair> {
        let settings = &world.settings.physics;
        let tick = world.time.tick_count();
        self.refresh_terrain(world);

        self.index.clear();
        self.candidates.clear();
        for (handle, entity) in world.entities.iter() {
            if !Self::participates(entity, tick) {
                continue;
            }
            let bounds = OctBox::from_bumper(entity.pos, &entity.bumper, settings.min_extent);
            let vel = if entity.vel.is_finite() { entity.vel } else { Vec3::ZERO };
            self.index.insert(bounds.swept(vel));
            self.candidates.push(Candidate {
                handle,
                bounds,
                vel,
                platform: entity.phys.platform,
                can_use_platforms: entity.phys.can_use_platforms,
                flying: entity.phys.flying,
                bottom: entity.pos.z,
                top: entity.top(),
            });
        }

        let mut pairs = Vec::new();
        let mut stats = DetectStats {
            candidates: self.candidates.len(),
            ..DetectStats::default()
        };

        for i in 0..self.candidates.len() {
            let a = self.candidates[i];
            let swept = a.bounds.swept(a.vel);
            let mut scratch = std::mem::take(&mut self.scratch);
            self.index.query(&swept, &mut scratch);
            for &j in &scratch {
                if j <= i {
                    continue;
                }
                let b = self.candidates[j];
                if let Some(pair) = test_entities(&a, &b, settings.platform_tolerance) {
                    pairs.push(pair);
                    stats.entity_pairs += 1;
                }
            }
            self.scratch = scratch;

            self.tiles.clear();
            if let Some(bsp) = &self.bsp {
                bsp.query(&swept, &mut self.tiles);
            }
            for tile in &self.tiles {
                let blocks = if a.flying {
                    tile.fx.contains(ego_core::TileFx::WALL)
                } else {
                    true
                };
                if !blocks {
                    continue;
                }
                let (min, max) = world.mesh.tile_bounds(tile.tx, tile.ty);
                let tile_box = OctBox::from_tile(min, max);
                if let Some((tmin, tmax)) = sweep_interval(&a.bounds, a.vel, &tile_box, Vec3::ZERO) {
                    pairs.push(CollisionPair {
                        a: a.handle,
                        b: Participant::Tile {
                            tx: tile.tx,
                            ty: tile.ty,
                        },
                        tmin,
                        tmax,
                        overlap: a.bounds.translate(a.vel * tmin).overlap_depths(&tile_box),
                        platform: None,
                    });
                    stats.tile_pairs += 1;
                }
            }
        }

        for (handle, particle) in world.particles.iter() {
            if !particle.is_live() || particle.spawn_tick >= tick {
                continue;
            }
            let bounds = OctBox::from_sphere(particle.pos, particle.radius, settings.min_extent);
            let vel = if particle.vel.is_finite() { particle.vel } else { Vec3::ZERO };
            let mut scratch = std::mem::take(&mut self.scratch);
            self.index.query(&bounds.swept(vel), &mut scratch);
            for &j in &scratch {
                let target = self.candidates[j];
                if particle.owner == Some(target.handle) || particle.attached_to == Some(target.handle) {
                    continue;
                }
                if let Some((tmin, tmax)) = sweep_interval(&target.bounds, target.vel, &bounds, vel) {
                    pairs.push(CollisionPair {
                        a: target.handle,
                        b: Participant::Particle(handle),
                        tmin,
                        tmax,
                        overlap: target
                            .bounds
                            .translate(target.vel * tmin)
                            .overlap_depths(&bounds.translate(vel * tmin)),
                        platform: None,
                    });
                    stats.particle_pairs += 1;
                }
            }
            self.scratch = scratch;
        }

        canonicalize(&mut pairs);
        tracing::trace!(?stats, pairs = pairs.len(), "detection finished");
        self.stats = stats;
        pairs
    }

    fn refresh_terrain(&mut self, world: &World) {
        let leaf_tiles = world.settings.physics.bsp_leaf_tiles;
        let stale = self
            .bsp
            .as_ref()
            .map_or(true, |bsp| bsp.is_stale(&world.mesh, leaf_tiles));
        if stale {
            self.bsp = Some(TerrainBsp::build(&world.mesh, leaf_tiles));
        }
    }
}

/// Platform test: is `rider` coming to rest on top of `platform`?
fn test_platform(rider: &Candidate, platform: &Candidate, tolerance: f32) -> bool {
    if !platform.platform || rider.platform || !rider.can_use_platforms || rider.flying {
        return false;
    }
    if rider.vel.z > 0.0 {
        return false;
    }
    let rider_end = rider.bounds.translate(rider.vel);
    let platform_end = platform.bounds.translate(platform.vel);
    if !rider.bounds.overlaps_xy(&platform.bounds) && !rider_end.overlaps_xy(&platform_end) {
        return false;
    }
    let top = platform.top;
    let lowest = rider.bottom + rider.vel.z.min(0.0);
    rider.bottom >= top - tolerance && lowest <= top + tolerance
}

fn test_entities(a: &Candidate, b: &Candidate, tolerance: f32) -> Option<CollisionPair> {
    if a.handle == b.handle {
        return None;
    }
    for (rider, platform) in [(a, b), (b, a)] {
        if test_platform(rider, platform, tolerance) {
            let mut pair = CollisionPair::entities(
                a.handle,
                b.handle,
                0.0,
                1.0,
                rider.bounds.overlap_depths(&platform.bounds),
            );
            pair.platform = Some(platform.handle);
            return Some(pair);
        }
    }
    let (tmin, tmax) = sweep_interval(&a.bounds, a.vel, &b.bounds, b.vel)?;
    let overlap: [f32; AXES] = a
        .bounds
        .translate(a.vel * tmin)
        .overlap_depths(&b.bounds.translate(b.vel * tmin));
    Some(CollisionPair::entities(a.handle, b.handle, tmin, tmax, overlap))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pair::PairKind;
    use ego_core::math::FACE_NORTH;
    use ego_core::{Hand, Profile, TileFx, TILE_SIZE};

    fn setup() -> (World, ego_core::ProfileId, ego_core::ProfileId) {
        let mut world = World::default();
        let body = world.profiles.register(Profile::named("Body"));
        let mut item = Profile::named("Sword");
        item.item.is_item = true;
        let item = world.profiles.register(item);
        world.time.advance_tick();
        (world, body, item)
    }

    fn at(x: f32, y: f32) -> Vec3 {
        Vec3::new(x, y, 0.0)
    }

    #[test]
    fn finds_touching_entities_once() {
        let (mut world, body, _) = setup();
        let a = world.spawn(body, at(500.0, 500.0), None, 0, FACE_NORTH).expect("a");
        let b = world.spawn(body, at(540.0, 500.0), None, 0, FACE_NORTH).expect("b");
        let _far = world.spawn(body, at(900.0, 900.0), None, 0, FACE_NORTH).expect("far");
        world.time.advance_tick();

        let mut detector = CollisionDetector::new(&world.settings.physics);
        let pairs = detector.detect(&world);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].a, a.min(b));
        assert_eq!(pairs[0].b, Participant::Entity(a.max(b)));
        assert_eq!(pairs[0].kind(), PairKind::EntityEntity);
    }

    #[test]
    fn held_items_never_pair() {
        let (mut world, body, item) = setup();
        let holder = world.spawn(body, at(500.0, 500.0), None, 0, FACE_NORTH).expect("holder");
        let other = world.spawn(body, at(520.0, 500.0), None, 0, FACE_NORTH).expect("other");
        let sword = world.spawn(item, at(500.0, 500.0), None, 0, FACE_NORTH).expect("sword");
        world.grab(holder, sword, Hand::Left).expect("grab");
        world.time.advance_tick();

        let pairs = CollisionDetector::new(&world.settings.physics).detect(&world);
        assert!(pairs.iter().all(|pair| !pair.involves(sword)));
        assert!(pairs.iter().any(|pair| pair.involves(holder) && pair.involves(other)));
    }

    #[test]
    fn spawned_this_tick_is_skipped() {
        let (mut world, body, _) = setup();
        world.spawn(body, at(500.0, 500.0), None, 0, FACE_NORTH).expect("a");
        world.spawn(body, at(510.0, 500.0), None, 0, FACE_NORTH).expect("b");
        let pairs = CollisionDetector::new(&world.settings.physics).detect(&world);
        assert!(pairs.is_empty());
    }

    #[test]
    fn walls_pair_with_walkers() {
        let (mut world, body, _) = setup();
        world.mesh.add_fx(5, 4, TileFx::IMPASSABLE);
        let walker = world
            .spawn(body, at(4.9 * TILE_SIZE, 4.5 * TILE_SIZE), None, 0, FACE_NORTH)
            .expect("walker");
        world.get_mut(walker).expect("walker").vel = Vec3::new(30.0, 0.0, 0.0);
        world.time.advance_tick();

        let pairs = CollisionDetector::new(&world.settings.physics).detect(&world);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].b, Participant::Tile { tx: 5, ty: 4 });
    }

    #[test]
    fn platform_pairs_are_flagged() {
        let (mut world, body, _) = setup();
        let mut crate_profile = Profile::named("Crate");
        crate_profile.platform = true;
        crate_profile.bumper = ego_core::Bumper::new(40.0, 10.0);
        let crate_profile = world.profiles.register(crate_profile);
        let platform = world.spawn(crate_profile, at(500.0, 500.0), None, 0, FACE_NORTH).expect("platform");
        let rider = world
            .spawn(body, Vec3::new(500.0, 500.0, 14.0), None, 0, FACE_NORTH)
            .expect("rider");
        world.get_mut(rider).expect("rider").vel = Vec3::new(0.0, 0.0, -6.0);
        world.time.advance_tick();

        let pairs = CollisionDetector::new(&world.settings.physics).detect(&world);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].platform, Some(platform));
        assert!(pairs[0].involves(rider));
    }

    #[test]
    fn random_crowds_yield_canonical_pairs() {
        use rand::rngs::SmallRng;
        use rand::{Rng, SeedableRng};

        for seed in [3u64, 11, 29] {
            let (mut world, body, _) = setup();
            let mut rng = SmallRng::seed_from_u64(seed);
            for _ in 0..60 {
                let pos = at(rng.gen_range(200.0..1200.0), rng.gen_range(200.0..1200.0));
                let handle = world.spawn(body, pos, None, 0, FACE_NORTH).expect("body");
                world.get_mut(handle).expect("body").vel =
                    Vec3::new(rng.gen_range(-15.0..15.0), rng.gen_range(-15.0..15.0), 0.0);
            }
            world.time.advance_tick();

            let pairs = CollisionDetector::new(&world.settings.physics).detect(&world);
            assert!(!pairs.is_empty(), "seed {seed}");
            assert!(pairs.windows(2).all(|w| w[0].key() < w[1].key()), "seed {seed}");
            for pair in &pairs {
                assert!(pair.tmin <= pair.tmax, "seed {seed}");
                if let Participant::Entity(b) = pair.b {
                    assert!(pair.a < b, "seed {seed}");
                }
            }
        }
    }
}
