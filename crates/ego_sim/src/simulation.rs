//! Tick orchestration
//!
//! One tick runs these phases in order:
//!
//! 1. reap, advance time, clear alerts, timers, regeneration and enchants
//! 2. waypoint steering
//! 3. collision detection
//! 4. collision resolution, including crushing by closing passages
//! 5. integration of entity motion
//! 6. particle motion and expiry
//! 7. one script run per entity in play at the start of the phase
//!
//! Side effects stay queued in `world.effects` for the caller.

use ego_core::{Effect, SimSettings, TerrainMesh, World};
use ego_metrics::{metrics, time_phase, PhaseProfiler, TickCounter, TickCounters, TickPhase, TickTimer};
use ego_physics::{motion, CollisionDetector, CollisionResolver, DetectStats, ResolveStats};
use ego_script::{FallbackError, ScriptEngine, ScriptLibrary, TickStats};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// What one tick did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub tick: u64,
    pub reaped: usize,
    pub pairs: usize,
    pub detect: DetectStats,
    pub resolve: ResolveStats,
    pub particles_expired: usize,
    pub scripts: TickStats,
}

pub struct Simulation {
    pub world: World,
    pub library: ScriptLibrary,
    detector: CollisionDetector,
    resolver: CollisionResolver,
    engine: ScriptEngine,
    profiler: PhaseProfiler,
    counters: TickCounters,
    timer: TickTimer,
}

impl Simulation {
    pub fn new(world: World) -> Self {
        Self {
            detector: CollisionDetector::new(&world.settings.physics),
            library: ScriptLibrary::new(&world.settings.script),
            resolver: CollisionResolver::new(),
            engine: ScriptEngine::new(),
            profiler: PhaseProfiler::new(),
            counters: TickCounters::new(60),
            timer: TickTimer::new(60),
            world,
        }
    }

    pub fn with_settings(settings: SimSettings, mesh: TerrainMesh) -> Self {
        Self::new(World::new(settings, mesh))
    }

    /// Load every file in `dir`, in file name order. Scripts that fail to
    /// load are registered as no-ops and returned.
    pub fn load_scripts(&mut self, dir: &Path) -> std::io::Result<Vec<FallbackError>> {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| path.is_file())
            .collect();
        paths.sort();

        let mut failures = Vec::new();
        for path in &paths {
            if let Err(error) = self.library.load_file(path) {
                failures.push(error);
            }
        }
        info!(
            dir = %dir.display(),
            loaded = paths.len() - failures.len(),
            failed = failures.len(),
            "scripts loaded"
        );
        Ok(failures)
    }

    pub fn tick(&mut self) -> TickReport {
        self.timer.begin();

        let reaped = time_phase!(self.profiler, TickPhase::BeginTick, { self.world.begin_tick() });
        time_phase!(self.profiler, TickPhase::Steer, { motion::steer(&mut self.world) });
        let pairs = time_phase!(self.profiler, TickPhase::Detect, { self.detector.detect(&self.world) });
        let resolve = time_phase!(self.profiler, TickPhase::Resolve, {
            self.resolver.resolve(&mut self.world, &pairs)
        });
        time_phase!(self.profiler, TickPhase::Integrate, { motion::integrate(&mut self.world) });
        let particles_expired = time_phase!(self.profiler, TickPhase::Particles, {
            motion::update_particles(&mut self.world)
        });
        let scripts = time_phase!(self.profiler, TickPhase::Scripts, {
            self.engine.run_tick(&mut self.world, &self.library)
        });

        let report = TickReport {
            tick: self.world.time.tick_count(),
            reaped,
            pairs: pairs.len(),
            detect: self.detector.stats(),
            resolve,
            particles_expired,
            scripts,
        };

        metrics! {
            self.counters.add(TickCounter::PairsFound, report.pairs);
            self.counters.add(TickCounter::PairsResolved, resolve.resolved);
            self.counters.add(TickCounter::ScriptsRun, scripts.scripts_run);
            self.counters.add(TickCounter::Opcodes, scripts.instructions);
            self.counters.add(TickCounter::Reaped, reaped);
            self.counters.end_tick();
        }
        self.timer.end();

        debug!(
            tick = report.tick,
            entities = self.world.entities.len(),
            pairs = report.pairs,
            resolved = resolve.resolved,
            scripts = scripts.scripts_run,
            opcodes = scripts.instructions,
            reaped,
            "tick"
        );
        report
    }

    /// Run `ticks` ticks, returning the last report.
    pub fn run(&mut self, ticks: u64) -> TickReport {
        let mut report = TickReport::default();
        for _ in 0..ticks {
            report = self.tick();
        }
        report
    }

    /// Hand queued side effects to the shell.
    pub fn drain_effects(&mut self) -> Vec<Effect> {
        self.world.effects.drain().collect()
    }

    pub fn detector(&self) -> &CollisionDetector {
        &self.detector
    }

    pub fn engine(&self) -> &ScriptEngine {
        &self.engine
    }

    pub fn profiler(&self) -> &PhaseProfiler {
        &self.profiler
    }

    pub fn counters(&self) -> &TickCounters {
        &self.counters
    }

    pub fn timer(&self) -> &TickTimer {
        &self.timer
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new(World::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ego_core::glam::Vec3;
    use ego_core::{AlertFlags, Profile, TeamId};

    #[test]
    fn tick_advances_time_and_runs_scripts() {
        let mut sim = Simulation::default();
        let id = sim.library.load_source("counter", "argument = argument + 1").expect("loads");
        let mut profile = Profile::named("Counter");
        profile.script = Some(id);
        let profile = sim.world.profiles.register(profile);
        let handle = sim
            .world
            .spawn(profile, Vec3::new(500.0, 500.0, 0.0), Some(TeamId::GOOD), 0, 0)
            .expect("spawn");

        let report = sim.run(3);
        assert_eq!(report.tick, 3);
        assert_eq!(report.scripts.scripts_run, 1);
        let entity = sim.world.get(handle).expect("entity");
        assert_eq!(entity.ai.registers.argument, 3);
        assert!(!entity.ai.is_alerted(AlertFlags::SPAWNED));
        metrics! {
            assert_eq!(sim.timer().ticks(), 3);
            assert_eq!(sim.counters().total(TickCounter::ScriptsRun), 3);
        }
    }

    #[test]
    fn effects_drain_once() {
        let mut sim = Simulation::default();
        let id = sim.library.load_source("noisy", "argument = 9\nPlaySound").expect("loads");
        let mut profile = Profile::named("Noisy");
        profile.script = Some(id);
        let profile = sim.world.profiles.register(profile);
        sim.world
            .spawn(profile, Vec3::new(500.0, 500.0, 0.0), Some(TeamId::GOOD), 0, 0)
            .expect("spawn");

        sim.tick();
        let effects = sim.drain_effects();
        assert_eq!(effects.len(), 1);
        assert!(matches!(effects[0], Effect::PlaySound { sound: 9, .. }));
        assert!(sim.drain_effects().is_empty());
    }
}
