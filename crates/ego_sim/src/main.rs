//! Ego Engine headless harness
//!
//! Runs a scenario for a number of ticks and reports what happened.
//!
//! ```text
//! egosim <scenario.json> [ticks]
//! ```

use anyhow::{bail, Context, Result};
use ego_metrics::metrics;
use ego_sim::Scenario;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Initialize logging (RUST_LOG overrides)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next().map(PathBuf::from) else {
        bail!("usage: egosim <scenario.json> [ticks]");
    };
    let scenario = Scenario::load(&path).with_context(|| format!("loading {}", path.display()))?;
    let ticks = match args.next() {
        Some(text) => text
            .parse::<u64>()
            .with_context(|| format!("`{text}` is not a tick count"))?,
        None => scenario.ticks,
    };

    tracing::info!("Ego Engine v{}", ego_sim::VERSION);
    let base = path.parent().unwrap_or(Path::new("."));
    let mut sim = scenario.build(base).context("building scenario")?;

    tracing::info!(ticks, "running");
    for _ in 0..ticks {
        sim.tick();
        for effect in sim.drain_effects() {
            tracing::debug!(?effect, "effect");
        }
    }

    let alive = sim.world.entities.iter().filter(|(_, entity)| entity.alive).count();
    tracing::info!(
        ticks = sim.world.time.tick_count(),
        entities = sim.world.entities.len(),
        alive,
        particles = sim.world.particles.len(),
        scripts_run = sim.engine().total().scripts_run,
        "finished"
    );

    metrics! {
        let timer = sim.timer();
        let (min, max) = timer.tick_time_range_ms();
        tracing::info!(
            "tick {:.3} ms avg ({:.3}..{:.3}), {:.0} ticks/s",
            timer.tick_time_ms(),
            min,
            max,
            timer.ticks_per_second()
        );
        for phase in ego_metrics::TickPhase::ALL {
            let total = sim.profiler().total(phase);
            tracing::info!(phase = phase.name(), total_ms = total.as_secs_f64() * 1000.0, "phase");
        }
        for counter in ego_metrics::TickCounter::ALL {
            let counters = sim.counters();
            tracing::info!(
                counter = counter.name(),
                total = counters.total(counter),
                per_tick = counters.average(counter),
                "counter"
            );
        }
    }

    Ok(())
}
