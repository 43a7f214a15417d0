//! Deterministic time system
//!
//! Fixed 50Hz simulation tick; every countdown in the core is in ticks.

use std::time::Duration;

/// Fixed simulation tick rate (50 Hz = 20ms per tick)
pub const TICK_RATE_HZ: u32 = 50;
pub const TICK_DURATION: Duration = Duration::from_millis(20);

/// Convert whole seconds to ticks.
pub const fn seconds_to_ticks(seconds: u32) -> u32 {
    seconds * TICK_RATE_HZ
}

/// Simulation time tracker
#[derive(Debug, Clone, Default)]
pub struct SimulationTime {
    tick_count: u64,
}

impl SimulationTime {
    pub fn new() -> Self {
        Self { tick_count: 0 }
    }

    /// Index of the tick currently executing (0 before the first tick).
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn advance_tick(&mut self) {
        self.tick_count += 1;
    }

    /// True on the first tick of every simulated second.
    pub fn is_second_boundary(&self) -> bool {
        self.tick_count % TICK_RATE_HZ as u64 == 0
    }

    pub fn total_time(&self) -> Duration {
        TICK_DURATION * self.tick_count as u32
    }
}
