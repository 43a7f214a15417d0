//! Per-phase timing

use crate::phase::TickPhase;
use std::time::{Duration, Instant};

pub struct PhaseProfiler {
    last: [Duration; TickPhase::COUNT],
    total: [Duration; TickPhase::COUNT],
}

impl PhaseProfiler {
    pub fn new() -> Self {
        Self {
            last: [Duration::ZERO; TickPhase::COUNT],
            total: [Duration::ZERO; TickPhase::COUNT],
        }
    }

    pub fn time_phase<F, R>(&mut self, phase: TickPhase, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let start = Instant::now();
        let result = f();
        let elapsed = start.elapsed();
        self.last[phase as usize] = elapsed;
        self.total[phase as usize] += elapsed;
        result
    }

    /// Time spent in `phase` during the most recent tick.
    pub fn last(&self, phase: TickPhase) -> Duration {
        self.last[phase as usize]
    }

    pub fn total(&self, phase: TickPhase) -> Duration {
        self.total[phase as usize]
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn iter(&self) -> impl Iterator<Item = (TickPhase, Duration)> + '_ {
        TickPhase::ALL.into_iter().map(|phase| (phase, self.total(phase)))
    }
}

impl Default for PhaseProfiler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_per_phase() {
        let mut profiler = PhaseProfiler::new();
        let value = profiler.time_phase(TickPhase::Detect, || 7);
        assert_eq!(value, 7);
        profiler.time_phase(TickPhase::Detect, || std::thread::sleep(Duration::from_millis(1)));
        assert!(profiler.total(TickPhase::Detect) >= Duration::from_millis(1));
        assert!(profiler.last(TickPhase::Detect) <= profiler.total(TickPhase::Detect));
        assert_eq!(profiler.total(TickPhase::Scripts), Duration::ZERO);
    }
}
