//! Ego Metrics - tick instrumentation
//!
//! Phase timings and event counters for the simulation tick. Everything
//! except the phase and counter names vanishes without the `metrics`
//! feature.
//!
//! # Feature Flags
//!
//! - `metrics` - Enable collection (default: disabled)
//!
//! # Usage
//!
//! ```ignore
//! use ego_metrics::{time_phase, PhaseProfiler, TickPhase};
//!
//! let mut profiler = PhaseProfiler::new();
//! let pairs = time_phase!(profiler, TickPhase::Detect, { detector.detect(&world) });
//! ```
//!
//! The macros test `feature = "metrics"` in the calling crate, so callers
//! forward their own `metrics` feature to this one.

mod phase;

#[cfg(feature = "metrics")]
mod counters;
#[cfg(feature = "metrics")]
mod phase_profiler;
#[cfg(feature = "metrics")]
mod ring_buffer;
#[cfg(feature = "metrics")]
mod tick_timer;

pub use phase::{TickCounter, TickPhase};

#[cfg(feature = "metrics")]
pub use counters::TickCounters;
#[cfg(feature = "metrics")]
pub use phase_profiler::PhaseProfiler;
#[cfg(feature = "metrics")]
pub use ring_buffer::RingBuffer;
#[cfg(feature = "metrics")]
pub use tick_timer::TickTimer;

// ============================================================================
// Macros for conditional compilation
// ============================================================================

/// Execute code only when metrics are enabled
#[macro_export]
macro_rules! metrics {
    ($($tt:tt)*) => {
        #[cfg(feature = "metrics")]
        {
            $($tt)*
        }
    };
}

/// Time a block as one tick phase (plain block when metrics are disabled)
#[macro_export]
macro_rules! time_phase {
    ($profiler:expr, $phase:expr, $body:block) => {{
        #[cfg(feature = "metrics")]
        let result = $profiler.time_phase($phase, || $body);
        #[cfg(not(feature = "metrics"))]
        let result = $body;
        result
    }};
}

// ============================================================================
// No-op stubs when metrics disabled
// ============================================================================

#[cfg(not(feature = "metrics"))]
#[derive(Default)]
pub struct TickTimer;

#[cfg(not(feature = "metrics"))]
impl TickTimer {
    pub fn new(_window: usize) -> Self { Self }
    pub fn begin(&mut self) {}
    pub fn end(&mut self) {}
    pub fn ticks(&self) -> u64 { 0 }
    pub fn ticks_per_second(&self) -> f64 { 0.0 }
    pub fn tick_time_ms(&self) -> f64 { 0.0 }
    pub fn tick_time_range_ms(&self) -> (f64, f64) { (0.0, 0.0) }
}

#[cfg(not(feature = "metrics"))]
#[derive(Default)]
pub struct PhaseProfiler;

#[cfg(not(feature = "metrics"))]
impl PhaseProfiler {
    pub fn new() -> Self { Self }
    pub fn time_phase<F, R>(&mut self, _phase: TickPhase, f: F) -> R where F: FnOnce() -> R { f() }
    pub fn last(&self, _phase: TickPhase) -> std::time::Duration { std::time::Duration::ZERO }
    pub fn total(&self, _phase: TickPhase) -> std::time::Duration { std::time::Duration::ZERO }
    pub fn reset(&mut self) {}
}

#[cfg(not(feature = "metrics"))]
#[derive(Default)]
pub struct TickCounters;

#[cfg(not(feature = "metrics"))]
impl TickCounters {
    pub fn new(_window: usize) -> Self { Self }
    pub fn add(&mut self, _counter: TickCounter, _value: usize) {}
    pub fn get(&self, _counter: TickCounter) -> usize { 0 }
    pub fn total(&self, _counter: TickCounter) -> u64 { 0 }
    pub fn average(&self, _counter: TickCounter) -> f64 { 0.0 }
    pub fn end_tick(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_available_with_or_without_metrics() {
        let mut timer = TickTimer::new(60);
        let mut profiler = PhaseProfiler::new();
        let mut counters = TickCounters::new(60);
        timer.begin();
        let value = time_phase!(profiler, TickPhase::Scripts, { 2 + 2 });
        counters.add(TickCounter::ScriptsRun, value);
        counters.end_tick();
        timer.end();
        assert_eq!(value, 4);
        metrics! {
            assert_eq!(timer.ticks(), 1);
            assert_eq!(counters.total(TickCounter::ScriptsRun), 4);
        }
    }
}
