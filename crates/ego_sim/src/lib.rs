//! Ego Engine Simulation
//!
//! Drives the world one tick at a time:
//! - Tick-boundary bookkeeping, collision detection and resolution
//! - Motion and particle integration
//! - One script pass per entity
//! - Scenario files for headless runs

pub mod scenario;
pub mod simulation;

pub use scenario::{Scenario, ScenarioError};
pub use simulation::{Simulation, TickReport};

pub use ego_core::VERSION;
