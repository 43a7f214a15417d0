//! Shared setup for tick-level tests

#![allow(dead_code)]

use ego_core::glam::Vec3;
use ego_core::math::FACE_NORTH;
use ego_core::{EntityHandle, Profile, ProfileId, TeamId};
use ego_sim::Simulation;

/// Register a profile running `source`.
pub fn scripted(sim: &mut Simulation, class_name: &str, source: &str) -> ProfileId {
    let id = sim
        .library
        .load_source(class_name, source)
        .unwrap_or_else(|error| panic!("{error}"));
    let mut profile = Profile::named(class_name);
    profile.script = Some(id);
    sim.world.profiles.register(profile)
}

pub fn plain(sim: &mut Simulation, class_name: &str) -> ProfileId {
    sim.world.profiles.register(Profile::named(class_name))
}

pub fn spawn(sim: &mut Simulation, profile: ProfileId, x: f32, y: f32, team: TeamId) -> EntityHandle {
    sim.world
        .spawn(profile, Vec3::new(x, y, 0.0), Some(team), 0, FACE_NORTH)
        .expect("spawn")
}

pub fn state(sim: &Simulation, handle: EntityHandle) -> i32 {
    sim.world.get(handle).expect("entity").ai.state
}
