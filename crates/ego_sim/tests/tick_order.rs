//! Phase ordering, alert lifetime and handle lifetime across ticks

mod common;

use common::{plain, scripted, spawn, state};
use ego_core::glam::Vec3;
use ego_core::{AlertFlags, TeamId};
use ego_sim::Simulation;

#[test]
fn spawned_alert_lasts_until_first_run() {
    let mut sim = Simulation::default();
    let watcher = scripted(&mut sim, "Watcher", "IfSpawned\n  argument = 1\n  SetState");
    let me = spawn(&mut sim, watcher, 500.0, 500.0, TeamId::GOOD);

    sim.tick();
    assert_eq!(state(&sim, me), 1);
    // Alerts stay readable until the next tick begins.
    assert!(sim.world.get(me).expect("me").ai.is_alerted(AlertFlags::SPAWNED));

    sim.tick();
    assert!(!sim.world.get(me).expect("me").ai.is_alerted(AlertFlags::SPAWNED));
}

#[test]
fn entity_spawned_by_script_runs_next_tick() {
    let mut sim = Simulation::default();
    let child = scripted(&mut sim, "Child", "IfSpawned\n  argument = 7\n  SetState");
    let source = format!(
        "IfSpawned\n  x = 900\n  y = 900\n  argument = {}\n  SpawnCharacter",
        child.0
    );
    let parent = scripted(&mut sim, "Parent", &source);
    let me = spawn(&mut sim, parent, 500.0, 500.0, TeamId::GOOD);

    let report = sim.tick();
    assert_eq!(report.scripts.scripts_run, 1);
    let kid = sim.world.get(me).expect("parent").ai.child.expect("child");
    let entity = sim.world.get(kid).expect("child");
    assert!(!entity.ai.has_run);
    assert!(entity.ai.is_alerted(AlertFlags::SPAWNED));
    assert_eq!(entity.ai.state, 0);

    let report = sim.tick();
    assert_eq!(report.scripts.scripts_run, 2);
    assert_eq!(state(&sim, kid), 7);

    sim.tick();
    assert!(!sim.world.get(kid).expect("child").ai.is_alerted(AlertFlags::SPAWNED));
}

#[test]
fn terminated_entity_finishes_the_tick() {
    let mut sim = Simulation::default();
    let hunter = scripted(&mut sim, "Hunter", "SetTargetToNearestFriend\n  PoofTarget");
    let counter = scripted(&mut sim, "Counter", "argument = self_state + 1\nSetState");
    spawn(&mut sim, hunter, 500.0, 500.0, TeamId::GOOD);
    let victim = spawn(&mut sim, counter, 900.0, 500.0, TeamId::GOOD);

    sim.tick();
    // Removed mid-phase, but its handle still resolves and it still ran.
    assert_eq!(state(&sim, victim), 1);
    assert!(!sim.world.entities.is_active(victim));

    let report = sim.tick();
    assert_eq!(report.reaped, 1);
    assert!(sim.world.get(victim).is_none());

    let body = plain(&mut sim, "Body");
    let newcomer = spawn(&mut sim, body, 900.0, 500.0, TeamId::GOOD);
    assert_ne!(newcomer, victim);
    assert!(sim.world.get(victim).is_none());
}

#[test]
fn failed_condition_takes_else_branch() {
    let mut sim = Simulation::default();
    let profile = scripted(
        &mut sim,
        "Loner",
        "IfTargetExists\n  x = 1\nElse\n  x = 2\n  IfTargetExists\n    x = 3\ny = x + 10",
    );
    let me = spawn(&mut sim, profile, 500.0, 500.0, TeamId::GOOD);
    sim.tick();
    let regs = sim.world.get(me).expect("me").ai.registers;
    assert_eq!((regs.x, regs.y), (2, 12));
}

#[test]
fn scripts_run_in_creation_order() {
    let mut sim = Simulation::default();
    // Each entity takes its nearest friend's state plus one.
    let stamp = scripted(
        &mut sim,
        "Stamp",
        "SetTargetToNearestFriend\n  argument = target_state + 1\n  SetState",
    );
    let first = spawn(&mut sim, stamp, 500.0, 500.0, TeamId::GOOD);
    let second = spawn(&mut sim, stamp, 900.0, 500.0, TeamId::GOOD);

    sim.tick();
    // First runs before second, so second sees first's fresh state.
    assert_eq!(state(&sim, first), 1);
    assert_eq!(state(&sim, second), 2);
}

#[test]
fn contact_alert_is_seen_once_then_cleared() {
    let mut sim = Simulation::default();
    let feeler = scripted(&mut sim, "Feeler", "IfBumped\n  argument = self_state + 1\n  SetState");
    let me = spawn(&mut sim, feeler, 500.0, 500.0, TeamId::GOOD);
    let other = spawn(&mut sim, feeler, 530.0, 500.0, TeamId::GOOD);

    let report = sim.tick();
    assert!(report.resolve.resolved >= 1);
    assert_eq!(state(&sim, me), 1);
    assert_eq!(state(&sim, other), 1);
    assert!(sim.world.get(me).expect("me").ai.is_alerted(AlertFlags::BUMPED));

    // Pull them apart so the contact has ended.
    let body = sim.world.get_mut(other).expect("other");
    body.pos = Vec3::new(1500.0, 1500.0, 0.0);
    body.vel = Vec3::ZERO;
    sim.world.get_mut(me).expect("me").vel = Vec3::ZERO;

    let report = sim.tick();
    assert_eq!(report.resolve.resolved, 0);
    for handle in [me, other] {
        assert!(!sim.world.get(handle).expect("body").ai.is_alerted(AlertFlags::BUMPED));
        assert_eq!(state(&sim, handle), 1);
    }
}
