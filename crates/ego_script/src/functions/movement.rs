//! Waypoints, facing and position

use super::{update_self, FunctionEntry};
use crate::context::ScriptContext;
use ego_core::glam::{Vec2, Vec3};
use ego_core::math::facing_to_vec;
use ego_core::TurnMode;

pub(super) const FUNCTIONS: &[FunctionEntry] = entries![
    "ClearWaypoints" => clear_waypoints,
    "AddWaypoint" => add_waypoint,
    "Compass" => compass,
    "SetTurnModeToVelocity" => set_turn_mode_to_velocity,
    "SetTurnModeToWatch" => set_turn_mode_to_watch,
    "SetTurnModeToSpin" => set_turn_mode_to_spin,
    "SetTurnModeToWatchTarget" => set_turn_mode_to_watch_target,
    "TurnFaceToTarget" => turn_face_to_target,
    "SetFacingToTurn" => set_facing_to_turn,
    "Teleport" => teleport,
    "Stop" => stop,
    "AccelerateUp" => accelerate_up,
];

fn clear_waypoints(ctx: &mut ScriptContext<'_>) -> bool {
    update_self(ctx, |me| me.ai.waypoints.clear())
}

/// Queue `(x, y)`; fails when the list is full.
fn add_waypoint(ctx: &mut ScriptContext<'_>) -> bool {
    let point = Vec2::new(ctx.regs.x as f32, ctx.regs.y as f32);
    ctx.me_mut().is_some_and(|me| me.ai.waypoints.push(point))
}

/// Move `(x, y)` by `distance` along `turn`.
fn compass(ctx: &mut ScriptContext<'_>) -> bool {
    let offset = facing_to_vec(ctx.regs.turn as u16) * ctx.regs.distance as f32;
    ctx.regs.x = ctx.regs.x.wrapping_add(offset.x.round() as i32);
    ctx.regs.y = ctx.regs.y.wrapping_add(offset.y.round() as i32);
    true
}

fn set_turn_mode(ctx: &mut ScriptContext<'_>, mode: TurnMode) -> bool {
    update_self(ctx, |me| me.ai.turn_mode = mode)
}

fn set_turn_mode_to_velocity(ctx: &mut ScriptContext<'_>) -> bool {
    set_turn_mode(ctx, TurnMode::Velocity)
}

fn set_turn_mode_to_watch(ctx: &mut ScriptContext<'_>) -> bool {
    set_turn_mode(ctx, TurnMode::Watch)
}

fn set_turn_mode_to_spin(ctx: &mut ScriptContext<'_>) -> bool {
    set_turn_mode(ctx, TurnMode::Spin)
}

fn set_turn_mode_to_watch_target(ctx: &mut ScriptContext<'_>) -> bool {
    set_turn_mode(ctx, TurnMode::WatchTarget)
}

fn turn_face_to_target(ctx: &mut ScriptContext<'_>) -> bool {
    let Some(facing) = ctx.target().and_then(|target| ctx.turn_to(target)) else {
        return false;
    };
    update_self(ctx, |me| me.facing = facing)
}

fn set_facing_to_turn(ctx: &mut ScriptContext<'_>) -> bool {
    let facing = ctx.regs.turn as u16;
    update_self(ctx, |me| me.facing = facing)
}

/// Jump to `(x, y)` facing `turn`.
fn teleport(ctx: &mut ScriptContext<'_>) -> bool {
    let pos = ctx.xy();
    let facing = ctx.regs.turn as u16;
    let me = ctx.me;
    ctx.world.teleport(me, pos, facing)
}

fn stop(ctx: &mut ScriptContext<'_>) -> bool {
    update_self(ctx, |me| {
        me.vel = Vec3::new(0.0, 0.0, me.vel.z);
        me.ai.waypoints.clear();
    })
}

/// Add `argument / 100` to vertical speed.
fn accelerate_up(ctx: &mut ScriptContext<'_>) -> bool {
    let boost = ctx.regs.argument as f32 / 100.0;
    update_self(ctx, |me| me.vel.z += boost)
}
