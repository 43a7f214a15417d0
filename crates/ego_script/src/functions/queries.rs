//! Handlers that copy world state into registers

use super::{set_argument, FunctionEntry};
use crate::context::ScriptContext;

pub(super) const FUNCTIONS: &[FunctionEntry] = entries![
    "GetDistanceToTarget" => get_distance_to_target,
    "GetTurnToTarget" => get_turn_to_target,
    "GetTargetState" => get_target_state,
    "GetTargetContent" => get_target_content,
    "GetTargetLife" => get_target_life,
    "GetSelfLife" => get_self_life,
    "GetMoney" => get_money,
    "GetTargetTeam" => get_target_team,
    "GetAttackTurn" => get_attack_turn,
    "GetDamageType" => get_damage_type,
    "GetOrderValue" => get_order_value,
    "GetOrderCounter" => get_order_counter,
    "GetWaypointCount" => get_waypoint_count,
    "GetTeamMorale" => get_team_morale,
    "GetSpawnPosition" => get_spawn_position,
    "GetSelfPosition" => get_self_position,
    "GetTargetPosition" => get_target_position,
    "GetAmmo" => get_ammo,
];

fn get_distance_to_target(ctx: &mut ScriptContext<'_>) -> bool {
    let Some(distance) = ctx.target().and_then(|target| ctx.distance_to(target)) else {
        return false;
    };
    ctx.regs.distance = distance;
    true
}

fn get_turn_to_target(ctx: &mut ScriptContext<'_>) -> bool {
    let Some(turn) = ctx.target().and_then(|target| ctx.turn_to(target)) else {
        return false;
    };
    ctx.regs.turn = turn as i32;
    true
}

fn get_target_state(ctx: &mut ScriptContext<'_>) -> bool {
    let value = ctx.target_entity().map(|target| target.ai.state);
    set_argument(ctx, value)
}

fn get_target_content(ctx: &mut ScriptContext<'_>) -> bool {
    let value = ctx.target_entity().map(|target| target.ai.content);
    set_argument(ctx, value)
}

fn get_target_life(ctx: &mut ScriptContext<'_>) -> bool {
    let value = ctx.target_entity().map(|target| target.stats.life);
    set_argument(ctx, value)
}

fn get_self_life(ctx: &mut ScriptContext<'_>) -> bool {
    let value = ctx.me().map(|me| me.stats.life);
    set_argument(ctx, value)
}

fn get_money(ctx: &mut ScriptContext<'_>) -> bool {
    let value = ctx.me().map(|me| me.stats.money);
    set_argument(ctx, value)
}

fn get_target_team(ctx: &mut ScriptContext<'_>) -> bool {
    let value = ctx.target_entity().map(|target| target.team.0 as i32);
    set_argument(ctx, value)
}

/// Direction of the last attack relative to `me`, into `turn`.
fn get_attack_turn(ctx: &mut ScriptContext<'_>) -> bool {
    let Some(direction) = ctx.me().map(|me| me.ai.direction_last) else {
        return false;
    };
    ctx.regs.turn = direction as i32;
    true
}

fn get_damage_type(ctx: &mut ScriptContext<'_>) -> bool {
    let value = ctx.me().map(|me| me.ai.damage_type_last as i32);
    set_argument(ctx, value)
}

fn get_order_value(ctx: &mut ScriptContext<'_>) -> bool {
    let value = ctx.me().map(|me| me.ai.order_value);
    set_argument(ctx, value)
}

fn get_order_counter(ctx: &mut ScriptContext<'_>) -> bool {
    let value = ctx.me().map(|me| me.ai.order_counter);
    set_argument(ctx, value)
}

fn get_waypoint_count(ctx: &mut ScriptContext<'_>) -> bool {
    let value = ctx.me().map(|me| me.ai.waypoints.remaining() as i32);
    set_argument(ctx, value)
}

fn get_team_morale(ctx: &mut ScriptContext<'_>) -> bool {
    let value = ctx.me().map(|me| ctx.world.teams.morale(me.team));
    set_argument(ctx, value)
}

fn set_xy(ctx: &mut ScriptContext<'_>, point: Option<(f32, f32)>) -> bool {
    let Some((x, y)) = point else {
        return false;
    };
    ctx.regs.x = x as i32;
    ctx.regs.y = y as i32;
    true
}

fn get_spawn_position(ctx: &mut ScriptContext<'_>) -> bool {
    let point = ctx.me().map(|me| (me.spawn_pos.x, me.spawn_pos.y));
    set_xy(ctx, point)
}

fn get_self_position(ctx: &mut ScriptContext<'_>) -> bool {
    let point = ctx.me().map(|me| (me.pos.x, me.pos.y));
    set_xy(ctx, point)
}

fn get_target_position(ctx: &mut ScriptContext<'_>) -> bool {
    let point = ctx.target_entity().map(|target| (target.pos.x, target.pos.y));
    set_xy(ctx, point)
}

fn get_ammo(ctx: &mut ScriptContext<'_>) -> bool {
    let value = ctx.me().map(|me| me.item.ammo);
    set_argument(ctx, value)
}
