//! Control, timers and script-owned scratch state

use super::{self_is, set_argument, update_self, FunctionEntry};
use crate::context::ScriptContext;

pub(super) const FUNCTIONS: &[FunctionEntry] = entries![
    "IfTimeOut" => if_time_out,
    "SetTime" => set_time,
    "IfStateIs" => if_state_is,
    "IfStateIsNot" => if_state_is_not,
    "SetState" => set_state,
    "GetState" => get_state,
    "IfContentIs" => if_content_is,
    "SetContent" => set_content,
    "GetContent" => get_content,
    "IfXIsLessThanY" => if_x_is_less_than_y,
    "IfXIsEqualToY" => if_x_is_equal_to_y,
    "IfXIsNotEqualToY" => if_x_is_not_equal_to_y,
    "IfXIsMoreThanY" => if_x_is_more_than_y,
    "IfXIsLessThanOrEqualToY" => if_x_is_less_than_or_equal_to_y,
    "IfXIsMoreThanOrEqualToY" => if_x_is_more_than_or_equal_to_y,
    "IfArgumentIsZero" => if_argument_is_zero,
    "IfStateIsOdd" => if_state_is_odd,
];

pub(super) fn do_nothing(_ctx: &mut ScriptContext<'_>) -> bool {
    true
}

pub(super) fn end(ctx: &mut ScriptContext<'_>) -> bool {
    ctx.terminate = true;
    true
}

pub(super) fn else_marker(_ctx: &mut ScriptContext<'_>) -> bool {
    true
}

fn if_time_out(ctx: &mut ScriptContext<'_>) -> bool {
    self_is(ctx, |me| me.ai.timer <= 0)
}

/// Count down `argument` ticks.
fn set_time(ctx: &mut ScriptContext<'_>) -> bool {
    let ticks = ctx.regs.argument.max(0);
    update_self(ctx, |me| me.ai.timer = ticks)
}

fn if_state_is(ctx: &mut ScriptContext<'_>) -> bool {
    let argument = ctx.regs.argument;
    self_is(ctx, |me| me.ai.state == argument)
}

fn if_state_is_not(ctx: &mut ScriptContext<'_>) -> bool {
    let argument = ctx.regs.argument;
    self_is(ctx, |me| me.ai.state != argument)
}

fn set_state(ctx: &mut ScriptContext<'_>) -> bool {
    let argument = ctx.regs.argument;
    update_self(ctx, |me| me.ai.state = argument)
}

fn get_state(ctx: &mut ScriptContext<'_>) -> bool {
    let state = ctx.me().map(|me| me.ai.state);
    set_argument(ctx, state)
}

fn if_content_is(ctx: &mut ScriptContext<'_>) -> bool {
    let argument = ctx.regs.argument;
    self_is(ctx, |me| me.ai.content == argument)
}

fn set_content(ctx: &mut ScriptContext<'_>) -> bool {
    let argument = ctx.regs.argument;
    update_self(ctx, |me| me.ai.content = argument)
}

fn get_content(ctx: &mut ScriptContext<'_>) -> bool {
    let content = ctx.me().map(|me| me.ai.content);
    set_argument(ctx, content)
}

fn if_x_is_less_than_y(ctx: &mut ScriptContext<'_>) -> bool {
    ctx.regs.x < ctx.regs.y
}

fn if_x_is_equal_to_y(ctx: &mut ScriptContext<'_>) -> bool {
    ctx.regs.x == ctx.regs.y
}

fn if_x_is_not_equal_to_y(ctx: &mut ScriptContext<'_>) -> bool {
    ctx.regs.x != ctx.regs.y
}

fn if_x_is_more_than_y(ctx: &mut ScriptContext<'_>) -> bool {
    ctx.regs.x > ctx.regs.y
}

fn if_x_is_less_than_or_equal_to_y(ctx: &mut ScriptContext<'_>) -> bool {
    ctx.regs.x <= ctx.regs.y
}

fn if_x_is_more_than_or_equal_to_y(ctx: &mut ScriptContext<'_>) -> bool {
    ctx.regs.x >= ctx.regs.y
}

fn if_argument_is_zero(ctx: &mut ScriptContext<'_>) -> bool {
    ctx.regs.argument == 0
}

fn if_state_is_odd(ctx: &mut ScriptContext<'_>) -> bool {
    self_is(ctx, |me| me.ai.state & 1 == 1)
}
