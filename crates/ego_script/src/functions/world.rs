//! Enchants, passages, shops, messages and teams

use super::{target_is, update_self, FunctionEntry};
use crate::context::ScriptContext;
use ego_core::{Audience, Effect, EnchantId, EntityHandle, PassageId, TeamId};

pub(super) const FUNCTIONS: &[FunctionEntry] = entries![
    "EnchantTarget" => enchant_target,
    "EnchantChild" => enchant_child,
    "UndoEnchant" => undo_enchant,
    "IfTargetHasEnchant" => if_target_has_enchant,
    "OpenPassage" => open_passage,
    "ClosePassage" => close_passage,
    "IfPassageOpen" => if_passage_open,
    "IfTargetIsInPassage" => if_target_is_in_passage,
    "IfInsideShop" => if_inside_shop,
    "AddShopPassage" => add_shop_passage,
    "PlaySound" => play_sound,
    "SendMessage" => send_message,
    "SendMessageNear" => send_message_near,
    "SendMessageToTeam" => send_message_to_team,
    "DebugMessage" => debug_message,
    "IssueOrder" => issue_order,
    "CallForHelp" => call_for_help,
    "JoinTargetTeam" => join_target_team,
    "JoinTeam" => join_team,
    "BecomeLeader" => become_leader,
];

/// Cast this entity's profile enchant on `target`, owned by this entity.
fn enchant(ctx: &mut ScriptContext<'_>, target: Option<EntityHandle>) -> bool {
    let Some(target) = target.filter(|target| ctx.world.exists(*target)) else {
        return false;
    };
    let Some(id) = ctx
        .me()
        .and_then(|me| ctx.world.profiles.get(me.profile))
        .and_then(|profile| profile.enchant)
    else {
        return false;
    };
    let me = ctx.me;
    let Some(handle) = ctx.world.enchant_add(id, target, Some(me)) else {
        return false;
    };
    update_self(ctx, |me| me.ai.last_enchant = Some(handle))
}

fn enchant_target(ctx: &mut ScriptContext<'_>) -> bool {
    let target = ctx.target();
    enchant(ctx, target)
}

fn enchant_child(ctx: &mut ScriptContext<'_>) -> bool {
    let child = ctx.me().and_then(|me| me.ai.child);
    enchant(ctx, child)
}

/// Remove the enchant this entity cast last.
fn undo_enchant(ctx: &mut ScriptContext<'_>) -> bool {
    let Some(handle) = ctx.me_mut().and_then(|me| me.ai.last_enchant.take()) else {
        return false;
    };
    ctx.world.enchant_remove(handle)
}

/// Target carries enchant `argument`, or any enchant when it is negative.
fn if_target_has_enchant(ctx: &mut ScriptContext<'_>) -> bool {
    let Some(target) = ctx.target() else {
        return false;
    };
    let id = match ctx.regs.argument {
        argument if argument < 0 => None,
        argument => match u16::try_from(argument) {
            Ok(id) => Some(EnchantId(id)),
            Err(_) => return false,
        },
    };
    ctx.world.has_enchant(target, id)
}

fn passage(ctx: &ScriptContext<'_>) -> Option<PassageId> {
    u16::try_from(ctx.regs.argument).ok().map(PassageId)
}

fn open_passage(ctx: &mut ScriptContext<'_>) -> bool {
    passage(ctx).is_some_and(|id| ctx.world.open_passage(id))
}

/// Start closing; anything caught inside is crushed before the door shuts.
fn close_passage(ctx: &mut ScriptContext<'_>) -> bool {
    passage(ctx).is_some_and(|id| ctx.world.close_passage(id))
}

fn if_passage_open(ctx: &mut ScriptContext<'_>) -> bool {
    passage(ctx).is_some_and(|id| ctx.world.passages.is_open(id))
}

fn if_target_is_in_passage(ctx: &mut ScriptContext<'_>) -> bool {
    let Some(id) = passage(ctx) else {
        return false;
    };
    target_is(ctx, |target| ctx.world.passages.contains(id, target.pos))
}

/// Standing in a shop whose keeper is alive; the keeper becomes the target.
fn if_inside_shop(ctx: &mut ScriptContext<'_>) -> bool {
    let owner = ctx.me().and_then(|me| ctx.world.shop_owner_at(me.pos));
    ctx.retarget(owner)
}

/// Claim passage `argument` as this entity's shop.
fn add_shop_passage(ctx: &mut ScriptContext<'_>) -> bool {
    let Some(id) = passage(ctx) else {
        return false;
    };
    let me = ctx.me;
    ctx.world.passages.set_shop_owner(id, Some(me))
}

fn play_sound(ctx: &mut ScriptContext<'_>) -> bool {
    let Some(pos) = ctx.pos(ctx.me) else {
        return false;
    };
    ctx.world.effects.push(Effect::PlaySound {
        source: ctx.me,
        sound: ctx.regs.argument,
        pos,
    });
    true
}

fn message(ctx: &mut ScriptContext<'_>, audience: Audience) -> bool {
    if !ctx.world.exists(ctx.me) {
        return false;
    }
    ctx.world.effects.push(Effect::Message {
        from: ctx.me,
        message: ctx.regs.argument,
        audience,
    });
    true
}

fn send_message(ctx: &mut ScriptContext<'_>) -> bool {
    message(ctx, Audience::Everyone)
}

/// Message for players within `distance`.
fn send_message_near(ctx: &mut ScriptContext<'_>) -> bool {
    let Some(center) = ctx.pos(ctx.me) else {
        return false;
    };
    let radius = ctx.regs.distance.max(0) as f32;
    message(ctx, Audience::Near { center, radius })
}

fn send_message_to_team(ctx: &mut ScriptContext<'_>) -> bool {
    let Some(team) = ctx.me().map(|me| me.team) else {
        return false;
    };
    message(ctx, Audience::Team(team))
}

fn debug_message(ctx: &mut ScriptContext<'_>) -> bool {
    let Some(name) = ctx.me().map(|me| me.class_name.clone()) else {
        return false;
    };
    let regs = ctx.regs;
    let text = format!(
        "{name}: x={} y={} turn={} distance={} argument={}",
        regs.x, regs.y, regs.turn, regs.distance, regs.argument
    );
    tracing::debug!(me = ?ctx.me, "{text}");
    ctx.world.effects.push(Effect::Debug { from: ctx.me, text });
    true
}

/// Order every living teammate; true if anyone heard.
fn issue_order(ctx: &mut ScriptContext<'_>) -> bool {
    let me = ctx.me;
    ctx.world.issue_order(me, ctx.regs.argument) > 0
}

fn call_for_help(ctx: &mut ScriptContext<'_>) -> bool {
    let me = ctx.me;
    ctx.world.call_for_help(me);
    ctx.world.exists(me)
}

fn join_target_team(ctx: &mut ScriptContext<'_>) -> bool {
    let Some(team) = ctx.target_entity().map(|target| target.team) else {
        return false;
    };
    update_self(ctx, |me| me.team = team)
}

fn join_team(ctx: &mut ScriptContext<'_>) -> bool {
    let team = TeamId::from_i32(ctx.regs.argument);
    update_self(ctx, |me| me.team = team)
}

fn become_leader(ctx: &mut ScriptContext<'_>) -> bool {
    let Some(team) = ctx.me().map(|me| me.team) else {
        return false;
    };
    let me = ctx.me;
    ctx.world.teams.set_leader(team, Some(me));
    true
}
