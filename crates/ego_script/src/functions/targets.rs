//! Target selection and target conditions

use super::{self_is, target_is, FunctionEntry};
use crate::context::ScriptContext;
use ego_core::math::{facing_from_vec, facing_within, QUADRANT_HALF};
use ego_core::{Entity, EntityHandle, Hand, Idsz, World};

pub(super) const FUNCTIONS: &[FunctionEntry] = entries![
    "IfTargetExists" => if_target_exists,
    "IfTargetIsAlive" => if_target_is_alive,
    "IfTargetIsSelf" => if_target_is_self,
    "IfTargetIsOwner" => if_target_is_owner,
    "IfTargetIsOnHatedTeam" => if_target_is_on_hated_team,
    "IfTargetIsOnSameTeam" => if_target_is_on_same_team,
    "IfTargetHasID" => if_target_has_id,
    "IfTargetIsAPlatform" => if_target_is_a_platform,
    "IfTargetIsFlying" => if_target_is_flying,
    "IfTargetIsAnItem" => if_target_is_an_item,
    "IfTargetIsKursed" => if_target_is_kursed,
    "IfFacingTarget" => if_facing_target,
    "IfTargetIsFacingSelf" => if_target_is_facing_self,
    "IfTargetIsOldTarget" => if_target_is_old_target,
    "IfLeader" => if_leader,
    "SetTargetToSelf" => set_target_to_self,
    "SetTargetToOwner" => set_target_to_owner,
    "SetTargetToOldTarget" => set_target_to_old_target,
    "SetTargetToChild" => set_target_to_child,
    "SetTargetToWhoeverAttacked" => set_target_to_whoever_attacked,
    "SetTargetToWhoeverBumped" => set_target_to_whoever_bumped,
    "SetTargetToWhoeverIsHolding" => set_target_to_whoever_is_holding,
    "SetTargetToWhoeverWasHit" => set_target_to_whoever_was_hit,
    "SetTargetToLeader" => set_target_to_leader,
    "SetTargetToNearestEnemy" => set_target_to_nearest_enemy,
    "SetTargetToDistantEnemy" => set_target_to_distant_enemy,
    "SetTargetToNearestFriend" => set_target_to_nearest_friend,
    "SetTargetToNearestLifeform" => set_target_to_nearest_lifeform,
    "SetTargetToNearestBlahID" => set_target_to_nearest_blah_id,
    "SetTargetToTargetLeftHand" => set_target_to_target_left_hand,
    "SetTargetToTargetRightHand" => set_target_to_target_right_hand,
    "SetOwnerToTarget" => set_owner_to_target,
];

fn if_target_exists(ctx: &mut ScriptContext<'_>) -> bool {
    ctx.target().is_some()
}

fn if_target_is_alive(ctx: &mut ScriptContext<'_>) -> bool {
    target_is(ctx, |target| target.alive)
}

fn if_target_is_self(ctx: &mut ScriptContext<'_>) -> bool {
    ctx.target() == Some(ctx.me)
}

fn if_target_is_owner(ctx: &mut ScriptContext<'_>) -> bool {
    let owner = ctx.me().and_then(|me| me.ai.owner);
    ctx.target().is_some_and(|target| owner == Some(target))
}

fn if_target_is_on_hated_team(ctx: &mut ScriptContext<'_>) -> bool {
    let Some(team) = ctx.me().map(|me| me.team) else {
        return false;
    };
    let teams = &ctx.world.teams;
    target_is(ctx, |target| target.alive && teams.hates(team, target.team))
}

fn if_target_is_on_same_team(ctx: &mut ScriptContext<'_>) -> bool {
    let Some(team) = ctx.me().map(|me| me.team) else {
        return false;
    };
    target_is(ctx, |target| target.team == team)
}

fn if_target_has_id(ctx: &mut ScriptContext<'_>) -> bool {
    let id = ctx.regs.argument as Idsz;
    target_is(ctx, |target| target.has_id(id))
}

fn if_target_is_a_platform(ctx: &mut ScriptContext<'_>) -> bool {
    target_is(ctx, |target| target.phys.platform)
}

fn if_target_is_flying(ctx: &mut ScriptContext<'_>) -> bool {
    target_is(ctx, |target| target.phys.flying)
}

fn if_target_is_an_item(ctx: &mut ScriptContext<'_>) -> bool {
    target_is(ctx, |target| target.item.is_item)
}

fn if_target_is_kursed(ctx: &mut ScriptContext<'_>) -> bool {
    target_is(ctx, |target| target.item.kursed)
}

/// Target lies within the forward quadrant.
fn if_facing_target(ctx: &mut ScriptContext<'_>) -> bool {
    let Some(target) = ctx.target() else {
        return false;
    };
    let (Some(me), Some(toward)) = (ctx.me(), ctx.turn_to(target)) else {
        return false;
    };
    facing_within(toward, me.facing, QUADRANT_HALF)
}

fn if_target_is_facing_self(ctx: &mut ScriptContext<'_>) -> bool {
    let (Some(me), Some(target)) = (ctx.me(), ctx.target_entity()) else {
        return false;
    };
    let toward = facing_from_vec(me.pos.x - target.pos.x, me.pos.y - target.pos.y);
    facing_within(toward, target.facing, QUADRANT_HALF)
}

fn if_target_is_old_target(ctx: &mut ScriptContext<'_>) -> bool {
    let old = ctx.me().and_then(|me| me.ai.old_target);
    ctx.target().is_some_and(|target| old == Some(target))
}

fn if_leader(ctx: &mut ScriptContext<'_>) -> bool {
    self_is(ctx, |me| ctx.world.teams.leader(me.team) == Some(ctx.me))
}

fn set_target_to_self(ctx: &mut ScriptContext<'_>) -> bool {
    let me = ctx.me;
    ctx.retarget(Some(me))
}

/// Retarget to a handle remembered in the running entity's AI state.
fn retarget_from(ctx: &mut ScriptContext<'_>, pick: impl FnOnce(&Entity) -> Option<EntityHandle>) -> bool {
    let target = ctx.me().and_then(pick);
    ctx.retarget(target)
}

fn set_target_to_owner(ctx: &mut ScriptContext<'_>) -> bool {
    retarget_from(ctx, |me| me.ai.owner)
}

fn set_target_to_old_target(ctx: &mut ScriptContext<'_>) -> bool {
    retarget_from(ctx, |me| me.ai.old_target)
}

fn set_target_to_child(ctx: &mut ScriptContext<'_>) -> bool {
    retarget_from(ctx, |me| me.ai.child)
}

fn set_target_to_whoever_attacked(ctx: &mut ScriptContext<'_>) -> bool {
    retarget_from(ctx, |me| me.ai.attack_last)
}

fn set_target_to_whoever_bumped(ctx: &mut ScriptContext<'_>) -> bool {
    retarget_from(ctx, |me| me.ai.bump_last)
}

fn set_target_to_whoever_is_holding(ctx: &mut ScriptContext<'_>) -> bool {
    let holder = ctx.holder();
    ctx.retarget(holder)
}

fn set_target_to_whoever_was_hit(ctx: &mut ScriptContext<'_>) -> bool {
    retarget_from(ctx, |me| me.ai.hit_last)
}

fn set_target_to_leader(ctx: &mut ScriptContext<'_>) -> bool {
    let leader = ctx.me().and_then(|me| ctx.world.teams.leader(me.team));
    ctx.retarget(leader)
}

/// Retarget to the nearest free, living entity passing `filter`, within
/// `radius` when given.
fn retarget_nearest(
    ctx: &mut ScriptContext<'_>,
    radius: Option<f32>,
    filter: impl Fn(&World, &Entity, &Entity) -> bool,
) -> bool {
    let found = {
        let Some(me) = ctx.me() else {
            return false;
        };
        let world = &*ctx.world;
        world.find_nearest(ctx.me, radius, |_, other| filter(world, me, other))
    };
    ctx.retarget(found)
}

fn set_target_to_nearest_enemy(ctx: &mut ScriptContext<'_>) -> bool {
    retarget_nearest(ctx, None, |world, me, other| {
        !other.item.is_item && world.teams.hates(me.team, other.team)
    })
}

/// Nearest enemy within `distance`.
fn set_target_to_distant_enemy(ctx: &mut ScriptContext<'_>) -> bool {
    let radius = ctx.regs.distance.max(0) as f32;
    retarget_nearest(ctx, Some(radius), |world, me, other| {
        !other.item.is_item && world.teams.hates(me.team, other.team)
    })
}

fn set_target_to_nearest_friend(ctx: &mut ScriptContext<'_>) -> bool {
    retarget_nearest(ctx, None, |_, me, other| !other.item.is_item && other.team == me.team)
}

fn set_target_to_nearest_lifeform(ctx: &mut ScriptContext<'_>) -> bool {
    retarget_nearest(ctx, None, |_, _, other| !other.item.is_item)
}

/// Nearest entity of any kind carrying the IDSZ in `argument`.
fn set_target_to_nearest_blah_id(ctx: &mut ScriptContext<'_>) -> bool {
    let id = ctx.regs.argument as Idsz;
    retarget_nearest(ctx, None, |_, _, other| other.has_id(id))
}

fn retarget_to_target_hand(ctx: &mut ScriptContext<'_>, hand: Hand) -> bool {
    let held = ctx.target_entity().and_then(|target| target.held(hand));
    ctx.retarget(held)
}

fn set_target_to_target_left_hand(ctx: &mut ScriptContext<'_>) -> bool {
    retarget_to_target_hand(ctx, Hand::Left)
}

fn set_target_to_target_right_hand(ctx: &mut ScriptContext<'_>) -> bool {
    retarget_to_target_hand(ctx, Hand::Right)
}

fn set_owner_to_target(ctx: &mut ScriptContext<'_>) -> bool {
    let Some(target) = ctx.target() else {
        return false;
    };
    match ctx.me_mut() {
        Some(me) => {
            me.ai.owner = Some(target);
            true
        }
        None => false,
    }
}
