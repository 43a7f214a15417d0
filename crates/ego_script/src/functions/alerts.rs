//! Alert conditions

use super::{self_is, FunctionEntry};
use crate::context::ScriptContext;
use ego_core::{AlertFlags, AttackQuadrant};

macro_rules! alert_conditions {
    ($($name:literal => $handler:ident($flag:ident),)*) => {
        $(
            fn $handler(ctx: &mut ScriptContext<'_>) -> bool {
                self_is(ctx, |me| me.ai.is_alerted(AlertFlags::$flag))
            }
        )*

        pub(super) const ALERT_FUNCTIONS: &[FunctionEntry] = entries![$($name => $handler,)*];
    };
}

alert_conditions! {
    "IfSpawned" => if_spawned(SPAWNED),
    "IfHitVulnerable" => if_hit_vulnerable(HITVULNERABLE),
    "IfAtWaypoint" => if_at_waypoint(ATWAYPOINT),
    "IfAtLastWaypoint" => if_at_last_waypoint(ATLASTWAYPOINT),
    "IfAttacked" => if_attacked(ATTACKED),
    "IfBumped" => if_bumped(BUMPED),
    "IfOrdered" => if_ordered(ORDERED),
    "IfCalledForHelp" => if_called_for_help(CALLEDFORHELP),
    "IfKilled" => if_killed(KILLED),
    "IfTargetKilled" => if_target_killed(TARGETKILLED),
    "IfDropped" => if_dropped(DROPPED),
    "IfGrabbed" => if_grabbed(GRABBED),
    "IfReaffirmed" => if_reaffirmed(REAFFIRMED),
    "IfLeaderKilled" => if_leader_killed(LEADERKILLED),
    "IfUsed" => if_used(USED),
    "IfCleanedUp" => if_cleaned_up(CLEANEDUP),
    "IfScoredAHit" => if_scored_a_hit(SCOREDAHIT),
    "IfHealed" => if_healed(HEALED),
    "IfDisaffirmed" => if_disaffirmed(DISAFFIRMED),
    "IfChanged" => if_changed(CHANGED),
    "IfInWater" => if_in_water(INWATER),
    "IfBored" => if_bored(BORED),
    "IfTooMuchBaggage" => if_too_much_baggage(TOOMUCHBAGGAGE),
    "IfGrogged" => if_grogged(GROGGED),
    "IfDazed" => if_dazed(DAZED),
    "IfHitGround" => if_hit_ground(HITGROUND),
    "IfNotDropped" => if_not_dropped(NOTDROPPED),
    "IfBlocked" => if_blocked(BLOCKED),
    "IfThrown" => if_thrown(THROWN),
    "IfCrushed" => if_crushed(CRUSHED),
    "IfNotPutAway" => if_not_put_away(NOTPUTAWAY),
    "IfTakenOut" => if_taken_out(TAKENOUT),
    "IfNotTakenOut" => if_not_taken_out(NOTTAKENOUT),
}

pub(super) const FUNCTIONS: &[FunctionEntry] = entries![
    "IfAlerted" => if_alerted,
    "IfHitFromFront" => if_hit_from_front,
    "IfHitFromRight" => if_hit_from_right,
    "IfHitFromBehind" => if_hit_from_behind,
    "IfHitFromLeft" => if_hit_from_left,
    "ClearAlert" => clear_alert,
];

/// `argument` names the alert by bit index.
fn if_alerted(ctx: &mut ScriptContext<'_>) -> bool {
    let Some(flag) = alert_bit(ctx.regs.argument) else {
        return false;
    };
    self_is(ctx, |me| me.ai.is_alerted(flag))
}

/// Drop one alert for the rest of this tick.
fn clear_alert(ctx: &mut ScriptContext<'_>) -> bool {
    let Some(flag) = alert_bit(ctx.regs.argument) else {
        return false;
    };
    match ctx.me_mut() {
        Some(me) => {
            me.ai.alert.remove(flag);
            true
        }
        None => false,
    }
}

fn alert_bit(index: i32) -> Option<AlertFlags> {
    u32::try_from(index)
        .ok()
        .filter(|index| *index < 32)
        .map(|index| AlertFlags::from_bits_retain(1 << index))
}

fn hit_from(ctx: &ScriptContext<'_>, quadrant: AttackQuadrant) -> bool {
    self_is(ctx, |me| {
        me.ai.is_alerted(AlertFlags::ATTACKED) && AttackQuadrant::from_direction(me.ai.direction_last) == quadrant
    })
}

fn if_hit_from_front(ctx: &mut ScriptContext<'_>) -> bool {
    hit_from(ctx, AttackQuadrant::Front)
}

fn if_hit_from_right(ctx: &mut ScriptContext<'_>) -> bool {
    hit_from(ctx, AttackQuadrant::Right)
}

fn if_hit_from_behind(ctx: &mut ScriptContext<'_>) -> bool {
    hit_from(ctx, AttackQuadrant::Behind)
}

fn if_hit_from_left(ctx: &mut ScriptContext<'_>) -> bool {
    hit_from(ctx, AttackQuadrant::Left)
}
