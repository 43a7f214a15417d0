//! Hands and backpack
//!
//! Kursed items refuse to move; the inventory raises the matching alert on
//! the owner and the handler returns false.

use super::{self_is, target_is, FunctionEntry};
use crate::context::ScriptContext;
use ego_core::{Entity, EntityHandle, Hand, Idsz, InventoryError, World};

pub(super) const FUNCTIONS: &[FunctionEntry] = entries![
    "GrabTarget" => grab_target,
    "DropItem" => drop_item,
    "DropWeapons" => drop_weapons,
    "PutAwayItem" => put_away_item,
    "TakeOutItem" => take_out_item,
    "SwapItem" => swap_item,
    "PackTarget" => pack_target,
    "IfHasItemID" => if_has_item_id,
    "IfHoldingItemID" => if_holding_item_id,
    "IfTargetHasItemID" => if_target_has_item_id,
    "IfTargetHoldingItemID" => if_target_holding_item_id,
    "UnkurseTarget" => unkurse_target,
    "IfHasStackOfTarget" => if_has_stack_of_target,
    "IfKursed" => if_kursed,
    "IfAmmoOut" => if_ammo_out,
    "IfHeldInLeftHand" => if_held_in_left_hand,
];

fn outcome<T>(ctx: &ScriptContext<'_>, action: &'static str, result: Result<T, InventoryError>) -> bool {
    match result {
        Ok(_) => true,
        Err(error) => {
            tracing::trace!(me = ?ctx.me, action, %error, "inventory action refused");
            false
        }
    }
}

/// Pick up the target with the first empty hand.
fn grab_target(ctx: &mut ScriptContext<'_>) -> bool {
    let Some(target) = ctx.target() else {
        return false;
    };
    let Some(hand) = ctx
        .me()
        .and_then(|me| Hand::BOTH.into_iter().find(|hand| me.held(*hand).is_none()))
    else {
        return false;
    };
    let me = ctx.me;
    let result = ctx.world.grab(me, target, hand);
    outcome(ctx, "grab", result)
}

/// Drop what is in hand `argument`.
fn drop_item(ctx: &mut ScriptContext<'_>) -> bool {
    let hand = Hand::from_i32(ctx.regs.argument);
    let me = ctx.me;
    let result = ctx.world.drop_item(me, hand, false);
    outcome(ctx, "drop", result)
}

/// Drop both hands; true if anything fell.
fn drop_weapons(ctx: &mut ScriptContext<'_>) -> bool {
    let me = ctx.me;
    let mut dropped = false;
    for hand in Hand::BOTH {
        dropped |= ctx.world.drop_item(me, hand, false).is_ok();
    }
    dropped
}

/// Pack what is in hand `argument`.
fn put_away_item(ctx: &mut ScriptContext<'_>) -> bool {
    let hand = Hand::from_i32(ctx.regs.argument);
    let me = ctx.me;
    let result = ctx.world.put_away(me, hand, false);
    outcome(ctx, "put away", result)
}

fn slot(ctx: &ScriptContext<'_>) -> Option<usize> {
    usize::try_from(ctx.regs.argument).ok()
}

/// Move slot `argument` into hand `x`.
fn take_out_item(ctx: &mut ScriptContext<'_>) -> bool {
    let Some(slot) = slot(ctx) else {
        return false;
    };
    let hand = Hand::from_i32(ctx.regs.x);
    let me = ctx.me;
    let result = ctx.world.take_out(me, slot, hand, false);
    outcome(ctx, "take out", result)
}

/// Exchange slot `argument` with hand `x`.
fn swap_item(ctx: &mut ScriptContext<'_>) -> bool {
    let Some(slot) = slot(ctx) else {
        return false;
    };
    let hand = Hand::from_i32(ctx.regs.x);
    let me = ctx.me;
    let result = ctx.world.swap_item(me, slot, hand, false);
    outcome(ctx, "swap", result)
}

/// Put a free target item straight into the pack.
fn pack_target(ctx: &mut ScriptContext<'_>) -> bool {
    let Some(target) = ctx.target() else {
        return false;
    };
    let me = ctx.me;
    let result = ctx.world.inventory_add(me, target);
    outcome(ctx, "pack", result)
}

fn packed_with_id(world: &World, owner: EntityHandle, id: Idsz) -> Option<usize> {
    world.find_item(owner, |_, item| item.has_id(id)).map(|(slot, _)| slot)
}

fn held_with_id(world: &World, owner: EntityHandle, id: Idsz) -> Option<Hand> {
    let owner = world.get(owner)?;
    Hand::BOTH.into_iter().find(|hand| {
        owner
            .held(*hand)
            .and_then(|item| world.get(item))
            .is_some_and(|item| item.has_id(id))
    })
}

/// Put the found slot or hand into `x`.
fn found_into_x(ctx: &mut ScriptContext<'_>, found: Option<i32>) -> bool {
    match found {
        Some(index) => {
            ctx.regs.x = index;
            true
        }
        None => false,
    }
}

/// Pack holds an item with IDSZ `argument`; its slot goes into `x`.
fn if_has_item_id(ctx: &mut ScriptContext<'_>) -> bool {
    let found = packed_with_id(ctx.world, ctx.me, ctx.regs.argument as Idsz);
    found_into_x(ctx, found.map(|slot| slot as i32))
}

/// A hand holds an item with IDSZ `argument`; the hand goes into `x`.
fn if_holding_item_id(ctx: &mut ScriptContext<'_>) -> bool {
    let found = held_with_id(ctx.world, ctx.me, ctx.regs.argument as Idsz);
    found_into_x(ctx, found.map(|hand| hand as i32))
}

fn if_target_has_item_id(ctx: &mut ScriptContext<'_>) -> bool {
    let found = ctx
        .target()
        .and_then(|target| packed_with_id(ctx.world, target, ctx.regs.argument as Idsz));
    found_into_x(ctx, found.map(|slot| slot as i32))
}

fn if_target_holding_item_id(ctx: &mut ScriptContext<'_>) -> bool {
    let found = ctx
        .target()
        .and_then(|target| held_with_id(ctx.world, target, ctx.regs.argument as Idsz));
    found_into_x(ctx, found.map(|hand| hand as i32))
}

fn unkurse_target(ctx: &mut ScriptContext<'_>) -> bool {
    match ctx.target_entity_mut() {
        Some(target) if target.item.is_item => {
            target.item.kursed = false;
            true
        }
        _ => false,
    }
}

/// The target would merge into a stack in the pack; that slot goes into `x`.
fn if_has_stack_of_target(ctx: &mut ScriptContext<'_>) -> bool {
    let found = ctx
        .target()
        .and_then(|target| ctx.world.has_stack(ctx.me, target))
        .map(|(slot, _)| slot as i32);
    found_into_x(ctx, found)
}

fn if_kursed(ctx: &mut ScriptContext<'_>) -> bool {
    self_is(ctx, |me| me.item.kursed)
}

fn if_ammo_out(ctx: &mut ScriptContext<'_>) -> bool {
    self_is(ctx, |me| me.item.ammo <= 0)
}

fn if_held_in_left_hand(ctx: &mut ScriptContext<'_>) -> bool {
    let me = ctx.me;
    let Some(holder) = ctx.me().and_then(|entity| entity.attached_to) else {
        return false;
    };
    ctx.world
        .get(holder)
        .is_some_and(|holder: &Entity| holder.held(Hand::Left) == Some(me))
}

#[cfg(test)]
mod tests {
    use crate::functions::test_support::{call, spawn, world};
    use ego_core::glam::Vec3;
    use ego_core::math::FACE_NORTH;
    use ego_core::{idsz, AlertFlags, ItemProps, Profile, Registers, TeamId};

    fn sword(world: &mut ego_core::World, kursed: bool) -> ego_core::EntityHandle {
        let mut profile = Profile::named("Sword");
        profile.type_id = idsz("SWOR");
        profile.item = ItemProps {
            is_item: true,
            kursed,
            ..ItemProps::default()
        };
        let profile = world.profiles.register(profile);
        world
            .spawn(profile, Vec3::new(510.0, 500.0, 0.0), None, 0, FACE_NORTH)
            .expect("sword")
    }

    #[test]
    fn grab_then_find_by_id() {
        let (mut world, body) = world();
        let me = spawn(&mut world, body, 500.0, 500.0, TeamId::GOOD);
        let blade = sword(&mut world, false);
        world.get_mut(me).expect("me").ai.set_target(Some(blade));

        assert!(call(&mut world, me, Registers::default(), "GrabTarget").0);
        let id = Registers {
            argument: idsz("SWOR") as i32,
            x: 9,
            ..Registers::default()
        };
        let (ok, out) = call(&mut world, me, id, "IfHoldingItemID");
        assert!(ok);
        assert_eq!(out.x, 0);
        assert!(!call(&mut world, me, id, "IfHasItemID").0);

        assert!(call(&mut world, me, Registers::default(), "PutAwayItem").0);
        let (ok, out) = call(&mut world, me, id, "IfHasItemID");
        assert!(ok);
        assert_eq!(out.x, 0);
    }

    #[test]
    fn kursed_item_stays_in_hand() {
        let (mut world, body) = world();
        let me = spawn(&mut world, body, 500.0, 500.0, TeamId::GOOD);
        let blade = sword(&mut world, true);
        world.get_mut(me).expect("me").ai.set_target(Some(blade));
        assert!(call(&mut world, me, Registers::default(), "GrabTarget").0);

        assert!(!call(&mut world, me, Registers::default(), "DropItem").0);
        assert!(world.get(me).expect("me").ai.is_alerted(AlertFlags::NOTDROPPED));
        assert!(!call(&mut world, me, Registers::default(), "PutAwayItem").0);
        assert!(world.get(me).expect("me").ai.is_alerted(AlertFlags::NOTPUTAWAY));

        assert!(call(&mut world, me, Registers::default(), "UnkurseTarget").0);
        assert!(call(&mut world, me, Registers::default(), "DropItem").0);
    }

    #[test]
    fn held_item_cannot_pack_its_holder() {
        let (mut world, _) = world();
        let outer = sword(&mut world, false);
        let inner = sword(&mut world, false);
        world.get_mut(outer).expect("outer").ai.set_target(Some(inner));
        assert!(call(&mut world, outer, Registers::default(), "GrabTarget").0);

        world.get_mut(inner).expect("inner").ai.set_target(Some(outer));
        assert!(!call(&mut world, inner, Registers::default(), "PackTarget").0);
        assert!(!call(&mut world, inner, Registers::default(), "GrabTarget").0);
        assert!(world.get(outer).expect("outer").is_free());

        world.sync_attached(outer);
        assert_eq!(world.get(inner).expect("inner").attached_to, Some(outer));
    }
}
