//! External function table
//!
//! Every opcode a compiled script can call lives here. Handlers return the
//! script's return code: `false` skips the block guarded by the call.
//!
//! The position of an entry is its opcode, so groups and the entries inside
//! them may only grow at the end of the table.

use crate::bytecode::{Opcode, MAX_OPCODES};
use crate::context::ScriptContext;
use ego_core::Entity;
use once_cell::sync::Lazy;
use std::collections::HashMap;

pub type Handler = fn(&mut ScriptContext<'_>) -> bool;

pub struct FunctionEntry {
    pub name: &'static str,
    pub handler: Handler,
}

macro_rules! entries {
    ($($name:literal => $handler:path,)*) => {
        &[$($crate::functions::FunctionEntry { name: $name, handler: $handler },)*]
    };
}

mod alerts;
mod combat;
mod flow;
mod inventory;
mod movement;
mod queries;
mod targets;
mod world;

pub const OP_NOTHING: Opcode = Opcode(0);
pub const OP_END: Opcode = Opcode(1);
/// Recognised by the loader and never dispatched.
pub const OP_ELSE: Opcode = Opcode(2);

const BUILTIN: &[FunctionEntry] = entries![
    "DoNothing" => flow::do_nothing,
    "End" => flow::end,
    "Else" => flow::else_marker,
];

const GROUPS: &[&[FunctionEntry]] = &[
    BUILTIN,
    flow::FUNCTIONS,
    alerts::ALERT_FUNCTIONS,
    alerts::FUNCTIONS,
    targets::FUNCTIONS,
    queries::FUNCTIONS,
    movement::FUNCTIONS,
    combat::FUNCTIONS,
    inventory::FUNCTIONS,
    world::FUNCTIONS,
];

pub struct FunctionTable {
    entries: Vec<&'static FunctionEntry>,
    by_name: HashMap<&'static str, Opcode>,
}

impl FunctionTable {
    fn build() -> Self {
        let entries: Vec<&'static FunctionEntry> = GROUPS.iter().flat_map(|group| group.iter()).collect();
        let mut by_name = HashMap::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate().take(MAX_OPCODES) {
            if by_name.insert(entry.name, Opcode(index as u16)).is_some() {
                tracing::warn!(name = entry.name, "duplicate script function name");
            }
        }
        tracing::debug!(functions = entries.len(), "script function table built");
        Self { entries, by_name }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, opcode: Opcode) -> Option<&'static FunctionEntry> {
        self.entries.get(opcode.0 as usize).copied()
    }

    pub fn find(&self, name: &str) -> Option<Opcode> {
        self.by_name.get(name).copied()
    }

    pub fn name(&self, opcode: Opcode) -> Option<&'static str> {
        self.get(opcode).map(|entry| entry.name)
    }

    /// `(opcode, name)` in opcode order.
    pub fn iter(&self) -> impl Iterator<Item = (Opcode, &'static str)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .map(|(index, entry)| (Opcode(index as u16), entry.name))
    }
}

static TABLE: Lazy<FunctionTable> = Lazy::new(FunctionTable::build);

/// The process-wide function table.
pub fn table() -> &'static FunctionTable {
    &TABLE
}

/// Check something about the running entity; false if it is gone.
fn self_is(ctx: &ScriptContext<'_>, check: impl FnOnce(&Entity) -> bool) -> bool {
    ctx.me().is_some_and(check)
}

/// Change the running entity; false if it is gone.
fn update_self(ctx: &mut ScriptContext<'_>, change: impl FnOnce(&mut Entity)) -> bool {
    match ctx.me_mut() {
        Some(me) => {
            change(me);
            true
        }
        None => false,
    }
}

/// Check something about the target; false without one.
fn target_is(ctx: &ScriptContext<'_>, check: impl FnOnce(&Entity) -> bool) -> bool {
    ctx.target_entity().is_some_and(check)
}

/// Store a value in `argument`; false (and no store) when there is none.
fn set_argument(ctx: &mut ScriptContext<'_>, value: Option<i32>) -> bool {
    match value {
        Some(value) => {
            ctx.regs.argument = value;
            true
        }
        None => false,
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::context::ScriptContext;
    use ego_core::glam::Vec3;
    use ego_core::math::FACE_NORTH;
    use ego_core::{EntityHandle, Profile, ProfileId, Registers, TeamId, World};

    /// A 32x32 flat world with a plain body profile registered.
    pub fn world() -> (World, ProfileId) {
        let mut world = World::default();
        let body = world.profiles.register(Profile::named("Body"));
        (world, body)
    }

    pub fn spawn(world: &mut World, profile: ProfileId, x: f32, y: f32, team: TeamId) -> EntityHandle {
        world
            .spawn(profile, Vec3::new(x, y, 0.0), Some(team), 0, FACE_NORTH)
            .expect("spawn")
    }

    /// Run one handler by name against `me`.
    pub fn call(world: &mut World, me: EntityHandle, regs: Registers, name: &str) -> (bool, Registers) {
        let table = super::table();
        let opcode = table.find(name).unwrap_or_else(|| panic!("no function {name}"));
        let entry = table.get(opcode).expect("entry");
        let mut ctx = ScriptContext::new(world, me, regs);
        let result = (entry.handler)(&mut ctx);
        (result, ctx.regs)
    }
}
