//! Script interpreter
//!
//! Each run loads the entity's registers, walks the instruction list once
//! (jumps only go forward) and writes the registers back. A handler that
//! returns false sends control to the instruction's resume target.

use crate::bytecode::{Instruction, OperandValue, Script};
use crate::context::ScriptContext;
use crate::functions;
use crate::library::ScriptLibrary;
use ego_core::{EntityHandle, World};
use tracing::trace;

/// What one script run did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub instructions: usize,
    pub calls: usize,
    pub failed_calls: usize,
    /// The run stopped at `End`.
    pub terminated: bool,
}

/// Totals for one script phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickStats {
    pub scripts_run: usize,
    pub instructions: usize,
    pub calls: usize,
    pub failed_calls: usize,
}

impl TickStats {
    fn record(&mut self, run: RunStats) {
        self.scripts_run += 1;
        self.instructions += run.instructions;
        self.calls += run.calls;
        self.failed_calls += run.failed_calls;
    }
}

/// Run `script` once for `me`.
pub fn run_script(world: &mut World, me: EntityHandle, script: &Script) -> RunStats {
    let Some(regs) = world.get(me).map(|entity| entity.ai.registers) else {
        return RunStats::default();
    };
    let table = functions::table();
    let instructions = script.instructions();
    let mut stats = RunStats::default();
    let mut ctx = ScriptContext::new(world, me, regs);
    let mut pc = 0;
    while let Some(instruction) = instructions.get(pc) {
        stats.instructions += 1;
        pc = match instruction {
            Instruction::Call { opcode, on_false, .. } => {
                stats.calls += 1;
                let passed = table.get(*opcode).is_some_and(|entry| (entry.handler)(&mut ctx));
                if passed {
                    pc + 1
                } else {
                    stats.failed_calls += 1;
                    trace!(?me, function = table.name(*opcode), "call returned false");
                    *on_false
                }
            }
            Instruction::Else { end, .. } => *end,
            Instruction::Assign { dest, operands, .. } => {
                let value = operands.iter().fold(0, |acc, operand| {
                    let value = match operand.value {
                        OperandValue::Constant(value) => value,
                        OperandValue::Variable(variable) => variable.read(&mut ctx),
                    };
                    operand.op.apply(acc, value)
                });
                dest.set(&mut ctx.regs, value);
                pc + 1
            }
        };
        if ctx.terminate {
            stats.terminated = true;
            break;
        }
    }
    let regs = ctx.regs;
    if let Some(entity) = world.get_mut(me) {
        entity.ai.registers = regs;
        entity.ai.has_run = true;
    }
    stats
}

/// Runs the script phase of a tick.
#[derive(Debug, Default)]
pub struct ScriptEngine {
    last_tick: TickStats,
    total: TickStats,
}

impl ScriptEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every entity that was in play when the phase began, in creation
    /// order. Entities spawned during the phase wait for the next tick;
    /// entities removed during it still get their turn.
    pub fn run_tick(&mut self, world: &mut World, library: &ScriptLibrary) -> TickStats {
        let mut stats = TickStats::default();
        for handle in world.entities.snapshot() {
            let Some(profile) = world.get(handle).map(|entity| entity.profile) else {
                continue;
            };
            match world.profiles.get(profile).and_then(|profile| profile.script) {
                Some(id) => stats.record(run_script(world, handle, library.get(id))),
                None => {
                    if let Some(entity) = world.get_mut(handle) {
                        entity.ai.has_run = true;
                    }
                }
            }
        }
        trace!(
            scripts = stats.scripts_run,
            instructions = stats.instructions,
            failed = stats.failed_calls,
            "script phase done"
        );
        self.last_tick = stats;
        self.total.scripts_run += stats.scripts_run;
        self.total.instructions += stats.instructions;
        self.total.calls += stats.calls;
        self.total.failed_calls += stats.failed_calls;
        stats
    }

    pub fn last_tick(&self) -> TickStats {
        self.last_tick
    }

    /// Totals since the engine was created.
    pub fn total(&self) -> TickStats {
        self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile;
    use crate::functions::test_support::{spawn, world};
    use ego_core::{AlertFlags, Registers, TeamId};

    #[test]
    fn failed_condition_skips_its_block() {
        let (mut world, body) = world();
        let me = spawn(&mut world, body, 500.0, 500.0, TeamId::EVIL);
        let script = compile("IfAttacked\n  x = 1\n  y = 2\nturn = 3").expect("compiles");
        let stats = run_script(&mut world, me, &script);
        let regs = world.get(me).expect("me").ai.registers;
        assert_eq!((regs.x, regs.y, regs.turn), (0, 0, 3));
        assert_eq!(stats.failed_calls, 1);
        assert_eq!(stats.instructions, 2);
    }

    #[test]
    fn skipped_block_contents_never_run() {
        let (mut world, body) = world();
        let me = spawn(&mut world, body, 500.0, 500.0, TeamId::EVIL);
        let script = compile("IfAttacked\n  x = 1\n  End\n  SetState\ny = 4").expect("compiles");
        let stats = run_script(&mut world, me, &script);
        let entity = world.get(me).expect("me");
        assert_eq!((entity.ai.registers.x, entity.ai.registers.y), (0, 4));
        assert_eq!(entity.ai.state, 0);
        assert!(!stats.terminated);
        assert_eq!(stats.instructions, 2);
    }

    #[test]
    fn else_runs_only_when_condition_fails() {
        let source = "IfAttacked\n  x = 1\nElse\n  x = 2\ny = x * 10";
        let script = compile(source).expect("compiles");
        let (mut world, body) = world();
        let me = spawn(&mut world, body, 500.0, 500.0, TeamId::EVIL);
        run_script(&mut world, me, &script);
        assert_eq!(world.get(me).expect("me").ai.registers.y, 20);

        world.get_mut(me).expect("me").ai.raise(AlertFlags::ATTACKED);
        run_script(&mut world, me, &script);
        assert_eq!(world.get(me).expect("me").ai.registers.y, 10);
    }

    #[test]
    fn registers_persist_between_runs() {
        let (mut world, body) = world();
        let me = spawn(&mut world, body, 500.0, 500.0, TeamId::EVIL);
        world.get_mut(me).expect("me").ai.registers = Registers {
            argument: 7,
            ..Registers::default()
        };
        let script = compile("argument = argument + 1").expect("compiles");
        run_script(&mut world, me, &script);
        run_script(&mut world, me, &script);
        let entity = world.get(me).expect("me");
        assert_eq!(entity.ai.registers.argument, 9);
        assert!(entity.ai.has_run);
    }

    #[test]
    fn end_stops_the_run() {
        let (mut world, body) = world();
        let me = spawn(&mut world, body, 500.0, 500.0, TeamId::EVIL);
        let script = compile("End\nx = 5").expect("compiles");
        let stats = run_script(&mut world, me, &script);
        assert!(stats.terminated);
        assert_eq!(world.get(me).expect("me").ai.registers.x, 0);
    }

    #[test]
    fn tick_runs_snapshot_in_creation_order() {
        let (mut world, body) = world();
        let mut library = ScriptLibrary::default();
        let source = format!("x = 700\ny = 700\nargument = {}\nSpawnCharacter", body.0);
        let id = library.load_source("spawner", &source).expect("loads");
        let mut profile = ego_core::Profile::named("Spawner");
        profile.script = Some(id);
        let spawner = world.profiles.register(profile);
        let first = spawn(&mut world, spawner, 500.0, 500.0, TeamId::EVIL);
        let plain = spawn(&mut world, body, 900.0, 900.0, TeamId::EVIL);

        let mut engine = ScriptEngine::new();
        let stats = engine.run_tick(&mut world, &library);
        assert_eq!(stats.scripts_run, 1);
        assert!(world.get(plain).expect("plain").ai.has_run);
        let child = world.get(first).expect("first").ai.child.expect("child");
        assert!(!world.get(child).expect("child").ai.has_run);
        assert_eq!(engine.total().scripts_run, 1);
    }
}
