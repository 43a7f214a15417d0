//! Ego Engine Scripting
//!
//! Indentation-structured entity scripts:
//! - Line-oriented compiler producing packed 32-bit instruction words
//! - Jump tables computed once at load, validated binary form
//! - External function table dispatched by opcode
//! - Interpreter running one pass per entity per tick
//! - Script library that falls back to a no-op script on load failure

pub mod bytecode;
pub mod compiler;
pub mod constants;
pub mod context;
pub mod error;
pub mod functions;
pub mod library;
pub mod variables;
pub mod vm;

pub use bytecode::{Instruction, Opcode, Operator, Register, Script};
pub use compiler::{compile, Compiler};
pub use context::ScriptContext;
pub use error::{CompileError, FallbackError, LoadError, ScriptError};
pub use functions::{table, FunctionEntry, FunctionTable};
pub use library::ScriptLibrary;
pub use variables::Variable;
pub use vm::{run_script, RunStats, ScriptEngine, TickStats};
