//! Script errors

use ego_core::ScriptId;
use thiserror::Error;

/// Problems in script source text. Line numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("line {line}: tab in indentation")]
    TabIndent { line: usize },
    #[error("line {line}: indentation of {spaces} spaces is not a multiple of {width}")]
    OddIndent { line: usize, spaces: usize, width: usize },
    #[error("line {line}: indentation jumps from level {from} to {to}")]
    IndentJump { line: usize, from: usize, to: usize },
    #[error("line {line}: nesting deeper than {max} levels")]
    TooDeep { line: usize, max: usize },
    #[error("line {line}: unknown function `{name}`")]
    UnknownFunction { line: usize, name: String },
    #[error("line {line}: unknown name `{name}`")]
    UnknownName { line: usize, name: String },
    #[error("line {line}: `{name}` is not a register")]
    NotARegister { line: usize, name: String },
    #[error("line {line}: constant {value} does not fit in an operand")]
    ConstantOutOfRange { line: usize, value: i64 },
    #[error("line {line}: expression has more than {max} terms")]
    ExpressionTooLong { line: usize, max: usize },
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },
    #[error("compiled output rejected: {0}")]
    Output(#[from] LoadError),
}

/// Problems in a compiled script.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("not a compiled script")]
    BadMagic,
    #[error("unsupported script format version {0}")]
    Version(u32),
    #[error("compiled script is truncated")]
    Truncated,
    #[error("{0} trailing bytes after compiled script")]
    TrailingBytes(usize),
    #[error("instruction {index}: opcode {opcode} is out of range")]
    OpcodeOutOfRange { index: usize, opcode: u32 },
    #[error("instruction {index}: register {register} does not exist")]
    UnknownRegister { index: usize, register: u32 },
    #[error("instruction {index}: variable {variable} does not exist")]
    UnknownVariable { index: usize, variable: u32 },
    #[error("instruction {index}: operator {operator} does not exist")]
    UnknownOperator { index: usize, operator: u32 },
    #[error("instruction {index}: assignment without operands")]
    EmptyAssignment { index: usize },
    #[error("instruction {index}: operands run past the end of the script")]
    TruncatedOperands { index: usize },
    #[error("instruction {index}: indentation jumps from level {from} to {to}")]
    BadIndent { index: usize, from: u8, to: u8 },
    #[error("instruction {index}: jump to {target} does not match the block structure")]
    BadJump { index: usize, target: u32 },
    #[error("jump table has {found} entries for {expected} instructions")]
    JumpCount { expected: usize, found: usize },
}

/// Any failure while bringing a script into the library.
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error("failed to read script: {0}")]
    Io(#[from] std::io::Error),
}

/// A script failed to load and `id` now refers to the no-op script.
#[derive(Debug, Error)]
#[error("script `{name}` replaced by the no-op script: {cause}")]
pub struct FallbackError {
    pub name: String,
    pub id: ScriptId,
    #[source]
    pub cause: ScriptError,
}
