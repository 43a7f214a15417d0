//! Compiled script format
//!
//! A script is a flat sequence of 32-bit words. Every instruction starts
//! with a header word:
//!
//! ```text
//! call:    1 | indent:4 | 0 ...................... | opcode:10
//! assign:  0 | indent:4 | 0:3 | count:8 | 0:8 | register:8
//! ```
//!
//! An assignment header is followed by `count` operand words:
//!
//! ```text
//! operand: constant:1 | operator:4 | value:27
//! ```
//!
//! `value` is a sign-extended constant when the constant bit is set and a
//! variable index otherwise. Operands fold left to right into the running
//! value, starting from zero.
//!
//! Alongside the words every script carries a jump table with one entry per
//! instruction: where to resume when a call returns false (for `Else`, where
//! to go when reached by falling through). Jumps always point forward, so a
//! script run visits each instruction at most once.

use crate::error::LoadError;
use crate::functions::{self, OP_ELSE};
use crate::variables::Variable;
use ego_core::Registers;

/// Deepest nesting a header word can express.
pub const MAX_INDENT: u8 = 15;
/// Size of the opcode space.
pub const MAX_OPCODES: usize = 1024;
/// Most operands a single assignment can hold.
pub const MAX_OPERANDS: usize = 255;
/// Smallest constant an operand word can hold.
pub const CONST_MIN: i32 = -(1 << 26);
/// Largest constant an operand word can hold.
pub const CONST_MAX: i32 = (1 << 26) - 1;

const CALL_BIT: u32 = 1 << 31;
const INDENT_SHIFT: u32 = 27;
const INDENT_MASK: u32 = 0xF;
const OPCODE_MASK: u32 = 0x3FF;
const COUNT_SHIFT: u32 = 16;
const COUNT_MASK: u32 = 0xFF;
const REGISTER_MASK: u32 = 0xFF;
const CONST_BIT: u32 = 1 << 31;
const OPERATOR_SHIFT: u32 = 27;
const OPERATOR_MASK: u32 = 0xF;
const VALUE_MASK: u32 = (1 << 27) - 1;

const MAGIC: &[u8; 4] = b"EGOS";
const FORMAT_VERSION: u32 = 1;

/// Index into the external function table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Opcode(pub u16);

/// Assignable scratch register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    X = 0,
    Y = 1,
    Turn = 2,
    Distance = 3,
    Argument = 4,
}

impl Register {
    pub const ALL: [Register; 5] = [
        Register::X,
        Register::Y,
        Register::Turn,
        Register::Distance,
        Register::Argument,
    ];

    pub fn from_index(index: u32) -> Option<Register> {
        Self::ALL.get(index as usize).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            Register::X => "x",
            Register::Y => "y",
            Register::Turn => "turn",
            Register::Distance => "distance",
            Register::Argument => "argument",
        }
    }

    pub fn from_name(name: &str) -> Option<Register> {
        Self::ALL.into_iter().find(|register| register.name() == name)
    }

    pub fn get(self, registers: &Registers) -> i32 {
        match self {
            Register::X => registers.x,
            Register::Y => registers.y,
            Register::Turn => registers.turn,
            Register::Distance => registers.distance,
            Register::Argument => registers.argument,
        }
    }

    pub fn set(self, registers: &mut Registers, value: i32) {
        match self {
            Register::X => registers.x = value,
            Register::Y => registers.y = value,
            Register::Turn => registers.turn = value,
            Register::Distance => registers.distance = value,
            Register::Argument => registers.argument = value,
        }
    }
}

/// Binary operator folding an operand into the running value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Add = 0,
    Sub = 1,
    And = 2,
    Shr = 3,
    Shl = 4,
    Mul = 5,
    Div = 6,
    Mod = 7,
}

impl Operator {
    pub const ALL: [Operator; 8] = [
        Operator::Add,
        Operator::Sub,
        Operator::And,
        Operator::Shr,
        Operator::Shl,
        Operator::Mul,
        Operator::Div,
        Operator::Mod,
    ];

    pub fn from_bits(bits: u32) -> Option<Operator> {
        Self::ALL.get(bits as usize).copied()
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::And => "&",
            Operator::Shr => ">>",
            Operator::Shl => "<<",
            Operator::Mul => "*",
            Operator::Div => "/",
            Operator::Mod => "%",
        }
    }

    /// Fold `value` into `acc`. Division and remainder by zero leave `acc`
    /// unchanged; everything else wraps.
    pub fn apply(self, acc: i32, value: i32) -> i32 {
        match self {
            Operator::Add => acc.wrapping_add(value),
            Operator::Sub => acc.wrapping_sub(value),
            Operator::And => acc & value,
            Operator::Shr => acc.wrapping_shr(value as u32 & 31),
            Operator::Shl => acc.wrapping_shl(value as u32 & 31),
            Operator::Mul => acc.wrapping_mul(value),
            Operator::Div if value == 0 => acc,
            Operator::Div => acc.wrapping_div(value),
            Operator::Mod if value == 0 => acc,
            Operator::Mod => acc.wrapping_rem(value),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandValue {
    Constant(i32),
    Variable(Variable),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operand {
    pub op: Operator,
    pub value: OperandValue,
}

impl Operand {
    pub fn encode(&self) -> u32 {
        let op = (self.op as u32) << OPERATOR_SHIFT;
        match self.value {
            OperandValue::Constant(value) => CONST_BIT | op | (value as u32 & VALUE_MASK),
            OperandValue::Variable(variable) => op | variable.index() as u32,
        }
    }

    fn decode(word: u32, index: usize) -> Result<Operand, LoadError> {
        let operator = (word >> OPERATOR_SHIFT) & OPERATOR_MASK;
        let op = Operator::from_bits(operator).ok_or(LoadError::UnknownOperator { index, operator })?;
        let raw = word & VALUE_MASK;
        let value = if word & CONST_BIT != 0 {
            // Sign-extend the 27-bit field.
            OperandValue::Constant(((raw << 5) as i32) >> 5)
        } else {
            let variable = Variable::from_index(raw).ok_or(LoadError::UnknownVariable { index, variable: raw })?;
            OperandValue::Variable(variable)
        };
        Ok(Operand { op, value })
    }
}

/// Header word for a function call.
pub fn encode_call(indent: u8, opcode: Opcode) -> u32 {
    CALL_BIT | ((indent as u32 & INDENT_MASK) << INDENT_SHIFT) | (opcode.0 as u32 & OPCODE_MASK)
}

/// Header word for an assignment of `count` operands into `dest`.
pub fn encode_assign(indent: u8, dest: Register, count: usize) -> u32 {
    ((indent as u32 & INDENT_MASK) << INDENT_SHIFT)
        | ((count as u32 & COUNT_MASK) << COUNT_SHIFT)
        | (dest as u32 & REGISTER_MASK)
}

/// Decoded instruction with its control-flow target resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// Run a handler; on false resume at `on_false`.
    Call { indent: u8, opcode: Opcode, on_false: usize },
    /// Reached by falling out of the matching block: skip to `end`.
    Else { indent: u8, end: usize },
    Assign { indent: u8, dest: Register, operands: Vec<Operand> },
}

impl Instruction {
    pub fn indent(&self) -> u8 {
        match self {
            Instruction::Call { indent, .. } | Instruction::Else { indent, .. } | Instruction::Assign { indent, .. } => {
                *indent
            }
        }
    }

    fn jump(&self, next_sibling: usize) -> usize {
        match self {
            Instruction::Call { on_false, .. } => *on_false,
            Instruction::Else { end, .. } => *end,
            Instruction::Assign { .. } => next_sibling,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Script {
    words: Vec<u32>,
    jumps: Vec<u32>,
    instructions: Vec<Instruction>,
}

impl Script {
    /// The empty script: runs, does nothing, never fails.
    pub fn noop() -> Self {
        Self::default()
    }

    /// Decode and validate a word stream, computing its jump table.
    pub fn from_words(words: Vec<u32>) -> Result<Self, LoadError> {
        let opcode_count = functions::table().len() as u32;
        let mut instructions = Vec::new();
        let mut cursor = 0;
        while cursor < words.len() {
            let index = instructions.len();
            let header = words[cursor];
            let indent = ((header >> INDENT_SHIFT) & INDENT_MASK) as u8;
            if header & CALL_BIT != 0 {
                let raw = header & OPCODE_MASK;
                if raw >= opcode_count {
                    return Err(LoadError::OpcodeOutOfRange { index, opcode: raw });
                }
                let opcode = Opcode(raw as u16);
                instructions.push(if opcode == OP_ELSE {
                    Instruction::Else { indent, end: 0 }
                } else {
                    Instruction::Call {
                        indent,
                        opcode,
                        on_false: 0,
                    }
                });
                cursor += 1;
            } else {
                let register = header & REGISTER_MASK;
                let dest = Register::from_index(register).ok_or(LoadError::UnknownRegister { index, register })?;
                let count = ((header >> COUNT_SHIFT) & COUNT_MASK) as usize;
                if count == 0 {
                    return Err(LoadError::EmptyAssignment { index });
                }
                let operand_words = words
                    .get(cursor + 1..cursor + 1 + count)
                    .ok_or(LoadError::TruncatedOperands { index })?;
                let operands = operand_words
                    .iter()
                    .map(|word| Operand::decode(*word, index))
                    .collect::<Result<Vec<_>, _>>()?;
                instructions.push(Instruction::Assign { indent, dest, operands });
                cursor += 1 + count;
            }
        }

        let mut previous = 0u8;
        for (index, instruction) in instructions.iter().enumerate() {
            let indent = instruction.indent();
            if indent > previous.saturating_add(1) || (index == 0 && indent != 0) {
                return Err(LoadError::BadIndent {
                    index,
                    from: previous,
                    to: indent,
                });
            }
            previous = indent;
        }

        let siblings = next_siblings(&instructions);
        let len = instructions.len();
        for index in 0..len {
            let target = siblings[index];
            let resolved = match &instructions[index] {
                Instruction::Call { indent, .. } => match instructions.get(target) {
                    Some(Instruction::Else { indent: else_indent, .. }) if else_indent == indent => target + 1,
                    _ => target,
                },
                _ => target,
            };
            match &mut instructions[index] {
                Instruction::Call { on_false, .. } => *on_false = resolved,
                Instruction::Else { end, .. } => *end = resolved,
                Instruction::Assign { .. } => {}
            }
        }
        let jumps = instructions
            .iter()
            .enumerate()
            .map(|(index, instruction)| instruction.jump(siblings[index]) as u32)
            .collect();

        Ok(Self {
            words,
            jumps,
            instructions,
        })
    }

    pub fn words(&self) -> &[u32] {
        &self.words
    }

    /// Resume target per instruction.
    pub fn jumps(&self) -> &[u32] {
        &self.jumps
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Serialize as `magic | version | instruction count | word count |
    /// words | jumps`, little-endian.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(16 + 4 * (self.words.len() + self.jumps.len()));
        bytes.extend_from_slice(MAGIC);
        bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        bytes.extend_from_slice(&(self.instructions.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&(self.words.len() as u32).to_le_bytes());
        for word in self.words.iter().chain(&self.jumps) {
            bytes.extend_from_slice(&word.to_le_bytes());
        }
        bytes
    }

    /// Parse and validate the output of [`Script::to_bytes`]. The stored
    /// jump table must match the one recomputed from the words.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LoadError> {
        let mut reader = WordReader { bytes };
        let magic = reader.take(4)?;
        if magic != MAGIC {
            return Err(LoadError::BadMagic);
        }
        let version = reader.u32()?;
        if version != FORMAT_VERSION {
            return Err(LoadError::Version(version));
        }
        let instruction_count = reader.u32()? as usize;
        let word_count = reader.u32()? as usize;
        let words = (0..word_count).map(|_| reader.u32()).collect::<Result<Vec<_>, _>>()?;
        let stored = (0..instruction_count)
            .map(|_| reader.u32())
            .collect::<Result<Vec<_>, _>>()?;
        if !reader.bytes.is_empty() {
            return Err(LoadError::TrailingBytes(reader.bytes.len()));
        }

        let script = Self::from_words(words)?;
        if stored.len() != script.jumps.len() {
            return Err(LoadError::JumpCount {
                expected: script.jumps.len(),
                found: stored.len(),
            });
        }
        if let Some((index, target)) = stored
            .iter()
            .zip(&script.jumps)
            .enumerate()
            .find_map(|(index, (stored, computed))| (stored != computed).then_some((index, *stored)))
        {
            return Err(LoadError::BadJump { index, target });
        }
        Ok(script)
    }
}

/// For every instruction, the first later instruction at the same or a
/// shallower indent (or the script length if none).
fn next_siblings(instructions: &[Instruction]) -> Vec<usize> {
    let len = instructions.len();
    let mut targets = vec![len; len];
    let mut pending: Vec<usize> = Vec::new();
    for (index, instruction) in instructions.iter().enumerate() {
        let indent = instruction.indent();
        while let Some(&open) = pending.last() {
            if instructions[open].indent() < indent {
                break;
            }
            targets[open] = index;
            pending.pop();
        }
        pending.push(index);
    }
    targets
}

struct WordReader<'a> {
    bytes: &'a [u8],
}

impl<'a> WordReader<'a> {
    fn take(&mut self, count: usize) -> Result<&'a [u8], LoadError> {
        if self.bytes.len() < count {
            return Err(LoadError::Truncated);
        }
        let (head, tail) = self.bytes.split_at(count);
        self.bytes = tail;
        Ok(head)
    }

    fn u32(&mut self) -> Result<u32, LoadError> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}
