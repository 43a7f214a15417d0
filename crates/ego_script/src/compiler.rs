//! Script source to bytecode
//!
//! Source is line oriented. Each non-blank line is either a function call
//! (`IfAttacked`) or an assignment to a register (`x = target_x + 128`).
//! Leading spaces set the nesting level; `//` starts a comment.
//!
//! ```text
//! IfAttacked
//!   SetTargetToWhoeverAttacked
//!   IfTargetIsOnHatedTeam
//!     argument = 2 << 8
//!     DamageTarget
//! Else
//!   turn = rand & 65535
//! ```

use crate::bytecode::{encode_assign, encode_call, Operand, OperandValue, Operator, Register, Script};
use crate::bytecode::{CONST_MAX, CONST_MIN, MAX_INDENT, MAX_OPERANDS};
use crate::constants;
use crate::error::CompileError;
use crate::functions;
use crate::variables::Variable;
use ego_core::{idsz, ScriptSettings};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    Number(i64),
    Idsz(u32),
    Op(Operator),
    Assign,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Ident(name) => format!("`{name}`"),
            Token::Number(value) => format!("`{value}`"),
            Token::Idsz(_) => "an IDSZ".to_string(),
            Token::Op(op) => format!("`{}`", op.symbol()),
            Token::Assign => "`=`".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Compiler {
    indent_width: usize,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new(&ScriptSettings::default())
    }
}

impl Compiler {
    pub fn new(settings: &ScriptSettings) -> Self {
        Self::with_indent_width(settings.indent_width)
    }

    pub fn with_indent_width(indent_width: usize) -> Self {
        Self {
            indent_width: indent_width.max(1),
        }
    }

    pub fn indent_width(&self) -> usize {
        self.indent_width
    }

    /// Compile `source`. The same source always yields the same words and
    /// jump table.
    pub fn compile(&self, source: &str) -> Result<Script, CompileError> {
        let mut words = Vec::new();
        let mut previous: Option<usize> = None;
        for (index, raw) in source.lines().enumerate() {
            let line = index + 1;
            let code = raw.find("//").map_or(raw, |start| &raw[..start]).trim_end();
            let body = code.trim_start_matches([' ', '\t']);
            if body.is_empty() {
                continue;
            }
            let leading = &code[..code.len() - body.len()];
            if leading.contains('\t') {
                return Err(CompileError::TabIndent { line });
            }
            let level = self.indent_level(leading.len(), line)?;
            let limit = previous.map_or(0, |previous| previous + 1);
            if level > limit {
                return Err(CompileError::IndentJump {
                    line,
                    from: previous.unwrap_or(0),
                    to: level,
                });
            }
            previous = Some(level);

            let tokens = lex(body, line)?;
            emit(&tokens, level as u8, line, &mut words)?;
        }
        let script = Script::from_words(words)?;
        tracing::trace!(instructions = script.len(), "compiled script");
        Ok(script)
    }

    fn indent_level(&self, spaces: usize, line: usize) -> Result<usize, CompileError> {
        if spaces % self.indent_width != 0 {
            return Err(CompileError::OddIndent {
                line,
                spaces,
                width: self.indent_width,
            });
        }
        let level = spaces / self.indent_width;
        if level > MAX_INDENT as usize {
            return Err(CompileError::TooDeep {
                line,
                max: MAX_INDENT as usize,
            });
        }
        Ok(level)
    }
}

/// Compile with default settings.
pub fn compile(source: &str) -> Result<Script, CompileError> {
    Compiler::default().compile(source)
}

fn lex(text: &str, line: usize) -> Result<Vec<Token>, CompileError> {
    let syntax = |message: String| CompileError::Syntax { line, message };
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();
    while let Some((start, c)) = chars.next() {
        let token = match c {
            ' ' | '\t' => continue,
            '=' => Token::Assign,
            '+' => Token::Op(Operator::Add),
            '-' => Token::Op(Operator::Sub),
            '&' => Token::Op(Operator::And),
            '*' => Token::Op(Operator::Mul),
            '/' => Token::Op(Operator::Div),
            '%' => Token::Op(Operator::Mod),
            '>' | '<' => match chars.next() {
                Some((_, next)) if next == c => Token::Op(if c == '>' { Operator::Shr } else { Operator::Shl }),
                _ => return Err(syntax(format!("expected `{c}{c}`"))),
            },
            '[' => {
                let mut text = String::new();
                loop {
                    match chars.next() {
                        Some((_, ']')) => break,
                        Some((_, ch)) if ch.is_ascii_alphanumeric() || ch == '_' => text.push(ch),
                        _ => return Err(syntax("unterminated IDSZ".to_string())),
                    }
                }
                if text.len() != 4 {
                    return Err(syntax(format!("IDSZ `[{text}]` must have four characters")));
                }
                Token::Idsz(idsz(&text))
            }
            c if c.is_ascii_digit() => {
                let mut end = start + 1;
                while let Some(&(index, next)) = chars.peek() {
                    if !next.is_ascii_digit() {
                        break;
                    }
                    end = index + 1;
                    chars.next();
                }
                let digits = &text[start..end];
                let value = digits
                    .parse::<i64>()
                    .map_err(|_| syntax(format!("number `{digits}` is too large")))?;
                Token::Number(value)
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut end = start + c.len_utf8();
                while let Some(&(index, next)) = chars.peek() {
                    if !(next.is_ascii_alphanumeric() || next == '_') {
                        break;
                    }
                    end = index + next.len_utf8();
                    chars.next();
                }
                Token::Ident(text[start..end].to_string())
            }
            other => return Err(syntax(format!("unexpected character `{other}`"))),
        };
        tokens.push(token);
    }
    Ok(tokens)
}

fn emit(tokens: &[Token], indent: u8, line: usize, words: &mut Vec<u32>) -> Result<(), CompileError> {
    match tokens {
        [Token::Ident(name)] => {
            let opcode = functions::table()
                .find(name)
                .ok_or_else(|| CompileError::UnknownFunction {
                    line,
                    name: name.clone(),
                })?;
            words.push(encode_call(indent, opcode));
            Ok(())
        }
        [Token::Ident(name), Token::Assign, rest @ ..] => {
            let dest = Register::from_name(name).ok_or_else(|| CompileError::NotARegister {
                line,
                name: name.clone(),
            })?;
            let operands = expression(rest, line)?;
            words.push(encode_assign(indent, dest, operands.len()));
            words.extend(operands.iter().map(Operand::encode));
            Ok(())
        }
        [Token::Ident(_), next, ..] => Err(CompileError::Syntax {
            line,
            message: format!("unexpected {} after a function name", next.describe()),
        }),
        _ => Err(CompileError::Syntax {
            line,
            message: "expected a function call or an assignment".to_string(),
        }),
    }
}

/// `term (op term)*`, folded left to right from zero.
fn expression(tokens: &[Token], line: usize) -> Result<Vec<Operand>, CompileError> {
    let mut operands = Vec::new();
    let mut op = Operator::Add;
    let mut iter = tokens.iter();
    loop {
        let value = term(&mut iter, line)?;
        operands.push(Operand { op, value });
        if operands.len() > MAX_OPERANDS {
            return Err(CompileError::ExpressionTooLong {
                line,
                max: MAX_OPERANDS,
            });
        }
        match iter.next() {
            None => return Ok(operands),
            Some(Token::Op(next)) => op = *next,
            Some(other) => {
                return Err(CompileError::Syntax {
                    line,
                    message: format!("expected an operator, found {}", other.describe()),
                })
            }
        }
    }
}

fn term<'a>(iter: &mut impl Iterator<Item = &'a Token>, line: usize) -> Result<OperandValue, CompileError> {
    match iter.next() {
        Some(Token::Number(value)) => constant(*value, line),
        Some(Token::Op(Operator::Sub)) => match iter.next() {
            Some(Token::Number(value)) => constant(-*value, line),
            _ => Err(CompileError::Syntax {
                line,
                message: "`-` before a value must be followed by a number".to_string(),
            }),
        },
        Some(Token::Idsz(value)) => constant(*value as i64, line),
        Some(Token::Ident(name)) => {
            if let Some(variable) = Variable::from_name(name) {
                return Ok(OperandValue::Variable(variable));
            }
            match constants::lookup(name) {
                Some(value) => constant(value as i64, line),
                None => Err(CompileError::UnknownName {
                    line,
                    name: name.clone(),
                }),
            }
        }
        Some(other) => Err(CompileError::Syntax {
            line,
            message: format!("expected a value, found {}", other.describe()),
        }),
        None => Err(CompileError::Syntax {
            line,
            message: "expression ends without a value".to_string(),
        }),
    }
}

fn constant(value: i64, line: usize) -> Result<OperandValue, CompileError> {
    if value < CONST_MIN as i64 || value > CONST_MAX as i64 {
        return Err(CompileError::ConstantOutOfRange { line, value });
    }
    Ok(OperandValue::Constant(value as i32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::Instruction;
    use crate::functions::{OP_ELSE, OP_NOTHING};

    const GUARD: &str = "\
IfAttacked
  SetTargetToWhoeverAttacked
  IfTargetIsOnHatedTeam   // only enemies
    argument = 2 << 8
    DamageTarget

Else
  turn = rand & 65535
End
";

    #[test]
    fn compiles_calls_assignments_and_else() {
        let script = compile(GUARD).expect("compiles");
        assert_eq!(script.len(), 8);
        let table = functions::table();
        assert_eq!(
            script.instructions()[0],
            Instruction::Call {
                indent: 0,
                opcode: table.find("IfAttacked").expect("IfAttacked"),
                on_false: 6,
            }
        );
        assert_eq!(
            script.instructions()[3],
            Instruction::Assign {
                indent: 2,
                dest: Register::Argument,
                operands: vec![
                    Operand {
                        op: Operator::Add,
                        value: OperandValue::Constant(2),
                    },
                    Operand {
                        op: Operator::Shl,
                        value: OperandValue::Constant(8),
                    },
                ],
            }
        );
        assert_eq!(script.instructions()[5], Instruction::Else { indent: 0, end: 7 });
        assert_eq!(script.jumps(), &[6, 2, 5, 4, 5, 7, 7, 8]);
    }

    #[test]
    fn compiling_twice_is_byte_identical() {
        let first = compile(GUARD).expect("compiles");
        let second = compile(GUARD).expect("compiles");
        assert_eq!(first.to_bytes(), second.to_bytes());
        assert_eq!(Script::from_bytes(&first.to_bytes()), Ok(second));
    }

    #[test]
    fn constants_idsz_and_negatives() {
        let script = compile("x = [GOLD] + DAMAGE_FIRE - -3\ny = ATK_BEHIND").expect("compiles");
        let Instruction::Assign { operands, .. } = &script.instructions()[0] else {
            panic!("expected an assignment");
        };
        assert_eq!(operands[0].value, OperandValue::Constant(idsz("GOLD") as i32));
        assert_eq!(operands[1].value, OperandValue::Constant(5));
        assert_eq!(
            operands[2],
            Operand {
                op: Operator::Sub,
                value: OperandValue::Constant(-3),
            }
        );
    }

    #[test]
    fn indentation_errors() {
        assert_eq!(compile("\tEnd"), Err(CompileError::TabIndent { line: 1 }));
        assert_eq!(
            compile("DoNothing\n   End"),
            Err(CompileError::OddIndent {
                line: 2,
                spaces: 3,
                width: 2
            })
        );
        assert_eq!(
            compile("DoNothing\n    End"),
            Err(CompileError::IndentJump { line: 2, from: 0, to: 2 })
        );
        assert_eq!(
            compile("  End"),
            Err(CompileError::IndentJump { line: 1, from: 0, to: 1 })
        );
        let deep: String = (0..=16).map(|level| format!("{}DoNothing\n", "  ".repeat(level))).collect();
        assert_eq!(compile(&deep), Err(CompileError::TooDeep { line: 17, max: 15 }));
    }

    #[test]
    fn name_and_range_errors() {
        assert_eq!(
            compile("Explode"),
            Err(CompileError::UnknownFunction {
                line: 1,
                name: "Explode".to_string()
            })
        );
        assert_eq!(
            compile("self_life = 3"),
            Err(CompileError::NotARegister {
                line: 1,
                name: "self_life".to_string()
            })
        );
        assert_eq!(
            compile("x = bogus"),
            Err(CompileError::UnknownName {
                line: 1,
                name: "bogus".to_string()
            })
        );
        assert_eq!(
            compile("x = 67108864"),
            Err(CompileError::ConstantOutOfRange {
                line: 1,
                value: 67_108_864
            })
        );
        assert!(compile("x = -67108864").is_ok());
        let long = format!("x = 1{}", " + 1".repeat(MAX_OPERANDS));
        assert_eq!(
            compile(&long),
            Err(CompileError::ExpressionTooLong {
                line: 1,
                max: MAX_OPERANDS
            })
        );
        assert!(matches!(compile("x = 1 +"), Err(CompileError::Syntax { line: 1, .. })));
        assert!(matches!(compile("End now"), Err(CompileError::Syntax { line: 1, .. })));
    }

    #[test]
    fn indent_width_is_configurable() {
        let compiler = Compiler::with_indent_width(4);
        let script = compiler.compile("DoNothing\n    Else").expect("compiles");
        let words = script.words();
        assert_eq!(words[0], encode_call(0, OP_NOTHING));
        assert_eq!(words[1], encode_call(1, OP_ELSE));
    }
}
