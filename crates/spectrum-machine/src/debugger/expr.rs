//! Breakpoint condition expressions.
//!
//! A small integer language over Z80 registers and memory:
//!
//! ```text
//! pc == $8000 && (a & %1000_0000)
//! peek(hl) != 0 || tstates > 30000
//! ```
//!
//! Values are `u32` with wrapping arithmetic. Comparisons and logical
//! operators yield 0 or 1; any non-zero result is true.

use std::fmt;
use std::str::FromStr;

use crate::error::DebuggerError;

/// Machine state a condition can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variable {
    A,
    F,
    B,
    C,
    D,
    E,
    H,
    L,
    Af,
    Bc,
    De,
    Hl,
    AfAlt,
    BcAlt,
    DeAlt,
    HlAlt,
    Ix,
    Iy,
    Sp,
    Pc,
    I,
    R,
    Iff1,
    Iff2,
    Im,
    /// T-states since the start of the frame.
    Tstates,
    /// Frames since reset, saturating at `u32::MAX`.
    Frame,
}

impl Variable {
    pub const ALL: [Self; 27] = [
        Self::A,
        Self::F,
        Self::B,
        Self::C,
        Self::D,
        Self::E,
        Self::H,
        Self::L,
        Self::Af,
        Self::Bc,
        Self::De,
        Self::Hl,
        Self::AfAlt,
        Self::BcAlt,
        Self::DeAlt,
        Self::HlAlt,
        Self::Ix,
        Self::Iy,
        Self::Sp,
        Self::Pc,
        Self::I,
        Self::R,
        Self::Iff1,
        Self::Iff2,
        Self::Im,
        Self::Tstates,
        Self::Frame,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::A => "a",
            Self::F => "f",
            Self::B => "b",
            Self::C => "c",
            Self::D => "d",
            Self::E => "e",
            Self::H => "h",
            Self::L => "l",
            Self::Af => "af",
            Self::Bc => "bc",
            Self::De => "de",
            Self::Hl => "hl",
            Self::AfAlt => "af'",
            Self::BcAlt => "bc'",
            Self::DeAlt => "de'",
            Self::HlAlt => "hl'",
            Self::Ix => "ix",
            Self::Iy => "iy",
            Self::Sp => "sp",
            Self::Pc => "pc",
            Self::I => "i",
            Self::R => "r",
            Self::Iff1 => "iff1",
            Self::Iff2 => "iff2",
            Self::Im => "im",
            Self::Tstates => "tstates",
            Self::Frame => "frame",
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Variable {
    type Err = DebuggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|var| var.name() == wanted)
            .ok_or_else(|| DebuggerError::InvalidCondition(format!("unknown variable `{s}`")))
    }
}

/// What a condition is evaluated against.
pub trait EvalContext {
    fn variable(&self, var: Variable) -> u32;

    /// Side-effect-free read through the current read view.
    fn peek(&self, addr: u16) -> u8;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Complement,
    Negate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    LogicalOr,
    LogicalAnd,
    BitOr,
    BitXor,
    BitAnd,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl BinaryOp {
    /// Binding strength; higher binds tighter.
    const fn precedence(self) -> u8 {
        match self {
            Self::LogicalOr => 1,
            Self::LogicalAnd => 2,
            Self::BitOr => 3,
            Self::BitXor => 4,
            Self::BitAnd => 5,
            Self::Eq | Self::Ne => 6,
            Self::Lt | Self::Le | Self::Gt | Self::Ge => 7,
            Self::Add | Self::Sub => 8,
            Self::Mul | Self::Div | Self::Rem => 9,
        }
    }

    fn apply(self, lhs: u32, rhs: u32) -> u32 {
        match self {
            // Short-circuiting forms are handled by the caller.
            Self::LogicalOr => u32::from(lhs != 0 || rhs != 0),
            Self::LogicalAnd => u32::from(lhs != 0 && rhs != 0),
            Self::BitOr => lhs | rhs,
            Self::BitXor => lhs ^ rhs,
            Self::BitAnd => lhs & rhs,
            Self::Eq => u32::from(lhs == rhs),
            Self::Ne => u32::from(lhs != rhs),
            Self::Lt => u32::from(lhs < rhs),
            Self::Le => u32::from(lhs <= rhs),
            Self::Gt => u32::from(lhs > rhs),
            Self::Ge => u32::from(lhs >= rhs),
            Self::Add => lhs.wrapping_add(rhs),
            Self::Sub => lhs.wrapping_sub(rhs),
            Self::Mul => lhs.wrapping_mul(rhs),
            Self::Div => lhs.checked_div(rhs).unwrap_or(0),
            Self::Rem => lhs.checked_rem(rhs).unwrap_or(0),
        }
    }
}

/// Parsed condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Literal(u32),
    Var(Variable),
    Peek(Box<Expr>),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
}

impl Expr {
    /// Parse a condition.
    pub fn parse(source: &str) -> Result<Self, DebuggerError> {
        let tokens = tokenize(source)?;
        let mut parser = Parser { tokens, pos: 0 };
        let expr = parser.expression(0)?;
        match parser.peek() {
            Token::End => Ok(expr),
            other => Err(invalid(format!("unexpected {other} after expression"))),
        }
    }

    #[must_use]
    pub fn evaluate(&self, ctx: &dyn EvalContext) -> u32 {
        match self {
            Self::Literal(value) => *value,
            Self::Var(var) => ctx.variable(*var),
            Self::Peek(addr) => u32::from(ctx.peek(addr.evaluate(ctx) as u16)),
            Self::Unary(op, operand) => {
                let value = operand.evaluate(ctx);
                match op {
                    UnaryOp::Not => u32::from(value == 0),
                    UnaryOp::Complement => !value,
                    UnaryOp::Negate => value.wrapping_neg(),
                }
            }
            Self::Binary(BinaryOp::LogicalOr, lhs, rhs) => {
                u32::from(lhs.evaluate(ctx) != 0 || rhs.evaluate(ctx) != 0)
            }
            Self::Binary(BinaryOp::LogicalAnd, lhs, rhs) => {
                u32::from(lhs.evaluate(ctx) != 0 && rhs.evaluate(ctx) != 0)
            }
            Self::Binary(op, lhs, rhs) => op.apply(lhs.evaluate(ctx), rhs.evaluate(ctx)),
        }
    }

    /// Evaluate as a condition: non-zero is true.
    #[must_use]
    pub fn is_true(&self, ctx: &dyn EvalContext) -> bool {
        self.evaluate(ctx) != 0
    }
}

fn invalid(message: String) -> DebuggerError {
    DebuggerError::InvalidCondition(message)
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Number(u32),
    Ident(String),
    Op(&'static str),
    LParen,
    RParen,
    End,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "number {n}"),
            Token::Ident(name) => write!(f, "`{name}`"),
            Token::Op(op) => write!(f, "`{op}`"),
            Token::LParen => f.write_str("`(`"),
            Token::RParen => f.write_str("`)`"),
            Token::End => f.write_str("end of input"),
        }
    }
}

/// Operators, longest first so `<=` wins over `<`.
const OPERATORS: [&str; 19] = [
    "||", "&&", "==", "!=", "<=", ">=", "|", "^", "&", "<", ">", "+", "-", "*", "/", "%", "!",
    "~", "=",
];

fn tokenize(source: &str) -> Result<Vec<Token>, DebuggerError> {
    let mut tokens = Vec::new();
    let mut rest = source;

    while let Some(ch) = rest.chars().next() {
        if ch.is_whitespace() {
            rest = &rest[ch.len_utf8()..];
            continue;
        }

        // `%` starts a binary literal only where an operand is expected;
        // after an operand it is the remainder operator.
        let operand_expected = !matches!(
            tokens.last(),
            Some(Token::Number(_) | Token::Ident(_) | Token::RParen)
        );

        let (token, len) = if ch.is_ascii_digit() {
            lex_number(rest)?
        } else if ch == '$' {
            let (value, len) = lex_radix(&rest[1..], 16, "hex")?;
            (Token::Number(value), len + 1)
        } else if ch == '%' && operand_expected && rest[1..].starts_with(['0', '1']) {
            let (value, len) = lex_radix(&rest[1..], 2, "binary")?;
            (Token::Number(value), len + 1)
        } else if ch.is_ascii_alphabetic() || ch == '_' {
            let mut len = rest
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(rest.len());
            if rest[len..].starts_with('\'') {
                len += 1;
            }
            (Token::Ident(rest[..len].to_ascii_lowercase()), len)
        } else if ch == '(' {
            (Token::LParen, 1)
        } else if ch == ')' {
            (Token::RParen, 1)
        } else if let Some(op) = OPERATORS.into_iter().find(|op| rest.starts_with(op)) {
            // Lone `=` reads as equality, as most debugger front ends allow.
            (Token::Op(if op == "=" { "==" } else { op }), op.len())
        } else {
            return Err(invalid(format!("unexpected character `{ch}`")));
        };

        tokens.push(token);
        rest = &rest[len..];
    }

    tokens.push(Token::End);
    Ok(tokens)
}

/// Decimal, or `0x` hex.
fn lex_number(text: &str) -> Result<(Token, usize), DebuggerError> {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        let (value, len) = lex_radix(hex, 16, "hex")?;
        return Ok((Token::Number(value), len + 2));
    }
    let (value, len) = lex_radix(text, 10, "decimal")?;
    Ok((Token::Number(value), len))
}

/// Digits in `radix` (underscores allowed as separators).
fn lex_radix(text: &str, radix: u32, what: &str) -> Result<(u32, usize), DebuggerError> {
    let len = text
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(text.len());
    let digits: String = text[..len].chars().filter(|&c| c != '_').collect();
    if digits.is_empty() {
        return Err(invalid(format!("empty {what} literal")));
    }
    u32::from_str_radix(&digits, radix)
        .map(|value| (value, len))
        .map_err(|_| invalid(format!("bad {what} literal `{}`", &text[..len])))
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&Token::End)
    }

    fn next(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, wanted: &Token) -> Result<(), DebuggerError> {
        let found = self.next();
        if &found == wanted {
            Ok(())
        } else {
            Err(invalid(format!("expected {wanted}, found {found}")))
        }
    }

    fn binary_op(&self) -> Option<BinaryOp> {
        let Token::Op(op) = self.peek() else {
            return None;
        };
        Some(match *op {
            "||" => BinaryOp::LogicalOr,
            "&&" => BinaryOp::LogicalAnd,
            "|" => BinaryOp::BitOr,
            "^" => BinaryOp::BitXor,
            "&" => BinaryOp::BitAnd,
            "==" => BinaryOp::Eq,
            "!=" => BinaryOp::Ne,
            "<" => BinaryOp::Lt,
            "<=" => BinaryOp::Le,
            ">" => BinaryOp::Gt,
            ">=" => BinaryOp::Ge,
            "+" => BinaryOp::Add,
            "-" => BinaryOp::Sub,
            "*" => BinaryOp::Mul,
            "/" => BinaryOp::Div,
            "%" => BinaryOp::Rem,
            _ => return None,
        })
    }

    /// Precedence climbing: all operators are left-associative.
    fn expression(&mut self, min_precedence: u8) -> Result<Expr, DebuggerError> {
        let mut lhs = self.unary()?;
        while let Some(op) = self.binary_op() {
            if op.precedence() < min_precedence {
                break;
            }
            self.next();
            let rhs = self.expression(op.precedence() + 1)?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, DebuggerError> {
        let op = match self.peek() {
            Token::Op("!") => UnaryOp::Not,
            Token::Op("~") => UnaryOp::Complement,
            Token::Op("-") => UnaryOp::Negate,
            _ => return self.primary(),
        };
        self.next();
        Ok(Expr::Unary(op, Box::new(self.unary()?)))
    }

    fn primary(&mut self) -> Result<Expr, DebuggerError> {
        match self.next() {
            Token::Number(value) => Ok(Expr::Literal(value)),
            Token::LParen => {
                let inner = self.expression(0)?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            Token::Ident(name) if name == "peek" => {
                self.expect(&Token::LParen)?;
                let addr = self.expression(0)?;
                self.expect(&Token::RParen)?;
                Ok(Expr::Peek(Box::new(addr)))
            }
            Token::Ident(name) => name.parse().map(Expr::Var),
            other => Err(invalid(format!("expected a value, found {other}"))),
        }
    }
}
