//! Operator and modifier enums shared across parse tree nodes.

use std::fmt;

/// Binary operators of the surface language.
///
/// Every binary operator lowers to a method call on its left operand
/// (`in` is inverted and becomes a call on the *right* operand); the
/// canonical method names live in `ladon-lower`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Mod,
    /// `^`
    Pow,
    /// `=`
    Eq,
    /// `!=`
    NotEq,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `<=`
    LtEq,
    /// `>=`
    GtEq,
    /// `in`
    In,
    /// `and`
    And,
    /// `or`
    Or,
    /// `xor`
    Xor,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Pow => "^",
            Self::Eq => "=",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::LtEq => "<=",
            Self::GtEq => ">=",
            Self::In => "in",
            Self::And => "and",
            Self::Or => "or",
            Self::Xor => "xor",
        };
        write!(f, "{symbol}")
    }
}

/// Unary operators of the surface language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// Arithmetic negation `-`
    Neg,
    /// Logical negation `not`
    Not,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Neg => write!(f, "-"),
            Self::Not => write!(f, "not"),
        }
    }
}

/// Surface access modifiers.
///
/// Absence of a modifier means package access inside classes; the AST
/// builder applies that default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessSpec {
    /// `public`
    Public,
    /// `protected`
    Protected,
    /// `package`
    Package,
    /// `private`
    Private,
}
