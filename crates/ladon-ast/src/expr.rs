//! Expression nodes.
//!
//! Every expression carries its source position, its resolved type, and an
//! l-value flag that is true when the expression denotes an assignable
//! location. The desugaring front end has already rewritten operator
//! expressions, lambdas, and comprehensions, so the catalogue here is the
//! core subset consumed by code generation.

use ladon_source::types::Position;

use crate::decl::{FunctionId, VarId};
use crate::ident::Ident;
use crate::types::Type;

/// A literal value.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Integer literal
    Int(i64),
    /// Floating point literal
    Float(f64),
    /// Boolean literal
    Bool(bool),
    /// Character literal
    Char(char),
    /// String literal
    Str(String),
}

/// A variable reference: a resolvable name or a resolved declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VarRef {
    /// Unresolved reference, as produced by the builder
    Named(Ident),
    /// Resolved reference to a variable declaration
    Decl(VarId),
}

/// A call target: a resolvable name or a resolved overload.
///
/// The resolver selects the overload by minimal total parameter distance;
/// ties are a resolution error, never a silent pick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Callee {
    /// Unresolved callee, as produced by the builder
    Named(Ident),
    /// Resolved reference to the selected overload
    Decl(FunctionId),
}

/// An expression node.
#[derive(Debug, Clone)]
pub struct Expr {
    /// Source position
    pub position: Position,
    /// The expression variant
    pub kind: ExprKind,
    /// The resolved type of the expression's value
    pub ty: Type,
    /// True when the expression denotes an assignable location
    pub lvalue: bool,
}

impl Expr {
    /// Creates an r-value expression.
    #[must_use]
    pub const fn new(position: Position, kind: ExprKind, ty: Type) -> Self {
        Self { position, kind, ty, lvalue: false }
    }

    /// Marks this expression as an assignable location.
    #[must_use]
    pub const fn as_lvalue(mut self) -> Self {
        self.lvalue = true;
        self
    }
}

/// The expression variants of the core subset.
#[derive(Debug, Clone)]
pub enum ExprKind {
    /// A literal value, boxed into its core class on emission
    Literal(Literal),
    /// An array literal; elements in source order
    Array(Vec<Expr>),
    /// A variable access
    Var(VarRef),
    /// Member access: evaluate `target`, then `member` against it
    Member {
        /// The accessed object
        target: Box<Expr>,
        /// The member expression: a variable access or a call
        member: Box<Expr>,
    },
    /// The receiver of the current method
    SelfRef,
    /// The receiver viewed as the named supertype
    ParentCast(Type),
    /// A function, method, or initializer call
    Call {
        /// The call target
        callee: Callee,
        /// Generic arguments written on the callee, if any
        type_args: Vec<Type>,
        /// The arguments in source order
        args: Vec<Expr>,
    },
    /// Checked cast to the target type
    Cast {
        /// The value being cast
        value: Box<Expr>,
        /// The target type
        target: Type,
    },
    /// Class identity test; the result is a boxed boolean
    Is {
        /// The value being tested
        value: Box<Expr>,
        /// The tested class
        class: Type,
    },
    /// Conditional expression yielding one value of the common type
    If {
        /// The condition
        condition: Box<Expr>,
        /// Value when the condition holds
        then_value: Box<Expr>,
        /// Value otherwise
        else_value: Box<Expr>,
    },
}
