//! Statement nodes.
//!
//! The core statement subset after desugaring. For-in loops, compound
//! assignments, and generator bodies have been rewritten by the builder; a
//! yield statement is a return that additionally records its resume ordinal.

use ladon_source::types::Position;

use crate::decl::{Block, VarId};
use crate::expr::Expr;
use crate::types::Type;

/// A statement of the core subset.
#[derive(Debug, Clone)]
pub enum Stmt {
    /// Assignment of `value` into the location denoted by `target`.
    ///
    /// The right-hand side is evaluated before the left-hand side.
    Assign {
        /// The assignment target; must be an l-value
        target: Expr,
        /// The assigned value
        value: Expr,
    },
    /// Unpacking assignment through a synthesized temporary.
    Unpack {
        /// The synthesized temporary holding the unpacked value
        temp: VarId,
        /// The assignment targets, in source order
        targets: Vec<Expr>,
        /// The unpacked value
        value: Expr,
    },
    /// Conditional statement.
    If {
        /// The condition
        condition: Expr,
        /// Block of the `then` branch
        then_block: Block,
        /// Block of the `else` branch (possibly empty)
        else_block: Block,
    },
    /// While loop; condition evaluated at the top of each iteration.
    While {
        /// The loop condition
        condition: Expr,
        /// The loop body
        body: Block,
    },
    /// Jump past the end of the enclosing loop.
    Break {
        /// Source position
        position: Position,
    },
    /// Jump to the condition of the enclosing loop.
    Skip {
        /// Source position
        position: Position,
    },
    /// Return from the enclosing function.
    Return {
        /// The returned value; absent in procedures and initializers
        value: Option<Expr>,
        /// Source position
        position: Position,
    },
    /// Yield from a generator body: a return that also records the resume
    /// label ordinal used for state-machine synthesis.
    Yield {
        /// The yielded value (already wrapped by the builder)
        value: Expr,
        /// Stable zero-based ordinal of this yield within its body
        index: usize,
        /// Source position
        position: Position,
    },
    /// Raise an error value.
    Raise {
        /// The raised value
        value: Expr,
        /// Source position
        position: Position,
    },
    /// Try statement with handler clauses.
    Try {
        /// The guarded block
        body: Block,
        /// The handler clauses
        handlers: Vec<TryHandler>,
    },
    /// A call used as a statement; a produced value is discarded.
    Call(Expr),
}

/// A handler clause of a try statement.
#[derive(Debug, Clone)]
pub struct TryHandler {
    /// The handled class
    pub class: Type,
    /// The variable bound to the handled value, if named
    pub binding: Option<VarId>,
    /// The handler block
    pub block: Block,
}
