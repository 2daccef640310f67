//! Semantic invariant errors detected while building the AST.
//!
//! These are the builder-detectable errors of the compiler's error taxonomy:
//! statements that are syntactically valid but appear in a context that can
//! never be correct. Each error carries the offending position and aborts
//! compilation; nothing is silently recovered.

use ladon_source::types::Position;
use thiserror::Error;

/// Errors raised by the AST builder.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LowerError {
    /// `break` outside of a loop body.
    #[error("'break' statement outside loop")]
    BreakOutsideLoop {
        /// The location of the break statement
        position: Position,
    },

    /// `skip` outside of a loop body.
    #[error("'skip' statement outside loop")]
    SkipOutsideLoop {
        /// The location of the skip statement
        position: Position,
    },

    /// `yield` outside of a generator body.
    #[error("'yield' statement outside generator")]
    YieldOutsideGenerator {
        /// The location of the yield statement
        position: Position,
    },

    /// `return` with a value inside a procedure.
    #[error("'return' with a value inside a procedure")]
    ReturnValueInProcedure {
        /// The location of the return statement
        position: Position,
    },

    /// `return` with a value inside a generator body.
    #[error("'return' with a value inside a generator")]
    ReturnValueInGenerator {
        /// The location of the return statement
        position: Position,
    },

    /// A required parameter follows a defaulted parameter.
    #[error("parameter '{name}' without default follows a defaulted parameter")]
    RequiredAfterDefault {
        /// The offending parameter name
        name: String,
        /// The location of the parameter
        position: Position,
    },
}

impl LowerError {
    /// Returns the position associated with this error.
    #[must_use]
    pub const fn position(&self) -> Position {
        match self {
            Self::BreakOutsideLoop { position }
            | Self::SkipOutsideLoop { position }
            | Self::YieldOutsideGenerator { position }
            | Self::ReturnValueInProcedure { position }
            | Self::ReturnValueInGenerator { position }
            | Self::RequiredAfterDefault { position, .. } => *position,
        }
    }
}
