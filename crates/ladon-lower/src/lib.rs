//! The desugaring AST builder of the Ladon compiler.
//!
//! This crate turns parse trees (`ladon-syntax`) into the canonical AST
//! (`ladon-ast`). Every surface feature is rewritten into the core subset:
//!
//! - compound assignments become plain assignments over operator calls;
//! - unary and binary operators become method calls (`in` is inverted);
//! - `for-in` loops become iterator-driven while loops;
//! - list comprehensions become synthesized generator classes;
//! - lambdas become synthesized functions plus wrapper classes;
//! - default arguments become forwarding overload thunks;
//! - generator declarations become a factory class and an iterator class
//!   whose `getNext` body carries indexed yield markers;
//! - procedures get an implicit trailing return.
//!
//! Builder-time context (open blocks, generator return types, variable and
//! function kinds) is explicit state on the [`builder::Lowerer`]; two
//! lowerers never share state.

pub mod builder;
pub mod error;
pub mod ops;
pub mod synth;
pub mod temps;

pub use builder::Lowerer;
pub use error::LowerError;
