//! Abstract syntax tree and declaration model for the Ladon compiler.
//!
//! The AST is the canonical program representation between the desugaring
//! front end (`ladon-lower`) and the IR backend (`ladon-codegen`). Every
//! surface construct has already been rewritten into the core subset defined
//! here: assignments, conditionals, while loops, break/skip, return, yield,
//! raise, try, and calls.
//!
//! Declarations live in a [`decl::DeclTable`] arena and are referenced by
//! typed indices ([`decl::ClassId`], [`decl::FunctionId`], [`decl::VarId`],
//! [`decl::VariationId`]); statement and expression trees are owned enums.
//! Children are owned by their parents (or the arena); "enclosing" queries go
//! through stored ids, never through back-pointers.
//!
//! Name and type references start out *unresolved* (`Named` identifiers) and
//! are resolved in place of the identifier by the resolver collaborator; code
//! generation requires fully resolved trees.

pub mod core;
pub mod decl;
pub mod expr;
pub mod ident;
pub mod overload;
pub mod stmt;
pub mod types;

pub use self::core::CoreClasses;

pub use decl::{
    Access,
    Block,
    ClassDecl,
    ClassId,
    DeclTable,
    Declaration,
    FunctionDecl,
    FunctionId,
    FunctionKind,
    ModuleDecl,
    Package,
    VarDecl,
    VarId,
    VarKind,
    Variation,
    VariationId,
};
pub use expr::{Callee, Expr, ExprKind, Literal, VarRef};
pub use ident::Ident;
pub use overload::{OverloadError, distance, select};
pub use stmt::{Stmt, TryHandler};
pub use types::Type;
