//! The resolved type model.
//!
//! Declared types start out as [`Type::Named`] identifiers produced by the
//! AST builder. The resolver collaborator replaces them with `Class`,
//! `Variation`, or `TypeParam` references; `Void` marks the absent return
//! type of procedures. Code generation refuses unresolved types.

use std::fmt;

use crate::decl::{ClassId, VariationId};
use crate::ident::Ident;

/// A declared or inferred type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// The absent type of procedures
    Void,
    /// Not yet inferred (pre-resolution only)
    Infer,
    /// An unresolved type reference (pre-resolution only)
    Named(Ident),
    /// A resolved class
    Class(ClassId),
    /// A monomorphic variation of a generic class
    Variation(ClassId, VariationId),
    /// A formal generic type parameter of its defining class
    TypeParam {
        /// The class that declares the parameter
        owner: ClassId,
        /// The zero-based parameter index
        index: u32,
    },
}

impl Type {
    /// Returns true once the resolver has replaced all identifiers.
    #[must_use]
    pub const fn is_resolved(&self) -> bool { !matches!(self, Self::Named(_) | Self::Infer) }

    /// Returns the class this type names, mapping variations to their
    /// template. `None` for `Void`, unresolved names, and type parameters.
    #[must_use]
    pub const fn class(&self) -> Option<ClassId> {
        match self {
            Self::Class(class) | Self::Variation(class, _) => Some(*class),
            Self::Void | Self::Infer | Self::Named(_) | Self::TypeParam { .. } => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Void => write!(f, "Void"),
            Self::Infer => write!(f, "_"),
            Self::Named(ident) => write!(f, "{ident}"),
            Self::Class(class) => write!(f, "{class}"),
            Self::Variation(class, variation) => write!(f, "{class}@{variation}"),
            Self::TypeParam { owner, index } => write!(f, "{owner}#{index}"),
        }
    }
}
