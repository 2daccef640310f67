//! Symbolic identifiers.
//!
//! An [`Ident`] is a name plus an ordered list of generic-argument
//! identifiers, possibly still unresolved. Two identifiers match iff their
//! names and argument lists match structurally; that rule drives both
//! declaration lookup and the zero-distance case of overload selection.

use std::fmt;

/// A symbolic name with optional generic arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ident {
    /// The bare name
    pub name: String,
    /// Generic argument identifiers, in declaration order
    pub generics: Vec<Ident>,
}

impl Ident {
    /// Creates a plain identifier without generic arguments.
    #[must_use]
    pub fn plain(name: impl Into<String>) -> Self { Self { name: name.into(), generics: Vec::new() } }

    /// Creates an identifier with generic arguments.
    #[must_use]
    pub fn generic(name: impl Into<String>, generics: Vec<Ident>) -> Self {
        Self { name: name.into(), generics }
    }

    /// Returns true if this identifier carries generic arguments.
    #[must_use]
    pub fn is_generic(&self) -> bool { !self.generics.is_empty() }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;

        if let Some((first, rest)) = self.generics.split_first() {
            write!(f, "<{first}")?;
            for generic in rest {
                write!(f, ", {generic}")?;
            }
            write!(f, ">")?;
        }

        Ok(())
    }
}

impl From<&str> for Ident {
    fn from(name: &str) -> Self { Self::plain(name) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_identifiers_match_structurally() {
        assert_eq!(Ident::plain("Int"), Ident::plain("Int"));
        assert_ne!(Ident::plain("Int"), Ident::plain("Float"));
    }

    #[test]
    fn generic_arguments_participate_in_matching() {
        let maybe_int = Ident::generic("Maybe", vec![Ident::plain("Int")]);
        let maybe_str = Ident::generic("Maybe", vec![Ident::plain("String")]);
        assert_ne!(maybe_int, maybe_str);
        assert_eq!(maybe_int, Ident::generic("Maybe", vec![Ident::plain("Int")]));
    }

    #[test]
    fn display_renders_generic_arguments() {
        let ident = Ident::generic("Maybe", vec![Ident::plain("Int")]);
        assert_eq!(ident.to_string(), "Maybe<Int>");
        assert_eq!(Ident::plain("Object").to_string(), "Object");
    }
}
