//! Fresh identifier minting for synthesized declarations.

use ladon_ast::ident::Ident;

/// Mints fresh identifiers for temporaries and synthesized classes.
///
/// Each lowerer owns one factory, so two lowerers never produce clashing
/// names for the same module and never share state.
#[derive(Debug, Default)]
pub struct TempIdents {
    next: usize,
}

impl TempIdents {
    /// Creates a factory starting at zero.
    #[must_use]
    pub const fn new() -> Self { Self { next: 0 } }

    /// Mints a fresh temporary identifier (`_t0`, `_t1`, ...).
    pub fn fresh(&mut self) -> Ident {
        let ident = Ident::plain(format!("_t{}", self.next));
        self.next += 1;
        ident
    }

    /// Mints a fresh identifier with the given stem (`stem$0`, `stem$1`, ...).
    pub fn fresh_named(&mut self, stem: &str) -> Ident {
        let ident = Ident::plain(format!("{stem}${}", self.next));
        self.next += 1;
        ident
    }
}
