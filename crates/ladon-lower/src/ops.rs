//! The canonical operator-to-method name mapping.
//!
//! Operator expressions lower to method calls on their left operand; the
//! `in` operator is inverted and becomes a `_contains_` call on its right
//! operand. These names are part of the language: user classes overload
//! operators by declaring methods with these names.

use ladon_syntax::ops::{BinaryOp, UnaryOp};

/// Returns the canonical method name of a binary operator.
#[must_use]
pub const fn binary_method(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "_add_",
        BinaryOp::Sub => "_sub_",
        BinaryOp::Mul => "_mul_",
        BinaryOp::Div => "_div_",
        BinaryOp::Mod => "_mod_",
        BinaryOp::Pow => "_pow_",
        BinaryOp::Eq => "_eq_",
        BinaryOp::NotEq => "_neq_",
        BinaryOp::Lt => "_lt_",
        BinaryOp::Gt => "_gt_",
        BinaryOp::LtEq => "_leq_",
        BinaryOp::GtEq => "_geq_",
        BinaryOp::In => "_contains_",
        BinaryOp::And => "_and_",
        BinaryOp::Or => "_or_",
        BinaryOp::Xor => "_xor_",
    }
}

/// Returns the canonical method name of a unary operator.
#[must_use]
pub const fn unary_method(op: UnaryOp) -> &'static str {
    match op {
        UnaryOp::Neg => "_neg_",
        UnaryOp::Not => "_not_",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic_operators_map_to_underscore_names() {
        assert_eq!(binary_method(BinaryOp::Add), "_add_");
        assert_eq!(binary_method(BinaryOp::Pow), "_pow_");
        assert_eq!(binary_method(BinaryOp::In), "_contains_");
        assert_eq!(unary_method(UnaryOp::Neg), "_neg_");
        assert_eq!(unary_method(UnaryOp::Not), "_not_");
    }
}
