// -------------------------------------------------------------------------
// SPDX-FileCopyrightText: Copyright © 2025 The Ladon Project
// SPDX-FileName: crates/ladon-codegen/src/stack.rs
// SPDX-FileType: SOURCE
// SPDX-License-Identifier: Apache-2.0
// -------------------------------------------------------------------------
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
// -------------------------------------------------------------------------
//! The explicit evaluation value stack.
//!
//! Every successful expression visit pushes exactly one value; every
//! statement consumes what it needs and leaves the stack empty. The stack is
//! an explicit data structure rather than the host call stack so operand
//! order, argument reversal, and between-statement clearing are directly
//! observable in tests.

use crate::error::{CodeGenError, CodeGenResult};

/// One evaluated operand.
///
/// `repr` is the IR operand text (a register, a global, or a constant),
/// `ty` its IR type. When `needs_deref` is set, `repr` is the *address* of
/// the value and consumers emit a load before using it as a value;
/// assignment targets use the address directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackValue {
    /// The IR operand text
    pub repr: String,
    /// The IR type of the value
    pub ty: String,
    /// True when `repr` is an address that must be loaded before value use
    pub needs_deref: bool,
}

impl StackValue {
    /// Creates an immediate value that needs no dereference.
    #[must_use]
    pub fn direct(repr: impl Into<String>, ty: impl Into<String>) -> Self {
        Self { repr: repr.into(), ty: ty.into(), needs_deref: false }
    }

    /// Creates an address value that consumers must load.
    #[must_use]
    pub fn slot(repr: impl Into<String>, ty: impl Into<String>) -> Self {
        Self { repr: repr.into(), ty: ty.into(), needs_deref: true }
    }
}

/// The evaluation value stack of the code generator.
#[derive(Debug, Default)]
pub struct ValueStack {
    values: Vec<StackValue>,
}

impl ValueStack {
    /// Creates an empty stack.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Pushes one evaluated operand.
    pub fn push(&mut self, value: StackValue) { self.values.push(value); }

    /// Pops the most recent operand.
    ///
    /// ## Errors
    ///
    /// Underflow is an internal invariant violation: it cannot happen on
    /// well-resolved input.
    pub fn pop(&mut self) -> CodeGenResult<StackValue> {
        self.values
            .pop()
            .ok_or_else(|| CodeGenError::internal("value stack underflow during emission"))
    }

    /// Pops `count` operands and returns them in push (source) order.
    ///
    /// Arguments are popped in reverse push order and then reversed, so the
    /// result reads left to right.
    pub fn pop_reversed(&mut self, count: usize) -> CodeGenResult<Vec<StackValue>> {
        let mut values = Vec::with_capacity(count);
        for _ in 0..count {
            values.push(self.pop()?);
        }
        values.reverse();
        Ok(values)
    }

    /// Returns the number of operands currently on the stack.
    #[must_use]
    pub fn depth(&self) -> usize { self.values.len() }

    /// Returns true if the stack holds no operands.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.values.is_empty() }

    /// Discards all operands (used between statements).
    pub fn clear(&mut self) { self.values.clear(); }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pop_reversed_restores_source_order() {
        let mut stack = ValueStack::new();
        stack.push(StackValue::direct("%a", "i64"));
        stack.push(StackValue::direct("%b", "i64"));
        stack.push(StackValue::direct("%c", "i64"));

        let values = stack.pop_reversed(3).unwrap();
        let names: Vec<&str> = values.iter().map(|value| value.repr.as_str()).collect();
        assert_eq!(names, vec!["%a", "%b", "%c"]);
        assert!(stack.is_empty());
    }

    #[test]
    fn underflow_is_an_internal_error() {
        let mut stack = ValueStack::new();
        let error = stack.pop().unwrap_err();
        assert!(matches!(error, CodeGenError::Internal { .. }));
    }
}
