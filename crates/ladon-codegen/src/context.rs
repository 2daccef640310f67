// -------------------------------------------------------------------------
// SPDX-FileCopyrightText: Copyright © 2025 The Ladon Project
// SPDX-FileName: crates/ladon-codegen/src/context.rs
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
//! Emission state: frames, scopes, labels, and value resolution.

use std::fmt::Write as _;

use ladon_ast::core::CoreClasses;
use ladon_ast::decl::{ClassId, DeclTable, VarId, VariationId};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::{CodeGenError, CodeGenResult};
use crate::output::IrOutput;
use crate::stack::{StackValue, ValueStack};

/// Per-function emission context.
///
/// The prelude buffer collects parameter and local allocas; the body buffer
/// collects instructions. A terminating instruction follows every basic
/// block; `terminated` tracks whether the current block already ended.
#[derive(Debug)]
pub struct FunctionFrame {
    /// The mangled symbol of the function being emitted
    pub symbol: String,
    /// Alloca instructions, placed ahead of the body
    pub prelude: String,
    /// The instruction stream of the body
    pub body: String,
    /// Next temporary register ordinal
    next_temp: u32,
    /// Next label-prefix ordinal
    next_label: u32,
    /// The label of the block currently receiving instructions
    pub current_label: String,
    /// Whether the current block already ended in a terminator
    pub terminated: bool,
    /// Label prefixes of the enclosing loops, innermost last
    pub loop_labels: Vec<String>,
    /// The IR return type of the function being emitted
    pub return_ty: String,
}

impl FunctionFrame {
    /// Creates a fresh frame for the given symbol.
    #[must_use]
    pub fn new(symbol: String) -> Self {
        Self {
            symbol,
            prelude: String::new(),
            body: String::new(),
            next_temp: 0,
            next_label: 0,
            current_label: "entry".to_string(),
            terminated: false,
            loop_labels: Vec::new(),
            return_ty: "void".to_string(),
        }
    }
}

/// A local binding known to the current emission scope.
#[derive(Debug, Clone)]
pub(crate) struct LocalBinding {
    /// IR operand text: an alloca slot, a global, or a parameter register
    pub repr: String,
    /// IR type of the bound value
    pub ty: String,
    /// True for parameters, which are already dereferenced
    pub direct: bool,
}

/// The code generator: owns the output document and all emission state.
///
/// Frames nest with function emission; identifier scopes align with frames
/// and with lexical blocks, and an open/close imbalance is an internal
/// invariant violation surfaced by [`CodeGenerator::finish`].
pub struct CodeGenerator<'a> {
    /// The declaration arena of the compilation
    pub(crate) table: &'a DeclTable,
    /// The core-class registry
    pub(crate) core: &'a CoreClasses,
    /// The partitioned output document
    pub(crate) output: IrOutput,
    /// Nested per-function emission contexts
    pub(crate) frames: Vec<FunctionFrame>,
    /// The evaluation value stack
    pub(crate) stack: ValueStack,
    /// Known local, parameter, and global bindings
    pub(crate) locals: FxHashMap<VarId, LocalBinding>,
    /// Scope-aligned undo log for `locals`
    scope_vars: Vec<Vec<VarId>>,
    /// Balance counter for open/close scope checking
    open_scopes: i64,
    /// The current generic-variation context, innermost last
    pub(crate) variations: Vec<VariationId>,
    /// The class whose members are being emitted, if any
    pub(crate) current_class: Option<ClassId>,
    /// The module whose declarations are being emitted
    pub(crate) module: String,
    /// Whether the current module is native (declarations only)
    pub(crate) native_module: bool,
    /// The receiver of the function currently being emitted
    pub(crate) self_value: Option<StackValue>,
    /// Class layouts already written to the output
    pub(crate) emitted_classes: FxHashSet<String>,
    /// External function symbols already declared
    pub(crate) declared_externals: FxHashSet<String>,
    /// Ordinal for string constants
    next_string: u32,
}

impl<'a> CodeGenerator<'a> {
    /// Creates a generator over a resolved declaration table.
    #[must_use]
    pub fn new(table: &'a DeclTable, core: &'a CoreClasses) -> Self {
        let mut generator = Self {
            table,
            core,
            output: IrOutput::new(),
            frames: Vec::new(),
            stack: ValueStack::new(),
            locals: FxHashMap::default(),
            scope_vars: Vec::new(),
            open_scopes: 0,
            variations: Vec::new(),
            current_class: None,
            module: String::new(),
            native_module: false,
            self_value: None,
            emitted_classes: FxHashSet::default(),
            declared_externals: FxHashSet::default(),
            next_string: 0,
        };
        generator.declare_runtime();
        generator
            .emit_core_classes()
            .expect("core class layouts emit from resolved variations");
        generator
    }

    /// Finishes emission and assembles the output document.
    ///
    /// ## Errors
    ///
    /// Returns an internal invariant violation when emission scopes or
    /// frames were left open, or when values remain on the stack.
    pub fn finish(self) -> CodeGenResult<String> {
        if self.open_scopes != 0 {
            return Err(CodeGenError::internal(format!(
                "imbalanced emission scopes: {} left open",
                self.open_scopes
            )));
        }
        if !self.frames.is_empty() {
            return Err(CodeGenError::internal("function frame left open"));
        }
        if !self.stack.is_empty() {
            return Err(CodeGenError::internal("value stack not empty at end of emission"));
        }
        Ok(self.output.assemble())
    }

    /// Declares the runtime entry points every program links against.
    fn declare_runtime(&mut self) {
        self.output.declaration("declare i8* @ladon_alloc(i64)");
        self.output.declaration("declare i1 @ladon_instance_of(i8*, i8*)");
        self.output.declaration("declare void @ladon_cast_failed()");
        self.output.declaration("declare void @ladon_raise(i8*)");
    }

    // ------------------------------------------------------------------
    // Frames
    // ------------------------------------------------------------------

    /// Opens a function emission context and its identifier scope.
    pub(crate) fn open_frame(&mut self, symbol: String) {
        self.frames.push(FunctionFrame::new(symbol));
        self.open_scope();
    }

    /// Closes the top frame and appends the assembled function body to the
    /// output document.
    pub(crate) fn close_frame(
        &mut self,
        return_ty: &str,
        params: &str,
    ) -> CodeGenResult<()> {
        self.close_scope();
        let frame = self
            .frames
            .pop()
            .ok_or_else(|| CodeGenError::internal("close of missing function frame"))?;

        let mut text = String::new();
        writeln!(text, "define {return_ty} @{}({params}) {{", frame.symbol)
            .expect("write function header");
        text.push_str(&frame.prelude);
        text.push_str(&frame.body);
        text.push_str("}\n\n");
        self.output.bodies.push_str(&text);
        Ok(())
    }

    /// Returns the active function frame.
    pub(crate) fn frame(&mut self) -> CodeGenResult<&mut FunctionFrame> {
        self.frames
            .last_mut()
            .ok_or_else(|| CodeGenError::internal("emission outside a function frame"))
    }

    // ------------------------------------------------------------------
    // Scopes
    // ------------------------------------------------------------------

    /// Opens an identifier scope.
    pub(crate) fn open_scope(&mut self) {
        self.open_scopes += 1;
        self.scope_vars.push(Vec::new());
    }

    /// Closes the innermost identifier scope, forgetting its bindings.
    pub(crate) fn close_scope(&mut self) {
        self.open_scopes -= 1;
        if let Some(vars) = self.scope_vars.pop() {
            for var in vars {
                drop(self.locals.remove(&var));
            }
        }
    }

    /// Registers a binding in the innermost scope.
    pub(crate) fn bind_local(&mut self, var: VarId, binding: LocalBinding) {
        if let Some(scope) = self.scope_vars.last_mut() {
            scope.push(var);
        }
        drop(self.locals.insert(var, binding));
    }

    // ------------------------------------------------------------------
    // Registers, labels, and instructions
    // ------------------------------------------------------------------

    /// Mints a fresh temporary register.
    pub(crate) fn fresh_temp(&mut self) -> CodeGenResult<String> {
        let frame = self.frame()?;
        let temp = format!("%t{}", frame.next_temp);
        frame.next_temp += 1;
        Ok(temp)
    }

    /// Mints a fresh label prefix with the given stem (`while3`, `cond7`).
    pub(crate) fn fresh_prefix(&mut self, stem: &str) -> CodeGenResult<String> {
        let frame = self.frame()?;
        let prefix = format!("{stem}{}", frame.next_label);
        frame.next_label += 1;
        Ok(prefix)
    }

    /// Appends one instruction line to the body of the current block.
    pub(crate) fn emit(&mut self, line: &str) -> CodeGenResult<()> {
        let frame = self.frame()?;
        writeln!(frame.body, "  {line}").expect("write to body buffer");
        Ok(())
    }

    /// Appends one alloca line to the function prelude.
    pub(crate) fn emit_prelude(&mut self, line: &str) -> CodeGenResult<()> {
        let frame = self.frame()?;
        writeln!(frame.prelude, "  {line}").expect("write to prelude buffer");
        Ok(())
    }

    /// Appends a terminating instruction and closes the current block.
    pub(crate) fn terminate(&mut self, line: &str) -> CodeGenResult<()> {
        self.emit(line)?;
        self.frame()?.terminated = true;
        Ok(())
    }

    /// Places a label, closing the previous block with a fallthrough branch
    /// when it has no terminator yet.
    pub(crate) fn place_label(&mut self, label: &str) -> CodeGenResult<()> {
        if !self.frame()?.terminated {
            self.terminate(&format!("br label %{label}"))?;
        }
        let frame = self.frame()?;
        writeln!(frame.body, "{label}:").expect("write label");
        frame.current_label = label.to_string();
        frame.terminated = false;
        Ok(())
    }

    /// Ensures the current block can receive instructions, opening a fresh
    /// unreachable block after a terminator when necessary.
    pub(crate) fn ensure_block(&mut self) -> CodeGenResult<()> {
        if self.frame()?.terminated {
            let label = self.fresh_prefix("dead")?;
            let frame = self.frame()?;
            writeln!(frame.body, "{label}:").expect("write label");
            frame.current_label = label;
            frame.terminated = false;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Value resolution
    // ------------------------------------------------------------------

    /// Resolves a stack value to an immediate operand, loading through the
    /// address when the value still needs a dereference.
    pub(crate) fn resolve(&mut self, value: StackValue) -> CodeGenResult<StackValue> {
        if !value.needs_deref {
            return Ok(value);
        }
        let temp = self.fresh_temp()?;
        self.emit(&format!("{temp} = load {ty}, {ty}* {addr}", ty = value.ty, addr = value.repr))?;
        Ok(StackValue::direct(temp, value.ty))
    }

    /// Pops and resolves the top of the evaluation stack.
    pub(crate) fn pop_resolved(&mut self) -> CodeGenResult<StackValue> {
        let value = self.stack.pop()?;
        self.resolve(value)
    }

    /// Mints a fresh string-constant symbol.
    pub(crate) fn fresh_string(&mut self) -> String {
        let symbol = format!("@.str.{}", self.next_string);
        self.next_string += 1;
        symbol
    }
}
