// -------------------------------------------------------------------------
// SPDX-FileCopyrightText: Copyright © 2025 The Ladon Project
// SPDX-FileName: crates/ladon-codegen/src/statements.rs
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
//! Statement emission.
//!
//! Statements emit in source order; each consumes what it needs from the
//! evaluation stack and leaves it empty. Blocks open an identifier scope,
//! bind their local declarations as entry allocas, and emit their nested
//! function and class declarations before their statements.

use ladon_ast::decl::{Block, Declaration};
use ladon_ast::stmt::Stmt;

use crate::context::{CodeGenerator, LocalBinding};
use crate::error::{CodeGenError, CodeGenResult};
use crate::expressions::EmitExpressions;
use crate::functions::EmitFunctions;
use crate::types::map_type;
use crate::visitor::EmitDeclarations;

/// Statement-level emission operations.
pub(crate) trait EmitStatements {
    /// Emits a lexical block: declarations, then statements.
    fn visit_block(&mut self, block: &Block) -> CodeGenResult<()>;

    /// Emits one statement; the value stack is empty on return.
    fn visit_stmt(&mut self, stmt: &Stmt) -> CodeGenResult<()>;
}

impl EmitStatements for CodeGenerator<'_> {
    fn visit_block(&mut self, block: &Block) -> CodeGenResult<()> {
        self.open_scope();

        for decl in &block.decls {
            match decl {
                Declaration::Var(var) => {
                    let decl = self.table.var(*var);
                    let ty = map_type(self.table, &self.variations, &decl.declared_type)?;
                    let slot = format!("%{}.{}", decl.ident.name, var.index());
                    self.emit_prelude(&format!("{slot} = alloca {ty}"))?;
                    self.bind_local(*var, LocalBinding { repr: slot, ty, direct: false });
                }
                Declaration::Function(function) => self.visit_function(*function)?,
                Declaration::Class(class) => self.visit_class(*class)?,
            }
        }

        for stmt in &block.stmts {
            self.ensure_block()?;
            self.visit_stmt(stmt)?;
            if !self.stack.is_empty() {
                self.close_scope();
                return Err(CodeGenError::internal(
                    "value stack not empty after statement emission",
                ));
            }
        }

        self.close_scope();
        Ok(())
    }

    fn visit_stmt(&mut self, stmt: &Stmt) -> CodeGenResult<()> {
        match stmt {
            // Right first, then left; the right-hand value must not observe
            // mutations performed by the target evaluation.
            Stmt::Assign { target, value } => {
                self.visit_expr(value)?;
                self.visit_expr(target)?;

                let place = self.stack.pop()?;
                let value = self.stack.pop()?;
                if !place.needs_deref {
                    return Err(CodeGenError::internal(
                        "assignment target did not evaluate to an address",
                    ));
                }

                let value = self.resolve(value)?;
                let value = self.coerce(value, &place.ty)?;
                self.emit(&format!(
                    "store {ty} {repr}, {ty}* {place}",
                    ty = place.ty,
                    repr = value.repr,
                    place = place.repr
                ))
            }

            Stmt::Unpack { temp, targets, value } => {
                self.visit_expr(value)?;
                let value = self.pop_resolved()?;

                let binding = self
                    .locals
                    .get(temp)
                    .cloned()
                    .ok_or_else(|| CodeGenError::internal("unpack temporary is unbound"))?;
                let value = self.coerce(value, &binding.ty)?;
                self.emit(&format!(
                    "store {ty} {repr}, {ty}* {slot}",
                    ty = binding.ty,
                    repr = value.repr,
                    slot = binding.repr
                ))?;

                // Each target receives one tuple element, in source order.
                let tuple = self.fresh_temp()?;
                self.emit(&format!(
                    "{tuple} = load {ty}, {ty}* {slot}",
                    ty = binding.ty,
                    slot = binding.repr
                ))?;
                let struct_ty = binding.ty.trim_end_matches('*').to_string();

                for (index, target) in targets.iter().enumerate() {
                    self.visit_expr(target)?;
                    let place = self.stack.pop()?;
                    if !place.needs_deref {
                        return Err(CodeGenError::internal(
                            "unpack target did not evaluate to an address",
                        ));
                    }

                    let slot = self.fresh_temp()?;
                    self.emit(&format!(
                        "{slot} = getelementptr inbounds {struct_ty}, {ty} {tuple}, i32 0, i32 {field}",
                        ty = binding.ty,
                        field = index + 1
                    ))?;
                    let element = self.fresh_temp()?;
                    self.emit(&format!(
                        "{element} = load {ty}, {ty}* {slot}",
                        ty = place.ty
                    ))?;
                    self.emit(&format!(
                        "store {ty} {element}, {ty}* {place}",
                        ty = place.ty,
                        place = place.repr
                    ))?;
                }
                Ok(())
            }

            Stmt::If { condition, then_block, else_block } => {
                let prefix = self.fresh_prefix("if")?;

                self.visit_expr(condition)?;
                let condition = self.stack.pop()?;
                let flag = self.condition_flag(condition)?;
                self.terminate(&format!(
                    "br i1 {flag}, label %{prefix}.then, label %{prefix}.else"
                ))?;

                self.place_label(&format!("{prefix}.then"))?;
                self.visit_block(then_block)?;
                if !self.frame()?.terminated {
                    self.terminate(&format!("br label %{prefix}.end"))?;
                }

                self.place_label(&format!("{prefix}.else"))?;
                self.visit_block(else_block)?;
                self.place_label(&format!("{prefix}.end"))
            }

            Stmt::While { condition, body } => {
                let prefix = self.fresh_prefix("while")?;

                self.place_label(&format!("{prefix}.condition"))?;
                self.visit_expr(condition)?;
                let condition = self.stack.pop()?;
                let flag = self.condition_flag(condition)?;
                self.terminate(&format!(
                    "br i1 {flag}, label %{prefix}.block, label %{prefix}.end"
                ))?;

                self.place_label(&format!("{prefix}.block"))?;
                self.frame()?.loop_labels.push(prefix.clone());
                self.visit_block(body)?;
                drop(self.frame()?.loop_labels.pop());
                if !self.frame()?.terminated {
                    self.terminate(&format!("br label %{prefix}.condition"))?;
                }

                self.place_label(&format!("{prefix}.end"))
            }

            Stmt::Break { .. } => {
                let prefix = self
                    .frame()?
                    .loop_labels
                    .last()
                    .cloned()
                    .ok_or_else(|| CodeGenError::internal("break outside a loop at emission"))?;
                self.terminate(&format!("br label %{prefix}.end"))
            }

            Stmt::Skip { .. } => {
                let prefix = self
                    .frame()?
                    .loop_labels
                    .last()
                    .cloned()
                    .ok_or_else(|| CodeGenError::internal("skip outside a loop at emission"))?;
                self.terminate(&format!("br label %{prefix}.condition"))
            }

            Stmt::Return { value, .. } => {
                match value {
                    Some(value) => {
                        self.visit_expr(value)?;
                        let value = self.pop_resolved()?;
                        let return_ty = self.frame()?.return_ty.clone();
                        let value = self.coerce(value, &return_ty)?;
                        self.terminate(&format!("ret {return_ty} {}", value.repr))
                    }
                    None => self.terminate("ret void"),
                }
            }

            // A yield stores its resume address, returns the wrapped value,
            // and declares the label execution resumes at.
            Stmt::Yield { value, index, .. } => {
                let receiver = self
                    .self_value
                    .clone()
                    .ok_or_else(|| CodeGenError::internal("yield outside a generator body"))?;
                let symbol = self.frame()?.symbol.clone();

                let slot = self.attribute_gep(&receiver, 0)?;
                self.emit(&format!(
                    "store i8* blockaddress(@{symbol}, %yield{index}), i8** {slot}"
                ))?;

                self.visit_expr(value)?;
                let value = self.pop_resolved()?;
                let return_ty = self.frame()?.return_ty.clone();
                let value = self.coerce(value, &return_ty)?;
                self.terminate(&format!("ret {return_ty} {}", value.repr))?;

                self.place_label(&format!("yield{index}"))
            }

            Stmt::Raise { value, .. } => {
                self.visit_expr(value)?;
                let value = self.pop_resolved()?;
                let value = self.coerce(value, "i8*")?;
                self.emit(&format!("call void @ladon_raise(i8* {})", value.repr))?;
                self.terminate("unreachable")
            }

            // The target has no unwinder: the guarded block runs to
            // completion and the handlers sit behind the end label for the
            // runtime to enter.
            Stmt::Try { body, handlers } => {
                let prefix = self.fresh_prefix("try")?;

                self.visit_block(body)?;
                if !self.frame()?.terminated {
                    self.terminate(&format!("br label %{prefix}.end"))?;
                }

                for (index, handler) in handlers.iter().enumerate() {
                    self.place_label(&format!("{prefix}.handler{index}"))?;
                    self.visit_block(&handler.block)?;
                    if !self.frame()?.terminated {
                        self.terminate(&format!("br label %{prefix}.end"))?;
                    }
                }

                self.place_label(&format!("{prefix}.end"))
            }

            // A call in statement position discards its produced value.
            Stmt::Call(expr) => {
                self.visit_expr(expr)?;
                self.stack.clear();
                Ok(())
            }
        }
    }
}
