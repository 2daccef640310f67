// -------------------------------------------------------------------------
// SPDX-FileCopyrightText: Copyright © 2025 The Ladon Project
// SPDX-FileName: crates/ladon-codegen/src/expressions.rs
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
//! Expression emission.
//!
//! Expressions emit in evaluation order, left to right; every successful
//! visit pushes exactly one operand onto the evaluation stack (procedure
//! calls in statement position are the single exception and push nothing).

use ladon_ast::decl::{ClassId, FunctionKind, VarId, VarKind};
use ladon_ast::expr::{Callee, Expr, ExprKind, Literal, VarRef};
use ladon_ast::types::Type;
use ladon_source::types::Position;

use crate::classes::vtable_slot_of;
use crate::context::CodeGenerator;
use crate::error::{CodeGenError, CodeGenResult};
use crate::mangle;
use crate::stack::StackValue;
use crate::types::{class_name, map_type, substitute, variation_name};

/// Expression-level emission operations.
pub(crate) trait EmitExpressions {
    /// Emits one expression, pushing its value onto the evaluation stack.
    fn visit_expr(&mut self, expr: &Expr) -> CodeGenResult<()>;

    /// Emits a literal: the unboxed constant, boxed into its core class.
    fn visit_literal(&mut self, literal: &Literal) -> CodeGenResult<()>;

    /// Emits a variable access. With `member_target` set, the accessed
    /// object sits on top of the stack and is consumed.
    fn visit_var(&mut self, var: VarId, member_target: bool, position: Position)
    -> CodeGenResult<()>;

    /// Emits a call. `receiver_ty` carries the static type of the member
    /// target when the call is the right-hand side of a member access.
    fn visit_call(&mut self, expr: &Expr, receiver_ty: Option<&Type>) -> CodeGenResult<()>;
}

impl EmitExpressions for CodeGenerator<'_> {
    fn visit_expr(&mut self, expr: &Expr) -> CodeGenResult<()> {
        match &expr.kind {
            ExprKind::Literal(literal) => self.visit_literal(literal),

            ExprKind::Array(elements) => self.emit_array(elements),

            ExprKind::Var(VarRef::Decl(var)) => self.visit_var(*var, false, expr.position),
            ExprKind::Var(VarRef::Named(ident)) => Err(CodeGenError::unresolved(
                format!("variable '{ident}'"),
                expr.position,
            )),

            ExprKind::Member { target, member } => {
                self.visit_expr(target)?;

                // The member resolves against the target's static type;
                // a concrete variation extends the substitution context.
                let pushed = self.push_variation_of(&target.ty)?;
                let result = match &member.kind {
                    ExprKind::Var(VarRef::Decl(var)) => {
                        self.visit_var(*var, true, member.position)
                    }
                    ExprKind::Var(VarRef::Named(ident)) => Err(CodeGenError::unresolved(
                        format!("member '{ident}'"),
                        member.position,
                    )),
                    ExprKind::Call { .. } => self.visit_call(member, Some(&target.ty)),
                    _ => Err(CodeGenError::internal(
                        "member access must name an attribute or a call",
                    )),
                };
                if pushed {
                    drop(self.variations.pop());
                }
                result
            }

            ExprKind::SelfRef => {
                let receiver = self
                    .self_value
                    .clone()
                    .ok_or_else(|| CodeGenError::internal("'self' outside a method body"))?;
                self.stack.push(receiver);
                Ok(())
            }

            ExprKind::ParentCast(target) => {
                let receiver = self
                    .self_value
                    .clone()
                    .ok_or_else(|| CodeGenError::internal("'parent' outside a method body"))?;
                let (class, name) = self.resolved_class(target, expr.position)?;
                let cast = self.emit_checked_cast(receiver, class, &name)?;
                self.stack.push(cast);
                Ok(())
            }

            ExprKind::Call { .. } => self.visit_call(expr, None),

            ExprKind::Cast { value, target } => {
                self.visit_expr(value)?;
                let value = self.pop_resolved()?;
                let (class, name) = self.resolved_class(target, expr.position)?;
                let cast = self.emit_checked_cast(value, class, &name)?;
                self.stack.push(cast);
                Ok(())
            }

            ExprKind::Is { value, class } => {
                self.visit_expr(value)?;
                let value = self.pop_resolved()?;
                let (class, name) = self.resolved_class(class, expr.position)?;
                let flag = self.emit_identity_test(&value, class, &name)?;
                let boxed = self.emit_box(self.core.boolean, "i1", &flag)?;
                self.stack.push(boxed);
                Ok(())
            }

            ExprKind::If { condition, then_value, else_value } => {
                self.emit_conditional(expr, condition, then_value, else_value)
            }
        }
    }

    fn visit_literal(&mut self, literal: &Literal) -> CodeGenResult<()> {
        let value = match literal {
            Literal::Int(value) => self.emit_box(self.core.int, "i64", &value.to_string())?,
            Literal::Float(value) => {
                self.emit_box(self.core.float, "double", &format!("{value:e}"))?
            }
            Literal::Bool(value) => {
                self.emit_box(self.core.boolean, "i1", if *value { "1" } else { "0" })?
            }
            Literal::Char(value) => {
                self.emit_box(self.core.char, "i8", &(*value as u32).to_string())?
            }
            Literal::Str(text) => {
                let symbol = self.fresh_string();
                let (escaped, len) = mangle::escape_string(text);
                self.output.constant(&format!(
                    "{symbol} = private unnamed_addr constant [{len} x i8] c\"{escaped}\""
                ));
                let pointer = format!(
                    "getelementptr inbounds ([{len} x i8], [{len} x i8]* {symbol}, i32 0, i32 0)"
                );
                self.emit_box(self.core.string, "i8*", &pointer)?
            }
        };
        self.stack.push(value);
        Ok(())
    }

    fn visit_var(
        &mut self,
        var: VarId,
        member_target: bool,
        position: Position,
    ) -> CodeGenResult<()> {
        let decl = self.table.var(var);

        if decl.kind == VarKind::Attribute {
            let owner = decl
                .owner
                .ok_or_else(|| CodeGenError::internal("attribute without owning class"))?;
            let index = decl.attribute_index.ok_or_else(|| {
                CodeGenError::internal(format!(
                    "attribute '{}' has no assigned index",
                    decl.ident
                ))
            })?;

            let object = if member_target {
                let target = self.stack.pop()?;
                self.resolve(target)?
            } else {
                // Generator locals live in the iterator's state object.
                if !self.table.class(owner).is_generator {
                    return Err(CodeGenError::unresolved(
                        format!("attribute '{}' accessed without a target", decl.ident),
                        position,
                    ));
                }
                self.self_value
                    .clone()
                    .ok_or_else(|| CodeGenError::internal("generator state without receiver"))?
            };

            let ty = if self.table.class(owner).is_generator && index == 0 {
                "i8*".to_string()
            } else {
                map_type(self.table, &self.variations, &decl.declared_type)?
            };
            let slot = self.attribute_gep(&object, index)?;
            self.stack.push(StackValue::slot(slot, ty));
            return Ok(());
        }

        let binding = self.locals.get(&var).cloned().ok_or_else(|| {
            CodeGenError::internal(format!("variable '{}' is not bound", decl.ident))
        })?;
        let value = if binding.direct {
            StackValue::direct(binding.repr, binding.ty)
        } else {
            StackValue::slot(binding.repr, binding.ty)
        };
        self.stack.push(value);
        Ok(())
    }

    fn visit_call(&mut self, expr: &Expr, receiver_ty: Option<&Type>) -> CodeGenResult<()> {
        let ExprKind::Call { callee, args, .. } = &expr.kind else {
            return Err(CodeGenError::internal("visit_call on a non-call expression"));
        };
        let Callee::Decl(function) = callee else {
            return Err(CodeGenError::unresolved("call target", expr.position));
        };
        let table = self.table;
        let decl = table.function(*function);
        let owner = decl.owner;

        // A treated-special boxed-class initializer is the identity on its
        // already-boxed argument: push it and emit no call.
        if decl.kind == FunctionKind::Initializer
            && receiver_ty.is_none()
            && args.len() == 1
            && owner.is_some_and(|owner| self.core.is_boxed(owner))
        {
            return self.visit_expr(&args[0]);
        }

        // The creation type of an initializer fixes the variation context.
        let pushed = match decl.kind {
            FunctionKind::Initializer if receiver_ty.is_none() => {
                self.push_variation_of(&expr.ty)?
            }
            _ => false,
        };
        let result = self.emit_call(expr, *function, args, receiver_ty);
        if pushed {
            drop(self.variations.pop());
        }
        result
    }
}

impl CodeGenerator<'_> {
    /// Pushes the variation of a concrete type onto the substitution
    /// context; returns whether a pop is owed.
    fn push_variation_of(&mut self, ty: &Type) -> CodeGenResult<bool> {
        // Tolerate unresolved types here: the access that needs them fails
        // with a precise error instead.
        let Ok(substituted) = substitute(self.table, &self.variations, ty) else {
            return Ok(false);
        };
        if let Type::Variation(_, variation) = substituted {
            self.variations.push(variation);
            return Ok(true);
        }
        Ok(false)
    }

    /// Resolves a type to a concrete class and its mangled name.
    fn resolved_class(
        &mut self,
        ty: &Type,
        position: Position,
    ) -> CodeGenResult<(ClassId, String)> {
        let substituted = substitute(self.table, &self.variations, ty)?;
        match substituted {
            Type::Class(class) => {
                let name = class_name(self.table, &self.variations, class)?;
                Ok((class, name))
            }
            Type::Variation(class, variation) => {
                let name = variation_name(self.table, &self.variations, variation)?;
                Ok((class, name))
            }
            other => Err(CodeGenError::unresolved(
                format!("class reference '{other}'"),
                position,
            )),
        }
    }

    /// Emits the call proper: argument evaluation, receiver handling, fresh
    /// allocation for initializers, and virtual or direct dispatch.
    fn emit_call(
        &mut self,
        expr: &Expr,
        function: ladon_ast::decl::FunctionId,
        args: &[Expr],
        receiver_ty: Option<&Type>,
    ) -> CodeGenResult<()> {
        let table = self.table;
        let decl = table.function(function);

        // Arguments evaluate left to right.
        for arg in args {
            self.visit_expr(arg)?;
        }
        let mut values = Vec::with_capacity(args.len());
        for value in self.stack.pop_reversed(args.len())? {
            values.push(self.resolve(value)?);
        }

        // Coerce each argument to its declared parameter type.
        let mut coerced = Vec::with_capacity(values.len());
        for (value, param) in values.into_iter().zip(&decl.params) {
            let ty = map_type(table, &self.variations, &table.var(*param).declared_type)?;
            coerced.push(self.coerce(value, &ty)?);
        }

        let return_ty = match (&decl.return_type, decl.kind) {
            (_, FunctionKind::Initializer) => "void".to_string(),
            (Some(ty), _) => map_type(table, &self.variations, ty)?,
            (None, _) => "void".to_string(),
        };

        match decl.kind {
            FunctionKind::Method => {
                // The receiver was pushed by the member target.
                if receiver_ty.is_none() {
                    return Err(CodeGenError::internal("method call without a receiver"));
                }
                let receiver = self.stack.pop()?;
                let receiver = self.resolve(receiver)?;
                self.emit_virtual_call(function, &receiver, &coerced, &return_ty)
            }

            FunctionKind::Initializer => {
                let owner = decl
                    .owner
                    .ok_or_else(|| CodeGenError::internal("initializer without owning class"))?;

                let receiver = if receiver_ty.is_some() {
                    // Initializer invoked on an existing instance.
                    let receiver = self.stack.pop()?;
                    self.resolve(receiver)?
                } else {
                    // A fresh allocation; the default initializer runs first
                    // when a non-default one was chosen.
                    let (class, name) = match substitute(table, &self.variations, &expr.ty) {
                        Ok(Type::Class(class)) => {
                            (class, class_name(table, &self.variations, class)?)
                        }
                        Ok(Type::Variation(class, variation)) => {
                            (class, variation_name(table, &self.variations, variation)?)
                        }
                        _ => (owner, class_name(table, &self.variations, owner)?),
                    };
                    let object = self.emit_allocation(class, &name)?;
                    let fresh = StackValue::direct(object, format!("%class.{name}*"));

                    if !decl.is_default_initializer
                        && let Some(default) = table.default_initializer(class)
                    {
                        self.emit_direct_call(default, &fresh, &[], "void")?;
                    }
                    fresh
                };

                self.emit_direct_call(function, &receiver, &coerced, "void")?;
                // Initializers push self.
                self.stack.push(receiver);
                Ok(())
            }

            FunctionKind::Unbound => {
                let symbol =
                    mangle::function_symbol(table, &self.variations, function, &self.module, None)?;
                self.declare_if_native(function, &symbol, None, &coerced, &return_ty)?;

                let rendered = coerced
                    .iter()
                    .map(|value| format!("{} {}", value.ty, value.repr))
                    .collect::<Vec<_>>()
                    .join(", ");

                if return_ty == "void" {
                    self.emit(&format!("call void @{symbol}({rendered})"))?;
                } else {
                    let result = self.fresh_temp()?;
                    self.emit(&format!("{result} = call {return_ty} @{symbol}({rendered})"))?;
                    self.stack.push(StackValue::direct(result, return_ty));
                }
                Ok(())
            }
        }
    }

    /// Dispatches a method through the receiver's descriptor table.
    fn emit_virtual_call(
        &mut self,
        function: ladon_ast::decl::FunctionId,
        receiver: &StackValue,
        args: &[StackValue],
        return_ty: &str,
    ) -> CodeGenResult<()> {
        let owner = self
            .table
            .function(function)
            .owner
            .ok_or_else(|| CodeGenError::internal("method without owning class"))?;
        let slot = vtable_slot_of(self.table, owner, function)
            .ok_or_else(|| CodeGenError::internal("method missing from its dispatch table"))?;
        let table_len = crate::classes::vtable_slots(self.table, owner).len().max(1);

        // Load the function pointer out of the dispatch table.
        let struct_ty = receiver.ty.trim_end_matches('*');
        let descriptor_slot = self.fresh_temp()?;
        self.emit(&format!(
            "{descriptor_slot} = getelementptr inbounds {struct_ty}, {ty} {repr}, i32 0, i32 0",
            ty = receiver.ty,
            repr = receiver.repr
        ))?;
        let descriptor = self.fresh_temp()?;
        self.emit(&format!("{descriptor} = load i8*, i8** {descriptor_slot}"))?;
        let vtable = self.fresh_temp()?;
        self.emit(&format!(
            "{vtable} = bitcast i8* {descriptor} to [{table_len} x i8*]*"
        ))?;
        let entry = self.fresh_temp()?;
        self.emit(&format!(
            "{entry} = getelementptr inbounds [{table_len} x i8*], [{table_len} x i8*]* {vtable}, i32 0, i32 {slot}"
        ))?;
        let untyped = self.fresh_temp()?;
        self.emit(&format!("{untyped} = load i8*, i8** {entry}"))?;

        let mut param_tys = vec![receiver.ty.clone()];
        param_tys.extend(args.iter().map(|value| value.ty.clone()));
        let fn_ty = format!("{return_ty} ({})*", param_tys.join(", "));
        let pointer = self.fresh_temp()?;
        self.emit(&format!("{pointer} = bitcast i8* {untyped} to {fn_ty}"))?;

        let mut rendered = vec![format!("{} {}", receiver.ty, receiver.repr)];
        rendered.extend(args.iter().map(|value| format!("{} {}", value.ty, value.repr)));
        let rendered = rendered.join(", ");

        if return_ty == "void" {
            self.emit(&format!("call void {pointer}({rendered})"))?;
        } else {
            let result = self.fresh_temp()?;
            self.emit(&format!("{result} = call {return_ty} {pointer}({rendered})"))?;
            self.stack.push(StackValue::direct(result, return_ty.to_string()));
        }
        Ok(())
    }

    /// Calls an initializer directly by mangled name on the given receiver.
    fn emit_direct_call(
        &mut self,
        function: ladon_ast::decl::FunctionId,
        receiver: &StackValue,
        args: &[StackValue],
        return_ty: &str,
    ) -> CodeGenResult<()> {
        let owner_name = receiver.ty.trim_end_matches('*').trim_start_matches("%class.");
        let symbol = mangle::function_symbol(
            self.table,
            &self.variations,
            function,
            &self.module,
            Some(owner_name),
        )?;
        self.declare_if_native(function, &symbol, Some(receiver), args, return_ty)?;

        let mut rendered = vec![format!("{} {}", receiver.ty, receiver.repr)];
        rendered.extend(args.iter().map(|value| format!("{} {}", value.ty, value.repr)));
        self.emit(&format!("call {return_ty} @{symbol}({})", rendered.join(", ")))
    }

    /// Declares a native callee on first use; external calls use the
    /// mangled name verbatim.
    fn declare_if_native(
        &mut self,
        function: ladon_ast::decl::FunctionId,
        symbol: &str,
        receiver: Option<&StackValue>,
        args: &[StackValue],
        return_ty: &str,
    ) -> CodeGenResult<()> {
        if !self.table.function(function).is_native {
            return Ok(());
        }
        if !self.declared_externals.insert(symbol.to_string()) {
            return Ok(());
        }

        let mut param_tys = Vec::with_capacity(args.len() + 1);
        if let Some(receiver) = receiver {
            param_tys.push(receiver.ty.clone());
        }
        param_tys.extend(args.iter().map(|value| value.ty.clone()));
        self.output
            .declaration(&format!("declare {return_ty} @{symbol}({})", param_tys.join(", ")));
        Ok(())
    }

    /// Emits an array literal: elements popped back into source order, an
    /// aggregate allocation, and the boxed array value.
    fn emit_array(&mut self, elements: &[Expr]) -> CodeGenResult<()> {
        for element in elements {
            self.visit_expr(element)?;
        }
        let mut values = Vec::with_capacity(elements.len());
        for value in self.stack.pop_reversed(elements.len())? {
            values.push(self.resolve(value)?);
        }

        let length = values.len();
        let raw = self.fresh_temp()?;
        self.emit(&format!(
            "{raw} = call i8* @ladon_alloc(i64 {})",
            16 + 8 * length as u64
        ))?;
        let array = self.fresh_temp()?;
        self.emit(&format!("{array} = bitcast i8* {raw} to %class.Array*"))?;

        let descriptor_slot = self.fresh_temp()?;
        self.emit(&format!(
            "{descriptor_slot} = getelementptr inbounds %class.Array, %class.Array* {array}, i32 0, i32 0"
        ))?;
        let descriptor = self.descriptor_text(self.core.array, "Array");
        self.emit(&format!("store i8* {descriptor}, i8** {descriptor_slot}"))?;

        let length_slot = self.fresh_temp()?;
        self.emit(&format!(
            "{length_slot} = getelementptr inbounds %class.Array, %class.Array* {array}, i32 0, i32 1"
        ))?;
        self.emit(&format!("store i64 {length}, i64* {length_slot}"))?;

        for (index, value) in values.into_iter().enumerate() {
            let element = self.coerce(value, "i8*")?;
            let slot = self.fresh_temp()?;
            self.emit(&format!(
                "{slot} = getelementptr inbounds %class.Array, %class.Array* {array}, i32 0, i32 2, i64 {index}"
            ))?;
            self.emit(&format!("store i8* {}, i8** {slot}", element.repr))?;
        }

        self.stack.push(StackValue::direct(array, "%class.Array*"));
        Ok(())
    }

    /// Emits a conditional expression: both arms join through a phi of the
    /// common type.
    fn emit_conditional(
        &mut self,
        expr: &Expr,
        condition: &Expr,
        then_value: &Expr,
        else_value: &Expr,
    ) -> CodeGenResult<()> {
        let prefix = self.fresh_prefix("cond")?;
        let result_ty = map_type(self.table, &self.variations, &expr.ty)?;

        self.visit_expr(condition)?;
        let condition = self.stack.pop()?;
        let flag = self.condition_flag(condition)?;
        self.terminate(&format!(
            "br i1 {flag}, label %{prefix}.true, label %{prefix}.false"
        ))?;

        self.place_label(&format!("{prefix}.true"))?;
        self.visit_expr(then_value)?;
        let value = self.pop_resolved()?;
        let value = self.coerce(value, &result_ty)?;
        let then_edge = (value.repr, self.frame()?.current_label.clone());
        self.terminate(&format!("br label %{prefix}.end"))?;

        self.place_label(&format!("{prefix}.false"))?;
        self.visit_expr(else_value)?;
        let value = self.pop_resolved()?;
        let value = self.coerce(value, &result_ty)?;
        let else_edge = (value.repr, self.frame()?.current_label.clone());
        self.terminate(&format!("br label %{prefix}.end"))?;

        self.place_label(&format!("{prefix}.end"))?;
        let result = self.fresh_temp()?;
        self.emit(&format!(
            "{result} = phi {result_ty} [ {}, %{} ], [ {}, %{} ]",
            then_edge.0, then_edge.1, else_edge.0, else_edge.1
        ))?;
        self.stack.push(StackValue::direct(result, result_ty));
        Ok(())
    }
}
