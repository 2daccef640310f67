// -------------------------------------------------------------------------
// SPDX-FileCopyrightText: Copyright © 2025 The Ladon Project
// SPDX-FileName: crates/ladon-codegen/src/classes.rs
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
//! Class layout, dispatch tables, allocation, boxing, and casts.
//!
//! Every object is a pointer to a struct whose field 0 is the descriptor
//! (vtable) pointer; attributes occupy the following fields in attribute
//! index order. Boxed primitives carry their unboxed payload at field 1.
//! Generator iterators carry the indirect-branch resume target at field 1
//! (attribute index 0).

use ladon_ast::decl::{ClassId, DeclTable, FunctionId, FunctionKind, VarId};

use crate::context::CodeGenerator;
use crate::error::CodeGenResult;
use crate::mangle;
use crate::stack::StackValue;
use crate::types::{class_name, map_type, payload_type};

/// Collects the attributes of a class in slot order: inherited first, then
/// the class's own declarations.
pub(crate) fn all_attributes(table: &DeclTable, class: ClassId) -> Vec<VarId> {
    let decl = table.class(class);
    let mut attributes = Vec::new();
    for base in &decl.resolved_supers {
        attributes.extend(all_attributes(table, *base));
    }
    attributes.extend(decl.block.vars());
    attributes
}

/// Computes the dispatch-table layout of a class: inherited slots first (in
/// superclass declaration order), overridden slots replaced in place, new
/// methods appended. Initializers never occupy vtable slots.
pub(crate) fn vtable_slots(table: &DeclTable, class: ClassId) -> Vec<FunctionId> {
    let decl = table.class(class);
    let mut slots: Vec<FunctionId> = Vec::new();

    for base in &decl.resolved_supers {
        slots.extend(vtable_slots(table, *base));
    }

    for function in decl.block.functions() {
        if table.function(function).kind != FunctionKind::Method {
            continue;
        }
        match slots.iter().position(|slot| same_signature(table, *slot, function)) {
            Some(index) => slots[index] = function,
            None => slots.push(function),
        }
    }

    slots
}

/// Finds the slot of a method within a class's dispatch table.
pub(crate) fn vtable_slot_of(
    table: &DeclTable,
    class: ClassId,
    function: FunctionId,
) -> Option<usize> {
    vtable_slots(table, class).iter().position(|slot| same_signature(table, *slot, function))
}

fn same_signature(table: &DeclTable, a: FunctionId, b: FunctionId) -> bool {
    let (left, right) = (table.function(a), table.function(b));
    left.ident.name == right.ident.name
        && left.params.len() == right.params.len()
        && left
            .params
            .iter()
            .zip(&right.params)
            .all(|(l, r)| table.var(*l).declared_type == table.var(*r).declared_type)
}

impl CodeGenerator<'_> {
    /// Renders the IR function-pointer type of a declaration, with the
    /// receiver prepended for methods and initializers.
    pub(crate) fn fn_type_text(
        &self,
        function: FunctionId,
        owner_name: Option<&str>,
    ) -> CodeGenResult<String> {
        let decl = self.table.function(function);

        let return_ty = match (&decl.return_type, decl.kind) {
            (_, FunctionKind::Initializer) => "void".to_string(),
            (Some(ty), _) => map_type(self.table, &self.variations, ty)?,
            (None, _) => "void".to_string(),
        };

        let mut params = Vec::with_capacity(decl.params.len() + 1);
        if let Some(owner) = decl.owner {
            let name = match owner_name {
                Some(name) => name.to_string(),
                None => class_name(self.table, &self.variations, owner)?,
            };
            params.push(format!("%class.{name}*"));
        }
        for param in &decl.params {
            params.push(map_type(self.table, &self.variations, &self.table.var(*param).declared_type)?);
        }

        Ok(format!("{return_ty} ({})*", params.join(", ")))
    }

    /// Emits the struct layout and dispatch table of a class under the
    /// given (possibly variation-mangled) name.
    pub(crate) fn emit_class_definition(
        &mut self,
        class: ClassId,
        name: &str,
    ) -> CodeGenResult<()> {
        if !self.emitted_classes.insert(name.to_string()) {
            return Ok(());
        }

        let line = format!("%class.{name} = type {{ {} }}", self.layout_fields(class)?.join(", "));
        self.output.declaration(&line);

        let slots = vtable_slots(self.table, class);
        let mut entries = Vec::with_capacity(slots.len().max(1));
        for slot in &slots {
            let symbol =
                mangle::function_symbol(self.table, &self.variations, *slot, &self.module, None)?;
            let fn_ty = self.fn_type_text(*slot, None)?;
            entries.push(format!("i8* bitcast ({fn_ty} @{symbol} to i8*)"));
        }
        if entries.is_empty() {
            entries.push("i8* null".to_string());
        }

        let line = format!(
            "@vtable.{name} = internal constant [{} x i8*] [{}]",
            entries.len(),
            entries.join(", ")
        );
        self.output.constant(&line);
        Ok(())
    }

    /// Emits the struct layout of a native (runtime-provided) class and an
    /// external reference to its dispatch table.
    pub(crate) fn emit_native_class(&mut self, class: ClassId, name: &str) -> CodeGenResult<()> {
        if !self.emitted_classes.insert(name.to_string()) {
            return Ok(());
        }

        let line = format!("%class.{name} = type {{ {} }}", self.layout_fields(class)?.join(", "));
        self.output.declaration(&line);

        let slots = vtable_slots(self.table, class).len().max(1);
        self.output.declaration(&format!("@vtable.{name} = external global [{slots} x i8*]"));
        Ok(())
    }

    /// Computes the struct fields of a class: the descriptor pointer, then
    /// the payload (boxed primitives) or the attributes in slot order.
    fn layout_fields(&self, class: ClassId) -> CodeGenResult<Vec<String>> {
        let mut fields = vec!["i8*".to_string()];

        if let Some(payload) = payload_type(self.core, class) {
            fields.push(payload.to_string());
            return Ok(fields);
        }
        if class == self.core.array {
            fields.push("i64".to_string());
            fields.push("[0 x i8*]".to_string());
            return Ok(fields);
        }

        let decl = self.table.class(class);
        for (index, attribute) in all_attributes(self.table, class).into_iter().enumerate() {
            if decl.is_generator && index == 0 {
                // The resume target is a raw code address.
                fields.push("i8*".to_string());
                continue;
            }
            let ty = &self.table.var(attribute).declared_type;
            fields.push(map_type(self.table, &self.variations, ty)?);
        }
        Ok(fields)
    }

    /// Renders the descriptor constant of a class: its dispatch table cast
    /// to an untyped pointer.
    pub(crate) fn descriptor_text(&self, class: ClassId, name: &str) -> String {
        let slots = vtable_slots(self.table, class).len().max(1);
        format!("bitcast ([{slots} x i8*]* @vtable.{name} to i8*)")
    }

    /// Byte size of an instance; fields are pointer-sized slots.
    pub(crate) fn object_size(&self, class: ClassId) -> u64 {
        if payload_type(self.core, class).is_some() {
            return 16;
        }
        8 * (1 + all_attributes(self.table, class).len() as u64)
    }

    /// Allocates a fresh instance and stores its descriptor; returns the
    /// typed object register.
    pub(crate) fn emit_allocation(&mut self, class: ClassId, name: &str) -> CodeGenResult<String> {
        let raw = self.fresh_temp()?;
        self.emit(&format!("{raw} = call i8* @ladon_alloc(i64 {})", self.object_size(class)))?;

        let object = self.fresh_temp()?;
        self.emit(&format!("{object} = bitcast i8* {raw} to %class.{name}*"))?;

        let slot = self.fresh_temp()?;
        self.emit(&format!(
            "{slot} = getelementptr inbounds %class.{name}, %class.{name}* {object}, i32 0, i32 0"
        ))?;
        let descriptor = self.descriptor_text(class, name);
        self.emit(&format!("store i8* {descriptor}, i8** {slot}"))?;

        Ok(object)
    }

    /// Boxes an unboxed payload into a fresh instance of a core class.
    pub(crate) fn emit_box(
        &mut self,
        class: ClassId,
        payload_ty: &str,
        payload: &str,
    ) -> CodeGenResult<StackValue> {
        let name = class_name(self.table, &self.variations, class)?;
        let object = self.emit_allocation(class, &name)?;

        let slot = self.fresh_temp()?;
        self.emit(&format!(
            "{slot} = getelementptr inbounds %class.{name}, %class.{name}* {object}, i32 0, i32 1"
        ))?;
        self.emit(&format!("store {payload_ty} {payload}, {payload_ty}* {slot}"))?;

        Ok(StackValue::direct(object, format!("%class.{name}*")))
    }

    /// Loads the unboxed payload out of a boxed core-class value.
    pub(crate) fn emit_unbox(
        &mut self,
        value: &StackValue,
        payload_ty: &str,
    ) -> CodeGenResult<String> {
        let struct_ty = value.ty.trim_end_matches('*');
        let slot = self.fresh_temp()?;
        self.emit(&format!(
            "{slot} = getelementptr inbounds {struct_ty}, {struct_ty}* {repr}, i32 0, i32 1",
            repr = value.repr
        ))?;
        let payload = self.fresh_temp()?;
        self.emit(&format!("{payload} = load {payload_ty}, {payload_ty}* {slot}"))?;
        Ok(payload)
    }

    /// Computes the address of an attribute slot on an object.
    pub(crate) fn attribute_gep(
        &mut self,
        object: &StackValue,
        index: u32,
    ) -> CodeGenResult<String> {
        let struct_ty = object.ty.trim_end_matches('*');
        let slot = self.fresh_temp()?;
        self.emit(&format!(
            "{slot} = getelementptr inbounds {struct_ty}, {struct_ty}* {repr}, i32 0, i32 {field}",
            repr = object.repr,
            field = index + 1
        ))?;
        Ok(slot)
    }

    /// Emits the checked class cast: a runtime subtype test that aborts on
    /// failure, then a typed pointer. Labels carry the `cast` prefix.
    pub(crate) fn emit_checked_cast(
        &mut self,
        value: StackValue,
        target: ClassId,
        target_name: &str,
    ) -> CodeGenResult<StackValue> {
        let prefix = self.fresh_prefix("cast")?;

        let untyped = self.fresh_temp()?;
        self.emit(&format!("{untyped} = bitcast {ty} {repr} to i8*", ty = value.ty, repr = value.repr))?;

        let descriptor = self.descriptor_text(target, target_name);
        let flag = self.fresh_temp()?;
        self.emit(&format!(
            "{flag} = call i1 @ladon_instance_of(i8* {untyped}, i8* {descriptor})"
        ))?;
        self.terminate(&format!("br i1 {flag}, label %{prefix}.ok, label %{prefix}.fail"))?;

        self.place_label(&format!("{prefix}.fail"))?;
        self.emit("call void @ladon_cast_failed()")?;
        self.terminate("unreachable")?;

        self.place_label(&format!("{prefix}.ok"))?;
        let typed = self.fresh_temp()?;
        self.emit(&format!(
            "{typed} = bitcast {ty} {repr} to %class.{target_name}*",
            ty = value.ty,
            repr = value.repr
        ))?;

        Ok(StackValue::direct(typed, format!("%class.{target_name}*")))
    }

    /// Emits the class identity test of `is`: the object's descriptor
    /// compared against the class's descriptor. Returns the i1 register.
    pub(crate) fn emit_identity_test(
        &mut self,
        value: &StackValue,
        class: ClassId,
        name: &str,
    ) -> CodeGenResult<String> {
        let struct_ty = value.ty.trim_end_matches('*');
        let slot = self.fresh_temp()?;
        self.emit(&format!(
            "{slot} = getelementptr inbounds {struct_ty}, {struct_ty}* {repr}, i32 0, i32 0",
            repr = value.repr
        ))?;
        let descriptor = self.fresh_temp()?;
        self.emit(&format!("{descriptor} = load i8*, i8** {slot}"))?;

        let expected = self.descriptor_text(class, name);
        let flag = self.fresh_temp()?;
        self.emit(&format!("{flag} = icmp eq i8* {descriptor}, {expected}"))?;
        Ok(flag)
    }

    /// Resolves a condition value to an i1 flag, unboxing booleans.
    pub(crate) fn condition_flag(&mut self, value: StackValue) -> CodeGenResult<String> {
        let value = self.resolve(value)?;
        if value.ty == "i1" {
            return Ok(value.repr);
        }
        self.emit_unbox(&value, "i1")
    }

    /// Coerces a value to the given IR type, bitcasting pointers when the
    /// static types differ (subtype stores, phi joins, returns).
    pub(crate) fn coerce(&mut self, value: StackValue, ty: &str) -> CodeGenResult<StackValue> {
        if value.ty == ty {
            return Ok(value);
        }
        let cast = self.fresh_temp()?;
        self.emit(&format!("{cast} = bitcast {from} {repr} to {ty}", from = value.ty, repr = value.repr))?;
        Ok(StackValue::direct(cast, ty))
    }
}
