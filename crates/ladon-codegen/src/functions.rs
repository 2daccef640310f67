// -------------------------------------------------------------------------
// SPDX-FileCopyrightText: Copyright © 2025 The Ladon Project
// SPDX-FileName: crates/ladon-codegen/src/functions.rs
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
//! Function emission: headers, parameter binding, generator preludes, and
//! end-of-body epilogues.

use ladon_ast::decl::{FunctionId, FunctionKind};
use log::debug;

use crate::context::{CodeGenerator, LocalBinding};
use crate::error::{CodeGenError, CodeGenResult};
use crate::mangle;
use crate::stack::StackValue;
use crate::statements::EmitStatements;
use crate::types::{class_name, map_type, zero_value};

/// Function-level emission operations.
pub(crate) trait EmitFunctions {
    /// Emits one function declaration: a stub for abstract functions, an
    /// external declaration for native ones, a full body otherwise.
    fn visit_function(&mut self, function: FunctionId) -> CodeGenResult<()>;
}

impl EmitFunctions for CodeGenerator<'_> {
    fn visit_function(&mut self, function: FunctionId) -> CodeGenResult<()> {
        let table = self.table;
        let decl = table.function(function);

        let owner_name = match decl.owner {
            Some(owner) => Some(class_name(table, &self.variations, owner)?),
            None => None,
        };
        let symbol =
            mangle::function_symbol(table, &self.variations, function, &self.module, None)?;
        debug!("emitting function @{symbol}");

        let return_ty = match (&decl.return_type, decl.kind) {
            (_, FunctionKind::Initializer) => "void".to_string(),
            (Some(ty), _) => map_type(table, &self.variations, ty)?,
            (None, _) => "void".to_string(),
        };

        // Parameter list: the receiver first for methods and initializers.
        let mut params = Vec::with_capacity(decl.params.len() + 1);
        if let Some(name) = &owner_name {
            params.push((format!("%class.{name}*"), "%self".to_string()));
        }
        for param in &decl.params {
            let var = table.var(*param);
            let ty = map_type(table, &self.variations, &var.declared_type)?;
            params.push((ty, format!("%{}", var.ident.name)));
        }
        let param_text = params
            .iter()
            .map(|(ty, name)| format!("{ty} {name}"))
            .collect::<Vec<_>>()
            .join(", ");
        let param_tys =
            params.iter().map(|(ty, _)| ty.clone()).collect::<Vec<_>>().join(", ");

        // Native bodies live in the runtime; only the symbol is emitted.
        if decl.is_native || self.native_module {
            self.output.declaration(&format!("declare {return_ty} @{symbol}({param_tys})"));
            return Ok(());
        }

        self.open_frame(symbol.clone());
        self.frame()?.return_ty = return_ty.clone();

        let saved_self = self.self_value.take();
        if let Some(name) = &owner_name {
            self.self_value = Some(StackValue::direct("%self", format!("%class.{name}*")));
        }

        // Abstract functions emit a stub returning the zero of their type.
        if decl.is_abstract {
            if return_ty == "void" {
                self.terminate("ret void")?;
            } else {
                self.terminate(&format!("ret {return_ty} {}", zero_value(&return_ty)))?;
            }
            self.self_value = saved_self;
            return self.close_frame(&return_ty, &param_text);
        }

        // Parameters are already dereferenced.
        for param in &decl.params {
            let var = table.var(*param);
            let ty = map_type(table, &self.variations, &var.declared_type)?;
            self.bind_local(
                *param,
                LocalBinding { repr: format!("%{}", var.ident.name), ty, direct: true },
            );
        }

        // Generator bodies resume through the stored branch target.
        if decl.is_generator_body() {
            self.emit_generator_prelude(decl.yield_count)?;
        }

        self.visit_block(&decl.body)?;

        if !self.frame()?.terminated {
            // A generator-class initializer arms the resume pointer before
            // its final void return.
            if decl.kind == FunctionKind::Initializer
                && decl.owner.is_some_and(|owner| table.class(owner).is_generator)
            {
                self.emit_resume_reset(decl.owner.expect("initializer owner"))?;
            }

            if return_ty == "void" {
                self.terminate("ret void")?;
            } else {
                self.terminate(&format!("ret {return_ty} {}", zero_value(&return_ty)))?;
            }
        }

        self.self_value = saved_self;
        self.close_frame(&return_ty, &param_text)
    }
}

impl CodeGenerator<'_> {
    /// Emits the `getNext` entry: load the resume target from attribute 0
    /// and branch indirectly to `startGenerator` or one of the yield
    /// labels.
    fn emit_generator_prelude(&mut self, yields: usize) -> CodeGenResult<()> {
        let receiver = self
            .self_value
            .clone()
            .ok_or_else(|| CodeGenError::internal("generator body without receiver"))?;

        let slot = self.attribute_gep(&receiver, 0)?;
        let target = self.fresh_temp()?;
        self.emit(&format!("{target} = load i8*, i8** {slot}"))?;

        let mut labels = vec!["label %startGenerator".to_string()];
        for index in 0..yields {
            labels.push(format!("label %yield{index}"));
        }
        self.terminate(&format!("indirectbr i8* {target}, [{}]", labels.join(", ")))?;

        self.place_label("startGenerator")
    }

    /// Stores the `startGenerator` block address of the owning class's
    /// `getNext` into the resume attribute of the fresh instance.
    pub(crate) fn emit_resume_reset(
        &mut self,
        owner: ladon_ast::decl::ClassId,
    ) -> CodeGenResult<()> {
        let get_next = self
            .table
            .find_method(owner, "getNext")
            .ok_or_else(|| CodeGenError::internal("generator class without getNext"))?;
        let symbol =
            mangle::function_symbol(self.table, &self.variations, get_next, &self.module, None)?;

        let receiver = self
            .self_value
            .clone()
            .ok_or_else(|| CodeGenError::internal("initializer without receiver"))?;
        let slot = self.attribute_gep(&receiver, 0)?;
        self.emit(&format!(
            "store i8* blockaddress(@{symbol}, %startGenerator), i8** {slot}"
        ))
    }
}
