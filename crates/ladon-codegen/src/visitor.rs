// -------------------------------------------------------------------------
// SPDX-FileCopyrightText: Copyright © 2025 The Ladon Project
// SPDX-FileName: crates/ladon-codegen/src/visitor.rs
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
//! Module- and class-level emission: declaration order, generic variation
//! iteration, and the implicit `main` gathering top-level statements.

use ladon_ast::decl::{ClassId, Declaration, ModuleDecl};
use log::debug;

use crate::context::{CodeGenerator, LocalBinding};
use crate::error::{CodeGenError, CodeGenResult};
use crate::functions::EmitFunctions;
use crate::mangle;
use crate::statements::EmitStatements;
use crate::types::{class_name, map_type, variation_name, zero_value};

/// Declaration-level emission operations.
pub(crate) trait EmitDeclarations {
    /// Emits a class: directly when concrete, once per variation when
    /// generic (a generic template emits no code of its own).
    fn visit_class(&mut self, class: ClassId) -> CodeGenResult<()>;
}

impl CodeGenerator<'_> {
    /// Emits a lowered package.
    pub fn emit_program(&mut self, package: &ladon_ast::decl::Package) -> CodeGenResult<()> {
        self.emit_package(&package.modules)
    }

    /// Emits a whole package: every module's declarations, then the
    /// implicit `main` running all top-level statements in module order and
    /// returning integer zero.
    pub fn emit_package(&mut self, modules: &[ModuleDecl]) -> CodeGenResult<()> {
        for module in modules {
            self.emit_module_decls(module)?;
        }

        self.open_frame("main".to_string());
        self.frame()?.return_ty = "i32".to_string();

        for module in modules {
            if module.is_native {
                continue;
            }
            self.module = module.ident.name.clone();
            self.native_module = false;

            for stmt in &module.block.stmts {
                self.ensure_block()?;
                self.visit_stmt(stmt)?;
                if !self.stack.is_empty() {
                    return Err(CodeGenError::internal(
                        "value stack not empty after top-level statement",
                    ));
                }
            }
        }

        if !self.frame()?.terminated {
            self.terminate("ret i32 0")?;
        }
        self.close_frame("i32", "")
    }

    /// Convenience wrapper for single-module compilations.
    pub fn emit_module(&mut self, module: &ModuleDecl) -> CodeGenResult<()> {
        self.emit_package(std::slice::from_ref(module))
    }

    /// Emits one module's globals, classes, and functions in declaration
    /// order. Top-level statements are gathered later into `main`.
    fn emit_module_decls(&mut self, module: &ModuleDecl) -> CodeGenResult<()> {
        debug!("emitting module '{}'", module.ident);
        self.module = module.ident.name.clone();
        self.native_module = module.is_native;

        for decl in &module.block.decls {
            match decl {
                Declaration::Var(var) => {
                    let symbol = mangle::variable_symbol(self.table, &self.module, *var);
                    let ty = map_type(
                        self.table,
                        &self.variations,
                        &self.table.var(*var).declared_type,
                    )?;
                    if self.native_module {
                        self.output.declaration(&format!("@{symbol} = external global {ty}"));
                    } else {
                        self.output.declaration(&format!(
                            "@{symbol} = internal global {ty} {}",
                            zero_value(&ty)
                        ));
                    }
                    self.bind_local(
                        *var,
                        LocalBinding { repr: format!("@{symbol}"), ty, direct: false },
                    );
                }
                Declaration::Class(class) => self.visit_class(*class)?,
                Declaration::Function(function) => self.visit_function(*function)?,
            }
        }
        Ok(())
    }

    /// Emits the layout, dispatch table, and members of a class under its
    /// context-mangled name.
    fn emit_class_once(&mut self, class: ClassId) -> CodeGenResult<()> {
        let name = class_name(self.table, &self.variations, class)?;
        debug!("emitting class '{name}'");

        if self.native_module {
            self.emit_native_class(class, &name)?;
        } else {
            self.emit_class_definition(class, &name)?;
        }

        let saved = self.current_class.replace(class);
        let decls = self.table.class(class).block.decls.clone();
        let result = (|| {
            for decl in &decls {
                match decl {
                    Declaration::Var(_) => {} // attributes shape the layout only
                    Declaration::Function(function) => self.visit_function(*function)?,
                    Declaration::Class(nested) => self.visit_class(*nested)?,
                }
            }
            Ok(())
        })();
        self.current_class = saved;
        result
    }

    /// Emits the layouts of the built-in classes and the variations of the
    /// generic core classes registered with the compilation.
    pub(crate) fn emit_core_classes(&mut self) -> CodeGenResult<()> {
        let core = *self.core;

        for class in [
            core.object,
            core.void,
            core.int,
            core.float,
            core.boolean,
            core.char,
            core.string,
            core.array,
            core.tuple,
            core.function,
        ] {
            let name = self.table.class(class).ident.name.clone();
            self.emit_native_class(class, &name)?;
        }

        for template in [core.maybe, core.just, core.nothing] {
            for variation in self.table.class(template).variations.clone() {
                self.variations.push(variation);
                let result = variation_name(self.table, &self.variations, variation)
                    .and_then(|name| self.emit_native_class(template, &name));
                drop(self.variations.pop());
                result?;
            }
        }
        Ok(())
    }
}

impl EmitDeclarations for CodeGenerator<'_> {
    fn visit_class(&mut self, class: ClassId) -> CodeGenResult<()> {
        let decl = self.table.class(class);

        if decl.is_generic() {
            // One emission per variation, in discovery order; the variation
            // context substitutes the abstract type parameters throughout.
            for variation in decl.variations.clone() {
                self.variations.push(variation);
                let result = self.emit_class_once(class);
                drop(self.variations.pop());
                result?;
            }
            return Ok(());
        }

        self.emit_class_once(class)
    }
}
