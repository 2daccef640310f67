// -------------------------------------------------------------------------
// SPDX-FileCopyrightText: Copyright © 2025 The Ladon Project
// SPDX-FileName: crates/ladon-codegen/src/mangle.rs
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
//! Deterministic symbol names.
//!
//! Function symbols derive from the fully qualified name, the parameter
//! types, and the owning class variation: `Ab.__init__$Int$Int`,
//! `main.square$Int`, `Box$Int.getValue`. Globals derive from module and
//! name. The mapping is pure and stable under recompilation; native calls
//! use the mangled name verbatim with C-style linkage.

use std::fmt::Write as _;

use ladon_ast::decl::{DeclTable, FunctionId, VarId, VariationId};

use crate::error::CodeGenResult;
use crate::types::{class_name, type_name};

/// Returns the mangled symbol of a function, without the leading `@`.
///
/// `owner_name` overrides the owning-class segment; pass it when calling a
/// template method through a concrete variation.
pub(crate) fn function_symbol(
    table: &DeclTable,
    variations: &[VariationId],
    function: FunctionId,
    module: &str,
    owner_name: Option<&str>,
) -> CodeGenResult<String> {
    let decl = table.function(function);

    let qualifier = match (decl.owner, owner_name) {
        (_, Some(name)) => name.to_string(),
        (Some(owner), None) => class_name(table, variations, owner)?,
        (None, None) => module.to_string(),
    };

    let mut symbol = format!("{qualifier}.{}", decl.ident.name);
    for param in &decl.params {
        let suffix = type_name(table, variations, &table.var(*param).declared_type)?;
        write!(symbol, "${suffix}").expect("write mangle suffix");
    }
    Ok(symbol)
}

/// Returns the mangled symbol of a variable, without the `@`: globals
/// qualify by module, attributes by their owning class.
pub(crate) fn variable_symbol(table: &DeclTable, module: &str, var: VarId) -> String {
    let decl = table.var(var);
    match decl.owner {
        Some(owner) => format!("{}.{}", table.class(owner).ident.name, decl.ident.name),
        None => format!("{module}.{}", decl.ident.name),
    }
}

/// Escapes a string literal into an LLVM `c"..."` body with a trailing NUL,
/// returning the escaped text and the total byte length.
pub(crate) fn escape_string(text: &str) -> (String, usize) {
    let bytes = text.as_bytes();
    let mut escaped = String::with_capacity(bytes.len() + 4);

    for byte in bytes {
        match byte {
            b'"' | b'\\' => write!(escaped, "\\{byte:02X}").expect("write escape"),
            0x20..=0x7E => escaped.push(*byte as char),
            _ => write!(escaped, "\\{byte:02X}").expect("write escape"),
        }
    }
    escaped.push_str("\\00");

    (escaped, bytes.len() + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ladon_ast::core::CoreClasses;
    use ladon_ast::decl::{ClassDecl, FunctionDecl, VarDecl};
    use ladon_ast::ident::Ident;
    use ladon_ast::types::Type;
    use ladon_source::types::Position;

    #[test]
    fn method_symbols_qualify_by_class_and_parameters() {
        let mut table = DeclTable::new();
        let core = CoreClasses::install(&mut table);

        let class = table.add_class(ClassDecl::new(Position::synthetic(), Ident::plain("Ab")));
        let mut init = FunctionDecl::initializer(Position::synthetic(), class);
        for name in ["a", "b"] {
            let param = table.add_var(VarDecl::parameter(
                Position::synthetic(),
                Ident::plain(name),
                Type::Class(core.int),
            ));
            init.params.push(param);
        }
        let init = table.add_function(init);

        let symbol = function_symbol(&table, &[], init, "main", None).unwrap();
        assert_eq!(symbol, "Ab.__init__$Int$Int");
    }

    #[test]
    fn unbound_symbols_qualify_by_module() {
        let mut table = DeclTable::new();
        let core = CoreClasses::install(&mut table);

        let mut function = FunctionDecl::unbound(
            Position::synthetic(),
            Ident::plain("square"),
            Some(Type::Class(core.int)),
        );
        let param = table.add_var(VarDecl::parameter(
            Position::synthetic(),
            Ident::plain("x"),
            Type::Class(core.int),
        ));
        function.params.push(param);
        let function = table.add_function(function);

        let symbol = function_symbol(&table, &[], function, "main", None).unwrap();
        assert_eq!(symbol, "main.square$Int");
    }

    #[test]
    fn mangling_is_stable_across_calls() {
        let mut table = DeclTable::new();
        let _core = CoreClasses::install(&mut table);

        let function = table.add_function(FunctionDecl::unbound(
            Position::synthetic(),
            Ident::plain("tick"),
            None,
        ));
        let first = function_symbol(&table, &[], function, "main", None).unwrap();
        let second = function_symbol(&table, &[], function, "main", None).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn variable_symbols_qualify_by_module_or_owning_class() {
        let mut table = DeclTable::new();
        let core = CoreClasses::install(&mut table);

        let mut global = VarDecl::local(
            Position::synthetic(),
            Ident::plain("counter"),
            Type::Class(core.int),
        );
        global.is_global = true;
        let global = table.add_var(global);
        assert_eq!(variable_symbol(&table, "main", global), "main.counter");

        let class = table.add_class(ClassDecl::new(Position::synthetic(), Ident::plain("Ab")));
        let attr = table.add_var(VarDecl::attribute(
            Position::synthetic(),
            Ident::plain("attr"),
            Type::Class(core.int),
            class,
        ));
        assert_eq!(variable_symbol(&table, "main", attr), "Ab.attr");
    }

    #[test]
    fn strings_escape_to_llvm_constant_bodies() {
        let (escaped, len) = escape_string("hi\n");
        assert_eq!(escaped, "hi\\0A\\00");
        assert_eq!(len, 4);
    }
}
