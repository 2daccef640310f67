// -------------------------------------------------------------------------
// SPDX-FileCopyrightText: Copyright © 2025 The Ladon Project
// SPDX-FileName: crates/ladon-codegen/src/types.rs
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
//! Type-to-IR mapping.
//!
//! Classes map to pointer-to-struct (objects are boxed), core primitives
//! have unboxed payload types, and `Void` maps to the IR void. Abstract
//! generic type parameters are substituted through the current-variation
//! context before mapping.

use ladon_ast::core::CoreClasses;
use ladon_ast::decl::{ClassId, DeclTable, VariationId};
use ladon_ast::types::Type;

use crate::error::{CodeGenError, CodeGenResult};

/// Substitutes abstract generic type parameters through the variation
/// context, innermost variation first.
pub(crate) fn substitute(
    table: &DeclTable,
    variations: &[VariationId],
    ty: &Type,
) -> CodeGenResult<Type> {
    match ty {
        Type::TypeParam { owner, index } => {
            for id in variations.iter().rev() {
                let variation = table.variation(*id);
                if variation.template == *owner {
                    let concrete = variation.args.get(*index as usize).ok_or_else(|| {
                        CodeGenError::type_mapping(format!(
                            "variation of {owner} lacks argument {index}"
                        ))
                    })?;
                    return substitute(table, variations, concrete);
                }
            }
            Err(CodeGenError::type_mapping(format!(
                "type parameter {index} of {owner} used outside a matching variation"
            )))
        }
        other => Ok(other.clone()),
    }
}

/// Returns the mangled name of a class, applying the variation context when
/// the class is the template currently being monomorphized.
pub(crate) fn class_name(
    table: &DeclTable,
    variations: &[VariationId],
    class: ClassId,
) -> CodeGenResult<String> {
    for id in variations.iter().rev() {
        if table.variation(*id).template == class {
            return variation_name(table, variations, *id);
        }
    }
    Ok(table.class(class).ident.name.clone())
}

/// Returns the mangled name of one monomorphic variation, e.g. `Box$Int`.
pub(crate) fn variation_name(
    table: &DeclTable,
    variations: &[VariationId],
    variation: VariationId,
) -> CodeGenResult<String> {
    let record = table.variation(variation);
    let mut name = table.class(record.template).ident.name.clone();
    for arg in &record.args {
        name.push('$');
        name.push_str(&type_name(table, variations, arg)?);
    }
    Ok(name)
}

/// Returns the mangle-suffix name of a type (`Int`, `Box$Int`).
pub(crate) fn type_name(
    table: &DeclTable,
    variations: &[VariationId],
    ty: &Type,
) -> CodeGenResult<String> {
    match substitute(table, variations, ty)? {
        Type::Void => Ok("Void".to_string()),
        Type::Class(class) => class_name(table, variations, class),
        Type::Variation(_, variation) => variation_name(table, variations, variation),
        Type::TypeParam { .. } => unreachable!("substituted above"),
        unresolved @ (Type::Named(_) | Type::Infer) => Err(CodeGenError::type_mapping(format!(
            "unresolved type {unresolved} reached emission"
        ))),
    }
}

/// Maps a resolved type to its IR representation.
///
/// Every class becomes a pointer to its struct layout; `Void` becomes the
/// IR void type.
pub(crate) fn map_type(
    table: &DeclTable,
    variations: &[VariationId],
    ty: &Type,
) -> CodeGenResult<String> {
    match substitute(table, variations, ty)? {
        Type::Void => Ok("void".to_string()),
        other => Ok(format!("%class.{}*", type_name(table, variations, &other)?)),
    }
}

/// Returns the unboxed payload type of a boxed core class.
pub(crate) fn payload_type(core: &CoreClasses, class: ClassId) -> Option<&'static str> {
    if class == core.int {
        Some("i64")
    } else if class == core.float {
        Some("double")
    } else if class == core.boolean {
        Some("i1")
    } else if class == core.char {
        Some("i8")
    } else if class == core.string {
        Some("i8*")
    } else {
        None
    }
}

/// Returns the zero constant of an IR type, used by abstract stubs and
/// global initialization.
pub(crate) fn zero_value(ty: &str) -> &'static str {
    if ty.ends_with('*') {
        "null"
    } else if ty == "double" {
        "0.0"
    } else {
        "0"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ladon_ast::core::CoreClasses;
    use ladon_ast::decl::{ClassDecl, Variation};
    use ladon_ast::ident::Ident;
    use ladon_source::types::Position;

    #[test]
    fn classes_map_to_pointer_to_struct() {
        let mut table = DeclTable::new();
        let core = CoreClasses::install(&mut table);

        assert_eq!(map_type(&table, &[], &Type::Class(core.int)).unwrap(), "%class.Int*");
        assert_eq!(map_type(&table, &[], &Type::Void).unwrap(), "void");
    }

    #[test]
    fn variation_context_substitutes_type_parameters() {
        let mut table = DeclTable::new();
        let core = CoreClasses::install(&mut table);

        let mut template = ClassDecl::new(Position::synthetic(), Ident::plain("Box"));
        template.type_params.push(Ident::plain("T"));
        let template = table.add_class(template);
        let variation =
            table.add_variation(Variation { template, args: vec![Type::Class(core.int)] });

        let param = Type::TypeParam { owner: template, index: 0 };
        let mapped = map_type(&table, &[variation], &param).unwrap();
        assert_eq!(mapped, "%class.Int*");

        assert_eq!(class_name(&table, &[variation], template).unwrap(), "Box$Int");
        assert!(map_type(&table, &[], &param).is_err());
    }

    #[test]
    fn payload_types_cover_the_boxed_primitives() {
        let mut table = DeclTable::new();
        let core = CoreClasses::install(&mut table);

        assert_eq!(payload_type(&core, core.int), Some("i64"));
        assert_eq!(payload_type(&core, core.float), Some("double"));
        assert_eq!(payload_type(&core, core.boolean), Some("i1"));
        assert_eq!(payload_type(&core, core.string), Some("i8*"));
        assert_eq!(payload_type(&core, core.object), None);
    }
}
