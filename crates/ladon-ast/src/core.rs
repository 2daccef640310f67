//! The built-in core classes.
//!
//! Core classes are recognized by identity, never by name lookup: the
//! registry records their [`ClassId`]s at installation time and the rest of
//! the compiler compares ids. The boxed primitive classes (`Int`, `Float`,
//! `Bool`, `Char`, `String`, `Array`) receive special treatment in literal
//! boxing and in the initializer dispatch rule that passes an already-boxed
//! argument through unchanged.
//!
//! The bodies of core-class methods live in the native runtime; their
//! declarations here are native, so calls become external symbols.

use ladon_source::types::Position;

use crate::decl::{ClassDecl, ClassId, DeclTable, Declaration, FunctionDecl, VarDecl};
use crate::expr::Literal;
use crate::ident::Ident;
use crate::types::Type;

/// The registry of built-in classes, installed once per compilation.
#[derive(Debug, Clone, Copy)]
pub struct CoreClasses {
    /// The root of the class hierarchy
    pub object: ClassId,
    /// The class of the absent value
    pub void: ClassId,
    /// Boxed integers
    pub int: ClassId,
    /// Boxed floating point numbers
    pub float: ClassId,
    /// Boxed booleans
    pub boolean: ClassId,
    /// Boxed characters
    pub char: ClassId,
    /// Boxed strings
    pub string: ClassId,
    /// Boxed arrays
    pub array: ClassId,
    /// Base class of synthesized tuple classes
    pub tuple: ClassId,
    /// The optional-value protocol class `Maybe<T>`
    pub maybe: ClassId,
    /// The present case `Just<T>`
    pub just: ClassId,
    /// The absent case `Nothing<T>`
    pub nothing: ClassId,
    /// Base class of synthesized function-wrapper classes
    pub function: ClassId,
}

impl CoreClasses {
    /// Installs the core classes into a fresh declaration table.
    pub fn install(table: &mut DeclTable) -> Self {
        let object = install_class(table, "Object", None, &[]);
        let void = install_class(table, "Void", Some(object), &[]);

        let int = install_boxed(table, "Int", object);
        let float = install_boxed(table, "Float", object);
        let boolean = install_boxed(table, "Bool", object);
        let char = install_boxed(table, "Char", object);
        let string = install_boxed(table, "String", object);
        let array = install_boxed(table, "Array", object);

        let tuple = install_class(table, "Tuple", Some(object), &[]);
        let function = install_class(table, "Function", Some(object), &[]);

        let maybe = install_class(table, "Maybe", Some(object), &["T"]);
        let just = install_class(table, "Just", Some(maybe), &["T"]);
        let nothing = install_class(table, "Nothing", Some(maybe), &["T"]);

        install_maybe_protocol(table, boolean, maybe, just, nothing);

        // Membership test used by the lowered `in` operator.
        let contains = {
            let mut method = FunctionDecl::method(
                Position::synthetic(),
                Ident::plain("_contains_"),
                array,
                Some(Type::Class(boolean)),
            );
            method.is_native = true;
            let param = table.add_var(VarDecl::parameter(
                Position::synthetic(),
                Ident::plain("item"),
                Type::Class(object),
            ));
            method.params.push(param);
            table.add_function(method)
        };
        table.class_mut(array).block.decls.push(Declaration::Function(contains));

        Self {
            object,
            void,
            int,
            float,
            boolean,
            char,
            string,
            array,
            tuple,
            maybe,
            just,
            nothing,
            function,
        }
    }

    /// Returns true if `class` is one of the boxed primitive classes whose
    /// one-argument initializer is the identity on its argument.
    #[must_use]
    pub fn is_boxed(&self, class: ClassId) -> bool {
        class == self.int
            || class == self.float
            || class == self.boolean
            || class == self.char
            || class == self.string
            || class == self.array
    }

    /// Returns the core class a literal boxes into.
    #[must_use]
    pub const fn for_literal(&self, literal: &Literal) -> ClassId {
        match literal {
            Literal::Int(_) => self.int,
            Literal::Float(_) => self.float,
            Literal::Bool(_) => self.boolean,
            Literal::Char(_) => self.char,
            Literal::Str(_) => self.string,
        }
    }

    /// Looks up a core class by its surface name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<ClassId> {
        match name {
            "Object" => Some(self.object),
            "Void" => Some(self.void),
            "Int" => Some(self.int),
            "Float" => Some(self.float),
            "Bool" => Some(self.boolean),
            "Char" => Some(self.char),
            "String" => Some(self.string),
            "Array" => Some(self.array),
            "Tuple" => Some(self.tuple),
            "Maybe" => Some(self.maybe),
            "Just" => Some(self.just),
            "Nothing" => Some(self.nothing),
            "Function" => Some(self.function),
            _ => None,
        }
    }
}

fn install_class(
    table: &mut DeclTable,
    name: &str,
    base: Option<ClassId>,
    type_params: &[&str],
) -> ClassId {
    let mut class = ClassDecl::new(Position::synthetic(), Ident::plain(name));
    class.type_params = type_params.iter().map(|param| Ident::plain(*param)).collect();

    if let Some(base) = base {
        class.supers.push(table.class(base).ident.clone());
        class.resolved_supers.push(base);
    }

    table.add_class(class)
}

/// Installs a boxed primitive class: the default initializer plus the
/// one-argument initializer whose argument is already the boxed value.
fn install_boxed(table: &mut DeclTable, name: &str, object: ClassId) -> ClassId {
    let class = install_class(table, name, Some(object), &[]);

    let mut default = FunctionDecl::initializer(Position::synthetic(), class);
    default.is_default_initializer = true;
    default.is_native = true;
    let default = table.add_function(default);

    let mut boxed = FunctionDecl::initializer(Position::synthetic(), class);
    boxed.is_native = true;
    let param = table.add_var(VarDecl::parameter(
        Position::synthetic(),
        Ident::plain("value"),
        Type::Class(class),
    ));
    boxed.params.push(param);
    let boxed = table.add_function(boxed);

    let block = &mut table.class_mut(class).block;
    block.decls.push(Declaration::Function(default));
    block.decls.push(Declaration::Function(boxed));

    class
}

/// Installs the `Maybe` protocol: `hasValue` on `Maybe`, `getValue` and the
/// value-storing initializer on `Just`, and the empty initializer on
/// `Nothing`.
fn install_maybe_protocol(
    table: &mut DeclTable,
    boolean: ClassId,
    maybe: ClassId,
    just: ClassId,
    nothing: ClassId,
) {
    let has_value = {
        let mut method = FunctionDecl::method(
            Position::synthetic(),
            Ident::plain("hasValue"),
            maybe,
            Some(Type::Class(boolean)),
        );
        method.is_native = true;
        table.add_function(method)
    };
    table.class_mut(maybe).block.decls.push(Declaration::Function(has_value));

    let value_attr = table.add_var(VarDecl::attribute(
        Position::synthetic(),
        Ident::plain("value"),
        Type::TypeParam { owner: just, index: 0 },
        just,
    ));
    table.class_mut(just).block.decls.push(Declaration::Var(value_attr));

    let just_default = {
        let mut init = FunctionDecl::initializer(Position::synthetic(), just);
        init.is_default_initializer = true;
        init.is_native = true;
        table.add_function(init)
    };
    table.class_mut(just).block.decls.push(Declaration::Function(just_default));

    let just_init = {
        let mut init = FunctionDecl::initializer(Position::synthetic(), just);
        init.is_native = true;
        let param = table.add_var(VarDecl::parameter(
            Position::synthetic(),
            Ident::plain("value"),
            Type::TypeParam { owner: just, index: 0 },
        ));
        init.params.push(param);
        table.add_function(init)
    };
    let get_value = {
        let mut method = FunctionDecl::method(
            Position::synthetic(),
            Ident::plain("getValue"),
            just,
            Some(Type::TypeParam { owner: just, index: 0 }),
        );
        method.is_native = true;
        table.add_function(method)
    };
    {
        let block = &mut table.class_mut(just).block;
        block.decls.push(Declaration::Function(just_init));
        block.decls.push(Declaration::Function(get_value));
    }
    table.assign_attribute_indices(just);

    let nothing_init = {
        let mut init = FunctionDecl::initializer(Position::synthetic(), nothing);
        init.is_default_initializer = true;
        init.is_native = true;
        table.add_function(init)
    };
    table.class_mut(nothing).block.decls.push(Declaration::Function(nothing_init));
}
