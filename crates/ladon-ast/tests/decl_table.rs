//! Tests for the declaration arena.

use ladon_ast::decl::{
    ClassDecl,
    DeclTable,
    Declaration,
    FunctionDecl,
    VarDecl,
    Variation,
};
use ladon_ast::ident::Ident;
use ladon_ast::types::Type;
use ladon_source::types::Position;

fn class_with_attrs(table: &mut DeclTable, name: &str, attrs: &[&str]) -> ladon_ast::decl::ClassId {
    let class = table.add_class(ClassDecl::new(Position::synthetic(), Ident::plain(name)));
    for attr in attrs {
        let var = table.add_var(VarDecl::attribute(
            Position::synthetic(),
            Ident::plain(*attr),
            Type::Void,
            class,
        ));
        table.class_mut(class).block.decls.push(Declaration::Var(var));
    }
    class
}

#[test]
fn attribute_indices_are_dense_and_stable() {
    let mut table = DeclTable::new();
    let class = class_with_attrs(&mut table, "Point", &["x", "y", "z"]);

    table.assign_attribute_indices(class);
    let indices: Vec<_> = table
        .class(class)
        .block
        .vars()
        .map(|var| table.var(var).attribute_index)
        .collect();
    assert_eq!(indices, vec![Some(0), Some(1), Some(2)]);

    // A second pass does not renumber.
    table.assign_attribute_indices(class);
    let again: Vec<_> = table
        .class(class)
        .block
        .vars()
        .map(|var| table.var(var).attribute_index)
        .collect();
    assert_eq!(again, indices);
}

#[test]
fn subclass_attributes_start_after_inherited_slots() {
    let mut table = DeclTable::new();
    let base = class_with_attrs(&mut table, "Base", &["a", "b"]);
    let derived = class_with_attrs(&mut table, "Derived", &["c"]);
    table.class_mut(derived).resolved_supers.push(base);

    table.assign_attribute_indices(base);
    table.assign_attribute_indices(derived);

    let c = table.class(derived).block.vars().next().unwrap();
    assert_eq!(table.var(c).attribute_index, Some(2));
    assert_eq!(table.attribute_count(derived), 3);
}

#[test]
fn find_method_searches_superclasses() {
    let mut table = DeclTable::new();
    let base = table.add_class(ClassDecl::new(Position::synthetic(), Ident::plain("Base")));
    let derived = table.add_class(ClassDecl::new(Position::synthetic(), Ident::plain("Derived")));
    table.class_mut(derived).resolved_supers.push(base);

    let method = table.add_function(FunctionDecl::method(
        Position::synthetic(),
        Ident::plain("size"),
        base,
        None,
    ));
    table.class_mut(base).block.decls.push(Declaration::Function(method));

    assert_eq!(table.find_method(derived, "size"), Some(method));
    assert_eq!(table.find_method(derived, "missing"), None);
}

#[test]
fn variations_record_in_discovery_order() {
    let mut table = DeclTable::new();
    let mut template = ClassDecl::new(Position::synthetic(), Ident::plain("Box"));
    template.type_params.push(Ident::plain("T"));
    let template = table.add_class(template);

    let int = table.add_class(ClassDecl::new(Position::synthetic(), Ident::plain("Int")));
    let string = table.add_class(ClassDecl::new(Position::synthetic(), Ident::plain("String")));

    let first = table.add_variation(Variation { template, args: vec![Type::Class(int)] });
    let second = table.add_variation(Variation { template, args: vec![Type::Class(string)] });

    assert_eq!(table.class(template).variations, vec![first, second]);
    assert_eq!(table.variation(first).args, vec![Type::Class(int)]);
}

#[test]
fn duplicate_substitutions_reuse_the_registered_variation() {
    let mut table = DeclTable::new();
    let mut template = ClassDecl::new(Position::synthetic(), Ident::plain("Box"));
    template.type_params.push(Ident::plain("T"));
    let template = table.add_class(template);

    let int = table.add_class(ClassDecl::new(Position::synthetic(), Ident::plain("Int")));
    let string = table.add_class(ClassDecl::new(Position::synthetic(), Ident::plain("String")));

    let first = table.add_variation(Variation { template, args: vec![Type::Class(int)] });
    let again = table.add_variation(Variation { template, args: vec![Type::Class(int)] });
    let other = table.add_variation(Variation { template, args: vec![Type::Class(string)] });

    // One variation per concrete substitution, in discovery order.
    assert_eq!(first, again);
    assert_ne!(first, other);
    assert_eq!(table.class(template).variations, vec![first, other]);

    assert_eq!(table.find_variation(template, &[Type::Class(int)]), Some(first));
    assert_eq!(table.find_variation(template, &[Type::Class(string)]), Some(other));
    assert_eq!(table.find_variation(template, &[Type::Class(template)]), None);
}
