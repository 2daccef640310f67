//! Tests for overload selection by best-match distance.

use ladon_ast::decl::{ClassDecl, DeclTable, FunctionDecl, VarDecl};
use ladon_ast::ident::Ident;
use ladon_ast::overload::{OverloadError, candidate_distance, distance, select};
use ladon_ast::types::Type;
use ladon_source::types::Position;
use proptest::prelude::*;

fn add_class(table: &mut DeclTable, name: &str, bases: &[ladon_ast::decl::ClassId]) -> ladon_ast::decl::ClassId {
    let mut class = ClassDecl::new(Position::synthetic(), Ident::plain(name));
    for base in bases {
        class.supers.push(table.class(*base).ident.clone());
        class.resolved_supers.push(*base);
    }
    table.add_class(class)
}

fn add_overload(table: &mut DeclTable, name: &str, params: &[Type]) -> ladon_ast::decl::FunctionId {
    let mut function = FunctionDecl::unbound(Position::synthetic(), Ident::plain(name), None);
    for (index, ty) in params.iter().enumerate() {
        let param = table.add_var(VarDecl::parameter(
            Position::synthetic(),
            Ident::plain(format!("p{index}")),
            ty.clone(),
        ));
        function.params.push(param);
    }
    table.add_function(function)
}

#[test]
fn exact_match_has_distance_zero() {
    let mut table = DeclTable::new();
    let object = add_class(&mut table, "Object", &[]);
    let a = add_class(&mut table, "A", &[object]);

    assert_eq!(distance(&table, &Type::Class(a), &Type::Class(a)), Some(0));
    assert_eq!(distance(&table, &Type::Class(object), &Type::Class(a)), Some(1));
    assert_eq!(distance(&table, &Type::Class(a), &Type::Class(object)), None);
}

#[test]
fn subclass_argument_selects_nearest_overload() {
    // B <: A <: Object, C <: B; m(A) and m(B) as candidates.
    let mut table = DeclTable::new();
    let object = add_class(&mut table, "Object", &[]);
    let a = add_class(&mut table, "A", &[object]);
    let b = add_class(&mut table, "B", &[a]);
    let c = add_class(&mut table, "C", &[b]);

    let m_a = add_overload(&mut table, "m", &[Type::Class(a)]);
    let m_b = add_overload(&mut table, "m", &[Type::Class(b)]);
    let candidates = [m_a, m_b];

    // m(new B()): distance 0 beats distance 1.
    assert_eq!(select(&table, &candidates, &[Type::Class(b)], Position::synthetic()), Ok(m_b));
    // m(new C()): distance 1 beats distance 2.
    assert_eq!(select(&table, &candidates, &[Type::Class(c)], Position::synthetic()), Ok(m_b));
    // m(new A()): only m(A) is reachable.
    assert_eq!(select(&table, &candidates, &[Type::Class(a)], Position::synthetic()), Ok(m_a));
}

#[test]
fn total_distance_sums_over_parameters() {
    let mut table = DeclTable::new();
    let object = add_class(&mut table, "Object", &[]);
    let a = add_class(&mut table, "A", &[object]);
    let b = add_class(&mut table, "B", &[a]);

    let candidate = add_overload(&mut table, "m", &[Type::Class(a), Type::Class(b)]);
    let total = candidate_distance(&table, candidate, &[Type::Class(b), Type::Class(b)]);
    assert_eq!(total, Some(1));

    // Arity mismatch is no match, not a partial sum.
    assert_eq!(candidate_distance(&table, candidate, &[Type::Class(b)]), None);
}

#[test]
fn ties_are_reported_not_silently_picked() {
    let mut table = DeclTable::new();
    let object = add_class(&mut table, "Object", &[]);
    let a = add_class(&mut table, "A", &[object]);
    let b = add_class(&mut table, "B", &[a]);

    let m_ab = add_overload(&mut table, "m", &[Type::Class(a), Type::Class(b)]);
    let m_ba = add_overload(&mut table, "m", &[Type::Class(b), Type::Class(a)]);

    let result =
        select(&table, &[m_ab, m_ba], &[Type::Class(b), Type::Class(b)], Position::synthetic());
    assert_eq!(
        result,
        Err(OverloadError::Ambiguous {
            candidates: vec![m_ab, m_ba],
            position: Position::synthetic(),
        })
    );
    assert_eq!(result.unwrap_err().position(), Position::synthetic());
}

#[test]
fn unreachable_arguments_are_no_match() {
    let mut table = DeclTable::new();
    let object = add_class(&mut table, "Object", &[]);
    let a = add_class(&mut table, "A", &[object]);
    let unrelated = add_class(&mut table, "X", &[object]);

    let m_a = add_overload(&mut table, "m", &[Type::Class(a)]);
    let result = select(&table, &[m_a], &[Type::Class(unrelated)], Position::synthetic());
    assert_eq!(result, Err(OverloadError::NoMatch { position: Position::synthetic() }));
}

#[test]
fn initializer_style_overload_set_resolves_by_argument_types() {
    // Mirrors a class with (), (Int), (Int, Int) initializer overloads.
    let mut table = DeclTable::new();
    let object = add_class(&mut table, "Object", &[]);
    let int = add_class(&mut table, "Int", &[object]);

    let empty = add_overload(&mut table, "__init__", &[]);
    let one = add_overload(&mut table, "__init__", &[Type::Class(int)]);
    let two = add_overload(&mut table, "__init__", &[Type::Class(int), Type::Class(int)]);
    let candidates = [empty, one, two];

    assert_eq!(select(&table, &candidates, &[], Position::synthetic()), Ok(empty));
    assert_eq!(select(&table, &candidates, &[Type::Class(int)], Position::synthetic()), Ok(one));
    assert_eq!(
        select(&table, &candidates, &[Type::Class(int), Type::Class(int)], Position::synthetic()),
        Ok(two)
    );
}

proptest! {
    /// Distance along a straight inheritance chain equals its length.
    #[test]
    fn chain_distance_equals_depth(depth in 1usize..24) {
        let mut table = DeclTable::new();
        let root = add_class(&mut table, "Root", &[]);

        let mut leaf = root;
        for level in 0..depth {
            leaf = add_class(&mut table, &format!("C{level}"), &[leaf]);
        }

        prop_assert_eq!(
            distance(&table, &Type::Class(root), &Type::Class(leaf)),
            Some(depth as u32)
        );
        prop_assert_eq!(distance(&table, &Type::Class(leaf), &Type::Class(leaf)), Some(0));
    }
}
