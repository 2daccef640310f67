//! Tests for the class-synthesizing desugarings: generators, lambdas,
//! list comprehensions, and tuples.

use ladon_ast::core::CoreClasses;
use ladon_ast::decl::{DeclTable, FunctionKind, VarKind};
use ladon_ast::expr::{Callee, ExprKind};
use ladon_ast::stmt::Stmt;
use ladon_ast::types::Type;
use ladon_lower::builder::Lowerer;
use ladon_lower::synth::tuple_class;
use ladon_source::types::Position;
use ladon_syntax::nodes::{
    CompClause,
    Expr,
    FunctionItem,
    Item,
    Literal as SynLiteral,
    Param,
    SourceModule,
    Stmt as SynStmt,
    TypeExpr,
};
use ladon_syntax::ops::BinaryOp;

fn pos() -> Position { Position::synthetic() }

fn int(value: i64) -> Expr { Expr::Literal { value: SynLiteral::Int(value), position: pos() } }

fn name(name: &str) -> Expr { Expr::Name { name: name.to_string(), position: pos() } }

fn int_type() -> TypeExpr { TypeExpr::plain("Int".to_string(), pos()) }

fn lower(items: Vec<Item>) -> (DeclTable, CoreClasses, ladon_ast::decl::ModuleDecl) {
    let mut table = DeclTable::new();
    let core = CoreClasses::install(&mut table);
    let module = SourceModule {
        name: "main".to_string(),
        imports: Vec::new(),
        items,
        is_native: false,
        position: pos(),
    };
    let lowered = {
        let mut lowerer = Lowerer::new(&mut table, &core);
        lowerer.lower_module(&module).expect("lowering failed")
    };
    (table, core, lowered)
}

fn generator_item(yields: &[i64]) -> FunctionItem {
    FunctionItem {
        name: "gen".to_string(),
        params: vec![Param {
            name: "start".to_string(),
            ty: int_type(),
            default: None,
            position: pos(),
        }],
        return_type: Some(int_type()),
        body: yields
            .iter()
            .map(|value| SynStmt::Yield { value: int(*value), position: pos() })
            .collect(),
        is_abstract: false,
        is_generator: true,
        access: None,
        position: pos(),
    }
}

#[test]
fn generator_synthesizes_factory_and_iterator_classes() {
    let (table, _, module) = lower(vec![Item::Function(generator_item(&[1, 2, 3]))]);

    let classes: Vec<_> = module.block.classes().collect();
    assert_eq!(classes.len(), 2);

    let iterator = table.class(classes[0]);
    let factory = table.class(classes[1]);
    assert_eq!(iterator.ident.name, "gen$iterator");
    assert_eq!(factory.ident.name, "gen");
    assert!(iterator.is_generator);
    assert!(!factory.is_generator);
    assert_eq!(factory.generator_iterator, Some(classes[0]));
}

#[test]
fn iterator_reserves_slot_zero_for_the_resume_target() {
    let (table, _, module) = lower(vec![Item::Function(generator_item(&[1]))]);

    let iterator = module.block.classes().next().expect("iterator class");
    let mut vars = table.class(iterator).block.vars();

    let resume = vars.next().expect("resume attribute");
    let resume = table.var(resume);
    assert_eq!(resume.ident.name, "$resume");
    assert_eq!(resume.attribute_index, Some(0));
    assert_eq!(resume.kind, VarKind::Attribute);

    // The generator parameter is hoisted into the next slot.
    let start = vars.next().expect("hoisted parameter");
    assert_eq!(table.var(start).ident.name, "start");
    assert_eq!(table.var(start).attribute_index, Some(1));
}

#[test]
fn yield_count_matches_the_number_of_yields() {
    let (table, _, module) = lower(vec![Item::Function(generator_item(&[1, 2, 3]))]);

    let iterator = module.block.classes().next().expect("iterator class");
    let get_next = table.find_method(iterator, "getNext").expect("getNext");
    let decl = table.function(get_next);
    assert_eq!(decl.yield_count, 3);
    assert_eq!(decl.kind, FunctionKind::Method);

    // Yields carry their stable zero-based ordinals in order.
    let indices: Vec<usize> = decl
        .body
        .stmts
        .iter()
        .filter_map(|stmt| match stmt {
            Stmt::Yield { index, .. } => Some(*index),
            _ => None,
        })
        .collect();
    assert_eq!(indices, vec![0, 1, 2]);
}

#[test]
fn yields_wrap_values_and_the_body_ends_with_nothing() {
    let (table, _, module) = lower(vec![Item::Function(generator_item(&[7]))]);

    let iterator = module.block.classes().next().expect("iterator class");
    let get_next = table.find_method(iterator, "getNext").expect("getNext");
    let body = &table.function(get_next).body;

    // yield 7 ⇒ return Just<Int>(7) with a resume marker.
    let Stmt::Yield { value, index: 0, .. } = &body.stmts[0] else { panic!("expected yield") };
    let ExprKind::Call { callee: Callee::Named(ident), args, .. } = &value.kind else {
        panic!("expected Just construction")
    };
    assert_eq!(ident.name, "Just");
    assert_eq!(ident.generics[0].name, "Int");
    assert_eq!(args.len(), 1);

    // Falling off the end returns Nothing<Int>().
    let Stmt::Return { value: Some(value), .. } = body.stmts.last().expect("trailing return")
    else {
        panic!("expected trailing return")
    };
    let ExprKind::Call { callee: Callee::Named(ident), args, .. } = &value.kind else {
        panic!("expected Nothing construction")
    };
    assert_eq!(ident.name, "Nothing");
    assert!(args.is_empty());
}

#[test]
fn generator_locals_hoist_into_the_iterator() {
    let mut item = generator_item(&[]);
    item.body = vec![
        SynStmt::VarDecl {
            name: "acc".to_string(),
            ty: int_type(),
            value: Some(int(0)),
            position: pos(),
        },
        SynStmt::Yield { value: name("acc"), position: pos() },
    ];
    let (table, _, module) = lower(vec![Item::Function(item)]);

    let iterator = module.block.classes().next().expect("iterator class");
    let names: Vec<String> = table
        .class(iterator)
        .block
        .vars()
        .map(|var| table.var(var).ident.name.clone())
        .collect();
    assert_eq!(names, vec!["$resume", "start", "acc"]);

    // The getNext body keeps only the initializing assignment; the
    // declaration lives in the iterator.
    let get_next = table.find_method(iterator, "getNext").expect("getNext");
    let body = &table.function(get_next).body;
    assert_eq!(body.vars().count(), 0);
    assert!(matches!(&body.stmts[0], Stmt::Assign { .. }));
}

#[test]
fn factory_get_iterator_seeds_a_fresh_iterator() {
    let (table, _, module) = lower(vec![Item::Function(generator_item(&[1]))]);

    let factory = module.block.classes().nth(1).expect("factory class");
    let get_iterator = table.find_method(factory, "getIterator").expect("getIterator");
    let body = &table.function(get_iterator).body;

    let Stmt::Return { value: Some(value), .. } = &body.stmts[0] else {
        panic!("expected return of a fresh iterator")
    };
    let ExprKind::Call { callee: Callee::Named(ident), args, .. } = &value.kind else {
        panic!("expected iterator construction")
    };
    assert_eq!(ident.name, "gen$iterator");
    assert_eq!(args.len(), 1);
    assert!(matches!(&args[0].kind, ExprKind::Member { .. }));
}

#[test]
fn lambda_synthesizes_function_wrapper_and_binding() {
    let lambda = Expr::Lambda {
        params: vec![Param { name: "x".to_string(), ty: int_type(), default: None, position: pos() }],
        return_type: int_type(),
        body: Box::new(Expr::Binary {
            op: BinaryOp::Add,
            left: Box::new(name("x")),
            right: Box::new(int(1)),
            position: pos(),
        }),
        position: pos(),
    };
    let stmt = SynStmt::VarDecl {
        name: "f".to_string(),
        ty: TypeExpr::plain("Function".to_string(), pos()),
        value: Some(lambda),
        position: pos(),
    };
    let (table, core, module) = lower(vec![Item::Statement(stmt)]);

    // A fresh unbound function carries the lambda body.
    let function = module.block.functions().next().expect("lambda function");
    let decl = table.function(function);
    assert!(decl.ident.name.starts_with("lambda$"));
    assert_eq!(decl.kind, FunctionKind::Unbound);
    assert!(matches!(decl.body.stmts.last(), Some(Stmt::Return { value: Some(_), .. })));

    // The wrapper class forwards through its single `call` method.
    let wrapper = module.block.classes().next().expect("wrapper class");
    let wrapper_decl = table.class(wrapper);
    assert!(wrapper_decl.is_function_wrapper);
    assert_eq!(wrapper_decl.resolved_supers, vec![core.function]);

    let call = table.find_method(wrapper, "call").expect("call method");
    let Stmt::Return { value: Some(forward), .. } = &table.function(call).body.stmts[0] else {
        panic!("expected forwarding return")
    };
    let ExprKind::Call { callee: Callee::Named(target), .. } = &forward.kind else {
        panic!("expected forwarding call")
    };
    assert_eq!(target.name, decl.ident.name);

    // The wrapper object is declared and bound before use.
    assert!(module.block.vars().count() >= 2);
    assert!(matches!(&module.block.stmts[0], Stmt::Assign { .. }));
}

#[test]
fn comprehension_synthesizes_a_generator_and_instantiates_it() {
    // [x * x for x in xs if x != 1]
    let comprehension = Expr::ListComprehension {
        element: Box::new(Expr::Binary {
            op: BinaryOp::Mul,
            left: Box::new(name("x")),
            right: Box::new(name("x")),
            position: pos(),
        }),
        element_type: int_type(),
        clauses: vec![
            CompClause::For { var: "x".to_string(), var_type: int_type(), iterable: name("xs") },
            CompClause::If {
                condition: Expr::Binary {
                    op: BinaryOp::NotEq,
                    left: Box::new(name("x")),
                    right: Box::new(int(1)),
                    position: pos(),
                },
            },
        ],
        position: pos(),
    };
    let stmt = SynStmt::ForIn {
        var: "y".to_string(),
        var_type: int_type(),
        iterable: comprehension,
        body: Vec::new(),
        position: pos(),
    };
    let (table, _, module) = lower(vec![Item::Statement(stmt)]);

    // Iterator and factory classes are synthesized in the enclosing block.
    let classes: Vec<_> = module.block.classes().collect();
    assert_eq!(classes.len(), 2);
    let factory = table.class(classes[1]);
    assert!(factory.ident.name.starts_with("comprehension$"));

    // The iterator's getNext loops over the captured source and yields
    // behind the filter.
    let get_next = table.find_method(classes[0], "getNext").expect("getNext");
    assert_eq!(table.function(get_next).yield_count, 1);

    // The loop's iterable lowered to `new comprehension$N(xs)`.
    let Stmt::Assign { value, .. } = &module.block.stmts[0] else {
        panic!("expected iterator binding")
    };
    let ExprKind::Member { target, .. } = &value.kind else { panic!("expected getIterator call") };
    let ExprKind::Call { callee: Callee::Named(ident), args, .. } = &target.kind else {
        panic!("expected comprehension construction")
    };
    assert_eq!(ident.name, factory.ident.name);
    assert_eq!(args.len(), 1);
}

#[test]
fn tuple_classes_are_generic_and_cached_per_arity() {
    let mut table = DeclTable::new();
    let core = CoreClasses::install(&mut table);

    let pair = tuple_class(&mut table, &core, 2);
    let again = tuple_class(&mut table, &core, 2);
    let triple = tuple_class(&mut table, &core, 3);

    assert_eq!(pair, again);
    assert_ne!(pair, triple);

    let decl = table.class(pair);
    assert_eq!(decl.ident.name, "Tuple$2");
    assert_eq!(decl.type_params.len(), 2);
    assert_eq!(decl.resolved_supers, vec![core.tuple]);

    let indices: Vec<_> =
        decl.block.vars().map(|var| table.var(var).attribute_index).collect();
    assert_eq!(indices, vec![Some(0), Some(1)]);

    // Elements are typed by the class's own parameters.
    let first = decl.block.vars().next().expect("item0");
    assert!(matches!(
        table.var(first).declared_type,
        Type::TypeParam { owner, index: 0 } if owner == pair
    ));
}
