//! End-to-end tests running parse trees through the builder and the
//! emitter. Only constructs that need no name resolution participate;
//! everything else is covered by the hand-resolved AST tests.

use ladon_ast::core::CoreClasses;
use ladon_ast::decl::DeclTable;
use ladon_codegen::CodeGenerator;
use ladon_lower::builder::Lowerer;
use ladon_source::types::Position;
use ladon_syntax::nodes::{Expr, Item, Literal, SourceModule, Stmt, TypeExpr};

fn pos() -> Position { Position::synthetic() }

fn compile(items: Vec<Item>) -> String {
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

    let mut generator = CodeGenerator::new(&table, &core);
    generator.emit_module(&lowered).expect("emission failed");
    generator.finish().expect("imbalanced emission state")
}

#[test]
fn global_declaration_with_literal_initializer_compiles() {
    let ir = compile(vec![Item::Statement(Stmt::VarDecl {
        name: "answer".to_string(),
        ty: TypeExpr::plain("Int".to_string(), pos()),
        value: Some(Expr::Literal { value: Literal::Int(42), position: pos() }),
        position: pos(),
    })]);

    assert!(ir.contains("@main.answer = internal global %class.Int* null"));
    assert!(ir.contains("store i64 42, i64*"), "the literal boxes its payload");
    assert!(ir.contains("store %class.Int* "), "the boxed value reaches the global");
    assert!(ir.contains("ret i32 0"), "main returns integer zero");
}

#[test]
fn while_true_with_break_compiles_to_the_documented_labels() {
    let ir = compile(vec![Item::Statement(Stmt::While {
        condition: Expr::Literal { value: Literal::Bool(true), position: pos() },
        body: vec![Stmt::Break { position: pos() }],
        position: pos(),
    })]);

    assert!(ir.contains("while0.condition:"));
    assert!(ir.contains("while0.block:"));
    assert!(ir.contains("while0.end:"));
    assert!(ir.contains("br label %while0.end"), "break binds to the enclosing loop");
}

#[test]
fn packages_gather_top_level_statements_into_one_main() {
    let mut table = DeclTable::new();
    let core = CoreClasses::install(&mut table);

    let module = |name: &str, var: &str, value: i64| SourceModule {
        name: name.to_string(),
        imports: Vec::new(),
        items: vec![Item::Statement(Stmt::VarDecl {
            name: var.to_string(),
            ty: TypeExpr::plain("Int".to_string(), pos()),
            value: Some(Expr::Literal { value: Literal::Int(value), position: pos() }),
            position: pos(),
        })],
        is_native: false,
        position: pos(),
    };
    let modules = [module("first", "a", 1), module("second", "b", 2)];

    let package = {
        let mut lowerer = Lowerer::new(&mut table, &core);
        lowerer.lower_package("demo", &modules).expect("lowering failed")
    };

    let mut generator = CodeGenerator::new(&table, &core);
    generator.emit_program(&package).expect("emission failed");
    let ir = generator.finish().expect("imbalanced emission state");

    assert!(ir.contains("@first.a = internal global"));
    assert!(ir.contains("@second.b = internal global"));
    // One main; module statements run in compilation order.
    assert_eq!(ir.matches("define i32 @main()").count(), 1);
    let first = ir.find("store i64 1, i64*").expect("first module statement");
    let second = ir.find("store i64 2, i64*").expect("second module statement");
    assert!(first < second);
}

#[test]
fn nested_loops_bind_break_to_the_innermost_loop() {
    let inner = Stmt::While {
        condition: Expr::Literal { value: Literal::Bool(true), position: pos() },
        body: vec![Stmt::Break { position: pos() }],
        position: pos(),
    };
    let ir = compile(vec![Item::Statement(Stmt::While {
        condition: Expr::Literal { value: Literal::Bool(false), position: pos() },
        body: vec![inner, Stmt::Skip { position: pos() }],
        position: pos(),
    })]);

    // The inner break targets the inner loop's end label, the skip targets
    // the outer loop's condition.
    assert!(ir.contains("br label %while1.end"), "inner break");
    assert!(ir.contains("br label %while0.condition"), "outer skip");
}
