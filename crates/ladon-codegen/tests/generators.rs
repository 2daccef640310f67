//! Tests for generator state machines and generic monomorphization.

use ladon_ast::core::CoreClasses;
use ladon_ast::decl::{
    ClassDecl,
    ClassId,
    DeclTable,
    Declaration,
    FunctionDecl,
    FunctionId,
    ModuleDecl,
    VarDecl,
    Variation,
    VariationId,
};
use ladon_ast::expr::{Callee, Expr, ExprKind, Literal, VarRef};
use ladon_ast::ident::Ident;
use ladon_ast::stmt::Stmt;
use ladon_ast::types::Type;
use ladon_codegen::CodeGenerator;
use ladon_source::types::Position;

fn pos() -> Position { Position::synthetic() }

fn setup() -> (DeclTable, CoreClasses) {
    let mut table = DeclTable::new();
    let core = CoreClasses::install(&mut table);
    (table, core)
}

fn module(decls: Vec<Declaration>, stmts: Vec<Stmt>) -> ModuleDecl {
    let mut module = ModuleDecl::new(pos(), Ident::plain("main"));
    module.block.decls = decls;
    module.block.stmts = stmts;
    module
}

fn emit(table: &DeclTable, core: &CoreClasses, module: &ModuleDecl) -> String {
    let mut generator = CodeGenerator::new(table, core);
    generator.emit_module(module).expect("emission failed");
    generator.finish().expect("imbalanced emission state")
}

fn int_lit(core: &CoreClasses, value: i64) -> Expr {
    Expr::new(pos(), ExprKind::Literal(Literal::Int(value)), Type::Class(core.int))
}

/// Registers the `Maybe<Int>`, `Just<Int>`, and `Nothing<Int>` variations.
fn maybe_int(table: &mut DeclTable, core: &CoreClasses) -> (VariationId, VariationId, VariationId) {
    let maybe =
        table.add_variation(Variation { template: core.maybe, args: vec![Type::Class(core.int)] });
    let just =
        table.add_variation(Variation { template: core.just, args: vec![Type::Class(core.int)] });
    let nothing = table
        .add_variation(Variation { template: core.nothing, args: vec![Type::Class(core.int)] });
    (maybe, just, nothing)
}

fn initializer_with_arity(table: &DeclTable, class: ClassId, arity: usize) -> FunctionId {
    table
        .class(class)
        .block
        .functions()
        .find(|id| {
            let decl = table.function(*id);
            decl.kind == ladon_ast::decl::FunctionKind::Initializer && decl.params.len() == arity
        })
        .expect("initializer with requested arity")
}

/// Builds a generator-iterator class whose `getNext` yields the given
/// integers and then returns `Nothing<Int>()`.
fn build_iterator(table: &mut DeclTable, core: &CoreClasses, yields: &[i64]) -> ClassId {
    let (maybe, just, nothing) = maybe_int(table, core);

    let mut class = ClassDecl::new(pos(), Ident::plain("gen$iterator"));
    class.is_generator = true;
    class.resolved_supers.push(core.object);
    let iterator = table.add_class(class);

    let resume = table.add_var(VarDecl::attribute(
        pos(),
        Ident::plain("$resume"),
        Type::Class(core.object),
        iterator,
    ));
    table.class_mut(iterator).block.decls.push(Declaration::Var(resume));

    let default = table.add_function({
        let mut init = FunctionDecl::initializer(pos(), iterator);
        init.is_default_initializer = true;
        init
    });
    table.class_mut(iterator).block.decls.push(Declaration::Function(default));

    let get_next = {
        let mut method = FunctionDecl::method(
            pos(),
            Ident::plain("getNext"),
            iterator,
            Some(Type::Variation(core.maybe, maybe)),
        );
        method.yield_count = yields.len();

        let just_init = initializer_with_arity(table, core.just, 1);
        for (index, value) in yields.iter().enumerate() {
            let wrapped = Expr::new(
                pos(),
                ExprKind::Call {
                    callee: Callee::Decl(just_init),
                    type_args: vec![Type::Class(core.int)],
                    args: vec![int_lit(core, *value)],
                },
                Type::Variation(core.just, just),
            );
            method.body.stmts.push(Stmt::Yield { value: wrapped, index, position: pos() });
        }

        let nothing_init = initializer_with_arity(table, core.nothing, 0);
        let empty = Expr::new(
            pos(),
            ExprKind::Call {
                callee: Callee::Decl(nothing_init),
                type_args: vec![Type::Class(core.int)],
                args: Vec::new(),
            },
            Type::Variation(core.nothing, nothing),
        );
        method.body.stmts.push(Stmt::Return { value: Some(empty), position: pos() });

        table.add_function(method)
    };
    table.class_mut(iterator).block.decls.push(Declaration::Function(get_next));
    table.assign_attribute_indices(iterator);

    iterator
}

#[test]
fn get_next_dispatches_through_the_resume_target() {
    let (mut table, core) = setup();
    let iterator = build_iterator(&mut table, &core, &[1, 2, 3]);

    let module = module(vec![Declaration::Class(iterator)], Vec::new());
    let ir = emit(&table, &core, &module);

    assert!(
        ir.contains(
            "indirectbr i8* %t1, [label %startGenerator, label %yield0, label %yield1, label %yield2]"
        ),
        "the prelude branches to the start label or one of the yields"
    );
    assert!(ir.contains("startGenerator:"), "start label");
}

#[test]
fn yield_labels_match_the_yield_statements() {
    let (mut table, core) = setup();
    let iterator = build_iterator(&mut table, &core, &[1, 2, 3]);

    let module = module(vec![Declaration::Class(iterator)], Vec::new());
    let ir = emit(&table, &core, &module);

    for index in 0..3 {
        assert!(ir.contains(&format!("yield{index}:")), "resume label {index}");
        assert!(
            ir.contains(&format!(
                "store i8* blockaddress(@gen$iterator.getNext, %yield{index}), i8**"
            )),
            "yield {index} stores its successor label"
        );
    }
    assert!(!ir.contains("yield3:"), "no label beyond the last yield");
}

#[test]
fn yields_return_the_wrapped_value() {
    let (mut table, core) = setup();
    let iterator = build_iterator(&mut table, &core, &[7]);

    let module = module(vec![Declaration::Class(iterator)], Vec::new());
    let ir = emit(&table, &core, &module);

    // Just<Int> is constructed through its external initializer...
    assert!(ir.contains("declare void @Just$Int.__init__$Int(%class.Just$Int*, %class.Int*)"));
    assert!(ir.contains("call void @Just$Int.__init__$Int("));
    // ...and the result returns as the declared Maybe<Int>.
    assert!(ir.contains("ret %class.Maybe$Int*"));
    // Falling off the end produces the absent case.
    assert!(ir.contains("call void @Nothing$Int.__init__("));
}

#[test]
fn generator_initializer_arms_the_resume_pointer() {
    let (mut table, core) = setup();
    let iterator = build_iterator(&mut table, &core, &[1]);

    let module = module(vec![Declaration::Class(iterator)], Vec::new());
    let ir = emit(&table, &core, &module);

    let init = ir.find("define void @gen$iterator.__init__(").expect("default initializer");
    let body = &ir[init..];
    let arm = body
        .find("store i8* blockaddress(@gen$iterator.getNext, %startGenerator), i8**")
        .expect("resume pointer armed at body end");
    let ret = body.find("ret void").expect("void return");
    assert!(arm < ret, "the jump pointer is set before the final return");
}

#[test]
fn iterator_layout_reserves_field_one_for_the_resume_target() {
    let (mut table, core) = setup();
    let iterator = build_iterator(&mut table, &core, &[1]);

    let module = module(vec![Declaration::Class(iterator)], Vec::new());
    let ir = emit(&table, &core, &module);

    assert!(
        ir.contains("%class.gen$iterator = type { i8*, i8* }"),
        "descriptor pointer, then the raw resume address"
    );
}

#[test]
fn generic_classes_emit_one_constructor_per_variation() {
    // Box<T> instantiated as Box<Int> and Box<String> shares no symbols.
    let (mut table, core) = setup();

    let mut template = ClassDecl::new(pos(), Ident::plain("Box"));
    template.type_params.push(Ident::plain("T"));
    template.resolved_supers.push(core.object);
    let class = table.add_class(template);

    let value = table.add_var(VarDecl::attribute(
        pos(),
        Ident::plain("value"),
        Type::TypeParam { owner: class, index: 0 },
        class,
    ));
    table.class_mut(class).block.decls.push(Declaration::Var(value));

    let default = table.add_function({
        let mut init = FunctionDecl::initializer(pos(), class);
        init.is_default_initializer = true;
        init
    });
    table.class_mut(class).block.decls.push(Declaration::Function(default));

    let param = table.add_var(VarDecl::parameter(
        pos(),
        Ident::plain("value"),
        Type::TypeParam { owner: class, index: 0 },
    ));
    let seeding = table.add_function({
        let mut init = FunctionDecl::initializer(pos(), class);
        init.params.push(param);

        let target = Expr::new(
            pos(),
            ExprKind::Member {
                target: Box::new(Expr::new(
                    pos(),
                    ExprKind::SelfRef,
                    Type::Class(class),
                )),
                member: Box::new(
                    Expr::new(
                        pos(),
                        ExprKind::Var(VarRef::Decl(value)),
                        Type::TypeParam { owner: class, index: 0 },
                    )
                    .as_lvalue(),
                ),
            },
            Type::TypeParam { owner: class, index: 0 },
        )
        .as_lvalue();
        let source = Expr::new(
            pos(),
            ExprKind::Var(VarRef::Decl(param)),
            Type::TypeParam { owner: class, index: 0 },
        );
        init.body.stmts.push(Stmt::Assign { target, value: source });
        init
    });
    table.class_mut(class).block.decls.push(Declaration::Function(seeding));
    table.assign_attribute_indices(class);

    let first =
        table.add_variation(Variation { template: class, args: vec![Type::Class(core.int)] });
    let second =
        table.add_variation(Variation { template: class, args: vec![Type::Class(core.string)] });
    assert_ne!(first, second);

    let module = module(vec![Declaration::Class(class)], Vec::new());
    let ir = emit(&table, &core, &module);

    // Distinct layouts with substituted attribute types.
    assert!(ir.contains("%class.Box$Int = type { i8*, %class.Int* }"));
    assert!(ir.contains("%class.Box$String = type { i8*, %class.String* }"));

    // Distinct constructors with distinct mangled names; no template code.
    assert!(ir.contains("define void @Box$Int.__init__$Int(%class.Box$Int* %self, %class.Int* %value)"));
    assert!(ir.contains("define void @Box$String.__init__$String(%class.Box$String* %self, %class.String* %value)"));
    assert!(!ir.contains("@Box.__init__"), "the template itself emits no code");

    // Variation emission order follows discovery order.
    let int_at = ir.find("define void @Box$Int.__init__(").expect("Box<Int> default");
    let string_at = ir.find("define void @Box$String.__init__(").expect("Box<String> default");
    assert!(int_at < string_at);
}

#[test]
fn construction_of_a_variation_uses_its_mangled_symbols() {
    let (mut table, core) = setup();

    let mut template = ClassDecl::new(pos(), Ident::plain("Box"));
    template.type_params.push(Ident::plain("T"));
    template.resolved_supers.push(core.object);
    let class = table.add_class(template);

    let default = table.add_function({
        let mut init = FunctionDecl::initializer(pos(), class);
        init.is_default_initializer = true;
        init
    });
    table.class_mut(class).block.decls.push(Declaration::Function(default));
    table.assign_attribute_indices(class);

    let variation =
        table.add_variation(Variation { template: class, args: vec![Type::Class(core.int)] });

    let fresh = Expr::new(
        pos(),
        ExprKind::Call {
            callee: Callee::Decl(default),
            type_args: vec![Type::Class(core.int)],
            args: Vec::new(),
        },
        Type::Variation(class, variation),
    );
    let module =
        module(vec![Declaration::Class(class)], vec![Stmt::Call(fresh)]);
    let ir = emit(&table, &core, &module);

    assert!(ir.contains("call void @Box$Int.__init__("), "creation calls the variation symbol");
    assert!(ir.contains("bitcast i8* ") && ir.contains("to %class.Box$Int*"), "typed allocation");
}
