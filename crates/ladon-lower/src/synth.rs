//! Desugaring factories: synthesized classes for generators, lambdas,
//! comprehensions, and tuples.
//!
//! A generator declaration becomes a *factory* class carrying the captured
//! arguments and a *generator-iterator* class holding the suspension state:
//! attribute 0 is the indirect-branch resume target, the remaining
//! attributes are the hoisted parameters and locals, and `getNext` carries
//! the rewritten body with its indexed yield markers.
//!
//! A lambda becomes a fresh unbound function plus a wrapper class whose
//! single `call` method forwards to it; the expression value is the wrapper
//! instance. A list comprehension reuses the generator machinery with the
//! nested `for`/`if` chain as the body.

use ladon_ast::core::CoreClasses;
use ladon_ast::decl::{
    Block,
    ClassDecl,
    ClassId,
    DeclTable,
    Declaration,
    FunctionDecl,
    FunctionKind,
    VarDecl,
    VarId,
};
use ladon_ast::expr::{Callee, Expr, ExprKind, VarRef};
use ladon_ast::ident::Ident;
use ladon_ast::stmt::Stmt;
use ladon_ast::types::Type;
use ladon_source::types::Position;
use ladon_syntax::nodes as syntax;
use log::debug;

use crate::builder::{Lowerer, type_ident};
use crate::error::LowerError;

impl Lowerer<'_> {
    /// Lowers a generator declaration into its factory and iterator classes.
    ///
    /// Calls of the generator resolve to the factory's initializer, so the
    /// factory takes the generator's name. Both classes are declared in the
    /// enclosing block.
    pub(crate) fn lower_generator_function(
        &mut self,
        item: &syntax::FunctionItem,
        _owner: Option<ClassId>,
    ) -> Result<(), LowerError> {
        debug!("synthesizing generator classes for '{}'", item.name);

        let element = item
            .return_type
            .clone()
            .unwrap_or_else(|| syntax::TypeExpr::plain("Object".to_string(), item.position));
        let factory_ident = Ident::plain(item.name.clone());
        let iterator_ident = Ident::plain(format!("{}$iterator", item.name));

        // The iterator holds the suspension state.
        let iterator = {
            let mut class = ClassDecl::new(item.position, iterator_ident.clone());
            class.is_generator = true;
            class.resolved_supers.push(self.core.object);
            self.table.add_class(class)
        };

        // Attribute 0 is the indirect-branch resume target.
        let resume = self.table.add_var(VarDecl::attribute(
            Position::synthetic(),
            Ident::plain("$resume"),
            Type::Class(self.core.object),
            iterator,
        ));
        self.table.class_mut(iterator).block.decls.push(Declaration::Var(resume));

        for param in &item.params {
            let declared = self.lower_type(&param.ty);
            let attr = self.table.add_var(VarDecl::attribute(
                param.position,
                Ident::plain(param.name.clone()),
                declared,
                iterator,
            ));
            self.table.class_mut(iterator).block.decls.push(Declaration::Var(attr));
        }

        self.synthesize_state_initializers(iterator, &item.params, item.position);

        // getNext() -> Maybe<T> carries the rewritten body. Locals declared
        // in the body hoist into the iterator while this context is open.
        let maybe = Ident::generic("Maybe", vec![type_ident(&element)]);
        self.generator_returns.push(element);
        self.generator_classes.push(iterator);
        self.yield_counters.push(0);

        let get_next = self.build_function(
            Ident::plain("getNext"),
            FunctionKind::Method,
            Some(iterator),
            Some(Type::Named(maybe)),
            Vec::new(),
            &item.body,
            false,
            item.position,
        );

        let yields = self.yield_counters.pop().expect("generator context left open");
        self.generator_classes.pop();
        self.generator_returns.pop();
        let get_next = get_next?;

        self.table.function_mut(get_next).yield_count = yields;
        self.table.class_mut(iterator).block.decls.push(Declaration::Function(get_next));
        self.table.assign_attribute_indices(iterator);

        // The factory stores the call arguments and seeds iterators.
        let factory = {
            let mut class = ClassDecl::new(item.position, factory_ident);
            class.resolved_supers.push(self.core.object);
            class.generator_iterator = Some(iterator);
            self.table.add_class(class)
        };

        let mut stored = Vec::with_capacity(item.params.len());
        for param in &item.params {
            let declared = self.lower_type(&param.ty);
            let attr = self.table.add_var(VarDecl::attribute(
                param.position,
                Ident::plain(param.name.clone()),
                declared,
                factory,
            ));
            self.table.class_mut(factory).block.decls.push(Declaration::Var(attr));
            stored.push(param.name.clone());
        }

        self.synthesize_state_initializers(factory, &item.params, item.position);

        // getIterator() -> iterator: a fresh iterator seeded with the state.
        let get_iterator = {
            let args = stored
                .iter()
                .map(|name| {
                    let receiver = Expr::new(item.position, ExprKind::SelfRef, Type::Infer);
                    let member = Expr::new(
                        item.position,
                        ExprKind::Var(VarRef::Named(Ident::plain(name.clone()))),
                        Type::Infer,
                    );
                    Expr::new(
                        item.position,
                        ExprKind::Member { target: Box::new(receiver), member: Box::new(member) },
                        Type::Infer,
                    )
                })
                .collect();
            let fresh = Expr::new(
                item.position,
                ExprKind::Call {
                    callee: Callee::Named(iterator_ident.clone()),
                    type_args: Vec::new(),
                    args,
                },
                Type::Named(iterator_ident.clone()),
            );
            let mut body = Block::new();
            body.stmts.push(Stmt::Return { value: Some(fresh), position: item.position });

            let mut method = FunctionDecl::method(
                item.position,
                Ident::plain("getIterator"),
                factory,
                Some(Type::Named(iterator_ident)),
            );
            method.body = body;
            self.table.add_function(method)
        };
        self.table.class_mut(factory).block.decls.push(Declaration::Function(get_iterator));
        self.table.assign_attribute_indices(factory);

        self.current_block().decls.push(Declaration::Class(iterator));
        self.current_block().decls.push(Declaration::Class(factory));
        Ok(())
    }

    /// Synthesizes the default initializer and, when the class carries
    /// state, the seeding initializer that stores each argument into the
    /// attribute of the same name.
    fn synthesize_state_initializers(
        &mut self,
        class: ClassId,
        params: &[syntax::Param],
        position: Position,
    ) {
        let mut default = FunctionDecl::initializer(Position::synthetic(), class);
        default.is_default_initializer = true;
        let default = self.table.add_function(default);
        self.table.class_mut(class).block.decls.push(Declaration::Function(default));

        if params.is_empty() {
            return;
        }

        let param_ids = self.lower_params(params);
        let mut body = Block::new();
        for (param, id) in params.iter().zip(&param_ids) {
            let receiver = Expr::new(position, ExprKind::SelfRef, Type::Infer);
            let member = Expr::new(
                position,
                ExprKind::Var(VarRef::Named(Ident::plain(param.name.clone()))),
                Type::Infer,
            );
            let target = Expr::new(
                position,
                ExprKind::Member { target: Box::new(receiver), member: Box::new(member) },
                Type::Infer,
            )
            .as_lvalue();
            body.stmts.push(Stmt::Assign { target, value: self.var_ref(*id, position) });
        }

        let mut seeding = FunctionDecl::initializer(position, class);
        seeding.params = param_ids;
        seeding.body = body;
        let seeding = self.table.add_function(seeding);
        self.table.class_mut(class).block.decls.push(Declaration::Function(seeding));
    }

    /// Lowers a lambda into a synthesized function, a wrapper class, a
    /// wrapper-object declaration, and the binding assignment. The value of
    /// the lambda expression is the wrapper object.
    pub(crate) fn lower_lambda(
        &mut self,
        params: &[syntax::Param],
        return_type: &syntax::TypeExpr,
        body: &syntax::Expr,
        position: Position,
    ) -> Result<Expr, LowerError> {
        let fn_ident = self.temps.fresh_named("lambda");
        debug!("synthesizing function '{}' for lambda", fn_ident.name);

        let item = syntax::FunctionItem {
            name: fn_ident.name.clone(),
            params: params.to_vec(),
            return_type: Some(return_type.clone()),
            body: vec![syntax::Stmt::Return { value: Some(body.clone()), position }],
            is_abstract: false,
            is_generator: false,
            access: None,
            position,
        };
        self.lower_function_item(&item, None)?;

        // The wrapper class: one method forwarding to the function.
        let wrapper_ident = Ident::plain(format!("{}$wrapper", fn_ident.name));
        let wrapper = {
            let mut class = ClassDecl::new(position, wrapper_ident.clone());
            class.is_function_wrapper = true;
            class.supers.push(Ident::plain("Function"));
            class.resolved_supers.push(self.core.function);
            self.table.add_class(class)
        };
        self.current_block().decls.push(Declaration::Class(wrapper));

        let mut init = FunctionDecl::initializer(position, wrapper);
        init.is_default_initializer = true;
        let init = self.table.add_function(init);
        self.table.class_mut(wrapper).block.decls.push(Declaration::Function(init));

        let call_params = self.lower_params(params);
        let args = call_params.iter().map(|param| self.var_ref(*param, position)).collect();
        let result = self.lower_type(return_type);
        let forward = Expr::new(
            position,
            ExprKind::Call { callee: Callee::Named(fn_ident), type_args: Vec::new(), args },
            result.clone(),
        );
        let mut body_block = Block::new();
        body_block.stmts.push(Stmt::Return { value: Some(forward), position });

        let mut call = FunctionDecl::method(position, Ident::plain("call"), wrapper, Some(result));
        call.params = call_params;
        call.body = body_block;
        let call = self.table.add_function(call);
        self.table.class_mut(wrapper).block.decls.push(Declaration::Function(call));
        self.table.assign_attribute_indices(wrapper);

        // The wrapper object and its binding.
        let object = self.table.add_var(VarDecl::local(
            position,
            self.temps.fresh(),
            Type::Named(wrapper_ident.clone()),
        ));
        self.current_block().decls.push(Declaration::Var(object));

        let fresh = Expr::new(
            position,
            ExprKind::Call {
                callee: Callee::Named(wrapper_ident.clone()),
                type_args: Vec::new(),
                args: Vec::new(),
            },
            Type::Named(wrapper_ident),
        );
        let target = self.var_ref(object, position);
        self.current_block().stmts.push(Stmt::Assign { target, value: fresh });

        Ok(self.var_ref(object, position))
    }

    /// Lowers `[e for v in s if f …]` into a synthesized generator class
    /// whose body is the nested `for`/`if` chain yielding `e`; the
    /// expression evaluates to a fresh instance seeded with the outermost
    /// iterable.
    pub(crate) fn lower_comprehension(
        &mut self,
        element: &syntax::Expr,
        element_type: &syntax::TypeExpr,
        clauses: &[syntax::CompClause],
        position: Position,
    ) -> Result<Expr, LowerError> {
        let syntax::CompClause::For { var, var_type, iterable } =
            clauses.first().expect("comprehension without clauses")
        else {
            panic!("comprehension must begin with a for clause");
        };

        // Innermost statement yields the element; clauses wrap outwards.
        let mut body = vec![syntax::Stmt::Yield { value: element.clone(), position }];
        for clause in clauses[1..].iter().rev() {
            body = match clause {
                syntax::CompClause::For { var, var_type, iterable } => {
                    vec![syntax::Stmt::ForIn {
                        var: var.clone(),
                        var_type: var_type.clone(),
                        iterable: iterable.clone(),
                        body,
                        position,
                    }]
                }
                syntax::CompClause::If { condition } => vec![syntax::Stmt::If {
                    condition: condition.clone(),
                    then_body: body,
                    else_body: Vec::new(),
                    position,
                }],
            };
        }

        // The outermost loop iterates the captured source.
        body = vec![syntax::Stmt::ForIn {
            var: var.clone(),
            var_type: var_type.clone(),
            iterable: syntax::Expr::Name { name: "$source".to_string(), position },
            body,
            position,
        }];

        let gen_ident = self.temps.fresh_named("comprehension");
        let item = syntax::FunctionItem {
            name: gen_ident.name.clone(),
            params: vec![syntax::Param {
                name: "$source".to_string(),
                ty: syntax::TypeExpr::plain("Object".to_string(), position),
                default: None,
                position,
            }],
            return_type: Some(element_type.clone()),
            body,
            is_abstract: false,
            is_generator: true,
            access: None,
            position,
        };
        self.lower_generator_function(&item, None)?;

        let source = self.lower_expr(iterable)?;
        Ok(Expr::new(
            position,
            ExprKind::Call {
                callee: Callee::Named(gen_ident.clone()),
                type_args: Vec::new(),
                args: vec![source],
            },
            Type::Named(gen_ident),
        ))
    }
}

/// Returns the tuple class of the given arity, synthesizing it on first
/// use. The class is generic over its element types; concrete layouts come
/// from variations registered by the typer.
pub fn tuple_class(table: &mut DeclTable, core: &CoreClasses, arity: usize) -> ClassId {
    let ident = Ident::plain(format!("Tuple${arity}"));

    if let Some((existing, _)) = table.classes().find(|(_, class)| class.ident == ident) {
        return existing;
    }

    let mut class = ClassDecl::new(Position::synthetic(), ident);
    class.type_params = (0..arity).map(|index| Ident::plain(format!("T{index}"))).collect();
    class.supers.push(Ident::plain("Tuple"));
    class.resolved_supers.push(core.tuple);
    let class = table.add_class(class);

    let mut items = Vec::with_capacity(arity);
    for index in 0..arity {
        let attr = table.add_var(VarDecl::attribute(
            Position::synthetic(),
            Ident::plain(format!("item{index}")),
            Type::TypeParam { owner: class, index: index as u32 },
            class,
        ));
        table.class_mut(class).block.decls.push(Declaration::Var(attr));
        items.push(attr);
    }

    let mut default = FunctionDecl::initializer(Position::synthetic(), class);
    default.is_default_initializer = true;
    let default = table.add_function(default);
    table.class_mut(class).block.decls.push(Declaration::Function(default));

    let seeding = {
        let params: Vec<VarId> = (0..arity)
            .map(|index| {
                table.add_var(VarDecl::parameter(
                    Position::synthetic(),
                    Ident::plain(format!("item{index}")),
                    Type::TypeParam { owner: class, index: index as u32 },
                ))
            })
            .collect();

        let mut body = Block::new();
        for (index, param) in params.iter().enumerate() {
            let receiver = Expr::new(Position::synthetic(), ExprKind::SelfRef, Type::Infer);
            let member = Expr::new(
                Position::synthetic(),
                ExprKind::Var(VarRef::Named(Ident::plain(format!("item{index}")))),
                Type::Infer,
            );
            let target = Expr::new(
                Position::synthetic(),
                ExprKind::Member { target: Box::new(receiver), member: Box::new(member) },
                Type::Infer,
            )
            .as_lvalue();
            let value = Expr::new(
                Position::synthetic(),
                ExprKind::Var(VarRef::Decl(*param)),
                table.var(*param).declared_type.clone(),
            );
            body.stmts.push(Stmt::Assign { target, value });
        }

        let mut init = FunctionDecl::initializer(Position::synthetic(), class);
        init.params = params;
        init.body = body;
        table.add_function(init)
    };
    table.class_mut(class).block.decls.push(Declaration::Function(seeding));
    table.assign_attribute_indices(class);

    class
}
