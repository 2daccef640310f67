//! The AST builder.
//!
//! Walks parse trees and produces canonical AST nodes, applying every
//! desugaring of the surface language. The builder keeps its context
//! stacks (open blocks, generator return types, the current variable kind,
//! the current function kind) as explicit state, so multiple builders
//! never interfere with each other.

use ladon_ast::core::CoreClasses;
use ladon_ast::decl::{
    Block,
    ClassDecl,
    ClassId,
    DeclTable,
    Declaration,
    FunctionDecl,
    FunctionId,
    FunctionKind,
    ModuleDecl,
    Package,
    VarDecl,
    VarId,
    VarKind,
};
use ladon_ast::expr::{Callee, Expr, ExprKind, Literal, VarRef};
use ladon_ast::ident::Ident;
use ladon_ast::stmt::{Stmt, TryHandler};
use ladon_ast::types::Type;
use ladon_source::types::Position;
use ladon_syntax::nodes as syntax;
use ladon_syntax::ops::BinaryOp;
use log::debug;

use crate::error::LowerError;
use crate::ops::{binary_method, unary_method};
use crate::temps::TempIdents;

/// The desugaring AST builder.
///
/// One lowerer serves one compilation; it appends declarations to the shared
/// [`DeclTable`] and produces one [`ModuleDecl`] per source module.
pub struct Lowerer<'a> {
    pub(crate) table: &'a mut DeclTable,
    pub(crate) core: &'a CoreClasses,
    /// Open blocks; synthesized declarations and statements land in the top.
    pub(crate) blocks: Vec<Block>,
    /// Yield element types; non-empty iff inside a generator body.
    pub(crate) generator_returns: Vec<syntax::TypeExpr>,
    /// Iterator classes receiving hoisted generator locals.
    pub(crate) generator_classes: Vec<ClassId>,
    /// Per-generator yield ordinals.
    pub(crate) yield_counters: Vec<usize>,
    /// The current variable declaration kind.
    pub(crate) var_context: Vec<VarKind>,
    /// The current function kind with its declared return type.
    pub(crate) function_context: Vec<(FunctionKind, Option<Type>)>,
    /// Loop nesting depth of the current function body.
    pub(crate) loop_depth: usize,
    /// Fresh-identifier factory.
    pub(crate) temps: TempIdents,
}

impl<'a> Lowerer<'a> {
    /// Creates a builder over the given declaration table.
    #[must_use]
    pub fn new(table: &'a mut DeclTable, core: &'a CoreClasses) -> Self {
        Self {
            table,
            core,
            blocks: Vec::new(),
            generator_returns: Vec::new(),
            generator_classes: Vec::new(),
            yield_counters: Vec::new(),
            var_context: Vec::new(),
            function_context: Vec::new(),
            loop_depth: 0,
            temps: TempIdents::new(),
        }
    }

    /// Lowers a whole package: every module, in compilation order.
    ///
    /// ## Errors
    ///
    /// Returns the first semantic invariant violation found in any module.
    pub fn lower_package(
        &mut self,
        name: &str,
        modules: &[syntax::SourceModule],
    ) -> Result<Package, LowerError> {
        let mut package = Package::new(Ident::plain(name));
        package.is_native = modules.iter().all(|module| module.is_native);
        for module in modules {
            package.modules.push(self.lower_module(module)?);
        }
        Ok(package)
    }

    /// Lowers one parsed module into its AST declaration.
    ///
    /// ## Errors
    ///
    /// Returns the first semantic invariant violation found in the module.
    pub fn lower_module(&mut self, module: &syntax::SourceModule) -> Result<ModuleDecl, LowerError> {
        debug!("lowering module '{}'", module.name);

        let mut decl = ModuleDecl::new(module.position, Ident::plain(module.name.clone()));
        decl.is_native = module.is_native;
        decl.imports = module.imports.iter().map(|import| Ident::plain(import.module.clone())).collect();

        self.blocks.push(Block::new());
        self.var_context.push(VarKind::Variable);

        for item in &module.items {
            match item {
                syntax::Item::Class(class) => {
                    let _ = self.lower_class(class)?;
                }
                syntax::Item::Function(function) => self.lower_function_item(function, None)?,
                syntax::Item::Statement(stmt) => self.lower_stmt(stmt)?,
            }
        }

        self.var_context.pop();
        decl.block = self.blocks.pop().expect("module block left open");
        Ok(decl)
    }

    // ------------------------------------------------------------------
    // Declarations
    // ------------------------------------------------------------------

    /// Lowers a class declaration and registers it in the enclosing block.
    pub(crate) fn lower_class(&mut self, item: &syntax::ClassItem) -> Result<ClassId, LowerError> {
        debug!("lowering class '{}'", item.name);

        let mut class = ClassDecl::new(item.position, Ident::plain(item.name.clone()));
        class.is_abstract = item.is_abstract;
        class.access = lower_access(item.access);
        class.type_params = item.type_params.iter().map(|param| Ident::plain(param.clone())).collect();

        for base in &item.bases {
            class.supers.push(type_ident(base));
            if let Some(resolved) = self.core.find(&base.name) {
                class.resolved_supers.push(resolved);
            }
        }
        if item.bases.is_empty() {
            class.resolved_supers.push(self.core.object);
        }

        let id = self.table.add_class(class);
        self.current_block().decls.push(Declaration::Class(id));

        self.blocks.push(Block::new());
        self.var_context.push(VarKind::Attribute);

        for member in &item.members {
            match member {
                syntax::Member::Attribute { name, ty, access, position } => {
                    let declared = self.lower_type(ty);
                    let mut var =
                        VarDecl::attribute(*position, Ident::plain(name.clone()), declared, id);
                    var.access = lower_access(*access);
                    let var = self.table.add_var(var);
                    self.current_block().decls.push(Declaration::Var(var));
                }
                syntax::Member::Method(function) => self.lower_function_item(function, Some(id))?,
            }
        }

        self.var_context.pop();
        let block = self.blocks.pop().expect("class block left open");
        self.table.class_mut(id).block = block;

        self.ensure_default_initializer(id);

        // Attribute slots can be numbered as soon as all superclasses are
        // known; the resolver repeats this for classes with deferred bases.
        let decl = self.table.class(id);
        if decl.supers.len() <= decl.resolved_supers.len() {
            self.table.assign_attribute_indices(id);
        }

        Ok(id)
    }

    /// Marks an explicit zero-argument initializer as the default one, or
    /// synthesizes an empty default initializer if the class has none.
    pub(crate) fn ensure_default_initializer(&mut self, class: ClassId) {
        let existing: Vec<FunctionId> = self.table.class(class).block.functions().collect();

        for function in existing {
            let decl = self.table.function(function);
            if decl.kind == FunctionKind::Initializer && decl.params.is_empty() {
                self.table.function_mut(function).is_default_initializer = true;
                return;
            }
        }

        let mut init = FunctionDecl::initializer(Position::synthetic(), class);
        init.is_default_initializer = true;
        let init = self.table.add_function(init);
        self.table.class_mut(class).block.decls.push(Declaration::Function(init));
    }

    /// Lowers a function item: plain functions directly, generators through
    /// class synthesis, and defaulted parameters into forwarding thunks.
    pub(crate) fn lower_function_item(
        &mut self,
        item: &syntax::FunctionItem,
        owner: Option<ClassId>,
    ) -> Result<(), LowerError> {
        if item.is_generator {
            return self.lower_generator_function(item, owner);
        }

        let kind = match owner {
            Some(_) if item.name == "__init__" => FunctionKind::Initializer,
            Some(_) => FunctionKind::Method,
            None => FunctionKind::Unbound,
        };

        // Defaulted parameters must form a suffix of the parameter list.
        let mut seen_default = false;
        for param in &item.params {
            match (&param.default, seen_default) {
                (Some(_), _) => seen_default = true,
                (None, true) => {
                    return Err(LowerError::RequiredAfterDefault {
                        name: param.name.clone(),
                        position: param.position,
                    });
                }
                (None, false) => {}
            }
        }

        let return_type = match kind {
            FunctionKind::Initializer => None,
            _ => item.return_type.as_ref().map(|ty| self.lower_type(ty)),
        };

        let params = self.lower_params(&item.params);
        let ident = Ident::plain(item.name.clone());
        let function = self.build_function(
            ident.clone(),
            kind,
            owner,
            return_type.clone(),
            params,
            &item.body,
            item.is_abstract,
            item.position,
        )?;
        {
            let decl = self.table.function_mut(function);
            decl.access = lower_access(item.access);
        }
        self.current_block().decls.push(Declaration::Function(function));

        self.synthesize_default_thunks(item, kind, owner, &return_type, &ident)?;
        Ok(())
    }

    /// Synthesizes one forwarding overload per defaulted-parameter prefix.
    ///
    /// A thunk with arity `n - k` calls the maximal-arity version, passing
    /// its own parameters followed by the lowered default expressions of the
    /// `k` missing parameters. Methods forward through `self`.
    fn synthesize_default_thunks(
        &mut self,
        item: &syntax::FunctionItem,
        kind: FunctionKind,
        owner: Option<ClassId>,
        return_type: &Option<Type>,
        ident: &Ident,
    ) -> Result<(), LowerError> {
        let defaults = item.params.iter().filter(|param| param.default.is_some()).count();

        for missing in 1..=defaults {
            let kept = item.params.len() - missing;
            let params = self.lower_params(&item.params[..kept]);

            self.function_context.push((kind, return_type.clone()));
            self.blocks.push(Block::new());

            let mut args: Vec<Expr> = params
                .iter()
                .map(|param| self.var_ref(*param, item.position))
                .collect();
            for param in &item.params[kept..] {
                let default = param.default.as_ref().expect("defaulted suffix");
                args.push(self.lower_expr(default)?);
            }

            let ty = return_type.clone().unwrap_or(Type::Infer);
            let call = Expr::new(
                item.position,
                ExprKind::Call { callee: Callee::Named(ident.clone()), type_args: Vec::new(), args },
                ty.clone(),
            );
            let forward = match kind {
                FunctionKind::Unbound => call,
                // Methods and initializers forward through the receiver.
                _ => {
                    let receiver = Expr::new(item.position, ExprKind::SelfRef, Type::Infer);
                    Expr::new(
                        item.position,
                        ExprKind::Member { target: Box::new(receiver), member: Box::new(call) },
                        ty,
                    )
                }
            };

            match return_type {
                Some(ty) if *ty != Type::Void => {
                    self.current_block().stmts.push(Stmt::Return {
                        value: Some(forward),
                        position: item.position,
                    });
                }
                _ => {
                    self.current_block().stmts.push(Stmt::Call(forward));
                    self.current_block()
                        .stmts
                        .push(Stmt::Return { value: None, position: item.position });
                }
            }

            let body = self.blocks.pop().expect("thunk block left open");
            self.function_context.pop();

            let mut thunk = FunctionDecl::unbound(item.position, ident.clone(), return_type.clone());
            thunk.kind = kind;
            thunk.owner = owner;
            thunk.access = lower_access(item.access);
            thunk.params = params;
            thunk.body = body;
            let thunk = self.table.add_function(thunk);
            self.current_block().decls.push(Declaration::Function(thunk));
        }

        Ok(())
    }

    /// Creates parameter declarations for a parameter list.
    pub(crate) fn lower_params(&mut self, params: &[syntax::Param]) -> Vec<VarId> {
        self.var_context.push(VarKind::Parameter);
        let ids = params
            .iter()
            .map(|param| {
                let declared = self.lower_type(&param.ty);
                self.table.add_var(VarDecl::parameter(
                    param.position,
                    Ident::plain(param.name.clone()),
                    declared,
                ))
            })
            .collect();
        self.var_context.pop();
        ids
    }

    /// Lowers a function body into a fresh declaration.
    ///
    /// The loop depth is reset for the body, so `break` never escapes into
    /// an enclosing function's loop. Procedures that do not end in a return
    /// get an implicit trailing one; generator bodies get an implicit
    /// `return Nothing<T>()` instead. Initializer epilogues are emitted by
    /// code generation.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn build_function(
        &mut self,
        ident: Ident,
        kind: FunctionKind,
        owner: Option<ClassId>,
        return_type: Option<Type>,
        params: Vec<VarId>,
        body: &[syntax::Stmt],
        is_abstract: bool,
        position: Position,
    ) -> Result<FunctionId, LowerError> {
        self.function_context.push((kind, return_type.clone()));
        self.var_context.push(VarKind::Variable);
        self.blocks.push(Block::new());
        let saved_depth = std::mem::take(&mut self.loop_depth);

        for stmt in body {
            self.lower_stmt(stmt)?;
        }

        let ends_in_return =
            matches!(self.current_block().stmts.last(), Some(Stmt::Return { .. }));
        if !is_abstract && !ends_in_return {
            if self.in_generator() {
                let value = self.nothing_value(position);
                self.current_block().stmts.push(Stmt::Return { value: Some(value), position });
            } else if kind != FunctionKind::Initializer
                && !matches!(&return_type, Some(ty) if *ty != Type::Void)
            {
                self.current_block().stmts.push(Stmt::Return { value: None, position });
            }
        }

        self.loop_depth = saved_depth;
        let block = self.blocks.pop().expect("function block left open");
        self.var_context.pop();
        self.function_context.pop();

        let mut decl = FunctionDecl::unbound(position, ident, return_type);
        decl.kind = kind;
        decl.owner = owner;
        decl.params = params;
        decl.body = block;
        decl.is_abstract = is_abstract;
        Ok(self.table.add_function(decl))
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    /// Lowers one statement into the current block.
    pub(crate) fn lower_stmt(&mut self, stmt: &syntax::Stmt) -> Result<(), LowerError> {
        match stmt {
            syntax::Stmt::Expr { expr, .. } => {
                let expr = self.lower_expr(expr)?;
                self.current_block().stmts.push(Stmt::Call(expr));
            }

            syntax::Stmt::Assign { target, value, .. } => {
                let value = self.lower_expr(value)?;
                let mut target = self.lower_expr(target)?;
                target.lvalue = true;
                self.current_block().stmts.push(Stmt::Assign { target, value });
            }

            // `a ⊕= b` rewrites to `a := a ⊕ b`.
            syntax::Stmt::CompoundAssign { target, op, value, position } => {
                let combined = syntax::Expr::Binary {
                    op: *op,
                    left: Box::new(target.clone()),
                    right: Box::new(value.clone()),
                    position: *position,
                };
                let value = self.lower_expr(&combined)?;
                let mut target = self.lower_expr(target)?;
                target.lvalue = true;
                self.current_block().stmts.push(Stmt::Assign { target, value });
            }

            syntax::Stmt::Unpack { targets, value, position } => {
                let temp = self.table.add_var(VarDecl::local(
                    *position,
                    self.temps.fresh(),
                    Type::Infer,
                ));
                self.current_block().decls.push(Declaration::Var(temp));

                let value = self.lower_expr(value)?;
                let mut lowered = Vec::with_capacity(targets.len());
                for target in targets {
                    let mut target = self.lower_expr(target)?;
                    target.lvalue = true;
                    lowered.push(target);
                }
                self.current_block().stmts.push(Stmt::Unpack { temp, targets: lowered, value });
            }

            syntax::Stmt::VarDecl { name, ty, value, position } => {
                self.lower_var_decl(name, ty, value.as_ref(), *position)?;
            }

            syntax::Stmt::If { condition, then_body, else_body, .. } => {
                let condition = self.lower_expr(condition)?;
                let then_block = self.lower_nested_block(then_body)?;
                let else_block = self.lower_nested_block(else_body)?;
                self.current_block().stmts.push(Stmt::If { condition, then_block, else_block });
            }

            syntax::Stmt::While { condition, body, .. } => {
                let condition = self.lower_expr(condition)?;
                self.loop_depth += 1;
                let body = self.lower_nested_block(body)?;
                self.loop_depth -= 1;
                self.current_block().stmts.push(Stmt::While { condition, body });
            }

            syntax::Stmt::ForIn { var, var_type, iterable, body, position } => {
                self.lower_for_in(var, var_type, iterable, body, *position)?;
            }

            syntax::Stmt::Break { position } => {
                if self.loop_depth == 0 {
                    return Err(LowerError::BreakOutsideLoop { position: *position });
                }
                self.current_block().stmts.push(Stmt::Break { position: *position });
            }

            syntax::Stmt::Skip { position } => {
                if self.loop_depth == 0 {
                    return Err(LowerError::SkipOutsideLoop { position: *position });
                }
                self.current_block().stmts.push(Stmt::Skip { position: *position });
            }

            syntax::Stmt::Return { value, position } => {
                if self.in_generator() {
                    if value.is_some() {
                        return Err(LowerError::ReturnValueInGenerator { position: *position });
                    }
                    // Ending a generator produces the absent case.
                    let value = self.nothing_value(*position);
                    self.current_block()
                        .stmts
                        .push(Stmt::Return { value: Some(value), position: *position });
                } else {
                    if value.is_some() && !self.current_function_returns_value() {
                        return Err(LowerError::ReturnValueInProcedure { position: *position });
                    }
                    let value = value.as_ref().map(|value| self.lower_expr(value)).transpose()?;
                    self.current_block().stmts.push(Stmt::Return { value, position: *position });
                }
            }

            // `yield e` becomes `return Just<T>(e)` carrying its ordinal.
            syntax::Stmt::Yield { value, position } => {
                if !self.in_generator() {
                    return Err(LowerError::YieldOutsideGenerator { position: *position });
                }
                let value = self.lower_expr(value)?;
                let wrapped = self.just_value(value, *position);
                let counter = self.yield_counters.last_mut().expect("generator context");
                let index = *counter;
                *counter += 1;
                self.current_block()
                    .stmts
                    .push(Stmt::Yield { value: wrapped, index, position: *position });
            }

            syntax::Stmt::Raise { value, position } => {
                let value = self.lower_expr(value)?;
                self.current_block().stmts.push(Stmt::Raise { value, position: *position });
            }

            syntax::Stmt::Try { body, handlers, .. } => {
                let body = self.lower_nested_block(body)?;
                let mut lowered = Vec::with_capacity(handlers.len());
                for handler in handlers {
                    lowered.push(self.lower_handler(handler)?);
                }
                self.current_block().stmts.push(Stmt::Try { body, handlers: lowered });
            }
        }

        Ok(())
    }

    /// Lowers a variable declaration, hoisting generator locals into the
    /// iterator class so they survive suspensions.
    fn lower_var_decl(
        &mut self,
        name: &str,
        ty: &syntax::TypeExpr,
        value: Option<&syntax::Expr>,
        position: Position,
    ) -> Result<(), LowerError> {
        let declared = self.lower_type(ty);

        if let Some(iterator) = self.generator_classes.last().copied() {
            let var = self.table.add_var(VarDecl::attribute(
                position,
                Ident::plain(name.to_string()),
                declared,
                iterator,
            ));
            self.table.class_mut(iterator).block.decls.push(Declaration::Var(var));

            if let Some(value) = value {
                let value = self.lower_expr(value)?;
                // Access goes through the iterator's state object.
                let target = self.var_ref(var, position);
                self.current_block().stmts.push(Stmt::Assign { target, value });
            }
            return Ok(());
        }

        let is_global = self.blocks.len() == 1;
        let mut var = VarDecl::local(position, Ident::plain(name.to_string()), declared);
        var.is_global = is_global;
        let var = self.table.add_var(var);
        self.current_block().decls.push(Declaration::Var(var));

        if let Some(value) = value {
            let value = self.lower_expr(value)?;
            let target = self.var_ref(var, position).as_lvalue();
            self.current_block().stmts.push(Stmt::Assign { target, value });
        }
        Ok(())
    }

    /// Lowers `for v in E: B` into the iterator-driven while loop:
    ///
    /// ```text
    /// r := E.getIterator()
    /// while true:
    ///     _i: Maybe<T> := r.getNext()
    ///     if _i.hasValue():
    ///         v := (_i as Just<T>).getValue()
    ///         B
    ///     else:
    ///         break
    /// ```
    fn lower_for_in(
        &mut self,
        var: &str,
        var_type: &syntax::TypeExpr,
        iterable: &syntax::Expr,
        body: &[syntax::Stmt],
        position: Position,
    ) -> Result<(), LowerError> {
        let element = type_ident(var_type);
        let maybe = Ident::generic("Maybe", vec![element.clone()]);
        let just = Ident::generic("Just", vec![element.clone()]);

        // r := E.getIterator()
        let iterator = self.declare_temp(Type::Infer, position);
        let source = self.lower_expr(iterable)?;
        let get_iterator = self.member_call(source, "getIterator", Vec::new(), Vec::new(), position);
        let target = self.var_ref(iterator, position).as_lvalue();
        self.current_block().stmts.push(Stmt::Assign { target, value: get_iterator });

        // while true:
        self.loop_depth += 1;
        self.blocks.push(Block::new());

        // _i: Maybe<T> := r.getNext()
        let slot = self.declare_temp(Type::Named(maybe), position);
        let receiver = self.var_ref(iterator, position);
        let get_next = self.member_call(receiver, "getNext", Vec::new(), Vec::new(), position);
        let target = self.var_ref(slot, position).as_lvalue();
        self.current_block().stmts.push(Stmt::Assign { target, value: get_next });

        // if _i.hasValue():
        let receiver = self.var_ref(slot, position);
        let condition = self.member_call(receiver, "hasValue", Vec::new(), Vec::new(), position);

        let then_block = {
            self.blocks.push(Block::new());

            // v := (_i as Just<T>).getValue()
            let declared = self.lower_type(var_type);
            let bound = if let Some(iterator_class) = self.generator_classes.last().copied() {
                // Inside a generator body the binding hoists like any local.
                let hoisted = self.table.add_var(VarDecl::attribute(
                    position,
                    Ident::plain(var.to_string()),
                    declared,
                    iterator_class,
                ));
                self.table
                    .class_mut(iterator_class)
                    .block
                    .decls
                    .push(Declaration::Var(hoisted));
                self.var_ref(hoisted, position)
            } else {
                let var = self
                    .table
                    .add_var(VarDecl::local(position, Ident::plain(var.to_string()), declared));
                self.current_block().decls.push(Declaration::Var(var));
                self.var_ref(var, position)
            };

            let slot_ref = self.var_ref(slot, position);
            let cast = Expr::new(
                position,
                ExprKind::Cast { value: Box::new(slot_ref), target: Type::Named(just.clone()) },
                Type::Named(just),
            );
            let value = self.member_call(cast, "getValue", Vec::new(), Vec::new(), position);
            self.current_block().stmts.push(Stmt::Assign { target: bound, value });

            for stmt in body {
                self.lower_stmt(stmt)?;
            }

            self.blocks.pop().expect("for-in then block left open")
        };

        let mut else_block = Block::new();
        else_block.stmts.push(Stmt::Break { position });

        self.current_block().stmts.push(Stmt::If { condition, then_block, else_block });

        let body = self.blocks.pop().expect("for-in loop block left open");
        self.loop_depth -= 1;

        let condition = Expr::new(
            position,
            ExprKind::Literal(Literal::Bool(true)),
            Type::Class(self.core.boolean),
        );
        self.current_block().stmts.push(Stmt::While { condition, body });
        Ok(())
    }

    /// Lowers a try handler clause.
    fn lower_handler(&mut self, handler: &syntax::Handler) -> Result<TryHandler, LowerError> {
        let class = self.lower_type(&handler.ty);

        self.blocks.push(Block::new());
        let binding = handler.name.as_ref().map(|name| {
            let var = self.table.add_var(VarDecl::local(
                handler.position,
                Ident::plain(name.clone()),
                class.clone(),
            ));
            self.current_block().decls.push(Declaration::Var(var));
            var
        });
        for stmt in &handler.body {
            self.lower_stmt(stmt)?;
        }
        let block = self.blocks.pop().expect("handler block left open");

        Ok(TryHandler { class, binding, block })
    }

    /// Lowers a statement list into its own block.
    pub(crate) fn lower_nested_block(&mut self, stmts: &[syntax::Stmt]) -> Result<Block, LowerError> {
        self.blocks.push(Block::new());
        for stmt in stmts {
            self.lower_stmt(stmt)?;
        }
        Ok(self.blocks.pop().expect("nested block left open"))
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    /// Lowers one expression.
    pub(crate) fn lower_expr(&mut self, expr: &syntax::Expr) -> Result<Expr, LowerError> {
        match expr {
            syntax::Expr::Literal { value, position } => {
                let literal = lower_literal(value);
                let class = self.core.for_literal(&literal);
                Ok(Expr::new(*position, ExprKind::Literal(literal), Type::Class(class)))
            }

            syntax::Expr::Array { elements, position } => {
                let mut lowered = Vec::with_capacity(elements.len());
                for element in elements {
                    lowered.push(self.lower_expr(element)?);
                }
                Ok(Expr::new(*position, ExprKind::Array(lowered), Type::Class(self.core.array)))
            }

            syntax::Expr::Name { name, position } => Ok(Expr::new(
                *position,
                ExprKind::Var(VarRef::Named(Ident::plain(name.clone()))),
                Type::Infer,
            )
            .as_lvalue()),

            syntax::Expr::Member { target, member, position } => {
                let target = self.lower_expr(target)?;
                let member = self.lower_expr(member)?;
                let lvalue = matches!(&member.kind, ExprKind::Var(_));
                let mut expr = Expr::new(
                    *position,
                    ExprKind::Member { target: Box::new(target), member: Box::new(member) },
                    Type::Infer,
                );
                expr.lvalue = lvalue;
                Ok(expr)
            }

            syntax::Expr::Call { callee, type_args, args, position } => {
                let generics = type_args.iter().map(type_ident).collect();
                let lowered_args = args
                    .iter()
                    .map(|arg| self.lower_expr(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Expr::new(
                    *position,
                    ExprKind::Call {
                        callee: Callee::Named(Ident::generic(callee.clone(), generics)),
                        type_args: type_args.iter().map(|ty| self.lower_type(ty)).collect(),
                        args: lowered_args,
                    },
                    Type::Infer,
                ))
            }

            syntax::Expr::SelfRef { position } => {
                Ok(Expr::new(*position, ExprKind::SelfRef, Type::Infer))
            }

            syntax::Expr::Parent { ty, position } => {
                let target = self.lower_type(ty);
                Ok(Expr::new(*position, ExprKind::ParentCast(target.clone()), target))
            }

            syntax::Expr::Cast { value, ty, position } => {
                let value = self.lower_expr(value)?;
                let target = self.lower_type(ty);
                Ok(Expr::new(
                    *position,
                    ExprKind::Cast { value: Box::new(value), target: target.clone() },
                    target,
                ))
            }

            syntax::Expr::Is { value, ty, position } => {
                let value = self.lower_expr(value)?;
                let class = self.lower_type(ty);
                Ok(Expr::new(
                    *position,
                    ExprKind::Is { value: Box::new(value), class },
                    Type::Class(self.core.boolean),
                ))
            }

            syntax::Expr::Conditional { condition, then_value, else_value, position } => {
                let condition = self.lower_expr(condition)?;
                let then_value = self.lower_expr(then_value)?;
                let else_value = self.lower_expr(else_value)?;
                Ok(Expr::new(
                    *position,
                    ExprKind::If {
                        condition: Box::new(condition),
                        then_value: Box::new(then_value),
                        else_value: Box::new(else_value),
                    },
                    Type::Infer,
                ))
            }

            // `x ⊕ y` becomes `x._op_(y)`; `a in x` becomes `x._contains_(a)`.
            syntax::Expr::Binary { op, left, right, position } => {
                let (receiver, argument) = match op {
                    BinaryOp::In => (right.as_ref(), left.as_ref()),
                    _ => (left.as_ref(), right.as_ref()),
                };
                let receiver = self.lower_expr(receiver)?;
                let argument = self.lower_expr(argument)?;
                Ok(self.member_call(
                    receiver,
                    binary_method(*op),
                    Vec::new(),
                    vec![argument],
                    *position,
                ))
            }

            // `⊖ x` becomes `x._op_()`.
            syntax::Expr::Unary { op, operand, position } => {
                let receiver = self.lower_expr(operand)?;
                Ok(self.member_call(receiver, unary_method(*op), Vec::new(), Vec::new(), *position))
            }

            syntax::Expr::Lambda { params, return_type, body, position } => {
                self.lower_lambda(params, return_type, body, *position)
            }

            syntax::Expr::ListComprehension { element, element_type, clauses, position } => {
                self.lower_comprehension(element, element_type, clauses, *position)
            }
        }
    }

    // ------------------------------------------------------------------
    // Shared helpers
    // ------------------------------------------------------------------

    /// Returns the block currently receiving declarations and statements.
    pub(crate) fn current_block(&mut self) -> &mut Block {
        self.blocks.last_mut().expect("no open block")
    }

    /// Returns true while lowering a generator body.
    pub(crate) fn in_generator(&self) -> bool { !self.generator_returns.is_empty() }

    fn current_function_returns_value(&self) -> bool {
        matches!(
            self.function_context.last(),
            Some((_, Some(ty))) if *ty != Type::Void
        )
    }

    /// Declares a fresh temporary in the current block. Inside a generator
    /// body the temporary hoists into the iterator class instead, so it
    /// survives suspensions like any other generator local.
    pub(crate) fn declare_temp(&mut self, declared: Type, position: Position) -> VarId {
        let ident = self.temps.fresh();
        if let Some(iterator) = self.generator_classes.last().copied() {
            let var = self.table.add_var(VarDecl::attribute(position, ident, declared, iterator));
            self.table.class_mut(iterator).block.decls.push(Declaration::Var(var));
            return var;
        }

        let var = self.table.add_var(VarDecl::local(position, ident, declared));
        self.current_block().decls.push(Declaration::Var(var));
        var
    }

    /// Builds a resolved reference to a variable declaration.
    pub(crate) fn var_ref(&self, var: VarId, position: Position) -> Expr {
        let declared = self.table.var(var).declared_type.clone();
        Expr::new(position, ExprKind::Var(VarRef::Decl(var)), declared).as_lvalue()
    }

    /// Builds `target.name(args)` with an unresolved callee.
    pub(crate) fn member_call(
        &self,
        target: Expr,
        name: &str,
        type_args: Vec<Type>,
        args: Vec<Expr>,
        position: Position,
    ) -> Expr {
        let call = Expr::new(
            position,
            ExprKind::Call { callee: Callee::Named(Ident::plain(name)), type_args, args },
            Type::Infer,
        );
        Expr::new(
            position,
            ExprKind::Member { target: Box::new(target), member: Box::new(call) },
            Type::Infer,
        )
    }

    /// Builds `Just<T>(value)` for the current generator element type.
    pub(crate) fn just_value(&mut self, value: Expr, position: Position) -> Expr {
        let element = type_ident(self.generator_returns.last().expect("generator context"));
        let ident = Ident::generic("Just", vec![element]);
        Expr::new(
            position,
            ExprKind::Call {
                callee: Callee::Named(ident.clone()),
                type_args: Vec::new(),
                args: vec![value],
            },
            Type::Named(ident),
        )
    }

    /// Builds `Nothing<T>()` for the current generator element type.
    pub(crate) fn nothing_value(&mut self, position: Position) -> Expr {
        let element = type_ident(self.generator_returns.last().expect("generator context"));
        let ident = Ident::generic("Nothing", vec![element]);
        Expr::new(
            position,
            ExprKind::Call {
                callee: Callee::Named(ident.clone()),
                type_args: Vec::new(),
                args: Vec::new(),
            },
            Type::Named(ident),
        )
    }

    /// Lowers a textual type reference, resolving plain core-class names
    /// immediately and leaving the rest for the resolver.
    pub(crate) fn lower_type(&self, ty: &syntax::TypeExpr) -> Type {
        if ty.args.is_empty()
            && let Some(core) = self.core.find(&ty.name)
        {
            return Type::Class(core);
        }
        Type::Named(type_ident(ty))
    }
}

/// Converts a textual type reference into an identifier tree.
pub(crate) fn type_ident(ty: &syntax::TypeExpr) -> Ident {
    Ident::generic(ty.name.clone(), ty.args.iter().map(type_ident).collect())
}

/// Converts a surface literal into an AST literal.
fn lower_literal(literal: &syntax::Literal) -> Literal {
    match literal {
        syntax::Literal::Int(value) => Literal::Int(*value),
        syntax::Literal::Float(value) => Literal::Float(*value),
        syntax::Literal::Bool(value) => Literal::Bool(*value),
        syntax::Literal::Char(value) => Literal::Char(*value),
        syntax::Literal::Str(value) => Literal::Str(value.clone()),
    }
}

/// Applies the package-access default of class bodies.
fn lower_access(access: Option<ladon_syntax::ops::AccessSpec>) -> ladon_ast::decl::Access {
    use ladon_ast::decl::Access;
    use ladon_syntax::ops::AccessSpec;

    match access {
        Some(AccessSpec::Public) => Access::Public,
        Some(AccessSpec::Protected) => Access::Protected,
        Some(AccessSpec::Package) | None => Access::Package,
        Some(AccessSpec::Private) => Access::Private,
    }
}
