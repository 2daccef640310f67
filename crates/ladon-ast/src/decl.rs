//! Declarations and the declaration arena.
//!
//! All declarations of a compilation live in a [`DeclTable`] and are
//! referenced through typed indices. The arena owns the declarations;
//! "enclosing class" and "defining class" queries go through stored ids.
//! Variations, the monomorphic clones of generic classes, are appended to the
//! arena during typing and are the only post-resolution mutation the AST
//! sees.

use std::fmt;

use indexmap::IndexMap;
use ladon_source::types::Position;

use crate::ident::Ident;
use crate::stmt::Stmt;
use crate::types::Type;

// ============================================================================
// Typed indices
// ============================================================================

macro_rules! decl_index {
    ($(#[$doc:meta])* $name:ident, $prefix:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(u32);

        impl $name {
            /// Creates an index with the given raw value.
            #[must_use]
            pub const fn new(index: u32) -> Self { Self(index) }

            /// Returns the raw index value.
            #[must_use]
            pub const fn index(&self) -> usize { self.0 as usize }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, ":{}"), self.0)
            }
        }
    };
}

decl_index!(
    /// Index of a [`ClassDecl`] in the arena.
    ClassId,
    "class"
);
decl_index!(
    /// Index of a [`FunctionDecl`] in the arena.
    FunctionId,
    "fn"
);
decl_index!(
    /// Index of a [`VarDecl`] in the arena.
    VarId,
    "var"
);
decl_index!(
    /// Index of a [`Variation`] in the arena.
    VariationId,
    "variation"
);

// ============================================================================
// Modifiers and kinds
// ============================================================================

/// Access modifier of a declaration.
///
/// The default inside classes is `Package`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Access {
    /// Visible everywhere
    Public,
    /// Visible to the class and its subclasses
    Protected,
    /// Visible within the package
    #[default]
    Package,
    /// Visible within the class
    Private,
}

/// The declaration kind of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarKind {
    /// A local variable
    Variable,
    /// A formal parameter
    Parameter,
    /// A class attribute
    Attribute,
}

/// The declaration kind of a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionKind {
    /// A top-level function, not bound to a class
    Unbound,
    /// A method of a class
    Method,
    /// An initializer of a class
    Initializer,
}

// ============================================================================
// Blocks
// ============================================================================

/// A declaration entry of a block, in source order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Declaration {
    /// A variable declaration
    Var(VarId),
    /// A function declaration
    Function(FunctionId),
    /// A class declaration
    Class(ClassId),
}

/// A lexical block: declarations followed by statements, both ordered.
#[derive(Debug, Clone, Default)]
pub struct Block {
    /// The declarations of the block, in source order
    pub decls: Vec<Declaration>,
    /// The statements of the block, in source order
    pub stmts: Vec<Stmt>,
}

impl Block {
    /// Creates an empty block.
    #[must_use]
    pub const fn new() -> Self { Self { decls: Vec::new(), stmts: Vec::new() } }

    /// Returns the variable declarations of the block, in order.
    pub fn vars(&self) -> impl Iterator<Item = VarId> + '_ {
        self.decls.iter().filter_map(|decl| match decl {
            Declaration::Var(var) => Some(*var),
            _ => None,
        })
    }

    /// Returns the function declarations of the block, in order.
    pub fn functions(&self) -> impl Iterator<Item = FunctionId> + '_ {
        self.decls.iter().filter_map(|decl| match decl {
            Declaration::Function(function) => Some(*function),
            _ => None,
        })
    }

    /// Returns the class declarations of the block, in order.
    pub fn classes(&self) -> impl Iterator<Item = ClassId> + '_ {
        self.decls.iter().filter_map(|decl| match decl {
            Declaration::Class(class) => Some(*class),
            _ => None,
        })
    }
}

// ============================================================================
// Declarations
// ============================================================================

/// A variable declaration: local, parameter, or attribute.
#[derive(Debug, Clone)]
pub struct VarDecl {
    /// Source position
    pub position: Position,
    /// The declared name
    pub ident: Ident,
    /// Access modifier (attributes only; default package)
    pub access: Access,
    /// The declared type
    pub declared_type: Type,
    /// The declaration kind
    pub kind: VarKind,
    /// Whether this is a module-level global
    pub is_global: bool,
    /// Stable per-class slot, assigned once for attributes
    pub attribute_index: Option<u32>,
    /// The defining class, for attributes
    pub owner: Option<ClassId>,
}

impl VarDecl {
    /// Creates a local variable declaration.
    #[must_use]
    pub fn local(position: Position, ident: Ident, declared_type: Type) -> Self {
        Self {
            position,
            ident,
            access: Access::default(),
            declared_type,
            kind: VarKind::Variable,
            is_global: false,
            attribute_index: None,
            owner: None,
        }
    }

    /// Creates a parameter declaration.
    #[must_use]
    pub fn parameter(position: Position, ident: Ident, declared_type: Type) -> Self {
        Self { kind: VarKind::Parameter, ..Self::local(position, ident, declared_type) }
    }

    /// Creates an attribute declaration owned by `owner`.
    #[must_use]
    pub fn attribute(position: Position, ident: Ident, declared_type: Type, owner: ClassId) -> Self {
        Self {
            kind: VarKind::Attribute,
            owner: Some(owner),
            ..Self::local(position, ident, declared_type)
        }
    }
}

/// A function declaration: unbound function, method, or initializer.
///
/// An initializer returns no value. An abstract function has an empty body
/// and is emitted as a stub returning the zero of its declared type.
/// Default-argument variants are synthesized as additional declarations that
/// forward to the maximal-arity version.
#[derive(Debug, Clone)]
pub struct FunctionDecl {
    /// Source position
    pub position: Position,
    /// The declared name
    pub ident: Ident,
    /// Access modifier
    pub access: Access,
    /// The formal parameters, excluding the receiver
    pub params: Vec<VarId>,
    /// The function body
    pub body: Block,
    /// The declared return type; absent for procedures
    pub return_type: Option<Type>,
    /// The declaration kind
    pub kind: FunctionKind,
    /// The defining class for methods and initializers
    pub owner: Option<ClassId>,
    /// Whether the function is abstract
    pub is_abstract: bool,
    /// Whether the function body lives in a native module
    pub is_native: bool,
    /// Whether this is the zero-argument default initializer
    pub is_default_initializer: bool,
    /// Number of yield statements; non-zero marks a generator body
    pub yield_count: usize,
}

impl FunctionDecl {
    /// Creates an unbound function declaration.
    #[must_use]
    pub fn unbound(position: Position, ident: Ident, return_type: Option<Type>) -> Self {
        Self {
            position,
            ident,
            access: Access::default(),
            params: Vec::new(),
            body: Block::new(),
            return_type,
            kind: FunctionKind::Unbound,
            owner: None,
            is_abstract: false,
            is_native: false,
            is_default_initializer: false,
            yield_count: 0,
        }
    }

    /// Creates a method declaration owned by `owner`.
    #[must_use]
    pub fn method(
        position: Position,
        ident: Ident,
        owner: ClassId,
        return_type: Option<Type>,
    ) -> Self {
        Self {
            kind: FunctionKind::Method,
            owner: Some(owner),
            ..Self::unbound(position, ident, return_type)
        }
    }

    /// Creates an initializer declaration owned by `owner`.
    #[must_use]
    pub fn initializer(position: Position, owner: ClassId) -> Self {
        Self {
            kind: FunctionKind::Initializer,
            owner: Some(owner),
            ..Self::unbound(position, Ident::plain("__init__"), None)
        }
    }

    /// Returns true if the function produces a value.
    #[must_use]
    pub const fn has_return_value(&self) -> bool {
        matches!(&self.return_type, Some(ty) if !matches!(ty, Type::Void))
    }

    /// Returns true if this declaration is a generator body.
    #[must_use]
    pub const fn is_generator_body(&self) -> bool { self.yield_count > 0 }
}

/// A class declaration.
///
/// A class with non-empty `type_params` is a generic template: it emits no
/// code directly, only its variations do. A generator class owns exactly one
/// generator-iterator class, recorded in `generator_iterator`; the iterator
/// itself carries `is_generator`.
#[derive(Debug, Clone)]
pub struct ClassDecl {
    /// Source position
    pub position: Position,
    /// The declared name
    pub ident: Ident,
    /// Access modifier
    pub access: Access,
    /// The named superclasses as written
    pub supers: Vec<Ident>,
    /// The superclasses after resolution, in declaration order
    pub resolved_supers: Vec<ClassId>,
    /// The class body: attribute, initializer, and method declarations
    pub block: Block,
    /// Whether the class is abstract
    pub is_abstract: bool,
    /// Formal generic type parameters
    pub type_params: Vec<Ident>,
    /// Monomorphic variations, in discovery order
    pub variations: Vec<VariationId>,
    /// Whether this class is a generator iterator (owns the yield state)
    pub is_generator: bool,
    /// Whether this class wraps a function as a first-class value
    pub is_function_wrapper: bool,
    /// The iterator class of a generator factory class
    pub generator_iterator: Option<ClassId>,
}

impl ClassDecl {
    /// Creates a plain class declaration.
    #[must_use]
    pub fn new(position: Position, ident: Ident) -> Self {
        Self {
            position,
            ident,
            access: Access::default(),
            supers: Vec::new(),
            resolved_supers: Vec::new(),
            block: Block::new(),
            is_abstract: false,
            type_params: Vec::new(),
            variations: Vec::new(),
            is_generator: false,
            is_function_wrapper: false,
            generator_iterator: None,
        }
    }

    /// Returns true if this class is a generic template.
    #[must_use]
    pub fn is_generic(&self) -> bool { !self.type_params.is_empty() }
}

/// A monomorphic variation of a generic class.
///
/// The variation shares identity with its template for lookup but has its
/// own layout and mangled symbols. `args[i]` substitutes the template's
/// `type_params[i]`.
#[derive(Debug, Clone)]
pub struct Variation {
    /// The generic template class
    pub template: ClassId,
    /// The concrete substitution, one type per formal parameter
    pub args: Vec<Type>,
}

/// A module declaration.
#[derive(Debug, Clone)]
pub struct ModuleDecl {
    /// Source position
    pub position: Position,
    /// The module name
    pub ident: Ident,
    /// Imported module names
    pub imports: Vec<Ident>,
    /// The top-level block
    pub block: Block,
    /// Whether bodies are declared but not emitted
    pub is_native: bool,
}

impl ModuleDecl {
    /// Creates an empty module declaration.
    #[must_use]
    pub fn new(position: Position, ident: Ident) -> Self {
        Self { position, ident, imports: Vec::new(), block: Block::new(), is_native: false }
    }
}

/// A package: a grouping of modules.
#[derive(Debug, Clone)]
pub struct Package {
    /// The package name
    pub ident: Ident,
    /// The modules of the package, in compilation order
    pub modules: Vec<ModuleDecl>,
    /// Whether the whole package is native
    pub is_native: bool,
}

impl Package {
    /// Creates an empty package.
    #[must_use]
    pub fn new(ident: Ident) -> Self { Self { ident, modules: Vec::new(), is_native: false } }
}

// ============================================================================
// Arena
// ============================================================================

/// The declaration arena of one compilation.
///
/// Declarations are appended during AST building and typing and never
/// removed; indices stay valid for the lifetime of the table.
#[derive(Debug, Default)]
pub struct DeclTable {
    classes: Vec<ClassDecl>,
    functions: Vec<FunctionDecl>,
    vars: Vec<VarDecl>,
    variations: Vec<Variation>,
    /// One variation per concrete substitution, in discovery order.
    variation_index: IndexMap<(ClassId, Vec<Type>), VariationId>,
}

impl DeclTable {
    /// Creates an empty declaration table.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Adds a class declaration and returns its index.
    pub fn add_class(&mut self, class: ClassDecl) -> ClassId {
        let id = ClassId::new(self.classes.len() as u32);
        self.classes.push(class);
        id
    }

    /// Adds a function declaration and returns its index.
    pub fn add_function(&mut self, function: FunctionDecl) -> FunctionId {
        let id = FunctionId::new(self.functions.len() as u32);
        self.functions.push(function);
        id
    }

    /// Adds a variable declaration and returns its index.
    pub fn add_var(&mut self, var: VarDecl) -> VarId {
        let id = VarId::new(self.vars.len() as u32);
        self.vars.push(var);
        id
    }

    /// Records a variation of a generic class and returns its index.
    ///
    /// Substitutions dedupe: registering the same template and argument
    /// list twice returns the first index. New variations append to the
    /// template's variation list, so emission order follows discovery
    /// order.
    pub fn add_variation(&mut self, variation: Variation) -> VariationId {
        let key = (variation.template, variation.args.clone());
        if let Some(existing) = self.variation_index.get(&key) {
            return *existing;
        }

        let id = VariationId::new(self.variations.len() as u32);
        let template = variation.template;
        self.variations.push(variation);
        self.classes[template.index()].variations.push(id);
        drop(self.variation_index.insert(key, id));
        id
    }

    /// Looks up the variation registered for a substitution, if any.
    #[must_use]
    pub fn find_variation(&self, template: ClassId, args: &[Type]) -> Option<VariationId> {
        self.variation_index.get(&(template, args.to_vec())).copied()
    }

    /// Returns the class with the given index.
    #[must_use]
    pub fn class(&self, id: ClassId) -> &ClassDecl { &self.classes[id.index()] }

    /// Returns a mutable reference to the class with the given index.
    pub fn class_mut(&mut self, id: ClassId) -> &mut ClassDecl { &mut self.classes[id.index()] }

    /// Returns the function with the given index.
    #[must_use]
    pub fn function(&self, id: FunctionId) -> &FunctionDecl { &self.functions[id.index()] }

    /// Returns a mutable reference to the function with the given index.
    pub fn function_mut(&mut self, id: FunctionId) -> &mut FunctionDecl {
        &mut self.functions[id.index()]
    }

    /// Returns the variable with the given index.
    #[must_use]
    pub fn var(&self, id: VarId) -> &VarDecl { &self.vars[id.index()] }

    /// Returns a mutable reference to the variable with the given index.
    pub fn var_mut(&mut self, id: VarId) -> &mut VarDecl { &mut self.vars[id.index()] }

    /// Returns the variation with the given index.
    #[must_use]
    pub fn variation(&self, id: VariationId) -> &Variation { &self.variations[id.index()] }

    /// Returns the number of classes in the arena.
    #[must_use]
    pub fn class_count(&self) -> usize { self.classes.len() }

    /// Iterates over all classes with their indices.
    pub fn classes(&self) -> impl Iterator<Item = (ClassId, &ClassDecl)> {
        self.classes.iter().enumerate().map(|(index, class)| (ClassId::new(index as u32), class))
    }

    /// Looks up a method by name on a class, searching superclasses
    /// breadth-first. Returns the first match.
    #[must_use]
    pub fn find_method(&self, class: ClassId, name: &str) -> Option<FunctionId> {
        let mut frontier = vec![class];

        while !frontier.is_empty() {
            let mut next = Vec::new();
            for current in frontier {
                let decl = self.class(current);
                for function in decl.block.functions() {
                    if self.function(function).ident.name == name {
                        return Some(function);
                    }
                }
                next.extend_from_slice(&decl.resolved_supers);
            }
            frontier = next;
        }

        None
    }

    /// Returns the zero-argument default initializer of a class, if declared.
    #[must_use]
    pub fn default_initializer(&self, class: ClassId) -> Option<FunctionId> {
        self.class(class)
            .block
            .functions()
            .find(|function| self.function(*function).is_default_initializer)
    }

    /// Computes the minimum hop count from `from` to `to` along the
    /// superclass graph. Zero when the classes are identical, `None` when
    /// `to` is not reachable.
    #[must_use]
    pub fn superclass_distance(&self, from: ClassId, to: ClassId) -> Option<u32> {
        let mut hops = 0;
        let mut frontier = vec![from];
        let mut visited = vec![false; self.classes.len()];

        while !frontier.is_empty() {
            let mut next = Vec::new();
            for current in frontier {
                if current == to {
                    return Some(hops);
                }
                if visited[current.index()] {
                    continue;
                }
                visited[current.index()] = true;
                next.extend_from_slice(&self.class(current).resolved_supers);
            }
            frontier = next;
            hops += 1;
        }

        None
    }

    /// Returns the number of attribute slots a class occupies, including
    /// slots inherited from its superclasses.
    #[must_use]
    pub fn attribute_count(&self, class: ClassId) -> usize {
        let decl = self.class(class);
        let inherited: usize =
            decl.resolved_supers.iter().map(|base| self.attribute_count(*base)).sum();
        inherited + decl.block.vars().count()
    }

    /// Assigns dense attribute indices to a class's own attributes, starting
    /// after the inherited slots. Indices are stable per class; calling this
    /// twice is a no-op for already-numbered attributes.
    ///
    /// Generator iterators declare their indirect-branch target as the first
    /// attribute, so it receives index 0.
    pub fn assign_attribute_indices(&mut self, class: ClassId) {
        let decl = self.class(class);
        let first_free: usize =
            decl.resolved_supers.iter().map(|base| self.attribute_count(*base)).sum();
        let attributes: Vec<VarId> = decl.block.vars().collect();

        for (offset, var) in attributes.into_iter().enumerate() {
            let var = self.var_mut(var);
            if var.attribute_index.is_none() {
                var.attribute_index = Some((first_free + offset) as u32);
            }
        }
    }
}
