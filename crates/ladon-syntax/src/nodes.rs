//! Parse tree nodes as produced by the parser.
//!
//! All nodes are owned enum trees carrying a [`Position`]. The parser is an
//! external collaborator; the builder in `ladon-lower` is the only consumer.

use ladon_source::types::Position;

use crate::ops::{AccessSpec, BinaryOp, UnaryOp};

/// Literal value in the parse tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Integer literal (e.g. `42`)
    Int(i64),
    /// Floating point literal (e.g. `3.14`)
    Float(f64),
    /// Boolean literal (`true` / `false`)
    Bool(bool),
    /// Character literal (e.g. `'a'`)
    Char(char),
    /// String literal (e.g. `"hello"`)
    Str(String),
}

/// A textual type reference (e.g. `Int`, `Array<String>`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeExpr {
    /// The type name
    pub name: String,
    /// Generic arguments, if any
    pub args: Vec<TypeExpr>,
    /// Source position
    pub position: Position,
}

impl TypeExpr {
    /// Creates a plain (non-generic) type reference.
    #[must_use]
    pub const fn plain(name: String, position: Position) -> Self {
        Self { name, args: Vec::new(), position }
    }
}

/// A formal parameter of a function, method, or lambda.
#[derive(Debug, Clone)]
pub struct Param {
    /// The parameter name
    pub name: String,
    /// The declared parameter type
    pub ty: TypeExpr,
    /// The default value expression, if any
    pub default: Option<Expr>,
    /// Source position
    pub position: Position,
}

/// Expression in the parse tree.
#[derive(Debug, Clone)]
pub enum Expr {
    /// Literal value
    Literal {
        /// The literal value
        value: Literal,
        /// Source position
        position: Position,
    },
    /// Array literal (e.g. `[1, 2, 3]`)
    Array {
        /// The element expressions in source order
        elements: Vec<Expr>,
        /// Source position
        position: Position,
    },
    /// A plain name reference
    Name {
        /// The referenced name
        name: String,
        /// Source position
        position: Position,
    },
    /// Member access (e.g. `obj.attr`, `obj.method(x)`)
    Member {
        /// The accessed object
        target: Box<Expr>,
        /// The member expression (a name or a call)
        member: Box<Expr>,
        /// Source position
        position: Position,
    },
    /// Function or initializer call (e.g. `f(a, b)`, `Int(3)`)
    Call {
        /// The called name
        callee: String,
        /// Generic arguments on the callee, if any (e.g. `Just<Int>(x)`)
        type_args: Vec<TypeExpr>,
        /// The argument expressions in source order
        args: Vec<Expr>,
        /// Source position
        position: Position,
    },
    /// The receiver reference `self`
    SelfRef {
        /// Source position
        position: Position,
    },
    /// A supertype view of the receiver (e.g. `parent(Base)`)
    Parent {
        /// The named supertype
        ty: TypeExpr,
        /// Source position
        position: Position,
    },
    /// Checked cast (e.g. `x as Just<Int>`)
    Cast {
        /// The value being cast
        value: Box<Expr>,
        /// The target type
        ty: TypeExpr,
        /// Source position
        position: Position,
    },
    /// Class identity test (e.g. `x is Int`)
    Is {
        /// The value being tested
        value: Box<Expr>,
        /// The tested type
        ty: TypeExpr,
        /// Source position
        position: Position,
    },
    /// Conditional expression (e.g. `a if c else b`)
    Conditional {
        /// The condition
        condition: Box<Expr>,
        /// Value when the condition holds
        then_value: Box<Expr>,
        /// Value otherwise
        else_value: Box<Expr>,
        /// Source position
        position: Position,
    },
    /// Binary operator expression (e.g. `a + b`, `a in xs`)
    Binary {
        /// The operator
        op: BinaryOp,
        /// Left operand
        left: Box<Expr>,
        /// Right operand
        right: Box<Expr>,
        /// Source position
        position: Position,
    },
    /// Unary operator expression (e.g. `-a`, `not b`)
    Unary {
        /// The operator
        op: UnaryOp,
        /// The operand
        operand: Box<Expr>,
        /// Source position
        position: Position,
    },
    /// Lambda expression (e.g. `lambda (x: Int) -> Int: x + 1`)
    Lambda {
        /// The lambda parameters
        params: Vec<Param>,
        /// The declared result type
        return_type: TypeExpr,
        /// The body expression
        body: Box<Expr>,
        /// Source position
        position: Position,
    },
    /// List comprehension (e.g. `[x * x for x in xs if x != 1]`)
    ListComprehension {
        /// The element expression
        element: Box<Expr>,
        /// The declared element type
        element_type: TypeExpr,
        /// The `for` / `if` clause chain, outermost first
        clauses: Vec<CompClause>,
        /// Source position
        position: Position,
    },
}

impl Expr {
    /// Returns the source position of this expression.
    #[must_use]
    pub const fn position(&self) -> Position {
        match self {
            Self::Literal { position, .. }
            | Self::Array { position, .. }
            | Self::Name { position, .. }
            | Self::Member { position, .. }
            | Self::Call { position, .. }
            | Self::SelfRef { position }
            | Self::Parent { position, .. }
            | Self::Cast { position, .. }
            | Self::Is { position, .. }
            | Self::Conditional { position, .. }
            | Self::Binary { position, .. }
            | Self::Unary { position, .. }
            | Self::Lambda { position, .. }
            | Self::ListComprehension { position, .. } => *position,
        }
    }
}

/// One clause of a list comprehension.
#[derive(Debug, Clone)]
pub enum CompClause {
    /// A `for name: T in iterable` clause
    For {
        /// The bound variable name
        var: String,
        /// The declared variable type
        var_type: TypeExpr,
        /// The iterated expression
        iterable: Expr,
    },
    /// An `if condition` filter clause
    If {
        /// The filter condition
        condition: Expr,
    },
}

/// Statement in the parse tree.
#[derive(Debug, Clone)]
pub enum Stmt {
    /// Expression used as a statement (a call, per the grammar)
    Expr {
        /// The expression
        expr: Expr,
        /// Source position
        position: Position,
    },
    /// Plain assignment (`a := b`)
    Assign {
        /// The assignment target
        target: Expr,
        /// The assigned value
        value: Expr,
        /// Source position
        position: Position,
    },
    /// Compound assignment (`a += b` and friends)
    CompoundAssign {
        /// The assignment target
        target: Expr,
        /// The combining operator
        op: BinaryOp,
        /// The right operand
        value: Expr,
        /// Source position
        position: Position,
    },
    /// Unpacking assignment (`a, b := pair()`)
    Unpack {
        /// The assignment targets in source order
        targets: Vec<Expr>,
        /// The unpacked value
        value: Expr,
        /// Source position
        position: Position,
    },
    /// Variable declaration (`x: Int := 3`)
    VarDecl {
        /// The variable name
        name: String,
        /// The declared type
        ty: TypeExpr,
        /// The initial value, if any
        value: Option<Expr>,
        /// Source position
        position: Position,
    },
    /// Conditional statement
    If {
        /// The condition
        condition: Expr,
        /// Statements of the `then` branch
        then_body: Vec<Stmt>,
        /// Statements of the `else` branch (empty when absent)
        else_body: Vec<Stmt>,
        /// Source position
        position: Position,
    },
    /// While loop
    While {
        /// The loop condition
        condition: Expr,
        /// The loop body
        body: Vec<Stmt>,
        /// Source position
        position: Position,
    },
    /// For-in loop (`for v: T in e: body`)
    ForIn {
        /// The bound variable name
        var: String,
        /// The declared variable type
        var_type: TypeExpr,
        /// The iterated expression
        iterable: Expr,
        /// The loop body
        body: Vec<Stmt>,
        /// Source position
        position: Position,
    },
    /// Break out of the enclosing loop
    Break {
        /// Source position
        position: Position,
    },
    /// Skip to the next iteration of the enclosing loop
    Skip {
        /// Source position
        position: Position,
    },
    /// Return from the enclosing function
    Return {
        /// The returned value, if any
        value: Option<Expr>,
        /// Source position
        position: Position,
    },
    /// Yield from the enclosing generator
    Yield {
        /// The yielded value
        value: Expr,
        /// Source position
        position: Position,
    },
    /// Raise an error value
    Raise {
        /// The raised value
        value: Expr,
        /// Source position
        position: Position,
    },
    /// Try statement with handlers
    Try {
        /// The guarded statements
        body: Vec<Stmt>,
        /// The handler clauses
        handlers: Vec<Handler>,
        /// Source position
        position: Position,
    },
}

/// A handler clause of a try statement.
#[derive(Debug, Clone)]
pub struct Handler {
    /// The handled type
    pub ty: TypeExpr,
    /// The name binding the handled value, if any
    pub name: Option<String>,
    /// The handler body
    pub body: Vec<Stmt>,
    /// Source position
    pub position: Position,
}

/// A class member in the parse tree.
#[derive(Debug, Clone)]
pub enum Member {
    /// An attribute declaration
    Attribute {
        /// The attribute name
        name: String,
        /// The declared attribute type
        ty: TypeExpr,
        /// The access modifier, if written
        access: Option<AccessSpec>,
        /// Source position
        position: Position,
    },
    /// A method or initializer (initializers are named `__init__`)
    Method(FunctionItem),
}

/// A function, method, or generator in the parse tree.
///
/// The parser marks `is_generator` when the body contains a yield statement.
#[derive(Debug, Clone)]
pub struct FunctionItem {
    /// The function name
    pub name: String,
    /// The formal parameters
    pub params: Vec<Param>,
    /// The declared return type (absent for procedures)
    pub return_type: Option<TypeExpr>,
    /// The function body
    pub body: Vec<Stmt>,
    /// Whether the function is abstract (empty body, no emission)
    pub is_abstract: bool,
    /// Whether the body contains yield statements
    pub is_generator: bool,
    /// The access modifier, if written
    pub access: Option<AccessSpec>,
    /// Source position
    pub position: Position,
}

/// A class declaration in the parse tree.
#[derive(Debug, Clone)]
pub struct ClassItem {
    /// The class name
    pub name: String,
    /// Formal generic type parameter names, if any
    pub type_params: Vec<String>,
    /// The named superclasses
    pub bases: Vec<TypeExpr>,
    /// Whether the class is abstract
    pub is_abstract: bool,
    /// The class members in source order
    pub members: Vec<Member>,
    /// The access modifier, if written
    pub access: Option<AccessSpec>,
    /// Source position
    pub position: Position,
}

/// A module import.
#[derive(Debug, Clone)]
pub struct Import {
    /// The imported module name
    pub module: String,
    /// Source position
    pub position: Position,
}

/// A top-level item of a module.
#[derive(Debug, Clone)]
pub enum Item {
    /// A class declaration
    Class(ClassItem),
    /// An unbound function declaration
    Function(FunctionItem),
    /// A top-level statement
    Statement(Stmt),
}

/// A parsed source module.
#[derive(Debug, Clone)]
pub struct SourceModule {
    /// The module name
    pub name: String,
    /// The module imports
    pub imports: Vec<Import>,
    /// The top-level items in source order
    pub items: Vec<Item>,
    /// Whether the module is native (bodies declared, not emitted)
    pub is_native: bool,
    /// Source position
    pub position: Position,
}
