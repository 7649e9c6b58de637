//! Abstract syntax tree for mlscript.
//!
//! Nodes are purely structural and immutable once the parser hands them
//! out.  Function and class definitions are reference counted so the
//! interpreter can keep them in its tables after the parse unit that
//! produced them has been dropped.

use std::fmt;
use std::rc::Rc;

/// A literal constant that appears directly in the source code.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Integer(i64),
    Float(f64),
    Str(String),
    Bool(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Pos,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    In,
    NotIn,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Less => "<",
            BinaryOp::LessEqual => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::In => "in",
            BinaryOp::NotIn => "not in",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Every kind of *expression*.  Variants that can fail at runtime carry the
/// source line of the token that introduced them.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal {
        value: Literal,
        line: usize,
    },

    /// `[a, b, c]`
    List {
        elements: Vec<Expr>,
        line: usize,
    },

    /// `{k: v, ...}`
    Dict {
        pairs: Vec<(Expr, Expr)>,
        line: usize,
    },

    /// `()`, `(a,)`, `(a, b)`
    Tuple {
        elements: Vec<Expr>,
        line: usize,
    },

    Variable {
        name: String,
        line: usize,
    },

    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        line: usize,
    },

    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
        line: usize,
    },

    /// `object.name`
    Attribute {
        object: Box<Expr>,
        name: String,
        line: usize,
    },

    /// `object[i]` or `object[i, j, ...]`; several components are packed
    /// into a tuple at runtime.
    Index {
        object: Box<Expr>,
        indices: Vec<Expr>,
        line: usize,
    },

    /// `start:stop:step` inside an index; every part is optional.
    Slice {
        start: Option<Box<Expr>>,
        stop: Option<Box<Expr>>,
        step: Option<Box<Expr>>,
        line: usize,
    },

    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
        kwargs: Vec<(String, Expr)>,
        line: usize,
    },

    Super {
        line: usize,
    },

    /// Declarative `network { ... }` model block.
    Network(Box<NetworkDef>),
}

impl Expr {
    pub fn line(&self) -> usize {
        match self {
            Expr::Literal { line, .. }
            | Expr::List { line, .. }
            | Expr::Dict { line, .. }
            | Expr::Tuple { line, .. }
            | Expr::Variable { line, .. }
            | Expr::Unary { line, .. }
            | Expr::Binary { line, .. }
            | Expr::Attribute { line, .. }
            | Expr::Index { line, .. }
            | Expr::Slice { line, .. }
            | Expr::Call { line, .. }
            | Expr::Super { line } => *line,
            Expr::Network(def) => def.line,
        }
    }
}

/// One formal parameter: a name and an optional default expression,
/// evaluated lazily in the callee's frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub default: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDef {
    pub name: String,
    /// Parent expressions in declaration order (local precedence).
    pub parents: Vec<Expr>,
    pub methods: Vec<Rc<FunctionDef>>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
    pub variable: String,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NetworkDef {
    pub input: Expr,
    pub layers: Expr,
    pub optimizer: Expr,
    pub loss: Expr,
    pub line: usize,
}

/// **Abstract‑Syntax‑Tree node** for *statements*.  A program is a sequence
/// of these nodes returned by [`crate::parser::Parser::parse`].
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// Bare expression evaluated for its side effects (and its value at the
    /// top level).
    Expression(Expr),

    Print {
        values: Vec<Expr>,
        line: usize,
    },

    Assign {
        name: String,
        value: Expr,
        line: usize,
    },

    AttributeAssign {
        object: Expr,
        name: String,
        value: Expr,
        line: usize,
    },

    IndexAssign {
        object: Expr,
        indices: Vec<Expr>,
        value: Expr,
        line: usize,
    },

    /// Braced statement list.  Blocks do not open a scope frame.
    Block(Vec<Stmt>),

    /// `elif` chains are encoded by an `If` in `else_branch`.
    If {
        condition: Expr,
        then_branch: Vec<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },

    While {
        condition: Expr,
        body: Vec<Stmt>,
    },

    For {
        variable: String,
        iterable: Expr,
        body: Vec<Stmt>,
        line: usize,
    },

    Function(Rc<FunctionDef>),

    Return {
        value: Option<Expr>,
        line: usize,
    },

    Break {
        line: usize,
    },

    Continue {
        line: usize,
    },

    Class(Rc<ClassDef>),

    Throw {
        value: Expr,
        line: usize,
    },

    Try {
        body: Vec<Stmt>,
        catch: Option<CatchClause>,
        finally: Option<Vec<Stmt>>,
        line: usize,
    },

    With {
        context: Expr,
        body: Vec<Stmt>,
        line: usize,
    },

    Import {
        module: String,
        alias: String,
        line: usize,
    },
}
