use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::stmt::Stmt;

/// Identity of a variable‑reference site (`Variable`, `Assign`, `This`).
///
/// The resolver keys its distances by this id rather than by name, since the
/// same name appears at many unrelated sites.  Ids are unique for the whole
/// process so programs parsed at different times (REPL lines) never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExprId(usize);

static NEXT_EXPR_ID: AtomicUsize = AtomicUsize::new(0);

impl ExprId {
    pub fn fresh() -> Self {
        ExprId(NEXT_EXPR_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A name as written in the source, detached from the token buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Identifier {
    pub name: String,
    pub line: usize,
}

/// A **literal constant** that appears directly in the source code.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Number(f64),

    /// String literal without surrounding quotes.
    Str(String),

    True,

    False,

    Nil,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Bang,
    Minus,
    Plus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Plus,
    Minus,
    Star,
    Slash,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    EqualEqual,
    BangEqual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

/// A function literal.  Shared behind an `Rc` so closures can hold on to
/// their declaration without cloning the body.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    /// `None` for anonymous function expressions.
    pub name: Option<Identifier>,

    /// Parameter names (at most 255).
    pub params: Vec<Identifier>,

    pub body: Vec<Stmt>,

    /// Line of the `fn` keyword (or method name).
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(LiteralValue),

    /// Parenthesised sub‑expression.
    Grouping(Box<Expr>),

    Unary {
        operator: UnaryOp,
        line: usize,
        right: Box<Expr>,
    },

    Binary {
        left: Box<Expr>,
        operator: BinaryOp,
        line: usize,
        right: Box<Expr>,
    },

    /// Short‑circuiting `&&` / `||`.
    Logical {
        left: Box<Expr>,
        operator: LogicalOp,
        right: Box<Expr>,
    },

    /// `condition ? then_branch : else_branch`
    Ternary {
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },

    Variable {
        id: ExprId,
        name: Identifier,
    },

    Assign {
        id: ExprId,
        name: Identifier,
        value: Box<Expr>,
    },

    Call {
        callee: Box<Expr>,
        /// Line of the closing `)`, for error reporting.
        line: usize,
        arguments: Vec<Expr>,
    },

    /// object.property
    Get {
        object: Box<Expr>,
        name: Identifier,
    },

    /// object.property = value
    Set {
        object: Box<Expr>,
        name: Identifier,
        value: Box<Expr>,
    },

    /// The receiver inside a struct method.
    This {
        id: ExprId,
        line: usize,
    },

    Function(Rc<FunctionDecl>),
}
