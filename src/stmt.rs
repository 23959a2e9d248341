use std::rc::Rc;

use crate::expr::{Expr, FunctionDecl, Identifier};

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Expression(Expr),

    Print(Expr),

    Let {
        name: Identifier,
        initializer: Option<Expr>,
    },

    Block(Vec<Stmt>),

    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },

    While {
        condition: Expr,
        body: Box<Stmt>,
    },

    For {
        initializer: Box<Stmt>, // always a `Stmt::Let`
        condition: Option<Expr>,
        increment: Option<Expr>,
        body: Box<Stmt>,
    },

    Break {
        line: usize,
    },

    Continue {
        line: usize,
    },

    Return {
        line: usize,
        value: Option<Expr>,
    },

    Struct {
        name: Identifier,
        methods: Vec<Rc<FunctionDecl>>,
    },
}
