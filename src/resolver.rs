//! Static resolver pass for the **Rox** interpreter.
//!
//! This resolver does three things in one AST walk:
//! 1. Build lexical scopes (stack of `HashMap<String,bool>` tracking declared/defined).
//! 2. Report static errors (self‑read in initializer, misplaced `return`,
//!    `break`, `continue` or `this`).
//! 3. Record, for *each* variable occurrence, how many scopes out its binding
//!    lives.  Occurrences with no entry are globals.
//!
//! Top‑level declarations never enter the scope stack; the resolver only keeps
//! their names so it can tell `let x = x;` (an error) from a global redeclaration.
//!
//! Inside a `let` initializer the name being declared is not yet visible:
//! a direct read resolves to the next enclosing binding.  Reads nested in a
//! function literal run later, so they see the new binding.

use crate::error::{LoxError, Result};
use crate::expr::{Expr, ExprId, FunctionDecl, Identifier};
use crate::stmt::Stmt;
use log::{debug, info};
use std::collections::{HashMap, HashSet};

/// Distance (in scopes) from each resolved reference site to its binding.
pub type Resolutions = HashMap<ExprId, usize>;

/// Are we inside a user function?  Used to validate `return`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
    Method,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum StructType {
    None,
    Struct,
}

pub struct Resolver {
    scopes: Vec<HashMap<String, bool>>, // false=declared, true=defined
    globals: HashSet<String>,
    initializing_global: Option<String>,
    locals: Resolutions,
    current_function: FunctionType,
    current_struct: StructType,
    loop_depth: usize,
}

impl Resolver {
    /// `known_globals` are names already bound in the global environment
    /// (natives, earlier REPL lines).
    pub fn new<I>(known_globals: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        info!("Resolver instantiated");

        Resolver {
            scopes: Vec::new(),
            globals: known_globals.into_iter().collect(),
            initializing_global: None,
            locals: HashMap::new(),
            current_function: FunctionType::None,
            current_struct: StructType::None,
            loop_depth: 0,
        }
    }

    /// Walk all top‑level statements and hand back the recorded distances.
    pub fn resolve(mut self, statements: &[Stmt]) -> Result<Resolutions> {
        info!(
            "Beginning resolve pass over {} statement(s)",
            statements.len()
        );

        for stmt in statements {
            self.resolve_stmt(stmt)?;
        }

        Ok(self.locals)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statement resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_stmt(&mut self, stmt: &Stmt) -> Result<()> {
        match stmt {
            Stmt::Block(statements) => {
                self.begin_scope();
                for s in statements {
                    self.resolve_stmt(s)?;
                }
                self.end_scope();
            }

            Stmt::Let { name, initializer } => {
                // declare → resolve initializer → define
                if self.scopes.is_empty() {
                    self.initializing_global = Some(name.name.clone());
                    if let Some(expr) = initializer {
                        self.resolve_expr(expr)?;
                    }
                    self.initializing_global = None;
                    self.globals.insert(name.name.clone());
                } else {
                    self.declare(name);
                    if let Some(expr) = initializer {
                        self.resolve_expr(expr)?;
                    }
                    self.define(name);
                }
            }

            Stmt::Expression(expr) | Stmt::Print(expr) => {
                self.resolve_expr(expr)?;
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition)?;
                self.resolve_stmt(then_branch)?;
                if let Some(eb) = else_branch.as_deref() {
                    self.resolve_stmt(eb)?;
                }
            }

            Stmt::While { condition, body } => {
                self.resolve_expr(condition)?;
                self.resolve_loop_body(body)?;
            }

            Stmt::For {
                initializer,
                condition,
                increment,
                body,
            } => {
                // One scope for the loop variable; a block body adds its own.
                self.begin_scope();
                self.resolve_stmt(initializer)?;
                if let Some(cond) = condition {
                    self.resolve_expr(cond)?;
                }
                if let Some(inc) = increment {
                    self.resolve_expr(inc)?;
                }
                self.resolve_loop_body(body)?;
                self.end_scope();
            }

            Stmt::Break { line } => {
                if self.loop_depth == 0 {
                    return Err(LoxError::resolve(
                        *line,
                        "break",
                        "'break' used outside of a loop",
                    ));
                }
            }

            Stmt::Continue { line } => {
                if self.loop_depth == 0 {
                    return Err(LoxError::resolve(
                        *line,
                        "continue",
                        "'continue' used outside of a loop",
                    ));
                }
            }

            Stmt::Return { line, value } => {
                if self.current_function == FunctionType::None {
                    return Err(LoxError::resolve(
                        *line,
                        "return",
                        "'return' used outside of function",
                    ));
                }
                if let Some(expr) = value {
                    self.resolve_expr(expr)?;
                }
            }

            Stmt::Struct { name, methods } => {
                self.declare_and_define(name);

                let enclosing = self.current_struct;
                self.current_struct = StructType::Struct;

                for method in methods {
                    // Bound methods see `this` one scope outside their parameters.
                    self.begin_scope();
                    if let Some(scope) = self.scopes.last_mut() {
                        scope.insert("this".to_string(), true);
                    }
                    self.resolve_function(method, FunctionType::Method)?;
                    self.end_scope();
                }

                self.current_struct = enclosing;
            }
        }

        Ok(())
    }

    fn resolve_loop_body(&mut self, body: &Stmt) -> Result<()> {
        self.loop_depth += 1;
        let result = self.resolve_stmt(body);
        self.loop_depth -= 1;

        result
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expression resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_expr(&mut self, expr: &Expr) -> Result<()> {
        match expr {
            Expr::Literal(_) => {}

            Expr::Grouping(inner) => self.resolve_expr(inner)?,

            Expr::Unary { right, .. } => self.resolve_expr(right)?,

            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left)?;
                self.resolve_expr(right)?;
            }

            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition)?;
                self.resolve_expr(then_branch)?;
                self.resolve_expr(else_branch)?;
            }

            Expr::Variable { id, name } => self.resolve_local(*id, name)?,

            Expr::Assign { id, name, value } => {
                self.resolve_expr(value)?;
                self.resolve_local(*id, name)?;
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee)?;
                for arg in arguments {
                    self.resolve_expr(arg)?;
                }
            }

            Expr::Get { object, .. } => self.resolve_expr(object)?,

            Expr::Set { object, value, .. } => {
                self.resolve_expr(value)?;
                self.resolve_expr(object)?;
            }

            Expr::This { id, line } => {
                if self.current_struct == StructType::None {
                    return Err(LoxError::resolve(
                        *line,
                        "this",
                        "Can't use 'this' outside of a struct method",
                    ));
                }

                let this = Identifier {
                    name: "this".to_string(),
                    line: *line,
                };
                self.resolve_local(*id, &this)?;
            }

            Expr::Function(decl) => {
                // A named literal binds its name where it is evaluated.
                if let Some(name) = &decl.name {
                    self.declare_and_define(name);
                }
                self.resolve_function(decl, FunctionType::Function)?;
            }
        }

        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Function helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Enter a fresh scope for a function’s parameters + body.
    fn resolve_function(&mut self, decl: &FunctionDecl, kind: FunctionType) -> Result<()> {
        let enclosing_function = self.current_function;
        let enclosing_loops = self.loop_depth;
        self.current_function = kind;
        self.loop_depth = 0;

        self.begin_scope();
        for param in &decl.params {
            self.declare(param);
            self.define(param);
        }
        let result: Result<()> = decl
            .body
            .iter()
            .try_for_each(|stmt| self.resolve_stmt(stmt));
        self.end_scope();

        self.current_function = enclosing_function;
        self.loop_depth = enclosing_loops;

        result
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Scope management
    // ─────────────────────────────────────────────────────────────────────────

    #[inline]
    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    #[inline]
    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    /// Redeclaring a name in the same scope is allowed; it just rebinds.
    fn declare(&mut self, name: &Identifier) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.name.clone(), false);
        }
    }

    fn define(&mut self, name: &Identifier) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.name.clone(), true);
        }
    }

    /// Declarations with no initializer to wait for (functions, structs).
    fn declare_and_define(&mut self, name: &Identifier) {
        if self.scopes.is_empty() {
            self.globals.insert(name.name.clone());
        } else {
            self.define(name);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Binding‑distance helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Record this reference as a local at depth `d`, or leave it global.
    fn resolve_local(&mut self, id: ExprId, name: &Identifier) -> Result<()> {
        // Read directly inside its own initializer: the new binding does not exist yet.
        let pending_local: bool = self
            .scopes
            .last()
            .is_some_and(|scope| scope.get(&name.name) == Some(&false));
        let pending_global: bool = self.scopes.is_empty()
            && self.initializing_global.as_deref() == Some(name.name.as_str());
        let skip: usize = usize::from(pending_local);

        for (depth, scope) in self.scopes.iter().rev().enumerate().skip(skip) {
            if scope.contains_key(&name.name) {
                debug!("Resolved '{}' at depth {}", name.name, depth);
                self.locals.insert(id, depth);
                return Ok(());
            }
        }

        if (pending_local || pending_global) && !self.globals.contains(&name.name) {
            return Err(LoxError::resolve(
                name.line,
                &name.name,
                "Can't read local variable in its own initializer",
            ));
        }

        debug!("Resolved '{}' as global", name.name);

        Ok(())
    }
}
