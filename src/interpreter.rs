use std::collections::HashMap;
use std::io::{self, Write};
use std::mem;
use std::rc::Rc;

use log::{debug, info, trace};

use crate::callable::{Callable, Closure, Instance, NativeFn, NativeFunction, StructTemplate};
use crate::environment::{EnvRef, Environment};
use crate::error::{LoxError, Result};
use crate::expr::{
    BinaryOp, Expr, ExprId, FunctionDecl, Identifier, LiteralValue, LogicalOp, UnaryOp,
};
use crate::resolver::Resolutions;
use crate::stmt::Stmt;
use crate::value::Value;

/// Non‑local exits from statement execution.  Errors travel the same channel
/// as `break`/`continue`/`return`; each loop and call boundary matches on it.
#[derive(Debug)]
pub enum Signal {
    Error(LoxError),
    Break(usize),
    Continue(usize),
    Return(Value),
}

impl From<LoxError> for Signal {
    fn from(e: LoxError) -> Self {
        Signal::Error(e)
    }
}

/// Result of executing a statement.
pub type Exec = std::result::Result<(), Signal>;

pub struct Interpreter {
    globals: EnvRef,
    environment: EnvRef,
    locals: HashMap<ExprId, usize>,
    output: Box<dyn Write>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// An interpreter printing to stdout, with an empty global scope.
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    /// An interpreter printing to `output`.
    pub fn with_output(output: Box<dyn Write>) -> Self {
        info!("Initializing Interpreter");

        let globals: EnvRef = Environment::new();

        Self {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            output,
        }
    }

    /// Register a host function in the global scope.
    pub fn define_native(&mut self, name: &str, arity: usize, func: NativeFn) {
        debug!("Defining native function '{}'", name);

        let native = NativeFunction {
            name: name.to_string(),
            arity,
            func,
        };

        self.globals
            .borrow_mut()
            .define(name, Value::Callable(Callable::Native(Rc::new(native))));
    }

    /// Names currently bound in the global scope.
    pub fn global_names(&self) -> Vec<String> {
        self.globals.borrow().names().map(str::to_string).collect()
    }

    /// Record the resolver's distances for the next program.
    pub fn resolve(&mut self, resolutions: Resolutions) {
        debug!("Recording {} resolved references", resolutions.len());
        self.locals.extend(resolutions);
    }

    /// Interprets a list of statements (a "program").
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        debug!("Interpreting {} statements", statements.len());

        for stmt in statements {
            match self.execute(stmt) {
                Ok(()) => {}
                Err(Signal::Error(e)) => return Err(e),
                Err(Signal::Break(line)) => {
                    return Err(LoxError::runtime(line, "'break' outside loop."))
                }
                Err(Signal::Continue(line)) => {
                    return Err(LoxError::runtime(line, "'continue' outside loop."))
                }
                Err(Signal::Return(_)) => {
                    return Err(LoxError::runtime(0, "'return' outside function."))
                }
            }
        }

        self.output.flush()?;

        info!("Interpretation completed successfully");

        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statements
    // ─────────────────────────────────────────────────────────────────────────

    pub fn execute(&mut self, stmt: &Stmt) -> Exec {
        trace!("Executing statement: {:?}", stmt);

        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
            }

            Stmt::Print(expr) => {
                let value: Value = self.evaluate(expr)?;
                writeln!(self.output, "{}", value).map_err(LoxError::from)?;
                debug!("Printed value: {}", value);
            }

            Stmt::Let { name, initializer } => {
                let value: Value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                debug!("Defining variable '{}' = {}", name.name, value);

                self.environment.borrow_mut().define(&name.name, value);
            }

            Stmt::Block(statements) => {
                let scope: EnvRef = Environment::with_enclosing(&self.environment);
                self.execute_block(statements, scope)?;
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)?;
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)?;
                }
            }

            Stmt::While { condition, body } => {
                debug!("Entering while loop");

                while self.evaluate(condition)?.is_truthy() {
                    match self.execute(body) {
                        Ok(()) | Err(Signal::Continue(_)) => {}
                        Err(Signal::Break(_)) => break,
                        Err(other) => return Err(other),
                    }
                }

                debug!("Exited while loop");
            }

            Stmt::For {
                initializer,
                condition,
                increment,
                body,
            } => {
                debug!("Entering for loop");

                let scope: EnvRef = Environment::with_enclosing(&self.environment);
                let previous: EnvRef = mem::replace(&mut self.environment, scope);
                let result: Exec =
                    self.run_for(initializer, condition.as_ref(), increment.as_ref(), body);
                self.environment = previous;

                debug!("Exited for loop");

                result?;
            }

            Stmt::Break { line } => return Err(Signal::Break(*line)),

            Stmt::Continue { line } => return Err(Signal::Continue(*line)),

            Stmt::Return { value, .. } => {
                let value: Value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                debug!("Returning value: {}", value);

                return Err(Signal::Return(value));
            }

            Stmt::Struct { name, methods } => {
                debug!("Declaring struct '{}'", name.name);

                self.environment.borrow_mut().define(&name.name, Value::Nil);

                let methods: HashMap<String, Rc<Closure>> = methods
                    .iter()
                    .map(|decl: &Rc<FunctionDecl>| {
                        let method_name: String = decl
                            .name
                            .as_ref()
                            .map(|n: &Identifier| n.name.clone())
                            .unwrap_or_default();
                        let closure = Closure::new(Rc::clone(decl), Rc::clone(&self.environment));

                        (method_name, Rc::new(closure))
                    })
                    .collect();

                let template = StructTemplate::new(name.name.clone(), methods);

                self.environment.borrow_mut().assign(
                    &name.name,
                    Value::Callable(Callable::Struct(Rc::new(template))),
                    name.line,
                )?;
            }
        }

        Ok(())
    }

    /// Loop part of a `for`; runs with the loop scope already installed.
    fn run_for(
        &mut self,
        initializer: &Stmt,
        condition: Option<&Expr>,
        increment: Option<&Expr>,
        body: &Stmt,
    ) -> Exec {
        self.execute(initializer)?;

        loop {
            if let Some(condition) = condition {
                if !self.evaluate(condition)?.is_truthy() {
                    return Ok(());
                }
            }

            match self.execute(body) {
                Ok(()) | Err(Signal::Continue(_)) => {}
                Err(Signal::Break(_)) => return Ok(()),
                Err(other) => return Err(other),
            }

            if let Some(increment) = increment {
                self.evaluate(increment)?;
            }
        }
    }

    /// Run `statements` with `environment` as the current scope, restoring the
    /// previous scope on every exit path.
    pub fn execute_block(&mut self, statements: &[Stmt], environment: EnvRef) -> Exec {
        let previous: EnvRef = mem::replace(&mut self.environment, environment);

        let result: Exec = statements.iter().try_for_each(|stmt| self.execute(stmt));

        self.environment = previous;

        result
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expressions
    // ─────────────────────────────────────────────────────────────────────────

    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::String(s.clone()),
                LiteralValue::True => Value::Bool(true),
                LiteralValue::False => Value::Bool(false),
                LiteralValue::Nil => Value::Nil,
            }),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary {
                operator,
                line,
                right,
            } => {
                let right: Value = self.evaluate(right)?;

                match operator {
                    UnaryOp::Bang => Ok(Value::Bool(!right.is_truthy())),
                    UnaryOp::Minus => Ok(Value::Number(-number(&right, *line)?)),
                    UnaryOp::Plus => Ok(Value::Number(number(&right, *line)?)),
                }
            }

            Expr::Binary {
                left,
                operator,
                line,
                right,
            } => {
                let left: Value = self.evaluate(left)?;
                let right: Value = self.evaluate(right)?;

                binary(*operator, left, right, *line)
            }

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left: Value = self.evaluate(left)?;

                let short_circuit: bool = match operator {
                    LogicalOp::Or => left.is_truthy(),
                    LogicalOp::And => !left.is_truthy(),
                };

                if short_circuit {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.evaluate(then_branch)
                } else {
                    self.evaluate(else_branch)
                }
            }

            Expr::Variable { id, name } => self.look_up(*id, &name.name, name.line),

            Expr::This { id, line } => self.look_up(*id, "this", *line),

            Expr::Assign { id, name, value } => {
                let value: Value = self.evaluate(value)?;

                match self.locals.get(id) {
                    Some(distance) => Environment::assign_at(
                        &self.environment,
                        *distance,
                        &name.name,
                        value.clone(),
                        name.line,
                    )?,
                    None => self
                        .globals
                        .borrow_mut()
                        .assign(&name.name, value.clone(), name.line)?,
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                line,
                arguments,
            } => {
                let callee: Value = self.evaluate(callee)?;

                let mut values: Vec<Value> = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    values.push(self.evaluate(argument)?);
                }

                let Value::Callable(callable) = callee else {
                    return Err(LoxError::runtime(*line, "Can only call functions and structs."));
                };

                if values.len() != callable.arity() {
                    return Err(LoxError::runtime(
                        *line,
                        format!(
                            "Expected {} arguments but got {}.",
                            callable.arity(),
                            values.len()
                        ),
                    ));
                }

                debug!("Calling {}", callable);

                callable.call(self, values)
            }

            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => Instance::get(&instance, &name.name, name.line),
                _ => Err(LoxError::runtime(
                    name.line,
                    "Only instances have properties.",
                )),
            },

            Expr::Set {
                object,
                name,
                value,
            } => {
                let Value::Instance(instance) = self.evaluate(object)? else {
                    return Err(LoxError::runtime(name.line, "Only instances have fields."));
                };

                let value: Value = self.evaluate(value)?;
                instance.borrow_mut().set(&name.name, value.clone());

                Ok(value)
            }

            Expr::Function(decl) => {
                let closure = Closure::new(Rc::clone(decl), Rc::clone(&self.environment));
                let value = Value::Callable(Callable::Closure(Rc::new(closure)));

                if let Some(name) = &decl.name {
                    debug!("Defining function '{}'", name.name);
                    self.environment
                        .borrow_mut()
                        .define(&name.name, value.clone());
                }

                Ok(value)
            }
        }
    }

    /// Resolved references jump straight to their scope; the rest are globals.
    fn look_up(&self, id: ExprId, name: &str, line: usize) -> Result<Value> {
        match self.locals.get(&id) {
            Some(distance) => Environment::get_at(&self.environment, *distance, name, line),
            None => self.globals.borrow().get(name, line),
        }
    }
}

fn number(value: &Value, line: usize) -> Result<f64> {
    value
        .to_number()
        .map_err(|message: String| LoxError::runtime(line, message))
}

fn binary(operator: BinaryOp, left: Value, right: Value, line: usize) -> Result<Value> {
    let value = match operator {
        BinaryOp::EqualEqual => Value::Bool(left == right),
        BinaryOp::BangEqual => Value::Bool(left != right),

        BinaryOp::Plus => match (left, right) {
            (Value::String(a), Value::String(b)) => Value::String(a + &b),
            (Value::Number(a), Value::Number(b)) => Value::Number(a + b),
            (a, b) => {
                return Err(LoxError::runtime(
                    line,
                    format!(
                        "Operands of '+' must be two numbers or two strings, got {} and {}.",
                        a.type_name(),
                        b.type_name()
                    ),
                ))
            }
        },

        BinaryOp::Minus => Value::Number(number(&left, line)? - number(&right, line)?),
        BinaryOp::Star => Value::Number(number(&left, line)? * number(&right, line)?),
        BinaryOp::Slash => Value::Number(number(&left, line)? / number(&right, line)?),
        BinaryOp::Greater => Value::Bool(number(&left, line)? > number(&right, line)?),
        BinaryOp::GreaterEqual => Value::Bool(number(&left, line)? >= number(&right, line)?),
        BinaryOp::Less => Value::Bool(number(&left, line)? < number(&right, line)?),
        BinaryOp::LessEqual => Value::Bool(number(&left, line)? <= number(&right, line)?),
    };

    Ok(value)
}
