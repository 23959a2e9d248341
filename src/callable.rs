//! Callable and instance object model: closures, struct templates, native
//! functions and the instances struct templates produce.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::environment::{EnvRef, Environment};
use crate::error::{LoxError, Result};
use crate::expr::FunctionDecl;
use crate::interpreter::{Interpreter, Signal};
use crate::value::Value;

/// Host‑provided operation backing a native function.
pub type NativeFn = fn(&mut Interpreter, &[Value]) -> Result<Value>;

pub type InstanceRef = Rc<RefCell<Instance>>;

/// Anything that can appear on the left of `( … )`.
#[derive(Clone)]
pub enum Callable {
    Closure(Rc<Closure>),
    Struct(Rc<StructTemplate>),
    Native(Rc<NativeFunction>),
}

impl Callable {
    pub fn arity(&self) -> usize {
        match self {
            Callable::Closure(closure) => closure.arity(),
            Callable::Struct(_) => 0,
            Callable::Native(native) => native.arity,
        }
    }

    /// Invoke with already‑evaluated arguments.  The caller checks arity first.
    pub fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> Result<Value> {
        match self {
            Callable::Closure(closure) => closure.call(interpreter, arguments),

            Callable::Struct(template) => {
                debug!("Instantiating struct '{}'", template.name);

                let instance = Instance::new(Rc::clone(template));

                Ok(Value::Instance(Rc::new(RefCell::new(instance))))
            }

            Callable::Native(native) => {
                debug!("Calling native function '{}'", native.name);

                (native.func)(interpreter, &arguments)
            }
        }
    }
}

impl PartialEq for Callable {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Callable::Closure(a), Callable::Closure(b)) => Rc::ptr_eq(a, b),
            (Callable::Struct(a), Callable::Struct(b)) => Rc::ptr_eq(a, b),
            (Callable::Native(a), Callable::Native(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callable::Closure(closure) => match &closure.declaration.name {
                Some(name) => write!(f, "[fn: {}]", name.name),
                None => write!(f, "[fn: anonymous]"),
            },
            Callable::Struct(template) => write!(f, "[struct: {}]", template.name),
            Callable::Native(native) => write!(f, "[native fn: {}]", native.name),
        }
    }
}

// Closures reach their environment, which may reach the closure again.
impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// A function value: declaration plus the environment it was created in.
pub struct Closure {
    pub declaration: Rc<FunctionDecl>,
    pub closure: EnvRef,
}

impl Closure {
    pub fn new(declaration: Rc<FunctionDecl>, closure: EnvRef) -> Self {
        Self {
            declaration,
            closure,
        }
    }

    pub fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    /// A copy of this method whose scope chain defines `this` = `instance`.
    pub fn bind(&self, instance: InstanceRef) -> Closure {
        let environment: EnvRef = Environment::with_enclosing(&self.closure);
        environment
            .borrow_mut()
            .define("this", Value::Instance(instance));

        Closure::new(Rc::clone(&self.declaration), environment)
    }

    pub fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> Result<Value> {
        let environment: EnvRef = Environment::with_enclosing(&self.closure);

        {
            let mut scope = environment.borrow_mut();
            for (param, argument) in self.declaration.params.iter().zip(arguments) {
                scope.define(&param.name, argument);
            }
        }

        match interpreter.execute_block(&self.declaration.body, environment) {
            Ok(()) => Ok(Value::Nil),
            Err(Signal::Return(value)) => Ok(value),
            Err(Signal::Error(e)) => Err(e),
            Err(Signal::Break(line)) => Err(LoxError::runtime(line, "'break' outside loop.")),
            Err(Signal::Continue(line)) => {
                Err(LoxError::runtime(line, "'continue' outside loop."))
            }
        }
    }
}

/// Host function registered in the global environment.
pub struct NativeFunction {
    pub name: String,
    pub arity: usize,
    pub func: NativeFn,
}

/// A struct declaration at runtime: its name and method closures.
pub struct StructTemplate {
    pub name: String,
    methods: HashMap<String, Rc<Closure>>,
}

impl StructTemplate {
    pub fn new(name: String, methods: HashMap<String, Rc<Closure>>) -> Self {
        Self { name, methods }
    }

    pub fn find_method(&self, name: &str) -> Option<Rc<Closure>> {
        self.methods.get(name).cloned()
    }
}

/// An object created by calling a struct template.
pub struct Instance {
    template: Rc<StructTemplate>,
    fields: HashMap<String, Value>,
}

impl Instance {
    pub fn new(template: Rc<StructTemplate>) -> Self {
        Self {
            template,
            fields: HashMap::new(),
        }
    }

    /// Fields first, then methods (bound to `instance`).
    pub fn get(instance: &InstanceRef, name: &str, line: usize) -> Result<Value> {
        if let Some(value) = instance.borrow().fields.get(name) {
            return Ok(value.clone());
        }

        let method: Option<Rc<Closure>> = instance.borrow().template.find_method(name);

        match method {
            Some(method) => {
                let bound: Closure = method.bind(Rc::clone(instance));

                Ok(Value::Callable(Callable::Closure(Rc::new(bound))))
            }
            None => Err(LoxError::runtime(
                line,
                format!("Undefined property '{}'.", name),
            )),
        }
    }

    /// Always writes a field, even when a method has the same name.
    pub fn set(&mut self, name: &str, value: Value) {
        self.fields.insert(name.to_string(), value);
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[instance: {}]", self.template.name)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("template", &self.template.name)
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .finish()
    }
}
