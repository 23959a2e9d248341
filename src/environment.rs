use crate::error::{LoxError, Result};
use crate::value::Value;
use log::trace;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared handle to a scope.  Closures hold one to keep their defining scope alive.
pub type EnvRef = Rc<RefCell<Environment>>;

/// One scope in the parent‑linked environment chain.
#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<EnvRef>,
}

impl Environment {
    /// A root scope with no parent (the globals).
    pub fn new() -> EnvRef {
        Rc::new(RefCell::new(Environment::default()))
    }

    /// A fresh child scope of `enclosing`.
    pub fn with_enclosing(enclosing: &EnvRef) -> EnvRef {
        Rc::new(RefCell::new(Environment {
            values: HashMap::new(),
            enclosing: Some(Rc::clone(enclosing)),
        }))
    }

    /// Bind `name` in this scope, shadowing any outer binding.
    pub fn define(&mut self, name: &str, value: Value) {
        trace!("define '{}'", name);
        self.values.insert(name.to_string(), value);
    }

    /// Look `name` up, walking parent links to the root.
    pub fn get(&self, name: &str, line: usize) -> Result<Value> {
        if let Some(value) = self.values.get(name) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name, line)
        } else {
            Err(undefined(name, line))
        }
    }

    /// Overwrite an existing binding, walking parent links.  Never creates one.
    pub fn assign(&mut self, name: &str, value: Value, line: usize) -> Result<()> {
        if let Some(slot) = self.values.get_mut(name) {
            *slot = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value, line)
        } else {
            Err(undefined(name, line))
        }
    }

    /// Names bound directly in this scope.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// The scope `distance` parent links above `env`.
    fn ancestor(env: &EnvRef, distance: usize) -> Result<EnvRef> {
        let mut current: EnvRef = Rc::clone(env);

        for _ in 0..distance {
            let parent: EnvRef = current
                .borrow()
                .enclosing
                .clone()
                .ok_or_else(|| LoxError::runtime(0, "Resolved scope is out of range."))?;
            current = parent;
        }

        Ok(current)
    }

    /// Read `name` from exactly the scope `distance` frames above `env`.
    pub fn get_at(env: &EnvRef, distance: usize, name: &str, line: usize) -> Result<Value> {
        let scope: EnvRef = Self::ancestor(env, distance)?;
        let value: Option<Value> = scope.borrow().values.get(name).cloned();

        value.ok_or_else(|| undefined(name, line))
    }

    /// Write `name` in exactly the scope `distance` frames above `env`.
    pub fn assign_at(
        env: &EnvRef,
        distance: usize,
        name: &str,
        value: Value,
        line: usize,
    ) -> Result<()> {
        let scope: EnvRef = Self::ancestor(env, distance)?;
        let mut scope = scope.borrow_mut();

        match scope.values.get_mut(name) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(undefined(name, line)),
        }
    }
}

fn undefined(name: &str, line: usize) -> LoxError {
    LoxError::runtime(line, format!("Undefined variable '{}'.", name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_shadows_outer_binding() {
        let globals = Environment::new();
        globals.borrow_mut().define("a", Value::Number(1.0));

        let inner = Environment::with_enclosing(&globals);
        inner.borrow_mut().define("a", Value::Number(2.0));

        assert_eq!(inner.borrow().get("a", 1).unwrap(), Value::Number(2.0));
        assert_eq!(globals.borrow().get("a", 1).unwrap(), Value::Number(1.0));
    }

    #[test]
    fn assign_walks_to_the_defining_scope() {
        let globals = Environment::new();
        globals.borrow_mut().define("a", Value::Number(1.0));
        let inner = Environment::with_enclosing(&globals);

        inner
            .borrow_mut()
            .assign("a", Value::Number(5.0), 1)
            .unwrap();

        assert_eq!(globals.borrow().get("a", 1).unwrap(), Value::Number(5.0));
        assert!(inner.borrow().names().next().is_none());
    }

    #[test]
    fn assign_without_define_fails() {
        let globals = Environment::new();
        let err = globals
            .borrow_mut()
            .assign("missing", Value::Nil, 3)
            .unwrap_err();

        assert!(err.to_string().contains("Undefined variable 'missing'"));
        assert!(globals.borrow().get("missing", 3).is_err());
    }

    #[test]
    fn get_at_agrees_with_linear_lookup() {
        let globals = Environment::new();
        globals.borrow_mut().define("x", Value::Bool(true));
        let middle = Environment::with_enclosing(&globals);
        middle.borrow_mut().define("y", Value::Number(7.0));
        let inner = Environment::with_enclosing(&middle);

        assert_eq!(
            Environment::get_at(&inner, 1, "y", 1).unwrap(),
            inner.borrow().get("y", 1).unwrap()
        );
        assert_eq!(
            Environment::get_at(&inner, 2, "x", 1).unwrap(),
            inner.borrow().get("x", 1).unwrap()
        );
        assert!(Environment::get_at(&inner, 0, "y", 1).is_err());
    }

    #[test]
    fn assign_at_targets_one_frame() {
        let globals = Environment::new();
        globals.borrow_mut().define("x", Value::Number(1.0));
        let inner = Environment::with_enclosing(&globals);
        inner.borrow_mut().define("x", Value::Number(2.0));

        Environment::assign_at(&inner, 1, "x", Value::Number(10.0), 1).unwrap();

        assert_eq!(inner.borrow().get("x", 1).unwrap(), Value::Number(2.0));
        assert_eq!(globals.borrow().get("x", 1).unwrap(), Value::Number(10.0));
        assert!(Environment::assign_at(&inner, 5, "x", Value::Nil, 1).is_err());
    }
}
