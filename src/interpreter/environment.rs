// File: src/interpreter/environment.rs
//
// Lexical scoping environment for the Skiff interpreter.
//
// Environments form a chain of scopes linked by parent pointers; each
// scope knows its nesting level (0 for the global scope, parent + 1
// otherwise). The checker resolves every name to the level of the scope
// that defines it, so `get`/`assign` walk the chain by level and never
// search by name at runtime.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::value::Value;

/// Returned by [`Environment::define`] when the name already exists in the
/// local scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlreadyDefined;

#[derive(Debug)]
pub struct Environment {
    parent: Option<Rc<RefCell<Environment>>>,
    names: HashMap<String, Value>,
    nesting_level: usize,
}

impl Environment {
    /// Creates the global scope (nesting level 0).
    pub fn new() -> Self {
        Environment { parent: None, names: HashMap::new(), nesting_level: 0 }
    }

    /// Creates a child scope one level below `parent`.
    pub fn with_parent(parent: Rc<RefCell<Environment>>) -> Self {
        let nesting_level = parent.borrow().nesting_level + 1;
        Environment { parent: Some(parent), names: HashMap::new(), nesting_level }
    }

    pub fn nesting_level(&self) -> usize {
        self.nesting_level
    }

    pub fn parent(&self) -> Option<Rc<RefCell<Environment>>> {
        self.parent.clone()
    }

    /// Binds a new name in this scope. An empty name is ignored silently
    /// (the parser synthesizes placeholders with empty names).
    pub fn define(&mut self, name: &str, value: Value) -> Result<(), AlreadyDefined> {
        if name.is_empty() {
            return Ok(());
        }
        if self.names.contains_key(name) {
            return Err(AlreadyDefined);
        }
        self.names.insert(name.to_string(), value);
        Ok(())
    }

    /// Reads `name` from the scope at `level`. The checker guarantees the
    /// scope exists and contains the name; a miss returns Null only for
    /// names that were declared but never initialized.
    pub fn get(&self, name: &str, level: usize) -> Value {
        if self.nesting_level == level {
            return self.names.get(name).cloned().unwrap_or(Value::Null);
        }
        match &self.parent {
            Some(parent) => parent.borrow().get(name, level),
            None => Value::Null,
        }
    }

    /// Overwrites `name` in the scope at `level`.
    pub fn assign(&mut self, name: &str, value: Value, level: usize) {
        if self.nesting_level == level {
            self.names.insert(name.to_string(), value);
            return;
        }
        if let Some(parent) = &self.parent {
            parent.borrow_mut().assign(name, value, level);
        }
    }

    /// Name-based lookup in the local scope only; used by the entry point
    /// to find `main`.
    pub fn get_local(&self, name: &str) -> Option<Value> {
        self.names.get(name).cloned()
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wrap(env: Environment) -> Rc<RefCell<Environment>> {
        Rc::new(RefCell::new(env))
    }

    #[test]
    fn test_nesting_levels_increase_from_global() {
        let global = wrap(Environment::new());
        assert_eq!(global.borrow().nesting_level(), 0);
        let child = wrap(Environment::with_parent(global.clone()));
        assert_eq!(child.borrow().nesting_level(), 1);
        let grandchild = Environment::with_parent(child);
        assert_eq!(grandchild.nesting_level(), 2);
    }

    #[test]
    fn test_define_rejects_duplicates_in_same_scope() {
        let mut env = Environment::new();
        assert!(env.define("x", Value::Number(1.0)).is_ok());
        assert_eq!(env.define("x", Value::Number(2.0)), Err(AlreadyDefined));
    }

    #[test]
    fn test_define_ignores_empty_names() {
        let mut env = Environment::new();
        assert!(env.define("", Value::Number(1.0)).is_ok());
        assert!(env.define("", Value::Number(2.0)).is_ok());
    }

    #[test]
    fn test_get_walks_to_the_requested_level() {
        let global = wrap(Environment::new());
        global.borrow_mut().define("x", Value::Number(1.0)).unwrap();
        let child = wrap(Environment::with_parent(global));
        child.borrow_mut().define("x", Value::Number(2.0)).unwrap();

        assert!(matches!(child.borrow().get("x", 1), Value::Number(n) if n == 2.0));
        assert!(matches!(child.borrow().get("x", 0), Value::Number(n) if n == 1.0));
    }

    #[test]
    fn test_assign_overwrites_at_the_requested_level() {
        let global = wrap(Environment::new());
        global.borrow_mut().define("x", Value::Number(1.0)).unwrap();
        let child = wrap(Environment::with_parent(global.clone()));

        child.borrow_mut().assign("x", Value::Number(9.0), 0);
        assert!(matches!(global.borrow().get("x", 0), Value::Number(n) if n == 9.0));
    }
}
