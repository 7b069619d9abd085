// ABOUTME: Environment module for managing variable bindings and lexical scopes

use crate::value::{Number, Value};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug)]
pub struct Environment {
    bindings: RefCell<HashMap<String, Value>>,
    parent: Option<Rc<Environment>>,
}

impl Environment {
    /// Creates a new global environment with no parent, pre-bound with the
    /// language's singleton identifiers (`null`, `false`, `true`, `math_PI`)
    /// per SPEC_FULL.md §3.
    pub fn new() -> Rc<Self> {
        let env = Rc::new(Environment {
            bindings: RefCell::new(HashMap::new()),
            parent: None,
        });
        env.define("null".to_string(), Value::Number(Number::Int(0)));
        env.define("false".to_string(), Value::Number(Number::Int(0)));
        env.define("true".to_string(), Value::Number(Number::Int(1)));
        env.define("math_PI".to_string(), Value::Number(Number::Float(std::f64::consts::PI)));
        env
    }

    /// Creates a new child environment with a parent
    pub fn with_parent(parent: Rc<Environment>) -> Rc<Self> {
        Rc::new(Environment {
            bindings: RefCell::new(HashMap::new()),
            parent: Some(parent),
        })
    }

    /// Binds `name` in THIS scope, shadowing any parent binding of the same
    /// name. `var x = …` always compiles down to this, never to a walk up
    /// the parent chain — see SPEC_FULL.md §4.6/§9.
    pub fn define(&self, name: String, value: Value) {
        self.bindings.borrow_mut().insert(name, value);
    }

    /// Looks up a symbol in THIS scope and parent scopes recursively
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.bindings.borrow().get(name) {
            return Some(value.clone());
        }
        self.parent.as_ref().and_then(|parent| parent.get(name))
    }

    /// Removes a binding from this scope only. Mirrors the original's
    /// `SymbolTable.remove`, used when a for-loop variable is torn down.
    pub fn remove(&self, name: &str) {
        self.bindings.borrow_mut().remove(name);
    }

    /// A flattened, parent-first view of every binding visible from this
    /// scope, for the trace's end-of-run symbol snapshot (§4.5). Child
    /// bindings shadow parent bindings of the same name.
    pub fn snapshot_all(&self) -> HashMap<String, Value> {
        let mut merged = match &self.parent {
            Some(parent) => parent.snapshot_all(),
            None => HashMap::new(),
        };
        for (name, value) in self.bindings.borrow().iter() {
            merged.insert(name.clone(), value.clone());
        }
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Number;

    #[test]
    fn test_define_and_get() {
        let env = Environment::new();
        env.define("x".to_string(), Value::Number(Number::Int(42)));

        match env.get("x") {
            Some(Value::Number(Number::Int(n))) => assert_eq!(n, 42),
            _ => panic!("Expected Number(42)"),
        }
    }

    #[test]
    fn test_undefined_symbol() {
        let env = Environment::new();
        assert!(env.get("undefined").is_none());
    }

    #[test]
    fn test_var_always_shadows_current_scope_not_parent() {
        let parent = Environment::new();
        parent.define("x".to_string(), Value::Number(Number::Int(42)));

        let child = Environment::with_parent(parent.clone());
        child.define("x".to_string(), Value::Number(Number::Int(100)));

        match child.get("x") {
            Some(Value::Number(Number::Int(n))) => assert_eq!(n, 100),
            _ => panic!("Expected Number(100)"),
        }
        // Parent is untouched: `var` never reaches up to rebind it.
        match parent.get("x") {
            Some(Value::Number(Number::Int(n))) => assert_eq!(n, 42),
            _ => panic!("Expected Number(42)"),
        }
    }

    #[test]
    fn test_parent_lookup() {
        let parent = Environment::new();
        parent.define("x".to_string(), Value::Number(Number::Int(42)));

        let child = Environment::with_parent(parent);

        match child.get("x") {
            Some(Value::Number(Number::Int(n))) => assert_eq!(n, 42),
            _ => panic!("Expected Number(42)"),
        }
    }

    #[test]
    fn test_multiple_levels() {
        let grandparent = Environment::new();
        grandparent.define("a".to_string(), Value::Number(Number::Int(1)));

        let parent = Environment::with_parent(grandparent);
        parent.define("b".to_string(), Value::Number(Number::Int(2)));

        let child = Environment::with_parent(parent);
        child.define("c".to_string(), Value::Number(Number::Int(3)));

        assert!(matches!(child.get("a"), Some(Value::Number(Number::Int(1)))));
        assert!(matches!(child.get("b"), Some(Value::Number(Number::Int(2)))));
        assert!(matches!(child.get("c"), Some(Value::Number(Number::Int(3)))));
    }

    #[test]
    fn test_remove() {
        let env = Environment::new();
        env.define("x".to_string(), Value::Number(Number::Int(1)));
        env.remove("x");
        assert!(env.get("x").is_none());
    }

    #[test]
    fn test_snapshot_all_merges_parent_and_child() {
        let parent = Environment::new();
        let singleton_count = parent.snapshot_all().len();
        parent.define("a".to_string(), Value::Number(Number::Int(1)));

        let child = Environment::with_parent(parent);
        child.define("b".to_string(), Value::Number(Number::Int(2)));

        let snapshot = child.snapshot_all();
        assert_eq!(snapshot.len(), singleton_count + 2);
        assert!(matches!(snapshot.get("a"), Some(Value::Number(Number::Int(1)))));
        assert!(matches!(snapshot.get("b"), Some(Value::Number(Number::Int(2)))));
    }

    #[test]
    fn test_new_environment_pre_binds_singleton_identifiers() {
        let env = Environment::new();
        assert!(matches!(env.get("null"), Some(Value::Number(Number::Int(0)))));
        assert!(matches!(env.get("false"), Some(Value::Number(Number::Int(0)))));
        assert!(matches!(env.get("true"), Some(Value::Number(Number::Int(1)))));
        match env.get("math_PI") {
            Some(Value::Number(Number::Float(f))) => assert!((f - std::f64::consts::PI).abs() < 1e-12),
            other => panic!("expected math_PI, got {:?}", other),
        }
    }

    #[test]
    fn test_snapshot_child_shadows_parent() {
        let parent = Environment::new();
        parent.define("x".to_string(), Value::Number(Number::Int(1)));

        let child = Environment::with_parent(parent);
        child.define("x".to_string(), Value::Number(Number::Int(2)));

        let snapshot = child.snapshot_all();
        assert!(matches!(snapshot.get("x"), Some(Value::Number(Number::Int(2)))));
    }
}
