// ABOUTME: Runtime value types for the language's tree-walking evaluator

use crate::ast::Node;
use crate::env::Environment;
use crate::error::RuntimeError;
use crate::position::Span;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// A number is either an exact integer or a float. Arithmetic between two
/// integers stays exact as long as it fits in `i64`; on overflow it falls
/// back to `f64` rather than wrapping or panicking (see SPEC_FULL.md §3/§9).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }

    /// `Number(0)` is false, everything else is true (SPEC_FULL.md §3 invariants).
    pub fn is_truthy(self) -> bool {
        match self {
            Number::Int(i) => i != 0,
            Number::Float(f) => f != 0.0,
        }
    }

    pub fn from_bool(b: bool) -> Number {
        Number::Int(if b { 1 } else { 0 })
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(i) => write!(f, "{}", i),
            Number::Float(x) => write!(f, "{}", x),
        }
    }
}

pub type ListHandle = Rc<RefCell<Vec<Value>>>;
/// A native built-in's handler. Takes the already-arity-checked argument
/// slice, the call site's span (for error reporting), and the run's stdout
/// accumulator (for `show`-like built-ins; unused by the rest).
pub type BuiltinFn = fn(&[Value], &Span, &mut String) -> Result<Value, RuntimeError>;

#[derive(Clone)]
pub enum Value {
    Number(Number),
    String(String),
    List(ListHandle),
    Function(Rc<FunctionValue>),
    BuiltIn(Rc<BuiltInValue>),
}

pub struct FunctionValue {
    pub name: Option<String>,
    pub params: Vec<String>,
    pub body: Node,
    pub env: Rc<Environment>,
    pub auto_return: bool,
}

pub struct BuiltInValue {
    pub name: String,
    pub params: Vec<String>,
    pub min_args: usize,
    pub max_args: usize,
    pub handler: BuiltinFn,
}

impl Value {
    pub fn list(elements: Vec<Value>) -> Value {
        Value::List(Rc::new(RefCell::new(elements)))
    }

    pub fn unit() -> Value {
        Value::Number(Number::Int(0))
    }

    pub fn bool_value(b: bool) -> Value {
        Value::Number(Number::from_bool(b))
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Number(n) => n.is_truthy(),
            Value::String(s) => !s.is_empty(),
            Value::List(l) => !l.borrow().is_empty(),
            Value::Function(_) | Value::BuiltIn(_) => true,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "Number",
            Value::String(_) => "String",
            Value::List(_) => "List",
            Value::Function(_) => "Function",
            Value::BuiltIn(_) => "BuiltInFunction",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{}", s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Function(func) => {
                write!(f, "<function {}>", func.name.as_deref().unwrap_or("<anonymous>"))
            }
            Value::BuiltIn(b) => write!(f, "<built-in function {}>", b.name),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_display() {
        assert_eq!(format!("{}", Value::Number(Number::Int(42))), "42");
        assert_eq!(format!("{}", Value::Number(Number::Float(-2.5))), "-2.5");
        assert_eq!(format!("{}", Value::Number(Number::Int(0))), "0");
    }

    #[test]
    fn test_string_display() {
        assert_eq!(format!("{}", Value::String("hello".to_string())), "hello");
    }

    #[test]
    fn test_list_display_with_nested_lists() {
        let simple = Value::list(vec![
            Value::Number(Number::Int(1)),
            Value::Number(Number::Int(2)),
            Value::Number(Number::Int(3)),
        ]);
        assert_eq!(format!("{}", simple), "[1, 2, 3]");

        let nested = Value::list(vec![
            Value::Number(Number::Int(1)),
            Value::list(vec![Value::Number(Number::Int(2)), Value::Number(Number::Int(3))]),
        ]);
        assert_eq!(format!("{}", nested), "[1, [2, 3]]");

        let empty = Value::list(vec![]);
        assert_eq!(format!("{}", empty), "[]");
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::Number(Number::Int(0)).is_truthy());
        assert!(Value::Number(Number::Int(1)).is_truthy());
        assert!(!Value::String(String::new()).is_truthy());
        assert!(Value::String("x".to_string()).is_truthy());
        assert!(!Value::list(vec![]).is_truthy());
    }

    #[test]
    fn test_list_shares_storage_across_clones() {
        let list = Value::list(vec![Value::Number(Number::Int(1))]);
        let alias = list.clone();
        if let Value::List(handle) = &list {
            handle.borrow_mut().push(Value::Number(Number::Int(2)));
        }
        match alias {
            Value::List(handle) => assert_eq!(handle.borrow().len(), 2),
            _ => panic!("expected list"),
        }
    }
}
