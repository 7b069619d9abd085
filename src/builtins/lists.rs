//! List mutation builtins: add, pop, extend, len
//!
//! Unlike the `+`/`-`/`*`/`/` list operators (eval.rs), these mutate their
//! first argument's shared storage in place.

use crate::error::RuntimeError;
use crate::position::Span;
use crate::value::{BuiltInValue, Number, Value};
use std::rc::Rc;

fn expect_list<'a>(value: &'a Value, span: &Span) -> Result<&'a crate::value::ListHandle, RuntimeError> {
    match value {
        Value::List(handle) => Ok(handle),
        _ => Err(RuntimeError::IllegalOperation { span: span.clone() }),
    }
}

fn expect_index(value: &Value, span: &Span) -> Result<i64, RuntimeError> {
    match value {
        Value::Number(Number::Int(i)) => Ok(*i),
        _ => Err(RuntimeError::IllegalOperation { span: span.clone() }),
    }
}

fn normalize_index(index: i64, len: usize, span: &Span) -> Result<usize, RuntimeError> {
    let signed_len = len as i64;
    let resolved = if index < 0 { index + signed_len } else { index };
    if resolved < 0 || resolved >= signed_len {
        Err(RuntimeError::IndexOutOfBounds { index, length: len, span: span.clone() })
    } else {
        Ok(resolved as usize)
    }
}

fn builtin_add(args: &[Value], span: &Span, _stdout: &mut String) -> Result<Value, RuntimeError> {
    let list = expect_list(&args[0], span)?;
    list.borrow_mut().push(args[1].clone());
    Ok(Value::unit())
}

fn builtin_pop(args: &[Value], span: &Span, _stdout: &mut String) -> Result<Value, RuntimeError> {
    let list = expect_list(&args[0], span)?;
    let index = expect_index(&args[1], span)?;
    let mut items = list.borrow_mut();
    let idx = normalize_index(index, items.len(), span)?;
    Ok(items.remove(idx))
}

fn builtin_extend(args: &[Value], span: &Span, _stdout: &mut String) -> Result<Value, RuntimeError> {
    let target = expect_list(&args[0], span)?;
    let source = expect_list(&args[1], span)?;
    let extra: Vec<Value> = source.borrow().clone();
    target.borrow_mut().extend(extra);
    Ok(Value::unit())
}

fn builtin_len(args: &[Value], span: &Span, _stdout: &mut String) -> Result<Value, RuntimeError> {
    let list = expect_list(&args[0], span)?;
    Ok(Value::Number(Number::Int(list.borrow().len() as i64)))
}

pub fn register(env: &Rc<crate::env::Environment>) {
    env.define(
        "add".to_string(),
        Value::BuiltIn(Rc::new(BuiltInValue {
            name: "add".to_string(),
            params: vec!["list".to_string(), "value".to_string()],
            min_args: 2,
            max_args: 2,
            handler: builtin_add,
        })),
    );
    env.define(
        "pop".to_string(),
        Value::BuiltIn(Rc::new(BuiltInValue {
            name: "pop".to_string(),
            params: vec!["list".to_string(), "index".to_string()],
            min_args: 2,
            max_args: 2,
            handler: builtin_pop,
        })),
    );
    env.define(
        "extend".to_string(),
        Value::BuiltIn(Rc::new(BuiltInValue {
            name: "extend".to_string(),
            params: vec!["list_a".to_string(), "list_b".to_string()],
            min_args: 2,
            max_args: 2,
            handler: builtin_extend,
        })),
    );
    env.define(
        "len".to_string(),
        Value::BuiltIn(Rc::new(BuiltInValue {
            name: "len".to_string(),
            params: vec!["list".to_string()],
            min_args: 1,
            max_args: 1,
            handler: builtin_len,
        })),
    );
}
