//! `ava_exec`: read a script file and recursively invoke `run` on it

use crate::error::RuntimeError;
use crate::position::Span;
use crate::value::{BuiltInValue, Value};
use std::rc::Rc;

fn builtin_ava_exec(args: &[Value], span: &Span, stdout: &mut String) -> Result<Value, RuntimeError> {
    let path = match &args[0] {
        Value::String(s) => s.clone(),
        _ => return Err(RuntimeError::IllegalOperation { span: span.clone() }),
    };

    let source = std::fs::read_to_string(&path).map_err(|e| RuntimeError::Custom {
        message: format!("ava_exec: could not read '{}': {}", path, e),
        span: span.clone(),
    })?;

    let header = crate::header::extract_header(&source);
    if header.as_ref().map(|h| h.is_null()).unwrap_or(true) {
        return Err(RuntimeError::Custom {
            message: format!("ava_exec: '{}' is missing a required header", path),
            span: span.clone(),
        });
    }

    let (nested_trace, nested_value) = crate::run_with_env(&path, &source, crate::env::Environment::new());
    stdout.push_str(&nested_trace.stdout);
    if let Some(error) = &nested_trace.error {
        return Err(RuntimeError::Custom {
            message: format!("ava_exec: '{}' raised {}: {}", path, error.name, error.details),
            span: span.clone(),
        });
    }

    Ok(nested_value)
}

pub fn register(env: &Rc<crate::env::Environment>) {
    env.define(
        "ava_exec".to_string(),
        Value::BuiltIn(Rc::new(BuiltInValue {
            name: "ava_exec".to_string(),
            params: vec!["path".to_string()],
            min_args: 1,
            max_args: 1,
            handler: builtin_ava_exec,
        })),
    );
}
