//! Type predicates: is_num, is_str, is_list, is_fun

use crate::error::RuntimeError;
use crate::position::Span;
use crate::value::{BuiltInValue, Value};
use std::rc::Rc;

fn builtin_is_num(args: &[Value], _span: &Span, _stdout: &mut String) -> Result<Value, RuntimeError> {
    Ok(Value::bool_value(matches!(args[0], Value::Number(_))))
}

fn builtin_is_str(args: &[Value], _span: &Span, _stdout: &mut String) -> Result<Value, RuntimeError> {
    Ok(Value::bool_value(matches!(args[0], Value::String(_))))
}

fn builtin_is_list(args: &[Value], _span: &Span, _stdout: &mut String) -> Result<Value, RuntimeError> {
    Ok(Value::bool_value(matches!(args[0], Value::List(_))))
}

fn builtin_is_fun(args: &[Value], _span: &Span, _stdout: &mut String) -> Result<Value, RuntimeError> {
    Ok(Value::bool_value(matches!(args[0], Value::Function(_) | Value::BuiltIn(_))))
}

pub fn register(env: &Rc<crate::env::Environment>) {
    let predicates: &[(&str, crate::value::BuiltinFn)] = &[
        ("is_num", builtin_is_num),
        ("is_str", builtin_is_str),
        ("is_list", builtin_is_list),
        ("is_fun", builtin_is_fun),
    ];
    for (name, handler) in predicates {
        env.define(
            name.to_string(),
            Value::BuiltIn(Rc::new(BuiltInValue {
                name: name.to_string(),
                params: vec!["value".to_string()],
                min_args: 1,
                max_args: 1,
                handler: *handler,
            })),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Position;
    use crate::value::Number;

    fn span() -> Span {
        let p = Position::new(Rc::from("t"), Rc::from(""));
        Span::new(p.clone(), p)
    }

    #[test]
    fn test_is_num_true_for_number_false_otherwise() {
        let mut stdout = String::new();
        assert!(matches!(
            builtin_is_num(&[Value::Number(Number::Int(1))], &span(), &mut stdout),
            Ok(Value::Number(Number::Int(1)))
        ));
        assert!(matches!(
            builtin_is_num(&[Value::String("x".to_string())], &span(), &mut stdout),
            Ok(Value::Number(Number::Int(0)))
        ));
    }

    #[test]
    fn test_is_fun_true_for_both_function_kinds() {
        let mut stdout = String::new();
        let builtin = Value::BuiltIn(Rc::new(BuiltInValue {
            name: "x".to_string(),
            params: vec![],
            min_args: 0,
            max_args: 0,
            handler: builtin_is_num,
        }));
        assert!(matches!(builtin_is_fun(&[builtin], &span(), &mut stdout), Ok(Value::Number(Number::Int(1)))));
    }
}
