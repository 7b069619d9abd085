//! Console and host I/O: show, print_ret, input, input_int, clear
//!
//! - `show`: print the stringified value plus a newline; returns unit
//! - `print_ret`: return the string form of a value without printing it
//! - `input`: read one line from host stdin
//! - `input_int`: read lines, reprompting until one parses as an integer
//! - `clear`: host-defined screen clear; returns unit

use crate::error::RuntimeError;
use crate::position::Span;
use crate::value::{BuiltInValue, Value};
use std::io::{self, Write};
use std::rc::Rc;

fn builtin_show(args: &[Value], _span: &Span, stdout: &mut String) -> Result<Value, RuntimeError> {
    stdout.push_str(&args[0].to_string());
    stdout.push('\n');
    Ok(Value::unit())
}

fn builtin_print_ret(args: &[Value], _span: &Span, _stdout: &mut String) -> Result<Value, RuntimeError> {
    Ok(Value::String(args[0].to_string()))
}

fn read_line() -> String {
    let mut line = String::new();
    io::stdin().read_line(&mut line).ok();
    line.trim_end_matches(['\n', '\r']).to_string()
}

fn builtin_input(_args: &[Value], _span: &Span, _stdout: &mut String) -> Result<Value, RuntimeError> {
    Ok(Value::String(read_line()))
}

fn builtin_input_int(_args: &[Value], _span: &Span, stdout: &mut String) -> Result<Value, RuntimeError> {
    loop {
        let line = read_line();
        match line.trim().parse::<i64>() {
            Ok(n) => return Ok(Value::Number(crate::value::Number::Int(n))),
            Err(_) => {
                stdout.push_str("Invalid integer, try again\n");
                print!("Invalid integer, try again\n");
                io::stdout().flush().ok();
            }
        }
    }
}

fn builtin_clear(_args: &[Value], _span: &Span, _stdout: &mut String) -> Result<Value, RuntimeError> {
    print!("\x1B[2J\x1B[1;1H");
    io::stdout().flush().ok();
    Ok(Value::unit())
}

pub fn register(env: &Rc<crate::env::Environment>) {
    env.define(
        "show".to_string(),
        Value::BuiltIn(Rc::new(BuiltInValue {
            name: "show".to_string(),
            params: vec!["value".to_string()],
            min_args: 1,
            max_args: 1,
            handler: builtin_show,
        })),
    );
    env.define(
        "print_ret".to_string(),
        Value::BuiltIn(Rc::new(BuiltInValue {
            name: "print_ret".to_string(),
            params: vec!["value".to_string()],
            min_args: 1,
            max_args: 1,
            handler: builtin_print_ret,
        })),
    );
    env.define(
        "input".to_string(),
        Value::BuiltIn(Rc::new(BuiltInValue {
            name: "input".to_string(),
            params: vec![],
            min_args: 0,
            max_args: 0,
            handler: builtin_input,
        })),
    );
    env.define(
        "input_int".to_string(),
        Value::BuiltIn(Rc::new(BuiltInValue {
            name: "input_int".to_string(),
            params: vec![],
            min_args: 0,
            max_args: 0,
            handler: builtin_input_int,
        })),
    );
    env.define(
        "clear".to_string(),
        Value::BuiltIn(Rc::new(BuiltInValue {
            name: "clear".to_string(),
            params: vec![],
            min_args: 0,
            max_args: 0,
            handler: builtin_clear,
        })),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Position;

    fn span() -> Span {
        let p = Position::new(Rc::from("t"), Rc::from(""));
        Span::new(p.clone(), p)
    }

    #[test]
    fn test_show_writes_value_and_newline_to_stdout_buffer() {
        let mut stdout = String::new();
        let result = builtin_show(&[Value::Number(crate::value::Number::Int(42))], &span(), &mut stdout);
        assert!(matches!(result, Ok(Value::Number(crate::value::Number::Int(0)))));
        assert_eq!(stdout, "42\n");
    }

    #[test]
    fn test_print_ret_returns_string_without_writing_stdout() {
        let mut stdout = String::new();
        let result = builtin_print_ret(&[Value::Number(crate::value::Number::Int(7))], &span(), &mut stdout);
        assert!(matches!(result, Ok(Value::String(s)) if s == "7"));
        assert!(stdout.is_empty());
    }
}
