// ABOUTME: Tree-walking evaluator turning an AST into a value plus execution trace

use crate::ast::{BinOpKind, Node, UnaryOpKind};
use crate::env::Environment;
use crate::error::{RuntimeError, Traceback, TracebackFrame};
use crate::position::Span;
use crate::trace::TraceCollector;
use crate::value::{BuiltInValue, FunctionValue, ListHandle, Number, Value};
use std::rc::Rc;

/// What evaluating one AST node produced: a plain value, or one of the three
/// control-flow signals that propagate until an enclosing construct (a loop
/// for break/continue, a function body for return) consumes it.
pub enum Signal {
    Value(Value),
    Return(Value, Span),
    Break(Span),
    Continue(Span),
}

/// Unwraps a `Signal` to its `Value`, propagating any other signal out of the
/// enclosing `eval_inner` arm immediately. Mirrors `?` for the one case `?`
/// can't express: "return early with something that isn't an error".
macro_rules! eval_value {
    ($node:expr, $env:expr, $trace:expr) => {{
        match eval($node, $env, $trace)? {
            Signal::Value(v) => v,
            other => return Ok(other),
        }
    }};
}

/// Evaluates the program's root node. A control-flow signal reaching this
/// point (a `return`/`break`/`continue` with no enclosing function/loop) is
/// a runtime error (SPEC_FULL.md §9 Open Questions decision).
pub fn eval_program(root: &Node, env: &Rc<Environment>, trace: &mut TraceCollector) -> Result<Value, Traceback> {
    match eval(root, env, trace)? {
        Signal::Value(v) => Ok(v),
        Signal::Return(_, span) => Err(Traceback::new(RuntimeError::ControlFlowOutsideConstruct {
            construct: "return",
            span,
        })),
        Signal::Break(span) => Err(Traceback::new(RuntimeError::ControlFlowOutsideConstruct {
            construct: "break",
            span,
        })),
        Signal::Continue(span) => Err(Traceback::new(RuntimeError::ControlFlowOutsideConstruct {
            construct: "continue",
            span,
        })),
    }
}

pub fn eval(node: &Node, env: &Rc<Environment>, trace: &mut TraceCollector) -> Result<Signal, Traceback> {
    let span = node.span().clone();
    let kind = node.kind_name();
    trace.enter_node(kind, &span);
    let result = eval_inner(node, env, trace);
    trace.exit_node(kind, &span);
    result
}

fn eval_inner(node: &Node, env: &Rc<Environment>, trace: &mut TraceCollector) -> Result<Signal, Traceback> {
    match node {
        Node::Number(n, _) => Ok(Signal::Value(Value::Number(*n))),
        Node::Str(s, _) => Ok(Signal::Value(Value::String(s.clone()))),

        Node::List(elements, _) => {
            let mut values = Vec::with_capacity(elements.len());
            for el in elements {
                values.push(eval_value!(el, env, trace));
            }
            Ok(Signal::Value(Value::list(values)))
        }

        Node::Block(statements, _) => {
            let mut last = Value::unit();
            for stmt in statements {
                match eval(stmt, env, trace)? {
                    Signal::Value(v) => last = v,
                    other => return Ok(other),
                }
            }
            Ok(Signal::Value(last))
        }

        Node::VarAccess(name, span) => match env.get(name) {
            Some(value) => Ok(Signal::Value(value)),
            None => Err(Traceback::new(RuntimeError::UndefinedName {
                name: name.clone(),
                span: span.clone(),
            })),
        },

        Node::VarAssign(name, expr, _) => {
            let value = eval_value!(expr, env, trace);
            env.define(name.clone(), value.clone());
            trace.var_assign(name, &value);
            Ok(Signal::Value(value))
        }

        Node::BinOp(op, left, right, span) => {
            let left_value = eval_value!(left, env, trace);
            let right_value = eval_value!(right, env, trace);
            Ok(Signal::Value(eval_binop(*op, left_value, right_value, span)?))
        }

        Node::UnaryOp(op, operand, span) => {
            let value = eval_value!(operand, env, trace);
            Ok(Signal::Value(eval_unaryop(*op, value, span)?))
        }

        Node::If { cases, else_case, .. } => {
            for case in cases {
                let condition = eval_value!(&case.condition, env, trace);
                if condition.is_truthy() {
                    return match eval(&case.body, env, trace)? {
                        Signal::Value(v) => {
                            Ok(Signal::Value(if case.returns_unit { Value::unit() } else { v }))
                        }
                        other => Ok(other),
                    };
                }
            }
            if let Some((body, returns_unit)) = else_case {
                return match eval(body, env, trace)? {
                    Signal::Value(v) => Ok(Signal::Value(if *returns_unit { Value::unit() } else { v })),
                    other => Ok(other),
                };
            }
            Ok(Signal::Value(Value::unit()))
        }

        Node::For {
            var_name,
            start,
            end,
            step,
            body,
            returns_unit,
            span,
        } => {
            let start_value = eval_value!(start, env, trace);
            let end_value = eval_value!(end, env, trace);
            let step_value = match step {
                Some(s) => eval_value!(s, env, trace),
                None => Value::Number(Number::Int(1)),
            };

            let mut current = expect_number(&start_value, start.span())?;
            let end_n = expect_number(&end_value, end.span())?;
            let step_n = expect_number(&step_value, step.as_ref().map(|s| s.span()).unwrap_or(start.span()))?;

            let mut results = Vec::new();
            loop {
                let keep_going = if step_n.as_f64() >= 0.0 {
                    current.as_f64() < end_n.as_f64()
                } else {
                    current.as_f64() > end_n.as_f64()
                };
                if !keep_going {
                    break;
                }

                env.define(var_name.clone(), Value::Number(current));
                match eval(body, env, trace)? {
                    Signal::Value(v) => {
                        if !returns_unit {
                            results.push(v);
                        }
                    }
                    Signal::Continue(_) => {}
                    Signal::Break(_) => break,
                    other @ Signal::Return(..) => return Ok(other),
                }

                current = match eval_binop(BinOpKind::Add, Value::Number(current), Value::Number(step_n), span)? {
                    Value::Number(n) => n,
                    _ => unreachable!("numeric add always yields a Number"),
                };
            }
            env.remove(var_name);

            Ok(Signal::Value(if *returns_unit { Value::unit() } else { Value::list(results) }))
        }

        Node::While {
            condition,
            body,
            returns_unit,
            ..
        } => {
            let mut results = Vec::new();
            loop {
                let cond_value = eval_value!(condition, env, trace);
                if !cond_value.is_truthy() {
                    break;
                }
                match eval(body, env, trace)? {
                    Signal::Value(v) => {
                        if !returns_unit {
                            results.push(v);
                        }
                    }
                    Signal::Continue(_) => {}
                    Signal::Break(_) => break,
                    other @ Signal::Return(..) => return Ok(other),
                }
            }
            Ok(Signal::Value(if *returns_unit { Value::unit() } else { Value::list(results) }))
        }

        Node::FuncDef {
            name,
            params,
            body,
            auto_return,
            ..
        } => {
            let func = Rc::new(FunctionValue {
                name: name.clone(),
                params: params.clone(),
                body: (**body).clone(),
                env: env.clone(),
                auto_return: *auto_return,
            });
            let value = Value::Function(func);
            if let Some(n) = name {
                env.define(n.clone(), value.clone());
            }
            Ok(Signal::Value(value))
        }

        Node::Call { callee, args, span } => {
            let callee_value = eval_value!(callee, env, trace);
            let mut arg_values = Vec::with_capacity(args.len());
            for arg in args {
                arg_values.push(eval_value!(arg, env, trace));
            }

            trace.call(&display_name(&callee_value), &arg_values);

            let result = match &callee_value {
                Value::Function(func) => call_function(func, arg_values, span, trace),
                Value::BuiltIn(builtin) => call_builtin(builtin, &arg_values, span, trace),
                _ => Err(Traceback::new(RuntimeError::IllegalOperation { span: span.clone() })),
            }?;
            Ok(Signal::Value(result))
        }

        Node::Return(expr, span) => {
            let value = match expr {
                Some(e) => eval_value!(e, env, trace),
                None => Value::unit(),
            };
            trace.ret(&value);
            Ok(Signal::Return(value, span.clone()))
        }

        Node::Continue(span) => Ok(Signal::Continue(span.clone())),
        Node::Break(span) => Ok(Signal::Break(span.clone())),
    }
}

fn display_name(value: &Value) -> String {
    match value {
        Value::Function(f) => f.name.clone().unwrap_or_else(|| "<anonymous>".to_string()),
        Value::BuiltIn(b) => b.name.clone(),
        other => other.to_string(),
    }
}

fn expect_number(value: &Value, span: &Span) -> Result<Number, Traceback> {
    match value {
        Value::Number(n) => Ok(*n),
        _ => Err(Traceback::new(RuntimeError::IllegalOperation { span: span.clone() })),
    }
}

fn call_function(
    func: &Rc<FunctionValue>,
    args: Vec<Value>,
    call_span: &Span,
    trace: &mut TraceCollector,
) -> Result<Value, Traceback> {
    if args.len() != func.params.len() {
        return Err(Traceback::new(RuntimeError::ArityMismatch {
            function: func.name.clone().unwrap_or_else(|| "<anonymous>".to_string()),
            expected: func.params.len(),
            actual: args.len(),
            span: call_span.clone(),
        }));
    }

    let call_env = Environment::with_parent(func.env.clone());
    for (param, arg) in func.params.iter().zip(args) {
        call_env.define(param.clone(), arg);
    }

    match eval(&func.body, &call_env, trace) {
        Err(mut traceback) => {
            traceback.push_frame(TracebackFrame {
                display_name: func.name.clone().unwrap_or_else(|| "<anonymous>".to_string()),
                position: call_span.start.clone(),
            });
            Err(traceback)
        }
        Ok(Signal::Value(v)) => Ok(if func.auto_return { v } else { Value::unit() }),
        Ok(Signal::Return(v, _)) => Ok(v),
        Ok(Signal::Break(span)) => Err(Traceback::new(RuntimeError::ControlFlowOutsideConstruct {
            construct: "break",
            span,
        })),
        Ok(Signal::Continue(span)) => Err(Traceback::new(RuntimeError::ControlFlowOutsideConstruct {
            construct: "continue",
            span,
        })),
    }
}

fn call_builtin(
    builtin: &Rc<BuiltInValue>,
    args: &[Value],
    call_span: &Span,
    trace: &mut TraceCollector,
) -> Result<Value, Traceback> {
    if args.len() < builtin.min_args || args.len() > builtin.max_args {
        return Err(Traceback::new(RuntimeError::ArityRangeMismatch {
            function: builtin.name.clone(),
            min: builtin.min_args,
            max: builtin.max_args,
            actual: args.len(),
            span: call_span.clone(),
        }));
    }
    (builtin.handler)(args, call_span, trace.stdout_buffer_mut()).map_err(Traceback::new)
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::String(x), Value::String(y)) => x == y,
        (Value::List(x), Value::List(y)) => {
            let xb = x.borrow();
            let yb = y.borrow();
            xb.len() == yb.len() && xb.iter().zip(yb.iter()).all(|(p, q)| values_equal(p, q))
        }
        (Value::Function(x), Value::Function(y)) => Rc::ptr_eq(x, y),
        (Value::BuiltIn(x), Value::BuiltIn(y)) => Rc::ptr_eq(x, y),
        _ => false,
    }
}

fn normalize_index(index: i64, len: usize, span: &Span) -> Result<usize, Traceback> {
    let signed_len = len as i64;
    let resolved = if index < 0 { index + signed_len } else { index };
    if resolved < 0 || resolved >= signed_len {
        Err(Traceback::new(RuntimeError::IndexOutOfBounds {
            index,
            length: len,
            span: span.clone(),
        }))
    } else {
        Ok(resolved as usize)
    }
}

fn eval_unaryop(op: UnaryOpKind, value: Value, span: &Span) -> Result<Value, Traceback> {
    match (op, value) {
        (UnaryOpKind::Not, v) => Ok(Value::bool_value(!v.is_truthy())),
        (UnaryOpKind::Plus, Value::Number(n)) => Ok(Value::Number(n)),
        (UnaryOpKind::Minus, Value::Number(Number::Int(i))) => Ok(Value::Number(
            i.checked_neg().map(Number::Int).unwrap_or_else(|| Number::Float(-(i as f64))),
        )),
        (UnaryOpKind::Minus, Value::Number(Number::Float(f))) => Ok(Value::Number(Number::Float(-f))),
        _ => Err(Traceback::new(RuntimeError::IllegalOperation { span: span.clone() })),
    }
}

fn eval_binop(op: BinOpKind, left: Value, right: Value, span: &Span) -> Result<Value, Traceback> {
    match op {
        BinOpKind::Eq => return Ok(Value::bool_value(values_equal(&left, &right))),
        BinOpKind::Ne => return Ok(Value::bool_value(!values_equal(&left, &right))),
        BinOpKind::And => return Ok(Value::bool_value(left.is_truthy() && right.is_truthy())),
        BinOpKind::Or => return Ok(Value::bool_value(left.is_truthy() || right.is_truthy())),
        _ => {}
    }

    match (op, left, right) {
        (BinOpKind::Add, Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
        (BinOpKind::Add, Value::List(list), value) => Ok(list_add(&list, value)),
        (BinOpKind::Sub, Value::List(list), Value::Number(Number::Int(index))) => list_sub(&list, index, span),
        (BinOpKind::Mul, Value::String(s), Value::Number(n)) => {
            Ok(Value::String(s.repeat(n.as_f64().max(0.0) as usize)))
        }
        (BinOpKind::Mul, Value::List(a), Value::List(b)) => Ok(list_mul(&a, &b)),
        (BinOpKind::Div, Value::List(list), Value::Number(Number::Int(index))) => list_div(&list, index, span),
        (op, Value::Number(a), Value::Number(b)) => numeric_binop(op, a, b, span),
        _ => Err(Traceback::new(RuntimeError::IllegalOperation { span: span.clone() })),
    }
}

/// `xs + v` mutates `xs`'s backing storage in place and returns the same
/// list, rather than a deep copy: the original's `List.copy()` is a shallow
/// alias (`List(self.elements)` shares the same `elements` object), so
/// `added_to`'s `.append()` on "the copy" is visible through every handle to
/// the original list too. This is deliberate fidelity to that aliasing
/// behavior, not an oversight — see SPEC_FULL.md §9.
fn list_add(list: &ListHandle, value: Value) -> Value {
    list.borrow_mut().push(value);
    Value::List(Rc::clone(list))
}

fn list_sub(list: &ListHandle, index: i64, span: &Span) -> Result<Value, Traceback> {
    let idx = normalize_index(index, list.borrow().len(), span)?;
    list.borrow_mut().remove(idx);
    Ok(Value::List(Rc::clone(list)))
}

fn list_mul(a: &ListHandle, b: &ListHandle) -> Value {
    let extra: Vec<Value> = b.borrow().clone();
    a.borrow_mut().extend(extra);
    Value::List(Rc::clone(a))
}

fn list_div(list: &ListHandle, index: i64, span: &Span) -> Result<Value, Traceback> {
    let elements = list.borrow();
    let idx = normalize_index(index, elements.len(), span)?;
    Ok(elements[idx].clone())
}

fn numeric_binop(op: BinOpKind, a: Number, b: Number, span: &Span) -> Result<Value, Traceback> {
    use BinOpKind::*;
    match op {
        Add => Ok(Value::Number(checked_or_float(a, b, i64::checked_add, |x, y| x + y))),
        Sub => Ok(Value::Number(checked_or_float(a, b, i64::checked_sub, |x, y| x - y))),
        Mul => Ok(Value::Number(checked_or_float(a, b, i64::checked_mul, |x, y| x * y))),
        Div => {
            if b.as_f64() == 0.0 {
                return Err(Traceback::new(RuntimeError::DivisionByZero { span: span.clone() }));
            }
            Ok(Value::Number(Number::Float(a.as_f64() / b.as_f64())))
        }
        Pow => Ok(Value::Number(pow_number(a, b))),
        Lt => Ok(Value::bool_value(a.as_f64() < b.as_f64())),
        Gt => Ok(Value::bool_value(a.as_f64() > b.as_f64())),
        Le => Ok(Value::bool_value(a.as_f64() <= b.as_f64())),
        Ge => Ok(Value::bool_value(a.as_f64() >= b.as_f64())),
        Eq | Ne | And | Or => unreachable!("handled before dispatch to numeric_binop"),
    }
}

fn checked_or_float(a: Number, b: Number, checked: fn(i64, i64) -> Option<i64>, floatf: fn(f64, f64) -> f64) -> Number {
    match (a, b) {
        (Number::Int(x), Number::Int(y)) => match checked(x, y) {
            Some(v) => Number::Int(v),
            None => Number::Float(floatf(x as f64, y as f64)),
        },
        _ => Number::Float(floatf(a.as_f64(), b.as_f64())),
    }
}

fn pow_number(a: Number, b: Number) -> Number {
    match (a, b) {
        (Number::Int(x), Number::Int(y)) if (0..=(u32::MAX as i64)).contains(&y) => match x.checked_pow(y as u32) {
            Some(v) => Number::Int(v),
            None => Number::Float((x as f64).powf(y as f64)),
        },
        _ => Number::Float(a.as_f64().powf(b.as_f64())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::Environment;
    use crate::lexer::Lexer;
    use crate::parser::Parser;
    use crate::trace::TraceCollector;

    fn run(source: &str) -> Result<Value, Traceback> {
        let tokens = Lexer::new("<test>", source).make_tokens().expect("lex");
        let ast = Parser::new(tokens).parse().expect("parse");
        let env = Environment::new();
        let mut trace = TraceCollector::new("<test>");
        eval_program(&ast, &env, &mut trace)
    }

    fn run_env(source: &str, env: &Rc<Environment>) -> Result<Value, Traceback> {
        let tokens = Lexer::new("<test>", source).make_tokens().expect("lex");
        let ast = Parser::new(tokens).parse().expect("parse");
        let mut trace = TraceCollector::new("<test>");
        eval_program(&ast, env, &mut trace)
    }

    #[test]
    fn test_arithmetic_precedence() {
        let value = run("1 + 2 * 3").unwrap();
        assert!(matches!(value, Value::Number(Number::Int(7))));
    }

    #[test]
    fn test_var_always_shadows_current_scope() {
        let env = Environment::new();
        run_env("var i = 0", &env).unwrap();
        run_env("while i < 3 then var i = i + 1 end", &env).unwrap();
        let value = run_env("i", &env).unwrap();
        assert!(matches!(value, Value::Number(Number::Int(3))));
    }

    #[test]
    fn test_function_call_with_auto_return() {
        let env = Environment::new();
        run_env("fun add1(n) -> n + 1", &env).unwrap();
        let value = run_env("add1(41)", &env).unwrap();
        assert!(matches!(value, Value::Number(Number::Int(42))));
    }

    #[test]
    fn test_if_single_line_picks_true_branch() {
        let value = run("if 0 then 1 else 2").unwrap();
        assert!(matches!(value, Value::Number(Number::Int(2))));
    }

    #[test]
    fn test_for_expression_form_collects_values() {
        let value = run("for i = 0 to 3 then i * 2").unwrap();
        match value {
            Value::List(items) => {
                let items = items.borrow();
                assert_eq!(items.len(), 3);
                assert!(matches!(items[2], Value::Number(Number::Int(4))));
            }
            other => panic!("expected list, got {:?}", other),
        }
    }

    #[test]
    fn test_division_by_zero_is_runtime_error() {
        let err = run("1 / 0").unwrap_err();
        assert!(matches!(err.error, RuntimeError::DivisionByZero { .. }));
    }

    #[test]
    fn test_undefined_name_is_runtime_error() {
        let err = run("nope").unwrap_err();
        assert!(matches!(err.error, RuntimeError::UndefinedName { .. }));
    }

    #[test]
    fn test_arity_mismatch() {
        let env = Environment::new();
        run_env("fun f(a, b) -> a + b", &env).unwrap();
        let err = run_env("f(1)", &env).unwrap_err();
        assert!(matches!(err.error, RuntimeError::ArityMismatch { .. }));
    }

    #[test]
    fn test_break_outside_loop_is_runtime_error() {
        let err = run("break").unwrap_err();
        assert!(matches!(err.error, RuntimeError::ControlFlowOutsideConstruct { .. }));
    }

    #[test]
    fn test_list_add_mutates_operand_in_place() {
        // `xs + 3` aliases xs's backing storage rather than copying it, matching
        // the original's shallow `List.copy()` — ys and xs observe the same list.
        let env = Environment::new();
        run_env("var xs = [1, 2]", &env).unwrap();
        run_env("var ys = xs + 3", &env).unwrap();
        let xs = run_env("xs", &env).unwrap();
        match xs {
            Value::List(items) => assert_eq!(items.borrow().len(), 3),
            other => panic!("expected list, got {:?}", other),
        }
    }

    #[test]
    fn test_list_sub_mutates_operand_in_place() {
        let env = Environment::new();
        run_env("var xs = [1, 2, 3]", &env).unwrap();
        run_env("var ys = xs - 0", &env).unwrap();
        let xs = run_env("xs", &env).unwrap();
        match xs {
            Value::List(items) => assert_eq!(items.borrow().len(), 2),
            other => panic!("expected list, got {:?}", other),
        }
    }

    #[test]
    fn test_list_mul_mutates_operand_in_place() {
        let env = Environment::new();
        run_env("var xs = [1, 2]", &env).unwrap();
        run_env("var zs = [3, 4]", &env).unwrap();
        run_env("var ys = xs * zs", &env).unwrap();
        let xs = run_env("xs", &env).unwrap();
        match xs {
            Value::List(items) => assert_eq!(items.borrow().len(), 4),
            other => panic!("expected list, got {:?}", other),
        }
    }

    #[test]
    fn test_negative_index_counts_from_end() {
        let env = Environment::new();
        run_env("var xs = [1, 2, 3]", &env).unwrap();
        let value = run_env("xs / -1", &env).unwrap();
        assert!(matches!(value, Value::Number(Number::Int(3))));
    }

    #[test]
    fn test_integer_overflow_falls_back_to_float() {
        let value = run(&format!("{} * 2", i64::MAX)).unwrap();
        assert!(matches!(value, Value::Number(Number::Float(_))));
    }

    #[test]
    fn test_not_not_x_equals_x_coerced() {
        let value = run("not not 5").unwrap();
        assert!(matches!(value, Value::Number(Number::Int(1))));
        let value = run("not not 0").unwrap();
        assert!(matches!(value, Value::Number(Number::Int(0))));
    }

    #[test]
    fn test_block_form_if_returns_unit() {
        let value = run("if 1 then\nvar x = 1\nend").unwrap();
        assert!(matches!(value, Value::Number(Number::Int(0))));
    }
}
