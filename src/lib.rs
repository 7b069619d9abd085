// ABOUTME: Library entry point wiring lexer, parser, evaluator, and trace together

pub mod ast;
pub mod builtins;
pub mod env;
pub mod error;
pub mod eval;
pub mod header;
pub mod lexer;
pub mod parser;
pub mod position;
pub mod token;
pub mod trace;
pub mod value;

pub mod config;

use env::Environment;
use error::Traceback;
use lexer::Lexer;
use parser::Parser;
use std::rc::Rc;
use trace::{ErrorObject, Trace, TraceCollector};
use value::Value;

/// Lexes, parses, and evaluates `source` against a fresh environment seeded
/// with the pre-registered built-ins, returning the structured trace
/// (SPEC_FULL.md §6). Always returns a trace, even on failure.
pub fn run(file_name: &str, source: &str) -> Trace {
    let env = Environment::new();
    builtins::register_builtins(&env);
    let (trace, _) = run_with_env(file_name, source, env);
    trace
}

/// Runs `source` against an existing environment, returning the trace
/// alongside the program's final value (unit on failure). Used directly by
/// the REPL (to persist bindings across lines) and by `ava_exec` (with a
/// fresh environment per nested run), both of which need the final value
/// rather than just the serialized trace.
pub fn run_with_env(file_name: &str, source: &str, env: Rc<Environment>) -> (Trace, Value) {
    let mut collector = TraceCollector::new(file_name);

    if let Some(header) = header::extract_header(source) {
        collector.set_header(header);
    }

    let tokens = match Lexer::new(file_name, source).make_tokens() {
        Ok(tokens) => tokens,
        Err(err) => {
            let error = ErrorObject::from_lex(&err);
            let trace = collector.finish(env.snapshot_all(), &Value::unit(), Some(error));
            return (trace, Value::unit());
        }
    };
    collector.record_tokens(&tokens);

    let root = match Parser::new(tokens).parse() {
        Ok(root) => root,
        Err(err) => {
            let error = ErrorObject::from_parse(&err);
            let trace = collector.finish(env.snapshot_all(), &Value::unit(), Some(error));
            return (trace, Value::unit());
        }
    };
    collector.record_root_repr(root.repr());

    match eval::eval_program(&root, &env, &mut collector) {
        Ok(value) => {
            let trace = collector.finish(env.snapshot_all(), &value, None);
            (trace, value)
        }
        Err(traceback) => report_runtime_error(collector, &env, traceback),
    }
}

fn report_runtime_error(collector: TraceCollector, env: &Rc<Environment>, traceback: Traceback) -> (Trace, Value) {
    let error = ErrorObject::from(&traceback);
    let trace = collector.finish(env.snapshot_all(), &Value::unit(), Some(error));
    (trace, Value::unit())
}
