// ABOUTME: Structured per-run execution trace accumulated during lex/parse/eval

use crate::error::Traceback;
use crate::position::{Position, Span};
use crate::token::Token;
use crate::value::Value;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Instant;

#[derive(Debug, Clone, Serialize)]
pub struct PosRecord {
    pub idx: usize,
    pub line: usize,
    pub column: usize,
}

impl From<&Position> for PosRecord {
    fn from(p: &Position) -> PosRecord {
        PosRecord {
            idx: p.byte_index,
            line: p.display_line(),
            column: p.column,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SpanRecord {
    pub pos_start: PosRecord,
    pub pos_end: PosRecord,
}

impl From<&Span> for SpanRecord {
    fn from(s: &Span) -> SpanRecord {
        SpanRecord {
            pos_start: PosRecord::from(&s.start),
            pos_end: PosRecord::from(&s.end),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenRecord {
    pub kind: &'static str,
    pub literal: Option<String>,
    pub pos_start: PosRecord,
    pub pos_end: PosRecord,
}

impl From<&Token> for TokenRecord {
    fn from(tok: &Token) -> TokenRecord {
        let literal = match &tok.kind {
            crate::token::TokenKind::Int(n) => Some(n.to_string()),
            crate::token::TokenKind::Float(n) => Some(n.to_string()),
            crate::token::TokenKind::Str(s) => Some(s.clone()),
            crate::token::TokenKind::Ident(s) => Some(s.clone()),
            crate::token::TokenKind::Keyword(s) => Some(s.clone()),
            _ => None,
        };
        TokenRecord {
            kind: tok.kind.tag(),
            literal,
            pos_start: PosRecord::from(&tok.span.start),
            pos_end: PosRecord::from(&tok.span.end),
        }
    }
}

/// One entry in the execution event log (§4.3/§4.5). Every variant carries a
/// monotonically increasing `id`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ExecutionEvent {
    EnterNode { id: u64, kind: &'static str, span: SpanRecord },
    ExitNode { id: u64, kind: &'static str, span: SpanRecord },
    VarAssign { id: u64, name: String, value: serde_json::Value },
    Call { id: u64, callee: String, args: Vec<serde_json::Value> },
    Return { id: u64, value: serde_json::Value },
}

#[derive(Debug, Clone, Serialize)]
pub struct LexerTrace {
    pub tokens: Vec<TokenRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParserTrace {
    pub root_repr: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExecutionTrace {
    pub events: Vec<ExecutionEvent>,
    pub stdout: String,
    pub final_value: serde_json::Value,
    pub header: Option<serde_json::Value>,
    pub pow: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TraceInner {
    pub lexer: LexerTrace,
    pub parser: ParserTrace,
    pub execution: ExecutionTrace,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorObject {
    pub name: String,
    pub details: String,
    pub pos_start: PosRecord,
    pub pos_end: PosRecord,
    pub traceback_str: String,
}

impl From<&Traceback> for ErrorObject {
    fn from(tb: &Traceback) -> ErrorObject {
        let span = tb.error.span();
        ErrorObject {
            name: tb.error.name().to_string(),
            details: tb.error.details(),
            pos_start: PosRecord::from(&span.start),
            pos_end: PosRecord::from(&span.end),
            traceback_str: tb.as_string(),
        }
    }
}

impl ErrorObject {
    pub fn from_lex(err: &crate::error::LexError) -> ErrorObject {
        let span = err.span();
        ErrorObject {
            name: err.name().to_string(),
            details: err.details(),
            pos_start: PosRecord::from(&span.start),
            pos_end: PosRecord::from(&span.end),
            traceback_str: crate::error::render_lex_error(err),
        }
    }

    pub fn from_parse(err: &crate::error::ParseError) -> ErrorObject {
        ErrorObject {
            name: "Invalid Syntax".to_string(),
            details: err.message.clone(),
            pos_start: PosRecord::from(&err.span.start),
            pos_end: PosRecord::from(&err.span.end),
            traceback_str: crate::error::render_parse_error(err),
        }
    }
}

/// The shape returned to hosts from `run()` (SPEC_FULL.md §6).
#[derive(Debug, Clone, Serialize)]
pub struct Trace {
    pub file: String,
    pub elapsed: f64,
    pub trace: TraceInner,
    pub stdout: String,
    pub final_value: serde_json::Value,
    pub symbols_end: HashMap<String, serde_json::Value>,
    pub error: Option<ErrorObject>,
}

/// Converts a runtime `Value` into the JSON shape used throughout the trace:
/// Numbers/Strings as themselves, Lists recursively, functions as their
/// `"<function NAME>"` / `"<built-in function NAME>"` display strings.
pub fn serialize_value(value: &Value) -> serde_json::Value {
    match value {
        Value::Number(crate::value::Number::Int(n)) => serde_json::json!(n),
        Value::Number(crate::value::Number::Float(f)) => serde_json::json!(f),
        Value::String(s) => serde_json::json!(s),
        Value::List(items) => {
            serde_json::Value::Array(items.borrow().iter().map(serialize_value).collect())
        }
        Value::Function(_) | Value::BuiltIn(_) => serde_json::json!(value.to_string()),
    }
}

/// Accumulates one run's token list, root AST summary, execution events,
/// captured stdout, and header dict. Re-entrant: `ava_exec` constructs its
/// own nested `TraceCollector` rather than sharing this one (§5/§9).
pub struct TraceCollector {
    file_name: String,
    start: Instant,
    tokens: Vec<TokenRecord>,
    root_repr: String,
    events: Vec<ExecutionEvent>,
    stdout: String,
    header: Option<serde_json::Value>,
    next_event_id: u64,
}

impl TraceCollector {
    pub fn new(file_name: &str) -> TraceCollector {
        TraceCollector {
            file_name: file_name.to_string(),
            start: Instant::now(),
            tokens: Vec::new(),
            root_repr: String::new(),
            events: Vec::new(),
            stdout: String::new(),
            header: None,
            next_event_id: 0,
        }
    }

    pub fn record_tokens(&mut self, tokens: &[Token]) {
        self.tokens = tokens.iter().map(TokenRecord::from).collect();
    }

    pub fn record_root_repr(&mut self, repr: String) {
        self.root_repr = repr;
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_event_id;
        self.next_event_id += 1;
        id
    }

    pub fn enter_node(&mut self, kind: &'static str, span: &Span) -> u64 {
        let id = self.next_id();
        self.events.push(ExecutionEvent::EnterNode {
            id,
            kind,
            span: SpanRecord::from(span),
        });
        id
    }

    pub fn exit_node(&mut self, kind: &'static str, span: &Span) {
        let id = self.next_id();
        self.events.push(ExecutionEvent::ExitNode {
            id,
            kind,
            span: SpanRecord::from(span),
        });
    }

    pub fn var_assign(&mut self, name: &str, value: &Value) {
        let id = self.next_id();
        self.events.push(ExecutionEvent::VarAssign {
            id,
            name: name.to_string(),
            value: serialize_value(value),
        });
    }

    pub fn call(&mut self, callee: &str, args: &[Value]) {
        let id = self.next_id();
        self.events.push(ExecutionEvent::Call {
            id,
            callee: callee.to_string(),
            args: args.iter().map(serialize_value).collect(),
        });
    }

    pub fn ret(&mut self, value: &Value) {
        let id = self.next_id();
        self.events.push(ExecutionEvent::Return {
            id,
            value: serialize_value(value),
        });
    }

    pub fn write_stdout(&mut self, text: &str) {
        self.stdout.push_str(text);
    }

    /// Direct handle to the stdout accumulator, for built-ins that print.
    pub fn stdout_buffer_mut(&mut self) -> &mut String {
        &mut self.stdout
    }

    /// Appends a nested `ava_exec` run's captured output at the point the
    /// nested call completes (§4.5).
    pub fn append_nested_stdout(&mut self, nested: &str) {
        self.stdout.push_str(nested);
    }

    pub fn set_header(&mut self, header: serde_json::Value) {
        self.header = Some(header);
    }

    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    /// Finalizes the collector into the `Trace` object returned by `run()`.
    /// `error`, when present, is already rendered into an `ErrorObject` by the
    /// caller, since a failure may originate from the lexer or parser (no
    /// `Traceback`) as well as from evaluation.
    pub fn finish(self, symbols: HashMap<String, Value>, final_value: &Value, error: Option<ErrorObject>) -> Trace {
        let final_json = serialize_value(final_value);
        let symbols_end = symbols
            .iter()
            .map(|(name, value)| (name.clone(), serialize_value(value)))
            .collect();

        Trace {
            file: self.file_name.clone(),
            elapsed: self.start.elapsed().as_secs_f64(),
            trace: TraceInner {
                lexer: LexerTrace { tokens: self.tokens },
                parser: ParserTrace { root_repr: self.root_repr },
                execution: ExecutionTrace {
                    events: self.events,
                    stdout: self.stdout.clone(),
                    final_value: final_json.clone(),
                    header: self.header,
                    pow: None,
                },
            },
            stdout: self.stdout,
            final_value: final_json,
            symbols_end,
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Number;

    #[test]
    fn test_event_ids_increase_monotonically() {
        let mut tc = TraceCollector::new("<test>");
        let span = Span::new(
            Position::new(std::rc::Rc::from("<test>"), std::rc::Rc::from("")),
            Position::new(std::rc::Rc::from("<test>"), std::rc::Rc::from("")),
        );
        let id1 = tc.enter_node("Number", &span);
        let id2 = tc.enter_node("Number", &span);
        assert!(id2 > id1);
    }

    #[test]
    fn test_serialize_value_number_and_list() {
        let list = Value::list(vec![Value::Number(Number::Int(1)), Value::Number(Number::Int(2))]);
        let json = serialize_value(&list);
        assert_eq!(json, serde_json::json!([1, 2]));
    }

    #[test]
    fn test_finish_reports_stdout_and_final_value() {
        let mut tc = TraceCollector::new("<test>");
        tc.write_stdout("hi\n");
        let trace = tc.finish(HashMap::new(), &Value::Number(Number::Int(7)), None);
        assert_eq!(trace.stdout, "hi\n");
        assert_eq!(trace.final_value, serde_json::json!(7));
        assert!(trace.error.is_none());
    }
}
