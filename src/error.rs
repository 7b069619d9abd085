// ABOUTME: Error types for lexing, parsing, and evaluation failures

use crate::position::Span;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum LexError {
    #[error("Illegal Character: '{character}'")]
    IllegalCharacter { character: String, span: Span },

    #[error("Expected Character: '{expected}' (after '{after}')")]
    ExpectedCharacter {
        expected: String,
        after: String,
        span: Span,
    },
}

impl LexError {
    pub fn span(&self) -> &Span {
        match self {
            LexError::IllegalCharacter { span, .. } => span,
            LexError::ExpectedCharacter { span, .. } => span,
        }
    }

    pub fn details(&self) -> String {
        match self {
            LexError::IllegalCharacter { character, .. } => format!("'{}'", character),
            LexError::ExpectedCharacter { expected, after, .. } => {
                format!("'{}' (after '{}')", expected, after)
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LexError::IllegalCharacter { .. } => "Illegal Character",
            LexError::ExpectedCharacter { .. } => "Expected Character",
        }
    }
}

#[derive(Error, Debug, Clone)]
#[error("Invalid Syntax: {message}")]
pub struct ParseError {
    pub message: String,
    pub span: Span,
    /// How many tokens the parser had consumed when this error occurred.
    /// Compared against a speculative parse's checkpoint by `Parser::try_parse`
    /// to implement the "deepest advance count wins" rule (SPEC_FULL.md §4.2):
    /// an error that advanced past the checkpoint is a genuine syntax error
    /// and is propagated; one that didn't means the attempted construct was
    /// never really started, so it's swallowed and the construct is absent.
    pub advance_count: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span, advance_count: usize) -> ParseError {
        ParseError {
            message: message.into(),
            span,
            advance_count,
        }
    }
}

#[derive(Error, Debug, Clone)]
pub enum RuntimeError {
    #[error("'{name}' is not defined")]
    UndefinedName { name: String, span: Span },

    #[error("Illegal operation")]
    IllegalOperation { span: Span },

    #[error("Division by zero")]
    DivisionByZero { span: Span },

    #[error("Index {index} out of bounds for list of length {length}")]
    IndexOutOfBounds { index: i64, length: usize, span: Span },

    #[error("{function}: expected {expected} argument{}, got {actual}", if *expected == 1 { "" } else { "s" })]
    ArityMismatch {
        function: String,
        expected: usize,
        actual: usize,
        span: Span,
    },

    #[error("{function}: expected between {min} and {max} arguments, got {actual}")]
    ArityRangeMismatch {
        function: String,
        min: usize,
        max: usize,
        actual: usize,
        span: Span,
    },

    #[error("{construct} outside of its enclosing construct")]
    ControlFlowOutsideConstruct { construct: &'static str, span: Span },

    #[error("{message}")]
    Custom { message: String, span: Span },
}

impl RuntimeError {
    pub fn span(&self) -> &Span {
        match self {
            RuntimeError::UndefinedName { span, .. }
            | RuntimeError::IllegalOperation { span }
            | RuntimeError::DivisionByZero { span }
            | RuntimeError::IndexOutOfBounds { span, .. }
            | RuntimeError::ArityMismatch { span, .. }
            | RuntimeError::ArityRangeMismatch { span, .. }
            | RuntimeError::ControlFlowOutsideConstruct { span, .. }
            | RuntimeError::Custom { span, .. } => span,
        }
    }

    pub fn details(&self) -> String {
        self.to_string()
    }

    pub fn name(&self) -> &'static str {
        "Runtime Error"
    }
}

/// One frame of a runtime traceback: a human-readable display name for the
/// call (e.g. a function name or `"<program>"`) and the position at which
/// that frame was entered.
#[derive(Debug, Clone)]
pub struct TracebackFrame {
    pub display_name: String,
    pub position: crate::position::Position,
}

/// A runtime error plus the chain of call contexts active when it fired,
/// innermost first. Rendered via `as_string` per SPEC_FULL.md §6.
#[derive(Debug, Clone)]
pub struct Traceback {
    pub error: RuntimeError,
    pub frames: Vec<TracebackFrame>,
}

impl Traceback {
    pub fn new(error: RuntimeError) -> Traceback {
        Traceback {
            error,
            frames: Vec::new(),
        }
    }

    pub fn push_frame(&mut self, frame: TracebackFrame) {
        self.frames.push(frame);
    }

    /// Renders the "Traceback (most recent call last)" text from SPEC_FULL.md §6.
    pub fn as_string(&self) -> String {
        let mut out = String::from("Traceback (most recent call last):\n");
        for frame in self.frames.iter().rev() {
            out.push_str(&format!(
                "  File {}, line {}, in {}\n",
                frame.position.file_name,
                frame.position.display_line(),
                frame.display_name
            ));
        }
        let span = self.error.span();
        out.push_str(&format!("{}: {}\n", self.error.name(), self.error.details()));
        out.push_str(&caret_underline(span));
        out
    }
}

/// Renders a lex-time failure the same way a `Traceback` renders a runtime
/// one (§6), minus any call frames since lexing never entered a function.
pub fn render_lex_error(err: &LexError) -> String {
    let span = err.span();
    format!(
        "Traceback (most recent call last):\n{}: {}\n{}",
        err.name(),
        err.details(),
        caret_underline(span)
    )
}

/// Renders a parse-time failure the same way `render_lex_error` does.
pub fn render_parse_error(err: &ParseError) -> String {
    format!(
        "Traceback (most recent call last):\nInvalid Syntax: {}\n{}",
        err.message,
        caret_underline(&err.span)
    )
}

fn caret_underline(span: &Span) -> String {
    let source = &*span.start.full_source;
    let line = source.lines().nth(span.start.line).unwrap_or("");
    let start_col = span.start.column.min(line.len());
    let end_col = span.end.column.max(start_col + 1).min(line.len() + 1);
    let mut underline = String::new();
    underline.push_str(&" ".repeat(start_col));
    underline.push_str(&"^".repeat(end_col.saturating_sub(start_col).max(1)));
    format!("{}\n{}\n", line, underline)
}

/// Umbrella error type threading lex/parse/runtime failures through any code
/// that may fail at more than one stage. `run()` itself never returns
/// `Err(AvaError)` — failures are reported inside the returned trace — but
/// internal helpers (e.g. `ava_exec`) use this to propagate with `?`.
#[derive(Error, Debug, Clone)]
pub enum AvaError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("{0}")]
    Runtime(#[from] Traceback),
}

impl std::fmt::Display for Traceback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Position;
    use std::rc::Rc;

    fn span_at(line: usize, col: usize, source: &str) -> Span {
        let mut p = Position::new(Rc::from("test.ava"), Rc::from(source));
        p.line = line;
        p.column = col;
        Span::new(p.clone(), p)
    }

    #[test]
    fn test_arity_mismatch_pluralizes_correctly() {
        let err = RuntimeError::ArityMismatch {
            function: "add1".to_string(),
            expected: 1,
            actual: 2,
            span: span_at(0, 0, "add1(1, 2)"),
        };
        assert_eq!(err.to_string(), "add1: expected 1 argument, got 2");

        let err = RuntimeError::ArityMismatch {
            function: "f".to_string(),
            expected: 2,
            actual: 0,
            span: span_at(0, 0, "f()"),
        };
        assert_eq!(err.to_string(), "f: expected 2 arguments, got 0");
    }

    #[test]
    fn test_traceback_rendering_includes_error_name() {
        let err = RuntimeError::UndefinedName {
            name: "x".to_string(),
            span: span_at(0, 4, "show(x)"),
        };
        let tb = Traceback::new(err);
        let rendered = tb.as_string();
        assert!(rendered.starts_with("Traceback (most recent call last):\n"));
        assert!(rendered.contains("Runtime Error: 'x' is not defined"));
    }

    #[test]
    fn test_lex_error_details() {
        let err = LexError::IllegalCharacter {
            character: "@".to_string(),
            span: span_at(0, 0, "@"),
        };
        assert_eq!(err.details(), "'@'");
        assert_eq!(err.name(), "Illegal Character");
    }
}
