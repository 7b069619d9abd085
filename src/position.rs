// ABOUTME: Source position tracking shared by every token and AST node

use std::rc::Rc;

/// A single point in a source file. Lines are stored 0-based and rendered
/// 1-based (`line + 1`) anywhere they're shown to a user, matching the
/// Python original's `Position` class.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub byte_index: usize,
    pub line: usize,
    pub column: usize,
    pub file_name: Rc<str>,
    pub full_source: Rc<str>,
}

impl Position {
    pub fn new(file_name: Rc<str>, full_source: Rc<str>) -> Position {
        Position {
            byte_index: 0,
            line: 0,
            column: 0,
            file_name,
            full_source,
        }
    }

    /// Advances past `current_char`, bumping the line/column counters.
    /// `current_char` is `None` at end of input.
    pub fn advance(&mut self, current_char: Option<char>) {
        self.byte_index += 1;
        self.column += 1;
        if current_char == Some('\n') {
            self.line += 1;
            self.column = 0;
        }
    }

    pub fn copy(&self) -> Position {
        self.clone()
    }

    pub fn display_line(&self) -> usize {
        self.line + 1
    }
}

/// A span of source delimited by two positions: inclusive start, exclusive end.
#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Span {
        Span { start, end }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos() -> Position {
        Position::new(Rc::from("test.ava"), Rc::from("var x = 1\n"))
    }

    #[test]
    fn test_advance_bumps_column() {
        let mut p = pos();
        p.advance(Some('v'));
        assert_eq!(p.byte_index, 1);
        assert_eq!(p.column, 1);
        assert_eq!(p.line, 0);
    }

    #[test]
    fn test_advance_on_newline_resets_column() {
        let mut p = pos();
        for _ in 0..10 {
            p.advance(Some('a'));
        }
        p.advance(Some('\n'));
        assert_eq!(p.line, 1);
        assert_eq!(p.column, 0);
    }

    #[test]
    fn test_display_line_is_one_based() {
        let mut p = pos();
        p.advance(Some('\n'));
        assert_eq!(p.display_line(), 2);
    }
}
