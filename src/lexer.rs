// ABOUTME: Character stream to token stream conversion

use crate::error::LexError;
use crate::position::{Position, Span};
use crate::token::{Token, TokenKind, KEYWORDS};
use std::rc::Rc;

const DIGITS: &str = "0123456789";
const LETTERS_EXTRA: char = '_';

// Identifier characters are ASCII-only, matching `string.ascii_letters` in
// the original's `LETTERS` constant — not Rust's Unicode-aware
// `char::is_alphabetic`/`is_alphanumeric`.

pub struct Lexer {
    chars: Vec<char>,
    pos: Position,
    current: Option<char>,
}

impl Lexer {
    pub fn new(file_name: &str, source: &str) -> Lexer {
        let chars: Vec<char> = source.chars().collect();
        let pos = Position::new(Rc::from(file_name), Rc::from(source));
        let current = chars.first().copied();
        Lexer { chars, pos, current }
    }

    fn advance(&mut self) {
        self.pos.advance(self.current);
        self.current = self.chars.get(self.pos.byte_index).copied();
    }

    /// Tokenizes the whole source. On the first illegal character or bad
    /// escape sequence, returns the error found so far and stops (the rest
    /// of the input is not tokenized) per SPEC_FULL.md §4.1.
    pub fn make_tokens(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();

        while let Some(c) = self.current {
            match c {
                ' ' | '\t' => self.advance(),
                '#' => self.skip_comment(),
                '\n' | ';' => {
                    let start = self.pos.copy();
                    self.advance();
                    tokens.push(Token::new(TokenKind::Newline, Span::new(start.clone(), self.pos.copy())));
                }
                c if DIGITS.contains(c) => tokens.push(self.make_number()),
                c if c.is_ascii_alphabetic() || c == LETTERS_EXTRA => tokens.push(self.make_identifier()),
                '"' => tokens.push(self.make_string()?),
                '+' => tokens.push(self.single(TokenKind::Plus)),
                '-' => tokens.push(self.make_minus_or_arrow()),
                '*' => tokens.push(self.single(TokenKind::Star)),
                '/' => tokens.push(self.single(TokenKind::Slash)),
                '^' => tokens.push(self.single(TokenKind::Caret)),
                '(' => tokens.push(self.single(TokenKind::LParen)),
                ')' => tokens.push(self.single(TokenKind::RParen)),
                '[' => tokens.push(self.single(TokenKind::LBracket)),
                ']' => tokens.push(self.single(TokenKind::RBracket)),
                ',' => tokens.push(self.single(TokenKind::Comma)),
                '!' => tokens.push(self.make_not_equals()?),
                '=' => tokens.push(self.make_equals()),
                '<' => tokens.push(self.make_less_than()),
                '>' => tokens.push(self.make_greater_than()),
                other => {
                    let span = Span::new(self.pos.copy(), self.pos.copy());
                    return Err(LexError::IllegalCharacter {
                        character: other.to_string(),
                        span,
                    });
                }
            }
        }

        let eof_span = Span::new(self.pos.copy(), self.pos.copy());
        tokens.push(Token::new(TokenKind::Eof, eof_span));
        Ok(tokens)
    }

    fn single(&mut self, kind: TokenKind) -> Token {
        let start = self.pos.copy();
        self.advance();
        Token::new(kind, Span::new(start, self.pos.copy()))
    }

    fn skip_comment(&mut self) {
        while let Some(c) = self.current {
            if c == '\n' {
                break;
            }
            self.advance();
        }
    }

    fn make_number(&mut self) -> Token {
        let start = self.pos.copy();
        let mut text = String::new();
        let mut dot_count = 0;

        while let Some(c) = self.current {
            if DIGITS.contains(c) {
                text.push(c);
                self.advance();
            } else if c == '.' {
                if dot_count == 1 {
                    break;
                }
                dot_count += 1;
                text.push('.');
                self.advance();
            } else {
                break;
            }
        }

        let kind = if dot_count == 0 {
            TokenKind::Int(text.parse().unwrap_or(0))
        } else {
            TokenKind::Float(text.parse().unwrap_or(0.0))
        };
        Token::new(kind, Span::new(start, self.pos.copy()))
    }

    fn make_identifier(&mut self) -> Token {
        let start = self.pos.copy();
        let mut text = String::new();

        while let Some(c) = self.current {
            if c.is_ascii_alphanumeric() || c == LETTERS_EXTRA {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }

        let kind = if KEYWORDS.contains(&text.as_str()) {
            TokenKind::Keyword(text)
        } else {
            TokenKind::Ident(text)
        };
        Token::new(kind, Span::new(start, self.pos.copy()))
    }

    fn make_string(&mut self) -> Result<Token, LexError> {
        let start = self.pos.copy();
        self.advance(); // opening quote
        let mut text = String::new();
        let mut escaping = false;

        loop {
            match self.current {
                None => {
                    return Err(LexError::ExpectedCharacter {
                        expected: "\"".to_string(),
                        after: text,
                        span: Span::new(start, self.pos.copy()),
                    });
                }
                Some('"') if !escaping => {
                    self.advance();
                    break;
                }
                Some('\\') if !escaping => {
                    escaping = true;
                    self.advance();
                }
                Some(c) => {
                    if escaping {
                        text.push(match c {
                            'n' => '\n',
                            't' => '\t',
                            other => other,
                        });
                        escaping = false;
                    } else {
                        text.push(c);
                    }
                    self.advance();
                }
            }
        }

        Ok(Token::new(TokenKind::Str(text), Span::new(start, self.pos.copy())))
    }

    fn make_minus_or_arrow(&mut self) -> Token {
        let start = self.pos.copy();
        self.advance();
        if self.current == Some('>') {
            self.advance();
            Token::new(TokenKind::Arrow, Span::new(start, self.pos.copy()))
        } else {
            Token::new(TokenKind::Minus, Span::new(start, self.pos.copy()))
        }
    }

    fn make_not_equals(&mut self) -> Result<Token, LexError> {
        let start = self.pos.copy();
        self.advance();
        if self.current == Some('=') {
            self.advance();
            Ok(Token::new(TokenKind::NotEq, Span::new(start, self.pos.copy())))
        } else {
            Err(LexError::ExpectedCharacter {
                expected: "=".to_string(),
                after: "!".to_string(),
                span: Span::new(start, self.pos.copy()),
            })
        }
    }

    fn make_equals(&mut self) -> Token {
        let start = self.pos.copy();
        self.advance();
        if self.current == Some('=') {
            self.advance();
            Token::new(TokenKind::EqEq, Span::new(start, self.pos.copy()))
        } else {
            Token::new(TokenKind::Eq, Span::new(start, self.pos.copy()))
        }
    }

    fn make_less_than(&mut self) -> Token {
        let start = self.pos.copy();
        self.advance();
        if self.current == Some('=') {
            self.advance();
            Token::new(TokenKind::Lte, Span::new(start, self.pos.copy()))
        } else {
            Token::new(TokenKind::Lt, Span::new(start, self.pos.copy()))
        }
    }

    fn make_greater_than(&mut self) -> Token {
        let start = self.pos.copy();
        self.advance();
        if self.current == Some('=') {
            self.advance();
            Token::new(TokenKind::Gte, Span::new(start, self.pos.copy()))
        } else {
            Token::new(TokenKind::Gt, Span::new(start, self.pos.copy()))
        }
    }
}
