// ABOUTME: Recursive-descent parser turning a token stream into an AST

use crate::ast::{BinOpKind, IfCase, Node, UnaryOpKind};
use crate::error::ParseError;
use crate::position::Span;
use crate::token::{Token, TokenKind};
use crate::value::Number;

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    advance_count: usize,
}

type PResult = Result<Node, ParseError>;

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Parser {
        Parser {
            tokens,
            pos: 0,
            advance_count: 0,
        }
    }

    /// Parses the whole token stream as a top-level program: a `List` AST
    /// whose elements are top-level statements (SPEC_FULL.md §4.2).
    pub fn parse(&mut self) -> PResult {
        let start = self.current().span.start.clone();
        self.skip_newlines();
        let mut statements = Vec::new();

        if !self.at_eof() {
            statements.push(self.statement()?);
        }

        while !self.at_eof() {
            let mut newline_count = 0;
            while self.check(&TokenKind::Newline) {
                self.advance();
                newline_count += 1;
            }
            if newline_count == 0 {
                break;
            }
            if self.at_eof() {
                break;
            }
            statements.push(self.statement()?);
        }

        self.skip_newlines();
        if !self.at_eof() {
            return Err(self.error_here("expected end of input"));
        }

        let end = self.current().span.end.clone();
        Ok(Node::Block(statements, Span::new(start, end)))
    }

    // ---- token stream plumbing ----

    fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn at_eof(&self) -> bool {
        matches!(self.current().kind, TokenKind::Eof)
    }

    fn advance(&mut self) -> Token {
        let tok = self.current().clone();
        if !self.at_eof() {
            self.pos += 1;
        }
        self.advance_count += 1;
        tok
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.current().kind) == std::mem::discriminant(kind)
    }

    fn check_keyword(&self, word: &str) -> bool {
        self.current().is_keyword(word)
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token, ParseError> {
        if self.check(&kind) {
            Ok(self.advance())
        } else {
            Err(self.error_here(&format!("expected {}", what)))
        }
    }

    fn expect_keyword(&mut self, word: &str) -> Result<Token, ParseError> {
        if self.check_keyword(word) {
            Ok(self.advance())
        } else {
            Err(self.error_here(&format!("expected '{}'", word)))
        }
    }

    fn skip_newlines(&mut self) {
        while self.check(&TokenKind::Newline) {
            self.advance();
        }
    }

    fn error_here(&self, message: &str) -> ParseError {
        ParseError::new(message.to_string(), self.current().span.clone(), self.advance_count)
    }

    /// Speculative parse: try `f`, and on failure rewind the cursor so the
    /// caller can treat the construct as absent. Used for `return`'s
    /// optional trailing expression (SPEC_FULL.md §4.2 "speculative parsing").
    ///
    /// Applies the "deepest advance count wins" rule (§4.2): a failure that
    /// never advanced past the checkpoint means `f` never found anything to
    /// commit to, so the construct is genuinely absent. A failure that DID
    /// advance means `f` started parsing a real one and broke partway
    /// through — that's a genuine syntax error, not an absent construct, so
    /// it's propagated instead of silently swallowed.
    fn try_parse<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, ParseError>) -> Result<Option<T>, ParseError> {
        let checkpoint = self.pos;
        let checkpoint_count = self.advance_count;
        match f(self) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                let advanced_past_checkpoint = err.advance_count > checkpoint_count;
                self.pos = checkpoint;
                self.advance_count = checkpoint_count;
                if advanced_past_checkpoint {
                    Err(err)
                } else {
                    Ok(None)
                }
            }
        }
    }

    // ---- grammar ----

    fn statement(&mut self) -> PResult {
        let start = self.current().span.start.clone();

        if self.check_keyword("return") {
            self.advance();
            let expr = self.try_parse(|p| {
                if p.check(&TokenKind::Newline) || p.at_eof() || p.check_keyword("end") {
                    return Err(p.error_here("no return expression"));
                }
                p.expr()
            })?;
            let end = expr.as_ref().map(|e| e.span().end.clone()).unwrap_or_else(|| self.current().span.start.clone());
            return Ok(Node::Return(expr.map(Box::new), Span::new(start, end)));
        }
        if self.check_keyword("continue") {
            let tok = self.advance();
            return Ok(Node::Continue(tok.span));
        }
        if self.check_keyword("break") {
            let tok = self.advance();
            return Ok(Node::Break(tok.span));
        }
        self.expr()
    }

    fn expr(&mut self) -> PResult {
        if self.check_keyword("var") {
            let start = self.current().span.start.clone();
            self.advance();
            let name_tok = self.expect(TokenKind::Ident(String::new()), "identifier")?;
            let name = match name_tok.kind {
                TokenKind::Ident(n) => n,
                _ => unreachable!(),
            };
            self.expect(TokenKind::Eq, "'='")?;
            let value = self.expr()?;
            let end = value.span().end.clone();
            return Ok(Node::VarAssign(name, Box::new(value), Span::new(start, end)));
        }

        let mut left = self.comp_expr()?;
        loop {
            let op = if self.check_keyword("and") {
                BinOpKind::And
            } else if self.check_keyword("or") {
                BinOpKind::Or
            } else {
                break;
            };
            self.advance();
            let right = self.comp_expr()?;
            let span = Span::new(left.span().start.clone(), right.span().end.clone());
            left = Node::BinOp(op, Box::new(left), Box::new(right), span);
        }
        Ok(left)
    }

    fn comp_expr(&mut self) -> PResult {
        if self.check_keyword("not") {
            let start = self.current().span.start.clone();
            self.advance();
            let operand = self.comp_expr()?;
            let end = operand.span().end.clone();
            return Ok(Node::UnaryOp(UnaryOpKind::Not, Box::new(operand), Span::new(start, end)));
        }

        let mut left = self.arith_expr()?;
        loop {
            let op = match &self.current().kind {
                TokenKind::EqEq => BinOpKind::Eq,
                TokenKind::NotEq => BinOpKind::Ne,
                TokenKind::Lt => BinOpKind::Lt,
                TokenKind::Gt => BinOpKind::Gt,
                TokenKind::Lte => BinOpKind::Le,
                TokenKind::Gte => BinOpKind::Ge,
                _ => break,
            };
            self.advance();
            let right = self.arith_expr()?;
            let span = Span::new(left.span().start.clone(), right.span().end.clone());
            left = Node::BinOp(op, Box::new(left), Box::new(right), span);
        }
        Ok(left)
    }

    fn arith_expr(&mut self) -> PResult {
        let mut left = self.term()?;
        loop {
            let op = match &self.current().kind {
                TokenKind::Plus => BinOpKind::Add,
                TokenKind::Minus => BinOpKind::Sub,
                _ => break,
            };
            self.advance();
            let right = self.term()?;
            let span = Span::new(left.span().start.clone(), right.span().end.clone());
            left = Node::BinOp(op, Box::new(left), Box::new(right), span);
        }
        Ok(left)
    }

    fn term(&mut self) -> PResult {
        let mut left = self.factor()?;
        loop {
            let op = match &self.current().kind {
                TokenKind::Star => BinOpKind::Mul,
                TokenKind::Slash => BinOpKind::Div,
                _ => break,
            };
            self.advance();
            let right = self.factor()?;
            let span = Span::new(left.span().start.clone(), right.span().end.clone());
            left = Node::BinOp(op, Box::new(left), Box::new(right), span);
        }
        Ok(left)
    }

    fn factor(&mut self) -> PResult {
        let start = self.current().span.start.clone();
        let op = match &self.current().kind {
            TokenKind::Plus => Some(UnaryOpKind::Plus),
            TokenKind::Minus => Some(UnaryOpKind::Minus),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let operand = self.factor()?;
            let end = operand.span().end.clone();
            return Ok(Node::UnaryOp(op, Box::new(operand), Span::new(start, end)));
        }
        self.power()
    }

    fn power(&mut self) -> PResult {
        let mut left = self.call()?;
        while matches!(self.current().kind, TokenKind::Caret) {
            self.advance();
            let right = self.factor()?;
            let span = Span::new(left.span().start.clone(), right.span().end.clone());
            left = Node::BinOp(BinOpKind::Pow, Box::new(left), Box::new(right), span);
        }
        Ok(left)
    }

    fn call(&mut self) -> PResult {
        let atom = self.atom()?;
        if matches!(self.current().kind, TokenKind::LParen) {
            let start = atom.span().start.clone();
            self.advance();
            let mut args = Vec::new();
            if !matches!(self.current().kind, TokenKind::RParen) {
                args.push(self.expr()?);
                while matches!(self.current().kind, TokenKind::Comma) {
                    self.advance();
                    args.push(self.expr()?);
                }
            }
            let end_tok = self.expect(TokenKind::RParen, "')'")?;
            return Ok(Node::Call {
                callee: Box::new(atom),
                args,
                span: Span::new(start, end_tok.span.end),
            });
        }
        Ok(atom)
    }

    fn atom(&mut self) -> PResult {
        let tok = self.current().clone();
        match &tok.kind {
            TokenKind::Int(i) => {
                self.advance();
                Ok(Node::Number(Number::Int(*i), tok.span))
            }
            TokenKind::Float(f) => {
                self.advance();
                Ok(Node::Number(Number::Float(*f), tok.span))
            }
            TokenKind::Str(s) => {
                self.advance();
                Ok(Node::Str(s.clone(), tok.span))
            }
            TokenKind::Ident(name) => {
                self.advance();
                Ok(Node::VarAccess(name.clone(), tok.span))
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.expr()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(inner)
            }
            TokenKind::LBracket => self.list_expr(),
            TokenKind::Keyword(k) if k == "if" => self.if_expr(),
            TokenKind::Keyword(k) if k == "for" => self.for_expr(),
            TokenKind::Keyword(k) if k == "while" => self.while_expr(),
            TokenKind::Keyword(k) if k == "fun" => self.func_def(),
            _ => Err(self.error_here("expected expression")),
        }
    }

    fn list_expr(&mut self) -> PResult {
        let start = self.expect(TokenKind::LBracket, "'['")?.span.start;
        let mut elements = Vec::new();
        if !matches!(self.current().kind, TokenKind::RBracket) {
            elements.push(self.expr()?);
            while matches!(self.current().kind, TokenKind::Comma) {
                self.advance();
                elements.push(self.expr()?);
            }
        }
        let end = self.expect(TokenKind::RBracket, "']'")?.span.end;
        Ok(Node::List(elements, Span::new(start, end)))
    }

    /// Parses the body of a block construct (`if`/`for`/`while`/`fun`):
    /// either a single statement (expression form) or, if a newline follows
    /// the introducer token, a statement list terminated by a keyword in
    /// `terminators` (block form). Returns the body node and whether it's
    /// block form (which always yields unit, per SPEC_FULL.md §4.2/§4.3).
    fn body(&mut self, terminators: &[&str]) -> Result<(Node, bool), ParseError> {
        if self.check(&TokenKind::Newline) {
            self.skip_newlines();
            let start = self.current().span.start.clone();
            let mut statements = Vec::new();
            loop {
                if self.at_eof() || terminators.iter().any(|t| self.check_keyword(t)) {
                    break;
                }
                statements.push(self.statement()?);
                self.skip_newlines();
            }
            let end = self.current().span.start.clone();
            Ok((Node::Block(statements, Span::new(start, end)), true))
        } else {
            Ok((self.statement()?, false))
        }
    }

    fn if_expr(&mut self) -> PResult {
        let start = self.expect_keyword("if")?.span.start;
        let mut cases = Vec::new();
        let mut else_case = None;

        loop {
            let condition = self.expr()?;
            self.expect_keyword("then")?;
            let (body, returns_unit) = self.body(&["elif", "else", "end"])?;
            cases.push(IfCase { condition, body, returns_unit });

            if self.check_keyword("elif") {
                self.advance();
                continue;
            }
            break;
        }

        if self.check_keyword("else") {
            self.advance();
            let (body, returns_unit) = self.body(&["end"])?;
            else_case = Some((Box::new(body), returns_unit));
        }

        let end = if cases.last().map(|c| c.returns_unit).unwrap_or(false) || else_case.as_ref().map(|(_, u)| *u).unwrap_or(false) {
            self.expect_keyword("end")?.span.end
        } else {
            self.current().span.start.clone()
        };

        Ok(Node::If { cases, else_case, span: Span::new(start, end) })
    }

    fn for_expr(&mut self) -> PResult {
        let start = self.expect_keyword("for")?.span.start;
        let name_tok = self.expect(TokenKind::Ident(String::new()), "identifier")?;
        let var_name = match name_tok.kind {
            TokenKind::Ident(n) => n,
            _ => unreachable!(),
        };
        self.expect(TokenKind::Eq, "'='")?;
        let start_expr = self.expr()?;
        self.expect_keyword("to")?;
        let end_expr = self.expr()?;
        let step = if self.check_keyword("step") {
            self.advance();
            Some(Box::new(self.expr()?))
        } else {
            None
        };
        self.expect_keyword("then")?;
        let (body, returns_unit) = self.body(&["end"])?;
        let end_pos = if returns_unit {
            self.expect_keyword("end")?.span.end
        } else {
            self.current().span.start.clone()
        };

        Ok(Node::For {
            var_name,
            start: Box::new(start_expr),
            end: Box::new(end_expr),
            step,
            body: Box::new(body),
            returns_unit,
            span: Span::new(start, end_pos),
        })
    }

    fn while_expr(&mut self) -> PResult {
        let start = self.expect_keyword("while")?.span.start;
        let condition = self.expr()?;
        self.expect_keyword("then")?;
        let (body, returns_unit) = self.body(&["end"])?;
        let end_pos = if returns_unit {
            self.expect_keyword("end")?.span.end
        } else {
            self.current().span.start.clone()
        };

        Ok(Node::While {
            condition: Box::new(condition),
            body: Box::new(body),
            returns_unit,
            span: Span::new(start, end_pos),
        })
    }

    fn func_def(&mut self) -> PResult {
        let start = self.expect_keyword("fun")?.span.start;
        let name = if let TokenKind::Ident(n) = &self.current().kind {
            let n = n.clone();
            self.advance();
            Some(n)
        } else {
            None
        };

        self.expect(TokenKind::LParen, "'('")?;
        let mut params = Vec::new();
        if let TokenKind::Ident(n) = &self.current().kind {
            params.push(n.clone());
            self.advance();
            while matches!(self.current().kind, TokenKind::Comma) {
                self.advance();
                let p = self.expect(TokenKind::Ident(String::new()), "identifier")?;
                if let TokenKind::Ident(n) = p.kind {
                    params.push(n);
                }
            }
        }
        self.expect(TokenKind::RParen, "')'")?;

        if matches!(self.current().kind, TokenKind::Arrow) {
            self.advance();
            let body = self.expr()?;
            let end = body.span().end.clone();
            return Ok(Node::FuncDef {
                name,
                params,
                body: Box::new(body),
                auto_return: true,
                span: Span::new(start, end),
            });
        }

        let (body, _) = self.body(&["end"])?;
        let end = self.expect_keyword("end")?.span.end;
        Ok(Node::FuncDef {
            name,
            params,
            body: Box::new(body),
            auto_return: false,
            span: Span::new(start, end),
        })
    }
}
