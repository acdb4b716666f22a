pub mod class_;
pub mod expression;
pub mod function;


use crate::ast::{Expr, Span};
use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::lexer::{Token, TokenKind};

pub type ParseResult<T> = Result<T, Diagnostic>;

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    errors: Vec<Diagnostic>,
    /// One entry per function body being parsed: whether a `return` was seen.
    return_seen: Vec<bool>,
}

impl Parser {
    /// `tokens` must end with an `Eof` token, as produced by `lexer::scan`.
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().is_none_or(|t| t.kind != TokenKind::Eof) {
            let end = tokens.last().map(|t| t.span.end).unwrap_or(0);
            let line = tokens.last().map(|t| t.line).unwrap_or(1);
            tokens.push(Token {
                kind: TokenKind::Eof,
                lexeme: String::new(),
                line,
                span: end..end,
            });
        }
        Parser {
            tokens,
            current: 0,
            errors: vec![],
            return_seen: vec![],
        }
    }

    /// Parses every top-level expression. Faulty expressions are dropped
    /// from the tree after their diagnostic is recorded.
    #[tracing::instrument(level = "debug", skip_all, fields(tokens = self.tokens.len()))]
    pub fn parse_program(&mut self) -> Vec<Expr> {
        let mut program = vec![];
        while !self.is_at_end() {
            if self.matches(&TokenKind::Semicolon) {
                continue;
            }
            match self.parse_expression() {
                Ok(expr) => program.push(expr),
                Err(error) => {
                    self.errors.push(error);
                    self.synchronize();
                    // a stray '}' ends the broken statement at top level
                    if self.check(&TokenKind::RBrace) {
                        self.advance();
                    }
                }
            }
        }
        tracing::debug!(
            expressions = program.len(),
            errors = self.errors.len(),
            "parse finished"
        );
        program
    }

    pub fn errors(&self) -> &[Diagnostic] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<Diagnostic> {
        self.errors
    }

    /// Parses expressions until `}` (left unconsumed) or end of file,
    /// recovering from faults inside the sequence.
    fn parse_sequence(&mut self) -> Vec<Expr> {
        let mut exprs = vec![];
        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            if self.matches(&TokenKind::Semicolon) {
                continue;
            }
            match self.parse_expression() {
                Ok(expr) => exprs.push(expr),
                Err(error) => {
                    self.errors.push(error);
                    self.synchronize();
                }
            }
        }
        exprs
    }

    /// Skips to the end of the broken statement: past the next `;`, or up to
    /// (not past) the next `}` or end of file.
    fn synchronize(&mut self) {
        while !self.is_at_end() {
            match self.peek().kind {
                TokenKind::Semicolon => {
                    self.advance();
                    return;
                }
                TokenKind::RBrace => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    /// Token `offset` places ahead of the cursor, clamped to `Eof`.
    fn peek_at(&self, offset: usize) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.current + offset).min(last)]
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if !self.is_at_end() {
            self.current += 1;
        }
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        &self.peek().kind == kind
    }

    fn check_at(&self, offset: usize, kind: &TokenKind) -> bool {
        &self.peek_at(offset).kind == kind
    }

    fn check_identifier_at(&self, offset: usize) -> bool {
        matches!(self.peek_at(offset).kind, TokenKind::Identifier(_))
    }

    fn matches(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume(&mut self, kind: &TokenKind, message: &str) -> ParseResult<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error_at_current(message))
        }
    }

    fn consume_identifier(&mut self, message: &str) -> ParseResult<(String, Span)> {
        match &self.peek().kind {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                let token = self.advance();
                Ok((name, span_of(&token)))
            }
            _ => Err(self.error_at_current(message)),
        }
    }

    fn error_at_current(&self, message: &str) -> Diagnostic {
        let token = self.peek();
        error_at(token, &format!("{}, found {}", message, token.kind))
    }
}

pub fn span_of(token: &Token) -> Span {
    Span {
        line: token.line,
        range: token.span.clone(),
    }
}

fn error_at(token: &Token, message: &str) -> Diagnostic {
    Diagnostic::new(
        DiagnosticKind::Parse,
        token.line,
        token.span.clone(),
        message,
    )
}
