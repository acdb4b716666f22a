use crate::ast::{ClassDecl, Expr, ExprKind, FieldDecl};
use crate::lexer::TokenKind;
use crate::parser::{ParseResult, Parser, span_of};

use std::rc::Rc;

impl Parser {
    /// `class Name (: Base)? { field: type = value; method :: (...) { ... } }`
    pub fn parse_class(&mut self) -> ParseResult<Expr> {
        self.advance(); // 'class'
        let (name, span) = self.consume_identifier("expected class name after 'class'")?;

        let base = if self.matches(&TokenKind::Colon) {
            Some(self.consume_identifier("expected base class name after ':'")?)
        } else {
            None
        };

        self.consume(&TokenKind::LBrace, "expected '{' before class body")?;

        let mut fields = vec![];
        let mut methods = vec![];
        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            if self.matches(&TokenKind::Semicolon) {
                continue;
            }
            if !self.check_identifier_at(0) {
                return Err(self.error_at_current("expected a field or method declaration"));
            }
            match self.peek_at(1).kind {
                TokenKind::Colon => {
                    let (decl, span) = self.parse_variable_decl()?;
                    fields.push(FieldDecl { decl, span });
                }
                TokenKind::DoubleColon => methods.push(Rc::new(self.parse_function_decl()?)),
                _ => {
                    return Err(self.error_at_current("expected a field or method declaration"));
                }
            }
        }
        self.consume(&TokenKind::RBrace, "expected '}' after class body")?;

        Ok(Expr::new(
            ExprKind::ClassDeclare(Rc::new(ClassDecl {
                name,
                base,
                fields,
                methods,
                span: span.clone(),
            })),
            span,
        ))
    }

    /// `new Name()`
    pub fn parse_new(&mut self) -> ParseResult<Expr> {
        let span = span_of(&self.advance());
        let (class, _) = self.consume_identifier("expected class name after 'new'")?;
        self.consume(&TokenKind::LParen, "expected '(' after class name")?;
        self.consume(&TokenKind::RParen, "expected ')' after '('")?;
        Ok(Expr::new(ExprKind::New(class), span))
    }
}
