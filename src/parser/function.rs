use crate::ast::{Expr, ExprKind, FunctionDecl, Parameter, TypeAnnot};
use crate::lexer::TokenKind;
use crate::parser::{ParseResult, Parser, error_at};

use std::rc::Rc;

impl Parser {
    /// `name :: (a: int, b: int) -> int { ... }` or, for a procedure,
    /// `name :: (a: int) { ... }`.
    pub fn parse_function(&mut self) -> ParseResult<Expr> {
        let decl = self.parse_function_decl()?;
        let span = decl.span.clone();
        Ok(Expr::new(ExprKind::FunctionDeclare(Rc::new(decl)), span))
    }

    pub(crate) fn parse_function_decl(&mut self) -> ParseResult<FunctionDecl> {
        let name_token = self.peek().clone();
        let (name, span) = self.consume_identifier("expected function name")?;
        self.consume(&TokenKind::DoubleColon, "expected '::' after function name")?;
        self.consume(&TokenKind::LParen, "expected '(' to start parameter list")?;

        let mut params = vec![];
        if !self.check(&TokenKind::RParen) {
            loop {
                params.push(self.parse_parameter()?);
                if !self.matches(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(&TokenKind::RParen, "expected ')' after parameters")?;

        let return_type = if self.matches(&TokenKind::Arrow) {
            Some(self.parse_type_annotation()?)
        } else {
            None
        };

        if !self.check(&TokenKind::LBrace) {
            return Err(self.error_at_current("expected '{' before function body"));
        }

        self.return_seen.push(false);
        let body = self.parse_block();
        let saw_return = self.return_seen.pop().unwrap_or(false);
        let body = match body?.kind {
            ExprKind::Block(exprs) => exprs,
            other => vec![Expr::new(other, span.clone())],
        };

        let returns_value = return_type
            .as_ref()
            .is_some_and(|annot| *annot != TypeAnnot::Nil);
        // the body is complete, so record the fault without resynchronizing
        if returns_value && !saw_return {
            self.errors.push(error_at(
                &name_token,
                &format!(
                    "function '{}' declares a return type but never returns a value",
                    name
                ),
            ));
        }

        Ok(FunctionDecl {
            name,
            params,
            return_type,
            body,
            span,
        })
    }

    fn parse_parameter(&mut self) -> ParseResult<Parameter> {
        let (name, span) = self.consume_identifier("expected parameter name")?;
        self.consume(&TokenKind::Colon, "expected ':' after parameter name")?;
        let annot = self.parse_type_annotation()?;
        Ok(Parameter { name, annot, span })
    }

    /// One of the fixed type names, or a class name.
    pub fn parse_type_annotation(&mut self) -> ParseResult<TypeAnnot> {
        let annot = match &self.peek().kind {
            TokenKind::TypeInt => TypeAnnot::Int,
            TokenKind::TypeFloat => TypeAnnot::Float,
            TokenKind::TypeString => TypeAnnot::String,
            TokenKind::TypeBool => TypeAnnot::Bool,
            TokenKind::Nil => TypeAnnot::Nil,
            TokenKind::Identifier(name) => TypeAnnot::Named(name.clone()),
            _ => return Err(self.error_at_current("expected a type")),
        };
        self.advance();
        Ok(annot)
    }
}
