use crate::ast::{BinOp, Expr, ExprKind, Literal, LogicOp, Span, UnOp, VariableDecl};
use crate::lexer::TokenKind;
use crate::parser::{ParseResult, Parser, error_at, span_of};

impl Parser {
    /// Entry point for every expression form, including declarations.
    /// Declarations and assignments are recognised by fixed-width lookahead
    /// on the leading identifier before falling into the operator ladder.
    pub fn parse_expression(&mut self) -> ParseResult<Expr> {
        if self.check_identifier_at(0) {
            match self.peek_at(1).kind {
                TokenKind::Assign => return self.parse_assignment(),
                TokenKind::Colon => return self.parse_var_declaration(),
                TokenKind::DoubleColon if self.check_at(2, &TokenKind::LParen) => {
                    return self.parse_function();
                }
                TokenKind::Dot
                    if self.check_identifier_at(2) && self.check_at(3, &TokenKind::Assign) =>
                {
                    return self.parse_field_assignment();
                }
                _ => {}
            }
        }
        self.parse_or()
    }

    fn parse_assignment(&mut self) -> ParseResult<Expr> {
        let (name, span) = self.consume_identifier("expected variable name")?;
        self.consume(&TokenKind::Assign, "expected '=' in assignment")?;
        let value = self.parse_expression()?;
        Ok(Expr::new(
            ExprKind::VarSet {
                name,
                value: Box::new(value),
            },
            span,
        ))
    }

    pub(crate) fn parse_var_declaration(&mut self) -> ParseResult<Expr> {
        let (decl, span) = self.parse_variable_decl()?;
        Ok(Expr::new(ExprKind::VarDeclare(decl), span))
    }

    /// `name ':' type ('=' expression)?`
    pub(crate) fn parse_variable_decl(&mut self) -> ParseResult<(VariableDecl, Span)> {
        let (name, span) = self.consume_identifier("expected variable name")?;
        self.consume(&TokenKind::Colon, "expected ':' after variable name")?;
        let annot = self.parse_type_annotation()?;
        let initializer = if self.matches(&TokenKind::Assign) {
            Some(Box::new(self.parse_expression()?))
        } else {
            None
        };
        Ok((
            VariableDecl {
                name,
                annot,
                initializer,
            },
            span,
        ))
    }

    fn parse_field_assignment(&mut self) -> ParseResult<Expr> {
        let (object, span) = self.consume_identifier("expected object name")?;
        self.consume(&TokenKind::Dot, "expected '.' after object name")?;
        let (field, _) = self.consume_identifier("expected field name after '.'")?;
        self.consume(&TokenKind::Assign, "expected '=' in field assignment")?;
        let value = self.parse_expression()?;
        Ok(Expr::new(
            ExprKind::FieldSet {
                object,
                field,
                value: Box::new(value),
            },
            span,
        ))
    }

    fn parse_or(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_and()?;
        while self.check(&TokenKind::Or) {
            let span = span_of(&self.advance());
            let right = self.parse_and()?;
            left = logical(LogicOp::Or, left, right, span);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_equality()?;
        while self.check(&TokenKind::And) {
            let span = span_of(&self.advance());
            let right = self.parse_equality()?;
            left = logical(LogicOp::And, left, right, span);
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_relational()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::EqualEqual => BinOp::Eq,
                TokenKind::BangEqual => BinOp::NotEq,
                _ => break,
            };
            let span = span_of(&self.advance());
            let right = self.parse_relational()?;
            left = binary(op, left, right, span);
        }
        Ok(left)
    }

    fn parse_relational(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Less => BinOp::Less,
                TokenKind::LessEqual => BinOp::LessEq,
                TokenKind::Greater => BinOp::Greater,
                TokenKind::GreaterEqual => BinOp::GreaterEq,
                _ => break,
            };
            let span = span_of(&self.advance());
            let right = self.parse_additive()?;
            left = binary(op, left, right, span);
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            let span = span_of(&self.advance());
            let right = self.parse_multiplicative()?;
            left = binary(op, left, right, span);
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Percent => BinOp::Mod,
                _ => break,
            };
            let span = span_of(&self.advance());
            let right = self.parse_unary()?;
            left = binary(op, left, right, span);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        let op = match self.peek().kind {
            TokenKind::Bang => UnOp::Not,
            TokenKind::Minus => UnOp::Minus,
            _ => return self.parse_primary(),
        };
        let span = span_of(&self.advance());
        let operand = self.parse_unary()?;
        Ok(Expr::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            span,
        ))
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        let token = self.peek().clone();
        let span = span_of(&token);
        let literal = |literal| Ok(Expr::new(ExprKind::Literal(literal), span.clone()));

        match token.kind {
            TokenKind::Int(i) => {
                self.advance();
                literal(Literal::Int(i))
            }
            TokenKind::Float(x) => {
                self.advance();
                literal(Literal::Float(x))
            }
            TokenKind::String(s) => {
                self.advance();
                literal(Literal::String(s))
            }
            TokenKind::True => {
                self.advance();
                literal(Literal::Bool(true))
            }
            TokenKind::False => {
                self.advance();
                literal(Literal::Bool(false))
            }
            TokenKind::Nil => {
                self.advance();
                literal(Literal::Nil)
            }
            TokenKind::Identifier(_) => self.parse_identifier_expression(),
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.consume(&TokenKind::RParen, "expected ')' after expression")?;
                Ok(expr)
            }
            TokenKind::LBrace => self.parse_block(),
            TokenKind::KeywordIf => self.parse_if(),
            TokenKind::KeywordWhile => self.parse_while(),
            TokenKind::KeywordFor => self.parse_for(),
            TokenKind::KeywordReturn => self.parse_return(),
            TokenKind::KeywordClass => self.parse_class(),
            TokenKind::KeywordNew => self.parse_new(),
            TokenKind::KeywordImport => self.parse_import(),
            _ => Err(error_at(
                &token,
                &format!("expected an expression, found {}", token.kind),
            )),
        }
    }

    /// Call, method call, field access or plain variable read.
    fn parse_identifier_expression(&mut self) -> ParseResult<Expr> {
        let (name, span) = self.consume_identifier("expected identifier")?;

        if self.matches(&TokenKind::LParen) {
            let args = self.parse_arguments()?;
            return Ok(Expr::new(ExprKind::Call { callee: name, args }, span));
        }

        if self.check(&TokenKind::Dot) && self.check_identifier_at(1) {
            self.advance();
            let (member, member_span) = self.consume_identifier("expected member name after '.'")?;
            if self.matches(&TokenKind::LParen) {
                let args = self.parse_arguments()?;
                return Ok(Expr::new(
                    ExprKind::MethodCall {
                        object: name,
                        method: member,
                        args,
                    },
                    member_span,
                ));
            }
            return Ok(Expr::new(
                ExprKind::FieldGet {
                    object: name,
                    field: member,
                },
                member_span,
            ));
        }

        Ok(Expr::new(ExprKind::VarGet(name), span))
    }

    /// Comma-separated arguments; the opening '(' is already consumed.
    fn parse_arguments(&mut self) -> ParseResult<Vec<Expr>> {
        let mut args = vec![];
        if self.matches(&TokenKind::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.parse_expression()?);
            if self.matches(&TokenKind::Comma) {
                continue;
            }
            self.consume(&TokenKind::RParen, "expected ',' or ')' after argument")?;
            return Ok(args);
        }
    }

    pub(crate) fn parse_block(&mut self) -> ParseResult<Expr> {
        let open = self.consume(&TokenKind::LBrace, "expected '{'")?;
        let exprs = self.parse_sequence();
        self.consume(&TokenKind::RBrace, "expected '}' to close block")?;
        Ok(Expr::new(ExprKind::Block(exprs), span_of(&open)))
    }

    fn parse_if(&mut self) -> ParseResult<Expr> {
        let span = span_of(&self.advance());
        let condition = self.parse_expression()?;
        let then_branch = self.parse_expression()?;
        let else_branch = if self.matches(&TokenKind::KeywordElse) {
            Some(Box::new(self.parse_expression()?))
        } else {
            None
        };
        Ok(Expr::new(
            ExprKind::If {
                condition: Box::new(condition),
                then_branch: Box::new(then_branch),
                else_branch,
            },
            span,
        ))
    }

    fn parse_while(&mut self) -> ParseResult<Expr> {
        let span = span_of(&self.advance());
        let condition = self.parse_expression()?;
        let body = self.parse_expression()?;
        Ok(Expr::new(
            ExprKind::While {
                condition: Box::new(condition),
                body: Box::new(body),
            },
            span,
        ))
    }

    /// `for init?, condition?, update? body`
    fn parse_for(&mut self) -> ParseResult<Expr> {
        let span = span_of(&self.advance());

        let initializer = if self.check(&TokenKind::Comma) {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };
        self.consume(&TokenKind::Comma, "expected ',' after for-loop initializer")?;

        let condition = if self.check(&TokenKind::Comma) {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };
        self.consume(&TokenKind::Comma, "expected ',' after for-loop condition")?;

        let update = if self.check(&TokenKind::LBrace) {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };

        let body = self.parse_expression()?;
        Ok(Expr::new(
            ExprKind::For {
                initializer,
                condition,
                update,
                body: Box::new(body),
            },
            span,
        ))
    }

    fn parse_return(&mut self) -> ParseResult<Expr> {
        let span = span_of(&self.advance());
        if let Some(seen) = self.return_seen.last_mut() {
            *seen = true;
        }
        let value = match self.peek().kind {
            TokenKind::Semicolon
            | TokenKind::RBrace
            | TokenKind::RParen
            | TokenKind::Comma
            | TokenKind::KeywordElse
            | TokenKind::Eof => None,
            _ => Some(Box::new(self.parse_expression()?)),
        };
        Ok(Expr::new(ExprKind::Return(value), span))
    }

    fn parse_import(&mut self) -> ParseResult<Expr> {
        self.advance();
        let (library, span) = self.consume_identifier("expected library name after 'import'")?;
        Ok(Expr::new(ExprKind::Import(library), span))
    }
}

fn binary(op: BinOp, left: Expr, right: Expr, span: Span) -> Expr {
    Expr::new(
        ExprKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
        span,
    )
}

fn logical(op: LogicOp, left: Expr, right: Expr, span: Span) -> Expr {
    Expr::new(
        ExprKind::Logical {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
        span,
    )
}
