#![forbid(unsafe_code)]

use crate::ast::*;
use crate::lexer::{tokenize, LexError, Token, TokenKind};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("syntax error at offset {offset}: expected {expected}, found {found}")]
pub struct SyntaxError {
    pub offset: usize,
    pub expected: &'static str,
    pub found: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParserError {
    #[error(transparent)]
    Lexer(#[from] LexError),
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
}

impl ParserError {
    pub fn offset(&self) -> usize {
        match self {
            ParserError::Lexer(e) => e.offset(),
            ParserError::Syntax(e) => e.offset,
        }
    }
}

/// Parses a whole source string into a single expression.
pub fn parse(source: &str) -> Result<Expr, ParserError> {
    let mut parser = Parser::new(source)?;
    parser.parse_expression()
}

pub struct Parser<'a> {
    tokens: Vec<Token<'a>>,
    pos: usize,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Result<Self, LexError> {
        let tokens = tokenize(source).collect::<Result<Vec<_>, _>>()?;
        Ok(Self { tokens, pos: 0 })
    }

    /// Parses one expression and requires the input to end right after it.
    pub fn parse_expression(&mut self) -> Result<Expr, ParserError> {
        let expr = self.parse_expr()?;
        if !self.check(&TokenKind::Eof) {
            return Err(self.unexpected("end of input").into());
        }
        Ok(expr)
    }

    fn parse_expr(&mut self) -> Result<Expr, SyntaxError> {
        self.parse_conditional()
    }

    fn parse_conditional(&mut self) -> Result<Expr, SyntaxError> {
        let test = self.parse_or()?;
        let offset = self.peek().offset;
        if !self.matches(&TokenKind::Question) {
            return Ok(test);
        }
        let then_branch = self.parse_conditional()?;
        self.expect(&TokenKind::Colon, "':' in conditional expression")?;
        let else_branch = self.parse_conditional()?;
        Ok(Expr {
            kind: ExprKind::Conditional(Box::new(Conditional {
                test,
                then_branch,
                else_branch,
            })),
            offset,
        })
    }

    fn parse_or(&mut self) -> Result<Expr, SyntaxError> {
        self.parse_binary_level(&[(TokenKind::OrOr, BinaryOp::Or)], Self::parse_and)
    }

    fn parse_and(&mut self) -> Result<Expr, SyntaxError> {
        self.parse_binary_level(&[(TokenKind::AndAnd, BinaryOp::And)], Self::parse_eq)
    }

    fn parse_eq(&mut self) -> Result<Expr, SyntaxError> {
        self.parse_binary_level(
            &[(TokenKind::EqEq, BinaryOp::Eq), (TokenKind::NotEq, BinaryOp::Ne)],
            Self::parse_rel,
        )
    }

    fn parse_rel(&mut self) -> Result<Expr, SyntaxError> {
        self.parse_binary_level(
            &[
                (TokenKind::Lt, BinaryOp::Lt),
                (TokenKind::Le, BinaryOp::Le),
                (TokenKind::Gt, BinaryOp::Gt),
                (TokenKind::Ge, BinaryOp::Ge),
            ],
            Self::parse_add,
        )
    }

    fn parse_add(&mut self) -> Result<Expr, SyntaxError> {
        self.parse_binary_level(
            &[(TokenKind::Plus, BinaryOp::Add), (TokenKind::Minus, BinaryOp::Sub)],
            Self::parse_mul,
        )
    }

    fn parse_mul(&mut self) -> Result<Expr, SyntaxError> {
        self.parse_binary_level(
            &[
                (TokenKind::Star, BinaryOp::Mul),
                (TokenKind::Slash, BinaryOp::Div),
                (TokenKind::Percent, BinaryOp::Rem),
            ],
            Self::parse_unary,
        )
    }

    // One left-associative precedence level.
    fn parse_binary_level(
        &mut self,
        ops: &[(TokenKind, BinaryOp)],
        next: fn(&mut Self) -> Result<Expr, SyntaxError>,
    ) -> Result<Expr, SyntaxError> {
        let mut expr = next(self)?;
        'outer: loop {
            for (token, op) in ops {
                let offset = self.peek().offset;
                if self.matches(token) {
                    let right = next(self)?;
                    expr = Expr {
                        kind: ExprKind::Binary(BinaryExpr {
                            left: Box::new(expr),
                            op: *op,
                            right: Box::new(right),
                        }),
                        offset,
                    };
                    continue 'outer;
                }
            }
            break;
        }
        Ok(expr)
    }

    fn parse_unary(&mut self) -> Result<Expr, SyntaxError> {
        let offset = self.peek().offset;
        let op = if self.matches(&TokenKind::Minus) {
            UnaryOp::Neg
        } else if self.matches(&TokenKind::Bang) {
            UnaryOp::Not
        } else {
            return self.parse_postfix();
        };
        let expr = self.parse_unary()?;
        Ok(Expr {
            kind: ExprKind::Unary(UnaryExpr {
                op,
                expr: Box::new(expr),
            }),
            offset,
        })
    }

    fn parse_postfix(&mut self) -> Result<Expr, SyntaxError> {
        let mut expr = self.parse_primary()?;
        loop {
            let offset = self.peek().offset;
            if !self.matches(&TokenKind::Dot) {
                break;
            }
            let name = self.expect_ident("member name after '.'")?;
            if !self.matches(&TokenKind::LParen) {
                expr = Expr {
                    kind: ExprKind::Field(FieldAccess {
                        base: Box::new(expr),
                        name,
                    }),
                    offset,
                };
                continue;
            }

            if let Some(quantifier) = Quantifier::from_name(&name.0) {
                if self.peek().kind == TokenKind::Ident && self.peek_next_is(&TokenKind::Comma) {
                    let var = self.expect_ident("loop variable")?;
                    self.expect(&TokenKind::Comma, "',' after loop variable")?;
                    let predicate = self.parse_expr()?;
                    self.expect(&TokenKind::RParen, "')' after predicate")?;
                    expr = Expr {
                        kind: ExprKind::Comprehension(Comprehension {
                            base: Box::new(expr),
                            quantifier,
                            var,
                            predicate: Box::new(predicate),
                        }),
                        offset,
                    };
                    continue;
                }
            }

            let args = self.parse_args()?;
            expr = Expr {
                kind: ExprKind::Call(Call {
                    base: Some(Box::new(expr)),
                    member: name,
                    args,
                }),
                offset,
            };
        }
        Ok(expr)
    }

    // Assumes the opening '(' has been consumed.
    fn parse_args(&mut self) -> Result<Vec<Expr>, SyntaxError> {
        let mut args = Vec::new();
        if self.matches(&TokenKind::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.parse_expr()?);
            if self.matches(&TokenKind::Comma) {
                continue;
            }
            self.expect(&TokenKind::RParen, "')' after call arguments")?;
            break;
        }
        Ok(args)
    }

    fn parse_primary(&mut self) -> Result<Expr, SyntaxError> {
        let tok = self.peek().clone();
        let kind = match tok.kind {
            TokenKind::Int(v) => ExprKind::Literal(Literal::Int(v)),
            TokenKind::UInt(v) => ExprKind::Literal(Literal::UInt(v)),
            TokenKind::Str(s) => ExprKind::Literal(Literal::Str(s)),
            TokenKind::Bool(b) => ExprKind::Literal(Literal::Bool(b)),
            TokenKind::Ident => {
                self.advance();
                let name = Ident(tok.lexeme.to_string());
                if self.matches(&TokenKind::LParen) {
                    let args = self.parse_args()?;
                    return Ok(Expr {
                        kind: ExprKind::Call(Call {
                            base: None,
                            member: name,
                            args,
                        }),
                        offset: tok.offset,
                    });
                }
                return Ok(Expr {
                    kind: ExprKind::Ident(name),
                    offset: tok.offset,
                });
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expr()?;
                self.expect(&TokenKind::RParen, "')' after expression")?;
                return Ok(expr);
            }
            _ => return Err(self.unexpected("expression")),
        };
        self.advance();
        Ok(Expr {
            kind,
            offset: tok.offset,
        })
    }

    // --- token helpers ---
    fn matches(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            return true;
        }
        false
    }

    fn check(&self, kind: &TokenKind) -> bool {
        &self.peek().kind == kind
    }

    fn peek(&self) -> &Token<'a> {
        // The lexer always ends the stream with Eof and `advance` never steps past it.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_next_is(&self, expected: &TokenKind) -> bool {
        self.tokens
            .get(self.pos + 1)
            .is_some_and(|t| &t.kind == expected)
    }

    fn advance(&mut self) {
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn expect(&mut self, kind: &TokenKind, msg: &'static str) -> Result<(), SyntaxError> {
        if self.matches(kind) {
            Ok(())
        } else {
            Err(self.unexpected(msg))
        }
    }

    fn expect_ident(&mut self, msg: &'static str) -> Result<Ident, SyntaxError> {
        let tok = self.peek();
        if tok.kind != TokenKind::Ident {
            return Err(self.unexpected(msg));
        }
        let ident = Ident(tok.lexeme.to_string());
        self.advance();
        Ok(ident)
    }

    fn unexpected(&self, expected: &'static str) -> SyntaxError {
        let tok = self.peek();
        let found = if tok.kind == TokenKind::Eof {
            "end of input".to_string()
        } else {
            format!("'{}'", tok.lexeme)
        };
        SyntaxError {
            offset: tok.offset,
            expected,
            found,
        }
    }
}
