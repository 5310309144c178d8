//! Expression grammar: precedence-climbing binary operators, unary prefix
//! operators, and prefix expressions (name/paren base plus index/field/
//! call/method-call suffixes).
//!
//! Precedence, lowest to highest: `or`, `and`, comparison, `..` (right),
//! additive, multiplicative, unary, `^` (right), primary. Each level parses
//! its operand at the next higher level; `^` and `..` recurse back into
//! their own level on the right-hand side to right-associate.

use super::Parser;
use crate::ast::{BinOp, Expr, Factor, PrefixExpr, Table, TableField, UnOp};
use crate::error::ParserError;
use crate::scanner::TokenKind;

impl Parser {
    pub(super) fn parse_expr_list(&mut self) -> Result<Vec<Expr>, ParserError> {
        let mut exprs = vec![self.parse_expr()?];
        while self.bump_if(TokenKind::Comma) {
            exprs.push(self.parse_expr()?);
        }
        Ok(exprs)
    }

    pub(super) fn parse_expr(&mut self) -> Result<Expr, ParserError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr, ParserError> {
        let mut lhs = self.parse_and()?;
        while self.check(TokenKind::KwOr) {
            let position = self.here();
            self.advance();
            let rhs = self.parse_and()?;
            lhs = bin(BinOp::Or, lhs, rhs, position);
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, ParserError> {
        let mut lhs = self.parse_comparison()?;
        while self.check(TokenKind::KwAnd) {
            let position = self.here();
            self.advance();
            let rhs = self.parse_comparison()?;
            lhs = bin(BinOp::And, lhs, rhs, position);
        }
        Ok(lhs)
    }

    fn parse_comparison(&mut self) -> Result<Expr, ParserError> {
        let mut lhs = self.parse_concat()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::OpLt => BinOp::Lt,
                TokenKind::OpLe => BinOp::Le,
                TokenKind::OpGt => BinOp::Gt,
                TokenKind::OpGe => BinOp::Ge,
                TokenKind::OpEq => BinOp::Eq,
                TokenKind::OpNe => BinOp::Ne,
                _ => break,
            };
            let position = self.here();
            self.advance();
            let rhs = self.parse_concat()?;
            lhs = bin(op, lhs, rhs, position);
        }
        Ok(lhs)
    }

    /// Right-associative: after seeing `..`, recurse into this same level
    /// for the right-hand side rather than the next level down.
    fn parse_concat(&mut self) -> Result<Expr, ParserError> {
        let lhs = self.parse_additive()?;
        if self.check(TokenKind::OpConcat) {
            let position = self.here();
            self.advance();
            let rhs = self.parse_concat()?;
            return Ok(bin(BinOp::Concat, lhs, rhs, position));
        }
        Ok(lhs)
    }

    fn parse_additive(&mut self) -> Result<Expr, ParserError> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::OpAdd => BinOp::Add,
                TokenKind::OpSub => BinOp::Sub,
                _ => break,
            };
            let position = self.here();
            self.advance();
            let rhs = self.parse_multiplicative()?;
            lhs = bin(op, lhs, rhs, position);
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ParserError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::OpMul => BinOp::Mul,
                TokenKind::OpDiv => BinOp::Div,
                TokenKind::OpFloorDiv => BinOp::FloorDiv,
                TokenKind::OpMod => BinOp::Mod,
                TokenKind::OpBitAnd => BinOp::BitAnd,
                TokenKind::OpBitOr => BinOp::BitOr,
                TokenKind::OpTilde => BinOp::BitXor,
                TokenKind::OpShl => BinOp::Shl,
                TokenKind::OpShr => BinOp::Shr,
                _ => break,
            };
            let position = self.here();
            self.advance();
            let rhs = self.parse_unary()?;
            lhs = bin(op, lhs, rhs, position);
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParserError> {
        let op = match self.peek_kind() {
            TokenKind::OpSub => UnOp::Neg,
            TokenKind::KwNot => UnOp::Not,
            TokenKind::OpLen => UnOp::Len,
            TokenKind::OpTilde => UnOp::BitNot,
            _ => return self.parse_pow(),
        };
        let position = self.here();
        self.advance();
        let rhs = self.parse_unary()?;
        Ok(Expr::Unary {
            op,
            rhs: Box::new(rhs),
            position,
        })
    }

    /// Right-associative: binds tighter than unary on its left (`-x^2` is
    /// `-(x^2)`) but recurses into itself on the right (`x^y^z` is
    /// `x^(y^z)`).
    fn parse_pow(&mut self) -> Result<Expr, ParserError> {
        let lhs = self.parse_primary()?;
        if self.check(TokenKind::OpPow) {
            let position = self.here();
            self.advance();
            let rhs = self.parse_unary()?;
            return Ok(bin(BinOp::Pow, lhs, rhs, position));
        }
        Ok(lhs)
    }

    fn parse_primary(&mut self) -> Result<Expr, ParserError> {
        let position = self.here();
        let factor = match self.peek_kind() {
            TokenKind::KwNil => {
                self.advance();
                Factor::Nil(position)
            }
            TokenKind::KwTrue => {
                self.advance();
                Factor::Boolean(true, position)
            }
            TokenKind::KwFalse => {
                self.advance();
                Factor::Boolean(false, position)
            }
            TokenKind::ConstNumber => {
                let tok = self.advance();
                let n = crate::compiler::parse_lua_number(&tok.lexeme).ok_or_else(|| ParserError {
                    message: format!("malformed number literal '{}'", tok.lexeme),
                    token: Some(tok.clone()),
                })?;
                Factor::Number(n, position)
            }
            TokenKind::ConstString => {
                let tok = self.advance();
                Factor::String(tok.lexeme, position)
            }
            TokenKind::Varargs => {
                self.advance();
                Factor::Varargs(position)
            }
            TokenKind::LeftBrace => Factor::Table(self.parse_table()?),
            TokenKind::KwFunction => {
                self.advance();
                let thunk = self.parse_function_thunk_body(false)?;
                return Ok(Expr::FunctionThunk(thunk));
            }
            _ => Factor::Prefix(Box::new(self.parse_prefix_expr()?)),
        };
        Ok(Expr::Factor(factor))
    }

    /// Parses a base (`Name` or `( expr )`) followed by zero or more
    /// suffixes, left-to-right: `.name`, `[expr]`, `:name args`, and
    /// call-args (`( explist? )`, a table constructor, or a bare string).
    pub(super) fn parse_prefix_expr(&mut self) -> Result<PrefixExpr, ParserError> {
        let position = self.here();
        let mut expr = if self.bump_if(TokenKind::LeftParen) {
            let inner = self.parse_expr()?;
            self.expect(TokenKind::RightParen, "')' to close parenthesised expression")?;
            PrefixExpr::Paren(Box::new(inner), position)
        } else {
            let (name, pos) = self.expect_name()?;
            PrefixExpr::Name(name, pos)
        };

        loop {
            let position = self.here();
            expr = match self.peek_kind() {
                TokenKind::Dot => {
                    self.advance();
                    let (name, _) = self.expect_name()?;
                    PrefixExpr::Field {
                        base: Box::new(expr),
                        name,
                        position,
                    }
                }
                TokenKind::LeftBracket => {
                    self.advance();
                    let key = self.parse_expr()?;
                    self.expect(TokenKind::RightBracket, "']' to close index expression")?;
                    PrefixExpr::Index {
                        base: Box::new(expr),
                        key: Box::new(key),
                        position,
                    }
                }
                TokenKind::Colon => {
                    self.advance();
                    let (method, _) = self.expect_name()?;
                    let args = self.parse_call_args()?;
                    PrefixExpr::MethodCall {
                        base: Box::new(expr),
                        method,
                        args,
                        position,
                    }
                }
                TokenKind::LeftParen | TokenKind::LeftBrace | TokenKind::ConstString => {
                    let args = self.parse_call_args()?;
                    PrefixExpr::FunctionCallExpr {
                        callee: Box::new(expr),
                        args,
                        position,
                    }
                }
                _ => break,
            };
        }

        Ok(expr)
    }

    fn parse_call_args(&mut self) -> Result<Vec<Expr>, ParserError> {
        let position = self.here();
        match self.peek_kind() {
            TokenKind::LeftParen => {
                self.advance();
                let args = if self.check(TokenKind::RightParen) {
                    Vec::new()
                } else {
                    self.parse_expr_list()?
                };
                self.expect(TokenKind::RightParen, "')' to close call arguments")?;
                Ok(args)
            }
            TokenKind::LeftBrace => {
                let table = self.parse_table()?;
                Ok(vec![Expr::Factor(Factor::Table(table))])
            }
            TokenKind::ConstString => {
                let tok = self.advance();
                Ok(vec![Expr::Factor(Factor::String(tok.lexeme, position))])
            }
            _ => Err(self.error_expected("call arguments")),
        }
    }

    fn parse_table(&mut self) -> Result<Table, ParserError> {
        let position = self.here();
        self.expect(TokenKind::LeftBrace, "'{' to start table constructor")?;
        let mut fields = Vec::new();

        while !self.check(TokenKind::RightBrace) {
            let field = if self.check(TokenKind::LeftBracket) {
                self.advance();
                let key = self.parse_expr()?;
                self.expect(TokenKind::RightBracket, "']' in table key")?;
                self.expect(TokenKind::OpAssign, "'=' after bracketed table key")?;
                let value = self.parse_expr()?;
                TableField::Bracketed(key, value)
            } else if self.check(TokenKind::ConstName) && self.peek_is_name_assign() {
                let (name, _) = self.expect_name()?;
                self.advance(); // '='
                let value = self.parse_expr()?;
                TableField::Named(name, value)
            } else {
                TableField::Positional(self.parse_expr()?)
            };
            fields.push(field);

            if !self.bump_if(TokenKind::Comma) && !self.bump_if(TokenKind::Semicolon) {
                break;
            }
        }

        self.expect(TokenKind::RightBrace, "'}' to close table constructor")?;
        Ok(Table { fields, position })
    }

    /// Lookahead-of-one past `ConstName` to see whether it's `name = expr`
    /// (a named field) versus a positional expression that merely starts
    /// with a name (e.g. `foo.bar` or `foo()`).
    fn peek_is_name_assign(&self) -> bool {
        self.pos + 1 < self.tokens.len() && self.tokens[self.pos + 1].kind == TokenKind::OpAssign
    }
}

fn bin(op: BinOp, lhs: Expr, rhs: Expr, position: crate::scanner::Position) -> Expr {
    Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
        position,
    }
}
