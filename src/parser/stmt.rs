//! Statement grammar: block parsing, leading-token dispatch, and the
//! for-loop lookahead that distinguishes numeric from generic `for`.

use super::Parser;
use crate::ast::{Block, FunctionName, FunctionThunk, PrefixExpr, Stat};
use crate::error::ParserError;
use crate::scanner::TokenKind;

impl Parser {
    pub(super) fn parse_block(&mut self) -> Result<Block, ParserError> {
        let position = self.here();
        let mut statements = Vec::new();
        let mut laststat = None;

        while !self.is_block_end() {
            if self.bump_if(TokenKind::Semicolon) {
                continue;
            }
            if matches!(
                self.peek_kind(),
                TokenKind::KwReturn | TokenKind::KwBreak | TokenKind::KwGoto
            ) {
                laststat = Some(Box::new(self.parse_laststat()?));
                break;
            }
            statements.push(self.parse_statement()?);
        }

        Ok(Block {
            statements,
            laststat,
            position,
        })
    }

    fn parse_laststat(&mut self) -> Result<Stat, ParserError> {
        let position = self.here();
        match self.peek_kind() {
            TokenKind::KwReturn => {
                self.advance();
                let values = if self.is_block_end() || self.check(TokenKind::Semicolon) {
                    Vec::new()
                } else {
                    self.parse_expr_list()?
                };
                self.bump_if(TokenKind::Semicolon);
                Ok(Stat::Return { values, position })
            }
            TokenKind::KwBreak => {
                self.advance();
                Ok(Stat::Break { position })
            }
            TokenKind::KwGoto => {
                self.advance();
                let (label, _) = self.expect_name()?;
                Ok(Stat::Goto { label, position })
            }
            _ => unreachable!("caller only dispatches return/break/goto"),
        }
    }

    fn parse_statement(&mut self) -> Result<Stat, ParserError> {
        match self.peek_kind() {
            TokenKind::KwDo => self.parse_do(),
            TokenKind::KwWhile => self.parse_while(),
            TokenKind::KwRepeat => self.parse_repeat(),
            TokenKind::KwIf => self.parse_if(),
            TokenKind::KwFor => self.parse_for(),
            TokenKind::KwFunction => self.parse_function_def(),
            TokenKind::KwLocal => self.parse_local(),
            TokenKind::DoubleColon => self.parse_label(),
            _ => self.parse_assign_or_call(),
        }
    }

    fn parse_do(&mut self) -> Result<Stat, ParserError> {
        let position = self.here();
        self.advance();
        let body = self.parse_block()?;
        self.expect(TokenKind::KwEnd, "'end' to close 'do'")?;
        Ok(Stat::Do { body, position })
    }

    fn parse_while(&mut self) -> Result<Stat, ParserError> {
        let position = self.here();
        self.advance();
        let cond = self.parse_expr()?;
        self.expect(TokenKind::KwDo, "'do' after while condition")?;
        let body = self.parse_block()?;
        self.expect(TokenKind::KwEnd, "'end' to close 'while'")?;
        Ok(Stat::While {
            cond,
            body,
            position,
        })
    }

    fn parse_repeat(&mut self) -> Result<Stat, ParserError> {
        let position = self.here();
        self.advance();
        let body = self.parse_block()?;
        self.expect(TokenKind::KwUntil, "'until' to close 'repeat'")?;
        let cond = self.parse_expr()?;
        Ok(Stat::Repeat {
            body,
            cond,
            position,
        })
    }

    fn parse_if(&mut self) -> Result<Stat, ParserError> {
        let position = self.here();
        self.advance();
        let mut cond_blocks = Vec::new();

        let cond = self.parse_expr()?;
        self.expect(TokenKind::KwThen, "'then' after if condition")?;
        let body = self.parse_block()?;
        cond_blocks.push((cond, body));

        while self.bump_if(TokenKind::KwElseIf) {
            let cond = self.parse_expr()?;
            self.expect(TokenKind::KwThen, "'then' after elseif condition")?;
            let body = self.parse_block()?;
            cond_blocks.push((cond, body));
        }

        let else_block = if self.bump_if(TokenKind::KwElse) {
            Some(self.parse_block()?)
        } else {
            None
        };

        self.expect(TokenKind::KwEnd, "'end' to close 'if'")?;
        Ok(Stat::If {
            cond_blocks,
            else_block,
            position,
        })
    }

    /// Distinguished by lookahead after the induction name: `for n = ...` is
    /// numeric, `for n [, m, ...] in ...` is generic.
    fn parse_for(&mut self) -> Result<Stat, ParserError> {
        let position = self.here();
        self.advance();
        let (first_name, _) = self.expect_name()?;

        if self.bump_if(TokenKind::OpAssign) {
            let start = self.parse_expr()?;
            self.expect(TokenKind::Comma, "',' after numeric for start value")?;
            let stop = self.parse_expr()?;
            let step = if self.bump_if(TokenKind::Comma) {
                Some(self.parse_expr()?)
            } else {
                None
            };
            self.expect(TokenKind::KwDo, "'do' after numeric for header")?;
            let body = self.parse_block()?;
            self.expect(TokenKind::KwEnd, "'end' to close numeric 'for'")?;
            return Ok(Stat::For {
                name: first_name,
                start,
                stop,
                step,
                body,
                position,
            });
        }

        let mut names = vec![first_name];
        while self.bump_if(TokenKind::Comma) {
            let (name, _) = self.expect_name()?;
            names.push(name);
        }
        self.expect(TokenKind::KwIn, "'in' in generic for")?;
        let exprs = self.parse_expr_list()?;
        self.expect(TokenKind::KwDo, "'do' after generic for header")?;
        let body = self.parse_block()?;
        self.expect(TokenKind::KwEnd, "'end' to close generic 'for'")?;
        Ok(Stat::ForIn {
            names,
            exprs,
            body,
            position,
        })
    }

    fn parse_function_def(&mut self) -> Result<Stat, ParserError> {
        let position = self.here();
        self.advance();
        let (first, _) = self.expect_name()?;
        let mut path = vec![first];
        while self.bump_if(TokenKind::Dot) {
            let (part, _) = self.expect_name()?;
            path.push(part);
        }
        let method = if self.bump_if(TokenKind::Colon) {
            let (m, _) = self.expect_name()?;
            Some(m)
        } else {
            None
        };
        let is_method = method.is_some();
        let name = FunctionName {
            path,
            method,
            position,
        };
        let body = self.parse_function_thunk_body(is_method)?;
        Ok(Stat::FunctionDef {
            name,
            body,
            position,
        })
    }

    fn parse_local(&mut self) -> Result<Stat, ParserError> {
        let position = self.here();
        self.advance();

        if self.bump_if(TokenKind::KwFunction) {
            let (name, _) = self.expect_name()?;
            let body = self.parse_function_thunk_body(false)?;
            return Ok(Stat::LocalFunction {
                name,
                body,
                position,
            });
        }

        let (first, _) = self.expect_name()?;
        let mut names = vec![first];
        while self.bump_if(TokenKind::Comma) {
            let (name, _) = self.expect_name()?;
            names.push(name);
        }
        let values = if self.bump_if(TokenKind::OpAssign) {
            self.parse_expr_list()?
        } else {
            Vec::new()
        };
        Ok(Stat::LocalVars {
            names,
            values,
            position,
        })
    }

    fn parse_label(&mut self) -> Result<Stat, ParserError> {
        let position = self.here();
        self.advance();
        let (name, _) = self.expect_name()?;
        self.expect(TokenKind::DoubleColon, "'::' to close label")?;
        Ok(Stat::Label { name, position })
    }

    /// A statement that doesn't start with a statement keyword is either an
    /// assignment (`prefixexp {, prefixexp} = explist`) or a bare function
    /// call statement (a `PrefixExpr` ending in a call/method-call suffix).
    fn parse_assign_or_call(&mut self) -> Result<Stat, ParserError> {
        let position = self.here();
        let first = self.parse_prefix_expr()?;

        if self.check(TokenKind::OpAssign) || self.check(TokenKind::Comma) {
            let mut targets = vec![first];
            while self.bump_if(TokenKind::Comma) {
                targets.push(self.parse_prefix_expr()?);
            }
            self.expect(TokenKind::OpAssign, "'=' in assignment")?;
            let values = self.parse_expr_list()?;
            return Ok(Stat::Assign {
                targets,
                values,
                position,
            });
        }

        match first {
            PrefixExpr::FunctionCallExpr { .. } | PrefixExpr::MethodCall { .. } => {
                Ok(Stat::FunctionCallStat {
                    call: first,
                    position,
                })
            }
            _ => Err(ParserError {
                message: "expected a function call or assignment".to_string(),
                token: Some(self.peek().clone()),
            }),
        }
    }

    pub(super) fn parse_function_thunk_body(
        &mut self,
        is_method: bool,
    ) -> Result<FunctionThunk, ParserError> {
        let position = self.here();
        self.expect(TokenKind::LeftParen, "'(' after function name")?;

        let mut params = Vec::new();
        if is_method {
            params.push("self".to_string());
        }
        let mut is_varargs = false;

        if !self.check(TokenKind::RightParen) {
            loop {
                if self.bump_if(TokenKind::Varargs) {
                    is_varargs = true;
                    break;
                }
                let (name, _) = self.expect_name()?;
                params.push(name);
                if !self.bump_if(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RightParen, "')' to close parameter list")?;

        let body = self.parse_block()?;
        self.expect(TokenKind::KwEnd, "'end' to close function body")?;

        Ok(FunctionThunk {
            params,
            is_varargs,
            body,
            position,
        })
    }
}
