//! Recursive-descent construction of a `Block` AST from the scanner's token
//! stream, with operator-precedence climbing for expressions
//! (`parser/expr.rs`) and per-statement dispatch on the leading token
//! (`parser/stmt.rs`).
//!
//! The parser does not attempt error recovery: the first grammar violation
//! returns immediately as a `ParserError` naming the expected construct and
//! carrying the offending token.

mod expr;
mod stmt;

use crate::ast::Block;
use crate::error::ParserError;
use crate::scanner::{Position, Token, TokenKind};

pub fn parse(tokens: Vec<Token>) -> Result<Block, ParserError> {
    Parser::new(tokens).parse_chunk()
}

pub(crate) struct Parser {
    /// Significant tokens only: the scanner's synthetic `Newline` separators
    /// are dropped up front. Lua's grammar is self-delimiting by leading
    /// keyword/token, so newlines carry no structural information the
    /// recursive-descent parser needs; keeping them out of this stream
    /// avoids threading `skip_newlines()` calls through every production.
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        let tokens = tokens
            .into_iter()
            .filter(|t| t.kind != TokenKind::Newline)
            .collect();
        Parser { tokens, pos: 0 }
    }

    fn parse_chunk(&mut self) -> Result<Block, ParserError> {
        let block = self.parse_block()?;
        self.expect(TokenKind::Eof, "end of input")?;
        Ok(block)
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    fn here(&self) -> Position {
        self.peek().position
    }

    fn advance(&mut self) -> Token {
        let tok = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn bump_if(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token, ParserError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error_expected(what))
        }
    }

    fn expect_name(&mut self) -> Result<(String, Position), ParserError> {
        let pos = self.here();
        if self.check(TokenKind::ConstName) {
            let tok = self.advance();
            Ok((tok.lexeme, pos))
        } else {
            Err(self.error_expected("a name"))
        }
    }

    fn error_expected(&self, what: &str) -> ParserError {
        let token = if self.check(TokenKind::Eof) {
            None
        } else {
            Some(self.peek().clone())
        };
        ParserError {
            message: format!("expected {what}"),
            token,
        }
    }

    fn is_block_end(&self) -> bool {
        matches!(
            self.peek_kind(),
            TokenKind::Eof
                | TokenKind::KwEnd
                | TokenKind::KwElse
                | TokenKind::KwElseIf
                | TokenKind::KwUntil
        )
    }
}
