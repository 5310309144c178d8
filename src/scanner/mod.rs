//! Transforms source text into a linear token stream with positions. A
//! single forward-scanning pass over the input, longest-match on operators,
//! and keyword recognition by string lookup after scanning a full
//! identifier.

mod number;
mod string_lit;
pub mod token;

pub use token::{Position, Token, TokenKind};

/// Malformed lexeme: unterminated string, bad numeric literal, or an
/// unrecognized operator sequence. The scanner never silently skips input.
#[derive(Debug, Clone, PartialEq)]
pub struct ScannerError {
    pub message: String,
    pub position: Position,
}

impl std::fmt::Display for ScannerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at {}", self.message, self.position)
    }
}

impl std::error::Error for ScannerError {}

pub fn scan(source: &str) -> Result<Vec<Token>, ScannerError> {
    Scanner::new(source).scan_all()
}

struct Scanner {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    column: u32,
}

impl Scanner {
    fn new(source: &str) -> Self {
        Scanner {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn current(&self) -> char {
        self.chars.get(self.pos).copied().unwrap_or('\0')
    }

    fn peek_at(&self, offset: usize) -> char {
        self.chars.get(self.pos + offset).copied().unwrap_or('\0')
    }

    fn here(&self) -> Position {
        Position::new(self.line, self.column)
    }

    fn bump(&mut self) -> char {
        let c = self.current();
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        c
    }

    fn bump_if(&mut self, expected: char) -> bool {
        if self.current() == expected {
            self.bump();
            true
        } else {
            false
        }
    }

    fn err(&self, at: Position, message: impl Into<String>) -> ScannerError {
        ScannerError {
            message: message.into(),
            position: at,
        }
    }

    fn scan_all(&mut self) -> Result<Vec<Token>, ScannerError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace_and_comments(&mut tokens)?;
            if self.is_eof() {
                tokens.push(Token::new("", TokenKind::Eof, self.here()));
                return Ok(tokens);
            }
            let start = self.here();
            let c = self.current();
            let token = if c == '\n' {
                self.bump();
                Token::new("\n", TokenKind::Newline, start)
            } else if is_name_start(c) {
                self.scan_name_or_keyword(start)
            } else if c.is_ascii_digit() || (c == '.' && self.peek_at(1).is_ascii_digit()) {
                number::scan_number(self, start)?
            } else if c == '"' || c == '\'' {
                string_lit::scan_quoted_string(self, start)?
            } else if c == '[' && (self.peek_at(1) == '[' || self.peek_at(1) == '=') {
                if let Some(tok) = string_lit::try_scan_long_string(self, start)? {
                    tok
                } else {
                    self.bump();
                    Token::new("[", TokenKind::LeftBracket, start)
                }
            } else {
                self.scan_operator_or_punctuation(start)?
            };
            tokens.push(token);
        }
    }

    /// Whitespace (except newlines, which are significant) and comments are
    /// consumed silently between lexemes.
    fn skip_whitespace_and_comments(&mut self, _tokens: &mut [Token]) -> Result<(), ScannerError> {
        loop {
            match self.current() {
                ' ' | '\t' | '\r' => {
                    self.bump();
                }
                '-' if self.peek_at(1) == '-' => {
                    self.bump();
                    self.bump();
                    if self.current() == '[' {
                        let save = (self.pos, self.line, self.column);
                        self.bump();
                        let level = self.count_long_bracket_level();
                        if self.current() == '[' {
                            self.bump();
                            self.skip_long_bracket_body(level)?;
                            continue;
                        }
                        self.pos = save.0;
                        self.line = save.1;
                        self.column = save.2;
                    }
                    while !self.is_eof() && self.current() != '\n' {
                        self.bump();
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    /// Counts `=` signs between the two long-bracket delimiters, i.e. the
    /// level `n` in `[==[ ... ]==]`. Assumes the opening `[` was consumed.
    fn count_long_bracket_level(&mut self) -> usize {
        let mut level = 0;
        while self.current() == '=' {
            self.bump();
            level += 1;
        }
        level
    }

    fn skip_long_bracket_body(&mut self, level: usize) -> Result<(), ScannerError> {
        let start = self.here();
        loop {
            if self.is_eof() {
                return Err(self.err(start, "unterminated long comment"));
            }
            if self.current() == ']' {
                let save = (self.pos, self.line, self.column);
                self.bump();
                let closing_level = self.count_long_bracket_level();
                if closing_level == level && self.current() == ']' {
                    self.bump();
                    return Ok(());
                }
                self.pos = save.0;
                self.line = save.1;
                self.column = save.2;
                self.bump();
            } else {
                self.bump();
            }
        }
    }

    fn scan_name_or_keyword(&mut self, start: Position) -> Token {
        let mut lexeme = String::new();
        while is_name_continue(self.current()) {
            lexeme.push(self.bump());
        }
        let kind = TokenKind::keyword_from_str(&lexeme).unwrap_or(TokenKind::ConstName);
        Token::new(lexeme, kind, start)
    }

    fn scan_operator_or_punctuation(&mut self, start: Position) -> Result<Token, ScannerError> {
        let start_idx = self.pos;
        let c = self.bump();
        let kind = match c {
            '+' => TokenKind::OpAdd,
            '-' => TokenKind::OpSub,
            '*' => TokenKind::OpMul,
            '/' => {
                if self.bump_if('/') {
                    TokenKind::OpFloorDiv
                } else {
                    TokenKind::OpDiv
                }
            }
            '%' => TokenKind::OpMod,
            '^' => TokenKind::OpPow,
            '#' => TokenKind::OpLen,
            '&' => TokenKind::OpBitAnd,
            '|' => TokenKind::OpBitOr,
            '~' => {
                if self.bump_if('=') {
                    TokenKind::OpNe
                } else {
                    TokenKind::OpTilde
                }
            }
            '<' => {
                if self.bump_if('=') {
                    TokenKind::OpLe
                } else if self.bump_if('<') {
                    TokenKind::OpShl
                } else {
                    TokenKind::OpLt
                }
            }
            '>' => {
                if self.bump_if('=') {
                    TokenKind::OpGe
                } else if self.bump_if('>') {
                    TokenKind::OpShr
                } else {
                    TokenKind::OpGt
                }
            }
            '=' => {
                if self.bump_if('=') {
                    TokenKind::OpEq
                } else {
                    TokenKind::OpAssign
                }
            }
            '.' => {
                if self.bump_if('.') {
                    if self.bump_if('.') {
                        TokenKind::Varargs
                    } else {
                        TokenKind::OpConcat
                    }
                } else {
                    TokenKind::Dot
                }
            }
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            ':' => {
                if self.bump_if(':') {
                    TokenKind::DoubleColon
                } else {
                    TokenKind::Colon
                }
            }
            '{' => TokenKind::LeftBrace,
            '}' => TokenKind::RightBrace,
            '[' => TokenKind::LeftBracket,
            ']' => TokenKind::RightBracket,
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            other => {
                return Err(self.err(start, format!("unknown operator sequence '{other}'")));
            }
        };
        let lexeme: String = self.chars[start_idx..self.pos].iter().collect();
        Ok(Token::new(lexeme, kind, start))
    }
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_name_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
