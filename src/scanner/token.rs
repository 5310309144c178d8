//! Token kinds and the Token type produced by the scanner.

use std::fmt;

/// A 1-based line, 1-based column position in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub const fn new(line: u32, column: u32) -> Self {
        Position { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// All lexical categories recognized by the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // keywords
    KwAnd,
    KwBreak,
    KwDo,
    KwElse,
    KwElseIf,
    KwEnd,
    KwFalse,
    KwFor,
    KwFunction,
    KwGoto,
    KwIf,
    KwIn,
    KwLocal,
    KwNil,
    KwNot,
    KwOr,
    KwRepeat,
    KwReturn,
    KwThen,
    KwTrue,
    KwUntil,
    KwWhile,

    // literal categories
    ConstNumber,
    ConstString,
    ConstName,

    // operators
    OpAdd,      // +
    OpSub,      // -
    OpMul,      // *
    OpDiv,      // /
    OpFloorDiv, // //
    OpMod,      // %
    OpPow,      // ^
    OpLen,      // #
    OpAssign,   // =
    OpEq,       // ==
    OpNe,       // ~=
    OpLt,       // <
    OpLe,       // <=
    OpGt,       // >
    OpGe,       // >=
    OpConcat,   // ..
    OpBitAnd,   // &
    OpBitOr,    // |
    OpTilde,    // ~  (binary xor / unary not, disambiguated by the parser)
    OpShl,      // <<
    OpShr,      // >>

    // delimiters
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    LeftParen,
    RightParen,

    // punctuation
    Comma,
    Semicolon,
    Colon,
    DoubleColon, // ::
    Dot,
    Varargs, // ...

    /// Synthetic separator the parser relies on between statements.
    Newline,
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl TokenKind {
    pub fn keyword_from_str(word: &str) -> Option<TokenKind> {
        Some(match word {
            "and" => TokenKind::KwAnd,
            "break" => TokenKind::KwBreak,
            "do" => TokenKind::KwDo,
            "else" => TokenKind::KwElse,
            "elseif" => TokenKind::KwElseIf,
            "end" => TokenKind::KwEnd,
            "false" => TokenKind::KwFalse,
            "for" => TokenKind::KwFor,
            "function" => TokenKind::KwFunction,
            "goto" => TokenKind::KwGoto,
            "if" => TokenKind::KwIf,
            "in" => TokenKind::KwIn,
            "local" => TokenKind::KwLocal,
            "nil" => TokenKind::KwNil,
            "not" => TokenKind::KwNot,
            "or" => TokenKind::KwOr,
            "repeat" => TokenKind::KwRepeat,
            "return" => TokenKind::KwReturn,
            "then" => TokenKind::KwThen,
            "true" => TokenKind::KwTrue,
            "until" => TokenKind::KwUntil,
            "while" => TokenKind::KwWhile,
            _ => return None,
        })
    }
}

/// A single lexeme with its kind and source position.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub lexeme: String,
    pub kind: TokenKind,
    pub position: Position,
}

impl Token {
    pub fn new(lexeme: impl Into<String>, kind: TokenKind, position: Position) -> Self {
        Token {
            lexeme: lexeme.into(),
            kind,
            position,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?}) at {}", self.lexeme, self.kind, self.position)
    }
}
