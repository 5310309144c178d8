//! String literal scanning: `'...'`/`"..."` with escapes, and long-bracket
//! `[[...]]` / `[=[...]=]` strings.

use super::token::{Position, Token, TokenKind};
use super::{Scanner, ScannerError};

pub(super) fn scan_quoted_string(
    scanner: &mut Scanner,
    start: Position,
) -> Result<Token, ScannerError> {
    let quote = scanner.bump();
    let mut value = String::new();
    loop {
        if scanner.is_eof() || scanner.current() == '\n' {
            return Err(scanner.err(start, "unterminated string"));
        }
        let c = scanner.bump();
        if c == quote {
            break;
        }
        if c == '\\' {
            value.push(scan_escape(scanner, start)?);
        } else {
            value.push(c);
        }
    }
    Ok(Token::new(value, TokenKind::ConstString, start))
}

fn scan_escape(scanner: &mut Scanner, start: Position) -> Result<char, ScannerError> {
    if scanner.is_eof() {
        return Err(scanner.err(start, "unterminated string"));
    }
    let c = scanner.bump();
    Ok(match c {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        'a' => '\u{7}',
        'b' => '\u{8}',
        'f' => '\u{c}',
        'v' => '\u{b}',
        '\\' => '\\',
        '\'' => '\'',
        '"' => '"',
        '\n' => '\n',
        'x' => {
            let mut code = 0u32;
            for _ in 0..2 {
                let digit = scanner
                    .current()
                    .to_digit(16)
                    .ok_or_else(|| scanner.err(start, "malformed \\x escape"))?;
                code = code * 16 + digit;
                scanner.bump();
            }
            char::from_u32(code).unwrap_or('\u{fffd}')
        }
        d if d.is_ascii_digit() => {
            let mut code = d.to_digit(10).unwrap();
            for _ in 0..2 {
                if let Some(digit) = scanner.current().to_digit(10) {
                    code = code * 10 + digit;
                    scanner.bump();
                } else {
                    break;
                }
            }
            char::from_u32(code).unwrap_or('\u{fffd}')
        }
        other => {
            return Err(scanner.err(start, format!("unknown escape sequence '\\{other}'")));
        }
    })
}

/// Attempts to scan a long-bracket string starting at `[`. Returns `Ok(None)`
/// if this is not actually a long-bracket opener (e.g. a bare `[`), leaving
/// the scanner position unchanged in that case.
pub(super) fn try_scan_long_string(
    scanner: &mut Scanner,
    start: Position,
) -> Result<Option<Token>, ScannerError> {
    let save = (scanner.pos, scanner.line, scanner.column);
    scanner.bump(); // consume '['
    let level = scanner.count_long_bracket_level();
    if scanner.current() != '[' {
        scanner.pos = save.0;
        scanner.line = save.1;
        scanner.column = save.2;
        return Ok(None);
    }
    scanner.bump();
    if scanner.current() == '\n' {
        scanner.bump();
    }

    let mut value = String::new();
    loop {
        if scanner.is_eof() {
            return Err(scanner.err(start, "unterminated long string"));
        }
        if scanner.current() == ']' {
            let inner_save = (scanner.pos, scanner.line, scanner.column);
            scanner.bump();
            let closing_level = scanner.count_long_bracket_level();
            if closing_level == level && scanner.current() == ']' {
                scanner.bump();
                return Ok(Some(Token::new(value, TokenKind::ConstString, start)));
            }
            scanner.pos = inner_save.0;
            scanner.line = inner_save.1;
            scanner.column = inner_save.2;
            value.push(scanner.bump());
        } else {
            value.push(scanner.bump());
        }
    }
}
