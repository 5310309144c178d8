//! Numeric literal scanning: decimal/hex/octal/binary integers, optional
//! fractional part, and an optional exponent (`e`/`E` with sign) on decimals.

use super::token::{Position, Token, TokenKind};
use super::{Scanner, ScannerError};

pub(super) fn scan_number(scanner: &mut Scanner, start: Position) -> Result<Token, ScannerError> {
    let start_idx = scanner.pos;

    if scanner.current() == '0' && matches!(scanner.peek_at(1), 'x' | 'X') {
        scanner.bump();
        scanner.bump();
        scan_digits(scanner, is_hex_digit, start, "hexadecimal")?;
        if scanner.current() == '.' {
            scanner.bump();
            scan_digits_allow_empty(scanner, is_hex_digit);
        }
        if matches!(scanner.current(), 'p' | 'P') {
            scan_exponent(scanner, start)?;
        }
    } else if scanner.current() == '0' && matches!(scanner.peek_at(1), 'o' | 'O') {
        scanner.bump();
        scanner.bump();
        scan_digits(scanner, is_octal_digit, start, "octal")?;
    } else if scanner.current() == '0' && matches!(scanner.peek_at(1), 'b' | 'B') {
        scanner.bump();
        scanner.bump();
        scan_digits(scanner, is_binary_digit, start, "binary")?;
    } else {
        scan_digits_allow_empty(scanner, |c| c.is_ascii_digit());
        if scanner.current() == '.' {
            scanner.bump();
            scan_digits_allow_empty(scanner, |c| c.is_ascii_digit());
        }
        if matches!(scanner.current(), 'e' | 'E') {
            scan_exponent(scanner, start)?;
        }
    }

    let lexeme: String = scanner.chars[start_idx..scanner.pos].iter().collect();
    Ok(Token::new(lexeme, TokenKind::ConstNumber, start))
}

fn scan_exponent(scanner: &mut Scanner, start: Position) -> Result<(), ScannerError> {
    scanner.bump(); // e/E/p/P
    if matches!(scanner.current(), '+' | '-') {
        scanner.bump();
    }
    scan_digits(scanner, |c| c.is_ascii_digit(), start, "exponent")
}

fn scan_digits(
    scanner: &mut Scanner,
    pred: impl Fn(char) -> bool,
    start: Position,
    kind: &str,
) -> Result<(), ScannerError> {
    let before = scanner.pos;
    while pred(scanner.current()) {
        scanner.bump();
    }
    if scanner.pos == before {
        return Err(scanner.err(start, format!("malformed {kind} number: no digits")));
    }
    Ok(())
}

fn scan_digits_allow_empty(scanner: &mut Scanner, pred: impl Fn(char) -> bool) {
    while pred(scanner.current()) {
        scanner.bump();
    }
}

fn is_hex_digit(c: char) -> bool {
    c.is_ascii_hexdigit()
}

fn is_octal_digit(c: char) -> bool {
    ('0'..='7').contains(&c)
}

fn is_binary_digit(c: char) -> bool {
    c == '0' || c == '1'
}
