use crate::scanner::{scan, TokenKind};

fn kinds(source: &str) -> Vec<TokenKind> {
    scan(source)
        .unwrap()
        .into_iter()
        .map(|t| t.kind)
        .collect()
}

#[test]
fn scans_keywords_and_identifiers() {
    let ks = kinds("local x = 1");
    assert_eq!(
        ks,
        vec![
            TokenKind::KwLocal,
            TokenKind::ConstName,
            TokenKind::OpAssign,
            TokenKind::ConstNumber,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn scans_decimal_and_hex_numbers() {
    let tokens = scan("10 0x1F 3.5 0x1p4").unwrap();
    let lexemes: Vec<&str> = tokens
        .iter()
        .filter(|t| t.kind == TokenKind::ConstNumber)
        .map(|t| t.lexeme.as_str())
        .collect();
    assert_eq!(lexemes, vec!["10", "0x1F", "3.5", "0x1p4"]);
}

#[test]
fn scans_quoted_string_escapes() {
    let tokens = scan(r#""a\nb\tc""#).unwrap();
    assert_eq!(tokens[0].kind, TokenKind::ConstString);
    assert_eq!(tokens[0].lexeme, "a\nb\tc");
}

#[test]
fn scans_long_bracket_string() {
    let tokens = scan("[[hello\nworld]]").unwrap();
    assert_eq!(tokens[0].kind, TokenKind::ConstString);
    assert_eq!(tokens[0].lexeme, "hello\nworld");
}

#[test]
fn scans_long_bracket_string_with_level() {
    let tokens = scan("[==[a]]b]==]").unwrap();
    assert_eq!(tokens[0].kind, TokenKind::ConstString);
    assert_eq!(tokens[0].lexeme, "a]]b");
}

#[test]
fn rejects_unterminated_string() {
    let err = scan("\"abc").unwrap_err();
    assert!(err.message.contains("unterminated string"));
}

#[test]
fn rejects_unknown_escape() {
    let err = scan(r#""\q""#).unwrap_err();
    assert!(err.message.contains("unknown escape"));
}

#[test]
fn scans_operator_longest_match() {
    let ks = kinds("a <= b ~= c");
    assert_eq!(
        ks,
        vec![
            TokenKind::ConstName,
            TokenKind::OpLe,
            TokenKind::ConstName,
            TokenKind::OpNe,
            TokenKind::ConstName,
            TokenKind::Eof,
        ]
    );
}
