use super::*;
use pretty_assertions::assert_eq;

fn kinds(source: &str) -> Vec<TokenKind> {
    let (tokens, diagnostics) = scan(source);
    assert!(diagnostics.is_empty(), "{:?}", diagnostics);
    tokens.into_iter().map(|t| t.kind).collect()
}

#[test]
fn test_basic_tokens() {
    assert_eq!(
        kinds("x: int = 5"),
        vec![
            TokenKind::Identifier("x".to_string()),
            TokenKind::Colon,
            TokenKind::TypeInt,
            TokenKind::Assign,
            TokenKind::Int(5),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_one_character_lookahead_operators() {
    assert_eq!(
        kinds("= == ! != < <= > >= : :: - ->"),
        vec![
            TokenKind::Assign,
            TokenKind::EqualEqual,
            TokenKind::Bang,
            TokenKind::BangEqual,
            TokenKind::Less,
            TokenKind::LessEqual,
            TokenKind::Greater,
            TokenKind::GreaterEqual,
            TokenKind::Colon,
            TokenKind::DoubleColon,
            TokenKind::Minus,
            TokenKind::Arrow,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_keywords_and_identifiers() {
    assert_eq!(
        kinds("if iffy return returned class new import and or"),
        vec![
            TokenKind::KeywordIf,
            TokenKind::Identifier("iffy".to_string()),
            TokenKind::KeywordReturn,
            TokenKind::Identifier("returned".to_string()),
            TokenKind::KeywordClass,
            TokenKind::KeywordNew,
            TokenKind::KeywordImport,
            TokenKind::And,
            TokenKind::Or,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_number_classification() {
    assert_eq!(
        kinds("42 3.14 0"),
        vec![
            TokenKind::Int(42),
            TokenKind::Float(3.14),
            TokenKind::Int(0),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_string_token_keeps_raw_contents() {
    assert_eq!(
        kinds(r#""hello world""#),
        vec![TokenKind::String("hello world".to_string()), TokenKind::Eof]
    );
}

#[test]
fn test_line_comments_are_skipped() {
    assert_eq!(
        kinds("1 // the rest is ignored ) ( \n2"),
        vec![TokenKind::Int(1), TokenKind::Int(2), TokenKind::Eof]
    );
}

#[test]
fn test_lines_are_tracked() {
    let (tokens, _) = scan("a\nb\n\n\"multi\nline\"\nc");
    let lines: Vec<usize> = tokens.iter().map(|t| t.line).collect();
    assert_eq!(lines, vec![1, 2, 4, 6, 6]);
    assert_eq!(tokens[0].lexeme, "a");
}

#[test]
fn test_error_recovery_continues_scanning() {
    let (tokens, diagnostics) = scan("x @ y\n# z");
    assert_eq!(diagnostics.len(), 2);
    assert_eq!(diagnostics[0].line, 1);
    assert_eq!(diagnostics[0].message, "unexpected character '@'");
    assert_eq!(diagnostics[1].line, 2);
    let kinds: Vec<TokenKind> = tokens.into_iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::Identifier("x".to_string()),
            TokenKind::Identifier("y".to_string()),
            TokenKind::Identifier("z".to_string()),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_unterminated_string() {
    let (tokens, diagnostics) = scan("a = \"never closed");
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(
        diagnostics[0].to_string(),
        "[Line 1] Lex Error: unterminated string"
    );
    assert_eq!(tokens.last().map(|t| t.kind.clone()), Some(TokenKind::Eof));
}

#[test]
fn test_empty_source_still_has_eof() {
    let (tokens, diagnostics) = scan("");
    assert!(diagnostics.is_empty());
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].kind, TokenKind::Eof);
    assert_eq!(tokens[0].line, 1);
}

#[test]
fn test_integer_out_of_range() {
    let (_, diagnostics) = scan("99999999999999999999");
    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics[0].message.contains("out of range"));
}
