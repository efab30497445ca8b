use loxen::scanner::Scanner;
use loxen::token::{Token, TokenType};

fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
    let scanner = Scanner::new(source);
    let tokens: Vec<Token> = scanner.filter_map(Result::ok).collect();

    assert_eq!(tokens.len(), expected.len());

    for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
        assert_eq!(actual.token_type, *expected_type);
        assert_eq!(actual.lexeme, *expected_lexeme);
    }
}

#[test]
fn symbols_scan_in_order() {
    assert_token_sequence(
        "({*.,+*})",
        &[
            (TokenType::LEFT_PAREN, "("),
            (TokenType::LEFT_BRACE, "{"),
            (TokenType::STAR, "*"),
            (TokenType::DOT, "."),
            (TokenType::COMMA, ","),
            (TokenType::PLUS, "+"),
            (TokenType::STAR, "*"),
            (TokenType::RIGHT_BRACE, "}"),
            (TokenType::RIGHT_PAREN, ")"),
            (TokenType::EOF, ""),
        ],
    );
}

#[test]
fn one_and_two_character_operators() {
    assert_token_sequence(
        "! != = == < <= > >=",
        &[
            (TokenType::BANG, "!"),
            (TokenType::BANG_EQUAL, "!="),
            (TokenType::EQUAL, "="),
            (TokenType::EQUAL_EQUAL, "=="),
            (TokenType::LESS, "<"),
            (TokenType::LESS_EQUAL, "<="),
            (TokenType::GREATER, ">"),
            (TokenType::GREATER_EQUAL, ">="),
            (TokenType::EOF, ""),
        ],
    );
}

#[test]
fn keywords_and_identifiers() {
    assert_token_sequence(
        "var language = fun_stuff;",
        &[
            (TokenType::VAR, "var"),
            (TokenType::IDENTIFIER, "language"),
            (TokenType::EQUAL, "="),
            (TokenType::IDENTIFIER, "fun_stuff"),
            (TokenType::SEMICOLON, ";"),
            (TokenType::EOF, ""),
        ],
    );
}

#[test]
fn loop_and_include_keywords_are_recognized() {
    assert_token_sequence(
        r#"break continue include "lib.lox""#,
        &[
            (TokenType::BREAK, "break"),
            (TokenType::CONTINUE, "continue"),
            (TokenType::INCLUDE, "include"),
            (TokenType::STRING("lib.lox".to_string()), "\"lib.lox\""),
            (TokenType::EOF, ""),
        ],
    );
}

#[test]
fn numbers_scan_with_and_without_fractions() {
    let scanner = Scanner::new("12 3.5");
    let tokens: Vec<Token> = scanner.filter_map(Result::ok).collect();

    assert_eq!(tokens.len(), 3);

    match tokens[0].token_type {
        TokenType::NUMBER(n) => assert_eq!(n, 12.0),
        ref other => panic!("expected number, got {:?}", other),
    }

    match tokens[1].token_type {
        TokenType::NUMBER(n) => assert_eq!(n, 3.5),
        ref other => panic!("expected number, got {:?}", other),
    }
}

#[test]
fn comments_and_whitespace_are_skipped() {
    assert_token_sequence(
        "// a comment\nprint 1; // trailing",
        &[
            (TokenType::PRINT, "print"),
            (TokenType::NUMBER(1.0), "1"),
            (TokenType::SEMICOLON, ";"),
            (TokenType::EOF, ""),
        ],
    );
}

#[test]
fn strings_keep_their_decoded_value() {
    let scanner = Scanner::new(r#""hello world""#);
    let tokens: Vec<Token> = scanner.filter_map(Result::ok).collect();

    match &tokens[0].token_type {
        TokenType::STRING(s) => assert_eq!(s, "hello world"),
        other => panic!("expected string, got {:?}", other),
    }
}

#[test]
fn unterminated_string_is_an_error() {
    let scanner = Scanner::new(r#""oops"#);
    let errors: Vec<String> = scanner
        .filter_map(Result::err)
        .map(|e| e.to_string())
        .collect();

    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("Unterminated string."));
}

#[test]
fn unexpected_characters_are_reported_and_scanning_continues() {
    let scanner = Scanner::new(",.$(#");
    let results: Vec<_> = scanner.collect();

    // Two valid tokens, an error, a valid token, an error, then EOF.
    assert_eq!(results.len(), 6);

    let error_count = results.iter().filter(|r| r.is_err()).count();
    assert_eq!(error_count, 2);

    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        assert!(
            err.to_string().contains("Unexpected character"),
            "unexpected message: {}",
            err
        );
    }

    let kinds: Vec<TokenType> = results
        .iter()
        .filter_map(|r| r.as_ref().ok())
        .map(|t| t.token_type.clone())
        .collect();

    assert_eq!(
        kinds,
        vec![
            TokenType::COMMA,
            TokenType::DOT,
            TokenType::LEFT_PAREN,
            TokenType::EOF,
        ]
    );
}

#[test]
fn lines_are_tracked_across_newlines() {
    let scanner = Scanner::new("1\n2\n3");
    let tokens: Vec<Token> = scanner.filter_map(Result::ok).collect();

    assert_eq!(tokens[0].line, 1);
    assert_eq!(tokens[1].line, 2);
    assert_eq!(tokens[2].line, 3);
}
