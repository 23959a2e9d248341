#[cfg(test)]
mod scanner_tests {
    use pretty_assertions::assert_eq;

    use rox::error::LoxError;
    use rox::scanner::*;
    use rox::token::*;

    fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
        let tokens: Vec<Token<'_>> = scan(source).unwrap();

        assert_eq!(tokens.len(), expected.len());

        for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
            assert_eq!(actual.token_type, *expected_type);
            assert_eq!(actual.lexeme, *expected_lexeme);
        }
    }

    #[test]
    fn test_scanner_01_symbols() {
        assert_token_sequence(
            "({*.,+*})[]?:",
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
                (TokenType::LEFT_BRACKET, "["),
                (TokenType::RIGHT_BRACKET, "]"),
                (TokenType::QUESTION, "?"),
                (TokenType::COLON, ":"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_02_operators() {
        assert_token_sequence(
            "! != = == < <= > >= && || / -",
            &[
                (TokenType::BANG, "!"),
                (TokenType::BANG_EQUAL, "!="),
                (TokenType::EQUAL, "="),
                (TokenType::EQUAL_EQUAL, "=="),
                (TokenType::LESS, "<"),
                (TokenType::LESS_EQUAL, "<="),
                (TokenType::GREATER, ">"),
                (TokenType::GREATER_EQUAL, ">="),
                (TokenType::AND, "&&"),
                (TokenType::OR, "||"),
                (TokenType::SLASH, "/"),
                (TokenType::MINUS, "-"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_03_keywords_and_identifiers() {
        assert_token_sequence(
            "let fn struct null this super foo _bar1 continue",
            &[
                (TokenType::LET, "let"),
                (TokenType::FN, "fn"),
                (TokenType::STRUCT, "struct"),
                (TokenType::NULL, "null"),
                (TokenType::THIS, "this"),
                (TokenType::SUPER, "super"),
                (TokenType::IDENTIFIER, "foo"),
                (TokenType::IDENTIFIER, "_bar1"),
                (TokenType::CONTINUE, "continue"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_04_literals() {
        let tokens = scan("12.5 7 \"hi there\"").unwrap();

        assert!(matches!(tokens[0].token_type, TokenType::NUMBER(n) if n == 12.5));
        assert!(matches!(tokens[1].token_type, TokenType::NUMBER(n) if n == 7.0));
        assert!(matches!(&tokens[2].token_type, TokenType::STRING(s) if s == "hi there"));
        assert_eq!(tokens[2].lexeme, "\"hi there\"");

        assert_eq!(tokens[0].to_string(), "NUMBER 12.5 12.5");
        assert_eq!(tokens[1].to_string(), "NUMBER 7 7.0");
        assert_eq!(tokens[2].to_string(), "STRING \"hi there\" hi there");
        assert_eq!(tokens[3].to_string(), "EOF  null");
    }

    #[test]
    fn test_scanner_05_comments_and_lines() {
        let source = "// leading comment\nprint 1; // trailing\n\n\"multi\nline\" x";
        let tokens = scan(source).unwrap();

        let summary: Vec<(&str, usize)> = tokens.iter().map(|t| (t.lexeme, t.line)).collect();

        assert_eq!(
            summary,
            vec![
                ("print", 2),
                ("1", 2),
                (";", 2),
                ("\"multi\nline\"", 5),
                ("x", 5),
                ("", 5),
            ]
        );
    }

    #[test]
    fn test_scanner_06_exactly_one_eof() {
        for source in ["", "   \n\t", "// only a comment", "a b c"] {
            let tokens = scan(source).unwrap();
            let eofs = tokens
                .iter()
                .filter(|t| matches!(t.token_type, TokenType::EOF))
                .count();

            assert_eq!(eofs, 1, "source {:?}", source);
            assert!(matches!(tokens.last().unwrap().token_type, TokenType::EOF));
        }
    }

    #[test]
    fn test_unexpected_chars_stop_the_stream() {
        let results: Vec<_> = Scanner::new(",.$(#").collect();

        // COMMA, DOT, then the error for '$'; nothing after it.
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().token_type, TokenType::COMMA);
        assert_eq!(results[1].as_ref().unwrap().token_type, TokenType::DOT);

        let err = results[2].as_ref().unwrap_err();
        assert!(matches!(err, LoxError::Lex { line: 1, .. }));
        assert_eq!(err.to_string(), "[line 1] Error: Unexpected character: $");
    }

    #[test]
    fn test_scan_reports_first_error() {
        let err = scan("let a = \"open;\nlet b = 2;").unwrap_err();
        assert_eq!(err.to_string(), "[line 2] Error: Unterminated string.");

        let err = scan("a & b").unwrap_err();
        assert_eq!(err.to_string(), "[line 1] Error: Unterminated '&'.");

        let err = scan("a | b").unwrap_err();
        assert_eq!(err.to_string(), "[line 1] Error: Unterminated '|'.");
    }

    #[test]
    fn test_rescanning_lexemes_gives_same_kinds() {
        let source =
            "struct P { fn area() { return this.w * 2.5; } } let x = !(a >= 3) && b || \"s\";";
        let tokens = scan(source).unwrap();

        let joined: String = tokens
            .iter()
            .map(|t| t.lexeme)
            .collect::<Vec<_>>()
            .join(" ");
        let rescanned = scan(&joined).unwrap();

        fn kinds(ts: &[Token<'_>]) -> Vec<&'static str> {
            ts.iter().map(|t| t.token_type.name()).collect()
        }

        assert_eq!(kinds(&tokens), kinds(&rescanned));
    }

    #[test]
    fn test_tokens_serialize_to_json() {
        let tokens = scan("let n = 1;").unwrap();
        let json = serde_json::to_value(&tokens).unwrap();

        assert_eq!(json[0]["token_type"], "LET");
        assert_eq!(json[3]["token_type"]["NUMBER"], 1.0);
        assert_eq!(json[3]["lexeme"], "1");
        assert_eq!(json[5]["token_type"], "EOF");
    }
}
