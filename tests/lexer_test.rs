use color_eyre::eyre::{Context, Result};
use proptest::prelude::*;
use std::{
    fs::{read_dir, read_to_string},
    path::Path,
};

use pjscript::lexer::{
    formatter::{BasicFormatter, LineFormatter, TokenFormatter},
    Lexer, Token, TokenKind,
};

fn check(input: &str, expected: &str, test_name: &str) {
    let formatter = BasicFormatter;
    let mut buffer = String::new();
    for token in Lexer::new(input) {
        buffer.push_str(&formatter.format(&token));
        buffer.push('\n');
    }

    assert_eq!(buffer, expected, "Failed the test {test_name}");
}

#[test]
fn smoke_test() {
    check("", "EOF\n", "smoke");
}

#[test]
fn test_operator_characters() {
    check(
        "=+(){**},-/*%.:",
        "ASSIGN =\nPLUS +\nLPAREN (\nRPAREN )\nLBRACE {\nDOUBLE_ASTERISK **\nRBRACE }\nCOMMA ,\nMINUS -\nSLASH /\nASTERISK *\nPERCENT %\nDOT .\nCOLON :\nEOF\n",
        "operator characters",
    );
}

#[test]
fn test_illegal_characters() {
    check(
        "a @ é",
        "IDENTIFIER a\nILLEGAL @\nILLEGAL é\nEOF\n",
        "illegal characters",
    );
}

#[test]
fn test_unterminated_string_runs_to_end_of_input() {
    check("x = \"abc", "IDENTIFIER x\nASSIGN =\nSTRING \"abc\"\nEOF\n", "unterminated");
}

#[test]
fn test_string_escapes_are_decoded() {
    let tokens: Vec<Token> = Lexer::new(r#""a\"b\\c\nd\te""#).collect();
    assert_eq!(tokens.len(), 2);
    assert_eq!(tokens[0].kind, TokenKind::StringLiteral);
    assert_eq!(tokens[0].lexeme, "a\"b\\c\nd\te");
    // The span still covers the quotes.
    assert_eq!(tokens[0].span.start, 0);
    assert_eq!(tokens[0].span.length, 15);
}

#[test]
fn test_next_token_keeps_returning_eof() {
    let mut lexer = Lexer::new("x");
    assert_eq!(lexer.next_token().kind, TokenKind::Ident);
    for _ in 0..3 {
        let token = lexer.next_token();
        assert!(token.is_eof());
        assert_eq!(token.span.start, 1);
    }
}

#[test]
fn test_line_formatter() {
    let source = "a\n\nb";
    let formatter = LineFormatter::new(source);
    let lines: Vec<String> = Lexer::new(source)
        .map(|token| formatter.format(&token))
        .collect();
    assert_eq!(lines, vec!["(1) IDENTIFIER a", "(3) IDENTIFIER b", "(3) EOF"]);
}

#[test]
fn test_all() -> Result<()> {
    let input_dir = Path::new("./test_data/lexer/in");
    let output_dir = Path::new("./test_data/lexer/out");

    let mut succeeded = true;
    for entry in read_dir(input_dir).context("Failed to open input test data folder")? {
        let entry = entry?;
        let path = entry.path();

        let Some(extension) = path.extension() else {
            continue;
        };

        if extension != "pj" {
            continue;
        }

        let test_name = AsRef::<Path>::as_ref(
            path.file_name()
                .expect("File name can't be none as the path is to a real file."),
        );

        let input = read_to_string(&path).context("Failed to open input test data file")?;

        let expected = {
            let output_file_name = test_name.with_extension("txt");
            let output_path = output_dir.join(output_file_name);
            read_to_string(output_path).context("Failed to open output test data file")?
        };

        let res = std::panic::catch_unwind(|| {
            check(&input, &expected, &test_name.to_string_lossy());
        });
        if res.is_err() {
            succeeded = false;
        }
    }

    assert!(succeeded, "Some lexer test cases failed");

    Ok(())
}

// Property-based tests

fn symbol_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("(".to_string()),
        Just(")".to_string()),
        Just("{".to_string()),
        Just("}".to_string()),
        Just("[".to_string()),
        Just("]".to_string()),
        Just(",".to_string()),
        Just(".".to_string()),
        Just(":".to_string()),
        Just(";".to_string()),
        Just("-".to_string()),
        Just("+".to_string()),
        Just("*".to_string()),
        Just("**".to_string()),
        Just("/".to_string()),
        Just("%".to_string()),
        Just("!".to_string()),
        Just("!=".to_string()),
        Just("=".to_string()),
        Just("==".to_string()),
        Just("=>".to_string()),
        Just("<".to_string()),
        Just("<=".to_string()),
        Just(">".to_string()),
        Just(">=".to_string()),
    ]
}

fn integer_literal_strategy() -> impl Strategy<Value = String> {
    "[0-9]{1,18}".prop_map(|s| s)
}

fn string_literal_strategy() -> impl Strategy<Value = String> {
    "[^\"\\\\]*".prop_map(|s: String| format!("\"{}\"", s))
}

fn identifier_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z_][a-zA-Z0-9_]*".prop_map(|s: String| s)
}

fn keyword_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("f".to_string()),
        Just("true".to_string()),
        Just("false".to_string()),
        Just("and".to_string()),
        Just("or".to_string()),
        Just("not".to_string()),
        Just("if".to_string()),
        Just("else".to_string()),
        Just("while".to_string()),
        Just("return".to_string()),
    ]
}

fn token_sequence_strategy() -> impl Strategy<Value = Vec<String>> {
    const MIN_TOKEN_COUNT: usize = 1;
    const MAX_TOKEN_COUNT: usize = 100;
    prop::collection::vec(
        prop_oneof![
            symbol_strategy(),
            integer_literal_strategy(),
            string_literal_strategy(),
            identifier_strategy(),
            keyword_strategy(),
        ],
        MIN_TOKEN_COUNT..MAX_TOKEN_COUNT,
    )
}

proptest! {
    #[test]
    fn lexer_handles_valid_tokens(input in token_sequence_strategy()) {
        // Add 1 to include EOF token
        let expected_num_tokens = input.len() + 1;
        let input = input.join(" ");
        let tokens: Vec<Token> = Lexer::new(&input).collect();
        prop_assert_eq!(tokens.len(), expected_num_tokens);
        prop_assert!(tokens.iter().all(|token| token.kind != TokenKind::Illegal));
        prop_assert!(tokens.last().is_some_and(Token::is_eof));
    }

    #[test]
    fn lexer_is_total(input in "\\PC*") {
        let tokens: Vec<Token> = Lexer::new(&input).collect();
        prop_assert!(tokens.len() <= input.chars().count() + 1);
        prop_assert!(tokens.last().is_some_and(Token::is_eof));
        for token in &tokens {
            prop_assert!(input.get(token.span.range()).is_some());
        }
    }
}
