use color_eyre::eyre::{Context, Result};
use proptest::prelude::*;
use std::{
    fs::{read_dir, read_to_string},
    path::Path,
};

use pjscript::{
    ast::{
        formatter::{CanonicalFormatter, ExpressionFormatter, SExpressionFormatter},
        ExpressionKind, StatementKind,
    },
    parser::{
        formatter::{BasicParserFormatter, ParserFormatter, PrettyParserFormatter},
        Parser, ParserErrorKind,
    },
};

fn render(input: &str, formatter: &dyn ExpressionFormatter) -> String {
    let mut parser = Parser::new(input);
    let program = parser.parse_program();
    let errors = parser.diagnostics();
    if !errors.is_empty() {
        let error_formatter = BasicParserFormatter::new(input);
        return errors
            .iter()
            .map(|error| error_formatter.format_error(error))
            .collect::<Vec<_>>()
            .join("\n");
    }
    program
        .statements
        .iter()
        .map(|statement| formatter.format_statement(statement))
        .collect::<Vec<_>>()
        .join("\n")
}

fn check(input: &str, expected: &str, test_name: &str) {
    let actual = render(input, &CanonicalFormatter);
    assert_eq!(actual, expected, "Failed the test {test_name}");
}

#[test]
fn smoke_test() {
    check("", "", "smoke");
}

#[test]
fn test_precedence() {
    check("a + b * c", "(a + (b * c))", "product binds tighter");
    check("a + -b ** c", "(a + (-(b ** c)))", "power binds tighter than prefix");
    check("2 ** 3 ** 2", "((2 ** 3) ** 2)", "power is left associative");
    check("a - b - c", "((a - b) - c)", "subtraction is left associative");
    check("(a + b) * c", "((a + b) * c)", "grouping");
    check("a < b == c >= d", "((a < b) == (c >= d))", "relational over equality");
    check("a or b and c", "((a or b) and c)", "logical operators share a level");
    check("not a == b", "((not a) == b)", "not is a prefix operator");
    check("!a % 2", "((!a) % 2)", "bang");
    check("-a[0]", "(-(a[0]))", "index binds tighter than prefix");
}

#[test]
fn test_assignment() {
    check("a = b = c", "(a = (b = c))", "assignment is right associative");
    check("x = 1 + 2", "(x = (1 + 2))", "assignment is weakest");
    check("xs[0] = y.z = 1", "((xs[0]) = ((y.z) = 1))", "any destination parses");
}

#[test]
fn test_postfix_chains() {
    check("a.b.c(1)[0]", "(((a.b).c(1))[0])", "member, method and index");
    check("f(1, 2)(3)", "f(1, 2)(3)", "curried call");
    check("[1, 2, 3,]", "[1, 2, 3]", "trailing comma");
    check("g()", "g()", "empty arguments");
    check("\"a\\\"b\"", "\"a\\\"b\"", "escaped string");
}

#[test]
fn test_functions() {
    check("f(x, y) { x + y }", "f(x, y) { (x + y) }", "block function");
    check("f() { }", "f() { }", "empty function");
    check("f(x) => x * 2", "(f(x) => (x * 2))", "arrow function");
    check(
        "xs.map(f(x) => x + 1)",
        "(xs.map((f(x) => (x + 1))))",
        "arrow function argument",
    );
}

#[test]
fn test_records() {
    check(
        "{a: 1, b, \"c d\": 2, [k]: 3, 4: 5,}",
        "{a: 1, b, \"c d\": 2, [k]: 3, [4]: 5}",
        "record keys",
    );
    check("{}", "{}", "empty record");
}

#[test]
fn test_statements() {
    check(
        "if (x > 1) { a } else if (y) { b } else { c }",
        "if ((x > 1)) { a } else { if (y) { b } else { c } }",
        "else if",
    );
    check(
        "while (i < 3) { i = i + 1; }",
        "while ((i < 3)) { (i = (i + 1)) }",
        "while",
    );
    check("return;", "return", "bare return");
    check("return 1; 2", "return 1\n2", "return with value");
    check("a; ; b", "a\nb", "stray semicolons");
    check("a\nb", "a\nb", "semicolons are optional");
}

#[test]
fn test_statement_kinds() {
    let mut parser = Parser::new("while (x) { x = false }; f(a) => a");
    let program = parser.parse_program();
    assert!(parser.errors().is_empty());
    assert_eq!(program.statements.len(), 2);
    assert!(matches!(program.statements[0].kind, StatementKind::While { .. }));
    let StatementKind::Expression(ref expression) = program.statements[1].kind else {
        panic!("expected an expression statement");
    };
    let ExpressionKind::ArrowFunction { ref parameters, .. } = expression.kind else {
        panic!("expected an arrow function");
    };
    assert_eq!(parameters.len(), 1);
    assert_eq!(parameters[0], "a");
}

#[test]
fn test_errors() {
    let mut parser = Parser::new("x = ;");
    parser.parse_program();
    assert_eq!(parser.errors(), vec!["no prefix parse rule for SEMICOLON found"]);

    let mut parser = Parser::new("g(1");
    parser.parse_program();
    assert_eq!(parser.errors(), vec!["expected RPAREN but instead got EOF"]);

    let mut parser = Parser::new("if (x) { 1");
    parser.parse_program();
    assert_eq!(parser.errors(), vec!["expected RBRACE but instead got EOF"]);

    let mut parser = Parser::new("99999999999999999999");
    parser.parse_program();
    assert_eq!(
        parser.errors(),
        vec!["could not parse 99999999999999999999 as integer"]
    );

    let mut parser = Parser::new("{true: 1}");
    parser.parse_program();
    let first = &parser.diagnostics()[0];
    assert!(matches!(first.kind, ParserErrorKind::InvalidRecordKey(_)));
    assert_eq!(first.code(), "PA005");
}

#[test]
fn test_parsing_continues_after_errors() {
    let mut parser = Parser::new("x = ;\ny = 2");
    let program = parser.parse_program();
    assert_eq!(parser.errors().len(), 1);
    assert_eq!(program.to_string(), "(y = 2)");
}

#[test]
fn test_deep_nesting() {
    let depth = 20_000;
    let input = format!("{}x + 1{}", "(".repeat(depth), ")".repeat(depth));
    check(&input, "(x + 1)", "nested grouping");
}

#[test]
fn test_pretty_errors_with_multibyte_source() {
    let source = "s = \"ééééééééé\"; t = )";
    let mut parser = Parser::new(source);
    parser.parse_program();
    let error = &parser.diagnostics()[0];
    assert_eq!(error.code(), "PA002");

    let report = PrettyParserFormatter::new(source, "test.pj").format_error(error);
    assert!(report.contains("ééééééééé"), "{report}");
    assert!(report.contains("RPAREN cannot start an expression"), "{report}");
}

#[test]
fn test_s_expressions() {
    let actual = render("a + b * -c; f(x) => x; xs[0].length", &SExpressionFormatter);
    assert_eq!(
        actual,
        "(+ a (* b (- c)))\n(fn (x) x)\n(. (index xs 0) length)"
    );
}

#[test]
fn test_all() -> Result<()> {
    let input_dir = Path::new("./test_data/parser/in");
    let output_dir = Path::new("./test_data/parser/out");

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
            read_to_string(&output_path).context("Failed to open output test data file")?
        };

        let res = std::panic::catch_unwind(|| {
            let actual = render(&input, &SExpressionFormatter);
            assert_eq!(
                actual,
                expected.trim_end(),
                "Failed the test {}",
                test_name.display()
            );
        });
        if res.is_err() {
            succeeded = false;
        }
    }

    assert!(succeeded, "Some parser test cases failed");

    Ok(())
}

// Property-based tests

fn leaf_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "v[a-z0-9_]{0,5}".prop_map(|s| s),
        (0..10_000i64).prop_map(|n| n.to_string()),
        "[a-z \"\\\\\n\t]{0,5}".prop_map(|s| format!("{s:?}")),
        Just("true".to_string()),
        Just("false".to_string()),
    ]
}

fn infix_operator_strategy() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("+"),
        Just("-"),
        Just("*"),
        Just("/"),
        Just("%"),
        Just("**"),
        Just("=="),
        Just("!="),
        Just("<"),
        Just("<="),
        Just(">"),
        Just(">="),
        Just("and"),
        Just("or"),
    ]
}

fn expression_strategy() -> impl Strategy<Value = String> {
    leaf_strategy().prop_recursive(4, 32, 4, |inner| {
        prop_oneof![
            (inner.clone(), infix_operator_strategy(), inner.clone())
                .prop_map(|(left, operator, right)| format!("{left} {operator} {right}")),
            inner.clone().prop_map(|operand| format!("-{operand}")),
            inner.clone().prop_map(|operand| format!("not {operand}")),
            inner.clone().prop_map(|operand| format!("({operand})")),
            prop::collection::vec(inner.clone(), 0..4)
                .prop_map(|elements| format!("[{}]", elements.join(", "))),
            prop::collection::vec(inner.clone(), 0..4)
                .prop_map(|arguments| format!("v_call({})", arguments.join(", "))),
            (inner.clone(), inner.clone())
                .prop_map(|(collection, index)| format!("({collection})[{index}]")),
            inner.clone().prop_map(|object| format!("({object}).length")),
            (inner.clone(), inner.clone())
                .prop_map(|(object, argument)| format!("({object}).push({argument})")),
            inner.clone().prop_map(|body| format!("(f(v_x, v_y) => {body})")),
            inner.clone().prop_map(|body| format!("f(v_x) {{ return {body} }}")),
            (inner.clone(), inner.clone())
                .prop_map(|(key, value)| format!("{{v_key: {key}, [{value}]: 1}}")),
            (inner.clone(), inner.clone(), inner)
                .prop_map(|(condition, then, otherwise)| {
                    format!("if ({condition}) {{ {then} }} else {{ {otherwise} }}")
                }),
        ]
    })
}

proptest! {
    #[test]
    fn printing_is_idempotent(input in expression_strategy()) {
        let mut parser = Parser::new(&input);
        let program = parser.parse_program();
        prop_assert!(parser.errors().is_empty(), "{:?}", parser.errors());
        let printed = program.to_string();

        let mut reparser = Parser::new(&printed);
        let reparsed = reparser.parse_program();
        prop_assert!(reparser.errors().is_empty(), "{:?}", reparser.errors());
        prop_assert_eq!(reparsed.to_string(), printed);
    }
}
