use std::{
    fs::{read_dir, read_to_string},
    path::Path,
};

use color_eyre::eyre::{Context, Result};
use pjscript::{
    environment::Environment,
    evaluator::{context::BufferedContext, Evaluator},
    parser::Parser,
};

const EXPECT_OUTPUT: &str = "// expect:";
const EXPECT_RUNTIME_ERROR: &str = "// expect runtime error:";

#[test]
fn test_closures() -> Result<()> {
    let input_dir = Path::new("./test_data/programs/closures");
    test_engine(input_dir)
}

#[test]
fn test_collections() -> Result<()> {
    let input_dir = Path::new("./test_data/programs/collections");
    test_engine(input_dir)
}

#[test]
fn test_control_flow() -> Result<()> {
    let input_dir = Path::new("./test_data/programs/control_flow");
    test_engine(input_dir)
}

#[test]
fn test_errors() -> Result<()> {
    let input_dir = Path::new("./test_data/programs/errors");
    test_engine(input_dir)
}

#[test]
fn test_strings() -> Result<()> {
    let input_dir = Path::new("./test_data/programs/strings");
    test_engine(input_dir)
}

struct TestCase {
    name: String,
    source: String,
    output: String,
    runtime_error: Option<String>,
}

impl TestCase {
    pub fn check(&self) {
        let mut parser = Parser::new(&self.source);
        let program = parser.parse_program();
        let errors = parser.errors();
        assert!(
            errors.is_empty(),
            "Failed test {} at parsing: {errors:?}",
            self.name
        );

        let mut evaluator = Evaluator::new(BufferedContext::new());
        let result = evaluator.eval(&program, &Environment::new());
        assert_eq!(
            self.output,
            evaluator.context().data(),
            "Failed test {} at print.",
            self.name
        );

        let actual_error = result.err().map(|error| error.to_string());
        assert_eq!(
            self.runtime_error, actual_error,
            "Failed test {} at runtime.",
            self.name
        );
    }
}

fn test_engine(input_dir: &Path) -> Result<()> {
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

        println!("Parsing {path:?}");
        let test_case = parse_test_case(&path)?;
        println!("Checking {}", test_case.name);

        let res = std::panic::catch_unwind(|| {
            test_case.check();
        });
        if res.is_err() {
            println!("\tFails test case {}", test_case.name);
            succeeded = false;
        }
    }

    assert!(succeeded, "Some program test cases failed");

    Ok(())
}

/// Splits a test file into source and expectations. Expectations are written
/// as trailing `// expect` annotations, which are cut off because the language
/// has no comments.
fn parse_test_case(input_path: &Path) -> Result<TestCase> {
    let test_name = AsRef::<Path>::as_ref(
        input_path
            .file_name()
            .expect("File name can't be none as the path is to a real file."),
    )
    .to_string_lossy();

    let input = read_to_string(input_path).context("Failed to open input test data file")?;

    let mut source_lines = Vec::new();
    let mut expected_outputs = Vec::new();
    let mut expected_runtime_error = None;

    for line in input.lines() {
        if let Some(comment_index) = line.find(EXPECT_RUNTIME_ERROR) {
            let expected = line[comment_index + EXPECT_RUNTIME_ERROR.len()..].trim();
            expected_runtime_error = Some(expected.to_string());
            source_lines.push(&line[..comment_index]);
        } else if let Some(comment_index) = line.find(EXPECT_OUTPUT) {
            let expected = line[comment_index + EXPECT_OUTPUT.len()..].trim();
            expected_outputs.push(expected.to_string());
            source_lines.push(&line[..comment_index]);
        } else {
            source_lines.push(line);
        }
    }

    expected_outputs.push(String::new());
    Ok(TestCase {
        name: test_name.into_owned(),
        source: source_lines.join("\n"),
        output: expected_outputs.join("\n"),
        runtime_error: expected_runtime_error,
    })
}
