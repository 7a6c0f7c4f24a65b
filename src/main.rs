use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Once;

use clap::{Parser as ClapParser, Subcommand, ValueEnum};
use color_eyre::eyre::{Result, WrapErr};
use rustyline::{error::ReadlineError, DefaultEditor};

use pjscript::{
    ast::formatter::{
        CanonicalFormatter, DebugFormatter as DebugExpressionFormatter, ExpressionFormatter,
        SExpressionFormatter,
    },
    environment::{formatter::DotFormatter, Environment},
    evaluator::{context::StdioContext, Evaluator},
    lexer::{
        formatter::{
            BasicFormatter as BasicTokenFormatter, DebugFormatter as DebugTokenFormatter,
            LineFormatter, TokenFormatter,
        },
        Lexer,
    },
    parser::{
        formatter::{
            BasicParserFormatter, DebugParserFormatter, ParserFormatter, PrettyParserFormatter,
        },
        Parser,
    },
    value::{
        formatter::{BasicFormatter as BasicValueFormatter, PrettyFormatter, ValueFormatter},
        Value,
    },
};

const SYNTAX_ERROR_CODE: u8 = 65;
const RUNTIME_ERROR_CODE: u8 = 70;

#[derive(ClapParser, Debug)]
#[command(version, about, long_about = None)]
struct CLArgs {
    #[clap(subcommand)]
    routine: PjCommand,
}

#[derive(Subcommand, Debug)]
enum PjCommand {
    /// Print the tokens of a source file.
    Tokenize {
        path: PathBuf,
        #[arg(long, value_enum, default_value_t = TokenFormat::Basic)]
        format: TokenFormat,
    },
    /// Parse a source file and print each statement.
    Parse {
        path: PathBuf,
        #[arg(long, value_enum, default_value_t = TreeFormat::Canonical)]
        format: TreeFormat,
    },
    /// Evaluate a source file.
    Run {
        path: PathBuf,
        /// Write the frames created during evaluation as a Graphviz file.
        #[arg(long)]
        dump_env: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = ErrorFormat::Pretty)]
        format: ErrorFormat,
    },
    /// Start an interactive session.
    Repl,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum TokenFormat {
    Basic,
    Line,
    Debug,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum TreeFormat {
    Canonical,
    Sexpr,
    Debug,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum ErrorFormat {
    Basic,
    Pretty,
}

static TRACING_INIT: Once = Once::new();

fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(EnvFilter::from_default_env())
                .init();
        }
    });
}

fn main() -> Result<ExitCode> {
    color_eyre::install()?;
    init_tracing();

    let args = CLArgs::parse();
    match args.routine {
        PjCommand::Tokenize { path, format } => tokenize(&path, format),
        PjCommand::Parse { path, format } => parse(&path, format),
        PjCommand::Run {
            path,
            dump_env,
            format,
        } => run(&path, dump_env.as_deref(), format),
        PjCommand::Repl => repl(),
    }
}

fn read_source(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).wrap_err_with(|| format!("Failed to read {}", path.display()))
}

fn tokenize(path: &Path, format: TokenFormat) -> Result<ExitCode> {
    let src = read_source(path)?;
    let formatter: Box<dyn TokenFormatter + '_> = match format {
        TokenFormat::Basic => Box::new(BasicTokenFormatter),
        TokenFormat::Line => Box::new(LineFormatter::new(&src)),
        TokenFormat::Debug => Box::new(DebugTokenFormatter),
    };
    for token in Lexer::new(&src) {
        println!("{}", formatter.format(&token));
    }
    Ok(ExitCode::SUCCESS)
}

fn parse(path: &Path, format: TreeFormat) -> Result<ExitCode> {
    let src = read_source(path)?;
    let display_path = path.display().to_string();
    let mut parser = Parser::new(&src);
    let program = parser.parse_program();
    let error_formatter: Box<dyn ParserFormatter + '_> = match format {
        TreeFormat::Debug => Box::new(DebugParserFormatter),
        _ => Box::new(PrettyParserFormatter::new(&src, &display_path)),
    };
    if report_parse_errors(&parser, error_formatter.as_ref()) {
        return Ok(ExitCode::from(SYNTAX_ERROR_CODE));
    }

    let formatter: Box<dyn ExpressionFormatter> = match format {
        TreeFormat::Canonical => Box::new(CanonicalFormatter),
        TreeFormat::Sexpr => Box::new(SExpressionFormatter),
        TreeFormat::Debug => Box::new(DebugExpressionFormatter),
    };
    for statement in &program.statements {
        println!("{}", formatter.format_statement(statement));
    }
    Ok(ExitCode::SUCCESS)
}

fn run(path: &Path, dump_env: Option<&Path>, format: ErrorFormat) -> Result<ExitCode> {
    let src = read_source(path)?;
    let display_path = path.display().to_string();
    let mut parser = Parser::new(&src);
    let program = parser.parse_program();
    let error_formatter = PrettyParserFormatter::new(&src, &display_path);
    if report_parse_errors(&parser, &error_formatter) {
        return Ok(ExitCode::from(SYNTAX_ERROR_CODE));
    }

    let mut evaluator = if dump_env.is_some() {
        Evaluator::with_frame_tracking(StdioContext)
    } else {
        Evaluator::new(StdioContext)
    };
    let environment = Environment::new();
    let result = evaluator.eval(&program, &environment);

    if let Some(dump_path) = dump_env {
        let graph = DotFormatter.format(evaluator.frames());
        std::fs::write(dump_path, graph)
            .wrap_err_with(|| format!("Failed to write {}", dump_path.display()))?;
    }

    match result {
        Ok(Value::Null) => Ok(ExitCode::SUCCESS),
        Ok(value) => {
            println!("{value}");
            Ok(ExitCode::SUCCESS)
        }
        Err(error) => {
            let formatter: Box<dyn ValueFormatter + '_> = match format {
                ErrorFormat::Basic => Box::new(BasicValueFormatter),
                ErrorFormat::Pretty => Box::new(PrettyFormatter::new(&src, &display_path)),
            };
            eprintln!("{}", formatter.format_error(&error));
            Ok(ExitCode::from(RUNTIME_ERROR_CODE))
        }
    }
}

/// Prints every recorded parse error. Returns whether there were any.
fn report_parse_errors(parser: &Parser, formatter: &dyn ParserFormatter) -> bool {
    let errors = parser.diagnostics();
    for error in errors {
        eprintln!("{}", formatter.format_error(error).trim_end());
    }
    !errors.is_empty()
}

fn repl() -> Result<ExitCode> {
    let mut editor = DefaultEditor::new().wrap_err("Failed to start line editor")?;
    let mut evaluator = Evaluator::new(StdioContext);
    let environment = Environment::new();

    loop {
        match editor.readline(">> ") {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(line.as_str());

                let mut parser = Parser::new(&line);
                let program = parser.parse_program();
                if report_parse_errors(&parser, &BasicParserFormatter::new(&line)) {
                    continue;
                }

                match evaluator.eval(&program, &environment) {
                    Ok(Value::Null) => {}
                    Ok(value) => println!("{value}"),
                    Err(error) => eprintln!("{}", BasicValueFormatter.format_error(&error)),
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(error) => return Err(error).wrap_err("Failed to read line"),
        }
    }
    Ok(ExitCode::SUCCESS)
}
