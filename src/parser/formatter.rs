use super::{ParserError, ParserErrorKind};
use ariadne::{Color, Config, IndexType, Label, Report, ReportKind, Source};

pub trait ParserFormatter {
    fn format_error(&self, error: &ParserError) -> String;
}

pub struct DebugParserFormatter;

impl ParserFormatter for DebugParserFormatter {
    fn format_error(&self, error: &ParserError) -> String {
        format!("{error:?}")
    }
}

/// One line per error, prefixed with the line it occurred on.
pub struct BasicParserFormatter<'src> {
    text: &'src str,
}

impl<'src> BasicParserFormatter<'src> {
    pub fn new(text: &'src str) -> Self {
        Self { text }
    }
}

impl ParserFormatter for BasicParserFormatter<'_> {
    fn format_error(&self, error: &ParserError) -> String {
        let offset = (error.token.span.start as usize).min(self.text.len());
        let line = self.text.as_bytes()[..offset]
            .iter()
            .filter(|&&b| b == b'\n')
            .count()
            + 1;
        format!("[line {line}] Error: {error}")
    }
}

/// Renders errors as annotated source snippets.
pub struct PrettyParserFormatter<'src> {
    text: &'src str,
    path: &'src str,
}

impl<'src> PrettyParserFormatter<'src> {
    pub fn new(text: &'src str, path: &'src str) -> Self {
        Self { text, path }
    }
}

impl ParserFormatter for PrettyParserFormatter<'_> {
    fn format_error(&self, error: &ParserError) -> String {
        let path = self.path;
        let span = error.token.span.range();
        let (message, label) = match &error.kind {
            ParserErrorKind::UnexpectedToken { expected, actual } => (
                "Expected a different token",
                format!("Expected {expected} but got {actual}"),
            ),
            ParserErrorKind::NoPrefixRule(kind) => (
                "Expected the start of an expression",
                format!("{kind} cannot start an expression"),
            ),
            ParserErrorKind::InvalidInteger(lexeme) => (
                "Integer literal out of range",
                format!("{lexeme} does not fit in a 64-bit integer"),
            ),
            ParserErrorKind::InvalidParameter(parameter) => (
                "Expected a parameter name",
                format!("{parameter} is not an identifier"),
            ),
            ParserErrorKind::InvalidRecordKey(kind) => (
                "Expected a record key",
                format!("{kind} cannot be used as a key"),
            ),
        };

        let mut output = std::io::Cursor::new(Vec::new());
        let written = Report::build(ReportKind::Error, (path, span.clone()))
            .with_config(Config::default().with_index_type(IndexType::Byte))
            .with_code(error.code())
            .with_message(message)
            .with_label(
                Label::new((path, span))
                    .with_message(label)
                    .with_color(Color::BrightRed),
            )
            .finish()
            .write((path, Source::from(self.text)), &mut output);
        match written {
            Ok(()) => String::from_utf8_lossy(&output.into_inner()).into_owned(),
            Err(_) => format!("{path}: error[{}]: {error}", error.code()),
        }
    }
}
