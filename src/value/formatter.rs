use super::error::RuntimeError;
use super::Value;
use ariadne::{Color, Config, IndexType, Label, Report, ReportKind, Source};

pub trait ValueFormatter {
    fn format(&self, value: &Value) -> String;
    fn format_error(&self, error: &RuntimeError) -> String;
}

pub struct DebugFormatter;

impl ValueFormatter for DebugFormatter {
    fn format(&self, value: &Value) -> String {
        format!("{value:?}")
    }

    fn format_error(&self, error: &RuntimeError) -> String {
        format!("{error:?}")
    }
}

pub struct BasicFormatter;

impl ValueFormatter for BasicFormatter {
    fn format(&self, value: &Value) -> String {
        format!("{value}")
    }

    fn format_error(&self, error: &RuntimeError) -> String {
        format!("RuntimeError: {error}")
    }
}

pub struct PrettyFormatter<'src> {
    text: &'src str,
    path: &'src str,
}

impl<'src> PrettyFormatter<'src> {
    pub fn new(text: &'src str, path: &'src str) -> Self {
        Self { text, path }
    }
}

impl ValueFormatter for PrettyFormatter<'_> {
    fn format(&self, value: &Value) -> String {
        format!("{value}")
    }

    fn format_error(&self, error: &RuntimeError) -> String {
        let Some(span) = error.span else {
            return BasicFormatter.format_error(error);
        };
        let path = self.path;
        let mut output = std::io::Cursor::new(Vec::new());
        let written = Report::build(ReportKind::Error, (path, span.range()))
            .with_config(Config::default().with_index_type(IndexType::Byte))
            .with_code(error.code())
            .with_message("Runtime error")
            .with_label(
                Label::new((path, span.range()))
                    .with_message(error.to_string())
                    .with_color(Color::BrightRed),
            )
            .finish()
            .write((path, Source::from(self.text)), &mut output);
        match written {
            Ok(()) => String::from_utf8_lossy(&output.into_inner()).into_owned(),
            Err(_) => BasicFormatter.format_error(error),
        }
    }
}
