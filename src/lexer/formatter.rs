use super::token::{Token, TokenKind};

/// Interface for creating new token formatters.
pub trait TokenFormatter {
    /// Formats a token into a string.
    fn format(&self, token: &Token) -> String;
}

/// Formats tokens as `KIND lexeme`.
pub struct BasicFormatter;

impl TokenFormatter for BasicFormatter {
    fn format(&self, token: &Token) -> String {
        match token.kind {
            TokenKind::Eof => "EOF".into(),
            TokenKind::StringLiteral => format!("{} {:?}", token.kind, token.lexeme.as_str()),
            kind => format!("{kind} {}", token.lexeme),
        }
    }
}

pub struct DebugFormatter;

impl TokenFormatter for DebugFormatter {
    fn format(&self, token: &Token) -> String {
        format!("{token:?}")
    }
}

/// Formats tokens as `(line) KIND lexeme`.
pub struct LineFormatter<'src> {
    text: &'src str,
}

impl<'src> LineFormatter<'src> {
    pub fn new(text: &'src str) -> Self {
        Self { text }
    }

    fn line_of(&self, offset: usize) -> usize {
        let offset = offset.min(self.text.len());
        self.text.as_bytes()[..offset]
            .iter()
            .filter(|&&b| b == b'\n')
            .count()
            + 1
    }
}

impl TokenFormatter for LineFormatter<'_> {
    fn format(&self, token: &Token) -> String {
        let line = self.line_of(token.span.start as usize);
        format!("({line}) {}", BasicFormatter.format(token))
    }
}
