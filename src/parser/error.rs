use crate::lexer::{Token, TokenKind};
use compact_str::CompactString;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParserErrorKind {
    #[error("expected {expected} but instead got {actual}")]
    UnexpectedToken {
        expected: TokenKind,
        actual: CompactString,
    },
    #[error("no prefix parse rule for {0} found")]
    NoPrefixRule(TokenKind),
    #[error("could not parse {0} as integer")]
    InvalidInteger(CompactString),
    #[error("invalid parameter: {0}")]
    InvalidParameter(CompactString),
    #[error("invalid record key: {0}")]
    InvalidRecordKey(TokenKind),
}

#[derive(Debug, Error, Clone, PartialEq)]
#[error("{kind}")]
pub struct ParserError {
    #[source]
    pub kind: ParserErrorKind,
    /// The token at which the error was detected.
    pub token: Token,
}

impl ParserError {
    pub fn unexpected(expected: TokenKind, actual: &Token) -> Self {
        let found = match actual.kind {
            TokenKind::Eof => CompactString::const_new("EOF"),
            _ => actual.lexeme.clone(),
        };
        Self {
            kind: ParserErrorKind::UnexpectedToken {
                expected,
                actual: found,
            },
            token: actual.clone(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self.kind {
            ParserErrorKind::UnexpectedToken { .. } => "PA001",
            ParserErrorKind::NoPrefixRule(_) => "PA002",
            ParserErrorKind::InvalidInteger(_) => "PA003",
            ParserErrorKind::InvalidParameter(_) => "PA004",
            ParserErrorKind::InvalidRecordKey(_) => "PA005",
        }
    }
}
