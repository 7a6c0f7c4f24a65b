pub mod formatter;
mod token;

use compact_str::CompactString;
use std::{iter::Peekable, str::CharIndices};
pub use token::{Span, Token, TokenKind, KEYWORD_HASHMAP};

/// Converts source text into tokens on demand.
///
/// The lexer never fails: characters it does not understand become
/// [`TokenKind::Illegal`] tokens, and once the input is exhausted every call to
/// [`Lexer::next_token`] returns an [`TokenKind::Eof`] token.
#[derive(Debug, Clone)]
pub struct Lexer<'src> {
    source: &'src str,
    chars: Peekable<CharIndices<'src>>,
    emitted_eof: bool,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            emitted_eof: false,
        }
    }

    pub fn get_source(&self) -> &'src str {
        self.source
    }
}

impl<'src> Lexer<'src> {
    fn next_char(&mut self) -> Option<(usize, char)> {
        self.chars.next()
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn offset(&mut self) -> usize {
        self.chars
            .peek()
            .map(|&(offset, _)| offset)
            .unwrap_or(self.source.len())
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek_char(), Some(' ' | '\t' | '\r' | '\n')) {
            self.next_char();
        }
    }

    fn emit(&mut self, kind: TokenKind, start: usize) -> Token {
        let end = self.offset();
        Token::new(kind, &self.source[start..end], Span::new(start, end))
    }

    /// Emits `double` if the next character is `second`, otherwise `single`.
    fn one_or_two(
        &mut self,
        start: usize,
        second: char,
        double: TokenKind,
        single: TokenKind,
    ) -> Token {
        if self.peek_char() == Some(second) {
            self.next_char();
            self.emit(double, start)
        } else {
            self.emit(single, start)
        }
    }

    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();
        let Some((start, c)) = self.next_char() else {
            let end = self.source.len();
            return Token::new(TokenKind::Eof, "", Span::new(end, end));
        };

        match c {
            '(' => self.emit(TokenKind::LeftParenthesis, start),
            ')' => self.emit(TokenKind::RightParenthesis, start),
            '{' => self.emit(TokenKind::LeftBrace, start),
            '}' => self.emit(TokenKind::RightBrace, start),
            '[' => self.emit(TokenKind::LeftBracket, start),
            ']' => self.emit(TokenKind::RightBracket, start),
            ',' => self.emit(TokenKind::Comma, start),
            ':' => self.emit(TokenKind::Colon, start),
            '.' => self.emit(TokenKind::Dot, start),
            ';' => self.emit(TokenKind::Semicolon, start),
            '+' => self.emit(TokenKind::Plus, start),
            '-' => self.emit(TokenKind::Minus, start),
            '/' => self.emit(TokenKind::Slash, start),
            '%' => self.emit(TokenKind::Percent, start),
            '*' => self.one_or_two(start, '*', TokenKind::StarStar, TokenKind::Star),
            '!' => self.one_or_two(start, '=', TokenKind::BangEqual, TokenKind::Bang),
            '<' => self.one_or_two(start, '=', TokenKind::LessThanEqual, TokenKind::LessThan),
            '>' => self.one_or_two(
                start,
                '=',
                TokenKind::GreaterThanEqual,
                TokenKind::GreaterThan,
            ),
            '=' => match self.peek_char() {
                Some('=') => {
                    self.next_char();
                    self.emit(TokenKind::EqualEqual, start)
                }
                Some('>') => {
                    self.next_char();
                    self.emit(TokenKind::Arrow, start)
                }
                _ => self.emit(TokenKind::Equal, start),
            },
            '"' => self.scan_string(start),
            c if c.is_ascii_digit() => self.scan_integer(start),
            c if c.is_ascii_alphabetic() || c == '_' => self.scan_identifier(start),
            _ => self.emit(TokenKind::Illegal, start),
        }
    }

    fn scan_string(&mut self, start: usize) -> Token {
        let mut contents = CompactString::default();
        // An unterminated string runs to the end of input.
        while let Some((_, c)) = self.next_char() {
            match c {
                '"' => break,
                '\\' => match self.next_char() {
                    Some((_, 'n')) => contents.push('\n'),
                    Some((_, 't')) => contents.push('\t'),
                    Some((_, other)) => contents.push(other),
                    None => break,
                },
                c => contents.push(c),
            }
        }
        let end = self.offset();
        Token::new(TokenKind::StringLiteral, contents, Span::new(start, end))
    }

    fn scan_integer(&mut self, start: usize) -> Token {
        while matches!(self.peek_char(), Some(c) if c.is_ascii_digit()) {
            self.next_char();
        }
        self.emit(TokenKind::IntegerLiteral, start)
    }

    fn scan_identifier(&mut self, start: usize) -> Token {
        while matches!(self.peek_char(), Some(c) if c.is_ascii_alphanumeric() || c == '_') {
            self.next_char();
        }
        let end = self.offset();
        let lexeme = &self.source[start..end];
        let kind = KEYWORD_HASHMAP
            .get(lexeme)
            .copied()
            .unwrap_or(TokenKind::Ident);
        Token::new(kind, lexeme, Span::new(start, end))
    }
}

/// Yields every token up to and including the first end of file token.
impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        if self.emitted_eof {
            return None;
        }
        let token = self.next_token();
        if token.is_eof() {
            self.emitted_eof = true;
        }
        Some(token)
    }
}
