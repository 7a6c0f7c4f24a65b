mod span;

use compact_str::CompactString;
pub use span::Span;
use std::collections::HashMap;
use std::fmt::Display;
use std::sync::LazyLock;

/// The hashmap for keywords
pub static KEYWORD_HASHMAP: LazyLock<HashMap<&'static str, TokenKind>> = LazyLock::new(|| {
    let mut map = HashMap::new();
    map.insert("f", TokenKind::KeywordF);
    map.insert("true", TokenKind::KeywordTrue);
    map.insert("false", TokenKind::KeywordFalse);
    map.insert("and", TokenKind::KeywordAnd);
    map.insert("or", TokenKind::KeywordOr);
    map.insert("not", TokenKind::KeywordNot);
    map.insert("if", TokenKind::KeywordIf);
    map.insert("else", TokenKind::KeywordElse);
    map.insert("while", TokenKind::KeywordWhile);
    map.insert("return", TokenKind::KeywordReturn);
    map
});

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Delimiters
    LeftParenthesis,
    RightParenthesis,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    // Punctuation
    Comma,
    Colon,
    Dot,
    Semicolon,
    // Arithmetic
    Minus,
    Plus,
    Star,
    StarStar,
    Slash,
    Percent,
    // Comparison and assignment
    Bang,
    BangEqual,
    Equal,
    EqualEqual,
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,
    Arrow,

    // Literals
    IntegerLiteral,
    StringLiteral,
    Ident,

    // Keywords
    KeywordF,
    KeywordTrue,
    KeywordFalse,
    KeywordAnd,
    KeywordOr,
    KeywordNot,
    KeywordIf,
    KeywordElse,
    KeywordWhile,
    KeywordReturn,

    /// A character the language does not recognise.
    Illegal,
    // End of file.
    Eof,
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::LeftParenthesis => write!(f, "LPAREN"),
            TokenKind::RightParenthesis => write!(f, "RPAREN"),
            TokenKind::LeftBrace => write!(f, "LBRACE"),
            TokenKind::RightBrace => write!(f, "RBRACE"),
            TokenKind::LeftBracket => write!(f, "LBRACKET"),
            TokenKind::RightBracket => write!(f, "RBRACKET"),
            TokenKind::Comma => write!(f, "COMMA"),
            TokenKind::Colon => write!(f, "COLON"),
            TokenKind::Dot => write!(f, "DOT"),
            TokenKind::Semicolon => write!(f, "SEMICOLON"),
            TokenKind::Minus => write!(f, "MINUS"),
            TokenKind::Plus => write!(f, "PLUS"),
            TokenKind::Star => write!(f, "ASTERISK"),
            TokenKind::StarStar => write!(f, "DOUBLE_ASTERISK"),
            TokenKind::Slash => write!(f, "SLASH"),
            TokenKind::Percent => write!(f, "PERCENT"),
            TokenKind::Bang => write!(f, "BANG"),
            TokenKind::BangEqual => write!(f, "NOT_EQUALS"),
            TokenKind::Equal => write!(f, "ASSIGN"),
            TokenKind::EqualEqual => write!(f, "EQUALS"),
            TokenKind::LessThan => write!(f, "LT"),
            TokenKind::LessThanEqual => write!(f, "LTE"),
            TokenKind::GreaterThan => write!(f, "GT"),
            TokenKind::GreaterThanEqual => write!(f, "GTE"),
            TokenKind::Arrow => write!(f, "ARROW"),
            TokenKind::IntegerLiteral => write!(f, "INT"),
            TokenKind::StringLiteral => write!(f, "STRING"),
            TokenKind::Ident => write!(f, "IDENTIFIER"),
            TokenKind::KeywordF => write!(f, "FUNCTION"),
            TokenKind::KeywordTrue => write!(f, "TRUE"),
            TokenKind::KeywordFalse => write!(f, "FALSE"),
            TokenKind::KeywordAnd => write!(f, "AND"),
            TokenKind::KeywordOr => write!(f, "OR"),
            TokenKind::KeywordNot => write!(f, "NOT"),
            TokenKind::KeywordIf => write!(f, "IF"),
            TokenKind::KeywordElse => write!(f, "ELSE"),
            TokenKind::KeywordWhile => write!(f, "WHILE"),
            TokenKind::KeywordReturn => write!(f, "RETURN"),
            TokenKind::Illegal => write!(f, "ILLEGAL"),
            TokenKind::Eof => write!(f, "EOF"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// The token text. String literals hold their decoded contents.
    pub lexeme: CompactString,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<CompactString>, span: Span) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            span,
        }
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }
}
