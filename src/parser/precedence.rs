use crate::lexer::TokenKind;

/// Binding power of infix operators, weakest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    Lowest,
    Assign,
    Logical,
    Equality,
    Relational,
    Additive,
    Multiplicative,
    Prefix,
    Power,
    Index,
    Member,
    Call,
}

impl Precedence {
    /// The binding power of `kind` when it appears in infix position.
    pub fn of(kind: TokenKind) -> Self {
        match kind {
            TokenKind::Equal => Self::Assign,
            TokenKind::KeywordAnd | TokenKind::KeywordOr => Self::Logical,
            TokenKind::EqualEqual | TokenKind::BangEqual => Self::Equality,
            TokenKind::LessThan
            | TokenKind::LessThanEqual
            | TokenKind::GreaterThan
            | TokenKind::GreaterThanEqual => Self::Relational,
            TokenKind::Plus | TokenKind::Minus => Self::Additive,
            TokenKind::Star | TokenKind::Slash | TokenKind::Percent => Self::Multiplicative,
            TokenKind::StarStar => Self::Power,
            TokenKind::LeftBracket => Self::Index,
            TokenKind::Dot => Self::Member,
            TokenKind::LeftParenthesis => Self::Call,
            _ => Self::Lowest,
        }
    }
}
