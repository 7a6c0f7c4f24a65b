use std::fmt::Display;

use crate::lexer::TokenKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixOperator {
    Minus,
    Bang,
    Not,
}

impl PrefixOperator {
    pub fn from_token_kind(kind: TokenKind) -> Option<Self> {
        match kind {
            TokenKind::Minus => Some(Self::Minus),
            TokenKind::Bang => Some(Self::Bang),
            TokenKind::KeywordNot => Some(Self::Not),
            _ => None,
        }
    }
}

impl Display for PrefixOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Minus => write!(f, "-"),
            Self::Bang => write!(f, "!"),
            Self::Not => write!(f, "not"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfixOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Power,
    Equal,
    NotEqual,
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,
    And,
    Or,
}

impl InfixOperator {
    pub fn from_token_kind(kind: TokenKind) -> Option<Self> {
        let operator = match kind {
            TokenKind::Plus => Self::Add,
            TokenKind::Minus => Self::Subtract,
            TokenKind::Star => Self::Multiply,
            TokenKind::Slash => Self::Divide,
            TokenKind::Percent => Self::Modulo,
            TokenKind::StarStar => Self::Power,
            TokenKind::EqualEqual => Self::Equal,
            TokenKind::BangEqual => Self::NotEqual,
            TokenKind::LessThan => Self::LessThan,
            TokenKind::LessThanEqual => Self::LessThanEqual,
            TokenKind::GreaterThan => Self::GreaterThan,
            TokenKind::GreaterThanEqual => Self::GreaterThanEqual,
            TokenKind::KeywordAnd => Self::And,
            TokenKind::KeywordOr => Self::Or,
            _ => return None,
        };
        Some(operator)
    }

    /// Operators whose right operand is only evaluated when needed.
    pub fn is_short_circuit(&self) -> bool {
        matches!(self, Self::And | Self::Or)
    }
}

impl Display for InfixOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Modulo => "%",
            Self::Power => "**",
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::LessThan => "<",
            Self::LessThanEqual => "<=",
            Self::GreaterThan => ">",
            Self::GreaterThanEqual => ">=",
            Self::And => "and",
            Self::Or => "or",
        };
        write!(f, "{symbol}")
    }
}
