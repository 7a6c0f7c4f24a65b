use crate::{
    ast::{InfixOperator, PrefixOperator},
    lexer::Span,
};
use compact_str::CompactString;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RuntimeErrorKind {
    #[error("unknown identifier: {0}")]
    UnknownIdentifier(CompactString),
    #[error("unknown operator: {operator}{operand}")]
    UnknownPrefixOperator {
        operator: PrefixOperator,
        operand: &'static str,
    },
    #[error("unknown operator: {left} {operator} {right}")]
    UnknownInfixOperator {
        left: &'static str,
        operator: InfixOperator,
        right: &'static str,
    },
    #[error("type mismatch: {left} {operator} {right}")]
    TypeMismatch {
        left: &'static str,
        operator: InfixOperator,
        right: &'static str,
    },
    #[error("not a function: {0}")]
    NotAFunction(&'static str),
    #[error("index out of range: {index} for length {length}")]
    IndexOutOfRange { index: i64, length: usize },
    #[error("index operator not supported: {collection}[{index}]")]
    IndexNotSupported {
        collection: &'static str,
        index: &'static str,
    },
    #[error("undefined property: {property} on {receiver}")]
    UndefinedProperty {
        receiver: &'static str,
        property: CompactString,
    },
    #[error("method must be called: {0}")]
    MethodNotCalled(CompactString),
    #[error("illegal assignment to type: {0}")]
    IllegalAssignment(&'static str),
    #[error("invalid argument count: `{name}` takes {expected}, got {actual}")]
    ArgumentCount {
        name: &'static str,
        expected: &'static str,
        actual: usize,
    },
    #[error("invalid argument to `{name}`: expected {expected}, got {actual}")]
    InvalidArgument {
        name: &'static str,
        expected: &'static str,
        actual: &'static str,
    },
    #[error("function passed to `filter` must return a boolean, got: {0}")]
    FilterPredicate(&'static str),
    #[error("division by zero: {left} {operator} 0")]
    DivisionByZero {
        left: i64,
        operator: InfixOperator,
    },
    #[error("integer overflow: {left} {operator} {right}")]
    IntegerOverflow {
        left: i64,
        operator: InfixOperator,
        right: i64,
    },
    #[error("negative exponent: {0}")]
    NegativeExponent(i64),
    #[error("could not convert string to integer: {0:?}")]
    InvalidInteger(CompactString),
    #[error("invalid record key: {0}")]
    InvalidRecordKey(&'static str),
    #[error("maximum call depth exceeded: {0}")]
    CallDepthExceeded(usize),
}

#[derive(Debug, Error, Clone, PartialEq)]
#[error("{kind}")]
pub struct RuntimeError {
    #[source]
    pub kind: RuntimeErrorKind,
    /// Where the error was raised. Errors from native code receive the span of
    /// the call that invoked them.
    pub span: Option<Span>,
}

impl RuntimeError {
    pub fn new(kind: RuntimeErrorKind, span: Span) -> Self {
        Self {
            kind,
            span: Some(span),
        }
    }

    /// Attaches `span` unless the error already points somewhere.
    pub fn or_span(mut self, span: Span) -> Self {
        self.span.get_or_insert(span);
        self
    }

    pub fn code(&self) -> &'static str {
        match self.kind {
            RuntimeErrorKind::UnknownIdentifier(_) => "RT001",
            RuntimeErrorKind::UnknownPrefixOperator { .. } => "RT002",
            RuntimeErrorKind::UnknownInfixOperator { .. } => "RT003",
            RuntimeErrorKind::TypeMismatch { .. } => "RT004",
            RuntimeErrorKind::NotAFunction(_) => "RT005",
            RuntimeErrorKind::IndexOutOfRange { .. } => "RT006",
            RuntimeErrorKind::IndexNotSupported { .. } => "RT007",
            RuntimeErrorKind::UndefinedProperty { .. } => "RT008",
            RuntimeErrorKind::MethodNotCalled(_) => "RT009",
            RuntimeErrorKind::IllegalAssignment(_) => "RT010",
            RuntimeErrorKind::ArgumentCount { .. } => "RT011",
            RuntimeErrorKind::InvalidArgument { .. } => "RT012",
            RuntimeErrorKind::FilterPredicate(_) => "RT013",
            RuntimeErrorKind::DivisionByZero { .. } => "RT014",
            RuntimeErrorKind::IntegerOverflow { .. } => "RT015",
            RuntimeErrorKind::NegativeExponent(_) => "RT016",
            RuntimeErrorKind::InvalidInteger(_) => "RT017",
            RuntimeErrorKind::InvalidRecordKey(_) => "RT018",
            RuntimeErrorKind::CallDepthExceeded(_) => "RT019",
        }
    }
}

impl From<RuntimeErrorKind> for RuntimeError {
    fn from(kind: RuntimeErrorKind) -> Self {
        Self { kind, span: None }
    }
}
