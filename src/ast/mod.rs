pub mod formatter;
mod operator;

use compact_str::CompactString;
pub use operator::{InfixOperator, PrefixOperator};
use std::{fmt::Display, rc::Rc};

use crate::lexer::Token;

/// The root of a parsed source file.
#[derive(Debug, Clone, Default)]
pub struct Program {
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone)]
pub struct Statement {
    pub kind: StatementKind,
    /// The token the statement starts with.
    pub token: Token,
}

#[derive(Debug, Clone)]
pub enum StatementKind {
    /// A nested statement list. The parser never produces one, since `{` at the
    /// start of a statement opens a record. In parsed programs, blocks only
    /// appear as the bodies of `if`, `while` and functions.
    Block(Block),
    Return(Option<Expression>),
    While { condition: Expression, body: Block },
    Expression(Expression),
}

/// A brace delimited list of statements.
#[derive(Debug, Clone)]
pub struct Block {
    pub statements: Vec<Statement>,
    pub token: Token,
}

#[derive(Debug, Clone)]
pub struct Expression {
    pub kind: ExpressionKind,
    pub token: Token,
}

#[derive(Debug, Clone)]
pub enum ExpressionKind {
    Identifier(CompactString),
    Integer(i64),
    String(CompactString),
    Boolean(bool),
    Prefix {
        operator: PrefixOperator,
        operand: Box<Expression>,
    },
    Infix {
        operator: InfixOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Assign {
        destination: Box<Expression>,
        value: Box<Expression>,
    },
    If {
        condition: Box<Expression>,
        then_branch: Block,
        else_branch: Option<Block>,
    },
    Function {
        parameters: Rc<[CompactString]>,
        body: Rc<Block>,
    },
    ArrowFunction {
        parameters: Rc<[CompactString]>,
        body: Rc<Expression>,
    },
    Call {
        callee: Box<Expression>,
        arguments: Vec<Expression>,
    },
    Array(Vec<Expression>),
    Index {
        collection: Box<Expression>,
        index: Box<Expression>,
    },
    Member {
        object: Box<Expression>,
        property: MemberProperty,
    },
    Record(Vec<RecordEntry>),
}

#[derive(Debug, Clone)]
pub enum MemberProperty {
    Field(CompactString),
    Method {
        name: CompactString,
        arguments: Vec<Expression>,
    },
}

#[derive(Debug, Clone)]
pub struct RecordEntry {
    pub key: RecordKey,
    /// `None` for the `{name}` shorthand.
    pub value: Option<Expression>,
}

#[derive(Debug, Clone)]
pub enum RecordKey {
    /// A bare name. The token is kept so the `{name}` shorthand can report
    /// errors at the name itself.
    Identifier(Token),
    String(CompactString),
    Computed(Expression),
}

impl ExpressionKind {
    /// A human readable name for the kind of node.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Identifier(_) => "identifier",
            Self::Integer(_) => "integer literal",
            Self::String(_) => "string literal",
            Self::Boolean(_) => "boolean literal",
            Self::Prefix { .. } => "prefix expression",
            Self::Infix { .. } => "infix expression",
            Self::Assign { .. } => "assignment",
            Self::If { .. } => "if expression",
            Self::Function { .. } => "function literal",
            Self::ArrowFunction { .. } => "arrow function literal",
            Self::Call { .. } => "call expression",
            Self::Array(_) => "array literal",
            Self::Index { .. } => "index expression",
            Self::Member { .. } => "member expression",
            Self::Record(_) => "record literal",
        }
    }
}

// Canonical text. Parsing the output and printing it again yields the same text.

pub(crate) fn write_string_literal(
    f: &mut std::fmt::Formatter<'_>,
    value: &str,
) -> std::fmt::Result {
    write!(f, "\"")?;
    for c in value.chars() {
        match c {
            '"' => write!(f, "\\\"")?,
            '\\' => write!(f, "\\\\")?,
            '\n' => write!(f, "\\n")?,
            '\t' => write!(f, "\\t")?,
            c => write!(f, "{c}")?,
        }
    }
    write!(f, "\"")
}

fn write_separated<T: Display>(
    f: &mut std::fmt::Formatter<'_>,
    items: &[T],
    separator: &str,
) -> std::fmt::Result {
    for (index, item) in items.iter().enumerate() {
        if index > 0 {
            write!(f, "{separator}")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl Display for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write_separated(f, &self.statements, ";\n")
    }
}

impl Display for Block {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.statements.is_empty() {
            return write!(f, "{{ }}");
        }
        write!(f, "{{ ")?;
        write_separated(f, &self.statements, "; ")?;
        write!(f, " }}")
    }
}

impl Display for Statement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            StatementKind::Block(block) => write!(f, "{block}"),
            StatementKind::Return(Some(value)) => write!(f, "return {value}"),
            StatementKind::Return(None) => write!(f, "return"),
            StatementKind::While { condition, body } => write!(f, "while ({condition}) {body}"),
            StatementKind::Expression(expression) => write!(f, "{expression}"),
        }
    }
}

impl Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl Display for ExpressionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Identifier(name) => write!(f, "{name}"),
            Self::Integer(value) => write!(f, "{value}"),
            Self::String(value) => write_string_literal(f, value),
            Self::Boolean(value) => write!(f, "{value}"),
            Self::Prefix {
                operator: operator @ PrefixOperator::Not,
                operand,
            } => write!(f, "({operator} {operand})"),
            Self::Prefix { operator, operand } => write!(f, "({operator}{operand})"),
            Self::Infix {
                operator,
                left,
                right,
            } => write!(f, "({left} {operator} {right})"),
            Self::Assign { destination, value } => write!(f, "({destination} = {value})"),
            Self::If {
                condition,
                then_branch,
                else_branch,
            } => {
                write!(f, "if ({condition}) {then_branch}")?;
                if let Some(else_branch) = else_branch {
                    write!(f, " else {else_branch}")?;
                }
                Ok(())
            }
            Self::Function { parameters, body } => {
                write!(f, "f(")?;
                write_separated(f, parameters, ", ")?;
                write!(f, ") {body}")
            }
            // Parenthesised so that a trailing operator is not absorbed into the body.
            Self::ArrowFunction { parameters, body } => {
                write!(f, "(f(")?;
                write_separated(f, parameters, ", ")?;
                write!(f, ") => {body})")
            }
            Self::Call { callee, arguments } => {
                write!(f, "{callee}(")?;
                write_separated(f, arguments, ", ")?;
                write!(f, ")")
            }
            Self::Array(elements) => {
                write!(f, "[")?;
                write_separated(f, elements, ", ")?;
                write!(f, "]")
            }
            Self::Index { collection, index } => write!(f, "({collection}[{index}])"),
            Self::Member { object, property } => match property {
                MemberProperty::Field(name) => write!(f, "({object}.{name})"),
                MemberProperty::Method { name, arguments } => {
                    write!(f, "({object}.{name}(")?;
                    write_separated(f, arguments, ", ")?;
                    write!(f, "))")
                }
            },
            Self::Record(entries) => {
                write!(f, "{{")?;
                write_separated(f, entries, ", ")?;
                write!(f, "}}")
            }
        }
    }
}

impl Display for RecordEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.key {
            RecordKey::Identifier(name) => write!(f, "{}", name.lexeme)?,
            RecordKey::String(name) => write_string_literal(f, name)?,
            RecordKey::Computed(key) => write!(f, "[{key}]")?,
        }
        match &self.value {
            Some(value) => write!(f, ": {value}"),
            None => Ok(()),
        }
    }
}
