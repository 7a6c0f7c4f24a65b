use super::{
    Block, Expression, ExpressionKind, MemberProperty, RecordKey, Statement, StatementKind,
};

pub trait ExpressionFormatter {
    fn format(&self, expression: &Expression) -> String;
    fn format_statement(&self, statement: &Statement) -> String;
}

pub struct DebugFormatter;

impl ExpressionFormatter for DebugFormatter {
    fn format(&self, expression: &Expression) -> String {
        format!("{:?}", expression.kind)
    }

    fn format_statement(&self, statement: &Statement) -> String {
        format!("{:?}", statement.kind)
    }
}

/// Source text that parses back into the same tree.
pub struct CanonicalFormatter;

impl ExpressionFormatter for CanonicalFormatter {
    fn format(&self, expression: &Expression) -> String {
        expression.to_string()
    }

    fn format_statement(&self, statement: &Statement) -> String {
        statement.to_string()
    }
}

/// Prefix notation with every node parenthesised, e.g. `(+ a (* b c))`.
pub struct SExpressionFormatter;

impl SExpressionFormatter {
    fn format_list<'a>(&self, head: &str, items: impl IntoIterator<Item = &'a Expression>) -> String {
        let mut buffer = format!("({head}");
        for item in items {
            buffer.push(' ');
            buffer.push_str(&self.format(item));
        }
        buffer.push(')');
        buffer
    }

    fn format_block(&self, block: &Block) -> String {
        let mut buffer = String::from("(block");
        for statement in &block.statements {
            buffer.push(' ');
            buffer.push_str(&self.format_statement(statement));
        }
        buffer.push(')');
        buffer
    }
}

impl ExpressionFormatter for SExpressionFormatter {
    fn format(&self, expression: &Expression) -> String {
        match &expression.kind {
            ExpressionKind::Identifier(_)
            | ExpressionKind::Integer(_)
            | ExpressionKind::String(_)
            | ExpressionKind::Boolean(_) => expression.to_string(),
            ExpressionKind::Prefix { operator, operand } => {
                self.format_list(&operator.to_string(), [operand.as_ref()])
            }
            ExpressionKind::Infix {
                operator,
                left,
                right,
            } => self.format_list(&operator.to_string(), [left.as_ref(), right.as_ref()]),
            ExpressionKind::Assign { destination, value } => {
                self.format_list("=", [destination.as_ref(), value.as_ref()])
            }
            ExpressionKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let mut buffer = format!(
                    "(if {} {}",
                    self.format(condition),
                    self.format_block(then_branch)
                );
                if let Some(else_branch) = else_branch {
                    buffer.push(' ');
                    buffer.push_str(&self.format_block(else_branch));
                }
                buffer.push(')');
                buffer
            }
            ExpressionKind::Function { parameters, body } => {
                format!("(fn ({}) {})", parameters.join(" "), self.format_block(body))
            }
            ExpressionKind::ArrowFunction { parameters, body } => {
                format!("(fn ({}) {})", parameters.join(" "), self.format(body))
            }
            ExpressionKind::Call { callee, arguments } => {
                self.format_list("call", std::iter::once(callee.as_ref()).chain(arguments))
            }
            ExpressionKind::Array(elements) => self.format_list("array", elements),
            ExpressionKind::Index { collection, index } => {
                self.format_list("index", [collection.as_ref(), index.as_ref()])
            }
            ExpressionKind::Member { object, property } => match property {
                MemberProperty::Field(name) => format!("(. {} {name})", self.format(object)),
                MemberProperty::Method { name, arguments } => {
                    let head = format!(". {} {name}", self.format(object));
                    self.format_list(&head, arguments)
                }
            },
            ExpressionKind::Record(entries) => {
                let mut buffer = String::from("(record");
                for entry in entries {
                    let key = match &entry.key {
                        RecordKey::Identifier(name) => name.lexeme.to_string(),
                        RecordKey::String(name) => format!("{name:?}"),
                        RecordKey::Computed(key) => self.format(key),
                    };
                    match &entry.value {
                        Some(value) => buffer.push_str(&format!(" ({key} {})", self.format(value))),
                        None => buffer.push_str(&format!(" {key}")),
                    }
                }
                buffer.push(')');
                buffer
            }
        }
    }

    fn format_statement(&self, statement: &Statement) -> String {
        match &statement.kind {
            StatementKind::Block(block) => self.format_block(block),
            StatementKind::Return(Some(value)) => format!("(return {})", self.format(value)),
            StatementKind::Return(None) => "(return)".into(),
            StatementKind::While { condition, body } => {
                format!("(while {} {})", self.format(condition), self.format_block(body))
            }
            StatementKind::Expression(expression) => self.format(expression),
        }
    }
}
