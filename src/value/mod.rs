pub mod builtins;
pub mod error;
pub mod formatter;
pub mod methods;

use compact_str::CompactString;
use error::RuntimeError;
use std::{cell::RefCell, fmt::Display, rc::Rc};

use crate::{
    ast::{Block, Expression},
    environment::Environment,
};

pub type ArrayRef = Rc<RefCell<Vec<Value>>>;
pub type RecordRef = Rc<RefCell<Record>>;

/// Services the evaluator provides to native code.
pub trait Runtime {
    /// Calls a function or builtin value with already evaluated arguments.
    fn apply_function(
        &mut self,
        function: &Value,
        arguments: Vec<Value>,
    ) -> Result<Value, RuntimeError>;
    /// Writes a line of program output.
    fn writeln(&mut self, text: &str);
}

pub type BuiltinFunction = fn(&mut dyn Runtime, Vec<Value>) -> Result<Value, RuntimeError>;

#[derive(Clone, Copy)]
pub struct Builtin {
    pub name: &'static str,
    pub function: BuiltinFunction,
}

impl std::fmt::Debug for Builtin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Builtin({})", self.name)
    }
}

#[derive(Debug, Clone)]
pub enum FunctionBody {
    Block(Rc<Block>),
    Expression(Rc<Expression>),
}

pub struct Function {
    pub parameters: Rc<[CompactString]>,
    pub body: FunctionBody,
    /// The frame the function was defined in.
    pub closure: Environment,
}

impl std::fmt::Debug for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Function")
            .field("parameters", &self.parameters)
            .field("closure", &self.closure.id())
            .finish_non_exhaustive()
    }
}

/// String keyed fields in insertion order.
#[derive(Debug, Clone, Default)]
pub struct Record {
    fields: Vec<(CompactString, Value)>,
}

impl Record {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find_map(|(name, value)| (name == key).then_some(value))
    }

    /// Inserts or overwrites a field, returning the previous value.
    pub fn insert(&mut self, key: &str, value: Value) -> Option<Value> {
        match self.fields.iter_mut().find(|(name, _)| name == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.fields.push((key.into(), value));
                None
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CompactString, &Value)> {
        self.fields.iter().map(|(name, value)| (name, value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[derive(Debug, Clone)]
pub enum Value {
    Integer(i64),
    String(CompactString),
    Boolean(bool),
    Null,
    Array(ArrayRef),
    Record(RecordRef),
    Function(Rc<Function>),
    Builtin(Builtin),
}

impl Value {
    pub fn new_array(elements: Vec<Value>) -> Self {
        Self::Array(Rc::new(RefCell::new(elements)))
    }

    pub fn new_record(record: Record) -> Self {
        Self::Record(Rc::new(RefCell::new(record)))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Integer(_) => "integer",
            Self::String(_) => "string",
            Self::Boolean(_) => "boolean",
            Self::Null => "null",
            Self::Array(_) => "array",
            Self::Record(_) => "record",
            Self::Function(_) => "function",
            Self::Builtin(_) => "builtin",
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Boolean(value) => *value,
            _ => true,
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Self::Function(_) | Self::Builtin(_))
    }

    /// Scalars compare by value, containers and functions by identity.
    pub fn equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Integer(lhs), Self::Integer(rhs)) => lhs == rhs,
            (Self::String(lhs), Self::String(rhs)) => lhs == rhs,
            (Self::Boolean(lhs), Self::Boolean(rhs)) => lhs == rhs,
            (Self::Null, Self::Null) => true,
            (Self::Array(lhs), Self::Array(rhs)) => Rc::ptr_eq(lhs, rhs),
            (Self::Record(lhs), Self::Record(rhs)) => Rc::ptr_eq(lhs, rhs),
            (Self::Function(lhs), Self::Function(rhs)) => Rc::ptr_eq(lhs, rhs),
            (Self::Builtin(lhs), Self::Builtin(rhs)) => lhs.name == rhs.name,
            _ => false,
        }
    }

    /// The text `print` writes: strings without quotes, everything else as displayed.
    pub fn to_output_string(&self) -> String {
        match self {
            Self::String(value) => value.to_string(),
            other => other.to_string(),
        }
    }

    fn write_nested(
        &self,
        f: &mut std::fmt::Formatter<'_>,
        visiting: &mut Vec<*const ()>,
    ) -> std::fmt::Result {
        match self {
            Self::Integer(value) => write!(f, "{value}"),
            Self::String(value) => write!(f, "'{value}'"),
            Self::Boolean(value) => write!(f, "{value}"),
            Self::Null => write!(f, "null"),
            Self::Array(elements) => {
                let address = Rc::as_ptr(elements) as *const ();
                if visiting.contains(&address) {
                    return write!(f, "[...]");
                }
                visiting.push(address);
                write!(f, "[")?;
                for (index, element) in elements.borrow().iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    element.write_nested(f, visiting)?;
                }
                visiting.pop();
                write!(f, "]")
            }
            Self::Record(record) => {
                let address = Rc::as_ptr(record) as *const ();
                if visiting.contains(&address) {
                    return write!(f, "{{...}}");
                }
                let record = record.borrow();
                if record.is_empty() {
                    return write!(f, "{{}}");
                }
                visiting.push(address);
                write!(f, "{{ ")?;
                for (index, (name, value)) in record.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name}: ")?;
                    value.write_nested(f, visiting)?;
                }
                visiting.pop();
                write!(f, " }}")
            }
            Self::Function(function) => {
                write!(f, "f({})", function.parameters.join(", "))?;
                match &function.body {
                    FunctionBody::Block(block) => write!(f, " {block}"),
                    FunctionBody::Expression(expression) => write!(f, " => {expression}"),
                }
            }
            Self::Builtin(builtin) => write!(f, "<builtin function `{}`>", builtin.name),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.write_nested(f, &mut Vec::new())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.into())
    }
}

impl From<CompactString> for Value {
    fn from(value: CompactString) -> Self {
        Self::String(value)
    }
}
