pub mod context;

use compact_str::CompactString;
use std::rc::Rc;

use crate::{
    ast::{
        Block, Expression, ExpressionKind, InfixOperator, MemberProperty, PrefixOperator, Program,
        RecordKey, Statement, StatementKind,
    },
    environment::Environment,
    lexer::Token,
    stack::ensure_sufficient_stack,
    value::{
        builtins,
        error::{RuntimeError, RuntimeErrorKind},
        methods, Function, FunctionBody, Record, Runtime, Value,
    },
};

pub trait SystemContext {
    fn writeln(&mut self, text: &str);
}

/// How evaluation leaves a node other than by producing a value.
#[derive(Debug)]
enum ControlFlow {
    /// A `return` statement unwinding to the nearest function call.
    Return(Value),
    Error(RuntimeError),
}

impl From<RuntimeError> for ControlFlow {
    fn from(error: RuntimeError) -> Self {
        Self::Error(error)
    }
}

type Flow<T = Value> = Result<T, ControlFlow>;

/// Nested user function calls allowed before evaluation fails.
pub const MAX_CALL_DEPTH: usize = 1000;

fn error_at(kind: RuntimeErrorKind, token: &Token) -> ControlFlow {
    ControlFlow::Error(RuntimeError::new(kind, token.span))
}

/// A tree-walking evaluator.
///
/// Output produced by `print` goes to the [`SystemContext`]. With frame
/// tracking enabled, every frame the evaluator creates is kept alive and can be
/// inspected through [`Evaluator::frames`].
pub struct Evaluator<C: SystemContext> {
    context: C,
    frames: Option<Vec<Environment>>,
    depth: usize,
}

impl<C> Evaluator<C>
where
    C: SystemContext,
{
    pub fn new(context: C) -> Self {
        Self {
            context,
            frames: None,
            depth: 0,
        }
    }

    pub fn with_frame_tracking(context: C) -> Self {
        Self {
            context,
            frames: Some(Vec::new()),
            depth: 0,
        }
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn into_context(self) -> C {
        self.context
    }

    /// Frames in creation order. Empty unless tracking is enabled.
    pub fn frames(&self) -> &[Environment] {
        self.frames.as_deref().unwrap_or(&[])
    }

    /// Evaluates a program in `environment`, yielding the value of the last
    /// statement or of the first top level `return`.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn eval(
        &mut self,
        program: &Program,
        environment: &Environment,
    ) -> Result<Value, RuntimeError> {
        if !self.frames().iter().any(|frame| frame.ptr_eq(environment)) {
            self.track(environment);
        }
        match self.eval_statements(&program.statements, environment) {
            Ok(value) | Err(ControlFlow::Return(value)) => Ok(value),
            Err(ControlFlow::Error(error)) => {
                tracing::debug!(code = error.code(), "{error}");
                Err(error)
            }
        }
    }

    fn track(&mut self, environment: &Environment) {
        if let Some(frames) = &mut self.frames {
            tracing::trace!(frame = frames.len(), "new frame");
            frames.push(environment.clone());
        }
    }
}

// Statements
impl<C> Evaluator<C>
where
    C: SystemContext,
{
    fn eval_statements(&mut self, statements: &[Statement], environment: &Environment) -> Flow {
        let mut result = Value::Null;
        for statement in statements {
            result = self.eval_statement(statement, environment)?;
        }
        Ok(result)
    }

    fn eval_block(&mut self, block: &Block, environment: &Environment) -> Flow {
        self.eval_statements(&block.statements, environment)
    }

    fn eval_statement(&mut self, statement: &Statement, environment: &Environment) -> Flow {
        match &statement.kind {
            StatementKind::Block(block) => self.eval_block(block, environment),
            StatementKind::Return(value) => {
                let value = match value {
                    Some(value) => self.eval_expression(value, environment)?,
                    None => Value::Null,
                };
                Err(ControlFlow::Return(value))
            }
            StatementKind::While { condition, body } => {
                while self.eval_expression(condition, environment)?.is_truthy() {
                    self.eval_block(body, environment)?;
                }
                Ok(Value::Null)
            }
            StatementKind::Expression(expression) => self.eval_expression(expression, environment),
        }
    }
}

// Expressions
impl<C> Evaluator<C>
where
    C: SystemContext,
{
    fn eval_expression(&mut self, expression: &Expression, environment: &Environment) -> Flow {
        ensure_sufficient_stack(|| self.eval_expression_kind(expression, environment))
    }

    fn eval_expression_kind(
        &mut self,
        expression: &Expression,
        environment: &Environment,
    ) -> Flow {
        let token = &expression.token;
        match &expression.kind {
            ExpressionKind::Identifier(name) => self.eval_identifier(name, token, environment),
            ExpressionKind::Integer(value) => Ok(Value::Integer(*value)),
            ExpressionKind::String(value) => Ok(Value::String(value.clone())),
            ExpressionKind::Boolean(value) => Ok(Value::Boolean(*value)),
            ExpressionKind::Prefix { operator, operand } => {
                let operand = self.eval_expression(operand, environment)?;
                Self::eval_prefix(*operator, operand).map_err(|kind| error_at(kind, token))
            }
            ExpressionKind::Infix {
                operator,
                left,
                right,
            } if operator.is_short_circuit() => {
                let left = self.eval_expression(left, environment)?.is_truthy();
                let result = match operator {
                    InfixOperator::And => left && self.eval_expression(right, environment)?.is_truthy(),
                    _ => left || self.eval_expression(right, environment)?.is_truthy(),
                };
                Ok(Value::Boolean(result))
            }
            ExpressionKind::Infix {
                operator,
                left,
                right,
            } => {
                let left = self.eval_expression(left, environment)?;
                let right = self.eval_expression(right, environment)?;
                Self::eval_infix(*operator, &left, &right).map_err(|kind| error_at(kind, token))
            }
            ExpressionKind::Assign { destination, value } => {
                self.eval_assign(destination, value, environment)
            }
            ExpressionKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.eval_expression(condition, environment)?.is_truthy() {
                    self.eval_block(then_branch, environment)
                } else if let Some(else_branch) = else_branch {
                    self.eval_block(else_branch, environment)
                } else {
                    Ok(Value::Null)
                }
            }
            ExpressionKind::Function { parameters, body } => {
                Ok(Value::Function(Rc::new(Function {
                    parameters: parameters.clone(),
                    body: FunctionBody::Block(body.clone()),
                    closure: environment.clone(),
                })))
            }
            ExpressionKind::ArrowFunction { parameters, body } => {
                Ok(Value::Function(Rc::new(Function {
                    parameters: parameters.clone(),
                    body: FunctionBody::Expression(body.clone()),
                    closure: environment.clone(),
                })))
            }
            ExpressionKind::Call { callee, arguments } => {
                let callee = self.eval_expression(callee, environment)?;
                let arguments = self.eval_expressions(arguments, environment)?;
                let result = self
                    .apply_function(&callee, arguments)
                    .map_err(|error| error.or_span(token.span))?;
                Ok(result)
            }
            ExpressionKind::Array(elements) => {
                let elements = self.eval_expressions(elements, environment)?;
                Ok(Value::new_array(elements))
            }
            ExpressionKind::Index { collection, index } => {
                let collection = self.eval_expression(collection, environment)?;
                let index = self.eval_expression(index, environment)?;
                Self::eval_index(&collection, &index).map_err(|kind| error_at(kind, token))
            }
            ExpressionKind::Member { object, property } => {
                let object = self.eval_expression(object, environment)?;
                self.eval_member(&object, property, token, environment)
            }
            ExpressionKind::Record(entries) => {
                let mut record = Record::default();
                for entry in entries {
                    let key = match &entry.key {
                        RecordKey::Identifier(name) => name.lexeme.clone(),
                        RecordKey::String(name) => name.clone(),
                        RecordKey::Computed(key) => {
                            let value = self.eval_expression(key, environment)?;
                            Self::record_key(&value).map_err(|kind| error_at(kind, &key.token))?
                        }
                    };
                    let value = match (&entry.value, &entry.key) {
                        (Some(value), _) => self.eval_expression(value, environment)?,
                        // `{name}` takes the value of the variable `name`.
                        (None, RecordKey::Identifier(name)) => {
                            self.eval_identifier(&name.lexeme, name, environment)?
                        }
                        (None, _) => Value::Null,
                    };
                    record.insert(&key, value);
                }
                Ok(Value::new_record(record))
            }
        }
    }

    fn eval_expressions(
        &mut self,
        expressions: &[Expression],
        environment: &Environment,
    ) -> Flow<Vec<Value>> {
        expressions
            .iter()
            .map(|expression| self.eval_expression(expression, environment))
            .collect()
    }

    fn eval_identifier(&mut self, name: &str, token: &Token, environment: &Environment) -> Flow {
        environment
            .lookup(name)
            .or_else(|| builtins::lookup(name))
            .ok_or_else(|| error_at(RuntimeErrorKind::UnknownIdentifier(name.into()), token))
    }

    fn eval_assign(
        &mut self,
        destination: &Expression,
        value: &Expression,
        environment: &Environment,
    ) -> Flow {
        let value = self.eval_expression(value, environment)?;
        let token = &destination.token;
        match &destination.kind {
            ExpressionKind::Identifier(name) => environment.assign(name, value.clone()),
            ExpressionKind::Index { collection, index } => {
                let collection = self.eval_expression(collection, environment)?;
                let index = self.eval_expression(index, environment)?;
                Self::assign_index(&collection, &index, value.clone())
                    .map_err(|kind| error_at(kind, token))?;
            }
            ExpressionKind::Member {
                object,
                property: MemberProperty::Field(name),
            } => match self.eval_expression(object, environment)? {
                Value::Record(record) => {
                    record.borrow_mut().insert(name, value.clone());
                }
                other => {
                    return Err(error_at(
                        RuntimeErrorKind::IllegalAssignment(other.type_name()),
                        token,
                    ))
                }
            },
            other => {
                return Err(error_at(
                    RuntimeErrorKind::IllegalAssignment(other.describe()),
                    token,
                ))
            }
        }
        Ok(value)
    }

    fn eval_member(
        &mut self,
        object: &Value,
        property: &MemberProperty,
        token: &Token,
        environment: &Environment,
    ) -> Flow {
        let undefined = |name: &CompactString| {
            error_at(
                RuntimeErrorKind::UndefinedProperty {
                    receiver: object.type_name(),
                    property: name.clone(),
                },
                token,
            )
        };

        match property {
            MemberProperty::Field(name) => {
                if let Value::Record(record) = object {
                    return record.borrow().get(name).cloned().ok_or_else(|| undefined(name));
                }
                if let Some(value) = methods::read_property(object, name) {
                    Ok(value)
                } else if methods::has_method(object, name) {
                    Err(error_at(RuntimeErrorKind::MethodNotCalled(name.clone()), token))
                } else {
                    Err(undefined(name))
                }
            }
            MemberProperty::Method { name, arguments } => {
                let arguments = self.eval_expressions(arguments, environment)?;
                if let Value::Record(record) = object {
                    // The borrow ends before the call so the function may mutate the record.
                    let field = record.borrow().get(name).cloned();
                    return match field {
                        Some(function) if function.is_callable() => self
                            .apply_function(&function, arguments)
                            .map_err(|error| error.or_span(token.span).into()),
                        Some(other) => Err(error_at(
                            RuntimeErrorKind::NotAFunction(other.type_name()),
                            token,
                        )),
                        None => Err(undefined(name)),
                    };
                }
                match methods::call_method(self, object, name, arguments) {
                    Some(result) => result.map_err(|error| error.or_span(token.span).into()),
                    None => Err(undefined(name)),
                }
            }
        }
    }
}

// Operators
impl<C> Evaluator<C>
where
    C: SystemContext,
{
    fn eval_prefix(operator: PrefixOperator, operand: Value) -> Result<Value, RuntimeErrorKind> {
        match (operator, operand) {
            (PrefixOperator::Minus, Value::Integer(value)) => {
                value
                    .checked_neg()
                    .map(Value::Integer)
                    .ok_or(RuntimeErrorKind::IntegerOverflow {
                        left: 0,
                        operator: InfixOperator::Subtract,
                        right: value,
                    })
            }
            (PrefixOperator::Minus, other) => Err(RuntimeErrorKind::UnknownPrefixOperator {
                operator,
                operand: other.type_name(),
            }),
            (PrefixOperator::Bang | PrefixOperator::Not, operand) => {
                Ok(Value::Boolean(!operand.is_truthy()))
            }
        }
    }

    fn eval_infix(
        operator: InfixOperator,
        left: &Value,
        right: &Value,
    ) -> Result<Value, RuntimeErrorKind> {
        match (left, right) {
            (Value::Integer(lhs), Value::Integer(rhs)) => Self::eval_integer_infix(operator, *lhs, *rhs),
            (Value::String(lhs), Value::String(rhs)) => {
                let result = match operator {
                    InfixOperator::Add => {
                        let mut joined = lhs.clone();
                        joined.push_str(rhs);
                        return Ok(Value::String(joined));
                    }
                    InfixOperator::Equal => lhs == rhs,
                    InfixOperator::NotEqual => lhs != rhs,
                    InfixOperator::LessThan => lhs < rhs,
                    InfixOperator::LessThanEqual => lhs <= rhs,
                    InfixOperator::GreaterThan => lhs > rhs,
                    InfixOperator::GreaterThanEqual => lhs >= rhs,
                    _ => {
                        return Err(RuntimeErrorKind::UnknownInfixOperator {
                            left: left.type_name(),
                            operator,
                            right: right.type_name(),
                        })
                    }
                };
                Ok(Value::Boolean(result))
            }
            _ => match operator {
                InfixOperator::Equal => Ok(Value::Boolean(left.equals(right))),
                InfixOperator::NotEqual => Ok(Value::Boolean(!left.equals(right))),
                _ if left.type_name() == right.type_name() => {
                    Err(RuntimeErrorKind::UnknownInfixOperator {
                        left: left.type_name(),
                        operator,
                        right: right.type_name(),
                    })
                }
                _ => Err(RuntimeErrorKind::TypeMismatch {
                    left: left.type_name(),
                    operator,
                    right: right.type_name(),
                }),
            },
        }
    }

    fn eval_integer_infix(
        operator: InfixOperator,
        left: i64,
        right: i64,
    ) -> Result<Value, RuntimeErrorKind> {
        let overflow = RuntimeErrorKind::IntegerOverflow {
            left,
            operator,
            right,
        };
        let value = match operator {
            InfixOperator::Add => left.checked_add(right).ok_or(overflow)?,
            InfixOperator::Subtract => left.checked_sub(right).ok_or(overflow)?,
            InfixOperator::Multiply => left.checked_mul(right).ok_or(overflow)?,
            InfixOperator::Divide | InfixOperator::Modulo if right == 0 => {
                return Err(RuntimeErrorKind::DivisionByZero { left, operator })
            }
            // Division truncates toward zero.
            InfixOperator::Divide => left.checked_div(right).ok_or(overflow)?,
            InfixOperator::Modulo => left.checked_rem(right).ok_or(overflow)?,
            InfixOperator::Power => {
                if right < 0 {
                    return Err(RuntimeErrorKind::NegativeExponent(right));
                }
                u32::try_from(right)
                    .ok()
                    .and_then(|exponent| left.checked_pow(exponent))
                    .ok_or(overflow)?
            }
            InfixOperator::Equal => return Ok(Value::Boolean(left == right)),
            InfixOperator::NotEqual => return Ok(Value::Boolean(left != right)),
            InfixOperator::LessThan => return Ok(Value::Boolean(left < right)),
            InfixOperator::LessThanEqual => return Ok(Value::Boolean(left <= right)),
            InfixOperator::GreaterThan => return Ok(Value::Boolean(left > right)),
            InfixOperator::GreaterThanEqual => return Ok(Value::Boolean(left >= right)),
            InfixOperator::And | InfixOperator::Or => {
                return Err(RuntimeErrorKind::UnknownInfixOperator {
                    left: "integer",
                    operator,
                    right: "integer",
                })
            }
        };
        Ok(Value::Integer(value))
    }

    fn checked_position(index: i64, length: usize) -> Result<usize, RuntimeErrorKind> {
        usize::try_from(index)
            .ok()
            .filter(|&position| position < length)
            .ok_or(RuntimeErrorKind::IndexOutOfRange { index, length })
    }

    fn record_key(key: &Value) -> Result<CompactString, RuntimeErrorKind> {
        match key {
            Value::String(key) => Ok(key.clone()),
            Value::Integer(key) => Ok(CompactString::from(key.to_string())),
            other => Err(RuntimeErrorKind::InvalidRecordKey(other.type_name())),
        }
    }

    fn eval_index(collection: &Value, index: &Value) -> Result<Value, RuntimeErrorKind> {
        match (collection, index) {
            (Value::Array(elements), Value::Integer(index)) => {
                let elements = elements.borrow();
                let position = Self::checked_position(*index, elements.len())?;
                Ok(elements[position].clone())
            }
            (Value::String(text), Value::Integer(index)) => {
                let length = text.chars().count();
                let position = Self::checked_position(*index, length)?;
                let character = text.chars().nth(position).map(String::from).unwrap_or_default();
                Ok(Value::String(character.into()))
            }
            (Value::Record(record), key @ (Value::String(_) | Value::Integer(_))) => {
                let key = Self::record_key(key)?;
                Ok(record.borrow().get(&key).cloned().unwrap_or(Value::Null))
            }
            _ => Err(RuntimeErrorKind::IndexNotSupported {
                collection: collection.type_name(),
                index: index.type_name(),
            }),
        }
    }

    fn assign_index(collection: &Value, index: &Value, value: Value) -> Result<(), RuntimeErrorKind> {
        match (collection, index) {
            (Value::Array(elements), Value::Integer(index)) => {
                let mut elements = elements.borrow_mut();
                let position = Self::checked_position(*index, elements.len())?;
                elements[position] = value;
                Ok(())
            }
            (Value::Record(record), key) => {
                let key = Self::record_key(key)?;
                record.borrow_mut().insert(&key, value);
                Ok(())
            }
            _ => Err(RuntimeErrorKind::IllegalAssignment(collection.type_name())),
        }
    }
}

impl<C> Runtime for Evaluator<C>
where
    C: SystemContext,
{
    fn apply_function(
        &mut self,
        function: &Value,
        arguments: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        match function {
            Value::Function(function) => {
                if self.depth >= MAX_CALL_DEPTH {
                    return Err(RuntimeErrorKind::CallDepthExceeded(MAX_CALL_DEPTH).into());
                }
                tracing::trace!(
                    parameters = function.parameters.len(),
                    arguments = arguments.len(),
                    "applying function"
                );
                let frame = function.closure.new_scope();
                self.track(&frame);
                // Missing arguments are bound to null and extra ones are dropped.
                let mut arguments = arguments.into_iter();
                for parameter in function.parameters.iter() {
                    frame.define(parameter, arguments.next().unwrap_or(Value::Null));
                }
                self.depth += 1;
                let result = match &function.body {
                    FunctionBody::Block(body) => self.eval_block(body, &frame),
                    FunctionBody::Expression(body) => self.eval_expression(body, &frame),
                };
                self.depth -= 1;
                match result {
                    Ok(value) | Err(ControlFlow::Return(value)) => Ok(value),
                    Err(ControlFlow::Error(error)) => Err(error),
                }
            }
            Value::Builtin(builtin) => (builtin.function)(self, arguments),
            other => Err(RuntimeErrorKind::NotAFunction(other.type_name()).into()),
        }
    }

    fn writeln(&mut self, text: &str) {
        self.context.writeln(text);
    }
}
