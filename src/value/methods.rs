//! Native methods of strings and arrays, resolved by name at call time.

use compact_str::CompactString;

use super::{
    error::{RuntimeError, RuntimeErrorKind},
    ArrayRef, Runtime, Value,
};

pub type StringMethod = fn(&mut dyn Runtime, &CompactString, Vec<Value>) -> Result<Value, RuntimeError>;
pub type ArrayMethod = fn(&mut dyn Runtime, &ArrayRef, Vec<Value>) -> Result<Value, RuntimeError>;

fn string_method(name: &str) -> Option<StringMethod> {
    let method: StringMethod = match name {
        "length" => string_length,
        "split" => string_split,
        "strip" => string_strip,
        "into_int" => string_into_int,
        "is_numeric" => string_is_numeric,
        _ => return None,
    };
    Some(method)
}

fn array_method(name: &str) -> Option<ArrayMethod> {
    let method: ArrayMethod = match name {
        "length" => array_length,
        "push" => array_push,
        "pop" => array_pop,
        "dequeue" => array_dequeue,
        "filter" => array_filter,
        "map" => array_map,
        "reduce" => array_reduce,
        "slice" => array_slice,
        _ => return None,
    };
    Some(method)
}

pub fn has_method(receiver: &Value, name: &str) -> bool {
    match receiver {
        Value::String(_) => string_method(name).is_some(),
        Value::Array(_) => array_method(name).is_some(),
        _ => false,
    }
}

/// Invokes the native method `name` on `receiver`. Returns `None` when the
/// receiver's type has no such method.
pub fn call_method(
    runtime: &mut dyn Runtime,
    receiver: &Value,
    name: &str,
    arguments: Vec<Value>,
) -> Option<Result<Value, RuntimeError>> {
    match receiver {
        Value::String(value) => string_method(name).map(|method| method(runtime, value, arguments)),
        Value::Array(elements) => {
            array_method(name).map(|method| method(runtime, elements, arguments))
        }
        _ => None,
    }
}

/// Reads a property that does not need to be called, such as `length`.
pub fn read_property(receiver: &Value, name: &str) -> Option<Value> {
    match (receiver, name) {
        (Value::String(value), "length") => Some(Value::Integer(value.chars().count() as i64)),
        (Value::Array(elements), "length") => Some(Value::Integer(elements.borrow().len() as i64)),
        _ => None,
    }
}

pub(crate) fn check_arity(
    name: &'static str,
    arguments: &[Value],
    accepted: std::ops::RangeInclusive<usize>,
    expected: &'static str,
) -> Result<(), RuntimeError> {
    if accepted.contains(&arguments.len()) {
        Ok(())
    } else {
        Err(RuntimeErrorKind::ArgumentCount {
            name,
            expected,
            actual: arguments.len(),
        }
        .into())
    }
}

fn expect_callable(name: &'static str, value: &Value) -> Result<(), RuntimeError> {
    if value.is_callable() {
        Ok(())
    } else {
        Err(RuntimeErrorKind::InvalidArgument {
            name,
            expected: "function",
            actual: value.type_name(),
        }
        .into())
    }
}

fn expect_integer(name: &'static str, value: &Value) -> Result<i64, RuntimeError> {
    match value {
        Value::Integer(value) => Ok(*value),
        other => Err(RuntimeErrorKind::InvalidArgument {
            name,
            expected: "integer",
            actual: other.type_name(),
        }
        .into()),
    }
}

// Strings

fn string_length(
    _: &mut dyn Runtime,
    receiver: &CompactString,
    arguments: Vec<Value>,
) -> Result<Value, RuntimeError> {
    check_arity("length", &arguments, 0..=0, "0")?;
    Ok(Value::Integer(receiver.chars().count() as i64))
}

fn string_split(
    _: &mut dyn Runtime,
    receiver: &CompactString,
    arguments: Vec<Value>,
) -> Result<Value, RuntimeError> {
    check_arity("split", &arguments, 0..=1, "0 or 1")?;
    let parts: Vec<Value> = match arguments.first() {
        None => receiver.split_whitespace().map(Value::from).collect(),
        Some(Value::String(separator)) if separator.is_empty() => receiver
            .chars()
            .map(|c| Value::String(CompactString::from(c.to_string())))
            .collect(),
        Some(Value::String(separator)) => receiver
            .split(separator.as_str())
            .map(Value::from)
            .collect(),
        Some(other) => {
            return Err(RuntimeErrorKind::InvalidArgument {
                name: "split",
                expected: "string",
                actual: other.type_name(),
            }
            .into())
        }
    };
    Ok(Value::new_array(parts))
}

fn string_strip(
    _: &mut dyn Runtime,
    receiver: &CompactString,
    arguments: Vec<Value>,
) -> Result<Value, RuntimeError> {
    check_arity("strip", &arguments, 0..=0, "0")?;
    Ok(Value::from(receiver.trim()))
}

fn string_into_int(
    _: &mut dyn Runtime,
    receiver: &CompactString,
    arguments: Vec<Value>,
) -> Result<Value, RuntimeError> {
    check_arity("into_int", &arguments, 0..=0, "0")?;
    receiver
        .trim()
        .parse::<i64>()
        .map(Value::Integer)
        .map_err(|_| RuntimeErrorKind::InvalidInteger(receiver.clone()).into())
}

fn string_is_numeric(
    _: &mut dyn Runtime,
    receiver: &CompactString,
    arguments: Vec<Value>,
) -> Result<Value, RuntimeError> {
    check_arity("is_numeric", &arguments, 0..=0, "0")?;
    let numeric = !receiver.is_empty() && receiver.chars().all(|c| c.is_ascii_digit());
    Ok(Value::Boolean(numeric))
}

// Arrays
//
// Callbacks may mutate the receiver, so iteration runs over a snapshot and no
// borrow is held while user code executes.

fn array_length(
    _: &mut dyn Runtime,
    receiver: &ArrayRef,
    arguments: Vec<Value>,
) -> Result<Value, RuntimeError> {
    check_arity("length", &arguments, 0..=0, "0")?;
    Ok(Value::Integer(receiver.borrow().len() as i64))
}

fn array_push(
    _: &mut dyn Runtime,
    receiver: &ArrayRef,
    mut arguments: Vec<Value>,
) -> Result<Value, RuntimeError> {
    check_arity("push", &arguments, 1..=1, "1")?;
    if let Some(value) = arguments.pop() {
        receiver.borrow_mut().push(value);
    }
    Ok(Value::Null)
}

fn array_pop(
    _: &mut dyn Runtime,
    receiver: &ArrayRef,
    arguments: Vec<Value>,
) -> Result<Value, RuntimeError> {
    check_arity("pop", &arguments, 0..=0, "0")?;
    let popped = receiver.borrow_mut().pop();
    Ok(popped.unwrap_or(Value::Null))
}

fn array_dequeue(
    _: &mut dyn Runtime,
    receiver: &ArrayRef,
    arguments: Vec<Value>,
) -> Result<Value, RuntimeError> {
    check_arity("dequeue", &arguments, 0..=0, "0")?;
    let mut elements = receiver.borrow_mut();
    let dequeued = if elements.is_empty() {
        Value::Null
    } else {
        elements.remove(0)
    };
    Ok(dequeued)
}

fn array_filter(
    runtime: &mut dyn Runtime,
    receiver: &ArrayRef,
    arguments: Vec<Value>,
) -> Result<Value, RuntimeError> {
    check_arity("filter", &arguments, 1..=1, "1")?;
    let predicate = &arguments[0];
    expect_callable("filter", predicate)?;

    let elements = receiver.borrow().clone();
    let mut kept = Vec::new();
    for element in elements {
        match runtime.apply_function(predicate, vec![element.clone()])? {
            Value::Boolean(true) => kept.push(element),
            Value::Boolean(false) => {}
            other => return Err(RuntimeErrorKind::FilterPredicate(other.type_name()).into()),
        }
    }
    Ok(Value::new_array(kept))
}

fn array_map(
    runtime: &mut dyn Runtime,
    receiver: &ArrayRef,
    arguments: Vec<Value>,
) -> Result<Value, RuntimeError> {
    check_arity("map", &arguments, 1..=1, "1")?;
    let mapper = &arguments[0];
    expect_callable("map", mapper)?;

    let elements = receiver.borrow().clone();
    let mapped = elements
        .into_iter()
        .map(|element| runtime.apply_function(mapper, vec![element]))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Value::new_array(mapped))
}

fn array_reduce(
    runtime: &mut dyn Runtime,
    receiver: &ArrayRef,
    arguments: Vec<Value>,
) -> Result<Value, RuntimeError> {
    check_arity("reduce", &arguments, 1..=2, "1 or 2")?;
    let reducer = &arguments[0];
    expect_callable("reduce", reducer)?;

    let mut elements = receiver.borrow().clone().into_iter();
    let mut accumulator = match arguments.get(1) {
        Some(initial) => initial.clone(),
        None => match elements.next() {
            Some(first) => first,
            None => return Ok(Value::Null),
        },
    };
    for element in elements {
        accumulator = runtime.apply_function(reducer, vec![accumulator, element])?;
    }
    Ok(accumulator)
}

fn array_slice(
    _: &mut dyn Runtime,
    receiver: &ArrayRef,
    arguments: Vec<Value>,
) -> Result<Value, RuntimeError> {
    check_arity("slice", &arguments, 0..=2, "0, 1 or 2")?;
    let elements = receiver.borrow();
    let length = elements.len() as i64;
    // Negative positions count back from the end; both ends are clamped.
    let clamp = |position: i64| {
        let position = if position < 0 { length + position } else { position };
        position.clamp(0, length) as usize
    };

    let start = match arguments.first() {
        Some(value) => clamp(expect_integer("slice", value)?),
        None => 0,
    };
    let end = match arguments.get(1) {
        Some(value) => clamp(expect_integer("slice", value)?),
        None => elements.len(),
    };

    let sliced = if start < end {
        elements[start..end].to_vec()
    } else {
        Vec::new()
    };
    Ok(Value::new_array(sliced))
}
