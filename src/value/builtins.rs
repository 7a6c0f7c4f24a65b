use super::{
    error::{RuntimeError, RuntimeErrorKind},
    methods::check_arity,
    Builtin, Runtime, Value,
};

pub const BUILTINS: &[Builtin] = &[
    Builtin {
        name: "len",
        function: builtin_len,
    },
    Builtin {
        name: "first",
        function: builtin_first,
    },
    Builtin {
        name: "last",
        function: builtin_last,
    },
    Builtin {
        name: "rest",
        function: builtin_rest,
    },
    Builtin {
        name: "print",
        function: builtin_print,
    },
];

/// Resolves a name that is not bound in any frame.
pub fn lookup(name: &str) -> Option<Value> {
    if name == "null" {
        return Some(Value::Null);
    }
    BUILTINS
        .iter()
        .find(|builtin| builtin.name == name)
        .map(|builtin| Value::Builtin(*builtin))
}

fn array_argument(
    name: &'static str,
    arguments: &[Value],
) -> Result<super::ArrayRef, RuntimeError> {
    check_arity(name, arguments, 1..=1, "1")?;
    match &arguments[0] {
        Value::Array(elements) => Ok(elements.clone()),
        other => Err(RuntimeErrorKind::InvalidArgument {
            name,
            expected: "array",
            actual: other.type_name(),
        }
        .into()),
    }
}

fn builtin_len(_: &mut dyn Runtime, arguments: Vec<Value>) -> Result<Value, RuntimeError> {
    check_arity("len", &arguments, 1..=1, "1")?;
    match &arguments[0] {
        Value::String(value) => Ok(Value::Integer(value.chars().count() as i64)),
        Value::Array(elements) => Ok(Value::Integer(elements.borrow().len() as i64)),
        other => Err(RuntimeErrorKind::InvalidArgument {
            name: "len",
            expected: "string or array",
            actual: other.type_name(),
        }
        .into()),
    }
}

fn builtin_first(_: &mut dyn Runtime, arguments: Vec<Value>) -> Result<Value, RuntimeError> {
    let elements = array_argument("first", &arguments)?;
    let first = elements.borrow().first().cloned();
    Ok(first.unwrap_or(Value::Null))
}

fn builtin_last(_: &mut dyn Runtime, arguments: Vec<Value>) -> Result<Value, RuntimeError> {
    let elements = array_argument("last", &arguments)?;
    let last = elements.borrow().last().cloned();
    Ok(last.unwrap_or(Value::Null))
}

fn builtin_rest(_: &mut dyn Runtime, arguments: Vec<Value>) -> Result<Value, RuntimeError> {
    let elements = array_argument("rest", &arguments)?;
    let rest = elements
        .borrow()
        .split_first()
        .map(|(_, rest)| rest.to_vec());
    Ok(rest.map(Value::new_array).unwrap_or(Value::Null))
}

fn builtin_print(runtime: &mut dyn Runtime, arguments: Vec<Value>) -> Result<Value, RuntimeError> {
    let line = arguments
        .iter()
        .map(Value::to_output_string)
        .collect::<Vec<_>>()
        .join(" ");
    runtime.writeln(&line);
    Ok(Value::Null)
}
