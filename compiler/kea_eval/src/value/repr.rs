//! Value formatting for `print`, `str`, and error messages.
//!
//! Instances with a user `__str__` are formatted by the interpreter,
//! which can dispatch the dunder; everything here is dunder-free.

use kea_ir::StringInterner;

use crate::value::{Payload, Value};

/// Containers nested deeper than this render as "..." instead of
/// recursing (also breaks self-referential cycles).
const MAX_DEPTH: usize = 16;

/// The value's repr: strings quoted, containers element-wise.
pub fn repr(value: &Value, interner: &StringInterner) -> String {
    repr_depth(value, interner, 0)
}

/// The value's display form: like `repr`, but strings unquoted.
pub fn display(value: &Value, interner: &StringInterner) -> String {
    match value {
        Value::Str(s) => s.to_string(),
        other => repr_depth(other, interner, 0),
    }
}

/// Format a float the way the language prints it: always with a
/// decimal point, so `float` results are visibly floats.
pub fn format_float(f: f64) -> String {
    if f.is_finite() && f == f.trunc() && f.abs() < 1e16 {
        format!("{f:.1}")
    } else {
        format!("{f}")
    }
}

fn repr_depth(value: &Value, interner: &StringInterner, depth: usize) -> String {
    if depth > MAX_DEPTH {
        return "...".to_owned();
    }
    match value {
        Value::None => "None".to_owned(),
        Value::Bool(true) => "True".to_owned(),
        Value::Bool(false) => "False".to_owned(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => format_float(*f),
        Value::Str(s) => format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'")),
        Value::List(items) => {
            let items = items.borrow();
            let parts: Vec<String> = items
                .iter()
                .map(|item| repr_depth(item, interner, depth + 1))
                .collect();
            format!("[{}]", parts.join(", "))
        }
        Value::Dict(dict) => {
            let dict = dict.borrow();
            let parts: Vec<String> = dict
                .iter()
                .map(|(key, val)| {
                    format!("{}: {}", key.describe(), repr_depth(val, interner, depth + 1))
                })
                .collect();
            format!("{{{}}}", parts.join(", "))
        }
        Value::Function(func) => {
            format!("<function {}>", interner.lookup(func.name))
        }
        Value::NativeFunction(native) => {
            format!("<built-in function {}>", native.name)
        }
        Value::BoundMethod(method) => match &method.callable {
            Value::Function(func) => {
                format!("<bound method {}>", interner.lookup(func.name))
            }
            Value::NativeFunction(native) => {
                format!("<bound method {}>", native.name)
            }
            other => format!("<bound method of {}>", other.kind_name()),
        },
        Value::Class(class) => {
            format!("<class '{}'>", interner.lookup(class.borrow().name))
        }
        Value::Instance(instance) => {
            // Boxed builtins render as their payload.
            if let Payload::Native(inner) = &instance.borrow().payload {
                return repr_depth(inner, interner, depth + 1);
            }
            format!(
                "<{} object>",
                interner.lookup(instance.borrow().class.borrow().name)
            )
        }
        Value::Super(binding) => {
            format!(
                "<super: '{}'>",
                interner.lookup(binding.class.borrow().name)
            )
        }
    }
}
