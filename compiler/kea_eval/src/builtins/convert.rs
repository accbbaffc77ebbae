//! Constructors for the builtin classes.
//!
//! Calling a builtin class converts: `int("3")`, `str(5)`, `list(x)`.
//! These natives are registered as the class's `__new__` member and
//! receive the raw call arguments (no receiver); the call path invokes
//! them instead of the allocate-then-`__init__` sequence user classes
//! get.

use crate::errors::{value_error, wrong_arg_count, EvalResult};
use crate::interpreter::Interpreter;
use crate::value::{repr, DictValue, InstanceObject, Payload, Value};

fn at_most(name: &str, args: &[Value], max: usize) -> Result<(), crate::errors::EvalError> {
    if args.len() > max {
        return Err(wrong_arg_count(name, max, args.len()));
    }
    Ok(())
}

pub(crate) fn nf_int_new(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    at_most("int", args, 1)?;
    let Some(arg) = args.first() else {
        return Ok(Value::Int(0));
    };
    match crate::builtins::native_view(arg) {
        Value::Int(i) => Ok(Value::Int(i)),
        Value::Bool(b) => Ok(Value::Int(i64::from(b))),
        // Conversion truncates toward zero.
        Value::Float(f) => Ok(Value::Int(f.trunc() as i64)),
        Value::Str(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| value_error(&format!("invalid literal for int(): '{s}'")).into()),
        other => Err(crate::errors::type_mismatch(
            "int, float, or str",
            &interp.type_name_of(&other),
        )
        .into()),
    }
}

pub(crate) fn nf_float_new(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    at_most("float", args, 1)?;
    let Some(arg) = args.first() else {
        return Ok(Value::Float(0.0));
    };
    match crate::builtins::native_view(arg) {
        Value::Float(f) => Ok(Value::Float(f)),
        Value::Int(i) => Ok(Value::Float(i as f64)),
        Value::Bool(b) => Ok(Value::Float(f64::from(i32::from(b)))),
        Value::Str(s) => s
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| value_error(&format!("could not convert string to float: '{s}'")).into()),
        other => Err(crate::errors::type_mismatch(
            "int, float, or str",
            &interp.type_name_of(&other),
        )
        .into()),
    }
}

pub(crate) fn nf_str_new(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    at_most("str", args, 1)?;
    match args.first() {
        None => Ok(Value::str("")),
        // Dispatches __str__ for instances that define it.
        Some(arg) => {
            let text = interp.str_value(arg)?;
            Ok(Value::str(text))
        }
    }
}

pub(crate) fn nf_bool_new(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    at_most("bool", args, 1)?;
    match args.first() {
        None => Ok(Value::Bool(false)),
        Some(arg) => {
            let arg = arg.clone();
            Ok(Value::Bool(interp.truthy(&arg)?))
        }
    }
}

pub(crate) fn nf_list_new(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    at_most("list", args, 1)?;
    match args.first() {
        None => Ok(Value::list(vec![])),
        Some(arg) => {
            let items = interp.iterate_to_vec(arg)?;
            Ok(Value::list(items))
        }
    }
}

pub(crate) fn nf_dict_new(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    at_most("dict", args, 1)?;
    match args.first().map(crate::builtins::native_view) {
        None => Ok(Value::dict(DictValue::new())),
        Some(Value::Dict(dict)) => Ok(Value::dict(dict.borrow().clone())),
        Some(other) => Err(crate::errors::type_mismatch(
            "dict",
            &interp.type_name_of(&other),
        )
        .into()),
    }
}

/// `range(stop)`, `range(start, stop)`, `range(start, stop, step)`.
pub(crate) fn nf_range_new(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    if args.is_empty() || args.len() > 3 {
        return Err(wrong_arg_count("range", 3, args.len()).into());
    }
    let mut bounds = [0i64; 3];
    for (slot, arg) in bounds.iter_mut().zip(args.iter()) {
        *slot = crate::builtins::native_view(arg)
            .as_int()
            .ok_or_else(|| {
                crate::errors::type_mismatch("int", &interp.type_name_of(arg))
            })?;
    }
    let (start, stop, step) = match args.len() {
        1 => (0, bounds[0], 1),
        2 => (bounds[0], bounds[1], 1),
        _ => (bounds[0], bounds[1], bounds[2]),
    };
    if step == 0 {
        return Err(value_error("range() step must not be zero").into());
    }
    let class = interp.registry().range_class.clone();
    Ok(Value::instance(InstanceObject::with_payload(
        class,
        Payload::Range {
            next: start,
            stop,
            step,
        },
    )))
}

/// `repr(x)` needs no dunder dispatch; kept here with the other
/// conversions.
pub(crate) fn nf_repr(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    if args.len() != 1 {
        return Err(wrong_arg_count("repr", 1, args.len()).into());
    }
    Ok(Value::str(repr::repr(&args[0], interp.interner())))
}
