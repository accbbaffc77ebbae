//! Non-dunder methods of the builtin types.

use crate::builtins::native_view;
use crate::builtins::protocols::expect_args;
use crate::errors::{index_out_of_range, type_mismatch, wrong_arg_count, EvalResult};
use crate::interpreter::Interpreter;
use crate::value::{DictKey, Value};

fn expect_list(interp: &Interpreter, value: &Value) -> Result<crate::value::Shared<Vec<Value>>, crate::errors::EvalError> {
    match native_view(value) {
        Value::List(items) => Ok(items),
        other => Err(type_mismatch("list", &interp.type_name_of(&other))),
    }
}

pub(crate) fn nf_list_append(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    expect_args("append", args, 2)?;
    let items = expect_list(interp, &args[0])?;
    items.borrow_mut().push(args[1].clone());
    Ok(Value::None)
}

/// `pop()` removes and returns the last element; `pop(i)` the i-th.
pub(crate) fn nf_list_pop(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    if args.len() != 1 && args.len() != 2 {
        return Err(wrong_arg_count("pop", 1, args.len().saturating_sub(1)).into());
    }
    let items = expect_list(interp, &args[0])?;
    let mut items = items.borrow_mut();
    let len = items.len();
    if len == 0 {
        return Err(index_out_of_range(0).into());
    }
    let index = match args.get(1) {
        None => len - 1,
        Some(arg) => {
            let raw = native_view(arg)
                .as_int()
                .ok_or_else(|| type_mismatch("int", &interp.type_name_of(arg)))?;
            let adjusted = if raw < 0 {
                raw + i64::try_from(len).unwrap_or(i64::MAX)
            } else {
                raw
            };
            usize::try_from(adjusted)
                .ok()
                .filter(|&i| i < len)
                .ok_or_else(|| index_out_of_range(raw))?
        }
    };
    Ok(items.remove(index))
}

fn expect_str(interp: &Interpreter, value: &Value) -> Result<std::rc::Rc<str>, crate::errors::EvalError> {
    match native_view(value) {
        Value::Str(s) => Ok(s),
        other => Err(type_mismatch("str", &interp.type_name_of(&other))),
    }
}

pub(crate) fn nf_str_upper(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    expect_args("upper", args, 1)?;
    let s = expect_str(interp, &args[0])?;
    Ok(Value::str(s.to_uppercase()))
}

pub(crate) fn nf_str_lower(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    expect_args("lower", args, 1)?;
    let s = expect_str(interp, &args[0])?;
    Ok(Value::str(s.to_lowercase()))
}

pub(crate) fn nf_str_strip(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    expect_args("strip", args, 1)?;
    let s = expect_str(interp, &args[0])?;
    Ok(Value::str(s.trim()))
}

fn expect_dict(
    interp: &Interpreter,
    value: &Value,
) -> Result<crate::value::Shared<crate::value::DictValue>, crate::errors::EvalError> {
    match native_view(value) {
        Value::Dict(dict) => Ok(dict),
        other => Err(type_mismatch("dict", &interp.type_name_of(&other))),
    }
}

/// `get(key)` / `get(key, default)`: `None` or the default instead of
/// `KeyError`.
pub(crate) fn nf_dict_get(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    if args.len() != 2 && args.len() != 3 {
        return Err(wrong_arg_count("get", 2, args.len().saturating_sub(1)).into());
    }
    let dict = expect_dict(interp, &args[0])?;
    let Some(key) = DictKey::from_value(&native_view(&args[1])) else {
        return Err(crate::errors::unhashable_key(args[1].kind_name()).into());
    };
    let found = dict.borrow().get(&key).cloned();
    Ok(found.unwrap_or_else(|| args.get(2).cloned().unwrap_or(Value::None)))
}

pub(crate) fn nf_dict_keys(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    expect_args("keys", args, 1)?;
    let dict = expect_dict(interp, &args[0])?;
    let keys = dict.borrow().keys();
    Ok(Value::list(keys))
}

pub(crate) fn nf_dict_values(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    expect_args("values", args, 1)?;
    let dict = expect_dict(interp, &args[0])?;
    let values: Vec<Value> = dict.borrow().iter().map(|(_, v)| v.clone()).collect();
    Ok(Value::list(values))
}

pub(crate) fn nf_dict_items(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    expect_args("items", args, 1)?;
    let dict = expect_dict(interp, &args[0])?;
    let items: Vec<Value> = dict
        .borrow()
        .iter()
        .map(|(key, value)| Value::list(vec![key.to_value(), value.clone()]))
        .collect();
    Ok(Value::list(items))
}
