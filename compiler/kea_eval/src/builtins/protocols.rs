//! Shared native dunder methods for the builtin classes.
//!
//! Every builtin class (int, str, list, ...) fills its member map with
//! these `NativeFunction`s, so boxed builtins and user classes resolve
//! operators through the same attribute-dispatch path. The natives
//! unwrap boxed receivers with [`native_view`] and delegate to the
//! operator fast paths, which keeps the numeric/string semantics in
//! exactly one place.

use kea_ir::{BinaryOp, UnaryOp};

use crate::builtins::native_view;
use crate::errors::{
    index_out_of_range, key_not_found, no_length, not_indexable, stop_iteration,
    unsupported_operand, wrong_arg_count, EvalError, EvalResult,
};
use crate::interpreter::Interpreter;
use crate::operators::evaluate_binary;
use crate::unary_operators::evaluate_unary;
use crate::value::{repr, DictKey, InstanceObject, Payload, Value};

/// Check an exact native argument count (receiver included in `args`,
/// excluded from the reported arity).
pub(crate) fn expect_args(name: &str, args: &[Value], total: usize) -> Result<(), EvalError> {
    if args.len() == total {
        Ok(())
    } else {
        Err(wrong_arg_count(
            name,
            total.saturating_sub(1),
            args.len().saturating_sub(1),
        ))
    }
}

fn binary_dunder(op: BinaryOp, name: &str, args: &[Value]) -> EvalResult {
    expect_args(name, args, 2)?;
    let lhs = native_view(&args[0]);
    let rhs = native_view(&args[1]);
    match evaluate_binary(op, &lhs, &rhs)? {
        Some(value) => Ok(value),
        None => Err(unsupported_operand(op, lhs.kind_name(), rhs.kind_name()).into()),
    }
}

pub(crate) fn nf_add(_interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    binary_dunder(BinaryOp::Add, "__add__", args)
}

pub(crate) fn nf_sub(_interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    binary_dunder(BinaryOp::Sub, "__sub__", args)
}

pub(crate) fn nf_mul(_interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    binary_dunder(BinaryOp::Mul, "__mul__", args)
}

pub(crate) fn nf_truediv(_interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    binary_dunder(BinaryOp::Div, "__truediv__", args)
}

pub(crate) fn nf_floordiv(_interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    binary_dunder(BinaryOp::FloorDiv, "__floordiv__", args)
}

pub(crate) fn nf_mod(_interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    binary_dunder(BinaryOp::Mod, "__mod__", args)
}

pub(crate) fn nf_pow(_interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    binary_dunder(BinaryOp::Pow, "__pow__", args)
}

pub(crate) fn nf_eq(_interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    binary_dunder(BinaryOp::Eq, "__eq__", args)
}

pub(crate) fn nf_ne(_interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    binary_dunder(BinaryOp::NotEq, "__ne__", args)
}

pub(crate) fn nf_lt(_interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    binary_dunder(BinaryOp::Lt, "__lt__", args)
}

pub(crate) fn nf_le(_interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    binary_dunder(BinaryOp::LtE, "__le__", args)
}

pub(crate) fn nf_gt(_interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    binary_dunder(BinaryOp::Gt, "__gt__", args)
}

pub(crate) fn nf_ge(_interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    binary_dunder(BinaryOp::GtE, "__ge__", args)
}

/// `__contains__`: receiver is the container, argument the needle.
pub(crate) fn nf_contains(_interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    expect_args("__contains__", args, 2)?;
    let container = native_view(&args[0]);
    let needle = native_view(&args[1]);
    match evaluate_binary(BinaryOp::In, &needle, &container)? {
        Some(value) => Ok(value),
        None => Err(unsupported_operand(BinaryOp::In, needle.kind_name(), container.kind_name())
            .into()),
    }
}

pub(crate) fn nf_neg(_interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    expect_args("__neg__", args, 1)?;
    let operand = native_view(&args[0]);
    match evaluate_unary(UnaryOp::Neg, &operand)? {
        Some(value) => Ok(value),
        None => {
            Err(crate::errors::unsupported_unary(UnaryOp::Neg, operand.kind_name()).into())
        }
    }
}

pub(crate) fn nf_abs(_interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    expect_args("__abs__", args, 1)?;
    match native_view(&args[0]) {
        Value::Int(i) => i
            .checked_abs()
            .map(Value::Int)
            .ok_or_else(|| crate::errors::integer_overflow("abs").into()),
        Value::Bool(b) => Ok(Value::Int(i64::from(b))),
        Value::Float(f) => Ok(Value::Float(f.abs())),
        other => Err(crate::errors::type_mismatch("number", other.kind_name()).into()),
    }
}

pub(crate) fn nf_bool(_interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    expect_args("__bool__", args, 1)?;
    let view = native_view(&args[0]);
    Ok(Value::Bool(view.native_truthy().unwrap_or(true)))
}

pub(crate) fn nf_str(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    expect_args("__str__", args, 1)?;
    let view = native_view(&args[0]);
    Ok(Value::str(repr::display(&view, interp.interner())))
}

pub(crate) fn nf_len(_interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    expect_args("__len__", args, 1)?;
    let view = native_view(&args[0]);
    let len = match &view {
        Value::Str(s) => s.chars().count(),
        Value::List(items) => items.borrow().len(),
        Value::Dict(dict) => dict.borrow().len(),
        Value::Instance(instance) => match &instance.borrow().payload {
            Payload::Range { next, stop, step } => range_len(*next, *stop, *step),
            _ => return Err(no_length(view.kind_name()).into()),
        },
        other => return Err(no_length(other.kind_name()).into()),
    };
    Ok(Value::Int(i64::try_from(len).unwrap_or(i64::MAX)))
}

fn range_len(start: i64, stop: i64, step: i64) -> usize {
    if step > 0 && start < stop {
        usize::try_from((stop - start + step - 1) / step).unwrap_or(0)
    } else if step < 0 && start > stop {
        usize::try_from((start - stop - step - 1) / -step).unwrap_or(0)
    } else {
        0
    }
}

/// Normalize a (possibly negative) index against a length.
fn normalize_index(index: i64, len: usize) -> Result<usize, EvalError> {
    let len_i = i64::try_from(len).unwrap_or(i64::MAX);
    let adjusted = if index < 0 { index + len_i } else { index };
    if adjusted < 0 || adjusted >= len_i {
        return Err(index_out_of_range(index));
    }
    Ok(usize::try_from(adjusted).unwrap_or(0))
}

pub(crate) fn nf_getitem(_interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    expect_args("__getitem__", args, 2)?;
    let container = native_view(&args[0]);
    let index = native_view(&args[1]);
    match &container {
        Value::List(items) => {
            let items = items.borrow();
            let idx = index
                .as_int()
                .ok_or_else(|| crate::errors::type_mismatch("int", index.kind_name()))?;
            let pos = normalize_index(idx, items.len())?;
            Ok(items[pos].clone())
        }
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            let idx = index
                .as_int()
                .ok_or_else(|| crate::errors::type_mismatch("int", index.kind_name()))?;
            let pos = normalize_index(idx, chars.len())?;
            Ok(Value::str(chars[pos].to_string()))
        }
        Value::Dict(dict) => {
            let key = DictKey::from_value(&index)
                .ok_or_else(|| crate::errors::unhashable_key(index.kind_name()))?;
            dict.borrow()
                .get(&key)
                .cloned()
                .ok_or_else(|| key_not_found(&key.describe()).into())
        }
        other => Err(not_indexable(other.kind_name()).into()),
    }
}

pub(crate) fn nf_setitem(_interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    expect_args("__setitem__", args, 3)?;
    let container = native_view(&args[0]);
    let index = native_view(&args[1]);
    let value = args[2].clone();
    match &container {
        Value::List(items) => {
            let mut items = items.borrow_mut();
            let idx = index
                .as_int()
                .ok_or_else(|| crate::errors::type_mismatch("int", index.kind_name()))?;
            let pos = normalize_index(idx, items.len())?;
            items[pos] = value;
            Ok(Value::None)
        }
        Value::Dict(dict) => {
            let key = DictKey::from_value(&index)
                .ok_or_else(|| crate::errors::unhashable_key(index.kind_name()))?;
            dict.borrow_mut().insert(key, value);
            Ok(Value::None)
        }
        other => Err(not_indexable(other.kind_name()).into()),
    }
}

pub(crate) fn nf_delitem(_interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    expect_args("__delitem__", args, 2)?;
    let container = native_view(&args[0]);
    let index = native_view(&args[1]);
    match &container {
        Value::List(items) => {
            let mut items = items.borrow_mut();
            let idx = index
                .as_int()
                .ok_or_else(|| crate::errors::type_mismatch("int", index.kind_name()))?;
            let pos = normalize_index(idx, items.len())?;
            items.remove(pos);
            Ok(Value::None)
        }
        Value::Dict(dict) => {
            let key = DictKey::from_value(&index)
                .ok_or_else(|| crate::errors::unhashable_key(index.kind_name()))?;
            // A missing key raises rather than returning a sentinel;
            // try/except is the recovery mechanism.
            dict.borrow_mut()
                .remove(&key)
                .map(|_| Value::None)
                .ok_or_else(|| key_not_found(&key.describe()).into())
        }
        other => Err(not_indexable(other.kind_name()).into()),
    }
}

/// `__iter__` for the sequence types: snapshot the elements into a
/// cursor instance of the builtin iterator class.
pub(crate) fn nf_iter(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    expect_args("__iter__", args, 1)?;
    let view = native_view(&args[0]);
    let items: Vec<Value> = match &view {
        Value::List(items) => items.borrow().clone(),
        Value::Str(s) => s.chars().map(|c| Value::str(c.to_string())).collect(),
        // Iterating a mapping yields its keys in insertion order.
        Value::Dict(dict) => dict.borrow().keys(),
        Value::Instance(instance) => {
            if let Payload::Range { next, stop, step } = instance.borrow().payload {
                let class = interp.registry().range_iterator_class.clone();
                return Ok(Value::instance(InstanceObject::with_payload(
                    class,
                    Payload::Range { next, stop, step },
                )));
            }
            return Err(crate::errors::not_iterable(view.kind_name()).into());
        }
        other => return Err(crate::errors::not_iterable(other.kind_name()).into()),
    };
    let class = interp.registry().iterator_class.clone();
    Ok(Value::instance(InstanceObject::with_payload(
        class,
        Payload::Iter { items, next: 0 },
    )))
}

/// `__iter__` on an iterator returns the iterator itself.
pub(crate) fn nf_iter_self(_interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    expect_args("__iter__", args, 1)?;
    Ok(args[0].clone())
}

/// `__next__`: advance a cursor payload; `StopIteration` past the end,
/// every time, not just the first.
pub(crate) fn nf_next(_interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    expect_args("__next__", args, 1)?;
    let Value::Instance(instance) = &args[0] else {
        return Err(crate::errors::type_mismatch("iterator", args[0].kind_name()).into());
    };
    let mut instance = instance.borrow_mut();
    match &mut instance.payload {
        Payload::Iter { items, next } => {
            if *next >= items.len() {
                return Err(stop_iteration().into());
            }
            let value = items[*next].clone();
            *next += 1;
            Ok(value)
        }
        Payload::Range { next, stop, step } => {
            let exhausted = if *step > 0 { *next >= *stop } else { *next <= *stop };
            if exhausted {
                return Err(stop_iteration().into());
            }
            let value = *next;
            *next += *step;
            Ok(Value::Int(value))
        }
        _ => Err(stop_iteration().into()),
    }
}
