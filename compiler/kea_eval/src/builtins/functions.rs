//! Module-scope builtin functions.
//!
//! These are plain `NativeFunction` bindings seeded into the module
//! scope; most delegate to interpreter helpers so dunder dispatch
//! stays in one place.

use crate::errors::{type_mismatch, wrong_arg_count, EvalResult};
use crate::interpreter::Interpreter;
use crate::value::Value;

fn exactly(name: &str, args: &[Value], count: usize) -> Result<(), crate::errors::EvalError> {
    if args.len() == count {
        Ok(())
    } else {
        Err(wrong_arg_count(name, count, args.len()))
    }
}

/// `print(*values)`: format and hand one line to the print handler.
pub(crate) fn nf_print(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    let mut parts = Vec::with_capacity(args.len());
    for arg in args {
        parts.push(interp.str_value(arg)?);
    }
    interp.print_line(&parts.join(" "));
    Ok(Value::None)
}

pub(crate) fn nf_len(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    exactly("len", args, 1)?;
    interp.len_value(&args[0]).map(Value::Int)
}

pub(crate) fn nf_abs(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    exactly("abs", args, 1)?;
    match &args[0] {
        Value::Int(i) => i
            .checked_abs()
            .map(Value::Int)
            .ok_or_else(|| crate::errors::integer_overflow("abs").into()),
        Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
        Value::Float(f) => Ok(Value::Float(f.abs())),
        other => {
            let name = interp.dunders().abs;
            match interp.call_dunder(other, name, &[]) {
                Some(result) => result,
                None => Err(type_mismatch("number", &interp.type_name_of(other)).into()),
            }
        }
    }
}

pub(crate) fn nf_isinstance(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    exactly("isinstance", args, 2)?;
    let Value::Class(class) = &args[1] else {
        return Err(type_mismatch("class", &interp.type_name_of(&args[1])).into());
    };
    Ok(Value::Bool(interp.value_is_instance(&args[0], class)))
}

pub(crate) fn nf_issubclass(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    exactly("issubclass", args, 2)?;
    let (Value::Class(sub), Value::Class(target)) = (&args[0], &args[1]) else {
        let bad = if matches!(args[0], Value::Class(_)) {
            &args[1]
        } else {
            &args[0]
        };
        return Err(type_mismatch("class", &interp.type_name_of(bad)).into());
    };
    Ok(Value::Bool(crate::value::class::is_subclass(sub, target)))
}

pub(crate) fn nf_iter(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    exactly("iter", args, 1)?;
    let arg = args[0].clone();
    interp.get_iterator(&arg)
}

pub(crate) fn nf_next(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    exactly("next", args, 1)?;
    let arg = args[0].clone();
    interp.iterator_next(&arg)
}

/// `super()`: resolve against the defining class of the executing
/// method, bound to its receiver.
pub(crate) fn nf_super(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    exactly("super", args, 0)?;
    interp.current_super()
}
