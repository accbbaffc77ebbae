//! Binary operator evaluation: native fast paths.
//!
//! [`evaluate_binary`] handles operand pairs that resolve natively
//! (numbers, strings, sequences, mappings) and returns `Ok(None)` when
//! resolution needs dunder dispatch — any instance operand, boxed or
//! user-class. The interpreter owns that fallback; a pair that is
//! neither native nor dispatchable is an unsupported-operand error.
//!
//! Numeric promotion rules:
//! - int ⋄ int yields int, except true division which always yields float
//! - floor division truncates toward negative infinity
//! - modulo takes the sign of the divisor

use kea_ir::BinaryOp;

use crate::errors::{
    division_by_zero, integer_overflow, modulo_by_zero, unsupported_operand, EvalError,
};
use crate::value::Value;

/// Evaluate a binary operator natively.
///
/// `Ok(Some(value))` — resolved on the fast path.
/// `Ok(None)` — an instance operand; the caller dispatches dunders.
/// `Err(_)` — no native rule and no dispatch possible.
pub fn evaluate_binary(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Option<Value>, EvalError> {
    // Instances resolve through their class dunders, boxed or user.
    if matches!(lhs, Value::Instance(_)) || matches!(rhs, Value::Instance(_)) {
        return Ok(None);
    }

    if let Some(value) = eval_numeric(op, lhs, rhs)? {
        return Ok(Some(value));
    }
    if let Some(value) = eval_str(op, lhs, rhs)? {
        return Ok(Some(value));
    }
    if let Some(value) = eval_list(op, lhs, rhs)? {
        return Ok(Some(value));
    }
    if let Some(value) = eval_dict(op, lhs, rhs) {
        return Ok(Some(value));
    }

    // Equality is defined structurally across every non-instance kind.
    if matches!(op, BinaryOp::Eq | BinaryOp::NotEq) {
        if let Some(eq) = lhs.structural_eq(rhs) {
            return Ok(Some(Value::Bool(if op == BinaryOp::Eq { eq } else { !eq })));
        }
    }

    Err(unsupported_operand(op, lhs.kind_name(), rhs.kind_name()))
}

/// Floor division truncating toward negative infinity.
///
/// `5 // 2 == 2`, `-1 // 2 == -1` (not 0).
pub fn int_floor_div(a: i64, b: i64) -> Result<i64, EvalError> {
    if b == 0 {
        return Err(modulo_by_zero());
    }
    let quotient = a.wrapping_div(b);
    let remainder = a.wrapping_rem(b);
    if remainder != 0 && (remainder < 0) != (b < 0) {
        Ok(quotient - 1)
    } else {
        Ok(quotient)
    }
}

/// Modulo following the sign of the divisor.
///
/// `5 % -2 == -1`, `-1 % 2 == 1`.
pub fn int_mod(a: i64, b: i64) -> Result<i64, EvalError> {
    if b == 0 {
        return Err(modulo_by_zero());
    }
    let remainder = a.wrapping_rem(b);
    if remainder != 0 && (remainder < 0) != (b < 0) {
        Ok(remainder + b)
    } else {
        Ok(remainder)
    }
}

fn float_floor_div(a: f64, b: f64) -> Result<f64, EvalError> {
    if b == 0.0 {
        return Err(division_by_zero());
    }
    Ok((a / b).floor())
}

fn float_mod(a: f64, b: f64) -> Result<f64, EvalError> {
    if b == 0.0 {
        return Err(division_by_zero());
    }
    // Remainder with the divisor's sign, consistent with floor division.
    Ok(a - b * (a / b).floor())
}

fn int_pow(base: i64, exp: i64) -> Result<Value, EvalError> {
    if exp < 0 {
        // Negative exponents leave the integers.
        return Ok(Value::Float((base as f64).powf(exp as f64)));
    }
    let exp = u32::try_from(exp).map_err(|_| integer_overflow("**"))?;
    base.checked_pow(exp)
        .map(Value::Int)
        .ok_or_else(|| integer_overflow("**"))
}

fn eval_numeric(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Option<Value>, EvalError> {
    // Both operands must be numeric (bool counts as 0/1).
    let (Some(lnum), Some(rnum)) = (lhs.as_number(), rhs.as_number()) else {
        return Ok(None);
    };

    if op.is_comparison() {
        let result = match op {
            BinaryOp::Eq => lnum == rnum,
            BinaryOp::NotEq => lnum != rnum,
            BinaryOp::Lt => lnum < rnum,
            BinaryOp::LtE => lnum <= rnum,
            BinaryOp::Gt => lnum > rnum,
            BinaryOp::GtE => lnum >= rnum,
            _ => unreachable!("is_comparison covers exactly these"),
        };
        return Ok(Some(Value::Bool(result)));
    }

    // Integer path: both operands have exact integer views and the
    // operator stays in the integers.
    if let (Some(a), Some(b)) = (lhs.as_int(), rhs.as_int()) {
        let value = match op {
            BinaryOp::Add => Value::Int(a.checked_add(b).ok_or_else(|| integer_overflow("+"))?),
            BinaryOp::Sub => Value::Int(a.checked_sub(b).ok_or_else(|| integer_overflow("-"))?),
            BinaryOp::Mul => Value::Int(a.checked_mul(b).ok_or_else(|| integer_overflow("*"))?),
            // True division always yields a float.
            BinaryOp::Div => {
                if b == 0 {
                    return Err(division_by_zero());
                }
                Value::Float(a as f64 / b as f64)
            }
            BinaryOp::FloorDiv => Value::Int(int_floor_div(a, b)?),
            BinaryOp::Mod => Value::Int(int_mod(a, b)?),
            BinaryOp::Pow => int_pow(a, b)?,
            BinaryOp::In | BinaryOp::NotIn => {
                return Err(unsupported_operand(op, lhs.kind_name(), rhs.kind_name()));
            }
            _ => return Ok(None),
        };
        return Ok(Some(value));
    }

    let value = match op {
        BinaryOp::Add => Value::Float(lnum + rnum),
        BinaryOp::Sub => Value::Float(lnum - rnum),
        BinaryOp::Mul => Value::Float(lnum * rnum),
        BinaryOp::Div => {
            if rnum == 0.0 {
                return Err(division_by_zero());
            }
            Value::Float(lnum / rnum)
        }
        BinaryOp::FloorDiv => Value::Float(float_floor_div(lnum, rnum)?),
        BinaryOp::Mod => Value::Float(float_mod(lnum, rnum)?),
        BinaryOp::Pow => Value::Float(lnum.powf(rnum)),
        BinaryOp::In | BinaryOp::NotIn => {
            return Err(unsupported_operand(op, lhs.kind_name(), rhs.kind_name()));
        }
        _ => return Ok(None),
    };
    Ok(Some(value))
}

fn eval_str(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Option<Value>, EvalError> {
    match (lhs, rhs, op) {
        (Value::Str(a), Value::Str(b), _) => {
            let value = match op {
                BinaryOp::Add => Value::str(format!("{a}{b}")),
                BinaryOp::Eq => Value::Bool(a == b),
                BinaryOp::NotEq => Value::Bool(a != b),
                BinaryOp::Lt => Value::Bool(a < b),
                BinaryOp::LtE => Value::Bool(a <= b),
                BinaryOp::Gt => Value::Bool(a > b),
                BinaryOp::GtE => Value::Bool(a >= b),
                BinaryOp::In => Value::Bool(b.contains(a.as_ref())),
                BinaryOp::NotIn => Value::Bool(!b.contains(a.as_ref())),
                _ => return Err(unsupported_operand(op, lhs.kind_name(), rhs.kind_name())),
            };
            Ok(Some(value))
        }
        // String repetition: 'ab' * 3, 3 * 'ab'.
        (Value::Str(s), other, BinaryOp::Mul) | (other, Value::Str(s), BinaryOp::Mul) => {
            match other.as_int() {
                Some(n) => Ok(Some(Value::str(s.repeat(usize::try_from(n).unwrap_or(0))))),
                None => Err(unsupported_operand(op, lhs.kind_name(), rhs.kind_name())),
            }
        }
        _ => Ok(None),
    }
}

fn eval_list(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Option<Value>, EvalError> {
    match (lhs, rhs, op) {
        (Value::List(a), Value::List(b), BinaryOp::Add) => {
            let mut items = a.borrow().clone();
            items.extend(b.borrow().iter().cloned());
            Ok(Some(Value::list(items)))
        }
        (Value::List(items), other, BinaryOp::Mul) | (other, Value::List(items), BinaryOp::Mul) => {
            match other.as_int() {
                Some(n) => {
                    let items = items.borrow();
                    let count = usize::try_from(n).unwrap_or(0);
                    let mut repeated = Vec::with_capacity(items.len() * count);
                    for _ in 0..count {
                        repeated.extend(items.iter().cloned());
                    }
                    Ok(Some(Value::list(repeated)))
                }
                None => Err(unsupported_operand(op, lhs.kind_name(), rhs.kind_name())),
            }
        }
        (needle, Value::List(items), BinaryOp::In | BinaryOp::NotIn) => {
            let found = items
                .borrow()
                .iter()
                .any(|item| needle.structural_eq(item) == Some(true));
            Ok(Some(Value::Bool(if op == BinaryOp::In {
                found
            } else {
                !found
            })))
        }
        _ => Ok(None),
    }
}

fn eval_dict(op: BinaryOp, lhs: &Value, rhs: &Value) -> Option<Value> {
    use crate::value::DictKey;

    match (lhs, rhs, op) {
        (needle, Value::Dict(dict), BinaryOp::In | BinaryOp::NotIn) => {
            let found = DictKey::from_value(needle)
                .is_some_and(|key| dict.borrow().contains_key(&key));
            Some(Value::Bool(if op == BinaryOp::In { found } else { !found }))
        }
        _ => None,
    }
}
