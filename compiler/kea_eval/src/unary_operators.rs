//! Unary operator evaluation: native fast paths.
//!
//! As with binary operators, `Ok(None)` means the operand needs
//! dunder dispatch (`__neg__`, `__bool__`/`__len__`), which the
//! interpreter owns.

use kea_ir::UnaryOp;

use crate::errors::{integer_overflow, EvalError};
use crate::value::Value;

/// Evaluate a unary operator natively.
pub fn evaluate_unary(op: UnaryOp, operand: &Value) -> Result<Option<Value>, EvalError> {
    match op {
        UnaryOp::Neg => match operand {
            Value::Int(i) => i
                .checked_neg()
                .map(|n| Some(Value::Int(n)))
                .ok_or_else(|| integer_overflow("-")),
            Value::Bool(b) => Ok(Some(Value::Int(-i64::from(*b)))),
            Value::Float(f) => Ok(Some(Value::Float(-f))),
            _ => Ok(None),
        },
        UnaryOp::Not => Ok(operand.native_truthy().map(|t| Value::Bool(!t))),
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn negation_of_numbers() {
        assert_eq!(
            evaluate_unary(UnaryOp::Neg, &Value::Int(3)).unwrap(),
            Some(Value::Int(-3))
        );
        assert_eq!(
            evaluate_unary(UnaryOp::Neg, &Value::Float(1.5)).unwrap(),
            Some(Value::Float(-1.5))
        );
        assert_eq!(
            evaluate_unary(UnaryOp::Neg, &Value::Bool(true)).unwrap(),
            Some(Value::Int(-1))
        );
    }

    #[test]
    fn not_follows_truthiness() {
        assert_eq!(
            evaluate_unary(UnaryOp::Not, &Value::Int(0)).unwrap(),
            Some(Value::Bool(true))
        );
        assert_eq!(
            evaluate_unary(UnaryOp::Not, &Value::str("x")).unwrap(),
            Some(Value::Bool(false))
        );
    }

    #[test]
    fn instances_defer_to_dunder_dispatch() {
        use kea_ir::StringInterner;

        use crate::value::{ClassObject, InstanceObject, Shared};

        let interner = StringInterner::new();
        let class = Shared::new(ClassObject::new(interner.intern("C"), vec![]));
        let instance = Value::instance(InstanceObject::new(class));
        assert_eq!(evaluate_unary(UnaryOp::Neg, &instance).unwrap(), None);
        assert_eq!(evaluate_unary(UnaryOp::Not, &instance).unwrap(), None);
    }
}
