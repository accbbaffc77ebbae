use kea_ir::StringInterner;
use pretty_assertions::assert_eq;

use super::*;

#[test]
fn native_truthiness_follows_emptiness() {
    assert_eq!(Value::None.native_truthy(), Some(false));
    assert_eq!(Value::Int(0).native_truthy(), Some(false));
    assert_eq!(Value::Int(-1).native_truthy(), Some(true));
    assert_eq!(Value::Float(0.0).native_truthy(), Some(false));
    assert_eq!(Value::str("").native_truthy(), Some(false));
    assert_eq!(Value::str("x").native_truthy(), Some(true));
    assert_eq!(Value::list(vec![]).native_truthy(), Some(false));
    assert_eq!(
        Value::list(vec![Value::Int(1)]).native_truthy(),
        Some(true)
    );
    assert_eq!(Value::dict(DictValue::new()).native_truthy(), Some(false));
}

#[test]
fn instance_truthiness_needs_dispatch() {
    let interner = StringInterner::new();
    let class = Shared::new(ClassObject::new(interner.intern("C"), vec![]));
    let value = Value::instance(InstanceObject::new(class));
    assert_eq!(value.native_truthy(), None);
}

#[test]
fn numbers_compare_across_int_and_float() {
    assert_eq!(Value::Int(1).structural_eq(&Value::Float(1.0)), Some(true));
    assert_eq!(Value::Bool(true).structural_eq(&Value::Int(1)), Some(true));
    assert_eq!(Value::Int(1).structural_eq(&Value::Int(2)), Some(false));
}

#[test]
fn sequences_compare_structurally() {
    let a = Value::list(vec![Value::Int(1), Value::str("x")]);
    let b = Value::list(vec![Value::Int(1), Value::str("x")]);
    let c = Value::list(vec![Value::Int(1)]);
    assert_eq!(a.structural_eq(&b), Some(true));
    assert_eq!(a.structural_eq(&c), Some(false));
}

#[test]
fn mappings_compare_structurally_independent_of_order() {
    let mut left = DictValue::new();
    left.insert(DictKey::Str("a".into()), Value::Int(1));
    left.insert(DictKey::Str("b".into()), Value::Int(2));

    let mut right = DictValue::new();
    right.insert(DictKey::Str("b".into()), Value::Int(2));
    right.insert(DictKey::Str("a".into()), Value::Int(1));

    assert_eq!(
        Value::dict(left).structural_eq(&Value::dict(right)),
        Some(true)
    );
}

#[test]
fn instances_refuse_structural_equality() {
    let interner = StringInterner::new();
    let class = Shared::new(ClassObject::new(interner.intern("C"), vec![]));
    let a = Value::instance(InstanceObject::new(class.clone()));
    let b = Value::instance(InstanceObject::new(class));
    // Equality on plain instances is the dispatcher's problem; no
    // silent fall back to identity.
    assert_eq!(a.structural_eq(&b), None);
    assert_eq!(a.structural_eq(&Value::Int(1)), None);
}

#[test]
fn mixed_kinds_are_unequal_not_errors() {
    assert_eq!(Value::Int(1).structural_eq(&Value::str("1")), Some(false));
    assert_eq!(Value::None.structural_eq(&Value::Int(0)), Some(false));
}

#[test]
fn lists_alias_through_shared_handles() {
    let a = Value::list(vec![Value::Int(1)]);
    let b = a.clone();
    if let (Value::List(left), Value::List(right)) = (&a, &b) {
        left.borrow_mut().push(Value::Int(2));
        assert_eq!(right.borrow().len(), 2);
    }
}
