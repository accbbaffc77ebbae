use kea_ir::StringInterner;
use pretty_assertions::assert_eq;

use super::*;
use crate::value::Value;

#[test]
fn lookup_walks_the_chain() {
    let interner = StringInterner::new();
    let x = interner.intern("x");

    let mut env = Environment::new();
    env.define(x, Value::Int(1));
    env.push_scope(ScopeKind::Function);
    assert_eq!(env.lookup(x), Some(Value::Int(1)));
    env.pop_scope();
}

#[test]
fn define_shadows_outer_binding() {
    let interner = StringInterner::new();
    let x = interner.intern("x");

    let mut env = Environment::new();
    env.define(x, Value::Int(1));
    env.push_scope(ScopeKind::Function);
    env.define(x, Value::Int(2));
    assert_eq!(env.lookup(x), Some(Value::Int(2)));
    env.pop_scope();
    assert_eq!(env.lookup(x), Some(Value::Int(1)));
}

#[test]
fn bind_in_function_scope_does_not_touch_outer() {
    let interner = StringInterner::new();
    let x = interner.intern("x");

    let mut env = Environment::new();
    env.define(x, Value::Int(5));
    env.push_scope(ScopeKind::Function);
    env.bind(x, Value::Int(6)).unwrap();
    assert_eq!(env.lookup(x), Some(Value::Int(6)));
    env.pop_scope();
    // Assignment created a local; the module binding is unchanged.
    assert_eq!(env.lookup(x), Some(Value::Int(5)));
}

#[test]
fn bind_updates_frame_binding_through_block_scopes() {
    let interner = StringInterner::new();
    let total = interner.intern("total");

    let mut env = Environment::new();
    env.push_scope(ScopeKind::Function);
    env.bind(total, Value::Int(0)).unwrap();
    // A loop-iteration scope writes through to the function binding.
    env.push_scope(ScopeKind::Block);
    env.bind(total, Value::Int(10)).unwrap();
    env.pop_scope();
    assert_eq!(env.lookup(total), Some(Value::Int(10)));
}

#[test]
fn global_declaration_redirects_binds_to_module_scope() {
    let interner = StringInterner::new();
    let x = interner.intern("x");

    let mut env = Environment::new();
    env.define(x, Value::Int(1));
    env.push_scope(ScopeKind::Function);
    env.declare_global(x);
    env.bind(x, Value::Int(2)).unwrap();
    env.pop_scope();
    assert_eq!(env.lookup(x), Some(Value::Int(2)));
}

#[test]
fn nonlocal_declaration_binds_enclosing_function_scope() {
    let interner = StringInterner::new();
    let x = interner.intern("x");

    let mut env = Environment::new();
    env.push_scope(ScopeKind::Function);
    env.bind(x, Value::Int(1)).unwrap();

    // Nested function scope over the same chain.
    env.push_scope(ScopeKind::Function);
    env.declare_nonlocal(x).unwrap();
    env.bind(x, Value::Int(2)).unwrap();
    env.pop_scope();

    assert_eq!(env.lookup(x), Some(Value::Int(2)));
}

#[test]
fn nonlocal_without_target_is_an_error() {
    let interner = StringInterner::new();
    let x = interner.intern("x");

    let mut env = Environment::new();
    env.define(x, Value::Int(1));
    env.push_scope(ScopeKind::Function);
    // Module bindings are not valid nonlocal targets.
    assert_eq!(env.declare_nonlocal(x), Err(NoNonlocalBinding(x)));
}

#[test]
fn nonlocal_skips_class_scopes() {
    let interner = StringInterner::new();
    let x = interner.intern("x");

    let mut env = Environment::new();
    env.push_scope(ScopeKind::Function);
    env.bind(x, Value::Int(1)).unwrap();
    env.push_scope(ScopeKind::Class);
    // The class scope binds x too; nonlocal must skip it and reach
    // the function binding.
    env.define(x, Value::Int(99));
    env.push_scope(ScopeKind::Function);
    env.declare_nonlocal(x).unwrap();
    env.bind(x, Value::Int(2)).unwrap();
    env.pop_scope();
    env.pop_scope();
    assert_eq!(env.lookup(x), Some(Value::Int(2)));
}

#[test]
fn class_scope_writes_stay_in_the_class_scope() {
    let interner = StringInterner::new();
    let x = interner.intern("x");

    let mut env = Environment::new();
    env.define(x, Value::Int(1));
    env.push_scope(ScopeKind::Class);
    // Reads see the outer binding...
    assert_eq!(env.lookup(x), Some(Value::Int(1)));
    // ...but a write creates a class member instead of updating it.
    env.bind(x, Value::Int(2)).unwrap();
    assert_eq!(env.current().borrow().get_local(x), Some(Value::Int(2)));
    env.pop_scope();
    assert_eq!(env.lookup(x), Some(Value::Int(1)));
}

#[test]
fn captured_scope_sees_later_mutations() {
    let interner = StringInterner::new();
    let a = interner.intern("a");

    let mut env = Environment::new();
    env.push_scope(ScopeKind::Function);
    env.bind(a, Value::Int(1)).unwrap();
    let captured = env.capture_defining_scope();

    env.bind(a, Value::Int(2)).unwrap();
    // A function called later resolves through the captured chain and
    // observes the mutation, not a snapshot.
    assert_eq!(captured.borrow().lookup(a), Some(Value::Int(2)));
}

#[test]
fn capture_skips_class_scopes() {
    let mut env = Environment::new();
    env.push_scope(ScopeKind::Class);
    let captured = env.capture_defining_scope();
    assert_eq!(captured.borrow().kind, ScopeKind::Module);
}

#[test]
fn unbind_removes_the_frame_binding() {
    let interner = StringInterner::new();
    let x = interner.intern("x");

    let mut env = Environment::new();
    env.define(x, Value::Int(1));
    assert!(env.unbind(x));
    assert!(!env.unbind(x));
    assert_eq!(env.lookup(x), None);
}

#[test]
fn module_scope_is_never_popped() {
    let interner = StringInterner::new();
    let x = interner.intern("x");

    let mut env = Environment::new();
    env.define(x, Value::Int(1));
    env.pop_scope();
    assert_eq!(env.depth(), 1);
    assert_eq!(env.lookup(x), Some(Value::Int(1)));
}
