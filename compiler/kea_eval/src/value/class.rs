//! Classes and object instances.
//!
//! Attribute resolution is depth-first over the superclass list in
//! declaration order, first match wins. This is deliberately not C3
//! linearization: multiple inheritance resolves by the simple order,
//! and diamond conflicts are settled by whichever base is declared
//! first.

use indexmap::IndexMap;
use kea_ir::Name;
use rustc_hash::FxBuildHasher;

use crate::value::function::BoundMethod;
use crate::value::heap::Shared;
use crate::value::Value;

/// Insertion-ordered member table for classes and instances.
pub type MemberMap = IndexMap<Name, Value, FxBuildHasher>;

/// Shared handle to a class object.
pub type ClassRef = Shared<ClassObject>;

/// Shared handle to an instance.
pub type InstanceRef = Shared<InstanceObject>;

/// A class definition: members plus ordered superclass list.
#[derive(Debug)]
pub struct ClassObject {
    pub name: Name,
    /// Direct superclasses in declaration order.
    pub bases: Vec<ClassRef>,
    /// Attributes and methods defined in the class body.
    pub members: MemberMap,
}

impl ClassObject {
    /// Create a class with no members.
    pub fn new(name: Name, bases: Vec<ClassRef>) -> Self {
        ClassObject {
            name,
            bases,
            members: MemberMap::default(),
        }
    }
}

/// The hidden native slot of an instance.
///
/// Boxed builtins keep their payload here rather than in the member
/// map, so user code cannot shadow or delete it; iterator classes keep
/// their cursor state here for the same reason.
#[derive(Clone, Debug, Default)]
pub enum Payload {
    /// Plain user-class instance.
    #[default]
    Empty,
    /// Native value boxed into a builtin-class instance.
    Native(Value),
    /// Cursor over a materialized sequence (list/str/dict iterators).
    Iter { items: Vec<Value>, next: usize },
    /// Lazy numeric range; `next` doubles as the cursor for the range
    /// iterator class.
    Range { next: i64, stop: i64, step: i64 },
}

/// An object instance: member map plus owning class.
#[derive(Debug)]
pub struct InstanceObject {
    pub class: ClassRef,
    pub members: MemberMap,
    pub payload: Payload,
}

impl InstanceObject {
    /// Allocate an instance with an empty member map.
    ///
    /// Does not call `__init__`; the caller invokes the constructor
    /// immediately afterward.
    pub fn new(class: ClassRef) -> Self {
        InstanceObject {
            class,
            members: MemberMap::default(),
            payload: Payload::Empty,
        }
    }

    /// Allocate an instance carrying a native payload.
    pub fn with_payload(class: ClassRef, payload: Payload) -> Self {
        InstanceObject {
            class,
            members: MemberMap::default(),
            payload,
        }
    }
}

/// Look up `name` on `class` or its superclass chain, depth-first in
/// declaration order. Returns the defining class along with the value.
pub fn lookup_on_class(class: &ClassRef, name: Name) -> Option<(ClassRef, Value)> {
    if let Some(value) = class.borrow().members.get(&name) {
        return Some((class.clone(), value.clone()));
    }
    let bases = class.borrow().bases.clone();
    for base in &bases {
        if let Some(found) = lookup_on_class(base, name) {
            return Some(found);
        }
    }
    None
}

/// Look up `name` starting at the *bases* of `class`, in declaration
/// order. This is the `super()` resolution path.
pub fn lookup_on_bases(class: &ClassRef, name: Name) -> Option<(ClassRef, Value)> {
    let bases = class.borrow().bases.clone();
    for base in &bases {
        if let Some(found) = lookup_on_class(base, name) {
            return Some(found);
        }
    }
    None
}

/// Whether `class` is `target` or transitively inherits from it.
pub fn is_subclass(class: &ClassRef, target: &ClassRef) -> bool {
    if class.ptr_eq(target) {
        return true;
    }
    let bases = class.borrow().bases.clone();
    bases.iter().any(|base| is_subclass(base, target))
}

/// Get an attribute of an instance: instance members first, then the
/// class chain. Functions found on the chain bind the receiver.
pub fn instance_get_attribute(instance: &InstanceRef, receiver: &Value, name: Name) -> Option<Value> {
    if let Some(value) = instance.borrow().members.get(&name) {
        return Some(value.clone());
    }
    let class = instance.borrow().class.clone();
    lookup_on_class(&class, name).map(|(_, value)| bind_if_callable(receiver, value))
}

/// Wrap class-chain functions into bound methods carrying `receiver`.
pub fn bind_if_callable(receiver: &Value, value: Value) -> Value {
    match value {
        Value::Function(_) | Value::NativeFunction(_) => {
            Value::bound_method(BoundMethod {
                receiver: receiver.clone(),
                callable: value,
            })
        }
        other => other,
    }
}

/// Delete an attribute, mirroring lookup order: the instance member
/// map first, then the first occurrence on the class chain. Returns
/// `false` when the attribute is absent everywhere.
pub fn instance_delete_attribute(instance: &InstanceRef, name: Name) -> bool {
    if instance
        .borrow_mut()
        .members
        .shift_remove(&name)
        .is_some()
    {
        return true;
    }
    let class = instance.borrow().class.clone();
    class_delete_attribute(&class, name)
}

/// Delete the first occurrence of `name` on the class chain.
pub fn class_delete_attribute(class: &ClassRef, name: Name) -> bool {
    if class.borrow_mut().members.shift_remove(&name).is_some() {
        return true;
    }
    let bases = class.borrow().bases.clone();
    bases.iter().any(|base| class_delete_attribute(base, name))
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests {
    use kea_ir::StringInterner;

    use super::*;

    fn class(interner: &StringInterner, name: &str, bases: Vec<ClassRef>) -> ClassRef {
        Shared::new(ClassObject::new(interner.intern(name), bases))
    }

    #[test]
    fn is_subclass_is_transitive() {
        let interner = StringInterner::new();
        let a = class(&interner, "A", vec![]);
        let b = class(&interner, "B", vec![a.clone()]);
        let c = class(&interner, "C", vec![b.clone()]);

        assert!(is_subclass(&c, &a));
        assert!(is_subclass(&c, &c));
        assert!(!is_subclass(&a, &c));
    }

    #[test]
    fn lookup_is_depth_first_in_declaration_order() {
        let interner = StringInterner::new();
        let attr = interner.intern("x");

        // D(B, C) where B(A); A and C both define x.
        // Depth-first order finds A's x through B before C's.
        let a = class(&interner, "A", vec![]);
        a.borrow_mut().members.insert(attr, Value::Int(1));
        let b = class(&interner, "B", vec![a.clone()]);
        let c = class(&interner, "C", vec![]);
        c.borrow_mut().members.insert(attr, Value::Int(2));
        let d = class(&interner, "D", vec![b.clone(), c.clone()]);

        let (found_in, value) = lookup_on_class(&d, attr).unwrap();
        assert!(found_in.ptr_eq(&a));
        assert_eq!(value, Value::Int(1));
    }

    #[test]
    fn instance_members_shadow_class_members() {
        let interner = StringInterner::new();
        let attr = interner.intern("x");

        let a = class(&interner, "A", vec![]);
        a.borrow_mut().members.insert(attr, Value::Int(1));
        let instance = Shared::new(InstanceObject::new(a));
        let receiver = Value::Instance(instance.clone());
        instance.borrow_mut().members.insert(attr, Value::Int(2));

        assert_eq!(
            instance_get_attribute(&instance, &receiver, attr),
            Some(Value::Int(2))
        );
    }

    #[test]
    fn delete_attribute_mirrors_lookup_order() {
        let interner = StringInterner::new();
        let attr = interner.intern("x");

        let a = class(&interner, "A", vec![]);
        a.borrow_mut().members.insert(attr, Value::Int(1));
        let instance = Shared::new(InstanceObject::new(a.clone()));
        instance.borrow_mut().members.insert(attr, Value::Int(2));

        // First delete removes the instance member, second the class
        // member, third finds nothing.
        assert!(instance_delete_attribute(&instance, attr));
        assert!(instance.borrow().members.is_empty());
        assert!(instance_delete_attribute(&instance, attr));
        assert!(a.borrow().members.is_empty());
        assert!(!instance_delete_attribute(&instance, attr));
    }
}
