//! Runtime values for the Kea interpreter.
//!
//! `Value` is a closed sum type: every runtime value is one of these
//! variants, matched exhaustively. Built-in primitives stay in their
//! native form on the fast path; the type registry can *box* them into
//! an instance of the matching builtin class (`Payload::Native`), and
//! every builtin class carries native dunder methods, so built-ins and
//! user classes share one dispatch mechanism.
//!
//! Heap-backed variants (`List`, `Dict`, `Instance`, `Class`) have
//! reference semantics through [`Shared`]: cloning a `Value` clones
//! the handle, and two bindings can alias one object.

pub mod class;
pub mod dict;
mod function;
mod heap;
pub mod repr;

use std::rc::Rc;

pub use class::{ClassObject, ClassRef, InstanceObject, InstanceRef, MemberMap, Payload};
pub use dict::{DictKey, DictValue};
pub use function::{BoundMethod, FunctionValue, NativeFn, NativeFunction, SuperBinding};
pub use heap::Shared;

/// A runtime value.
#[derive(Clone, Debug)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    List(Shared<Vec<Value>>),
    Dict(Shared<DictValue>),
    Function(Rc<FunctionValue>),
    NativeFunction(NativeFunction),
    BoundMethod(Rc<BoundMethod>),
    Class(ClassRef),
    Instance(InstanceRef),
    Super(Rc<SuperBinding>),
}

impl Value {
    /// Create a string value.
    pub fn str(s: impl Into<Rc<str>>) -> Self {
        Value::Str(s.into())
    }

    /// Create a list value.
    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Shared::new(items))
    }

    /// Create a dict value.
    pub fn dict(dict: DictValue) -> Self {
        Value::Dict(Shared::new(dict))
    }

    /// Create a function value.
    pub fn function(func: FunctionValue) -> Self {
        Value::Function(Rc::new(func))
    }

    /// Create a bound method value.
    pub fn bound_method(method: BoundMethod) -> Self {
        Value::BoundMethod(Rc::new(method))
    }

    /// Create an instance value.
    pub fn instance(instance: InstanceObject) -> Self {
        Value::Instance(Shared::new(instance))
    }

    /// The value's kind name, used in error messages for natives.
    ///
    /// Instances report their class name through the interpreter,
    /// which has the interner; this is the fallback vocabulary.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Dict(_) => "dict",
            Value::Function(_) => "function",
            Value::NativeFunction(_) => "builtin_function_or_method",
            Value::BoundMethod(_) => "method",
            Value::Class(_) => "type",
            Value::Instance(_) => "instance",
            Value::Super(_) => "super",
        }
    }

    /// Truthiness for values that do not need dunder dispatch.
    ///
    /// Returns `None` for instances, whose truthiness may be defined
    /// by `__bool__`/`__len__` and is resolved by the interpreter.
    pub fn native_truthy(&self) -> Option<bool> {
        match self {
            Value::None => Some(false),
            Value::Bool(b) => Some(*b),
            Value::Int(i) => Some(*i != 0),
            Value::Float(f) => Some(*f != 0.0),
            Value::Str(s) => Some(!s.is_empty()),
            Value::List(items) => Some(!items.borrow().is_empty()),
            Value::Dict(dict) => Some(!dict.borrow().is_empty()),
            Value::Instance(_) => None,
            Value::Function(_)
            | Value::NativeFunction(_)
            | Value::BoundMethod(_)
            | Value::Class(_)
            | Value::Super(_) => Some(true),
        }
    }

    /// Numeric view of the value, when it has one.
    ///
    /// Booleans count as 0/1, matching the language's arithmetic.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Bool(b) => Some(f64::from(i32::from(*b))),
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Integer view of the value, when it has an exact one.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Bool(b) => Some(i64::from(*b)),
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Structural equality.
    ///
    /// Returns `None` when equality requires dunder dispatch (any
    /// instance operand): the operator layer either calls `__eq__` or
    /// raises an unsupported-operand error — never identity.
    pub fn structural_eq(&self, other: &Value) -> Option<bool> {
        match (self, other) {
            (Value::Instance(_), _) | (_, Value::Instance(_)) => None,
            (Value::None, Value::None) => Some(true),
            (Value::Str(a), Value::Str(b)) => Some(a == b),
            (Value::List(a), Value::List(b)) => {
                if a.ptr_eq(b) {
                    return Some(true);
                }
                let a = a.borrow();
                let b = b.borrow();
                if a.len() != b.len() {
                    return Some(false);
                }
                for (x, y) in a.iter().zip(b.iter()) {
                    match x.structural_eq(y) {
                        Some(true) => {}
                        other => return other,
                    }
                }
                Some(true)
            }
            (Value::Dict(a), Value::Dict(b)) => {
                if a.ptr_eq(b) {
                    return Some(true);
                }
                let a = a.borrow();
                let b = b.borrow();
                if a.len() != b.len() {
                    return Some(false);
                }
                for (key, x) in a.iter() {
                    match b.get(key) {
                        Some(y) => match x.structural_eq(y) {
                            Some(true) => {}
                            other => return other,
                        },
                        None => return Some(false),
                    }
                }
                Some(true)
            }
            (Value::Function(a), Value::Function(b)) => Some(Rc::ptr_eq(a, b)),
            (Value::NativeFunction(a), Value::NativeFunction(b)) => Some(a == b),
            (Value::Class(a), Value::Class(b)) => Some(a.ptr_eq(b)),
            _ => match (self.as_number(), other.as_number()) {
                // Numeric values compare across int/float/bool.
                (Some(a), Some(b)) => Some(a == b),
                // Remaining mixed kinds are simply unequal.
                _ => Some(false),
            },
        }
    }
}

/// Rust-level equality, for tests and assertions.
///
/// Heap values compare structurally; callables and classes by
/// identity. This is *not* the language's `==`, which goes through
/// `structural_eq`/dunder dispatch and can raise.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Instance(a), Value::Instance(b)) => a.ptr_eq(b),
            (Value::BoundMethod(a), Value::BoundMethod(b)) => Rc::ptr_eq(a, b),
            (Value::Super(a), Value::Super(b)) => Rc::ptr_eq(a, b),
            // Int/Float stay distinct here (unlike the language's ==).
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::None, Value::None) => true,
            _ => self.structural_eq(other) == Some(true) && self.kind_name() == other.kind_name(),
        }
    }
}

#[cfg(test)]
mod tests;
