//! Callable values: user functions, native functions, bound methods.

use std::fmt;

use kea_ir::{InstrId, Name, Param, ParamKind, SharedTree};

use crate::environment::Scope;
use crate::errors::EvalResult;
use crate::interpreter::Interpreter;
use crate::value::class::ClassRef;
use crate::value::heap::Shared;
use crate::value::Value;

/// A user-defined function or method.
///
/// The defining scope chain is captured **by reference** at definition
/// time: a nested function reads the current value of a captured outer
/// variable at call time, and `nonlocal` writes through the same cell,
/// so later mutations in the defining scope stay visible.
#[derive(Clone)]
pub struct FunctionValue {
    pub name: Name,
    /// Declared parameters in order, including any `*args`/`**kwargs`
    /// collectors.
    pub params: Vec<Param>,
    /// Body instructions, ids into `tree`.
    pub body: Vec<InstrId>,
    /// The instruction tree the body ids index into. A callee is
    /// always evaluated against the tree it was defined in.
    pub tree: SharedTree,
    /// Defining scope chain, captured by reference.
    pub defining_scope: Shared<Scope>,
    /// Class the method was defined in, so `super()` resolves against
    /// the defining class's bases rather than the receiver's class.
    pub defining_class: Option<ClassRef>,
}

impl FunctionValue {
    /// Number of parameters that must be supplied (no default, not a
    /// collector).
    pub fn required_param_count(&self) -> usize {
        self.params
            .iter()
            .filter(|p| p.kind == ParamKind::Normal && p.default.is_none())
            .count()
    }

    /// A copy of this function re-homed to `class`, used when a class
    /// body turns its function definitions into methods.
    pub fn with_defining_class(&self, class: ClassRef) -> Self {
        let mut func = self.clone();
        func.defining_class = Some(class);
        func
    }
}

impl fmt::Debug for FunctionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionValue")
            .field("name", &self.name)
            .field("params", &self.params.len())
            .field("body", &self.body.len())
            .finish_non_exhaustive()
    }
}

/// Signature of a native (engine-provided) function.
///
/// Natives receive the interpreter so they can dispatch dunder calls
/// and reach the type registry; method natives receive the receiver
/// as their first argument.
pub type NativeFn = for<'a, 'b> fn(&'a mut Interpreter, &'b [Value]) -> EvalResult;

/// A built-in function or method implemented in the host.
#[derive(Clone, Copy)]
pub struct NativeFunction {
    pub name: &'static str,
    pub func: NativeFn,
}

impl NativeFunction {
    pub const fn new(name: &'static str, func: NativeFn) -> Self {
        NativeFunction { name, func }
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeFunction({})", self.name)
    }
}

impl PartialEq for NativeFunction {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && std::ptr::fn_addr_eq(self.func, other.func)
    }
}

/// A method bound to its receiver at attribute-access time.
///
/// Carries the receiver so a later call can supply `self` without the
/// call site knowing where the callable came from.
#[derive(Clone, Debug)]
pub struct BoundMethod {
    pub receiver: Value,
    /// The underlying callable: a `Function` or `NativeFunction` value.
    pub callable: Value,
}

/// The result of `super()`: attribute lookups resolve against the
/// defining class's superclass chain, bound to the original receiver.
#[derive(Clone, Debug)]
pub struct SuperBinding {
    pub receiver: Value,
    /// The class whose *bases* attribute lookup starts from — the
    /// class the executing method was defined in, not the receiver's
    /// runtime class.
    pub class: ClassRef,
}
