//! The builtin type registry.
//!
//! Every builtin type is a pre-registered [`ClassObject`] whose
//! members are native dunder methods. A native primitive can be
//! *boxed* into an instance of its builtin class (the payload slot
//! holds the native value); dunder dispatch then works identically
//! for boxed builtins and user-class instances, which is how both
//! share one dispatch path.

mod convert;
pub mod exceptions;
mod functions;
pub(crate) mod protocols;
mod methods;

use kea_ir::StringInterner;

pub use exceptions::ExceptionTypes;

use crate::environment::Environment;
use crate::errors::{type_mismatch, EvalError};
use crate::value::{
    ClassObject, ClassRef, InstanceObject, NativeFn, NativeFunction, Payload, Shared, Value,
};

/// The native payload behind a value: boxed instances yield their
/// payload, everything else yields itself.
pub fn native_view(value: &Value) -> Value {
    if let Value::Instance(instance) = value {
        if let Payload::Native(inner) = &instance.borrow().payload {
            return inner.clone();
        }
    }
    value.clone()
}

/// Pre-registered classes for the builtin types.
#[derive(Debug)]
pub struct TypeRegistry {
    pub int_class: ClassRef,
    pub float_class: ClassRef,
    pub bool_class: ClassRef,
    pub str_class: ClassRef,
    pub list_class: ClassRef,
    pub dict_class: ClassRef,
    pub none_class: ClassRef,
    pub range_class: ClassRef,
    /// Cursor class behind `__iter__` on the sequence types.
    pub iterator_class: ClassRef,
    pub range_iterator_class: ClassRef,
    pub exceptions: ExceptionTypes,
}

/// Dunder methods shared by the numeric classes.
const NUMERIC_METHODS: &[(&str, NativeFn)] = &[
    ("__add__", protocols::nf_add),
    ("__sub__", protocols::nf_sub),
    ("__mul__", protocols::nf_mul),
    ("__truediv__", protocols::nf_truediv),
    ("__floordiv__", protocols::nf_floordiv),
    ("__mod__", protocols::nf_mod),
    ("__pow__", protocols::nf_pow),
    ("__eq__", protocols::nf_eq),
    ("__ne__", protocols::nf_ne),
    ("__lt__", protocols::nf_lt),
    ("__le__", protocols::nf_le),
    ("__gt__", protocols::nf_gt),
    ("__ge__", protocols::nf_ge),
    ("__neg__", protocols::nf_neg),
    ("__abs__", protocols::nf_abs),
    ("__bool__", protocols::nf_bool),
    ("__str__", protocols::nf_str),
];

const STR_METHODS: &[(&str, NativeFn)] = &[
    ("__new__", convert::nf_str_new),
    ("__add__", protocols::nf_add),
    ("__mul__", protocols::nf_mul),
    ("__eq__", protocols::nf_eq),
    ("__ne__", protocols::nf_ne),
    ("__lt__", protocols::nf_lt),
    ("__le__", protocols::nf_le),
    ("__gt__", protocols::nf_gt),
    ("__ge__", protocols::nf_ge),
    ("__contains__", protocols::nf_contains),
    ("__len__", protocols::nf_len),
    ("__getitem__", protocols::nf_getitem),
    ("__iter__", protocols::nf_iter),
    ("__bool__", protocols::nf_bool),
    ("__str__", protocols::nf_str),
    ("upper", methods::nf_str_upper),
    ("lower", methods::nf_str_lower),
    ("strip", methods::nf_str_strip),
];

const LIST_METHODS: &[(&str, NativeFn)] = &[
    ("__new__", convert::nf_list_new),
    ("__add__", protocols::nf_add),
    ("__mul__", protocols::nf_mul),
    ("__eq__", protocols::nf_eq),
    ("__ne__", protocols::nf_ne),
    ("__contains__", protocols::nf_contains),
    ("__len__", protocols::nf_len),
    ("__getitem__", protocols::nf_getitem),
    ("__setitem__", protocols::nf_setitem),
    ("__delitem__", protocols::nf_delitem),
    ("__iter__", protocols::nf_iter),
    ("__bool__", protocols::nf_bool),
    ("__str__", protocols::nf_str),
    ("append", methods::nf_list_append),
    ("pop", methods::nf_list_pop),
];

const DICT_METHODS: &[(&str, NativeFn)] = &[
    ("__new__", convert::nf_dict_new),
    ("__eq__", protocols::nf_eq),
    ("__ne__", protocols::nf_ne),
    ("__contains__", protocols::nf_contains),
    ("__len__", protocols::nf_len),
    ("__getitem__", protocols::nf_getitem),
    ("__setitem__", protocols::nf_setitem),
    ("__delitem__", protocols::nf_delitem),
    ("__iter__", protocols::nf_iter),
    ("__bool__", protocols::nf_bool),
    ("__str__", protocols::nf_str),
    ("get", methods::nf_dict_get),
    ("keys", methods::nf_dict_keys),
    ("values", methods::nf_dict_values),
    ("items", methods::nf_dict_items),
];

const NONE_METHODS: &[(&str, NativeFn)] = &[
    ("__eq__", protocols::nf_eq),
    ("__ne__", protocols::nf_ne),
    ("__bool__", protocols::nf_bool),
    ("__str__", protocols::nf_str),
];

const RANGE_METHODS: &[(&str, NativeFn)] = &[
    ("__new__", convert::nf_range_new),
    ("__iter__", protocols::nf_iter),
    ("__len__", protocols::nf_len),
];

const ITERATOR_METHODS: &[(&str, NativeFn)] = &[
    ("__iter__", protocols::nf_iter_self),
    ("__next__", protocols::nf_next),
];

/// Module-scope builtin functions.
const BUILTIN_FUNCTIONS: &[(&str, NativeFn)] = &[
    ("print", functions::nf_print),
    ("len", functions::nf_len),
    ("abs", functions::nf_abs),
    ("repr", convert::nf_repr),
    ("isinstance", functions::nf_isinstance),
    ("issubclass", functions::nf_issubclass),
    ("iter", functions::nf_iter),
    ("next", functions::nf_next),
    ("super", functions::nf_super),
];

fn builtin_class(
    interner: &StringInterner,
    name: &str,
    methods: &[(&'static str, NativeFn)],
) -> ClassRef {
    let class = Shared::new(ClassObject::new(interner.intern(name), vec![]));
    {
        let mut class = class.borrow_mut();
        for &(method_name, func) in methods {
            class.members.insert(
                interner.intern(method_name),
                Value::NativeFunction(NativeFunction::new(method_name, func)),
            );
        }
    }
    class
}

impl TypeRegistry {
    pub fn new(interner: &StringInterner) -> Self {
        let mut int_methods: Vec<(&str, NativeFn)> = vec![("__new__", convert::nf_int_new)];
        int_methods.extend_from_slice(NUMERIC_METHODS);
        let mut float_methods: Vec<(&str, NativeFn)> = vec![("__new__", convert::nf_float_new)];
        float_methods.extend_from_slice(NUMERIC_METHODS);
        let mut bool_methods: Vec<(&str, NativeFn)> = vec![("__new__", convert::nf_bool_new)];
        bool_methods.extend_from_slice(NUMERIC_METHODS);

        TypeRegistry {
            int_class: builtin_class(interner, "int", &int_methods),
            float_class: builtin_class(interner, "float", &float_methods),
            bool_class: builtin_class(interner, "bool", &bool_methods),
            str_class: builtin_class(interner, "str", STR_METHODS),
            list_class: builtin_class(interner, "list", LIST_METHODS),
            dict_class: builtin_class(interner, "dict", DICT_METHODS),
            none_class: builtin_class(interner, "NoneType", NONE_METHODS),
            range_class: builtin_class(interner, "range", RANGE_METHODS),
            iterator_class: builtin_class(interner, "iterator", ITERATOR_METHODS),
            range_iterator_class: builtin_class(interner, "range_iterator", ITERATOR_METHODS),
            exceptions: ExceptionTypes::new(interner),
        }
    }

    /// The builtin class behind a value, when it has one.
    ///
    /// Callables and `super` proxies have no class-backed dispatch;
    /// operator and attribute resolution on them fails with the
    /// caller's error.
    pub fn class_of(&self, value: &Value) -> Option<ClassRef> {
        match value {
            Value::None => Some(self.none_class.clone()),
            Value::Bool(_) => Some(self.bool_class.clone()),
            Value::Int(_) => Some(self.int_class.clone()),
            Value::Float(_) => Some(self.float_class.clone()),
            Value::Str(_) => Some(self.str_class.clone()),
            Value::List(_) => Some(self.list_class.clone()),
            Value::Dict(_) => Some(self.dict_class.clone()),
            Value::Instance(instance) => Some(instance.borrow().class.clone()),
            Value::Function(_)
            | Value::NativeFunction(_)
            | Value::BoundMethod(_)
            | Value::Class(_)
            | Value::Super(_) => None,
        }
    }

    /// Box a native primitive into an instance of its builtin class,
    /// the payload slot holding the native value.
    pub fn box_value(&self, value: Value) -> Result<Value, EvalError> {
        if matches!(value, Value::Instance(_)) {
            // Already an object; boxing is only defined on natives.
            return Ok(value);
        }
        let class = self
            .class_of(&value)
            .ok_or_else(|| type_mismatch("boxable value", value.kind_name()))?;
        Ok(Value::instance(InstanceObject::with_payload(
            class,
            Payload::Native(value),
        )))
    }

    /// Recover the native payload of a boxed value.
    ///
    /// Accepts the native form directly; fails with a `TypeError` when
    /// the value's class does not match the expected builtin class.
    pub fn unbox(&self, value: &Value, expected: &ClassRef) -> Result<Value, EvalError> {
        let matches_class = self
            .class_of(value)
            .is_some_and(|class| class.ptr_eq(expected));
        if !matches_class {
            return Err(type_mismatch(
                "boxed builtin of the expected type",
                value.kind_name(),
            ));
        }
        Ok(native_view(value))
    }
}

/// Seed the module scope with the builtin classes and functions.
pub(crate) fn install_builtins(
    env: &mut Environment,
    interner: &StringInterner,
    registry: &TypeRegistry,
) {
    let module = env.module();
    let mut module = module.borrow_mut();

    for class in [
        &registry.int_class,
        &registry.float_class,
        &registry.bool_class,
        &registry.str_class,
        &registry.list_class,
        &registry.dict_class,
        &registry.range_class,
    ] {
        let name = class.borrow().name;
        module.define(name, Value::Class(class.clone()));
    }
    for class in registry.exceptions.all() {
        let name = class.borrow().name;
        module.define(name, Value::Class(class));
    }
    for &(name, func) in BUILTIN_FUNCTIONS {
        module.define(
            interner.intern(name),
            Value::NativeFunction(NativeFunction::new(name, func)),
        );
    }
}
