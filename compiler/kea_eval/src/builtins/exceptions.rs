//! The builtin exception hierarchy.
//!
//! `Exception` is the root; every raisable class transitively
//! subclasses it. Interpreter-detected errors map onto these classes
//! through [`EvalErrorKind::exception_name`], so `except TypeError`
//! catches an engine-raised `TypeError` exactly like a user-raised
//! one.

use kea_ir::{Name, StringInterner};

use crate::builtins::protocols::expect_args;
use crate::errors::{EvalError, EvalResult};
use crate::interpreter::Interpreter;
use crate::value::{
    ClassObject, ClassRef, InstanceObject, NativeFunction, Shared, Value,
};

/// The builtin exception classes.
#[derive(Debug)]
pub struct ExceptionTypes {
    pub exception: ClassRef,
    pub type_error: ClassRef,
    pub name_error: ClassRef,
    pub attribute_error: ClassRef,
    pub index_error: ClassRef,
    pub key_error: ClassRef,
    pub value_error: ClassRef,
    pub zero_division_error: ClassRef,
    pub stop_iteration: ClassRef,
    pub import_error: ClassRef,
    pub recursion_error: ClassRef,
    pub overflow_error: ClassRef,
    pub runtime_error: ClassRef,
    /// Interned `message`: the member exception instances carry.
    pub message_name: Name,
}

impl ExceptionTypes {
    pub fn new(interner: &StringInterner) -> Self {
        let message_name = interner.intern("message");
        let exception = base_exception_class(interner);
        let subclass = |name: &str| -> ClassRef {
            Shared::new(ClassObject::new(
                interner.intern(name),
                vec![exception.clone()],
            ))
        };
        ExceptionTypes {
            type_error: subclass("TypeError"),
            name_error: subclass("NameError"),
            attribute_error: subclass("AttributeError"),
            index_error: subclass("IndexError"),
            key_error: subclass("KeyError"),
            value_error: subclass("ValueError"),
            zero_division_error: subclass("ZeroDivisionError"),
            stop_iteration: subclass("StopIteration"),
            import_error: subclass("ImportError"),
            recursion_error: subclass("RecursionError"),
            overflow_error: subclass("OverflowError"),
            runtime_error: subclass("RuntimeError"),
            exception,
            message_name,
        }
    }

    /// The class an interpreter-detected error raises as.
    pub fn class_for(&self, exception_name: &str) -> ClassRef {
        match exception_name {
            "TypeError" => self.type_error.clone(),
            "NameError" => self.name_error.clone(),
            "AttributeError" => self.attribute_error.clone(),
            "IndexError" => self.index_error.clone(),
            "KeyError" => self.key_error.clone(),
            "ValueError" => self.value_error.clone(),
            "ZeroDivisionError" => self.zero_division_error.clone(),
            "StopIteration" => self.stop_iteration.clone(),
            "ImportError" => self.import_error.clone(),
            "RecursionError" => self.recursion_error.clone(),
            "OverflowError" => self.overflow_error.clone(),
            _ => self.runtime_error.clone(),
        }
    }

    /// Materialize an interpreter-detected error as an exception
    /// object, for `except ... as e` bindings and top-level reports.
    pub fn instantiate(&self, err: &EvalError) -> Value {
        let class = self.class_for(err.kind.exception_name());
        let mut instance = InstanceObject::new(class);
        instance
            .members
            .insert(self.message_name, Value::str(err.message.clone()));
        Value::instance(instance)
    }

    /// Every class in the hierarchy, for module-scope seeding.
    pub fn all(&self) -> Vec<ClassRef> {
        vec![
            self.exception.clone(),
            self.type_error.clone(),
            self.name_error.clone(),
            self.attribute_error.clone(),
            self.index_error.clone(),
            self.key_error.clone(),
            self.value_error.clone(),
            self.zero_division_error.clone(),
            self.stop_iteration.clone(),
            self.import_error.clone(),
            self.recursion_error.clone(),
            self.overflow_error.clone(),
            self.runtime_error.clone(),
        ]
    }
}

fn base_exception_class(interner: &StringInterner) -> ClassRef {
    let class = Shared::new(ClassObject::new(interner.intern("Exception"), vec![]));
    {
        let mut class = class.borrow_mut();
        class.members.insert(
            interner.intern("__init__"),
            Value::NativeFunction(NativeFunction::new("__init__", nf_exc_init)),
        );
        class.members.insert(
            interner.intern("__str__"),
            Value::NativeFunction(NativeFunction::new("__str__", nf_exc_str)),
        );
    }
    class
}

/// `Exception.__init__(self, message="")`: store the message member.
fn nf_exc_init(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    if args.is_empty() || args.len() > 2 {
        return Err(
            crate::errors::wrong_arg_count("__init__", 1, args.len().saturating_sub(1)).into(),
        );
    }
    let Value::Instance(instance) = &args[0] else {
        return Err(
            crate::errors::type_mismatch("exception instance", args[0].kind_name()).into(),
        );
    };
    let message = match args.get(1) {
        Some(arg) => interp.str_value(arg)?,
        None => String::new(),
    };
    let message_name = interp.registry().exceptions.message_name;
    instance
        .borrow_mut()
        .members
        .insert(message_name, Value::str(message));
    Ok(Value::None)
}

/// `str(exc)` is the stored message.
fn nf_exc_str(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    expect_args("__str__", args, 1)?;
    let Value::Instance(instance) = &args[0] else {
        return Err(
            crate::errors::type_mismatch("exception instance", args[0].kind_name()).into(),
        );
    };
    let message_name = interp.registry().exceptions.message_name;
    let message = instance.borrow().members.get(&message_name).cloned();
    match message {
        Some(value @ Value::Str(_)) => Ok(value),
        _ => Ok(Value::str("")),
    }
}
