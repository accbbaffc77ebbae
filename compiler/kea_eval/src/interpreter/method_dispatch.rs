//! Attribute resolution, dunder dispatch, and the protocol helpers
//! built on it (truthiness, str conversion, len, iteration).

use kea_ir::{BinaryOp, Name, UnaryOp};

use super::Interpreter;
use crate::builtins::native_view;
use crate::errors::{
    no_attribute, no_length, not_indexable, not_iterable, type_mismatch, unsupported_operand,
    unsupported_unary, ControlAction, EvalError, EvalResult,
};
use crate::exec::call::CallArgs;
use crate::value::class::{
    bind_if_callable, instance_get_attribute, is_subclass, lookup_on_bases, lookup_on_class,
    ClassRef,
};
use crate::value::{repr, Value};

impl Interpreter {
    /// Display name of a value's type, for error messages.
    pub fn type_name_of(&self, value: &Value) -> String {
        match value {
            Value::Instance(instance) => self
                .interner()
                .lookup(instance.borrow().class.borrow().name)
                .to_owned(),
            other => other.kind_name().to_owned(),
        }
    }

    /// Resolve a dunder method on a value, bound to its receiver.
    ///
    /// Instances resolve through their member map and class chain;
    /// natives resolve through their builtin class. `None` when the
    /// value's type does not define the method.
    pub(crate) fn get_dunder(&self, value: &Value, name: Name) -> Option<Value> {
        match value {
            Value::Instance(instance) => instance_get_attribute(instance, value, name),
            other => {
                let class = self.registry().class_of(other)?;
                lookup_on_class(&class, name).map(|(_, found)| bind_if_callable(other, found))
            }
        }
    }

    /// Call a dunder method if the value's type defines it.
    pub(crate) fn call_dunder(
        &mut self,
        value: &Value,
        name: Name,
        args: &[Value],
    ) -> Option<EvalResult> {
        let method = self.get_dunder(value, name)?;
        Some(self.call_value(method, CallArgs::positional(args.to_vec())))
    }

    /// Truthiness with dunder dispatch: `__bool__`, then `__len__`,
    /// then true. Natives resolve without dispatch.
    pub fn truthy(&mut self, value: &Value) -> Result<bool, ControlAction> {
        if let Some(truthy) = value.native_truthy() {
            return Ok(truthy);
        }
        let bool_name = self.dunders().bool_;
        if let Some(result) = self.call_dunder(value, bool_name, &[]) {
            return match result? {
                Value::Bool(b) => Ok(b),
                other => Err(type_mismatch("bool from __bool__", other.kind_name()).into()),
            };
        }
        let len_name = self.dunders().len;
        if let Some(result) = self.call_dunder(value, len_name, &[]) {
            return match result?.as_int() {
                Some(len) => Ok(len != 0),
                None => Err(type_mismatch("int from __len__", "other").into()),
            };
        }
        Ok(true)
    }

    /// String conversion: `__str__` when defined, repr-style display
    /// otherwise.
    pub fn str_value(&mut self, value: &Value) -> Result<String, ControlAction> {
        if matches!(value, Value::Instance(_)) {
            let str_name = self.dunders().str_;
            if let Some(result) = self.call_dunder(value, str_name, &[]) {
                return match result? {
                    Value::Str(s) => Ok(s.to_string()),
                    other => {
                        Err(type_mismatch("str from __str__", other.kind_name()).into())
                    }
                };
            }
        }
        Ok(repr::display(value, self.interner()))
    }

    /// Length with dunder dispatch.
    pub fn len_value(&mut self, value: &Value) -> Result<i64, ControlAction> {
        match native_view(value) {
            Value::Str(s) => return Ok(i64::try_from(s.chars().count()).unwrap_or(i64::MAX)),
            Value::List(items) => {
                return Ok(i64::try_from(items.borrow().len()).unwrap_or(i64::MAX));
            }
            Value::Dict(dict) => return Ok(i64::try_from(dict.borrow().len()).unwrap_or(i64::MAX)),
            _ => {}
        }
        let len_name = self.dunders().len;
        match self.call_dunder(value, len_name, &[]) {
            Some(result) => result?.as_int().ok_or_else(|| {
                ControlAction::from(type_mismatch("int from __len__", "other"))
            }),
            None => Err(no_length(&self.type_name_of(value)).into()),
        }
    }

    /// `__iter__` dispatch: every `for` loop and `iter()` call starts
    /// here.
    pub fn get_iterator(&mut self, value: &Value) -> EvalResult {
        let iter_name = self.dunders().iter;
        match self.call_dunder(value, iter_name, &[]) {
            Some(result) => result,
            None => Err(not_iterable(&self.type_name_of(value)).into()),
        }
    }

    /// `__next__` dispatch; exhaustion raises `StopIteration` through
    /// the ordinary exception channel.
    pub fn iterator_next(&mut self, iterator: &Value) -> EvalResult {
        let next_name = self.dunders().next;
        match self.call_dunder(iterator, next_name, &[]) {
            Some(result) => result,
            None => Err(type_mismatch("iterator", &self.type_name_of(iterator)).into()),
        }
    }

    /// Drain an iterable into a vector (the `list(x)` conversion).
    pub fn iterate_to_vec(&mut self, value: &Value) -> Result<Vec<Value>, ControlAction> {
        let iterator = self.get_iterator(value)?;
        let mut items = Vec::new();
        loop {
            match self.iterator_next(&iterator) {
                Ok(item) => items.push(item),
                Err(ControlAction::Raise(raised)) if self.is_stop_iteration(&raised) => {
                    return Ok(items);
                }
                Err(other) => return Err(other),
            }
        }
    }

    /// `isinstance` over both natives and instances.
    pub fn value_is_instance(&self, value: &Value, class: &ClassRef) -> bool {
        self.registry()
            .class_of(value)
            .is_some_and(|value_class| is_subclass(&value_class, class))
    }

    /// `super()` for the executing method.
    pub(crate) fn current_super(&mut self) -> EvalResult {
        match &self.method_ctx {
            Some(ctx) => Ok(Value::Super(std::rc::Rc::new(crate::value::SuperBinding {
                receiver: ctx.receiver.clone(),
                class: ctx.defining_class.clone(),
            }))),
            None => Err(EvalError::new("super(): no current method").into()),
        }
    }

    // Attribute protocol

    /// Attribute read: instance members, class chain, builtin-class
    /// methods for natives, base-chain resolution for `super()`.
    pub fn get_attribute_value(&mut self, object: &Value, name: Name) -> EvalResult {
        let found = match object {
            Value::Instance(instance) => instance_get_attribute(instance, object, name),
            Value::Class(class) => lookup_on_class(class, name).map(|(_, value)| value),
            Value::Super(binding) => lookup_on_bases(&binding.class, name)
                .map(|(_, value)| bind_if_callable(&binding.receiver, value)),
            other => self
                .registry()
                .class_of(other)
                .and_then(|class| lookup_on_class(&class, name))
                .map(|(_, value)| bind_if_callable(other, value)),
        };
        found.ok_or_else(|| {
            no_attribute(&self.type_name_of(object), self.interner().lookup(name)).into()
        })
    }

    /// Attribute write: instances and classes are the only valid
    /// targets.
    pub fn set_attribute(
        &mut self,
        object: &Value,
        name: Name,
        value: Value,
    ) -> Result<(), ControlAction> {
        match object {
            Value::Instance(instance) => {
                instance.borrow_mut().members.insert(name, value);
                Ok(())
            }
            Value::Class(class) => {
                class.borrow_mut().members.insert(name, value);
                Ok(())
            }
            other => Err(no_attribute(
                &self.type_name_of(other),
                self.interner().lookup(name),
            )
            .into()),
        }
    }

    /// Attribute deletion mirrors lookup order and removes the first
    /// occurrence found.
    pub fn delete_attribute(&mut self, object: &Value, name: Name) -> Result<(), ControlAction> {
        let removed = match object {
            Value::Instance(instance) => {
                crate::value::class::instance_delete_attribute(instance, name)
            }
            Value::Class(class) => crate::value::class::class_delete_attribute(class, name),
            _ => false,
        };
        if removed {
            Ok(())
        } else {
            Err(no_attribute(&self.type_name_of(object), self.interner().lookup(name)).into())
        }
    }

    // Index protocol

    pub fn index_get(&mut self, object: &Value, index: &Value) -> EvalResult {
        match object {
            Value::Instance(_) => {
                let getitem = self.dunders().getitem;
                match self.call_dunder(object, getitem, &[index.clone()]) {
                    Some(result) => result,
                    None => Err(not_indexable(&self.type_name_of(object)).into()),
                }
            }
            _ => crate::builtins::protocols::nf_getitem(
                self,
                &[object.clone(), index.clone()],
            ),
        }
    }

    pub fn index_set(
        &mut self,
        object: &Value,
        index: &Value,
        value: Value,
    ) -> Result<(), ControlAction> {
        match object {
            Value::Instance(_) => {
                let setitem = self.dunders().setitem;
                match self.call_dunder(object, setitem, &[index.clone(), value]) {
                    Some(result) => result.map(|_| ()),
                    None => Err(not_indexable(&self.type_name_of(object)).into()),
                }
            }
            _ => crate::builtins::protocols::nf_setitem(self, &[object.clone(), index.clone(), value])
                .map(|_| ()),
        }
    }

    pub fn index_delete(&mut self, object: &Value, index: &Value) -> Result<(), ControlAction> {
        match object {
            Value::Instance(_) => {
                let delitem = self.dunders().delitem;
                match self.call_dunder(object, delitem, &[index.clone()]) {
                    Some(result) => result.map(|_| ()),
                    None => Err(not_indexable(&self.type_name_of(object)).into()),
                }
            }
            _ => crate::builtins::protocols::nf_delitem(self, &[object.clone(), index.clone()])
                .map(|_| ()),
        }
    }

    // Operator fallback

    /// Binary operators after the native fast path: dunder dispatch.
    pub(crate) fn apply_binary(&mut self, op: BinaryOp, lhs: Value, rhs: Value) -> EvalResult {
        if let Some(value) = crate::operators::evaluate_binary(op, &lhs, &rhs)? {
            return Ok(value);
        }

        // Membership dispatches on the container (the right operand).
        if matches!(op, BinaryOp::In | BinaryOp::NotIn) {
            let contains = self.dunders().contains;
            let result = match self.call_dunder(&rhs, contains, &[lhs.clone()]) {
                Some(result) => result?,
                None => {
                    return Err(
                        not_iterable(&self.type_name_of(&rhs)).into(),
                    );
                }
            };
            let found = self.truthy(&result)?;
            return Ok(Value::Bool(if op == BinaryOp::In { found } else { !found }));
        }

        // `!=` falls back to negated `__eq__` when `__ne__` is absent.
        if op == BinaryOp::NotEq {
            let ne = self.dunders().ne;
            if let Some(result) = self.call_dunder(&lhs, ne, &[rhs.clone()]) {
                return result;
            }
            let eq = self.dunders().eq;
            if let Some(result) = self.call_dunder(&lhs, eq, &[rhs.clone()]) {
                let eq_value = result?;
                let truthy = self.truthy(&eq_value)?;
                return Ok(Value::Bool(!truthy));
            }
            return Err(self.unsupported_binary(op, &lhs, &rhs));
        }

        let Some(name) = self.dunders().for_binary(op) else {
            return Err(self.unsupported_binary(op, &lhs, &rhs));
        };
        match self.call_dunder(&lhs, name, &[rhs.clone()]) {
            Some(result) => result,
            // Absence of the dunder is an error, not a silent no-op.
            None => Err(self.unsupported_binary(op, &lhs, &rhs)),
        }
    }

    fn unsupported_binary(&self, op: BinaryOp, lhs: &Value, rhs: &Value) -> ControlAction {
        unsupported_operand(op, &self.type_name_of(lhs), &self.type_name_of(rhs)).into()
    }

    /// Unary operators after the native fast path.
    pub(crate) fn apply_unary(&mut self, op: UnaryOp, operand: Value) -> EvalResult {
        if let Some(value) = crate::unary_operators::evaluate_unary(op, &operand)? {
            return Ok(value);
        }
        match op {
            // `not` never errors: default truthiness covers every value.
            UnaryOp::Not => {
                let truthy = self.truthy(&operand)?;
                Ok(Value::Bool(!truthy))
            }
            UnaryOp::Neg => {
                let neg = self.dunders().neg;
                match self.call_dunder(&operand, neg, &[]) {
                    Some(result) => result,
                    None => {
                        Err(unsupported_unary(op, &self.type_name_of(&operand)).into())
                    }
                }
            }
        }
    }
}
