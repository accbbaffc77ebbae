//! Function call evaluation.
//!
//! Calling a user function pushes a call frame and a fresh function
//! scope whose parent is the *callee's captured defining scope*, not
//! the caller's chain. The interpreter's tree is swapped to the
//! callee's for the duration of the body. All of that state is
//! restored on every exit path before the result is interpreted:
//! `Return` is absorbed here, everything else keeps propagating.

use std::rc::Rc;

use kea_ir::{InstrId, Name};

use super::{Interpreter, MethodContext};
use crate::environment::ScopeKind;
use crate::errors::{
    not_callable, type_mismatch, unknown_keyword_argument, wrong_arg_count, ControlAction,
    EvalError, EvalResult,
};
use crate::exec::call::{bind_parameters, CallArgs};
use crate::value::class::{bind_if_callable, lookup_on_class, ClassObject, ClassRef};
use crate::value::{FunctionValue, InstanceObject, NativeFunction, Shared, Value};

impl Interpreter {
    /// Call any callable value with evaluated arguments.
    pub fn call_value(&mut self, callee: Value, args: CallArgs) -> EvalResult {
        match callee {
            Value::Function(func) => self.call_function(func, None, args),
            Value::BoundMethod(method) => match &method.callable {
                Value::Function(func) => {
                    self.call_function(func.clone(), Some(method.receiver.clone()), args)
                }
                Value::NativeFunction(native) => {
                    self.call_native(*native, Some(method.receiver.clone()), args)
                }
                other => Err(not_callable(&self.type_name_of(other)).into()),
            },
            Value::NativeFunction(native) => self.call_native(native, None, args),
            Value::Class(class) => self.construct(class, args),
            Value::Instance(_) => {
                // Instances are callable through `__call__`.
                let call_name = self.dunders().call;
                match self.get_dunder(&callee, call_name) {
                    Some(method) => self.call_value(method, args),
                    None => Err(not_callable(&self.type_name_of(&callee)).into()),
                }
            }
            other => Err(not_callable(&self.type_name_of(&other)).into()),
        }
    }

    /// Call a user-defined function or method body.
    #[tracing::instrument(level = "debug", skip_all)]
    pub(crate) fn call_function(
        &mut self,
        func: Rc<FunctionValue>,
        receiver: Option<Value>,
        mut args: CallArgs,
    ) -> EvalResult {
        // Depth check before any state changes; the failed push
        // surfaces as a catchable RecursionError.
        self.call_stack.push(func.name, 0)?;

        let saved_tree = std::mem::replace(&mut self.tree, func.tree.clone());
        let saved_ctx = self.method_ctx.take();
        if let (Some(recv), Some(class)) = (&receiver, &func.defining_class) {
            self.method_ctx = Some(MethodContext {
                receiver: recv.clone(),
                defining_class: class.clone(),
            });
        }
        if let Some(recv) = receiver {
            args.prepend(recv);
        }

        self.env
            .push_scope_with_parent(ScopeKind::Function, func.defining_scope.clone());
        let result =
            bind_parameters(self, &func, args).and_then(|()| self.eval_block(&func.body));
        self.env.pop_scope();

        self.method_ctx = saved_ctx;
        self.tree = saved_tree;
        self.call_stack.pop();

        match result {
            // Falling off the end of a function yields None.
            Ok(()) => Ok(Value::None),
            // Return is absorbed at the function-call boundary.
            Err(ControlAction::Return(value)) => Ok(value),
            Err(action @ ControlAction::Raise(_)) => Err(action),
            // Loop signals never legitimately cross a call boundary.
            Err(ControlAction::Break | ControlAction::Continue) => {
                Err(EvalError::new("'break' or 'continue' outside loop").into())
            }
        }
    }

    /// Call a native function. Natives take positional arguments only
    /// and validate their own arity.
    pub(crate) fn call_native(
        &mut self,
        native: NativeFunction,
        receiver: Option<Value>,
        args: CallArgs,
    ) -> EvalResult {
        if let Some((name, _)) = args.keywords.first() {
            return Err(
                unknown_keyword_argument(native.name, self.interner().lookup(*name)).into(),
            );
        }
        let mut argv = args.positional;
        if let Some(recv) = receiver {
            argv.insert(0, recv);
        }
        (native.func)(self, &argv)
    }

    /// Call a class: builtin classes convert via their `__new__`
    /// native; user classes allocate an instance and run `__init__`.
    fn construct(&mut self, class: ClassRef, args: CallArgs) -> EvalResult {
        let new_name = self.dunders().new;
        let converter = class.borrow().members.get(&new_name).cloned();
        if let Some(Value::NativeFunction(converter)) = converter {
            return self.call_native(converter, None, args);
        }

        // Allocation never runs user code; __init__ does, immediately
        // after, with the fresh instance as its receiver.
        let instance = Value::instance(InstanceObject::new(class.clone()));
        let init_name = self.dunders().init;
        match lookup_on_class(&class, init_name) {
            Some((_, init)) => {
                let method = bind_if_callable(&instance, init);
                self.call_value(method, args)?;
            }
            None => {
                if !args.positional.is_empty() || !args.keywords.is_empty() {
                    let class_name = self.interner().lookup(class.borrow().name);
                    return Err(wrong_arg_count(
                        class_name,
                        0,
                        args.positional.len() + args.keywords.len(),
                    )
                    .into());
                }
            }
        }
        Ok(instance)
    }

    /// `class` definition: evaluate the body in a write-isolated class
    /// scope, then turn its bindings into the member map. Function
    /// members are re-homed to the new class so `super()` resolves
    /// against the class they were defined in.
    pub(crate) fn eval_class_def(
        &mut self,
        name: Name,
        base_exprs: &[InstrId],
        body: &[InstrId],
    ) -> EvalResult {
        let mut bases = Vec::with_capacity(base_exprs.len());
        for &base_expr in base_exprs {
            match self.eval(base_expr)? {
                Value::Class(base) => bases.push(base),
                other => {
                    return Err(type_mismatch("class", &self.type_name_of(&other)).into());
                }
            }
        }

        let class = Shared::new(ClassObject::new(name, bases));

        self.env.push_scope(ScopeKind::Class);
        let body_result = self.eval_block(body);
        let bindings = self.env.current().borrow_mut().take_bindings();
        self.env.pop_scope();
        body_result?;

        {
            let mut class_obj = class.borrow_mut();
            for (member_name, value) in bindings {
                let member = match value {
                    Value::Function(func) => {
                        Value::Function(Rc::new(func.with_defining_class(class.clone())))
                    }
                    other => other,
                };
                class_obj.members.insert(member_name, member);
            }
        }

        self.bind_name(name, Value::Class(class))?;
        Ok(Value::None)
    }
}
