//! Control-flow constructs: conditionals, loops, raise, try/except.
//!
//! Loops absorb `Break`/`Continue`; `try` absorbs matching `Raise`s;
//! everything else keeps propagating. Every construct that pushes a
//! scope pops it on every exit path, abrupt ones included.

use kea_ir::{ExceptHandler, InstrId, Name};

use super::Interpreter;
use crate::environment::ScopeKind;
use crate::errors::{
    exceptions_must_derive, type_mismatch, ControlAction, EvalErrorKind, EvalResult, Raised,
};
use crate::exec::call::CallArgs;
use crate::value::class::{is_subclass, ClassRef};
use crate::value::Value;

impl Interpreter {
    /// `if`/`elif`/`else`: the first truthy branch runs in its own
    /// scope; at most one branch runs.
    pub(crate) fn eval_if(
        &mut self,
        branches: &[(InstrId, Vec<InstrId>)],
        else_body: &[InstrId],
    ) -> EvalResult {
        for (cond, body) in branches {
            let cond_value = self.eval(*cond)?;
            if self.truthy(&cond_value)? {
                self.eval_block_scoped(ScopeKind::Block, body)?;
                return Ok(Value::None);
            }
        }
        if !else_body.is_empty() {
            self.eval_block_scoped(ScopeKind::Block, else_body)?;
        }
        Ok(Value::None)
    }

    /// `while`: re-evaluates the condition before every iteration;
    /// each iteration gets a fresh scope.
    pub(crate) fn eval_while(&mut self, cond: InstrId, body: &[InstrId]) -> EvalResult {
        loop {
            let cond_value = self.eval(cond)?;
            if !self.truthy(&cond_value)? {
                break;
            }
            match self.eval_block_scoped(ScopeKind::Block, body) {
                Ok(()) | Err(ControlAction::Continue) => {}
                Err(ControlAction::Break) => break,
                Err(other) => return Err(other),
            }
        }
        Ok(Value::None)
    }

    /// `for`: drives the iterator protocol. The loop terminates on
    /// exactly `StopIteration`, which never leaks to the caller.
    pub(crate) fn eval_for(
        &mut self,
        target: Name,
        iterable: InstrId,
        body: &[InstrId],
    ) -> EvalResult {
        let iterable_value = self.eval(iterable)?;
        let iterator = self.get_iterator(&iterable_value)?;
        loop {
            let item = match self.iterator_next(&iterator) {
                Ok(item) => item,
                Err(ControlAction::Raise(raised)) if self.is_stop_iteration(&raised) => break,
                Err(other) => return Err(other),
            };
            self.env.push_scope(ScopeKind::Block);
            let result = self
                .bind_name(target, item)
                .and_then(|()| self.eval_block(body));
            self.env.pop_scope();
            match result {
                Ok(()) | Err(ControlAction::Continue) => {}
                Err(ControlAction::Break) => break,
                Err(other) => return Err(other),
            }
        }
        Ok(Value::None)
    }

    /// `raise`: the operand must be an exception instance, or an
    /// exception class to instantiate with no arguments.
    pub(crate) fn eval_raise(&mut self, operand: InstrId) -> EvalResult {
        let value = self.eval(operand)?;
        let exception = match value {
            Value::Class(ref class)
                if is_subclass(class, &self.registry().exceptions.exception) =>
            {
                self.call_value(value.clone(), CallArgs::empty())?
            }
            Value::Instance(ref instance)
                if is_subclass(
                    &instance.borrow().class,
                    &self.registry().exceptions.exception,
                ) =>
            {
                value.clone()
            }
            _ => return Err(exceptions_must_derive().into()),
        };
        Err(ControlAction::Raise(Raised::Object {
            value: exception,
            backtrace: Some(self.call_stack.capture()),
        }))
    }

    /// Whether an in-flight exception is a `StopIteration`.
    pub(crate) fn is_stop_iteration(&self, raised: &Raised) -> bool {
        match raised {
            Raised::Host(err) => err.kind == EvalErrorKind::StopIteration,
            Raised::Object { value, .. } => {
                self.value_is_instance(value, &self.registry().exceptions.stop_iteration)
            }
        }
    }

    fn raised_matches(&self, raised: &Raised, class: &ClassRef) -> bool {
        match raised {
            Raised::Host(err) => is_subclass(
                &self.registry().exceptions.class_for(err.kind.exception_name()),
                class,
            ),
            Raised::Object { value, .. } => self.value_is_instance(value, class),
        }
    }

    /// Materialize the exception object for an `as` binding.
    fn raised_to_value(&self, raised: &Raised) -> Value {
        match raised {
            Raised::Host(err) => self.registry().exceptions.instantiate(err),
            Raised::Object { value, .. } => value.clone(),
        }
    }

    /// `try`/`except`/`else`/`finally`.
    ///
    /// `except` clauses are tested in source order; only the first
    /// match runs. `else` runs whenever no clause handled an exception
    /// — after a clean body, and also after a raising body whose
    /// exception matched no clause (which then resumes propagating).
    /// `finally` always runs last; its own abrupt completion replaces
    /// the pending one.
    pub(crate) fn eval_try(
        &mut self,
        body: &[InstrId],
        handlers: &[ExceptHandler],
        else_body: &[InstrId],
        finally_body: &[InstrId],
    ) -> EvalResult {
        let body_result = self.eval_block_scoped(ScopeKind::Block, body);

        let mut pending: Option<ControlAction> = None;
        let mut handled = false;

        match body_result {
            Ok(()) => {}
            Err(ControlAction::Raise(raised)) => {
                let mut class_eval_failed = false;
                for handler in handlers {
                    let matches = match handler.class {
                        None => true,
                        Some(class_expr) => match self.eval(class_expr) {
                            Ok(Value::Class(class)) => self.raised_matches(&raised, &class),
                            Ok(other) => {
                                pending = Some(
                                    type_mismatch("exception class", other.kind_name()).into(),
                                );
                                class_eval_failed = true;
                                break;
                            }
                            Err(action) => {
                                pending = Some(action);
                                class_eval_failed = true;
                                break;
                            }
                        },
                    };
                    if matches {
                        handled = true;
                        self.env.push_scope(ScopeKind::Block);
                        if let Some(binding) = handler.binding {
                            let exception = self.raised_to_value(&raised);
                            self.env.define(binding, exception);
                        }
                        let result = self.eval_block(&handler.body);
                        self.env.pop_scope();
                        if let Err(action) = result {
                            pending = Some(action);
                        }
                        break;
                    }
                }
                if !handled && !class_eval_failed {
                    // Unmatched: the exception propagates unchanged.
                    pending = Some(ControlAction::Raise(raised));
                }
            }
            Err(other) => pending = Some(other),
        }

        // Else runs when no handler ran: clean body, or an unmatched
        // exception (still pending, resumed below).
        let run_else =
            !handled && matches!(pending, None | Some(ControlAction::Raise(_)));
        if run_else && !else_body.is_empty() {
            if let Err(action) = self.eval_block_scoped(ScopeKind::Block, else_body) {
                pending = Some(action);
            }
        }

        if !finally_body.is_empty() {
            if let Err(action) = self.eval_block_scoped(ScopeKind::Block, finally_body) {
                pending = Some(action);
            }
        }

        match pending {
            Some(action) => Err(action),
            None => Ok(Value::None),
        }
    }
}
