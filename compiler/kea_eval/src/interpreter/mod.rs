//! Tree-walking interpreter for Kea.
//!
//! # Architecture
//!
//! All evaluation goes through `eval(InstrId)`, which dispatches on
//! `InstrKind`. Helper impl blocks live beside this module:
//!
//! - `control_flow` - conditionals, loops, try/except, raise
//! - `function_call` - calls, constructor paths, parameter binding
//! - `method_dispatch` - attribute access, dunder dispatch, truthiness
//! - `imports` - the module-loader seam
//!
//! # Tree Threading
//!
//! Function values carry the instruction tree they were defined in
//! (`SharedTree`). A call swaps the interpreter's tree to the callee's
//! for the duration of the body, so body instruction ids always index
//! the right arena, even across module boundaries.
//!
//! # Context Threading
//!
//! Three pieces of context travel alongside evaluation rather than as
//! parameters on every call:
//! - the value a postfix instruction applies to nests in the tree
//!   (`Index { object: Attribute { .. } }`),
//! - the receiver a method call needs rides in `BoundMethod` values
//!   made at attribute-access time,
//! - the lexical class `super()` resolves against rides in
//!   `FunctionValue::defining_class` and the interpreter's current
//!   method context.

mod builder;
mod control_flow;
mod function_call;
mod imports;
mod method_dispatch;

pub use builder::InterpreterBuilder;
pub use imports::ModuleLoader;

use std::rc::Rc;

use kea_ir::{
    BinaryOp, BoolOp, CallArg, CallArgKind, InstrId, InstrKind, Name, SharedTree, StringInterner,
};
use kea_stack::ensure_sufficient_stack;

use crate::builtins::TypeRegistry;
use crate::diagnostics::CallStack;
use crate::environment::{Environment, NoNonlocalBinding, ScopeKind};
use crate::errors::{
    undefined_name, unhashable_key, ControlAction, EvalError, EvalResult, ExecResult, Raised,
};
use crate::exec::call::CallArgs;
use crate::print_handler::PrintHandler;
use crate::value::{class::ClassRef, DictKey, DictValue, FunctionValue, Value};

/// Pre-interned dunder method names.
///
/// Interned once at construction so operator dispatch compares `Name`s
/// (a single `u32 == u32`) instead of interning per operation.
#[derive(Clone, Copy)]
pub(crate) struct DunderNames {
    pub(crate) init: Name,
    pub(crate) new: Name,
    pub(crate) add: Name,
    pub(crate) sub: Name,
    pub(crate) mul: Name,
    pub(crate) truediv: Name,
    pub(crate) floordiv: Name,
    pub(crate) mod_: Name,
    pub(crate) pow: Name,
    pub(crate) eq: Name,
    pub(crate) ne: Name,
    pub(crate) lt: Name,
    pub(crate) le: Name,
    pub(crate) gt: Name,
    pub(crate) ge: Name,
    pub(crate) contains: Name,
    pub(crate) neg: Name,
    pub(crate) abs: Name,
    pub(crate) bool_: Name,
    pub(crate) str_: Name,
    pub(crate) len: Name,
    pub(crate) getitem: Name,
    pub(crate) setitem: Name,
    pub(crate) delitem: Name,
    pub(crate) iter: Name,
    pub(crate) next: Name,
    pub(crate) call: Name,
}

impl DunderNames {
    fn new(interner: &StringInterner) -> Self {
        Self {
            init: interner.intern("__init__"),
            new: interner.intern("__new__"),
            add: interner.intern("__add__"),
            sub: interner.intern("__sub__"),
            mul: interner.intern("__mul__"),
            truediv: interner.intern("__truediv__"),
            floordiv: interner.intern("__floordiv__"),
            mod_: interner.intern("__mod__"),
            pow: interner.intern("__pow__"),
            eq: interner.intern("__eq__"),
            ne: interner.intern("__ne__"),
            lt: interner.intern("__lt__"),
            le: interner.intern("__le__"),
            gt: interner.intern("__gt__"),
            ge: interner.intern("__ge__"),
            contains: interner.intern("__contains__"),
            neg: interner.intern("__neg__"),
            abs: interner.intern("__abs__"),
            bool_: interner.intern("__bool__"),
            str_: interner.intern("__str__"),
            len: interner.intern("__len__"),
            getitem: interner.intern("__getitem__"),
            setitem: interner.intern("__setitem__"),
            delitem: interner.intern("__delitem__"),
            iter: interner.intern("__iter__"),
            next: interner.intern("__next__"),
            call: interner.intern("__call__"),
        }
    }

    /// Dunder name for a binary operator. `in`/`not in` dispatch on
    /// the container instead and are handled separately.
    pub(crate) fn for_binary(&self, op: BinaryOp) -> Option<Name> {
        Some(match op {
            BinaryOp::Add => self.add,
            BinaryOp::Sub => self.sub,
            BinaryOp::Mul => self.mul,
            BinaryOp::Div => self.truediv,
            BinaryOp::FloorDiv => self.floordiv,
            BinaryOp::Mod => self.mod_,
            BinaryOp::Pow => self.pow,
            BinaryOp::Eq => self.eq,
            BinaryOp::NotEq => self.ne,
            BinaryOp::Lt => self.lt,
            BinaryOp::LtE => self.le,
            BinaryOp::Gt => self.gt,
            BinaryOp::GtE => self.ge,
            BinaryOp::In | BinaryOp::NotIn => return None,
        })
    }
}

/// The receiver and lexical class of the currently-executing method,
/// for `super()`.
#[derive(Clone, Debug)]
pub(crate) struct MethodContext {
    pub(crate) receiver: Value,
    pub(crate) defining_class: ClassRef,
}

/// An uncaught exception, reported at the top level.
#[derive(Debug)]
pub struct UncaughtException {
    /// Exception class name.
    pub exception_type: String,
    /// Exception message.
    pub message: String,
    /// Rendered traceback, innermost frame last.
    pub traceback: String,
}

impl std::fmt::Display for UncaughtException {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.traceback)?;
        if self.message.is_empty() {
            write!(f, "{}", self.exception_type)
        } else {
            write!(f, "{}: {}", self.exception_type, self.message)
        }
    }
}

impl std::error::Error for UncaughtException {}

/// Tree-walking interpreter.
///
/// One `Interpreter` is one independent execution context: its own
/// environment, call stack, type registry, and output handler. Build
/// with [`InterpreterBuilder`].
pub struct Interpreter {
    interner: Rc<StringInterner>,
    /// Tree currently being evaluated; swapped per function call.
    tree: SharedTree,
    pub env: Environment,
    pub call_stack: CallStack,
    registry: TypeRegistry,
    dunders: DunderNames,
    print_handler: PrintHandler,
    module_loader: Option<Box<dyn ModuleLoader>>,
    /// Set while a method body runs; `super()` reads it.
    method_ctx: Option<MethodContext>,
    script_name: String,
    /// Program source text, for quoting lines in tracebacks.
    source: Option<String>,
    /// Pre-interned `<module>` for the bottom call frame.
    module_frame_name: Name,
}

impl Interpreter {
    /// The string interner.
    pub fn interner(&self) -> &StringInterner {
        &self.interner
    }

    /// The builtin type registry.
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub(crate) fn dunders(&self) -> &DunderNames {
        &self.dunders
    }

    /// Hand one output line to the print handler.
    pub(crate) fn print_line(&self, line: &str) {
        self.print_handler.println(line);
    }

    /// Captured print output (buffer handler only).
    pub fn printed_output(&self) -> String {
        self.print_handler.output()
    }

    /// Run a program: evaluate top-level instructions in the module
    /// scope. An uncaught exception is fatal and reported with a
    /// traceback assembled from the call stack.
    pub fn run(&mut self, program: &[InstrId]) -> Result<(), UncaughtException> {
        if let Err(err) = self.call_stack.push(self.module_frame_name, 0) {
            return Err(self.report_uncaught(ControlAction::Raise(Raised::Host(err))));
        }
        let result = self.eval_block(program);
        self.call_stack.pop();
        result.map_err(|action| self.report_uncaught(action))
    }

    /// Evaluate one instruction, growing the host stack when needed.
    pub fn eval(&mut self, id: InstrId) -> EvalResult {
        ensure_sufficient_stack(|| self.eval_instr(id))
    }

    /// Evaluate a statement list, attaching spans and backtraces to
    /// escaping exceptions. The first abrupt completion skips the
    /// remaining statements.
    pub(crate) fn eval_block(&mut self, body: &[InstrId]) -> ExecResult {
        for &id in body {
            let span = self.tree.get(id).span;
            self.call_stack.set_line(span.line);
            if let Err(mut action) = self.eval(id) {
                if let ControlAction::Raise(raised) = &mut action {
                    if let Raised::Host(err) = raised {
                        if err.span.is_none() {
                            err.span = Some(span);
                        }
                    }
                    let stack = &self.call_stack;
                    raised.attach_backtrace(|| stack.capture());
                }
                return Err(action);
            }
        }
        Ok(())
    }

    /// Evaluate a statement list in a fresh scope, popped on every
    /// exit path.
    pub(crate) fn eval_block_scoped(&mut self, kind: ScopeKind, body: &[InstrId]) -> ExecResult {
        self.env.push_scope(kind);
        let result = self.eval_block(body);
        self.env.pop_scope();
        result
    }

    fn eval_instr(&mut self, id: InstrId) -> EvalResult {
        let tree = self.tree.clone();
        match &tree.get(id).kind {
            // Literals and displays
            InstrKind::Int(value) => Ok(Value::Int(*value)),
            InstrKind::Float(value) => Ok(Value::Float(*value)),
            InstrKind::Bool(value) => Ok(Value::Bool(*value)),
            InstrKind::NoneLit => Ok(Value::None),
            InstrKind::Str(name) => Ok(Value::str(self.interner.lookup(*name))),
            InstrKind::ListDisplay(items) => {
                let mut values = Vec::with_capacity(items.len());
                for &item in items {
                    values.push(self.eval(item)?);
                }
                Ok(Value::list(values))
            }
            InstrKind::DictDisplay(entries) => {
                let mut dict = DictValue::new();
                for &(key_id, value_id) in entries {
                    let key_value = self.eval(key_id)?;
                    let key = DictKey::from_value(&key_value)
                        .ok_or_else(|| unhashable_key(key_value.kind_name()))?;
                    let value = self.eval(value_id)?;
                    dict.insert(key, value);
                }
                Ok(Value::dict(dict))
            }

            // Names
            InstrKind::Load(name) => self
                .env
                .lookup(*name)
                .ok_or_else(|| undefined_name(self.interner.lookup(*name)).into()),

            // Binding and mutation
            InstrKind::Assign { target, value } => self.eval_assign(*target, *value),
            InstrKind::Delete { target } => self.eval_delete(*target),
            InstrKind::Global(names) => {
                for &name in names {
                    self.env.declare_global(name);
                }
                Ok(Value::None)
            }
            InstrKind::Nonlocal(names) => {
                for &name in names {
                    self.env
                        .declare_nonlocal(name)
                        .map_err(|err| self.nonlocal_error(err))?;
                }
                Ok(Value::None)
            }

            // Operators
            InstrKind::Unary { op, operand } => {
                let operand = self.eval(*operand)?;
                self.apply_unary(*op, operand)
            }
            InstrKind::Binary { op, lhs, rhs } => {
                let lhs = self.eval(*lhs)?;
                let rhs = self.eval(*rhs)?;
                self.apply_binary(*op, lhs, rhs)
            }
            InstrKind::Logic { op, lhs, rhs } => {
                // Short-circuit: the result is the last operand
                // evaluated, not necessarily a boolean.
                let lhs = self.eval(*lhs)?;
                let lhs_truthy = self.truthy(&lhs)?;
                match op {
                    BoolOp::And if !lhs_truthy => Ok(lhs),
                    BoolOp::Or if lhs_truthy => Ok(lhs),
                    _ => self.eval(*rhs),
                }
            }

            // Access
            InstrKind::Attribute { object, name } => {
                let object = self.eval(*object)?;
                self.get_attribute_value(&object, *name)
            }
            InstrKind::Index { object, index } => {
                let object = self.eval(*object)?;
                let index = self.eval(*index)?;
                self.index_get(&object, &index)
            }

            // Calls
            InstrKind::Call { callee, args } => {
                let callee = self.eval(*callee)?;
                let args = self.eval_call_args(args)?;
                self.call_value(callee, args)
            }

            // Control flow
            InstrKind::If {
                branches,
                else_body,
            } => self.eval_if(branches, else_body),
            InstrKind::While { cond, body } => self.eval_while(*cond, body),
            InstrKind::For {
                target,
                iterable,
                body,
            } => self.eval_for(*target, *iterable, body),
            InstrKind::Return(value) => {
                let value = match value {
                    Some(id) => self.eval(*id)?,
                    None => Value::None,
                };
                Err(ControlAction::Return(value))
            }
            InstrKind::Break => Err(ControlAction::Break),
            InstrKind::Continue => Err(ControlAction::Continue),
            InstrKind::Raise(operand) => self.eval_raise(*operand),
            InstrKind::Try {
                body,
                handlers,
                else_body,
                finally_body,
            } => self.eval_try(body, handlers, else_body, finally_body),

            // Definitions
            InstrKind::FunctionDef { name, params, body } => {
                let func = FunctionValue {
                    name: *name,
                    params: params.clone(),
                    body: body.clone(),
                    tree: self.tree.clone(),
                    defining_scope: self.env.capture_defining_scope(),
                    defining_class: None,
                };
                self.bind_name(*name, Value::function(func))?;
                Ok(Value::None)
            }
            InstrKind::ClassDef { name, bases, body } => self.eval_class_def(*name, bases, body),

            // Modules
            InstrKind::Import { module, names } => self.eval_import(*module, names),
        }
    }

    /// Bind through the environment, converting binding errors.
    pub(crate) fn bind_name(&mut self, name: Name, value: Value) -> Result<(), ControlAction> {
        self.env
            .bind(name, value)
            .map_err(|err| self.nonlocal_error(err))
    }

    pub(crate) fn nonlocal_error(&self, err: NoNonlocalBinding) -> ControlAction {
        crate::errors::no_nonlocal_binding(self.interner.lookup(err.0)).into()
    }

    fn eval_assign(&mut self, target: InstrId, value: InstrId) -> EvalResult {
        let tree = self.tree.clone();
        match &tree.get(target).kind {
            InstrKind::Load(name) => {
                let value = self.eval(value)?;
                self.bind_name(*name, value)?;
            }
            InstrKind::Attribute { object, name } => {
                let object = self.eval(*object)?;
                let value = self.eval(value)?;
                self.set_attribute(&object, *name, value)?;
            }
            InstrKind::Index { object, index } => {
                let object = self.eval(*object)?;
                let index = self.eval(*index)?;
                let value = self.eval(value)?;
                self.index_set(&object, &index, value)?;
            }
            _ => return Err(EvalError::new("invalid assignment target").into()),
        }
        Ok(Value::None)
    }

    fn eval_delete(&mut self, target: InstrId) -> EvalResult {
        let tree = self.tree.clone();
        match &tree.get(target).kind {
            InstrKind::Load(name) => {
                if !self.env.unbind(*name) {
                    return Err(undefined_name(self.interner.lookup(*name)).into());
                }
            }
            InstrKind::Attribute { object, name } => {
                let object = self.eval(*object)?;
                self.delete_attribute(&object, *name)?;
            }
            InstrKind::Index { object, index } => {
                let object = self.eval(*object)?;
                let index = self.eval(*index)?;
                self.index_delete(&object, &index)?;
            }
            _ => return Err(EvalError::new("invalid delete target").into()),
        }
        Ok(Value::None)
    }

    fn eval_call_args(&mut self, args: &[CallArg]) -> Result<CallArgs, ControlAction> {
        let mut call_args = CallArgs::empty();
        for arg in args {
            let value = self.eval(arg.value)?;
            match arg.kind {
                CallArgKind::Positional => call_args.positional.push(value),
                CallArgKind::Keyword(name) => call_args.keywords.push((name, value)),
            }
        }
        Ok(call_args)
    }

    fn render_traceback(&self, backtrace: &crate::diagnostics::EvalBacktrace) -> String {
        backtrace.render_with_source(&self.interner, &self.script_name, self.source.as_deref())
    }

    /// Report an escaping abrupt completion as a fatal error.
    fn report_uncaught(&self, action: ControlAction) -> UncaughtException {
        match action {
            ControlAction::Raise(Raised::Host(err)) => {
                let traceback = err
                    .backtrace
                    .as_ref()
                    .map(|bt| self.render_traceback(bt))
                    .unwrap_or_default();
                UncaughtException {
                    exception_type: err.kind.exception_name().to_owned(),
                    message: err.message,
                    traceback,
                }
            }
            ControlAction::Raise(Raised::Object { value, backtrace }) => {
                let traceback = backtrace
                    .as_ref()
                    .map(|bt| self.render_traceback(bt))
                    .unwrap_or_default();
                let exception_type = self.type_name_of(&value);
                let message = match &value {
                    Value::Instance(instance) => {
                        let message_name = self.registry.exceptions.message_name;
                        match instance.borrow().members.get(&message_name) {
                            Some(Value::Str(s)) => s.to_string(),
                            _ => String::new(),
                        }
                    }
                    _ => String::new(),
                };
                UncaughtException {
                    exception_type,
                    message,
                    traceback,
                }
            }
            // Structurally impossible in a well-formed tree; reported
            // rather than re-validated.
            ControlAction::Return(_) => UncaughtException {
                exception_type: "RuntimeError".to_owned(),
                message: "'return' outside function".to_owned(),
                traceback: String::new(),
            },
            ControlAction::Break | ControlAction::Continue => UncaughtException {
                exception_type: "RuntimeError".to_owned(),
                message: "'break' or 'continue' outside loop".to_owned(),
                traceback: String::new(),
            },
        }
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
