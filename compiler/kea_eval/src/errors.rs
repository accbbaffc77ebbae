//! Error types and control-flow signaling for the evaluator.
//!
//! Evaluation results travel as `Result<Value, ControlAction>`:
//! abrupt completions (`return`, `break`, `continue`, raised
//! exceptions) use the error channel as explicit completion values
//! rather than host unwinding, and each is absorbed by the matching
//! enclosing construct.
//!
//! Interpreter-detected errors are [`EvalError`]s with a typed
//! [`EvalErrorKind`]. They flow through the same `Raise` channel as
//! user exceptions and are converted to exception objects when an
//! `except` clause matches or binds them, so user code catches a
//! `TypeError` raised by the engine exactly like one it raised itself.

use std::fmt;

use kea_ir::{BinaryOp, Span, UnaryOp};

use crate::diagnostics::EvalBacktrace;
use crate::value::Value;

/// Result of evaluating one instruction.
pub type EvalResult = Result<Value, ControlAction>;

/// Result of evaluating a statement block.
pub type ExecResult = Result<(), ControlAction>;

/// Abrupt completion propagating out of an instruction.
///
/// The first non-normal completion in a block skips the remaining
/// sibling instructions. `Return` is absorbed at the nearest function
/// call boundary, `Break`/`Continue` at the nearest loop, and `Raise`
/// by the first `try` whose `except` clause matches (or the top level,
/// where it becomes a reported fatal error).
#[derive(Debug)]
pub enum ControlAction {
    /// `break` out of the nearest enclosing loop.
    Break,
    /// `continue` with the next iteration of the nearest enclosing loop.
    Continue,
    /// `return` from the nearest enclosing function call.
    Return(Value),
    /// A raised exception, user-level or interpreter-detected.
    Raise(Raised),
}

/// An in-flight exception.
///
/// Re-raising propagates the same `Raised` unchanged, preserving type
/// and message, so a handler that does not match sees exactly the
/// exception the raise site produced.
#[derive(Debug)]
pub enum Raised {
    /// Interpreter-detected error. Converted to an exception object
    /// lazily, when an `except` clause binds it or the top level
    /// reports it.
    Host(EvalError),
    /// User exception object: an instance whose class transitively
    /// subclasses the builtin `Exception`.
    Object {
        value: Value,
        backtrace: Option<EvalBacktrace>,
    },
}

impl Raised {
    /// The backtrace attached to this exception, if any.
    pub fn backtrace(&self) -> Option<&EvalBacktrace> {
        match self {
            Raised::Host(err) => err.backtrace.as_ref(),
            Raised::Object { backtrace, .. } => backtrace.as_ref(),
        }
    }

    /// Attach a backtrace if none was captured yet.
    pub fn attach_backtrace(&mut self, capture: impl FnOnce() -> EvalBacktrace) {
        match self {
            Raised::Host(err) => {
                if err.backtrace.is_none() {
                    err.backtrace = Some(capture());
                }
            }
            Raised::Object { backtrace, .. } => {
                if backtrace.is_none() {
                    *backtrace = Some(capture());
                }
            }
        }
    }
}

impl From<EvalError> for ControlAction {
    fn from(err: EvalError) -> Self {
        ControlAction::Raise(Raised::Host(err))
    }
}

/// Typed error category for interpreter-detected errors.
///
/// Each variant maps onto one of the builtin exception classes via
/// [`EvalErrorKind::exception_name`], which is also the class an
/// `except` clause matches against.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EvalErrorKind {
    // TypeError
    UnsupportedOperand {
        op: BinaryOp,
        left: String,
        right: String,
    },
    UnsupportedUnary {
        op: UnaryOp,
        operand: String,
    },
    NotCallable {
        type_name: String,
    },
    NotIterable {
        type_name: String,
    },
    NoLength {
        type_name: String,
    },
    NotIndexable {
        type_name: String,
    },
    UnhashableKey {
        type_name: String,
    },
    TypeMismatch {
        expected: String,
        got: String,
    },
    ExceptionsMustDerive,
    UnknownPositionalArgument {
        function: String,
        expected: usize,
        got: usize,
    },
    UnknownKeywordArgument {
        function: String,
        keyword: String,
    },
    MissingRequiredArgument {
        function: String,
        parameter: String,
    },
    WrongArgCount {
        function: String,
        expected: usize,
        got: usize,
    },

    // NameError
    UndefinedName {
        name: String,
    },
    NoNonlocalBinding {
        name: String,
    },

    // AttributeError
    NoAttribute {
        type_name: String,
        attribute: String,
    },

    // IndexError / KeyError
    IndexOutOfRange {
        index: i64,
    },
    KeyNotFound {
        key: String,
    },

    // ZeroDivisionError
    DivisionByZero,
    ModuloByZero,

    // OverflowError
    IntegerOverflow {
        operation: String,
    },

    // StopIteration
    StopIteration,

    // ImportError
    ImportFailed {
        module: String,
        message: String,
    },
    UnknownImport {
        name: String,
        module: String,
    },

    // RecursionError
    RecursionLimitExceeded {
        depth: usize,
    },

    // ValueError
    ValueError {
        message: String,
    },

    /// Catch-all for errors without a structured kind; reported as
    /// `RuntimeError`.
    Custom {
        message: String,
    },
}

impl EvalErrorKind {
    /// Name of the builtin exception class this error raises as.
    pub fn exception_name(&self) -> &'static str {
        match self {
            EvalErrorKind::UnsupportedOperand { .. }
            | EvalErrorKind::UnsupportedUnary { .. }
            | EvalErrorKind::NotCallable { .. }
            | EvalErrorKind::NotIterable { .. }
            | EvalErrorKind::NoLength { .. }
            | EvalErrorKind::NotIndexable { .. }
            | EvalErrorKind::UnhashableKey { .. }
            | EvalErrorKind::TypeMismatch { .. }
            | EvalErrorKind::ExceptionsMustDerive
            | EvalErrorKind::UnknownPositionalArgument { .. }
            | EvalErrorKind::UnknownKeywordArgument { .. }
            | EvalErrorKind::MissingRequiredArgument { .. }
            | EvalErrorKind::WrongArgCount { .. } => "TypeError",
            EvalErrorKind::UndefinedName { .. } | EvalErrorKind::NoNonlocalBinding { .. } => {
                "NameError"
            }
            EvalErrorKind::NoAttribute { .. } => "AttributeError",
            EvalErrorKind::IndexOutOfRange { .. } => "IndexError",
            EvalErrorKind::KeyNotFound { .. } => "KeyError",
            EvalErrorKind::DivisionByZero | EvalErrorKind::ModuloByZero => "ZeroDivisionError",
            EvalErrorKind::IntegerOverflow { .. } => "OverflowError",
            EvalErrorKind::StopIteration => "StopIteration",
            EvalErrorKind::ImportFailed { .. } | EvalErrorKind::UnknownImport { .. } => {
                "ImportError"
            }
            EvalErrorKind::RecursionLimitExceeded { .. } => "RecursionError",
            EvalErrorKind::ValueError { .. } => "ValueError",
            EvalErrorKind::Custom { .. } => "RuntimeError",
        }
    }
}

impl fmt::Display for EvalErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalErrorKind::UnsupportedOperand { op, left, right } => write!(
                f,
                "unsupported operand type(s) for {op}: '{left}' and '{right}'"
            ),
            EvalErrorKind::UnsupportedUnary { op, operand } => {
                write!(f, "bad operand type for unary {}: '{operand}'", op.as_symbol())
            }
            EvalErrorKind::NotCallable { type_name } => {
                write!(f, "'{type_name}' object is not callable")
            }
            EvalErrorKind::NotIterable { type_name } => {
                write!(f, "'{type_name}' object is not iterable")
            }
            EvalErrorKind::NoLength { type_name } => {
                write!(f, "object of type '{type_name}' has no len()")
            }
            EvalErrorKind::NotIndexable { type_name } => {
                write!(f, "'{type_name}' object is not subscriptable")
            }
            EvalErrorKind::UnhashableKey { type_name } => {
                write!(f, "unhashable type: '{type_name}'")
            }
            EvalErrorKind::TypeMismatch { expected, got } => {
                write!(f, "expected {expected}, got {got}")
            }
            EvalErrorKind::ExceptionsMustDerive => {
                write!(f, "exceptions must derive from Exception")
            }
            EvalErrorKind::UnknownPositionalArgument {
                function,
                expected,
                got,
            } => write!(
                f,
                "unknown positional argument: {function}() takes {expected} positional arguments but {got} were given"
            ),
            EvalErrorKind::UnknownKeywordArgument { function, keyword } => {
                write!(
                    f,
                    "unknown keyword argument: {function}() got an unexpected keyword argument '{keyword}'"
                )
            }
            EvalErrorKind::MissingRequiredArgument {
                function,
                parameter,
            } => write!(
                f,
                "missing required argument: {function}() missing required argument '{parameter}'"
            ),
            EvalErrorKind::WrongArgCount {
                function,
                expected,
                got,
            } => write!(f, "{function}() takes {expected} arguments but {got} were given"),
            EvalErrorKind::UndefinedName { name } => write!(f, "name '{name}' is not defined"),
            EvalErrorKind::NoNonlocalBinding { name } => {
                write!(f, "no binding for nonlocal '{name}' found")
            }
            EvalErrorKind::NoAttribute {
                type_name,
                attribute,
            } => write!(f, "'{type_name}' object has no attribute '{attribute}'"),
            EvalErrorKind::IndexOutOfRange { index } => {
                write!(f, "index {index} out of range")
            }
            EvalErrorKind::KeyNotFound { key } => write!(f, "{key}"),
            EvalErrorKind::DivisionByZero => write!(f, "division by zero"),
            EvalErrorKind::ModuloByZero => {
                write!(f, "integer division or modulo by zero")
            }
            EvalErrorKind::IntegerOverflow { operation } => {
                write!(f, "integer overflow in {operation}")
            }
            EvalErrorKind::StopIteration => Ok(()),
            EvalErrorKind::ImportFailed { module, message } => {
                write!(f, "cannot import '{module}': {message}")
            }
            EvalErrorKind::UnknownImport { name, module } => {
                write!(f, "cannot import name '{name}' from '{module}'")
            }
            EvalErrorKind::RecursionLimitExceeded { .. } => {
                write!(f, "maximum recursion depth exceeded")
            }
            EvalErrorKind::ValueError { message } | EvalErrorKind::Custom { message } => {
                f.write_str(message)
            }
        }
    }
}

/// An interpreter-detected error.
///
/// Factory functions populate `kind` and derive `message` from its
/// `Display`. `span` and `backtrace` are attached by the evaluator as
/// the error propagates (statement spans at block level, call frames
/// at call boundaries).
#[derive(Clone, Debug, PartialEq)]
pub struct EvalError {
    /// Structured error category.
    pub kind: EvalErrorKind,
    /// Human-readable message, equal to `kind.to_string()` for
    /// factory-created errors.
    pub message: String,
    /// Source location where the error occurred.
    pub span: Option<Span>,
    /// Call stack backtrace at the error site.
    pub backtrace: Option<EvalBacktrace>,
}

impl EvalError {
    /// Create an error with just a message, using the `Custom` kind.
    ///
    /// Prefer the specific factory functions when a structured kind
    /// exists.
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            kind: EvalErrorKind::Custom {
                message: message.clone(),
            },
            message,
            span: None,
            backtrace: None,
        }
    }

    fn from_kind(kind: EvalErrorKind) -> Self {
        let message = kind.to_string();
        Self {
            kind,
            message,
            span: None,
            backtrace: None,
        }
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.exception_name(), self.message)
    }
}

impl std::error::Error for EvalError {}

// Factory functions. One per structured kind, so call sites never
// format messages by hand.

pub fn unsupported_operand(op: BinaryOp, left: &str, right: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UnsupportedOperand {
        op,
        left: left.to_owned(),
        right: right.to_owned(),
    })
}

pub fn unsupported_unary(op: UnaryOp, operand: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UnsupportedUnary {
        op,
        operand: operand.to_owned(),
    })
}

pub fn not_callable(type_name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NotCallable {
        type_name: type_name.to_owned(),
    })
}

pub fn not_iterable(type_name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NotIterable {
        type_name: type_name.to_owned(),
    })
}

pub fn no_length(type_name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NoLength {
        type_name: type_name.to_owned(),
    })
}

pub fn not_indexable(type_name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NotIndexable {
        type_name: type_name.to_owned(),
    })
}

pub fn unhashable_key(type_name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UnhashableKey {
        type_name: type_name.to_owned(),
    })
}

pub fn type_mismatch(expected: &str, got: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::TypeMismatch {
        expected: expected.to_owned(),
        got: got.to_owned(),
    })
}

pub fn exceptions_must_derive() -> EvalError {
    EvalError::from_kind(EvalErrorKind::ExceptionsMustDerive)
}

pub fn unknown_positional_argument(function: &str, expected: usize, got: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UnknownPositionalArgument {
        function: function.to_owned(),
        expected,
        got,
    })
}

pub fn unknown_keyword_argument(function: &str, keyword: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UnknownKeywordArgument {
        function: function.to_owned(),
        keyword: keyword.to_owned(),
    })
}

pub fn missing_required_argument(function: &str, parameter: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::MissingRequiredArgument {
        function: function.to_owned(),
        parameter: parameter.to_owned(),
    })
}

pub fn wrong_arg_count(function: &str, expected: usize, got: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::WrongArgCount {
        function: function.to_owned(),
        expected,
        got,
    })
}

pub fn undefined_name(name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UndefinedName {
        name: name.to_owned(),
    })
}

pub fn no_nonlocal_binding(name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NoNonlocalBinding {
        name: name.to_owned(),
    })
}

pub fn no_attribute(type_name: &str, attribute: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NoAttribute {
        type_name: type_name.to_owned(),
        attribute: attribute.to_owned(),
    })
}

pub fn index_out_of_range(index: i64) -> EvalError {
    EvalError::from_kind(EvalErrorKind::IndexOutOfRange { index })
}

pub fn key_not_found(key: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::KeyNotFound {
        key: key.to_owned(),
    })
}

pub fn division_by_zero() -> EvalError {
    EvalError::from_kind(EvalErrorKind::DivisionByZero)
}

pub fn modulo_by_zero() -> EvalError {
    EvalError::from_kind(EvalErrorKind::ModuloByZero)
}

pub fn integer_overflow(operation: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::IntegerOverflow {
        operation: operation.to_owned(),
    })
}

pub fn stop_iteration() -> EvalError {
    EvalError::from_kind(EvalErrorKind::StopIteration)
}

pub fn import_failed(module: &str, message: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::ImportFailed {
        module: module.to_owned(),
        message: message.to_owned(),
    })
}

pub fn unknown_import(name: &str, module: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UnknownImport {
        name: name.to_owned(),
        module: module.to_owned(),
    })
}

pub fn recursion_limit_exceeded(depth: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::RecursionLimitExceeded { depth })
}

pub fn value_error(message: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::ValueError {
        message: message.to_owned(),
    })
}
