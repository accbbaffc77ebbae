//! Diagnostic infrastructure for the evaluator.
//!
//! - `CallStack` — live call frame tracking with a depth limit
//! - `CallFrame` — per-call metadata (function name, current line)
//! - `EvalBacktrace` — snapshot of the call stack at an error site
//!
//! The call stack is snapshotted into an `EvalBacktrace` the first
//! time a raised exception passes a statement boundary, while every
//! frame that led to the raise is still live. Each frame's line is
//! kept current by the block evaluator, so outer frames report the
//! line of the call that is still executing in them.

use kea_ir::{Name, StringInterner};

use crate::errors::{recursion_limit_exceeded, EvalError};

/// A single frame in the live call stack.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallFrame {
    /// Interned function or method name; `<module>` for the bottom frame.
    pub function: Name,
    /// Line currently executing in this frame.
    pub line: u32,
}

/// Live call stack for the interpreter.
///
/// Each function or method call pushes a frame; returning pops it.
/// The depth check is integrated into `push()`: exceeding the limit
/// raises a catchable `RecursionError` and leaves the stack unchanged.
#[derive(Clone, Debug)]
pub struct CallStack {
    frames: Vec<CallFrame>,
    max_depth: Option<usize>,
}

impl CallStack {
    /// Create an empty call stack.
    ///
    /// `max_depth` is `None` for unlimited or `Some(n)` to bound user
    /// recursion (the engine default is 1000 frames).
    pub fn new(max_depth: Option<usize>) -> Self {
        Self {
            frames: Vec::new(),
            max_depth,
        }
    }

    /// Push a call frame, checking the depth limit.
    pub fn push(&mut self, function: Name, line: u32) -> Result<(), EvalError> {
        if let Some(max) = self.max_depth {
            if self.frames.len() >= max {
                return Err(recursion_limit_exceeded(max));
            }
        }
        self.frames.push(CallFrame { function, line });
        Ok(())
    }

    /// Pop the most recent call frame.
    pub fn pop(&mut self) {
        self.frames.pop();
    }

    /// Update the current line of the innermost frame.
    ///
    /// Called by the block evaluator before each statement so that
    /// backtraces report where each live frame actually is.
    pub fn set_line(&mut self, line: u32) {
        if let Some(frame) = self.frames.last_mut() {
            frame.line = line;
        }
    }

    /// Current stack depth.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Snapshot the live frames for error reporting.
    pub fn capture(&self) -> EvalBacktrace {
        EvalBacktrace {
            frames: self
                .frames
                .iter()
                .map(|frame| BacktraceFrame {
                    function: frame.function,
                    line: frame.line,
                })
                .collect(),
        }
    }
}

/// One frame of a captured backtrace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BacktraceFrame {
    pub function: Name,
    pub line: u32,
}

/// Captured call stack at an error site, outermost frame first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EvalBacktrace {
    pub frames: Vec<BacktraceFrame>,
}

impl EvalBacktrace {
    /// Render the backtrace as a traceback, innermost frame last.
    pub fn render(&self, interner: &StringInterner, script_name: &str) -> String {
        self.render_with_source(interner, script_name, None)
    }

    /// Render with each frame's source line quoted below it, when the
    /// program source is available.
    pub fn render_with_source(
        &self,
        interner: &StringInterner,
        script_name: &str,
        source: Option<&str>,
    ) -> String {
        let mut out = String::from("Traceback (most recent call last):\n");
        for frame in &self.frames {
            let function = interner.lookup(frame.function);
            out.push_str(&format!(
                "  File \"{script_name}\", line {}, in {function}\n",
                frame.line
            ));
            if let Some(text) = source.and_then(|src| source_line(src, frame.line)) {
                out.push_str(&format!("    {text}\n"));
            }
        }
        out
    }
}

/// The trimmed text of a 1-based source line.
fn source_line(source: &str, line: u32) -> Option<&str> {
    if line == 0 {
        return None;
    }
    source
        .lines()
        .nth(line as usize - 1)
        .map(str::trim)
        .filter(|text| !text.is_empty())
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
