//! Stack safety utilities for deep recursion.
//!
//! Kea maps user-level recursion directly onto native recursion: every
//! nested instruction and every interpreted call deepens the host
//! stack. [`ensure_sufficient_stack`] keeps that from overflowing by
//! growing the stack on demand.
//!
//! # Platform Support
//!
//! - **Native targets**: uses the `stacker` crate to grow the stack.
//! - **WASM targets**: no-op passthrough (WASM manages its own stack).
//!
//! # Usage
//!
//! Wrap the recursive entry point of the evaluator:
//!
//! ```text
//! fn eval(&mut self, id: InstrId) -> EvalResult {
//!     ensure_sufficient_stack(|| self.eval_instr(id))
//! }
//! ```
//!
//! Note that this guards the *host* stack only; the evaluator
//! separately enforces a user-level recursion limit so runaway
//! recursion surfaces as a catchable error instead of eating memory.

/// Minimum stack space to keep available (100KB red zone).
///
/// If less than this amount remains, the stack is grown before
/// calling the closure.
#[cfg(not(target_arch = "wasm32"))]
const RED_ZONE: usize = 100 * 1024;

/// Stack space to allocate when growing (1MB).
#[cfg(not(target_arch = "wasm32"))]
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Ensure sufficient stack space is available before executing `f`.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

/// WASM version - just call directly (WASM has its own stack management).
#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deep_recursion_does_not_overflow() {
        fn count_down(n: u64) -> u64 {
            ensure_sufficient_stack(|| if n == 0 { 0 } else { count_down(n - 1) + 1 })
        }

        // Deep enough to overflow a default stack without growth.
        assert_eq!(count_down(200_000), 200_000);
    }

    #[test]
    fn passes_through_closure_result() {
        let result: Result<i64, String> = ensure_sufficient_stack(|| Ok(7));
        assert_eq!(result, Ok(7));
    }
}
