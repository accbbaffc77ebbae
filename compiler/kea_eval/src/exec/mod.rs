//! Shared evaluation helpers.
//!
//! - `call` - call-site argument collection and parameter binding

pub mod call;
