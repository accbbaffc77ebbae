//! Kea IR - Instruction-Tree Types
//!
//! This crate contains the data structures shared between the Kea
//! parser (out of tree) and the runtime evaluation engine:
//! - Spans for source locations
//! - Names for interned identifiers
//! - Operator enums
//! - The arena-allocated instruction tree (`Instr`, `InstrKind`)
//!
//! # Design Philosophy
//!
//! - **Intern Everything**: Strings → Name(u32)
//! - **Flatten Everything**: No `Box<Instr>`, use `InstrId(u32)` indices
//!
//! Instructions are immutable once built. Ownership is tree-shaped:
//! nodes refer to children by arena id and never back up the tree, so
//! chained postfix operations like `a.b[c]` nest
//! (`Index { object: Attribute { .. } }`) rather than link.

mod instr;
mod interner;
mod name;
mod ops;
mod span;

pub use instr::{
    CallArg, CallArgKind, ExceptHandler, ImportNames, Instr, InstrArena, InstrId, InstrKind, Param,
    ParamKind, SharedTree,
};
pub use interner::StringInterner;
pub use name::Name;
pub use ops::{BinaryOp, BoolOp, UnaryOp};
pub use span::Span;
