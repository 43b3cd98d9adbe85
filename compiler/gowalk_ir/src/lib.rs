//! Gowalk IR - the shared node graph.
//!
//! This crate contains the data structures every other gowalk crate
//! works against:
//! - Spans for source locations
//! - Names for interned identifiers and literal text
//! - The node arena: syntax nodes augmented with compiled fields
//!   (storage slot, successor links, flags, dispatch tag)
//! - A pre-order/post-order walker over the arena
//!
//! # Design Philosophy
//!
//! - **Intern Everything**: identifier and literal text → `Name(u32)`
//! - **Flatten Everything**: nodes live in one `NodeArena`; every link
//!   (`children`, `start`, `next`, `branch_next`) is a `NodeId(u32)` index,
//!   so the cross-linked control-flow graph has no ownership cycles.
//! - **Closed dispatch**: node kinds, operators and operations are finite
//!   enums matched exhaustively.

mod arena;
mod interner;
mod kind;
mod node;
mod span;
mod stack;
mod walk;

pub use arena::NodeArena;
pub use interner::{Name, StringInterner};
pub use kind::{AssignOp, BinaryOp, IncDecOp, NodeKind, Op};
pub use node::{Constant, Node, NodeFlags, NodeId, Slot};
pub use span::Span;
pub use stack::ensure_sufficient_stack;
pub use walk::{walk, NodeVisitor};
