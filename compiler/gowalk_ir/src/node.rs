//! Nodes of the compiled syntax tree.

use std::fmt;

use bitflags::bitflags;
use smallvec::SmallVec;

use crate::{NodeKind, Op, Span};

/// Index into a [`NodeArena`](crate::NodeArena).
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct NodeId(u32);

impl NodeId {
    /// Create a new `NodeId`.
    #[inline]
    pub const fn new(index: u32) -> Self {
        NodeId(index)
    }

    /// Get the index into the arena.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Get the raw u32 value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// Index into a function's frame.
///
/// Slot 0 is never handed out; it doubles as the "unassigned" sentinel.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
#[repr(transparent)]
pub struct Slot(u32);

impl Slot {
    /// Unassigned sentinel.
    pub const NONE: Slot = Slot(0);

    #[inline]
    pub const fn new(index: u32) -> Self {
        Slot(index)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_assigned(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_assigned() {
            write!(f, "Slot({})", self.0)
        } else {
            write!(f, "Slot::NONE")
        }
    }
}

bitflags! {
    /// Compile-time facts about a node.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct NodeFlags: u8 {
        /// Performs no runtime action; exists for wiring only.
        const NOP = 1 << 0;
        /// Value is known at compile time.
        const CONST = 1 << 1;
        /// Boolean result selects between `next` and `branch_next`.
        const BRANCH = 1 << 2;
    }
}

/// Statically known value of a literal.
#[derive(Clone, PartialEq, Debug)]
pub enum Constant {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Box<str>),
}

/// One syntax construct plus its compiled control/storage metadata.
#[derive(Clone, Debug)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
    /// Owned children in source order.
    pub children: SmallVec<[NodeId; 4]>,
    /// Frame slot holding this node's value; `Slot::NONE` if it has none.
    pub slot: Slot,
    /// Where execution of this subtree begins. Defaults to the node itself.
    pub start: NodeId,
    /// Unconditional successor.
    pub next: Option<NodeId>,
    /// Successor taken when this node's boolean result is false. Only
    /// meaningful on `BRANCH` nodes, where `None` means the function ends.
    pub branch_next: Option<NodeId>,
    pub flags: NodeFlags,
    /// Dispatch tag; `None` for nodes never executed.
    pub op: Option<Op>,
    /// Parsed literal value.
    pub constant: Option<Constant>,
}

impl Node {
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    #[inline]
    pub fn is_nop(&self) -> bool {
        self.flags.contains(NodeFlags::NOP)
    }

    #[inline]
    pub fn is_const(&self) -> bool {
        self.flags.contains(NodeFlags::CONST)
    }

    #[inline]
    pub fn is_branch(&self) -> bool {
        self.flags.contains(NodeFlags::BRANCH)
    }
}
