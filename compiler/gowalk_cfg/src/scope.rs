//! Per-function identifier → slot tracking.
//!
//! One [`ScopeTracker`] lives for exactly one function's compilation: it is
//! reset when the builder enters a function declaration and dropped with the
//! builder. There is no parent scope, so nothing can leak between functions.

use gowalk_ir::{Name, Slot};
use rustc_hash::FxHashMap;

/// Maps identifier names to the frame slots they occupy.
#[derive(Default)]
pub struct ScopeTracker {
    slots: FxHashMap<Name, Slot>,
}

impl ScopeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget every binding (function boundary).
    pub fn reset(&mut self) {
        self.slots.clear();
    }

    /// Slot of an already-declared name.
    pub fn lookup(&self, name: Name) -> Option<Slot> {
        self.slots.get(&name).copied()
    }

    /// Declare `name`, allocating through `alloc` only on first sight.
    ///
    /// Re-declaring a name yields the slot of its first declaration.
    pub fn declare(&mut self, name: Name, alloc: impl FnOnce() -> Slot) -> Slot {
        *self.slots.entry(name).or_insert_with(alloc)
    }

    /// Number of tracked names.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
