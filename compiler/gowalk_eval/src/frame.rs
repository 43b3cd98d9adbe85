//! Per-invocation slot storage.

use gowalk_ir::Slot;

use crate::errors::{slot_out_of_bounds, EvalResult};
use crate::Value;

/// Fixed-size array of values indexed by [`Slot`].
///
/// Owned by exactly one activation. Slot 0 exists but is never handed out
/// by the compiler.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    slots: Vec<Value>,
}

impl Frame {
    /// A frame of `size` void slots.
    pub fn new(size: usize) -> Self {
        Self {
            slots: vec![Value::Void; size],
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, slot: Slot) -> EvalResult<&Value> {
        self.slots
            .get(slot.index())
            .ok_or_else(|| slot_out_of_bounds(slot.raw(), self.slots.len()))
    }

    pub fn set(&mut self, slot: Slot, value: Value) -> EvalResult<()> {
        let size = self.slots.len();
        match self.slots.get_mut(slot.index()) {
            Some(entry) => {
                *entry = value;
                Ok(())
            }
            None => Err(slot_out_of_bounds(slot.raw(), size)),
        }
    }
}
