//! No-op elision.
//!
//! Rewrites every `next` and `branch_next` link in a function so it lands on
//! the first node that actually does something, following `next` through
//! any chain of no-op nodes. No-op nodes stay in the tree; they simply stop
//! being reachable. Running the pass twice changes nothing.

use std::convert::Infallible;

use gowalk_ir::{walk, NodeArena, NodeId, NodeVisitor};

/// Elide no-op nodes below `root`. Returns how many links were rewritten.
pub fn optimize(arena: &mut NodeArena, root: NodeId) -> usize {
    let mut elider = NopElider { rewritten: 0 };
    match walk(&mut elider, arena, root) {
        Ok(()) => {}
        Err(never) => match never {},
    }
    tracing::debug!(rewritten = elider.rewritten, "elided no-op links");
    elider.rewritten
}

/// Follow `target` through no-op nodes to the first executable one.
///
/// Terminates because builder wiring never forms a cycle of no-ops.
pub fn skip_nops(arena: &NodeArena, target: Option<NodeId>) -> Option<NodeId> {
    let mut current = target;
    let mut hops = 0usize;
    while let Some(id) = current {
        if !arena[id].is_nop() {
            break;
        }
        current = arena[id].next;
        hops += 1;
        debug_assert!(hops <= arena.len(), "cycle of no-op nodes at {id:?}");
    }
    current
}

struct NopElider {
    rewritten: usize,
}

impl NodeVisitor for NopElider {
    type Error = Infallible;

    fn leave(&mut self, arena: &mut NodeArena, id: NodeId) -> Result<(), Infallible> {
        let next = arena[id].next;
        let resolved = skip_nops(arena, next);
        if resolved != next {
            arena[id].next = resolved;
            self.rewritten += 1;
        }

        let branch = arena[id].branch_next;
        let resolved = skip_nops(arena, branch);
        if resolved != branch {
            arena[id].branch_next = resolved;
            self.rewritten += 1;
        }
        Ok(())
    }
}
