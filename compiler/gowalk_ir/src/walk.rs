//! Pre-order/post-order traversal of the node tree.
//!
//! Unlike a read-only AST visitor, compilation passes mutate the nodes they
//! visit, so callbacks receive `&mut NodeArena`. The child list is copied
//! before descending, so a callback may rewrite links on any node.

use smallvec::SmallVec;

use crate::{ensure_sufficient_stack, NodeArena, NodeId};

/// Callbacks fired by [`walk`].
///
/// `enter` fires before any child is visited; `leave` fires after all
/// children have been visited. Returning an error aborts the walk.
pub trait NodeVisitor {
    type Error;

    fn enter(&mut self, _arena: &mut NodeArena, _id: NodeId) -> Result<(), Self::Error> {
        Ok(())
    }

    fn leave(&mut self, _arena: &mut NodeArena, _id: NodeId) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Walk the subtree rooted at `root`, depth first, children in source order.
pub fn walk<V: NodeVisitor + ?Sized>(
    visitor: &mut V,
    arena: &mut NodeArena,
    root: NodeId,
) -> Result<(), V::Error> {
    ensure_sufficient_stack(|| {
        visitor.enter(arena, root)?;
        let children: SmallVec<[NodeId; 4]> = arena[root].children.clone();
        for child in children {
            walk(visitor, arena, child)?;
        }
        visitor.leave(arena, root)
    })
}
