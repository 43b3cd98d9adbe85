//! Arena owning every node of a parsed file.
//!
//! The parser allocates nodes bottom-up (children before parents) through
//! [`NodeArena::alloc`] or the typed constructors below. The builder and
//! optimizer then mutate the compiled fields in place; after that the arena
//! is only read and may be shared across threads.

use std::ops::{Index, IndexMut};

use smallvec::SmallVec;

use crate::{
    AssignOp, BinaryOp, IncDecOp, Name, Node, NodeFlags, NodeId, NodeKind, Slot, Span,
    StringInterner,
};

/// Flat storage for nodes, addressed by [`NodeId`].
#[derive(Default)]
pub struct NodeArena {
    nodes: Vec<Node>,
    interner: StringInterner,
}

impl NodeArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a node with a dummy span.
    pub fn alloc(&mut self, kind: NodeKind, children: &[NodeId]) -> NodeId {
        self.alloc_spanned(kind, Span::DUMMY, children)
    }

    /// Allocate a node. Its `start` initially points at itself.
    pub fn alloc_spanned(&mut self, kind: NodeKind, span: Span, children: &[NodeId]) -> NodeId {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "node indices never exceed u32"
        )]
        let id = NodeId::new(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind,
            span,
            children: SmallVec::from_slice(children),
            slot: Slot::NONE,
            start: id,
            next: None,
            branch_next: None,
            flags: NodeFlags::empty(),
            op: None,
            constant: None,
        });
        id
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate over all nodes with their ids, in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(i, node)| {
            #[expect(
                clippy::cast_possible_truncation,
                reason = "node indices never exceed u32"
            )]
            let id = NodeId::new(i as u32);
            (id, node)
        })
    }

    #[inline]
    pub fn intern(&mut self, s: &str) -> Name {
        self.interner.intern(s)
    }

    #[inline]
    pub fn interner(&self) -> &StringInterner {
        &self.interner
    }

    /// Text behind an interned name.
    #[inline]
    pub fn text(&self, name: Name) -> &str {
        self.interner.lookup(name)
    }

    // Typed constructors

    pub fn ident(&mut self, text: &str) -> NodeId {
        let name = self.intern(text);
        self.alloc(NodeKind::Ident(name), &[])
    }

    pub fn literal(&mut self, text: &str) -> NodeId {
        let name = self.intern(text);
        self.alloc(NodeKind::Literal(name), &[])
    }

    pub fn type_expr(&mut self, text: &str) -> NodeId {
        let name = self.intern(text);
        self.alloc(NodeKind::TypeExpr(name), &[])
    }

    pub fn binary(&mut self, op: BinaryOp, left: NodeId, right: NodeId) -> NodeId {
        self.alloc(NodeKind::Binary(op), &[left, right])
    }

    pub fn paren(&mut self, inner: NodeId) -> NodeId {
        self.alloc(NodeKind::ParenExpr, &[inner])
    }

    pub fn call(&mut self, callee: &str, args: &[NodeId]) -> NodeId {
        let callee = self.ident(callee);
        let mut children: SmallVec<[NodeId; 4]> = SmallVec::with_capacity(args.len() + 1);
        children.push(callee);
        children.extend_from_slice(args);
        self.alloc(NodeKind::Call, &children)
    }

    /// Assignment with left operands followed by right operands.
    pub fn assign(&mut self, op: AssignOp, lhs: &[NodeId], rhs: &[NodeId]) -> NodeId {
        let mut children: SmallVec<[NodeId; 4]> = SmallVec::with_capacity(lhs.len() + rhs.len());
        children.extend_from_slice(lhs);
        children.extend_from_slice(rhs);
        self.alloc(NodeKind::Assign(op), &children)
    }

    pub fn inc_dec(&mut self, op: IncDecOp, operand: NodeId) -> NodeId {
        self.alloc(NodeKind::IncDec(op), &[operand])
    }

    pub fn expr_stmt(&mut self, expr: NodeId) -> NodeId {
        self.alloc(NodeKind::ExprStmt, &[expr])
    }

    pub fn block(&mut self, stmts: &[NodeId]) -> NodeId {
        self.alloc(NodeKind::Block, stmts)
    }

    pub fn if_stmt(&mut self, cond: NodeId, then: NodeId, otherwise: Option<NodeId>) -> NodeId {
        match otherwise {
            Some(otherwise) => self.alloc(NodeKind::If, &[cond, then, otherwise]),
            None => self.alloc(NodeKind::If, &[cond, then]),
        }
    }

    pub fn for_stmt(&mut self, init: NodeId, cond: NodeId, post: NodeId, body: NodeId) -> NodeId {
        self.alloc(NodeKind::For, &[init, cond, post, body])
    }

    pub fn return_stmt(&mut self, values: &[NodeId]) -> NodeId {
        self.alloc(NodeKind::Return, values)
    }

    /// Parameter or result field. Empty `names` declares an anonymous field.
    pub fn field(&mut self, names: &[&str], ty: &str) -> NodeId {
        let mut children: SmallVec<[NodeId; 4]> = names.iter().map(|n| self.ident(n)).collect();
        children.push(self.type_expr(ty));
        self.alloc(NodeKind::Field, &children)
    }

    pub fn field_list(&mut self, fields: &[NodeId]) -> NodeId {
        self.alloc(NodeKind::FieldList, fields)
    }

    /// Function declaration from parameter and (optional) result lists.
    pub fn func_decl(
        &mut self,
        name: &str,
        params: NodeId,
        results: Option<NodeId>,
        body: NodeId,
    ) -> NodeId {
        let name = self.ident(name);
        let signature = match results {
            Some(results) => self.alloc(NodeKind::FuncType, &[params, results]),
            None => self.alloc(NodeKind::FuncType, &[params]),
        };
        self.alloc(NodeKind::FuncDecl, &[name, signature, body])
    }

    pub fn file(&mut self, decls: &[NodeId]) -> NodeId {
        self.alloc(NodeKind::File, decls)
    }
}

impl Index<NodeId> for NodeArena {
    type Output = Node;

    #[inline]
    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }
}

impl IndexMut<NodeId> for NodeArena {
    #[inline]
    fn index_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }
}

#[cfg(test)]
mod tests;
