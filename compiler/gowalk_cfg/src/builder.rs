//! CFG builder: frame layout and control-flow wiring for one function.
//!
//! A single [`walk`] over the function declaration does everything:
//!
//! - **enter** (pre-order): function-boundary bookkeeping (reset the scope,
//!   reserve result slots), classification of identifiers that declare a
//!   name or refer to a function, and identifier resolution itself.
//! - **leave** (post-order): slot allocation for value-producing nodes and
//!   `start`/`next`/`branch_next` wiring, which need their children done.
//!
//! # Wiring
//!
//! Sequence wiring (blocks, statements, expressions) threads the non-leaf
//! children in source order and returns control to the composite node:
//!
//! ```text
//! composite.start = first non-leaf child's start (or composite)
//! child[i].next   = child[i+1].start
//! last.next       = composite
//! ```
//!
//! Structural composites are no-ops; the optimizer later routes links
//! past them. Every no-op's `next` points toward an ancestor or a later
//! sibling, so chains of no-ops never cycle.

use gowalk_ir::{
    walk, AssignOp, BinaryOp, Constant, NodeArena, NodeFlags, NodeId, NodeKind, NodeVisitor, Op,
    Slot,
};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::errors::{
    malformed, unknown_node_kind, unknown_operator, unresolved_identifier, wrong_arity,
    CompileError,
};
use crate::literal::parse_literal;
use crate::scope::ScopeTracker;

/// Frame layout produced for one function.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionLayout {
    /// Number of frame entries, including the unused slot 0.
    pub frame_size: usize,
    /// Parameter slots in declaration order.
    pub params: SmallVec<[Slot; 4]>,
    /// Number of results; they occupy slots `1..=results`.
    pub results: u32,
}

/// Assign slots and wire control flow for the function declared at `decl`.
pub fn build_function(arena: &mut NodeArena, decl: NodeId) -> Result<FunctionLayout, CompileError> {
    if arena[decl].kind != NodeKind::FuncDecl {
        return Err(unknown_node_kind(
            format!("{} at function position", arena[decl].kind.label()),
            arena[decl].span,
        ));
    }

    let mut builder = CfgBuilder {
        root: decl,
        scope: ScopeTracker::new(),
        max_slot: 0,
        results: 0,
        roles: FxHashMap::default(),
    };
    walk(&mut builder, arena, decl)?;

    let params = collect_param_slots(arena, decl);
    Ok(FunctionLayout {
        frame_size: builder.max_slot as usize + 1,
        params,
        results: builder.results,
    })
}

/// Binary operators with an implementation in the operation catalogue.
pub fn has_binary_operation(op: BinaryOp) -> bool {
    !matches!(op, BinaryOp::Shl | BinaryOp::Shr | BinaryOp::AndNot)
}

/// How an identifier participates in the frame layout.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum IdentRole {
    /// Introduces a name (parameter, named result, `:=` target).
    Declare,
    /// Names a function; lives in the function table, not the frame.
    Function,
}

struct CfgBuilder {
    root: NodeId,
    scope: ScopeTracker,
    /// Highest slot handed out so far.
    max_slot: u32,
    results: u32,
    /// Roles for identifiers that are not plain uses.
    roles: FxHashMap<NodeId, IdentRole>,
}

impl NodeVisitor for CfgBuilder {
    type Error = CompileError;

    fn enter(&mut self, arena: &mut NodeArena, id: NodeId) -> Result<(), CompileError> {
        match arena[id].kind {
            NodeKind::FuncDecl if id == self.root => self.enter_function(arena, id),
            NodeKind::FuncDecl => Err(unknown_node_kind(
                "nested function declaration",
                arena[id].span,
            )),
            NodeKind::Assign(op) => self.enter_assign(arena, id, op),
            NodeKind::Call => self.enter_call(arena, id),
            NodeKind::Field => check_field_shape(arena, id),
            NodeKind::Ident(_) => self.resolve_ident(arena, id),
            _ => Ok(()),
        }
    }

    fn leave(&mut self, arena: &mut NodeArena, id: NodeId) -> Result<(), CompileError> {
        let kind = arena[id].kind;
        let n = arena[id].children.len();
        let span = arena[id].span;
        match kind {
            NodeKind::FuncDecl => {
                let body = arena[id].children[2];
                arena[id].flags |= NodeFlags::CONST;
                arena[id].start = arena[body].start;
            }
            NodeKind::Block => {
                wire_sequence(arena, id);
                mark_nop(arena, id);
                inherit_last_child(arena, id);
            }
            NodeKind::ExprStmt | NodeKind::ParenExpr => {
                if n == 0 {
                    return Err(wrong_arity(kind.label(), "an expression", n, span));
                }
                wire_sequence(arena, id);
                mark_nop(arena, id);
                inherit_last_child(arena, id);
            }
            NodeKind::Return => {
                wire_sequence(arena, id);
                arena[id].op = Some(Op::Return);
            }
            NodeKind::IncDec(op) => {
                if n != 1 {
                    return Err(wrong_arity(kind.label(), "one operand", n, span));
                }
                wire_sequence(arena, id);
                arena[id].slot = arena[arena[id].children[0]].slot;
                arena[id].op = Some(Op::IncDec(op));
            }
            NodeKind::Assign(op) => {
                wire_sequence(arena, id);
                arena[id].slot = arena[arena[id].children[0]].slot;
                arena[id].op = Some(Op::Assign(op));
            }
            NodeKind::Binary(op) => {
                if n != 2 {
                    return Err(wrong_arity(kind.label(), "two operands", n, span));
                }
                if !has_binary_operation(op) {
                    return Err(unknown_operator(op, span));
                }
                wire_sequence(arena, id);
                arena[id].slot = self.alloc_slot();
                arena[id].op = Some(Op::Binary(op));
            }
            NodeKind::Field => {
                // Result fields already hold their reserved slot.
                if !arena[id].slot.is_assigned() {
                    arena[id].slot = if n == 1 {
                        self.alloc_slot()
                    } else {
                        arena[arena[id].children[0]].slot
                    };
                }
            }
            NodeKind::Call => {
                wire_sequence(arena, id);
                arena[id].slot = self.alloc_slot();
                arena[id].op = Some(Op::Call);
            }
            NodeKind::If => wire_if(arena, id)?,
            NodeKind::For => wire_for(arena, id)?,
            NodeKind::Literal(text) => {
                let constant = parse_literal(arena.text(text));
                let node = &mut arena[id];
                node.flags |= NodeFlags::CONST;
                node.constant = Some(constant);
                node.op = Some(Op::Value);
            }
            NodeKind::Unsupported(label) => {
                tracing::debug!(construct = arena.text(label), "leaving construct unwired");
            }
            NodeKind::File
            | NodeKind::FuncType
            | NodeKind::FieldList
            | NodeKind::TypeExpr(_)
            | NodeKind::Ident(_) => {}
        }
        Ok(())
    }
}

impl CfgBuilder {
    fn alloc_slot(&mut self) -> Slot {
        self.max_slot += 1;
        Slot::new(self.max_slot)
    }

    /// Reset the scope and reserve result slots before any child is seen.
    fn enter_function(&mut self, arena: &mut NodeArena, decl: NodeId) -> Result<(), CompileError> {
        let span = arena[decl].span;
        let children = arena[decl].children.clone();
        let well_formed = children.len() == 3
            && matches!(arena[children[0]].kind, NodeKind::Ident(_))
            && arena[children[1]].kind == NodeKind::FuncType
            && arena[children[2]].kind == NodeKind::Block;
        if !well_formed {
            return Err(wrong_arity(
                "function declaration",
                "a name, a signature and a body",
                children.len(),
                span,
            ));
        }

        self.scope.reset();
        self.max_slot = 0;
        self.results = 0;
        self.roles.insert(children[0], IdentRole::Function);

        let signature = arena[children[1]].children.clone();
        if !(1..=2).contains(&signature.len()) {
            return Err(wrong_arity(
                "function type",
                "parameters and optional results",
                signature.len(),
                arena[children[1]].span,
            ));
        }

        for &field in &arena[signature[0]].children {
            for &name in field_names(arena, field) {
                self.roles.insert(name, IdentRole::Declare);
            }
        }

        if let Some(&results) = signature.get(1) {
            let fields = arena[results].children.clone();
            for field in fields {
                let names: SmallVec<[NodeId; 4]> = field_names(arena, field).into();
                if names.is_empty() {
                    self.results += 1;
                    arena[field].slot = Slot::new(self.results);
                    continue;
                }
                for name in names {
                    self.results += 1;
                    let slot = Slot::new(self.results);
                    if let NodeKind::Ident(text) = arena[name].kind {
                        self.scope.declare(text, || slot);
                    }
                    self.roles.insert(name, IdentRole::Declare);
                }
            }
        }

        self.max_slot = self.results;
        tracing::trace!(results = self.results, "reserved result slots");
        Ok(())
    }

    fn enter_assign(
        &mut self,
        arena: &NodeArena,
        id: NodeId,
        op: AssignOp,
    ) -> Result<(), CompileError> {
        let children = &arena[id].children;
        let n = children.len();
        let well_formed = match op {
            AssignOp::Compound(_) => n == 2,
            AssignOp::Assign | AssignOp::Define => n >= 2 && n % 2 == 0,
        };
        if !well_formed {
            return Err(wrong_arity(
                arena[id].kind.label(),
                "matching left and right operands",
                n,
                arena[id].span,
            ));
        }
        if op == AssignOp::Define {
            for &target in &children[..n / 2] {
                if !matches!(arena[target].kind, NodeKind::Ident(_)) {
                    return Err(malformed(
                        "assignment",
                        "non-name on left side of :=",
                        arena[target].span,
                    ));
                }
                self.roles.insert(target, IdentRole::Declare);
            }
        }
        Ok(())
    }

    fn enter_call(&mut self, arena: &NodeArena, id: NodeId) -> Result<(), CompileError> {
        match arena[id].children.first() {
            Some(&callee) if matches!(arena[callee].kind, NodeKind::Ident(_)) => {
                self.roles.insert(callee, IdentRole::Function);
                Ok(())
            }
            _ => Err(malformed(
                "call expression",
                "callee must be a function name",
                arena[id].span,
            )),
        }
    }

    /// Bind an identifier to its slot, declaring it if this is a declaration.
    fn resolve_ident(&mut self, arena: &mut NodeArena, id: NodeId) -> Result<(), CompileError> {
        let NodeKind::Ident(name) = arena[id].kind else {
            return Ok(());
        };
        let slot = match self.roles.get(&id).copied() {
            Some(IdentRole::Function) => return Ok(()),
            Some(IdentRole::Declare) => {
                let max_slot = &mut self.max_slot;
                self.scope.declare(name, || {
                    *max_slot += 1;
                    Slot::new(*max_slot)
                })
            }
            None => match self.scope.lookup(name) {
                Some(slot) => slot,
                None => {
                    let text = arena.text(name);
                    let predeclared = match text {
                        "true" => Constant::Bool(true),
                        "false" => Constant::Bool(false),
                        _ => return Err(unresolved_identifier(text, arena[id].span)),
                    };
                    let node = &mut arena[id];
                    node.flags |= NodeFlags::CONST;
                    node.constant = Some(predeclared);
                    node.op = Some(Op::Value);
                    return Ok(());
                }
            },
        };
        arena[id].slot = slot;
        arena[id].op = Some(Op::Value);
        Ok(())
    }
}

fn check_field_shape(arena: &NodeArena, field: NodeId) -> Result<(), CompileError> {
    let children = &arena[field].children;
    let well_formed = children
        .split_last()
        .is_some_and(|(&ty, names)| {
            matches!(arena[ty].kind, NodeKind::TypeExpr(_))
                && names
                    .iter()
                    .all(|&name| matches!(arena[name].kind, NodeKind::Ident(_)))
        });
    if well_formed {
        Ok(())
    } else {
        Err(wrong_arity(
            "field",
            "names followed by a type",
            children.len(),
            arena[field].span,
        ))
    }
}

/// Name identifiers of a field (all children but the trailing type).
fn field_names(arena: &NodeArena, field: NodeId) -> &[NodeId] {
    match arena[field].children.split_last() {
        Some((_, names)) => names,
        None => &[],
    }
}

/// Parameter slots of `decl`, in declaration order. Run after the walk.
fn collect_param_slots(arena: &NodeArena, decl: NodeId) -> SmallVec<[Slot; 4]> {
    let signature = arena[decl].children[1];
    let params = arena[signature].children[0];
    let mut slots = SmallVec::new();
    for &field in &arena[params].children {
        let names = field_names(arena, field);
        if names.is_empty() {
            slots.push(arena[field].slot);
        } else {
            slots.extend(names.iter().map(|&name| arena[name].slot));
        }
    }
    slots
}

fn mark_nop(arena: &mut NodeArena, id: NodeId) {
    let node = &mut arena[id];
    node.flags |= NodeFlags::NOP;
    node.op = Some(Op::Nop);
}

/// Take over the last child's value (slot and constant-ness).
fn inherit_last_child(arena: &mut NodeArena, id: NodeId) {
    let Some(&last) = arena[id].children.last() else {
        return;
    };
    let slot = arena[last].slot;
    let constant = arena[last].constant.clone();
    let node = &mut arena[id];
    node.slot = slot;
    if constant.is_some() {
        node.flags |= NodeFlags::CONST;
        node.constant = constant;
    }
}

/// Thread non-leaf children in source order, returning to `id` at the end.
///
/// Unsupported leaves (`break`, `continue`, ...) are threaded too, so the
/// verifier sees them on the executable path instead of losing them.
fn wire_sequence(arena: &mut NodeArena, id: NodeId) {
    let steps: SmallVec<[NodeId; 4]> = arena[id]
        .children
        .iter()
        .copied()
        .filter(|&child| {
            let node = &arena[child];
            !node.is_leaf() || matches!(node.kind, NodeKind::Unsupported(_))
        })
        .collect();

    let start = steps.first().map_or(id, |&first| arena[first].start);
    arena[id].start = start;
    for pair in steps.windows(2) {
        let following = arena[pair[1]].start;
        arena[pair[0]].next = Some(following);
    }
    if let Some(&last) = steps.last() {
        arena[last].next = Some(id);
    }
}

/// The node whose value decides a branch: parentheses are see-through.
fn branch_point(arena: &NodeArena, cond: NodeId) -> NodeId {
    let mut node = cond;
    while arena[node].kind == NodeKind::ParenExpr {
        match arena[node].children.last() {
            Some(&inner) => node = inner,
            None => break,
        }
    }
    node
}

fn checked_branch_point(
    arena: &mut NodeArena,
    construct: &'static str,
    cond: NodeId,
) -> Result<NodeId, CompileError> {
    let point = branch_point(arena, cond);
    if arena[point].is_nop() {
        return Err(malformed(
            construct,
            format!("{} used as condition", arena[point].kind.label()),
            arena[point].span,
        ));
    }
    arena[point].flags |= NodeFlags::BRANCH;
    Ok(point)
}

/// `if cond { then } else { otherwise }`; the if-node is the merge point.
fn wire_if(arena: &mut NodeArena, id: NodeId) -> Result<(), CompileError> {
    let children = arena[id].children.clone();
    if !(2..=3).contains(&children.len()) {
        return Err(wrong_arity(
            "if statement",
            "a condition, a body and an optional else branch",
            children.len(),
            arena[id].span,
        ));
    }
    let (cond, then) = (children[0], children[1]);
    let decision = checked_branch_point(arena, "if statement", cond)?;

    mark_nop(arena, id);
    arena[id].start = arena[decision].start;
    arena[decision].next = Some(arena[then].start);
    arena[then].next = Some(id);
    match children.get(2) {
        Some(&otherwise) => {
            arena[decision].branch_next = Some(arena[otherwise].start);
            arena[otherwise].next = Some(id);
        }
        None => arena[decision].branch_next = Some(id),
    }
    Ok(())
}

/// `for init; cond; post { body }`; the for-node is the loop exit.
fn wire_for(arena: &mut NodeArena, id: NodeId) -> Result<(), CompileError> {
    let children = arena[id].children.clone();
    let &[init, cond, post, body] = children.as_slice() else {
        return Err(wrong_arity(
            "for statement",
            "init, condition, post and body",
            children.len(),
            arena[id].span,
        ));
    };
    let decision = checked_branch_point(arena, "for statement", cond)?;

    mark_nop(arena, id);
    let cond_start = arena[decision].start;
    arena[id].start = arena[init].start;
    arena[init].next = Some(cond_start);
    arena[decision].next = Some(arena[body].start);
    arena[decision].branch_next = Some(id);
    arena[body].next = Some(arena[post].start);
    arena[post].next = Some(cond_start);
    Ok(())
}
