//! Post-optimization checks over the reachable graph.
//!
//! Everything the engine will touch is checked here, once, so the engine
//! can trust the graph: each reachable node has an operation, each operand
//! it reads has a value source, every slot fits the frame, and no link
//! lands on a no-op.

use gowalk_ir::{AssignOp, Node, NodeArena, NodeId, NodeKind, Op};
use rustc_hash::FxHashSet;

use crate::errors::{malformed, slot_out_of_range, unknown_node_kind, CompileError};

/// Verify the graph reachable from `entry`.
pub fn verify(
    arena: &NodeArena,
    entry: Option<NodeId>,
    frame_size: usize,
    results: u32,
) -> Result<(), CompileError> {
    let mut seen = FxHashSet::default();
    let mut pending: Vec<NodeId> = entry.into_iter().collect();

    while let Some(id) = pending.pop() {
        if !seen.insert(id) {
            continue;
        }
        let node = &arena[id];
        let Some(op) = node.op else {
            return Err(unknown_node_kind(describe(arena, node), node.span));
        };
        check_slot(node, frame_size)?;
        if node.is_branch() && !matches!(op, Op::Value | Op::Binary(_) | Op::Call) {
            return Err(malformed(
                "condition",
                format!("{} does not produce a value", describe(arena, node)),
                node.span,
            ));
        }

        match op {
            Op::Nop => {}
            Op::Value => check_operand(arena, id, frame_size)?,
            Op::Binary(_) => {
                for &child in &node.children {
                    check_operand(arena, child, frame_size)?;
                }
            }
            Op::IncDec(_) => {
                check_target(arena, node.children[0], "increment statement")?;
            }
            Op::Assign(op) => {
                let half = match op {
                    AssignOp::Compound(_) => 1,
                    AssignOp::Assign | AssignOp::Define => node.children.len() / 2,
                };
                let (targets, values) = node.children.split_at(half);
                for &target in targets {
                    check_target(arena, target, "assignment")?;
                }
                for &value in values {
                    check_operand(arena, value, frame_size)?;
                }
            }
            Op::Return => {
                let count = node.children.len();
                if count != 0 && count != results as usize {
                    return Err(malformed(
                        "return statement",
                        format!("function has {results} results, returning {count} values"),
                        node.span,
                    ));
                }
                for &child in &node.children {
                    check_operand(arena, child, frame_size)?;
                }
            }
            Op::Call => {
                for &arg in &node.children[1..] {
                    check_operand(arena, arg, frame_size)?;
                }
            }
        }

        for successor in [node.next, node.branch_next].into_iter().flatten() {
            if arena[successor].is_nop() {
                return Err(malformed(
                    "control-flow link",
                    format!(
                        "{} still targets a no-op {}",
                        describe(arena, node),
                        describe(arena, &arena[successor])
                    ),
                    node.span,
                ));
            }
            pending.push(successor);
        }
    }
    Ok(())
}

fn describe(arena: &NodeArena, node: &Node) -> String {
    match node.kind {
        NodeKind::Unsupported(label) => arena.text(label).to_string(),
        kind => kind.label().to_string(),
    }
}

fn check_slot(node: &Node, frame_size: usize) -> Result<(), CompileError> {
    if node.slot.index() >= frame_size {
        return Err(slot_out_of_range(node.slot.raw(), frame_size, node.span));
    }
    Ok(())
}

/// An operand must be a constant or live in a frame slot.
fn check_operand(arena: &NodeArena, id: NodeId, frame_size: usize) -> Result<(), CompileError> {
    let node = &arena[id];
    if node.is_const() {
        return Ok(());
    }
    if !node.slot.is_assigned() {
        return Err(unknown_node_kind(
            format!("{} as operand", describe(arena, node)),
            node.span,
        ));
    }
    check_slot(node, frame_size)
}

/// A store target must be a slot that is not a constant.
fn check_target(arena: &NodeArena, id: NodeId, construct: &'static str) -> Result<(), CompileError> {
    let node = &arena[id];
    if node.is_const() || !node.slot.is_assigned() {
        return Err(malformed(
            construct,
            format!("cannot assign to {}", describe(arena, node)),
            node.span,
        ));
    }
    Ok(())
}
