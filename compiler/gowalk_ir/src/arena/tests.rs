use pretty_assertions::assert_eq;

use super::*;
use crate::Slot;

#[test]
fn test_alloc_starts_at_itself() {
    let mut arena = NodeArena::new();
    let x = arena.ident("x");
    let node = &arena[x];
    assert_eq!(node.start, x);
    assert_eq!(node.slot, Slot::NONE);
    assert_eq!(node.next, None);
    assert_eq!(node.branch_next, None);
    assert!(node.is_leaf());
    assert!(!node.is_nop());
    assert!(!node.is_const());
}

#[test]
fn test_children_keep_source_order() {
    let mut arena = NodeArena::new();
    let a = arena.ident("a");
    let b = arena.literal("1");
    let sum = arena.binary(BinaryOp::Add, a, b);
    assert_eq!(arena[sum].children.as_slice(), &[a, b]);
    assert!(!arena[sum].is_leaf());
}

#[test]
fn test_call_puts_callee_first() {
    let mut arena = NodeArena::new();
    let arg = arena.literal("3");
    let call = arena.call("fib", &[arg]);
    let fib = arena.intern("fib");
    let callee = arena[call].children[0];
    assert_eq!(arena[callee].kind, NodeKind::Ident(fib));
    assert_eq!(arena[call].children[1], arg);
}

#[test]
fn test_field_shapes() {
    let mut arena = NodeArena::new();
    let named = arena.field(&["a", "b"], "int");
    let anonymous = arena.field(&[], "int");
    assert_eq!(arena[named].children.len(), 3);
    assert_eq!(arena[anonymous].children.len(), 1);
    let ty = arena[anonymous].children[0];
    assert!(matches!(arena[ty].kind, NodeKind::TypeExpr(_)));
}

#[test]
fn test_func_decl_shape() {
    let mut arena = NodeArena::new();
    let params = arena.field_list(&[]);
    let body = arena.block(&[]);
    let decl = arena.func_decl("main", params, None, body);
    let children = arena[decl].children.clone();
    assert_eq!(children.len(), 3);
    assert_eq!(arena[children[1]].kind, NodeKind::FuncType);
    assert_eq!(arena[children[1]].children.as_slice(), &[params]);
    assert_eq!(children[2], body);
}

#[test]
fn test_iter_yields_allocation_order() {
    let mut arena = NodeArena::new();
    let a = arena.ident("a");
    let b = arena.ident("b");
    let ids: Vec<NodeId> = arena.iter().map(|(id, _)| id).collect();
    assert_eq!(ids, vec![a, b]);
    assert_eq!(arena.len(), 2);
    let a_name = arena.intern("a");
    assert_eq!(arena.text(a_name), "a");
}
