//! Hand-built syntax trees shared by the unit tests.

use gowalk_ir::{AssignOp, BinaryOp, IncDecOp, NodeArena, NodeId};

/// Parameter list with one `int` field per name.
pub fn params(arena: &mut NodeArena, names: &[&str]) -> NodeId {
    let fields: Vec<NodeId> = names.iter().map(|name| arena.field(&[*name], "int")).collect();
    arena.field_list(&fields)
}

/// Result list of `count` anonymous `int` fields.
pub fn results(arena: &mut NodeArena, count: usize) -> NodeId {
    let fields: Vec<NodeId> = (0..count).map(|_| arena.field(&[], "int")).collect();
    arena.field_list(&fields)
}

/// `func name(params…) (int × results) { body… }`
pub fn func(
    arena: &mut NodeArena,
    name: &str,
    param_names: &[&str],
    result_count: usize,
    body: &[NodeId],
) -> NodeId {
    let params = params(arena, param_names);
    let results = (result_count > 0).then(|| results(arena, result_count));
    let body = arena.block(body);
    arena.func_decl(name, params, results, body)
}

/// ```text
/// func sum(n int) int {
///     s := 0
///     for i := 0; i < n; i++ {
///         if (i < 2) { s += i } else { s = s + 1 }
///     }
///     return s
/// }
/// ```
pub fn loop_sum(arena: &mut NodeArena) -> NodeId {
    let s = arena.ident("s");
    let zero = arena.literal("0");
    let s_def = arena.assign(AssignOp::Define, &[s], &[zero]);

    let i = arena.ident("i");
    let zero = arena.literal("0");
    let init = arena.assign(AssignOp::Define, &[i], &[zero]);
    let i = arena.ident("i");
    let n = arena.ident("n");
    let cond = arena.binary(BinaryOp::Lt, i, n);
    let i = arena.ident("i");
    let post = arena.inc_dec(IncDecOp::Inc, i);

    let i = arena.ident("i");
    let two = arena.literal("2");
    let small = arena.binary(BinaryOp::Lt, i, two);
    let small = arena.paren(small);
    let s = arena.ident("s");
    let i = arena.ident("i");
    let add_i = arena.assign(AssignOp::Compound(BinaryOp::Add), &[s], &[i]);
    let then = arena.block(&[add_i]);
    let s = arena.ident("s");
    let s_rhs = arena.ident("s");
    let one = arena.literal("1");
    let plus_one = arena.binary(BinaryOp::Add, s_rhs, one);
    let bump = arena.assign(AssignOp::Assign, &[s], &[plus_one]);
    let otherwise = arena.block(&[bump]);
    let branch = arena.if_stmt(small, then, Some(otherwise));
    let body = arena.block(&[branch]);

    let looped = arena.for_stmt(init, cond, post, body);
    let s = arena.ident("s");
    let ret = arena.return_stmt(&[s]);
    func(arena, "sum", &["n"], 1, &[s_def, looped, ret])
}
