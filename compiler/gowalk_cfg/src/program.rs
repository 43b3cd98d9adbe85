//! Whole-file compilation.
//!
//! Each function declaration goes through build → optimize → verify on its
//! own; a failure is recorded and the remaining functions still compile.
//! The resulting [`Program`] owns the arena, so the compiled graph cannot
//! be mutated once execution is possible.

use gowalk_ir::{Name, NodeArena, NodeId, NodeKind, Slot};
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::builder::build_function;
use crate::errors::{duplicate_function, unknown_node_kind, CompileError};
use crate::optimize::{optimize, skip_nops};
use crate::verify::verify;

/// Everything the engine needs to invoke one function.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompiledFunction {
    pub name: Name,
    pub decl: NodeId,
    /// First node to execute; `None` for an empty body.
    pub entry: Option<NodeId>,
    pub frame_size: usize,
    pub params: SmallVec<[Slot; 4]>,
    pub results: u32,
}

/// Compile the function declared at `decl` in place.
#[tracing::instrument(level = "debug", skip_all, fields(decl = decl.raw()))]
pub fn compile_function(
    arena: &mut NodeArena,
    decl: NodeId,
) -> Result<CompiledFunction, CompileError> {
    let name = function_name(arena, decl);
    let compiled = compile_checked(arena, decl, name);
    compiled.map_err(|err| match name {
        Some(name) => err.in_function(arena.text(name)),
        None => err,
    })
}

fn compile_checked(
    arena: &mut NodeArena,
    decl: NodeId,
    name: Option<Name>,
) -> Result<CompiledFunction, CompileError> {
    let layout = build_function(arena, decl)?;
    optimize(arena, decl);
    let entry = skip_nops(arena, Some(arena[decl].start));
    verify(arena, entry, layout.frame_size, layout.results)?;

    tracing::debug!(
        function = name.map_or("", |name| arena.text(name)),
        frame_size = layout.frame_size,
        results = layout.results,
        "compiled function"
    );
    Ok(CompiledFunction {
        name: name.unwrap_or(Name::EMPTY),
        decl,
        entry,
        frame_size: layout.frame_size,
        params: layout.params,
        results: layout.results,
    })
}

fn function_name(arena: &NodeArena, decl: NodeId) -> Option<Name> {
    let &first = arena[decl].children.first()?;
    match arena[first].kind {
        NodeKind::Ident(name) => Some(name),
        _ => None,
    }
}

/// A compiled file: the frozen node graph plus its function table.
pub struct Program {
    arena: NodeArena,
    functions: FxHashMap<Name, CompiledFunction>,
}

impl Program {
    pub fn arena(&self) -> &NodeArena {
        &self.arena
    }

    /// Look up a compiled function by source name.
    pub fn function(&self, name: &str) -> Option<&CompiledFunction> {
        let name = self.arena.interner().get(name)?;
        self.functions.get(&name)
    }

    /// Look up a compiled function by interned name.
    pub fn get(&self, name: Name) -> Option<&CompiledFunction> {
        self.functions.get(&name)
    }

    pub fn functions(&self) -> impl Iterator<Item = &CompiledFunction> {
        self.functions.values()
    }

    /// Source name of a compiled function.
    pub fn name_of(&self, function: &CompiledFunction) -> &str {
        self.arena.text(function.name)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

/// Compile every function declared in `file`.
///
/// Returns the program together with one error per function that failed to
/// compile; failed functions are absent from the program.
#[tracing::instrument(level = "debug", skip_all)]
pub fn compile_file(mut arena: NodeArena, file: NodeId) -> (Program, Vec<CompileError>) {
    let mut functions = FxHashMap::default();
    let mut seen = FxHashSet::default();
    let mut errors = Vec::new();

    let decls: SmallVec<[NodeId; 8]> = match arena[file].kind {
        NodeKind::File => arena[file].children.iter().copied().collect(),
        NodeKind::FuncDecl => SmallVec::from_slice(&[file]),
        kind => {
            errors.push(unknown_node_kind(
                format!("{} at file position", kind.label()),
                arena[file].span,
            ));
            SmallVec::new()
        }
    };

    for decl in decls {
        match arena[decl].kind {
            NodeKind::FuncDecl => {}
            NodeKind::Unsupported(label) => {
                tracing::debug!(construct = arena.text(label), "skipping top-level declaration");
                continue;
            }
            kind => {
                errors.push(unknown_node_kind(
                    format!("{} at top level", kind.label()),
                    arena[decl].span,
                ));
                continue;
            }
        }

        if let Some(name) = function_name(&arena, decl) {
            if !seen.insert(name) {
                errors.push(duplicate_function(arena.text(name), arena[decl].span));
                continue;
            }
        }

        match compile_function(&mut arena, decl) {
            Ok(function) => {
                functions.insert(function.name, function);
            }
            Err(err) => errors.push(err),
        }
    }

    tracing::debug!(
        compiled = functions.len(),
        failed = errors.len(),
        "compiled file"
    );
    (Program { arena, functions }, errors)
}
