//! Gowalk CFG - compiles function declarations into executable graphs.
//!
//! Pipeline per function:
//!
//! 1. [`build_function`]: one pre/post-order walk assigns frame slots
//!    (through a per-function [`ScopeTracker`]) and wires
//!    `start`/`next`/`branch_next` links.
//! 2. [`optimize`]: reroutes every link past structural no-op nodes.
//! 3. [`verify`]: checks the reachable graph so the engine never meets a
//!    node it cannot dispatch.
//!
//! [`compile_file`] runs the pipeline for every function in a file and
//! freezes the result into a [`Program`].

mod builder;
mod errors;
mod literal;
mod optimize;
mod program;
mod scope;
mod verify;

#[cfg(test)]
mod fixtures;

pub use builder::{build_function, has_binary_operation, FunctionLayout};
pub use errors::{CompileError, CompileErrorKind};
pub use literal::parse_literal;
pub use optimize::{optimize, skip_nops};
pub use program::{compile_file, compile_function, CompiledFunction, Program};
pub use scope::ScopeTracker;
pub use verify::verify;
