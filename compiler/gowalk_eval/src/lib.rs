//! Gowalk Eval - runs compiled graphs.
//!
//! # Architecture
//!
//! - `Interpreter`: entry point; owns policy (`EvalMode`, cancellation)
//!   and borrows a compiled `Program`
//! - `Frame`: one fixed-size slot array per activation
//! - `evaluate_binary` / `evaluate_inc_dec`: direct enum-based operator
//!   dispatch with checked integer arithmetic
//! - `CallStack`: explicit call tracking for depth limits and backtraces
//!
//! The compiled graph is never written at runtime, so concurrent calls
//! share it freely and differ only in their frames.

mod cancel;
mod diagnostics;
pub mod errors;
mod eval_mode;
mod frame;
mod interpreter;
mod operators;
mod value;

use std::sync::Once;

pub use cancel::CancellationToken;
pub use diagnostics::{CallFrame, CallStack};
pub use errors::{BacktraceFrame, EvalBacktrace, EvalError, EvalErrorKind, EvalResult};
pub use eval_mode::{EvalMode, DEFAULT_MAX_CALL_DEPTH};
pub use frame::Frame;
pub use interpreter::Interpreter;
pub use operators::{evaluate_binary, evaluate_inc_dec};
pub use value::Value;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Safe to call multiple times. Enable with `RUST_LOG=gowalk_eval=trace`
/// (per-node steps) or `RUST_LOG=gowalk_cfg=debug` (per-function
/// compilation).
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}
