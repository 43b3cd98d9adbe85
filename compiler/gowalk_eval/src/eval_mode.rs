//! Evaluation modes.
//!
//! The host picks a policy per `Interpreter`; the engine asks the mode for
//! its limits instead of hard-coding them.

/// Default call-depth limit for [`EvalMode::Interpret`].
pub const DEFAULT_MAX_CALL_DEPTH: usize = 10_000;

/// Evaluation policy.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum EvalMode {
    /// Run to completion with the default call-depth limit.
    #[default]
    Interpret,
    /// Tight limits for untrusted or embedded use.
    Bounded {
        /// Maximum number of simultaneously active calls.
        max_call_depth: usize,
        /// Maximum number of executed nodes per top-level call.
        step_budget: Option<u64>,
    },
}

impl EvalMode {
    /// Maximum number of simultaneously active calls.
    #[inline]
    pub fn max_call_depth(&self) -> usize {
        match self {
            Self::Interpret => DEFAULT_MAX_CALL_DEPTH,
            Self::Bounded { max_call_depth, .. } => *max_call_depth,
        }
    }

    /// Node-step budget per top-level call, or `None` for unlimited.
    #[inline]
    pub fn step_budget(&self) -> Option<u64> {
        match self {
            Self::Interpret => None,
            Self::Bounded { step_budget, .. } => *step_budget,
        }
    }
}
