//! Runtime errors.
//!
//! Factory functions build an `EvalError` with just its kind; the engine
//! attaches the failing node's span and a backtrace of the active calls
//! before the error leaves the interpreter.

use std::fmt;

use gowalk_ir::{BinaryOp, Span};

/// Structured runtime error category.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EvalErrorKind {
    // Arithmetic
    DivisionByZero,
    ModuloByZero,
    IntegerOverflow {
        operation: &'static str,
    },

    // Operators
    InvalidBinaryOp {
        type_name: &'static str,
        op: BinaryOp,
    },
    BinaryTypeMismatch {
        left: &'static str,
        right: &'static str,
    },
    NonBoolCondition {
        type_name: &'static str,
    },

    // Frames
    SlotOutOfBounds {
        slot: u32,
        frame_size: usize,
    },
    NotExecutable {
        kind: &'static str,
    },

    // Calls
    UndefinedFunction {
        name: String,
    },
    WrongArgCount {
        function: String,
        expected: usize,
        got: usize,
    },
    CallDepthExceeded {
        depth: usize,
    },

    // Host control
    StepBudgetExceeded {
        budget: u64,
    },
    Cancelled,
}

impl fmt::Display for EvalErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DivisionByZero => write!(f, "integer division by zero"),
            Self::ModuloByZero => write!(f, "integer modulo by zero"),
            Self::IntegerOverflow { operation } => write!(f, "integer overflow in {operation}"),
            Self::InvalidBinaryOp { type_name, op } => write!(
                f,
                "operator `{}` not defined on {type_name}",
                op.as_symbol()
            ),
            Self::BinaryTypeMismatch { left, right } => {
                write!(f, "mismatched types {left} and {right}")
            }
            Self::NonBoolCondition { type_name } => {
                write!(f, "non-boolean condition of type {type_name}")
            }
            Self::SlotOutOfBounds { slot, frame_size } => {
                write!(f, "slot {slot} out of bounds for frame of size {frame_size}")
            }
            Self::NotExecutable { kind } => write!(f, "{kind} has no operation"),
            Self::UndefinedFunction { name } => write!(f, "undefined function: {name}"),
            Self::WrongArgCount {
                function,
                expected,
                got,
            } => write!(f, "{function} expects {expected} arguments, got {got}"),
            Self::CallDepthExceeded { depth } => {
                write!(f, "maximum call depth of {depth} exceeded")
            }
            Self::StepBudgetExceeded { budget } => {
                write!(f, "step budget of {budget} exhausted")
            }
            Self::Cancelled => write!(f, "evaluation cancelled"),
        }
    }
}

/// One active call at the moment an error was raised.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BacktraceFrame {
    /// Function name.
    pub name: String,
    /// Call site in the caller; `None` for the outermost call.
    pub span: Option<Span>,
}

/// Snapshot of the call stack at an error site, innermost call first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EvalBacktrace {
    frames: Vec<BacktraceFrame>,
}

impl EvalBacktrace {
    pub fn new(frames: Vec<BacktraceFrame>) -> Self {
        Self { frames }
    }

    pub fn frames(&self) -> &[BacktraceFrame] {
        &self.frames
    }

    /// Function names, innermost first.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.frames.iter().map(|frame| frame.name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }
}

impl fmt::Display for EvalBacktrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.frames.is_empty() {
            return Ok(());
        }
        writeln!(f, "stack backtrace:")?;
        for (i, frame) in self.frames.iter().enumerate() {
            write!(f, "  {i}: {}", frame.name)?;
            if let Some(span) = frame.span {
                write!(f, " called at {span}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Evaluation error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvalError {
    pub kind: EvalErrorKind,
    /// Node that failed.
    pub span: Option<Span>,
    /// Active calls when the error was raised.
    pub backtrace: EvalBacktrace,
}

impl EvalError {
    pub fn new(kind: EvalErrorKind) -> Self {
        Self {
            kind,
            span: None,
            backtrace: EvalBacktrace::default(),
        }
    }

    /// Attach the failing node's span, unless one is already set.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span.get_or_insert(span);
        self
    }

    #[must_use]
    pub fn with_backtrace(mut self, backtrace: EvalBacktrace) -> Self {
        self.backtrace = backtrace;
        self
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(span) = self.span {
            write!(f, " at {span}")?;
        }
        if !self.backtrace.is_empty() {
            write!(f, "\n{}", self.backtrace)?;
        }
        Ok(())
    }
}

impl std::error::Error for EvalError {}

/// Result of evaluating one operation.
pub type EvalResult<T = crate::Value> = Result<T, EvalError>;

// Arithmetic

#[cold]
pub fn division_by_zero() -> EvalError {
    EvalError::new(EvalErrorKind::DivisionByZero)
}

#[cold]
pub fn modulo_by_zero() -> EvalError {
    EvalError::new(EvalErrorKind::ModuloByZero)
}

#[cold]
pub fn integer_overflow(operation: &'static str) -> EvalError {
    EvalError::new(EvalErrorKind::IntegerOverflow { operation })
}

// Operators

#[cold]
pub fn invalid_binary_op_for(type_name: &'static str, op: BinaryOp) -> EvalError {
    EvalError::new(EvalErrorKind::InvalidBinaryOp { type_name, op })
}

#[cold]
pub fn binary_type_mismatch(left: &'static str, right: &'static str) -> EvalError {
    EvalError::new(EvalErrorKind::BinaryTypeMismatch { left, right })
}

#[cold]
pub fn non_bool_condition(type_name: &'static str) -> EvalError {
    EvalError::new(EvalErrorKind::NonBoolCondition { type_name })
}

// Frames

#[cold]
pub fn slot_out_of_bounds(slot: u32, frame_size: usize) -> EvalError {
    EvalError::new(EvalErrorKind::SlotOutOfBounds { slot, frame_size })
}

#[cold]
pub fn not_executable(kind: &'static str) -> EvalError {
    EvalError::new(EvalErrorKind::NotExecutable { kind })
}

// Calls

#[cold]
pub fn undefined_function(name: &str) -> EvalError {
    EvalError::new(EvalErrorKind::UndefinedFunction {
        name: name.to_string(),
    })
}

#[cold]
pub fn wrong_arg_count(function: &str, expected: usize, got: usize) -> EvalError {
    EvalError::new(EvalErrorKind::WrongArgCount {
        function: function.to_string(),
        expected,
        got,
    })
}

#[cold]
pub fn call_depth_exceeded(depth: usize) -> EvalError {
    EvalError::new(EvalErrorKind::CallDepthExceeded { depth })
}

// Host control

#[cold]
pub fn step_budget_exceeded(budget: u64) -> EvalError {
    EvalError::new(EvalErrorKind::StepBudgetExceeded { budget })
}

#[cold]
pub fn cancelled() -> EvalError {
    EvalError::new(EvalErrorKind::Cancelled)
}
