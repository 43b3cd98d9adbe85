//! Compilation errors.
//!
//! `CompileErrorKind` carries the structured category; factory functions
//! build a `CompileError` positioned at the offending node. An error aborts
//! compilation of the one function it occurred in and nothing else.

use std::fmt;

use gowalk_ir::{BinaryOp, Span};

/// Typed error category.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CompileErrorKind {
    /// A structural precondition on a control-flow construct is violated.
    MalformedControlFlowNode {
        construct: &'static str,
        problem: String,
    },
    /// An identifier is used without having been declared in this function.
    UnresolvedIdentifier { name: String },
    /// A node reachable at runtime has no registered operation.
    UnknownNodeKind { kind: String },
    /// A binary operator has no registered operation.
    UnknownOperator { op: BinaryOp },
    /// Two functions in one file share a name.
    DuplicateFunction { name: String },
    /// A slot outside the function's frame was assigned.
    SlotOutOfRange { slot: u32, frame_size: usize },
}

impl fmt::Display for CompileErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedControlFlowNode { construct, problem } => {
                write!(f, "malformed {construct}: {problem}")
            }
            Self::UnresolvedIdentifier { name } => write!(f, "undefined: {name}"),
            Self::UnknownNodeKind { kind } => write!(f, "no operation registered for {kind}"),
            Self::UnknownOperator { op } => {
                write!(f, "no operation registered for operator `{}`", op.as_symbol())
            }
            Self::DuplicateFunction { name } => write!(f, "{name} redeclared in this file"),
            Self::SlotOutOfRange { slot, frame_size } => {
                write!(f, "slot {slot} outside frame of size {frame_size}")
            }
        }
    }
}

/// A compilation failure with its source position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompileError {
    pub kind: CompileErrorKind,
    /// Position of the offending node.
    pub span: Span,
    /// Function being compiled, when known.
    pub function: Option<String>,
}

impl CompileError {
    pub fn new(kind: CompileErrorKind, span: Span) -> Self {
        Self {
            kind,
            span,
            function: None,
        }
    }

    /// Attach the enclosing function's name.
    #[must_use]
    pub fn in_function(mut self, name: impl Into<String>) -> Self {
        self.function = Some(name.into());
        self
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.function {
            Some(function) => write!(f, "{} (in {function} at {})", self.kind, self.span),
            None => write!(f, "{} (at {})", self.kind, self.span),
        }
    }
}

impl std::error::Error for CompileError {}

// Factory functions

pub fn malformed(construct: &'static str, problem: impl Into<String>, span: Span) -> CompileError {
    CompileError::new(
        CompileErrorKind::MalformedControlFlowNode {
            construct,
            problem: problem.into(),
        },
        span,
    )
}

/// Arity violation: `expected` describes the required children.
pub fn wrong_arity(
    construct: &'static str,
    expected: &'static str,
    found: usize,
    span: Span,
) -> CompileError {
    malformed(
        construct,
        format!("expected {expected}, found {found} children"),
        span,
    )
}

pub fn unresolved_identifier(name: &str, span: Span) -> CompileError {
    CompileError::new(
        CompileErrorKind::UnresolvedIdentifier {
            name: name.to_string(),
        },
        span,
    )
}

pub fn unknown_node_kind(kind: impl Into<String>, span: Span) -> CompileError {
    CompileError::new(CompileErrorKind::UnknownNodeKind { kind: kind.into() }, span)
}

pub fn unknown_operator(op: BinaryOp, span: Span) -> CompileError {
    CompileError::new(CompileErrorKind::UnknownOperator { op }, span)
}

pub fn duplicate_function(name: &str, span: Span) -> CompileError {
    CompileError::new(
        CompileErrorKind::DuplicateFunction {
            name: name.to_string(),
        },
        span,
    )
}

pub fn slot_out_of_range(slot: u32, frame_size: usize, span: Span) -> CompileError {
    CompileError::new(CompileErrorKind::SlotOutOfRange { slot, frame_size }, span)
}
