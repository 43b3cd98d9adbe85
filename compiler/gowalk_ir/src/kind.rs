//! Node kinds, operators, and the operation tags the builder attaches.
//!
//! The kind set is closed and known at design time, so dispatch is an
//! exhaustive `match` rather than runtime type inspection.

use crate::Name;

/// Syntax construct a [`Node`](crate::Node) represents.
///
/// Child layout per kind (a parser precondition, checked by the builder):
///
/// | Kind        | Children                                   |
/// |-------------|--------------------------------------------|
/// | `File`      | `FuncDecl`…                                |
/// | `FuncDecl`  | `Ident(name)`, `FuncType`, `Block(body)`   |
/// | `FuncType`  | `FieldList(params)`, `FieldList(results)`? |
/// | `FieldList` | `Field`…                                   |
/// | `Field`     | `Ident`…, `TypeExpr` or just `TypeExpr`    |
/// | `If`        | cond, then, else?                          |
/// | `For`       | init, cond, post, body                     |
/// | `Assign`    | left operands…, right operands…            |
/// | `Call`      | `Ident(callee)`, args…                     |
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum NodeKind {
    File,
    FuncDecl,
    FuncType,
    FieldList,
    /// Parameter or result declaration.
    Field,
    /// A type name; never evaluated.
    TypeExpr(Name),
    Block,
    ExprStmt,
    ParenExpr,
    If,
    For,
    Return,
    IncDec(IncDecOp),
    Assign(AssignOp),
    Binary(BinaryOp),
    Call,
    Ident(Name),
    /// Literal with its source text.
    Literal(Name),
    /// A construct the parser recognised but this core does not execute,
    /// labelled with the parser's name for it (e.g. `SwitchStmt`).
    Unsupported(Name),
}

impl NodeKind {
    /// Short label used in diagnostics.
    pub const fn label(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::FuncDecl => "function declaration",
            Self::FuncType => "function type",
            Self::FieldList => "field list",
            Self::Field => "field",
            Self::TypeExpr(_) => "type expression",
            Self::Block => "block",
            Self::ExprStmt => "expression statement",
            Self::ParenExpr => "parenthesized expression",
            Self::If => "if statement",
            Self::For => "for statement",
            Self::Return => "return statement",
            Self::IncDec(_) => "increment statement",
            Self::Assign(_) => "assignment",
            Self::Binary(_) => "binary expression",
            Self::Call => "call expression",
            Self::Ident(_) => "identifier",
            Self::Literal(_) => "literal",
            Self::Unsupported(_) => "unsupported construct",
        }
    }
}

/// Binary operators of the source language.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Quo,
    Rem,

    // Bitwise
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    AndNot,

    // Logical
    And,
    Or,

    // Comparison
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl BinaryOp {
    /// Returns the source-level symbol for this operator.
    pub const fn as_symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Quo => "/",
            Self::Rem => "%",
            Self::BitAnd => "&",
            Self::BitOr => "|",
            Self::BitXor => "^",
            Self::Shl => "<<",
            Self::Shr => ">>",
            Self::AndNot => "&^",
            Self::And => "&&",
            Self::Or => "||",
            Self::Eq => "==",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
        }
    }

    /// Whether the operator produces a boolean.
    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            Self::Eq | Self::NotEq | Self::Lt | Self::LtEq | Self::Gt | Self::GtEq
        )
    }
}

/// Assignment token.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum AssignOp {
    /// `=`: every left operand must already be declared.
    Assign,
    /// `:=`: left operands are declared by this statement.
    Define,
    /// `+=`, `-=`, …
    Compound(BinaryOp),
}

/// `++` or `--`.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum IncDecOp {
    Inc,
    Dec,
}

/// Executable behavior attached to a node by the builder.
///
/// Only nodes that can be reached at runtime carry an `Op`; declarations,
/// type expressions and unsupported constructs carry none.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Op {
    /// Structural node: do nothing, follow `next`.
    Nop,
    /// Leaf whose value is already in place (identifier or literal).
    Value,
    Binary(BinaryOp),
    IncDec(IncDecOp),
    Assign(AssignOp),
    Return,
    Call,
}
