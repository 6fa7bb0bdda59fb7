//! Runtime faults.
//!
//! A fault is a checked return, not an unwind: every node that can observe
//! a failing child returns its `Err` unchanged with `?`. The context records
//! the fault in its slot when it reaches a catch boundary or the root.

use std::fmt;

use rill_ir::{Register, Span};

use crate::FunctionId;

/// Result of evaluating one node.
pub type EvalResult = Result<Register, Fault>;

/// Category of a runtime fault.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FaultKind {
    /// Access through an address that does not name readable (or, for
    /// stores, writable) memory of the requested size.
    InvalidAddress,
    DivisionByZero,
    ModuloByZero,
    /// The script stack segment would exceed its limit, or the call depth
    /// its maximum.
    StackOverflow,
    /// `eval_ref` on a node that does not denote storage.
    NotAReference,
    /// `GetArgument` past the current frame's argument count.
    ArgumentOutOfRange { index: u32, count: u32 },
    /// An operator applied to a type it is not defined on.
    UnsupportedOperator { op: &'static str, ty: &'static str },
    /// A call to a function id the program does not contain.
    UnknownFunction(FunctionId),
    /// Raised by a language-level `throw`.
    Thrown { message: String },
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaultKind::InvalidAddress => f.write_str("invalid address"),
            FaultKind::DivisionByZero => f.write_str("division by zero"),
            FaultKind::ModuloByZero => f.write_str("modulo by zero"),
            FaultKind::StackOverflow => f.write_str("stack overflow"),
            FaultKind::NotAReference => f.write_str("expression is not a reference"),
            FaultKind::ArgumentOutOfRange { index, count } => {
                write!(f, "argument {index} out of range ({count} passed)")
            }
            FaultKind::UnsupportedOperator { op, ty } => {
                write!(f, "operator `{op}` is not defined on `{ty}`")
            }
            FaultKind::UnknownFunction(id) => write!(f, "unknown function #{}", id.index()),
            FaultKind::Thrown { message } => f.write_str(message),
        }
    }
}

/// A runtime fault with the location of the node that raised it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fault {
    pub kind: FaultKind,
    pub span: Option<Span>,
}

impl Fault {
    pub fn new(kind: FaultKind) -> Self {
        Fault { kind, span: None }
    }

    /// Attach `span` unless a more precise one is already present.
    #[must_use]
    pub fn at(mut self, span: Span) -> Self {
        if self.span.is_none() {
            self.span = Some(span);
        }
        self
    }

    pub fn thrown(message: impl Into<String>) -> Self {
        Fault::new(FaultKind::Thrown {
            message: message.into(),
        })
    }
}

impl From<FaultKind> for Fault {
    fn from(kind: FaultKind) -> Self {
        Fault::new(kind)
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.span {
            Some(span) => write!(f, "{} at {span}", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for Fault {}
