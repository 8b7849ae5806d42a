//! Host-side faults and reference evaluator errors.

use std::fmt;

use pairlang_codegen::CodegenError;
use pairlang_types::{ErrorKind, Name, Value};
use thiserror::Error;

use crate::decode::{DecodeError, Primitive};

/// A fault the compiled module reported through one of its `env` imports.
#[derive(Debug, Clone, PartialEq)]
pub enum HostFault {
    /// `env.unbound`: the name, with its namespace prefix removed.
    Unbound(Name),
    /// `env.trap`: the message the module stored for the failed `if` guard.
    NonBooleanTest(String),
    /// `env.contract_violation`.
    ContractViolation {
        op: Primitive,
        /// 1-based argument position of `given`.
        position: u32,
        given: Value,
        /// The remaining operand of a binary primitive.
        other: Option<Value>,
    },
}

impl HostFault {
    pub fn kind(&self) -> ErrorKind {
        match self {
            HostFault::Unbound(_) => ErrorKind::FreeVariable,
            HostFault::NonBooleanTest(_) => ErrorKind::NonBooleanTest,
            HostFault::ContractViolation { op, .. } if op.is_numeric() => ErrorKind::TypeMismatch,
            HostFault::ContractViolation { .. } => ErrorKind::NotAPair,
        }
    }
}

impl fmt::Display for HostFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostFault::Unbound(name) => write!(f, "{name}: unbound identifier"),
            HostFault::NonBooleanTest(message) => f.write_str(message),
            HostFault::ContractViolation {
                op,
                position,
                given,
                other,
            } => {
                write!(
                    f,
                    "{op}: contract violation; expected: {}; given: {given}",
                    op.expected()
                )?;
                if let Some(other) = other {
                    write!(
                        f,
                        "; argument position: {}; other argument: {other}",
                        Ordinal(*position)
                    )?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for HostFault {}

/// English ordinal suffix for an argument position.
struct Ordinal(u32);

impl fmt::Display for Ordinal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suffix = match (self.0 % 10, self.0 % 100) {
            (_, 11..=13) => "th",
            (1, _) => "st",
            (2, _) => "nd",
            (3, _) => "rd",
            _ => "th",
        };
        write!(f, "{}{suffix}", self.0)
    }
}

/// Errors from the reference evaluator.
///
/// Only [`HostError::Fault`] reflects the program being evaluated; every
/// other variant means the host machinery itself failed and renders as an
/// internal error.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("{0}")]
    Fault(HostFault),

    #[error("internal error: {0}")]
    Codegen(#[from] CodegenError),

    #[error("internal error: wasm engine: {0}")]
    Engine(String),

    #[error("internal error: {0}")]
    Decode(#[from] DecodeError),

    /// The module trapped without calling a fault import first.
    #[error("internal error: unreported trap: {0}")]
    UnreportedTrap(String),
}

impl HostError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            HostError::Fault(fault) => fault.kind(),
            _ => ErrorKind::Internal,
        }
    }

    pub(crate) fn engine(err: impl fmt::Display) -> Self {
        HostError::Engine(err.to_string())
    }
}

impl From<HostFault> for HostError {
    fn from(fault: HostFault) -> Self {
        HostError::Fault(fault)
    }
}

/// Result alias for reference evaluation.
pub type HostResult<T> = Result<T, HostError>;
