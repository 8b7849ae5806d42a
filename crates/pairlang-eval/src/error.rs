//! Runtime error types for the evaluator.

use pairlang_types::{ErrorKind, Name, Value};
use thiserror::Error;

/// Evaluation error.
///
/// The display text of each variant is the error contract shared with the
/// reference evaluator in `pairlang-host`; both must render identical text.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// A variable reached evaluation without being substituted.
    #[error("{0}: unbound identifier")]
    FreeVariable(Name),

    /// `if` test evaluated to a non-boolean.
    #[error("if: test expression must be a boolean")]
    NonBooleanTest,

    /// `+` / `<=` operand that is not a number. `given` is the leftmost
    /// offending operand and `position` its 1-based argument position.
    #[error(
        "{op}: contract violation; expected: number?; given: {given}; argument position: {}; other argument: {other}",
        ordinal(.position)
    )]
    TypeMismatch {
        op: &'static str,
        position: usize,
        given: Value,
        other: Value,
    },

    /// `head` / `tail` applied to a non-pair.
    #[error("{op}: contract violation; expected: pair?; given: {given}")]
    NotAPair { op: &'static str, given: Value },

    #[error("internal error: {0}")]
    Internal(String),
}

impl EvalError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EvalError::FreeVariable(_) => ErrorKind::FreeVariable,
            EvalError::NonBooleanTest => ErrorKind::NonBooleanTest,
            EvalError::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            EvalError::NotAPair { .. } => ErrorKind::NotAPair,
            EvalError::Internal(_) => ErrorKind::Internal,
        }
    }
}

/// `1st`, `2nd`, `3rd`, `4th`, ..., `11th`, ..., `21st`.
fn ordinal(position: &usize) -> String {
    let suffix = match (position % 10, position % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{position}{suffix}")
}


/// Result alias for evaluator operations.
pub type EvalResult<T> = Result<T, EvalError>;
