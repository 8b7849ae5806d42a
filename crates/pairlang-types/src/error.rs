//! Failure classification and normalized evaluation outcomes.

use std::fmt;

use serde::Serialize;

use crate::value::Value;

/// The class of a failed evaluation.
///
/// Both evaluators classify their failures into these kinds; the error text
/// for each kind is fixed and must agree between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ErrorKind {
    /// Reference to a name no enclosing binding provides.
    FreeVariable,
    /// `if` test that evaluated to something other than a boolean.
    NonBooleanTest,
    /// `+` or `<=` applied to an operand that is not a number.
    TypeMismatch,
    /// `head` or `tail` applied to something other than a pair.
    NotAPair,
    /// A state the evaluator considers unreachable.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::FreeVariable => "free variable",
            ErrorKind::NonBooleanTest => "non-boolean test",
            ErrorKind::TypeMismatch => "type mismatch",
            ErrorKind::NotAPair => "not a pair",
            ErrorKind::Internal => "internal",
        };
        f.write_str(label)
    }
}

/// An evaluation result with failures flattened to their message text.
///
/// Two outcomes are equal when they hold equal values or identical text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Value(Value),
    Error(String),
}

impl Outcome {
    /// Flatten an evaluator result, keeping only the error's display text.
    pub fn from_result<E: fmt::Display>(result: Result<Value, E>) -> Self {
        match result {
            Ok(value) => Outcome::Value(value),
            Err(err) => Outcome::Error(err.to_string()),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Outcome::Error(_))
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Value(value) => write!(f, "value {value}"),
            Outcome::Error(message) => write!(f, "error \"{message}\""),
        }
    }
}
