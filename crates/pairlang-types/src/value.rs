//! Runtime values.

use std::fmt;

use serde::Serialize;

use crate::ast::Expr;

/// The result of evaluating an expression.
///
/// Values never contain unevaluated expressions or variable names.
#[derive(Debug, Clone, Serialize)]
pub enum Value {
    Number(f64),
    Bool(bool),
    Pair(Box<Value>, Box<Value>),
}

impl Value {
    pub fn pair(first: Value, second: Value) -> Self {
        Self::Pair(Box::new(first), Box::new(second))
    }

    /// The literal expression that evaluates back to this value.
    pub fn to_expr(&self) -> Expr {
        match self {
            Value::Number(n) => Expr::Number(*n),
            Value::Bool(b) => Expr::Bool(*b),
            Value::Pair(first, second) => Expr::pair(first.to_expr(), second.to_expr()),
        }
    }
}

/// Numbers compare by bit pattern so that `0` and `-0` stay distinguishable.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a.to_bits() == b.to_bits(),
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Pair(a1, a2), Value::Pair(b1, b2)) => a1 == b1 && a2 == b2,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write_number(*n, f),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Pair(first, second) => write!(f, "({first} . {second})"),
        }
    }
}

/// Shortest round-trip rendering: `3`, `-0`, `2.5`.
pub(crate) fn write_number(n: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{n}")
}
