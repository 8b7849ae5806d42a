//! Core expression evaluator.

use pairlang_types::{Expr, Value};

use crate::error::{EvalError, EvalResult};
use crate::subst::substitute;

/// Evaluate an expression to a value.
///
/// Operands are evaluated left to right and evaluation stops at the first
/// failure.
///
/// Recursion follows the nesting of `expr`, so stack use grows with its
/// depth: a few KiB per level in debug builds. Hand-built expressions
/// several hundred levels deep can exhaust a 2 MiB thread stack; generated
/// ones are bounded by `max_depth`.
pub fn evaluate(expr: &Expr) -> EvalResult<Value> {
    match expr {
        Expr::Number(n) => Ok(Value::Number(*n)),
        Expr::Bool(b) => Ok(Value::Bool(*b)),
        Expr::Var(name) => Err(EvalError::FreeVariable(name.clone())),

        Expr::Sum(lhs, rhs) => {
            let (a, b) = eval_numeric_operands("+", lhs, rhs)?;
            Ok(Value::Number(a + b))
        }
        Expr::Less(lhs, rhs) => {
            let (a, b) = eval_numeric_operands("<=", lhs, rhs)?;
            Ok(Value::Bool(a <= b))
        }

        Expr::Bind { name, bound, body } => {
            let value = evaluate(bound)?;
            evaluate(&substitute(name, &value, body))
        }

        Expr::If {
            test,
            then_branch,
            else_branch,
        } => match evaluate(test)? {
            Value::Bool(true) => evaluate(then_branch),
            Value::Bool(false) => evaluate(else_branch),
            _ => Err(EvalError::NonBooleanTest),
        },

        Expr::Pair(first, second) => {
            let first = evaluate(first)?;
            let second = evaluate(second)?;
            Ok(Value::pair(first, second))
        }
        Expr::Head(inner) => match evaluate(inner)? {
            Value::Pair(first, _) => Ok(*first),
            given => Err(EvalError::NotAPair { op: "head", given }),
        },
        Expr::Tail(inner) => match evaluate(inner)? {
            Value::Pair(_, second) => Ok(*second),
            given => Err(EvalError::NotAPair { op: "tail", given }),
        },
    }
}

/// Evaluate both operands of a numeric primitive and require numbers.
///
/// When both operands are ill-typed the left one is reported.
fn eval_numeric_operands(op: &'static str, lhs: &Expr, rhs: &Expr) -> EvalResult<(f64, f64)> {
    let lv = evaluate(lhs)?;
    let rv = evaluate(rhs)?;
    match (lv, rv) {
        (Value::Number(a), Value::Number(b)) => Ok((a, b)),
        (other @ Value::Number(_), given) => Err(EvalError::TypeMismatch {
            op,
            position: 2,
            given,
            other,
        }),
        (given, other) => Err(EvalError::TypeMismatch {
            op,
            position: 1,
            given,
            other,
        }),
    }
}
