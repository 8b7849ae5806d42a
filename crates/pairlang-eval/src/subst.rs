//! Value substitution for `let`.
//!
//! The substituted value is fully evaluated and contains no names, so
//! substitution never captures and never needs to rename binders.

use pairlang_types::{Expr, Value};

/// Replace every free occurrence of `name` in `expr` with the literal form
/// of `value`.
///
/// An inner `let` of the same name shadows: its bound expression is still
/// substituted, its body is left untouched.
pub fn substitute(name: &str, value: &Value, expr: &Expr) -> Expr {
    match expr {
        Expr::Number(_) | Expr::Bool(_) => expr.clone(),
        Expr::Var(var) if var == name => value.to_expr(),
        Expr::Var(_) => expr.clone(),
        Expr::Sum(lhs, rhs) => Expr::sum(
            substitute(name, value, lhs),
            substitute(name, value, rhs),
        ),
        Expr::Less(lhs, rhs) => Expr::less(
            substitute(name, value, lhs),
            substitute(name, value, rhs),
        ),
        Expr::Bind {
            name: inner,
            bound,
            body,
        } => {
            let bound = substitute(name, value, bound);
            let body = if inner == name {
                body.as_ref().clone()
            } else {
                substitute(name, value, body)
            };
            Expr::bind(inner.clone(), bound, body)
        }
        Expr::If {
            test,
            then_branch,
            else_branch,
        } => Expr::if_then_else(
            substitute(name, value, test),
            substitute(name, value, then_branch),
            substitute(name, value, else_branch),
        ),
        Expr::Pair(first, second) => Expr::pair(
            substitute(name, value, first),
            substitute(name, value, second),
        ),
        Expr::Head(inner) => Expr::head(substitute(name, value, inner)),
        Expr::Tail(inner) => Expr::tail(substitute(name, value, inner)),
    }
}
