//! Differential oracle: both evaluators on one expression.

use pairlang_eval::evaluate;
use pairlang_host::{reference_evaluate, HostContext};
use pairlang_types::{ErrorKind, Expr, Outcome};
use serde::Serialize;

/// Both evaluators agreed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Agreement {
    pub outcome: Outcome,
    /// Failure class, when the shared outcome is an error.
    pub kind: Option<ErrorKind>,
}

/// The evaluators disagreed on `expr`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mismatch {
    /// The expression, rendered.
    pub expr: String,
    pub reference: Outcome,
    pub evaluator: Outcome,
}

impl Mismatch {
    /// JSON rendering for failure reports.
    pub fn to_json(&self) -> String {
        // Every field is a string or a tree of strings, numbers and booleans.
        serde_json::to_string_pretty(self)
            .unwrap_or_else(|err| format!("{{\"error\": \"unserializable mismatch: {err}\"}}"))
    }
}

impl std::fmt::Display for Mismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "evaluators disagree on {}: reference gave {}, evaluator gave {}",
            self.expr, self.reference, self.evaluator
        )
    }
}

/// Run the reference evaluator, flattening any failure to its text.
pub fn safe_reference(ctx: &HostContext, expr: &Expr) -> (Outcome, Option<ErrorKind>) {
    let result = reference_evaluate(ctx, expr);
    let kind = result.as_ref().err().map(|e| e.kind());
    (Outcome::from_result(result), kind)
}

/// Run the substitution evaluator, flattening any failure to its text.
pub fn safe_evaluate(expr: &Expr) -> (Outcome, Option<ErrorKind>) {
    let result = evaluate(expr);
    let kind = result.as_ref().err().map(|e| e.kind());
    (Outcome::from_result(result), kind)
}

/// Evaluate `expr` both ways and compare the outcomes.
///
/// Values compare structurally with bit-exact numbers; errors compare by
/// their full text.
pub fn check(ctx: &HostContext, expr: &Expr) -> Result<Agreement, Mismatch> {
    let (reference, _) = safe_reference(ctx, expr);
    let (evaluator, kind) = safe_evaluate(expr);
    if reference == evaluator {
        Ok(Agreement {
            outcome: evaluator,
            kind,
        })
    } else {
        Err(Mismatch {
            expr: expr.to_string(),
            reference,
            evaluator,
        })
    }
}
