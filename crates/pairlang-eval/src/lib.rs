//! pairlang substitution-based evaluator.
//!
//! Evaluates expressions directly from the AST. Bindings never become
//! runtime state: `let` substitutes the bound value into its body before the
//! body is evaluated, so a variable that survives to evaluation is unbound.

pub mod error;
pub mod evaluator;
pub mod subst;

pub use error::{EvalError, EvalResult};
pub use evaluator::evaluate;
pub use subst::substitute;
