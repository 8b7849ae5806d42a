//! pairlang reference evaluator.
//!
//! Compiles an expression with `pairlang-codegen` and runs the module on the
//! `wasmi` interpreter. Faults raised by the module through its `env`
//! imports are decoded from linear memory and rendered with the same wording
//! the substitution evaluator uses.
//!
//! ```ignore
//! let ctx = HostContext::new()?;
//! let value = reference_evaluate(&ctx, &Expr::sum(Expr::Number(1.0), Expr::Number(2.0)))?;
//! ```

mod context;
pub mod decode;
mod error;

pub use context::{reference_evaluate, HostContext};
pub use decode::{DecodeError, Primitive};
pub use error::{HostError, HostFault, HostResult};
