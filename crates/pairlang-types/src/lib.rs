//! Shared types for pairlang.
//!
//! This crate defines the expression AST, runtime values, and the error
//! classification shared by the evaluator, the WebAssembly reference
//! evaluator, and the differential tester.

pub mod ast;
mod error;
mod value;

pub use ast::{Expr, Name};
pub use error::{ErrorKind, Outcome};
pub use value::Value;
