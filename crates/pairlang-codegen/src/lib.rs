//! pairlang WASM code generator: compiles an expression to a `.wasm` binary.
//!
//! # Architecture
//!
//! The code generator takes a [`pairlang_types::Expr`] and produces a
//! self-contained `.wasm` module whose single entry point evaluates it.
//!
//! ## Imports
//! - `env.trap(ptr, len)`: non-boolean `if` test; message in the data segment
//! - `env.unbound(ptr, len)`: unbound variable; `var:`-prefixed name
//! - `env.contract_violation(op, position, given, other)`: primitive applied
//!   to a value of the wrong type
//!
//! Each import is expected to record the fault; the module executes
//! `unreachable` right after calling it.
//!
//! ## Exports
//! - `run() → value_ptr`
//! - `memory`: linear memory
//!
//! ## Value Representation
//!
//! Every value is a heap-allocated 12-byte cell:
//! `[tag: i32, payload: 8 bytes]`.  See [`types`] for tag constants.

pub mod compiler;
pub mod error;
pub mod expr;
pub mod runtime;
pub mod types;

pub use compiler::{compile, RUN_FUNC_IDX};
pub use error::{CodegenError, CodegenResult};
