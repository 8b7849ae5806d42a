//! WASM value-representation constants and memory layout.
//!
//! Every pairlang value is stored on the linear-memory heap as a 12-byte cell:
//!
//! ```text
//! offset+0 : i32      tag (see TAG_* constants)
//! offset+4 : 8 bytes  payload (interpretation depends on tag)
//! ```
//!
//! # Payload layouts
//!
//! | Tag        | Bytes 4..8 (word-1)        | Bytes 8..12 (word-2)       |
//! |------------|----------------------------|----------------------------|
//! | NUMBER     | f64 occupies all 8 bytes (little-endian)                |
//! | BOOL       | i32 (0 = false, 1 = true)  | 0 (padding)                |
//! | PAIR       | i32 first-ptr              | i32 second-ptr             |
//!
//! The data segment starts at offset 0 and always holds at least the
//! non-boolean-test message, so no cell ever lives at address 0. Host imports
//! use pointer 0 to mean "no value".

/// Size of a single value cell on the heap (bytes).
pub const VALUE_SIZE: u32 = 12;

// ── Value tags ───────────────────────────────────────────────────────────────

pub const TAG_NUMBER: i32 = 1;
pub const TAG_BOOL: i32 = 2;
pub const TAG_PAIR: i32 = 3;

// ── Primitive operation codes ────────────────────────────────────────────────
// Passed as the first argument of `env.contract_violation`.

/// `+`
pub const OP_ADD: i32 = 0;
/// `<=`
pub const OP_LE: i32 = 1;
/// `head`
pub const OP_HEAD: i32 = 2;
/// `tail`
pub const OP_TAIL: i32 = 3;

// ── Global variable indices ──────────────────────────────────────────────────

/// Heap allocation pointer: next free byte in linear memory.
pub const GLOBAL_HEAP_PTR: u32 = 0;

// ── Imported function indices ────────────────────────────────────────────────
// (order must match the import section emission in compiler.rs)

/// `env.trap(ptr: i32, len: i32)`: aborts with a message from the data segment.
pub const IMPORT_TRAP: u32 = 0;
/// `env.unbound(ptr: i32, len: i32)`: reference to a name with no binding.
/// The name is stored with [`SYMBOL_PREFIX`] prepended.
pub const IMPORT_UNBOUND: u32 = 1;
/// `env.contract_violation(op: i32, position: i32, given: i32, other: i32)`
///
/// `position` is the 1-based argument position of `given`; `other` is the
/// remaining operand's cell, or 0 for unary primitives.
pub const IMPORT_CONTRACT_VIOLATION: u32 = 2;

/// Number of imported functions (offset for locally-defined function indices).
pub const IMPORT_COUNT: u32 = 3;

/// Module and field names of the imports, in index order.
pub const IMPORT_MODULE: &str = "env";
pub const IMPORT_TRAP_NAME: &str = "trap";
pub const IMPORT_UNBOUND_NAME: &str = "unbound";
pub const IMPORT_CONTRACT_VIOLATION_NAME: &str = "contract_violation";

// ── WASM type indices ────────────────────────────────────────────────────────
// Fixed type indices in the type section (see compiler.rs emit_types).

/// `() -> i32`
pub const TYPE_VOID_I32: u32 = 0;
/// `(i32) -> i32`
pub const TYPE_I32_I32: u32 = 1;
/// `(i32, i32) -> ()`
pub const TYPE_I32X2_VOID: u32 = 2;
/// `(i32, i32) -> i32`
pub const TYPE_I32X2_I32: u32 = 3;
/// `(i32, i32, i32, i32) -> ()`
pub const TYPE_I32X4_VOID: u32 = 4;
/// `(f64) -> i32`
pub const TYPE_F64_I32: u32 = 5;

// ── Exports ──────────────────────────────────────────────────────────────────

/// `run() -> i32`: evaluates the compiled expression, returns the result cell.
pub const EXPORT_RUN: &str = "run";
pub const EXPORT_MEMORY: &str = "memory";

// ── Memory ───────────────────────────────────────────────────────────────────

/// WASM page size in bytes.
pub const PAGE_SIZE: u32 = 65_536;
/// Maximum linear memory pages (16 MiB).
pub const MAX_MEMORY_PAGES: u64 = 256;
/// Heap start alignment.
pub const HEAP_ALIGN: u32 = 8;

// ── Symbols & messages ───────────────────────────────────────────────────────

/// Prefix of variable names interned for `env.unbound`, keeping user names
/// apart from the runtime's own strings.
pub const SYMBOL_PREFIX: &str = "var:";

/// Raised by the `if` guard when the test value is not a boolean.
pub const NON_BOOLEAN_TEST_MESSAGE: &str = "if: test expression must be a boolean";

// ── Limits ───────────────────────────────────────────────────────────────────

/// Locals per function accepted by validators.
pub const MAX_LOCALS: u32 = 50_000;

// ── Custom section ───────────────────────────────────────────────────────────

/// Custom section name for pairlang metadata.
pub const CUSTOM_SECTION_NAME: &str = "pairlang";
/// Compiler version embedded in the custom section.
pub const COMPILER_VERSION: &str = env!("CARGO_PKG_VERSION");
