//! Runtime helper functions emitted into the WASM module.
//!
//! These provide the value-manipulation primitives that expression codegen
//! builds upon. Every function is registered during module assembly (in
//! `compiler.rs`) and referenced by its function index.
//!
//! Type checks happen here, inside the module: a primitive applied to a cell
//! with the wrong tag reports the offending cell to the host through
//! `env.contract_violation` and then executes `unreachable`.

use std::collections::HashMap;

use wasm_encoder::{BlockType, Function, Instruction, MemArg, ValType};

use crate::error::{CodegenError, CodegenResult};
use crate::types::*;

// ══════════════════════════════════════════════════════════════════════════════
// Runtime function index offsets (relative to IMPORT_COUNT)
// ══════════════════════════════════════════════════════════════════════════════

/// Bump-allocate `size` bytes, growing memory when needed; returns pointer.
///
/// `alloc(size: i32) -> i32`
pub const RT_ALLOC: u32 = 0;

/// `val_number(n: f64) -> i32`
pub const RT_VAL_NUMBER: u32 = 1;

/// `val_bool(b: i32) -> i32`
pub const RT_VAL_BOOL: u32 = 2;

/// `val_pair(first: i32, second: i32) -> i32`
pub const RT_VAL_PAIR: u32 = 3;

/// `val_add(a: i32, b: i32) -> i32`: both operands must be numbers.
pub const RT_VAL_ADD: u32 = 4;

/// `val_le(a: i32, b: i32) -> i32`: both operands must be numbers; returns a BOOL cell.
pub const RT_VAL_LE: u32 = 5;

/// `val_head(p: i32) -> i32`: `p` must be a pair.
pub const RT_VAL_HEAD: u32 = 6;

/// `val_tail(p: i32) -> i32`: `p` must be a pair.
pub const RT_VAL_TAIL: u32 = 7;

/// `check_test(v: i32) -> i32`: returns the raw boolean (0/1) of a BOOL
/// cell, traps with the non-boolean-test message otherwise.
pub const RT_CHECK_TEST: u32 = 8;

/// Total number of runtime helper functions.
pub const RT_FUNC_COUNT: u32 = 9;

// ── Absolute function indices ────────────────────────────────────────────────

/// Compute the absolute WASM function index of a runtime helper.
#[inline]
pub const fn rt_func_idx(rt_offset: u32) -> u32 {
    IMPORT_COUNT + rt_offset
}

// ══════════════════════════════════════════════════════════════════════════════
// Emit helpers, each building a `wasm_encoder::Function`
// ══════════════════════════════════════════════════════════════════════════════

/// Emit the `alloc(size: i32) -> i32` function.
///
/// Returns the current `heap_ptr`, then advances it by `size`. Cells are far
/// smaller than a page, so growing by one page whenever the heap pointer
/// passes the end of memory is enough.
pub fn emit_alloc() -> Function {
    let mut f = Function::new(vec![(1, ValType::I32)]); // local 1: old_ptr
    // old_ptr = heap_ptr
    f.instruction(&Instruction::GlobalGet(GLOBAL_HEAP_PTR));
    f.instruction(&Instruction::LocalSet(1));
    // heap_ptr += size
    f.instruction(&Instruction::GlobalGet(GLOBAL_HEAP_PTR));
    f.instruction(&Instruction::LocalGet(0));
    f.instruction(&Instruction::I32Add);
    f.instruction(&Instruction::GlobalSet(GLOBAL_HEAP_PTR));
    // if heap_ptr > memory.size * PAGE_SIZE { memory.grow(1) or trap }
    f.instruction(&Instruction::GlobalGet(GLOBAL_HEAP_PTR));
    f.instruction(&Instruction::MemorySize(0));
    f.instruction(&Instruction::I32Const(PAGE_SIZE.trailing_zeros() as i32));
    f.instruction(&Instruction::I32Shl);
    f.instruction(&Instruction::I32GtU);
    f.instruction(&Instruction::If(BlockType::Empty));
    f.instruction(&Instruction::I32Const(1));
    f.instruction(&Instruction::MemoryGrow(0));
    f.instruction(&Instruction::I32Const(-1));
    f.instruction(&Instruction::I32Eq);
    f.instruction(&Instruction::If(BlockType::Empty));
    f.instruction(&Instruction::Unreachable);
    f.instruction(&Instruction::End);
    f.instruction(&Instruction::End);
    // return old_ptr
    f.instruction(&Instruction::LocalGet(1));
    f.instruction(&Instruction::End);
    f
}

/// Emit `val_number(n: f64) -> i32`.
pub fn emit_val_number() -> Function {
    let mut f = Function::new(vec![(1, ValType::I32)]); // local 1: ptr
    // ptr = alloc(VALUE_SIZE)
    f.instruction(&Instruction::I32Const(VALUE_SIZE as i32));
    f.instruction(&Instruction::Call(rt_func_idx(RT_ALLOC)));
    f.instruction(&Instruction::LocalSet(1));
    // tag = TAG_NUMBER
    f.instruction(&Instruction::LocalGet(1));
    f.instruction(&Instruction::I32Const(TAG_NUMBER));
    f.instruction(&Instruction::I32Store(memarg(0, 2)));
    // payload = n
    f.instruction(&Instruction::LocalGet(1));
    f.instruction(&Instruction::LocalGet(0));
    f.instruction(&Instruction::F64Store(memarg(4, 3)));
    // return ptr
    f.instruction(&Instruction::LocalGet(1));
    f.instruction(&Instruction::End);
    f
}

/// Emit `val_bool(b: i32) -> i32`.
pub fn emit_val_bool() -> Function {
    let mut f = Function::new(vec![(1, ValType::I32)]); // local 1: ptr
    f.instruction(&Instruction::I32Const(VALUE_SIZE as i32));
    f.instruction(&Instruction::Call(rt_func_idx(RT_ALLOC)));
    f.instruction(&Instruction::LocalSet(1));
    // tag = TAG_BOOL
    f.instruction(&Instruction::LocalGet(1));
    f.instruction(&Instruction::I32Const(TAG_BOOL));
    f.instruction(&Instruction::I32Store(memarg(0, 2)));
    // w1 = b
    f.instruction(&Instruction::LocalGet(1));
    f.instruction(&Instruction::LocalGet(0));
    f.instruction(&Instruction::I32Store(memarg(4, 2)));
    f.instruction(&Instruction::LocalGet(1));
    f.instruction(&Instruction::End);
    f
}

/// Emit `val_pair(first: i32, second: i32) -> i32`.
pub fn emit_val_pair() -> Function {
    let mut f = Function::new(vec![(1, ValType::I32)]); // local 2: ptr
    f.instruction(&Instruction::I32Const(VALUE_SIZE as i32));
    f.instruction(&Instruction::Call(rt_func_idx(RT_ALLOC)));
    f.instruction(&Instruction::LocalSet(2));
    // tag = TAG_PAIR
    f.instruction(&Instruction::LocalGet(2));
    f.instruction(&Instruction::I32Const(TAG_PAIR));
    f.instruction(&Instruction::I32Store(memarg(0, 2)));
    // w1 = first
    f.instruction(&Instruction::LocalGet(2));
    f.instruction(&Instruction::LocalGet(0));
    f.instruction(&Instruction::I32Store(memarg(4, 2)));
    // w2 = second
    f.instruction(&Instruction::LocalGet(2));
    f.instruction(&Instruction::LocalGet(1));
    f.instruction(&Instruction::I32Store(memarg(8, 2)));
    f.instruction(&Instruction::LocalGet(2));
    f.instruction(&Instruction::End);
    f
}

/// Emit `val_add(a: i32, b: i32) -> i32`.
pub fn emit_val_add() -> Function {
    emit_numeric_binop(OP_ADD, Instruction::F64Add, RT_VAL_NUMBER)
}

/// Emit `val_le(a: i32, b: i32) -> i32`.
pub fn emit_val_le() -> Function {
    emit_numeric_binop(OP_LE, Instruction::F64Le, RT_VAL_BOOL)
}

/// Shared body of the numeric primitives: check `a` then `b` for
/// `TAG_NUMBER`, apply `op` to the payloads, box the result with `ctor`.
fn emit_numeric_binop(op_code: i32, op: Instruction<'static>, ctor: u32) -> Function {
    let mut f = Function::new(vec![]);

    // a must be a number (argument position 1, other = b)
    emit_require_tag(&mut f, 0, TAG_NUMBER, op_code, 1, Some(1));
    // b must be a number (argument position 2, other = a)
    emit_require_tag(&mut f, 1, TAG_NUMBER, op_code, 2, Some(0));

    f.instruction(&Instruction::LocalGet(0));
    f.instruction(&Instruction::F64Load(memarg(4, 3)));
    f.instruction(&Instruction::LocalGet(1));
    f.instruction(&Instruction::F64Load(memarg(4, 3)));
    f.instruction(&op);
    f.instruction(&Instruction::Call(rt_func_idx(ctor)));
    f.instruction(&Instruction::End);
    f
}

/// Emit `val_head(p: i32) -> i32`.
pub fn emit_val_head() -> Function {
    emit_projection(OP_HEAD, 4)
}

/// Emit `val_tail(p: i32) -> i32`.
pub fn emit_val_tail() -> Function {
    emit_projection(OP_TAIL, 8)
}

fn emit_projection(op_code: i32, offset: u64) -> Function {
    let mut f = Function::new(vec![]);
    emit_require_tag(&mut f, 0, TAG_PAIR, op_code, 1, None);
    f.instruction(&Instruction::LocalGet(0));
    f.instruction(&Instruction::I32Load(memarg(offset, 2)));
    f.instruction(&Instruction::End);
    f
}

/// Emit `check_test(v: i32) -> i32`.
///
/// The guard replaces WASM's own truthiness: any non-BOOL cell traps with the
/// message at `msg_ptr`/`msg_len` instead of being treated as true.
pub fn emit_check_test(msg_ptr: u32, msg_len: u32) -> Function {
    let mut f = Function::new(vec![]);
    f.instruction(&Instruction::LocalGet(0));
    f.instruction(&Instruction::I32Load(memarg(0, 2)));
    f.instruction(&Instruction::I32Const(TAG_BOOL));
    f.instruction(&Instruction::I32Ne);
    f.instruction(&Instruction::If(BlockType::Empty));
    f.instruction(&Instruction::I32Const(msg_ptr as i32));
    f.instruction(&Instruction::I32Const(msg_len as i32));
    f.instruction(&Instruction::Call(IMPORT_TRAP));
    f.instruction(&Instruction::Unreachable);
    f.instruction(&Instruction::End);
    f.instruction(&Instruction::LocalGet(0));
    f.instruction(&Instruction::I32Load(memarg(4, 2)));
    f.instruction(&Instruction::End);
    f
}

/// Emit a tag check on parameter `param`: if its tag is not `tag`, report a
/// contract violation for `op_code` at `position` and trap.
///
/// `other` names the parameter holding the remaining operand, if any.
fn emit_require_tag(
    f: &mut Function,
    param: u32,
    tag: i32,
    op_code: i32,
    position: i32,
    other: Option<u32>,
) {
    f.instruction(&Instruction::LocalGet(param));
    f.instruction(&Instruction::I32Load(memarg(0, 2)));
    f.instruction(&Instruction::I32Const(tag));
    f.instruction(&Instruction::I32Ne);
    f.instruction(&Instruction::If(BlockType::Empty));
    f.instruction(&Instruction::I32Const(op_code));
    f.instruction(&Instruction::I32Const(position));
    f.instruction(&Instruction::LocalGet(param));
    match other {
        Some(other) => f.instruction(&Instruction::LocalGet(other)),
        None => f.instruction(&Instruction::I32Const(0)),
    };
    f.instruction(&Instruction::Call(IMPORT_CONTRACT_VIOLATION));
    f.instruction(&Instruction::Unreachable);
    f.instruction(&Instruction::End);
}

pub(crate) fn memarg(offset: u64, align: u32) -> MemArg {
    MemArg {
        offset,
        align,
        memory_index: 0,
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// DataSegment: static strings placed at the start of linear memory
// ══════════════════════════════════════════════════════════════════════════════

/// Static data for one module: the well-known runtime messages followed by
/// interned variable symbols.
#[derive(Debug, Clone)]
pub struct DataSegment {
    bytes: Vec<u8>,
    interned: HashMap<String, (u32, u32)>,
    /// Location of [`NON_BOOLEAN_TEST_MESSAGE`].
    pub non_boolean_test: (u32, u32),
}

impl Default for DataSegment {
    fn default() -> Self {
        Self::new()
    }
}

impl DataSegment {
    /// Build the segment with all well-known strings starting at offset 0.
    pub fn new() -> Self {
        let mut segment = Self {
            bytes: Vec::new(),
            interned: HashMap::new(),
            non_boolean_test: (0, 0),
        };
        segment.non_boolean_test = segment.append(NON_BOOLEAN_TEST_MESSAGE);
        segment
    }

    /// Intern the symbol for variable `name` and return (offset, length).
    /// Repeated names share one copy.
    pub fn intern_symbol(&mut self, name: &str) -> CodegenResult<(u32, u32)> {
        let symbol = format!("{SYMBOL_PREFIX}{name}");
        if let Some(&loc) = self.interned.get(&symbol) {
            return Ok(loc);
        }
        if self.bytes.len() + symbol.len() > (MAX_MEMORY_PAGES as usize) * (PAGE_SIZE as usize) / 2
        {
            return Err(CodegenError::LimitExceeded(format!(
                "data segment too large to intern `{name}`"
            )));
        }
        let loc = self.append(&symbol);
        self.interned.insert(symbol, loc);
        Ok(loc)
    }

    fn append(&mut self, s: &str) -> (u32, u32) {
        let ptr = self.bytes.len() as u32;
        self.bytes.extend_from_slice(s.as_bytes());
        (ptr, s.len() as u32)
    }

    /// The raw bytes for the data segment.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// First heap address: the end of static data, aligned.
    pub fn heap_start(&self) -> u32 {
        let len = self.bytes.len() as u32;
        len.div_ceil(HEAP_ALIGN) * HEAP_ALIGN
    }
}
