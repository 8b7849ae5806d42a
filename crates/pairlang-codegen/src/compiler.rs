//! Main WASM module assembler.
//!
//! Orchestrates the code generation pipeline:
//! 1. Emit the `run` function body (interning variable symbols on the way)
//! 2. Emit runtime helper functions
//! 3. Size memory for the data segment
//! 4. Assemble all WASM sections into a valid module
//! 5. Validate with `wasmparser`

use std::borrow::Cow;
use std::collections::HashMap;

use pairlang_types::Expr;
use wasm_encoder::{
    CodeSection, ConstExpr, CustomSection, DataSection, EntityType, ExportKind, ExportSection,
    Function, FunctionSection, GlobalSection, GlobalType, ImportSection, MemorySection,
    MemoryType, Module, TypeSection, ValType,
};

use crate::error::{CodegenError, CodegenResult};
use crate::runtime::{self, DataSegment, RT_FUNC_COUNT};
use crate::types::*;

// ══════════════════════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════════════════════

/// Compile an expression into a `.wasm` binary.
///
/// The module imports the `env` host functions (see [`crate::types`]) and
/// exports `run() -> i32` plus its `memory`.
pub fn compile(expr: &Expr) -> CodegenResult<Vec<u8>> {
    Compiler::new(expr).compile()
}

/// Absolute function index of the exported `run` function.
pub const RUN_FUNC_IDX: u32 = IMPORT_COUNT + RT_FUNC_COUNT;

// ══════════════════════════════════════════════════════════════════════════════
// Compiler
// ══════════════════════════════════════════════════════════════════════════════

/// The top-level compiler state.
struct Compiler<'a> {
    expr: &'a Expr,
    /// Static strings, filled while the `run` body is emitted.
    data: DataSegment,
}

impl<'a> Compiler<'a> {
    fn new(expr: &'a Expr) -> Self {
        Self {
            expr,
            data: DataSegment::new(),
        }
    }

    /// Run the full compilation pipeline.
    fn compile(&mut self) -> CodegenResult<Vec<u8>> {
        // The run body first: it decides which symbols land in the data segment.
        let run = self.emit_run()?;

        let mut module = Module::new();

        // 1. Type section
        module.section(&self.emit_types());

        // 2. Import section
        module.section(&self.emit_imports());

        // 3. Function section + Code section (built together)
        let (func_section, code_section) = self.emit_functions(run);
        module.section(&func_section);

        // 4. Memory section
        module.section(&self.emit_memory());

        // 5. Global section
        module.section(&self.emit_globals());

        // 6. Export section
        module.section(&self.emit_exports());

        // 7. Code section
        module.section(&code_section);

        // 8. Data section
        module.section(&self.emit_data());

        // 9. Custom section
        module.section(&self.emit_custom());

        let wasm_bytes = module.finish();

        // 10. Validate
        wasmparser::validate(&wasm_bytes)
            .map_err(|e| CodegenError::ValidationFailed(format!("{e}")))?;

        Ok(wasm_bytes)
    }

    // ── Type section ─────────────────────────────────────────────────────

    fn emit_types(&self) -> TypeSection {
        let mut types = TypeSection::new();

        // TYPE_VOID_I32: () -> i32
        types.ty().function(vec![], vec![ValType::I32]);
        // TYPE_I32_I32: (i32) -> i32
        types.ty().function(vec![ValType::I32], vec![ValType::I32]);
        // TYPE_I32X2_VOID: (i32, i32) -> ()
        types.ty().function(vec![ValType::I32, ValType::I32], vec![]);
        // TYPE_I32X2_I32: (i32, i32) -> i32
        types
            .ty()
            .function(vec![ValType::I32, ValType::I32], vec![ValType::I32]);
        // TYPE_I32X4_VOID: (i32, i32, i32, i32) -> ()
        types.ty().function(vec![ValType::I32; 4], vec![]);
        // TYPE_F64_I32: (f64) -> i32
        types.ty().function(vec![ValType::F64], vec![ValType::I32]);

        types
    }

    // ── Import section ───────────────────────────────────────────────────

    fn emit_imports(&self) -> ImportSection {
        let mut imports = ImportSection::new();

        // IMPORT_TRAP: env.trap(ptr, len)
        imports.import(
            IMPORT_MODULE,
            IMPORT_TRAP_NAME,
            EntityType::Function(TYPE_I32X2_VOID),
        );
        // IMPORT_UNBOUND: env.unbound(ptr, len)
        imports.import(
            IMPORT_MODULE,
            IMPORT_UNBOUND_NAME,
            EntityType::Function(TYPE_I32X2_VOID),
        );
        // IMPORT_CONTRACT_VIOLATION: env.contract_violation(op, position, given, other)
        imports.import(
            IMPORT_MODULE,
            IMPORT_CONTRACT_VIOLATION_NAME,
            EntityType::Function(TYPE_I32X4_VOID),
        );

        imports
    }

    // ── Memory section ───────────────────────────────────────────────────

    fn emit_memory(&self) -> MemorySection {
        let mut memory = MemorySection::new();
        memory.memory(MemoryType {
            minimum: self.initial_pages(),
            maximum: Some(MAX_MEMORY_PAGES),
            memory64: false,
            shared: false,
            page_size_log2: None,
        });
        memory
    }

    /// Pages needed to hold the data segment plus the first heap cell.
    fn initial_pages(&self) -> u64 {
        let needed = u64::from(self.data.heap_start()) + u64::from(VALUE_SIZE);
        needed.div_ceil(u64::from(PAGE_SIZE)).max(1)
    }

    // ── Global section ───────────────────────────────────────────────────

    fn emit_globals(&self) -> GlobalSection {
        let mut globals = GlobalSection::new();

        // GLOBAL_HEAP_PTR: starts after data segment
        globals.global(
            GlobalType {
                val_type: ValType::I32,
                mutable: true,
                shared: false,
            },
            &ConstExpr::i32_const(self.data.heap_start() as i32),
        );

        globals
    }

    // ── Function + Code sections ─────────────────────────────────────────

    fn emit_functions(&self, run: Function) -> (FunctionSection, CodeSection) {
        let mut func_section = FunctionSection::new();
        let mut code_section = CodeSection::new();

        // ── Runtime helpers ──────────────────────────────────────────────
        // Registered in RT_* order.

        // RT_ALLOC (i32) -> i32
        func_section.function(TYPE_I32_I32);
        code_section.function(&runtime::emit_alloc());

        // RT_VAL_NUMBER (f64) -> i32
        func_section.function(TYPE_F64_I32);
        code_section.function(&runtime::emit_val_number());

        // RT_VAL_BOOL (i32) -> i32
        func_section.function(TYPE_I32_I32);
        code_section.function(&runtime::emit_val_bool());

        // RT_VAL_PAIR (i32, i32) -> i32
        func_section.function(TYPE_I32X2_I32);
        code_section.function(&runtime::emit_val_pair());

        // RT_VAL_ADD, RT_VAL_LE (i32, i32) -> i32
        func_section.function(TYPE_I32X2_I32);
        code_section.function(&runtime::emit_val_add());
        func_section.function(TYPE_I32X2_I32);
        code_section.function(&runtime::emit_val_le());

        // RT_VAL_HEAD, RT_VAL_TAIL (i32) -> i32
        func_section.function(TYPE_I32_I32);
        code_section.function(&runtime::emit_val_head());
        func_section.function(TYPE_I32_I32);
        code_section.function(&runtime::emit_val_tail());

        // RT_CHECK_TEST (i32) -> i32
        let (msg_ptr, msg_len) = self.data.non_boolean_test;
        func_section.function(TYPE_I32_I32);
        code_section.function(&runtime::emit_check_test(msg_ptr, msg_len));

        // ── run() -> i32 ─────────────────────────────────────────────────
        func_section.function(TYPE_VOID_I32);
        code_section.function(&run);

        (func_section, code_section)
    }

    /// Emit the body of `run`.
    fn emit_run(&mut self) -> CodegenResult<Function> {
        let mut scratch = Function::new(vec![]);
        let mut ctx = FuncContext::new(0, std::mem::take(&mut self.data));
        crate::expr::emit_expr(self.expr, &mut ctx, &mut scratch)?;
        scratch.instruction(&wasm_encoder::Instruction::End);
        let run = Self::finalize_function(scratch, &ctx)?;
        self.data = ctx.data;
        Ok(run)
    }

    // ── Export section ────────────────────────────────────────────────────

    fn emit_exports(&self) -> ExportSection {
        let mut exports = ExportSection::new();
        exports.export(EXPORT_RUN, ExportKind::Func, RUN_FUNC_IDX);
        exports.export(EXPORT_MEMORY, ExportKind::Memory, 0);
        exports
    }

    // ── Data section ─────────────────────────────────────────────────────

    fn emit_data(&self) -> DataSection {
        let mut data_sec = DataSection::new();
        data_sec.active(
            0,
            &ConstExpr::i32_const(0),
            self.data.bytes().iter().copied(),
        );
        data_sec
    }

    // ── Custom section ───────────────────────────────────────────────────

    fn emit_custom(&self) -> CustomSection<'_> {
        CustomSection {
            name: Cow::Borrowed(CUSTOM_SECTION_NAME),
            data: Cow::Borrowed(COMPILER_VERSION.as_bytes()),
        }
    }

    // ── Helpers ──────────────────────────────────────────────────────────

    /// Finalize a scratch function: rebuild with correct local declarations.
    ///
    /// `Function::new(vec![])` declares 0 locals, so its raw body starts with
    /// a single 0x00 byte (LEB128 zero). We strip that byte and prepend the
    /// actual locals from `ctx`.
    fn finalize_function(scratch: Function, ctx: &FuncContext) -> CodegenResult<Function> {
        let raw = scratch.into_raw_body();
        let Some((&0x00, instr_bytes)) = raw.split_first() else {
            return Err(CodegenError::Internal(
                "scratch function declared unexpected locals".into(),
            ));
        };
        let mut f = Function::new(ctx.locals.clone());
        f.raw(instr_bytes.iter().copied());
        Ok(f)
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// FuncContext: per-function codegen state
// ══════════════════════════════════════════════════════════════════════════════

/// State maintained while generating code for a single function body.
pub struct FuncContext {
    /// Additional locals declared during codegen: (count, type).
    pub locals: Vec<(u32, ValType)>,
    /// Name → local index stack (for scoped `let` bindings).
    pub local_names: HashMap<String, Vec<u32>>,
    /// Next available local index.
    pub next_local: u32,
    /// Static data for the module being built.
    pub data: DataSegment,
}

impl FuncContext {
    pub fn new(param_count: u32, data: DataSegment) -> Self {
        Self {
            locals: Vec::new(),
            local_names: HashMap::new(),
            next_local: param_count,
            data,
        }
    }

    /// Allocate a new local of the given type. Returns the local index.
    pub fn alloc_local(&mut self, ty: ValType) -> CodegenResult<u32> {
        if self.next_local >= MAX_LOCALS {
            return Err(CodegenError::LimitExceeded(format!(
                "more than {MAX_LOCALS} locals"
            )));
        }
        let idx = self.next_local;
        self.next_local += 1;
        self.locals.push((1, ty));
        Ok(idx)
    }

    /// Push a named local binding.
    pub fn push_local(&mut self, name: &str, idx: u32) {
        self.local_names
            .entry(name.to_string())
            .or_default()
            .push(idx);
    }

    /// Pop a named local binding.
    pub fn pop_local(&mut self, name: &str) {
        if let Some(stack) = self.local_names.get_mut(name) {
            stack.pop();
        }
    }

    /// Get the local index for the innermost binding of `name`.
    pub fn get_local(&self, name: &str) -> Option<u32> {
        self.local_names
            .get(name)
            .and_then(|stack| stack.last().copied())
    }
}
