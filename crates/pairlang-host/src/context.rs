//! The wasmi engine, its `env` imports, and per-call execution.

use pairlang_codegen::types::{
    EXPORT_MEMORY, EXPORT_RUN, IMPORT_CONTRACT_VIOLATION_NAME, IMPORT_MODULE, IMPORT_TRAP_NAME,
    IMPORT_UNBOUND_NAME,
};
use pairlang_types::{Expr, Value};
use tracing::{debug, trace};
use wasmi::{Caller, Engine, Extern, Linker, Module, Store};

use crate::decode::{self, DecodeError, Primitive};
use crate::error::{HostError, HostFault, HostResult};

/// Host state held by each call's `Store`.
#[derive(Debug, Default)]
struct HostState {
    /// First fault reported by the module, or why it could not be decoded.
    fault: Option<Result<HostFault, DecodeError>>,
}

impl HostState {
    fn record(&mut self, fault: Result<HostFault, DecodeError>) {
        if self.fault.is_none() {
            self.fault = Some(fault);
        }
    }
}

/// A reusable evaluation context: one engine and one linker with the `env`
/// imports bound. Every evaluation gets its own store, so nothing carries
/// over between calls.
pub struct HostContext {
    engine: Engine,
    linker: Linker<HostState>,
}

impl HostContext {
    pub fn new() -> HostResult<Self> {
        let engine = Engine::default();
        let mut linker = <Linker<HostState>>::new(&engine);

        // env.trap(ptr: i32, len: i32)
        linker
            .func_wrap(
                IMPORT_MODULE,
                IMPORT_TRAP_NAME,
                |mut caller: Caller<'_, HostState>, ptr: i32, len: i32| {
                    let fault = with_memory(&caller, |data| {
                        decode::read_string(data, ptr as u32, len as u32)
                    })
                    .map(HostFault::NonBooleanTest);
                    caller.data_mut().record(fault);
                },
            )
            .map_err(HostError::engine)?;

        // env.unbound(ptr: i32, len: i32)
        linker
            .func_wrap(
                IMPORT_MODULE,
                IMPORT_UNBOUND_NAME,
                |mut caller: Caller<'_, HostState>, ptr: i32, len: i32| {
                    let fault = with_memory(&caller, |data| {
                        decode::read_symbol(data, ptr as u32, len as u32)
                    })
                    .map(HostFault::Unbound);
                    caller.data_mut().record(fault);
                },
            )
            .map_err(HostError::engine)?;

        // env.contract_violation(op: i32, position: i32, given: i32, other: i32)
        linker
            .func_wrap(
                IMPORT_MODULE,
                IMPORT_CONTRACT_VIOLATION_NAME,
                |mut caller: Caller<'_, HostState>,
                 op: i32,
                 position: i32,
                 given: i32,
                 other: i32| {
                    let fault = with_memory(&caller, |data| {
                        decode_violation(data, op, position, given, other)
                    });
                    caller.data_mut().record(fault);
                },
            )
            .map_err(HostError::engine)?;

        Ok(Self { engine, linker })
    }

    /// Compile `expr`, run it in a fresh store, and decode the result cell.
    pub fn evaluate(&self, expr: &Expr) -> HostResult<Value> {
        let wasm = pairlang_codegen::compile(expr)?;
        debug!(bytes = wasm.len(), "compiled expression");

        let module = Module::new(&self.engine, &wasm[..]).map_err(HostError::engine)?;
        let mut store = Store::new(&self.engine, HostState::default());
        let instance = self
            .linker
            .instantiate(&mut store, &module)
            .map_err(HostError::engine)?
            .start(&mut store)
            .map_err(HostError::engine)?;
        let run = instance
            .get_typed_func::<(), i32>(&store, EXPORT_RUN)
            .map_err(HostError::engine)?;

        let result = run.call(&mut store, ());

        if let Some(fault) = store.data_mut().fault.take() {
            let fault = fault?;
            trace!(%fault, kind = %fault.kind(), "module reported fault");
            return Err(HostError::Fault(fault));
        }
        let ptr = result.map_err(|e| HostError::UnreportedTrap(e.to_string()))?;

        let memory = instance
            .get_memory(&store, EXPORT_MEMORY)
            .ok_or(DecodeError::MissingMemory)?;
        Ok(decode::read_value(memory.data(&store), ptr as u32)?)
    }
}

/// Evaluate `expr` with the WebAssembly reference evaluator.
pub fn reference_evaluate(ctx: &HostContext, expr: &Expr) -> HostResult<Value> {
    ctx.evaluate(expr)
}

/// Run `f` over the calling instance's linear memory.
fn with_memory<T>(
    caller: &Caller<'_, HostState>,
    f: impl FnOnce(&[u8]) -> Result<T, DecodeError>,
) -> Result<T, DecodeError> {
    let memory = caller
        .get_export(EXPORT_MEMORY)
        .and_then(Extern::into_memory)
        .ok_or(DecodeError::MissingMemory)?;
    f(memory.data(caller))
}

fn decode_violation(
    data: &[u8],
    op: i32,
    position: i32,
    given: i32,
    other: i32,
) -> Result<HostFault, DecodeError> {
    let op = Primitive::from_code(op)?;
    let given = decode::read_value(data, given as u32)?;
    let other = decode::read_optional_value(data, other as u32)?;
    if op.is_numeric() && other.is_none() {
        return Err(DecodeError::MissingOperand { op });
    }
    Ok(HostFault::ContractViolation {
        op,
        position: position as u32,
        given,
        other,
    })
}
