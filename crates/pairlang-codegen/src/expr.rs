//! Expression code generation.
//!
//! Every expression evaluates to an i32 *value pointer* left on the WASM
//! operand stack. Operands are emitted left to right, so a trap in the left
//! operand prevents the right one from running.

use pairlang_types::Expr;
use wasm_encoder::{BlockType, Function, Instruction, ValType};

use crate::compiler::FuncContext;
use crate::error::CodegenResult;
use crate::runtime::*;
use crate::types::*;

/// Emit instructions for an expression. Leaves one i32 (value ptr) on stack.
pub fn emit_expr(expr: &Expr, ctx: &mut FuncContext, f: &mut Function) -> CodegenResult<()> {
    match expr {
        // ── Literals ──────────────────────────────────────────────────────
        Expr::Number(n) => {
            f.instruction(&Instruction::F64Const(*n));
            f.instruction(&Instruction::Call(rt_func_idx(RT_VAL_NUMBER)));
        }
        Expr::Bool(b) => {
            f.instruction(&Instruction::I32Const(i32::from(*b)));
            f.instruction(&Instruction::Call(rt_func_idx(RT_VAL_BOOL)));
        }

        // ── Identifiers ──────────────────────────────────────────────────
        Expr::Var(name) => emit_var(name, ctx, f)?,

        // ── Primitives ───────────────────────────────────────────────────
        Expr::Sum(lhs, rhs) => emit_call2(lhs, rhs, RT_VAL_ADD, ctx, f)?,
        Expr::Less(lhs, rhs) => emit_call2(lhs, rhs, RT_VAL_LE, ctx, f)?,
        Expr::Pair(first, second) => emit_call2(first, second, RT_VAL_PAIR, ctx, f)?,
        Expr::Head(inner) => {
            emit_expr(inner, ctx, f)?;
            f.instruction(&Instruction::Call(rt_func_idx(RT_VAL_HEAD)));
        }
        Expr::Tail(inner) => {
            emit_expr(inner, ctx, f)?;
            f.instruction(&Instruction::Call(rt_func_idx(RT_VAL_TAIL)));
        }

        // ── Binding & control flow ───────────────────────────────────────
        Expr::Bind { name, bound, body } => emit_bind(name, bound, body, ctx, f)?,
        Expr::If {
            test,
            then_branch,
            else_branch,
        } => {
            emit_expr(test, ctx, f)?;
            f.instruction(&Instruction::Call(rt_func_idx(RT_CHECK_TEST)));
            f.instruction(&Instruction::If(BlockType::Result(ValType::I32)));
            emit_expr(then_branch, ctx, f)?;
            f.instruction(&Instruction::Else);
            emit_expr(else_branch, ctx, f)?;
            f.instruction(&Instruction::End);
        }
    }
    Ok(())
}

/// A bound name reads its local; anything else reports itself to the host
/// as unbound when (and only when) execution reaches it.
fn emit_var(name: &str, ctx: &mut FuncContext, f: &mut Function) -> CodegenResult<()> {
    if let Some(idx) = ctx.get_local(name) {
        f.instruction(&Instruction::LocalGet(idx));
        return Ok(());
    }
    let (ptr, len) = ctx.data.intern_symbol(name)?;
    f.instruction(&Instruction::I32Const(ptr as i32));
    f.instruction(&Instruction::I32Const(len as i32));
    f.instruction(&Instruction::Call(IMPORT_UNBOUND));
    f.instruction(&Instruction::Unreachable);
    Ok(())
}

/// `bound` is emitted before `name` enters scope, so it sees the outer binding.
fn emit_bind(
    name: &str,
    bound: &Expr,
    body: &Expr,
    ctx: &mut FuncContext,
    f: &mut Function,
) -> CodegenResult<()> {
    emit_expr(bound, ctx, f)?;
    let local = ctx.alloc_local(ValType::I32)?;
    f.instruction(&Instruction::LocalSet(local));
    ctx.push_local(name, local);
    let result = emit_expr(body, ctx, f);
    ctx.pop_local(name);
    result
}

fn emit_call2(
    lhs: &Expr,
    rhs: &Expr,
    rt_offset: u32,
    ctx: &mut FuncContext,
    f: &mut Function,
) -> CodegenResult<()> {
    emit_expr(lhs, ctx, f)?;
    emit_expr(rhs, ctx, f)?;
    f.instruction(&Instruction::Call(rt_func_idx(rt_offset)));
    Ok(())
}
