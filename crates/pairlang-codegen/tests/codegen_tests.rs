//! Integration tests for the pairlang WASM code generator.
//!
//! Tests validate:
//! - Every expression form compiles to valid WASM
//! - Module structure (imports, exports, custom section)
//! - Data segment contents for unbound names
//! - Deterministic output (same input → same bytes)

use pairlang_codegen::types::{
    CUSTOM_SECTION_NAME, EXPORT_MEMORY, EXPORT_RUN, IMPORT_CONTRACT_VIOLATION_NAME, IMPORT_MODULE,
    IMPORT_TRAP_NAME, IMPORT_UNBOUND_NAME, NON_BOOLEAN_TEST_MESSAGE,
};
use pairlang_codegen::{compile, RUN_FUNC_IDX};
use pairlang_types::Expr;
use wasmparser::{ExternalKind, Parser as WasmParser, Payload};

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

/// Compile to WASM bytes (panics on error).
fn compile_expr(expr: &Expr) -> Vec<u8> {
    compile(expr).unwrap_or_else(|e| panic!("codegen failed for {expr}: {e}"))
}

fn get_exports(wasm: &[u8]) -> Vec<(String, ExternalKind, u32)> {
    let mut exports = Vec::new();
    for payload in WasmParser::new(0).parse_all(wasm) {
        if let Ok(Payload::ExportSection(reader)) = payload {
            for export in reader {
                let exp = export.expect("valid export");
                exports.push((exp.name.to_string(), exp.kind, exp.index));
            }
        }
    }
    exports
}

fn get_imports(wasm: &[u8]) -> Vec<(String, String)> {
    let mut imports = Vec::new();
    for payload in WasmParser::new(0).parse_all(wasm) {
        if let Ok(Payload::ImportSection(reader)) = payload {
            for import in reader {
                let imp = import.expect("valid import");
                imports.push((imp.module.to_string(), imp.name.to_string()));
            }
        }
    }
    imports
}

fn get_custom_section_data(wasm: &[u8], name: &str) -> Option<Vec<u8>> {
    for payload in WasmParser::new(0).parse_all(wasm) {
        if let Ok(Payload::CustomSection(reader)) = payload {
            if reader.name() == name {
                return Some(reader.data().to_vec());
            }
        }
    }
    None
}

/// Concatenated bytes of all data segments.
fn get_data(wasm: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::new();
    for payload in WasmParser::new(0).parse_all(wasm) {
        if let Ok(Payload::DataSection(reader)) = payload {
            for data in reader {
                bytes.extend_from_slice(data.expect("valid data").data);
            }
        }
    }
    bytes
}

fn is_valid_wasm(wasm: &[u8]) -> bool {
    wasmparser::validate(wasm).is_ok()
}

fn n(value: f64) -> Expr {
    Expr::Number(value)
}

fn every_form() -> Vec<Expr> {
    vec![
        n(1.0),
        Expr::Bool(false),
        Expr::var("x"),
        Expr::sum(n(1.0), n(2.0)),
        Expr::less(n(1.0), n(2.0)),
        Expr::bind("x", n(1.0), Expr::var("x")),
        Expr::if_then_else(Expr::Bool(true), n(1.0), n(2.0)),
        Expr::pair(n(1.0), Expr::Bool(true)),
        Expr::head(Expr::pair(n(1.0), n(2.0))),
        Expr::tail(Expr::pair(n(1.0), n(2.0))),
    ]
}

// ══════════════════════════════════════════════════════════════════════════════
// Module Structure
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn every_form_compiles_to_valid_wasm() {
    for expr in every_form() {
        let wasm = compile_expr(&expr);
        assert!(is_valid_wasm(&wasm), "invalid module for {expr}");
    }
}

#[test]
fn module_starts_with_wasm_magic() {
    let wasm = compile_expr(&n(0.0));
    assert_eq!(&wasm[0..4], b"\0asm");
}

#[test]
fn module_exports_run_and_memory() {
    let wasm = compile_expr(&n(0.0));
    let exports = get_exports(&wasm);
    assert_eq!(exports.len(), 2);
    assert!(exports.contains(&(EXPORT_RUN.to_string(), ExternalKind::Func, RUN_FUNC_IDX)));
    assert!(exports
        .iter()
        .any(|(name, kind, _)| name == EXPORT_MEMORY && *kind == ExternalKind::Memory));
}

#[test]
fn module_imports_host_functions_in_order() {
    let wasm = compile_expr(&Expr::var("y"));
    let imports = get_imports(&wasm);
    let expected: Vec<(String, String)> = [
        IMPORT_TRAP_NAME,
        IMPORT_UNBOUND_NAME,
        IMPORT_CONTRACT_VIOLATION_NAME,
    ]
    .iter()
    .map(|name| (IMPORT_MODULE.to_string(), name.to_string()))
    .collect();
    assert_eq!(imports, expected);
}

#[test]
fn custom_section_contains_version() {
    let wasm = compile_expr(&Expr::Bool(true));
    let data = get_custom_section_data(&wasm, CUSTOM_SECTION_NAME).expect("custom section");
    let version = String::from_utf8(data).expect("utf-8 version");
    assert_eq!(version, env!("CARGO_PKG_VERSION"));
}

// ══════════════════════════════════════════════════════════════════════════════
// Data Segment
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn data_segment_starts_with_non_boolean_test_message() {
    let wasm = compile_expr(&n(1.0));
    let data = get_data(&wasm);
    assert!(data.starts_with(NON_BOOLEAN_TEST_MESSAGE.as_bytes()));
}

#[test]
fn unbound_names_are_interned_with_prefix() {
    let wasm = compile_expr(&Expr::sum(Expr::var("ζ"), Expr::var("ζ")));
    let data = String::from_utf8(get_data(&wasm)).expect("utf-8 data");
    assert_eq!(data.matches("var:ζ").count(), 1, "symbols are interned once");
}

#[test]
fn bound_names_are_not_interned() {
    let wasm = compile_expr(&Expr::bind("x", n(1.0), Expr::var("x")));
    let data = String::from_utf8(get_data(&wasm)).expect("utf-8 data");
    assert!(!data.contains("var:x"));
}

#[test]
fn bound_expression_sees_outer_scope() {
    // The `x` inside the bound expression is not yet in scope.
    let wasm = compile_expr(&Expr::bind("x", Expr::var("x"), n(1.0)));
    let data = String::from_utf8(get_data(&wasm)).expect("utf-8 data");
    assert!(data.contains("var:x"));
}

// ══════════════════════════════════════════════════════════════════════════════
// Determinism
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn deterministic_output_same_input() {
    let expr = Expr::bind(
        "a",
        Expr::pair(Expr::var("b"), Expr::var("c")),
        Expr::if_then_else(Expr::less(n(1.0), n(2.0)), Expr::head(Expr::var("a")), Expr::var("d")),
    );
    let reference = compile_expr(&expr);
    for i in 0..20 {
        assert_eq!(compile_expr(&expr), reference, "iteration {i} produced different bytes");
    }
}

#[test]
fn deeply_nested_bindings_compile() {
    let mut expr = Expr::var("x0");
    for i in (0..200).rev() {
        expr = Expr::bind(format!("x{i}"), n(f64::from(i)), expr);
    }
    assert!(is_valid_wasm(&compile_expr(&expr)));
}
