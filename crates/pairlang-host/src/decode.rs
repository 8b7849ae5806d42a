//! Reading values and symbols back out of a module's linear memory.

use pairlang_codegen::types::{
    OP_ADD, OP_HEAD, OP_LE, OP_TAIL, SYMBOL_PREFIX, TAG_BOOL, TAG_NUMBER, TAG_PAIR, VALUE_SIZE,
};
use pairlang_types::{Name, Value};
use thiserror::Error;

/// Memory contents that do not follow the cell layout.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("module does not export its memory")]
    MissingMemory,

    #[error("read of {len} bytes at {ptr:#x} is outside memory of {size} bytes")]
    OutOfBounds { ptr: u32, len: u32, size: usize },

    #[error("unknown value tag {tag} at {ptr:#x}")]
    UnknownTag { tag: i32, ptr: u32 },

    /// Pair components are allocated before the pair that holds them.
    #[error("pair at {ptr:#x} refers forward to {component:#x}")]
    ForwardReference { ptr: u32, component: u32 },

    #[error("string at {ptr:#x} is not valid UTF-8")]
    InvalidUtf8 { ptr: u32 },

    #[error("symbol `{0}` is missing the `{prefix}` prefix", prefix = SYMBOL_PREFIX)]
    MissingPrefix(String),

    #[error("unknown primitive code {0}")]
    UnknownPrimitive(i32),

    #[error("{op} reported a fault without its other operand")]
    MissingOperand { op: Primitive },
}

/// The primitives that check their operand types at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Add,
    Le,
    Head,
    Tail,
}

impl Primitive {
    /// Decode the `op` argument of `env.contract_violation`.
    pub fn from_code(code: i32) -> Result<Self, DecodeError> {
        match code {
            OP_ADD => Ok(Primitive::Add),
            OP_LE => Ok(Primitive::Le),
            OP_HEAD => Ok(Primitive::Head),
            OP_TAIL => Ok(Primitive::Tail),
            other => Err(DecodeError::UnknownPrimitive(other)),
        }
    }

    /// Surface name used in messages.
    pub fn name(self) -> &'static str {
        match self {
            Primitive::Add => "+",
            Primitive::Le => "<=",
            Primitive::Head => "head",
            Primitive::Tail => "tail",
        }
    }

    /// Predicate every operand must satisfy.
    pub fn expected(self) -> &'static str {
        if self.is_numeric() {
            "number?"
        } else {
            "pair?"
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, Primitive::Add | Primitive::Le)
    }
}

impl std::fmt::Display for Primitive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

fn read_bytes(data: &[u8], ptr: u32, len: u32) -> Result<&[u8], DecodeError> {
    let start = ptr as usize;
    start
        .checked_add(len as usize)
        .and_then(|end| data.get(start..end))
        .ok_or(DecodeError::OutOfBounds {
            ptr,
            len,
            size: data.len(),
        })
}

fn read_i32(data: &[u8], ptr: u32) -> Result<i32, DecodeError> {
    let bytes = read_bytes(data, ptr, 4)?;
    let mut word = [0u8; 4];
    word.copy_from_slice(bytes);
    Ok(i32::from_le_bytes(word))
}

fn read_f64(data: &[u8], ptr: u32) -> Result<f64, DecodeError> {
    let bytes = read_bytes(data, ptr, 8)?;
    let mut word = [0u8; 8];
    word.copy_from_slice(bytes);
    Ok(f64::from_le_bytes(word))
}

/// Decode the value cell at `ptr`.
pub fn read_value(data: &[u8], ptr: u32) -> Result<Value, DecodeError> {
    // The whole cell must be addressable, whatever its tag.
    read_bytes(data, ptr, VALUE_SIZE)?;
    let tag = read_i32(data, ptr)?;
    match tag {
        TAG_NUMBER => Ok(Value::Number(read_f64(data, ptr + 4)?)),
        TAG_BOOL => Ok(Value::Bool(read_i32(data, ptr + 4)? != 0)),
        TAG_PAIR => {
            let first = read_component(data, ptr, 4)?;
            let second = read_component(data, ptr, 8)?;
            Ok(Value::pair(first, second))
        }
        tag => Err(DecodeError::UnknownTag { tag, ptr }),
    }
}

fn read_component(data: &[u8], ptr: u32, offset: u32) -> Result<Value, DecodeError> {
    let component = read_i32(data, ptr + offset)? as u32;
    if component >= ptr {
        return Err(DecodeError::ForwardReference { ptr, component });
    }
    read_value(data, component)
}

/// Decode the optional cell at `ptr`; address 0 never holds a cell.
pub fn read_optional_value(data: &[u8], ptr: u32) -> Result<Option<Value>, DecodeError> {
    if ptr == 0 {
        Ok(None)
    } else {
        read_value(data, ptr).map(Some)
    }
}

/// Read a UTF-8 string stored in the data segment.
pub fn read_string(data: &[u8], ptr: u32, len: u32) -> Result<String, DecodeError> {
    let bytes = read_bytes(data, ptr, len)?;
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|_| DecodeError::InvalidUtf8 { ptr })
}

/// Read an interned variable symbol and strip its namespace prefix.
pub fn read_symbol(data: &[u8], ptr: u32, len: u32) -> Result<Name, DecodeError> {
    let symbol = read_string(data, ptr, len)?;
    match symbol.strip_prefix(SYMBOL_PREFIX) {
        Some(name) => Ok(name.to_owned()),
        None => Err(DecodeError::MissingPrefix(symbol)),
    }
}
