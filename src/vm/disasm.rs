//! Static listing of a byte stream.

use std::fmt;

use serde::Serialize;

use super::cursor::Cursor;
use super::machine::RuntimeError;
use super::opcodes::Opcode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DisasmEntry {
    pub offset: usize,
    pub byte: u8,
    /// `"unknown"` for bytes with no operation assigned
    pub mnemonic: &'static str,
    pub operand: Option<i64>,
}

impl fmt::Display for DisasmEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}  {:02x}  {}", self.offset, self.byte, self.mnemonic)?;
        if let Some(operand) = self.operand {
            write!(f, " {}", operand)?;
        }
        Ok(())
    }
}

/// Decode every instruction in `code` without executing it. Unlike the VM,
/// the listing continues past `halt` and past unknown bytes; only a push
/// operand cut short by the end of the stream is an error.
pub fn disassemble(code: &[u8]) -> Result<Vec<DisasmEntry>, RuntimeError> {
    let mut cursor = Cursor::new(code);
    let mut entries = Vec::new();

    while !cursor.is_at_end() {
        let offset = cursor.position();
        let byte = cursor.read_u8()?;
        let entry = match Opcode::from_byte(byte) {
            Some(opcode) => DisasmEntry {
                offset,
                byte,
                mnemonic: opcode.mnemonic(),
                operand: if opcode.has_operand() {
                    Some(cursor.read_i64()?)
                } else {
                    None
                },
            },
            None => DisasmEntry {
                offset,
                byte,
                mnemonic: "unknown",
                operand: None,
            },
        };
        entries.push(entry);
    }

    Ok(entries)
}

pub fn render_listing(entries: &[DisasmEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        out.push_str(&entry.to_string());
        out.push('\n');
    }
    out
}
