//! Bytecode compiler: Program → byte stream
//!
//! `Push(v)` becomes the push tag followed by `v` as 8 little-endian bytes.
//! `Invoke(op)` becomes the low byte of `op`. A `halt` is always appended.

use tracing::{debug, warn};

use super::opcodes::{Opcode, INVALID_INVOKE, PUSH_SENTINEL};
use crate::ast::{Instruction, Program};

pub struct Compiler {
    code: Vec<u8>,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Compiler {
    pub fn new() -> Self {
        Self { code: Vec::new() }
    }

    /// Encode a whole program. Cannot fail.
    pub fn compile(&mut self, program: &Program) -> Vec<u8> {
        self.code.clear();

        for (idx, instruction) in program.instructions.iter().enumerate() {
            match *instruction {
                Instruction::Push(value) => {
                    self.emit_byte(Opcode::Push.as_byte());
                    self.emit_i64(value);
                }
                Instruction::Invoke(op) => {
                    let byte = invoke_byte(op);
                    if i64::from(byte) != op {
                        let loc = program.location(idx);
                        warn!(
                            operand = op,
                            encoded = byte,
                            line = ?loc.map(|l| l.line),
                            "invoke operand encoded as a different byte"
                        );
                    }
                    self.emit_byte(byte);
                }
            }
        }

        // Unconditional terminator; a program ending in its own halt stops there first
        self.emit_byte(Opcode::Halt.as_byte());

        debug!(
            instructions = program.len(),
            bytes = self.code.len(),
            "encoded program"
        );
        std::mem::take(&mut self.code)
    }

    fn emit_byte(&mut self, byte: u8) {
        self.code.push(byte);
    }

    fn emit_i64(&mut self, value: i64) {
        self.code.extend_from_slice(&value.to_le_bytes());
    }
}

/// Byte emitted for `Invoke(op)`: the low eight bits of `op`, except that a
/// target equal to the push tag is replaced by [`INVALID_INVOKE`] so it can
/// never be decoded as a push. At run time that byte fails as opcode 254.
pub fn invoke_byte(op: i64) -> u8 {
    match op as u8 {
        PUSH_SENTINEL => INVALID_INVOKE,
        byte => byte,
    }
}
