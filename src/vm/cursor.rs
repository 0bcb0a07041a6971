//! Bounds-checked read cursor over a byte stream.
//!
//! Every read validates the remaining length before consuming, so a
//! malformed stream ends in an error instead of an out-of-range access.

use super::machine::RuntimeError;
use super::opcodes::OPERAND_WIDTH;

#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    code: &'a [u8],
    ip: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(code: &'a [u8]) -> Self {
        Self { code, ip: 0 }
    }

    /// Offset of the next byte to be read.
    pub fn position(&self) -> usize {
        self.ip
    }

    pub fn remaining(&self) -> usize {
        self.code.len() - self.ip
    }

    pub fn is_at_end(&self) -> bool {
        self.ip >= self.code.len()
    }

    pub fn read_u8(&mut self) -> Result<u8, RuntimeError> {
        let byte = *self
            .code
            .get(self.ip)
            .ok_or(RuntimeError::UnexpectedEndOfBytecode { offset: self.ip })?;
        self.ip += 1;
        Ok(byte)
    }

    /// Read a little-endian `i64` operand.
    pub fn read_i64(&mut self) -> Result<i64, RuntimeError> {
        let end = self.ip + OPERAND_WIDTH;
        let bytes: [u8; OPERAND_WIDTH] = self
            .code
            .get(self.ip..end)
            .and_then(|slice| slice.try_into().ok())
            .ok_or(RuntimeError::TruncatedOperand {
                offset: self.ip,
                remaining: self.remaining(),
            })?;
        self.ip = end;
        Ok(i64::from_le_bytes(bytes))
    }
}
