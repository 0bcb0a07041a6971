//! Stack machine that runs compiled Ahlelele byte streams
//!
//! The machine walks a raw byte stream with a bounds-checked cursor:
//! fetch one tag byte, read its operand if it has one, apply the stack
//! effect, repeat until `halt`, the end of the stream, or an error.
//! The operand stack and the cursor live only for one `execute` call.

use std::io::{self, Write};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, trace};

use super::cursor::Cursor;
use super::opcodes::Opcode;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("stack underflow at offset {offset}: {opcode} needs {needed} value(s), stack holds {available}")]
    StackUnderflow {
        opcode: Opcode,
        needed: usize,
        available: usize,
        offset: usize,
    },

    #[error("division by zero at offset {offset}")]
    DivisionByZero { offset: usize },

    #[error("integer overflow in {opcode} at offset {offset}")]
    IntegerOverflow { opcode: Opcode, offset: usize },

    #[error("unknown opcode {byte} at offset {offset}")]
    UnknownOpcode { byte: u8, offset: usize },

    #[error("truncated operand at offset {offset}: need 8 bytes, {remaining} remaining")]
    TruncatedOperand { offset: usize, remaining: usize },

    #[error("unexpected end of bytecode at offset {offset}")]
    UnexpectedEndOfBytecode { offset: usize },

    #[error("cannot write program output: {0}")]
    Output(#[source] io::Error),
}

/// How a successful run ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExecutionReport {
    /// Instructions dispatched, including the final `halt`
    pub instructions: usize,
    /// `true` if a `halt` stopped the run, `false` if the stream ran out
    pub halted: bool,
    pub max_stack_depth: usize,
}

/// The only runtime data structure: a stack of signed 64-bit values.
#[derive(Debug, Default)]
struct OperandStack {
    values: Vec<i64>,
}

impl OperandStack {
    #[inline]
    fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    fn push(&mut self, value: i64) {
        self.values.push(value);
    }

    /// Fail unless at least `opcode.stack_inputs()` values are present.
    #[inline]
    fn require(&self, opcode: Opcode, offset: usize) -> Result<(), RuntimeError> {
        let needed = opcode.stack_inputs();
        if self.values.len() < needed {
            return Err(RuntimeError::StackUnderflow {
                opcode,
                needed,
                available: self.values.len(),
                offset,
            });
        }
        Ok(())
    }

    #[inline]
    fn pop(&mut self, opcode: Opcode, offset: usize) -> Result<i64, RuntimeError> {
        self.values.pop().ok_or(RuntimeError::StackUnderflow {
            opcode,
            needed: opcode.stack_inputs(),
            available: 0,
            offset,
        })
    }

    #[inline]
    fn peek(&self, opcode: Opcode, offset: usize) -> Result<i64, RuntimeError> {
        self.values.last().copied().ok_or(RuntimeError::StackUnderflow {
            opcode,
            needed: opcode.stack_inputs(),
            available: 0,
            offset,
        })
    }
}

/// The Ahlelele Virtual Machine. Program output goes to `W`.
pub struct VM<W: Write> {
    output: W,
}

impl<W: Write> VM<W> {
    pub fn new(output: W) -> Self {
        Self { output }
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Run a byte stream to completion. Output already written before an
    /// error stays written; the sink is flushed either way.
    pub fn execute(&mut self, code: &[u8]) -> Result<ExecutionReport, RuntimeError> {
        let result = self.run(code);
        let flushed = self.output.flush().map_err(RuntimeError::Output);
        let report = result?;
        flushed?;
        Ok(report)
    }

    // ── Main execution loop ──────────────────────────────────────────

    fn run(&mut self, code: &[u8]) -> Result<ExecutionReport, RuntimeError> {
        let mut cursor = Cursor::new(code);
        let mut stack = OperandStack::default();
        let mut report = ExecutionReport::default();

        while !cursor.is_at_end() {
            let offset = cursor.position();
            let byte = cursor.read_u8()?;
            let opcode = decode(byte, offset)?;
            report.instructions += 1;

            trace!(offset, %opcode, depth = stack.len(), "dispatch");

            if opcode == Opcode::Halt {
                report.halted = true;
                break;
            }

            self.dispatch(opcode, offset, &mut cursor, &mut stack)?;
            report.max_stack_depth = report.max_stack_depth.max(stack.len());
        }

        debug!(
            instructions = report.instructions,
            halted = report.halted,
            max_stack_depth = report.max_stack_depth,
            "execution finished"
        );
        Ok(report)
    }

    // ── Instruction dispatch ─────────────────────────────────────────

    fn dispatch(
        &mut self,
        opcode: Opcode,
        offset: usize,
        cursor: &mut Cursor<'_>,
        stack: &mut OperandStack,
    ) -> Result<(), RuntimeError> {
        stack.require(opcode, offset)?;

        match opcode {
            Opcode::Push => {
                let value = cursor.read_i64()?;
                stack.push(value);
            }

            // ── Output ──────────────────────────────────────────────
            Opcode::PrintChar => {
                let value = stack.pop(opcode, offset)?;
                self.output
                    .write_all(&[value as u8])
                    .map_err(RuntimeError::Output)?;
            }
            Opcode::PrintNum => {
                let value = stack.pop(opcode, offset)?;
                write!(self.output, "{}", value).map_err(RuntimeError::Output)?;
            }

            // ── Arithmetic ──────────────────────────────────────────
            Opcode::Add => binary(stack, opcode, offset, i64::checked_add)?,
            Opcode::Sub => binary(stack, opcode, offset, i64::checked_sub)?,
            Opcode::Mul => binary(stack, opcode, offset, i64::checked_mul)?,
            Opcode::Div => {
                let b = stack.pop(opcode, offset)?;
                let a = stack.pop(opcode, offset)?;
                if b == 0 {
                    return Err(RuntimeError::DivisionByZero { offset });
                }
                // checked_div only fails on i64::MIN / -1 here
                let quotient = a
                    .checked_div(b)
                    .ok_or(RuntimeError::IntegerOverflow { opcode, offset })?;
                stack.push(quotient);
            }

            // ── Stack manipulation ──────────────────────────────────
            Opcode::Dup => {
                let top = stack.peek(opcode, offset)?;
                stack.push(top);
            }
            Opcode::Swap => {
                let a = stack.pop(opcode, offset)?;
                let b = stack.pop(opcode, offset)?;
                stack.push(a);
                stack.push(b);
            }
            Opcode::Drop => {
                stack.pop(opcode, offset)?;
            }

            // Handled by the run loop before dispatch
            Opcode::Halt => {}
        }
        Ok(())
    }
}

fn decode(byte: u8, offset: usize) -> Result<Opcode, RuntimeError> {
    Opcode::from_byte(byte).ok_or(RuntimeError::UnknownOpcode { byte, offset })
}

/// Pops b then a, pushes `op(a, b)`.
#[inline]
fn binary(
    stack: &mut OperandStack,
    opcode: Opcode,
    offset: usize,
    op: fn(i64, i64) -> Option<i64>,
) -> Result<(), RuntimeError> {
    let b = stack.pop(opcode, offset)?;
    let a = stack.pop(opcode, offset)?;
    let result = op(a, b).ok_or(RuntimeError::IntegerOverflow { opcode, offset })?;
    stack.push(result);
    Ok(())
}

/// Run `code` on a fresh VM, collecting output into a byte vector.
pub fn execute_to_vec(code: &[u8]) -> (Result<ExecutionReport, RuntimeError>, Vec<u8>) {
    let mut vm = VM::new(Vec::new());
    let result = vm.execute(code);
    (result, vm.into_output())
}
