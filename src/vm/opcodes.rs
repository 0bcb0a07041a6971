//! Ahlelele instruction set
//!
//! Numbering shared by the compiler, the virtual machine and the
//! disassembler. Every byte in a stream is either an opcode tag or part of
//! the 8-byte operand that follows a push tag.

use std::fmt;

use serde::Serialize;

/// First four bytes of every executable ("AHLA" when read little-endian).
pub const MAGIC: u32 = 0x414C_4841;

/// Width of a push operand in bytes. Operands are little-endian `i64`.
pub const OPERAND_WIDTH: usize = 8;

/// Tag byte announcing that an operand to push follows.
pub const PUSH_SENTINEL: u8 = 0xFF;

/// Emitted by the compiler in place of an invoke whose target byte equals
/// [`PUSH_SENTINEL`]. Never assigned to an operation, so the VM rejects it as
/// unknown opcode 254 like any other unassigned byte.
pub const INVALID_INVOKE: u8 = 0xFE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum Opcode {
    PrintChar = 0,
    PrintNum = 1,
    Add = 2,
    Sub = 3,
    Mul = 4,
    Div = 5,
    Dup = 6,
    Swap = 7,
    Drop = 8,
    Halt = 9,
    Push = PUSH_SENTINEL,
}

impl Opcode {
    /// Every opcode, operations first in numeric order, then the push tag.
    pub const ALL: [Opcode; 11] = [
        Opcode::PrintChar,
        Opcode::PrintNum,
        Opcode::Add,
        Opcode::Sub,
        Opcode::Mul,
        Opcode::Div,
        Opcode::Dup,
        Opcode::Swap,
        Opcode::Drop,
        Opcode::Halt,
        Opcode::Push,
    ];

    pub fn from_byte(byte: u8) -> Option<Opcode> {
        match byte {
            0 => Some(Opcode::PrintChar),
            1 => Some(Opcode::PrintNum),
            2 => Some(Opcode::Add),
            3 => Some(Opcode::Sub),
            4 => Some(Opcode::Mul),
            5 => Some(Opcode::Div),
            6 => Some(Opcode::Dup),
            7 => Some(Opcode::Swap),
            8 => Some(Opcode::Drop),
            9 => Some(Opcode::Halt),
            PUSH_SENTINEL => Some(Opcode::Push),
            _ => None,
        }
    }

    pub fn as_byte(self) -> u8 {
        self as u8
    }

    /// Whether an operand follows the tag in the byte stream
    pub fn has_operand(self) -> bool {
        self == Opcode::Push
    }

    /// Values the operation pops (or, for `Dup`, reads) before acting.
    pub fn stack_inputs(self) -> usize {
        match self {
            Opcode::Push | Opcode::Halt => 0,
            Opcode::PrintChar | Opcode::PrintNum | Opcode::Dup | Opcode::Drop => 1,
            Opcode::Add | Opcode::Sub | Opcode::Mul | Opcode::Div | Opcode::Swap => 2,
        }
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::PrintChar => "print_char",
            Opcode::PrintNum => "print_num",
            Opcode::Add => "add",
            Opcode::Sub => "sub",
            Opcode::Mul => "mul",
            Opcode::Div => "div",
            Opcode::Dup => "dup",
            Opcode::Swap => "swap",
            Opcode::Drop => "drop",
            Opcode::Halt => "halt",
            Opcode::Push => "push",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}
