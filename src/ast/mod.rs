//! Abstract instructions produced by the parser and consumed by the compiler.

use std::fmt;

use serde::Serialize;

use crate::lexer::tokens::{INVOKE_KEYWORD, PUSH_KEYWORD};

/// Source location of an instruction's keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SourceLoc {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Instruction {
    /// Push a literal onto the operand stack
    Push(i64),
    /// Invoke the operation with this numeric code. The code is kept at full
    /// width here; narrowing to a byte happens at encode time.
    Invoke(i64),
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Push(v) => write!(f, "{} {}", PUSH_KEYWORD, v),
            Instruction::Invoke(op) => write!(f, "{} {}", INVOKE_KEYWORD, op),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Program {
    pub instructions: Vec<Instruction>,
    /// Parallel to `instructions` when parsed from source, empty otherwise
    pub locations: Vec<SourceLoc>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, instruction: Instruction, loc: SourceLoc) {
        self.instructions.push(instruction);
        self.locations.push(loc);
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Instruction> {
        self.instructions.iter()
    }

    /// Source location of the instruction at `idx`, if it came from source.
    pub fn location(&self, idx: usize) -> Option<SourceLoc> {
        self.locations.get(idx).copied()
    }
}

impl From<Vec<Instruction>> for Program {
    /// Builds a program that has no source locations.
    fn from(instructions: Vec<Instruction>) -> Self {
        Self {
            instructions,
            locations: Vec::new(),
        }
    }
}
