//! Ahlelele Virtual Machine
//!
//! Byte-level encoding, the executable container, and the stack machine
//! that runs it. `opcodes` is the vocabulary all of them share.

pub mod opcodes;
pub mod bytecode;
pub mod compiler;
pub mod cursor;
pub mod disasm;
pub mod machine;
