pub mod lexer;
pub mod ast;
pub mod parser;
pub mod vm;
pub mod error;

use std::io::Write;

pub use error::{Error, SourceError};

use lexer::tokens::Token;
use lexer::Lexer;
use parser::Parser;
use vm::bytecode::Executable;
use vm::compiler::Compiler;
use vm::machine::{ExecutionReport, RuntimeError, VM};

/// Scan `source` into tokens.
pub fn tokenize(source: &str, filename: &str) -> Result<Vec<Token>, SourceError> {
    Ok(Lexer::new(source, filename).tokenize()?)
}

/// Lex, parse and encode `source`. Each stage finishes before the next
/// starts; the first failure aborts the whole compilation.
pub fn compile_source(source: &str, filename: &str) -> Result<Executable, SourceError> {
    let tokens = tokenize(source, filename)?;
    let program = Parser::new(tokens, filename).parse()?;
    let code = Compiler::new().compile(&program);
    Ok(Executable::new(code))
}

/// Execute a loaded executable, writing program output to `output`.
pub fn run_executable<W: Write>(
    executable: &Executable,
    output: W,
) -> Result<ExecutionReport, RuntimeError> {
    VM::new(output).execute(&executable.code)
}
