//! Errors at the pipeline boundaries.
//!
//! - [`SourceError`]: scanning or parsing failed; compilation stops.
//! - [`FormatError`]: the executable container is unusable; nothing runs.
//! - [`RuntimeError`]: execution stopped at the failing instruction.
//!
//! [`Error`] gathers these plus file access failures for the driver.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::lexer::LexerError;
use crate::parser::ParseError;
use crate::vm::bytecode::FormatError;
use crate::vm::machine::RuntimeError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error(transparent)]
    Lex(#[from] LexerError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl SourceError {
    pub fn line(&self) -> usize {
        match self {
            SourceError::Lex(e) => e.line(),
            SourceError::Parse(e) => e.line(),
        }
    }

    pub fn column(&self) -> usize {
        match self {
            SourceError::Lex(e) => e.column(),
            SourceError::Parse(e) => e.column(),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Compilation error: {0}")]
    Source(#[from] SourceError),

    #[error("{0}")]
    Format(#[from] FormatError),

    #[error("Runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    #[error("cannot read file {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("cannot write file {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("file {} is too large ({size} bytes, max {max} bytes)", path.display())]
    TooLarge { path: PathBuf, size: u64, max: u64 },
}
