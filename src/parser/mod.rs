use thiserror::Error;
use tracing::debug;

use crate::ast::*;
use crate::lexer::tokens::{Token, TokenType};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("{file}:{line}:{column}: expected number after '{keyword}'")]
    ExpectedNumber {
        keyword: &'static str,
        line: usize,
        column: usize,
        file: String,
    },

    #[error("{file}:{line}:{column}: unexpected {found}, expected an instruction")]
    UnexpectedToken {
        found: TokenType,
        line: usize,
        column: usize,
        file: String,
    },
}

impl ParseError {
    pub fn line(&self) -> usize {
        match self {
            ParseError::ExpectedNumber { line, .. } | ParseError::UnexpectedToken { line, .. } => {
                *line
            }
        }
    }

    pub fn column(&self) -> usize {
        match self {
            ParseError::ExpectedNumber { column, .. }
            | ParseError::UnexpectedToken { column, .. } => *column,
        }
    }
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    filename: String,
}

impl Parser {
    pub fn new(tokens: Vec<Token>, filename: &str) -> Self {
        Self {
            tokens,
            pos: 0,
            filename: filename.to_string(),
        }
    }

    // ── Public API ──────────────────────────────────────────────────────

    /// Parse the whole token stream. Stops at the first `Eof`; a stream that
    /// holds nothing else yields an empty program.
    pub fn parse(&mut self) -> Result<Program, ParseError> {
        let mut program = Program::new();

        while !self.at_end() {
            let (instruction, loc) = self.parse_instruction()?;
            program.push(instruction, loc);
        }

        debug!(
            file = %self.filename,
            instructions = program.len(),
            "parsed program"
        );
        Ok(program)
    }

    // ── Instructions ────────────────────────────────────────────────────

    fn parse_instruction(&mut self) -> Result<(Instruction, SourceLoc), ParseError> {
        let keyword = self.advance();
        let loc = SourceLoc {
            line: keyword.line,
            column: keyword.column,
        };

        let build: fn(i64) -> Instruction = match keyword.token_type {
            TokenType::Push => Instruction::Push,
            TokenType::Invoke => Instruction::Invoke,
            other => {
                return Err(ParseError::UnexpectedToken {
                    found: other,
                    line: keyword.line,
                    column: keyword.column,
                    file: self.filename.clone(),
                })
            }
        };

        let value = self.expect_number(&keyword)?;
        Ok((build(value), loc))
    }

    fn expect_number(&mut self, keyword: &Token) -> Result<i64, ParseError> {
        match self.current().map(|t| t.token_type) {
            Some(TokenType::Number(n)) => {
                self.pos += 1;
                Ok(n)
            }
            _ => Err(ParseError::ExpectedNumber {
                keyword: keyword.token_type.keyword_text().unwrap_or("keyword"),
                line: keyword.line,
                column: keyword.column,
                file: self.filename.clone(),
            }),
        }
    }

    // ── Helpers ─────────────────────────────────────────────────────────

    fn current(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    /// Caller guarantees `!self.at_end()`.
    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos];
        self.pos += 1;
        tok
    }

    /// True at `Eof`, or when the stream ran out without one.
    fn at_end(&self) -> bool {
        self.current()
            .map_or(true, |t| t.token_type == TokenType::Eof)
    }
}
