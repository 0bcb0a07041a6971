pub mod tokens;

use thiserror::Error;
use tokens::{keyword_type, Token, TokenType};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexerError {
    #[error("{file}:{line}:{column}: unknown keyword '{word}'")]
    UnknownKeyword {
        word: String,
        line: usize,
        column: usize,
        file: String,
    },

    #[error("{file}:{line}:{column}: unexpected character {ch:?}")]
    UnexpectedCharacter {
        ch: char,
        line: usize,
        column: usize,
        file: String,
    },

    #[error("{file}:{line}:{column}: number literal {literal} does not fit in a signed 64-bit integer")]
    NumberOutOfRange {
        literal: String,
        line: usize,
        column: usize,
        file: String,
    },
}

impl LexerError {
    pub fn line(&self) -> usize {
        match self {
            LexerError::UnknownKeyword { line, .. }
            | LexerError::UnexpectedCharacter { line, .. }
            | LexerError::NumberOutOfRange { line, .. } => *line,
        }
    }

    pub fn column(&self) -> usize {
        match self {
            LexerError::UnknownKeyword { column, .. }
            | LexerError::UnexpectedCharacter { column, .. }
            | LexerError::NumberOutOfRange { column, .. } => *column,
        }
    }
}

pub struct Lexer {
    source: Vec<char>,
    filename: String,
    pos: usize,
    line: usize,
    column: usize,
    tokens: Vec<Token>,
}

impl Lexer {
    pub fn new(source: &str, filename: &str) -> Self {
        Self {
            source: source.chars().collect(),
            filename: filename.to_string(),
            pos: 0,
            line: 1,
            column: 1,
            tokens: Vec::new(),
        }
    }

    /// Scan the whole source. The result always ends with exactly one `Eof`.
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexerError> {
        loop {
            self.skip_whitespace();
            if self.at_end() {
                break;
            }
            if self.peek() == '#' {
                self.skip_comment();
                continue;
            }
            self.scan_token()?;
        }

        self.tokens
            .push(Token::new(TokenType::Eof, self.line, self.column));
        debug!(
            file = %self.filename,
            tokens = self.tokens.len(),
            "tokenized source"
        );
        Ok(self.tokens)
    }

    fn scan_token(&mut self) -> Result<(), LexerError> {
        let ch = self.peek();

        if ch.is_ascii_digit() {
            return self.scan_number();
        }

        // A minus sign only starts a number when a digit follows it
        if ch == '-' && self.peek_ahead(1).map_or(false, |c| c.is_ascii_digit()) {
            return self.scan_number();
        }

        if ch.is_ascii_alphabetic() {
            return self.scan_keyword();
        }

        Err(LexerError::UnexpectedCharacter {
            ch,
            line: self.line,
            column: self.column,
            file: self.filename.clone(),
        })
    }

    fn scan_number(&mut self) -> Result<(), LexerError> {
        let start_line = self.line;
        let start_col = self.column;
        let mut literal = String::new();

        if self.peek() == '-' {
            literal.push(self.advance());
        }
        while !self.at_end() && self.peek().is_ascii_digit() {
            literal.push(self.advance());
        }

        let value = literal
            .parse::<i64>()
            .map_err(|_| LexerError::NumberOutOfRange {
                literal: literal.clone(),
                line: start_line,
                column: start_col,
                file: self.filename.clone(),
            })?;

        self.tokens
            .push(Token::new(TokenType::Number(value), start_line, start_col));
        Ok(())
    }

    fn scan_keyword(&mut self) -> Result<(), LexerError> {
        let start_line = self.line;
        let start_col = self.column;
        let mut word = String::new();

        while !self.at_end() && self.peek().is_ascii_alphabetic() {
            word.push(self.advance());
        }

        match keyword_type(&word) {
            Some(tt) => {
                self.tokens.push(Token::new(tt, start_line, start_col));
                Ok(())
            }
            None => Err(LexerError::UnknownKeyword {
                word,
                line: start_line,
                column: start_col,
                file: self.filename.clone(),
            }),
        }
    }

    // ── Helpers ─────────────────────────────────────────────────────────

    fn peek(&self) -> char {
        self.source[self.pos]
    }

    fn peek_ahead(&self, offset: usize) -> Option<char> {
        self.source.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> char {
        let ch = self.source[self.pos];
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        ch
    }

    fn at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn skip_whitespace(&mut self) {
        while !self.at_end() && self.peek().is_whitespace() {
            self.advance();
        }
    }

    /// Consume up to, not including, the next newline.
    fn skip_comment(&mut self) {
        while !self.at_end() && self.peek() != '\n' {
            self.advance();
        }
    }
}
