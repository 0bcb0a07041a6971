use std::fmt;

use serde::Serialize;

/// Keyword that pushes a literal onto the operand stack.
pub const PUSH_KEYWORD: &str = "ahlelele";
/// Keyword that invokes a numeric opcode.
pub const INVOKE_KEYWORD: &str = "ahlelas";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "value")]
pub enum TokenType {
    // Keywords
    Push,
    Invoke,

    // Literals
    Number(i64),

    // Structure
    Eof,
    /// Never produced by the lexer; parsers reject it like any other stray unit.
    Invalid,
}

impl TokenType {
    pub fn is_keyword(&self) -> bool {
        matches!(self, TokenType::Push | TokenType::Invoke)
    }

    /// Source spelling of a keyword token.
    pub fn keyword_text(&self) -> Option<&'static str> {
        match self {
            TokenType::Push => Some(PUSH_KEYWORD),
            TokenType::Invoke => Some(INVOKE_KEYWORD),
            _ => None,
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenType::Push => write!(f, "keyword '{}'", PUSH_KEYWORD),
            TokenType::Invoke => write!(f, "keyword '{}'", INVOKE_KEYWORD),
            TokenType::Number(n) => write!(f, "number {}", n),
            TokenType::Eof => write!(f, "end of input"),
            TokenType::Invalid => write!(f, "invalid token"),
        }
    }
}

/// Look up a keyword string. Keywords are case-sensitive.
pub fn keyword_type(word: &str) -> Option<TokenType> {
    match word {
        PUSH_KEYWORD => Some(TokenType::Push),
        INVOKE_KEYWORD => Some(TokenType::Invoke),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Token {
    pub token_type: TokenType,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(token_type: TokenType, line: usize, column: usize) -> Self {
        Self {
            token_type,
            line,
            column,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.token_type {
            TokenType::Number(n) => {
                write!(f, "Token(Number, {}, {}:{})", n, self.line, self.column)
            }
            other => write!(f, "Token({:?}, {}:{})", other, self.line, self.column),
        }
    }
}
