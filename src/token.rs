use log::debug;
use serde::Serialize;
use std::fmt;
use std::mem;

use crate::value::format_float;

/// Token kinds produced by the scanner.
///
/// Literal kinds carry their parsed value; an `IDENTIFIER`'s name is its
/// lexeme.  Keyword kinds are spelled exactly like the keyword.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Serialize)]
pub enum TokenType {
    // punctuation
    LEFT_PAREN,
    RIGHT_PAREN,
    LEFT_BRACE,
    RIGHT_BRACE,
    LEFT_BRACKET,
    RIGHT_BRACKET,
    COMMA,
    COLON,
    DOT,

    // operators
    MINUS,
    PLUS,
    SLASH,
    STAR,
    BANG_EQUAL,
    EQUAL,
    EQUAL_EQUAL,
    GREATER,
    GREATER_EQUAL,
    LESS,
    LESS_EQUAL,

    IDENTIFIER,
    /// Contents between the quotes.
    STRING(String),
    INTEGER(i64),
    FLOAT(f64),

    IF,
    ELIF,
    ELSE,
    WHILE,
    FOR,
    IN,
    NOT,
    FUN,
    RETURN,
    PRINT,
    CLASS,
    SUPER,
    INHERITS,
    TRY,
    CATCH,
    FINALLY,
    THROW,
    BREAK,
    CONTINUE,
    WITH,
    IMPORT,
    AS,
    NETWORK,
    TRUE,
    FALSE,

    EOF,
}

impl TokenType {
    /// Variant name without payloads, as used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            TokenType::LEFT_PAREN => "LEFT_PAREN",
            TokenType::RIGHT_PAREN => "RIGHT_PAREN",
            TokenType::LEFT_BRACE => "LEFT_BRACE",
            TokenType::RIGHT_BRACE => "RIGHT_BRACE",
            TokenType::LEFT_BRACKET => "LEFT_BRACKET",
            TokenType::RIGHT_BRACKET => "RIGHT_BRACKET",
            TokenType::COMMA => "COMMA",
            TokenType::COLON => "COLON",
            TokenType::DOT => "DOT",
            TokenType::MINUS => "MINUS",
            TokenType::PLUS => "PLUS",
            TokenType::SLASH => "SLASH",
            TokenType::STAR => "STAR",
            TokenType::BANG_EQUAL => "BANG_EQUAL",
            TokenType::EQUAL => "EQUAL",
            TokenType::EQUAL_EQUAL => "EQUAL_EQUAL",
            TokenType::GREATER => "GREATER",
            TokenType::GREATER_EQUAL => "GREATER_EQUAL",
            TokenType::LESS => "LESS",
            TokenType::LESS_EQUAL => "LESS_EQUAL",
            TokenType::IDENTIFIER => "IDENTIFIER",
            TokenType::STRING(_) => "STRING",
            TokenType::INTEGER(_) => "INTEGER",
            TokenType::FLOAT(_) => "FLOAT",
            TokenType::IF => "IF",
            TokenType::ELIF => "ELIF",
            TokenType::ELSE => "ELSE",
            TokenType::WHILE => "WHILE",
            TokenType::FOR => "FOR",
            TokenType::IN => "IN",
            TokenType::NOT => "NOT",
            TokenType::FUN => "FUN",
            TokenType::RETURN => "RETURN",
            TokenType::PRINT => "PRINT",
            TokenType::CLASS => "CLASS",
            TokenType::SUPER => "SUPER",
            TokenType::INHERITS => "INHERITS",
            TokenType::TRY => "TRY",
            TokenType::CATCH => "CATCH",
            TokenType::FINALLY => "FINALLY",
            TokenType::THROW => "THROW",
            TokenType::BREAK => "BREAK",
            TokenType::CONTINUE => "CONTINUE",
            TokenType::WITH => "WITH",
            TokenType::IMPORT => "IMPORT",
            TokenType::AS => "AS",
            TokenType::NETWORK => "NETWORK",
            TokenType::TRUE => "TRUE",
            TokenType::FALSE => "FALSE",
            TokenType::EOF => "EOF",
        }
    }
}

/// Kinds compare by variant only; literal payloads are ignored so the
/// parser can ask for "any STRING".
impl PartialEq for TokenType {
    fn eq(&self, other: &Self) -> bool {
        mem::discriminant(self) == mem::discriminant(other)
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Token<'a> {
    pub token_type: TokenType,
    /// Source text the token was scanned from.
    pub lexeme: &'a str,
    /// 1-based line of the token's last byte.
    pub line: usize,
}

impl<'a> Token<'a> {
    pub fn new(token_type: TokenType, lexeme: &'a str, line: usize) -> Self {
        debug!("Token {} {:?} on line {}", token_type, lexeme, line);

        Self {
            token_type,
            lexeme,
            line,
        }
    }
}

impl<'a> fmt::Display for Token<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Payload-free kinds print "null" in the literal column.
        let literal: String = match &self.token_type {
            TokenType::STRING(s) => s.clone(),
            TokenType::INTEGER(n) => {
                let mut buf: itoa::Buffer = itoa::Buffer::new();
                buf.format(*n).to_owned()
            }
            TokenType::FLOAT(n) => format_float(*n),
            _ => "null".to_owned(),
        };

        write!(f, "{} {} {}", self.token_type.name(), self.lexeme, literal)
    }
}
