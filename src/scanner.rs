//! Streaming lexer for mlscript source text.
//!
//! [`Scanner`] walks the source bytes once and yields `Token<'a>`s whose
//! lexemes borrow from the input.  Whitespace and `//` comments produce no
//! tokens; the stream always ends with exactly one `EOF` token carrying the
//! last line number.
//!
//! Recognised input:
//!
//! - punctuation `( ) { } [ ] , : .` and operators `+ - * / = == != < <= > >=`
//! - double-quoted strings (no escapes, may span lines)
//! - integer and float literals (a float needs digits on both sides of `.`)
//! - identifiers, with keywords resolved through a perfect-hash table
//!
//! Anything else is a [`MlError::Lex`]; no character is silently dropped.

use std::iter::FusedIterator;

use log::{debug, info};
use memchr::memchr;
use phf::phf_map;

use crate::error::{MlError, Result};
use crate::token::{Token, TokenType};

static KEYWORDS: phf::Map<&'static [u8], TokenType> = phf_map! {
    b"if"       => TokenType::IF,
    b"elif"     => TokenType::ELIF,
    b"else"     => TokenType::ELSE,
    b"while"    => TokenType::WHILE,
    b"for"      => TokenType::FOR,
    b"in"       => TokenType::IN,
    b"not"      => TokenType::NOT,
    b"fun"      => TokenType::FUN,
    b"return"   => TokenType::RETURN,
    b"print"    => TokenType::PRINT,
    b"class"    => TokenType::CLASS,
    b"super"    => TokenType::SUPER,
    b"inherits" => TokenType::INHERITS,
    b"try"      => TokenType::TRY,
    b"catch"    => TokenType::CATCH,
    b"finally"  => TokenType::FINALLY,
    b"throw"    => TokenType::THROW,
    b"break"    => TokenType::BREAK,
    b"continue" => TokenType::CONTINUE,
    b"with"     => TokenType::WITH,
    b"import"   => TokenType::IMPORT,
    b"as"       => TokenType::AS,
    b"network"  => TokenType::NETWORK,
    b"true"     => TokenType::TRUE,
    b"false"    => TokenType::FALSE,
};

/// Token kind of a one-byte punctuator, if `b` is one.
fn punctuator(b: u8) -> Option<TokenType> {
    let tt: TokenType = match b {
        b'(' => TokenType::LEFT_PAREN,
        b')' => TokenType::RIGHT_PAREN,
        b'{' => TokenType::LEFT_BRACE,
        b'}' => TokenType::RIGHT_BRACE,
        b'[' => TokenType::LEFT_BRACKET,
        b']' => TokenType::RIGHT_BRACKET,
        b',' => TokenType::COMMA,
        b':' => TokenType::COLON,
        b'.' => TokenType::DOT,
        b'-' => TokenType::MINUS,
        b'+' => TokenType::PLUS,
        b'*' => TokenType::STAR,
        _ => return None,
    };

    Some(tt)
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Single-pass lexer over a borrowed source buffer.
pub struct Scanner<'a> {
    src: &'a str,
    /// Byte offset where the current lexeme starts.
    start: usize,
    /// Byte offset of the next unread byte.
    curr: usize,
    line: usize,
    finished: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(src: &'a str) -> Self {
        info!("Scanner created over {} bytes", src.len());

        Self {
            src,
            start: 0,
            curr: 0,
            line: 1,
            finished: false,
        }
    }

    #[inline(always)]
    fn bytes(&self) -> &'a [u8] {
        self.src.as_bytes()
    }

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        self.curr >= self.src.len()
    }

    /// Byte `offset` positions ahead of the cursor, `0` past the end.
    #[inline(always)]
    fn look(&self, offset: usize) -> u8 {
        self.bytes().get(self.curr + offset).copied().unwrap_or(0)
    }

    #[inline(always)]
    fn bump(&mut self) -> u8 {
        let b: u8 = self.look(0);
        self.curr += 1;
        b
    }

    /// `long` if the next byte is `=` (consuming it), else `short`.
    fn with_equals(&mut self, long: TokenType, short: TokenType) -> TokenType {
        if self.look(0) == b'=' {
            self.curr += 1;
            long
        } else {
            short
        }
    }

    /// Scan from `self.start`.  `Ok(None)` means whitespace or a comment was
    /// consumed and nothing is emitted.
    fn scan_token(&mut self) -> Result<Option<TokenType>> {
        let b: u8 = self.bump();

        if let Some(tt) = punctuator(b) {
            return Ok(Some(tt));
        }

        let tt: TokenType = match b {
            b'=' => self.with_equals(TokenType::EQUAL_EQUAL, TokenType::EQUAL),
            b'<' => self.with_equals(TokenType::LESS_EQUAL, TokenType::LESS),
            b'>' => self.with_equals(TokenType::GREATER_EQUAL, TokenType::GREATER),
            b'!' if self.look(0) == b'=' => {
                self.curr += 1;
                TokenType::BANG_EQUAL
            }

            b'\n' => {
                self.line += 1;
                return Ok(None);
            }
            b' ' | b'\r' | b'\t' => return Ok(None),

            b'/' if self.look(0) == b'/' => {
                // The newline stays unread so the line counter sees it.
                self.curr = match memchr(b'\n', &self.bytes()[self.curr..]) {
                    Some(pos) => self.curr + pos,
                    None => self.src.len(),
                };
                return Ok(None);
            }
            b'/' => TokenType::SLASH,

            b'"' => self.string()?,
            b'0'..=b'9' => self.number()?,
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.identifier(),

            _ => {
                let ch: char = self.src[self.start..].chars().next().unwrap_or('?');

                return Err(MlError::lex(
                    self.line,
                    format!("Unexpected character: {}", ch),
                ));
            }
        };

        Ok(Some(tt))
    }

    fn string(&mut self) -> Result<TokenType> {
        let opening_line: usize = self.line;

        match memchr(b'"', &self.bytes()[self.curr..]) {
            Some(pos) => {
                let body: &str = &self.src[self.curr..self.curr + pos];

                self.line += body.bytes().filter(|b| *b == b'\n').count();
                self.curr += pos + 1;

                Ok(TokenType::STRING(body.to_owned()))
            }
            None => {
                self.curr = self.src.len();

                Err(MlError::lex(opening_line, "Unterminated string."))
            }
        }
    }

    fn skip_digits(&mut self) {
        while self.look(0).is_ascii_digit() {
            self.curr += 1;
        }
    }

    fn number(&mut self) -> Result<TokenType> {
        self.skip_digits();

        let is_float: bool = self.look(0) == b'.' && self.look(1).is_ascii_digit();

        if is_float {
            self.curr += 1;
            self.skip_digits();
        }

        let text: &str = &self.src[self.start..self.curr];

        if is_float {
            // Digits around a single dot always parse.
            return Ok(TokenType::FLOAT(text.parse::<f64>().unwrap_or(f64::NAN)));
        }

        text.parse::<i64>()
            .map(TokenType::INTEGER)
            .map_err(|_| MlError::lex(self.line, format!("Integer literal too large: {}", text)))
    }

    fn identifier(&mut self) -> TokenType {
        while is_ident_byte(self.look(0)) {
            self.curr += 1;
        }

        KEYWORDS
            .get(&self.bytes()[self.start..self.curr])
            .cloned()
            .unwrap_or(TokenType::IDENTIFIER)
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<Token<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        while !self.is_at_end() {
            self.start = self.curr;

            match self.scan_token() {
                Ok(Some(tt)) => {
                    let src: &'a str = self.src;
                    let lexeme: &'a str = &src[self.start..self.curr];

                    debug!("Scanned token ({:?}) on line {}", tt, self.line);

                    return Some(Ok(Token::new(tt, lexeme, self.line)));
                }
                Ok(None) => {}
                Err(e) => {
                    // Resume on a char boundary after a multi-byte offender.
                    while !self.src.is_char_boundary(self.curr.min(self.src.len())) {
                        self.curr += 1;
                    }

                    return Some(Err(e));
                }
            }
        }

        self.finished = true;

        Some(Ok(Token::new(TokenType::EOF, "", self.line)))
    }
}

impl<'a> FusedIterator for Scanner<'a> {}

/// Scan `src` completely.  The first lexical error aborts the scan: a parse
/// unit is never handed a partial token stream.
pub fn tokenize(src: &str) -> Result<Vec<Token<'_>>> {
    let tokens: Vec<Token<'_>> = Scanner::new(src).collect::<Result<Vec<_>>>()?;

    info!("Tokenized {} tokens", tokens.len());

    Ok(tokens)
}
