//! Module `scanner` implements a one‑pass, streaming lexer for the Rox language.
//!
//! It transforms a source `&str` into a sequence of `Token<'a>`s, skipping whitespace
//! and comments, and emitting exactly one `EOF` token at the end.  The first lexical
//! error ends the stream: the scanner yields the `Err` and then `None`, so it is a
//! `FusedIterator` and can be chained safely with other iterator adapters.
//!
//! # Token Recognition
//!
//! - Single‑character tokens: `(`, `)`, `{`, `}`, `[`, `]`, `,`, `.`, `-`, `+`, `;`, `*`, `?`, `:`.
//! - Two‑character operators: `!=`, `==`, `<=`, `>=`, `&&`, `||`.
//! - String literals: `"` … `"`, multi‑line, no escape processing.
//! - Numeric literals: integer part with an optional fractional part.
//! - Identifiers/keywords: alphanumeric/_ sequences, resolved via a perfect‑hash `KEYWORDS` map.
//! - Comments: `//` to end of line, skipped in bulk with `memchr`.
//!
//! # Example
//!
//! ```rust
//! use rox::scanner::Scanner;
//!
//! let source = "print 123; // example";
//! for result in Scanner::new(source) {
//!     match result {
//!         Ok(token) => println!("{}", token),
//!         Err(err) => eprintln!("{}", err),
//!     }
//! }
//! ```

use crate::error::{LoxError, Result};
use crate::token::{Token, TokenType};
use log::{debug, info};
use memchr::memchr;
use phf::phf_map;
use std::iter::FusedIterator;

// ─────────────────────────────────────────────────────────────────────────────
// Static keyword map (compile‑time perfect hash)
// ─────────────────────────────────────────────────────────────────────────────

static KEYWORDS: phf::Map<&'static str, TokenType> = phf_map! {
    "break"    => TokenType::BREAK,
    "continue" => TokenType::CONTINUE,
    "else"     => TokenType::ELSE,
    "false"    => TokenType::FALSE,
    "fn"       => TokenType::FN,
    "for"      => TokenType::FOR,
    "if"       => TokenType::IF,
    "let"      => TokenType::LET,
    "null"     => TokenType::NULL,
    "print"    => TokenType::PRINT,
    "return"   => TokenType::RETURN,
    "struct"   => TokenType::STRUCT,
    "super"    => TokenType::SUPER,
    "this"     => TokenType::THIS,
    "true"     => TokenType::TRUE,
    "while"    => TokenType::WHILE,
};

/// Scan the whole of `source`, stopping at the first lexical error.
pub fn scan(source: &str) -> Result<Vec<Token<'_>>> {
    let tokens: Vec<Token<'_>> = Scanner::new(source).collect::<Result<_>>()?;

    info!("Scanned {} tokens", tokens.len());

    Ok(tokens)
}

/// A single pass **scanner / lexer**.  The lifetime `'a` ties every emitted
/// token’s `lexeme` slice back to the original source text.
pub struct Scanner<'a> {
    source: &'a str,
    src: &'a [u8],              // `source` as bytes, for cheap indexing
    start: usize,               // index of the *first* byte of the current lexeme
    curr: usize,                // index *one past* the last byte examined
    line: usize,                // 1‑based line counter (\n increments)
    pending: Option<TokenType>, // recognised token kind waiting to be emitted
    done: bool,                 // EOF emitted or an error reported
}

impl<'a> Scanner<'a> {
    /// Create a new lexer over `source`.
    #[inline]
    pub fn new(source: &'a str) -> Self {
        info!("Scanner created over {} bytes", source.len());

        Self {
            source,
            src: source.as_bytes(),
            start: 0,
            curr: 0,
            line: 1,
            pending: None,
            done: false,
        }
    }

    // ───────────────────────────── primitive helpers ────────────────────────

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        self.curr >= self.src.len()
    }

    /// Advance one byte and return it.  Callers guard with [`is_at_end`].
    #[inline(always)]
    fn advance(&mut self) -> u8 {
        let b = self.src[self.curr];
        self.curr += 1;
        b
    }

    /// Peek at the current byte without consuming it.  Returns `0` past EOF.
    #[inline(always)]
    fn peek(&self) -> u8 {
        self.src.get(self.curr).copied().unwrap_or(0)
    }

    #[inline(always)]
    fn peek_next(&self) -> u8 {
        self.src.get(self.curr + 1).copied().unwrap_or(0)
    }

    /// Conditionally consume a byte **iff** it matches `expected`.
    #[inline(always)]
    fn match_byte(&mut self, expected: u8) -> bool {
        if !self.is_at_end() && self.peek() == expected {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Pick between a two‑byte and a one‑byte operator.
    #[inline(always)]
    fn either(&mut self, second: u8, two: TokenType, one: TokenType) -> TokenType {
        if self.match_byte(second) {
            two
        } else {
            one
        }
    }

    // ───────────────────────────── core lexing ─────────────────────────────

    /// Scan a *single* lexeme starting at `self.curr`.  Whitespace and
    /// comments leave `pending` empty.
    fn scan_token(&mut self) -> Result<()> {
        let b = self.advance();

        let tt = match b {
            // ── single‑character punctuators ──────────────────────────────
            b'(' => TokenType::LEFT_PAREN,
            b')' => TokenType::RIGHT_PAREN,
            b'{' => TokenType::LEFT_BRACE,
            b'}' => TokenType::RIGHT_BRACE,
            b'[' => TokenType::LEFT_BRACKET,
            b']' => TokenType::RIGHT_BRACKET,
            b',' => TokenType::COMMA,
            b'.' => TokenType::DOT,
            b'-' => TokenType::MINUS,
            b'+' => TokenType::PLUS,
            b';' => TokenType::SEMICOLON,
            b'*' => TokenType::STAR,
            b'?' => TokenType::QUESTION,
            b':' => TokenType::COLON,

            // ── one‑or‑two‑character operators ───────────────────────────
            b'!' => self.either(b'=', TokenType::BANG_EQUAL, TokenType::BANG),
            b'=' => self.either(b'=', TokenType::EQUAL_EQUAL, TokenType::EQUAL),
            b'<' => self.either(b'=', TokenType::LESS_EQUAL, TokenType::LESS),
            b'>' => self.either(b'=', TokenType::GREATER_EQUAL, TokenType::GREATER),

            // ── doubled‑only operators ────────────────────────────────────
            b'&' | b'|' => {
                if !self.match_byte(b) {
                    return Err(LoxError::lex(
                        self.line,
                        format!("Unterminated '{}'.", b as char),
                    ));
                }

                if b == b'&' {
                    TokenType::AND
                } else {
                    TokenType::OR
                }
            }

            // ── whitespace / newline ─────────────────────────────────────
            b' ' | b'\r' | b'\t' => return Ok(()),

            b'\n' => {
                self.line += 1;
                return Ok(());
            }

            // ── comments (// … until newline) ────────────────────────────
            b'/' => {
                if self.match_byte(b'/') {
                    match memchr(b'\n', &self.src[self.curr..]) {
                        Some(pos) => self.curr += pos,
                        None => self.curr = self.src.len(),
                    }

                    return Ok(());
                }

                TokenType::SLASH
            }

            b'"' => self.string()?,

            b'0'..=b'9' => self.number()?,

            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.identifier(),

            _ => {
                let c: char = self.source[self.start..].chars().next().unwrap_or('?');

                return Err(LoxError::lex(
                    self.line,
                    format!("Unexpected character: {}", c),
                ));
            }
        };

        self.pending = Some(tt);

        Ok(())
    }

    /// Parse a double‑quoted string literal; `self.start` points at the opening `"`.
    fn string(&mut self) -> Result<TokenType> {
        while !self.is_at_end() && self.peek() != b'"' {
            if self.advance() == b'\n' {
                self.line += 1;
            }
        }

        if self.is_at_end() {
            return Err(LoxError::lex(self.line, "Unterminated string."));
        }

        self.advance(); // closing quote

        let text: &str = &self.source[self.start + 1..self.curr - 1];

        Ok(TokenType::STRING(text.to_owned()))
    }

    /// Parse a numeric literal (`123`, `3.14`).  No exponent or hex forms.
    fn number(&mut self) -> Result<TokenType> {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        if self.peek() == b'.' && self.peek_next().is_ascii_digit() {
            self.advance(); // "."

            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        let text: &str = &self.source[self.start..self.curr];
        let n: f64 = text
            .parse()
            .map_err(|_| LoxError::lex(self.line, format!("Invalid number '{}'.", text)))?;

        Ok(TokenType::NUMBER(n))
    }

    /// Parse an identifier and decide if it is a keyword.
    fn identifier(&mut self) -> TokenType {
        while self.peek().is_ascii_alphanumeric() || self.peek() == b'_' {
            self.advance();
        }

        let text: &str = &self.source[self.start..self.curr];

        KEYWORDS
            .get(text)
            .cloned()
            .unwrap_or(TokenType::IDENTIFIER)
    }
}

// ───────────────────────── Iterator implementation ─────────────────────────

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<Token<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            if self.is_at_end() {
                self.done = true;
                return Some(Ok(Token::new(TokenType::EOF, "", self.line)));
            }

            self.start = self.curr;
            self.pending = None;

            if let Err(e) = self.scan_token() {
                debug!("Scanning stopped: {}", e);
                self.done = true;
                return Some(Err(e));
            }

            if let Some(tt) = self.pending.take() {
                let lexeme: &'a str = &self.source[self.start..self.curr];
                debug!("Scanned token ({:?}) on line {}", tt, self.line);

                return Some(Ok(Token::new(tt, lexeme, self.line)));
            }
            // Whitespace / comment → keep going.
        }
    }
}

impl<'a> FusedIterator for Scanner<'a> {}
