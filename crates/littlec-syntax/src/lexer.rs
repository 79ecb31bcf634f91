//! Hand-written lexer: byte stream in, ordered token sequence out.
//!
//! The scanner keeps two cursors (`start` for the current lexeme, `current`
//! for the read head) plus row/column counters. Whitespace advances the
//! cursors without producing a token; a newline resets the column and bumps
//! the row. The token stream is always terminated by `Eof`.

use crate::error::SyntaxError;
use crate::token::{Payload, Pos, Token, TokenKind};

pub struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    start: usize,
    current: usize,
    row: u32,
    col: u32,
    /// Position of the first byte of the lexeme being scanned.
    token_pos: Pos,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            start: 0,
            current: 0,
            row: 0,
            col: 0,
            token_pos: Pos::default(),
            tokens: Vec::new(),
        }
    }

    /// Scan the whole source. Stops at the first lexical error.
    pub fn tokenize(mut self) -> Result<Vec<Token>, SyntaxError> {
        while !self.at_end() {
            self.start = self.current;
            self.token_pos = Pos::new(self.row, self.col);
            self.scan_token()?;
        }
        self.token_pos = Pos::new(self.row, self.col);
        self.put(TokenKind::Eof);
        Ok(self.tokens)
    }

    fn scan_token(&mut self) -> Result<(), SyntaxError> {
        let c = self.bump();
        match c {
            b'(' => self.put(TokenKind::LParen),
            b')' => self.put(TokenKind::RParen),
            b'[' => self.put(TokenKind::LBracket),
            b']' => self.put(TokenKind::RBracket),
            b'{' => self.put(TokenKind::LBrace),
            b'}' => self.put(TokenKind::RBrace),
            b',' => self.put(TokenKind::Comma),
            b'.' => {
                if self.peek(0) == b'.' && self.peek(1) == b'.' {
                    self.bump();
                    self.bump();
                    self.put(TokenKind::Ellipsis);
                } else {
                    self.put(TokenKind::Dot);
                }
            }
            b'-' => self.put(TokenKind::Minus),
            b'+' => self.put(TokenKind::Plus),
            b';' => self.put(TokenKind::Semicolon),
            b'*' => self.put(TokenKind::Star),
            b'/' => {
                let kind = if self.eat(b'/') {
                    TokenKind::SlashSlash
                } else {
                    TokenKind::Slash
                };
                self.put(kind);
            }
            b'%' => self.put(TokenKind::Percent),
            b'!' => {
                let kind = if self.eat(b'=') {
                    TokenKind::BangEq
                } else {
                    TokenKind::Bang
                };
                self.put(kind);
            }
            b'=' => {
                let kind = if self.eat(b'=') {
                    TokenKind::EqEq
                } else {
                    TokenKind::Eq
                };
                self.put(kind);
            }
            b'<' => {
                let kind = if self.eat(b'=') {
                    TokenKind::LessEq
                } else {
                    TokenKind::Less
                };
                self.put(kind);
            }
            b'>' => {
                let kind = if self.eat(b'=') {
                    TokenKind::GreaterEq
                } else {
                    TokenKind::Greater
                };
                self.put(kind);
            }
            b'&' => {
                let kind = if self.eat(b'&') {
                    TokenKind::AndAnd
                } else {
                    TokenKind::Amp
                };
                self.put(kind);
            }
            b'|' => {
                let kind = if self.eat(b'|') {
                    TokenKind::OrOr
                } else {
                    TokenKind::Pipe
                };
                self.put(kind);
            }
            b' ' | b'\r' | b'\t' => {}
            b'\n' => {
                self.row += 1;
                self.col = 0;
            }
            b'"' => self.string()?,
            b'\'' => self.char_literal()?,
            c if c.is_ascii_digit() => self.number()?,
            c if c.is_ascii_alphabetic() || c == b'_' => self.word(),
            c => {
                return Err(SyntaxError::UnexpectedChar {
                    ch: c as char,
                    pos: self.token_pos,
                })
            }
        }
        Ok(())
    }

    fn at_end(&self) -> bool {
        self.current >= self.bytes.len()
    }

    fn bump(&mut self) -> u8 {
        let c = self.bytes[self.current];
        self.current += 1;
        self.col += 1;
        c
    }

    fn eat(&mut self, expected: u8) -> bool {
        if self.at_end() || self.bytes[self.current] != expected {
            false
        } else {
            self.current += 1;
            self.col += 1;
            true
        }
    }

    fn peek(&self, offset: usize) -> u8 {
        *self.bytes.get(self.current + offset).unwrap_or(&0)
    }

    fn put(&mut self, kind: TokenKind) {
        self.tokens.push(Token::new(kind, self.token_pos));
    }

    fn put_payload(&mut self, kind: TokenKind, payload: Payload) {
        self.tokens
            .push(Token::with_payload(kind, payload, self.token_pos));
    }

    fn string(&mut self) -> Result<(), SyntaxError> {
        while !self.at_end() && self.peek(0) != b'"' {
            if self.peek(0) == b'\n' {
                self.row += 1;
                self.col = 0;
            }
            self.bump();
        }

        if self.at_end() {
            return Err(SyntaxError::UnterminatedString {
                pos: self.token_pos,
            });
        }

        self.bump(); // closing quote

        let text = String::from_utf8_lossy(&self.bytes[self.start + 1..self.current - 1]);
        self.put_payload(TokenKind::Str, Payload::Text(text.into_owned()));
        Ok(())
    }

    fn char_literal(&mut self) -> Result<(), SyntaxError> {
        if self.at_end() {
            return Err(SyntaxError::UnterminatedChar {
                pos: self.token_pos,
            });
        }
        let value = self.bump();
        if self.at_end() || self.bump() != b'\'' {
            return Err(SyntaxError::UnterminatedChar {
                pos: self.token_pos,
            });
        }
        self.put_payload(TokenKind::Char, Payload::I8(value as i8));
        Ok(())
    }

    fn number(&mut self) -> Result<(), SyntaxError> {
        // Alphanumerics are consumed greedily; the numeric value is the
        // leading digit prefix, stoi-style.
        while self.peek(0).is_ascii_alphanumeric() {
            self.bump();
        }

        let mut is_float = false;
        if self.peek(0) == b'.' && self.peek(1).is_ascii_digit() {
            self.bump();
            while self.peek(0).is_ascii_digit() {
                self.bump();
            }
            is_float = true;
        }

        let text = &self.source[self.start..self.current];

        if is_float {
            self.put_payload(TokenKind::Float, Payload::F64(float_prefix(text)));
        } else {
            let digits: &str = {
                let end = text
                    .bytes()
                    .position(|b| !b.is_ascii_digit())
                    .unwrap_or(text.len());
                &text[..end]
            };
            let value: i32 =
                digits
                    .parse()
                    .map_err(|_| SyntaxError::IntegerOutOfRange {
                        pos: self.token_pos,
                    })?;
            self.put_payload(TokenKind::Integer, Payload::I32(value));
        }
        Ok(())
    }

    fn word(&mut self) {
        while self.peek(0).is_ascii_alphanumeric() || self.peek(0) == b'_' {
            self.bump();
        }

        let text = &self.source[self.start..self.current];

        // `const` is accepted and discarded.
        if text == "const" {
            return;
        }

        match keyword_kind(text) {
            Some(kind) => self.put(kind),
            None => self.put_payload(TokenKind::Identifier, Payload::Text(text.to_string())),
        }
    }
}

fn keyword_kind(word: &str) -> Option<TokenKind> {
    match word {
        "return" => Some(TokenKind::Return),
        "if" => Some(TokenKind::If),
        "else" => Some(TokenKind::Else),
        "for" => Some(TokenKind::For),
        "while" => Some(TokenKind::While),
        "struct" => Some(TokenKind::Struct),
        "typedef" => Some(TokenKind::Typedef),
        _ => None,
    }
}

/// Longest `digits[.digits]` prefix of a greedily consumed numeric lexeme.
fn float_prefix(text: &str) -> f64 {
    let bytes = text.as_bytes();
    let mut end = 0;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        let mut frac = end + 1;
        while frac < bytes.len() && bytes[frac].is_ascii_digit() {
            frac += 1;
        }
        if frac > end + 1 {
            end = frac;
        }
    }
    text[..end].parse().unwrap_or(0.0)
}
