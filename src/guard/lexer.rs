//! Guard expression lexer.

use crate::error::GuardParseError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    LParen,
    RParen,
    Comma,
    And,               // &&
    Or,                // ||
    Not,               // !
    Placeholder(String), // $x, $args$
    Ident(String),     // name, java.util.List, String[]
    Str(String),       // "text", quotes kept
    Number(String),
}

/// A token and the byte position it starts at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spanned {
    pub token: Token,
    pub pos: usize,
}

pub struct Lexer<'a> {
    text: &'a str,
    input: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            text: input,
            input: input.as_bytes(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn read_while(&mut self, pred: impl Fn(u8) -> bool) -> String {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.pos += 1;
        }
        self.text[start..self.pos].to_string()
    }

    fn is_ident_char(ch: u8) -> bool {
        ch.is_ascii_alphanumeric() || ch == b'_'
    }

    fn error(&self, message: impl Into<String>) -> GuardParseError {
        GuardParseError::new(message, self.text)
    }

    pub fn tokenize(&mut self) -> Result<Vec<Spanned>, GuardParseError> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace();
            let Some(ch) = self.peek() else { break };
            let pos = self.pos;

            let token = match ch {
                b'(' => {
                    self.pos += 1;
                    Token::LParen
                }
                b')' => {
                    self.pos += 1;
                    Token::RParen
                }
                b',' => {
                    self.pos += 1;
                    Token::Comma
                }
                b'!' => {
                    self.pos += 1;
                    Token::Not
                }
                b'&' if self.peek_at(1) == Some(b'&') => {
                    self.pos += 2;
                    Token::And
                }
                b'|' if self.peek_at(1) == Some(b'|') => {
                    self.pos += 2;
                    Token::Or
                }
                b'"' => self.read_string()?,
                b'$' => {
                    self.pos += 1;
                    let name = self.read_while(Self::is_ident_char);
                    if name.is_empty() {
                        return Err(self.error(format!("Unexpected character at position {pos}")));
                    }
                    let mut text = format!("${name}");
                    if self.peek() == Some(b'$') {
                        self.pos += 1;
                        text.push('$');
                    }
                    Token::Placeholder(text)
                }
                c if c.is_ascii_digit() => {
                    Token::Number(self.read_while(|c| c.is_ascii_digit() || c == b'.'))
                }
                c if c.is_ascii_alphabetic() || c == b'_' => {
                    let mut name = self.read_while(|c| Self::is_ident_char(c) || c == b'.');
                    while self.peek() == Some(b'[') && self.peek_at(1) == Some(b']') {
                        self.pos += 2;
                        name.push_str("[]");
                    }
                    Token::Ident(name)
                }
                _ => {
                    return Err(self.error(format!("Unexpected character at position {pos}")));
                }
            };
            tokens.push(Spanned { token, pos });
        }

        Ok(tokens)
    }

    /// Quoted string; `\"` and `\\` unescape, the surrounding quotes stay.
    fn read_string(&mut self) -> Result<Token, GuardParseError> {
        self.pos += 1;
        let mut value = String::from("\"");
        loop {
            let Some(ch) = self.peek() else {
                return Err(self.error("Unterminated string literal"));
            };
            match ch {
                b'"' => {
                    self.pos += 1;
                    value.push('"');
                    return Ok(Token::Str(value));
                }
                b'\\' if matches!(self.peek_at(1), Some(b'"') | Some(b'\\')) => {
                    value.push(self.input[self.pos + 1] as char);
                    self.pos += 2;
                }
                _ => {
                    let rest = &self.text[self.pos..];
                    let Some(c) = rest.chars().next() else {
                        return Err(self.error("Unterminated string literal"));
                    };
                    value.push(c);
                    self.pos += c.len_utf8();
                }
            }
        }
    }
}
