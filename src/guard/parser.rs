//! Recursive-descent parser for guard expressions.
//!
//! ```text
//! or      := and ("||" and)*
//! and     := unary ("&&" unary)*
//! unary   := "!" unary | primary
//! primary := "(" or ")"
//!          | PLACEHOLDER "instanceof" TYPE
//!          | PLACEHOLDER                    -- matchesAny(PLACEHOLDER)
//!          | IDENT "(" [arg ("," arg)*] ")"
//!          | IDENT                          -- zero-argument call
//! ```

use super::lexer::{Lexer, Spanned, Token};
use super::registry::GuardRegistry;
use super::GuardExpression;
use crate::error::GuardParseError;

pub struct GuardParser<'r> {
    registry: &'r GuardRegistry,
}

impl<'r> GuardParser<'r> {
    pub fn new(registry: &'r GuardRegistry) -> Self {
        Self { registry }
    }

    /// Parse `text`, rejecting calls to guards the registry does not know.
    pub fn parse(&self, text: &str) -> Result<GuardExpression, GuardParseError> {
        let tokens = Lexer::new(text).tokenize()?;
        if tokens.is_empty() {
            return Err(GuardParseError::new("Unexpected end of expression", text));
        }
        let mut state = State {
            tokens,
            pos: 0,
            input: text,
        };
        let expr = state.parse_or()?;
        if let Some(extra) = state.tokens.get(state.pos) {
            return Err(state.error(format!("Unexpected token at position {}", extra.pos)));
        }
        for name in expr.function_names() {
            if !self.registry.contains(name) {
                return Err(GuardParseError::new(format!("Unknown guard function: {name}"), text));
            }
        }
        Ok(expr)
    }
}

struct State<'t> {
    tokens: Vec<Spanned>,
    pos: usize,
    input: &'t str,
}

impl State<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn advance(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).map(|s| s.token.clone());
        self.pos += 1;
        tok
    }

    fn error(&self, message: impl Into<String>) -> GuardParseError {
        GuardParseError::new(message, self.input)
    }

    fn expect_rparen(&mut self) -> Result<(), GuardParseError> {
        match self.advance() {
            Some(Token::RParen) => Ok(()),
            _ => Err(self.error("Expected ')'")),
        }
    }

    fn parse_or(&mut self) -> Result<GuardExpression, GuardParseError> {
        let mut left = self.parse_and()?;
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            let right = self.parse_and()?;
            left = GuardExpression::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<GuardExpression, GuardParseError> {
        let mut left = self.parse_unary()?;
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            let right = self.parse_unary()?;
            left = GuardExpression::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<GuardExpression, GuardParseError> {
        if self.peek() == Some(&Token::Not) {
            self.pos += 1;
            let operand = self.parse_unary()?;
            return Ok(GuardExpression::Not(Box::new(operand)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<GuardExpression, GuardParseError> {
        match self.advance() {
            None => Err(self.error("Unexpected end of expression")),
            Some(Token::LParen) => {
                let inner = self.parse_or()?;
                self.expect_rparen()?;
                Ok(inner)
            }
            Some(Token::Placeholder(name)) => {
                if matches!(self.peek(), Some(Token::Ident(kw)) if kw == "instanceof") {
                    self.pos += 1;
                    return match self.advance() {
                        Some(Token::Ident(ty)) => Ok(GuardExpression::call("instanceof", vec![name, ty])),
                        None => Err(self.error("Unexpected end of expression")),
                        Some(_) => Err(self.error("Expected type name after 'instanceof'")),
                    };
                }
                Ok(GuardExpression::call("matchesAny", vec![name]))
            }
            Some(Token::Ident(name)) => {
                if self.peek() != Some(&Token::LParen) {
                    return Ok(GuardExpression::call(name, Vec::new()));
                }
                self.pos += 1;
                let args = self.parse_args()?;
                Ok(GuardExpression::call(name, args))
            }
            Some(_) => {
                let pos = self.tokens.get(self.pos - 1).map(|s| s.pos).unwrap_or(0);
                Err(self.error(format!("Unexpected token at position {pos}")))
            }
        }
    }

    fn parse_args(&mut self) -> Result<Vec<String>, GuardParseError> {
        let mut args = Vec::new();
        if self.peek() == Some(&Token::RParen) {
            self.pos += 1;
            return Ok(args);
        }
        loop {
            match self.advance() {
                Some(Token::Placeholder(s))
                | Some(Token::Ident(s))
                | Some(Token::Str(s))
                | Some(Token::Number(s)) => args.push(s),
                None => return Err(self.error("Unexpected end of expression")),
                Some(_) => return Err(self.error("Expected argument")),
            }
            match self.advance() {
                Some(Token::Comma) => continue,
                Some(Token::RParen) => return Ok(args),
                _ => return Err(self.error("Expected ')'")),
            }
        }
    }
}
