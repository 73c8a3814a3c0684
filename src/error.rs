//! Error types that callers need to tell apart.
//!
//! Everything at the application edge flows through `anyhow`; these enums
//! exist for the setup-time failures that a caller may want to match on.

use std::fmt;

/// A pattern fragment that the Java grammar rejects even with placeholders
/// substituted in.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    #[error("empty pattern")]
    Empty,

    #[error("cannot parse {kind} pattern `{pattern}`: {reason}")]
    Malformed {
        pattern: String,
        kind: String,
        reason: String,
    },

    #[error("failed to load the Java grammar: {0}")]
    Language(String),
}

/// Failure while parsing a guard expression.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} (in guard `{input}`)")]
pub struct GuardParseError {
    pub message: String,
    pub input: String,
}

impl GuardParseError {
    pub fn new(message: impl Into<String>, input: &str) -> Self {
        Self {
            message: message.into(),
            input: input.to_string(),
        }
    }
}

/// Failure while evaluating a guard against a match.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GuardError {
    #[error("unknown guard function: {0}")]
    UnknownFunction(String),

    #[error("guard `{name}` failed: {message}")]
    Evaluation { name: String, message: String },
}

/// Failure while parsing a `.sandbox-hint` file.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub struct HintParseError {
    pub message: String,
    /// 1-based line number, when the failure can be pinned to one.
    pub line: Option<usize>,
}

impl HintParseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            line: None,
        }
    }

    pub fn at(message: impl Into<String>, line: usize) -> Self {
        Self {
            message: message.into(),
            line: Some(line),
        }
    }
}

impl fmt::Display for HintParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{} (line {line})", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl From<GuardParseError> for HintParseError {
    fn from(err: GuardParseError) -> Self {
        HintParseError::new(err.to_string())
    }
}
