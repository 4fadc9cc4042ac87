use std::time::Duration;

use thiserror::Error;

/// A malformed or mistagged inbound buffer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("buffer too short: {len} bytes, need at least {min}")]
    TooShort { len: usize, min: usize },
    #[error("unexpected header tag {found:?}, expected {expected:?}")]
    BadTag { found: String, expected: String },
    #[error("ethernet header error: {message}")]
    Ethernet { message: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("key must not be empty")]
    Empty,
    #[error("key {literal:?} has an odd number of hex digits")]
    OddLength { literal: String },
    #[error("key {literal:?} contains a non-hex digit")]
    InvalidDigit { literal: String },
}

/// Tokenizer failures for calculator expressions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Expected number literal.")]
    Number,
    #[error("Expected binary operator '-', '+', '&', '|', or '^'.")]
    Operator,
    #[error("number literal {literal} does not fit in 32 bits")]
    Overflow { literal: String },
    #[error("unexpected trailing input: {rest:?}")]
    Trailing { rest: String },
}

/// Everything that can end a single request/reply exchange early.
///
/// None of these are fatal to the process; the shell renders them and moves on.
#[derive(Error, Debug)]
pub enum ExchangeError {
    #[error("Not a supported command: {command}")]
    UnsupportedCommand { command: String },
    #[error("Usage: {command} <message>")]
    MissingMessage { command: String },
    #[error("Didn't receive response within {timeout:?}")]
    NoReply { timeout: Duration },
    #[error("cannot decode reply: {0}")]
    Decode(#[from] DecodeError),
    #[error("cannot parse expression: {0}")]
    Parse(#[from] ParseError),
    #[error("driver error: {0}")]
    Driver(#[from] std::io::Error),
}

impl ExchangeError {
    pub fn is_no_reply(&self) -> bool {
        matches!(self, ExchangeError::NoReply { .. })
    }
}
