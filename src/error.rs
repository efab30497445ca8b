//! Centralised error hierarchy for the interpreter.
//!
//! Static failures (scanner, parser, I/O) live in [`LoxError`]; everything
//! that unwinds out of the evaluator travels as an [`Unwind`] instead.
//! Control-flow signals are not errors, but they share the `Err` channel so
//! that environment restoration happens on every exit path.

use std::fmt;
use std::io;

use thiserror::Error;

use crate::token::Token;
use crate::value::Value;

/// Canonical static error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoxError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}] Error: {message}")]
    Lex { message: String, line: usize },

    /// Syntactic (parser) error.
    #[error("[line {line}] Error: {message}")]
    Parse { message: String, line: usize },

    /// Wrapper around `std::io::Error`. Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// UTF-8 decoding failure when ingesting external text.
    #[error(transparent)]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl LoxError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        LoxError::Lex {
            message: msg.into(),
            line,
        }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(line: usize, msg: S) -> Self {
        LoxError::Parse {
            message: msg.into(),
            line,
        }
    }
}

/// Crate-wide `Result` alias for static failures.
pub type Result<T> = std::result::Result<T, LoxError>;

/// A runtime failure tied to the token it occurred at.
///
/// The token is absent only for failures raised inside native functions,
/// which have no source position.
#[derive(Debug, Clone)]
pub struct RuntimeError {
    pub token: Option<Token>,
    pub message: String,
}

impl RuntimeError {
    pub fn new<S: Into<String>>(token: &Token, msg: S) -> Self {
        RuntimeError {
            token: Some(token.clone()),
            message: msg.into(),
        }
    }

    pub fn native<S: Into<String>>(msg: S) -> Self {
        RuntimeError {
            token: None,
            message: msg.into(),
        }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.token {
            Some(token) => write!(f, "{}\n[line {}]", self.message, token.line),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for RuntimeError {}

/// Typed non-local exits threaded through evaluation.
///
/// `Return` is caught by function invocation, `Break`/`Continue` by the
/// enclosing loop, and `Error` unwinds to the top level. The resolver
/// guarantees the first three never escape their owning construct.
#[derive(Debug)]
pub enum Unwind {
    Return(Value),
    Break,
    Continue,
    Error(RuntimeError),
}

impl From<RuntimeError> for Unwind {
    fn from(err: RuntimeError) -> Self {
        Unwind::Error(err)
    }
}

/// Evaluation result alias: every expression yields a value or a signal.
pub type Eval<T> = std::result::Result<T, Unwind>;
