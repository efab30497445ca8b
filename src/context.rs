//! Per-run diagnostic sink.
//!
//! One `LoxContext` lives for the duration of a script run (or a single
//! REPL prompt) and is passed explicitly to every pass that can report
//! diagnostics. It never aborts anything itself; passes consult the
//! latched flags to decide whether to continue.

use log::info;

use crate::error::RuntimeError;
use crate::token::{Token, TokenType};

#[derive(Debug, Default)]
pub struct LoxContext {
    pub had_error: bool,
    pub had_runtime_error: bool,
}

impl LoxContext {
    pub fn new() -> Self {
        LoxContext::default()
    }

    /// Lexer-level report with no token available.
    pub fn error(&mut self, line: usize, message: &str) {
        self.report(line, "", message);
    }

    /// Static (parser/resolver) report located at a token.
    pub fn token_error(&mut self, token: &Token, message: &str) {
        if token.token_type == TokenType::EOF {
            self.report(token.line, " at end", message);
        } else {
            let location = format!(" at '{}'", token.lexeme);
            self.report(token.line, &location, message);
        }
    }

    /// Render a runtime failure after the evaluator has unwound.
    pub fn report_runtime(&mut self, error: &RuntimeError) {
        info!("Runtime error: {}", error.message);

        self.had_runtime_error = true;

        eprintln!("{}", error);
    }

    /// Clear both latches. The REPL calls this between prompts.
    pub fn reset(&mut self) {
        self.had_error = false;
        self.had_runtime_error = false;
    }

    fn report(&mut self, line: usize, location: &str, message: &str) {
        self.had_error = true;

        eprintln!("[line {}] Error{}: {}", line, location, message);
    }
}
