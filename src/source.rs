//! Loading and parsing of source units, including `include` targets.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::ast::Stmt;
use crate::context::LoxContext;
use crate::error::{LoxError, Result};
use crate::parser::Parser;
use crate::scanner::Scanner;
use crate::token::Token;

/// A parsed source unit ready for resolution and execution.
#[derive(Debug)]
pub struct ParsedSource {
    pub path: PathBuf,
    pub body: Vec<Stmt>,
}

/// Loads the source unit named by an `include` path.
///
/// The resolver calls this mid-walk; implementations report any static
/// errors in the included source through the shared context.
pub trait SourceResolver {
    fn resolve(&mut self, context: &mut LoxContext, path: &str) -> Result<ParsedSource>;
}

/// Resolves include paths against a base directory, normally the directory
/// of the including script.
pub struct FileSourceResolver {
    base: PathBuf,
}

impl FileSourceResolver {
    pub fn new<P: Into<PathBuf>>(base: P) -> Self {
        FileSourceResolver { base: base.into() }
    }

    /// Base the resolver on the directory containing `script`.
    pub fn for_script(script: &Path) -> Self {
        let base = script
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        FileSourceResolver { base }
    }
}

impl SourceResolver for FileSourceResolver {
    fn resolve(&mut self, context: &mut LoxContext, path: &str) -> Result<ParsedSource> {
        let full_path = self.base.join(path);

        info!("Loading include {}", full_path.display());

        let source = fs::read_to_string(&full_path)?;
        let body = parse_source(&source, context);

        Ok(ParsedSource {
            path: full_path,
            body,
        })
    }
}

/// Scan and parse one source unit, reporting every static error through
/// the context. Callers check `context.had_error` before using the result.
pub fn parse_source(source: &str, context: &mut LoxContext) -> Vec<Stmt> {
    let mut tokens: Vec<Token> = Vec::new();

    for result in Scanner::new(source) {
        match result {
            Ok(token) => tokens.push(token),

            Err(LoxError::Lex { message, line }) => context.error(line, &message),

            // The scanner only produces lex errors; anything else would be
            // a scanner bug, reported at line 0 rather than swallowed.
            Err(other) => context.error(0, &other.to_string()),
        }
    }

    Parser::new(tokens, context).parse()
}
