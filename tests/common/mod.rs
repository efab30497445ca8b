//! Shared pipeline harness: scan → parse → resolve → interpret, with
//! `print` output captured in a buffer and includes served from memory.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::PathBuf;
use std::rc::Rc;

use loxen::context::LoxContext;
use loxen::error::{Result, RuntimeError};
use loxen::interpreter::Interpreter;
use loxen::resolver::Resolver;
use loxen::source::{parse_source, ParsedSource, SourceResolver};

/// A `Write` handle that tests can clone and read back after the
/// interpreter (which owns the other clone) has finished.
#[derive(Clone, Default)]
pub struct SharedOutput(Rc<RefCell<Vec<u8>>>);

impl SharedOutput {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for SharedOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Serves include paths from an in-memory map instead of the filesystem.
pub struct MapSourceResolver {
    files: HashMap<String, String>,
}

impl MapSourceResolver {
    pub fn new(files: &[(&str, &str)]) -> Self {
        MapSourceResolver {
            files: files
                .iter()
                .map(|(path, source)| (path.to_string(), source.to_string()))
                .collect(),
        }
    }
}

impl SourceResolver for MapSourceResolver {
    fn resolve(&mut self, context: &mut LoxContext, path: &str) -> Result<ParsedSource> {
        let source = self
            .files
            .get(path)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.to_string()))?;

        let body = parse_source(source, context);

        Ok(ParsedSource {
            path: PathBuf::from(path),
            body,
        })
    }
}

pub struct RunOutcome {
    pub output: String,
    pub had_error: bool,
    pub runtime_error: Option<RuntimeError>,
}

impl RunOutcome {
    pub fn assert_prints(&self, expected: &str) {
        assert!(!self.had_error, "unexpected static error");
        assert!(
            self.runtime_error.is_none(),
            "unexpected runtime error: {:?}",
            self.runtime_error
        );
        assert_eq!(self.output, expected);
    }
}

pub fn run(source: &str) -> RunOutcome {
    run_with_includes(source, &[])
}

pub fn run_with_includes(source: &str, includes: &[(&str, &str)]) -> RunOutcome {
    let mut context = LoxContext::new();

    let program = parse_source(source, &mut context);

    if context.had_error {
        return RunOutcome {
            output: String::new(),
            had_error: true,
            runtime_error: None,
        };
    }

    let capture = SharedOutput::default();
    let mut interpreter = Interpreter::with_output(Box::new(capture.clone()));
    let mut sources = MapSourceResolver::new(includes);

    Resolver::new(&mut context, &mut interpreter, &mut sources).resolve(&program);

    if context.had_error {
        return RunOutcome {
            output: capture.contents(),
            had_error: true,
            runtime_error: None,
        };
    }

    let runtime_error = interpreter.interpret(&program).err();

    RunOutcome {
        output: capture.contents(),
        had_error: false,
        runtime_error,
    }
}
