use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{Eval, RuntimeError};
use crate::interpreter::Interpreter;
use crate::value::Value;

/// Anything invocable from a call expression: user functions, native
/// functions, and classes (construction).
pub trait Callable {
    fn arity(&self) -> usize;

    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> Eval<Value>;
}

/// A host-provided function exposed in globals.
pub struct NativeFunction {
    pub name: String,
    pub arity: usize,
    pub func: fn(&[Value]) -> Result<Value, RuntimeError>,
}

impl NativeFunction {
    /// Zero-arg `clock()` returning seconds since the epoch.
    pub fn clock() -> Self {
        NativeFunction {
            name: "clock".to_string(),
            arity: 0,
            func: |_args| {
                let timestamp = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map_err(|e| RuntimeError::native(format!("Clock error: {}.", e)))?
                    .as_secs_f64();

                Ok(Value::Number(timestamp))
            },
        }
    }
}

impl Callable for NativeFunction {
    fn arity(&self) -> usize {
        self.arity
    }

    fn call(&self, _interpreter: &mut Interpreter, arguments: Vec<Value>) -> Eval<Value> {
        Ok((self.func)(&arguments)?)
    }
}

impl fmt::Display for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native fn>")
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeFunction {{ name: {:?}, arity: {} }}", self.name, self.arity)
    }
}
