use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::ast::FunctionExpr;
use crate::callable::Callable;
use crate::environment::Environment;
use crate::error::{Eval, Unwind};
use crate::interpreter::Interpreter;
use crate::token::{Token, TokenType};
use crate::value::Value;

/// A user-declared function or method bound to its closure.
pub struct LoxFunction {
    declaration: Rc<FunctionExpr>,
    closure: Rc<RefCell<Environment>>,
    is_initializer: bool,
}

impl LoxFunction {
    pub fn new(
        declaration: Rc<FunctionExpr>,
        closure: Rc<RefCell<Environment>>,
        is_initializer: bool,
    ) -> Self {
        LoxFunction {
            declaration,
            closure,
            is_initializer,
        }
    }

    /// Produce a copy whose closure extends the original with `this`
    /// bound to the receiving instance.
    pub fn bind(&self, instance: Value) -> Self {
        let mut environment = Environment::with_enclosing(self.closure.clone());
        environment.define("this", instance);

        LoxFunction {
            declaration: self.declaration.clone(),
            closure: Rc::new(RefCell::new(environment)),
            is_initializer: self.is_initializer,
        }
    }

    fn this_from_closure(&self) -> Eval<Value> {
        let this = Token::new(TokenType::THIS, "this".to_string(), 0);

        Ok(Environment::get_at(&self.closure, 0, &this)?)
    }
}

impl Callable for LoxFunction {
    fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> Eval<Value> {
        debug!("Calling {}", self);

        let mut environment = Environment::with_enclosing(self.closure.clone());

        for (param, argument) in self.declaration.params.iter().zip(arguments) {
            environment.define(&param.lexeme, argument);
        }

        let frame = Rc::new(RefCell::new(environment));

        match interpreter.execute_block(&self.declaration.body, frame) {
            Ok(()) => {
                if self.is_initializer {
                    self.this_from_closure()
                } else {
                    Ok(Value::Nil)
                }
            }

            // An initializer always yields `this`, even on explicit return.
            Err(Unwind::Return(value)) => {
                if self.is_initializer {
                    self.this_from_closure()
                } else {
                    Ok(value)
                }
            }

            Err(other) => Err(other),
        }
    }
}

impl fmt::Display for LoxFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.declaration.name {
            Some(name) => write!(f, "<fn {}>", name.lexeme),
            None => write!(f, "<fn>"),
        }
    }
}

impl fmt::Debug for LoxFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LoxFunction {{ name: {:?}, arity: {} }}",
            self.declaration.name.as_ref().map(|t| &t.lexeme),
            self.declaration.params.len()
        )
    }
}
