use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::RuntimeError;
use crate::token::Token;
use crate::value::Value;

/// One frame in the lexical scope chain. Globals live in the chain root.
#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Unconditional insert into this frame. Redefinition overwrites.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    /// Walk this frame and its ancestors for `name`.
    pub fn get(&self, name: &Token) -> Result<Value, RuntimeError> {
        if let Some(value) = self.values.get(&name.lexeme) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            Err(RuntimeError::new(
                name,
                format!("Undefined variable '{}'.", name.lexeme),
            ))
        }
    }

    /// Assign to the nearest frame that already binds `name`. Never
    /// creates a new binding.
    pub fn assign(&mut self, name: &Token, value: Value) -> Result<(), RuntimeError> {
        if self.values.contains_key(&name.lexeme) {
            self.values.insert(name.lexeme.clone(), value);
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(RuntimeError::new(
                name,
                format!("Undefined variable '{}'.", name.lexeme),
            ))
        }
    }

    /// Direct access to the frame exactly `distance` links up. Distance 0
    /// is `env` itself. The resolver guarantees the chain is deep enough
    /// for every distance it records.
    pub fn get_at(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
        name: &Token,
    ) -> Result<Value, RuntimeError> {
        let undefined = || {
            RuntimeError::new(name, format!("Undefined variable '{}'.", name.lexeme))
        };

        let ancestor = Environment::ancestor(env, distance).ok_or_else(undefined)?;
        let borrowed = ancestor.borrow();

        borrowed
            .values
            .get(&name.lexeme)
            .cloned()
            .ok_or_else(undefined)
    }

    pub fn assign_at(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
        name: &Token,
        value: Value,
    ) -> Result<(), RuntimeError> {
        let undefined = || {
            RuntimeError::new(name, format!("Undefined variable '{}'.", name.lexeme))
        };

        let ancestor = Environment::ancestor(env, distance).ok_or_else(undefined)?;
        let mut borrowed = ancestor.borrow_mut();

        if borrowed.values.contains_key(&name.lexeme) {
            borrowed.values.insert(name.lexeme.clone(), value);
            Ok(())
        } else {
            Err(undefined())
        }
    }

    /// Walk exactly `distance` parent links. The resolver never records a
    /// distance deeper than the chain, so `None` here means a resolver bug
    /// and surfaces as an undefined-variable error rather than a panic.
    fn ancestor(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
    ) -> Option<Rc<RefCell<Environment>>> {
        let mut environment = Rc::clone(env);

        for _ in 0..distance {
            let enclosing = environment.borrow().enclosing.clone()?;

            environment = enclosing;
        }

        Some(environment)
    }
}

#[cfg(test)]
mod tests {
    use super::Environment;
    use crate::token::{Token, TokenType};
    use crate::value::Value;

    use std::cell::RefCell;
    use std::rc::Rc;

    fn ident(name: &str) -> Token {
        Token::new(TokenType::IDENTIFIER, name.to_string(), 1)
    }

    #[test]
    fn get_walks_enclosing_frames() {
        let outer = Rc::new(RefCell::new(Environment::new()));
        let inner = Environment::with_enclosing(outer.clone());

        outer.borrow_mut().define("answer", Value::Number(42.0));

        let value = inner.get(&ident("answer")).unwrap();
        assert!(value.equals(&Value::Number(42.0)));
    }

    #[test]
    fn define_shadows_without_touching_outer() {
        let outer = Rc::new(RefCell::new(Environment::new()));
        outer.borrow_mut().define("a", Value::String("global".into()));

        let inner = Rc::new(RefCell::new(Environment::with_enclosing(outer.clone())));
        inner.borrow_mut().define("a", Value::String("block".into()));

        let from_inner = inner.borrow().get(&ident("a")).unwrap();
        assert!(from_inner.equals(&Value::String("block".into())));

        let from_outer = outer.borrow().get(&ident("a")).unwrap();
        assert!(from_outer.equals(&Value::String("global".into())));
    }

    #[test]
    fn assign_targets_the_defining_frame() {
        let outer = Rc::new(RefCell::new(Environment::new()));
        outer.borrow_mut().define("x", Value::Number(1.0));

        let inner = Rc::new(RefCell::new(Environment::with_enclosing(outer.clone())));
        inner
            .borrow_mut()
            .assign(&ident("x"), Value::Number(2.0))
            .unwrap();

        let value = outer.borrow().get(&ident("x")).unwrap();
        assert!(value.equals(&Value::Number(2.0)));
    }

    #[test]
    fn assign_never_creates_a_binding() {
        let env = Rc::new(RefCell::new(Environment::new()));

        let err = env
            .borrow_mut()
            .assign(&ident("missing"), Value::Nil)
            .unwrap_err();
        assert_eq!(err.message, "Undefined variable 'missing'.");
    }

    #[test]
    fn get_at_reads_the_exact_frame() {
        let root = Rc::new(RefCell::new(Environment::new()));
        root.borrow_mut().define("d", Value::Number(0.0));

        let mid = Rc::new(RefCell::new(Environment::with_enclosing(root.clone())));
        mid.borrow_mut().define("d", Value::Number(1.0));

        let leaf = Rc::new(RefCell::new(Environment::with_enclosing(mid.clone())));

        let at_one = Environment::get_at(&leaf, 1, &ident("d")).unwrap();
        assert!(at_one.equals(&Value::Number(1.0)));

        let at_two = Environment::get_at(&leaf, 2, &ident("d")).unwrap();
        assert!(at_two.equals(&Value::Number(0.0)));
    }
}
