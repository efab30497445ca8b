//! Tree-walk evaluator.
//!
//! Executes the AST using the resolver's depth map for variable access:
//! a recorded depth means "climb exactly that many environment frames",
//! absence means the reference lives in globals. Control flow (`return`,
//! `break`, `continue`) and runtime errors travel as [`Unwind`] signals on
//! the `Err` channel; environment restoration is tied to scope exit, so it
//! happens no matter which signal is in flight.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;

use log::{debug, info};

use crate::ast::{Expr, FunctionExpr, NodeId, Stmt, VariableExpr};
use crate::callable::{Callable, NativeFunction};
use crate::class::{LoxClass, LoxInstance};
use crate::environment::Environment;
use crate::error::{Eval, RuntimeError, Unwind};
use crate::function::LoxFunction;
use crate::source::ParsedSource;
use crate::token::{Token, TokenType};
use crate::value::Value;

pub struct Interpreter {
    globals: Rc<RefCell<Environment>>,
    environment: Rc<RefCell<Environment>>,
    locals: HashMap<NodeId, usize>,
    includes: HashMap<NodeId, Rc<ParsedSource>>,
    output: Box<dyn Write>,
}

impl Interpreter {
    pub fn new() -> Self {
        Interpreter::with_output(Box::new(io::stdout()))
    }

    /// Build an interpreter whose `print` statements write to `output`.
    /// Tests pass a shared buffer here.
    pub fn with_output(output: Box<dyn Write>) -> Self {
        let globals = Rc::new(RefCell::new(Environment::new()));

        globals
            .borrow_mut()
            .define("clock", Value::Native(Rc::new(NativeFunction::clock())));

        Interpreter {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            includes: HashMap::new(),
            output,
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Resolver callbacks
    // ─────────────────────────────────────────────────────────────────────

    /// Record that the reference `id` binds `depth` scopes up.
    pub fn note_local(&mut self, id: NodeId, depth: usize) {
        self.locals.insert(id, depth);
    }

    /// Attach the parsed body of an `include` statement for execution.
    pub fn note_include(&mut self, id: NodeId, source: Rc<ParsedSource>) {
        self.includes.insert(id, source);
    }

    // ─────────────────────────────────────────────────────────────────────
    // Entry point
    // ─────────────────────────────────────────────────────────────────────

    /// Execute a resolved program. The first runtime error unwinds out of
    /// every scope and is returned for top-level reporting.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<(), RuntimeError> {
        info!("Interpreting {} statement(s)", statements.len());

        for stmt in statements {
            match self.execute(stmt) {
                Ok(()) => {}

                Err(Unwind::Error(error)) => return Err(error),

                // The resolver rejects return/break/continue outside their
                // owning constructs, so reaching here is an internal bug.
                Err(signal) => {
                    return Err(RuntimeError::native(format!(
                        "Unexpected control-flow signal at top level: {:?}.",
                        signal
                    )))
                }
            }
        }

        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Statements
    // ─────────────────────────────────────────────────────────────────────

    fn execute(&mut self, stmt: &Stmt) -> Eval<()> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;

                Ok(())
            }

            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;

                writeln!(self.output, "{}", value).map_err(|e| {
                    Unwind::Error(RuntimeError::native(format!("Failed to write output: {}.", e)))
                })?;

                Ok(())
            }

            Stmt::Var { name, initializer } => {
                let value: Value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                self.environment.borrow_mut().define(&name.lexeme, value);

                Ok(())
            }

            Stmt::Block(statements) => {
                let frame = Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(
                    &self.environment,
                ))));

                self.execute_block(statements, frame)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)?;
                } else if let Some(eb) = else_branch {
                    self.execute(eb)?;
                }

                Ok(())
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    match self.execute_loop_body(body) {
                        Ok(()) => {}

                        Err(Unwind::Break) => break,

                        // Fall through to the next condition check.
                        Err(Unwind::Continue) => {}

                        Err(other) => return Err(other),
                    }
                }

                Ok(())
            }

            Stmt::For {
                initializer,
                condition,
                increment,
                body,
            } => {
                // The initializer lives in its own frame enclosing the
                // whole loop, mirroring the resolver's outer scope.
                let frame = Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(
                    &self.environment,
                ))));
                let previous = std::mem::replace(&mut self.environment, frame);

                let result = self.run_for(
                    initializer.as_deref(),
                    condition.as_ref(),
                    increment.as_ref(),
                    body,
                );

                self.environment = previous;

                result
            }

            Stmt::Return { keyword: _, value } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                Err(Unwind::Return(value))
            }

            Stmt::Break(_) => Err(Unwind::Break),

            Stmt::Continue(_) => Err(Unwind::Continue),

            Stmt::Class {
                name,
                superclass,
                methods,
            } => self.execute_class(name, superclass, methods),

            Stmt::Include { id, keyword, .. } => {
                let parsed = match self.includes.get(id) {
                    Some(parsed) => Rc::clone(parsed),

                    None => {
                        return Err(RuntimeError::new(keyword, "Unresolved include.").into());
                    }
                };

                // Included statements run in the current environment; at
                // top level that is globals, matching resolution.
                for stmt in &parsed.body {
                    self.execute(stmt)?;
                }

                Ok(())
            }
        }
    }

    /// Execute `statements` with `environment` as the current frame,
    /// restoring the previous frame on every exit path.
    pub fn execute_block(
        &mut self,
        statements: &[Stmt],
        environment: Rc<RefCell<Environment>>,
    ) -> Eval<()> {
        let previous = std::mem::replace(&mut self.environment, environment);

        let mut result = Ok(());

        for stmt in statements {
            result = self.execute(stmt);

            if result.is_err() {
                break;
            }
        }

        self.environment = previous;

        result
    }

    /// One loop iteration gets a fresh frame, mirroring the resolver's
    /// per-loop body scope.
    fn execute_loop_body(&mut self, body: &Stmt) -> Eval<()> {
        let frame = Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(
            &self.environment,
        ))));

        self.execute_block(std::slice::from_ref(body), frame)
    }

    fn run_for(
        &mut self,
        initializer: Option<&Stmt>,
        condition: Option<&Expr>,
        increment: Option<&Expr>,
        body: &Stmt,
    ) -> Eval<()> {
        if let Some(init) = initializer {
            self.execute(init)?;
        }

        loop {
            let proceed = match condition {
                Some(cond) => self.evaluate(cond)?.is_truthy(),
                None => true,
            };

            if !proceed {
                break;
            }

            match self.execute_loop_body(body) {
                Ok(()) => {}

                // `break` skips the increment.
                Err(Unwind::Break) => break,

                // `continue` falls through to the increment.
                Err(Unwind::Continue) => {}

                Err(other) => return Err(other),
            }

            if let Some(inc) = increment {
                self.evaluate(inc)?;
            }
        }

        Ok(())
    }

    fn execute_class(
        &mut self,
        name: &Token,
        superclass: &Option<VariableExpr>,
        methods: &[Rc<FunctionExpr>],
    ) -> Eval<()> {
        let superclass_value: Option<Rc<LoxClass>> = match superclass {
            Some(super_var) => {
                let value = self.look_up_variable(&super_var.name, super_var.id)?;

                match value {
                    Value::Class(class) => Some(class),

                    _ => {
                        return Err(RuntimeError::new(
                            &super_var.name,
                            "Superclass must be a class.",
                        )
                        .into());
                    }
                }
            }

            None => None,
        };

        // Two-step definition so methods can refer to the class by name.
        self.environment.borrow_mut().define(&name.lexeme, Value::Nil);

        let enclosing = if let Some(class) = &superclass_value {
            let previous = Rc::clone(&self.environment);

            let mut super_env = Environment::with_enclosing(Rc::clone(&self.environment));
            super_env.define("super", Value::Class(Rc::clone(class)));
            self.environment = Rc::new(RefCell::new(super_env));

            Some(previous)
        } else {
            None
        };

        let mut method_table: HashMap<String, Rc<LoxFunction>> = HashMap::new();

        for method in methods {
            if let Some(method_name) = &method.name {
                let is_initializer = method_name.lexeme == "init";

                let function = LoxFunction::new(
                    Rc::clone(method),
                    Rc::clone(&self.environment),
                    is_initializer,
                );

                method_table.insert(method_name.lexeme.clone(), Rc::new(function));
            }
        }

        let class = LoxClass::new(name.lexeme.clone(), superclass_value, method_table);

        debug!("Defined class {}", class);

        if let Some(previous) = enclosing {
            self.environment = previous;
        }

        self.environment
            .borrow_mut()
            .assign(name, Value::Class(Rc::new(class)))?;

        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Expressions
    // ─────────────────────────────────────────────────────────────────────

    pub fn evaluate(&mut self, expr: &Expr) -> Eval<Value> {
        match expr {
            Expr::Literal(token) => self.evaluate_literal(token),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Logical {
                left,
                operator,
                right,
            } => self.evaluate_logical(left, operator, right),

            Expr::Variable(variable) => self.look_up_variable(&variable.name, variable.id),

            Expr::This { id, keyword } => self.look_up_variable(keyword, *id),

            Expr::Assign { id, name, value } => {
                let value = self.evaluate(value)?;

                match self.locals.get(id) {
                    Some(&distance) => {
                        Environment::assign_at(&self.environment, distance, name, value.clone())?;
                    }

                    None => {
                        self.globals.borrow_mut().assign(name, value.clone())?;
                    }
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => self.evaluate_call(callee, paren, arguments),

            Expr::Get { object, name } => {
                let object = self.evaluate(object)?;

                match object {
                    Value::Instance(instance) => Ok(LoxInstance::get(&instance, name)?),

                    _ => Err(RuntimeError::new(name, "Only instances have properties.").into()),
                }
            }

            // The receiver is evaluated before the value; the resolver
            // resolves them in the opposite order, which is unobservable.
            Expr::Set {
                object,
                name,
                value,
            } => {
                let object = self.evaluate(object)?;

                match object {
                    Value::Instance(instance) => {
                        let value = self.evaluate(value)?;

                        instance.borrow_mut().set(name, value.clone());

                        Ok(value)
                    }

                    _ => Err(RuntimeError::new(name, "Only instances have fields.").into()),
                }
            }

            Expr::Super {
                id,
                keyword,
                method,
            } => self.evaluate_super(*id, keyword, method),

            Expr::Function(declaration) => {
                let function = LoxFunction::new(
                    Rc::clone(declaration),
                    Rc::clone(&self.environment),
                    false,
                );
                let value = Value::Function(Rc::new(function));

                // A named function expression doubles as a declaration.
                if let Some(name) = &declaration.name {
                    self.environment
                        .borrow_mut()
                        .define(&name.lexeme, value.clone());
                }

                Ok(value)
            }
        }
    }

    fn evaluate_literal(&self, token: &Token) -> Eval<Value> {
        match &token.token_type {
            TokenType::NUMBER(n) => Ok(Value::Number(*n)),

            TokenType::STRING(s) => Ok(Value::String(s.clone())),

            TokenType::TRUE => Ok(Value::Bool(true)),

            TokenType::FALSE => Ok(Value::Bool(false)),

            TokenType::NIL => Ok(Value::Nil),

            _ => Err(RuntimeError::new(token, "Invalid literal.").into()),
        }
    }

    fn evaluate_unary(&mut self, operator: &Token, right: &Expr) -> Eval<Value> {
        let value = self.evaluate(right)?;

        match operator.token_type {
            TokenType::MINUS => match value {
                Value::Number(n) => Ok(Value::Number(-n)),

                _ => Err(RuntimeError::new(operator, "Operand must be a number.").into()),
            },

            TokenType::BANG => Ok(Value::Bool(!value.is_truthy())),

            _ => Err(RuntimeError::new(operator, "Invalid unary operator.").into()),
        }
    }

    fn evaluate_binary(&mut self, left: &Expr, operator: &Token, right: &Expr) -> Eval<Value> {
        let left_val = self.evaluate(left)?;
        let right_val = self.evaluate(right)?;

        match operator.token_type {
            TokenType::PLUS => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),

                (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),

                _ => Err(RuntimeError::new(
                    operator,
                    "Operands must be two numbers or two strings.",
                )
                .into()),
            },

            TokenType::MINUS => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a - b)),

                _ => Err(RuntimeError::new(operator, "Operands must be numbers.").into()),
            },

            TokenType::STAR => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a * b)),

                _ => Err(RuntimeError::new(operator, "Operands must be numbers.").into()),
            },

            TokenType::SLASH => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => {
                    if b == 0.0 {
                        Err(RuntimeError::new(operator, "Division by zero.").into())
                    } else {
                        Ok(Value::Number(a / b))
                    }
                }

                _ => Err(RuntimeError::new(operator, "Operands must be numbers.").into()),
            },

            TokenType::GREATER => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a > b)),

                _ => Err(RuntimeError::new(operator, "Operands must be numbers.").into()),
            },

            TokenType::GREATER_EQUAL => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a >= b)),

                _ => Err(RuntimeError::new(operator, "Operands must be numbers.").into()),
            },

            TokenType::LESS => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a < b)),

                _ => Err(RuntimeError::new(operator, "Operands must be numbers.").into()),
            },

            TokenType::LESS_EQUAL => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a <= b)),

                _ => Err(RuntimeError::new(operator, "Operands must be numbers.").into()),
            },

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(left_val.equals(&right_val))),

            TokenType::BANG_EQUAL => Ok(Value::Bool(!left_val.equals(&right_val))),

            _ => Err(RuntimeError::new(operator, "Invalid binary operator.").into()),
        }
    }

    /// Short-circuit; the result is the operand that decided it, not a
    /// coerced boolean.
    fn evaluate_logical(&mut self, left: &Expr, operator: &Token, right: &Expr) -> Eval<Value> {
        let left_val = self.evaluate(left)?;

        match operator.token_type {
            TokenType::OR => {
                if left_val.is_truthy() {
                    Ok(left_val)
                } else {
                    self.evaluate(right)
                }
            }

            TokenType::AND => {
                if !left_val.is_truthy() {
                    Ok(left_val)
                } else {
                    self.evaluate(right)
                }
            }

            _ => Err(RuntimeError::new(operator, "Invalid logical operator.").into()),
        }
    }

    fn evaluate_call(&mut self, callee: &Expr, paren: &Token, arguments: &[Expr]) -> Eval<Value> {
        let callee_val = self.evaluate(callee)?;

        let mut arg_values: Vec<Value> = Vec::with_capacity(arguments.len());

        for arg in arguments {
            arg_values.push(self.evaluate(arg)?);
        }

        let callable: &dyn Callable = match &callee_val {
            Value::Native(native) => native.as_ref(),

            Value::Function(function) => function.as_ref(),

            Value::Class(class) => class,

            _ => {
                return Err(
                    RuntimeError::new(paren, "Can only call functions and classes.").into(),
                );
            }
        };

        if arg_values.len() != callable.arity() {
            return Err(RuntimeError::new(
                paren,
                format!(
                    "Expected {} arguments but got {}.",
                    callable.arity(),
                    arg_values.len()
                ),
            )
            .into());
        }

        debug!("Dispatching call at line {}", paren.line);

        callable.call(self, arg_values)
    }

    fn evaluate_super(&mut self, id: NodeId, keyword: &Token, method: &Token) -> Eval<Value> {
        let distance = match self.locals.get(&id) {
            Some(&distance) => distance,

            None => {
                return Err(RuntimeError::new(keyword, "Undefined variable 'super'.").into());
            }
        };

        let superclass = match Environment::get_at(&self.environment, distance, keyword)? {
            Value::Class(class) => class,

            _ => {
                return Err(RuntimeError::new(keyword, "Superclass must be a class.").into());
            }
        };

        // `this` sits one frame inside the `super` frame.
        let this_token = Token::new(TokenType::THIS, "this".to_string(), keyword.line);
        let object = Environment::get_at(&self.environment, distance - 1, &this_token)?;

        let found = superclass.find_method(&method.lexeme).ok_or_else(|| {
            RuntimeError::new(method, format!("Undefined property '{}'.", method.lexeme))
        })?;

        Ok(Value::Function(Rc::new(found.bind(object))))
    }

    fn look_up_variable(&self, name: &Token, id: NodeId) -> Eval<Value> {
        match self.locals.get(&id) {
            Some(&distance) => Ok(Environment::get_at(&self.environment, distance, name)?),

            None => Ok(self.globals.borrow().get(name)?),
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Interpreter::new()
    }
}
