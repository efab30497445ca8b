//! Static resolution pass.
//!
//! A single AST walk that:
//! 1. **Builds lexical scopes**: a stack of `HashMap<String, bool>`
//!    tracking declared (false) and fully defined (true) names per block,
//!    function body, loop body, and class body.
//! 2. **Enforces static rules**: duplicate declarations, reading a
//!    variable in its own initializer, `return` outside functions,
//!    `this`/`super` outside classes, `break`/`continue` outside loops,
//!    self-inheritance, and include discipline.
//! 3. **Records binding distances**: every `Variable`/`Assign`/`This`/
//!    `Super` occurrence is either noted in the interpreter's depth map
//!    (local, N scopes up) or left unrecorded (global).
//!
//! Diagnostics are reported through the [`LoxContext`] and the walk
//! continues, so one pass surfaces as many errors as possible. The caller
//! checks `context.had_error` before running the program.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use log::{debug, info};

use crate::ast::{Expr, FunctionExpr, NodeId, Stmt, VariableExpr};
use crate::context::LoxContext;
use crate::interpreter::Interpreter;
use crate::source::SourceResolver;
use crate::token::{Token, TokenType};

/// What kind of function body is being resolved. Validates `return`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
    Initializer,
    Method,
}

/// What kind of class body is being resolved. Validates `this`/`super`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ClassType {
    None,
    Class,
    Subclass,
}

/// What kind of loop body is being resolved. Validates `break`/`continue`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum LoopType {
    None,
    While,
    For,
}

pub struct Resolver<'a> {
    context: &'a mut LoxContext,
    interpreter: &'a mut Interpreter,
    sources: &'a mut dyn SourceResolver,
    scopes: Vec<HashMap<String, bool>>, // false=declared, true=defined
    current_function: FunctionType,
    current_class: ClassType,
    current_loop: LoopType,
    included_files: HashSet<String>,
}

impl<'a> Resolver<'a> {
    pub fn new(
        context: &'a mut LoxContext,
        interpreter: &'a mut Interpreter,
        sources: &'a mut dyn SourceResolver,
    ) -> Self {
        Resolver {
            context,
            interpreter,
            sources,
            scopes: Vec::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
            current_loop: LoopType::None,
            included_files: HashSet::new(),
        }
    }

    /// Walk all top-level statements.
    pub fn resolve(&mut self, statements: &[Stmt]) {
        info!("Resolve pass over {} statement(s)", statements.len());

        for stmt in statements {
            self.resolve_stmt(stmt);
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Statement resolution
    // ─────────────────────────────────────────────────────────────────────

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Block(statements) => {
                self.begin_scope();

                for s in statements {
                    self.resolve_stmt(s);
                }

                self.end_scope();
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => self.resolve_class(name, superclass.as_ref(), methods),

            Stmt::Expression(expr) | Stmt::Print(expr) => {
                self.resolve_expr(expr);
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);

                if let Some(eb) = else_branch {
                    self.resolve_stmt(eb);
                }
            }

            Stmt::Var { name, initializer } => {
                // Declare before the initializer so `var x = x;` is caught
                // as a read of the half-declared name.
                self.declare(name);

                if let Some(expr) = initializer {
                    self.resolve_expr(expr);
                }

                self.define(name);
            }

            Stmt::While { condition, body } => {
                self.resolve_expr(condition);

                let enclosing_loop = self.current_loop;
                self.current_loop = LoopType::While;

                self.begin_scope();
                self.resolve_stmt(body);
                self.end_scope();

                self.current_loop = enclosing_loop;
            }

            Stmt::For {
                initializer,
                condition,
                increment,
                body,
            } => {
                // Outer scope holds the loop variable for the whole loop.
                self.begin_scope();

                if let Some(init) = initializer {
                    self.resolve_stmt(init);
                }

                if let Some(cond) = condition {
                    self.resolve_expr(cond);
                }

                if let Some(inc) = increment {
                    self.resolve_expr(inc);
                }

                let enclosing_loop = self.current_loop;
                self.current_loop = LoopType::For;

                self.begin_scope();
                self.resolve_stmt(body);
                self.end_scope();

                self.current_loop = enclosing_loop;

                self.end_scope();
            }

            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    self.context
                        .token_error(keyword, "Can't return from top-level code.");
                }

                if let Some(expr) = value {
                    if self.current_function == FunctionType::Initializer {
                        self.context
                            .token_error(keyword, "Can't return a value from an initializer.");
                    }

                    self.resolve_expr(expr);
                }
            }

            Stmt::Break(keyword) => {
                if self.current_loop == LoopType::None {
                    self.context
                        .token_error(keyword, "Can't use 'break' outside of a loop.");
                }
            }

            Stmt::Continue(keyword) => {
                if self.current_loop == LoopType::None {
                    self.context
                        .token_error(keyword, "Can't use 'continue' outside of a loop.");
                }
            }

            Stmt::Include { id, keyword, path } => {
                self.resolve_include(*id, keyword, path);
            }
        }
    }

    fn resolve_class(
        &mut self,
        name: &Token,
        superclass: Option<&VariableExpr>,
        methods: &[Rc<FunctionExpr>],
    ) {
        let enclosing_class = self.current_class;
        self.current_class = ClassType::Class;

        self.declare(name);
        self.define(name);

        if let Some(super_var) = superclass {
            if super_var.name.lexeme == name.lexeme {
                self.context
                    .token_error(&super_var.name, "A class can't inherit from itself.");
            }

            self.current_class = ClassType::Subclass;
            self.resolve_variable(super_var);

            // Scope binding `super` for every method of the subclass.
            self.begin_scope();
            self.scope_insert("super");
        }

        // Implicit `this` scope shared by the methods.
        self.begin_scope();
        self.scope_insert("this");

        for method in methods {
            match &method.name {
                None => {
                    self.context
                        .token_error(&method.paren, "Method must have a name.");
                }

                Some(method_name) => {
                    let kind = if method_name.lexeme == "init" {
                        FunctionType::Initializer
                    } else {
                        FunctionType::Method
                    };

                    self.resolve_function(kind, method);
                }
            }
        }

        self.end_scope();

        if superclass.is_some() {
            self.end_scope();
        }

        self.current_class = enclosing_class;
    }

    fn resolve_include(&mut self, id: NodeId, keyword: &Token, path: &Token) {
        let path_str = match &path.token_type {
            TokenType::STRING(s) => s.clone(),

            _ => {
                self.context
                    .token_error(path, "Include path must be a string.");
                return;
            }
        };

        if self.included_files.contains(&path_str) {
            self.context
                .token_error(keyword, "Can't include file more than once.");
            return;
        }

        let parsed = match self.sources.resolve(self.context, &path_str) {
            Ok(parsed) => parsed,

            Err(e) => {
                debug!("Include load failed: {}", e);

                self.context
                    .token_error(path, "Can't resolve include path.");
                return;
            }
        };

        if self.context.had_error {
            return;
        }

        self.included_files.insert(path_str);

        let parsed = Rc::new(parsed);
        self.interpreter.note_include(id, Rc::clone(&parsed));

        // Included files share the including scope, so no scope is pushed
        // here and the interpreter executes the body in place.
        for stmt in &parsed.body {
            self.resolve_stmt(stmt);
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Expression resolution
    // ─────────────────────────────────────────────────────────────────────

    fn resolve_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal(_) => {}

            Expr::Grouping(inner) => {
                self.resolve_expr(inner);
            }

            Expr::Unary { right, .. } => {
                self.resolve_expr(right);
            }

            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }

            Expr::Variable(variable) => {
                self.resolve_variable(variable);
            }

            Expr::Assign { id, name, value } => {
                self.resolve_expr(value);
                self.resolve_local(*id, name);
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee);

                for arg in arguments {
                    self.resolve_expr(arg);
                }
            }

            Expr::Get { object, .. } => {
                self.resolve_expr(object);
            }

            Expr::Set { object, value, .. } => {
                self.resolve_expr(value);
                self.resolve_expr(object);
            }

            Expr::This { id, keyword } => {
                if self.current_class == ClassType::None {
                    self.context
                        .token_error(keyword, "Can't use 'this' outside of a class.");
                    return;
                }

                self.resolve_local(*id, keyword);
            }

            Expr::Super { id, keyword, .. } => {
                if self.current_class == ClassType::None {
                    self.context
                        .token_error(keyword, "Can't use 'super' outside of a class.");
                    return;
                }

                if self.current_class != ClassType::Subclass {
                    self.context.token_error(
                        keyword,
                        "Can't use 'super' in a class with no superclass.",
                    );
                    return;
                }

                self.resolve_local(*id, keyword);
            }

            Expr::Function(function) => {
                if let Some(name) = &function.name {
                    self.declare(name);
                    self.define(name);
                }

                self.resolve_function(FunctionType::Function, function);
            }
        }
    }

    fn resolve_variable(&mut self, variable: &VariableExpr) {
        if let Some(scope) = self.scopes.last() {
            if scope.get(&variable.name.lexeme) == Some(&false) {
                self.context.token_error(
                    &variable.name,
                    "Can't read local variable in its own initializer.",
                );
            }
        }

        self.resolve_local(variable.id, &variable.name);
    }

    /// Resolve a function's parameters and body under `kind`.
    ///
    /// Loop context does not carry across the call boundary: a `break`
    /// inside the body may not target a loop outside it.
    fn resolve_function(&mut self, kind: FunctionType, function: &FunctionExpr) {
        let enclosing_function = self.current_function;
        let enclosing_loop = self.current_loop;

        self.current_function = kind;
        self.current_loop = LoopType::None;

        self.begin_scope();

        for param in &function.params {
            self.declare(param);
            self.define(param);
        }

        for stmt in &function.body {
            self.resolve_stmt(stmt);
        }

        self.end_scope();

        self.current_function = enclosing_function;
        self.current_loop = enclosing_loop;
    }

    // ─────────────────────────────────────────────────────────────────────
    // Scope management
    // ─────────────────────────────────────────────────────────────────────

    #[inline]
    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    #[inline]
    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    /// Insert a keyword binding (`this`/`super`) as already defined.
    fn scope_insert(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), true);
        }
    }

    fn declare(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            if scope.contains_key(&name.lexeme) {
                self.context
                    .token_error(name, "Already variable with this name in this scope.");
            }

            scope.insert(name.lexeme.clone(), false);
        }
    }

    fn define(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.clone(), true);
        }
    }

    /// Record this occurrence as a local at its lexical depth, or leave it
    /// unrecorded for the interpreter's global fallback.
    fn resolve_local(&mut self, id: NodeId, name: &Token) {
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(&name.lexeme) {
                debug!("Resolved '{}' at depth {}", name.lexeme, depth);

                self.interpreter.note_local(id, depth);
                return;
            }
        }

        debug!("Resolved '{}' as global", name.lexeme);
    }
}
