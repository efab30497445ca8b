//! Parenthesised AST rendering for the `parse` subcommand.

use crate::ast::{Expr, FunctionExpr, Stmt};
use crate::token::TokenType;

pub struct AstPrinter;

impl AstPrinter {
    pub fn print_stmt(&self, stmt: &Stmt) -> String {
        match stmt {
            Stmt::Block(statements) => {
                let inner: Vec<String> =
                    statements.iter().map(|s| self.print_stmt(s)).collect();

                format!("(block {})", inner.join(" "))
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                let mut out = format!("(class {}", name.lexeme);

                if let Some(super_var) = superclass {
                    out.push_str(&format!(" < {}", super_var.name.lexeme));
                }

                for method in methods {
                    out.push(' ');
                    out.push_str(&self.print_function(method));
                }

                out.push(')');
                out
            }

            Stmt::Expression(expr) => format!("(; {})", self.print(expr)),

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => match else_branch {
                Some(eb) => format!(
                    "(if {} {} {})",
                    self.print(condition),
                    self.print_stmt(then_branch),
                    self.print_stmt(eb)
                ),
                None => format!(
                    "(if {} {})",
                    self.print(condition),
                    self.print_stmt(then_branch)
                ),
            },

            Stmt::Print(expr) => format!("(print {})", self.print(expr)),

            Stmt::Var { name, initializer } => match initializer {
                Some(expr) => format!("(var {} {})", name.lexeme, self.print(expr)),
                None => format!("(var {})", name.lexeme),
            },

            Stmt::While { condition, body } => {
                format!(
                    "(while {} {})",
                    self.print(condition),
                    self.print_stmt(body)
                )
            }

            Stmt::For {
                initializer,
                condition,
                increment,
                body,
            } => {
                let init = initializer
                    .as_ref()
                    .map(|s| self.print_stmt(s))
                    .unwrap_or_else(|| "()".to_string());
                let cond = condition
                    .as_ref()
                    .map(|e| self.print(e))
                    .unwrap_or_else(|| "()".to_string());
                let incr = increment
                    .as_ref()
                    .map(|e| self.print(e))
                    .unwrap_or_else(|| "()".to_string());

                format!("(for {} {} {} {})", init, cond, incr, self.print_stmt(body))
            }

            Stmt::Return { value, .. } => match value {
                Some(expr) => format!("(return {})", self.print(expr)),
                None => "(return)".to_string(),
            },

            Stmt::Break(_) => "(break)".to_string(),

            Stmt::Continue(_) => "(continue)".to_string(),

            Stmt::Include { path, .. } => format!("(include {})", path.lexeme),
        }
    }

    pub fn print(&self, expr: &Expr) -> String {
        match expr {
            Expr::Assign { name, value, .. } => {
                format!("(= {} {})", name.lexeme, self.print(value))
            }

            Expr::Binary {
                left,
                operator,
                right,
            }
            | Expr::Logical {
                left,
                operator,
                right,
            } => format!(
                "({} {} {})",
                operator.lexeme,
                self.print(left),
                self.print(right)
            ),

            Expr::Call {
                callee, arguments, ..
            } => {
                let mut out = format!("(call {}", self.print(callee));

                for arg in arguments {
                    out.push(' ');
                    out.push_str(&self.print(arg));
                }

                out.push(')');
                out
            }

            Expr::Get { object, name } => format!("(. {} {})", self.print(object), name.lexeme),

            Expr::Grouping(inner) => format!("(group {})", self.print(inner)),

            Expr::Literal(token) => match &token.token_type {
                TokenType::NUMBER(n) => {
                    if n.fract() == 0.0 {
                        format!("{:.1}", n)
                    } else {
                        n.to_string()
                    }
                }

                TokenType::STRING(s) => s.clone(),

                TokenType::TRUE => "true".to_string(),

                TokenType::FALSE => "false".to_string(),

                TokenType::NIL => "nil".to_string(),

                _ => token.lexeme.clone(),
            },

            Expr::Set {
                object,
                name,
                value,
            } => format!(
                "(.= {} {} {})",
                self.print(object),
                name.lexeme,
                self.print(value)
            ),

            Expr::Super { method, .. } => format!("(super {})", method.lexeme),

            Expr::This { .. } => "this".to_string(),

            Expr::Unary { operator, right } => {
                format!("({} {})", operator.lexeme, self.print(right))
            }

            Expr::Variable(variable) => variable.name.lexeme.clone(),

            Expr::Function(function) => self.print_function(function),
        }
    }

    fn print_function(&self, function: &FunctionExpr) -> String {
        let name = function
            .name
            .as_ref()
            .map(|t| t.lexeme.clone())
            .unwrap_or_default();

        let params: Vec<String> = function
            .params
            .iter()
            .map(|p| p.lexeme.clone())
            .collect();

        let body: Vec<String> = function.body.iter().map(|s| self.print_stmt(s)).collect();

        format!("(fun {}({}) {})", name, params.join(" "), body.join(" "))
    }
}
