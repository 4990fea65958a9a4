// File: src/checker.rs
//
// Static checker and name resolver for the Skiff programming language.
//
// A single pass over the AST that:
// - resolves every variable and assignment target to the nesting level of
//   the scope that defines it (the evaluator then addresses scopes by
//   level and never searches by name),
// - enforces structural rules: no re-declaration in a scope, no
//   break/continue outside loops, return arity against the enclosing
//   function's declared count, throw only inside `throws` functions,
//   calls to throwing functions only from `throws` functions or inside a
//   `try` body, and the presence of a zero-parameter `main`,
// - warns about names that are never read. Writes do not count as reads.
//
// The first rule violation is fatal; warnings never halt execution.

use std::collections::HashMap;

use crate::ast::{Expr, Stmt};
use crate::errors::{Diagnostic, DiagnosticKind};
use crate::interpreter::native_functions;
use crate::lexer::Token;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NameState {
    Declared,
    Defined,
    Used,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NameKind {
    Variable,
    Function,
}

/// Call-shape facts about a function name, used for throw-site checking
/// and multi-assignment arity.
#[derive(Debug, Clone, Copy)]
struct FunctionMeta {
    return_count: usize,
    throws: bool,
}

#[derive(Debug)]
struct NameInfo {
    state: NameState,
    kind: NameKind,
    /// Declaration site; None for built-ins and parameters, which never
    /// warn.
    token: Option<Token>,
    meta: Option<FunctionMeta>,
}

pub struct Checker<'a> {
    lines: &'a [String],
    scopes: Vec<HashMap<String, NameInfo>>,
    warnings: Vec<Diagnostic>,
    in_loop: bool,
    in_try: bool,
    can_throw: bool,
    /// Declared return value count of the enclosing function; None at the
    /// top level, where `return` is illegal.
    return_count: Option<usize>,
}

/// Checks and resolves a program in place. Returns the unused-name
/// warnings on success; the first fatal rule violation aborts the pass.
pub fn check(program: &mut [Stmt], lines: &[String]) -> Result<Vec<Diagnostic>, Diagnostic> {
    let mut checker = Checker {
        lines,
        scopes: Vec::new(),
        warnings: Vec::new(),
        in_loop: false,
        in_try: false,
        can_throw: false,
        return_count: None,
    };

    checker.begin_scope();
    for native in native_functions::all() {
        checker.scopes[0].insert(
            native.name.to_string(),
            NameInfo {
                state: NameState::Used,
                kind: NameKind::Function,
                token: None,
                meta: Some(FunctionMeta {
                    return_count: native.return_count,
                    throws: native.throws,
                }),
            },
        );
    }

    for stmt in program.iter_mut() {
        checker.check_stmt(stmt)?;
    }

    match checker.scopes[0].get("main") {
        Some(info) if info.kind == NameKind::Function => {}
        _ => return Err(Diagnostic::bare(DiagnosticKind::CheckError, "No main function.")),
    }

    checker.end_scope();
    checker.warnings.sort_by_key(|w| (w.line, w.column));
    Ok(checker.warnings)
}

impl<'a> Checker<'a> {
    fn check_stmt(&mut self, stmt: &mut Stmt) -> Result<(), Diagnostic> {
        match stmt {
            Stmt::Expression { expr } => self.check_expr(expr),

            Stmt::VarDecl { names, initializer, operator } => {
                for name in names.iter() {
                    self.declare(name, NameKind::Variable, None)?;
                }
                if let Some(initializer) = initializer {
                    self.check_expr(initializer)?;
                }
                if names.len() >= 2 {
                    self.check_multi_binding(names.len(), initializer.as_ref(), operator)?;
                }
                for name in names.iter() {
                    self.transition(&name.lexeme, NameState::Defined);
                }
                Ok(())
            }

            Stmt::FuncDecl { name, parameters, body, return_count, throws } => {
                let meta = FunctionMeta { return_count: *return_count, throws: *throws };
                self.declare(name, NameKind::Function, Some(meta))?;
                // `main` is the entry point; it counts as used so it never
                // warns.
                let state = if self.scopes.len() == 1 && name.lexeme == "main" {
                    NameState::Used
                } else {
                    NameState::Defined
                };
                self.transition(&name.lexeme, state);

                if self.scopes.len() == 1 && name.lexeme == "main" && !parameters.is_empty() {
                    return Err(self.error("The 'main' function cannot have parameters.", name));
                }

                self.check_function(parameters, body, *return_count, *throws)
            }

            Stmt::If { condition, body, else_body } => {
                self.check_expr(condition)?;
                self.check_stmt(body)?;
                if let Some(else_body) = else_body {
                    self.check_stmt(else_body)?;
                }
                Ok(())
            }

            Stmt::While { condition, body } => {
                self.check_expr(condition)?;
                let enclosing = std::mem::replace(&mut self.in_loop, true);
                let result = self.check_stmt(body);
                self.in_loop = enclosing;
                result
            }

            Stmt::For { initializer, condition, increment, body } => {
                self.check_stmt(initializer)?;
                self.check_expr(condition)?;
                self.check_expr(increment)?;
                let enclosing = std::mem::replace(&mut self.in_loop, true);
                let result = self.check_stmt(body);
                self.in_loop = enclosing;
                result
            }

            Stmt::LoopControl { keyword } => {
                if !self.in_loop {
                    return Err(self.error(
                        format!("Cannot use '{}' outside of a loop.", keyword.lexeme),
                        keyword,
                    ));
                }
                Ok(())
            }

            Stmt::Return { keyword, values } => {
                let Some(return_count) = self.return_count else {
                    return Err(self.error("Cannot return from the top level.", keyword));
                };
                if values.len() != return_count {
                    return Err(self.error(
                        format!("Expected {} return value/s, got {}.", return_count, values.len()),
                        keyword,
                    ));
                }
                for value in values {
                    self.check_expr(value)?;
                }
                Ok(())
            }

            Stmt::Throw { keyword, value } => {
                if !self.can_throw {
                    return Err(self.error(
                        "Cannot throw in a function not declared with 'throws'.",
                        keyword,
                    ));
                }
                self.check_expr(value)
            }

            Stmt::Try { body, catch_body, exception_name } => {
                let enclosing = std::mem::replace(&mut self.in_try, true);
                let result = self.check_stmt(body);
                self.in_try = enclosing;
                result?;

                self.begin_scope();
                if let Some(name) = exception_name {
                    self.declare(name, NameKind::Variable, None)?;
                    self.transition(&name.lexeme, NameState::Defined);
                }
                let result = self.check_stmt(catch_body);
                self.end_scope();
                result
            }

            Stmt::Block { statements } => {
                self.begin_scope();
                let mut result = Ok(());
                for statement in statements {
                    result = self.check_stmt(statement);
                    if result.is_err() {
                        break;
                    }
                }
                self.end_scope();
                result
            }
        }
    }

    fn check_function(
        &mut self,
        parameters: &[String],
        body: &mut Stmt,
        return_count: usize,
        throws: bool,
    ) -> Result<(), Diagnostic> {
        let enclosing_loop = std::mem::replace(&mut self.in_loop, false);
        let enclosing_try = std::mem::replace(&mut self.in_try, false);
        let enclosing_throw = std::mem::replace(&mut self.can_throw, throws);
        let enclosing_return = self.return_count.replace(return_count);

        self.begin_scope();
        for parameter in parameters {
            // Parameters enter pre-used; duplicates silently shadow.
            self.current_scope().insert(
                parameter.clone(),
                NameInfo {
                    state: NameState::Used,
                    kind: NameKind::Variable,
                    token: None,
                    meta: None,
                },
            );
        }
        let result = self.check_stmt(body);
        self.end_scope();

        self.in_loop = enclosing_loop;
        self.in_try = enclosing_try;
        self.can_throw = enclosing_throw;
        self.return_count = enclosing_return;
        result
    }

    fn check_expr(&mut self, expr: &mut Expr) -> Result<(), Diagnostic> {
        match expr {
            Expr::Literal { .. } => Ok(()),

            Expr::Variable { name, nesting_level } => {
                let level = self.resolve(name)?;
                *nesting_level = level;
                self.mark_used(&name.lexeme, level);
                Ok(())
            }

            Expr::Grouping { expr } => self.check_expr(expr),

            Expr::List { values } => {
                for value in values {
                    self.check_expr(value)?;
                }
                Ok(())
            }

            Expr::Call { callee, args, .. } => {
                if let Expr::Variable { name, .. } = callee.as_ref() {
                    if let Some(meta) = self.function_meta(&name.lexeme) {
                        if meta.throws && !self.can_throw && !self.in_try {
                            return Err(self.error(
                                format!(
                                    "Cannot call '{}' outside of a 'try' block or a function declared with 'throws'.",
                                    name.lexeme
                                ),
                                name,
                            ));
                        }
                    }
                }
                self.check_expr(callee)?;
                for arg in args {
                    self.check_expr(arg)?;
                }
                Ok(())
            }

            Expr::Subscript { object, index, .. } => {
                self.check_expr(object)?;
                self.check_expr(index)
            }

            Expr::Unary { right, .. } => self.check_expr(right),

            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.check_expr(left)?;
                self.check_expr(right)
            }

            Expr::Ternary { left, center, right, .. } => {
                self.check_expr(left)?;
                self.check_expr(center)?;
                self.check_expr(right)
            }

            Expr::Assign { operator, assignees, value } => {
                for assignee in assignees.iter_mut() {
                    match assignee {
                        // A write resolves the name but does not mark it
                        // used.
                        Expr::Variable { name, nesting_level } => {
                            *nesting_level = self.resolve(name)?;
                        }
                        other => self.check_expr(other)?,
                    }
                }
                self.check_expr(value)?;
                if assignees.len() >= 2 {
                    self.check_multi_binding(assignees.len(), Some(&**value), operator)?;
                }
                Ok(())
            }

            Expr::AnonymousFunction { parameters, body, return_count, throws, .. } => {
                let parameters = parameters.clone();
                self.check_function(&parameters, body, *return_count, *throws)
            }
        }
    }

    /// When a multi-name binding's initializer is a direct call to a known
    /// function, its declared return count must match the number of
    /// targets. Anything else is left to the evaluator.
    fn check_multi_binding(
        &self,
        targets: usize,
        initializer: Option<&Expr>,
        operator: &Token,
    ) -> Result<(), Diagnostic> {
        let Some(Expr::Call { callee, .. }) = initializer else {
            return Ok(());
        };
        let Expr::Variable { name, .. } = callee.as_ref() else {
            return Ok(());
        };
        if let Some(meta) = self.function_meta(&name.lexeme) {
            if meta.return_count != targets {
                return Err(self.error(
                    format!(
                        "Cannot assign {} value/s to {} variable/s.",
                        meta.return_count, targets
                    ),
                    operator,
                ));
            }
        }
        Ok(())
    }

    // --- Scope handling ---

    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    /// Pops the innermost scope, emitting an unused warning for every name
    /// that was never read.
    fn end_scope(&mut self) {
        let Some(scope) = self.scopes.pop() else {
            return;
        };
        for info in scope.into_values() {
            if info.state == NameState::Used {
                continue;
            }
            let Some(token) = info.token else {
                continue;
            };
            let message = match info.kind {
                NameKind::Variable => "Unused variable.",
                NameKind::Function => "Unused function.",
            };
            self.warnings.push(Diagnostic::at_token(
                DiagnosticKind::Warning,
                message,
                &token,
                self.lines,
            ));
        }
    }

    fn current_scope(&mut self) -> &mut HashMap<String, NameInfo> {
        self.scopes.last_mut().expect("checker always has an open scope")
    }

    fn declare(
        &mut self,
        name: &Token,
        kind: NameKind,
        meta: Option<FunctionMeta>,
    ) -> Result<(), Diagnostic> {
        if self.current_scope().contains_key(&name.lexeme) {
            return Err(self.error(
                format!("'{}' is already defined in this scope.", name.lexeme),
                name,
            ));
        }
        self.current_scope().insert(
            name.lexeme.clone(),
            NameInfo { state: NameState::Declared, kind, token: Some(name.clone()), meta },
        );
        Ok(())
    }

    fn transition(&mut self, name: &str, state: NameState) {
        if let Some(info) = self.current_scope().get_mut(name) {
            info.state = state;
        }
    }

    /// Finds the innermost scope defining `name` and returns its nesting
    /// level.
    fn resolve(&self, name: &Token) -> Result<usize, Diagnostic> {
        for level in (0..self.scopes.len()).rev() {
            if self.scopes[level].contains_key(&name.lexeme) {
                return Ok(level);
            }
        }
        Err(self.error("Undefined name.", name))
    }

    /// A read: promotes the resolved name to Used.
    fn mark_used(&mut self, name: &str, level: usize) {
        if let Some(info) = self.scopes[level].get_mut(name) {
            info.state = NameState::Used;
        }
    }

    fn function_meta(&self, name: &str) -> Option<FunctionMeta> {
        for scope in self.scopes.iter().rev() {
            if let Some(info) = scope.get(name) {
                return info.meta;
            }
        }
        None
    }

    fn error(&self, message: impl Into<String>, token: &Token) -> Diagnostic {
        Diagnostic::at_token(DiagnosticKind::CheckError, message, token, self.lines)
    }
}
