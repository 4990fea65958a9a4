// File: src/interpreter/mod.rs
//
// Tree-walking evaluator for the Skiff programming language.
//
// Statements execute for effect; expressions evaluate to values. Non-local
// control flow (break, continue, return, throw) and runtime errors travel
// through the error arm of the evaluator's Result type as Signal values,
// each consumed exactly where the language defines: loops consume
// Break/Continue, calls consume Return, `try` consumes Throw.
//
// Name lookup is level-addressed: the checker has already resolved every
// variable to the nesting level of its defining scope, so the evaluator
// walks parent pointers by level and never searches by name.

pub mod control_flow;
pub mod environment;
pub mod native_functions;
pub mod value;

use std::cell::RefCell;
use std::io::Write as _;
use std::rc::Rc;

use crate::ast::{Expr, LiteralValue, Stmt};
use crate::errors::{Diagnostic, DiagnosticKind};
use crate::lexer::{Token, TokenKind};

use control_flow::Signal;
use environment::Environment;
use value::{is_truthy, values_equal, Callable, Function, Value};

pub struct Interpreter {
    env: Rc<RefCell<Environment>>,
    globals: Rc<RefCell<Environment>>,
    lines: Vec<String>,
    output: Option<Rc<RefCell<Vec<u8>>>>,
}

impl Interpreter {
    /// Creates an interpreter with the built-ins registered in the global
    /// scope. `lines` is the scanned source, kept for runtime diagnostics.
    pub fn new(lines: Vec<String>) -> Self {
        let globals = Rc::new(RefCell::new(Environment::new()));
        for native in native_functions::all() {
            // Registry names are unique; a duplicate cannot occur here.
            let _ = globals.borrow_mut().define(native.name, Value::Native(native));
        }
        Interpreter { env: Rc::clone(&globals), globals, lines, output: None }
    }

    /// Redirects print/println/input-prompt output into a buffer; used by
    /// the test suites.
    pub fn set_output(&mut self, buffer: Rc<RefCell<Vec<u8>>>) {
        self.output = Some(buffer);
    }

    pub(crate) fn write_output(&mut self, text: &str) {
        if let Some(out) = &self.output {
            out.borrow_mut().extend_from_slice(text.as_bytes());
        } else {
            print!("{}", text);
            let _ = std::io::stdout().flush();
        }
    }

    /// Runs a checked program: executes the top-level declarations, then
    /// looks up and calls `main`.
    pub fn run(&mut self, program: &[Stmt]) -> Result<(), Diagnostic> {
        for stmt in program {
            if let Err(signal) = self.execute(stmt) {
                return Err(self.signal_to_error(signal));
            }
        }

        let main = self.globals.borrow().get_local("main");
        let Some(Value::Function(main)) = main else {
            return Err(Diagnostic::bare(DiagnosticKind::RuntimeError, "No main function."));
        };
        if !main.parameters.is_empty() {
            return Err(Diagnostic::bare(DiagnosticKind::RuntimeError, "No main function."));
        }

        match main.call(self, Vec::new()) {
            Ok(_) => Ok(()),
            Err(signal) => Err(self.signal_to_error(signal)),
        }
    }

    /// Converts a signal escaping the program into a reportable error. For
    /// checked programs only Throw and Error can reach this point.
    fn signal_to_error(&self, signal: Signal) -> Diagnostic {
        match signal {
            Signal::Error(diag) => *diag,
            Signal::Throw { value, line } => {
                let message = format!("Uncaught exception: {}", value);
                match line {
                    Some(line) => {
                        let mut diag =
                            Diagnostic::new(DiagnosticKind::RuntimeError, message, line, 0);
                        if let Some(source) = self.lines.get(line) {
                            diag = diag.with_source(source.clone());
                        }
                        diag
                    }
                    None => Diagnostic::bare(DiagnosticKind::RuntimeError, message),
                }
            }
            Signal::Break => Diagnostic::bare(
                DiagnosticKind::RuntimeError,
                "Cannot use 'break' outside of a loop.",
            ),
            Signal::Continue => Diagnostic::bare(
                DiagnosticKind::RuntimeError,
                "Cannot use 'continue' outside of a loop.",
            ),
            Signal::Return(_) => {
                Diagnostic::bare(DiagnosticKind::RuntimeError, "Cannot return from the top level.")
            }
        }
    }

    // --- Statements ---

    pub(crate) fn execute(&mut self, stmt: &Stmt) -> Result<(), Signal> {
        match stmt {
            Stmt::Expression { expr } => {
                self.evaluate(expr)?;
                Ok(())
            }

            Stmt::VarDecl { names, initializer, operator } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Null,
                };
                match value {
                    Value::Multi(values) => {
                        if values.len() != names.len() {
                            return Err(self.assign_count_error(
                                values.len(),
                                names.len(),
                                operator,
                            ));
                        }
                        for (name, value) in names.iter().zip(values) {
                            self.define(name, value)?;
                        }
                        Ok(())
                    }
                    single => {
                        if names.len() != 1 {
                            return Err(self.assign_count_error(1, names.len(), operator));
                        }
                        self.define(&names[0], single)
                    }
                }
            }

            Stmt::FuncDecl { name, parameters, body, return_count, throws } => {
                let function = Value::Function(Rc::new(Function {
                    name: name.lexeme.clone(),
                    parameters: parameters.clone(),
                    body: Rc::new((**body).clone()),
                    closure: Rc::clone(&self.env),
                    return_count: *return_count,
                    throws: *throws,
                }));
                self.define(name, function)
            }

            Stmt::If { condition, body, else_body } => {
                let condition = self.evaluate(condition).and_then(|v| self.single(v))?;
                if is_truthy(&condition) {
                    self.execute(body)
                } else if let Some(else_body) = else_body {
                    self.execute(else_body)
                } else {
                    Ok(())
                }
            }

            Stmt::While { condition, body } => {
                loop {
                    let cond = self.evaluate(condition).and_then(|v| self.single(v))?;
                    if !is_truthy(&cond) {
                        break;
                    }
                    match self.execute(body) {
                        Ok(()) | Err(Signal::Continue) => {}
                        Err(Signal::Break) => break,
                        Err(other) => return Err(other),
                    }
                }
                Ok(())
            }

            Stmt::For { initializer, condition, increment, body } => {
                self.execute(initializer)?;
                loop {
                    let cond = self.evaluate(condition).and_then(|v| self.single(v))?;
                    if !is_truthy(&cond) {
                        break;
                    }
                    match self.execute(body) {
                        Ok(()) | Err(Signal::Continue) => {}
                        Err(Signal::Break) => break,
                        Err(other) => return Err(other),
                    }
                    self.evaluate(increment)?;
                }
                Ok(())
            }

            Stmt::LoopControl { keyword } => {
                if keyword.kind == TokenKind::Break {
                    Err(Signal::Break)
                } else {
                    Err(Signal::Continue)
                }
            }

            Stmt::Return { keyword, values } => {
                let mut collected = Vec::with_capacity(values.len());
                for value in values {
                    let value = self.evaluate(value)?;
                    collected.push(self.single_at(value, keyword)?);
                }
                Err(Signal::Return(collected))
            }

            Stmt::Throw { keyword, value } => {
                let value = self.evaluate(value)?;
                let value = self.single_at(value, keyword)?;
                Err(Signal::Throw { value, line: Some(keyword.line) })
            }

            Stmt::Try { body, catch_body, exception_name } => match self.execute(body) {
                Err(Signal::Throw { value, .. }) => {
                    self.begin_scope();
                    if let Some(name) = exception_name {
                        let _ = self.env.borrow_mut().define(&name.lexeme, value);
                    }
                    let result = self.execute(catch_body);
                    self.end_scope();
                    result
                }
                other => other,
            },

            Stmt::Block { statements } => {
                self.begin_scope();
                let mut result = Ok(());
                for statement in statements {
                    result = self.execute(statement);
                    if result.is_err() {
                        break;
                    }
                }
                self.end_scope();
                result
            }
        }
    }

    // --- Expressions ---

    pub(crate) fn evaluate(&mut self, expr: &Expr) -> Result<Value, Signal> {
        match expr {
            Expr::Literal { value } => Ok(match value {
                LiteralValue::Null => Value::Null,
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::str(s.clone()),
                LiteralValue::Bool(b) => Value::Bool(*b),
            }),

            Expr::Variable { name, nesting_level } => {
                Ok(self.env.borrow().get(&name.lexeme, *nesting_level))
            }

            Expr::Grouping { expr } => self.evaluate(expr),

            Expr::List { values } => {
                let mut elements = Vec::with_capacity(values.len());
                for value in values {
                    let value = self.evaluate(value)?;
                    elements.push(self.single(value)?);
                }
                Ok(Value::list(elements))
            }

            Expr::Subscript { object, index, open_bracket } => {
                let list = self.subscript_target(object, open_bracket)?;
                let index = self.subscript_index(index, &list, open_bracket)?;
                let element = list.borrow()[index].clone();
                Ok(element)
            }

            Expr::Unary { operator, right } => {
                let right = self.evaluate(right)?;
                let right = self.single_at(right, operator)?;
                match operator.kind {
                    TokenKind::Minus => match right {
                        Value::Number(n) => Ok(Value::Number(-n)),
                        _ => Err(self.error_at("Operand must be a number.", operator)),
                    },
                    TokenKind::Bang => Ok(Value::Bool(!is_truthy(&right))),
                    _ => Err(self.error_at(
                        format!("Invalid unary operator '{}'.", operator.lexeme),
                        operator,
                    )),
                }
            }

            Expr::Binary { operator, left, right } => {
                let left = self.evaluate(left)?;
                let left = self.single_at(left, operator)?;
                let right = self.evaluate(right)?;
                let right = self.single_at(right, operator)?;
                self.binary(operator, left, right)
            }

            Expr::Logical { operator, left, right } => {
                let left = self.evaluate(left)?;
                let left = self.single_at(left, operator)?;

                if operator.kind == TokenKind::XorXor {
                    let right = self.evaluate(right)?;
                    let right = self.single_at(right, operator)?;
                    return Ok(Value::Bool(is_truthy(&left) != is_truthy(&right)));
                }

                if operator.kind == TokenKind::OrOr && is_truthy(&left) {
                    return Ok(Value::Bool(true));
                }
                if operator.kind == TokenKind::AndAnd && !is_truthy(&left) {
                    return Ok(Value::Bool(false));
                }

                let right = self.evaluate(right)?;
                let right = self.single_at(right, operator)?;
                Ok(Value::Bool(is_truthy(&right)))
            }

            Expr::Ternary { left, operator1, operator2, center, right } => {
                if operator1.kind != TokenKind::QuestionMark || operator2.kind != TokenKind::Colon {
                    return Err(self.error_at("Invalid ternary operator.", operator1));
                }
                let condition = self.evaluate(left)?;
                let condition = self.single_at(condition, operator1)?;
                let branch = if is_truthy(&condition) { center } else { right };
                let value = self.evaluate(branch)?;
                self.single_at(value, operator1)
            }

            Expr::Assign { operator, assignees, value } => {
                let rhs = self.evaluate(value)?;
                match rhs {
                    Value::Multi(values) => {
                        if values.len() != assignees.len() {
                            return Err(self.assign_count_error(
                                values.len(),
                                assignees.len(),
                                operator,
                            ));
                        }
                        for (assignee, value) in assignees.iter().zip(values.iter()) {
                            self.assign_to(assignee, value.clone(), operator)?;
                        }
                        Ok(Value::Multi(values))
                    }
                    single => {
                        if assignees.len() != 1 {
                            return Err(self.assign_count_error(1, assignees.len(), operator));
                        }
                        self.assign_to(&assignees[0], single.clone(), operator)?;
                        Ok(single)
                    }
                }
            }

            Expr::Call { callee, args, open_paren } => self.call(callee, args, open_paren),

            Expr::AnonymousFunction { parameters, body, return_count, throws, .. } => {
                Ok(Value::Function(Rc::new(Function {
                    name: "<anonymous>".to_string(),
                    parameters: parameters.clone(),
                    body: Rc::new((**body).clone()),
                    closure: Rc::clone(&self.env),
                    return_count: *return_count,
                    throws: *throws,
                })))
            }
        }
    }

    fn binary(&self, operator: &Token, left: Value, right: Value) -> Result<Value, Signal> {
        match operator.kind {
            TokenKind::Plus => match (&left, &right) {
                (Value::Number(l), Value::Number(r)) => Ok(Value::Number(l + r)),
                _ if matches!(left, Value::Str(_)) || matches!(right, Value::Str(_)) => {
                    Ok(Value::str(format!("{}{}", left, right)))
                }
                _ => Err(self.error_at(
                    "Operands must be either both numbers or at least one of them a string.",
                    operator,
                )),
            },

            TokenKind::Minus
            | TokenKind::Asterisk
            | TokenKind::AsteriskAsterisk
            | TokenKind::Slash
            | TokenKind::Percent => match (&left, &right) {
                (Value::Number(l), Value::Number(r)) => Ok(Value::Number(match operator.kind {
                    TokenKind::Minus => l - r,
                    TokenKind::Asterisk => l * r,
                    TokenKind::AsteriskAsterisk => l.powf(*r),
                    // IEEE semantics: division by zero yields ±Inf/NaN.
                    TokenKind::Slash => l / r,
                    _ => l % r,
                })),
                _ => Err(self.error_at("Both operands must be numbers.", operator)),
            },

            TokenKind::EqualEqual => Ok(Value::Bool(values_equal(&left, &right))),
            TokenKind::BangEqual => Ok(Value::Bool(!values_equal(&left, &right))),

            TokenKind::Less | TokenKind::LessEqual | TokenKind::Greater
            | TokenKind::GreaterEqual => match (&left, &right) {
                (Value::Number(l), Value::Number(r)) => Ok(Value::Bool(match operator.kind {
                    TokenKind::Less => l < r,
                    TokenKind::LessEqual => l <= r,
                    TokenKind::Greater => l > r,
                    _ => l >= r,
                })),
                _ => Err(self.error_at("Both operands must be numbers.", operator)),
            },

            _ => Err(self.error_at(
                format!("Invalid binary operator '{}'.", operator.lexeme),
                operator,
            )),
        }
    }

    fn call(&mut self, callee: &Expr, args: &[Expr], open_paren: &Token) -> Result<Value, Signal> {
        let callee = self.evaluate(callee)?;
        let callee = self.single_at(callee, open_paren)?;

        let arity = match &callee {
            Value::Function(f) => f.argument_count(),
            Value::Native(n) => n.argument_count(),
            _ => return Err(self.error_at("Can only call functions.", open_paren)),
        };
        if arity >= 0 && arity as usize != args.len() {
            return Err(self.error_at(
                format!("Expected {} argument/s, got {}.", arity, args.len()),
                open_paren,
            ));
        }

        let mut arg_values = Vec::with_capacity(args.len());
        for arg in args {
            let value = self.evaluate(arg)?;
            arg_values.push(self.single_at(value, open_paren)?);
        }

        let result = match &callee {
            Value::Function(f) => Rc::clone(f).call(self, arg_values),
            Value::Native(n) => n.call(self, arg_values),
            _ => return Err(self.error_at("Can only call functions.", open_paren)),
        };

        match result {
            // Exceptions raised inside built-ins have no source position;
            // attribute them to the call site so try/catch and diagnostics
            // can point somewhere useful.
            Err(Signal::Throw { value, line: None }) => {
                Err(Signal::Throw { value, line: Some(open_paren.line) })
            }
            Err(Signal::Error(diag)) if diag.source_line.is_none() => {
                Err(self.error_at(diag.message, open_paren))
            }
            other => other,
        }
    }

    fn assign_to(
        &mut self,
        assignee: &Expr,
        value: Value,
        operator: &Token,
    ) -> Result<(), Signal> {
        match assignee {
            Expr::Variable { name, nesting_level } => {
                self.env.borrow_mut().assign(&name.lexeme, value, *nesting_level);
                Ok(())
            }
            Expr::Subscript { object, index, open_bracket } => {
                let list = self.subscript_target(object, open_bracket)?;
                let index = self.subscript_index(index, &list, open_bracket)?;
                list.borrow_mut()[index] = value;
                Ok(())
            }
            _ => Err(self.error_at("Can only assign to variables.", operator)),
        }
    }

    /// Evaluates the object of a subscript; it must be a list.
    fn subscript_target(
        &mut self,
        object: &Expr,
        open_bracket: &Token,
    ) -> Result<Rc<RefCell<Vec<Value>>>, Signal> {
        let object = self.evaluate(object)?;
        let object = self.single_at(object, open_bracket)?;
        match object {
            Value::List(list) => Ok(list),
            other => Err(self.error_at(
                format!("Wrong type. Expected 'List', got '{}'.", other.type_name()),
                open_bracket,
            )),
        }
    }

    /// Evaluates a subscript index; it must be a finite whole number inside
    /// the list's bounds.
    fn subscript_index(
        &mut self,
        index: &Expr,
        list: &Rc<RefCell<Vec<Value>>>,
        open_bracket: &Token,
    ) -> Result<usize, Signal> {
        let index = self.evaluate(index)?;
        let index = self.single_at(index, open_bracket)?;
        let n = match index {
            Value::Number(n) if n.is_finite() && n == n.trunc() => n,
            other => {
                return Err(self.error_at(
                    format!("Wrong type. Expected 'Integer', got '{}'.", other.type_name()),
                    open_bracket,
                ))
            }
        };
        if n < 0.0 || n as usize >= list.borrow().len() {
            return Err(self.error_at("List index out of bounds.", open_bracket));
        }
        Ok(n as usize)
    }

    // --- Helpers ---

    fn define(&mut self, name: &Token, value: Value) -> Result<(), Signal> {
        self.env.borrow_mut().define(&name.lexeme, value).map_err(|_| {
            self.error_at(
                format!("'{}' is already defined in this scope.", name.lexeme),
                name,
            )
        })
    }

    fn begin_scope(&mut self) {
        self.env = Rc::new(RefCell::new(Environment::with_parent(Rc::clone(&self.env))));
    }

    fn end_scope(&mut self) {
        let parent = self.env.borrow().parent();
        if let Some(parent) = parent {
            self.env = parent;
        }
    }

    fn single(&self, value: Value) -> Result<Value, Signal> {
        match value {
            Value::Multi(_) => Err(Signal::Error(Box::new(Diagnostic::bare(
                DiagnosticKind::RuntimeError,
                "Multiple values where a single value was expected.",
            )))),
            value => Ok(value),
        }
    }

    fn single_at(&self, value: Value, token: &Token) -> Result<Value, Signal> {
        match value {
            Value::Multi(_) => {
                Err(self.error_at("Multiple values where a single value was expected.", token))
            }
            value => Ok(value),
        }
    }

    fn assign_count_error(&self, provided: usize, wanted: usize, token: &Token) -> Signal {
        self.error_at(
            format!("Cannot assign {} value/s to {} variable/s.", provided, wanted),
            token,
        )
    }

    fn error_at(&self, message: impl Into<String>, token: &Token) -> Signal {
        Signal::Error(Box::new(Diagnostic::at_token(
            DiagnosticKind::RuntimeError,
            message,
            token,
            &self.lines,
        )))
    }
}

impl Callable for Function {
    fn argument_count(&self) -> i32 {
        self.parameters.len() as i32
    }

    fn return_value_count(&self) -> usize {
        self.return_count
    }

    fn throws(&self) -> bool {
        self.throws
    }

    /// Switches to the closure environment, binds parameters in a fresh
    /// scope, runs the body and repackages a Return signal into null, a
    /// single value, or a multi-value carrier.
    fn call(&self, interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Signal> {
        let previous = Rc::clone(&interp.env);
        interp.env = Rc::new(RefCell::new(Environment::with_parent(Rc::clone(&self.closure))));
        for (parameter, arg) in self.parameters.iter().zip(args) {
            let _ = interp.env.borrow_mut().define(parameter, arg);
        }

        let outcome = interp.execute(&self.body);
        interp.env = previous;

        match outcome {
            Ok(()) => Ok(Value::Null),
            Err(Signal::Return(mut values)) => Ok(match values.len() {
                0 => Value::Null,
                1 => values.swap_remove(0),
                _ => Value::Multi(values),
            }),
            Err(other) => Err(other),
        }
    }
}
