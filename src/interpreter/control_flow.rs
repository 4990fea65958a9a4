// File: src/interpreter/control_flow.rs
//
// Non-local control flow signals for the evaluator.
//
// `return`, `break`, `continue` and `throw` travel up the evaluation stack
// as the error arm of the evaluator's Result type until the construct that
// consumes them: loops eat Break/Continue, calls eat Return, `try` eats
// Throw. Runtime errors ride the same channel but are consumed by nothing
// and abort execution.

use crate::errors::Diagnostic;

use super::value::Value;

/// The error arm of every evaluator function.
#[derive(Debug)]
pub enum Signal {
    /// `break` — consumed by the innermost enclosing loop.
    Break,
    /// `continue` — consumed by the innermost enclosing loop.
    Continue,
    /// `return` with zero or more operand values — consumed by the
    /// enclosing call.
    Return(Vec<Value>),
    /// `throw` — consumed by the nearest enclosing `try`. `line` is the
    /// throw site when known; exceptions raised inside built-ins carry
    /// `None` and the call site fills it in.
    Throw { value: Value, line: Option<usize> },
    /// A runtime error. Never consumed; aborts execution.
    Error(Box<Diagnostic>),
}
