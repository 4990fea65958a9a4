// File: src/interpreter/native_functions/mod.rs
//
// Native (built-in) functions, grouped by category. Every built-in is
// declared once in a static table carrying its name, arity (-1 means
// variadic), declared return value count and throws flag; the checker
// reads the metadata, the evaluator dispatches through the same table.

pub mod collections;
pub mod filesystem;
pub mod io;
pub mod math;
pub mod strings;
pub mod system;
pub mod type_ops;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use once_cell::sync::Lazy;

use crate::errors::{Diagnostic, DiagnosticKind};

use super::control_flow::Signal;
use super::value::{Callable, Value};
use super::Interpreter;

/// How a built-in call went wrong.
///
/// `Failure` becomes a runtime error at the call site and aborts execution;
/// `Exception` becomes a Throw signal, so `try`/`catch` can recover from it.
/// Only built-ins declared with `throws: true` raise exceptions.
#[derive(Debug)]
pub enum CallError {
    Failure(String),
    Exception(String),
}

/// A host built-in: metadata plus the implementation.
pub struct NativeFunction {
    pub name: &'static str,
    pub arity: i32,
    pub return_count: usize,
    pub throws: bool,
    pub func: fn(&mut Interpreter, &[Value]) -> Result<Value, CallError>,
}

impl Callable for NativeFunction {
    fn argument_count(&self) -> i32 {
        self.arity
    }

    fn return_value_count(&self) -> usize {
        self.return_count
    }

    fn throws(&self) -> bool {
        self.throws
    }

    fn call(&self, interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Signal> {
        match (self.func)(interp, &args) {
            Ok(value) => Ok(value),
            Err(CallError::Exception(message)) => {
                Err(Signal::Throw { value: Value::str(message), line: None })
            }
            Err(CallError::Failure(message)) => Err(Signal::Error(Box::new(Diagnostic::bare(
                DiagnosticKind::RuntimeError,
                message,
            )))),
        }
    }
}

impl std::fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "NativeFunction({})", self.name)
    }
}

/// The canonical built-in table, keyed by name and built once from the
/// category modules. The checker pre-registers metadata from it and the
/// evaluator binds the global scope from it, both through [`all`].
static REGISTRY: Lazy<HashMap<&'static str, &'static NativeFunction>> = Lazy::new(|| {
    let mut map = HashMap::new();
    let natives = io::NATIVES
        .iter()
        .chain(system::NATIVES.iter())
        .chain(type_ops::NATIVES.iter())
        .chain(collections::NATIVES.iter())
        .chain(strings::NATIVES.iter())
        .chain(math::NATIVES.iter())
        .chain(filesystem::NATIVES.iter());
    for native in natives {
        map.insert(native.name, native);
    }
    map
});

/// Every registered built-in.
pub fn all() -> impl Iterator<Item = &'static NativeFunction> {
    REGISTRY.values().copied()
}

// --- Shared argument helpers ---

pub(crate) fn type_error(value: &Value, expected: &str) -> CallError {
    CallError::Failure(format!(
        "Wrong type. Expected '{}', got '{}'.",
        expected,
        value.type_name()
    ))
}

/// The string form of a value, as used by `toString`, string
/// concatenation and the file built-ins.
pub(crate) fn text(value: &Value) -> String {
    value.to_string()
}

pub(crate) fn number_arg(args: &[Value], index: usize) -> Result<f64, CallError> {
    match &args[index] {
        Value::Number(n) => Ok(*n),
        other => Err(type_error(other, "Number")),
    }
}

/// A finite whole number.
pub(crate) fn integer_arg(args: &[Value], index: usize) -> Result<f64, CallError> {
    match &args[index] {
        Value::Number(n) if n.is_finite() && *n == n.trunc() => Ok(*n),
        other => Err(type_error(other, "Integer")),
    }
}

pub(crate) fn list_arg(args: &[Value], index: usize) -> Result<Rc<RefCell<Vec<Value>>>, CallError> {
    match &args[index] {
        Value::List(l) => Ok(l.clone()),
        other => Err(type_error(other, "List")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn by_name(name: &str) -> &'static NativeFunction {
        all().find(|native| native.name == name)
            .unwrap_or_else(|| panic!("missing builtin '{}'", name))
    }

    #[test]
    fn test_registry_contains_every_catalogued_builtin() {
        let expected = [
            "print",
            "println",
            "input",
            "millis",
            "toString",
            "toNumber",
            "toBoolean",
            "len",
            "append",
            "concat",
            "remove",
            "fileExists",
            "readFileText",
            "writeFileText",
            "appendFileText",
            "deleteFile",
            "listFiles",
            "toLower",
            "toUpper",
            "contains",
            "indexOf",
            "trim",
            "replace",
            "split",
            "join",
            "random",
            "randomInt",
            "min",
            "max",
            "floor",
            "ceil",
            "round",
            "sqrt",
        ];
        for name in expected {
            assert!(all().any(|native| native.name == name), "missing builtin '{}'", name);
        }
        assert_eq!(all().count(), expected.len());
    }

    #[test]
    fn test_registry_metadata_matches_catalogue() {
        let print = by_name("print");
        assert_eq!((print.arity, print.return_count, print.throws), (-1, 0, false));

        let to_number = by_name("toNumber");
        assert_eq!((to_number.arity, to_number.return_count, to_number.throws), (1, 1, true));

        let write_file = by_name("writeFileText");
        assert_eq!((write_file.arity, write_file.return_count, write_file.throws), (2, 0, true));

        let random_int = by_name("randomInt");
        assert_eq!((random_int.arity, random_int.return_count, random_int.throws), (2, 1, false));
    }

    #[test]
    fn test_type_error_wording() {
        let err = type_error(&Value::Number(1.5), "List");
        match err {
            CallError::Failure(message) => {
                assert_eq!(message, "Wrong type. Expected 'List', got 'Float'.");
            }
            other => panic!("expected Failure, got {:?}", other),
        }
    }
}
