// File: src/interpreter/native_functions/system.rs
//
// System built-ins: millis.

use std::time::{SystemTime, UNIX_EPOCH};

use super::{CallError, NativeFunction};
use crate::interpreter::value::Value;
use crate::interpreter::Interpreter;

pub const NATIVES: &[NativeFunction] =
    &[NativeFunction { name: "millis", arity: 0, return_count: 1, throws: false, func: millis }];

/// Unix time in milliseconds.
fn millis(_interp: &mut Interpreter, _args: &[Value]) -> Result<Value, CallError> {
    let ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as f64)
        .unwrap_or(0.0);
    Ok(Value::Number(ms))
}
