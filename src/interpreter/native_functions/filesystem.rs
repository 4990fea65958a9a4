// File: src/interpreter/native_functions/filesystem.rs
//
// Filesystem built-ins: fileExists, readFileText, writeFileText,
// appendFileText, deleteFile, listFiles.
//
// All failures surface as catchable exceptions carrying the OS error text;
// only fileExists never throws.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use super::{text, CallError, NativeFunction};
use crate::interpreter::value::Value;
use crate::interpreter::Interpreter;

pub const NATIVES: &[NativeFunction] = &[
    NativeFunction {
        name: "fileExists",
        arity: 1,
        return_count: 1,
        throws: false,
        func: file_exists,
    },
    NativeFunction {
        name: "readFileText",
        arity: 1,
        return_count: 1,
        throws: true,
        func: read_file_text,
    },
    NativeFunction {
        name: "writeFileText",
        arity: 2,
        return_count: 0,
        throws: true,
        func: write_file_text,
    },
    NativeFunction {
        name: "appendFileText",
        arity: 2,
        return_count: 0,
        throws: true,
        func: append_file_text,
    },
    NativeFunction { name: "deleteFile", arity: 1, return_count: 0, throws: true, func: delete_file },
    NativeFunction { name: "listFiles", arity: 1, return_count: 1, throws: true, func: list_files },
];

fn exception<T>(err: std::io::Error) -> Result<T, CallError> {
    Err(CallError::Exception(err.to_string()))
}

fn file_exists(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, CallError> {
    Ok(Value::Bool(Path::new(&text(&args[0])).exists()))
}

fn read_file_text(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, CallError> {
    match fs::read_to_string(text(&args[0])) {
        Ok(contents) => Ok(Value::str(contents)),
        Err(err) => exception(err),
    }
}

/// Creates missing parent directories before writing.
fn write_file_text(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, CallError> {
    let path = text(&args[0]);
    if let Some(parent) = Path::new(&path).parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(err) = fs::create_dir_all(parent) {
                return exception(err);
            }
        }
    }
    match fs::write(&path, text(&args[1])) {
        Ok(()) => Ok(Value::Null),
        Err(err) => exception(err),
    }
}

/// Appends to an existing file; a missing file is an exception, not a
/// create.
fn append_file_text(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, CallError> {
    let mut file = match OpenOptions::new().append(true).open(text(&args[0])) {
        Ok(file) => file,
        Err(err) => return exception(err),
    };
    match file.write_all(text(&args[1]).as_bytes()) {
        Ok(()) => Ok(Value::Null),
        Err(err) => exception(err),
    }
}

fn delete_file(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, CallError> {
    match fs::remove_file(text(&args[0])) {
        Ok(()) => Ok(Value::Null),
        Err(err) => exception(err),
    }
}

fn list_files(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, CallError> {
    let entries = match fs::read_dir(text(&args[0])) {
        Ok(entries) => entries,
        Err(err) => return exception(err),
    };
    let mut names = Vec::new();
    for entry in entries {
        match entry {
            Ok(entry) => names.push(Value::str(entry.file_name().to_string_lossy().to_string())),
            Err(err) => return exception(err),
        }
    }
    Ok(Value::list(names))
}
