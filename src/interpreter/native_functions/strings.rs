// File: src/interpreter/native_functions/strings.rs
//
// String built-ins: toLower, toUpper, contains, indexOf, trim, replace,
// split, join. contains, indexOf, replace and split are polymorphic: given
// a list first argument they operate on elements instead of characters.

use super::{text, CallError, NativeFunction};
use crate::interpreter::value::{values_equal, Value};
use crate::interpreter::Interpreter;

pub const NATIVES: &[NativeFunction] = &[
    NativeFunction { name: "toLower", arity: 1, return_count: 1, throws: false, func: to_lower },
    NativeFunction { name: "toUpper", arity: 1, return_count: 1, throws: false, func: to_upper },
    NativeFunction { name: "contains", arity: 2, return_count: 1, throws: false, func: contains },
    NativeFunction { name: "indexOf", arity: 2, return_count: 1, throws: false, func: index_of },
    NativeFunction { name: "trim", arity: 1, return_count: 1, throws: false, func: trim },
    NativeFunction { name: "replace", arity: 3, return_count: 1, throws: false, func: replace },
    NativeFunction { name: "split", arity: 2, return_count: 1, throws: false, func: split },
    NativeFunction { name: "join", arity: 2, return_count: 1, throws: false, func: join },
];

fn to_lower(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, CallError> {
    Ok(Value::str(text(&args[0]).to_lowercase()))
}

fn to_upper(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, CallError> {
    Ok(Value::str(text(&args[0]).to_uppercase()))
}

fn contains(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, CallError> {
    if let Value::List(l) = &args[0] {
        let found = l.borrow().iter().any(|item| values_equal(&args[1], item));
        return Ok(Value::Bool(found));
    }
    Ok(Value::Bool(text(&args[0]).contains(&text(&args[1]))))
}

fn index_of(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, CallError> {
    if let Value::List(l) = &args[0] {
        let index = l
            .borrow()
            .iter()
            .position(|item| values_equal(&args[1], item))
            .map(|i| i as f64)
            .unwrap_or(-1.0);
        return Ok(Value::Number(index));
    }
    let haystack = text(&args[0]);
    let needle = text(&args[1]);
    let index = haystack.find(&needle).map(|i| i as f64).unwrap_or(-1.0);
    Ok(Value::Number(index))
}

fn trim(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, CallError> {
    Ok(Value::str(text(&args[0]).trim().to_string()))
}

/// On a list, replaces matching elements in place and returns the list; on
/// a string, returns a copy with every occurrence replaced.
fn replace(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, CallError> {
    if let Value::List(l) = &args[0] {
        for item in l.borrow_mut().iter_mut() {
            if values_equal(&args[1], item) {
                *item = args[2].clone();
            }
        }
        return Ok(args[0].clone());
    }
    let subject = text(&args[0]);
    let old = text(&args[1]);
    let new = text(&args[2]);
    Ok(Value::str(subject.replace(&old, &new)))
}

fn split(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, CallError> {
    if let Value::List(l) = &args[0] {
        let items = l.borrow();
        let mut segments = Vec::new();
        let mut segment_start = 0;
        for (index, item) in items.iter().enumerate() {
            if values_equal(&args[1], item) {
                segments.push(Value::list(items[segment_start..index].to_vec()));
                segment_start = index + 1;
            }
        }
        segments.push(Value::list(items[segment_start..].to_vec()));
        return Ok(Value::list(segments));
    }

    let subject = text(&args[0]);
    let separator = text(&args[1]);
    let parts: Vec<Value> = if separator.is_empty() {
        subject.chars().map(|c| Value::str(c.to_string())).collect()
    } else {
        subject.split(&separator).map(Value::str).collect()
    };
    Ok(Value::list(parts))
}

/// Joins list elements with a separator; a non-list first argument is
/// returned unchanged.
fn join(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, CallError> {
    let Value::List(l) = &args[0] else {
        return Ok(args[0].clone());
    };
    let separator = text(&args[1]);
    let parts: Vec<String> = l.borrow().iter().map(text).collect();
    Ok(Value::str(parts.join(&separator)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interp() -> Interpreter {
        Interpreter::new(Vec::new())
    }

    fn as_str(value: Value) -> String {
        match value {
            Value::Str(s) => s.as_ref().clone(),
            other => panic!("expected string, got {:?}", other),
        }
    }

    #[test]
    fn test_case_conversions_stringify_non_strings() {
        let mut i = interp();
        assert_eq!(as_str(to_upper(&mut i, &[Value::str("abc")]).expect("upper")), "ABC");
        assert_eq!(as_str(to_lower(&mut i, &[Value::Bool(true)]).expect("lower")), "true");
    }

    #[test]
    fn test_contains_is_polymorphic() {
        let mut i = interp();
        let list = Value::list(vec![Value::Number(1.0), Value::Number(2.0)]);
        assert!(matches!(
            contains(&mut i, &[list.clone(), Value::Number(2.0)]).expect("list"),
            Value::Bool(true)
        ));
        assert!(matches!(
            contains(&mut i, &[list, Value::Number(3.0)]).expect("list"),
            Value::Bool(false)
        ));
        assert!(matches!(
            contains(&mut i, &[Value::str("hello"), Value::str("ell")]).expect("string"),
            Value::Bool(true)
        ));
    }

    #[test]
    fn test_index_of_returns_minus_one_when_missing() {
        let mut i = interp();
        assert!(matches!(
            index_of(&mut i, &[Value::str("hello"), Value::str("z")]).expect("string"),
            Value::Number(n) if n == -1.0
        ));
        let list = Value::list(vec![Value::str("a"), Value::str("b")]);
        assert!(matches!(
            index_of(&mut i, &[list, Value::str("b")]).expect("list"),
            Value::Number(n) if n == 1.0
        ));
    }

    #[test]
    fn test_replace_mutates_lists_in_place() {
        let mut i = interp();
        let list = Value::list(vec![Value::Number(1.0), Value::Number(2.0), Value::Number(1.0)]);
        let result =
            replace(&mut i, &[list.clone(), Value::Number(1.0), Value::Number(9.0)]).expect("ok");
        assert!(values_equal(&list, &result));
        let Value::List(l) = list else { unreachable!() };
        assert!(matches!(l.borrow()[0], Value::Number(n) if n == 9.0));
        assert!(matches!(l.borrow()[2], Value::Number(n) if n == 9.0));
    }

    #[test]
    fn test_split_string_and_list() {
        let mut i = interp();
        let result = split(&mut i, &[Value::str("a,b,c"), Value::str(",")]).expect("string");
        assert_eq!(text(&result), "[a,b,c]");

        let list = Value::list(vec![
            Value::Number(1.0),
            Value::Number(0.0),
            Value::Number(2.0),
            Value::Number(0.0),
            Value::Number(3.0),
        ]);
        let result = split(&mut i, &[list, Value::Number(0.0)]).expect("list");
        assert_eq!(text(&result), "[[1],[2],[3]]");
    }

    #[test]
    fn test_join_passes_non_lists_through() {
        let mut i = interp();
        let result = join(&mut i, &[Value::Number(5.0), Value::str(",")]).expect("ok");
        assert!(matches!(result, Value::Number(n) if n == 5.0));

        let list = Value::list(vec![Value::str("a"), Value::Number(1.0)]);
        let result = join(&mut i, &[list, Value::str("-")]).expect("ok");
        assert_eq!(as_str(result), "a-1");
    }
}
