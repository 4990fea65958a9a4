// File: src/interpreter/native_functions/math.rs
//
// Math built-ins: random, randomInt, min, max, floor, ceil, round, sqrt.

use rand::Rng;

use super::{integer_arg, number_arg, CallError, NativeFunction};
use crate::interpreter::value::Value;
use crate::interpreter::Interpreter;

pub const NATIVES: &[NativeFunction] = &[
    NativeFunction { name: "random", arity: 2, return_count: 1, throws: false, func: random },
    NativeFunction { name: "randomInt", arity: 2, return_count: 1, throws: false, func: random_int },
    NativeFunction { name: "min", arity: 2, return_count: 1, throws: false, func: min },
    NativeFunction { name: "max", arity: 2, return_count: 1, throws: false, func: max },
    NativeFunction { name: "floor", arity: 1, return_count: 1, throws: false, func: floor },
    NativeFunction { name: "ceil", arity: 1, return_count: 1, throws: false, func: ceil },
    NativeFunction { name: "round", arity: 1, return_count: 1, throws: false, func: round },
    NativeFunction { name: "sqrt", arity: 1, return_count: 1, throws: false, func: sqrt },
];

fn ordered_bounds(lo: f64, hi: f64) -> Result<(), CallError> {
    if lo > hi {
        return Err(CallError::Failure(
            "Second argument is less than the first argument.".to_string(),
        ));
    }
    Ok(())
}

fn random(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, CallError> {
    let lo = number_arg(args, 0)?;
    let hi = number_arg(args, 1)?;
    ordered_bounds(lo, hi)?;
    let r: f64 = rand::thread_rng().gen();
    Ok(Value::Number(r * (hi - lo) + lo))
}

/// Whole-number random value in `[lo, hi)`; the upper bound is exclusive
/// because the scaled value is truncated.
fn random_int(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, CallError> {
    let lo = integer_arg(args, 0)?;
    let hi = integer_arg(args, 1)?;
    ordered_bounds(lo, hi)?;
    let r: f64 = rand::thread_rng().gen();
    Ok(Value::Number((r * (hi - lo) + lo).trunc()))
}

fn min(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, CallError> {
    Ok(Value::Number(number_arg(args, 0)?.min(number_arg(args, 1)?)))
}

fn max(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, CallError> {
    Ok(Value::Number(number_arg(args, 0)?.max(number_arg(args, 1)?)))
}

fn floor(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, CallError> {
    Ok(Value::Number(number_arg(args, 0)?.floor()))
}

fn ceil(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, CallError> {
    Ok(Value::Number(number_arg(args, 0)?.ceil()))
}

fn round(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, CallError> {
    Ok(Value::Number(number_arg(args, 0)?.round()))
}

fn sqrt(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, CallError> {
    Ok(Value::Number(number_arg(args, 0)?.sqrt()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interp() -> Interpreter {
        Interpreter::new(Vec::new())
    }

    #[test]
    fn test_random_int_stays_in_half_open_range() {
        let mut i = interp();
        for _ in 0..100 {
            let value = random_int(&mut i, &[Value::Number(2.0), Value::Number(5.0)])
                .expect("should succeed");
            let Value::Number(n) = value else { panic!("expected number") };
            assert_eq!(n, n.trunc());
            assert!((2.0..5.0).contains(&n), "out of range: {}", n);
        }
    }

    #[test]
    fn test_random_rejects_reversed_bounds() {
        let mut i = interp();
        let err = random(&mut i, &[Value::Number(5.0), Value::Number(2.0)]).expect_err("reversed");
        assert!(matches!(
            err,
            CallError::Failure(message)
                if message == "Second argument is less than the first argument."
        ));
    }

    #[test]
    fn test_random_int_rejects_fractional_bounds() {
        let mut i = interp();
        let err =
            random_int(&mut i, &[Value::Number(0.5), Value::Number(2.0)]).expect_err("fractional");
        assert!(matches!(err, CallError::Failure(message) if message.contains("Expected 'Integer'")));
    }

    #[test]
    fn test_rounding_family() {
        let mut i = interp();
        assert!(matches!(
            floor(&mut i, &[Value::Number(1.9)]).expect("floor"),
            Value::Number(n) if n == 1.0
        ));
        assert!(matches!(
            ceil(&mut i, &[Value::Number(1.1)]).expect("ceil"),
            Value::Number(n) if n == 2.0
        ));
        assert!(matches!(
            round(&mut i, &[Value::Number(2.5)]).expect("round"),
            Value::Number(n) if n == 3.0
        ));
        assert!(matches!(
            sqrt(&mut i, &[Value::Number(9.0)]).expect("sqrt"),
            Value::Number(n) if n == 3.0
        ));
    }

    #[test]
    fn test_min_max_require_numbers() {
        let mut i = interp();
        assert!(matches!(
            min(&mut i, &[Value::Number(1.0), Value::Number(2.0)]).expect("min"),
            Value::Number(n) if n == 1.0
        ));
        assert!(max(&mut i, &[Value::str("1"), Value::Number(2.0)]).is_err());
    }
}
