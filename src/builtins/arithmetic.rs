//! Arithmetic operators, desugared at parse time into calls against these
//! names (spec §9 "Operators as values"). Mixed-type rules per §4.6.

use super::def;
use crate::env::Environment;
use crate::error::{NumfuError, Result};
use crate::number::Number;
use crate::value::Value;
use std::rc::Rc;

fn as_nonneg_repeat_count(n: &Number) -> Result<usize> {
    if !n.is_finite() {
        return Err(NumfuError::type_error("repeat count must be a finite integer"));
    }
    let f = n.to_f64();
    if f.fract() != 0.0 || f < 0.0 {
        return Err(NumfuError::type_error("repeat count must be a non-negative integer"));
    }
    Ok(f as usize)
}

pub fn register(env: &Rc<Environment>) {
    def(env, "+", 2, false, |args| match (&args[0], &args[1]) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a.add(b))),
        (Value::String(a), Value::String(b)) => Ok(Value::String(format!("{a}{b}"))),
        (Value::List(a), Value::List(b)) => {
            let mut out = (**a).clone();
            out.extend(b.iter().cloned());
            Ok(Value::List(Rc::new(out)))
        }
        (a, b) => Err(NumfuError::type_error(format!(
            "'+' cannot combine {} and {}",
            a.type_name(),
            b.type_name()
        ))),
    });

    def(env, "-", 2, false, |args| match (&args[0], &args[1]) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a.sub(b))),
        (a, b) => Err(NumfuError::type_error(format!(
            "'-' requires two numbers, got {} and {}",
            a.type_name(),
            b.type_name()
        ))),
    });

    def(env, "*", 2, false, |args| match (&args[0], &args[1]) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a.mul(b))),
        (Value::String(s), Value::Number(n)) | (Value::Number(n), Value::String(s)) => {
            let count = as_nonneg_repeat_count(n)?;
            Ok(Value::String(s.repeat(count)))
        }
        (Value::List(items), Value::Number(n)) | (Value::Number(n), Value::List(items)) => {
            let count = as_nonneg_repeat_count(n)?;
            let mut out = Vec::with_capacity(items.len() * count);
            for _ in 0..count {
                out.extend(items.iter().cloned());
            }
            Ok(Value::List(Rc::new(out)))
        }
        (a, b) => Err(NumfuError::type_error(format!(
            "'*' cannot combine {} and {}",
            a.type_name(),
            b.type_name()
        ))),
    });

    def(env, "/", 2, false, |args| match (&args[0], &args[1]) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a.div(b))),
        (a, b) => Err(NumfuError::type_error(format!(
            "'/' requires two numbers, got {} and {}",
            a.type_name(),
            b.type_name()
        ))),
    });

    def(env, "%", 2, false, |args| match (&args[0], &args[1]) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a.rem(b))),
        (a, b) => Err(NumfuError::type_error(format!(
            "'%' requires two numbers, got {} and {}",
            a.type_name(),
            b.type_name()
        ))),
    });

    def(env, "^", 2, false, |args| match (&args[0], &args[1]) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a.pow(b))),
        (a, b) => Err(NumfuError::type_error(format!(
            "'^' requires two numbers, got {} and {}",
            a.type_name(),
            b.type_name()
        ))),
    });

    def(env, "sqrt", 1, false, |args| match &args[0] {
        Value::Number(n) => Ok(Value::Number(n.sqrt())),
        other => Err(NumfuError::type_error(format!("sqrt() requires a Number, got {}", other.type_name()))),
    });

    def(env, "floor", 1, false, |args| match &args[0] {
        Value::Number(n) => Ok(Value::Number(n.floor())),
        other => Err(NumfuError::type_error(format!("floor() requires a Number, got {}", other.type_name()))),
    });

    def(env, "abs", 1, false, |args| match &args[0] {
        Value::Number(n) => Ok(Value::Number(n.abs())),
        other => Err(NumfuError::type_error(format!("abs() requires a Number, got {}", other.type_name()))),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_repeat_requires_integer_count() {
        let env = Environment::new_top();
        register(&env);
        let f = env.get("*").unwrap();
        let Value::Builtin(b) = f else { panic!("not a builtin") };
        let err = (b.func)(vec![Value::String("ab".into()), Value::Number(Number::from_f64(1.5))]).unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::TypeError);
    }
}
