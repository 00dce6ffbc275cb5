//! List/string structural operations: `length`, `slice`, `set`, `reverse`,
//! `sort` (spec §4.6, §8).

use super::def;
use crate::env::Environment;
use crate::error::{NumfuError, Result};
use crate::number::Number;
use crate::value::Value;
use std::cmp::Ordering;
use std::rc::Rc;

fn as_index(v: &Value) -> Result<i64> {
    match v {
        Value::Number(n) if n.is_finite() => Ok(n.to_f64() as i64),
        other => Err(NumfuError::type_error(format!("expected an integer index, got {}", other.type_name()))),
    }
}

fn normalize(len: usize, i: i64) -> Option<usize> {
    let idx = if i < 0 { i + len as i64 } else { i };
    (idx >= 0 && (idx as usize) < len).then_some(idx as usize)
}

pub fn register(env: &Rc<Environment>) {
    def(env, "length", 1, false, |args| match &args[0] {
        Value::String(s) => Ok(Value::Number(Number::from_i64(s.chars().count() as i64))),
        Value::List(items) => Ok(Value::Number(Number::from_i64(items.len() as i64))),
        other => Err(NumfuError::type_error(format!("length() requires a String or List, got {}", other.type_name()))),
    });

    def(env, "slice", 3, false, |args| {
        let start_raw = as_index(&args[1])?;
        let end_raw = as_index(&args[2])?;
        match &args[0] {
            Value::List(items) => {
                let (start, end) = bounds(items.len(), start_raw, end_raw);
                Ok(Value::List(Rc::new(slice_range(items, start, end))))
            }
            Value::String(s) => {
                let chars: Vec<char> = s.chars().collect();
                let (start, end) = bounds(chars.len(), start_raw, end_raw);
                let out: String = slice_range(&chars, start, end).into_iter().collect();
                Ok(Value::String(out))
            }
            other => Err(NumfuError::type_error(format!("slice() requires a String or List, got {}", other.type_name()))),
        }
    });

    def(env, "set", 3, false, |args| match &args[0] {
        Value::List(items) => {
            let i = as_index(&args[1])?;
            match normalize(items.len(), i) {
                Some(idx) => {
                    let mut out = (**items).clone();
                    out[idx] = args[2].clone();
                    Ok(Value::List(Rc::new(out)))
                }
                None => Err(NumfuError::index(format!("list index {i} out of range"))),
            }
        }
        Value::String(s) => {
            let i = as_index(&args[1])?;
            let replacement = match &args[2] {
                Value::String(r) if r.chars().count() == 1 => r.clone(),
                _ => return Err(NumfuError::value("set() on a String requires a single-character String")),
            };
            let mut chars: Vec<char> = s.chars().collect();
            match normalize(chars.len(), i) {
                Some(idx) => {
                    chars[idx] = replacement.chars().next().unwrap();
                    Ok(Value::String(chars.into_iter().collect()))
                }
                None => Err(NumfuError::index(format!("string index {i} out of range"))),
            }
        }
        other => Err(NumfuError::type_error(format!("set() requires a String or List, got {}", other.type_name()))),
    });

    def(env, "reverse", 1, false, |args| match &args[0] {
        Value::List(items) => {
            let mut out = (**items).clone();
            out.reverse();
            Ok(Value::List(Rc::new(out)))
        }
        Value::String(s) => Ok(Value::String(s.chars().rev().collect())),
        other => Err(NumfuError::type_error(format!("reverse() requires a String or List, got {}", other.type_name()))),
    });

    def(env, "sort", 1, false, |args| match &args[0] {
        Value::List(items) => {
            let mut out = (**items).clone();
            sort_values(&mut out)?;
            Ok(Value::List(Rc::new(out)))
        }
        other => Err(NumfuError::type_error(format!("sort() requires a List, got {}", other.type_name()))),
    });
}

fn bounds(length: usize, start_raw: i64, end_raw: i64) -> (usize, i64) {
    let start = start_raw.max(0).min(length as i64) as usize;
    let end = if end_raw < 0 {
        (length as i64 - 1) + end_raw + 1
    } else {
        end_raw
    };
    (start, end)
}

fn slice_range<T: Clone>(items: &[T], start: usize, end: i64) -> Vec<T> {
    if end < start as i64 || start >= items.len() {
        return Vec::new();
    }
    let end_idx = end.min(items.len() as i64 - 1) as usize;
    items[start..=end_idx].to_vec()
}

fn sort_values(items: &mut [Value]) -> Result<()> {
    let all_numbers = items.iter().all(|v| matches!(v, Value::Number(_)));
    let all_strings = items.iter().all(|v| matches!(v, Value::String(_)));
    if all_numbers {
        items.sort_by(|a, b| {
            let (Value::Number(x), Value::Number(y)) = (a, b) else { unreachable!() };
            if x.lt(y) {
                Ordering::Less
            } else if x.gt(y) {
                Ordering::Greater
            } else {
                Ordering::Equal
            }
        });
        Ok(())
    } else if all_strings {
        items.sort_by(|a, b| {
            let (Value::String(x), Value::String(y)) = (a, b) else { unreachable!() };
            x.cmp(y)
        });
        Ok(())
    } else {
        Err(NumfuError::type_error("sort() requires a list of all Numbers or all Strings"))
    }
}
