//! Value <-> text conversion: `Number`, `String`, `format`.

use super::def;
use crate::env::Environment;
use crate::error::{NumfuError, Result};
use crate::number::Number;
use crate::value::Value;
use std::rc::Rc;

pub fn register(env: &Rc<Environment>) {
    def(env, "Number", 1, false, |args| match &args[0] {
        Value::Number(n) => Ok(Value::Number(n.clone())),
        Value::String(s) => Number::parse(s)
            .map(Value::Number)
            .ok_or_else(|| NumfuError::value(format!("cannot parse a Number from {s:?}"))),
        other => Err(NumfuError::type_error(format!("cannot convert {} to Number", other.type_name()))),
    });

    def(env, "String", 1, false, |args| Ok(Value::String(crate::print::render_top_level(&args[0]))));

    def(env, "format", 1, true, |args| {
        let fmt = match &args[0] {
            Value::String(s) => s.clone(),
            other => return Err(NumfuError::type_error(format!("format() requires a String, got {}", other.type_name()))),
        };
        format_string(&fmt, &args[1..])
    });
}

fn format_string(fmt: &str, rest: &[Value]) -> Result<Value> {
    let mut out = String::new();
    let mut rest_iter = rest.iter();
    let mut chars = fmt.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '{' && chars.peek() == Some(&'}') {
            chars.next();
            match rest_iter.next() {
                Some(v) => out.push_str(&crate::print::render_top_level(v)),
                None => return Err(NumfuError::index("not enough arguments for format() placeholders")),
            }
        } else {
            out.push(c);
        }
    }
    if rest_iter.next().is_some() {
        return Err(NumfuError::index("too many arguments for format() placeholders"));
    }
    Ok(Value::String(out))
}
