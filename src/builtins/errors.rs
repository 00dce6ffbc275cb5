//! `error(msg[, tag])` and `assert(cond)` (spec §7, §8).

use super::def;
use crate::env::Environment;
use crate::error::NumfuError;
use crate::eval::truthy;
use crate::value::Value;
use std::rc::Rc;

pub fn register(env: &Rc<Environment>) {
    def(env, "error", 1, true, |args| {
        let msg = match &args[0] {
            Value::String(s) => s.clone(),
            other => crate::print::render_top_level(other),
        };
        match args.get(1) {
            None => Err(NumfuError::runtime(msg)),
            Some(Value::String(tag)) => Err(NumfuError::custom(tag.clone(), msg)),
            Some(other) => Err(NumfuError::type_error(format!("error() tag must be a String, got {}", other.type_name()))),
        }
    });

    def(env, "assert", 1, false, |args| {
        if truthy(&args[0]) {
            Ok(Value::Boolean(true))
        } else {
            Err(NumfuError::assertion("assertion failed"))
        }
    });
}
