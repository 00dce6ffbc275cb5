//! Type predicates.

use super::def;
use crate::env::Environment;
use crate::value::Value;
use std::rc::Rc;

pub fn register(env: &Rc<Environment>) {
    def(env, "number?", 1, false, |args| Ok(Value::Boolean(matches!(args[0], Value::Number(_)))));
    def(env, "string?", 1, false, |args| Ok(Value::Boolean(matches!(args[0], Value::String(_)))));
    def(env, "boolean?", 1, false, |args| Ok(Value::Boolean(matches!(args[0], Value::Boolean(_)))));
    def(env, "list?", 1, false, |args| Ok(Value::Boolean(matches!(args[0], Value::List(_)))));
    def(env, "function?", 1, false, |args| Ok(Value::Boolean(args[0].is_callable())));
    def(env, "unit?", 1, false, |args| Ok(Value::Boolean(matches!(args[0], Value::Unit))));
}
