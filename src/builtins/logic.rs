//! Unary `!`. `&&`/`||` are dedicated short-circuiting AST nodes, not
//! builtins (spec §4.4) — only negation needs the curry/placeholder
//! protocol as a call.

use super::def;
use crate::env::Environment;
use crate::eval::truthy;
use crate::value::Value;
use std::rc::Rc;

pub fn register(env: &Rc<Environment>) {
    def(env, "!", 1, false, |args| Ok(Value::Boolean(!truthy(&args[0]))));
}
