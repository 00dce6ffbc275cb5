//! `print`/`input`: the only built-ins that touch stdio (spec §5, §10.2).

use super::def;
use crate::env::Environment;
use crate::error::NumfuError;
use crate::value::Value;
use std::io::{self, Write};
use std::rc::Rc;

pub fn register(env: &Rc<Environment>) {
    def(env, "print", 1, false, |args| {
        println!("{}", crate::print::render_top_level(&args[0]));
        let _ = io::stdout().flush();
        Ok(Value::Unit)
    });

    def(env, "input", 0, false, |_args| {
        let mut line = String::new();
        io::stdin()
            .read_line(&mut line)
            .map_err(|e| NumfuError::runtime(format!("input() failed: {e}")))?;
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(Value::String(line))
    });
}
