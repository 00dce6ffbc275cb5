//! Native built-in functions registered into the root environment before the
//! bootstrapped standard library (`stdlib/builtins.nfu`) is parsed and
//! evaluated (spec §4.2, §10.5). Organized by category, one sub-module each.
//!
//! - [arithmetic]: `+ - * / % ^`
//! - [comparison]: `< > <= >= == !=`
//! - [logic]: `!`
//! - [types]: type predicates
//! - [collections]: `length`, `slice`, `set`, `reverse`, `sort`
//! - [conversion]: `Number`, `String`, `format`
//! - [io]: `print`, `input`
//! - [errors]: `error`, `assert`

use crate::env::Environment;
use crate::error::Result;
use crate::value::{Builtin, Value};
use std::rc::Rc;

pub mod arithmetic;
pub mod collections;
pub mod comparison;
pub mod conversion;
pub mod errors;
pub mod io;
pub mod logic;
pub mod types;

/// Defines a fixed/rest-arity native builtin in `env`, wrapped with the same
/// curry/placeholder protocol `Closure` uses (spec §3, §4.3).
pub(crate) fn def(
    env: &Rc<Environment>,
    name: &'static str,
    arity: usize,
    has_rest: bool,
    f: impl Fn(Vec<Value>) -> Result<Value> + 'static,
) {
    let func: crate::value::NativeFn = Rc::new(f);
    env.define(name, Value::Builtin(Rc::new(Builtin::new(name, arity, has_rest, func))));
}

/// Registers every native builtin category into `env`.
pub fn register(env: &Rc<Environment>) {
    arithmetic::register(env);
    comparison::register(env);
    logic::register(env);
    types::register(env);
    collections::register(env);
    conversion::register(env);
    io::register(env);
    errors::register(env);
}
