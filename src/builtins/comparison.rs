//! Comparison operators, desugared at parse time for single-operator use and
//! shared with `Expr::Chain` via [`crate::eval::compare`] (spec §9, §4.1).

use super::def;
use crate::ast::CompareOp;
use crate::env::Environment;
use crate::value::Value;
use std::rc::Rc;

pub fn register(env: &Rc<Environment>) {
    for op in [
        CompareOp::Lt,
        CompareOp::Gt,
        CompareOp::Le,
        CompareOp::Ge,
        CompareOp::Eq,
        CompareOp::Neq,
    ] {
        let symbol: &'static str = op.symbol();
        def(env, symbol, 2, false, move |args| {
            Ok(Value::Boolean(crate::eval::compare(op, &args[0], &args[1])?))
        });
    }
}
