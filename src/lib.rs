// ABOUTME: Library module exposing internal components for testing

pub mod ast;
pub mod builtins;
pub mod config;
pub mod env;
pub mod error;
pub mod eval;
pub mod lexer;
pub mod module;
pub mod number;
pub mod parser;
pub mod print;
pub mod value;

use config::EvaluatorOptions;
use env::Environment;
use error::{NumfuError, Result};
use eval::EvalContext;
use module::ModuleResolver;
use std::path::Path;
use std::rc::Rc;
use value::Value;

/// The stdlib bootstrap, parsed and evaluated into the root environment
/// before a program's own module runs (spec §4.2, §10.5).
const STDLIB_SOURCE: &str = include_str!("stdlib/builtins.nfu");

/// Evaluates `source` (a complete module) under `options`, returning the
/// printable results of its top-level expression statements in order. This
/// is the library's single entry point (spec §1); `dir` is the directory
/// imports inside `source` are resolved relative to.
pub fn evaluate(source: &str, dir: &Path, options: &EvaluatorOptions) -> Result<Vec<Value>> {
    number::set_precision(options.precision);
    let env = Environment::new_top();
    builtins::register(&env);
    load_stdlib(&env)?;

    let module = parser::parse_module(source)?;
    let ctx = EvalContext::new(options.max_recursion_depth, options.max_iteration_depth);
    let resolver = ModuleResolver::new();
    resolver.run_program(&module.statements, &env, &ctx, dir)
}

/// Parses and evaluates the embedded standard library into `env`. Its own
/// imports (none, currently) would resolve relative to the crate root;
/// `numfu ast --imports []` (spec §6) is how the real stdlib build step
/// would avoid needing any resolution at all.
fn load_stdlib(env: &Rc<Environment>) -> Result<()> {
    let module = parser::parse_module(STDLIB_SOURCE).map_err(|e| {
        NumfuError::runtime(format!("internal error: standard library failed to parse: {e}"))
    })?;
    let ctx = EvalContext::new(config::DEFAULT_MAX_RECURSION_DEPTH, config::DEFAULT_MAX_ITERATION_DEPTH);
    let resolver = ModuleResolver::new();
    resolver
        .run_program(&module.statements, env, &ctx, Path::new("."))
        .map(|_| ())
        .map_err(|e| NumfuError::runtime(format!("internal error: standard library failed to evaluate: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval_ok(source: &str) -> Vec<Value> {
        evaluate(source, Path::new("."), &EvaluatorOptions::default()).expect("evaluation failed")
    }

    #[test]
    fn stdlib_map_and_sum_are_available() {
        let results = eval_ok("sum(map([1, 2, 3], {x -> x * 2}))");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0], Value::Number(crate::number::Number::from_i64(12)));
    }

    #[test]
    fn golden_ratio_scenario_renders_expected_precision() {
        let results = eval_ok("let g = {d -> let r = {k -> if k<=0 then 1 else 1 + 1/r(k-1)} in r(d)} in g(10)");
        assert_eq!(results.len(), 1);
        assert_eq!(crate::print::render_top_level(&results[0]), "1.61797752808989");
    }

    #[test]
    fn top_level_let_persists_across_statements() {
        let results = eval_ok("let x = 5; x + 1");
        assert_eq!(results.len(), 1);
        assert_eq!(crate::print::render_top_level(&results[0]), "6");
    }
}
