// ABOUTME: Whole-program scenarios exercised through the public `evaluate` entry point

use numfu::config::EvaluatorOptions;
use numfu::error::ErrorKind;
use numfu::print::render_top_level;
use numfu::value::Value;
use std::path::Path;
use std::sync::Mutex;

// `Number`'s precision is a process-wide atomic; serialize tests that could
// observe a precision change from another test running concurrently.
static PRECISION_LOCK: Mutex<()> = Mutex::new(());

fn eval_one(source: &str) -> Value {
    let _guard = PRECISION_LOCK.lock().unwrap();
    let mut results = numfu::evaluate(source, Path::new("."), &EvaluatorOptions::default()).expect("evaluation failed");
    assert_eq!(results.len(), 1, "expected exactly one top-level result");
    results.pop().unwrap()
}

fn eval_err(source: &str) -> numfu::error::NumfuError {
    let _guard = PRECISION_LOCK.lock().unwrap();
    numfu::evaluate(source, Path::new("."), &EvaluatorOptions::default()).expect_err("expected evaluation to fail")
}

#[test]
fn golden_ratio_scenario() {
    let v = eval_one("let g = {d -> let r = {k -> if k<=0 then 1 else 1 + 1/r(k-1)} in r(d)} in g(10)");
    assert_eq!(render_top_level(&v), "1.61797752808989");
}

#[test]
fn placeholder_then_curry_fills_in_declared_order() {
    let v = eval_one("{a,b,c -> a+b+c}(_, 5, _)(10, 20)");
    assert_eq!(render_top_level(&v), "35");
}

#[test]
fn curry_applies_one_argument_at_a_time() {
    let v = eval_one("{x,y -> x+y}(5)(3)");
    assert_eq!(render_top_level(&v), "8");
}

#[test]
fn under_application_renders_as_a_partial_closure() {
    let v = eval_one("{x,y -> x+y}(5)");
    assert_eq!(render_top_level(&v), "{y -> 5 + y}");
}

#[test]
fn chained_comparison_is_transitive_and_short_circuits() {
    assert_eq!(render_top_level(&eval_one("1 < 2 < 3")), "true");
    assert_eq!(render_top_level(&eval_one("1 < 2 > 3")), "false");
}

#[test]
fn tail_recursive_sum_reaches_a_million_iterations() {
    let v = eval_one("let f = {n,a -> if n<=0 then a else f(n-1, a+n)} in f(100000, 0)");
    assert_eq!(render_top_level(&v), "5000050000");
}

#[test]
fn assertion_sugar_succeeds_silently() {
    let results = numfu::evaluate("2 + 2 ---> $ == 4", Path::new("."), &EvaluatorOptions::default()).unwrap();
    assert!(results.is_empty(), "assertion statements produce no printable result");
}

#[test]
fn assertion_sugar_raises_assertion_error() {
    let err = eval_err("2 + 2 ---> $ == 5");
    assert_eq!(err.kind, ErrorKind::AssertionError);
}

#[test]
fn division_follows_ieee_edge_cases() {
    assert_eq!(render_top_level(&eval_one("1/0")), "inf");
    assert_eq!(render_top_level(&eval_one("-1/0")), "-inf");
    assert_eq!(render_top_level(&eval_one("0/0")), "nan");
    assert_eq!(eval_one("0/0 > 42"), Value::Boolean(false));
    assert_eq!(eval_one("0/0 == 0/0"), Value::Boolean(false));
}

#[test]
fn sqrt_of_negative_is_nan() {
    assert_eq!(render_top_level(&eval_one("sqrt(-4)")), "nan");
    assert_eq!(render_top_level(&eval_one("sqrt(4)")), "2");
}

#[test]
fn floor_and_abs_builtins() {
    assert_eq!(render_top_level(&eval_one("floor(3)")), "3");
    assert_eq!(render_top_level(&eval_one("abs(-5)")), "5");
}

#[test]
fn reverse_is_its_own_inverse() {
    assert_eq!(eval_one("reverse(reverse([1,2,3])) == [1,2,3]"), Value::Boolean(true));
    assert_eq!(eval_one("reverse(reverse(\"hello\")) == \"hello\""), Value::Boolean(true));
}

#[test]
fn sort_is_a_monotonic_permutation() {
    let v = eval_one("sort([3, 1, 2])");
    assert_eq!(render_top_level(&v), "[1, 2, 3]");
}

#[test]
fn map_preserves_length() {
    assert_eq!(eval_one("length(map([1,2,3,4], {x -> x * x})) == length([1,2,3,4])"), Value::Boolean(true));
}

#[test]
fn stdlib_reduce_and_range_compose() {
    let v = eval_one("sum(range(1, 5))");
    assert_eq!(render_top_level(&v), "10");
}

#[test]
fn operators_desugar_to_curryable_builtins() {
    let v = eval_one("(_ + 1)(41)");
    assert_eq!(render_top_level(&v), "42");
}

#[test]
fn pipe_and_compose_operators() {
    let v = eval_one("5 |> ({x -> x + 1} >> {x -> x * 2})");
    assert_eq!(render_top_level(&v), "12");
}

#[test]
fn unbound_identifier_is_a_name_error() {
    let err = eval_err("doesNotExist + 1");
    assert_eq!(err.kind, ErrorKind::NameError);
}

#[test]
fn calling_a_non_callable_is_a_type_error() {
    let err = eval_err("5(1)");
    assert_eq!(err.kind, ErrorKind::TypeError);
}

#[test]
fn out_of_range_index_is_an_index_error() {
    let err = eval_err("[1,2,3][10]");
    assert_eq!(err.kind, ErrorKind::IndexError);
}

#[test]
fn nonrecursive_overflow_is_a_recursion_error() {
    let err = eval_err("{loop: n -> if n <= 0 then 0 else 1 + loop(n - 1)}(100000)");
    assert_eq!(err.kind, ErrorKind::RecursionError);
}

#[test]
fn custom_error_tag_becomes_the_error_kind() {
    let err = eval_err("error(\"boom\", \"Oops\")");
    assert_eq!(err.kind, ErrorKind::Custom("Oops".to_string()));
}

#[test]
fn top_level_mutual_recursion_sees_later_definitions() {
    let v = eval_one(
        "let isEven = {isEven: n -> if n == 0 then true else isOdd(n - 1)}; \
         let isOdd = {isOdd: n -> if n == 0 then false else isEven(n - 1)}; \
         isEven(10)",
    );
    assert_eq!(v, Value::Boolean(true));
}

#[test]
fn sibling_let_bindings_do_not_see_each_others_rhs() {
    let err = eval_err("let a = 1, b = a in b");
    assert_eq!(err.kind, ErrorKind::NameError);
}
