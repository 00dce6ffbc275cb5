// ABOUTME: Trampolined tree-walking evaluator: calls, currying, control forms, chains

use crate::ast::{CallArg, CompareOp, Expr, LambdaDef, ListItem, Param};
use crate::env::Environment;
use crate::error::{NumfuError, Result, Span};
use crate::value::{Builtin, Closure, Slot, Value};
use std::cell::Cell;
use std::rc::Rc;

/// Shared, mutable evaluation budget: non-tail recursion depth and the total
/// number of trampoline re-entries for one top-level `eval` call.
pub struct EvalContext {
    pub max_recursion_depth: usize,
    pub max_iteration_depth: usize,
    rec_depth: Cell<usize>,
    iterations: Cell<usize>,
}

impl EvalContext {
    pub fn new(max_recursion_depth: usize, max_iteration_depth: usize) -> Self {
        EvalContext {
            max_recursion_depth,
            max_iteration_depth,
            rec_depth: Cell::new(0),
            iterations: Cell::new(0),
        }
    }
}

/// Guards one non-tail recursive descent, counted against `max_recursion_depth`.
struct RecGuard<'a> {
    ctx: &'a EvalContext,
}

impl<'a> RecGuard<'a> {
    fn enter(ctx: &'a EvalContext) -> Result<Self> {
        let depth = ctx.rec_depth.get();
        if depth >= ctx.max_recursion_depth {
            return Err(NumfuError::recursion("maximum recursion depth exceeded"));
        }
        ctx.rec_depth.set(depth + 1);
        Ok(RecGuard { ctx })
    }
}

impl Drop for RecGuard<'_> {
    fn drop(&mut self) {
        self.ctx.rec_depth.set(self.ctx.rec_depth.get() - 1);
    }
}

/// One reduction step's outcome: either a finished value, or a tail position
/// to continue with in the driving loop (no new host stack frame).
enum Flow {
    Value(Value),
    Tail(Expr, Rc<Environment>),
}

/// Evaluate `expr` in `env`, trampolining through tail positions so that
/// tail-recursive NumFu programs don't grow the Rust stack per iteration.
pub fn eval(expr: &Expr, env: Rc<Environment>, ctx: &EvalContext) -> Result<Value> {
    let mut current: Owned = Owned::Borrowed(expr);
    let mut current_env = env;
    loop {
        match eval_step(current.get(), &current_env, ctx)? {
            Flow::Value(v) => return Ok(v),
            Flow::Tail(next_expr, next_env) => {
                let n = ctx.iterations.get() + 1;
                if n > ctx.max_iteration_depth {
                    return Err(NumfuError::recursion("maximum tail-call iterations exceeded"));
                }
                ctx.iterations.set(n);
                current = Owned::Owned(next_expr);
                current_env = next_env;
            }
        }
    }
}

/// Holds either a borrowed expression (the caller's) or one owned by the
/// trampoline after jumping into a tail position.
enum Owned<'a> {
    Borrowed(&'a Expr),
    Owned(Expr),
}

impl Owned<'_> {
    fn get(&self) -> &Expr {
        match self {
            Owned::Borrowed(e) => e,
            Owned::Owned(e) => e,
        }
    }
}

/// Evaluate a subexpression that is *not* in tail position: a fresh,
/// recursion-depth-guarded call into `eval`.
fn eval_nontail(expr: &Expr, env: &Rc<Environment>, ctx: &EvalContext) -> Result<Value> {
    let _guard = RecGuard::enter(ctx)?;
    eval(expr, Rc::clone(env), ctx)
}

fn is_placeholder(arg: &CallArg) -> bool {
    matches!(arg, CallArg::Placeholder(_))
}

fn is_spread(arg: &CallArg) -> bool {
    matches!(arg, CallArg::Spread(_))
}

pub(crate) fn truthy(v: &Value) -> bool {
    match v {
        Value::Boolean(b) => *b,
        Value::Number(n) => !n.is_zero(),
        Value::String(s) => !s.is_empty(),
        Value::List(items) => !items.is_empty(),
        Value::Closure(_) | Value::Builtin(_) | Value::Unit => true,
    }
}

fn eval_step(expr: &Expr, env: &Rc<Environment>, ctx: &EvalContext) -> Result<Flow> {
    match expr {
        Expr::Number(n, _) => Ok(Flow::Value(Value::Number(n.clone()))),
        Expr::Bool(b, _) => Ok(Flow::Value(Value::Boolean(*b))),
        Expr::Str(s, _) => Ok(Flow::Value(Value::String(s.clone()))),
        Expr::Ident(name, span) => match env.get(name) {
            Some(v) => Ok(Flow::Value(v)),
            None => Err(NumfuError::name(format!("name '{name}' is not defined")).at(span.clone())),
        },
        Expr::Dollar(span) => match env.get("$") {
            Some(v) => Ok(Flow::Value(v)),
            None => Err(NumfuError::name("'$' is only valid in an assertion predicate").at(span.clone())),
        },
        Expr::Placeholder(span) => {
            Err(NumfuError::syntax("'_' is only valid inside a call's argument list").at(span.clone()))
        }
        Expr::ListLit(items, _) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    ListItem::Item(e) => out.push(eval_nontail(e, env, ctx)?),
                    ListItem::Spread(e) => {
                        let v = eval_nontail(e, env, ctx)?;
                        match v {
                            Value::List(items) => out.extend(items.iter().cloned()),
                            other => {
                                return Err(NumfuError::type_error(format!(
                                    "cannot spread a {} into a list",
                                    other.type_name()
                                ))
                                .at(e.span()))
                            }
                        }
                    }
                }
            }
            Ok(Flow::Value(Value::List(Rc::new(out))))
        }
        Expr::Lambda(def) => Ok(Flow::Value(make_closure(def, env))),
        Expr::Call { func, args, span } => {
            let fn_value = eval_nontail(func, env, ctx)?;
            let new_args = eval_call_args(args, env, ctx)?;
            perform_call(fn_value, new_args, span)
        }
        Expr::Index { target, index, span } => {
            let t = eval_nontail(target, env, ctx)?;
            let i = eval_nontail(index, env, ctx)?;
            Ok(Flow::Value(eval_index(&t, &i, span)?))
        }
        Expr::If {
            cond,
            then_branch,
            else_branch,
            span: _,
        } => {
            let c = eval_nontail(cond, env, ctx)?;
            let branch = if truthy(&c) { then_branch } else { else_branch };
            Ok(Flow::Tail((**branch).clone(), Rc::clone(env)))
        }
        Expr::Let { bindings, body, span: _ } => {
            // All RHS are evaluated against `frame` before any name is
            // defined in it, so siblings never see each other's value
            // (`let a = 1, b = a in b` is a NameError, not `1`). A lambda
            // bound here still resolves its own name when called later: it
            // only captures `frame` by reference at bind time and doesn't
            // look anything up until invoked, by which point `frame` holds
            // every binding.
            let frame = Environment::child(env);
            let mut values = Vec::with_capacity(bindings.len());
            for (name, value_expr) in bindings {
                let v = eval_nontail(value_expr, &frame, ctx)?;
                values.push((name.clone(), v));
            }
            for (name, v) in values {
                frame.define(name, v);
            }
            Ok(Flow::Tail((**body).clone(), frame))
        }
        Expr::And(l, r, _) => {
            let left = eval_nontail(l, env, ctx)?;
            if !truthy(&left) {
                return Ok(Flow::Value(Value::Boolean(false)));
            }
            let right = eval_nontail(r, env, ctx)?;
            Ok(Flow::Value(Value::Boolean(truthy(&right))))
        }
        Expr::Or(l, r, _) => {
            let left = eval_nontail(l, env, ctx)?;
            if truthy(&left) {
                return Ok(Flow::Value(Value::Boolean(true)));
            }
            let right = eval_nontail(r, env, ctx)?;
            Ok(Flow::Value(Value::Boolean(truthy(&right))))
        }
        Expr::Chain { operands, ops, span: _ } => {
            let mut left = eval_nontail(&operands[0], env, ctx)?;
            for (op, rhs_expr) in ops.iter().zip(operands.iter().skip(1)) {
                let right = eval_nontail(rhs_expr, env, ctx)?;
                if !compare(*op, &left, &right)? {
                    return Ok(Flow::Value(Value::Boolean(false)));
                }
                left = right;
            }
            Ok(Flow::Value(Value::Boolean(true)))
        }
        Expr::Compose(l, r, span) => {
            let f = eval_nontail(l, env, ctx)?;
            let g = eval_nontail(r, env, ctx)?;
            if !f.is_callable() || !g.is_callable() {
                return Err(NumfuError::type_error("'>>' requires two callables").at(span.clone()));
            }
            Ok(Flow::Value(make_compose(f, g, span)))
        }
        Expr::Pipe(l, r, span) => {
            let f = eval_nontail(r, env, ctx)?;
            let x = eval_nontail(l, env, ctx)?;
            perform_call(f, vec![Slot::Filled(x)], span)
        }
    }
}

fn make_closure(def: &Rc<LambdaDef>, env: &Rc<Environment>) -> Value {
    match &def.name {
        Some(name) => {
            let frame = Environment::child(env);
            let closure = Closure::new(Rc::clone(def), Rc::clone(&frame));
            let value = Value::Closure(Rc::new(closure));
            frame.define(name.clone(), value.clone());
            value
        }
        None => Value::Closure(Rc::new(Closure::new(Rc::clone(def), Rc::clone(env)))),
    }
}

/// Builds a synthetic unary closure `{x -> g(f(x))}` over already-evaluated
/// values, reusing the ordinary call/curry machinery for the result.
fn make_compose(f: Value, g: Value, span: &Span) -> Value {
    let env = Environment::new_top();
    env.define("__compose_f", f);
    env.define("__compose_g", g);
    let body = Expr::Call {
        func: Box::new(Expr::Ident("__compose_g".to_string(), span.clone())),
        args: vec![CallArg::Value(Expr::Call {
            func: Box::new(Expr::Ident("__compose_f".to_string(), span.clone())),
            args: vec![CallArg::Value(Expr::Ident("x".to_string(), span.clone()))],
            span: span.clone(),
        })],
        span: span.clone(),
    };
    let def = Rc::new(LambdaDef {
        name: None,
        params: vec![Param {
            name: "x".to_string(),
            is_rest: false,
        }],
        body,
        span: span.clone(),
    });
    Value::Closure(Rc::new(Closure::new(def, env)))
}

fn eval_call_args(args: &[CallArg], env: &Rc<Environment>, ctx: &EvalContext) -> Result<Vec<Slot>> {
    if args.iter().any(is_placeholder) && args.iter().any(is_spread) {
        return Err(NumfuError::type_error(
            "cannot combine spread operator with an argument placeholder in the same call",
        ));
    }
    let mut out = Vec::with_capacity(args.len());
    for arg in args {
        match arg {
            CallArg::Value(e) => out.push(Slot::Filled(eval_nontail(e, env, ctx)?)),
            CallArg::Placeholder(_) => out.push(Slot::Hole),
            CallArg::Spread(e) => {
                let v = eval_nontail(e, env, ctx)?;
                match v {
                    Value::List(items) => out.extend(items.iter().cloned().map(Slot::Filled)),
                    other => {
                        return Err(NumfuError::type_error(format!(
                            "cannot spread a {} as call arguments",
                            other.type_name()
                        ))
                        .at(e.span()))
                    }
                }
            }
        }
    }
    Ok(out)
}

/// Fills existing holes in `bound` then `rest` (left to right) from
/// `new_args`, consuming one new argument per hole regardless of whether
/// that argument is itself a placeholder. Returns the unconsumed tail.
fn fill_holes(bound: &mut [Slot], rest: &mut [Slot], new_args: Vec<Slot>) -> Vec<Slot> {
    let mut iter = new_args.into_iter();
    for slot in bound.iter_mut().chain(rest.iter_mut()) {
        if slot.is_hole() {
            match iter.next() {
                Some(Slot::Filled(v)) => *slot = Slot::Filled(v),
                Some(Slot::Hole) => {}
                None => break,
            }
        }
    }
    iter.collect()
}

enum Apply {
    Partial(Value),
    Invoke(Vec<Value>, Vec<Value>),
}

fn resolve_full(slots: Vec<Slot>) -> Vec<Value> {
    slots
        .into_iter()
        .map(|s| match s {
            Slot::Filled(v) => v,
            Slot::Hole => unreachable!("resolve_full called on an unfilled slot"),
        })
        .collect()
}

fn apply_closure(closure: &Closure, new_args: Vec<Slot>) -> Result<Apply> {
    let mut bound = closure.bound.clone();
    let mut rest = closure.rest.clone();
    let has_rest = closure.has_rest();
    let leftover = fill_holes(&mut bound, &mut rest, new_args);
    if !leftover.is_empty() {
        if has_rest {
            rest.extend(leftover);
        } else {
            return Err(NumfuError::type_error(format!(
                "too many arguments: function of arity {} given {} more",
                bound.len(),
                leftover.len()
            )));
        }
    }
    let bound_full = bound.iter().all(|s| matches!(s, Slot::Filled(_)));
    let rest_resolved = rest.iter().all(|s| matches!(s, Slot::Filled(_)));
    if bound_full && rest_resolved {
        Ok(Apply::Invoke(resolve_full(bound), resolve_full(rest)))
    } else {
        Ok(Apply::Partial(Value::Closure(Rc::new(Closure {
            def: Rc::clone(&closure.def),
            env: Rc::clone(&closure.env),
            bound,
            rest,
        }))))
    }
}

fn apply_builtin(b: &Builtin, new_args: Vec<Slot>) -> Result<Apply> {
    let mut bound = b.bound.clone();
    let mut rest = b.rest.clone();
    let leftover = fill_holes(&mut bound, &mut rest, new_args);
    if !leftover.is_empty() {
        if b.has_rest {
            rest.extend(leftover);
        } else {
            return Err(NumfuError::type_error(format!(
                "too many arguments: '{}' has arity {}",
                b.name, b.arity
            )));
        }
    }
    let bound_full = bound.iter().all(|s| matches!(s, Slot::Filled(_)));
    let rest_resolved = rest.iter().all(|s| matches!(s, Slot::Filled(_)));
    if bound_full && rest_resolved {
        Ok(Apply::Invoke(resolve_full(bound), resolve_full(rest)))
    } else {
        Ok(Apply::Partial(Value::Builtin(Rc::new(Builtin {
            name: Rc::clone(&b.name),
            arity: b.arity,
            has_rest: b.has_rest,
            bound,
            rest,
            func: Rc::clone(&b.func),
        }))))
    }
}

/// Applies `new_args` to `callable`, composing with any already-bound or
/// placeheld slots. Invocation of a closure transfers into its body as a
/// tail position; a builtin is invoked immediately (it has no NumFu body
/// to trampoline into).
fn perform_call(callable: Value, new_args: Vec<Slot>, span: &Span) -> Result<Flow> {
    match callable {
        Value::Closure(c) => match apply_closure(&c, new_args)? {
            Apply::Partial(v) => Ok(Flow::Value(v)),
            Apply::Invoke(fixed, rest) => {
                let frame = Environment::child(&c.env);
                let fixed_params = c.def.params.iter().filter(|p| !p.is_rest);
                for (param, value) in fixed_params.zip(fixed) {
                    frame.define(param.name.clone(), value);
                }
                if let Some(rest_param) = c.def.params.iter().find(|p| p.is_rest) {
                    frame.define(rest_param.name.clone(), Value::List(Rc::new(rest)));
                }
                Ok(Flow::Tail(c.def.body.clone(), frame))
            }
        },
        Value::Builtin(b) => match apply_builtin(&b, new_args)? {
            Apply::Partial(v) => Ok(Flow::Value(v)),
            Apply::Invoke(mut fixed, rest) => {
                fixed.extend(rest);
                Ok(Flow::Value((b.func)(fixed)?))
            }
        },
        other => Err(NumfuError::type_error(format!("value of type {} is not callable", other.type_name()))
            .at(span.clone())),
    }
}

/// Numeric/structural comparison shared by chained comparisons and the
/// desugared `<`, `>`, `<=`, `>=`, `==`, `!=` builtins (single source of
/// truth so both paths agree, per the currying/chain identical-semantics
/// requirement).
pub fn compare(op: CompareOp, a: &Value, b: &Value) -> Result<bool> {
    match op {
        CompareOp::Eq => Ok(a == b),
        CompareOp::Neq => Ok(a != b),
        CompareOp::Lt | CompareOp::Gt | CompareOp::Le | CompareOp::Ge => match (a, b) {
            (Value::Number(x), Value::Number(y)) => Ok(match op {
                CompareOp::Lt => x.lt(y),
                CompareOp::Gt => x.gt(y),
                CompareOp::Le => x.le(y),
                CompareOp::Ge => x.ge(y),
                CompareOp::Eq | CompareOp::Neq => unreachable!(),
            }),
            _ => Err(NumfuError::type_error(format!(
                "'{}' requires two numbers, got {} and {}",
                op.symbol(),
                a.type_name(),
                b.type_name()
            ))),
        },
    }
}

fn normalize_index(len: usize, i: i64) -> Option<usize> {
    let idx = if i < 0 { i + len as i64 } else { i };
    if idx < 0 || idx as usize >= len {
        None
    } else {
        Some(idx as usize)
    }
}

fn index_as_i64(v: &Value) -> Result<i64> {
    match v {
        Value::Number(n) => {
            let f = n.to_f64();
            if f.is_finite() {
                Ok(f as i64)
            } else {
                Err(NumfuError::type_error("index must be a finite integer"))
            }
        }
        other => Err(NumfuError::type_error(format!("index must be a Number, got {}", other.type_name()))),
    }
}

pub fn eval_index(target: &Value, index: &Value, span: &Span) -> Result<Value> {
    let i = index_as_i64(index)?;
    match target {
        Value::List(items) => match normalize_index(items.len(), i) {
            Some(idx) => Ok(items[idx].clone()),
            None => Err(NumfuError::index(format!("list index {i} out of range")).at(span.clone())),
        },
        Value::String(s) => {
            let chars: Vec<char> = s.chars().collect();
            match normalize_index(chars.len(), i) {
                Some(idx) => Ok(Value::String(chars[idx].to_string())),
                None => Err(NumfuError::index(format!("string index {i} out of range")).at(span.clone())),
            }
        }
        other => Err(NumfuError::type_error(format!("cannot index into a {}", other.type_name())).at(span.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::number::Number;
    use crate::parser::parse_expression;

    fn run(src: &str) -> Result<Value> {
        let ctx = EvalContext::new(2048, 1_000_000);
        let env = Environment::new_top();
        crate::builtins::register(&env);
        let expr = parse_expression(src).unwrap();
        eval(&expr, env, &ctx)
    }

    #[test]
    fn arithmetic_desugars_and_evaluates() {
        let v = run("1 + 2 * 3").unwrap();
        assert_eq!(v, Value::Number(Number::from_i64(7)));
    }

    #[test]
    fn curried_addition() {
        let v = run("(_ + 1)(41)").unwrap();
        assert_eq!(v, Value::Number(Number::from_i64(42)));
    }

    #[test]
    fn placeholder_leaves_closure_partial() {
        let v = run("{a, b, c -> a + b + c}(_, 5, _)").unwrap();
        assert!(matches!(v, Value::Closure(_)));
    }

    #[test]
    fn chained_comparison_short_circuits() {
        let v = run("1 < 2 < 0").unwrap();
        assert_eq!(v, Value::Boolean(false));
    }

    #[test]
    fn tail_recursive_sum_does_not_overflow_stack() {
        let v = run("{loop: n, acc -> if n <= 0 then acc else loop(n - 1, acc + n)}(100000, 0)").unwrap();
        match v {
            Value::Number(n) => assert!(n.num_eq(&Number::from_i64(5_000_050_000))),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn non_tail_recursion_is_bounded() {
        let err = run("{loop: n -> if n <= 0 then 0 else 1 + loop(n - 1)}(100000)").unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::RecursionError);
    }

    #[test]
    fn if_is_tail_position_and_short_circuits_other_branch() {
        let v = run("if true then 1 else error(\"boom\")").unwrap();
        assert_eq!(v, Value::Number(Number::from_i64(1)));
    }

    #[test]
    fn pipe_and_compose() {
        let v = run("5 |> ({x -> x + 1} >> {x -> x * 2})").unwrap();
        assert_eq!(v, Value::Number(Number::from_i64(12)));
    }

    #[test]
    fn indexing_supports_negative_offsets() {
        let v = run("[10, 20, 30][-1]").unwrap();
        assert_eq!(v, Value::Number(Number::from_i64(30)));
    }

    #[test]
    fn spread_and_placeholder_conflict_is_a_type_error() {
        let err = run("{a, b -> a}(_, ...[1])").unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::TypeError);
    }
}
