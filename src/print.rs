// ABOUTME: Value printing: literal rendering plus closure syntactic reconstruction

use crate::ast::{CallArg, Expr, ListItem, Param};
use crate::value::{Closure, Slot, Value};

/// Render a value the way the REPL/CLI prints a top-level result: strings
/// bare, everything else as in structural (`inner`) contexts.
pub fn render_top_level(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => render_inner(other),
    }
}

/// Render a value nested inside a structural context (list elements):
/// strings are quoted.
pub fn render_inner(v: &Value) -> String {
    match v {
        Value::Number(n) => n.render(),
        Value::Boolean(b) => b.to_string(),
        Value::String(s) => format!("\"{}\"", escape(s)),
        Value::List(items) => {
            let rendered: Vec<String> = items.iter().map(render_inner).collect();
            format!("[{}]", rendered.join(", "))
        }
        Value::Closure(c) => render_closure(c),
        Value::Builtin(b) => render_builtin(b),
        Value::Unit => "unit".to_string(),
    }
}

pub fn debug_render(v: &Value) -> String {
    render_inner(v)
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

fn render_builtin(b: &crate::value::Builtin) -> String {
    let open: Vec<String> = b
        .bound
        .iter()
        .enumerate()
        .filter(|(_, s)| s.is_hole())
        .map(|(i, _)| format!("arg{i}"))
        .collect();
    if open.is_empty() && b.rest.is_empty() {
        format!("<builtin {}>", b.name)
    } else {
        format!("{{{} -> <builtin {}>}}", open.join(", "), b.name)
    }
}

/// Reconstruct a closure's surface syntax: the parameter list shrinks to the
/// names still unbound (`Slot::Hole`), and body identifiers that refer to a
/// now-filled parameter are rendered as that value's literal text.
fn render_closure(c: &Closure) -> String {
    let fixed: Vec<&Param> = c.def.params.iter().filter(|p| !p.is_rest).collect();
    let rest_param = c.def.params.iter().find(|p| p.is_rest);

    let mut header_parts = Vec::new();
    let mut substitutions: Vec<(&str, &Value)> = Vec::new();
    for (param, slot) in fixed.iter().zip(c.bound.iter()) {
        match slot {
            Slot::Hole => header_parts.push(param.name.clone()),
            Slot::Filled(v) => substitutions.push((param.name.as_str(), v)),
        }
    }
    if let Some(rest) = rest_param {
        if c.rest.iter().any(Slot::is_hole) || c.rest.is_empty() {
            header_parts.push(format!("...{}", rest.name));
        }
    }

    let body = render_expr(&c.def.body, &substitutions, 0);
    if let Some(name) = &c.def.name {
        format!("{{{}: {} -> {}}}", name, header_parts.join(", "), body)
    } else {
        format!("{{{} -> {}}}", header_parts.join(", "), body)
    }
}

/// Binding power used to decide whether a nested call needs parens when
/// reconstructed as an infix/prefix operator.
fn operator_info(name: &str) -> Option<(u8, bool)> {
    // (precedence, right-associative)
    match name {
        "^" => Some((6, true)),
        "*" | "/" | "%" => Some((5, false)),
        "+" | "-" => Some((4, false)),
        "<" | ">" | "<=" | ">=" | "==" | "!=" => Some((3, false)),
        _ => None,
    }
}

/// Render an expression back to NumFu source text, substituting resolved
/// parameter values in place of their identifiers. `min_prec` is the
/// precedence the surrounding context requires without parenthesization.
fn render_expr(expr: &Expr, subs: &[(&str, &Value)], min_prec: u8) -> String {
    match expr {
        Expr::Number(n, _) => n.render(),
        Expr::Bool(b, _) => b.to_string(),
        Expr::Str(s, _) => format!("\"{}\"", escape(s)),
        Expr::Ident(name, _) => {
            if let Some((_, v)) = subs.iter().find(|(n, _)| *n == name) {
                render_inner(v)
            } else {
                name.clone()
            }
        }
        Expr::Dollar(_) => "$".to_string(),
        Expr::Placeholder(_) => "_".to_string(),
        Expr::ListLit(items, _) => {
            let rendered: Vec<String> = items
                .iter()
                .map(|item| match item {
                    ListItem::Item(e) => render_expr(e, subs, 0),
                    ListItem::Spread(e) => format!("...{}", render_expr(e, subs, 0)),
                })
                .collect();
            format!("[{}]", rendered.join(", "))
        }
        Expr::Lambda(def) => {
            let params: Vec<String> = def
                .params
                .iter()
                .map(|p| {
                    if p.is_rest {
                        format!("...{}", p.name)
                    } else {
                        p.name.clone()
                    }
                })
                .collect();
            let body = render_expr(&def.body, &[], 0);
            match &def.name {
                Some(name) => format!("{{{}: {} -> {}}}", name, params.join(", "), body),
                None => format!("{{{} -> {}}}", params.join(", "), body),
            }
        }
        Expr::Call { func, args, .. } => render_call(func, args, subs, min_prec),
        Expr::Index { target, index, .. } => {
            format!(
                "{}[{}]",
                render_expr(target, subs, 10),
                render_expr(index, subs, 0)
            )
        }
        Expr::If {
            cond,
            then_branch,
            else_branch,
            ..
        } => format!(
            "if {} then {} else {}",
            render_expr(cond, subs, 0),
            render_expr(then_branch, subs, 0),
            render_expr(else_branch, subs, 0)
        ),
        Expr::Let { bindings, body, .. } => {
            let parts: Vec<String> = bindings
                .iter()
                .map(|(name, value)| format!("{} = {}", name, render_expr(value, subs, 0)))
                .collect();
            format!(
                "let {} in {}",
                parts.join(", "),
                render_expr(body, subs, 0)
            )
        }
        Expr::And(l, r, _) => format!(
            "{} && {}",
            render_expr(l, subs, 2),
            render_expr(r, subs, 3)
        ),
        Expr::Or(l, r, _) => format!("{} || {}", render_expr(l, subs, 1), render_expr(r, subs, 2)),
        Expr::Chain { operands, ops, .. } => {
            let mut out = render_expr(&operands[0], subs, 0);
            for (op, operand) in ops.iter().zip(operands.iter().skip(1)) {
                out.push(' ');
                out.push_str(op.symbol());
                out.push(' ');
                out.push_str(&render_expr(operand, subs, 0));
            }
            out
        }
        Expr::Compose(l, r, _) => format!(
            "{} >> {}",
            render_expr(l, subs, 0),
            render_expr(r, subs, 0)
        ),
        Expr::Pipe(l, r, _) => format!("{} |> {}", render_expr(l, subs, 0), render_expr(r, subs, 0)),
    }
}

fn render_call(func: &Expr, args: &[CallArg], subs: &[(&str, &Value)], min_prec: u8) -> String {
    if let Expr::Ident(name, _) = func {
        if let Some((prec, right_assoc)) = operator_info(name) {
            if args.len() == 2 {
                let (left_min, right_min) = if right_assoc {
                    (prec + 1, prec)
                } else {
                    (prec, prec + 1)
                };
                let left = render_call_arg(&args[0], subs, left_min);
                let right = render_call_arg(&args[1], subs, right_min);
                let text = format!("{left} {name} {right}");
                return if prec < min_prec {
                    format!("({text})")
                } else {
                    text
                };
            }
        }
        if name == "!" && args.len() == 1 {
            return format!("!{}", render_call_arg(&args[0], subs, 7));
        }
    }
    let rendered_args: Vec<String> = args.iter().map(|a| render_call_arg(a, subs, 0)).collect();
    format!("{}({})", render_expr(func, subs, 10), rendered_args.join(", "))
}

fn render_call_arg(arg: &CallArg, subs: &[(&str, &Value)], min_prec: u8) -> String {
    match arg {
        CallArg::Value(e) => render_expr(e, subs, min_prec),
        CallArg::Placeholder(_) => "_".to_string(),
        CallArg::Spread(e) => format!("...{}", render_expr(e, subs, 0)),
    }
}
