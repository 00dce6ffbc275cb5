// ABOUTME: Runtime values: numbers, booleans, strings, lists, and curryable callables

use crate::ast::LambdaDef;
use crate::env::Environment;
use crate::number::Number;
use std::fmt;
use std::rc::Rc;

/// One positional slot of a partially applied callable: either still open
/// (reserved by a placeholder) or already bound to a value.
#[derive(Debug, Clone)]
pub enum Slot {
    Hole,
    Filled(Value),
}

impl Slot {
    pub fn is_hole(&self) -> bool {
        matches!(self, Slot::Hole)
    }
}

/// A native function's behavior, called once every fixed/rest slot is filled.
pub type NativeFn = Rc<dyn Fn(Vec<Value>) -> crate::error::Result<Value>>;

/// A built-in operation: fixed arity plus an optional trailing rest
/// parameter, sharing the closure curry/placeholder protocol (spec: a
/// `Builtin` is a native operation with the same curry/placeholder protocol
/// as a `Closure`).
#[derive(Clone)]
pub struct Builtin {
    pub name: Rc<str>,
    pub arity: usize,
    pub has_rest: bool,
    pub bound: Vec<Slot>,
    pub rest: Vec<Slot>,
    pub func: NativeFn,
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builtin")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .field("has_rest", &self.has_rest)
            .field("bound", &self.bound)
            .field("rest", &self.rest)
            .finish()
    }
}

impl Builtin {
    pub fn new(name: &str, arity: usize, has_rest: bool, func: NativeFn) -> Self {
        Builtin {
            name: Rc::from(name),
            arity,
            has_rest,
            bound: vec![Slot::Hole; arity],
            rest: Vec::new(),
            func,
        }
    }
}

/// A closure: a lambda definition plus captured environment and the current
/// curry/placeholder state of its fixed and rest parameter slots.
#[derive(Debug, Clone)]
pub struct Closure {
    pub def: Rc<LambdaDef>,
    pub env: Rc<Environment>,
    pub bound: Vec<Slot>,
    pub rest: Vec<Slot>,
}

impl Closure {
    /// A fresh, fully unapplied closure over `def`, captured in `env`.
    pub fn new(def: Rc<LambdaDef>, env: Rc<Environment>) -> Self {
        let fixed_arity = def.params.iter().filter(|p| !p.is_rest).count();
        Closure {
            def,
            env,
            bound: vec![Slot::Hole; fixed_arity],
            rest: Vec::new(),
        }
    }

    pub fn has_rest(&self) -> bool {
        self.def.params.last().is_some_and(|p| p.is_rest)
    }
}

#[derive(Clone)]
pub enum Value {
    Number(Number),
    Boolean(bool),
    String(String),
    List(Rc<Vec<Value>>),
    Closure(Rc<Closure>),
    Builtin(Rc<Builtin>),
    Unit,
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "Number",
            Value::Boolean(_) => "Boolean",
            Value::String(_) => "String",
            Value::List(_) => "List",
            Value::Closure(_) | Value::Builtin(_) => "Function",
            Value::Unit => "Unit",
        }
    }

    /// Truthiness for `if`/`&&`/`||` (spec §4.6): only `Boolean` is allowed.
    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Closure(_) | Value::Builtin(_))
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", crate::print::debug_render(self))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a.num_eq(b),
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Unit, Value::Unit) => true,
            (Value::Closure(a), Value::Closure(b)) => closures_equal(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => {
                a.name == b.name && slots_equal(&a.bound, &b.bound) && slots_equal(&a.rest, &b.rest)
            }
            _ => false,
        }
    }
}

fn slots_equal(a: &[Slot], b: &[Slot]) -> bool {
    a.len() == b.len()
        && a.iter().zip(b.iter()).all(|pair| match pair {
            (Slot::Hole, Slot::Hole) => true,
            (Slot::Filled(x), Slot::Filled(y)) => x == y,
            _ => false,
        })
}

/// Closure equality per the resolved open question: same AST node identity
/// (`Rc::ptr_eq` on the definition), same captured environment frame, and
/// structurally equal bound/placeholder state.
fn closures_equal(a: &Closure, b: &Closure) -> bool {
    Rc::ptr_eq(&a.def, &b.def)
        && Rc::ptr_eq(&a.env, &b.env)
        && slots_equal(&a.bound, &b.bound)
        && slots_equal(&a.rest, &b.rest)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", crate::print::render_top_level(self))
    }
}
