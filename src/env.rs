// ABOUTME: Chained lexical environments; the bottom frame is the mutable top-level scope

use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// A single frame in the environment chain. Only the bottom (top-level)
/// frame is ever mutated after creation; frames pushed by `let ... in`
/// and lambda calls are write-once.
#[derive(Debug)]
pub struct Environment {
    bindings: RefCell<HashMap<String, Value>>,
    parent: Option<Rc<Environment>>,
}

impl Environment {
    /// The top-level (mutable) environment with no parent.
    pub fn new_top() -> Rc<Self> {
        Rc::new(Environment {
            bindings: RefCell::new(HashMap::new()),
            parent: None,
        })
    }

    pub fn child(parent: &Rc<Environment>) -> Rc<Self> {
        Rc::new(Environment {
            bindings: RefCell::new(HashMap::new()),
            parent: Some(Rc::clone(parent)),
        })
    }

    /// Defines (or replaces) a binding in this exact frame.
    pub fn define(&self, name: impl Into<String>, value: Value) {
        self.bindings.borrow_mut().insert(name.into(), value);
    }

    /// Removes a binding from this exact frame, if present.
    pub fn undefine(&self, name: &str) -> bool {
        self.bindings.borrow_mut().remove(name).is_some()
    }

    /// Looks up a name, walking child -> parent. First hit wins (shadowing).
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.bindings.borrow().get(name) {
            return Some(value.clone());
        }
        match &self.parent {
            Some(parent) => parent.get(name),
            None => None,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::number::Number;

    #[test]
    fn shadowing_prefers_child_frame() {
        let top = Environment::new_top();
        top.define("x", Value::Number(Number::from_i64(1)));
        let child = Environment::child(&top);
        child.define("x", Value::Number(Number::from_i64(2)));
        match child.get("x") {
            Some(Value::Number(n)) => assert!(n.num_eq(&Number::from_i64(2))),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn child_sees_parent_bindings() {
        let top = Environment::new_top();
        top.define("x", Value::Number(Number::from_i64(1)));
        let child = Environment::child(&top);
        assert!(child.contains("x"));
    }

    #[test]
    fn undefine_removes_only_from_its_own_frame() {
        let top = Environment::new_top();
        top.define("x", Value::Number(Number::from_i64(1)));
        assert!(top.undefine("x"));
        assert!(top.get("x").is_none());
    }
}
