// ABOUTME: Abstract syntax tree produced by the parser and consumed by the evaluator

use crate::error::Span;
use crate::number::Number;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Neq,
}

impl CompareOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Lt => "<",
            CompareOp::Gt => ">",
            CompareOp::Le => "<=",
            CompareOp::Ge => ">=",
            CompareOp::Eq => "==",
            CompareOp::Neq => "!=",
        }
    }

    pub fn from_symbol(s: &str) -> Option<Self> {
        match s {
            "<" => Some(CompareOp::Lt),
            ">" => Some(CompareOp::Gt),
            "<=" => Some(CompareOp::Le),
            ">=" => Some(CompareOp::Ge),
            "==" => Some(CompareOp::Eq),
            "!=" => Some(CompareOp::Neq),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
}

impl ArithOp {
    pub fn symbol(self) -> &'static str {
        match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "/",
            ArithOp::Mod => "%",
            ArithOp::Pow => "^",
        }
    }

    pub fn from_symbol(s: &str) -> Option<Self> {
        match s {
            "+" => Some(ArithOp::Add),
            "-" => Some(ArithOp::Sub),
            "*" => Some(ArithOp::Mul),
            "/" => Some(ArithOp::Div),
            "%" => Some(ArithOp::Mod),
            "^" => Some(ArithOp::Pow),
            _ => None,
        }
    }
}

/// A lambda parameter: a plain name, or a trailing `...name` rest parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub is_rest: bool,
}

/// A shared, immutable lambda definition: parameter list, body, and source span,
/// used both to build closures and to reconstruct their printed form (§4.7).
#[derive(Debug)]
pub struct LambdaDef {
    pub name: Option<String>,
    pub params: Vec<Param>,
    pub body: Expr,
    pub span: Span,
}

/// An item inside a list literal: a plain element, or a `...expr` spread.
#[derive(Debug, Clone)]
pub enum ListItem {
    Item(Expr),
    Spread(Expr),
}

/// An argument in a call's argument list.
#[derive(Debug, Clone)]
pub enum CallArg {
    Value(Expr),
    Placeholder(Span),
    Spread(Expr),
}

#[derive(Debug, Clone)]
pub enum Expr {
    Number(Number, Span),
    Bool(bool, Span),
    Str(String, Span),
    Ident(String, Span),
    /// `$`, valid only on the right-hand side of `--->`.
    Dollar(Span),
    /// `_` outside a call argument list; only produced transiently by the
    /// parser while desugaring operators, and otherwise a runtime error.
    Placeholder(Span),
    ListLit(Vec<ListItem>, Span),
    Lambda(Rc<LambdaDef>),
    Call {
        func: Box<Expr>,
        args: Vec<CallArg>,
        span: Span,
    },
    Index {
        target: Box<Expr>,
        index: Box<Expr>,
        span: Span,
    },
    If {
        cond: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
        span: Span,
    },
    Let {
        bindings: Vec<(String, Expr)>,
        body: Box<Expr>,
        span: Span,
    },
    And(Box<Expr>, Box<Expr>, Span),
    Or(Box<Expr>, Box<Expr>, Span),
    /// Chained comparison `a OP1 b OP2 c ...`; each operand is evaluated
    /// exactly once and adjacent pairs are compared (§4.1).
    Chain {
        operands: Vec<Expr>,
        ops: Vec<CompareOp>,
        span: Span,
    },
    /// `f >> g`
    Compose(Box<Expr>, Box<Expr>, Span),
    /// `x |> f`
    Pipe(Box<Expr>, Box<Expr>, Span),
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Number(_, s)
            | Expr::Bool(_, s)
            | Expr::Str(_, s)
            | Expr::Ident(_, s)
            | Expr::Dollar(s)
            | Expr::Placeholder(s)
            | Expr::ListLit(_, s)
            | Expr::Call { span: s, .. }
            | Expr::Index { span: s, .. }
            | Expr::If { span: s, .. }
            | Expr::Let { span: s, .. }
            | Expr::And(_, _, s)
            | Expr::Or(_, _, s)
            | Expr::Chain { span: s, .. }
            | Expr::Compose(_, _, s)
            | Expr::Pipe(_, _, s) => s.clone(),
            Expr::Lambda(def) => def.span.clone(),
        }
    }
}

/// `import N1, N2 from "PATH"` / `import * from "PATH"` / `import "PATH"`.
#[derive(Debug, Clone)]
pub enum ImportStmt {
    Named {
        names: Vec<String>,
        path: String,
        span: Span,
    },
    All {
        path: String,
        span: Span,
    },
    /// `import "PATH"` — prefixed access as `PATH_LAST_SEGMENT.NAME`.
    Whole {
        path: String,
        span: Span,
    },
}

/// `export N1, N2` / `export NAME = EXPR`.
#[derive(Debug, Clone)]
pub enum ExportStmt {
    Names(Vec<String>),
    Assign { name: String, value: Expr },
}

/// A top-level module statement.
#[derive(Debug, Clone)]
pub enum Stmt {
    Expr(Expr),
    Let {
        name: String,
        value: Expr,
    },
    Del {
        name: String,
        span: Span,
    },
    Import(ImportStmt),
    Export(ExportStmt),
    /// `EXPR ---> PRED` assertion sugar (§4.1).
    Assert {
        expr: Expr,
        pred: Expr,
        expr_span: Span,
    },
}

/// A fully parsed module: its top-level statements in source order.
#[derive(Debug, Clone, Default)]
pub struct Module {
    pub statements: Rc<Vec<Stmt>>,
}
