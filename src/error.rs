// ABOUTME: Error types for lexing, parsing, module resolution, and evaluation failures

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// A location in source text, used to point diagnostics at the offending code.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Span {
    pub file: Option<PathBuf>,
    pub line: usize,
    pub column: usize,
    pub width: usize,
}

impl Span {
    pub fn new(line: usize, column: usize, width: usize) -> Self {
        Span {
            file: None,
            line,
            column,
            width,
        }
    }

    pub fn with_file(mut self, file: PathBuf) -> Self {
        self.file = Some(file);
        self
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(path) => write!(f, "{}:{}:{}", path.display(), self.line, self.column),
            None => write!(f, "{}:{}", self.line, self.column),
        }
    }
}

/// The named error kind, observable from user code via `error(msg, "Tag")` (spec §7).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    SyntaxError,
    NameError,
    TypeError,
    IndexError,
    ValueError,
    AssertionError,
    RecursionError,
    ImportError,
    RuntimeError,
    Custom(String),
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::SyntaxError => write!(f, "SyntaxError"),
            ErrorKind::NameError => write!(f, "NameError"),
            ErrorKind::TypeError => write!(f, "TypeError"),
            ErrorKind::IndexError => write!(f, "IndexError"),
            ErrorKind::ValueError => write!(f, "ValueError"),
            ErrorKind::AssertionError => write!(f, "AssertionError"),
            ErrorKind::RecursionError => write!(f, "RecursionError"),
            ErrorKind::ImportError => write!(f, "ImportError"),
            ErrorKind::RuntimeError => write!(f, "RuntimeError"),
            ErrorKind::Custom(tag) => write!(f, "{}", tag),
        }
    }
}

/// A fatal NumFu error: propagates to the top-level call, carrying the
/// innermost source span at the point it was raised (§7).
#[derive(Error, Debug, Clone)]
#[error("{kind}: {message}")]
pub struct NumfuError {
    pub kind: ErrorKind,
    pub message: String,
    pub span: Option<Span>,
}

impl NumfuError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        NumfuError {
            kind,
            message: message.into(),
            span: None,
        }
    }

    /// Attach a span, but only if one hasn't already been recorded —
    /// the innermost call site wins as the error propagates outward.
    pub fn at(mut self, span: Span) -> Self {
        if self.span.is_none() {
            self.span = Some(span);
        }
        self
    }

    pub fn syntax(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SyntaxError, message)
    }

    pub fn name(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NameError, message)
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TypeError, message)
    }

    pub fn index(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::IndexError, message)
    }

    pub fn value(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ValueError, message)
    }

    pub fn assertion(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AssertionError, message)
    }

    pub fn recursion(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RecursionError, message)
    }

    pub fn import(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ImportError, message)
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RuntimeError, message)
    }

    pub fn custom(tag: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Custom(tag.into()), message)
    }

    /// Whether the host should report exit code 2 (syntax/import) per §6,
    /// rather than 1 (everything else).
    pub fn is_syntax_or_import(&self) -> bool {
        matches!(self.kind, ErrorKind::SyntaxError | ErrorKind::ImportError)
    }
}

pub type Result<T> = std::result::Result<T, NumfuError>;
