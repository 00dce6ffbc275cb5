// ABOUTME: Module resolution: local-file lookup, canonicalization, cycle detection, caching

use crate::ast::{ExportStmt, ImportStmt, Stmt};
use crate::env::Environment;
use crate::error::{NumfuError, Result};
use crate::eval::{eval, EvalContext};
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

enum ModuleState {
    Loading,
    Ready(Rc<HashMap<String, Value>>),
}

/// Resolves, parses, evaluates, and caches imported modules for one
/// top-level `evaluate` call (spec §4.2). Caching and cycle detection are
/// scoped to this resolver instance, which — since the CLI makes exactly
/// one `evaluate` call per process — is equivalent to the process-wide
/// cache the spec describes (see DESIGN.md).
pub struct ModuleResolver {
    cache: RefCell<HashMap<PathBuf, ModuleState>>,
}

impl ModuleResolver {
    pub fn new() -> Self {
        ModuleResolver {
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// Loads (or returns the cached) exports of `path` as seen from the
    /// importing file's directory `from_dir`.
    pub fn load(&self, path: &str, from_dir: &Path, ctx: &EvalContext) -> Result<Rc<HashMap<String, Value>>> {
        validate_module_name(path)?;
        let resolved = resolve_path(path, from_dir)?;
        let canonical = fs::canonicalize(&resolved)
            .map_err(|_| NumfuError::import(format!("Cannot find module {path}")))?;

        if let Some(state) = self.cache.borrow().get(&canonical) {
            return match state {
                ModuleState::Loading => Err(NumfuError::import("cyclic import")),
                ModuleState::Ready(exports) => Ok(Rc::clone(exports)),
            };
        }
        self.cache.borrow_mut().insert(canonical.clone(), ModuleState::Loading);

        let source = fs::read_to_string(&canonical).map_err(|_| NumfuError::import(format!("Cannot find module {path}")))?;
        let module = crate::parser::parse_module(&source).map_err(|mut e| {
            if let Some(span) = &mut e.span {
                span.file = Some(canonical.clone());
            }
            e
        })?;

        let module_env = Environment::new_top();
        crate::builtins::register(&module_env);
        let module_dir = canonical.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."));
        let result = self.run_module(&module.statements, &module_env, ctx, &module_dir);

        // A failed load must not leave the module stuck in `Loading` for
        // any later (non-cyclic) import attempt (spec §5 resource cleanup).
        let exports = match result {
            Ok(exports) => exports,
            Err(e) => {
                self.cache.borrow_mut().remove(&canonical);
                return Err(e);
            }
        };

        let exports = Rc::new(exports);
        self.cache.borrow_mut().insert(canonical, ModuleState::Ready(Rc::clone(&exports)));
        Ok(exports)
    }

    fn run_module(&self, statements: &[Stmt], env: &Rc<Environment>, ctx: &EvalContext, dir: &Path) -> Result<HashMap<String, Value>> {
        let mut exports = HashMap::new();
        for stmt in statements {
            self.run_statement(stmt, env, ctx, dir, &mut exports, &mut |_| {})?;
        }
        Ok(exports)
    }

    fn run_statement(
        &self,
        stmt: &Stmt,
        env: &Rc<Environment>,
        ctx: &EvalContext,
        dir: &Path,
        exports: &mut HashMap<String, Value>,
        emit: &mut dyn FnMut(Value),
    ) -> Result<()> {
        match stmt {
            Stmt::Expr(e) => {
                let v = eval(e, Rc::clone(env), ctx)?;
                if !matches!(v, Value::Unit) {
                    emit(v);
                }
            }
            Stmt::Let { name, value } => {
                let v = eval(value, Rc::clone(env), ctx)?;
                env.define(name.clone(), v);
            }
            Stmt::Del { name, span } => {
                if !env.undefine(name) {
                    return Err(NumfuError::name(format!("name '{name}' is not defined")).at(span.clone()));
                }
            }
            Stmt::Assert { expr, pred, expr_span } => {
                let value = eval(expr, Rc::clone(env), ctx)?;
                let pred_env = Environment::child(env);
                pred_env.define("$", value);
                match eval(pred, pred_env, ctx)? {
                    Value::Boolean(true) => {}
                    Value::Boolean(false) => return Err(NumfuError::assertion("assertion failed").at(expr_span.clone())),
                    other => {
                        return Err(NumfuError::type_error(format!(
                            "assertion predicate must be a Boolean, got {}",
                            other.type_name()
                        ))
                        .at(expr_span.clone()))
                    }
                }
            }
            Stmt::Import(import) => self.run_import(import, env, ctx, dir)?,
            Stmt::Export(export) => match export {
                ExportStmt::Names(names) => {
                    for name in names {
                        let v = env.get(name).ok_or_else(|| NumfuError::name(format!("name '{name}' is not defined")))?;
                        exports.insert(name.clone(), v);
                    }
                }
                ExportStmt::Assign { name, value } => {
                    let v = eval(value, Rc::clone(env), ctx)?;
                    env.define(name.clone(), v.clone());
                    exports.insert(name.clone(), v);
                }
            },
        }
        Ok(())
    }

    fn run_import(&self, import: &ImportStmt, env: &Rc<Environment>, ctx: &EvalContext, dir: &Path) -> Result<()> {
        match import {
            ImportStmt::Named { names, path, span } => {
                let exports = self.load(path, dir, ctx)?;
                for name in names {
                    let v = exports.get(name).cloned().ok_or_else(|| {
                        NumfuError::import(format!("module {path} does not export an identifier named {name}")).at(span.clone())
                    })?;
                    env.define(name.clone(), v);
                }
            }
            ImportStmt::All { path, .. } => {
                let exports = self.load(path, dir, ctx)?;
                for (name, v) in exports.iter() {
                    env.define(name.clone(), v.clone());
                }
            }
            ImportStmt::Whole { path, .. } => {
                let exports = self.load(path, dir, ctx)?;
                let prefix = module_prefix(path);
                for (name, v) in exports.iter() {
                    env.define(format!("{prefix}.{name}"), v.clone());
                }
            }
        }
        Ok(())
    }

    /// Evaluates the main program's top-level, collecting each non-`Unit`
    /// result in source order (the host prints them, per spec §4.7).
    pub fn run_program(&self, statements: &[Stmt], env: &Rc<Environment>, ctx: &EvalContext, dir: &Path) -> Result<Vec<Value>> {
        let mut exports = HashMap::new();
        let mut results = Vec::new();
        for stmt in statements {
            self.run_statement(stmt, env, ctx, dir, &mut exports, &mut |v| results.push(v))?;
        }
        Ok(results)
    }
}

impl Default for ModuleResolver {
    fn default() -> Self {
        Self::new()
    }
}

fn module_prefix(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path).trim_end_matches(".nfu")
}

fn validate_module_name(path: &str) -> Result<()> {
    let chars_ok = !path.is_empty()
        && path.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '/' | '-'));
    let no_empty_segments = path.split('/').all(|seg| !seg.is_empty());
    if !chars_ok || !no_empty_segments {
        return Err(NumfuError::import(format!("\"{path}\" is an invalid module name")));
    }
    Ok(())
}

fn resolve_path(path: &str, from_dir: &Path) -> Result<PathBuf> {
    let direct = from_dir.join(format!("{path}.nfu"));
    if direct.is_file() {
        return Ok(direct);
    }
    let index = from_dir.join(path).join("index.nfu");
    if index.is_file() {
        return Ok(index);
    }
    Err(NumfuError::import(format!("Cannot find module {path}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_module_names() {
        assert!(validate_module_name("").is_err());
        assert!(validate_module_name("a//b").is_err());
        assert!(validate_module_name("a b").is_err());
        assert!(validate_module_name("valid/../name-1.2").is_ok());
    }

    #[test]
    fn missing_module_is_import_error() {
        let resolver = ModuleResolver::new();
        let ctx = EvalContext::new(2048, 1_000_000);
        let err = resolver.load("nonexistent_module_xyz", Path::new("."), &ctx).unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::ImportError);
    }
}
