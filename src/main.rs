use clap::{Parser, Subcommand};
use numfu::ast::{CallArg, Expr, ExportStmt, ImportStmt, ListItem, Module, Stmt};
use numfu::config::{self, EvaluatorOptions, WELCOME_MESSAGE, WELCOME_SUBTITLE};
use numfu::env::Environment;
use numfu::error::{self, NumfuError};
use numfu::eval::EvalContext;
use numfu::module::ModuleResolver;
use numfu::{builtins, number, parser, print};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// NumFu: a pure functional expression language.
#[derive(Parser, Debug)]
#[command(name = "numfu")]
#[command(version = config::VERSION)]
#[command(about = "A pure functional expression language with arbitrary-precision numbers")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Script file to evaluate (no subcommand runs this directly)
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Decimal precision for Number rendering and rounding
    #[arg(long, global = true, default_value_t = config::DEFAULT_PRECISION)]
    precision: u32,

    /// Maximum non-tail recursion depth
    #[arg(long = "rec-depth", global = true, default_value_t = config::DEFAULT_MAX_RECURSION_DEPTH)]
    rec_depth: usize,

    /// Maximum trampoline tail-call iteration count
    #[arg(long = "iter-depth", global = true, default_value_t = config::DEFAULT_MAX_ITERATION_DEPTH)]
    iter_depth: usize,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start an interactive read-eval-print loop
    Repl,
    /// Parse a file to a serialized AST
    Ast {
        file: PathBuf,
        #[arg(short = 'o', long = "output", value_name = "OUT")]
        output: PathBuf,
        /// Restrict/override import resolution (pass with no values to
        /// record that the file resolves no imports, as the stdlib build
        /// step does for `builtins.nfu`)
        #[arg(long)]
        imports: Option<Vec<String>>,
    },
    /// Parse a file and report syntax errors without evaluating it
    Parse { file: PathBuf },
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    let options = EvaluatorOptions {
        precision: cli.precision,
        max_recursion_depth: cli.rec_depth,
        max_iteration_depth: cli.iter_depth,
    };

    let result = match cli.command {
        Some(Command::Repl) => run_repl(&options),
        Some(Command::Ast { file, output, imports }) => run_ast(&file, &output, imports),
        Some(Command::Parse { file }) => run_parse(&file),
        None => match cli.file {
            Some(file) => run_file(&file, &options),
            None => run_repl(&options),
        },
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            if e.is_syntax_or_import() {
                ExitCode::from(2)
            } else {
                ExitCode::from(1)
            }
        }
    }
}

/// `numfu FILE` — evaluate a file; non-`Unit` top-level expression results
/// are printed in source order (spec §6).
fn run_file(path: &Path, options: &EvaluatorOptions) -> error::Result<()> {
    let source = read_file(path)?;
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let results = numfu::evaluate(&source, dir, options)?;
    for value in &results {
        println!("{}", print::render_top_level(value));
    }
    Ok(())
}

/// `numfu repl` — each input line is a new top-level statement evaluated in
/// a persistent top frame (spec §6).
fn run_repl(options: &EvaluatorOptions) -> error::Result<()> {
    number::set_precision(options.precision);
    let env = Environment::new_top();
    builtins::register(&env);
    load_stdlib(&env)?;

    let ctx = EvalContext::new(options.max_recursion_depth, options.max_iteration_depth);
    let resolver = ModuleResolver::new();
    let dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    println!("{WELCOME_MESSAGE}");
    println!("{WELCOME_SUBTITLE}");

    let mut rl = DefaultEditor::new().map_err(|e| NumfuError::runtime(format!("failed to initialize REPL: {e}")))?;
    let history_file = ".numfu_history";
    let _ = rl.load_history(history_file);

    loop {
        match rl.readline("numfu> ") {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(&line);
                match parser::parse_module(&line) {
                    Ok(module) => match resolver.run_program(&module.statements, &env, &ctx, &dir) {
                        Ok(results) => {
                            for value in &results {
                                println!("{}", print::render_top_level(value));
                            }
                        }
                        Err(e) => eprintln!("{e}"),
                    },
                    Err(e) => eprintln!("{e}"),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{e}");
                break;
            }
        }
    }

    let _ = rl.save_history(history_file);
    Ok(())
}

/// `numfu parse FILE` — parse only, report syntax errors (spec §6).
fn run_parse(path: &Path) -> error::Result<()> {
    let source = read_file(path)?;
    parser::parse_module(&source)?;
    println!("ok");
    Ok(())
}

/// `numfu ast FILE -o OUT [--imports LIST]` — parse to a serialized AST
/// (spec §6); `--imports []` is how the stdlib build step records that
/// `builtins.nfu` resolves no imports of its own.
fn run_ast(path: &Path, output: &Path, imports: Option<Vec<String>>) -> error::Result<()> {
    if let Some(names) = &imports {
        if !names.is_empty() {
            log::warn!("--imports override is not yet consulted during parsing; ignoring {names:?}");
        }
    }
    let source = read_file(path)?;
    let module = parser::parse_module(&source)?;
    let tree = module_to_json(&module);
    let serialized = serde_json::to_string_pretty(&tree).map_err(|e| NumfuError::runtime(format!("failed to serialize AST: {e}")))?;
    std::fs::write(output, serialized).map_err(|e| NumfuError::runtime(format!("cannot write {}: {e}", output.display())))?;
    Ok(())
}

fn load_stdlib(env: &std::rc::Rc<Environment>) -> error::Result<()> {
    let source = include_str!("stdlib/builtins.nfu");
    let module = parser::parse_module(source).map_err(|e| NumfuError::runtime(format!("internal error: standard library failed to parse: {e}")))?;
    let ctx = EvalContext::new(config::DEFAULT_MAX_RECURSION_DEPTH, config::DEFAULT_MAX_ITERATION_DEPTH);
    let resolver = ModuleResolver::new();
    resolver
        .run_program(&module.statements, env, &ctx, Path::new("."))
        .map(|_| ())
        .map_err(|e| NumfuError::runtime(format!("internal error: standard library failed to evaluate: {e}")))
}

fn read_file(path: &Path) -> error::Result<String> {
    std::fs::read_to_string(path).map_err(|e| NumfuError::runtime(format!("cannot read {}: {e}", path.display())))
}

/// A plain JSON tree mirroring the AST's shape, for `numfu ast`'s output.
/// This is deliberately independent of `serde::Serialize` on the AST types
/// themselves — the tooling format is allowed to diverge from the in-memory
/// representation without forcing every AST node to carry serde derives.
fn module_to_json(module: &Module) -> serde_json::Value {
    json!({ "statements": module.statements.iter().map(stmt_to_json).collect::<Vec<_>>() })
}

fn stmt_to_json(stmt: &Stmt) -> serde_json::Value {
    match stmt {
        Stmt::Expr(e) => json!({ "type": "Expr", "expr": expr_to_json(e) }),
        Stmt::Let { name, value } => json!({ "type": "Let", "name": name, "value": expr_to_json(value) }),
        Stmt::Del { name, .. } => json!({ "type": "Del", "name": name }),
        Stmt::Import(ImportStmt::Named { names, path, .. }) => {
            json!({ "type": "Import", "form": "named", "names": names, "path": path })
        }
        Stmt::Import(ImportStmt::All { path, .. }) => json!({ "type": "Import", "form": "all", "path": path }),
        Stmt::Import(ImportStmt::Whole { path, .. }) => json!({ "type": "Import", "form": "whole", "path": path }),
        Stmt::Export(ExportStmt::Names(names)) => json!({ "type": "Export", "form": "names", "names": names }),
        Stmt::Export(ExportStmt::Assign { name, value }) => {
            json!({ "type": "Export", "form": "assign", "name": name, "value": expr_to_json(value) })
        }
        Stmt::Assert { expr, pred, .. } => json!({ "type": "Assert", "expr": expr_to_json(expr), "pred": expr_to_json(pred) }),
    }
}

fn expr_to_json(expr: &Expr) -> serde_json::Value {
    match expr {
        Expr::Number(n, _) => json!({ "type": "Number", "value": n.render() }),
        Expr::Bool(b, _) => json!({ "type": "Bool", "value": b }),
        Expr::Str(s, _) => json!({ "type": "Str", "value": s }),
        Expr::Ident(name, _) => json!({ "type": "Ident", "name": name }),
        Expr::Dollar(_) => json!({ "type": "Dollar" }),
        Expr::Placeholder(_) => json!({ "type": "Placeholder" }),
        Expr::ListLit(items, _) => json!({
            "type": "ListLit",
            "items": items.iter().map(|item| match item {
                ListItem::Item(e) => json!({ "spread": false, "expr": expr_to_json(e) }),
                ListItem::Spread(e) => json!({ "spread": true, "expr": expr_to_json(e) }),
            }).collect::<Vec<_>>(),
        }),
        Expr::Lambda(def) => json!({
            "type": "Lambda",
            "name": def.name,
            "params": def.params.iter().map(|p| json!({ "name": p.name, "is_rest": p.is_rest })).collect::<Vec<_>>(),
            "body": expr_to_json(&def.body),
        }),
        Expr::Call { func, args, .. } => json!({
            "type": "Call",
            "func": expr_to_json(func),
            "args": args.iter().map(call_arg_to_json).collect::<Vec<_>>(),
        }),
        Expr::Index { target, index, .. } => json!({
            "type": "Index",
            "target": expr_to_json(target),
            "index": expr_to_json(index),
        }),
        Expr::If { cond, then_branch, else_branch, .. } => json!({
            "type": "If",
            "cond": expr_to_json(cond),
            "then": expr_to_json(then_branch),
            "else": expr_to_json(else_branch),
        }),
        Expr::Let { bindings, body, .. } => json!({
            "type": "Let",
            "bindings": bindings.iter().map(|(n, v)| json!({ "name": n, "value": expr_to_json(v) })).collect::<Vec<_>>(),
            "body": expr_to_json(body),
        }),
        Expr::And(l, r, _) => json!({ "type": "And", "left": expr_to_json(l), "right": expr_to_json(r) }),
        Expr::Or(l, r, _) => json!({ "type": "Or", "left": expr_to_json(l), "right": expr_to_json(r) }),
        Expr::Chain { operands, ops, .. } => json!({
            "type": "Chain",
            "operands": operands.iter().map(expr_to_json).collect::<Vec<_>>(),
            "ops": ops.iter().map(|op| op.symbol()).collect::<Vec<_>>(),
        }),
        Expr::Compose(l, r, _) => json!({ "type": "Compose", "left": expr_to_json(l), "right": expr_to_json(r) }),
        Expr::Pipe(l, r, _) => json!({ "type": "Pipe", "left": expr_to_json(l), "right": expr_to_json(r) }),
    }
}

fn call_arg_to_json(arg: &CallArg) -> serde_json::Value {
    match arg {
        CallArg::Value(e) => json!({ "kind": "value", "expr": expr_to_json(e) }),
        CallArg::Placeholder(_) => json!({ "kind": "placeholder" }),
        CallArg::Spread(e) => json!({ "kind": "spread", "expr": expr_to_json(e) }),
    }
}
