// ABOUTME: Import/export resolution, caching, and error cases

use numfu::config::EvaluatorOptions;
use numfu::error::ErrorKind;
use numfu::print::render_top_level;
use std::path::Path;

fn fixtures_dir() -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn eval_in_fixtures(source: &str) -> numfu::error::Result<Vec<numfu::value::Value>> {
    numfu::evaluate(source, &fixtures_dir(), &EvaluatorOptions::default())
}

#[test]
fn named_import_binds_selected_exports() {
    let results = eval_in_fixtures(r#"import square from "math_utils"; square(5)"#).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(render_top_level(&results[0]), "25");
}

#[test]
fn whole_import_prefixes_exports_by_module_name() {
    let results = eval_in_fixtures(r#"import "math_utils"; math_utils.cube(3)"#).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(render_top_level(&results[0]), "27");
}

#[test]
fn star_import_binds_every_export_unprefixed() {
    let results = eval_in_fixtures(r#"import * from "math_utils"; square(2) + cube(2)"#).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(render_top_level(&results[0]), "12");
}

#[test]
fn cyclic_import_is_rejected() {
    let err = eval_in_fixtures(r#"import y from "cycle_a"; y"#).unwrap_err();
    assert_eq!(err.kind, ErrorKind::ImportError);
    assert!(err.message.contains("cyclic"), "unexpected message: {}", err.message);
}

#[test]
fn missing_module_is_an_import_error() {
    let err = eval_in_fixtures(r#"import x from "does_not_exist"; x"#).unwrap_err();
    assert_eq!(err.kind, ErrorKind::ImportError);
}

#[test]
fn missing_export_is_an_import_error() {
    let err = eval_in_fixtures(r#"import notExported from "math_utils"; notExported"#).unwrap_err();
    assert_eq!(err.kind, ErrorKind::ImportError);
}

#[test]
fn invalid_module_name_is_rejected_before_filesystem_lookup() {
    let err = eval_in_fixtures(r#"import x from "a//b"; x"#).unwrap_err();
    assert_eq!(err.kind, ErrorKind::ImportError);
    assert!(err.message.contains("invalid module name"), "unexpected message: {}", err.message);
}

#[test]
fn a_modules_top_level_runs_exactly_once_even_when_imported_twice() {
    // math_utils is imported by name and by prefix in the same program;
    // nothing here distinguishes repeat evaluation from a cache hit, but
    // both forms must still see the same exported values.
    let results = eval_in_fixtures(
        r#"import square from "math_utils"; import "math_utils"; square(4) == math_utils.square(4)"#,
    )
    .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(render_top_level(&results[0]), "true");
}
