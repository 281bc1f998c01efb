use miette::Report;
use serde_json::json;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use tson_core::error::{ErrorKind, TsonError};
use tson_core::resolver::{Resolution, Resolver};
use tson_core::ParseOptions;

fn write_files(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (name, contents) in files {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }
    dir
}

fn resolve_ok(dir: &Path, file_name: &str, options: &ParseOptions) -> Resolution {
    let mut resolver = Resolver::new();
    match resolver.resolve_file(&dir.join(file_name), options) {
        Ok(resolution) => resolution,
        Err(err) => {
            let report = Report::from(err);
            panic!("{:?}", report);
        }
    }
}

fn resolve_err(dir: &Path, file_name: &str, options: &ParseOptions) -> TsonError {
    let mut resolver = Resolver::new();
    match resolver.resolve_file(&dir.join(file_name), options) {
        Ok(_) => panic!("Expected a TsonError, but got Ok"),
        Err(err) => err,
    }
}

#[test]
fn test_nested_imports_resolve_relative_to_each_file() {
    let dir = write_files(&[
        ("main.tson", "import db from \"./config/db.tson\";\n{ database: db }"),
        (
            "config/db.tson",
            "import creds from \"../secrets/creds.tson\";\n{ host: \"db\", creds: creds }",
        ),
        ("secrets/creds.tson", "{ user: 'admin' }"),
    ]);
    let resolution = resolve_ok(dir.path(), "main.tson", &ParseOptions::strict());
    assert_eq!(
        resolution.value,
        json!({"database": {"host": "db", "creds": {"user": "admin"}}})
    );
}

#[test]
fn test_diamond_imports_are_not_cycles() {
    let dir = write_files(&[
        (
            "main.tson",
            "import left from \"left.tson\";\nimport right from \"right.tson\";\n[left, right]",
        ),
        ("left.tson", "import shared from \"shared.tson\";\n{ l: shared }"),
        ("right.tson", "import shared from \"shared.tson\";\n{ r: shared }"),
        ("shared.tson", "42"),
    ]);
    let resolution = resolve_ok(dir.path(), "main.tson", &ParseOptions::strict());
    assert_eq!(resolution.value, json!([{"l": 42}, {"r": 42}]));
}

#[test]
fn test_imported_constants_do_not_leak() {
    let dir = write_files(&[
        ("main.tson", "import child from \"child.tson\";\n{ child: child, leak: SECRET }"),
        ("child.tson", "const SECRET = 1;\n{ s: SECRET }"),
    ]);
    let err = resolve_err(dir.path(), "main.tson", &ParseOptions::strict());
    assert_eq!(err.kind(), ErrorKind::SyntaxError);
    assert_eq!(err.line(), Some(2));
}

#[test]
fn test_import_inherits_parent_flags() {
    let dir = write_files(&[
        ("main.tson", "import child from \"child.tson\";\n[child]"),
        ("child.tson", "[1, 2,]"),
    ]);
    let options = ParseOptions::strict().with_trailing_commas(false);
    let err = resolve_err(dir.path(), "main.tson", &options);
    assert_eq!(err.kind(), ErrorKind::ImportParseFailure);
    assert_eq!(err.origin().kind(), ErrorKind::SyntaxError);
}

#[test]
fn test_disabled_tson_imports_leave_statement() {
    let dir = write_files(&[
        ("main.tson", "import child from \"child.tson\";\n[child]"),
        ("child.tson", "1"),
    ]);
    let options = ParseOptions::strict().with_tson_imports(false);
    let err = resolve_err(dir.path(), "main.tson", &options);
    assert_eq!(err.kind(), ErrorKind::SyntaxError);
    assert_eq!(err.line(), Some(1));
}

#[test]
fn test_json_import_is_not_extended() {
    let dir = write_files(&[
        ("main.tson", "import data from \"data.json\";\n{ data: data }"),
        ("data.json", "{ bare: 1 }"),
    ]);
    let err = resolve_err(dir.path(), "main.tson", &ParseOptions::strict());
    assert_eq!(err.kind(), ErrorKind::ImportParseFailure);
    assert_eq!(err.origin().kind(), ErrorKind::SyntaxError);

    let dir = write_files(&[
        ("main.tson", "import data from \"data.json\";\n{ data: data }"),
        ("data.json", r#"{ "quoted": 1 }"#),
    ]);
    let resolution = resolve_ok(dir.path(), "main.tson", &ParseOptions::strict());
    assert_eq!(resolution.value, json!({"data": {"quoted": 1}}));
}

#[test]
fn test_absolute_import_path() {
    let shared = write_files(&[("shared.tson", "{ abs: true }")]);
    let absolute = shared.path().join("shared.tson");
    let dir = write_files(&[(
        "main.tson",
        &format!("import s from \"{}\";\n[s]", absolute.display()),
    )]);
    let resolution = resolve_ok(dir.path(), "main.tson", &ParseOptions::strict());
    assert_eq!(resolution.value, json!([{"abs": true}]));
}

#[test]
fn test_transitive_cycle() {
    let dir = write_files(&[
        ("a.tson", "import b from \"b.tson\";\n[b]"),
        ("b.tson", "import c from \"c.tson\";\n[c]"),
        ("c.tson", "import a from \"a.tson\";\n[a]"),
    ]);
    let err = resolve_err(dir.path(), "a.tson", &ParseOptions::strict());
    match err.origin() {
        TsonError::ImportCycle { cycle, line, .. } => {
            assert_eq!(*line, 1);
            let hops: Vec<_> = cycle.split(" -> ").collect();
            assert_eq!(hops.len(), 4);
            assert!(hops[0].ends_with("a.tson"));
            assert!(hops[3].ends_with("a.tson"));
        }
        other => panic!("expected an import cycle, got {other:?}"),
    }
}

#[test]
fn test_import_name_substitution_is_forward_only() {
    let dir = write_files(&[
        ("main.tson", "[x,\nimport x from \"x.tson\";\nx]"),
        ("x.tson", "1"),
    ]);
    let err = resolve_err(dir.path(), "main.tson", &ParseOptions::strict());
    assert_eq!(err.kind(), ErrorKind::SyntaxError);
    assert_eq!(err.line(), Some(1));
}

#[test]
fn test_string_source_uses_base_dir() {
    let dir = write_files(&[("part.tson", "{ p: 1 }")]);
    let options = ParseOptions::strict().with_base_dir(dir.path());
    let resolution = Resolver::new()
        .resolve_source("import part from \"part.tson\";\n{ ...part, q: 2 }", None, &options)
        .unwrap();
    assert_eq!(resolution.value, json!({"p": 1, "q": 2}));
    assert_eq!(resolution.imports.len(), 1);
}
