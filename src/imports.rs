use crate::bindings::BindingTable;
use crate::decoder::decode;
use crate::error::TsonError;
use crate::options::ParseOptions;
use crate::resolver::{read_source, Resolver};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Extension of documents that are imported through the full pipeline.
pub const TSON_EXTENSION: &str = "tson";
/// Extension of plain documents that are imported through the strict decoder only.
pub const JSON_EXTENSION: &str = "json";

static IMPORT_STATEMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^\s*import\s+([A-Za-z_$][A-Za-z0-9_$]*)\s+from\s+(?:"([^"]*)"|'([^']*)')\s*;?"#,
    )
    .expect("valid import regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    /// A `.tson` document, parsed recursively with the parent's options.
    Tson,
    /// A `.json` document, decoded as-is.
    Json,
}

/// `import <name> from "<path>";` at the start of a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportStatement {
    pub name: String,
    /// The path exactly as written.
    pub target: PathBuf,
    pub kind: ImportKind,
    /// Byte offset just past the statement, where the rest of the line begins.
    pub end: usize,
}

impl ImportStatement {
    /// Whether `options` permit this kind of import.
    pub fn is_enabled(&self, options: &ParseOptions) -> bool {
        match self.kind {
            ImportKind::Tson => options.allow_tson_imports,
            ImportKind::Json => options.allow_imports,
        }
    }
}

/// Recognizes an import statement whose target has a `.tson` or `.json` extension.
pub fn parse_import(line: &str) -> Option<ImportStatement> {
    let captures = IMPORT_STATEMENT.captures(line)?;
    let end = captures.get(0)?.end();
    let name = captures.get(1)?.as_str().to_string();
    let target = captures.get(2).or_else(|| captures.get(3))?.as_str();
    let target = PathBuf::from(target);
    let extension = target.extension()?.to_str()?;
    let kind = if extension.eq_ignore_ascii_case(TSON_EXTENSION) {
        ImportKind::Tson
    } else if extension.eq_ignore_ascii_case(JSON_EXTENSION) {
        ImportKind::Json
    } else {
        return None;
    };
    Some(ImportStatement {
        name,
        target,
        kind,
        end,
    })
}

/// Runs the import pass over raw document text.
///
/// Each enabled import statement is resolved, bound in `imports`, and blanked out; code
/// following it on the same line already sees the new binding. Every other line is
/// substituted with the imports bound above it. In lenient mode a failed import is reported
/// and its name stays unbound.
pub fn resolve_imports(
    text: &str,
    path: Option<&Path>,
    options: &ParseOptions,
    resolver: &mut Resolver,
    imports: &mut BindingTable,
) -> Result<String, TsonError> {
    let mut out = String::with_capacity(text.len());

    for (index, chunk) in text.split_inclusive('\n').enumerate() {
        let line = chunk.trim_end_matches(['\n', '\r']);
        let terminator = &chunk[line.len()..];

        match parse_import(line).filter(|statement| statement.is_enabled(options)) {
            Some(statement) => {
                let line_number = index + 1;
                match resolve_import(&statement, line_number, path, options, resolver) {
                    Ok(value) => imports.bind(statement.name, value),
                    Err(err) if options.strict => return Err(err),
                    Err(err) => {
                        log::warn!(
                            "{}:{line_number}: import `{}` left unresolved: {err}",
                            display_path(path),
                            statement.name
                        );
                    }
                }
                out.push_str(&imports.substitute_after(line, statement.end));
            }
            None => out.push_str(&imports.substitute_line(line)),
        }
        out.push_str(terminator);
    }

    Ok(out)
}

fn resolve_import(
    statement: &ImportStatement,
    line: usize,
    path: Option<&Path>,
    options: &ParseOptions,
    resolver: &mut Resolver,
) -> Result<Value, TsonError> {
    let location = if statement.target.is_absolute() {
        statement.target.clone()
    } else {
        options.resolved_base_dir().join(&statement.target)
    };
    log::debug!(
        "resolving import `{}` from {}",
        statement.name,
        location.display()
    );

    if !location.is_file() {
        return Err(TsonError::ImportNotFound {
            target: statement.target.clone(),
            path: path.map(Path::to_path_buf),
            line,
        });
    }
    let canonical = location
        .canonicalize()
        .map_err(|source| TsonError::ReadFailure {
            path: location.clone(),
            source,
        })?;

    if resolver.is_resolving(&canonical) {
        return Err(TsonError::ImportCycle {
            cycle: resolver.cycle_through(&canonical),
            path: path.map(Path::to_path_buf),
            line,
        });
    }

    let result = match statement.kind {
        ImportKind::Tson => resolver
            .resolve_file(&canonical, options)
            .map(|resolution| resolution.value),
        ImportKind::Json => {
            read_source(&canonical).and_then(|source| decode(&source, Some(&canonical)))
        }
    };

    result.map_err(|cause| TsonError::ImportParseFailure {
        name: statement.name.clone(),
        target: statement.target.clone(),
        path: path.map(Path::to_path_buf),
        line,
        cause: cause.into(),
    })
}

fn display_path(path: Option<&Path>) -> String {
    path.map_or_else(|| "<string>".to_string(), |p| p.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_import_statement() {
        let statement = parse_import(r#"import base from "./base.tson";"#).unwrap();
        assert_eq!(statement.name, "base");
        assert_eq!(statement.target, PathBuf::from("./base.tson"));
        assert_eq!(statement.kind, ImportKind::Tson);
        assert_eq!(statement.end, 31);
    }

    #[test]
    fn test_parse_import_variants() {
        let statement = parse_import("  import data from 'shared/data.json'   // plain").unwrap();
        assert_eq!(statement.kind, ImportKind::Json);
        assert_eq!(statement.target, PathBuf::from("shared/data.json"));
        assert!(parse_import(r#"import x from "./notes.txt";"#).is_none());
        assert!(parse_import(r#"import x from "./noext";"#).is_none());
        assert!(parse_import(r#"// import x from "./a.tson";"#).is_none());
        assert!(parse_import(r#"{ import: "a.tson" }"#).is_none());
    }

    #[test]
    fn test_parse_import_followed_by_code() {
        let line = r#"import x from "./base.tson"; { "b": x }"#;
        let statement = parse_import(line).unwrap();
        assert_eq!(statement.name, "x");
        assert_eq!(&line[statement.end..], r#" { "b": x }"#);
    }

    #[test]
    fn test_disabled_kinds() {
        let tson = parse_import(r#"import a from "a.tson";"#).unwrap();
        let json = parse_import(r#"import b from "b.json";"#).unwrap();
        let options = ParseOptions::default().with_tson_imports(false);
        assert!(!tson.is_enabled(&options));
        assert!(json.is_enabled(&options));
        let options = ParseOptions::default().with_imports(false);
        assert!(tson.is_enabled(&options));
        assert!(!json.is_enabled(&options));
    }

    #[test]
    fn test_missing_import_in_strict_mode() {
        let dir = tempfile::tempdir().unwrap();
        let options = ParseOptions::strict().with_base_dir(dir.path());
        let mut resolver = Resolver::new();
        let mut imports = BindingTable::new();
        let err = resolve_imports(
            "import gone from \"./gone.tson\";\n{}",
            None,
            &options,
            &mut resolver,
            &mut imports,
        )
        .unwrap_err();
        match err {
            TsonError::ImportNotFound { target, line, .. } => {
                assert_eq!(target, PathBuf::from("./gone.tson"));
                assert_eq!(line, 1);
            }
            other => panic!("expected ImportNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_import_in_lenient_mode_leaves_name() {
        let dir = tempfile::tempdir().unwrap();
        let options = ParseOptions::default().with_base_dir(dir.path());
        let mut resolver = Resolver::new();
        let mut imports = BindingTable::new();
        let out = resolve_imports(
            "import gone from \"./gone.tson\";\n{ a: gone }",
            None,
            &options,
            &mut resolver,
            &mut imports,
        )
        .unwrap();
        assert_eq!(out, "\n{ a: gone }");
        assert!(imports.is_empty());
    }

    #[test]
    fn test_json_import_is_substituted_forward_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("data.json"), r#"{"k": [1, 2]}"#).unwrap();
        let options = ParseOptions::strict().with_base_dir(dir.path());
        let mut resolver = Resolver::new();
        let mut imports = BindingTable::new();
        let out = resolve_imports(
            "[data,\nimport data from \"data.json\";\ndata]",
            None,
            &options,
            &mut resolver,
            &mut imports,
        )
        .unwrap();
        assert_eq!(out, "[data,\n\n{\"k\":[1,2]}]");
    }

    #[test]
    fn test_import_binding_applies_to_rest_of_its_line() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("base.tson"), r#"{ "a": 1 }"#).unwrap();
        let options = ParseOptions::strict().with_base_dir(dir.path());
        let mut resolver = Resolver::new();
        let mut imports = BindingTable::new();
        let source = r#"import x from "./base.tson"; { "b": x }"#;
        let out = resolve_imports(source, None, &options, &mut resolver, &mut imports).unwrap();
        assert_eq!(out, format!("{}{}", " ".repeat(28), r#" { "b": {"a":1} }"#));
        assert!(imports.contains("x"));
    }
}
