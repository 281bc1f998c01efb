use crate::bindings::BindingTable;
use crate::error::TsonError;
use crate::options::ParseOptions;
use crate::resolver::{Resolution, Resolver};
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// The result of a successful parse of a TSON document.
/// Holds the decoded value together with the intermediate state that produced it, and
/// serializes as the decoded value.
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    pub value: Value,
    pub path: Option<PathBuf>,
    /// The normalized JSON text the strict decoder accepted.
    pub normalized: String,
    pub imports: BindingTable,
    pub constants: BindingTable,
}

impl Serialize for ParsedDocument {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.value.serialize(serializer)
    }
}

impl ParsedDocument {
    fn new(resolution: Resolution, path: Option<PathBuf>) -> Self {
        Self {
            value: resolution.value,
            path,
            normalized: resolution.normalized,
            imports: resolution.imports,
            constants: resolution.constants,
        }
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        self.value
    }

    /// Serializes the decoded value into compact JSON.
    ///
    /// # Errors
    /// Returns a `serde_json::Error` if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.value)
    }

    /// Serializes the decoded value into a pretty-printed JSON string.
    ///
    /// # Errors
    /// Returns a `serde_json::Error` if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.value)
    }

    /// Serializes the decoded value into a YAML string.
    ///
    /// # Errors
    /// Returns a `serde_yaml::Error` if serialization fails.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(&self.value)
    }
}

/// Parses TSON source text.
///
/// Relative imports resolve against `options.base_dir`, or the working directory when it
/// is unset.
///
/// # Errors
///
/// With `options.strict` set, returns the first failure anywhere in the import graph.
/// Otherwise failures are reported through `log` and the call returns `Ok(None)`: there
/// is no usable document, which is not the same as an empty one.
pub fn parse(source: &str, options: &ParseOptions) -> Result<Option<ParsedDocument>, TsonError> {
    let result = Resolver::new()
        .resolve_source(source, None, options)
        .map(|resolution| ParsedDocument::new(resolution, None));
    dispose(result, options)
}

/// Parses a TSON file. Relative imports resolve against the file's own directory.
///
/// # Errors
///
/// Same disposition as [`parse`]; a missing file is `FileNotFound`.
pub fn parse_file(
    path: impl AsRef<Path>,
    options: &ParseOptions,
) -> Result<Option<ParsedDocument>, TsonError> {
    let path = path.as_ref();
    let result = Resolver::new()
        .resolve_file(path, options)
        .map(|resolution| ParsedDocument::new(resolution, Some(path.to_path_buf())));
    dispose(result, options)
}

/// Parses source text with default options in strict mode and returns only the value.
///
/// # Errors
///
/// Returns any pipeline failure.
pub fn from_str(source: &str) -> Result<Value, TsonError> {
    Resolver::new()
        .resolve_source(source, None, &ParseOptions::strict())
        .map(|resolution| resolution.value)
}

fn dispose(
    result: Result<ParsedDocument, TsonError>,
    options: &ParseOptions,
) -> Result<Option<ParsedDocument>, TsonError> {
    match result {
        Ok(document) => Ok(Some(document)),
        Err(err) if options.strict => Err(err),
        Err(err) => {
            let origin = err.origin();
            if std::ptr::eq(origin, &err) {
                log::warn!("no document produced: {err}");
            } else {
                log::warn!("no document produced: {err} (caused by: {origin})");
            }
            Ok(None)
        }
    }
}
