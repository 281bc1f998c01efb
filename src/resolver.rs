use crate::bindings::BindingTable;
use crate::comments::strip_comments;
use crate::constants::resolve_constants;
use crate::decoder::decode;
use crate::error::TsonError;
use crate::imports::resolve_imports;
use crate::normalize::normalize;
use crate::options::ParseOptions;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Everything the pipeline produced for one document.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub value: Value,
    /// The text handed to the strict decoder.
    pub normalized: String,
    pub imports: BindingTable,
    pub constants: BindingTable,
}

/// Runs the five-stage pipeline (imports, comments, constants, normalization, decoding)
/// over a document and, recursively, over everything it imports.
#[derive(Debug, Default)]
pub struct Resolver {
    // Canonical paths of the files currently being resolved, outermost first
    resolving_stack: Vec<PathBuf>,
}

impl Resolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves a document on disk. Relative imports resolve against its directory,
    /// whatever `options.base_dir` says.
    pub fn resolve_file(
        &mut self,
        path: &Path,
        options: &ParseOptions,
    ) -> Result<Resolution, TsonError> {
        let source = read_source(path)?;
        let canonical = path.canonicalize().map_err(|source| TsonError::ReadFailure {
            path: path.to_path_buf(),
            source,
        })?;
        let dir = canonical.parent().unwrap_or_else(|| Path::new("."));
        let options = options.for_import(dir);

        self.resolving_stack.push(canonical);
        let result = self.resolve_source(&source, Some(path), &options);
        self.resolving_stack.pop();
        result
    }

    /// Resolves document text. `path` is only used for error reporting; relative imports
    /// resolve against `options.base_dir`.
    pub fn resolve_source(
        &mut self,
        source: &str,
        path: Option<&Path>,
        options: &ParseOptions,
    ) -> Result<Resolution, TsonError> {
        log::debug!(
            "resolving {}",
            path.map_or_else(|| "<string>".to_string(), |p| p.display().to_string())
        );

        let mut imports = BindingTable::new();
        let text = if options.allow_imports || options.allow_tson_imports {
            resolve_imports(source, path, options, self, &mut imports)?
        } else {
            source.to_string()
        };

        let text = if options.allow_comments {
            strip_comments(&text)
        } else {
            text
        };

        let mut constants = BindingTable::new();
        let text = if options.allow_const {
            resolve_constants(&text, &mut constants)
        } else {
            text
        };

        let normalized = normalize(&text, options);
        log::trace!("normalized document:\n{normalized}");
        let value = decode(&normalized, path)?;
        log::debug!(
            "bindings: imports [{}], constants [{}]",
            bound_names(&imports),
            bound_names(&constants)
        );

        Ok(Resolution {
            value,
            normalized,
            imports,
            constants,
        })
    }

    pub(crate) fn is_resolving(&self, canonical: &Path) -> bool {
        self.resolving_stack.iter().any(|p| p == canonical)
    }

    /// Renders the chain of in-progress files that `canonical` would close into a cycle.
    pub(crate) fn cycle_through(&self, canonical: &Path) -> String {
        let start = self
            .resolving_stack
            .iter()
            .position(|p| p == canonical)
            .unwrap_or(0);
        self.resolving_stack[start..]
            .iter()
            .map(|p| p.display().to_string())
            .chain(std::iter::once(canonical.display().to_string()))
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}

fn bound_names(table: &BindingTable) -> String {
    table
        .iter()
        .map(|(name, _)| name)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Reads a source document, distinguishing a missing file from an unreadable one.
pub fn read_source(path: &Path) -> Result<String, TsonError> {
    if !path.exists() {
        return Err(TsonError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    std::fs::read_to_string(path).map_err(|source| TsonError::ReadFailure {
        path: path.to_path_buf(),
        source,
    })
}
