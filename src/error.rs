use miette::{Diagnostic, NamedSource, SourceSpan};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The coarse category of a [`TsonError`], useful for matching without destructuring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    FileNotFound,
    ReadFailure,
    ImportNotFound,
    ImportParseFailure,
    ImportCycle,
    SyntaxError,
    WriteFailure,
    Serialize,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::FileNotFound => "FileNotFound",
            ErrorKind::ReadFailure => "ReadFailure",
            ErrorKind::ImportNotFound => "ImportNotFound",
            ErrorKind::ImportParseFailure => "ImportParseFailure",
            ErrorKind::ImportCycle => "ImportCycle",
            ErrorKind::SyntaxError => "SyntaxError",
            ErrorKind::WriteFailure => "WriteFailure",
            ErrorKind::Serialize => "Serialize",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug, Diagnostic)]
pub enum TsonError {
    #[error("File not found: {}", .path.display())]
    #[diagnostic(
        code(tson::file_not_found),
        help("Check that the path exists and is spelled correctly.")
    )]
    FileNotFound { path: PathBuf },

    #[error("Failed to read {}", .path.display())]
    #[diagnostic(code(tson::read_failure))]
    ReadFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Imported file not found: {}", .target.display())]
    #[diagnostic(
        code(tson::import_not_found),
        help("Relative import paths are resolved against the directory of the importing file.")
    )]
    ImportNotFound {
        /// The unresolved path as written in the import statement.
        target: PathBuf,
        /// The document containing the import statement.
        path: Option<PathBuf>,
        line: usize,
    },

    #[error("Failed to parse import `{name}` from {}", .target.display())]
    #[diagnostic(code(tson::import_parse_failure))]
    ImportParseFailure {
        name: String,
        target: PathBuf,
        path: Option<PathBuf>,
        line: usize,
        #[source]
        #[diagnostic_source]
        cause: ImportCause,
    },

    #[error("Import cycle detected: {cycle}")]
    #[diagnostic(
        code(tson::import_cycle),
        help("A document cannot import itself, directly or through other imports.")
    )]
    ImportCycle {
        cycle: String,
        path: Option<PathBuf>,
        line: usize,
    },

    #[error("Syntax error{}: {message}", display_location(.path, .line, .column))]
    #[diagnostic(
        code(tson::syntax_error),
        help("The document did not decode as JSON after comments, constants and imports were resolved.")
    )]
    SyntaxError {
        message: String,
        path: Option<PathBuf>,
        line: usize,
        column: usize,
        #[source_code]
        src: NamedSource<String>,
        #[label("{message}")]
        span: SourceSpan,
    },

    #[error("Failed to write {}", .path.display())]
    #[diagnostic(code(tson::write_failure))]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    #[diagnostic(code(tson::serialize))]
    Serialize(#[from] serde_json::Error),
}

/// The failure inside an imported document. Renders exactly as the error it wraps.
#[derive(Error, Debug, Diagnostic)]
#[error(transparent)]
#[diagnostic(transparent)]
pub struct ImportCause(Box<TsonError>);

impl ImportCause {
    pub fn new(error: TsonError) -> Self {
        Self(Box::new(error))
    }

    pub fn get(&self) -> &TsonError {
        &self.0
    }
}

impl From<TsonError> for ImportCause {
    fn from(error: TsonError) -> Self {
        Self::new(error)
    }
}

fn display_location(path: &Option<PathBuf>, line: &usize, column: &usize) -> String {
    match path {
        Some(path) => format!(" in {}:{line}:{column}", path.display()),
        None => format!(" at {line}:{column}"),
    }
}

impl TsonError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TsonError::FileNotFound { .. } => ErrorKind::FileNotFound,
            TsonError::ReadFailure { .. } => ErrorKind::ReadFailure,
            TsonError::ImportNotFound { .. } => ErrorKind::ImportNotFound,
            TsonError::ImportParseFailure { .. } => ErrorKind::ImportParseFailure,
            TsonError::ImportCycle { .. } => ErrorKind::ImportCycle,
            TsonError::SyntaxError { .. } => ErrorKind::SyntaxError,
            TsonError::WriteFailure { .. } => ErrorKind::WriteFailure,
            TsonError::Serialize(_) => ErrorKind::Serialize,
        }
    }

    /// The source document the error refers to, if known.
    pub fn path(&self) -> Option<&Path> {
        match self {
            TsonError::FileNotFound { path }
            | TsonError::ReadFailure { path, .. }
            | TsonError::WriteFailure { path, .. } => Some(path),
            TsonError::ImportNotFound { path, .. }
            | TsonError::ImportParseFailure { path, .. }
            | TsonError::ImportCycle { path, .. }
            | TsonError::SyntaxError { path, .. } => path.as_deref(),
            TsonError::Serialize(_) => None,
        }
    }

    /// The 1-based line of the failure, where it can be determined.
    pub fn line(&self) -> Option<usize> {
        match self {
            TsonError::ImportNotFound { line, .. }
            | TsonError::ImportParseFailure { line, .. }
            | TsonError::ImportCycle { line, .. }
            | TsonError::SyntaxError { line, .. } => Some(*line),
            TsonError::Serialize(err) if err.line() > 0 => Some(err.line()),
            _ => None,
        }
    }

    pub fn column(&self) -> Option<usize> {
        match self {
            TsonError::SyntaxError { column, .. } => Some(*column),
            TsonError::Serialize(err) if err.column() > 0 => Some(err.column()),
            _ => None,
        }
    }

    /// Follows nested import failures down to the error that started them.
    pub fn origin(&self) -> &TsonError {
        let mut current = self;
        while let TsonError::ImportParseFailure { cause, .. } = current {
            current = cause.get();
        }
        current
    }
}
