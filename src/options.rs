use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Switches for the extended syntax and the failure disposition of a parse.
///
/// Deserializes from camelCase keys (`allowComments`, `allowTSONImports`, `baseDir`, ...),
/// with every missing key taking its default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParseOptions {
    pub allow_trailing_commas: bool,
    pub allow_comments: bool,
    pub allow_const: bool,
    /// Cross-format imports of plain `.json` documents.
    pub allow_imports: bool,
    /// Recursive imports of other `.tson` documents.
    #[serde(rename = "allowTSONImports")]
    pub allow_tson_imports: bool,
    /// Raise failures instead of reporting them and yielding no document.
    pub strict: bool,
    /// Directory relative imports resolve against when parsing a string. `None` means the
    /// working directory at the time of the call.
    pub base_dir: Option<PathBuf>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            allow_trailing_commas: true,
            allow_comments: true,
            allow_const: true,
            allow_imports: true,
            allow_tson_imports: true,
            strict: false,
            base_dir: None,
        }
    }
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Strict options: every failure is returned as an error.
    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Self::default()
        }
    }

    pub fn with_trailing_commas(mut self, allow: bool) -> Self {
        self.allow_trailing_commas = allow;
        self
    }

    pub fn with_comments(mut self, allow: bool) -> Self {
        self.allow_comments = allow;
        self
    }

    pub fn with_const(mut self, allow: bool) -> Self {
        self.allow_const = allow;
        self
    }

    pub fn with_imports(mut self, allow: bool) -> Self {
        self.allow_imports = allow;
        self
    }

    pub fn with_tson_imports(mut self, allow: bool) -> Self {
        self.allow_tson_imports = allow;
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(base_dir.into());
        self
    }

    /// The options an imported document is parsed with: the same flags, rooted at the
    /// directory containing the import.
    pub(crate) fn for_import(&self, import_dir: &Path) -> Self {
        Self {
            base_dir: Some(import_dir.to_path_buf()),
            ..self.clone()
        }
    }

    pub(crate) fn resolved_base_dir(&self) -> PathBuf {
        match &self.base_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }
}
