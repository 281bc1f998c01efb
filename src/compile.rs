use crate::api::parse_file;
use crate::comments::{extract_comments, CommentRecord};
use crate::error::TsonError;
use crate::options::ParseOptions;
use crate::resolver::read_source;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Suffix appended to a compiled output path to name its metadata sidecar.
pub const META_SUFFIX: &str = ".meta";

/// The `.meta` sidecar written next to a compiled document when comments are preserved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileMetadata {
    pub source_file: String,
    /// RFC 3339 timestamp.
    pub compiled_at: String,
    pub comments: Vec<CommentRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOutput {
    pub output: PathBuf,
    pub metadata: Option<PathBuf>,
}

/// `config.tson` compiles to `config.json` by default.
pub fn default_output_path(input: &Path) -> PathBuf {
    input.with_extension("json")
}

pub fn metadata_path(output: &Path) -> PathBuf {
    let mut name = output.as_os_str().to_owned();
    name.push(META_SUFFIX);
    PathBuf::from(name)
}

/// Compiles `input` to pretty-printed JSON at `output`, plus a comment sidecar when
/// `preserve_comments` is set. Files are replaced atomically.
///
/// # Errors
///
/// Parse failures follow `options.strict` exactly as [`parse_file`] does; a lenient failure
/// writes nothing and returns `Ok(None)`. Write failures are always returned.
pub fn compile_file(
    input: &Path,
    output: &Path,
    options: &ParseOptions,
    preserve_comments: bool,
) -> Result<Option<CompileOutput>, TsonError> {
    let Some(document) = parse_file(input, options)? else {
        return Ok(None);
    };

    let mut json = document.to_json_pretty()?;
    json.push('\n');
    write_atomic(output, json.as_bytes())?;
    log::info!("compiled {} -> {}", input.display(), output.display());

    let metadata = if preserve_comments {
        let source = read_source(input)?;
        let meta = CompileMetadata {
            source_file: input.display().to_string(),
            compiled_at: timestamp(),
            comments: extract_comments(&source),
        };
        let path = metadata_path(output);
        write_atomic(&path, serde_json::to_string_pretty(&meta)?.as_bytes())?;
        Some(path)
    } else {
        None
    };

    Ok(Some(CompileOutput {
        output: output.to_path_buf(),
        metadata,
    }))
}

fn timestamp() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "unknown".to_string())
}

fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), TsonError> {
    let write_failure = |source: std::io::Error| TsonError::WriteFailure {
        path: path.to_path_buf(),
        source,
    };
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir).map_err(write_failure)?;
    file.write_all(contents).map_err(write_failure)?;
    file.persist(path).map_err(|err| write_failure(err.error))?;
    Ok(())
}
