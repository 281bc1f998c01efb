use crate::error::TsonError;
use crate::utils::get_offset;
use miette::NamedSource;
use serde_json::Value;
use std::path::Path;

/// Decodes fully normalized text with a strict JSON decoder.
///
/// Decoder failures become [`TsonError::SyntaxError`] carrying the normalized text, so the
/// diagnostic points into exactly what the decoder saw. Line numbers match the original
/// document because every earlier pass preserves the line count.
pub fn decode(text: &str, path: Option<&Path>) -> Result<Value, TsonError> {
    serde_json::from_str(text).map_err(|err| syntax_error(err, text, path))
}

fn syntax_error(err: serde_json::Error, text: &str, path: Option<&Path>) -> TsonError {
    let (line, column) = (err.line(), err.column());
    let offset = get_offset(text, line, column.max(1)).min(text.len());
    let name = path.map_or_else(
        || "<string>".to_string(),
        |path| path.to_string_lossy().to_string(),
    );
    TsonError::SyntaxError {
        message: strip_position(&err.to_string()),
        path: path.map(Path::to_path_buf),
        line,
        column,
        src: NamedSource::new(name, text.to_string()),
        span: (offset, 0).into(),
    }
}

/// serde_json appends " at line L column C" to its messages; the position is carried
/// separately.
fn strip_position(message: &str) -> String {
    match message.rfind(" at line ") {
        Some(index) => message[..index].to_string(),
        None => message.to_string(),
    }
}
