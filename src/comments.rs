use crate::scanner::{find_comment_start, scan_line};
use serde::{Deserialize, Serialize};

/// A `//` comment lifted out of a document, kept for the compiled `.meta` sidecar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentRecord {
    /// 1-based line the comment appeared on.
    pub line: usize,
    /// The comment body, without the leading `//` and surrounding whitespace.
    pub text: String,
}

/// Removes every `//` comment that starts outside a string literal and trims trailing
/// whitespace from each line. The line count never changes.
pub fn strip_comments(source: &str) -> String {
    map_lines(source, |line| {
        let mask = scan_line(line);
        let code = match find_comment_start(line, &mask) {
            Some(start) => &line[..start],
            None => line,
        };
        code.trim_end().to_string()
    })
}

/// Collects the comments [`strip_comments`] would remove.
pub fn extract_comments(source: &str) -> Vec<CommentRecord> {
    source
        .lines()
        .enumerate()
        .filter_map(|(index, line)| {
            let mask = scan_line(line);
            find_comment_start(line, &mask).map(|start| CommentRecord {
                line: index + 1,
                text: line[start + 2..].trim().to_string(),
            })
        })
        .collect()
}

/// Applies `f` to every line of `source`, keeping the original line terminators.
pub(crate) fn map_lines(source: &str, mut f: impl FnMut(&str) -> String) -> String {
    let mut out = String::with_capacity(source.len());
    for chunk in source.split_inclusive('\n') {
        let (line, terminator) = split_terminator(chunk);
        out.push_str(&f(line));
        out.push_str(terminator);
    }
    out
}

fn split_terminator(chunk: &str) -> (&str, &str) {
    if let Some(line) = chunk.strip_suffix("\r\n") {
        (line, "\r\n")
    } else if let Some(line) = chunk.strip_suffix('\n') {
        (line, "\n")
    } else {
        (chunk, "")
    }
}
