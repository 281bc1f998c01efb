//! Syntax normalization: the last text rewrite before strict decoding.
//!
//! Passes, in order: single-quoted strings become JSON strings, spreads of substituted
//! values are inlined, bare keys are quoted, and trailing commas are dropped. All of them
//! consult the literal scanner, so string contents are never rewritten.

use crate::comments::map_lines;
use crate::options::ParseOptions;
use crate::scanner::{scan_line, LineMask};

pub fn normalize(text: &str, options: &ParseOptions) -> String {
    let text = map_lines(text, |line| {
        let line = normalize_quotes(line);
        let line = expand_spreads(&line);
        quote_keys(&line)
    });
    if options.allow_trailing_commas {
        remove_trailing_commas(&text)
    } else {
        text
    }
}

/// Rewrites a single-quoted literal (`'it\'s "x"'`) as a JSON string (`"it's \"x\""`).
fn single_to_double(literal: &str) -> String {
    let inner = match literal
        .strip_prefix('\'')
        .and_then(|rest| rest.strip_suffix('\''))
    {
        Some(inner) if !crate::scanner::is_escaped(literal.as_bytes(), literal.len() - 1) => inner,
        _ => return literal.to_string(),
    };

    let mut out = String::with_capacity(literal.len() + 2);
    out.push('"');
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('\'') => out.push('\''),
                Some(next) => {
                    out.push('\\');
                    out.push(next);
                }
                None => out.push_str("\\\\"),
            },
            '"' => out.push_str("\\\""),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Rewrites every terminated single-quoted literal on a line as a JSON string, leaving the
/// rest of the line unchanged.
pub fn normalize_quotes(line: &str) -> String {
    let mask = scan_line(line);
    if !mask
        .literals()
        .iter()
        .any(|literal| literal.quote == '\'' && literal.terminated)
    {
        return line.to_string();
    }

    let mut out = String::with_capacity(line.len());
    let mut last = 0;
    for literal in mask.literals() {
        if literal.quote != '\'' || !literal.terminated {
            continue;
        }
        out.push_str(&line[last..literal.start]);
        out.push_str(&single_to_double(&line[literal.start..literal.end]));
        last = literal.end;
    }
    out.push_str(&line[last..]);
    out
}

/// Inlines `...{ members }` and `...[ elements ]` that open and close on the same line.
///
/// Substituted values are always serialized on one line, so this covers every spread of
/// an import or constant. Spreads of anything else are left for the decoder to reject.
fn expand_spreads(line: &str) -> String {
    let mut line = line.to_string();
    let mut search_from = 0;

    while let Some(found) = line[search_from..].find("...") {
        let start = search_from + found;
        let mask = scan_line(&line);
        if mask.in_string(start) {
            search_from = start + 3;
            continue;
        }
        let open = start + 3 + (line[start + 3..].len() - line[start + 3..].trim_start().len());
        let Some(close) = matching_close(&line, &mask, open) else {
            search_from = start + 3;
            continue;
        };

        let inner = line[open + 1..close].trim().to_string();
        let mut end = close + 1;
        if inner.is_empty() {
            let rest = &line[end..];
            let trimmed = rest.trim_start();
            if let Some(after_comma) = trimmed.strip_prefix(',') {
                end += rest.len() - after_comma.trim_start().len();
            }
        }
        log::trace!("inlining spread `{}`", &line[start..end]);
        line.replace_range(start..end, &inner);
        search_from = start + inner.len();
    }
    line
}

fn matching_close(line: &str, mask: &LineMask, open: usize) -> Option<usize> {
    let bytes = line.as_bytes();
    let (opener, closer) = match bytes.get(open)? {
        b'{' => (b'{', b'}'),
        b'[' => (b'[', b']'),
        _ => return None,
    };
    let mut depth = 0usize;
    for (index, &b) in bytes.iter().enumerate().skip(open) {
        if mask.in_string(index) {
            continue;
        }
        if b == opener {
            depth += 1;
        } else if b == closer {
            depth -= 1;
            if depth == 0 {
                return Some(index);
            }
        }
    }
    None
}

/// Quotes word-shaped object keys (`name:` becomes `"name":`) that appear in code.
fn quote_keys(line: &str) -> String {
    let mask = scan_line(line);
    let bytes = line.as_bytes();
    let mut out = String::with_capacity(line.len() + 8);
    let mut last = 0;
    let mut index = 0;

    while index < bytes.len() {
        if mask.in_string(index) || !is_key_byte(bytes[index]) {
            index += 1;
            continue;
        }
        let start = index;
        while index < bytes.len() && mask.in_code(index) && is_key_byte(bytes[index]) {
            index += 1;
        }
        if start > 0 && is_word_prefix(bytes[start - 1]) {
            continue;
        }
        let rest = &line[index..];
        if rest.trim_start_matches([' ', '\t']).starts_with(':') {
            out.push_str(&line[last..start]);
            out.push('"');
            out.push_str(&line[start..index]);
            out.push('"');
            last = index;
        }
    }
    out.push_str(&line[last..]);
    out
}

fn is_key_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

fn is_word_prefix(b: u8) -> bool {
    is_key_byte(b) || b == b'.' || b == b'-' || b == b'+'
}

/// Removes every comma that is followed, across any amount of whitespace and newlines, by
/// a closing `}` or `]`. Commas inside string literals are kept.
pub fn remove_trailing_commas(text: &str) -> String {
    let mut removals = Vec::new();
    let mut pending: Option<usize> = None;
    let mut offset = 0;

    for chunk in text.split_inclusive('\n') {
        let mask = scan_line(chunk);
        for (index, c) in chunk.char_indices() {
            if mask.in_string(index) {
                pending = None;
                continue;
            }
            match c {
                ',' => pending = Some(offset + index),
                '}' | ']' => {
                    if let Some(comma) = pending.take() {
                        removals.push(comma);
                    }
                }
                c if c.is_whitespace() => {}
                _ => pending = None,
            }
        }
        offset += chunk.len();
    }

    if removals.is_empty() {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for comma in removals {
        out.push_str(&text[last..comma]);
        last = comma + 1;
    }
    out.push_str(&text[last..]);
    out
}
