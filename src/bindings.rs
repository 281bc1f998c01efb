use crate::comments::map_lines;
use crate::scanner::scan_line;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z_$][A-Za-z0-9_$]*").expect("valid identifier regex"));

#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub value: Value,
    /// Compact JSON text spliced into the source wherever the name is used.
    pub serialized: String,
}

/// Identifier to value bindings for one document, in declaration order.
///
/// Rebinding a name replaces its value in place; callers substitute line by line, so a
/// rebinding only affects the lines processed after it.
#[derive(Debug, Default, Clone)]
pub struct BindingTable {
    entries: Vec<(String, Binding)>,
    index: HashMap<String, usize>,
}

impl BindingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        let binding = Binding {
            serialized: value.to_string(),
            value,
        };
        match self.index.get(&name) {
            Some(&slot) => self.entries[slot].1 = binding,
            None => {
                self.index.insert(name.clone(), self.entries.len());
                self.entries.push((name, binding));
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.index.get(name).map(|&slot| &self.entries[slot].1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries
            .iter()
            .map(|(name, binding)| (name.as_str(), &binding.value))
    }

    /// Replaces whole-word uses of bound names in one line.
    ///
    /// A use is only replaced when it sits in code (never inside a string literal) and is not
    /// an object key, i.e. not directly followed by a colon.
    pub fn substitute_line(&self, line: &str) -> String {
        if self.is_empty() {
            return line.to_string();
        }
        let mask = scan_line(line);
        let bytes = line.as_bytes();
        let mut out = String::with_capacity(line.len());
        let mut last = 0;

        for found in IDENTIFIER.find_iter(line) {
            let (start, end) = (found.start(), found.end());
            if mask.in_string(start) {
                continue;
            }
            if start > 0 && is_identifier_byte(bytes[start - 1]) {
                continue;
            }
            if is_key_position(&line[end..]) {
                continue;
            }
            if let Some(binding) = self.get(found.as_str()) {
                log::trace!("substituting `{}` with {}", found.as_str(), binding.serialized);
                out.push_str(&line[last..start]);
                out.push_str(&binding.serialized);
                last = end;
            }
        }
        out.push_str(&line[last..]);
        out
    }

    /// Rewrites a line whose leading statement ends at byte `end`. The statement turns into
    /// spaces, so columns after it do not move, and the rest of the line is substituted. A
    /// line holding nothing but the statement becomes empty.
    pub fn substitute_after(&self, line: &str, end: usize) -> String {
        let rest = &line[end..];
        if rest.trim().is_empty() {
            return String::new();
        }
        let mut out = " ".repeat(end);
        out.push_str(&self.substitute_line(rest));
        out
    }

    /// [`substitute_line`](Self::substitute_line) applied to every line of `text`.
    pub fn substitute(&self, text: &str) -> String {
        map_lines(text, |line| self.substitute_line(line))
    }
}

fn is_identifier_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

fn is_key_position(rest: &str) -> bool {
    rest.trim_start_matches([' ', '\t']).starts_with(':')
}
