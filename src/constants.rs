use crate::bindings::BindingTable;
use crate::comments::map_lines;
use crate::normalize::normalize_quotes;
use crate::scanner::scan_line;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static CONST_DECLARATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*const\s+([A-Za-z_$][A-Za-z0-9_$]*)\s*=").expect("valid const regex")
});

/// A `const NAME = VALUE;` statement at the start of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ConstDeclaration<'a> {
    pub name: &'a str,
    /// The right-hand side, trimmed, without its `;`.
    pub raw: &'a str,
    /// Byte offset just past the statement, where the rest of the line begins.
    pub end: usize,
}

/// Recognizes a constant declaration. The value runs up to the first `;` outside a string
/// literal, or to the end of the line when there is none.
pub(crate) fn parse_declaration(line: &str) -> Option<ConstDeclaration<'_>> {
    let captures = CONST_DECLARATION.captures(line)?;
    let name = captures.get(1)?.as_str();
    let value_start = captures.get(0)?.end();

    let mask = scan_line(line);
    let semicolon = line[value_start..]
        .match_indices(';')
        .map(|(index, _)| value_start + index)
        .find(|&index| mask.in_code(index));
    let (raw, end) = match semicolon {
        Some(index) => (&line[value_start..index], index + 1),
        None => (&line[value_start..], line.len()),
    };
    Some(ConstDeclaration {
        name,
        raw: raw.trim(),
        end,
    })
}

pub fn parse_literal(raw: &str) -> Value {
    let raw = raw.trim();
    match serde_json::from_str::<Value>(&normalize_quotes(raw)) {
        Ok(value) => value,
        Err(_) => Value::String(strip_quotes(raw).to_string()),
    }
}

fn strip_quotes(raw: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = raw
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    raw
}

/// Runs the constant pass over `text`.
///
/// Declarations are blanked out, and code following one on the same line is kept. Every
/// other use of a name sees the constants declared before it; a name used before its
/// declaration is left as-is. The right-hand side of a declaration sees the constants
/// declared before it.
pub fn resolve_constants(text: &str, constants: &mut BindingTable) -> String {
    map_lines(text, |line| match parse_declaration(line) {
        Some(declaration) => {
            let value = parse_literal(&constants.substitute_line(declaration.raw));
            log::debug!("const {} = {value}", declaration.name);
            constants.bind(declaration.name, value);
            constants.substitute_after(line, declaration.end)
        }
        None => constants.substitute_line(line),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(text: &str) -> (String, BindingTable) {
        let mut constants = BindingTable::new();
        let out = resolve_constants(text, &mut constants);
        (out, constants)
    }

    #[test]
    fn test_number_constant() {
        let (out, constants) = run("const P = 8080;\n{ port: P }");
        assert_eq!(out, "\n{ port: 8080 }");
        assert_eq!(constants.get("P").map(|b| b.value.clone()), Some(json!(8080)));
    }

    #[test]
    fn test_literal_kinds() {
        assert_eq!(parse_literal("true"), json!(true));
        assert_eq!(parse_literal("null"), json!(null));
        assert_eq!(parse_literal("1.5"), json!(1.5));
        assert_eq!(parse_literal(r#""db""#), json!("db"));
        assert_eq!(parse_literal("'db'"), json!("db"));
        assert_eq!(parse_literal("[1, 2]"), json!([1, 2]));
        assert_eq!(parse_literal(r#"{"a": 1}"#), json!({"a": 1}));
    }

    #[test]
    fn test_bare_string_fallback() {
        assert_eq!(parse_literal("localhost"), json!("localhost"));
        assert_eq!(parse_literal("'unterminated"), json!("'unterminated"));
    }

    #[test]
    fn test_declaration_shape() {
        let declaration = parse_declaration("  const HOST = 'db.local';").unwrap();
        assert_eq!(declaration.name, "HOST");
        assert_eq!(declaration.raw, "'db.local'");
        assert_eq!(parse_literal(declaration.raw), json!("db.local"));
        assert_eq!(parse_declaration("const N = 3").unwrap().raw, "3");
        assert!(parse_declaration("constant X = 1;").is_none());
        assert!(parse_declaration("{ const: 1 }").is_none());
    }

    #[test]
    fn test_declaration_ends_at_first_code_semicolon() {
        let declaration = parse_declaration(r#"const S = "a;b"; [S]"#).unwrap();
        assert_eq!(declaration.raw, r#""a;b""#);
        assert_eq!(declaration.end, 16);
    }

    #[test]
    fn test_declaration_followed_by_code_on_same_line() {
        let (out, _) = run("const P = 8080; { port: P }");
        assert_eq!(out, format!("{}{{ port: 8080 }}", " ".repeat(16)));
    }

    #[test]
    fn test_forward_reference_is_left_alone() {
        let (out, _) = run("{ port: P,\nconst P = 1;\n  other: P }");
        assert_eq!(out, "{ port: P,\n\n  other: 1 }");
    }

    #[test]
    fn test_redeclaration_shadows_following_lines_only() {
        let (out, _) = run("const A = 1;\n[A,\nconst A = 2;\nA]");
        assert_eq!(out, "\n[1,\n\n2]");
    }

    #[test]
    fn test_declaration_sees_earlier_constants() {
        let (out, _) = run("const A = 5;\nconst B = A;\n[B]");
        assert_eq!(out, "\n\n[5]");
    }

    #[test]
    fn test_string_contents_untouched() {
        let (out, _) = run("const A = 1;\n{ a: \"A\" }");
        assert_eq!(out, "\n{ a: \"A\" }");
    }
}
