//! Nesting- and literal-aware scanning of directive argument text.
//!
//! Go expressions inside `-ret(...)` may contain calls, composite literals
//! and string literals with commas of their own, so a plain `split(',')`
//! is not enough.

/// Calls `visit` with the byte offset, character and bracket depth of every
/// character that sits outside a string, raw-string or rune literal.
///
/// Opening brackets are reported at their inner depth, closing brackets at
/// their outer depth, so a balanced `(` ... `)` pair starting at depth 0
/// closes at depth 0. Scanning stops when `visit` returns `false`.
fn walk_structural(text: &str, mut visit: impl FnMut(usize, char, i32) -> bool) {
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' && q != '`' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' | '`' => {
                quote = Some(c);
                continue;
            }
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            _ => {}
        }
        if !visit(i, c, depth) {
            return;
        }
    }
}

/// Byte offsets of every comma at bracket depth 0.
fn top_level_commas(text: &str) -> Vec<usize> {
    let mut commas = Vec::new();
    walk_structural(text, |i, c, depth| {
        if c == ',' && depth == 0 {
            commas.push(i);
        }
        true
    });
    commas
}

/// Split `text` on top-level commas, trimming each part and dropping empties.
pub fn split_top_level(text: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut start = 0;
    for comma in top_level_commas(text) {
        parts.push(&text[start..comma]);
        start = comma + 1;
    }
    parts.push(&text[start..]);

    parts
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect()
}

/// Offset of the last top-level comma, if any.
pub fn last_top_level_comma(text: &str) -> Option<usize> {
    top_level_commas(text).pop()
}

/// For text starting with `(`, the offset of the matching `)`.
pub fn matching_paren(text: &str) -> Option<usize> {
    if !text.starts_with('(') {
        return None;
    }
    let mut found = None;
    walk_structural(text, |i, c, depth| {
        if c == ')' && depth == 0 {
            found = Some(i);
            return false;
        }
        true
    });
    found
}

/// Whether `text` is exactly one double-quoted string literal.
pub fn is_quoted_literal(text: &str) -> bool {
    if text.len() < 2 || !text.starts_with('"') || !text.ends_with('"') {
        return false;
    }
    let inner = &text[1..text.len() - 1];
    let mut escaped = false;
    for c in inner.chars() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '"' {
            return false;
        }
    }
    !escaped
}

/// Strip the quotes from a literal accepted by [`is_quoted_literal`] and
/// resolve the common escapes.
pub fn unquote(text: &str) -> String {
    let inner = &text[1..text.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_respects_nesting() {
        let parts = split_top_level(r#"nil, fmt.Errorf("bad %d, %d", a, b), map[string]int{"a": 1, "b": 2}"#);
        assert_eq!(
            parts,
            vec![
                "nil",
                r#"fmt.Errorf("bad %d, %d", a, b)"#,
                r#"map[string]int{"a": 1, "b": 2}"#,
            ]
        );
    }

    #[test]
    fn test_split_handles_escaped_quotes() {
        let parts = split_top_level(r#""say \"hi, there\"", 2"#);
        assert_eq!(parts, vec![r#""say \"hi, there\"""#, "2"]);
    }

    #[test]
    fn test_split_handles_runes_and_raw_strings() {
        let parts = split_top_level("',', `a,b`, x");
        assert_eq!(parts, vec!["','", "`a,b`", "x"]);
    }

    #[test]
    fn test_split_drops_empty_parts() {
        assert_eq!(split_top_level(" a, , b ,"), vec!["a", "b"]);
        assert!(split_top_level("   ").is_empty());
    }

    #[test]
    fn test_matching_paren() {
        assert_eq!(matching_paren("(a, f(b)) rest"), Some(8));
        assert_eq!(matching_paren("(\")\", x)"), Some(7));
        assert_eq!(matching_paren("(a, f(b) rest"), None);
        assert_eq!(matching_paren("a)"), None);
    }

    #[test]
    fn test_last_top_level_comma() {
        let text = r#"f(a, b) > 0, "msg""#;
        let idx = last_top_level_comma(text).unwrap();
        assert_eq!(&text[idx + 1..], r#" "msg""#);
        assert_eq!(last_top_level_comma("f(a, b) > 0"), None);
    }

    #[test]
    fn test_quoted_literal() {
        assert!(is_quoted_literal(r#""ok""#));
        assert!(is_quoted_literal(r#""with \"escape\"""#));
        assert!(!is_quoted_literal(r#""a" + "b""#));
        assert!(!is_quoted_literal("\""));
        assert!(!is_quoted_literal("name"));
        assert_eq!(unquote(r#""with \"escape\"""#), "with \"escape\"");
    }
}
