//! Byte-range edits over the original source.

use std::ops::Range;

/// Replace `start..end` of the source with `replacement`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub start: usize,
    pub end: usize,
    pub replacement: String,
    /// Whether the edit keeps the line structure of the source.
    pub in_place: bool,
}

impl TextEdit {
    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        Self {
            start: at,
            end: at,
            replacement: text.into(),
            in_place: false,
        }
    }

    /// Remove a range, possibly spanning lines.
    pub fn remove(range: Range<usize>) -> Self {
        Self {
            start: range.start,
            end: range.end,
            replacement: String::new(),
            in_place: false,
        }
    }

    /// Replace text within a line.
    pub fn in_place(range: Range<usize>, text: impl Into<String>) -> Self {
        Self {
            start: range.start,
            end: range.end,
            replacement: text.into(),
            in_place: true,
        }
    }
}

/// Apply `edits` to `source`.
///
/// Edits are applied in (start, end) order; equal keys keep their given
/// order, and an edit overlapping an earlier one is skipped.
pub fn apply(source: &str, edits: &[TextEdit]) -> String {
    let mut sorted: Vec<&TextEdit> = edits.iter().collect();
    sorted.sort_by_key(|e| (e.start, e.end));

    let mut out = String::with_capacity(source.len() + 256);
    let mut cursor = 0;
    for edit in sorted {
        if edit.start < cursor || edit.end > source.len() {
            continue;
        }
        out.push_str(&source[cursor..edit.start]);
        out.push_str(&edit.replacement);
        cursor = edit.end;
    }
    out.push_str(&source[cursor..]);
    out
}

/// Apply only the in-place edits of `edits`.
pub fn apply_in_place(source: &str, edits: &[TextEdit]) -> String {
    let kept: Vec<TextEdit> = edits.iter().filter(|e| e.in_place).cloned().collect();
    apply(source, &kept)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_in_order() {
        let source = "a := 1\nb := 2\n";
        let edits = vec![
            TextEdit::insert(7, "// two\n"),
            TextEdit::in_place(0..1, "x"),
            TextEdit::insert(7, "// three\n"),
        ];
        assert_eq!(apply(source, &edits), "x := 1\n// two\n// three\nb := 2\n");
    }

    #[test]
    fn test_overlapping_edit_is_skipped() {
        let source = "abcdef";
        let edits = vec![
            TextEdit::in_place(1..4, "X"),
            TextEdit::in_place(2..3, "Y"),
        ];
        assert_eq!(apply(source, &edits), "aXef");
    }

    #[test]
    fn test_removal_then_insert_at_boundary() {
        let source = "one\n// gone\ntwo\n";
        let edits = vec![TextEdit::insert(12, "new\n"), TextEdit::remove(4..12)];
        assert_eq!(apply(source, &edits), "one\nnew\ntwo\n");
    }

    #[test]
    fn test_apply_in_place_only() {
        let source = "_ = f() // c\n// gone\n";
        let edits = vec![
            TextEdit::in_place(0..1, "e"),
            TextEdit::in_place(7..12, ""),
            TextEdit::remove(13..21),
        ];
        assert_eq!(apply_in_place(source, &edits), "e = f()\n// gone\n");
    }
}
