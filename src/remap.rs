//! Line re-synchronization.
//!
//! Generated text is walked line by line against the original. Lines whose
//! trimmed text matches the next original line are in sync; anything else
//! is injected code. When sync is regained after injected lines (or after
//! skipping stripped directive lines), a `//line <path>:<n>` marker is
//! emitted so the Go toolchain reports original line numbers.

use std::collections::BTreeSet;
use std::path::Path;

/// Insert line markers into `generated`.
///
/// `reference` holds the original lines with line-preserving edits
/// applied; `stripped` the 0-based indices of original lines removed from
/// the output.
pub fn remap(generated: &str, path: &Path, reference: &[String], stripped: &BTreeSet<usize>) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut cursor = 0;
    let mut needs_marker = false;

    for line in generated.split('\n') {
        let trimmed = line.trim();

        if cursor < reference.len() {
            if trimmed == reference[cursor].trim() {
                if needs_marker {
                    out.push(marker(path, cursor));
                    needs_marker = false;
                }
                out.push(line.to_string());
                cursor += 1;
                continue;
            }

            let mut resume = cursor;
            while stripped.contains(&resume) {
                resume += 1;
            }
            if resume != cursor && resume < reference.len() && trimmed == reference[resume].trim() {
                cursor = resume;
                out.push(marker(path, cursor));
                needs_marker = false;
                out.push(line.to_string());
                cursor += 1;
                continue;
            }
        }

        out.push(line.to_string());
        needs_marker = true;
    }

    out.join("\n")
}

fn marker(path: &Path, index: usize) -> String {
    format!("//line {}:{}", path.display(), index + 1)
}
