//! Import additions for generated guards.

use std::collections::BTreeSet;

use super::edit::TextEdit;
use crate::error::Result;
use crate::syntax::{named_children, SourceFile};

/// Edit adding every path in `needed` the file does not already import
/// under its own name.
///
/// Paths go into the first parenthesized import list, else after the last
/// single-line import, else into a new import block after the package
/// clause.
pub fn import_edit(file: &SourceFile, needed: &BTreeSet<&'static str>) -> Result<Option<TextEdit>> {
    let existing = file.imports()?;
    let missing: Vec<&str> = needed
        .iter()
        .copied()
        .filter(|path| {
            let default_name = path.rsplit('/').next().unwrap_or(path);
            !existing
                .iter()
                .any(|import| import.path == *path && import.local_name() == default_name)
        })
        .collect();
    if missing.is_empty() {
        return Ok(None);
    }

    let root = file.root();
    let declarations: Vec<_> = named_children(root)
        .into_iter()
        .filter(|n| n.kind() == "import_declaration")
        .collect();

    let grouped = declarations.iter().find_map(|decl| {
        named_children(*decl)
            .into_iter()
            .find(|n| n.kind() == "import_spec_list")
    });
    if let Some(list) = grouped {
        let close = list.end_byte().saturating_sub(1);
        let mut lines = String::new();
        for path in &missing {
            lines.push_str(&format!("\t\"{path}\"\n"));
        }
        return Ok(Some(if file.starts_line(close) {
            TextEdit::insert(file.line_start(close), lines)
        } else {
            TextEdit::insert(close, format!("\n{lines}"))
        }));
    }

    let text: String = missing
        .iter()
        .map(|path| format!("\nimport \"{path}\""))
        .collect();
    if let Some(last) = declarations.last() {
        return Ok(Some(TextEdit::insert(file.line_end(last.end_byte()), text)));
    }

    let block = if missing.len() == 1 {
        format!("\n\nimport \"{}\"", missing[0])
    } else {
        let specs: String = missing.iter().map(|p| format!("\t\"{p}\"\n")).collect();
        format!("\n\nimport (\n{specs})")
    };
    let after = named_children(root)
        .into_iter()
        .find(|n| n.kind() == "package_clause")
        .map_or(0, |clause| file.line_end(clause.end_byte()));
    Ok(Some(TextEdit::insert(after, block)))
}
