//! Contract injection.
//!
//! Finds directive comments, decides which statement each one applies to,
//! and rewrites the file text: guards are spliced around statements,
//! directive comments are stripped, `_` error targets are renamed and the
//! imports the guards need are added.
//!
//! Anchors are assigned to the statement-list scope directly holding their
//! comment, then merged with that scope's statements in position order. An
//! anchor between the previous statement (or the scope's opening brace or
//! colon) and a statement applies to that statement:
//!
//! - `@require` guards go immediately before it;
//! - a standalone `@must` binds to it when it is an assignment, with the
//!   guard immediately after.
//!
//! A trailing `@must` binds to the assignment starting on its line.

pub mod edit;
pub mod imports;

use std::collections::{BTreeSet, HashMap};

use tracing::{debug, warn};
use tree_sitter::Node;

use crate::codegen::must::bind_error;
use crate::codegen::{Generated, Generator};
use crate::directive::{self, DirectiveAnchor, Kind};
use crate::error::Result;
use crate::oracle::TypeOracle;
use crate::syntax::scope::Scope;
use crate::syntax::{is_assignment, owning_scope, scopes, GoParser, ScopeBody, SourceFile};
use edit::TextEdit;

/// A rewritten file.
#[derive(Debug, Clone)]
pub struct Injection {
    /// The rewritten text, before line markers.
    pub generated: String,
    /// Original lines with only line-preserving edits applied.
    pub reference: Vec<String>,
    /// 0-based original lines removed outright (standalone directive comments).
    pub stripped: BTreeSet<usize>,
    /// Number of directives found in the file.
    pub directives: usize,
}

/// Every directive comment of `file`, in source order.
pub fn collect_anchors(file: &SourceFile) -> Result<Vec<DirectiveAnchor>> {
    let mut anchors = Vec::new();
    for comment in file.comments()? {
        let Some(directive) = directive::parse(file.text(comment)) else {
            continue;
        };
        let position = comment.start_position();
        anchors.push(DirectiveAnchor {
            directive,
            file: file.path.clone(),
            line: position.row + 1,
            column: position.column + 1,
            comment: comment.byte_range(),
            inline: !file.starts_line(comment.start_byte()),
        });
    }
    Ok(anchors)
}

/// Accumulated rewrite of one file.
#[derive(Default)]
struct Rewrite {
    edits: Vec<TextEdit>,
    stripped: BTreeSet<usize>,
    imports: BTreeSet<&'static str>,
    /// Renamed `_` targets by start byte.
    renamed: HashMap<usize, String>,
}

impl Rewrite {
    /// Remove a directive comment.
    ///
    /// A comment alone on its line(s) takes the lines with it; one sharing
    /// a line with code is cut out, keeping the line count.
    fn strip(&mut self, file: &SourceFile, anchor: &DirectiveAnchor, comment: Node<'_>) {
        let (start, end) = (comment.start_byte(), comment.end_byte());
        if file.starts_line(start) && file.ends_line(end) {
            let from = file.line_start(start);
            let to = (file.line_end(end) + 1).min(file.source.len());
            self.edits.push(TextEdit::remove(from..to));
            let first = comment.start_position().row;
            self.stripped.extend(first..=comment.end_position().row);
            return;
        }

        let source = &file.source;
        let (from, to) = if anchor.inline {
            let before = source[..start].trim_end_matches([' ', '\t']).len();
            (before, end)
        } else {
            let after = source[end..].len() - source[end..].trim_start_matches([' ', '\t']).len();
            (start, end + after)
        };
        let newlines = "\n".repeat(source[from..to].matches('\n').count());
        self.edits.push(TextEdit::in_place(from..to, newlines));
    }

    /// Splice guards in front of `statement`.
    fn insert_before(&mut self, file: &SourceFile, statement: Node<'_>, generated: Generated) {
        let start = statement.start_byte();
        let indent = file.indent_at(start).to_string();
        let guards = generated.render(&indent);
        let edit = if file.starts_line(start) {
            TextEdit::insert(file.line_start(start), format!("{guards}\n"))
        } else {
            TextEdit::insert(start, format!("\n{guards}\n{indent}"))
        };
        self.edits.push(edit);
        self.imports.extend(generated.imports);
    }

    /// Splice guards after `statement`.
    fn insert_after(&mut self, file: &SourceFile, statement: Node<'_>, generated: Generated) {
        let end = statement.end_byte();
        let indent = file.indent_at(statement.start_byte()).to_string();
        let guards = generated.render(&indent);
        let rest = file.source[end..file.line_end(end)].trim();
        let edit = if rest.is_empty() || rest.starts_with("//") {
            TextEdit::insert(file.line_end(end), format!("\n{guards}"))
        } else {
            TextEdit::insert(end, format!("\n{guards}\n{indent}"))
        };
        self.edits.push(edit);
        self.imports.extend(generated.imports);
    }
}

/// Rewrites files of one package.
pub struct Injector<'a> {
    generator: Generator<'a>,
    oracle: &'a dyn TypeOracle,
}

impl<'a> Injector<'a> {
    pub fn new(oracle: &'a dyn TypeOracle, parser: &'a GoParser) -> Self {
        Self {
            generator: Generator::new(oracle, parser),
            oracle,
        }
    }

    /// Rewrite `file`; `None` when it holds no directives.
    pub fn inject(&self, file: &SourceFile) -> Result<Option<Injection>> {
        let anchors = collect_anchors(file)?;
        if anchors.is_empty() {
            return Ok(None);
        }
        debug!(
            "{}: {} directive(s) found",
            file.path.display(),
            anchors.len()
        );

        let root = file.root();
        let mut rewrite = Rewrite::default();
        let mut by_scope: HashMap<usize, Vec<&DirectiveAnchor>> = HashMap::new();
        let mut trailing_musts = Vec::new();

        for anchor in &anchors {
            let Some(comment) = root.descendant_for_byte_range(anchor.comment.start, anchor.comment.end)
            else {
                continue;
            };
            rewrite.strip(file, anchor, comment);

            if anchor.directive.kind == Kind::ErrorCheck && anchor.inline {
                trailing_musts.push(anchor);
                continue;
            }
            match owning_scope(comment) {
                Some(scope) => by_scope.entry(scope.id()).or_default().push(anchor),
                None => warn!(
                    "{}: {} outside a statement list, ignored",
                    anchor.location(),
                    anchor.directive.kind.keyword()
                ),
            }
        }

        let bodies = scopes(root);
        for body in &bodies {
            if let Some(pending) = by_scope.remove(&body.node.id()) {
                self.inject_scope(file, body, pending, &mut rewrite)?;
            }
        }

        for anchor in trailing_musts {
            let assignment = bodies
                .iter()
                .flat_map(|body| body.statements.iter())
                .find(|s| is_assignment(**s) && s.start_position().row + 1 == anchor.line);
            match assignment {
                Some(assignment) => self.bind_must(file, anchor, *assignment, &mut rewrite)?,
                None => warn!(
                    "{}: @must does not trail an assignment, ignored",
                    anchor.location()
                ),
            }
        }

        if let Some(edit) = imports::import_edit(file, &rewrite.imports)? {
            rewrite.edits.push(edit);
        }

        let generated = edit::apply(&file.source, &rewrite.edits);
        let reference = edit::apply_in_place(&file.source, &rewrite.edits)
            .split('\n')
            .map(String::from)
            .collect();
        Ok(Some(Injection {
            generated,
            reference,
            stripped: rewrite.stripped,
            directives: anchors.len(),
        }))
    }

    fn inject_scope(
        &self,
        file: &SourceFile,
        body: &ScopeBody<'_>,
        mut anchors: Vec<&DirectiveAnchor>,
        rewrite: &mut Rewrite,
    ) -> Result<()> {
        anchors.sort_by_key(|a| a.comment.start);
        let mut pending = anchors.into_iter().peekable();

        for statement in &body.statements {
            let statement = *statement;
            let mut gap = Vec::new();
            while let Some(anchor) = pending.next_if(|a| a.comment.start < statement.start_byte()) {
                gap.push(anchor);
            }
            if gap.is_empty() {
                continue;
            }

            let scope = Scope::at(file, statement.start_byte());
            let mut before = Generated::default();
            let mut must: Option<&DirectiveAnchor> = None;
            for anchor in gap {
                match anchor.directive.kind {
                    Kind::Precondition => {
                        before.merge(self.generator.precondition(anchor, &scope)?);
                    }
                    Kind::ErrorCheck => {
                        if let Some(earlier) = must.replace(anchor) {
                            warn!(
                                "{}: @must superseded by line {}, ignored",
                                earlier.location(),
                                anchor.line
                            );
                        }
                    }
                }
            }

            if !before.is_empty() {
                rewrite.insert_before(file, statement, before);
            }
            if let Some(anchor) = must {
                if is_assignment(statement) {
                    self.bind_must(file, anchor, statement, rewrite)?;
                } else {
                    warn!(
                        "{}: @must is not followed by an assignment, ignored",
                        anchor.location()
                    );
                }
            }
        }

        for anchor in pending {
            warn!(
                "{}: {} has no following statement, ignored",
                anchor.location(),
                anchor.directive.kind.keyword()
            );
        }
        Ok(())
    }

    fn bind_must(
        &self,
        file: &SourceFile,
        anchor: &DirectiveAnchor,
        assignment: Node<'_>,
        rewrite: &mut Rewrite,
    ) -> Result<()> {
        let scope = Scope::at(file, assignment.start_byte());
        let Some(binding) = bind_error(self.oracle, &scope, assignment, anchor.line) else {
            warn!(
                "{}: no error value in the assignment, ignored",
                anchor.location()
            );
            return Ok(());
        };

        let error_var = match binding.placeholder {
            Some(target) => match rewrite.renamed.get(&target.start_byte()) {
                Some(name) => name.clone(),
                None => {
                    rewrite
                        .edits
                        .push(TextEdit::in_place(target.byte_range(), binding.error_var.clone()));
                    if let Some(operator) = binding.promote {
                        rewrite
                            .edits
                            .push(TextEdit::in_place(operator.byte_range(), ":="));
                    }
                    rewrite
                        .renamed
                        .insert(target.start_byte(), binding.error_var.clone());
                    binding.error_var
                }
            },
            None => binding.error_var,
        };

        let generated = self.generator.error_check(anchor, &scope, &error_var)?;
        rewrite.insert_after(file, assignment, generated);
        Ok(())
    }
}
