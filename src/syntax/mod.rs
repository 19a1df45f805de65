//! Go syntax front end built on tree-sitter.
//!
//! Provides:
//! - Parsing of Go source into [`SourceFile`]s
//! - Comment and import queries
//! - The statement-list view of block-like nodes (blocks and case clauses)
//! - Enclosing-function scopes ([`scope`]) and syntactic types ([`types`])
//! - Standalone expression validation ([`expr`])

pub mod expr;
pub mod scope;
pub mod types;

use std::path::{Path, PathBuf};

use streaming_iterator::StreamingIterator;
use tree_sitter::{Language, Node, Parser, Query, QueryCursor, Tree};

use crate::error::{IncoError, Result};

/// Tree-sitter query for every comment in a file.
const COMMENT_QUERY: &str = "(comment) @comment";

/// Tree-sitter query for import specs, grouped or not.
const IMPORT_QUERY: &str = r#"
(import_spec
  name: (_)? @alias
  path: (_) @path
) @import
"#;

/// Node kinds holding an ordered statement list.
const SCOPE_KINDS: &[&str] = &[
    "block",
    "expression_case",
    "default_case",
    "type_case",
    "communication_case",
];

/// Statement kinds that bind or assign values.
const ASSIGNMENT_KINDS: &[&str] = &["short_var_declaration", "assignment_statement"];

/// Go parser front end.
pub struct GoParser {
    language: Language,
}

impl GoParser {
    pub fn new() -> Self {
        Self {
            language: tree_sitter_go::LANGUAGE.into(),
        }
    }

    /// Create a new tree-sitter parser for the Go grammar.
    fn create_parser(&self) -> Result<Parser> {
        let mut parser = Parser::new();
        parser.set_language(&self.language)?;
        Ok(parser)
    }

    /// Parse Go source text.
    ///
    /// Syntax errors still produce a tree (with ERROR nodes); only a
    /// complete parser failure is an error.
    pub fn parse(&self, path: &Path, source: String) -> Result<SourceFile> {
        let mut parser = self.create_parser()?;
        let tree = parser.parse(&source, None).ok_or_else(|| IncoError::Parse {
            path: path.to_path_buf(),
        })?;

        Ok(SourceFile {
            path: path.to_path_buf(),
            source,
            tree,
            language: self.language.clone(),
        })
    }
}

impl Default for GoParser {
    fn default() -> Self {
        Self::new()
    }
}

/// An import spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    /// Import path without quotes.
    pub path: String,
    /// Explicit local name (`f "fmt"`, `_`, `.`).
    pub alias: Option<String>,
}

impl Import {
    /// The identifier the package is referred to by.
    pub fn local_name(&self) -> &str {
        match &self.alias {
            Some(alias) => alias,
            None => self.path.rsplit('/').next().unwrap_or(&self.path),
        }
    }
}

/// A parsed Go file together with its source text.
pub struct SourceFile {
    /// The file path (for diagnostics and line markers).
    pub path: PathBuf,
    /// The original source text.
    pub source: String,
    /// The tree-sitter parse tree.
    pub tree: Tree,
    language: Language,
}

impl SourceFile {
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Get text for a tree-sitter node.
    pub fn text(&self, node: Node) -> &str {
        node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }

    pub fn has_errors(&self) -> bool {
        self.tree.root_node().has_error()
    }

    /// Package name from the package clause.
    pub fn package_name(&self) -> Option<&str> {
        let root = self.root();
        let mut cursor = root.walk();
        let clause = root
            .named_children(&mut cursor)
            .find(|n| n.kind() == "package_clause")?;
        let mut cursor = clause.walk();
        let name = clause
            .named_children(&mut cursor)
            .find(|n| n.kind() == "package_identifier")?;
        Some(self.text(name))
    }

    /// All comment nodes in source order.
    pub fn comments(&self) -> Result<Vec<Node<'_>>> {
        let query = Query::new(&self.language, COMMENT_QUERY)?;
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&query, self.root(), self.source.as_bytes());

        let mut comments = Vec::new();
        while let Some(m) = matches.next() {
            for capture in m.captures {
                comments.push(capture.node);
            }
        }
        comments.sort_by_key(|n| n.start_byte());
        Ok(comments)
    }

    /// All import specs in source order.
    pub fn imports(&self) -> Result<Vec<Import>> {
        let query = Query::new(&self.language, IMPORT_QUERY)?;
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&query, self.root(), self.source.as_bytes());

        let mut imports = Vec::new();
        while let Some(m) = matches.next() {
            let mut path = None;
            let mut alias = None;
            for capture in m.captures {
                match query.capture_names()[capture.index as usize] {
                    "path" => path = Some(unquote_import(self.text(capture.node))),
                    "alias" => alias = Some(self.text(capture.node).to_string()),
                    _ => {}
                }
            }
            if let Some(path) = path {
                imports.push(Import { path, alias });
            }
        }
        Ok(imports)
    }

    /// Byte offset of the start of the line holding `byte`.
    pub fn line_start(&self, byte: usize) -> usize {
        self.source[..byte].rfind('\n').map_or(0, |i| i + 1)
    }

    /// Byte offset of the newline ending the line holding `byte`
    /// (or the end of the source).
    pub fn line_end(&self, byte: usize) -> usize {
        self.source[byte..]
            .find('\n')
            .map_or(self.source.len(), |i| byte + i)
    }

    /// Leading whitespace of the line holding `byte`.
    pub fn indent_at(&self, byte: usize) -> &str {
        let start = self.line_start(byte);
        let line = &self.source[start..self.line_end(start)];
        let trimmed = line.trim_start_matches([' ', '\t']);
        &line[..line.len() - trimmed.len()]
    }

    /// Whether only whitespace precedes `byte` on its line.
    pub fn starts_line(&self, byte: usize) -> bool {
        self.source[self.line_start(byte)..byte].trim().is_empty()
    }

    /// Whether only whitespace follows `byte` on its line.
    pub fn ends_line(&self, byte: usize) -> bool {
        self.source[byte..self.line_end(byte)].trim().is_empty()
    }
}

fn unquote_import(text: &str) -> String {
    text.trim_matches(|c| c == '"' || c == '`').to_string()
}

/// Named children of a node.
pub fn named_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

/// Named children stored under `field`.
pub fn field_children<'t>(node: Node<'t>, field: &str) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children_by_field_name(field, &mut cursor).collect()
}

pub fn is_scope(node: Node<'_>) -> bool {
    SCOPE_KINDS.contains(&node.kind())
}

pub fn is_assignment(node: Node<'_>) -> bool {
    ASSIGNMENT_KINDS.contains(&node.kind())
}

pub fn is_function(node: Node<'_>) -> bool {
    matches!(
        node.kind(),
        "function_declaration" | "method_declaration" | "func_literal"
    )
}

/// The statement-holding body of a block or case clause.
#[derive(Debug, Clone)]
pub struct ScopeBody<'t> {
    pub node: Node<'t>,
    /// Byte offset just past the opening `{` or the clause's `:`.
    pub open: usize,
    /// Statements in source order, comments excluded.
    pub statements: Vec<Node<'t>>,
}

impl<'t> ScopeBody<'t> {
    /// Split a scope node into its opening boundary and statements.
    ///
    /// Blocks may wrap their statements in a `statement_list`; both shapes
    /// are flattened.
    pub fn of(node: Node<'t>) -> Option<Self> {
        let opener = if node.kind() == "block" { "{" } else { ":" };
        let mut open = None;
        let mut statements = Vec::new();

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if open.is_none() {
                if !child.is_named() && child.kind() == opener {
                    open = Some(child.end_byte());
                }
                continue;
            }
            if !child.is_named() || child.kind() == "comment" {
                continue;
            }
            if child.kind() == "statement_list" {
                statements.extend(
                    named_children(child)
                        .into_iter()
                        .filter(|s| s.kind() != "comment"),
                );
            } else {
                statements.push(child);
            }
        }

        Some(Self {
            node,
            open: open?,
            statements,
        })
    }
}

/// Every statement-holding scope under `root`, in pre-order.
pub fn scopes(root: Node<'_>) -> Vec<ScopeBody<'_>> {
    let mut found = Vec::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if is_scope(node) {
            if let Some(body) = ScopeBody::of(node) {
                found.push(body);
            }
        }
        let mut children = named_children(node);
        children.reverse();
        stack.extend(children);
    }
    found
}

/// The scope directly holding `node`, looking through `statement_list`.
pub fn owning_scope(node: Node<'_>) -> Option<Node<'_>> {
    let mut parent = node.parent()?;
    if parent.kind() == "statement_list" {
        parent = parent.parent()?;
    }
    is_scope(parent).then_some(parent)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_go(source: &str) -> SourceFile {
        GoParser::new()
            .parse(Path::new("/work/test.go"), source.to_string())
            .unwrap()
    }

    #[test]
    fn test_package_name() {
        let file = parse_go("package main\n");
        assert_eq!(file.package_name(), Some("main"));
        assert!(!file.has_errors());
    }

    #[test]
    fn test_comments_in_order() {
        let file = parse_go(
            "package p\n\n// one\nfunc f() {\n\t/* two */\n\tx := 1 // three\n\t_ = x\n}\n",
        );
        let comments: Vec<_> = file
            .comments()
            .unwrap()
            .into_iter()
            .map(|c| file.text(c).to_string())
            .collect();
        assert_eq!(comments, vec!["// one", "/* two */", "// three"]);
    }

    #[test]
    fn test_imports() {
        let file = parse_go(
            "package p\n\nimport \"fmt\"\n\nimport (\n\tj \"encoding/json\"\n\t\"os\"\n)\n",
        );
        let imports = file.imports().unwrap();
        let paths: Vec<_> = imports.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(paths, vec!["fmt", "encoding/json", "os"]);
        assert_eq!(imports[1].local_name(), "j");
        assert_eq!(imports[2].local_name(), "os");
    }

    #[test]
    fn test_scope_statements() {
        let source = "package p\n\nfunc f(x int) {\n\ta := 1\n\t// note\n\tif x > 0 {\n\t\ta++\n\t}\n\tswitch x {\n\tcase 1:\n\t\ta = 2\n\t\ta = 3\n\tdefault:\n\t}\n}\n";
        let file = parse_go(source);
        let bodies = scopes(file.root());
        let shapes: Vec<(&str, usize)> = bodies
            .iter()
            .map(|b| (b.node.kind(), b.statements.len()))
            .collect();
        assert_eq!(
            shapes,
            vec![
                ("block", 3),
                ("block", 1),
                ("expression_case", 2),
                ("default_case", 0),
            ]
        );
        assert_eq!(&source[bodies[0].open - 1..bodies[0].open], "{");
        assert_eq!(&source[bodies[2].open - 1..bodies[2].open], ":");
    }

    #[test]
    fn test_line_helpers() {
        let file = parse_go("package p\n\nfunc f() {\n\tx := 1 // c\n}\n");
        let at = file.source.find("x :=").unwrap();
        assert_eq!(file.indent_at(at), "\t");
        assert!(file.starts_line(at));
        assert!(!file.ends_line(at));
        let comment = file.source.find("// c").unwrap();
        assert!(!file.starts_line(comment));
        assert_eq!(&file.source[file.line_start(at)..file.line_end(at)], "\tx := 1 // c");
    }
}
