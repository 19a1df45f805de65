//! Standalone Go expressions.
//!
//! Directive text is parsed on its own by wrapping it in a tiny file:
//!
//! ```text
//! package p
//! var _ = (
//! <expr>
//! )
//! ```
//!
//! The text is a single valid expression exactly when that file parses
//! cleanly and the value is one parenthesized expression.

use std::path::Path;

use tree_sitter::Node;

use super::scope::specs;
use super::{named_children, GoParser, SourceFile};
use crate::error::Result;

const PREFIX: &str = "package p\nvar _ = (\n";
const SUFFIX: &str = "\n)\n";

/// A successfully parsed standalone expression.
pub struct ExprTree {
    file: SourceFile,
}

impl ExprTree {
    /// The expression node (inside the wrapping parentheses).
    pub fn node(&self) -> Option<Node<'_>> {
        let root = self.file.root();
        let decl = named_children(root)
            .into_iter()
            .find(|n| n.kind() == "var_declaration")?;
        let spec = specs(decl).into_iter().next()?;
        let values = spec.child_by_field_name("value")?;
        let wrapped = named_children(values);
        if wrapped.len() != 1 || wrapped[0].kind() != "parenthesized_expression" {
            return None;
        }
        named_children(wrapped[0])
            .into_iter()
            .find(|n| n.kind() != "comment")
    }

    pub fn text(&self, node: Node<'_>) -> &str {
        self.file.text(node)
    }
}

impl GoParser {
    /// Parse `text` as a single Go expression; `None` when it is not one.
    pub fn parse_expression(&self, text: &str) -> Result<Option<ExprTree>> {
        if text.trim().is_empty() {
            return Ok(None);
        }
        let source = format!("{PREFIX}{text}{SUFFIX}");
        let file = self.parse(Path::new("expr.go"), source)?;
        // Comments would swallow the guard's closing tokens once spliced.
        if file.has_errors() || !file.comments()?.is_empty() {
            return Ok(None);
        }
        let tree = ExprTree { file };
        if tree.node().is_none() {
            return Ok(None);
        }
        Ok(Some(tree))
    }

    /// Whether `text` is a single valid Go expression.
    pub fn is_expression(&self, text: &str) -> Result<bool> {
        Ok(self.parse_expression(text)?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_expressions() {
        let parser = GoParser::new();
        for text in [
            "x > 0",
            "len(name) > 0",
            "nil",
            "ErrNotFound",
            "-1",
            r#"fmt.Errorf("wrap: %w", err)"#,
            "User{Name: \"a\"}",
            "a != nil && b.Ready()",
        ] {
            assert!(parser.is_expression(text).unwrap(), "{text} should parse");
        }
    }

    #[test]
    fn test_invalid_expressions() {
        let parser = GoParser::new();
        for text in ["", "x >", "a), (b", "if x {}", "x := 1", "f(("] {
            assert!(!parser.is_expression(text).unwrap(), "{text} should not parse");
        }
    }

    #[test]
    fn test_embedded_comments_are_rejected() {
        let parser = GoParser::new();
        for text in ["x > 0 // must be positive", "u // note", "a /* b */ + c"] {
            assert!(!parser.is_expression(text).unwrap(), "{text} should not parse");
        }
        assert!(parser.is_expression("s == \"//\"").unwrap());
    }

    #[test]
    fn test_expression_node() {
        let parser = GoParser::new();
        let tree = parser.parse_expression("a && !b").unwrap().unwrap();
        let node = tree.node().unwrap();
        assert_eq!(node.kind(), "binary_expression");
        assert_eq!(tree.text(node), "a && !b");
    }
}
