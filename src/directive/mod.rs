//! Contract directive grammar.
//!
//! A directive is a Go comment whose text, once the `//` or `/* */`
//! delimiters are stripped, starts with a contract keyword:
//!
//! ```text
//! @require [-nd] [-ret[(expr, ...)]] [-log] var, var, ...
//! @require [-ret[(expr, ...)]] [-log] <bool expr>[, "message"]
//! @must [-ret[(expr, ...)]] [-log]
//! ```
//!
//! Flags may appear in any order directly after the keyword. `-log` implies
//! `-ret`. Anything that does not fit the grammar is simply not a directive.

pub mod split;

use std::ops::Range;
use std::path::{Path, PathBuf};

/// The two directive kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// `@require`: a boolean-guarded entry condition.
    Precondition,
    /// `@must`: the error produced by an assignment must be nil.
    ErrorCheck,
}

impl Kind {
    pub fn keyword(&self) -> &'static str {
        match self {
            Kind::Precondition => "@require",
            Kind::ErrorCheck => "@must",
        }
    }
}

/// Recognized keywords.
const KEYWORDS: &[(&str, Kind)] = &[
    ("@require", Kind::Precondition),
    ("@must", Kind::ErrorCheck),
];

/// A parsed contract directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub kind: Kind,
    /// `-nd`: the listed variables must not hold their zero value.
    pub non_defaulted: bool,
    /// `-ret` (or `-log`): return from the function instead of panicking.
    pub return_on_violation: bool,
    /// `-log`: log the violation before returning.
    pub log_on_violation: bool,
    /// Expressions from `-ret(...)`, in order.
    pub return_exprs: Vec<String>,
    /// Variables checked in non-defaulted mode.
    pub vars: Vec<String>,
    /// Boolean expression in expression mode.
    pub expr: Option<String>,
    /// Custom violation message.
    pub message: Option<String>,
}

impl Directive {
    fn new(kind: Kind) -> Self {
        Self {
            kind,
            non_defaulted: false,
            return_on_violation: false,
            log_on_violation: false,
            return_exprs: Vec::new(),
            vars: Vec::new(),
            expr: None,
            message: None,
        }
    }

    /// Consume leading flags, returning the remaining text.
    ///
    /// Returns `None` when a flag is not valid for this kind.
    fn parse_flags<'a>(&mut self, mut rest: &'a str) -> Option<&'a str> {
        loop {
            rest = rest.trim_start();
            if let Some(after) = strip_flag(rest, "-nd") {
                if self.kind == Kind::ErrorCheck {
                    return None;
                }
                self.non_defaulted = true;
                rest = after;
            } else if let Some(after) = strip_flag(rest, "-log") {
                self.log_on_violation = true;
                self.return_on_violation = true;
                rest = after;
            } else if let Some(after) = rest.strip_prefix("-ret") {
                if after.starts_with('(') {
                    self.return_on_violation = true;
                    match split::matching_paren(after) {
                        Some(close) => {
                            self.return_exprs = split::split_top_level(&after[1..close]);
                            rest = &after[close + 1..];
                        }
                        None => rest = after,
                    }
                    if rest.starts_with('(') {
                        break;
                    }
                } else if after.is_empty() || after.starts_with(char::is_whitespace) {
                    self.return_on_violation = true;
                    rest = after;
                } else {
                    break;
                }
            } else {
                break;
            }
        }
        Some(rest)
    }
}

/// Match `flag` at the start of `text` when followed by whitespace or end.
fn strip_flag<'a>(text: &'a str, flag: &str) -> Option<&'a str> {
    let after = text.strip_prefix(flag)?;
    if after.is_empty() || after.starts_with(char::is_whitespace) {
        Some(after)
    } else {
        None
    }
}

/// Strip comment delimiters and surrounding whitespace.
fn strip_delimiters(raw: &str) -> &str {
    let text = raw.trim();
    if let Some(body) = text.strip_prefix("//") {
        body.trim()
    } else if let Some(body) = text.strip_prefix("/*") {
        body.strip_suffix("*/").unwrap_or(body).trim()
    } else {
        text
    }
}

/// Longest keyword that prefixes `body` and ends on a word boundary.
fn match_keyword(body: &str) -> Option<(Kind, &str)> {
    KEYWORDS
        .iter()
        .filter_map(|(keyword, kind)| {
            let rest = body.strip_prefix(keyword)?;
            let boundary = rest.is_empty()
                || rest.starts_with(char::is_whitespace)
                || rest.starts_with('-');
            boundary.then_some((keyword.len(), *kind, rest))
        })
        .max_by_key(|(len, _, _)| *len)
        .map(|(_, kind, rest)| (kind, rest))
}

/// Parse a raw comment into a directive.
///
/// Returns `None` for ordinary comments and for malformed directives,
/// such as a `@require` with no expression.
pub fn parse(comment: &str) -> Option<Directive> {
    let body = strip_delimiters(comment);
    if body.is_empty() {
        return None;
    }
    let (kind, rest) = match_keyword(body)?;
    let mut directive = Directive::new(kind);
    let rest = directive.parse_flags(rest)?.trim();

    match kind {
        // Trailing text after @must flags carries no meaning.
        Kind::ErrorCheck => Some(directive),
        Kind::Precondition if directive.non_defaulted => {
            directive.vars = rest
                .split(',')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(String::from)
                .collect();
            if directive.vars.is_empty() {
                return None;
            }
            Some(directive)
        }
        Kind::Precondition => {
            let (expr, message) = split_message(rest);
            if expr.is_empty() {
                return None;
            }
            directive.expr = Some(expr.to_string());
            directive.message = message;
            Some(directive)
        }
    }
}

/// Split `expr, "message"` when the final top-level part is a string literal.
fn split_message(text: &str) -> (&str, Option<String>) {
    if let Some(comma) = split::last_top_level_comma(text) {
        let candidate = text[comma + 1..].trim();
        if split::is_quoted_literal(candidate) {
            return (text[..comma].trim(), Some(split::unquote(candidate)));
        }
    }
    (text, None)
}

/// A directive together with where it was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveAnchor {
    pub directive: Directive,
    /// Absolute path of the file holding the comment.
    pub file: PathBuf,
    /// 1-based line of the comment.
    pub line: usize,
    /// 1-based column of the comment.
    pub column: usize,
    /// Byte range of the comment node.
    pub comment: Range<usize>,
    /// Whether the comment trails code on the same line.
    pub inline: bool,
}

impl DirectiveAnchor {
    /// `file:line`, as embedded in generated messages.
    pub fn location(&self) -> String {
        format_location(&self.file, self.line)
    }
}

pub fn format_location(file: &Path, line: usize) -> String {
    format!("{}:{}", file.display(), line)
}
