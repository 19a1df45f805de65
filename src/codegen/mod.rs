//! Guard code generation.
//!
//! Turns a directive plus resolved types into `if` guards. Every guard
//! has the shape
//!
//! ```go
//! if <condition> {
//!     <action>
//! }
//! ```
//!
//! where the action is one of [`GuardAction`]. Imports a guard needs
//! (`log`, `reflect`) are collected in [`Generated::imports`] and merged by
//! the caller.

pub mod consts;
pub mod must;

use std::collections::BTreeSet;

use tracing::warn;

use crate::directive::{DirectiveAnchor, Kind};
use crate::error::{IncoError, Result};
use crate::oracle::{GoType, TypeCategory, TypeOracle};
use crate::syntax::scope::Scope;
use crate::syntax::GoParser;

/// Text reported when a guard fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardMessage {
    /// A fixed message.
    Text(String),
    /// A fixed prefix followed by the error's description.
    WithError { prefix: String, error_var: String },
}

impl GuardMessage {
    /// Go expression producing the message.
    pub fn render(&self) -> String {
        match self {
            GuardMessage::Text(text) => go_quote(text),
            GuardMessage::WithError { prefix, error_var } => {
                format!("{} + {}.Error()", go_quote(prefix), error_var)
            }
        }
    }
}

/// What a guard does when its condition holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardAction {
    Abort(GuardMessage),
    Return(Vec<String>),
    LogAndReturn(GuardMessage, Vec<String>),
}

impl GuardAction {
    /// The Go statements of the guard body.
    pub fn statements(&self) -> Vec<String> {
        match self {
            GuardAction::Abort(message) => vec![format!("panic({})", message.render())],
            GuardAction::Return(values) => vec![render_return(values)],
            GuardAction::LogAndReturn(message, values) => vec![
                format!("log.Println({})", message.render()),
                render_return(values),
            ],
        }
    }
}

fn render_return(values: &[String]) -> String {
    if values.is_empty() {
        "return".to_string()
    } else {
        format!("return {}", values.join(", "))
    }
}

/// One generated `if` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Guard {
    pub condition: String,
    pub action: GuardAction,
}

impl Guard {
    /// Render at the given indentation, without a trailing newline.
    pub fn render(&self, indent: &str) -> String {
        let mut out = format!("{indent}if {} {{\n", self.condition);
        for statement in self.action.statements() {
            out.push_str(&format!("{indent}\t{statement}\n"));
        }
        out.push_str(indent);
        out.push('}');
        out
    }
}

/// Guards generated for one or more directives plus the imports they need.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Generated {
    pub guards: Vec<Guard>,
    pub imports: BTreeSet<&'static str>,
}

impl Generated {
    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }

    pub fn merge(&mut self, other: Generated) {
        self.guards.extend(other.guards);
        self.imports.extend(other.imports);
    }

    /// Render all guards, one per line group, without a trailing newline.
    pub fn render(&self, indent: &str) -> String {
        self.guards
            .iter()
            .map(|g| g.render(indent))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A zero-value test for one variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZeroCheck {
    pub condition: String,
    pub description: &'static str,
    pub import: Option<&'static str>,
}

/// Condition that holds when `var` has its type's zero value.
///
/// Unresolved types fall back to a nil comparison.
pub fn zero_check(var: &str, ty: Option<&GoType>) -> ZeroCheck {
    let Some(ty) = ty else {
        return ZeroCheck {
            condition: format!("{var} == nil"),
            description: "nil",
            import: None,
        };
    };

    let reflect = || format!("reflect.ValueOf(&{var}).Elem().IsZero()");
    let (condition, import) = match ty.category {
        TypeCategory::Nilable | TypeCategory::Unknown => (format!("{var} == nil"), None),
        TypeCategory::String => (format!("{var} == \"\""), None),
        TypeCategory::Integer | TypeCategory::Complex => (format!("{var} == 0"), None),
        TypeCategory::Float => (format!("{var} == 0.0"), None),
        TypeCategory::Bool => (format!("{var} == false"), None),
        TypeCategory::Aggregate { comparable: true } => {
            (format!("{var} == ({}{{}})", ty.expr.text), None)
        }
        TypeCategory::TypeParam { comparable: true } => {
            (format!("{var} == *new({})", ty.expr.text), None)
        }
        TypeCategory::Aggregate { comparable: false }
        | TypeCategory::TypeParam { comparable: false } => (reflect(), Some("reflect")),
    };

    ZeroCheck {
        condition,
        description: ty.zero_description(),
        import,
    }
}

/// Zero-value literal for a result position.
pub fn zero_literal(ty: &GoType) -> String {
    match ty.category {
        TypeCategory::Nilable => "nil".to_string(),
        TypeCategory::String => "\"\"".to_string(),
        TypeCategory::Integer | TypeCategory::Float | TypeCategory::Complex => "0".to_string(),
        TypeCategory::Bool => "false".to_string(),
        TypeCategory::Aggregate { .. } => format!("{}{{}}", ty.expr.text),
        TypeCategory::TypeParam { .. } | TypeCategory::Unknown => {
            format!("*new({})", ty.expr.text)
        }
    }
}

/// Quote `text` as a Go interpreted string literal.
pub fn go_quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 || c == '\u{7f}' => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Builds guards from directives.
pub struct Generator<'a> {
    oracle: &'a dyn TypeOracle,
    parser: &'a GoParser,
}

impl<'a> Generator<'a> {
    pub fn new(oracle: &'a dyn TypeOracle, parser: &'a GoParser) -> Self {
        Self { oracle, parser }
    }

    /// Guards for a `@require` directive.
    pub fn precondition(&self, anchor: &DirectiveAnchor, scope: &Scope<'_>) -> Result<Generated> {
        let directive = &anchor.directive;
        debug_assert_eq!(directive.kind, Kind::Precondition);
        let location = anchor.location();
        let mut out = Generated::default();

        let values = if directive.return_on_violation {
            Some(self.return_values(anchor, scope, None)?)
        } else {
            None
        };
        if directive.log_on_violation {
            out.imports.insert("log");
        }
        let action = |message: String| match &values {
            Some(values) if directive.log_on_violation => {
                GuardAction::LogAndReturn(GuardMessage::Text(message), values.clone())
            }
            Some(values) => GuardAction::Return(values.clone()),
            None => GuardAction::Abort(GuardMessage::Text(message)),
        };

        if directive.non_defaulted {
            let protocol = if directive.return_on_violation {
                "require -ret -nd"
            } else {
                "require -nd"
            };
            for var in &directive.vars {
                self.ensure_expression("variable", var, anchor)?;
                let ty = self.oracle.resolve_variable_type(scope, var);
                let check = zero_check(var, ty.as_ref());
                if let Some(import) = check.import {
                    out.imports.insert(import);
                }
                let message = format!(
                    "inco // {protocol} violation: [{var}] is defaulted ({}) at {location}",
                    check.description
                );
                out.guards.push(Guard {
                    condition: check.condition,
                    action: action(message),
                });
            }
        } else if let Some(expr) = &directive.expr {
            let Some(tree) = self.parser.parse_expression(expr)? else {
                return Err(invalid("guard", expr, anchor));
            };
            if consts::is_constant_false(&tree) {
                warn!("{location}: precondition `{expr}` is always false");
            }
            let message = match &directive.message {
                Some(message) => message.clone(),
                None if directive.return_on_violation => {
                    format!("inco // require -ret violation: {expr}")
                }
                None => format!("inco // require violation: {expr}"),
            };
            out.guards.push(Guard {
                condition: format!("!({expr})"),
                action: action(format!("{message} at {location}")),
            });
        }

        Ok(out)
    }

    /// Values for an early return from the enclosing function.
    ///
    /// Custom `-ret(...)` expressions win. Otherwise each result gets its
    /// zero value, except error positions which get `error_var` when one
    /// is given. A precondition in a function whose results are all named
    /// returns bare.
    fn return_values(
        &self,
        anchor: &DirectiveAnchor,
        scope: &Scope<'_>,
        error_var: Option<&str>,
    ) -> Result<Vec<String>> {
        let directive = &anchor.directive;
        if !directive.return_exprs.is_empty() {
            for expr in &directive.return_exprs {
                self.ensure_expression("return", expr, anchor)?;
            }
            return Ok(directive.return_exprs.clone());
        }

        let Some(signature) = &scope.signature else {
            return Ok(Vec::new());
        };
        if error_var.is_none() && signature.results_all_named() {
            return Ok(Vec::new());
        }

        let package_scope = Scope::package_level(scope.file);
        Ok(signature
            .results
            .iter()
            .map(|result| {
                let ty = self.oracle.classify(&package_scope, &result.ty);
                let ty = if matches!(ty.category, TypeCategory::Unknown) {
                    self.oracle.classify(scope, &result.ty)
                } else {
                    ty
                };
                match error_var {
                    Some(var) if result.ty.text == "error" || self.oracle.is_error_like_type(&ty) => {
                        var.to_string()
                    }
                    _ => zero_literal(&ty),
                }
            })
            .collect())
    }

    fn ensure_expression(&self, what: &'static str, text: &str, anchor: &DirectiveAnchor) -> Result<()> {
        if self.parser.is_expression(text)? {
            Ok(())
        } else {
            Err(invalid(what, text, anchor))
        }
    }
}

fn invalid(what: &'static str, expr: &str, anchor: &DirectiveAnchor) -> IncoError {
    IncoError::InvalidExpression {
        what,
        expr: expr.to_string(),
        location: anchor.location(),
    }
}
