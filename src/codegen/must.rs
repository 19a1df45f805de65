//! `@must` error checks bound to assignments.

use tree_sitter::Node;

use super::{Generated, Generator, Guard, GuardAction, GuardMessage};
use crate::directive::{DirectiveAnchor, Kind};
use crate::error::Result;
use crate::oracle::TypeOracle;
use crate::syntax::named_children;
use crate::syntax::scope::Scope;

/// The assignment target checked by an error guard.
#[derive(Debug, Clone)]
pub struct ErrorBinding<'t> {
    /// Name the guard tests against `nil`.
    pub error_var: String,
    /// A `_` target that must be renamed to `error_var`.
    pub placeholder: Option<Node<'t>>,
    /// A plain `=` operator that must become `:=` to declare `error_var`.
    pub promote: Option<Node<'t>>,
}

/// Deterministic name for a renamed `_` target.
pub fn placeholder_name(line: usize) -> String {
    format!("_inco_err_{line}")
}

fn targets(assignment: Node<'_>) -> Vec<Node<'_>> {
    assignment
        .child_by_field_name("left")
        .map(|left| {
            if left.kind() == "expression_list" {
                named_children(left)
                    .into_iter()
                    .filter(|n| n.kind() != "comment")
                    .collect()
            } else {
                vec![left]
            }
        })
        .unwrap_or_default()
}

/// Pick the left-hand target holding the error.
///
/// Resolved right-hand types win: the last error-like position is taken.
/// Without them the last `_` target is used, then a target named `err`.
pub fn select_error_target<'t>(
    oracle: &dyn TypeOracle,
    scope: &Scope<'_>,
    assignment: Node<'t>,
) -> Option<Node<'t>> {
    let file = scope.file;
    let left = targets(assignment);
    let identifier = |n: &Node<'t>| n.kind() == "identifier";

    if let Some(right) = assignment.child_by_field_name("right") {
        let types = oracle.expression_types(scope, right);
        if types.len() == left.len() {
            let typed = left.iter().zip(&types).rev().find(|(target, ty)| {
                identifier(target)
                    && ty
                        .as_ref()
                        .is_some_and(|ty| oracle.is_error_like_type(ty))
            });
            if let Some((target, _)) = typed {
                return Some(*target);
            }
        }
    }

    left.iter()
        .rev()
        .find(|n| identifier(n) && file.text(**n) == "_")
        .or_else(|| {
            left.iter()
                .find(|n| identifier(n) && file.text(**n) == "err")
        })
        .copied()
}

/// Resolve the error variable for a `@must` on `assignment`.
///
/// Returns `None` when no target holds an error.
pub fn bind_error<'t>(
    oracle: &dyn TypeOracle,
    scope: &Scope<'_>,
    assignment: Node<'t>,
    line: usize,
) -> Option<ErrorBinding<'t>> {
    let file = scope.file;
    let target = select_error_target(oracle, scope, assignment)?;
    if file.text(target) != "_" {
        return Some(ErrorBinding {
            error_var: file.text(target).to_string(),
            placeholder: None,
            promote: None,
        });
    }

    let promote = if assignment.kind() == "assignment_statement" {
        assignment
            .child_by_field_name("operator")
            .filter(|op| file.text(*op) == "=")
    } else {
        None
    };
    Some(ErrorBinding {
        error_var: placeholder_name(line),
        placeholder: Some(target),
        promote,
    })
}

impl Generator<'_> {
    /// Guard for a `@must` directive checking `error_var`.
    pub fn error_check(
        &self,
        anchor: &DirectiveAnchor,
        scope: &Scope<'_>,
        error_var: &str,
    ) -> Result<Generated> {
        let directive = &anchor.directive;
        debug_assert_eq!(directive.kind, Kind::ErrorCheck);
        let location = anchor.location();
        let mut out = Generated::default();

        let action = if directive.return_on_violation {
            let values = self.return_values(anchor, scope, Some(error_var))?;
            if directive.log_on_violation {
                out.imports.insert("log");
                GuardAction::LogAndReturn(
                    GuardMessage::WithError {
                        prefix: format!("inco // must -log violation at {location}: "),
                        error_var: error_var.to_string(),
                    },
                    values,
                )
            } else {
                GuardAction::Return(values)
            }
        } else {
            GuardAction::Abort(GuardMessage::WithError {
                prefix: format!("inco // must violation at {location}: "),
                error_var: error_var.to_string(),
            })
        };

        out.guards.push(Guard {
            condition: format!("{error_var} != nil"),
            action,
        });
        Ok(out)
    }
}
