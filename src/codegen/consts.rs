//! Constant folding of precondition expressions.
//!
//! Only literal booleans and integers are folded; anything touching a
//! variable or a call is not constant.

use tree_sitter::Node;

use crate::syntax::expr::ExprTree;
use crate::syntax::named_children;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Value {
    Bool(bool),
    Int(i128),
}

/// Whether the expression always evaluates to `false`.
pub fn is_constant_false(tree: &ExprTree) -> bool {
    tree.node()
        .is_some_and(|node| fold(tree, node) == Some(Value::Bool(false)))
}

fn fold(tree: &ExprTree, node: Node<'_>) -> Option<Value> {
    let text = tree.text(node);
    match node.kind() {
        "true" => Some(Value::Bool(true)),
        "false" => Some(Value::Bool(false)),
        "identifier" => match text {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        "int_literal" => parse_int(text).map(Value::Int),
        "parenthesized_expression" => {
            let inner = named_children(node)
                .into_iter()
                .find(|n| n.kind() != "comment")?;
            fold(tree, inner)
        }
        "unary_expression" => {
            let operator = tree.text(node.child_by_field_name("operator")?);
            let operand = fold(tree, node.child_by_field_name("operand")?)?;
            match (operator, operand) {
                ("!", Value::Bool(b)) => Some(Value::Bool(!b)),
                ("-", Value::Int(i)) => Some(Value::Int(-i)),
                ("+", Value::Int(i)) => Some(Value::Int(i)),
                _ => None,
            }
        }
        "binary_expression" => {
            let operator = tree.text(node.child_by_field_name("operator")?);
            let left = fold(tree, node.child_by_field_name("left")?);
            let right = fold(tree, node.child_by_field_name("right")?);
            fold_binary(operator, left, right)
        }
        _ => None,
    }
}

fn fold_binary(operator: &str, left: Option<Value>, right: Option<Value>) -> Option<Value> {
    use Value::{Bool, Int};

    // Short-circuit forms are constant when one side decides them.
    match (operator, left, right) {
        ("&&", Some(Bool(false)), _) | ("&&", _, Some(Bool(false))) => return Some(Bool(false)),
        ("||", Some(Bool(true)), _) | ("||", _, Some(Bool(true))) => return Some(Bool(true)),
        _ => {}
    }

    match (operator, left?, right?) {
        ("&&", Bool(a), Bool(b)) => Some(Bool(a && b)),
        ("||", Bool(a), Bool(b)) => Some(Bool(a || b)),
        ("==", a, b) => Some(Bool(a == b)),
        ("!=", a, b) => Some(Bool(a != b)),
        ("<", Int(a), Int(b)) => Some(Bool(a < b)),
        ("<=", Int(a), Int(b)) => Some(Bool(a <= b)),
        (">", Int(a), Int(b)) => Some(Bool(a > b)),
        (">=", Int(a), Int(b)) => Some(Bool(a >= b)),
        ("+", Int(a), Int(b)) => a.checked_add(b).map(Int),
        ("-", Int(a), Int(b)) => a.checked_sub(b).map(Int),
        ("*", Int(a), Int(b)) => a.checked_mul(b).map(Int),
        _ => None,
    }
}

fn parse_int(text: &str) -> Option<i128> {
    let digits: String = text.chars().filter(|c| *c != '_').collect();
    let lower = digits.to_ascii_lowercase();
    if let Some(hex) = lower.strip_prefix("0x") {
        i128::from_str_radix(hex, 16).ok()
    } else if let Some(bin) = lower.strip_prefix("0b") {
        i128::from_str_radix(bin, 2).ok()
    } else if let Some(oct) = lower.strip_prefix("0o") {
        i128::from_str_radix(oct, 8).ok()
    } else if lower.len() > 1 && lower.starts_with('0') {
        i128::from_str_radix(&lower[1..], 8).ok()
    } else {
        lower.parse().ok()
    }
}
