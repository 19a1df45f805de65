//! Directive recognition over the Go fixtures in testdata/directives.

use std::path::PathBuf;

use inco::directive::{self, Kind};
use inco::inject::collect_anchors;
use inco::syntax::GoParser;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("testdata")
        .join(name)
}

fn anchors() -> Vec<directive::DirectiveAnchor> {
    let path = fixture("directives/forms.go");
    let source = std::fs::read_to_string(&path).expect("should read fixture");
    let file = GoParser::new()
        .parse(&path, source)
        .expect("fixture should parse");
    assert!(!file.has_errors());
    collect_anchors(&file).expect("should collect anchors")
}

#[test]
fn test_fixture_directive_count() {
    let anchors = anchors();
    // Four comments in NotDirectives are rejected.
    assert_eq!(anchors.len(), 9);
    let preconditions = anchors
        .iter()
        .filter(|a| a.directive.kind == Kind::Precondition)
        .count();
    assert_eq!(preconditions, 6);
}

#[test]
fn test_fixture_precondition_forms() {
    let anchors = anchors();

    let expr = &anchors[0].directive;
    assert_eq!(expr.expr.as_deref(), Some("n > 0"));
    assert_eq!(anchors[0].line, 15);

    let message = &anchors[1].directive;
    assert_eq!(message.expr.as_deref(), Some("len(name) > 0"));
    assert_eq!(message.message.as_deref(), Some("name required"));

    let nd = &anchors[2].directive;
    assert!(nd.non_defaulted);
    assert_eq!(nd.vars, vec!["a", "b", "c"]);

    let nd_ret = &anchors[3].directive;
    assert!(nd_ret.non_defaulted && nd_ret.return_on_violation);
    assert!(nd_ret.return_exprs.is_empty());

    let custom = &anchors[4].directive;
    assert_eq!(custom.return_exprs, vec!["-1", "errors.New(\"no config\")"]);
    assert_eq!(custom.vars, vec!["c"]);

    let logged = &anchors[5].directive;
    assert!(logged.log_on_violation && logged.return_on_violation);
    assert_eq!(logged.expr.as_deref(), Some("n != 0"));
}

#[test]
fn test_fixture_error_check_forms() {
    let anchors = anchors();
    let musts: Vec<_> = anchors
        .iter()
        .filter(|a| a.directive.kind == Kind::ErrorCheck)
        .collect();
    assert_eq!(musts.len(), 3);

    assert!(!musts[0].inline);
    assert!(!musts[0].directive.return_on_violation);

    assert!(musts[1].inline);
    assert!(musts[1].directive.return_on_violation);
    assert!(!musts[1].directive.log_on_violation);

    assert!(!musts[2].inline);
    assert!(musts[2].directive.log_on_violation);
}

#[test]
fn test_parse_is_deterministic() {
    for comment in [
        "// @require -nd -ret(nil, err) a, b",
        "/* @must -log */",
        "// @require x > 0 && y < 0, \"bounds, both\"",
        "// not a directive",
    ] {
        assert_eq!(directive::parse(comment), directive::parse(comment));
    }
}

#[test]
fn test_unrecognized_comments() {
    for comment in [
        "// @ensure x",
        "// @requirement",
        "// @must -nd x",
        "// @require",
        "// @require -nd",
        "// TODO(@must): later",
    ] {
        assert_eq!(directive::parse(comment), None, "{comment}");
    }
}
