/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 *
 * 2024 Tendsin Mende
 */
use sylva_ast::{Ast, ExprContext, NodeRef, NodeTag};
use sylva_query::{
    patterns::{AssignPattern, NameMatch, NodePattern, WildcardPattern},
    MatchError, Matcher,
};

///`x = 1 + 2` and `y = x * 3`
fn two_assignments() -> (Ast, NodeRef, NodeRef) {
    let mut ast = Ast::new();
    let one = ast.new_constant(1);
    let two = ast.new_constant(2);
    let add = ast.new_binop(one, "+", two);
    let first = ast.new_assign_name("x", add);
    ast.push_stmt(first);

    let x = ast.new_name("x", ExprContext::Load);
    let three = ast.new_constant(3);
    let mul = ast.new_binop(x, "*", three);
    let second = ast.new_assign_name("y", mul);
    ast.push_stmt(second);
    (ast, first, second)
}

#[test]
fn assignment_queries() {
    let _ = pretty_env_logger::try_init();
    let (ast, first, _) = two_assignments();
    let matcher = Matcher::new();
    assert_eq!(matcher.find_matches(&ast, ast.root, "assign x").unwrap(), vec![first]);
    assert_eq!(matcher.find_matches(&ast, ast.root, "assign").unwrap().len(), 2);
    assert_eq!(matcher.find_assignments(&ast, ast.root, None).unwrap().len(), 2);
}

#[test]
fn regex_argument_may_contain_spaces() {
    let (ast, first, second) = two_assignments();
    let matcher = Matcher::new();
    assert_eq!(
        matcher.find_matches(&ast, ast.root, "assign /x|y z/").unwrap(),
        vec![first]
    );
    assert_eq!(
        matcher.find_matches(&ast, ast.root, "assign   /z |y/  ").unwrap(),
        vec![second]
    );
    assert!(matches!(
        matcher.find_matches(&ast, ast.root, "assign x y"),
        Err(MatchError::InvalidQuery { .. })
    ));
}

#[test]
fn matches_do_not_prune_children() {
    let (ast, _, _) = two_assignments();
    let matcher = Matcher::new();
    //the target `x` and the read of `x`
    assert_eq!(matcher.count_matches(&ast, ast.root, "name x").unwrap(), 2);
    //every node, including the ones below other matches
    assert_eq!(
        matcher.count_matches(&ast, ast.root, "*").unwrap(),
        ast.tree_size(ast.root)
    );
    let binops = matcher.find_tag(&ast, ast.root, NodeTag::BinOp).unwrap();
    assert_eq!(binops.len(), 2);
}

#[test]
fn registered_patterns_win() {
    let (ast, _, second) = two_assignments();
    let mut matcher = Matcher::new();
    matcher.register_pattern(
        "assign x",
        AssignPattern {
            target: NameMatch::Exact("y".to_owned()),
            value_tag: Some(NodeTag::BinOp),
        },
    );
    assert_eq!(matcher.find_matches(&ast, ast.root, "assign x").unwrap(), vec![second]);
    assert!(matcher.has_match(&ast, ast.root, "assign x").unwrap());
}

#[test]
fn unknown_pattern() {
    let (ast, _, _) = two_assignments();
    let err = Matcher::new()
        .find_matches(&ast, ast.root, "loops")
        .unwrap_err();
    assert!(matches!(err, MatchError::UnknownPattern { .. }));
    assert_eq!(
        err.to_string(),
        "Pattern 'loops' not registered and invalid query: Invalid query pattern: loops"
    );
}

#[test]
fn predicate_errors_abort() {
    let (ast, _, _) = two_assignments();
    let mut matcher = Matcher::new();
    matcher.register_pattern(
        "fragile",
        NodePattern::new(NodeTag::Constant).with_predicate("value", |_, v| {
            match v.as_scalar().and_then(|v| v.as_i64()) {
                Some(3) => Err("three is not allowed".to_owned()),
                _ => Ok(true),
            }
        }),
    );
    let err = matcher.find_matches(&ast, ast.root, "fragile").unwrap_err();
    assert!(matches!(
        err,
        MatchError::PredicateFailed { ref tag, .. } if tag == "Constant"
    ));
}

#[test]
fn captures_are_collected() {
    let (ast, first, _) = two_assignments();
    let matcher = Matcher::new();
    let pattern = WildcardPattern {
        capture_name: "node".to_owned(),
    };
    let matches = matcher.find_captures(&ast, first, &pattern).unwrap();
    assert_eq!(matches[0].node, first);
    assert_eq!(matches[0].captures.get("node"), Some(&first));
}

#[test]
fn predicate_queries() {
    let (ast, _, _) = two_assignments();
    let matcher = Matcher::new();
    let literals = matcher.query(&ast, ast.root, |ast, n| {
        ast[n].kind.literal().is_some()
    });
    assert_eq!(literals.len(), 3);
    assert!(matcher.find_functions(&ast, ast.root).is_empty());
    assert_eq!(matcher.find_names(&ast, ast.root, Some("y")).unwrap().len(), 1);
}
