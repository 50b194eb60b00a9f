/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 *
 * 2024 Tendsin Mende
 */
use static_assertions::assert_impl_all;
use sylva_ast::{Ast, Literal, NodeKind, NodeRef, NodeTag};
use sylva_common::{Diagnostic, ErrorKind};
use sylva_opt::{ArithmeticError, Pass, PassError};
use sylva_query::patterns::{NodePattern, WildcardPattern};
use sylva_tree_sitter_parser::{tree_sitter, ParserCtx};
use sylvac::{Pipeline, PipelineError, Registry};

assert_impl_all!(Ast: Send, Sync);
assert_impl_all!(Registry: Send, Sync);

fn parse(src: &str) -> Ast {
    let _ = pretty_env_logger::try_init();
    match sylvac::parse(&Registry::default(), src) {
        Ok(ast) => ast,
        Err((_, errors)) => panic!("unexpected errors: {errors:?}"),
    }
}

fn body(ast: &Ast, node: NodeRef) -> Vec<NodeRef> {
    ast[node].kind.list("body").unwrap().to_vec()
}

fn assigned_value(ast: &Ast, stmt: NodeRef) -> Option<Literal> {
    let value = ast[stmt].kind.single("value").flatten()?;
    ast[value].kind.literal().cloned()
}

#[test]
fn query_assignments() {
    let registry = Registry::default();
    let ast = parse("x = 1 + 2\ny = x * 3\n");
    assert_eq!(sylvac::query(&registry, &ast, "assign x").unwrap().len(), 1);
    assert_eq!(sylvac::query(&registry, &ast, "assign").unwrap().len(), 2);
    assert_eq!(sylvac::query(&registry, &ast, "name x").unwrap().len(), 2);
    assert_eq!(sylvac::query(&registry, &ast, "assign /^[xy]$/").unwrap().len(), 2);
}

#[test]
fn query_regex_with_space() {
    let registry = Registry::default();
    let ast = parse("foo()\nbar()\nfoo(bar())\n");
    assert_eq!(sylvac::query(&registry, &ast, "call /foo|bar baz/").unwrap().len(), 2);
    assert_eq!(sylvac::query(&registry, &ast, "call /bar( baz)?/").unwrap().len(), 2);
}

#[test]
fn invalid_query_is_a_match_error() {
    let ast = parse("x = 1\n");
    let err = sylvac::query(&Registry::default(), &ast, "frobnicate x").unwrap_err();
    assert!(matches!(err, PipelineError::MatchError(_)));
    assert_eq!(err.kind(), ErrorKind::Match);
    assert_eq!(err.details()["pattern"], "frobnicate x");
}

#[test]
fn registered_patterns_win() {
    let mut registry = Registry::default();
    registry.register_pattern("functions", NodePattern::new(NodeTag::FunctionDef));
    registry.register_pattern("everything", WildcardPattern::default());
    let ast = parse("def f():\n    pass\ndef g():\n    pass\n");
    assert!(registry.has_pattern("functions"));
    assert_eq!(sylvac::query(&registry, &ast, "functions").unwrap().len(), 2);
    assert_eq!(
        sylvac::query(&registry, &ast, "everything").unwrap().len(),
        ast.tree_size(ast.root)
    );
}

#[test]
fn fold_source() {
    let registry = Registry::default();
    let mut ast = parse("x = 1 + 2\n");
    sylvac::transform(&registry, &mut ast, &["constant_folding"]).unwrap();
    let stmt = body(&ast, ast.root)[0];
    assert_eq!(assigned_value(&ast, stmt), Some(Literal::Int(3)));
}

#[test]
fn division_by_zero_fails() {
    let registry = Registry::default();
    let mut ast = parse("x = 1 / 0\n");
    let err = sylvac::transform(&registry, &mut ast, &["constant_folding"]).unwrap_err();
    let PipelineError::TransformError(inner) = &err else {
        panic!("expected transform error, got {err:?}");
    };
    assert!(matches!(
        inner.arithmetic(),
        Some(ArithmeticError::DivisionByZero { .. })
    ));
    let value = err.to_value();
    assert_eq!(value["code"], "TRANSFORM_ERROR");
    assert_eq!(value["details"]["pass_name"], "constant_folding");
    assert_eq!(value["details"]["node_type"], "BinOp");
}

#[test]
fn unused_variables_are_removed() {
    let registry = Registry::default();
    let mut ast = parse("x = 1\ny = 2\nuse(y)\n");
    sylvac::transform(&registry, &mut ast, &["unused_variable_removal"]).unwrap();
    assert_eq!(sylvac::query(&registry, &ast, "assign x").unwrap().len(), 0);
    assert_eq!(sylvac::query(&registry, &ast, "assign y").unwrap().len(), 1);
}

#[test]
fn global_updates_outer_symbol() {
    let src = "x = 0\ndef f():\n    global x\n    x = 1\ndef g():\n    x = 2\n";
    let ast = parse(src);
    let table = sylvac::analyze(&ast).unwrap();

    let outer = table.lookup("x").unwrap();
    assert_eq!(table[outer].definitions.len(), 2);
    assert!(table[outer].is_global);

    let root = table.root_scope();
    let g_scope = table[root].children[1];
    let local = table.lookup_from(g_scope, "x").unwrap();
    assert_ne!(local, outer);
    assert_eq!(table[local].definitions.len(), 1);
}

#[test]
fn dead_code_after_return() {
    let registry = Registry::default();
    let mut ast = parse("def f():\n    return 1\n    x = 2\n");
    sylvac::transform(&registry, &mut ast, &["dead_code_elimination"]).unwrap();
    let f = body(&ast, ast.root)[0];
    let tags: Vec<_> = body(&ast, f)
        .into_iter()
        .map(|s| ast.tag(s).unwrap())
        .collect();
    assert_eq!(tags, vec![NodeTag::Return, NodeTag::Pass]);
}

#[test]
fn recursive_functions_stay_calls() {
    let registry = Registry::default();
    let mut ast = parse("def fact(n):\n    return n and n * fact(n - 1)\ny = fact(5)\nz = fact(1) + 1\n");
    let calls = sylvac::query(&registry, &ast, "call fact").unwrap().len();
    sylvac::transform(&registry, &mut ast, &["function_inlining"]).unwrap();
    assert_eq!(sylvac::query(&registry, &ast, "call fact").unwrap().len(), calls);
    //still a tree, and still serializable
    assert_eq!(ast.walk_unique(ast.root).count(), ast.tree_size(ast.root));
    sylvac::serialize(&ast).unwrap();
}

#[test]
fn unknown_pass() {
    let mut ast = parse("x = 1\n");
    let err = sylvac::transform(&Registry::default(), &mut ast, &["does_not_exist"]).unwrap_err();
    assert!(matches!(err, PipelineError::UnknownPass { ref name } if name == "does_not_exist"));
    assert_eq!(err.code(), "TRANSFORM_ERROR");
}

#[derive(Default)]
struct Explode;

impl Pass for Explode {
    fn name(&self) -> &str {
        "explode"
    }

    fn transform(&mut self, ast: &mut Ast, node: NodeRef) -> Result<NodeRef, PassError> {
        if ast.tag(node) == Some(NodeTag::Constant) {
            Err(PassError::Any("boom".to_owned()))
        } else {
            Ok(node)
        }
    }
}

#[test]
fn registered_passes() {
    let mut registry = Registry::default();
    registry.register_pass("explode", |_config| Box::new(Explode) as Box<dyn Pass>);
    let mut ast = parse("x = 1\n");
    let err = sylvac::transform(&registry, &mut ast, &["explode"]).unwrap_err();
    assert_eq!(err.details()["pass_name"], "explode");

    //built-in and parametrised passes are still available
    let mut ast = parse("a = 1\nprint(a)\n");
    sylvac::transform(&registry, &mut ast, &["rename_a_to_b"]).unwrap();
    assert_eq!(sylvac::query(&registry, &ast, "name b").unwrap().len(), 2);
    assert_eq!(sylvac::query(&registry, &ast, "name a").unwrap().len(), 0);
}

fn true_as_one(ctx: &mut ParserCtx, node: &tree_sitter::Node) -> NodeRef {
    ctx.add(
        NodeKind::Constant {
            value: Literal::Int(1),
        },
        node,
    )
}

#[test]
fn registered_converters() {
    let mut registry = Registry::default();
    registry.register_converter("true", true_as_one);
    let ast = match sylvac::parse(&registry, "x = True\n") {
        Ok(ast) => ast,
        Err((_, errors)) => panic!("unexpected errors: {errors:?}"),
    };
    let stmt = body(&ast, ast.root)[0];
    assert_eq!(assigned_value(&ast, stmt), Some(Literal::Int(1)));
}

#[test]
fn serialize_round_trip() {
    let src = "import os\n\n# helper\nclass A(B):\n    def m(self, x=1):\n        return [i * 2 for i in x if i]\n";
    let ast = parse(src);
    let text = sylvac::serialize(&ast).unwrap();
    let decoded = sylvac::deserialize(&text).unwrap();
    assert!(ast.structural_eq(ast.root, &decoded, decoded.root));
}

#[test]
fn deserialize_errors() {
    let err = sylvac::deserialize("{\"type\": \"NoSuchNode\"}").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Serialize);
    let err = sylvac::deserialize("not json").unwrap_err();
    assert_eq!(err.code(), "SERIALIZE_ERROR");
}

#[test]
fn syntax_errors_are_reported() {
    let pipeline = Pipeline::new(Registry::default());
    let err = pipeline.execute_on_str("def (:\n").err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Parse);
    assert!(err.details().contains_key("line"));
}

#[test]
fn optimizing_pipeline() {
    let _ = pretty_env_logger::try_init();
    let src = "def f(a):\n    unused = 4\n    return a * (2 + 3)\n    print(a)\nresult = f(1)\nprint(result)\n";
    let pipeline = Pipeline::optimizing(Registry::default());
    let output = pipeline.execute_on_str(src).unwrap();

    let ast = &output.ast;
    let registry = &pipeline.registry;
    assert_eq!(sylvac::query(registry, ast, "assign unused").unwrap().len(), 0);
    let constants: Vec<_> = ast
        .find_constants(ast.root)
        .into_iter()
        .filter_map(|c| ast[c].kind.literal().cloned())
        .collect();
    assert!(constants.contains(&Literal::Int(5)));

    let f = body(ast, ast.root)[0];
    assert_eq!(ast.tag(*body(ast, f).last().unwrap()), Some(NodeTag::Pass));

    assert!(output.symbols.lookup("f").is_some());
    let decoded = sylvac::deserialize(&output.text).unwrap();
    assert!(ast.structural_eq(ast.root, &decoded, decoded.root));
}
