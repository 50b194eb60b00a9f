/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 *
 * 2024 Tendsin Mende
 */
use sylva_ast::{Ast, ExprContext, Literal, NodeKind, NodeRef, NodeTag};
use sylva_common::{Diagnostic, ErrorKind};
use sylva_opt::{
    passes::{
        pass_by_name, ConstantFolding, DeadCodeElimination, FunctionInlining, RenameVariable,
        UnusedVariableRemoval,
    },
    ArithmeticError, Config, Transformer,
};

fn expr_module(ast: &mut Ast, expr: NodeRef) -> NodeRef {
    let stmt = ast.new_expr_stmt(expr);
    ast.push_stmt(stmt);
    stmt
}

fn value_of(ast: &Ast, stmt: NodeRef) -> NodeRef {
    ast[stmt].kind.single("value").flatten().unwrap()
}

#[test]
fn fold_one_plus_two() {
    let _ = pretty_env_logger::try_init();
    let mut ast = Ast::new();
    let a = ast.new_constant(1);
    let b = ast.new_constant(2);
    let add = ast.new_binop(a, "+", b);
    let stmt = expr_module(&mut ast, add);

    let mut t = Transformer::default();
    t.add_pass(ConstantFolding::default());
    t.run(&mut ast).unwrap();

    let value = value_of(&ast, stmt);
    assert_eq!(ast[value].kind.literal(), Some(&Literal::Int(3)));
}

#[test]
fn fold_is_idempotent() {
    let _ = pretty_env_logger::try_init();
    let mut ast = Ast::new();
    //x * (2 ** 3 - 1) + 4 / 2
    let x = ast.new_name("x", ExprContext::Load);
    let two = ast.new_constant(2);
    let three = ast.new_constant(3);
    let pow = ast.new_binop(two, "**", three);
    let one = ast.new_constant(1);
    let sub = ast.new_binop(pow, "-", one);
    let mul = ast.new_binop(x, "*", sub);
    let four = ast.new_constant(4);
    let two_b = ast.new_constant(2);
    let div = ast.new_binop(four, "/", two_b);
    let add = ast.new_binop(mul, "+", div);
    expr_module(&mut ast, add);

    let mut t = Transformer::default();
    t.add_pass(ConstantFolding::default());
    t.run(&mut ast).unwrap();
    let once = ast.clone();
    t.run(&mut ast).unwrap();
    assert!(ast.structural_eq(ast.root, &once, once.root));

    let folded: Vec<_> = ast
        .find_constants(ast.root)
        .into_iter()
        .filter_map(|c| ast[c].kind.literal().cloned())
        .collect();
    assert_eq!(folded, vec![Literal::Int(7), Literal::Float(2.0)]);
}

#[test]
fn division_by_zero_fails_pipeline() {
    let _ = pretty_env_logger::try_init();
    let mut ast = Ast::new();
    let a = ast.new_constant(1);
    let b = ast.new_constant(0);
    let div = ast.new_binop(a, "/", b);
    expr_module(&mut ast, div);

    let mut t = Transformer::default();
    t.add_pass(ConstantFolding::default());
    let err = t.run(&mut ast).unwrap_err();
    assert_eq!(err.pass, "constant_folding");
    assert_eq!(err.tag, "BinOp");
    assert!(matches!(
        err.arithmetic(),
        Some(ArithmeticError::DivisionByZero { .. })
    ));

    let value = err.to_value();
    assert_eq!(err.kind(), ErrorKind::Transform);
    assert_eq!(value["code"], "TRANSFORM_ERROR");
    assert_eq!(value["details"]["pass_name"], "constant_folding");
    assert_eq!(value["details"]["node_type"], "BinOp");
}

#[test]
fn failing_pass_stops_pipeline() {
    let mut ast = Ast::new();
    let a = ast.new_constant(1);
    let b = ast.new_constant(0);
    let div = ast.new_binop(a, "%", b);
    expr_module(&mut ast, div);
    let x = ast.new_name("x", ExprContext::Load);
    expr_module(&mut ast, x);

    let mut t = Transformer::default();
    t.add_pass(ConstantFolding::default());
    t.add_pass(RenameVariable::new("x", "y"));
    assert!(t.run(&mut ast).is_err());
    assert_eq!(ast[x].kind.identifier(), Some("x"));
}

#[test]
fn remove_unused_assignment() {
    let _ = pretty_env_logger::try_init();
    //x = 1; y = 2; use(y)
    let mut ast = Ast::new();
    let one = ast.new_constant(1);
    let x = ast.new_assign_name("x", one);
    ast.push_stmt(x);
    let two = ast.new_constant(2);
    let y = ast.new_assign_name("y", two);
    ast.push_stmt(y);
    let read = ast.new_name("y", ExprContext::Load);
    let call = ast.new_call_name("use", vec![read]);
    expr_module(&mut ast, call);

    let mut t = Transformer::default();
    t.add_pass(UnusedVariableRemoval::default());
    t.run(&mut ast).unwrap();

    let body = ast[ast.root].kind.list("body").unwrap().to_vec();
    assert_eq!(body.len(), 3);
    //the assignment to x is replaced by its value
    assert_eq!(body[0], one);
    assert_eq!(body[1], y);
    assert_eq!(ast.find_all(ast.root, NodeTag::Assign), vec![y]);
}

#[test]
fn dead_code_after_return() {
    let mut ast = Ast::new();
    let one = ast.new_constant(1);
    let ret = ast.new_return(Some(one));
    let two = ast.new_constant(2);
    let assign = ast.new_assign_name("x", two);
    let f = ast.new_function("f", vec![], vec![ret, assign]);
    ast.push_stmt(f);

    let mut t = Transformer::default();
    t.add_pass(DeadCodeElimination::default());
    t.run(&mut ast).unwrap();

    let body = ast[f].kind.list("body").unwrap().to_vec();
    assert_eq!(body.len(), 2);
    assert_eq!(ast[body[0]].tag(), NodeTag::Return);
    assert_eq!(ast[body[1]].tag(), NodeTag::Pass);
}

#[test]
fn inline_trivial_function() {
    let _ = pretty_env_logger::try_init();
    //def answer(): return 42
    //print(answer())
    let mut ast = Ast::new();
    let c = ast.new_constant(42);
    let ret = ast.new_return(Some(c));
    let f = ast.new_function("answer", vec![], vec![ret]);
    ast.push_stmt(f);
    let call = ast.new_call_name("answer", vec![]);
    let print = ast.new_call_name("print", vec![call]);
    expr_module(&mut ast, print);

    let mut t = Transformer::default();
    t.add_pass(FunctionInlining::default());
    t.run(&mut ast).unwrap();

    let NodeKind::Call { args, .. } = &ast[print].kind else {
        panic!("expected call, got {:?}", ast[print].kind);
    };
    //the definition keeps its own expression
    assert_ne!(args[0], c);
    assert_eq!(ast[args[0]].kind.literal(), Some(&Literal::Int(42)));
    assert_eq!(ast[ret].kind.single("value"), Some(Some(c)));
}

#[test]
fn recursive_function_is_not_inlined() {
    let _ = pretty_env_logger::try_init();
    //def fact(n): return n * fact(n - 1)
    //y = fact(5)
    let mut ast = Ast::new();
    let n = ast.new_name("n", ExprContext::Load);
    let n2 = ast.new_name("n", ExprContext::Load);
    let one = ast.new_constant(1);
    let dec = ast.new_binop(n2, "-", one);
    let inner = ast.new_call_name("fact", vec![dec]);
    let mul = ast.new_binop(n, "*", inner);
    let ret = ast.new_return(Some(mul));
    let f = ast.new_function("fact", vec![], vec![ret]);
    ast.push_stmt(f);
    let five = ast.new_constant(5);
    let outer = ast.new_call_name("fact", vec![five]);
    let assign = ast.new_assign_name("y", outer);
    ast.push_stmt(assign);

    let size = ast.tree_size(ast.root);
    let mut t = Transformer::default();
    t.add_pass(FunctionInlining::default());
    t.run(&mut ast).unwrap();

    assert_eq!(value_of(&ast, assign), outer);
    assert_eq!(ast[mul].kind.single("right"), Some(Some(inner)));
    assert_eq!(ast.tree_size(ast.root), size);
}

#[test]
fn mutually_recursive_functions_are_not_inlined() {
    //def ping(): return pong()
    //def pong(): return ping()
    //def answer(): return 42
    //x = ping() + answer()
    let mut ast = Ast::new();
    for (name, callee) in [("ping", "pong"), ("pong", "ping")] {
        let call = ast.new_call_name(callee, vec![]);
        let ret = ast.new_return(Some(call));
        let f = ast.new_function(name, vec![], vec![ret]);
        ast.push_stmt(f);
    }
    let c = ast.new_constant(42);
    let ret = ast.new_return(Some(c));
    let f = ast.new_function("answer", vec![], vec![ret]);
    ast.push_stmt(f);
    let ping = ast.new_call_name("ping", vec![]);
    let answer = ast.new_call_name("answer", vec![]);
    let add = ast.new_binop(ping, "+", answer);
    let assign = ast.new_assign_name("x", add);
    ast.push_stmt(assign);

    let mut t = Transformer::default();
    t.add_pass(FunctionInlining::default());
    t.run(&mut ast).unwrap();

    assert_eq!(ast[add].kind.single("left"), Some(Some(ping)));
    let right = ast[add].kind.single("right").flatten().unwrap();
    assert_eq!(ast[right].kind.literal(), Some(&Literal::Int(42)));
}

#[test]
fn inlined_copies_are_independent() {
    //def two(): return 1 + 1
    //a = two()
    //b = two()
    let mut ast = Ast::new();
    let l = ast.new_constant(1);
    let r = ast.new_constant(1);
    let sum = ast.new_binop(l, "+", r);
    let ret = ast.new_return(Some(sum));
    let f = ast.new_function("two", vec![], vec![ret]);
    ast.push_stmt(f);
    let mut assigns = Vec::new();
    for name in ["a", "b"] {
        let call = ast.new_call_name("two", vec![]);
        let assign = ast.new_assign_name(name, call);
        ast.push_stmt(assign);
        assigns.push(assign);
    }

    let mut t = Transformer::default();
    t.add_pass(FunctionInlining::default());
    t.run(&mut ast).unwrap();

    let a = value_of(&ast, assigns[0]);
    let b = value_of(&ast, assigns[1]);
    assert_ne!(a, b);
    assert_ne!(a, sum);
    assert!(ast.structural_eq(a, &ast, sum));
    assert!(ast.structural_eq(b, &ast, sum));
    assert_eq!(ast.walk_unique(ast.root).count(), ast.tree_size(ast.root));
}

#[test]
fn rename_by_name() {
    let mut ast = Ast::new();
    let target = ast.new_name("a", ExprContext::Store);
    let one = ast.new_constant(1);
    let assign = ast.new_assign(vec![target], one);
    ast.push_stmt(assign);
    let read = ast.new_name("a", ExprContext::Load);
    let other = ast.new_name("ab", ExprContext::Load);
    let add = ast.new_binop(read, "+", other);
    expr_module(&mut ast, add);

    let mut t = Transformer::default();
    t.add_boxed_pass(pass_by_name("rename_a_to_b", &Config::default()).unwrap());
    t.run(&mut ast).unwrap();

    assert_eq!(ast[target].kind.identifier(), Some("b"));
    assert_eq!(ast[read].kind.identifier(), Some("b"));
    assert_eq!(ast[other].kind.identifier(), Some("ab"));
}

#[test]
fn optimizing_pipeline() {
    let _ = pretty_env_logger::try_init();
    //def f():
    //    y = (x + 0) * (2 - 1)
    //    return y
    //    z = 3
    let mut ast = Ast::new();
    let x = ast.new_name("x", ExprContext::Load);
    let zero = ast.new_constant(0);
    let add = ast.new_binop(x, "+", zero);
    let two = ast.new_constant(2);
    let one = ast.new_constant(1);
    let sub = ast.new_binop(two, "-", one);
    let mul = ast.new_binop(add, "*", sub);
    let assign = ast.new_assign_name("y", mul);
    let y = ast.new_name("y", ExprContext::Load);
    let ret = ast.new_return(Some(y));
    let three = ast.new_constant(3);
    let dead = ast.new_assign_name("z", three);
    let f = ast.new_function("f", vec![], vec![assign, ret, dead]);
    ast.push_stmt(f);

    let mut t = Transformer::optimizing(Config::default());
    assert_eq!(
        t.pass_names(),
        vec![
            "constant_folding",
            "expression_simplification",
            "dead_code_elimination",
            "unused_variable_removal"
        ]
    );
    t.run(&mut ast).unwrap();

    let body = ast[f].kind.list("body").unwrap().to_vec();
    assert_eq!(body[0], assign);
    //(x + 0) * 1 becomes x
    assert_eq!(ast[assign].kind.single("value").flatten(), Some(x));
    assert_eq!(ast[body[2]].tag(), NodeTag::Pass);
}
