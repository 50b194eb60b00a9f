/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 *
 * 2024 Tendsin Mende
 */
use sylva_ast::{
    serialize::{self, SerializeConfig},
    Alias, Ast, ExprContext, Literal, NodeKind, NodeTag, Position,
};

fn chain(depth: usize) -> Ast {
    let mut ast = Ast::new();
    let mut expr = ast.new_name("x", ExprContext::Load);
    for i in 0..depth {
        let lit = ast.new_constant(i as i64);
        expr = ast.new_binop(lit, "+", expr);
    }
    let stmt = ast.new_assign_name("y", expr);
    ast.push_stmt(stmt);
    ast
}

#[test]
fn deep_tree_roundtrip() {
    let ast = chain(2_000);
    let doc = serialize::encode(&ast, ast.root).unwrap();
    let back = serialize::decode(&doc).unwrap();
    assert!(ast.structural_eq(ast.root, &back, back.root));
    assert_eq!(back.tree_size(back.root), ast.tree_size(ast.root));
}

#[test]
fn deep_tree_text_roundtrip() {
    let ast = chain(100_000);
    let text = serialize::to_string(&ast, &SerializeConfig::default()).unwrap();
    let back = serialize::from_str(&text).unwrap();
    assert!(ast.structural_eq(ast.root, &back, back.root));
    assert_eq!(back.tree_size(back.root), ast.tree_size(ast.root));
}

#[test]
fn deep_tree_document_is_shallow() {
    let ast = chain(100_000);
    let doc = serialize::encode(&ast, ast.root).unwrap();
    //root object, table, record, reference list, reference
    let mut depth = 0;
    let mut level = vec![&doc];
    while !level.is_empty() {
        depth += 1;
        level = level
            .into_iter()
            .flat_map(|v| match v {
                serde_json::Value::Array(items) => items.iter().collect::<Vec<_>>(),
                serde_json::Value::Object(map) => map.values().collect(),
                _ => Vec::new(),
            })
            .collect();
    }
    assert!(depth <= 6, "document depth {depth}");
    drop(doc);
}

#[test]
fn metadata_roundtrip() {
    let _ = pretty_env_logger::try_init();
    let mut ast = Ast::new();
    let value = ast.new_constant(Literal::Str("hello".to_owned()));
    let stmt = ast.new_assign_name("greeting", value);
    ast[stmt].position = Some(Position::new(3, 4, 27).with_end(3, 20));
    ast[stmt].leading_comments.push("# leading".to_owned());
    ast[stmt].trailing_comments.push("# trailing".to_owned());
    ast[stmt]
        .extra
        .insert("plugin".to_owned(), serde_json::json!({"weight": 0.5}));
    ast.push_stmt(stmt);

    let import = ast.add(NodeKind::ImportFrom {
        module: Some("os".to_owned()),
        names: vec![Alias {
            name: "path".to_owned(),
            asname: Some("p".to_owned()),
        }],
        level: 1,
    });
    ast.push_stmt(import);

    let ext = ast.add(NodeKind::Extension {
        kind: "print_statement".to_owned(),
    });
    ast[ext]
        .extra
        .insert("text".to_owned(), "print 'hi'".into());
    ast.push_stmt(ext);

    let text = serialize::to_string(&ast, &SerializeConfig { pretty: true }).unwrap();
    let back = serialize::from_str(&text).unwrap();
    assert!(ast.structural_eq(ast.root, &back, back.root));
}

#[test]
fn every_tag_survives() {
    let mut ast = Ast::new();
    for tag in NodeTag::ALL {
        let node = ast.add(NodeKind::empty(*tag));
        let stmt = ast.new_expr_stmt(node);
        ast.push_stmt(stmt);
    }
    let doc = serialize::encode(&ast, ast.root).unwrap();
    let back = serialize::decode(&doc).unwrap();
    assert!(ast.structural_eq(ast.root, &back, back.root));
}

#[test]
fn shared_subtree_across_statements() {
    let mut ast = Ast::new();
    let one = ast.new_constant(1);
    let two = ast.new_constant(2);
    let shared = ast.new_binop(one, "+", two);
    let a = ast.new_assign_name("a", shared);
    let b = ast.new_assign_name("b", shared);
    ast.push_stmt(a);
    ast.push_stmt(b);

    let text = serialize::to_string(&ast, &SerializeConfig::default()).unwrap();
    let back = serialize::from_str(&text).unwrap();
    assert!(ast.structural_eq(ast.root, &back, back.root));
    //the shared binop is still one node.
    assert_eq!(back.walk_unique(back.root).count(), ast.walk_unique(ast.root).count());
}
