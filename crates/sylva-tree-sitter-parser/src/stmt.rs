/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 *
 * 2024 Tendsin Mende
 */
//! Statements, blocks and comments.

use ahash::AHashSet;
use lazy_static::lazy_static;
use sylva_ast::{Alias, ExprContext, NodeKind, NodeRef};
use tree_sitter::Node;

use crate::{
    error::ParserError,
    expr::{self, fields, has_keyword, named},
    ParserCtx,
};

lazy_static! {
    ///Statement kinds that can be recovered from inside an error region.
    static ref STATEMENT_KINDS: AHashSet<&'static str> = [
        "expression_statement", "function_definition", "class_definition", "decorated_definition",
        "if_statement", "for_statement", "while_statement", "try_statement", "with_statement",
        "return_statement", "pass_statement", "break_statement", "continue_statement", "import_statement",
        "import_from_statement", "future_import_statement", "raise_statement", "assert_statement",
        "global_statement", "nonlocal_statement",
    ]
    .into_iter()
    .collect();
}

///Reports every syntax error and missing token in the tree at `root`.
pub fn scan_errors(ctx: &mut ParserCtx, root: &Node) {
    let mut stack = vec![*root];
    while let Some(node) = stack.pop() {
        if node.is_error() {
            let text = ctx.text(&node).to_owned();
            ctx.push_error(
                ParserError::SyntaxError { text },
                &node,
                "could not parse this",
            );
            continue;
        }
        if node.is_missing() {
            ctx.push_error(
                ParserError::Missing {
                    kind: node.kind().to_owned(),
                },
                &node,
                format!("expected {}", node.kind()),
            );
            continue;
        }
        if !node.has_error() {
            continue;
        }
        let mut cursor = node.walk();
        let children: Vec<_> = node.children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
}

///Converts the statements of a block or module. Comments become trailing comments of a statement on the same
/// line, or leading comments of the next statement. Comments without a following statement are kept as
/// `Comment` nodes.
pub fn block(ctx: &mut ParserCtx, node: Option<Node>) -> Vec<NodeRef> {
    let Some(node) = node else {
        return Vec::new();
    };
    let mut cursor = node.walk();
    let children: Vec<_> = node.named_children(&mut cursor).collect();

    let mut stmts = Vec::new();
    let mut pending: Vec<(String, Node)> = Vec::new();
    //last statement, and the row it ends on
    let mut last: Option<(NodeRef, usize)> = None;
    for child in children {
        if child.kind() == "comment" {
            if !ctx.config.attach_comments {
                continue;
            }
            let text = ctx.text(&child).to_owned();
            match last {
                Some((stmt, row)) if row == child.start_position().row && pending.is_empty() => {
                    ctx.ast[stmt].trailing_comments.push(text);
                }
                _ => pending.push((text, child)),
            }
            continue;
        }

        let converted = convert(ctx, &child);
        if let Some(first) = converted.first() {
            ctx.ast[*first]
                .leading_comments
                .extend(pending.drain(..).map(|(text, _)| text));
        }
        if let Some(stmt) = converted.last() {
            last = Some((*stmt, child.end_position().row));
        }
        stmts.extend(converted);
    }

    for (value, at) in pending {
        stmts.push(ctx.add(NodeKind::Comment { value }, &at));
    }
    stmts
}

///Converts a single statement. Error regions can produce several statements.
pub fn convert(ctx: &mut ParserCtx, node: &Node) -> Vec<NodeRef> {
    if let Some(converter) = ctx.converter(node.kind()) {
        return vec![converter.convert(ctx, node)];
    }
    if node.is_error() {
        return error_region(ctx, node);
    }

    let stmt = match node.kind() {
        "expression_statement" => expression_statement(ctx, node),
        "function_definition" => function_definition(ctx, node, Vec::new()),
        "class_definition" => class_definition(ctx, node, Vec::new()),
        "decorated_definition" => decorated_definition(ctx, node),
        "if_statement" => if_statement(ctx, node),
        "for_statement" => {
            let target = node
                .child_by_field_name("left")
                .map(|t| expr::convert_target(ctx, &t));
            let iter = node
                .child_by_field_name("right")
                .map(|i| expr::convert(ctx, &i));
            let body = block(ctx, node.child_by_field_name("body"));
            let orelse = else_clause(ctx, node.child_by_field_name("alternative"));
            let is_async = has_keyword(node, "async");
            ctx.add(
                NodeKind::For {
                    target,
                    iter,
                    body,
                    orelse,
                    is_async,
                },
                node,
            )
        }
        "while_statement" => {
            let test = node
                .child_by_field_name("condition")
                .map(|c| expr::convert(ctx, &c));
            let body = block(ctx, node.child_by_field_name("body"));
            let orelse = else_clause(ctx, node.child_by_field_name("alternative"));
            ctx.add(NodeKind::While { test, body, orelse }, node)
        }
        "try_statement" => try_statement(ctx, node),
        "with_statement" => with_statement(ctx, node),
        "return_statement" => {
            let value = named(node).first().map(|v| expr::convert(ctx, v));
            ctx.add(NodeKind::Return { value }, node)
        }
        "pass_statement" => ctx.add(NodeKind::Pass {}, node),
        "break_statement" => ctx.add(NodeKind::Break {}, node),
        "continue_statement" => ctx.add(NodeKind::Continue {}, node),
        "import_statement" => {
            let names = fields(node, "name")
                .iter()
                .map(|n| alias(ctx, n))
                .collect();
            ctx.add(NodeKind::Import { names }, node)
        }
        "import_from_statement" | "future_import_statement" => import_from(ctx, node),
        "raise_statement" => {
            let cause_node = node.child_by_field_name("cause");
            let exc = named(node)
                .into_iter()
                .find(|n| Some(n.id()) != cause_node.map(|c| c.id()))
                .map(|e| expr::convert(ctx, &e));
            let cause = cause_node.map(|c| expr::convert(ctx, &c));
            ctx.add(NodeKind::Raise { exc, cause }, node)
        }
        "assert_statement" => {
            let mut parts = named(node).into_iter();
            let test = parts.next().map(|t| expr::convert(ctx, &t));
            let msg = parts.next().map(|m| expr::convert(ctx, &m));
            ctx.add(NodeKind::Assert { test, msg }, node)
        }
        "global_statement" | "nonlocal_statement" => {
            let names = named(node)
                .iter()
                .map(|n| ctx.text(n).to_owned())
                .collect();
            if node.kind() == "global_statement" {
                ctx.add(NodeKind::Global { names }, node)
            } else {
                ctx.add(NodeKind::Nonlocal { names }, node)
            }
        }
        _ => ctx.extension(node),
    };
    vec![stmt]
}

//Keeps the statements inside an error region that parsed on their own, everything else becomes an opaque
// placeholder.
fn error_region(ctx: &mut ParserCtx, node: &Node) -> Vec<NodeRef> {
    let mut cursor = node.walk();
    let children: Vec<_> = node.children(&mut cursor).collect();

    let mut out = Vec::new();
    let mut run: Option<(Node, Node)> = None;
    for child in children {
        if STATEMENT_KINDS.contains(child.kind()) && !child.has_error() {
            if let Some((first, last)) = run.take() {
                out.push(placeholder(ctx, &first, &last));
            }
            out.extend(convert(ctx, &child));
        } else {
            run = match run {
                Some((first, _)) => Some((first, child)),
                None => Some((child, child)),
            };
        }
    }
    match run {
        Some((first, last)) => out.push(placeholder(ctx, &first, &last)),
        None if out.is_empty() => out.push(placeholder(ctx, node, node)),
        None => {}
    }

    #[cfg(feature = "log")]
    log::warn!(
        "recovered {} statements from error region at {:?}",
        out.len(),
        node.start_position()
    );

    out
}

//Expression statement holding the source from `first` to `last` as an unparsed string.
fn placeholder(ctx: &mut ParserCtx, first: &Node, last: &Node) -> NodeRef {
    let start = first.start_byte();
    let end = last.end_byte().max(start);
    let src = ctx.src;
    let text = std::str::from_utf8(&src[start..end]).unwrap_or_default();
    let value = ctx.unparsed(first, text);
    let stmt = ctx.add(NodeKind::Expr { value: Some(value) }, first);
    ctx.ast[stmt]
        .extra
        .insert("unparsed".to_owned(), true.into());
    stmt
}

fn expression_statement(ctx: &mut ParserCtx, node: &Node) -> NodeRef {
    let children = named(node);
    match children.as_slice() {
        [single] if single.kind() == "assignment" => assignment(ctx, single),
        [single] if single.kind() == "augmented_assignment" => augmented_assignment(ctx, single),
        [single] => {
            let value = expr::convert(ctx, single);
            ctx.add(NodeKind::Expr { value: Some(value) }, node)
        }
        [] => ctx.extension(node),
        many => {
            let elts = many.iter().map(|e| expr::convert(ctx, e)).collect();
            let tuple = ctx.add(
                NodeKind::Tuple {
                    elts,
                    ctx: ExprContext::Load,
                },
                node,
            );
            ctx.add(NodeKind::Expr { value: Some(tuple) }, node)
        }
    }
}

//`a = b = value` is one assignment with two targets.
fn assignment(ctx: &mut ParserCtx, node: &Node) -> NodeRef {
    let mut targets = Vec::new();
    let mut current = *node;
    let value = loop {
        if let Some(left) = current.child_by_field_name("left") {
            targets.push(expr::convert_target(ctx, &left));
        }
        match current.child_by_field_name("right") {
            Some(right) if right.kind() == "assignment" => current = right,
            right => break right.map(|r| expr::convert(ctx, &r)),
        }
    };

    let assign = ctx.add(NodeKind::Assign { value, targets }, node);
    if let Some(annotation) = node.child_by_field_name("type") {
        let text = ctx.text(&annotation);
        ctx.ast[assign]
            .extra
            .insert("annotation".to_owned(), text.into());
    }
    assign
}

fn augmented_assignment(ctx: &mut ParserCtx, node: &Node) -> NodeRef {
    let target = node
        .child_by_field_name("left")
        .map(|t| expr::convert_target(ctx, &t));
    let value = node
        .child_by_field_name("right")
        .map(|v| expr::convert(ctx, &v));
    //`+=` -> `+`
    let op = node
        .child_by_field_name("operator")
        .map(|o| ctx.text(&o).trim_end_matches('=').to_owned())
        .unwrap_or_default();
    ctx.add(NodeKind::AugAssign { target, value, op }, node)
}

fn function_definition(ctx: &mut ParserCtx, node: &Node, decorator_list: Vec<NodeRef>) -> NodeRef {
    let name = node
        .child_by_field_name("name")
        .map(|n| ctx.text(&n).to_owned())
        .unwrap_or_default();
    let (args, defaults) = match node.child_by_field_name("parameters") {
        Some(params) => expr::parameters(ctx, &params),
        None => (Vec::new(), Vec::new()),
    };
    let returns = node
        .child_by_field_name("return_type")
        .map(|r| expr::convert(ctx, &r));
    let body = block(ctx, node.child_by_field_name("body"));
    let is_async = has_keyword(node, "async");
    ctx.add(
        NodeKind::FunctionDef {
            returns,
            decorator_list,
            defaults,
            body,
            name,
            args,
            is_async,
        },
        node,
    )
}

fn class_definition(ctx: &mut ParserCtx, node: &Node, decorator_list: Vec<NodeRef>) -> NodeRef {
    let name = node
        .child_by_field_name("name")
        .map(|n| ctx.text(&n).to_owned())
        .unwrap_or_default();
    let mut bases = Vec::new();
    let mut keywords = Vec::new();
    if let Some(superclasses) = node.child_by_field_name("superclasses") {
        for base in named(&superclasses) {
            let converted = expr::convert(ctx, &base);
            if matches!(base.kind(), "keyword_argument" | "dictionary_splat") {
                keywords.push(converted);
            } else {
                bases.push(converted);
            }
        }
    }
    let body = block(ctx, node.child_by_field_name("body"));
    ctx.add(
        NodeKind::ClassDef {
            bases,
            keywords,
            decorator_list,
            body,
            name,
        },
        node,
    )
}

fn decorated_definition(ctx: &mut ParserCtx, node: &Node) -> NodeRef {
    let decorators = named(node)
        .into_iter()
        .filter(|n| n.kind() == "decorator")
        .filter_map(|d| named(&d).first().map(|e| expr::convert(ctx, e)))
        .collect();
    match node.child_by_field_name("definition") {
        Some(def) if def.kind() == "function_definition" => {
            function_definition(ctx, &def, decorators)
        }
        Some(def) if def.kind() == "class_definition" => class_definition(ctx, &def, decorators),
        _ => ctx.extension(node),
    }
}

fn if_statement(ctx: &mut ParserCtx, node: &Node) -> NodeRef {
    let test = node
        .child_by_field_name("condition")
        .map(|c| expr::convert(ctx, &c));
    let body = block(ctx, node.child_by_field_name("consequence"));

    //`elif` chains become nested ifs in the else branch
    let mut orelse = Vec::new();
    for alternative in fields(node, "alternative").into_iter().rev() {
        match alternative.kind() {
            "else_clause" => {
                orelse = block(ctx, alternative.child_by_field_name("body"));
            }
            "elif_clause" => {
                let test = alternative
                    .child_by_field_name("condition")
                    .map(|c| expr::convert(ctx, &c));
                let body = block(ctx, alternative.child_by_field_name("consequence"));
                let elif = ctx.add(
                    NodeKind::If {
                        test,
                        body,
                        orelse: std::mem::take(&mut orelse),
                    },
                    &alternative,
                );
                orelse = vec![elif];
            }
            _ => {}
        }
    }

    ctx.add(NodeKind::If { test, body, orelse }, node)
}

fn else_clause(ctx: &mut ParserCtx, node: Option<Node>) -> Vec<NodeRef> {
    match node {
        Some(clause) => block(ctx, clause.child_by_field_name("body")),
        None => Vec::new(),
    }
}

fn try_statement(ctx: &mut ParserCtx, node: &Node) -> NodeRef {
    let body = block(ctx, node.child_by_field_name("body"));
    let mut handlers = Vec::new();
    let mut orelse = Vec::new();
    let mut finalbody = Vec::new();
    for clause in named(node) {
        match clause.kind() {
            "except_clause" | "except_group_clause" => handlers.push(except_clause(ctx, &clause)),
            "else_clause" => orelse = block(ctx, clause.child_by_field_name("body")),
            "finally_clause" => {
                let inner = named(&clause).into_iter().find(|n| n.kind() == "block");
                finalbody = block(ctx, inner);
            }
            _ => {}
        }
    }
    ctx.add(
        NodeKind::Try {
            body,
            handlers,
            orelse,
            finalbody,
        },
        node,
    )
}

fn except_clause(ctx: &mut ParserCtx, node: &Node) -> NodeRef {
    let mut type_ = None;
    let mut name = None;
    let mut body = Vec::new();
    for child in named(node) {
        match child.kind() {
            "block" => body = block(ctx, Some(child)),
            "as_pattern" => {
                type_ = named(&child).first().map(|t| expr::convert(ctx, t));
                name = child
                    .child_by_field_name("alias")
                    .map(|a| ctx.text(&a).to_owned());
            }
            _ if type_.is_none() => type_ = Some(expr::convert(ctx, &child)),
            "identifier" => name = Some(ctx.text(&child).to_owned()),
            _ => {}
        }
    }
    ctx.add(NodeKind::ExceptHandler { type_, body, name }, node)
}

fn with_statement(ctx: &mut ParserCtx, node: &Node) -> NodeRef {
    let mut items = Vec::new();
    for clause in named(node).into_iter().filter(|n| n.kind() == "with_clause") {
        for item in named(&clause).into_iter().filter(|n| n.kind() == "with_item") {
            let Some(value) = item.child_by_field_name("value") else {
                continue;
            };
            let (context_expr, optional_vars) = if value.kind() == "as_pattern" {
                let context = named(&value).first().map(|c| expr::convert(ctx, c));
                let target = value
                    .child_by_field_name("alias")
                    .map(|a| expr::convert_target(ctx, &a));
                (context, target)
            } else {
                (Some(expr::convert(ctx, &value)), None)
            };
            items.push(ctx.add(
                NodeKind::WithItem {
                    context_expr,
                    optional_vars,
                },
                &item,
            ));
        }
    }
    let body = block(ctx, node.child_by_field_name("body"));
    let is_async = has_keyword(node, "async");
    ctx.add(
        NodeKind::With {
            items,
            body,
            is_async,
        },
        node,
    )
}

fn alias(ctx: &ParserCtx, node: &Node) -> Alias {
    match node.kind() {
        "aliased_import" => Alias {
            name: node
                .child_by_field_name("name")
                .map(|n| ctx.text(&n).to_owned())
                .unwrap_or_default(),
            asname: node
                .child_by_field_name("alias")
                .map(|a| ctx.text(&a).to_owned()),
        },
        _ => Alias::new(ctx.text(node)),
    }
}

fn import_from(ctx: &mut ParserCtx, node: &Node) -> NodeRef {
    let (module, level) = if node.kind() == "future_import_statement" {
        (Some("__future__".to_owned()), 0)
    } else {
        match node.child_by_field_name("module_name") {
            Some(m) if m.kind() == "relative_import" => {
                let children = named(&m);
                let level = children
                    .iter()
                    .find(|c| c.kind() == "import_prefix")
                    .map(|p| ctx.text(p).matches('.').count() as u32)
                    .unwrap_or(0);
                let module = children
                    .iter()
                    .find(|c| c.kind() == "dotted_name")
                    .map(|d| ctx.text(d).to_owned());
                (module, level)
            }
            Some(m) => (Some(ctx.text(&m).to_owned()), 0),
            None => (None, 0),
        }
    };

    let mut names: Vec<Alias> = fields(node, "name").iter().map(|n| alias(ctx, n)).collect();
    if named(node).iter().any(|n| n.kind() == "wildcard_import") {
        names.push(Alias::new("*"));
    }
    ctx.add(
        NodeKind::ImportFrom {
            module,
            names,
            level,
        },
        node,
    )
}
