/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 *
 * 2024 Tendsin Mende
 */
//! Expression related parser portion.

use sylva_ast::{ExprContext, Literal, NodeKind, NodeRef};
use tree_sitter::Node;

use crate::{literal, ParserCtx};

///Named children of `node`, without comments.
pub(crate) fn named<'t>(node: &Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|n| n.kind() != "comment")
        .collect()
}

///All children of `node` with the field `field`.
pub(crate) fn fields<'t>(node: &Node<'t>, field: &str) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children_by_field_name(field, &mut cursor).collect()
}

///True if one of the unnamed children of `node` is the keyword `keyword`.
pub(crate) fn has_keyword(node: &Node, keyword: &str) -> bool {
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .any(|c| !c.is_named() && c.kind() == keyword);
    found
}

fn opt_expr(ctx: &mut ParserCtx, node: Option<Node>) -> Option<NodeRef> {
    node.map(|n| convert(ctx, &n))
}

fn exprs(ctx: &mut ParserCtx, nodes: &[Node]) -> Vec<NodeRef> {
    nodes.iter().map(|n| convert(ctx, n)).collect()
}

pub fn convert(ctx: &mut ParserCtx, node: &Node) -> NodeRef {
    if let Some(converter) = ctx.converter(node.kind()) {
        return converter.convert(ctx, node);
    }
    if node.is_error() {
        //reported while scanning the tree
        let text = ctx.text(node);
        return ctx.unparsed(node, text);
    }
    if node.is_missing() {
        //reported while scanning the tree
        return ctx.unparsed(node, "");
    }

    match node.kind() {
        "identifier" | "keyword_identifier" => {
            let id = ctx.text(node).to_owned();
            ctx.add(
                NodeKind::Name {
                    id,
                    ctx: ExprContext::Load,
                },
                node,
            )
        }
        "integer" => literal::integer(ctx, node),
        "float" => literal::float(ctx, node),
        "string" | "concatenated_string" => literal::string(ctx, node),
        "true" | "false" | "none" | "ellipsis" => {
            let value = match node.kind() {
                "true" => Literal::Bool(true),
                "false" => Literal::Bool(false),
                "ellipsis" => Literal::Ellipsis,
                _ => Literal::None,
            };
            ctx.add(NodeKind::Constant { value }, node)
        }
        "binary_operator" => {
            let left = opt_expr(ctx, node.child_by_field_name("left"));
            let right = opt_expr(ctx, node.child_by_field_name("right"));
            let op = node
                .child_by_field_name("operator")
                .map(|o| ctx.text(&o).to_owned())
                .unwrap_or_default();
            ctx.add(NodeKind::BinOp { left, right, op }, node)
        }
        "unary_operator" | "not_operator" => {
            let operand = opt_expr(ctx, node.child_by_field_name("argument"));
            let op = if node.kind() == "not_operator" {
                "not".to_owned()
            } else {
                node.child_by_field_name("operator")
                    .map(|o| ctx.text(&o).to_owned())
                    .unwrap_or_default()
            };
            ctx.add(NodeKind::UnaryOp { operand, op }, node)
        }
        "boolean_operator" => boolean_operator(ctx, node),
        "comparison_operator" => {
            let mut cursor = node.walk();
            let children: Vec<_> = node
                .children(&mut cursor)
                .filter(|n| n.kind() != "comment")
                .collect();
            let mut operands = Vec::new();
            let mut ops = Vec::new();
            for child in children {
                if child.is_named() {
                    operands.push(child);
                } else {
                    ops.push(child.kind().to_owned());
                }
            }
            let mut operands = exprs(ctx, &operands).into_iter();
            let left = operands.next();
            ctx.add(
                NodeKind::Compare {
                    left,
                    comparators: operands.collect(),
                    ops,
                },
                node,
            )
        }
        "call" => call(ctx, node),
        "attribute" => {
            let value = opt_expr(ctx, node.child_by_field_name("object"));
            let attr = node
                .child_by_field_name("attribute")
                .map(|a| ctx.text(&a).to_owned())
                .unwrap_or_default();
            ctx.add(
                NodeKind::Attribute {
                    value,
                    attr,
                    ctx: ExprContext::Load,
                },
                node,
            )
        }
        "subscript" => {
            let value = opt_expr(ctx, node.child_by_field_name("value"));
            let slices = fields(node, "subscript");
            let slice = match slices.as_slice() {
                [] => None,
                [single] => Some(convert(ctx, single)),
                many => {
                    let elts = exprs(ctx, many);
                    Some(ctx.add(
                        NodeKind::Tuple {
                            elts,
                            ctx: ExprContext::Load,
                        },
                        node,
                    ))
                }
            };
            ctx.add(
                NodeKind::Subscript {
                    value,
                    slice,
                    ctx: ExprContext::Load,
                },
                node,
            )
        }
        "list" | "list_pattern" => {
            let elts = exprs(ctx, &named(node));
            ctx.add(
                NodeKind::List {
                    elts,
                    ctx: ExprContext::Load,
                },
                node,
            )
        }
        "tuple" | "tuple_pattern" | "expression_list" | "pattern_list" => {
            let elts = exprs(ctx, &named(node));
            ctx.add(
                NodeKind::Tuple {
                    elts,
                    ctx: ExprContext::Load,
                },
                node,
            )
        }
        "parenthesized_expression" | "as_pattern_target" => match named(node).first() {
            Some(inner) => convert(ctx, inner),
            None => ctx.extension(node),
        },
        "list_comprehension" | "set_comprehension" | "generator_expression"
        | "dictionary_comprehension" => comprehension(ctx, node),
        "lambda" => {
            let (args, defaults) = match node.child_by_field_name("parameters") {
                Some(params) => parameters(ctx, &params),
                None => (Vec::new(), Vec::new()),
            };
            let body = opt_expr(ctx, node.child_by_field_name("body"));
            ctx.add(
                NodeKind::Lambda {
                    body,
                    defaults,
                    args,
                },
                node,
            )
        }
        "keyword_argument" => {
            let arg = node
                .child_by_field_name("name")
                .map(|n| ctx.text(&n).to_owned());
            let value = opt_expr(ctx, node.child_by_field_name("value"));
            ctx.add(NodeKind::Keyword { value, arg }, node)
        }
        "dictionary_splat" => {
            let value = opt_expr(ctx, named(node).first().copied());
            ctx.add(NodeKind::Keyword { value, arg: None }, node)
        }
        _ => ctx.extension(node),
    }
}

//`a and b and c` is a single operation with three values.
fn boolean_operator(ctx: &mut ParserCtx, node: &Node) -> NodeRef {
    let op = node
        .child_by_field_name("operator")
        .map(|o| o.kind().to_owned())
        .unwrap_or_default();

    //flatten the left-leaning chain of the same operator
    let mut operands = Vec::new();
    let mut current = *node;
    loop {
        let right = current.child_by_field_name("right");
        operands.extend(right);
        match current.child_by_field_name("left") {
            Some(left)
                if left.kind() == "boolean_operator"
                    && left
                        .child_by_field_name("operator")
                        .map(|o| o.kind() == op)
                        .unwrap_or(false) =>
            {
                current = left;
            }
            Some(left) => {
                operands.push(left);
                break;
            }
            None => break,
        }
    }
    operands.reverse();

    let values = exprs(ctx, &operands);
    ctx.add(NodeKind::BoolOp { values, op }, node)
}

fn call(ctx: &mut ParserCtx, node: &Node) -> NodeRef {
    let func = opt_expr(ctx, node.child_by_field_name("function"));
    let mut args = Vec::new();
    let mut keywords = Vec::new();
    if let Some(arguments) = node.child_by_field_name("arguments") {
        if arguments.kind() == "generator_expression" {
            args.push(convert(ctx, &arguments));
        } else {
            for arg in named(&arguments) {
                let converted = convert(ctx, &arg);
                if matches!(arg.kind(), "keyword_argument" | "dictionary_splat") {
                    keywords.push(converted);
                } else {
                    args.push(converted);
                }
            }
        }
    }
    ctx.add(
        NodeKind::Call {
            func,
            args,
            keywords,
        },
        node,
    )
}

fn comprehension(ctx: &mut ParserCtx, node: &Node) -> NodeRef {
    let mut generators: Vec<NodeRef> = Vec::new();
    let body = node.child_by_field_name("body");
    for clause in named(node) {
        match clause.kind() {
            "for_in_clause" => {
                let target = clause
                    .child_by_field_name("left")
                    .map(|t| convert_target(ctx, &t));
                let iter = opt_expr(ctx, clause.child_by_field_name("right"));
                let is_async = has_keyword(&clause, "async");
                let generator = ctx.add(
                    NodeKind::Comprehension {
                        target,
                        iter,
                        ifs: Vec::new(),
                        is_async,
                    },
                    &clause,
                );
                generators.push(generator);
            }
            "if_clause" => {
                let cond = opt_expr(ctx, named(&clause).first().copied());
                let last = generators.last().copied();
                if let (Some(cond), Some(last)) = (cond, last) {
                    if let Some(ifs) = ctx.ast[last].kind.list_mut("ifs") {
                        ifs.push(cond);
                    }
                }
            }
            _ => {}
        }
    }

    match node.kind() {
        "dictionary_comprehension" => {
            let (key, value) = match body {
                Some(pair) if pair.kind() == "pair" => (
                    opt_expr(ctx, pair.child_by_field_name("key")),
                    opt_expr(ctx, pair.child_by_field_name("value")),
                ),
                other => (opt_expr(ctx, other), None),
            };
            ctx.add(
                NodeKind::DictComp {
                    key,
                    value,
                    generators,
                },
                node,
            )
        }
        kind => {
            let elt = opt_expr(ctx, body);
            let comp = match kind {
                "list_comprehension" => NodeKind::ListComp { elt, generators },
                "set_comprehension" => NodeKind::SetComp { elt, generators },
                _ => NodeKind::GeneratorExp { elt, generators },
            };
            ctx.add(comp, node)
        }
    }
}

///Converts a parameter list into the declared names and the default values. Star-parameters are recorded by name.
pub(crate) fn parameters(ctx: &mut ParserCtx, node: &Node) -> (Vec<String>, Vec<NodeRef>) {
    let mut args = Vec::new();
    let mut defaults = Vec::new();
    for param in named(node) {
        match param.kind() {
            "identifier" => args.push(ctx.text(&param).to_owned()),
            "default_parameter" | "typed_default_parameter" => {
                if let Some(name) = param.child_by_field_name("name") {
                    args.push(ctx.text(&name).to_owned());
                }
                if let Some(value) = param.child_by_field_name("value") {
                    defaults.push(convert(ctx, &value));
                }
            }
            "typed_parameter" => {
                if let Some(inner) = named(&param).first() {
                    args.push(param_name(ctx, inner));
                }
            }
            "list_splat_pattern" | "dictionary_splat_pattern" => {
                args.push(param_name(ctx, &param));
            }
            _ => {}
        }
    }
    (args, defaults)
}

fn param_name(ctx: &ParserCtx, node: &Node) -> String {
    match node.kind() {
        "list_splat_pattern" | "dictionary_splat_pattern" => named(node)
            .first()
            .map(|n| ctx.text(n).to_owned())
            .unwrap_or_default(),
        _ => ctx.text(node).to_owned(),
    }
}

///Converts `node` as assignment target.
pub fn convert_target(ctx: &mut ParserCtx, node: &Node) -> NodeRef {
    let target = convert(ctx, node);
    set_store(ctx, target);
    target
}

fn set_store(ctx: &mut ParserCtx, target: NodeRef) {
    let mut stack = vec![target];
    while let Some(node) = stack.pop() {
        match &mut ctx.ast[node].kind {
            NodeKind::Name { ctx: expr_ctx, .. }
            | NodeKind::Attribute { ctx: expr_ctx, .. }
            | NodeKind::Subscript { ctx: expr_ctx, .. } => *expr_ctx = ExprContext::Store,
            NodeKind::Tuple {
                elts,
                ctx: expr_ctx,
            }
            | NodeKind::List {
                elts,
                ctx: expr_ctx,
            } => {
                *expr_ctx = ExprContext::Store;
                stack.extend(elts.iter().copied());
            }
            _ => {}
        }
    }
}
