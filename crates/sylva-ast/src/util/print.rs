/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 *
 * 2024 Tendsin Mende
 */
use std::fmt::Write;

use crate::{Ast, NodeKind, NodeRef};

impl Ast {
    ///Renders the tree at `root` as an indented outline, one node per line.
    pub fn dump(&self, root: NodeRef) -> String {
        let mut out = String::new();
        let mut stack = vec![(root, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            let Some(n) = self.get(node) else {
                let _ = writeln!(out, "{}<dangling {node:?}>", "  ".repeat(depth));
                continue;
            };
            let _ = write!(out, "{}{}", "  ".repeat(depth), n.tag());
            match &n.kind {
                NodeKind::FunctionDef { name, .. } | NodeKind::ClassDef { name, .. } => {
                    let _ = write!(out, "({name})");
                }
                NodeKind::Name { id, .. } => {
                    let _ = write!(out, "({id})");
                }
                NodeKind::Constant { value } => {
                    let _ = write!(out, "({value})");
                }
                NodeKind::BinOp { op, .. }
                | NodeKind::UnaryOp { op, .. }
                | NodeKind::BoolOp { op, .. }
                | NodeKind::AugAssign { op, .. } => {
                    let _ = write!(out, "({op})");
                }
                NodeKind::Attribute { attr, .. } => {
                    let _ = write!(out, "(.{attr})");
                }
                NodeKind::Extension { kind } => {
                    let _ = write!(out, "({kind})");
                }
                _ => {}
            }
            out.push('\n');
            let children = n.kind.children();
            stack.extend(children.into_iter().rev().map(|c| (c, depth + 1)));
        }
        out
    }
}
