/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 *
 * 2024 Tendsin Mende
 */
use ahash::AHashMap;

use crate::{schema::SlotIndex, Ast, Node, NodeRef};

///Result of rewriting a single node in [Ast::rewrite].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteStep {
    ///Continue with the children of the contained node. That node takes over the slot.
    Descend(NodeRef),
    ///The contained node takes over the slot, but its children are not visited.
    Skip(NodeRef),
}

impl Ast {
    ///Rewrites the tree at `root` in pre-order. `f` is called on each node and returns the node that
    /// continues in that slot, which is either the same node (possibly mutated in place) or a replacement.
    /// The traversal then recurses into the children of the *returned* node.
    ///
    /// Returns the node that takes over `root`. Aborts on the first error, changes made until then are kept.
    pub fn rewrite<E>(
        &mut self,
        root: NodeRef,
        mut f: impl FnMut(&mut Ast, NodeRef) -> Result<RewriteStep, E>,
    ) -> Result<NodeRef, E> {
        let mut new_root = root;
        let mut stack: Vec<(Option<(NodeRef, SlotIndex)>, NodeRef)> = vec![(None, root)];
        while let Some((parent, node)) = stack.pop() {
            let (replacement, descend) = match f(self, node)? {
                RewriteStep::Descend(r) => (r, true),
                RewriteStep::Skip(r) => (r, false),
            };

            match parent {
                None => new_root = replacement,
                Some((parent, slot)) => {
                    if replacement != node {
                        if let Some(p) = self.get_mut(parent) {
                            //only adopt if the slot was not changed in the meantime
                            if p.kind.child_at(slot) == Some(node) {
                                p.kind.set_child(slot, replacement);
                            }
                        }
                    }
                }
            }

            if descend {
                if let Some(n) = self.get(replacement) {
                    let slots = n.kind.child_slots();
                    stack.extend(
                        slots
                            .into_iter()
                            .rev()
                            .map(|(slot, child)| (Some((replacement, slot)), child)),
                    );
                }
            }
        }
        Ok(new_root)
    }

    ///Replaces every reference to `old` in the tree at `root` with `new`. Returns the new root.
    pub fn replace_node(&mut self, root: NodeRef, old: NodeRef, new: NodeRef) -> NodeRef {
        let result: Result<NodeRef, std::convert::Infallible> = self.rewrite(root, |_, n| {
            if n == old {
                Ok(RewriteStep::Skip(new))
            } else {
                Ok(RewriteStep::Descend(n))
            }
        });
        match result {
            Ok(r) => r,
            Err(never) => match never {},
        }
    }

    ///Copies the subtree at `root` into fresh nodes. Nodes shared within the subtree stay shared in the copy.
    pub fn deep_clone(&mut self, root: NodeRef) -> NodeRef {
        let copied = collect_subtree(self, root);
        insert_subtree(self, root, copied)
    }
}

fn collect_subtree(src: &Ast, root: NodeRef) -> Vec<(NodeRef, Node)> {
    src.walk_unique(root)
        .filter_map(|n| src.get(n).map(|node| (n, node.clone())))
        .collect()
}

fn insert_subtree(dst: &mut Ast, root: NodeRef, nodes: Vec<(NodeRef, Node)>) -> NodeRef {
    let mut remap = AHashMap::with_capacity(nodes.len());
    let mut inserted = Vec::with_capacity(nodes.len());
    for (old, node) in nodes {
        let new = dst.insert(node);
        remap.insert(old, new);
        inserted.push(new);
    }
    for new in inserted {
        let node = &mut dst[new];
        for (slot, child) in node.kind.child_slots() {
            if let Some(mapped) = remap.get(&child) {
                node.kind.set_child(slot, *mapped);
            }
        }
    }
    remap.get(&root).copied().unwrap_or(root)
}

#[cfg(test)]
mod test {
    use crate::{util::RewriteStep, Ast, ExprContext, Literal, NodeKind};

    #[test]
    fn rewrite_follows_replacement() {
        let mut ast = Ast::new();
        let x = ast.new_name("x", ExprContext::Load);
        let stmt = ast.new_expr_stmt(x);
        ast.push_stmt(stmt);

        let mut visited = Vec::new();
        let root = ast.root;
        let new_root = ast
            .rewrite::<()>(root, |ast, n| {
                visited.push(ast[n].tag());
                if ast[n].kind.identifier() == Some("x") {
                    let y = ast.new_name("y", ExprContext::Load);
                    let call = ast.new_call(y, vec![]);
                    Ok(RewriteStep::Descend(call))
                } else {
                    Ok(RewriteStep::Descend(n))
                }
            })
            .unwrap();
        assert_eq!(new_root, root);
        //the replacement's child `y` is visited, the original `x` is not descended into again.
        assert_eq!(visited.len(), 4);
        let NodeKind::Expr { value: Some(value) } = ast[stmt].kind else {
            panic!("expected expression statement");
        };
        assert!(matches!(ast[value].kind, NodeKind::Call { .. }));
    }

    #[test]
    fn rewrite_error_aborts() {
        let mut ast = Ast::new();
        let one = ast.new_constant(1);
        let stmt = ast.new_expr_stmt(one);
        ast.push_stmt(stmt);
        let root = ast.root;
        let res = ast.rewrite(root, |ast, n| {
            if ast[n].kind.literal().is_some() {
                Err("literal")
            } else {
                Ok(RewriteStep::Descend(n))
            }
        });
        assert_eq!(res, Err("literal"));
    }

    #[test]
    fn deep_clone_keeps_sharing() {
        let mut ast = Ast::new();
        let shared = ast.new_constant(2);
        let mul = ast.new_binop(shared, "*", shared);
        let copy = ast.deep_clone(mul);
        assert_ne!(copy, mul);
        let NodeKind::BinOp {
            left: Some(l),
            right: Some(r),
            ..
        } = ast[copy].kind
        else {
            panic!("expected binop");
        };
        assert_eq!(l, r);
        assert_ne!(l, shared);
        assert_eq!(ast[l].kind.literal(), Some(&Literal::Int(2)));
    }

    #[test]
    fn replace_everywhere() {
        let mut ast = Ast::new();
        let shared = ast.new_constant(2);
        let mul = ast.new_binop(shared, "*", shared);
        let three = ast.new_constant(3);
        let root = ast.replace_node(mul, shared, three);
        assert_eq!(root, mul);
        assert_eq!(ast.children(mul).as_slice(), &[three, three]);
    }
}
