/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 *
 * 2024 Tendsin Mende
 */
use ahash::AHashSet;

use crate::{Ast, NodeRef, NodeTag};

///Deterministic pre-order iterator over a (sub)tree. Children are enumerated via
/// [NodeKind::children](crate::NodeKind::children), so the order is the schema order.
///
/// A node that is referenced from multiple slots is yielded once per reference, unless the walk was
/// created via [Ast::walk_unique].
pub struct Walk<'a> {
    ast: &'a Ast,
    stack: Vec<NodeRef>,
    seen: Option<AHashSet<NodeRef>>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = NodeRef;
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let next = self.stack.pop()?;
            if let Some(seen) = &mut self.seen {
                if !seen.insert(next) {
                    continue;
                }
            }
            let children = self.ast.children(next);
            self.stack.extend(children.into_iter().rev());
            return Some(next);
        }
    }
}

impl Ast {
    ///Pre-order walk starting at `root`.
    pub fn walk(&self, root: NodeRef) -> Walk<'_> {
        Walk {
            ast: self,
            stack: vec![root],
            seen: None,
        }
    }

    ///Pre-order walk that yields each node identity at most once.
    pub fn walk_unique(&self, root: NodeRef) -> Walk<'_> {
        Walk {
            ast: self,
            stack: vec![root],
            seen: Some(AHashSet::default()),
        }
    }

    ///Number of nodes in the tree at `root`, counting shared nodes once per reference.
    pub fn tree_size(&self, root: NodeRef) -> usize {
        self.walk(root).count()
    }

    ///All nodes of `tag` in pre-order.
    pub fn find_all(&self, root: NodeRef, tag: NodeTag) -> Vec<NodeRef> {
        self.walk(root)
            .filter(|n| self.tag(*n) == Some(tag))
            .collect()
    }

    pub fn find_names(&self, root: NodeRef) -> Vec<NodeRef> {
        self.find_all(root, NodeTag::Name)
    }

    pub fn find_constants(&self, root: NodeRef) -> Vec<NodeRef> {
        self.find_all(root, NodeTag::Constant)
    }

    ///Compares the tree at `root` with the tree at `other_root` in `other`. Two trees are equal if
    /// every node pair has the same tag, position, comments, extension data and scalars, and their children
    /// are pairwise equal. Node identities are not compared.
    pub fn structural_eq(&self, root: NodeRef, other: &Ast, other_root: NodeRef) -> bool {
        let mut stack = vec![(root, other_root)];
        while let Some((a, b)) = stack.pop() {
            let (Some(na), Some(nb)) = (self.get(a), other.get(b)) else {
                return false;
            };
            if na.tag() != nb.tag()
                || na.position != nb.position
                || na.leading_comments != nb.leading_comments
                || na.trailing_comments != nb.trailing_comments
                || na.extra != nb.extra
            {
                return false;
            }
            let schema = na.schema();
            if schema
                .scalars
                .iter()
                .any(|s| na.kind.scalar(s) != nb.kind.scalar(s))
            {
                return false;
            }

            let slots_a = na.kind.child_slots();
            let slots_b = nb.kind.child_slots();
            if slots_a.len() != slots_b.len() {
                return false;
            }
            for ((sa, ca), (sb, cb)) in slots_a.into_iter().zip(slots_b) {
                if sa != sb {
                    return false;
                }
                stack.push((ca, cb));
            }
        }
        true
    }
}
