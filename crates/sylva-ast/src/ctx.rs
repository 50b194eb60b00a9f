/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 *
 * 2024 Tendsin Mende
 */
use std::ops::{Index, IndexMut};

use ahash::AHashSet;
use slotmap::{new_key_type, SlotMap};

use crate::{ChildVec, ExprContext, Literal, Node, NodeKind, NodeTag};

new_key_type! {
    ///Reference to any node within an [Ast]. The key is the node's identity. Two slots holding the same
    /// key share that node.
    pub struct NodeRef;
}

///A _program context_. All nodes of one tree live in this arena, `root` is the entry point
/// for analysis and transformations.
#[derive(Debug, Clone)]
pub struct Ast {
    nodes: SlotMap<NodeRef, Node>,
    pub root: NodeRef,
}

impl Default for Ast {
    fn default() -> Self {
        Self::new()
    }
}

impl Ast {
    ///Creates an AST with an empty [Program](NodeKind::Program) as root.
    pub fn new() -> Self {
        Self::with_root(Node::new(NodeKind::Program { body: Vec::new() }))
    }

    pub fn with_root(root: Node) -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(root);
        Ast { nodes, root }
    }

    pub fn insert(&mut self, node: Node) -> NodeRef {
        self.nodes.insert(node)
    }

    ///Inserts a node without any position, comments or extra data.
    pub fn add(&mut self, kind: NodeKind) -> NodeRef {
        self.nodes.insert(Node::new(kind))
    }

    pub fn get(&self, node: NodeRef) -> Option<&Node> {
        self.nodes.get(node)
    }

    pub fn get_mut(&mut self, node: NodeRef) -> Option<&mut Node> {
        self.nodes.get_mut(node)
    }

    pub fn contains(&self, node: NodeRef) -> bool {
        self.nodes.contains_key(node)
    }

    pub fn tag(&self, node: NodeRef) -> Option<NodeTag> {
        self.nodes.get(node).map(|n| n.tag())
    }

    pub fn kind(&self, node: NodeRef) -> Option<&NodeKind> {
        self.nodes.get(node).map(|n| &n.kind)
    }

    ///Number of nodes in the arena, including nodes that are no longer reachable from `root`.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    ///Direct children of `node` in schema order. Nodes that are not part of the arena have no children.
    pub fn children(&self, node: NodeRef) -> ChildVec {
        match self.nodes.get(node) {
            Some(n) => n.kind.children(),
            None => ChildVec::new(),
        }
    }

    ///Removes every node that is not reachable from `root`. Returns the number of removed nodes.
    pub fn collect_garbage(&mut self) -> usize {
        let reachable: AHashSet<NodeRef> = self.walk_unique(self.root).collect();
        let before = self.nodes.len();
        self.nodes.retain(|k, _| reachable.contains(&k));
        let removed = before - self.nodes.len();
        #[cfg(feature = "log")]
        log::trace!("collected {removed} unreachable nodes");
        removed
    }
}

impl Index<NodeRef> for Ast {
    type Output = Node;
    fn index(&self, index: NodeRef) -> &Self::Output {
        &self.nodes[index]
    }
}

impl IndexMut<NodeRef> for Ast {
    fn index_mut(&mut self, index: NodeRef) -> &mut Self::Output {
        &mut self.nodes[index]
    }
}

//Small constructors, mostly used by passes and tests.
impl Ast {
    pub fn new_name(&mut self, id: impl Into<String>, ctx: ExprContext) -> NodeRef {
        self.add(NodeKind::Name { id: id.into(), ctx })
    }

    pub fn new_constant(&mut self, value: impl Into<Literal>) -> NodeRef {
        self.add(NodeKind::Constant {
            value: value.into(),
        })
    }

    pub fn new_binop(&mut self, left: NodeRef, op: impl Into<String>, right: NodeRef) -> NodeRef {
        self.add(NodeKind::BinOp {
            left: Some(left),
            right: Some(right),
            op: op.into(),
        })
    }

    pub fn new_assign(&mut self, targets: Vec<NodeRef>, value: NodeRef) -> NodeRef {
        self.add(NodeKind::Assign {
            value: Some(value),
            targets,
        })
    }

    ///Shorthand for `id = value` with a single name target.
    pub fn new_assign_name(&mut self, id: impl Into<String>, value: NodeRef) -> NodeRef {
        let target = self.new_name(id, ExprContext::Store);
        self.new_assign(vec![target], value)
    }

    pub fn new_call(&mut self, func: NodeRef, args: Vec<NodeRef>) -> NodeRef {
        self.add(NodeKind::Call {
            func: Some(func),
            args,
            keywords: Vec::new(),
        })
    }

    ///Shorthand for calling a function by name.
    pub fn new_call_name(&mut self, name: impl Into<String>, args: Vec<NodeRef>) -> NodeRef {
        let func = self.new_name(name, ExprContext::Load);
        self.new_call(func, args)
    }

    pub fn new_expr_stmt(&mut self, value: NodeRef) -> NodeRef {
        self.add(NodeKind::Expr { value: Some(value) })
    }

    pub fn new_return(&mut self, value: Option<NodeRef>) -> NodeRef {
        self.add(NodeKind::Return { value })
    }

    pub fn new_pass(&mut self) -> NodeRef {
        self.add(NodeKind::Pass {})
    }

    pub fn new_function(
        &mut self,
        name: impl Into<String>,
        args: Vec<String>,
        body: Vec<NodeRef>,
    ) -> NodeRef {
        self.add(NodeKind::FunctionDef {
            returns: None,
            decorator_list: Vec::new(),
            defaults: Vec::new(),
            body,
            name: name.into(),
            args,
            is_async: false,
        })
    }

    pub fn new_global(&mut self, names: Vec<String>) -> NodeRef {
        self.add(NodeKind::Global { names })
    }

    ///Appends `stmt` to the root's body. Does nothing if the root is not a [Program](NodeKind::Program).
    pub fn push_stmt(&mut self, stmt: NodeRef) {
        let root = self.root;
        if let Some(NodeKind::Program { body }) = self.nodes.get_mut(root).map(|n| &mut n.kind) {
            body.push(stmt);
        }
    }
}
