/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 *
 * 2024 Tendsin Mende
 */
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use sylva_common::Position;

use crate::{
    schema::{node_schema, AttrKind, AttrValue, Schema, SlotIndex},
    Literal, NodeRef,
};

///Open key/value map for forward and plugin data.
pub type Extra = serde_json::Map<String, serde_json::Value>;

pub type ChildVec = SmallVec<[NodeRef; 4]>;
pub type SlotVec = SmallVec<[(SlotIndex, NodeRef); 4]>;

///Context a name is used in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExprContext {
    #[default]
    Load,
    Store,
    Del,
}

///One imported name, `name as asname`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Alias {
    pub name: String,
    #[serde(default)]
    pub asname: Option<String>,
}

impl Alias {
    pub fn new(name: impl Into<String>) -> Self {
        Alias {
            name: name.into(),
            asname: None,
        }
    }

    ///The name this import binds in the importing scope.
    pub fn bound_name(&self) -> &str {
        match &self.asname {
            Some(a) => a,
            None => self.name.split('.').next().unwrap_or(&self.name),
        }
    }
}

node_schema! {
    Program { single: [], list: [body: block], scalar: [] },
    FunctionDef {
        single: [returns],
        list: [decorator_list, defaults, body: block],
        scalar: [name: String, args: Vec<String>, is_async: bool],
    },
    ClassDef {
        single: [],
        list: [bases, keywords, decorator_list, body: block],
        scalar: [name: String],
    },
    Assign { single: [value], list: [targets], scalar: [] },
    AugAssign { single: [target, value], list: [], scalar: [op: String] },
    BinOp { single: [left, right], list: [], scalar: [op: String] },
    UnaryOp { single: [operand], list: [], scalar: [op: String] },
    BoolOp { single: [], list: [values], scalar: [op: String] },
    Compare { single: [left], list: [comparators], scalar: [ops: Vec<String>] },
    Name { single: [], list: [], scalar: [id: String, ctx: ExprContext] },
    Constant { single: [], list: [], scalar: [value: Literal] },
    Call { single: [func], list: [args, keywords], scalar: [] },
    ///Keyword argument of a call or class definition. `arg` is `None` for `**kwargs` splats.
    Keyword { single: [value], list: [], scalar: [arg: Option<String>] },
    Attribute { single: [value], list: [], scalar: [attr: String, ctx: ExprContext] },
    Subscript { single: [value, slice], list: [], scalar: [ctx: ExprContext] },
    List { single: [], list: [elts], scalar: [ctx: ExprContext] },
    Tuple { single: [], list: [elts], scalar: [ctx: ExprContext] },
    If { single: [test], list: [body: block, orelse: block], scalar: [] },
    For {
        single: [target, iter],
        list: [body: block, orelse: block],
        scalar: [is_async: bool],
    },
    While { single: [test], list: [body: block, orelse: block], scalar: [] },
    Return { single: [value], list: [], scalar: [] },
    Break { single: [], list: [], scalar: [] },
    Continue { single: [], list: [], scalar: [] },
    Import { single: [], list: [], scalar: [names: Vec<Alias>] },
    ImportFrom {
        single: [],
        list: [],
        scalar: [module: Option<String>, names: Vec<Alias>, level: u32],
    },
    Try {
        single: [],
        list: [body: block, handlers, orelse: block, finalbody: block],
        scalar: [],
    },
    ExceptHandler { single: [type_], list: [body: block], scalar: [name: Option<String>] },
    With { single: [], list: [items, body: block], scalar: [is_async: bool] },
    WithItem { single: [context_expr, optional_vars], list: [], scalar: [] },
    Raise { single: [exc, cause], list: [], scalar: [] },
    Assert { single: [test, msg], list: [], scalar: [] },
    Pass { single: [], list: [], scalar: [] },
    ///Expression statement.
    Expr { single: [value], list: [], scalar: [] },
    Comment { single: [], list: [], scalar: [value: String] },
    Lambda { single: [body], list: [defaults], scalar: [args: Vec<String>] },
    ListComp { single: [elt], list: [generators], scalar: [] },
    SetComp { single: [elt], list: [generators], scalar: [] },
    DictComp { single: [key, value], list: [generators], scalar: [] },
    GeneratorExp { single: [elt], list: [generators], scalar: [] },
    ///One `for target in iter if ...` clause of a comprehension.
    Comprehension { single: [target, iter], list: [ifs], scalar: [is_async: bool] },
    Global { single: [], list: [], scalar: [names: Vec<String>] },
    Nonlocal { single: [], list: [], scalar: [names: Vec<String>] },
    ///Placeholder for node kinds the front-end does not know. `kind` is the upstream kind name, raw
    /// fields are stored in the node's extension map.
    Extension { single: [], list: [], scalar: [kind: String] },
}

impl NodeKind {
    ///Child slots in schema order, single-child attributes first, then list attributes. Absent children are skipped.
    pub fn child_slots(&self) -> SlotVec {
        let schema = self.tag().schema();
        let mut slots = SlotVec::new();
        for single in schema.singles {
            if let Some(Some(child)) = self.single(single) {
                slots.push((SlotIndex::Single(*single), child));
            }
        }
        for list in schema.lists {
            if let Some(children) = self.list(list.name) {
                slots.extend(
                    children
                        .iter()
                        .enumerate()
                        .map(|(idx, child)| (SlotIndex::List(list.name, idx), *child)),
                );
            }
        }
        slots
    }

    ///Direct children in schema order.
    pub fn children(&self) -> ChildVec {
        self.child_slots().into_iter().map(|(_, c)| c).collect()
    }

    ///Returns the child at `slot`, if there is any.
    pub fn child_at(&self, slot: SlotIndex) -> Option<NodeRef> {
        match slot {
            SlotIndex::Single(name) => self.single(name).flatten(),
            SlotIndex::List(name, idx) => self.list(name).and_then(|l| l.get(idx).copied()),
        }
    }

    ///Writes `new` to `slot`. Returns false if the slot does not exist.
    pub fn set_child(&mut self, slot: SlotIndex, new: NodeRef) -> bool {
        match slot {
            SlotIndex::Single(name) => {
                if let Some(s) = self.single_mut(name) {
                    *s = Some(new);
                    true
                } else {
                    false
                }
            }
            SlotIndex::List(name, idx) => {
                if let Some(s) = self.list_mut(name).and_then(|l| l.get_mut(idx)) {
                    *s = new;
                    true
                } else {
                    false
                }
            }
        }
    }

    ///Reads attribute `name` through the schema.
    pub fn attr(&self, name: &str) -> Option<AttrValue<'_>> {
        match self.tag().schema().attr_kind(name)? {
            AttrKind::Single => self.single(name).map(AttrValue::Child),
            AttrKind::List => self.list(name).map(AttrValue::Children),
            AttrKind::Scalar => self.scalar(name).map(AttrValue::Scalar),
        }
    }

    ///The identifier a [Name](NodeKind::Name) node refers to.
    pub fn identifier(&self) -> Option<&str> {
        if let NodeKind::Name { id, .. } = self {
            Some(id)
        } else {
            None
        }
    }

    ///The declared name of function and class definitions.
    pub fn def_name(&self) -> Option<&str> {
        match self {
            NodeKind::FunctionDef { name, .. } | NodeKind::ClassDef { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn literal(&self) -> Option<&Literal> {
        if let NodeKind::Constant { value } = self {
            Some(value)
        } else {
            None
        }
    }

    ///True for return, break, continue and raise.
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            NodeKind::Return { .. }
                | NodeKind::Break { .. }
                | NodeKind::Continue { .. }
                | NodeKind::Raise { .. }
        )
    }
}

///A single node of the tree. The tag is given by the [NodeKind], everything else is node-independent metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub position: Option<Position>,
    pub leading_comments: Vec<String>,
    pub trailing_comments: Vec<String>,
    pub extra: Extra,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Node {
            kind,
            position: None,
            leading_comments: Vec::new(),
            trailing_comments: Vec::new(),
            extra: Extra::new(),
        }
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    pub fn tag(&self) -> NodeTag {
        self.kind.tag()
    }

    pub fn schema(&self) -> &'static Schema {
        self.kind.tag().schema()
    }
}

impl From<NodeKind> for Node {
    fn from(kind: NodeKind) -> Self {
        Node::new(kind)
    }
}

impl std::fmt::Display for NodeTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
