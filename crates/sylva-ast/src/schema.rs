/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 *
 * 2024 Tendsin Mende
 */
//! The node schema. For each [NodeTag] the schema declares which attributes hold a single child,
//! an ordered list of children, or scalar data. The [node_schema] macro generates [NodeKind](crate::NodeKind),
//! [NodeTag](crate::NodeTag) and all attribute accessors from one declaration, so the data layout and the
//! schema can not diverge.

use serde_json::Value;

use crate::{NodeRef, NodeTag};

///Describes a child-list attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListAttr {
    pub name: &'static str,
    ///True if the list is a block of statements.
    pub statements: bool,
}

///Kind of a single attribute of some node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrKind {
    Single,
    List,
    Scalar,
}

///Attribute layout of one [NodeTag].
#[derive(Debug)]
pub struct Schema {
    pub tag: NodeTag,
    ///Single-child attributes in declaration order.
    pub singles: &'static [&'static str],
    ///Child-list attributes in declaration order.
    pub lists: &'static [ListAttr],
    ///Opaque scalar data.
    pub scalars: &'static [&'static str],
}

impl Schema {
    pub fn of(tag: NodeTag) -> &'static Schema {
        tag.schema()
    }

    ///Looks up the schema for a tag-name. Returns `None` for tags that are not part of the closed node set.
    pub fn by_name(name: &str) -> Option<&'static Schema> {
        NodeTag::from_name(name).map(|t| t.schema())
    }

    pub fn attr_kind(&self, name: &str) -> Option<AttrKind> {
        if self.singles.contains(&name) {
            Some(AttrKind::Single)
        } else if self.lists.iter().any(|l| l.name == name) {
            Some(AttrKind::List)
        } else if self.scalars.contains(&name) {
            Some(AttrKind::Scalar)
        } else {
            None
        }
    }

    ///All attributes, child attributes first.
    pub fn attributes(&self) -> impl Iterator<Item = (&'static str, AttrKind)> + '_ {
        self.singles
            .iter()
            .map(|s| (*s, AttrKind::Single))
            .chain(self.lists.iter().map(|l| (l.name, AttrKind::List)))
            .chain(self.scalars.iter().map(|s| (*s, AttrKind::Scalar)))
    }

    pub fn is_statement_list(&self, name: &str) -> bool {
        self.lists.iter().any(|l| l.name == name && l.statements)
    }

    pub fn has_children(&self) -> bool {
        !self.singles.is_empty() || !self.lists.is_empty()
    }
}

///Location of a child within its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotIndex {
    Single(&'static str),
    List(&'static str, usize),
}

impl SlotIndex {
    pub fn attr(&self) -> &'static str {
        match self {
            SlotIndex::Single(s) => s,
            SlotIndex::List(s, _) => s,
        }
    }
}

///Value of an attribute, as seen through the schema.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue<'a> {
    Child(Option<NodeRef>),
    Children(&'a [NodeRef]),
    Scalar(Value),
}

impl<'a> AttrValue<'a> {
    pub fn as_scalar(&self) -> Option<&Value> {
        if let AttrValue::Scalar(v) = self {
            Some(v)
        } else {
            None
        }
    }
}

macro_rules! node_schema {
    (@block block) => {
        true
    };
    (@block) => {
        false
    };
    (
        $(
            $(#[$meta:meta])*
            $variant:ident {
                single: [$($single:ident),* $(,)?],
                list: [$($list:ident $(: $block:ident)?),* $(,)?],
                scalar: [$($scalar:ident : $sty:ty),* $(,)?] $(,)?
            }
        ),* $(,)?
    ) => {
        ///The closed set of node variants. Each variant carries its single-child slots as `Option<NodeRef>`,
        /// its child lists as `Vec<NodeRef>` and its scalar data.
        #[derive(Debug, Clone, PartialEq)]
        pub enum NodeKind {
            $(
                $(#[$meta])*
                $variant {
                    $($single: Option<NodeRef>,)*
                    $($list: Vec<NodeRef>,)*
                    $($scalar: $sty,)*
                },
            )*
        }

        ///The discriminant of a [NodeKind].
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum NodeTag {
            $($variant,)*
        }

        impl NodeTag {
            pub const ALL: &'static [NodeTag] = &[$(NodeTag::$variant,)*];

            pub fn name(&self) -> &'static str {
                match self {
                    $(NodeTag::$variant => stringify!($variant),)*
                }
            }

            pub fn from_name(name: &str) -> Option<NodeTag> {
                match name {
                    $(stringify!($variant) => Some(NodeTag::$variant),)*
                    _ => None,
                }
            }

            pub fn schema(&self) -> &'static $crate::schema::Schema {
                match self {
                    $(NodeTag::$variant => &$crate::schema::Schema {
                        tag: NodeTag::$variant,
                        singles: &[$(stringify!($single),)*],
                        lists: &[$($crate::schema::ListAttr {
                            name: stringify!($list),
                            statements: node_schema!(@block $($block)?),
                        },)*],
                        scalars: &[$(stringify!($scalar),)*],
                    },)*
                }
            }
        }

        impl NodeKind {
            pub fn tag(&self) -> NodeTag {
                match self {
                    $(NodeKind::$variant { .. } => NodeTag::$variant,)*
                }
            }

            ///Creates a node of `tag` with all slots empty and default scalars.
            pub fn empty(tag: NodeTag) -> NodeKind {
                match tag {
                    $(NodeTag::$variant => NodeKind::$variant {
                        $($single: None,)*
                        $($list: Vec::new(),)*
                        $($scalar: <$sty as Default>::default(),)*
                    },)*
                }
            }

            ///Returns the content of the single-child attribute `slot`, or `None` if there is no such attribute.
            pub fn single(&self, slot: &str) -> Option<Option<NodeRef>> {
                match self {
                    $(NodeKind::$variant { $($single,)* .. } => match slot {
                        $(stringify!($single) => Some(*$single),)*
                        _ => None,
                    },)*
                }
            }

            pub fn single_mut(&mut self, slot: &str) -> Option<&mut Option<NodeRef>> {
                match self {
                    $(NodeKind::$variant { $($single,)* .. } => match slot {
                        $(stringify!($single) => Some($single),)*
                        _ => None,
                    },)*
                }
            }

            pub fn list(&self, slot: &str) -> Option<&[NodeRef]> {
                match self {
                    $(NodeKind::$variant { $($list,)* .. } => match slot {
                        $(stringify!($list) => Some($list.as_slice()),)*
                        _ => None,
                    },)*
                }
            }

            pub fn list_mut(&mut self, slot: &str) -> Option<&mut Vec<NodeRef>> {
                match self {
                    $(NodeKind::$variant { $($list,)* .. } => match slot {
                        $(stringify!($list) => Some($list),)*
                        _ => None,
                    },)*
                }
            }

            ///Returns the scalar attribute `slot` in its exchange representation.
            pub fn scalar(&self, slot: &str) -> Option<serde_json::Value> {
                match self {
                    $(NodeKind::$variant { $($scalar,)* .. } => match slot {
                        $(stringify!($scalar) => serde_json::to_value($scalar).ok(),)*
                        _ => None,
                    },)*
                }
            }

            ///Sets the scalar attribute `slot` from its exchange representation. Returns `Ok(false)` if
            /// there is no such scalar attribute.
            pub fn set_scalar(
                &mut self,
                slot: &str,
                value: serde_json::Value,
            ) -> Result<bool, serde_json::Error> {
                match self {
                    $(NodeKind::$variant { $($scalar,)* .. } => match slot {
                        $(stringify!($scalar) => {
                            *$scalar = serde_json::from_value(value)?;
                            Ok(true)
                        })*
                        _ => Ok(false),
                    },)*
                }
            }
        }
    };
}

pub(crate) use node_schema;
