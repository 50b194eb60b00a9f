/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 *
 * 2024 Tendsin Mende
 */
//! Graph-safe exchange format.
//!
//! A document is the object of the root node. Each node object carries its `type`, an `"$id"`, optional
//! `position`, `leading_comments`, `trailing_comments`, `extra` and all attributes its
//! [Schema](crate::schema::Schema) declares. Child slots only hold references of the form `{"$ref": id}`.
//! The objects of all other nodes are listed in breadth-first order in the root's `"$nodes"` table.
//!
//! ```json
//! {"type": "Program", "$id": 0, "body": [{"$ref": 1}], "$nodes": [{"type": "Pass", "$id": 1}]}
//! ```
//!
//! Encoding is keyed by node identity, so a node referenced from multiple slots is written once.
//! Since the document never nests node objects, its depth does not grow with the depth of the tree.
//! The decoder still accepts nested node objects in child slots, which is handy for hand-written input.

use std::{collections::VecDeque, path::Path};

use ahash::AHashMap;
use serde_json::{Map, Value};
use slotmap::Key;

use crate::{error::SerializeError, schema::SlotIndex, Ast, Node, NodeKind, NodeRef, NodeTag};

const TYPE_KEY: &str = "type";
const ID_KEY: &str = "$id";
const REF_KEY: &str = "$ref";
const NODES_KEY: &str = "$nodes";

///Output settings for the textual exchange format.
#[derive(Debug, Clone, Default)]
pub struct SerializeConfig {
    ///Pretty-prints the document. Can be set via `SYLVA_PRETTY_JSON`.
    pub pretty: bool,
}

impl SerializeConfig {
    pub fn from_env() -> Self {
        SerializeConfig {
            pretty: std::env::var("SYLVA_PRETTY_JSON").is_ok(),
        }
    }
}

fn reference(id: usize) -> Value {
    let mut map = Map::new();
    map.insert(REF_KEY.to_owned(), id.into());
    Value::Object(map)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

///Encodes the tree at `root` into the exchange format.
pub fn encode(ast: &Ast, root: NodeRef) -> Result<Value, SerializeError> {
    if !ast.contains(root) {
        return Err(SerializeError::DanglingReference {
            id: root.data().as_ffi(),
            tag: "<document>".to_owned(),
            attribute: "root".to_owned(),
        });
    }

    //Breadth-first discovery, the index in `order` is the node's id.
    let mut order = vec![root];
    let mut ids: AHashMap<NodeRef, usize> = AHashMap::default();
    ids.insert(root, 0);
    let mut cursor = 0;
    while cursor < order.len() {
        let node = &ast[order[cursor]];
        for (slot, child) in node.kind.child_slots() {
            if ids.contains_key(&child) {
                continue;
            }
            if !ast.contains(child) {
                return Err(SerializeError::DanglingReference {
                    id: child.data().as_ffi(),
                    tag: node.tag().name().to_owned(),
                    attribute: slot.attr().to_owned(),
                });
            }
            ids.insert(child, order.len());
            order.push(child);
        }
        cursor += 1;
    }

    let mut records = Vec::with_capacity(order.len());
    for (idx, node_ref) in order.iter().enumerate() {
        records.push(record(&ast[*node_ref], idx, &ids)?);
    }

    #[cfg(feature = "log")]
    log::debug!("encoded {} nodes", order.len());

    let mut records = records.into_iter();
    let mut document = records.next().unwrap_or_default();
    document.insert(NODES_KEY.to_owned(), Value::Array(records.map(Value::Object).collect()));
    Ok(Value::Object(document))
}

///The object of a single node. Children are written as references.
fn record(
    node: &Node,
    id: usize,
    ids: &AHashMap<NodeRef, usize>,
) -> Result<Map<String, Value>, SerializeError> {
    let mut obj = Map::new();
    obj.insert(TYPE_KEY.to_owned(), node.tag().name().into());
    obj.insert(ID_KEY.to_owned(), id.into());
    if let Some(pos) = &node.position {
        obj.insert("position".to_owned(), serde_json::to_value(pos)?);
    }
    obj.insert(
        "leading_comments".to_owned(),
        serde_json::to_value(&node.leading_comments)?,
    );
    obj.insert(
        "trailing_comments".to_owned(),
        serde_json::to_value(&node.trailing_comments)?,
    );
    obj.insert("extra".to_owned(), Value::Object(node.extra.clone()));

    let schema = node.schema();
    for single in schema.singles {
        let value = match node.kind.single(single) {
            Some(Some(child)) => reference(ids[&child]),
            _ => Value::Null,
        };
        obj.insert((*single).to_owned(), value);
    }
    for list in schema.lists {
        let items = node
            .kind
            .list(list.name)
            .unwrap_or(&[])
            .iter()
            .map(|child| reference(ids[child]))
            .collect();
        obj.insert(list.name.to_owned(), Value::Array(items));
    }
    for scalar in schema.scalars {
        let value = node
            .kind
            .scalar(scalar)
            .ok_or_else(|| SerializeError::InvalidAttribute {
                tag: node.tag().name().to_owned(),
                attribute: (*scalar).to_owned(),
                reason: "not representable".to_owned(),
            })?;
        obj.insert((*scalar).to_owned(), value);
    }
    Ok(obj)
}

fn read_tag(obj: &Map<String, Value>) -> Result<NodeTag, SerializeError> {
    let tag = obj
        .get(TYPE_KEY)
        .and_then(Value::as_str)
        .ok_or(SerializeError::MissingTag)?;
    NodeTag::from_name(tag).ok_or_else(|| SerializeError::UnknownTag {
        tag: tag.to_owned(),
    })
}

struct Decoder<'v> {
    ast: Ast,
    ids: AHashMap<u64, NodeRef>,
    queue: VecDeque<(&'v Map<String, Value>, NodeRef)>,
    ///`$ref`s that were seen before the referenced object.
    pending: Vec<(NodeRef, SlotIndex, u64)>,
}

impl<'v> Decoder<'v> {
    fn invalid(tag: NodeTag, attribute: &str, reason: impl ToString) -> SerializeError {
        SerializeError::InvalidAttribute {
            tag: tag.name().to_owned(),
            attribute: attribute.to_owned(),
            reason: reason.to_string(),
        }
    }

    fn register(&mut self, obj: &Map<String, Value>, node: NodeRef) -> Result<(), SerializeError> {
        if let Some(id) = obj.get(ID_KEY) {
            let tag = self.ast[node].tag();
            let id = id
                .as_u64()
                .ok_or_else(|| Self::invalid(tag, ID_KEY, "expected integer"))?;
            if self.ids.insert(id, node).is_some() {
                return Err(SerializeError::DuplicatedId { id });
            }
        }
        Ok(())
    }

    ///Materializes the child object `value` found at `slot` of `parent`. Returns `None` if the child is a
    /// reference that can only be resolved later.
    fn child(
        &mut self,
        value: &'v Value,
        parent: NodeRef,
        slot: SlotIndex,
    ) -> Result<Option<NodeRef>, SerializeError> {
        let parent_tag = self.ast[parent].tag();
        let Value::Object(obj) = value else {
            return Err(SerializeError::NotANode {
                tag: parent_tag.name().to_owned(),
                attribute: slot.attr().to_owned(),
                found: json_kind(value).to_owned(),
            });
        };

        if !obj.contains_key(TYPE_KEY) {
            if let Some(id) = obj.get(REF_KEY) {
                let id = id
                    .as_u64()
                    .ok_or_else(|| Self::invalid(parent_tag, slot.attr(), "$ref is not an integer"))?;
                if let Some(node) = self.ids.get(&id) {
                    return Ok(Some(*node));
                }
                self.pending.push((parent, slot, id));
                return Ok(None);
            }
        }

        let tag = read_tag(obj)?;
        let shell = self.ast.add(NodeKind::empty(tag));
        self.register(obj, shell)?;
        self.queue.push_back((obj, shell));
        Ok(Some(shell))
    }

    fn fill(&mut self, obj: &'v Map<String, Value>, node: NodeRef) -> Result<(), SerializeError> {
        let tag = self.ast[node].tag();
        let schema = tag.schema();
        {
            let n = &mut self.ast[node];
            if let Some(pos) = obj.get("position").filter(|p| !p.is_null()) {
                n.position = Some(
                    serde_json::from_value(pos.clone())
                        .map_err(|e| Self::invalid(tag, "position", e))?,
                );
            }
            for (key, target) in [
                ("leading_comments", &mut n.leading_comments),
                ("trailing_comments", &mut n.trailing_comments),
            ] {
                if let Some(comments) = obj.get(key) {
                    *target = serde_json::from_value(comments.clone())
                        .map_err(|e| Self::invalid(tag, key, e))?;
                }
            }
            match obj.get("extra") {
                None | Some(Value::Null) => {}
                Some(Value::Object(extra)) => n.extra = extra.clone(),
                Some(other) => {
                    return Err(Self::invalid(
                        tag,
                        "extra",
                        format!("expected object, found {}", json_kind(other)),
                    ))
                }
            }
            for scalar in schema.scalars {
                if let Some(value) = obj.get(*scalar) {
                    n.kind
                        .set_scalar(scalar, value.clone())
                        .map_err(|e| Self::invalid(tag, scalar, e))?;
                }
            }
        }

        for single in schema.singles {
            let child = match obj.get(*single) {
                None | Some(Value::Null) => None,
                Some(value) => self.child(value, node, SlotIndex::Single(*single))?,
            };
            if let Some(slot) = self.ast[node].kind.single_mut(single) {
                *slot = child;
            }
        }

        for list in schema.lists {
            let items = match obj.get(list.name) {
                None | Some(Value::Null) => continue,
                Some(Value::Array(items)) => items,
                Some(other) => {
                    return Err(Self::invalid(
                        tag,
                        list.name,
                        format!("expected array, found {}", json_kind(other)),
                    ))
                }
            };
            let mut children = Vec::with_capacity(items.len());
            for (idx, item) in items.iter().enumerate() {
                let child = self.child(item, node, SlotIndex::List(list.name, idx))?;
                children.push(child.unwrap_or_else(NodeRef::null));
            }
            if let Some(slot) = self.ast[node].kind.list_mut(list.name) {
                *slot = children;
            }
        }
        Ok(())
    }

    ///Creates the node of an entry in the `$nodes` table. Its attributes are read once it is dequeued.
    fn table_entry(&mut self, record: &'v Value) -> Result<(), SerializeError> {
        let Value::Object(obj) = record else {
            return Err(SerializeError::NotANode {
                tag: "<document>".to_owned(),
                attribute: NODES_KEY.to_owned(),
                found: json_kind(record).to_owned(),
            });
        };
        let tag = read_tag(obj)?;
        if !obj.contains_key(ID_KEY) {
            return Err(Self::invalid(tag, ID_KEY, "missing in node table"));
        }
        let shell = self.ast.add(NodeKind::empty(tag));
        self.register(obj, shell)?;
        self.queue.push_back((obj, shell));
        Ok(())
    }

    fn resolve_pending(&mut self) -> Result<(), SerializeError> {
        for (parent, slot, id) in std::mem::take(&mut self.pending) {
            let target = self.ids.get(&id).copied().ok_or_else(|| {
                SerializeError::DanglingReference {
                    id,
                    tag: self.ast[parent].tag().name().to_owned(),
                    attribute: slot.attr().to_owned(),
                }
            })?;
            self.ast[parent].kind.set_child(slot, target);
        }
        Ok(())
    }
}

///Decodes a document of the exchange format into a new [Ast].
pub fn decode(value: &Value) -> Result<Ast, SerializeError> {
    let Value::Object(obj) = value else {
        return Err(SerializeError::NotANode {
            tag: "<document>".to_owned(),
            attribute: "root".to_owned(),
            found: json_kind(value).to_owned(),
        });
    };
    let tag = read_tag(obj)?;
    let ast = Ast::with_root(Node::new(NodeKind::empty(tag)));
    let root = ast.root;
    let mut decoder = Decoder {
        ast,
        ids: AHashMap::default(),
        queue: VecDeque::new(),
        pending: Vec::new(),
    };
    decoder.register(obj, root)?;
    decoder.queue.push_back((obj, root));
    match obj.get(NODES_KEY) {
        None | Some(Value::Null) => {}
        Some(Value::Array(records)) => {
            for record in records {
                decoder.table_entry(record)?;
            }
        }
        Some(other) => {
            return Err(Decoder::invalid(
                tag,
                NODES_KEY,
                format!("expected array, found {}", json_kind(other)),
            ))
        }
    }
    while let Some((obj, node)) = decoder.queue.pop_front() {
        decoder.fill(obj, node)?;
    }
    decoder.resolve_pending()?;

    #[cfg(feature = "log")]
    log::debug!("decoded {} nodes", decoder.ast.len());

    Ok(decoder.ast)
}

///Serializes `ast` into exchange text.
pub fn to_string(ast: &Ast, config: &SerializeConfig) -> Result<String, SerializeError> {
    let value = encode(ast, ast.root)?;
    let text = if config.pretty {
        serde_json::to_string_pretty(&value)?
    } else {
        serde_json::to_string(&value)?
    };
    Ok(text)
}

pub fn to_string_pretty(ast: &Ast) -> Result<String, SerializeError> {
    to_string(ast, &SerializeConfig { pretty: true })
}

///Parses exchange text into a new [Ast].
pub fn from_str(text: &str) -> Result<Ast, SerializeError> {
    let value: Value = serde_json::from_str(text)?;
    decode(&value)
}

pub fn write_file(
    ast: &Ast,
    path: impl AsRef<Path>,
    config: &SerializeConfig,
) -> Result<(), SerializeError> {
    let text = to_string(ast, config)?;
    std::fs::write(path, text)?;
    Ok(())
}

pub fn read_file(path: impl AsRef<Path>) -> Result<Ast, SerializeError> {
    let text = std::fs::read_to_string(path)?;
    from_str(&text)
}
