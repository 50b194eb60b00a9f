/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 *
 * 2024 Tendsin Mende
 */
use sylva_common::{Details, Diagnostic, ErrorKind};
use thiserror::Error;

///Errors of the exchange format encoder and decoder.
#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("Unknown node type '{tag}'")]
    UnknownTag { tag: String },
    #[error("Node object without 'type' field")]
    MissingTag,
    #[error("Dangling reference {id} in {tag}.{attribute}")]
    DanglingReference {
        id: u64,
        tag: String,
        attribute: String,
    },
    #[error("Invalid attribute {attribute} on {tag}: {reason}")]
    InvalidAttribute {
        tag: String,
        attribute: String,
        reason: String,
    },
    #[error("Expected node object in {tag}.{attribute}, found {found}")]
    NotANode {
        tag: String,
        attribute: String,
        found: String,
    },
    #[error("Duplicated node id {id}")]
    DuplicatedId { id: u64 },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SerializeError {
    ///Tag of the node the error occurred at, if known.
    pub fn node_tag(&self) -> Option<&str> {
        match self {
            SerializeError::UnknownTag { tag }
            | SerializeError::DanglingReference { tag, .. }
            | SerializeError::InvalidAttribute { tag, .. }
            | SerializeError::NotANode { tag, .. } => Some(tag),
            _ => None,
        }
    }
}

impl Diagnostic for SerializeError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Serialize
    }

    fn details(&self) -> Details {
        let mut details = Details::new();
        details.insert("format_type".to_owned(), "json".into());
        if let Some(tag) = self.node_tag() {
            details.insert("node_type".to_owned(), tag.into());
        }
        details
    }
}
