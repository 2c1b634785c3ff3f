// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Tree to serialized editor state.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::DocumentError;
use crate::nodes::Node;
use crate::registry::Registry;
use crate::tree::{NodeKey, Tree};

/// Version of the document envelope, stored as the root entry's `version`.
pub const FORMAT_VERSION: u32 = 1;

/// Portable snapshot of a document: `{"root": {...}}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SerializedState {
    pub root: Value,
}

impl SerializedState {
    pub fn from_value(value: Value) -> Result<Self, DocumentError> {
        let Value::Object(mut map) = value else {
            return Err(DocumentError::NotAnObject);
        };
        match map.remove("root") {
            Some(root @ Value::Object(_)) => Ok(Self { root }),
            Some(other) => Err(DocumentError::InvalidRoot(other.to_string())),
            None => Err(DocumentError::MissingRoot),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        Self::from_value(serde_json::from_str(json)?)
    }

    pub fn into_value(self) -> Value {
        let mut map = Map::new();
        map.insert("root".into(), self.root);
        Value::Object(map)
    }

    pub fn to_value(&self) -> Value {
        self.clone().into_value()
    }

    /// Compact JSON text.
    pub fn to_json(&self) -> String {
        self.to_value().to_string()
    }

    pub fn to_json_pretty(&self) -> String {
        format!("{:#}", self.to_value())
    }
}

/// Snapshot a tree. Walks the attached nodes depth-first; unattached
/// fragments are not part of the document. Each entry's `version` comes
/// from `registry`.
pub fn serialize(tree: &Tree, registry: &Registry) -> SerializedState {
    SerializedState {
        root: entry(tree, tree.root(), registry),
    }
}

fn entry(tree: &Tree, key: NodeKey, registry: &Registry) -> Value {
    let Some(node) = tree.get(key) else {
        return Value::Null;
    };
    if let Node::Placeholder(placeholder) = node {
        return placeholder.original.clone();
    }

    let node_type = node.node_type();
    let mut map = Map::new();
    map.insert("type".into(), node_type.tag().into());
    map.insert("version".into(), registry.version(node_type).into());
    node.write_fields(&mut map, registry);
    if node.is_container() {
        map.insert(
            "children".into(),
            tree.children(key)
                .iter()
                .map(|child| entry(tree, *child, registry))
                .collect(),
        );
    }
    Value::Object(map)
}
