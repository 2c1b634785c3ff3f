// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Serialized editor state to tree.
//!
//! A malformed envelope fails the whole document. A malformed node entry is
//! isolated: depending on the [`RecoveryPolicy`] it becomes a placeholder, is
//! skipped, or aborts the document.

use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};

use crate::diagnostics::{NodePath, Warning, WarningKind};
use crate::error::{DocumentError, SchemaError};
use crate::node_type::NodeType;
use crate::nodes::fields::{CaptionReader, NoCaptions};
use crate::nodes::{ElementAttrs, Fields, Node, Placeholder};
use crate::registry::Registry;
use crate::serializer::FORMAT_VERSION;
use crate::tree::{Subtree, Tree};

/// What to do with a node entry that cannot be read.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RecoveryPolicy {
    /// Keep the entry in a placeholder node at the same position.
    #[default]
    Placeholder,
    /// Leave the entry out of the tree.
    Skip,
    /// Fail the whole document.
    Abort,
}

#[derive(Debug)]
pub struct Deserialized {
    pub tree: Tree,
    /// One warning per entry that was recovered from.
    pub warnings: Vec<Warning>,
}

#[derive(Clone, Copy, Debug)]
pub struct Deserializer<'r> {
    registry: &'r Registry,
    policy: RecoveryPolicy,
}

impl Default for Deserializer<'static> {
    fn default() -> Self {
        Self::new(Registry::standard())
    }
}

impl<'r> Deserializer<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            policy: RecoveryPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RecoveryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> RecoveryPolicy {
        self.policy
    }

    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    #[instrument(skip_all, fields(len = json.len()))]
    pub fn deserialize_str(
        &self,
        json: &str,
    ) -> Result<Deserialized, DocumentError> {
        let value: Value = serde_json::from_str(json)?;
        self.deserialize_value(&value)
    }

    #[instrument(skip_all, fields(policy = ?self.policy))]
    pub fn deserialize_value(
        &self,
        value: &Value,
    ) -> Result<Deserialized, DocumentError> {
        let mut reader = Reader {
            registry: self.registry,
            policy: self.policy,
            warnings: Vec::new(),
            aborted: None,
            current: NodePath::root(),
        };
        let tree = reader.document(value, NodePath::root())?;
        if let Some(warning) = reader.aborted {
            return Err(DocumentError::Node(warning));
        }
        debug!(
            nodes = tree.len(),
            warnings = reader.warnings.len(),
            "Deserialized editor state"
        );
        Ok(Deserialized {
            tree,
            warnings: reader.warnings,
        })
    }
}

/// Read a document with the standard registry and placeholder recovery.
pub fn deserialize(json: &str) -> Result<Deserialized, DocumentError> {
    Deserializer::default().deserialize_str(json)
}

struct Reader<'r> {
    registry: &'r Registry,
    policy: RecoveryPolicy,
    warnings: Vec<Warning>,
    /// Set when an entry inside a caption fails under `Abort`.
    aborted: Option<Warning>,
    /// Path of the entry being instantiated, for its captions.
    current: NodePath,
}

impl Reader<'_> {
    fn document(
        &mut self,
        value: &Value,
        path: NodePath,
    ) -> Result<Tree, DocumentError> {
        let envelope = value.as_object().ok_or(DocumentError::NotAnObject)?;
        let root = envelope.get("root").ok_or(DocumentError::MissingRoot)?;
        let root = match root {
            Value::Object(map)
                if map.get("type").and_then(Value::as_str) == Some("root") =>
            {
                map
            }
            Value::Object(map) => {
                let found = map
                    .get("type")
                    .map(Value::to_string)
                    .unwrap_or_else(|| "no type".to_owned());
                return Err(DocumentError::InvalidRoot(found));
            }
            other => return Err(DocumentError::InvalidRoot(other.to_string())),
        };

        let version = match root.get("version") {
            None | Some(Value::Null) => 1,
            Some(v) => v.as_u64().ok_or_else(|| {
                DocumentError::InvalidRoot(format!("version {v}"))
            })?,
        };
        if version > u64::from(FORMAT_VERSION) {
            return Err(DocumentError::UnsupportedFormatVersion(version));
        }

        let attrs = {
            let mut no_captions = NoCaptions;
            let fields = Fields::new(NodeType::Root, root, &mut no_captions);
            ElementAttrs::read(&fields)
        };
        let attrs = attrs.unwrap_or_else(|err| {
            self.warn(path.clone(), WarningKind::Schema(err));
            ElementAttrs::default()
        });
        let children = self.children(root, &path)?;
        Ok(Tree::from_parts(attrs, children))
    }

    fn children(
        &mut self,
        parent: &Map<String, Value>,
        path: &NodePath,
    ) -> Result<Vec<Subtree>, DocumentError> {
        let Some(Value::Array(entries)) = parent.get("children") else {
            return Ok(Vec::new());
        };
        let mut children = Vec::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            if let Some(child) = self.entry(entry, path.child(i))? {
                children.push(child);
            }
        }
        Ok(children)
    }

    fn entry(
        &mut self,
        value: &Value,
        path: NodePath,
    ) -> Result<Option<Subtree>, DocumentError> {
        match self.instantiate(value, &path) {
            Ok(node) => {
                let Some(map) = value.as_object() else {
                    return Ok(Some(Subtree::new(node)));
                };
                if node.is_container() {
                    let children = self.children(map, &path)?;
                    return Ok(Some(Subtree::with_children(node, children)));
                }
                if matches!(map.get("children"), Some(Value::Array(c)) if !c.is_empty())
                {
                    let kind = WarningKind::IgnoredChildren(node.node_type());
                    self.warn(path, kind);
                }
                Ok(Some(Subtree::new(node)))
            }
            Err(err) => self.recover(value, path, err),
        }
    }

    fn instantiate(
        &mut self,
        value: &Value,
        path: &NodePath,
    ) -> Result<Node, SchemaError> {
        if let Some(map) = value.as_object() {
            if !matches!(
                map.get("children"),
                None | Some(Value::Null) | Some(Value::Array(_))
            ) {
                let node_type = map
                    .get("type")
                    .and_then(Value::as_str)
                    .and_then(NodeType::from_tag)
                    .unwrap_or(NodeType::Placeholder);
                return Err(SchemaError::invalid(
                    node_type,
                    "children",
                    "expected an array",
                ));
            }
        }
        self.current = path.clone();
        let registry = self.registry;
        registry.instantiate_with(value, self)
    }

    fn recover(
        &mut self,
        value: &Value,
        path: NodePath,
        err: SchemaError,
    ) -> Result<Option<Subtree>, DocumentError> {
        let warning = Warning::new(path, WarningKind::Schema(err.clone()));
        match self.policy {
            RecoveryPolicy::Abort => {
                warn!(
                    path = %warning.path,
                    error = %err,
                    "Unreadable node, aborting"
                );
                Err(DocumentError::Node(warning))
            }
            RecoveryPolicy::Skip => {
                self.record(warning);
                Ok(None)
            }
            RecoveryPolicy::Placeholder => {
                self.record(warning);
                Ok(Some(Subtree::new(Node::Placeholder(Placeholder {
                    original: value.clone(),
                    reason: err.to_string(),
                }))))
            }
        }
    }

    fn warn(&mut self, path: NodePath, kind: WarningKind) {
        self.record(Warning::new(path, kind));
    }

    fn record(&mut self, warning: Warning) {
        warn!(
            path = %warning.path,
            problem = %warning.kind,
            "Recovered from unreadable node"
        );
        self.warnings.push(warning);
    }
}

impl CaptionReader for Reader<'_> {
    fn read_caption(&mut self, value: &Value) -> Tree {
        let owner = self.current.clone();
        let path = owner.caption();
        let parsed;
        let state = match value.get("editorState") {
            Some(Value::String(json)) => match serde_json::from_str(json) {
                Ok(v) => {
                    parsed = v;
                    Ok(&parsed)
                }
                Err(err) => Err(DocumentError::from(err)),
            },
            Some(state) => Ok(state),
            None => Err(DocumentError::MissingRoot),
        };

        let read = state.and_then(|state| self.document(state, path.clone()));
        let tree = match read {
            Ok(tree) => tree,
            Err(DocumentError::Node(warning)) => {
                self.aborted.get_or_insert(warning);
                Tree::new()
            }
            Err(err) => {
                let warning =
                    Warning::new(path, WarningKind::Document(err.to_string()));
                if self.policy == RecoveryPolicy::Abort {
                    self.aborted.get_or_insert(warning);
                } else {
                    self.record(warning);
                }
                Tree::new()
            }
        };
        self.current = owner;
        tree
    }
}
