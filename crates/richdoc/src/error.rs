// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

use thiserror::Error;

use crate::diagnostics::Warning;
use crate::node_type::NodeType;
use crate::tree::NodeKey;

/// A node entry in a serialized document does not match the shape its type
/// declares.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum SchemaError {
    #[error("node entry is not a JSON object")]
    NotAnObject,
    #[error("node entry has no `type` tag")]
    MissingType,
    #[error("unknown node type `{0}`")]
    UnknownType(String),
    #[error("`{0}` nodes cannot be instantiated from a document entry")]
    NotInstantiable(NodeType),
    #[error("`{node_type}` node is missing required field `{field}`")]
    MissingField {
        node_type: NodeType,
        field: &'static str,
    },
    #[error("`{node_type}` node has an invalid `{field}`: {reason}")]
    InvalidField {
        node_type: NodeType,
        field: &'static str,
        reason: String,
    },
    #[error(
        "`{node_type}` node version {version} is newer than the supported version {supported}"
    )]
    UnsupportedVersion {
        node_type: NodeType,
        version: u64,
        supported: u32,
    },
}

impl SchemaError {
    pub(crate) fn invalid(
        node_type: NodeType,
        field: &'static str,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidField {
            node_type,
            field,
            reason: reason.into(),
        }
    }

    /// The field at fault, when the error concerns a single field.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::MissingField { field, .. }
            | Self::InvalidField { field, .. } => Some(field),
            Self::MissingType => Some("type"),
            Self::UnsupportedVersion { .. } => Some("version"),
            _ => None,
        }
    }
}

/// A contract violation on the tree mutation API. The rejected mutation
/// leaves the tree unchanged.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("index {index} is out of range for a node with {len} children")]
    InvalidIndex { index: usize, len: usize },
    #[error("inserting {child} under {parent} would create a cycle")]
    CyclicInsert { parent: NodeKey, child: NodeKey },
    #[error("node {0} is not in the tree")]
    NodeNotFound(NodeKey),
    #[error("node {0} already has a parent")]
    AlreadyAttached(NodeKey),
    #[error("node {0} is a leaf and cannot have children")]
    NotAContainer(NodeKey),
    #[error("the root node cannot be removed or replaced")]
    RootRemoval,
    #[error("a root node cannot be placed inside another node")]
    NestedRoot,
    #[error("a `{0}` subtree is a leaf but carries children")]
    LeafWithChildren(NodeType),
    #[error("an update tried to change node {key} from `{from}` to `{to}`")]
    TypeChange {
        key: NodeKey,
        from: NodeType,
        to: NodeType,
    },
}

/// The serialized envelope itself is unusable, so no tree can be built.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("editor state is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("editor state is not a JSON object")]
    NotAnObject,
    #[error("editor state has no `root` entry")]
    MissingRoot,
    #[error("root entry must be an object of type `root`, found {0}")]
    InvalidRoot(String),
    #[error("document format version {0} is not supported")]
    UnsupportedFormatVersion(u64),
    #[error("{0}")]
    Node(Warning),
}

/// An export rule could not produce markup for one node.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ExportError {
    #[error("refusing to export unsafe URL `{0}`")]
    UnsafeUrl(String),
    #[error("export rule for `{expected}` received a `{found}` node")]
    KindMismatch {
        expected: NodeType,
        found: NodeType,
    },
    #[error("invalid `{field}`: {reason}")]
    InvalidAttribute {
        field: &'static str,
        reason: String,
    },
    #[error("{0}")]
    Rule(String),
}

impl ExportError {
    pub(crate) fn mismatch(expected: NodeType, found: NodeType) -> Self {
        Self::KindMismatch { expected, found }
    }
}
