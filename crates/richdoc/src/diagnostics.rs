// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Best-effort reporting for the conversion pipeline.
//!
//! Deserialization, export and import never fail because of a single bad
//! node. Instead they return what they could build together with a list of
//! [`Warning`]s locating each node that degraded.

use std::fmt;

use crate::error::{ExportError, SchemaError};
use crate::node_type::NodeType;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Child(usize),
    Caption,
}

/// Location of a node, as child indices from the root. Captions start a
/// nested tree, marked by a [`PathSegment::Caption`] segment.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct NodePath(Vec<PathSegment>);

impl NodePath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn child(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Child(index));
        Self(segments)
    }

    pub fn caption(&self) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Caption);
        Self(segments)
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("root")?;
        for segment in &self.0 {
            match segment {
                PathSegment::Child(i) => write!(f, "/{i}")?,
                PathSegment::Caption => f.write_str("/caption")?,
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum WarningKind {
    /// The entry was replaced by a placeholder or skipped.
    Schema(SchemaError),
    /// The node's export rule failed; it contributed no markup.
    Export(ExportError),
    /// A leaf entry carried `children`, which were dropped.
    IgnoredChildren(NodeType),
    /// Imported markup that has no node equivalent.
    Import(String),
    /// The whole document could not be read.
    Document(String),
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Schema(e) => write!(f, "{e}"),
            Self::Export(e) => write!(f, "export failed: {e}"),
            Self::IgnoredChildren(t) => {
                write!(f, "children of leaf `{t}` node were ignored")
            }
            Self::Import(msg) => write!(f, "import: {msg}"),
            Self::Document(msg) => write!(f, "document: {msg}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Warning {
    pub path: NodePath,
    pub kind: WarningKind,
}

impl Warning {
    pub fn new(path: NodePath, kind: WarningKind) -> Self {
        Self { path, kind }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.kind)
    }
}
