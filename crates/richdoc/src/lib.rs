// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Rich documents as a tree of typed nodes, stored as versioned JSON and
//! displayed as sanitized HTML.

pub mod deserializer;
pub mod diagnostics;
pub mod error;
pub mod html;
pub mod markdown;
pub mod node_type;
pub mod nodes;
pub mod registry;
pub mod render;
pub mod serializer;
pub mod session;
pub mod tree;

#[cfg(test)]
mod tests;

pub use crate::deserializer::{
    deserialize, Deserialized, Deserializer, RecoveryPolicy,
};
pub use crate::diagnostics::{NodePath, PathSegment, Warning, WarningKind};
pub use crate::error::{DocumentError, ExportError, SchemaError, TreeError};
pub use crate::html::{
    export_html, import_html, sanitize, sanitize_with, ExportContext,
    ExportOptions, Exported, ImportOptions, Imported, SanitizeOptions,
    SanitizeReport, Sanitized, MAX_IMPORT_DEPTH,
};
pub use crate::markdown::{export_markdown, import_markdown};
pub use crate::node_type::NodeType;
pub use crate::nodes::Node;
pub use crate::registry::{ExportRule, ImportFn, NodeSpec, Registry};
pub use crate::render::{editor_state_to_html, render, RenderOptions, Rendered};
pub use crate::serializer::{serialize, SerializedState, FORMAT_VERSION};
pub use crate::session::{ChangeListener, Session};
pub use crate::tree::{NodeKey, NodeState, Subtree, Tree};
