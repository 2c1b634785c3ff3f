// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Tree to raw HTML.
//!
//! Every node is exported by the rule its registry entry names. A failing
//! rule costs only that node's markup: the node contributes an empty string
//! and a warning is recorded, the rest of the document is unaffected. A rule
//! that panics counts as failing.

use std::any::Any;
use std::cell::RefCell;
use std::panic::{catch_unwind, AssertUnwindSafe};

use tracing::{debug, instrument, warn};

use crate::diagnostics::{NodePath, Warning, WarningKind};
use crate::error::ExportError;
use crate::nodes::{Caption, Node};
use crate::registry::Registry;
use crate::tree::{NodeKey, Tree};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportOptions {
    /// Frame size used when a node has no size of its own.
    pub embed_width: u32,
    pub embed_height: u32,
    pub youtube_embed_base: String,
    pub figma_embed_base: String,
    pub tweet_embed_base: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            embed_width: 560,
            embed_height: 315,
            youtube_embed_base: "https://www.youtube-nocookie.com/embed/".into(),
            figma_embed_base: "https://www.figma.com/embed?embed_host=richdoc&url="
                .into(),
            tweet_embed_base:
                "https://platform.twitter.com/embed/Tweet.html?id=".into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Exported {
    pub html: String,
    pub warnings: Vec<Warning>,
}

/// State shared by the rules during one export.
pub struct ExportContext<'a> {
    registry: &'a Registry,
    options: &'a ExportOptions,
    warnings: RefCell<Vec<Warning>>,
    current: RefCell<NodePath>,
}

impl<'a> ExportContext<'a> {
    fn new(registry: &'a Registry, options: &'a ExportOptions) -> Self {
        Self {
            registry,
            options,
            warnings: RefCell::new(Vec::new()),
            current: RefCell::new(NodePath::root()),
        }
    }

    pub fn options(&self) -> &ExportOptions {
        self.options
    }

    /// Path of the node whose rule is running.
    pub fn path(&self) -> NodePath {
        self.current.borrow().clone()
    }

    /// Export the caption document of the current node.
    pub fn export_caption(&self, caption: &Caption) -> String {
        let path = self.path().caption();
        let tree = caption.tree();
        self.export_node(tree, tree.root(), path)
    }

    fn export_node(&self, tree: &Tree, key: NodeKey, path: NodePath) -> String {
        let Some(node) = tree.get(key) else {
            return String::new();
        };
        let children_html: String = tree
            .children(key)
            .iter()
            .enumerate()
            .map(|(i, child)| self.export_node(tree, *child, path.child(i)))
            .collect();

        *self.current.borrow_mut() = path.clone();
        match self.run_rule(node, &children_html) {
            Ok(html) => html,
            Err(err) => {
                warn!(
                    path = %path,
                    node_type = %node.node_type(),
                    error = %err,
                    "Export rule failed"
                );
                self.warnings
                    .borrow_mut()
                    .push(Warning::new(path, WarningKind::Export(err)));
                String::new()
            }
        }
    }

    fn run_rule(
        &self,
        node: &Node,
        children_html: &str,
    ) -> Result<String, ExportError> {
        catch_unwind(AssertUnwindSafe(|| {
            self.registry.export(node, self, children_html)
        }))
        .unwrap_or_else(|payload| {
            Err(ExportError::Rule(format!(
                "export rule panicked: {}",
                panic_message(payload.as_ref())
            )))
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}

/// Render `tree` to HTML with the rules of `registry`. The output is not
/// sanitized.
#[instrument(skip_all, fields(nodes = tree.len()))]
pub fn export_html(
    tree: &Tree,
    registry: &Registry,
    options: &ExportOptions,
) -> Exported {
    let ctx = ExportContext::new(registry, options);
    let html = ctx.export_node(tree, tree.root(), NodePath::root());
    let warnings = ctx.warnings.into_inner();
    debug!(bytes = html.len(), warnings = warnings.len(), "Exported HTML");
    Exported { html, warnings }
}
