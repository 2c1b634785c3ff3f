// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

use crate::error::TreeError;
use crate::node_type::NodeType;
use crate::nodes::Node;

/// An owned node with its descendants and no keys.
///
/// Produced by [`Tree::remove`](super::Tree::remove) and
/// [`Tree::replace`](super::Tree::replace), consumed by
/// [`Tree::insert_subtree`](super::Tree::insert_subtree), which assigns fresh
/// keys.
#[derive(Clone, Debug, PartialEq)]
pub struct Subtree {
    node: Node,
    children: Vec<Subtree>,
}

impl Subtree {
    pub fn new(node: Node) -> Self {
        Self {
            node,
            children: Vec::new(),
        }
    }

    pub fn with_children(node: Node, children: Vec<Subtree>) -> Self {
        Self { node, children }
    }

    pub fn child(mut self, child: Subtree) -> Self {
        self.children.push(child);
        self
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    pub fn children(&self) -> &[Subtree] {
        &self.children
    }

    pub fn into_parts(self) -> (Node, Vec<Subtree>) {
        (self.node, self.children)
    }

    /// Check that this subtree can be attached below a container.
    pub(crate) fn validate(&self) -> Result<(), TreeError> {
        let mut stack = vec![self];
        while let Some(subtree) = stack.pop() {
            let node_type = subtree.node.node_type();
            if node_type == NodeType::Root {
                return Err(TreeError::NestedRoot);
            }
            if !node_type.is_container() && !subtree.children.is_empty() {
                return Err(TreeError::LeafWithChildren(node_type));
            }
            stack.extend(subtree.children.iter());
        }
        Ok(())
    }
}
