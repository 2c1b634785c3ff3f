// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

use super::{NodeKey, Tree};
use crate::nodes::Node;

/// Depth-first, pre-order iterator over a tree.
///
/// Holds a shared borrow of the tree, so the tree cannot change under it.
pub struct Walk<'a> {
    tree: &'a Tree,
    stack: Vec<NodeKey>,
}

impl<'a> Walk<'a> {
    pub(super) fn new(tree: &'a Tree, from: NodeKey) -> Self {
        let stack = if tree.get(from).is_some() {
            vec![from]
        } else {
            Vec::new()
        };
        Self { tree, stack }
    }
}

impl<'a> Iterator for Walk<'a> {
    type Item = (NodeKey, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        let key = self.stack.pop()?;
        let node = self.tree.get(key)?;
        self.stack
            .extend(self.tree.children(key).iter().rev().copied());
        Some((key, node))
    }
}
