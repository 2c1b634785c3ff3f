// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

use super::Tree;
use crate::node_type::NodeType;

impl Tree {
    /// Panics if the arena is inconsistent.
    pub fn explicitly_assert_invariants(&self) {
        let root = self
            .slots
            .get(&self.root)
            .unwrap_or_else(|| panic!("root {} is missing", self.root));
        assert!(root.parent.is_none(), "root has a parent");
        assert_eq!(root.node.node_type(), NodeType::Root);

        for (key, slot) in &self.slots {
            assert!(key.0 < self.next_key, "{key} was never issued");
            if *key != self.root {
                assert_ne!(
                    slot.node.node_type(),
                    NodeType::Root,
                    "nested root at {key}"
                );
            }
            if !slot.node.is_container() {
                assert!(slot.children.is_empty(), "leaf {key} has children");
            }
            for child in &slot.children {
                let child_slot = self
                    .slots
                    .get(child)
                    .unwrap_or_else(|| panic!("{key} lists missing {child}"));
                assert_eq!(child_slot.parent, Some(*key), "{child}");
            }
            if let Some(parent) = slot.parent {
                let listed = self
                    .children(parent)
                    .iter()
                    .filter(|k| *k == key)
                    .count();
                assert_eq!(listed, 1, "{parent} lists {key} {listed} times");
            }

            let mut steps = 0;
            let mut current = slot.parent;
            while let Some(parent) = current {
                steps += 1;
                assert!(steps <= self.slots.len(), "cycle through {key}");
                current = self.parent(parent);
            }
        }
    }

    pub(super) fn assert_invariants(&self) {
        #[cfg(feature = "assert-invariants")]
        self.explicitly_assert_invariants();
    }
}

#[cfg(test)]
mod test {
    use crate::nodes::{HeadingTag, Node};
    use crate::tests::testutils_tree::{heading, text};
    use crate::tree::Tree;

    #[test]
    fn mutations_keep_the_arena_consistent() {
        let mut tree =
            Tree::from_subtree(vec![heading(HeadingTag::H1, vec![text("a")])])
                .unwrap();
        let p = tree.append_new(tree.root(), Node::paragraph()).unwrap();
        let t = tree.append_new(p, Node::text("b")).unwrap();
        tree.explicitly_assert_invariants();
        let removed = tree.remove(p).unwrap();
        tree.explicitly_assert_invariants();
        tree.insert_subtree(tree.root(), 0, removed).unwrap();
        tree.explicitly_assert_invariants();
        assert!(tree.get(t).is_none());
    }
}
