// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Arena-backed document tree.
//!
//! Nodes live in slots keyed by [`NodeKey`]. Parent links are looked up in the
//! arena rather than stored as references, so a removed subtree leaves no
//! dangling pointers behind: its slots simply leave the arena.

mod invariants;
mod outline;
mod subtree;
mod walk;

use std::collections::HashMap;
use std::fmt;

pub use self::subtree::Subtree;
pub use self::walk::Walk;
use crate::error::TreeError;
use crate::node_type::NodeType;
use crate::nodes::{ElementAttrs, Node};

/// Identity of a node within one tree. Keys are issued in increasing order
/// and never reused, so a key taken from a removed node stays invalid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey(u64);

impl NodeKey {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle of a node key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeState {
    /// Created, or part of a fragment that is not yet under the root.
    Unattached,
    /// Reachable from the root.
    Attached,
    /// Removed or discarded. The key will never be valid again.
    Detached,
}

#[derive(Clone, Debug)]
struct Slot {
    node: Node,
    parent: Option<NodeKey>,
    children: Vec<NodeKey>,
}

#[derive(Clone)]
pub struct Tree {
    slots: HashMap<NodeKey, Slot>,
    root: NodeKey,
    next_key: u64,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// A tree holding only an empty root.
    pub fn new() -> Self {
        Self::with_root(ElementAttrs::default())
    }

    pub fn with_root(attrs: ElementAttrs) -> Self {
        let mut slots = HashMap::new();
        let root = NodeKey(0);
        slots.insert(
            root,
            Slot {
                node: Node::Root(attrs),
                parent: None,
                children: Vec::new(),
            },
        );
        Self {
            slots,
            root,
            next_key: 1,
        }
    }

    /// Build a tree whose root holds the given subtrees, in order.
    pub fn from_subtree(children: Vec<Subtree>) -> Result<Self, TreeError> {
        for child in &children {
            child.validate()?;
        }
        Ok(Self::from_parts(ElementAttrs::default(), children))
    }

    /// Assemble a tree from subtrees that are already known to be valid.
    pub(crate) fn from_parts(
        root: ElementAttrs,
        children: Vec<Subtree>,
    ) -> Self {
        let mut tree = Self::with_root(root);
        let root = tree.root;
        let keys = children
            .into_iter()
            .map(|child| tree.build(child, Some(root)))
            .collect();
        if let Some(slot) = tree.slots.get_mut(&root) {
            slot.children = keys;
        }
        tree.assert_invariants();
        tree
    }

    pub fn root(&self) -> NodeKey {
        self.root
    }

    pub fn root_attrs(&self) -> ElementAttrs {
        match self.get(self.root) {
            Some(Node::Root(attrs)) => *attrs,
            _ => ElementAttrs::default(),
        }
    }

    pub fn get(&self, key: NodeKey) -> Option<&Node> {
        self.slots.get(&key).map(|slot| &slot.node)
    }

    /// Children of `key`, in order. Unknown keys have none.
    pub fn children(&self, key: NodeKey) -> &[NodeKey] {
        self.slots
            .get(&key)
            .map(|slot| slot.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn parent(&self, key: NodeKey) -> Option<NodeKey> {
        self.slots.get(&key).and_then(|slot| slot.parent)
    }

    pub fn index_in_parent(&self, key: NodeKey) -> Option<usize> {
        let parent = self.parent(key)?;
        self.children(parent).iter().position(|k| *k == key)
    }

    /// `None` for keys this tree never issued.
    pub fn state(&self, key: NodeKey) -> Option<NodeState> {
        if key.0 >= self.next_key {
            None
        } else if !self.slots.contains_key(&key) {
            Some(NodeState::Detached)
        } else if self.is_ancestor_or_self(self.root, key) {
            Some(NodeState::Attached)
        } else {
            Some(NodeState::Unattached)
        }
    }

    /// Number of attached nodes, not counting the root.
    pub fn len(&self) -> usize {
        self.walk(self.root).count() - 1
    }

    /// True when the root has no children.
    pub fn is_empty(&self) -> bool {
        self.children(self.root).is_empty()
    }

    /// Depth-first, pre-order walk starting at (and including) `from`.
    pub fn walk(&self, from: NodeKey) -> Walk<'_> {
        Walk::new(self, from)
    }

    /// Owned copy of the node at `key` and its descendants.
    pub fn to_subtree(&self, key: NodeKey) -> Option<Subtree> {
        let node = self.get(key)?.clone();
        let children = self
            .children(key)
            .iter()
            .filter_map(|child| self.to_subtree(*child))
            .collect();
        Some(Subtree::with_children(node, children))
    }

    /// Add an unattached node to the arena.
    pub fn create(&mut self, node: Node) -> NodeKey {
        self.alloc(node, None)
    }

    /// Attach the unattached node `child` under `parent` at `index`.
    ///
    /// `parent` may itself be unattached, so fragments can be assembled
    /// bottom-up and attached in one step.
    pub fn insert(
        &mut self,
        parent: NodeKey,
        index: usize,
        child: NodeKey,
    ) -> Result<(), TreeError> {
        let parent_slot = self.slot(parent)?;
        let child_slot = self.slot(child)?;
        if !parent_slot.node.is_container() {
            return Err(TreeError::NotAContainer(parent));
        }
        if child == self.root || self.is_ancestor_or_self(child, parent) {
            return Err(TreeError::CyclicInsert { parent, child });
        }
        if child_slot.parent.is_some() {
            return Err(TreeError::AlreadyAttached(child));
        }
        if child_slot.node.node_type() == NodeType::Root {
            return Err(TreeError::NestedRoot);
        }
        let len = parent_slot.children.len();
        if index > len {
            return Err(TreeError::InvalidIndex { index, len });
        }

        if let Some(slot) = self.slots.get_mut(&parent) {
            slot.children.insert(index, child);
        }
        if let Some(slot) = self.slots.get_mut(&child) {
            slot.parent = Some(parent);
        }
        self.assert_invariants();
        Ok(())
    }

    pub fn append(
        &mut self,
        parent: NodeKey,
        child: NodeKey,
    ) -> Result<(), TreeError> {
        let index = self.children(parent).len();
        self.insert(parent, index, child)
    }

    /// Create `node` and append it under `parent` in one step.
    pub fn append_new(
        &mut self,
        parent: NodeKey,
        node: Node,
    ) -> Result<NodeKey, TreeError> {
        let key = self.create(node);
        match self.append(parent, key) {
            Ok(()) => Ok(key),
            Err(err) => {
                self.slots.remove(&key);
                Err(err)
            }
        }
    }

    /// Attach an owned subtree under `parent`. Every node gets a fresh key.
    pub fn insert_subtree(
        &mut self,
        parent: NodeKey,
        index: usize,
        subtree: Subtree,
    ) -> Result<NodeKey, TreeError> {
        let parent_slot = self.slot(parent)?;
        if !parent_slot.node.is_container() {
            return Err(TreeError::NotAContainer(parent));
        }
        let len = parent_slot.children.len();
        if index > len {
            return Err(TreeError::InvalidIndex { index, len });
        }
        subtree.validate()?;

        let key = self.build(subtree, Some(parent));
        if let Some(slot) = self.slots.get_mut(&parent) {
            slot.children.insert(index, key);
        }
        self.assert_invariants();
        Ok(key)
    }

    /// Detach `key` and its descendants from the tree and hand them back.
    pub fn remove(&mut self, key: NodeKey) -> Result<Subtree, TreeError> {
        if key == self.root {
            return Err(TreeError::RootRemoval);
        }
        if self.state(key) != Some(NodeState::Attached) {
            return Err(TreeError::NodeNotFound(key));
        }
        let parent = self.parent(key).ok_or(TreeError::NodeNotFound(key))?;
        if let Some(slot) = self.slots.get_mut(&parent) {
            slot.children.retain(|k| *k != key);
        }
        let removed = self.take(key).ok_or(TreeError::NodeNotFound(key))?;
        self.assert_invariants();
        Ok(removed)
    }

    /// Put the unattached fragment rooted at `new` where `old` is, and hand
    /// back the subtree of `old`.
    pub fn replace(
        &mut self,
        old: NodeKey,
        new: NodeKey,
    ) -> Result<Subtree, TreeError> {
        if old == self.root {
            return Err(TreeError::RootRemoval);
        }
        if self.state(old) != Some(NodeState::Attached) {
            return Err(TreeError::NodeNotFound(old));
        }
        let new_slot = self.slot(new)?;
        if new == self.root || new_slot.parent.is_some() {
            return Err(TreeError::AlreadyAttached(new));
        }
        if new_slot.node.node_type() == NodeType::Root {
            return Err(TreeError::NestedRoot);
        }
        let parent = self.parent(old).ok_or(TreeError::NodeNotFound(old))?;
        let index = self
            .index_in_parent(old)
            .ok_or(TreeError::NodeNotFound(old))?;

        if let Some(slot) = self.slots.get_mut(&parent) {
            slot.children[index] = new;
        }
        if let Some(slot) = self.slots.get_mut(&new) {
            slot.parent = Some(parent);
        }
        let removed = self.take(old).ok_or(TreeError::NodeNotFound(old))?;
        self.assert_invariants();
        Ok(removed)
    }

    /// Drop an unattached fragment and everything below it.
    pub fn discard(&mut self, key: NodeKey) -> Result<(), TreeError> {
        let slot = self.slot(key)?;
        if key == self.root || slot.parent.is_some() {
            return Err(TreeError::AlreadyAttached(key));
        }
        self.take(key);
        self.assert_invariants();
        Ok(())
    }

    /// Change the attributes of a node in place. The node type is fixed: an
    /// update that changes it is rolled back.
    pub fn update<F>(&mut self, key: NodeKey, f: F) -> Result<(), TreeError>
    where
        F: FnOnce(&mut Node),
    {
        let slot = self
            .slots
            .get_mut(&key)
            .ok_or(TreeError::NodeNotFound(key))?;
        let before = slot.node.clone();
        f(&mut slot.node);
        let from = before.node_type();
        let to = slot.node.node_type();
        if from != to {
            slot.node = before;
            return Err(TreeError::TypeChange { key, from, to });
        }
        Ok(())
    }

    fn slot(&self, key: NodeKey) -> Result<&Slot, TreeError> {
        self.slots.get(&key).ok_or(TreeError::NodeNotFound(key))
    }

    fn alloc(&mut self, node: Node, parent: Option<NodeKey>) -> NodeKey {
        let key = NodeKey(self.next_key);
        self.next_key += 1;
        self.slots.insert(
            key,
            Slot {
                node,
                parent,
                children: Vec::new(),
            },
        );
        key
    }

    fn build(&mut self, subtree: Subtree, parent: Option<NodeKey>) -> NodeKey {
        let (node, children) = subtree.into_parts();
        let key = self.alloc(node, parent);
        let keys = children
            .into_iter()
            .map(|child| self.build(child, Some(key)))
            .collect();
        if let Some(slot) = self.slots.get_mut(&key) {
            slot.children = keys;
        }
        key
    }

    /// Move a node and its descendants out of the arena.
    fn take(&mut self, key: NodeKey) -> Option<Subtree> {
        let slot = self.slots.remove(&key)?;
        let children = slot
            .children
            .into_iter()
            .filter_map(|child| self.take(child))
            .collect();
        Some(Subtree::with_children(slot.node, children))
    }

    fn is_ancestor_or_self(&self, ancestor: NodeKey, key: NodeKey) -> bool {
        let mut current = Some(key);
        while let Some(k) = current {
            if k == ancestor {
                return true;
            }
            current = self.parent(k);
        }
        false
    }

    fn same_shape(&self, a: NodeKey, other: &Tree, b: NodeKey) -> bool {
        match (self.get(a), other.get(b)) {
            (Some(x), Some(y)) if x == y => {
                let (ca, cb) = (self.children(a), other.children(b));
                ca.len() == cb.len()
                    && ca
                        .iter()
                        .zip(cb)
                        .all(|(x, y)| self.same_shape(*x, other, *y))
            }
            _ => false,
        }
    }
}

/// Structural equality: node payloads, child order and captions. Keys are
/// ignored.
impl PartialEq for Tree {
    fn eq(&self, other: &Self) -> bool {
        self.same_shape(self.root, other, other.root)
    }
}

impl fmt::Debug for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_tree_string())
    }
}
