// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Handle-based DOM that `html5ever` builds into.
//!
//! All nodes are owned by one list in the [`PaDom`]; parents refer to
//! children (and children to parents) by [`PaDomHandle`]. Nodes that the
//! parser creates and later abandons stay in the list but are unreachable
//! from the document, so walks from the document never see them.

use html5ever::{LocalName, Namespace, QualName};

pub(crate) use super::panode_container::PaNodeContainer;

const XHTML: &str = "http://www.w3.org/1999/xhtml";

pub(crate) fn paqual_name(name: &str) -> QualName {
    QualName::new(None, Namespace::from(XHTML), LocalName::from(name))
}

#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub(crate) struct PaDomHandle(pub(crate) usize);

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct PaNodeText {
    pub(crate) content: String,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum PaDomNode {
    Container(PaNodeContainer),
    Document(PaNodeContainer),
    Text(PaNodeText),
    /// Comments, processing instructions and doctypes.
    Comment,
}

impl PaDomNode {
    pub(crate) fn children(&self) -> &[PaDomHandle] {
        match self {
            Self::Container(c) | Self::Document(c) => &c.children,
            Self::Text(_) | Self::Comment => &[],
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct PaDom {
    nodes: Vec<PaDomNode>,
    parents: Vec<Option<PaDomHandle>>,
    document_handle: PaDomHandle,
    /// Name reported for nodes that are not elements.
    no_name: QualName,
    pub(crate) parse_errors: Vec<String>,
}

impl PaDom {
    pub(crate) fn new() -> Self {
        let mut dom = Self {
            nodes: Vec::new(),
            parents: Vec::new(),
            document_handle: PaDomHandle(0),
            no_name: paqual_name(""),
            parse_errors: Vec::new(),
        };
        dom.document_handle = dom.add_node(PaDomNode::Document(PaNodeContainer {
            name: paqual_name(""),
            attrs: Vec::new(),
            children: Vec::new(),
        }));
        dom
    }

    pub(crate) fn add_node(&mut self, node: PaDomNode) -> PaDomHandle {
        self.nodes.push(node);
        self.parents.push(None);
        PaDomHandle(self.nodes.len() - 1)
    }

    pub(crate) fn document_handle(&self) -> &PaDomHandle {
        &self.document_handle
    }

    /// Handles are only ever created by this dom, so they are always in
    /// range.
    pub(crate) fn get_node(&self, handle: &PaDomHandle) -> &PaDomNode {
        &self.nodes[handle.0]
    }

    pub(crate) fn get_mut_node(
        &mut self,
        handle: &PaDomHandle,
    ) -> &mut PaDomNode {
        &mut self.nodes[handle.0]
    }

    pub(crate) fn name(&self, handle: &PaDomHandle) -> &QualName {
        match self.get_node(handle) {
            PaDomNode::Container(c) => &c.name,
            _ => &self.no_name,
        }
    }

    pub(crate) fn parent(&self, handle: &PaDomHandle) -> Option<&PaDomHandle> {
        self.parents[handle.0].as_ref()
    }

    fn children_mut(
        &mut self,
        handle: &PaDomHandle,
    ) -> Option<&mut Vec<PaDomHandle>> {
        match self.get_mut_node(handle) {
            PaDomNode::Container(c) | PaDomNode::Document(c) => {
                Some(&mut c.children)
            }
            PaDomNode::Text(_) | PaDomNode::Comment => None,
        }
    }

    /// Append `child` to `parent`. Nodes that cannot hold children ignore
    /// the request.
    pub(crate) fn append_child(
        &mut self,
        parent: &PaDomHandle,
        child: PaDomHandle,
    ) {
        self.detach(&child);
        let appended = match self.children_mut(parent) {
            Some(children) => {
                children.push(child.clone());
                true
            }
            None => false,
        };
        if appended {
            self.parents[child.0] = Some(parent.clone());
        }
    }

    /// Insert `child` right before `sibling`, under the sibling's parent.
    pub(crate) fn insert_before(
        &mut self,
        sibling: &PaDomHandle,
        child: PaDomHandle,
    ) {
        let Some(parent) = self.parent(sibling).cloned() else {
            return;
        };
        self.detach(&child);
        let inserted = match self.children_mut(&parent) {
            Some(children) => {
                let index = children
                    .iter()
                    .position(|c| c == sibling)
                    .unwrap_or(children.len());
                children.insert(index, child.clone());
                true
            }
            None => false,
        };
        if inserted {
            self.parents[child.0] = Some(parent);
        }
    }

    pub(crate) fn detach(&mut self, handle: &PaDomHandle) {
        if let Some(parent) = self.parents[handle.0].take() {
            if let Some(children) = self.children_mut(&parent) {
                children.retain(|c| c != handle);
            }
        }
    }

    /// Move all children of `from` to the end of `to`.
    pub(crate) fn reparent_children(
        &mut self,
        from: &PaDomHandle,
        to: &PaDomHandle,
    ) {
        let moved = match self.children_mut(from) {
            Some(children) => std::mem::take(children),
            None => return,
        };
        for child in &moved {
            self.parents[child.0] = None;
        }
        for child in moved {
            self.append_child(to, child);
        }
    }

    /// The text node that new text under `parent` should be merged into.
    pub(crate) fn last_text_child(
        &self,
        parent: &PaDomHandle,
    ) -> Option<PaDomHandle> {
        let last = self.get_node(parent).children().last()?;
        matches!(self.get_node(last), PaDomNode::Text(_)).then(|| last.clone())
    }

    /// The text node right before `sibling`, if there is one.
    pub(crate) fn text_before(
        &self,
        sibling: &PaDomHandle,
    ) -> Option<PaDomHandle> {
        let parent = self.parent(sibling)?;
        let children = self.get_node(parent).children();
        let index = children.iter().position(|c| c == sibling)?;
        let prev = children.get(index.checked_sub(1)?)?;
        matches!(self.get_node(prev), PaDomNode::Text(_)).then(|| prev.clone())
    }

    pub(crate) fn push_text(&mut self, handle: &PaDomHandle, text: &str) {
        if let PaDomNode::Text(t) = self.get_mut_node(handle) {
            t.content.push_str(text);
        }
    }
}
