// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! One open document being edited.

use std::fmt;

use tracing::debug;

use crate::deserializer::Deserializer;
use crate::diagnostics::Warning;
use crate::error::{DocumentError, TreeError};
use crate::registry::Registry;
use crate::serializer::{serialize, SerializedState};
use crate::tree::Tree;

pub type ChangeListener = Box<dyn FnMut(&SerializedState)>;

/// Owns the tree of one document. Listeners registered with
/// [`Session::on_change`] receive the serialized state after every edit
/// that succeeds. States are written with the registry the document was
/// opened with.
pub struct Session<'r> {
    registry: &'r Registry,
    tree: Tree,
    listeners: Vec<ChangeListener>,
    warnings: Vec<Warning>,
    dirty: bool,
}

impl Session<'static> {
    /// Open a stored document, or a blank one when there is none.
    pub fn open(initial: Option<&str>) -> Result<Self, DocumentError> {
        Self::open_with(initial, &Deserializer::default())
    }
}

impl<'r> Session<'r> {
    pub fn open_with(
        initial: Option<&str>,
        deserializer: &Deserializer<'r>,
    ) -> Result<Self, DocumentError> {
        let (tree, warnings) = match initial {
            Some(json) => {
                let deserialized = deserializer.deserialize_str(json)?;
                (deserialized.tree, deserialized.warnings)
            }
            None => (Tree::new(), Vec::new()),
        };
        Ok(Self {
            registry: deserializer.registry(),
            tree,
            listeners: Vec::new(),
            warnings,
            dirty: false,
        })
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// What was recovered from while opening.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Whether there are edits since the last save.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn on_change(
        &mut self,
        listener: impl FnMut(&SerializedState) + 'static,
    ) {
        self.listeners.push(Box::new(listener));
    }

    /// Apply `edit` as one step. If it fails, every mutation it made is
    /// rolled back and no listener runs.
    pub fn edit<R>(
        &mut self,
        edit: impl FnOnce(&mut Tree) -> Result<R, TreeError>,
    ) -> Result<R, TreeError> {
        let before = self.tree.clone();
        match edit(&mut self.tree) {
            Ok(value) => {
                self.dirty = true;
                if !self.listeners.is_empty() {
                    let state = serialize(&self.tree, self.registry);
                    for listener in &mut self.listeners {
                        listener(&state);
                    }
                }
                Ok(value)
            }
            Err(err) => {
                self.tree = before;
                debug!(error = %err, "Edit rolled back");
                Err(err)
            }
        }
    }

    /// The state to store.
    pub fn save(&mut self) -> SerializedState {
        self.dirty = false;
        serialize(&self.tree, self.registry)
    }

    pub fn into_tree(self) -> Tree {
        self.tree
    }
}

impl fmt::Debug for Session<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("tree", &self.tree)
            .field("listeners", &self.listeners.len())
            .field("warnings", &self.warnings)
            .field("dirty", &self.dirty)
            .finish()
    }
}
