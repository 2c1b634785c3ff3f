// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

use super::{NodeKey, Tree};

impl Tree {
    /// ASCII outline of the attached nodes, one per line.
    pub fn to_tree_string(&self) -> String {
        let mut out = String::new();
        if let Some(root) = self.get(self.root) {
            out.push_str(&root.describe());
            out.push('\n');
            self.write_children(self.root, "", &mut out);
        }
        out
    }

    fn write_children(&self, key: NodeKey, prefix: &str, out: &mut String) {
        let children = self.children(key);
        for (i, child) in children.iter().enumerate() {
            let Some(node) = self.get(*child) else {
                continue;
            };
            let last = i + 1 == children.len();
            out.push_str(prefix);
            out.push_str(if last { "└>" } else { "├>" });
            out.push_str(&node.describe());
            out.push('\n');
            let nested = format!("{prefix}{}", if last { "  " } else { "│ " });
            self.write_children(*child, &nested, out);
        }
    }
}
