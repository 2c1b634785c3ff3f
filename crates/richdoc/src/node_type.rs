// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

use strum_macros::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};

/// The closed set of node kinds a document can contain.
///
/// The string form of each variant is the `type` tag used in the serialized
/// editor state.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    AsRefStr,
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
)]
pub enum NodeType {
    #[strum(serialize = "root")]
    Root,
    #[strum(serialize = "paragraph")]
    Paragraph,
    #[strum(serialize = "heading")]
    Heading,
    #[strum(serialize = "quote")]
    Quote,
    #[strum(serialize = "code")]
    Code,
    #[strum(serialize = "list")]
    List,
    #[strum(serialize = "listitem")]
    ListItem,
    #[strum(serialize = "table")]
    Table,
    #[strum(serialize = "tablerow")]
    TableRow,
    #[strum(serialize = "tablecell")]
    TableCell,
    #[strum(serialize = "link")]
    Link,
    #[strum(serialize = "autolink")]
    AutoLink,
    #[strum(serialize = "collapsible-container")]
    CollapsibleContainer,
    #[strum(serialize = "collapsible-title")]
    CollapsibleTitle,
    #[strum(serialize = "collapsible-content")]
    CollapsibleContent,
    #[strum(serialize = "text")]
    Text,
    #[strum(serialize = "hashtag")]
    Hashtag,
    #[strum(serialize = "code-highlight")]
    CodeHighlight,
    #[strum(serialize = "linebreak")]
    LineBreak,
    #[strum(serialize = "horizontalrule")]
    HorizontalRule,
    #[strum(serialize = "page-break")]
    PageBreak,
    #[strum(serialize = "image")]
    Image,
    #[strum(serialize = "inline-image")]
    InlineImage,
    #[strum(serialize = "video")]
    Video,
    #[strum(serialize = "youtube")]
    YouTube,
    #[strum(serialize = "figma")]
    Figma,
    #[strum(serialize = "tweet")]
    Tweet,
    #[strum(serialize = "equation")]
    Equation,
    #[strum(serialize = "poll")]
    Poll,
    #[strum(serialize = "placeholder")]
    Placeholder,
}

impl NodeType {
    /// The `type` tag as it appears in serialized state.
    pub fn tag(&self) -> &'static str {
        (*self).into()
    }

    /// Look up a node type by its serialized tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        tag.parse().ok()
    }

    /// Container nodes own an ordered list of children. Everything else is a
    /// leaf and rejects children.
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            Self::Root
                | Self::Paragraph
                | Self::Heading
                | Self::Quote
                | Self::Code
                | Self::List
                | Self::ListItem
                | Self::Table
                | Self::TableRow
                | Self::TableCell
                | Self::Link
                | Self::AutoLink
                | Self::CollapsibleContainer
                | Self::CollapsibleTitle
                | Self::CollapsibleContent
        )
    }

    pub fn is_text_like(&self) -> bool {
        matches!(self, Self::Text | Self::Hashtag | Self::CodeHighlight)
    }

    /// Leaves that are rendered by a widget rather than as text.
    pub fn is_decorator(&self) -> bool {
        !self.is_container()
            && !self.is_text_like()
            && !matches!(self, Self::LineBreak | Self::Placeholder)
    }

    /// Nodes that flow inside a paragraph rather than standing as a block.
    pub fn is_inline(&self) -> bool {
        self.is_text_like()
            || matches!(
                self,
                Self::LineBreak
                    | Self::Link
                    | Self::AutoLink
                    | Self::InlineImage
            )
    }
}
