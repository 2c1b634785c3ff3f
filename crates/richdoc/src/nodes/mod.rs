// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Typed node payloads. Each variant of [`Node`] corresponds to exactly one
//! [`NodeType`].

pub mod element;
pub mod embed;
pub(crate) mod fields;
pub mod media;
pub mod text;

use serde_json::{Map, Value};

pub use self::element::{
    Code, Collapsible, Direction, ElementAttrs, ElementFormat, HeaderState,
    Heading, HeadingTag, Link, List, ListItem, ListType, TableCell, TableRow,
};
pub use self::embed::{Equation, Figma, Poll, PollOption, Tweet, YouTube};
pub use self::fields::Fields;
pub use self::media::{
    Caption, Dimension, Image, ImagePosition, InlineImage, SourceKind, Video,
};
pub use self::text::{CodeHighlight, TextFormat, TextMode, TextNode};
use crate::node_type::NodeType;
use crate::registry::Registry;

/// Stand-in for a serialized entry that could not be read. The entry is kept
/// as-is so that saving the document does not lose it.
#[derive(Clone, Debug, PartialEq)]
pub struct Placeholder {
    pub original: Value,
    pub reason: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Root(ElementAttrs),
    Paragraph(ElementAttrs),
    Heading(Heading),
    Quote(ElementAttrs),
    Code(Code),
    List(List),
    ListItem(ListItem),
    Table(ElementAttrs),
    TableRow(TableRow),
    TableCell(TableCell),
    Link(Link),
    AutoLink(Link),
    CollapsibleContainer(Collapsible),
    CollapsibleTitle(ElementAttrs),
    CollapsibleContent(ElementAttrs),
    Text(TextNode),
    Hashtag(TextNode),
    CodeHighlight(CodeHighlight),
    LineBreak,
    HorizontalRule,
    PageBreak,
    Image(Image),
    InlineImage(InlineImage),
    Video(Video),
    YouTube(YouTube),
    Figma(Figma),
    Tweet(Tweet),
    Equation(Equation),
    Poll(Poll),
    Placeholder(Placeholder),
}

impl Node {
    pub fn paragraph() -> Self {
        Self::Paragraph(ElementAttrs::default())
    }

    pub fn heading(tag: HeadingTag) -> Self {
        Self::Heading(Heading::new(tag))
    }

    pub fn quote() -> Self {
        Self::Quote(ElementAttrs::default())
    }

    pub fn list(list_type: ListType) -> Self {
        Self::List(List::new(list_type))
    }

    pub fn list_item() -> Self {
        Self::ListItem(ListItem::default())
    }

    pub fn table() -> Self {
        Self::Table(ElementAttrs::default())
    }

    pub fn table_row() -> Self {
        Self::TableRow(TableRow::default())
    }

    pub fn table_cell() -> Self {
        Self::TableCell(TableCell::default())
    }

    pub fn link(url: impl Into<String>) -> Self {
        Self::Link(Link::new(url))
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(TextNode::new(text))
    }

    pub fn formatted_text(text: impl Into<String>, format: TextFormat) -> Self {
        Self::Text(TextNode::new(text).with_format(format))
    }

    pub fn video(src: impl Into<String>) -> Self {
        Self::Video(Video::new(src))
    }

    pub fn image(src: impl Into<String>, alt_text: impl Into<String>) -> Self {
        Self::Image(Image::new(src, alt_text))
    }

    pub fn node_type(&self) -> NodeType {
        match self {
            Self::Root(_) => NodeType::Root,
            Self::Paragraph(_) => NodeType::Paragraph,
            Self::Heading(_) => NodeType::Heading,
            Self::Quote(_) => NodeType::Quote,
            Self::Code(_) => NodeType::Code,
            Self::List(_) => NodeType::List,
            Self::ListItem(_) => NodeType::ListItem,
            Self::Table(_) => NodeType::Table,
            Self::TableRow(_) => NodeType::TableRow,
            Self::TableCell(_) => NodeType::TableCell,
            Self::Link(_) => NodeType::Link,
            Self::AutoLink(_) => NodeType::AutoLink,
            Self::CollapsibleContainer(_) => NodeType::CollapsibleContainer,
            Self::CollapsibleTitle(_) => NodeType::CollapsibleTitle,
            Self::CollapsibleContent(_) => NodeType::CollapsibleContent,
            Self::Text(_) => NodeType::Text,
            Self::Hashtag(_) => NodeType::Hashtag,
            Self::CodeHighlight(_) => NodeType::CodeHighlight,
            Self::LineBreak => NodeType::LineBreak,
            Self::HorizontalRule => NodeType::HorizontalRule,
            Self::PageBreak => NodeType::PageBreak,
            Self::Image(_) => NodeType::Image,
            Self::InlineImage(_) => NodeType::InlineImage,
            Self::Video(_) => NodeType::Video,
            Self::YouTube(_) => NodeType::YouTube,
            Self::Figma(_) => NodeType::Figma,
            Self::Tweet(_) => NodeType::Tweet,
            Self::Equation(_) => NodeType::Equation,
            Self::Poll(_) => NodeType::Poll,
            Self::Placeholder(_) => NodeType::Placeholder,
        }
    }

    pub fn is_container(&self) -> bool {
        self.node_type().is_container()
    }

    /// Element fields of a container node.
    pub fn element(&self) -> Option<&ElementAttrs> {
        match self {
            Self::Root(e)
            | Self::Paragraph(e)
            | Self::Quote(e)
            | Self::Table(e)
            | Self::CollapsibleTitle(e)
            | Self::CollapsibleContent(e) => Some(e),
            Self::Heading(h) => Some(&h.element),
            Self::Code(c) => Some(&c.element),
            Self::List(l) => Some(&l.element),
            Self::ListItem(i) => Some(&i.element),
            Self::TableRow(r) => Some(&r.element),
            Self::TableCell(c) => Some(&c.element),
            Self::Link(l) | Self::AutoLink(l) => Some(&l.element),
            Self::CollapsibleContainer(c) => Some(&c.element),
            _ => None,
        }
    }

    /// Payload of text-like leaves.
    pub fn text_node(&self) -> Option<&TextNode> {
        match self {
            Self::Text(t) | Self::Hashtag(t) => Some(t),
            Self::CodeHighlight(c) => Some(&c.text),
            _ => None,
        }
    }

    /// Caption document of media nodes.
    pub fn caption(&self) -> Option<&Caption> {
        match self {
            Self::Image(i) => Some(&i.caption),
            Self::InlineImage(i) => Some(&i.caption),
            Self::Video(v) => Some(&v.caption),
            _ => None,
        }
    }

    pub fn caption_mut(&mut self) -> Option<&mut Caption> {
        match self {
            Self::Image(i) => Some(&mut i.caption),
            Self::InlineImage(i) => Some(&mut i.caption),
            Self::Video(v) => Some(&mut v.caption),
            _ => None,
        }
    }

    /// Write the type-specific fields of this node into a serialized entry.
    /// Captions are written with `registry` as well.
    pub(crate) fn write_fields(
        &self,
        map: &mut Map<String, Value>,
        registry: &Registry,
    ) {
        match self {
            Self::Root(e)
            | Self::Paragraph(e)
            | Self::Quote(e)
            | Self::Table(e)
            | Self::CollapsibleTitle(e)
            | Self::CollapsibleContent(e) => e.write(map),
            Self::Heading(h) => h.write(map),
            Self::Code(c) => c.write(map),
            Self::List(l) => l.write(map),
            Self::ListItem(i) => i.write(map),
            Self::TableRow(r) => r.write(map),
            Self::TableCell(c) => c.write(map),
            Self::Link(l) | Self::AutoLink(l) => l.write(map),
            Self::CollapsibleContainer(c) => c.write(map),
            Self::Text(t) | Self::Hashtag(t) => t.write(map),
            Self::CodeHighlight(c) => c.write(map),
            Self::LineBreak | Self::HorizontalRule | Self::PageBreak => {}
            Self::Image(i) => i.write(map, registry),
            Self::InlineImage(i) => i.write(map, registry),
            Self::Video(v) => v.write(map, registry),
            Self::YouTube(y) => y.write(map),
            Self::Figma(f) => f.write(map),
            Self::Tweet(t) => t.write(map),
            Self::Equation(e) => e.write(map),
            Self::Poll(p) => p.write(map),
            // Written verbatim by the serializer.
            Self::Placeholder(_) => {}
        }
    }

    /// One-line summary used by the tree outline.
    pub fn describe(&self) -> String {
        let tag = self.node_type().tag();
        match self {
            Self::Heading(h) => format!("{tag} {}", h.tag.as_str()),
            Self::List(l) => {
                let list_type: &'static str = l.list_type.into();
                format!("{tag} {list_type}")
            }
            Self::Link(l) | Self::AutoLink(l) => format!("{tag} {}", l.url),
            Self::Text(t) | Self::Hashtag(t) if t.format.is_empty() => {
                format!("\"{}\"", t.text)
            }
            Self::Text(t) | Self::Hashtag(t) => {
                format!("\"{}\" [{}]", t.text, t.format.bits())
            }
            Self::CodeHighlight(c) => format!("\"{}\"", c.text.text),
            Self::Image(i) => format!("{tag} {}", i.src),
            Self::InlineImage(i) => format!("{tag} {}", i.src),
            Self::Video(v) => {
                let kind: &'static str = v.source_kind.into();
                format!("{tag} {} ({kind})", v.src)
            }
            Self::YouTube(y) => format!("{tag} {}", y.video_id),
            Self::Figma(f) => format!("{tag} {}", f.document_id),
            Self::Tweet(t) => format!("{tag} {}", t.id),
            Self::Equation(e) => format!("{tag} {}", e.equation),
            Self::Poll(p) => format!("{tag} {}", p.question),
            Self::Placeholder(p) => format!("{tag} ({})", p.reason),
            _ => tag.to_owned(),
        }
    }
}

#[cfg(test)]
mod test {
    use strum::IntoEnumIterator;

    use super::*;
    use crate::tests::testutils_tree::sample_node;

    #[test]
    fn every_node_type_has_a_variant() {
        for node_type in NodeType::iter() {
            assert_eq!(sample_node(node_type).node_type(), node_type);
        }
    }

    #[test]
    fn element_fields_exist_exactly_on_containers() {
        for node_type in NodeType::iter() {
            let node = sample_node(node_type);
            assert_eq!(
                node.element().is_some(),
                node_type.is_container(),
                "{node_type}"
            );
        }
    }

    #[test]
    fn only_media_carries_captions() {
        assert!(Node::video("a.mp4").caption().is_some());
        assert!(Node::image("a.png", "").caption().is_some());
        assert!(Node::paragraph().caption().is_none());
    }

    #[test]
    fn describe_is_compact() {
        assert_eq!(Node::text("hi").describe(), "\"hi\"");
        assert_eq!(Node::heading(HeadingTag::H2).describe(), "heading h2");
        assert_eq!(
            Node::video("https://cdn.example.com/a.mp4").describe(),
            "video https://cdn.example.com/a.mp4 (file)"
        );
    }
}
