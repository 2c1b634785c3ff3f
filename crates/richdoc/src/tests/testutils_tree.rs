// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Builders for trees and subtrees used across the unit tests.

use serde_json::json;

use crate::error::SchemaError;
use crate::node_type::NodeType;
use crate::nodes::embed::{Equation, Figma, Poll, PollOption, Tweet, YouTube};
use crate::nodes::{
    Caption, Code, CodeHighlight, Collapsible, Dimension, Direction,
    ElementAttrs, ElementFormat, HeaderState, Heading, HeadingTag, Image,
    ImagePosition, InlineImage, Link, List, ListItem, ListType, Node,
    Placeholder, SourceKind, TableCell, TableRow, TextFormat, TextMode,
    TextNode, Video,
};
use crate::tree::{Subtree, Tree};

pub(crate) fn text(content: &str) -> Subtree {
    Subtree::new(Node::text(content))
}

pub(crate) fn bold(content: &str) -> Subtree {
    Subtree::new(Node::formatted_text(content, TextFormat::BOLD))
}

pub(crate) fn paragraph(children: Vec<Subtree>) -> Subtree {
    Subtree::with_children(Node::paragraph(), children)
}

pub(crate) fn heading(tag: HeadingTag, children: Vec<Subtree>) -> Subtree {
    Subtree::with_children(Node::heading(tag), children)
}

pub(crate) fn video(src: &str) -> Subtree {
    Subtree::new(Node::video(src))
}

pub(crate) fn tree(children: Vec<Subtree>) -> Tree {
    Tree::from_subtree(children).unwrap()
}

/// A node of the requested type with non-default attributes where the type
/// has any.
pub(crate) fn sample_node(node_type: NodeType) -> Node {
    let element = ElementAttrs {
        direction: Some(Direction::Rtl),
        format: ElementFormat::Center,
        indent: 2,
    };
    match node_type {
        NodeType::Root => Node::Root(ElementAttrs::default()),
        NodeType::Paragraph => Node::Paragraph(element),
        NodeType::Heading => Node::Heading(Heading {
            tag: HeadingTag::H3,
            element,
        }),
        NodeType::Quote => Node::Quote(element),
        NodeType::Code => Node::Code(Code {
            language: Some("rust".into()),
            element,
        }),
        NodeType::List => Node::List(List {
            list_type: ListType::Number,
            start: 4,
            element,
        }),
        NodeType::ListItem => Node::ListItem(ListItem {
            value: 4,
            checked: Some(true),
            element,
        }),
        NodeType::Table => Node::Table(element),
        NodeType::TableRow => Node::TableRow(TableRow {
            height: Some(32.5),
            element,
        }),
        NodeType::TableCell => Node::TableCell(TableCell {
            header_state: HeaderState::ROW,
            col_span: 2,
            row_span: 1,
            width: Some(120.0),
            background_color: Some("#ffeeee".into()),
            element,
        }),
        NodeType::Link => Node::Link(Link {
            url: "https://example.com/".into(),
            rel: Some("nofollow".into()),
            target: Some("_blank".into()),
            title: Some("Example".into()),
            element,
        }),
        NodeType::AutoLink => Node::AutoLink(Link::new("https://example.org/")),
        NodeType::CollapsibleContainer => {
            Node::CollapsibleContainer(Collapsible {
                open: false,
                element,
            })
        }
        NodeType::CollapsibleTitle => Node::CollapsibleTitle(element),
        NodeType::CollapsibleContent => Node::CollapsibleContent(element),
        NodeType::Text => Node::Text(TextNode {
            text: "Bold & <italic>".into(),
            format: TextFormat::BOLD | TextFormat::ITALIC,
            style: "color: red".into(),
            mode: TextMode::Normal,
            detail: 0,
        }),
        NodeType::Hashtag => Node::Hashtag(TextNode {
            mode: TextMode::Token,
            ..TextNode::new("#live")
        }),
        NodeType::CodeHighlight => Node::CodeHighlight(CodeHighlight {
            text: TextNode::new("fn"),
            highlight_type: Some("keyword".into()),
        }),
        NodeType::LineBreak => Node::LineBreak,
        NodeType::HorizontalRule => Node::HorizontalRule,
        NodeType::PageBreak => Node::PageBreak,
        NodeType::Image => Node::Image(Image {
            width: Dimension::Pixels(640.0),
            height: Dimension::Pixels(480.0),
            show_caption: true,
            caption: Caption::new(tree(vec![paragraph(vec![text(
                "A caption",
            )])])),
            ..Image::new("https://cdn.example.com/a.png", "A picture")
        }),
        NodeType::InlineImage => Node::InlineImage(InlineImage {
            position: Some(ImagePosition::Left),
            ..InlineImage::new("/uploads/b.png", "Inline")
        }),
        NodeType::Video => Node::Video(Video {
            source_kind: SourceKind::Embed,
            autoplay: true,
            muted: true,
            looping: true,
            controls: false,
            show_caption: true,
            caption: Caption::new(tree(vec![paragraph(vec![bold(
                "Live now",
            )])])),
            ..Video::new("https://player.vimeo.com/video/76979871")
                .with_alt_text("Launch stream")
        }),
        NodeType::YouTube => Node::YouTube(YouTube::new("dQw4w9WgXcQ")),
        NodeType::Figma => Node::Figma(Figma::new("AbC123")),
        NodeType::Tweet => Node::Tweet(Tweet::new("1234567890")),
        NodeType::Equation => Node::Equation(Equation::new("e^{i\\pi}+1=0", true)),
        NodeType::Poll => Node::Poll(Poll {
            question: "Tea or coffee?".into(),
            options: vec![
                PollOption {
                    votes: vec!["u1".into()],
                    ..PollOption::new("a", "Tea")
                },
                PollOption::new("b", "Coffee"),
            ],
        }),
        NodeType::Placeholder => Node::Placeholder(Placeholder {
            original: json!({"type": "mystery", "version": 1, "data": [1, 2]}),
            reason: SchemaError::UnknownType("mystery".into()).to_string(),
        }),
    }
}

fn sample(node_type: NodeType, children: Vec<Subtree>) -> Subtree {
    Subtree::with_children(sample_node(node_type), children)
}

fn leaf(node_type: NodeType) -> Subtree {
    Subtree::new(sample_node(node_type))
}

/// A document that uses every node type at least once, in positions where
/// the type is valid.
pub(crate) fn every_node_type() -> Tree {
    tree(vec![
        sample(NodeType::Heading, vec![leaf(NodeType::Text)]),
        sample(
            NodeType::Paragraph,
            vec![
                leaf(NodeType::Text),
                leaf(NodeType::Hashtag),
                leaf(NodeType::LineBreak),
                sample(NodeType::Link, vec![text("a link")]),
                sample(NodeType::AutoLink, vec![text("example.org")]),
                leaf(NodeType::InlineImage),
            ],
        ),
        sample(NodeType::Quote, vec![text("quoted")]),
        sample(NodeType::Code, vec![leaf(NodeType::CodeHighlight)]),
        sample(
            NodeType::List,
            vec![sample(NodeType::ListItem, vec![text("item")])],
        ),
        sample(
            NodeType::Table,
            vec![sample(
                NodeType::TableRow,
                vec![
                    sample(NodeType::TableCell, vec![paragraph(vec![text("h")])]),
                    Subtree::with_children(
                        Node::table_cell(),
                        vec![paragraph(vec![text("c")])],
                    ),
                ],
            )],
        ),
        sample(
            NodeType::CollapsibleContainer,
            vec![
                sample(NodeType::CollapsibleTitle, vec![text("More")]),
                sample(
                    NodeType::CollapsibleContent,
                    vec![paragraph(vec![text("hidden")])],
                ),
            ],
        ),
        leaf(NodeType::HorizontalRule),
        leaf(NodeType::PageBreak),
        leaf(NodeType::Image),
        leaf(NodeType::Video),
        leaf(NodeType::YouTube),
        leaf(NodeType::Figma),
        leaf(NodeType::Tweet),
        leaf(NodeType::Equation),
        leaf(NodeType::Poll),
        leaf(NodeType::Placeholder),
    ])
}
