// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! The closed table of node types: how each one is read from a serialized
//! entry and how it is exported to HTML.

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use serde_json::Value;

use crate::error::{ExportError, SchemaError};
use crate::html::exporter::ExportContext;
use crate::html::rules;
use crate::node_type::NodeType;
use crate::nodes::fields::{CaptionReader, NoCaptions};
use crate::nodes::{
    Code, CodeHighlight, Collapsible, ElementAttrs, Equation, Fields, Figma,
    Heading, Image, InlineImage, Link, List, ListItem, Node, Poll, TableCell,
    TableRow, TextNode, Tweet, Video, YouTube,
};

/// Validate a serialized entry and build the node it describes.
pub type ImportFn = fn(&mut Fields<'_>) -> Result<Node, SchemaError>;

/// Produce the HTML of one node, given the HTML of its children.
pub type ExportRule =
    fn(&Node, &ExportContext<'_>, &str) -> Result<String, ExportError>;

#[derive(Clone, Copy)]
pub struct NodeSpec {
    pub node_type: NodeType,
    /// Latest schema revision of the entry. Older entries are migrated on
    /// import, newer ones are rejected.
    pub version: u32,
    /// `None` for types that never appear as a serialized entry of their own.
    pub import: Option<ImportFn>,
    pub export_html: ExportRule,
}

impl fmt::Debug for NodeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeSpec")
            .field("node_type", &self.node_type)
            .field("version", &self.version)
            .field("importable", &self.import.is_some())
            .finish()
    }
}

fn spec(
    node_type: NodeType,
    import: ImportFn,
    export_html: ExportRule,
) -> NodeSpec {
    NodeSpec {
        node_type,
        version: 1,
        import: Some(import),
        export_html,
    }
}

static STANDARD: Lazy<Registry> = Lazy::new(Registry::build_standard);

/// Immutable lookup table from [`NodeType`] to [`NodeSpec`].
#[derive(Clone, Debug)]
pub struct Registry {
    specs: HashMap<NodeType, NodeSpec>,
}

impl Registry {
    /// The registry with every built-in node type.
    pub fn standard() -> &'static Registry {
        &STANDARD
    }

    fn build_standard() -> Self {
        let specs = [
            NodeSpec {
                node_type: NodeType::Root,
                version: 1,
                import: None,
                export_html: rules::root,
            },
            spec(
                NodeType::Paragraph,
                |f| Ok(Node::Paragraph(ElementAttrs::read(f)?)),
                rules::paragraph,
            ),
            spec(
                NodeType::Heading,
                |f| Ok(Node::Heading(Heading::read(f)?)),
                rules::heading,
            ),
            spec(
                NodeType::Quote,
                |f| Ok(Node::Quote(ElementAttrs::read(f)?)),
                rules::quote,
            ),
            spec(
                NodeType::Code,
                |f| Ok(Node::Code(Code::read(f)?)),
                rules::code,
            ),
            spec(
                NodeType::List,
                |f| Ok(Node::List(List::read(f)?)),
                rules::list,
            ),
            spec(
                NodeType::ListItem,
                |f| Ok(Node::ListItem(ListItem::read(f)?)),
                rules::list_item,
            ),
            spec(
                NodeType::Table,
                |f| Ok(Node::Table(ElementAttrs::read(f)?)),
                rules::table,
            ),
            spec(
                NodeType::TableRow,
                |f| Ok(Node::TableRow(TableRow::read(f)?)),
                rules::table_row,
            ),
            spec(
                NodeType::TableCell,
                |f| Ok(Node::TableCell(TableCell::read(f)?)),
                rules::table_cell,
            ),
            spec(
                NodeType::Link,
                |f| Ok(Node::Link(Link::read(f)?)),
                rules::link,
            ),
            spec(
                NodeType::AutoLink,
                |f| Ok(Node::AutoLink(Link::read(f)?)),
                rules::link,
            ),
            spec(
                NodeType::CollapsibleContainer,
                |f| Ok(Node::CollapsibleContainer(Collapsible::read(f)?)),
                rules::collapsible_container,
            ),
            spec(
                NodeType::CollapsibleTitle,
                |f| Ok(Node::CollapsibleTitle(ElementAttrs::read(f)?)),
                rules::collapsible_title,
            ),
            spec(
                NodeType::CollapsibleContent,
                |f| Ok(Node::CollapsibleContent(ElementAttrs::read(f)?)),
                rules::collapsible_content,
            ),
            spec(
                NodeType::Text,
                |f| Ok(Node::Text(TextNode::read(f)?)),
                rules::text,
            ),
            spec(
                NodeType::Hashtag,
                |f| Ok(Node::Hashtag(TextNode::read(f)?)),
                rules::text,
            ),
            spec(
                NodeType::CodeHighlight,
                |f| Ok(Node::CodeHighlight(CodeHighlight::read(f)?)),
                rules::code_highlight,
            ),
            spec(
                NodeType::LineBreak,
                |_| Ok(Node::LineBreak),
                rules::line_break,
            ),
            spec(
                NodeType::HorizontalRule,
                |_| Ok(Node::HorizontalRule),
                rules::horizontal_rule,
            ),
            spec(
                NodeType::PageBreak,
                |_| Ok(Node::PageBreak),
                rules::page_break,
            ),
            spec(
                NodeType::Image,
                |f| Ok(Node::Image(Image::read(f)?)),
                rules::image,
            ),
            spec(
                NodeType::InlineImage,
                |f| Ok(Node::InlineImage(InlineImage::read(f)?)),
                rules::inline_image,
            ),
            NodeSpec {
                // Revision 2 added `sourceKind`.
                version: 2,
                ..spec(
                    NodeType::Video,
                    |f| Ok(Node::Video(Video::read(f)?)),
                    rules::video,
                )
            },
            spec(
                NodeType::YouTube,
                |f| Ok(Node::YouTube(YouTube::read(f)?)),
                rules::youtube,
            ),
            spec(
                NodeType::Figma,
                |f| Ok(Node::Figma(Figma::read(f)?)),
                rules::figma,
            ),
            spec(
                NodeType::Tweet,
                |f| Ok(Node::Tweet(Tweet::read(f)?)),
                rules::tweet,
            ),
            spec(
                NodeType::Equation,
                |f| Ok(Node::Equation(Equation::read(f)?)),
                rules::equation,
            ),
            spec(
                NodeType::Poll,
                |f| Ok(Node::Poll(Poll::read(f)?)),
                rules::poll,
            ),
            NodeSpec {
                node_type: NodeType::Placeholder,
                version: 1,
                import: None,
                export_html: rules::placeholder,
            },
        ];
        Self {
            specs: specs.into_iter().map(|s| (s.node_type, s)).collect(),
        }
    }

    pub fn get(&self, node_type: NodeType) -> Option<&NodeSpec> {
        self.specs.get(&node_type)
    }

    /// Schema revision written for `node_type`.
    pub fn version(&self, node_type: NodeType) -> u32 {
        self.get(node_type).map(|s| s.version).unwrap_or(1)
    }

    pub fn spec_for_tag(&self, tag: &str) -> Result<&NodeSpec, SchemaError> {
        NodeType::from_tag(tag)
            .and_then(|node_type| self.get(node_type))
            .ok_or_else(|| SchemaError::UnknownType(tag.to_owned()))
    }

    /// A copy of this registry with the export rule of `node_type` replaced.
    pub fn with_export_rule(
        &self,
        node_type: NodeType,
        rule: ExportRule,
    ) -> Self {
        let mut registry = self.clone();
        if let Some(spec) = registry.specs.get_mut(&node_type) {
            spec.export_html = rule;
        }
        registry
    }

    /// A copy of this registry that writes and accepts `version` for
    /// `node_type`.
    pub fn with_version(&self, node_type: NodeType, version: u32) -> Self {
        let mut registry = self.clone();
        if let Some(spec) = registry.specs.get_mut(&node_type) {
            spec.version = version;
        }
        registry
    }

    /// Check a serialized entry (children are not looked at).
    pub fn validate(&self, entry: &Value) -> Result<(), SchemaError> {
        self.instantiate(entry).map(|_| ())
    }

    /// Build the node described by a serialized entry. Captions are not
    /// decoded; use the deserializer for whole documents.
    pub fn instantiate(&self, entry: &Value) -> Result<Node, SchemaError> {
        self.instantiate_with(entry, &mut NoCaptions)
    }

    pub(crate) fn instantiate_with(
        &self,
        entry: &Value,
        captions: &mut dyn CaptionReader,
    ) -> Result<Node, SchemaError> {
        let map = entry.as_object().ok_or(SchemaError::NotAnObject)?;
        let tag = match map.get("type") {
            Some(Value::String(tag)) => tag,
            _ => return Err(SchemaError::MissingType),
        };
        let spec = self.spec_for_tag(tag)?;
        let version = match map.get("version") {
            None | Some(Value::Null) => 1,
            Some(v) => v.as_u64().ok_or_else(|| {
                SchemaError::invalid(
                    spec.node_type,
                    "version",
                    "expected a non-negative integer",
                )
            })?,
        };
        if version > u64::from(spec.version) {
            return Err(SchemaError::UnsupportedVersion {
                node_type: spec.node_type,
                version,
                supported: spec.version,
            });
        }
        let import = spec
            .import
            .ok_or(SchemaError::NotInstantiable(spec.node_type))?;
        let mut fields = Fields::new(spec.node_type, map, captions);
        import(&mut fields)
    }

    /// Run the export rule of `node`.
    pub fn export(
        &self,
        node: &Node,
        ctx: &ExportContext<'_>,
        children_html: &str,
    ) -> Result<String, ExportError> {
        let node_type = node.node_type();
        let spec = self.get(node_type).ok_or_else(|| {
            ExportError::Rule(format!("no export rule for `{node_type}`"))
        })?;
        (spec.export_html)(node, ctx, children_html)
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;
    use strum::IntoEnumIterator;

    use super::*;
    use crate::nodes::HeadingTag;

    #[test]
    fn every_node_type_is_registered() {
        let registry = Registry::standard();
        for node_type in NodeType::iter() {
            assert!(registry.get(node_type).is_some(), "{node_type}");
        }
    }

    #[test]
    fn unknown_tags_are_schema_errors() {
        assert_eq!(
            Registry::standard().validate(&json!({"type": "carousel"})),
            Err(SchemaError::UnknownType("carousel".into()))
        );
    }

    #[test]
    fn entries_without_a_type_are_rejected() {
        assert_eq!(
            Registry::standard().validate(&json!({"text": "hi"})),
            Err(SchemaError::MissingType)
        );
        assert_eq!(
            Registry::standard().validate(&json!("hi")),
            Err(SchemaError::NotAnObject)
        );
    }

    #[test]
    fn root_is_not_instantiable() {
        assert_eq!(
            Registry::standard().validate(&json!({"type": "root"})),
            Err(SchemaError::NotInstantiable(NodeType::Root))
        );
    }

    #[test]
    fn newer_versions_are_rejected() {
        assert_eq!(
            Registry::standard()
                .validate(&json!({"type": "paragraph", "version": 9})),
            Err(SchemaError::UnsupportedVersion {
                node_type: NodeType::Paragraph,
                version: 9,
                supported: 1
            })
        );
    }

    #[test]
    fn missing_required_fields_name_the_field() {
        assert_eq!(
            Registry::standard().validate(&json!({"type": "heading"})),
            Err(SchemaError::MissingField {
                node_type: NodeType::Heading,
                field: "tag"
            })
        );
    }

    #[test]
    fn instantiate_builds_typed_nodes() {
        let node = Registry::standard()
            .instantiate(&json!({"type": "heading", "tag": "h2", "children": []}))
            .unwrap();
        assert_eq!(node, Node::heading(HeadingTag::H2));
    }

    #[test]
    fn export_rules_can_be_overridden() {
        fn shout(
            _: &Node,
            _: &ExportContext<'_>,
            children: &str,
        ) -> Result<String, ExportError> {
            Ok(children.to_uppercase())
        }
        let registry =
            Registry::standard().with_export_rule(NodeType::Paragraph, shout);
        let ours = registry.get(NodeType::Paragraph).unwrap().export_html;
        let standard = Registry::standard()
            .get(NodeType::Paragraph)
            .unwrap()
            .export_html;
        assert_ne!(ours as usize, standard as usize);
    }
}
