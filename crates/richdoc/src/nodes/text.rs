// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

use std::ops::BitOr;

use serde_json::{Map, Value};
use strum_macros::{EnumString, IntoStaticStr};

use super::fields::Fields;
use crate::error::SchemaError;

/// Inline formatting flags, stored as the bitset used by the serialized
/// editor state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TextFormat(u32);

impl TextFormat {
    pub const BOLD: Self = Self(1);
    pub const ITALIC: Self = Self(1 << 1);
    pub const STRIKETHROUGH: Self = Self(1 << 2);
    pub const UNDERLINE: Self = Self(1 << 3);
    pub const CODE: Self = Self(1 << 4);
    pub const SUBSCRIPT: Self = Self(1 << 5);
    pub const SUPERSCRIPT: Self = Self(1 << 6);
    pub const HIGHLIGHT: Self = Self(1 << 7);

    /// Outermost first: a bold italic run exports as
    /// `<strong><em>..</em></strong>`.
    const TAGS: [(TextFormat, &'static str); 8] = [
        (Self::BOLD, "strong"),
        (Self::ITALIC, "em"),
        (Self::UNDERLINE, "u"),
        (Self::STRIKETHROUGH, "s"),
        (Self::SUBSCRIPT, "sub"),
        (Self::SUPERSCRIPT, "sup"),
        (Self::HIGHLIGHT, "mark"),
        (Self::CODE, "code"),
    ];

    pub const fn empty() -> Self {
        Self(0)
    }

    /// Unknown bits are kept so that they survive a round trip.
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(&self) -> u32 {
        self.0
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub const fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    /// HTML tags for the set flags, outermost first.
    pub fn tags(&self) -> impl Iterator<Item = &'static str> + '_ {
        Self::TAGS
            .iter()
            .filter(move |(flag, _)| self.contains(*flag))
            .map(|(_, tag)| *tag)
    }

    /// The flag an inline HTML tag stands for.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "b" | "strong" => Some(Self::BOLD),
            "i" | "em" => Some(Self::ITALIC),
            "u" => Some(Self::UNDERLINE),
            "s" | "del" | "strike" => Some(Self::STRIKETHROUGH),
            "code" | "kbd" | "samp" => Some(Self::CODE),
            "sub" => Some(Self::SUBSCRIPT),
            "sup" => Some(Self::SUPERSCRIPT),
            "mark" => Some(Self::HIGHLIGHT),
            _ => None,
        }
    }
}

impl BitOr for TextFormat {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, EnumString, IntoStaticStr,
)]
pub enum TextMode {
    #[default]
    #[strum(serialize = "normal")]
    Normal,
    #[strum(serialize = "token")]
    Token,
    #[strum(serialize = "segmented")]
    Segmented,
}

/// Payload shared by text-like leaves (`text`, `hashtag`, and the text part of
/// `code-highlight`).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TextNode {
    pub text: String,
    pub format: TextFormat,
    /// Inline CSS kept for round trips only. It is never exported.
    pub style: String,
    pub mode: TextMode,
    pub detail: u32,
}

impl TextNode {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_format(mut self, format: TextFormat) -> Self {
        self.format = format;
        self
    }

    pub fn has_format(&self, format: TextFormat) -> bool {
        self.format.contains(format)
    }

    pub fn toggle_format(&mut self, format: TextFormat) {
        if self.format.contains(format) {
            self.format.remove(format);
        } else {
            self.format.insert(format);
        }
    }

    pub(crate) fn read(f: &mut Fields<'_>) -> Result<Self, SchemaError> {
        Ok(Self {
            text: f.string("text")?.to_owned(),
            format: TextFormat::from_bits(f.u32_or("format", 0)?),
            style: f.string_or("style", "")?,
            mode: f.enumerated("mode")?.unwrap_or_default(),
            detail: f.u32_or("detail", 0)?,
        })
    }

    pub(crate) fn write(&self, map: &mut Map<String, Value>) {
        let mode: &'static str = self.mode.into();
        map.insert("text".into(), self.text.clone().into());
        map.insert("format".into(), self.format.bits().into());
        map.insert("style".into(), self.style.clone().into());
        map.insert("mode".into(), mode.into());
        map.insert("detail".into(), self.detail.into());
    }
}

/// A token produced by syntax highlighting inside a code block.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CodeHighlight {
    pub text: TextNode,
    pub highlight_type: Option<String>,
}

impl CodeHighlight {
    pub(crate) fn read(f: &mut Fields<'_>) -> Result<Self, SchemaError> {
        Ok(Self {
            text: TextNode::read(f)?,
            highlight_type: f.opt_string("highlightType")?.map(str::to_owned),
        })
    }

    pub(crate) fn write(&self, map: &mut Map<String, Value>) {
        self.text.write(map);
        if let Some(highlight_type) = &self.highlight_type {
            map.insert("highlightType".into(), highlight_type.clone().into());
        }
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;
    use crate::nodes::fields::with_fields;
    use crate::NodeType;

    #[test]
    fn tags_are_listed_outermost_first() {
        let format =
            TextFormat::CODE | TextFormat::BOLD | TextFormat::ITALIC;
        let tags: Vec<_> = format.tags().collect();
        assert_eq!(tags, vec!["strong", "em", "code"]);
    }

    #[test]
    fn toggling_a_format_twice_restores_it() {
        let mut text = TextNode::new("x");
        text.toggle_format(TextFormat::UNDERLINE);
        assert!(text.has_format(TextFormat::UNDERLINE));
        text.toggle_format(TextFormat::UNDERLINE);
        assert!(text.format.is_empty());
    }

    #[test]
    fn reading_text_applies_defaults() {
        let text = with_fields(NodeType::Text, &json!({"text": "hi"}), |f| {
            TextNode::read(f)
        })
        .unwrap();
        assert_eq!(text, TextNode::new("hi"));
    }

    #[test]
    fn unknown_mode_is_a_schema_error() {
        let err = with_fields(
            NodeType::Text,
            &json!({"text": "hi", "mode": "shouty"}),
            |f| TextNode::read(f),
        )
        .unwrap_err();
        assert_eq!(err.field(), Some("mode"));
    }

    #[test]
    fn unknown_format_bits_survive() {
        let text = with_fields(
            NodeType::Text,
            &json!({"text": "hi", "format": 1024 | 1}),
            |f| TextNode::read(f),
        )
        .unwrap();
        assert!(text.has_format(TextFormat::BOLD));
        assert_eq!(text.format.bits(), 1025);
    }
}
