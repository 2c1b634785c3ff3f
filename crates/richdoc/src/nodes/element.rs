// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Attributes of container nodes.

use serde_json::{Map, Value};
use strum_macros::{EnumString, IntoStaticStr};

use super::fields::Fields;
use crate::error::SchemaError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumString, IntoStaticStr)]
pub enum Direction {
    #[strum(serialize = "ltr")]
    Ltr,
    #[strum(serialize = "rtl")]
    Rtl,
}

/// Block alignment.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, EnumString, IntoStaticStr,
)]
pub enum ElementFormat {
    #[default]
    #[strum(serialize = "")]
    Unset,
    #[strum(serialize = "left")]
    Left,
    #[strum(serialize = "center")]
    Center,
    #[strum(serialize = "right")]
    Right,
    #[strum(serialize = "justify")]
    Justify,
    #[strum(serialize = "start")]
    Start,
    #[strum(serialize = "end")]
    End,
}

impl ElementFormat {
    /// Older documents stored alignment as an index.
    fn from_index(index: u32) -> Option<Self> {
        Some(match index {
            0 => Self::Unset,
            1 => Self::Left,
            2 => Self::Center,
            3 => Self::Right,
            4 => Self::Justify,
            5 => Self::Start,
            6 => Self::End,
            _ => return None,
        })
    }

    pub(crate) fn read(f: &Fields<'_>) -> Result<Self, SchemaError> {
        match f.enumerated::<Self>("format") {
            Ok(format) => Ok(format.unwrap_or_default()),
            Err(err) => match f.opt_u32("format") {
                Ok(Some(index)) => Self::from_index(index).ok_or(err),
                _ => Err(err),
            },
        }
    }
}

/// Fields every container node carries. They are written only when they
/// differ from the defaults.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ElementAttrs {
    pub direction: Option<Direction>,
    pub format: ElementFormat,
    pub indent: u32,
}

impl ElementAttrs {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    pub(crate) fn read(f: &Fields<'_>) -> Result<Self, SchemaError> {
        Ok(Self {
            direction: f.enumerated("direction")?,
            format: ElementFormat::read(f)?,
            indent: f.u32_or("indent", 0)?,
        })
    }

    pub(crate) fn write(&self, map: &mut Map<String, Value>) {
        if let Some(direction) = self.direction {
            let direction: &'static str = direction.into();
            map.insert("direction".into(), direction.into());
        }
        if self.format != ElementFormat::Unset {
            let format: &'static str = self.format.into();
            map.insert("format".into(), format.into());
        }
        if self.indent != 0 {
            map.insert("indent".into(), self.indent.into());
        }
    }
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    EnumString,
    IntoStaticStr,
)]
pub enum HeadingTag {
    #[strum(serialize = "h1")]
    H1,
    #[strum(serialize = "h2")]
    H2,
    #[strum(serialize = "h3")]
    H3,
    #[strum(serialize = "h4")]
    H4,
    #[strum(serialize = "h5")]
    H5,
    #[strum(serialize = "h6")]
    H6,
}

impl HeadingTag {
    pub fn from_level(level: u8) -> Option<Self> {
        Some(match level {
            1 => Self::H1,
            2 => Self::H2,
            3 => Self::H3,
            4 => Self::H4,
            5 => Self::H5,
            6 => Self::H6,
            _ => return None,
        })
    }

    pub fn level(&self) -> u8 {
        *self as u8 + 1
    }

    pub fn as_str(&self) -> &'static str {
        (*self).into()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Heading {
    pub tag: HeadingTag,
    pub element: ElementAttrs,
}

impl Heading {
    pub fn new(tag: HeadingTag) -> Self {
        Self {
            tag,
            element: ElementAttrs::default(),
        }
    }

    pub(crate) fn read(f: &mut Fields<'_>) -> Result<Self, SchemaError> {
        let tag = f.enumerated("tag")?.ok_or(SchemaError::MissingField {
            node_type: f.node_type(),
            field: "tag",
        })?;
        Ok(Self {
            tag,
            element: ElementAttrs::read(f)?,
        })
    }

    pub(crate) fn write(&self, map: &mut Map<String, Value>) {
        map.insert("tag".into(), self.tag.as_str().into());
        self.element.write(map);
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Code {
    pub language: Option<String>,
    pub element: ElementAttrs,
}

impl Code {
    pub(crate) fn read(f: &mut Fields<'_>) -> Result<Self, SchemaError> {
        Ok(Self {
            language: f.opt_string("language")?.map(str::to_owned),
            element: ElementAttrs::read(f)?,
        })
    }

    pub(crate) fn write(&self, map: &mut Map<String, Value>) {
        if let Some(language) = &self.language {
            map.insert("language".into(), language.clone().into());
        }
        self.element.write(map);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumString, IntoStaticStr)]
pub enum ListType {
    #[strum(serialize = "bullet")]
    Bullet,
    #[strum(serialize = "number")]
    Number,
    #[strum(serialize = "check")]
    Check,
}

impl ListType {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Number => "ol",
            Self::Bullet | Self::Check => "ul",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct List {
    pub list_type: ListType,
    pub start: u32,
    pub element: ElementAttrs,
}

impl List {
    pub fn new(list_type: ListType) -> Self {
        Self {
            list_type,
            start: 1,
            element: ElementAttrs::default(),
        }
    }

    pub(crate) fn read(f: &mut Fields<'_>) -> Result<Self, SchemaError> {
        let list_type =
            f.enumerated("listType")?.ok_or(SchemaError::MissingField {
                node_type: f.node_type(),
                field: "listType",
            })?;
        Ok(Self {
            list_type,
            start: f.u32_or("start", 1)?,
            element: ElementAttrs::read(f)?,
        })
    }

    pub(crate) fn write(&self, map: &mut Map<String, Value>) {
        let list_type: &'static str = self.list_type.into();
        map.insert("listType".into(), list_type.into());
        map.insert("start".into(), self.start.into());
        map.insert("tag".into(), self.list_type.tag().into());
        self.element.write(map);
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ListItem {
    pub value: u32,
    /// Only meaningful inside a check list.
    pub checked: Option<bool>,
    pub element: ElementAttrs,
}

impl Default for ListItem {
    fn default() -> Self {
        Self {
            value: 1,
            checked: None,
            element: ElementAttrs::default(),
        }
    }
}

impl ListItem {
    pub(crate) fn read(f: &mut Fields<'_>) -> Result<Self, SchemaError> {
        Ok(Self {
            value: f.u32_or("value", 1)?,
            checked: f.opt_bool("checked")?,
            element: ElementAttrs::read(f)?,
        })
    }

    pub(crate) fn write(&self, map: &mut Map<String, Value>) {
        map.insert("value".into(), self.value.into());
        if let Some(checked) = self.checked {
            map.insert("checked".into(), checked.into());
        }
        self.element.write(map);
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TableRow {
    pub height: Option<f64>,
    pub element: ElementAttrs,
}

impl TableRow {
    pub(crate) fn read(f: &mut Fields<'_>) -> Result<Self, SchemaError> {
        Ok(Self {
            height: f.opt_f64("height")?,
            element: ElementAttrs::read(f)?,
        })
    }

    pub(crate) fn write(&self, map: &mut Map<String, Value>) {
        if let Some(height) = self.height {
            map.insert("height".into(), height.into());
        }
        self.element.write(map);
    }
}

/// Which headers a table cell belongs to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HeaderState(u8);

impl HeaderState {
    pub const NONE: Self = Self(0);
    pub const ROW: Self = Self(1);
    pub const COLUMN: Self = Self(2);
    pub const BOTH: Self = Self(3);

    pub fn is_header(&self) -> bool {
        self.0 != 0
    }

    pub fn bits(&self) -> u8 {
        self.0
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TableCell {
    pub header_state: HeaderState,
    pub col_span: u32,
    pub row_span: u32,
    pub width: Option<f64>,
    pub background_color: Option<String>,
    pub element: ElementAttrs,
}

impl Default for TableCell {
    fn default() -> Self {
        Self {
            header_state: HeaderState::NONE,
            col_span: 1,
            row_span: 1,
            width: None,
            background_color: None,
            element: ElementAttrs::default(),
        }
    }
}

impl TableCell {
    pub fn header(header_state: HeaderState) -> Self {
        Self {
            header_state,
            ..Default::default()
        }
    }

    pub(crate) fn read(f: &mut Fields<'_>) -> Result<Self, SchemaError> {
        let header_state = f.u32_or("headerState", 0)?;
        if header_state > 3 {
            return Err(SchemaError::invalid(
                f.node_type(),
                "headerState",
                "expected 0 to 3",
            ));
        }
        let col_span = f.u32_or("colSpan", 1)?;
        let row_span = f.u32_or("rowSpan", 1)?;
        if col_span == 0 || row_span == 0 {
            return Err(SchemaError::invalid(
                f.node_type(),
                if col_span == 0 { "colSpan" } else { "rowSpan" },
                "spans start at 1",
            ));
        }
        Ok(Self {
            header_state: HeaderState(header_state as u8),
            col_span,
            row_span,
            width: f.opt_f64("width")?,
            background_color: f
                .opt_string("backgroundColor")?
                .map(str::to_owned),
            element: ElementAttrs::read(f)?,
        })
    }

    pub(crate) fn write(&self, map: &mut Map<String, Value>) {
        map.insert("headerState".into(), self.header_state.bits().into());
        map.insert("colSpan".into(), self.col_span.into());
        map.insert("rowSpan".into(), self.row_span.into());
        if let Some(width) = self.width {
            map.insert("width".into(), width.into());
        }
        if let Some(color) = &self.background_color {
            map.insert("backgroundColor".into(), color.clone().into());
        }
        self.element.write(map);
    }
}

/// Target of `link` and `autolink` nodes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Link {
    pub url: String,
    pub rel: Option<String>,
    pub target: Option<String>,
    pub title: Option<String>,
    pub element: ElementAttrs,
}

impl Link {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub(crate) fn read(f: &mut Fields<'_>) -> Result<Self, SchemaError> {
        Ok(Self {
            url: f.string("url")?.to_owned(),
            rel: f.opt_string("rel")?.map(str::to_owned),
            target: f.opt_string("target")?.map(str::to_owned),
            title: f.opt_string("title")?.map(str::to_owned),
            element: ElementAttrs::read(f)?,
        })
    }

    pub(crate) fn write(&self, map: &mut Map<String, Value>) {
        map.insert("url".into(), self.url.clone().into());
        for (name, value) in [
            ("rel", &self.rel),
            ("target", &self.target),
            ("title", &self.title),
        ] {
            if let Some(value) = value {
                map.insert(name.into(), value.clone().into());
            }
        }
        self.element.write(map);
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Collapsible {
    pub open: bool,
    pub element: ElementAttrs,
}

impl Default for Collapsible {
    fn default() -> Self {
        Self {
            open: true,
            element: ElementAttrs::default(),
        }
    }
}

impl Collapsible {
    pub(crate) fn read(f: &mut Fields<'_>) -> Result<Self, SchemaError> {
        Ok(Self {
            open: f.bool_or("open", true)?,
            element: ElementAttrs::read(f)?,
        })
    }

    pub(crate) fn write(&self, map: &mut Map<String, Value>) {
        map.insert("open".into(), self.open.into());
        self.element.write(map);
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;
    use crate::nodes::fields::with_fields;
    use crate::NodeType;

    #[test]
    fn legacy_numeric_alignment_is_migrated() {
        let attrs = with_fields(
            NodeType::Paragraph,
            &json!({"format": 2, "indent": 1}),
            |f| ElementAttrs::read(f),
        )
        .unwrap();
        assert_eq!(attrs.format, ElementFormat::Center);
        assert_eq!(attrs.indent, 1);
    }

    #[test]
    fn default_element_attrs_write_nothing() {
        let mut map = Map::new();
        ElementAttrs::default().write(&mut map);
        assert!(map.is_empty());
    }

    #[test]
    fn heading_requires_a_known_tag() {
        let err = with_fields(NodeType::Heading, &json!({"tag": "h7"}), |f| {
            Heading::read(f)
        })
        .unwrap_err();
        assert_eq!(err.field(), Some("tag"));

        let err = with_fields(NodeType::Heading, &json!({}), |f| {
            Heading::read(f)
        })
        .unwrap_err();
        assert!(matches!(err, SchemaError::MissingField { field: "tag", .. }));
    }

    #[test]
    fn heading_levels() {
        assert_eq!(HeadingTag::H3.level(), 3);
        assert_eq!(HeadingTag::from_level(6), Some(HeadingTag::H6));
        assert_eq!(HeadingTag::from_level(0), None);
    }

    #[test]
    fn zero_span_cells_are_rejected() {
        let err = with_fields(NodeType::TableCell, &json!({"colSpan": 0}), |f| {
            TableCell::read(f)
        })
        .unwrap_err();
        assert_eq!(err.field(), Some("colSpan"));
    }

    #[test]
    fn list_tag_follows_list_type() {
        assert_eq!(ListType::Number.tag(), "ol");
        assert_eq!(ListType::Check.tag(), "ul");
    }
}
