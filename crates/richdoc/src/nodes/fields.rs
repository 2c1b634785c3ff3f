// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Typed access to the fields of one serialized node entry.

use serde_json::{Map, Value};

use crate::error::SchemaError;
use crate::node_type::NodeType;
use crate::tree::Tree;

/// Decodes the nested caption documents carried by media nodes.
///
/// Captions are independent trees, so the deserializer decodes them with the
/// same recovery rules as the outer document and records its own warnings.
pub(crate) trait CaptionReader {
    fn read_caption(&mut self, value: &Value) -> Tree;
}

/// Reader for callers that have no caption context: captions decode to an
/// empty tree.
pub(crate) struct NoCaptions;

impl CaptionReader for NoCaptions {
    fn read_caption(&mut self, _value: &Value) -> Tree {
        Tree::new()
    }
}

pub struct Fields<'a> {
    node_type: NodeType,
    map: &'a Map<String, Value>,
    captions: &'a mut dyn CaptionReader,
}

impl<'a> Fields<'a> {
    pub(crate) fn new(
        node_type: NodeType,
        map: &'a Map<String, Value>,
        captions: &'a mut dyn CaptionReader,
    ) -> Self {
        Self {
            node_type,
            map,
            captions,
        }
    }

    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    /// `null` is treated the same as an absent field.
    fn raw(&self, name: &str) -> Option<&'a Value> {
        self.map.get(name).filter(|v| !v.is_null())
    }

    fn invalid(&self, field: &'static str, reason: &str) -> SchemaError {
        SchemaError::invalid(self.node_type, field, reason)
    }

    pub fn string(&self, field: &'static str) -> Result<&'a str, SchemaError> {
        self.opt_string(field)?.ok_or(SchemaError::MissingField {
            node_type: self.node_type,
            field,
        })
    }

    pub fn opt_string(
        &self,
        field: &'static str,
    ) -> Result<Option<&'a str>, SchemaError> {
        match self.raw(field) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(_) => Err(self.invalid(field, "expected a string")),
        }
    }

    pub fn string_or(
        &self,
        field: &'static str,
        default: &str,
    ) -> Result<String, SchemaError> {
        Ok(self.opt_string(field)?.unwrap_or(default).to_owned())
    }

    pub fn opt_bool(
        &self,
        field: &'static str,
    ) -> Result<Option<bool>, SchemaError> {
        match self.raw(field) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(_) => Err(self.invalid(field, "expected a boolean")),
        }
    }

    pub fn bool_or(
        &self,
        field: &'static str,
        default: bool,
    ) -> Result<bool, SchemaError> {
        Ok(self.opt_bool(field)?.unwrap_or(default))
    }

    /// Non-negative integer. Whole floats such as `1.0` are accepted since
    /// JavaScript producers do not distinguish them.
    pub fn opt_u32(
        &self,
        field: &'static str,
    ) -> Result<Option<u32>, SchemaError> {
        let Some(value) = self.raw(field) else {
            return Ok(None);
        };
        let as_int = value.as_u64().or_else(|| {
            value
                .as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 0.0)
                .map(|f| f as u64)
        });
        match as_int.map(u32::try_from) {
            Some(Ok(n)) => Ok(Some(n)),
            _ => Err(self.invalid(field, "expected a non-negative integer")),
        }
    }

    pub fn u32_or(
        &self,
        field: &'static str,
        default: u32,
    ) -> Result<u32, SchemaError> {
        Ok(self.opt_u32(field)?.unwrap_or(default))
    }

    /// Finite, non-negative number.
    pub fn opt_f64(
        &self,
        field: &'static str,
    ) -> Result<Option<f64>, SchemaError> {
        match self.raw(field) {
            None => Ok(None),
            Some(Value::Number(n)) => match n.as_f64() {
                Some(f) if f.is_finite() && f >= 0.0 => Ok(Some(f)),
                _ => Err(self.invalid(field, "expected a non-negative number")),
            },
            Some(_) => Err(self.invalid(field, "expected a number")),
        }
    }

    pub fn opt_array(
        &self,
        field: &'static str,
    ) -> Result<Option<&'a Vec<Value>>, SchemaError> {
        match self.raw(field) {
            None => Ok(None),
            Some(Value::Array(items)) => Ok(Some(items)),
            Some(_) => Err(self.invalid(field, "expected an array")),
        }
    }

    /// Field holding a closed set of string values.
    pub fn enumerated<T: std::str::FromStr>(
        &self,
        field: &'static str,
    ) -> Result<Option<T>, SchemaError> {
        match self.opt_string(field)? {
            None => Ok(None),
            Some(s) => s
                .parse()
                .map(Some)
                .map_err(|_| self.invalid(field, &format!("unknown value `{s}`"))),
        }
    }

    /// Decode a caption envelope (`{"editorState": {...}}`). A missing
    /// caption is an empty tree.
    pub fn caption(
        &mut self,
        field: &'static str,
    ) -> Result<Tree, SchemaError> {
        match self.raw(field) {
            None => Ok(Tree::new()),
            Some(value @ Value::Object(_)) => {
                Ok(self.captions.read_caption(value))
            }
            Some(_) => Err(self.invalid(field, "expected an object")),
        }
    }
}

/// Build a [`Fields`] over a JSON object for tests.
#[cfg(test)]
pub(crate) fn with_fields<R>(
    node_type: NodeType,
    value: &Value,
    f: impl FnOnce(&mut Fields<'_>) -> R,
) -> R {
    let map = value.as_object().expect("test fields must be an object");
    let mut captions = NoCaptions;
    let mut fields = Fields::new(node_type, map, &mut captions);
    f(&mut fields)
}
