// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Media leaves: images and videos, each owning a caption document.

use serde_json::{json, Map, Value};
use strum_macros::{EnumString, IntoStaticStr};
use url::Url;

use super::fields::Fields;
use crate::error::SchemaError;
use crate::registry::Registry;
use crate::serializer::serialize;
use crate::tree::Tree;

const VIDEO_FILE_EXTENSIONS: &[&str] =
    &["mp4", "m4v", "webm", "ogv", "ogg", "mov", "mkv", "m3u8", "mpd"];

/// How a video source is played back.
///
/// Decided once when the node is constructed: direct files render as a native
/// `<video>` element, platform pages can only be shown in an `<iframe>`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumString, IntoStaticStr)]
pub enum SourceKind {
    #[strum(serialize = "file")]
    File,
    #[strum(serialize = "embed")]
    Embed,
}

impl SourceKind {
    /// Absolute `http(s)` URLs are platform embeds unless their path names a
    /// video file. Relative paths, `blob:` and `data:` sources are uploads.
    pub fn classify(src: &str) -> Self {
        match Url::parse(src.trim()) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {
                if has_video_extension(url.path()) {
                    Self::File
                } else {
                    Self::Embed
                }
            }
            _ => Self::File,
        }
    }
}

fn has_video_extension(path: &str) -> bool {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| {
            VIDEO_FILE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str())
        })
        .unwrap_or(false)
}

/// A width or height. `Inherit` is stored as `0`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Dimension {
    #[default]
    Inherit,
    Pixels(f64),
}

impl Dimension {
    pub fn pixels(&self) -> Option<f64> {
        match self {
            Self::Inherit => None,
            Self::Pixels(px) => Some(*px),
        }
    }

    pub(crate) fn read(
        f: &Fields<'_>,
        field: &'static str,
    ) -> Result<Self, SchemaError> {
        match f.opt_f64(field) {
            Ok(None) => Ok(Self::Inherit),
            Ok(Some(px)) if px == 0.0 => Ok(Self::Inherit),
            Ok(Some(px)) => Ok(Self::Pixels(px)),
            Err(err) => match f.opt_string(field) {
                Ok(Some("inherit")) => Ok(Self::Inherit),
                _ => Err(err),
            },
        }
    }

    fn to_json(self) -> Value {
        match self {
            Self::Inherit => 0.into(),
            Self::Pixels(px) => px.into(),
        }
    }
}

/// Rich caption of a media node: an independent document with its own key
/// space.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Caption {
    tree: Tree,
}

impl Caption {
    pub fn new(tree: Tree) -> Self {
        Self { tree }
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut Tree {
        &mut self.tree
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub(crate) fn read(
        f: &mut Fields<'_>,
        field: &'static str,
    ) -> Result<Self, SchemaError> {
        Ok(Self::new(f.caption(field)?))
    }

    fn to_json(&self, registry: &Registry) -> Value {
        json!({ "editorState": serialize(&self.tree, registry).into_value() })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Image {
    pub src: String,
    pub alt_text: String,
    pub width: Dimension,
    pub height: Dimension,
    pub max_width: u32,
    pub show_caption: bool,
    pub caption: Caption,
}

impl Image {
    pub fn new(src: impl Into<String>, alt_text: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            alt_text: alt_text.into(),
            width: Dimension::Inherit,
            height: Dimension::Inherit,
            max_width: 500,
            show_caption: false,
            caption: Caption::default(),
        }
    }

    pub fn set_width_and_height(
        &mut self,
        width: Dimension,
        height: Dimension,
    ) {
        self.width = width;
        self.height = height;
    }

    pub(crate) fn read(f: &mut Fields<'_>) -> Result<Self, SchemaError> {
        Ok(Self {
            src: f.string("src")?.to_owned(),
            alt_text: f.string_or("altText", "")?,
            width: Dimension::read(f, "width")?,
            height: Dimension::read(f, "height")?,
            max_width: f.u32_or("maxWidth", 500)?,
            show_caption: f.bool_or("showCaption", false)?,
            caption: Caption::read(f, "caption")?,
        })
    }

    pub(crate) fn write(
        &self,
        map: &mut Map<String, Value>,
        registry: &Registry,
    ) {
        map.insert("src".into(), self.src.clone().into());
        map.insert("altText".into(), self.alt_text.clone().into());
        map.insert("width".into(), self.width.to_json());
        map.insert("height".into(), self.height.to_json());
        map.insert("maxWidth".into(), self.max_width.into());
        map.insert("showCaption".into(), self.show_caption.into());
        map.insert("caption".into(), self.caption.to_json(registry));
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumString, IntoStaticStr)]
pub enum ImagePosition {
    #[strum(serialize = "left")]
    Left,
    #[strum(serialize = "right")]
    Right,
    #[strum(serialize = "full")]
    Full,
}

/// An image that flows inside a paragraph.
#[derive(Clone, Debug, PartialEq)]
pub struct InlineImage {
    pub src: String,
    pub alt_text: String,
    pub width: Dimension,
    pub height: Dimension,
    pub position: Option<ImagePosition>,
    pub show_caption: bool,
    pub caption: Caption,
}

impl InlineImage {
    pub fn new(src: impl Into<String>, alt_text: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            alt_text: alt_text.into(),
            width: Dimension::Inherit,
            height: Dimension::Inherit,
            position: None,
            show_caption: false,
            caption: Caption::default(),
        }
    }

    pub(crate) fn read(f: &mut Fields<'_>) -> Result<Self, SchemaError> {
        Ok(Self {
            src: f.string("src")?.to_owned(),
            alt_text: f.string_or("altText", "")?,
            width: Dimension::read(f, "width")?,
            height: Dimension::read(f, "height")?,
            position: f.enumerated("position")?,
            show_caption: f.bool_or("showCaption", false)?,
            caption: Caption::read(f, "caption")?,
        })
    }

    pub(crate) fn write(
        &self,
        map: &mut Map<String, Value>,
        registry: &Registry,
    ) {
        map.insert("src".into(), self.src.clone().into());
        map.insert("altText".into(), self.alt_text.clone().into());
        map.insert("width".into(), self.width.to_json());
        map.insert("height".into(), self.height.to_json());
        if let Some(position) = self.position {
            let position: &'static str = position.into();
            map.insert("position".into(), position.into());
        }
        map.insert("showCaption".into(), self.show_caption.into());
        map.insert("caption".into(), self.caption.to_json(registry));
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Video {
    pub src: String,
    pub source_kind: SourceKind,
    pub alt_text: String,
    pub width: Dimension,
    pub height: Dimension,
    pub max_width: u32,
    pub show_caption: bool,
    pub captions_enabled: bool,
    pub caption: Caption,
    pub controls: bool,
    pub autoplay: bool,
    pub looping: bool,
    pub muted: bool,
}

impl Video {
    pub fn new(src: impl Into<String>) -> Self {
        let src = src.into();
        Self {
            source_kind: SourceKind::classify(&src),
            src,
            alt_text: String::new(),
            width: Dimension::Inherit,
            height: Dimension::Inherit,
            max_width: 500,
            show_caption: false,
            captions_enabled: true,
            caption: Caption::default(),
            controls: true,
            autoplay: false,
            looping: false,
            muted: false,
        }
    }

    pub fn with_alt_text(mut self, alt_text: impl Into<String>) -> Self {
        self.alt_text = alt_text.into();
        self
    }

    /// Changing the source re-derives how it is played.
    pub fn set_src(&mut self, src: impl Into<String>) {
        self.src = src.into();
        self.source_kind = SourceKind::classify(&self.src);
    }

    pub fn set_width_and_height(
        &mut self,
        width: Dimension,
        height: Dimension,
    ) {
        self.width = width;
        self.height = height;
    }

    pub fn set_show_caption(&mut self, show_caption: bool) {
        self.show_caption = show_caption;
    }

    pub fn set_controls(&mut self, controls: bool) {
        self.controls = controls;
    }

    pub fn set_autoplay(&mut self, autoplay: bool) {
        self.autoplay = autoplay;
    }

    pub fn set_loop(&mut self, looping: bool) {
        self.looping = looping;
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub(crate) fn read(f: &mut Fields<'_>) -> Result<Self, SchemaError> {
        let src = f.string("src")?.to_owned();
        // Entries written before `sourceKind` existed get it derived here.
        let source_kind = f
            .enumerated("sourceKind")?
            .unwrap_or_else(|| SourceKind::classify(&src));
        Ok(Self {
            source_kind,
            alt_text: f.string_or("altText", "")?,
            width: Dimension::read(f, "width")?,
            height: Dimension::read(f, "height")?,
            max_width: f.u32_or("maxWidth", 500)?,
            show_caption: f.bool_or("showCaption", false)?,
            captions_enabled: f.bool_or("captionsEnabled", true)?,
            caption: Caption::read(f, "caption")?,
            controls: f.bool_or("controls", true)?,
            autoplay: f.bool_or("autoplay", false)?,
            looping: f.bool_or("loop", false)?,
            muted: f.bool_or("muted", false)?,
            src,
        })
    }

    pub(crate) fn write(
        &self,
        map: &mut Map<String, Value>,
        registry: &Registry,
    ) {
        let source_kind: &'static str = self.source_kind.into();
        map.insert("src".into(), self.src.clone().into());
        map.insert("sourceKind".into(), source_kind.into());
        map.insert("altText".into(), self.alt_text.clone().into());
        map.insert("width".into(), self.width.to_json());
        map.insert("height".into(), self.height.to_json());
        map.insert("maxWidth".into(), self.max_width.into());
        map.insert("showCaption".into(), self.show_caption.into());
        map.insert("captionsEnabled".into(), self.captions_enabled.into());
        map.insert("caption".into(), self.caption.to_json(registry));
        map.insert("controls".into(), self.controls.into());
        map.insert("autoplay".into(), self.autoplay.into());
        map.insert("loop".into(), self.looping.into());
        map.insert("muted".into(), self.muted.into());
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;
    use crate::nodes::fields::with_fields;
    use crate::NodeType;

    #[test]
    fn direct_files_are_classified_as_files() {
        assert_eq!(
            SourceKind::classify("https://cdn.example.com/a.mp4"),
            SourceKind::File
        );
        assert_eq!(
            SourceKind::classify("https://cdn.example.com/v/clip.WEBM?t=3"),
            SourceKind::File
        );
        assert_eq!(SourceKind::classify("/uploads/clip.mov"), SourceKind::File);
        assert_eq!(
            SourceKind::classify("blob:https://example.com/1234"),
            SourceKind::File
        );
    }

    #[test]
    fn platform_pages_are_classified_as_embeds() {
        assert_eq!(
            SourceKind::classify("https://player.vimeo.com/video/76979871"),
            SourceKind::Embed
        );
        assert_eq!(
            SourceKind::classify("https://example.com/watch.mp4/page"),
            SourceKind::Embed
        );
    }

    #[test]
    fn video_defaults_match_the_stored_format() {
        let video = with_fields(
            NodeType::Video,
            &json!({"src": "https://cdn.example.com/a.mp4"}),
            |f| Video::read(f),
        )
        .unwrap();
        assert!(video.controls);
        assert!(!video.autoplay);
        assert!(!video.looping);
        assert!(!video.muted);
        assert_eq!(video.width, Dimension::Inherit);
        assert_eq!(video.source_kind, SourceKind::File);
        assert!(video.caption.is_empty());
    }

    #[test]
    fn explicit_source_kind_wins_over_classification() {
        let video = with_fields(
            NodeType::Video,
            &json!({"src": "https://cdn.example.com/a.mp4", "sourceKind": "embed"}),
            |f| Video::read(f),
        )
        .unwrap();
        assert_eq!(video.source_kind, SourceKind::Embed);
    }

    #[test]
    fn inherit_is_accepted_as_a_string_and_as_zero() {
        let image = with_fields(
            NodeType::Image,
            &json!({"src": "a.png", "width": "inherit", "height": 0}),
            |f| Image::read(f),
        )
        .unwrap();
        assert_eq!(image.width, Dimension::Inherit);
        assert_eq!(image.height, Dimension::Inherit);
    }

    #[test]
    fn set_src_reclassifies() {
        let mut video = Video::new("https://cdn.example.com/a.mp4");
        video.set_src("https://www.youtube.com/watch?v=abc");
        assert_eq!(video.source_kind, SourceKind::Embed);
    }
}
