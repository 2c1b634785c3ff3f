// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Leaves that render as third-party widgets or computed content.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Map, Value};

use super::element::ElementFormat;
use super::fields::Fields;
use crate::error::SchemaError;

static YOUTUBE_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap());
static YOUTUBE_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^.*(?:youtu\.be/|v/|u/\w/|embed/|shorts/|watch\?v=|&v=)([A-Za-z0-9_-]{11})",
    )
    .unwrap()
});
static FIGMA_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9]+$").unwrap());
static FIGMA_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https://(?:www\.)?figma\.com/(?:file|design|proto)/([A-Za-z0-9]+)")
        .unwrap()
});
static TWEET_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]+$").unwrap());
static TWEET_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https?://(?:www\.)?(?:twitter|x)\.com/\w+/status/([0-9]+)")
        .unwrap()
});

fn checked_id(
    f: &Fields<'_>,
    field: &'static str,
    pattern: &Regex,
) -> Result<String, SchemaError> {
    let id = f.string(field)?;
    if pattern.is_match(id) {
        Ok(id.to_owned())
    } else {
        Err(SchemaError::invalid(
            f.node_type(),
            field,
            format!("`{id}` is not a valid id"),
        ))
    }
}

fn write_format(format: ElementFormat, map: &mut Map<String, Value>) {
    if format != ElementFormat::Unset {
        let format: &'static str = format.into();
        map.insert("format".into(), format.into());
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct YouTube {
    pub video_id: String,
    pub format: ElementFormat,
}

impl YouTube {
    pub fn new(video_id: impl Into<String>) -> Self {
        Self {
            video_id: video_id.into(),
            format: ElementFormat::Unset,
        }
    }

    pub fn has_valid_id(&self) -> bool {
        YOUTUBE_ID.is_match(&self.video_id)
    }

    /// Extract the video id from a watch, short, or embed URL.
    pub fn from_url(url: &str) -> Option<Self> {
        YOUTUBE_URL
            .captures(url)
            .and_then(|c| c.get(1))
            .map(|id| Self::new(id.as_str()))
    }

    pub(crate) fn read(f: &mut Fields<'_>) -> Result<Self, SchemaError> {
        Ok(Self {
            video_id: checked_id(f, "videoID", &YOUTUBE_ID)?,
            format: ElementFormat::read(f)?,
        })
    }

    pub(crate) fn write(&self, map: &mut Map<String, Value>) {
        map.insert("videoID".into(), self.video_id.clone().into());
        write_format(self.format, map);
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Figma {
    pub document_id: String,
    pub format: ElementFormat,
}

impl Figma {
    pub fn new(document_id: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            format: ElementFormat::Unset,
        }
    }

    pub fn has_valid_id(&self) -> bool {
        FIGMA_ID.is_match(&self.document_id)
    }

    pub fn from_url(url: &str) -> Option<Self> {
        FIGMA_URL
            .captures(url)
            .and_then(|c| c.get(1))
            .map(|id| Self::new(id.as_str()))
    }

    pub(crate) fn read(f: &mut Fields<'_>) -> Result<Self, SchemaError> {
        Ok(Self {
            document_id: checked_id(f, "documentID", &FIGMA_ID)?,
            format: ElementFormat::read(f)?,
        })
    }

    pub(crate) fn write(&self, map: &mut Map<String, Value>) {
        map.insert("documentID".into(), self.document_id.clone().into());
        write_format(self.format, map);
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Tweet {
    pub id: String,
    pub format: ElementFormat,
}

impl Tweet {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            format: ElementFormat::Unset,
        }
    }

    pub fn has_valid_id(&self) -> bool {
        TWEET_ID.is_match(&self.id)
    }

    pub fn from_url(url: &str) -> Option<Self> {
        TWEET_URL
            .captures(url)
            .and_then(|c| c.get(1))
            .map(|id| Self::new(id.as_str()))
    }

    pub(crate) fn read(f: &mut Fields<'_>) -> Result<Self, SchemaError> {
        Ok(Self {
            id: checked_id(f, "id", &TWEET_ID)?,
            format: ElementFormat::read(f)?,
        })
    }

    pub(crate) fn write(&self, map: &mut Map<String, Value>) {
        map.insert("id".into(), self.id.clone().into());
        write_format(self.format, map);
    }
}

/// A KaTeX source string.
#[derive(Clone, Debug, PartialEq)]
pub struct Equation {
    pub equation: String,
    pub inline: bool,
}

impl Equation {
    pub fn new(equation: impl Into<String>, inline: bool) -> Self {
        Self {
            equation: equation.into(),
            inline,
        }
    }

    pub(crate) fn read(f: &mut Fields<'_>) -> Result<Self, SchemaError> {
        Ok(Self {
            equation: f.string("equation")?.to_owned(),
            inline: f.bool_or("inline", false)?,
        })
    }

    pub(crate) fn write(&self, map: &mut Map<String, Value>) {
        map.insert("equation".into(), self.equation.clone().into());
        map.insert("inline".into(), self.inline.into());
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PollOption {
    pub uid: String,
    pub text: String,
    /// Ids of the users who voted for this option.
    pub votes: Vec<String>,
}

impl PollOption {
    pub fn new(uid: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            text: text.into(),
            votes: Vec::new(),
        }
    }

    fn from_json(value: &Value) -> Option<Self> {
        let option = value.as_object()?;
        let votes = match option.get("votes") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(votes)) => votes
                .iter()
                .map(|v| v.as_str().map(str::to_owned))
                .collect::<Option<Vec<_>>>()?,
            Some(_) => return None,
        };
        Some(Self {
            uid: option.get("uid")?.as_str()?.to_owned(),
            text: option.get("text")?.as_str()?.to_owned(),
            votes,
        })
    }

    fn to_json(&self) -> Value {
        json!({ "uid": self.uid, "text": self.text, "votes": self.votes })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Poll {
    pub question: String,
    pub options: Vec<PollOption>,
}

impl Poll {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            options: Vec::new(),
        }
    }

    pub fn total_votes(&self) -> usize {
        self.options.iter().map(|o| o.votes.len()).sum()
    }

    pub(crate) fn read(f: &mut Fields<'_>) -> Result<Self, SchemaError> {
        let question = f.string("question")?.to_owned();
        let options = match f.opt_array("options")? {
            None => Vec::new(),
            Some(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    PollOption::from_json(item).ok_or_else(|| {
                        SchemaError::invalid(
                            f.node_type(),
                            "options",
                            format!("option {i} needs `uid`, `text` and string `votes`"),
                        )
                    })
                })
                .collect::<Result<_, _>>()?,
        };
        Ok(Self { question, options })
    }

    pub(crate) fn write(&self, map: &mut Map<String, Value>) {
        map.insert("question".into(), self.question.clone().into());
        map.insert(
            "options".into(),
            self.options.iter().map(PollOption::to_json).collect(),
        );
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;
    use crate::nodes::fields::with_fields;
    use crate::NodeType;

    #[test]
    fn youtube_ids_are_extracted_from_urls() {
        for url in [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ",
            "https://www.youtube.com/embed/dQw4w9WgXcQ",
            "https://www.youtube.com/shorts/dQw4w9WgXcQ",
        ] {
            assert_eq!(YouTube::from_url(url), Some(YouTube::new("dQw4w9WgXcQ")));
        }
        assert_eq!(YouTube::from_url("https://vimeo.com/1234"), None);
    }

    #[test]
    fn youtube_ids_with_markup_are_rejected() {
        let err = with_fields(
            NodeType::YouTube,
            &json!({"videoID": "abc\"><script>"}),
            |f| YouTube::read(f),
        )
        .unwrap_err();
        assert_eq!(err.field(), Some("videoID"));
    }

    #[test]
    fn tweet_ids_are_digits() {
        assert!(with_fields(NodeType::Tweet, &json!({"id": "1234"}), |f| {
            Tweet::read(f)
        })
        .is_ok());
        assert!(with_fields(NodeType::Tweet, &json!({"id": "12a"}), |f| {
            Tweet::read(f)
        })
        .is_err());
        assert_eq!(
            Tweet::from_url("https://x.com/someone/status/1234567"),
            Some(Tweet::new("1234567"))
        );
    }

    #[test]
    fn figma_ids_come_from_file_urls() {
        assert_eq!(
            Figma::from_url("https://www.figma.com/file/AbC123/Some-Design"),
            Some(Figma::new("AbC123"))
        );
    }

    #[test]
    fn poll_options_must_be_well_formed() {
        let poll = with_fields(
            NodeType::Poll,
            &json!({"question": "Tea?", "options": [
                {"uid": "a", "text": "Yes", "votes": ["u1", "u2"]},
                {"uid": "b", "text": "No"}
            ]}),
            |f| Poll::read(f),
        )
        .unwrap();
        assert_eq!(poll.options.len(), 2);
        assert_eq!(poll.total_votes(), 2);

        let err = with_fields(
            NodeType::Poll,
            &json!({"question": "Tea?", "options": [{"text": "Yes"}]}),
            |f| Poll::read(f),
        )
        .unwrap_err();
        assert_eq!(err.field(), Some("options"));
    }
}
