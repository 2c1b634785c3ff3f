// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Stored editor state to display-ready HTML in one call.

use tracing::{debug, instrument, warn};

use crate::deserializer::{Deserializer, RecoveryPolicy};
use crate::diagnostics::{NodePath, Warning, WarningKind};
use crate::html::exporter::{export_html, ExportOptions};
use crate::html::sanitizer::{sanitize_with, SanitizeOptions, SanitizeReport};
use crate::registry::Registry;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderOptions {
    pub recovery: RecoveryPolicy,
    pub export: ExportOptions,
    pub sanitize: SanitizeOptions,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Rendered {
    /// Sanitized markup. Empty when the document could not be read.
    pub html: String,
    /// Entries that were recovered from and rules that failed.
    pub warnings: Vec<Warning>,
    pub sanitize_report: SanitizeReport,
}

/// Deserialize, export and sanitize. Never fails: an unreadable document
/// renders as an empty string with a warning saying why.
#[instrument(skip_all, fields(bytes = json.len()))]
pub fn render(
    json: &str,
    registry: &Registry,
    options: &RenderOptions,
) -> Rendered {
    let deserialized = match Deserializer::new(registry)
        .with_policy(options.recovery)
        .deserialize_str(json)
    {
        Ok(deserialized) => deserialized,
        Err(err) => {
            warn!(error = %err, "Failed to read editor state");
            return Rendered {
                html: String::new(),
                warnings: vec![Warning::new(
                    NodePath::root(),
                    WarningKind::Document(err.to_string()),
                )],
                sanitize_report: SanitizeReport::default(),
            };
        }
    };

    let mut warnings = deserialized.warnings;
    let exported = export_html(&deserialized.tree, registry, &options.export);
    warnings.extend(exported.warnings);
    let sanitized = sanitize_with(&exported.html, &options.sanitize);
    debug!(
        bytes = sanitized.html.len(),
        warnings = warnings.len(),
        "Rendered editor state"
    );
    Rendered {
        html: sanitized.html,
        warnings,
        sanitize_report: sanitized.report,
    }
}

/// Render with the standard registry and default options, keeping only the
/// markup.
pub fn editor_state_to_html(json: &str) -> String {
    render(json, Registry::standard(), &RenderOptions::default()).html
}

#[cfg(test)]
mod test {
    use indoc::indoc;
    use speculoos::{assert_that, prelude::*};

    use super::*;

    #[test]
    fn renders_a_stored_document() {
        let json = indoc! {r#"
            {"root": {"type": "root", "version": 1, "children": [
                {"type": "heading", "version": 1, "tag": "h1", "children": [
                    {"type": "text", "version": 1, "text": "Hello"}
                ]},
                {"type": "video", "version": 2, "src": "https://cdn.example.com/a.mp4"}
            ]}}
        "#};
        assert_eq!(
            editor_state_to_html(json),
            r#"<h1>Hello</h1><video src="https://cdn.example.com/a.mp4" controls></video>"#
        );
    }

    #[test]
    fn unreadable_documents_render_empty() {
        let rendered = render("{not json", Registry::standard(), &RenderOptions::default());
        assert_eq!(rendered.html, "");
        assert_that!(rendered.warnings).has_length(1);
        assert!(matches!(rendered.warnings[0].kind, WarningKind::Document(_)));
    }

    #[test]
    fn a_bad_node_costs_only_itself() {
        let json = r#"{"root": {"type": "root", "version": 1, "children": [
            {"type": "paragraph", "version": 1, "children": [
                {"type": "text", "version": 1, "text": "kept"}
            ]},
            {"type": "sparkle", "version": 1},
            {"type": "heading", "version": 1, "tag": "h9", "children": []}
        ]}}"#;
        let options = RenderOptions::default();
        let rendered = render(json, Registry::standard(), &options);
        assert_eq!(rendered.html, "<p>kept</p>");
        assert_that!(rendered.warnings).has_length(2);
        assert_eq!(rendered.warnings[0].path.to_string(), "root/1");
        assert_eq!(rendered.warnings[1].path.to_string(), "root/2");
    }

    #[test]
    fn abort_policy_renders_nothing_on_a_bad_node() {
        let json = r#"{"root": {"type": "root", "version": 1, "children": [
            {"type": "sparkle", "version": 1}
        ]}}"#;
        let options = RenderOptions {
            recovery: RecoveryPolicy::Abort,
            ..Default::default()
        };
        let rendered = render(json, Registry::standard(), &options);
        assert_eq!(rendered.html, "");
        assert_that!(rendered.warnings).has_length(1);
    }

    #[test]
    fn exported_frames_pass_the_sanitizer() {
        let json = r#"{"root": {"type": "root", "version": 1, "children": [
            {"type": "youtube", "version": 1, "videoID": "dQw4w9WgXcQ"}
        ]}}"#;
        let options = RenderOptions::default();
        let rendered = render(json, Registry::standard(), &options);
        assert_eq!(
            rendered.html,
            r#"<iframe src="https://www.youtube-nocookie.com/embed/dQw4w9WgXcQ" title="YouTube video" allow="autoplay; fullscreen; picture-in-picture" allowfullscreen frameborder="0"></iframe>"#
        );
        assert_that!(rendered.sanitize_report.removed_dangerous()).is_false();
    }
}
