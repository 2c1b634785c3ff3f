// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Allow-list pass over arbitrary HTML.
//!
//! The input is parsed into a [`PaDom`] and written back out keeping only
//! the tags and attributes listed below. Sanitizing never fails: whatever
//! was removed is described by the returned [`SanitizeReport`].

use std::fmt::Write;

use html_escape::{encode_double_quoted_attribute, encode_text};
use tracing::{debug, instrument, warn};

use super::padom::{PaDom, PaDomHandle, PaDomNode, PaNodeContainer};
use super::padom_creator::PaDomCreator;
use super::url_policy::{is_allowed_frame, is_safe_url, UrlUse};

const ALLOWED_TAGS: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "ul", "ol", "li", "table", "thead",
    "tbody", "tfoot", "tr", "th", "td", "blockquote", "pre", "code", "strong",
    "b", "em", "i", "u", "s", "del", "sub", "sup", "mark", "a", "hr", "br",
    "img", "video", "iframe", "figure", "figcaption", "details", "summary",
];

/// Removed together with everything inside them.
const DANGEROUS_TAGS: &[&str] = &[
    "script", "style", "noscript", "template", "object", "embed", "applet",
    "svg", "math", "textarea", "select", "button", "input", "form", "frame",
    "frameset", "base", "link", "meta", "title", "head", "xmp", "plaintext",
    "noembed", "noframes",
];

const VOID_TAGS: &[&str] = &["br", "hr", "img"];

fn allowed_attributes(tag: &str) -> &'static [&'static str] {
    match tag {
        "a" => &["href", "title", "rel", "target"],
        "img" => &["src", "alt", "title"],
        "video" => &[
            "src",
            "title",
            "controls",
            "autoplay",
            "loop",
            "muted",
            "playsinline",
        ],
        "iframe" => &["src", "title", "allow", "allowfullscreen", "frameborder"],
        "ol" => &["start"],
        "td" | "th" => &["colspan", "rowspan"],
        "details" => &["open"],
        _ => &[],
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SanitizeOptions {
    /// Hosts iframes may be served from, subdomains included. `None`
    /// accepts any absolute `http(s)` source.
    pub iframe_hosts: Option<Vec<String>>,
    /// Elements nested deeper than this are dropped with their content.
    pub max_depth: usize,
}

impl Default for SanitizeOptions {
    fn default() -> Self {
        Self {
            iframe_hosts: None,
            max_depth: 256,
        }
    }
}

/// What a sanitizing pass took out of its input.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SanitizeReport {
    /// Tags removed along with their content.
    pub removed_elements: Vec<String>,
    /// Tags that were dropped while their content was kept.
    pub unwrapped_elements: Vec<String>,
    /// As `tag[attribute]`.
    pub removed_attributes: Vec<String>,
    pub unsafe_urls: Vec<String>,
    pub depth_cut: bool,
    pub comments: usize,
}

impl SanitizeReport {
    pub fn is_clean(&self) -> bool {
        self == &Self::default()
    }

    /// Whether anything able to run script or load unvetted content was
    /// removed.
    pub fn removed_dangerous(&self) -> bool {
        !self.removed_elements.is_empty()
            || !self.unsafe_urls.is_empty()
            || self
                .removed_attributes
                .iter()
                .any(|attr| is_event_handler(attr))
    }
}

fn is_event_handler(qualified_attr: &str) -> bool {
    qualified_attr
        .split_once('[')
        .map(|(_, attr)| attr.starts_with("on"))
        .unwrap_or(false)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sanitized {
    pub html: String,
    pub report: SanitizeReport,
}

/// Sanitize with the default options.
pub fn sanitize(raw: &str) -> String {
    sanitize_with(raw, &SanitizeOptions::default()).html
}

#[instrument(skip_all, fields(bytes = raw.len()))]
pub fn sanitize_with(raw: &str, options: &SanitizeOptions) -> Sanitized {
    let dom = PaDomCreator::parse(raw);
    let mut writer = Writer {
        dom: &dom,
        options,
        html: String::with_capacity(raw.len()),
        report: SanitizeReport::default(),
    };
    writer.write_children(dom.document_handle(), 0);
    let Writer { html, report, .. } = writer;

    if report.removed_dangerous() {
        warn!(
            elements = ?report.removed_elements,
            unsafe_urls = report.unsafe_urls.len(),
            "Removed dangerous markup"
        );
    }
    debug!(bytes = html.len(), clean = report.is_clean(), "Sanitized HTML");
    Sanitized { html, report }
}

struct Writer<'a> {
    dom: &'a PaDom,
    options: &'a SanitizeOptions,
    html: String,
    report: SanitizeReport,
}

impl Writer<'_> {
    fn write_children(&mut self, handle: &PaDomHandle, depth: usize) {
        let dom = self.dom;
        for child in dom.get_node(handle).children() {
            self.write_node(child, depth);
        }
    }

    fn write_node(&mut self, handle: &PaDomHandle, depth: usize) {
        let dom = self.dom;
        match dom.get_node(handle) {
            PaDomNode::Text(text) => {
                self.html.push_str(&encode_text(&text.content));
            }
            PaDomNode::Comment => self.report.comments += 1,
            PaDomNode::Document(_) => self.write_children(handle, depth),
            PaDomNode::Container(element) => {
                self.write_element(handle, element, depth)
            }
        }
    }

    fn write_element(
        &mut self,
        handle: &PaDomHandle,
        element: &PaNodeContainer,
        depth: usize,
    ) {
        let tag = element.tag();
        // Fragment parsing wraps everything in one `html` element.
        if tag == "html" && self.dom.parent(handle) == Some(self.dom.document_handle())
        {
            self.write_children(handle, depth);
            return;
        }
        if depth >= self.options.max_depth {
            self.report.depth_cut = true;
            return;
        }
        if DANGEROUS_TAGS.contains(&tag) {
            self.report.removed_elements.push(tag.to_owned());
            return;
        }
        if !ALLOWED_TAGS.contains(&tag) {
            self.report.unwrapped_elements.push(tag.to_owned());
            self.write_children(handle, depth + 1);
            return;
        }

        let attrs = self.filter_attributes(tag, element);
        if tag == "iframe" && !attrs.iter().any(|(name, _)| name == "src") {
            self.report.removed_elements.push(tag.to_owned());
            return;
        }

        self.html.push('<');
        self.html.push_str(tag);
        for (name, value) in &attrs {
            if value.is_empty() {
                let _ = write!(self.html, " {name}");
            } else {
                let _ = write!(
                    self.html,
                    r#" {name}="{}""#,
                    encode_double_quoted_attribute(value)
                );
            }
        }
        self.html.push('>');
        if VOID_TAGS.contains(&tag) {
            return;
        }
        self.write_children(handle, depth + 1);
        let _ = write!(self.html, "</{tag}>");
    }

    fn filter_attributes(
        &mut self,
        tag: &str,
        element: &PaNodeContainer,
    ) -> Vec<(String, String)> {
        let allowed = allowed_attributes(tag);
        let mut kept: Vec<(String, String)> = Vec::new();
        for (name, value) in &element.attrs {
            if !allowed.contains(&name.as_str()) {
                self.report.removed_attributes.push(format!("{tag}[{name}]"));
                continue;
            }
            let keep = match name.as_str() {
                "href" | "src" => {
                    let safe = self.url_allowed(tag, value);
                    if !safe {
                        self.report.unsafe_urls.push(value.clone());
                    }
                    safe
                }
                "start" | "colspan" | "rowspan" => {
                    let numeric = value.trim().parse::<u32>().is_ok();
                    if !numeric {
                        self.report
                            .removed_attributes
                            .push(format!("{tag}[{name}]"));
                    }
                    numeric
                }
                _ => true,
            };
            if keep {
                let value = match name.as_str() {
                    "href" | "src" | "start" | "colspan" | "rowspan" => {
                        value.trim().to_owned()
                    }
                    _ => value.clone(),
                };
                kept.push((name.clone(), value));
            }
        }

        let opens_new_context = kept
            .iter()
            .any(|(name, value)| name == "target" && value == "_blank");
        if tag == "a" && opens_new_context {
            let rel = "noopener noreferrer".to_owned();
            match kept.iter_mut().find(|(name, _)| name == "rel") {
                Some((_, value)) => *value = rel,
                None => kept.push(("rel".to_owned(), rel)),
            }
        }
        kept
    }

    fn url_allowed(&self, tag: &str, url: &str) -> bool {
        match tag {
            "a" => is_safe_url(url, UrlUse::Link),
            "iframe" => {
                is_allowed_frame(url, self.options.iframe_hosts.as_deref())
            }
            _ => is_safe_url(url, UrlUse::Media),
        }
    }
}

#[cfg(test)]
mod test {
    use speculoos::{assert_that, prelude::*};

    use super::*;

    fn with_hosts(raw: &str, hosts: &[&str]) -> Sanitized {
        sanitize_with(
            raw,
            &SanitizeOptions {
                iframe_hosts: Some(
                    hosts.iter().map(|h| h.to_string()).collect(),
                ),
                ..Default::default()
            },
        )
    }

    #[test]
    fn scripts_are_removed_with_their_content() {
        let out = sanitize_with(
            "<p>Hi<script>alert(1)</script></p><style>p{}</style>",
            &SanitizeOptions::default(),
        );
        assert_eq!(out.html, "<p>Hi</p>");
        assert_eq!(out.report.removed_elements, vec!["script", "style"]);
        assert!(out.report.removed_dangerous());
    }

    #[test]
    fn event_handlers_are_stripped() {
        let out = sanitize_with(
            r#"<img src="a.png" onerror="alert(1)" alt="A">"#,
            &SanitizeOptions::default(),
        );
        assert_eq!(out.html, r#"<img src="a.png" alt="A">"#);
        assert_eq!(out.report.removed_attributes, vec!["img[onerror]"]);
        assert!(out.report.removed_dangerous());
    }

    #[test]
    fn script_urls_are_removed_from_links() {
        let out = sanitize_with(
            r#"<a href=" javascript:alert(1)">x</a><a href="java&#x09;script:1">y</a>"#,
            &SanitizeOptions::default(),
        );
        assert_eq!(out.html, "<a>x</a><a>y</a>");
        assert_eq!(out.report.unsafe_urls.len(), 2);
    }

    #[test]
    fn mailto_links_survive_but_not_as_media() {
        assert_eq!(
            sanitize(r#"<a href="mailto:a@b.c">m</a><img src="mailto:a@b.c">"#),
            r#"<a href="mailto:a@b.c">m</a><img>"#
        );
    }

    #[test]
    fn unknown_tags_are_unwrapped() {
        let out = sanitize_with(
            r#"<div class="x"><span style="color:red">a</span> b</div>"#,
            &SanitizeOptions::default(),
        );
        assert_eq!(out.html, "a b");
        assert_eq!(out.report.unwrapped_elements, vec!["div", "span"]);
        assert!(!out.report.removed_dangerous());
    }

    #[test]
    fn styling_attributes_are_stripped() {
        assert_eq!(
            sanitize(r#"<p style="color:red" class="c" id="i">t</p>"#),
            "<p>t</p>"
        );
    }

    #[test]
    fn comments_are_dropped() {
        let out = sanitize_with("a<!-- secret -->b", &SanitizeOptions::default());
        assert_eq!(out.html, "ab");
        assert_eq!(out.report.comments, 1);
    }

    #[test]
    fn text_is_re_escaped() {
        assert_eq!(
            sanitize("<p>a &amp; b &lt;script&gt;</p>"),
            "<p>a &amp; b &lt;script&gt;</p>"
        );
    }

    #[test]
    fn attribute_values_are_re_escaped() {
        assert_eq!(
            sanitize(r#"<a title='say "hi"' href="/p?a=1&amp;b=2">t</a>"#),
            r#"<a title="say &quot;hi&quot;" href="/p?a=1&amp;b=2">t</a>"#
        );
    }

    #[test]
    fn blank_targets_always_get_a_safe_rel() {
        assert_eq!(
            sanitize(r#"<a href="https://x.org" target="_blank" rel="opener">x</a>"#),
            r#"<a href="https://x.org" target="_blank" rel="noopener noreferrer">x</a>"#
        );
    }

    #[test]
    fn numeric_attributes_must_be_numbers() {
        assert_eq!(
            sanitize(r#"<ol start="x"><li>a</li></ol><ol start="3"></ol>"#),
            r#"<ol><li>a</li></ol><ol start="3"></ol>"#
        );
    }

    #[test]
    fn iframes_need_an_absolute_allowed_source() {
        let frame = r#"<iframe src="https://www.youtube.com/embed/x" width="5" allowfullscreen></iframe>"#;
        assert_eq!(
            with_hosts(frame, &["youtube.com"]).html,
            r#"<iframe src="https://www.youtube.com/embed/x" allowfullscreen></iframe>"#
        );

        let out = with_hosts(frame, &["vimeo.com"]);
        assert_eq!(out.html, "");
        assert_eq!(out.report.removed_elements, vec!["iframe"]);

        assert_eq!(sanitize(r#"<iframe src="/local"></iframe>"#), "");
        assert_eq!(sanitize("<iframe></iframe>"), "");
    }

    #[test]
    fn svg_and_math_are_removed() {
        let out = sanitize_with(
            r#"<svg><script>alert(1)</script></svg><math><mi>x</mi></math>ok"#,
            &SanitizeOptions::default(),
        );
        assert_eq!(out.html, "ok");
        assert_eq!(out.report.removed_elements, vec!["svg", "math"]);
    }

    #[test]
    fn deep_nesting_is_cut() {
        let out = sanitize_with(
            "<blockquote><blockquote><blockquote><blockquote>x</blockquote></blockquote></blockquote></blockquote>",
            &SanitizeOptions {
                max_depth: 3,
                ..Default::default()
            },
        );
        assert_eq!(
            out.html,
            "<blockquote><blockquote><blockquote></blockquote></blockquote></blockquote>"
        );
        assert_that!(out.report.depth_cut).is_true();
    }

    #[test]
    fn very_deep_input_does_not_overflow() {
        let raw = "<b>".repeat(5000);
        let out = sanitize_with(&raw, &SanitizeOptions::default());
        assert_that!(out.report.depth_cut).is_true();
    }

    #[test]
    fn video_flags_are_kept_bare() {
        let html =
            r#"<video src="https://cdn.example.com/a.mp4" controls muted></video>"#;
        assert_eq!(sanitize(html), html);
    }

    #[test]
    fn clean_input_reports_nothing() {
        let out = sanitize_with(
            "<h2>T</h2><ul><li><strong>a</strong></li></ul>",
            &SanitizeOptions::default(),
        );
        assert_eq!(out.html, "<h2>T</h2><ul><li><strong>a</strong></li></ul>");
        assert_that!(out.report.is_clean()).is_true();
    }

    #[test]
    fn empty_input_is_empty_output() {
        assert_eq!(sanitize(""), "");
    }
}
