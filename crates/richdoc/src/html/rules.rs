// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! One export rule per node type.
//!
//! Rules receive the already exported HTML of the node's children and return
//! the node's own markup.

use std::fmt::Write;

use html_escape::{encode_double_quoted_attribute, encode_text};
use url::form_urlencoded::byte_serialize;

use super::exporter::ExportContext;
use super::url_policy::{is_safe_url, UrlUse};
use crate::error::ExportError;
use crate::node_type::NodeType;
use crate::nodes::{Caption, Dimension, Node, SourceKind, TextNode};

type RuleResult = Result<String, ExportError>;

const EMBED_ALLOW: &str = "autoplay; fullscreen; picture-in-picture";

/// Start tag under construction.
struct Tag {
    name: &'static str,
    attrs: String,
}

impl Tag {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            attrs: String::new(),
        }
    }

    fn attr(mut self, name: &str, value: &str) -> Self {
        let _ = write!(
            self.attrs,
            r#" {name}="{}""#,
            encode_double_quoted_attribute(value)
        );
        self
    }

    fn opt_attr(self, name: &str, value: Option<&str>) -> Self {
        match value {
            Some(value) => self.attr(name, value),
            None => self,
        }
    }

    /// Boolean attribute, written bare.
    fn flag(mut self, name: &str, on: bool) -> Self {
        if on {
            self.attrs.push(' ');
            self.attrs.push_str(name);
        }
        self
    }

    fn wrap(self, inner: &str) -> String {
        format!("<{0}{1}>{inner}</{0}>", self.name, self.attrs)
    }

    fn void(self) -> String {
        format!("<{}{}>", self.name, self.attrs)
    }
}

fn mismatch(expected: NodeType, node: &Node) -> ExportError {
    ExportError::mismatch(expected, node.node_type())
}

fn checked_url(url: &str, usage: UrlUse) -> Result<&str, ExportError> {
    if is_safe_url(url, usage) {
        Ok(url)
    } else {
        Err(ExportError::UnsafeUrl(url.to_owned()))
    }
}

fn size(dimension: Dimension, fallback: u32) -> String {
    match dimension.pixels() {
        Some(px) => format!("{}", px.round()),
        None => fallback.to_string(),
    }
}

/// Wrap media in a `figure` when its caption is shown and has content.
fn with_caption(
    ctx: &ExportContext<'_>,
    media: String,
    show: bool,
    caption: &Caption,
) -> String {
    if show && !caption.is_empty() {
        let caption_html = ctx.export_caption(caption);
        Tag::new("figure").wrap(&format!(
            "{media}{}",
            Tag::new("figcaption").wrap(&caption_html)
        ))
    } else {
        media
    }
}

fn iframe(src: &str, title: &str, width: &str, height: &str) -> String {
    Tag::new("iframe")
        .attr("src", src)
        .attr("title", title)
        .attr("width", width)
        .attr("height", height)
        .attr("allow", EMBED_ALLOW)
        .flag("allowfullscreen", true)
        .attr("frameborder", "0")
        .wrap("")
}

pub(crate) fn root(
    _: &Node,
    _: &ExportContext<'_>,
    children: &str,
) -> RuleResult {
    Ok(children.to_owned())
}

pub(crate) fn paragraph(
    node: &Node,
    _: &ExportContext<'_>,
    children: &str,
) -> RuleResult {
    let Node::Paragraph(_) = node else {
        return Err(mismatch(NodeType::Paragraph, node));
    };
    // An empty paragraph still takes up a line.
    let inner = if children.is_empty() { "<br>" } else { children };
    Ok(Tag::new("p").wrap(inner))
}

pub(crate) fn heading(
    node: &Node,
    _: &ExportContext<'_>,
    children: &str,
) -> RuleResult {
    let Node::Heading(heading) = node else {
        return Err(mismatch(NodeType::Heading, node));
    };
    Ok(Tag::new(heading.tag.as_str()).wrap(children))
}

pub(crate) fn quote(
    node: &Node,
    _: &ExportContext<'_>,
    children: &str,
) -> RuleResult {
    let Node::Quote(_) = node else {
        return Err(mismatch(NodeType::Quote, node));
    };
    Ok(Tag::new("blockquote").wrap(children))
}

pub(crate) fn code(
    node: &Node,
    _: &ExportContext<'_>,
    children: &str,
) -> RuleResult {
    let Node::Code(code) = node else {
        return Err(mismatch(NodeType::Code, node));
    };
    let class = code.language.as_ref().map(|l| format!("language-{l}"));
    let inner = Tag::new("code")
        .opt_attr("class", class.as_deref())
        .wrap(children);
    Ok(Tag::new("pre").wrap(&inner))
}

pub(crate) fn list(
    node: &Node,
    _: &ExportContext<'_>,
    children: &str,
) -> RuleResult {
    let Node::List(list) = node else {
        return Err(mismatch(NodeType::List, node));
    };
    let start = (list.list_type.tag() == "ol" && list.start != 1)
        .then(|| list.start.to_string());
    Ok(Tag::new(list.list_type.tag())
        .opt_attr("start", start.as_deref())
        .wrap(children))
}

pub(crate) fn list_item(
    node: &Node,
    _: &ExportContext<'_>,
    children: &str,
) -> RuleResult {
    let Node::ListItem(_) = node else {
        return Err(mismatch(NodeType::ListItem, node));
    };
    Ok(Tag::new("li").wrap(children))
}

pub(crate) fn table(
    node: &Node,
    _: &ExportContext<'_>,
    children: &str,
) -> RuleResult {
    let Node::Table(_) = node else {
        return Err(mismatch(NodeType::Table, node));
    };
    Ok(Tag::new("table").wrap(&Tag::new("tbody").wrap(children)))
}

pub(crate) fn table_row(
    node: &Node,
    _: &ExportContext<'_>,
    children: &str,
) -> RuleResult {
    let Node::TableRow(_) = node else {
        return Err(mismatch(NodeType::TableRow, node));
    };
    Ok(Tag::new("tr").wrap(children))
}

pub(crate) fn table_cell(
    node: &Node,
    _: &ExportContext<'_>,
    children: &str,
) -> RuleResult {
    let Node::TableCell(cell) = node else {
        return Err(mismatch(NodeType::TableCell, node));
    };
    let name = if cell.header_state.is_header() { "th" } else { "td" };
    let span = |n: u32| (n > 1).then(|| n.to_string());
    Ok(Tag::new(name)
        .opt_attr("colspan", span(cell.col_span).as_deref())
        .opt_attr("rowspan", span(cell.row_span).as_deref())
        .wrap(children))
}

/// A link with an unsafe target keeps its text and loses the anchor.
pub(crate) fn link(
    node: &Node,
    _: &ExportContext<'_>,
    children: &str,
) -> RuleResult {
    let (Node::Link(link) | Node::AutoLink(link)) = node else {
        return Err(mismatch(NodeType::Link, node));
    };
    if !is_safe_url(&link.url, UrlUse::Link) {
        return Ok(children.to_owned());
    }
    let rel = match (&link.rel, link.target.as_deref()) {
        (Some(rel), _) => Some(rel.as_str()),
        (None, Some("_blank")) => Some("noopener noreferrer"),
        (None, _) => None,
    };
    Ok(Tag::new("a")
        .attr("href", link.url.trim())
        .opt_attr("title", link.title.as_deref())
        .opt_attr("target", link.target.as_deref())
        .opt_attr("rel", rel)
        .wrap(children))
}

pub(crate) fn collapsible_container(
    node: &Node,
    _: &ExportContext<'_>,
    children: &str,
) -> RuleResult {
    let Node::CollapsibleContainer(collapsible) = node else {
        return Err(mismatch(NodeType::CollapsibleContainer, node));
    };
    Ok(Tag::new("details")
        .flag("open", collapsible.open)
        .wrap(children))
}

pub(crate) fn collapsible_title(
    node: &Node,
    _: &ExportContext<'_>,
    children: &str,
) -> RuleResult {
    let Node::CollapsibleTitle(_) = node else {
        return Err(mismatch(NodeType::CollapsibleTitle, node));
    };
    Ok(Tag::new("summary").wrap(children))
}

pub(crate) fn collapsible_content(
    node: &Node,
    _: &ExportContext<'_>,
    children: &str,
) -> RuleResult {
    let Node::CollapsibleContent(_) = node else {
        return Err(mismatch(NodeType::CollapsibleContent, node));
    };
    Ok(children.to_owned())
}

fn formatted(text: &TextNode) -> String {
    let tags: Vec<_> = text.format.tags().collect();
    tags.iter()
        .rev()
        .fold(encode_text(&text.text).into_owned(), |inner, tag| {
            format!("<{tag}>{inner}</{tag}>")
        })
}

pub(crate) fn text(node: &Node, _: &ExportContext<'_>, _: &str) -> RuleResult {
    match node {
        Node::Text(text) | Node::Hashtag(text) => Ok(formatted(text)),
        _ => Err(mismatch(NodeType::Text, node)),
    }
}

pub(crate) fn code_highlight(
    node: &Node,
    _: &ExportContext<'_>,
    _: &str,
) -> RuleResult {
    let Node::CodeHighlight(token) = node else {
        return Err(mismatch(NodeType::CodeHighlight, node));
    };
    Ok(encode_text(&token.text.text).into_owned())
}

pub(crate) fn line_break(
    node: &Node,
    _: &ExportContext<'_>,
    _: &str,
) -> RuleResult {
    let Node::LineBreak = node else {
        return Err(mismatch(NodeType::LineBreak, node));
    };
    Ok(Tag::new("br").void())
}

pub(crate) fn horizontal_rule(
    node: &Node,
    _: &ExportContext<'_>,
    _: &str,
) -> RuleResult {
    let Node::HorizontalRule = node else {
        return Err(mismatch(NodeType::HorizontalRule, node));
    };
    Ok(Tag::new("hr").void())
}

/// Page breaks only matter to print layouts.
pub(crate) fn page_break(
    node: &Node,
    _: &ExportContext<'_>,
    _: &str,
) -> RuleResult {
    let Node::PageBreak = node else {
        return Err(mismatch(NodeType::PageBreak, node));
    };
    Ok(String::new())
}

pub(crate) fn image(
    node: &Node,
    ctx: &ExportContext<'_>,
    _: &str,
) -> RuleResult {
    let Node::Image(image) = node else {
        return Err(mismatch(NodeType::Image, node));
    };
    let img = Tag::new("img")
        .attr("src", checked_url(image.src.trim(), UrlUse::Media)?)
        .attr("alt", &image.alt_text)
        .void();
    Ok(with_caption(ctx, img, image.show_caption, &image.caption))
}

pub(crate) fn inline_image(
    node: &Node,
    ctx: &ExportContext<'_>,
    _: &str,
) -> RuleResult {
    let Node::InlineImage(image) = node else {
        return Err(mismatch(NodeType::InlineImage, node));
    };
    let img = Tag::new("img")
        .attr("src", checked_url(image.src.trim(), UrlUse::Media)?)
        .attr("alt", &image.alt_text)
        .void();
    Ok(with_caption(ctx, img, image.show_caption, &image.caption))
}

pub(crate) fn video(
    node: &Node,
    ctx: &ExportContext<'_>,
    _: &str,
) -> RuleResult {
    let Node::Video(video) = node else {
        return Err(mismatch(NodeType::Video, node));
    };
    let src = video.src.trim();
    let media = match video.source_kind {
        SourceKind::File => Tag::new("video")
            .attr("src", checked_url(src, UrlUse::Media)?)
            .opt_attr(
                "title",
                Some(video.alt_text.as_str()).filter(|alt| !alt.is_empty()),
            )
            .flag("controls", video.controls)
            .flag("autoplay", video.autoplay)
            .flag("loop", video.looping)
            .flag("muted", video.muted)
            .wrap(""),
        SourceKind::Embed => {
            let options = ctx.options();
            let title = if video.alt_text.is_empty() {
                "Embedded video"
            } else {
                video.alt_text.as_str()
            };
            iframe(
                checked_url(src, UrlUse::Frame)?,
                title,
                &size(video.width, options.embed_width),
                &size(video.height, options.embed_height),
            )
        }
    };
    let show = video.show_caption && video.captions_enabled;
    Ok(with_caption(ctx, media, show, &video.caption))
}

fn invalid_id(field: &'static str, id: &str) -> ExportError {
    ExportError::InvalidAttribute {
        field,
        reason: format!("`{id}` is not a valid id"),
    }
}

pub(crate) fn youtube(
    node: &Node,
    ctx: &ExportContext<'_>,
    _: &str,
) -> RuleResult {
    let Node::YouTube(youtube) = node else {
        return Err(mismatch(NodeType::YouTube, node));
    };
    if !youtube.has_valid_id() {
        return Err(invalid_id("videoID", &youtube.video_id));
    }
    let options = ctx.options();
    let src = format!("{}{}", options.youtube_embed_base, youtube.video_id);
    Ok(iframe(
        &src,
        "YouTube video",
        &options.embed_width.to_string(),
        &options.embed_height.to_string(),
    ))
}

pub(crate) fn figma(
    node: &Node,
    ctx: &ExportContext<'_>,
    _: &str,
) -> RuleResult {
    let Node::Figma(figma) = node else {
        return Err(mismatch(NodeType::Figma, node));
    };
    if !figma.has_valid_id() {
        return Err(invalid_id("documentID", &figma.document_id));
    }
    let options = ctx.options();
    let file = format!("https://www.figma.com/file/{}", figma.document_id);
    let src = format!(
        "{}{}",
        options.figma_embed_base,
        byte_serialize(file.as_bytes()).collect::<String>()
    );
    Ok(iframe(
        &src,
        "Figma document",
        &options.embed_width.to_string(),
        &options.embed_height.to_string(),
    ))
}

pub(crate) fn tweet(
    node: &Node,
    ctx: &ExportContext<'_>,
    _: &str,
) -> RuleResult {
    let Node::Tweet(tweet) = node else {
        return Err(mismatch(NodeType::Tweet, node));
    };
    if !tweet.has_valid_id() {
        return Err(invalid_id("id", &tweet.id));
    }
    let options = ctx.options();
    let src = format!("{}{}", options.tweet_embed_base, tweet.id);
    Ok(iframe(
        &src,
        "Tweet",
        &options.embed_width.to_string(),
        &options.embed_height.to_string(),
    ))
}

pub(crate) fn equation(
    node: &Node,
    _: &ExportContext<'_>,
    _: &str,
) -> RuleResult {
    let Node::Equation(equation) = node else {
        return Err(mismatch(NodeType::Equation, node));
    };
    let code = Tag::new("code").wrap(&encode_text(&equation.equation));
    if equation.inline {
        Ok(code)
    } else {
        Ok(Tag::new("pre").wrap(&code))
    }
}

pub(crate) fn poll(node: &Node, _: &ExportContext<'_>, _: &str) -> RuleResult {
    let Node::Poll(poll) = node else {
        return Err(mismatch(NodeType::Poll, node));
    };
    let options: String = poll
        .options
        .iter()
        .map(|option| {
            let votes = match option.votes.len() {
                1 => "1 vote".to_owned(),
                n => format!("{n} votes"),
            };
            Tag::new("li").wrap(&format!("{} ({votes})", encode_text(&option.text)))
        })
        .collect();
    Ok(Tag::new("figure").wrap(&format!(
        "{}{}",
        Tag::new("figcaption").wrap(&encode_text(&poll.question)),
        Tag::new("ol").wrap(&options)
    )))
}

/// Unreadable entries have no markup.
pub(crate) fn placeholder(
    node: &Node,
    _: &ExportContext<'_>,
    _: &str,
) -> RuleResult {
    let Node::Placeholder(_) = node else {
        return Err(mismatch(NodeType::Placeholder, node));
    };
    Ok(String::new())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::html::exporter::{export_html, ExportOptions};
    use crate::nodes::{
        Collapsible, HeaderState, Image, Link, ListType, TableCell, TextFormat,
        Video,
    };
    use crate::registry::Registry;
    use crate::tests::testutils_tree::{paragraph, text, tree};
    use crate::tree::{Subtree, Tree};

    fn html(tree: &Tree) -> String {
        let options = ExportOptions::default();
        let out = export_html(tree, Registry::standard(), &options);
        assert!(out.warnings.is_empty(), "{:?}", out.warnings);
        out.html
    }

    fn html_of(node: Node) -> String {
        html(&tree(vec![Subtree::new(node)]))
    }

    #[test]
    fn formats_nest_in_a_fixed_order() {
        let node = Node::formatted_text(
            "a < b",
            TextFormat::CODE | TextFormat::BOLD | TextFormat::ITALIC,
        );
        assert_eq!(
            html(&tree(vec![paragraph(vec![Subtree::new(node)])])),
            "<p><strong><em><code>a &lt; b</code></em></strong></p>"
        );
    }

    #[test]
    fn empty_paragraphs_keep_their_line() {
        assert_eq!(html(&tree(vec![paragraph(vec![])])), "<p><br></p>");
    }

    #[test]
    fn ordered_lists_carry_their_start() {
        let mut list = crate::nodes::List::new(ListType::Number);
        list.start = 3;
        let doc = tree(vec![Subtree::with_children(
            Node::List(list),
            vec![Subtree::with_children(Node::list_item(), vec![text("x")])],
        )]);
        assert_eq!(html(&doc), r#"<ol start="3"><li>x</li></ol>"#);
    }

    #[test]
    fn tables_have_a_body_and_header_cells() {
        let mut wide = TableCell::header(HeaderState::COLUMN);
        wide.col_span = 2;
        let doc = tree(vec![Subtree::with_children(
            Node::table(),
            vec![Subtree::with_children(
                Node::table_row(),
                vec![
                    Subtree::with_children(Node::TableCell(wide), vec![text("h")]),
                    Subtree::with_children(Node::table_cell(), vec![text("d")]),
                ],
            )],
        )]);
        assert_eq!(
            html(&doc),
            r#"<table><tbody><tr><th colspan="2">h</th><td>d</td></tr></tbody></table>"#
        );
    }

    #[test]
    fn blank_target_links_get_a_safe_rel() {
        let mut link = Link::new("https://example.com/?a=1&b=2");
        link.target = Some("_blank".into());
        let doc = tree(vec![paragraph(vec![Subtree::with_children(
            Node::Link(link),
            vec![text("go")],
        )])]);
        assert_eq!(
            html(&doc),
            r#"<p><a href="https://example.com/?a=1&amp;b=2" target="_blank" rel="noopener noreferrer">go</a></p>"#
        );
    }

    #[test]
    fn unsafe_links_fall_back_to_their_text() {
        let doc = tree(vec![paragraph(vec![Subtree::with_children(
            Node::link("javascript:alert(1)"),
            vec![text("click")],
        )])]);
        assert_eq!(html(&doc), "<p>click</p>");
    }

    #[test]
    fn unsafe_media_sources_fail_the_rule() {
        let doc = tree(vec![Subtree::new(Node::image("javascript:alert(1)", ""))]);
        let options = ExportOptions::default();
        let out = export_html(&doc, Registry::standard(), &options);
        assert_eq!(out.html, "");
        assert!(matches!(
            &out.warnings[0].kind,
            crate::diagnostics::WarningKind::Export(ExportError::UnsafeUrl(_))
        ));
    }

    #[test]
    fn video_flags_are_bare_attributes() {
        let mut video = Video::new("/uploads/clip.webm").with_alt_text("Clip");
        video.set_autoplay(true);
        video.set_muted(true);
        video.set_loop(true);
        video.set_controls(false);
        assert_eq!(
            html_of(Node::Video(video)),
            r#"<video src="/uploads/clip.webm" title="Clip" autoplay loop muted></video>"#
        );
    }

    #[test]
    fn embedded_videos_become_frames() {
        let video = Video::new("https://player.vimeo.com/video/76979871");
        assert_eq!(
            html_of(Node::Video(video)),
            r#"<iframe src="https://player.vimeo.com/video/76979871" title="Embedded video" width="560" height="315" allow="autoplay; fullscreen; picture-in-picture" allowfullscreen frameborder="0"></iframe>"#
        );
    }

    #[test]
    fn shown_captions_wrap_media_in_a_figure() {
        let mut image = Image::new("https://cdn.example.com/a.png", "A");
        image.show_caption = true;
        image.caption = Caption::new(tree(vec![paragraph(vec![text("cap")])]));
        assert_eq!(
            html_of(Node::Image(image)),
            r#"<figure><img src="https://cdn.example.com/a.png" alt="A"><figcaption><p>cap</p></figcaption></figure>"#
        );
    }

    #[test]
    fn hidden_captions_are_not_exported() {
        let mut image = Image::new("https://cdn.example.com/a.png", "");
        image.caption = Caption::new(tree(vec![paragraph(vec![text("cap")])]));
        assert_eq!(
            html_of(Node::Image(image)),
            r#"<img src="https://cdn.example.com/a.png" alt="">"#
        );
    }

    #[test]
    fn third_party_embeds_use_their_ids() {
        assert_eq!(
            html_of(Node::YouTube(crate::nodes::YouTube::new("dQw4w9WgXcQ"))),
            r#"<iframe src="https://www.youtube-nocookie.com/embed/dQw4w9WgXcQ" title="YouTube video" width="560" height="315" allow="autoplay; fullscreen; picture-in-picture" allowfullscreen frameborder="0"></iframe>"#
        );
        assert!(html_of(Node::Tweet(crate::nodes::Tweet::new("42")))
            .starts_with(r#"<iframe src="https://platform.twitter.com/embed/Tweet.html?id=42""#));
        assert!(html_of(Node::Figma(crate::nodes::Figma::new("AbC")))
            .contains("url=https%3A%2F%2Fwww.figma.com%2Ffile%2FAbC"));
    }

    #[test]
    fn invalid_embed_ids_fail_the_rule() {
        let doc = tree(vec![Subtree::new(Node::YouTube(
            crate::nodes::YouTube::new("\"><script>"),
        ))]);
        let options = ExportOptions::default();
        let out = export_html(&doc, Registry::standard(), &options);
        assert_eq!(out.html, "");
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn collapsibles_become_details() {
        let doc = tree(vec![Subtree::with_children(
            Node::CollapsibleContainer(Collapsible::default()),
            vec![
                Subtree::with_children(
                    Node::CollapsibleTitle(Default::default()),
                    vec![text("More")],
                ),
                Subtree::with_children(
                    Node::CollapsibleContent(Default::default()),
                    vec![paragraph(vec![text("x")])],
                ),
            ],
        )]);
        assert_eq!(
            html(&doc),
            "<details open><summary>More</summary><p>x</p></details>"
        );
    }

    #[test]
    fn polls_and_equations() {
        let mut poll = crate::nodes::Poll::new("Tea?");
        poll.options.push(crate::nodes::PollOption::new("a", "Yes"));
        assert_eq!(
            html_of(Node::Poll(poll)),
            "<figure><figcaption>Tea?</figcaption><ol><li>Yes (0 votes)</li></ol></figure>"
        );
        assert_eq!(
            html_of(Node::Equation(crate::nodes::Equation::new("a<b", false))),
            "<pre><code>a&lt;b</code></pre>"
        );
        assert_eq!(html_of(Node::PageBreak), "");
    }
}
