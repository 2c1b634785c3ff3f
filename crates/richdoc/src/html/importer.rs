// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! HTML to tree.
//!
//! Pasted markup and documents that were stored as HTML are parsed into a
//! [`PaDom`] and converted element by element. Markup without a node
//! equivalent is unwrapped (its content is kept) or, for script-like
//! elements, dropped. Warning paths point at the element in the source
//! markup, counting children of the fragment root.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, instrument, warn};

use super::padom::{PaDom, PaDomHandle, PaDomNode, PaNodeContainer};
use super::padom_creator::PaDomCreator;
use super::url_policy::{is_allowed_frame, is_safe_url, UrlUse};
use crate::diagnostics::{NodePath, Warning, WarningKind};
use crate::nodes::{
    Caption, Code, Collapsible, Dimension, Direction, ElementAttrs,
    ElementFormat, HeaderState, Heading, HeadingTag, Image, Link, List,
    ListItem, ListType, Node, SourceKind, TableCell, TextFormat, Video,
    YouTube,
};
use crate::tree::{Subtree, Tree};

static WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ \t\n\r\x0C]+").unwrap());

/// Dropped together with their content.
const DROPPED_TAGS: &[&str] = &[
    "script", "style", "noscript", "template", "object", "embed", "applet",
    "svg", "math", "textarea", "select", "button", "input", "form", "head",
    "title", "meta", "link", "base",
];

/// Wrappers whose content is kept without comment.
const TRANSPARENT_TAGS: &[&str] = &[
    "html", "body", "div", "section", "article", "main", "header", "footer",
    "nav", "aside", "font", "center", "small", "big", "abbr", "cite", "q",
    "time", "label", "figcaption", "summary", "li", "source",
];

/// Alt text of imported videos without a title.
pub(crate) const DEFAULT_VIDEO_ALT: &str = "Video";

/// Default nesting limit of imported documents. Stored states of deeper
/// trees exceed the nesting `serde_json` reads back.
pub const MAX_IMPORT_DEPTH: usize = 48;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportOptions {
    /// Hosts iframes may be imported from, subdomains included. `None`
    /// accepts any absolute `http(s)` source.
    pub iframe_hosts: Option<Vec<String>>,
    /// Elements nested deeper than this are dropped with their content.
    pub max_depth: usize,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            iframe_hosts: None,
            max_depth: MAX_IMPORT_DEPTH,
        }
    }
}

#[derive(Debug, PartialEq)]
pub struct Imported {
    pub tree: Tree,
    pub warnings: Vec<Warning>,
}

#[instrument(skip_all, fields(bytes = html.len()))]
pub fn import_html(html: &str, options: &ImportOptions) -> Imported {
    let dom = PaDomCreator::parse(html);
    let mut converter = Converter::new(options);
    let blocks =
        converter.blocks(&dom, dom.document_handle(), &NodePath::root());
    let tree = converter.tree(blocks, NodePath::root());
    debug!(
        nodes = tree.len(),
        warnings = converter.warnings.len(),
        "Imported HTML"
    );
    Imported {
        tree,
        warnings: converter.warnings,
    }
}

/// Inline content collected while walking the children of one element.
/// Adjacent text in the same format is merged into one text node.
#[derive(Default)]
pub(crate) struct Flow {
    items: Vec<Subtree>,
    text: String,
    format: TextFormat,
}

impl Flow {
    pub(crate) fn push_text(
        &mut self,
        text: &str,
        format: TextFormat,
        preformatted: bool,
    ) {
        if preformatted {
            for (i, line) in text.split('\n').enumerate() {
                if i > 0 {
                    self.push(Subtree::new(Node::LineBreak));
                }
                self.append(line, format);
            }
        } else {
            self.append(&WHITESPACE.replace_all(text, " "), format);
        }
    }

    fn append(&mut self, text: &str, format: TextFormat) {
        if text.is_empty() {
            return;
        }
        if self.format != format {
            self.flush();
        }
        self.format = format;
        self.text.push_str(text);
    }

    fn flush(&mut self) {
        if !self.text.is_empty() {
            let text = std::mem::take(&mut self.text);
            self.items
                .push(Subtree::new(Node::formatted_text(text, self.format)));
        }
    }

    pub(crate) fn push(&mut self, subtree: Subtree) {
        self.flush();
        self.items.push(subtree);
    }

    pub(crate) fn finish(mut self) -> Vec<Subtree> {
        self.flush();
        self.items
    }
}

pub(crate) fn is_blank(subtree: &Subtree) -> bool {
    matches!(subtree.node(), Node::Text(t) if t.text.trim().is_empty())
}

/// Group runs of inline content into paragraphs. Runs holding only
/// whitespace are dropped.
pub(crate) fn blockify(items: Vec<Subtree>) -> Vec<Subtree> {
    fn flush(blocks: &mut Vec<Subtree>, run: &mut Vec<Subtree>) {
        let run = std::mem::take(run);
        if !run.iter().all(is_blank) {
            blocks.push(Subtree::with_children(Node::paragraph(), run));
        }
    }

    let mut blocks = Vec::new();
    let mut run = Vec::new();
    for item in items {
        if item.node().node_type().is_inline() {
            run.push(item);
        } else {
            flush(&mut blocks, &mut run);
            blocks.push(item);
        }
    }
    flush(&mut blocks, &mut run);
    blocks
}

fn video_alt(el: &PaNodeContainer) -> &str {
    el.get_attr("title")
        .filter(|title| !title.trim().is_empty())
        .unwrap_or(DEFAULT_VIDEO_ALT)
}

fn heading_tag(tag: &str) -> Option<HeadingTag> {
    let level = tag.strip_prefix('h')?.parse::<u8>().ok()?;
    HeadingTag::from_level(level)
}

/// Formatting that external sources express with `span` styles.
fn span_format(el: &PaNodeContainer) -> TextFormat {
    let mut format = TextFormat::empty();
    if el.contains_style("font-weight", "bold")
        || el.contains_style("font-weight", "700")
    {
        format.insert(TextFormat::BOLD);
    }
    if el.contains_style("font-style", "italic") {
        format.insert(TextFormat::ITALIC);
    }
    if el.contains_style("text-decoration", "underline") {
        format.insert(TextFormat::UNDERLINE);
    }
    if el.contains_style("text-decoration", "line-through") {
        format.insert(TextFormat::STRIKETHROUGH);
    }
    format
}

fn element_attrs(el: &PaNodeContainer) -> ElementAttrs {
    let format = ["left", "center", "right", "justify", "start", "end"]
        .into_iter()
        .find(|align| el.contains_style("text-align", align))
        .and_then(|align| align.parse().ok())
        .unwrap_or(ElementFormat::Unset);
    ElementAttrs {
        direction: el
            .get_attr("dir")
            .and_then(|dir| dir.parse::<Direction>().ok()),
        format,
        indent: 0,
    }
}

fn dimension(el: &PaNodeContainer, attr: &str) -> Dimension {
    match el.get_attr(attr).and_then(|v| v.trim().parse::<f64>().ok()) {
        Some(px) if px > 0.0 && px.is_finite() => Dimension::Pixels(px),
        _ => Dimension::Inherit,
    }
}

fn span_attr(el: &PaNodeContainer, attr: &str) -> u32 {
    el.get_attr(attr)
        .and_then(|v| v.trim().parse::<u32>().ok())
        .unwrap_or(1)
        .max(1)
}

fn container_children<'d>(
    dom: &'d PaDom,
    handle: &PaDomHandle,
) -> &'d [PaDomHandle] {
    dom.get_node(handle).children()
}

fn as_element<'d>(
    dom: &'d PaDom,
    handle: &PaDomHandle,
) -> Option<&'d PaNodeContainer> {
    match dom.get_node(handle) {
        PaDomNode::Container(el) => Some(el),
        _ => None,
    }
}

struct Converter<'o> {
    options: &'o ImportOptions,
    warnings: Vec<Warning>,
    format: TextFormat,
    preformatted: bool,
    depth: usize,
    depth_cut: bool,
}

impl<'o> Converter<'o> {
    fn new(options: &'o ImportOptions) -> Self {
        Self {
            options,
            warnings: Vec::new(),
            format: TextFormat::empty(),
            preformatted: false,
            depth: 0,
            depth_cut: false,
        }
    }

    fn warn(&mut self, path: NodePath, message: String) {
        warn!(path = %path, "{message}");
        self.warnings
            .push(Warning::new(path, WarningKind::Import(message)));
    }

    fn tree(&mut self, blocks: Vec<Subtree>, path: NodePath) -> Tree {
        match Tree::from_subtree(blocks) {
            Ok(tree) => tree,
            Err(err) => {
                self.warn(path, err.to_string());
                Tree::new()
            }
        }
    }

    /// Children of `handle` as block content.
    fn blocks(
        &mut self,
        dom: &PaDom,
        handle: &PaDomHandle,
        path: &NodePath,
    ) -> Vec<Subtree> {
        blockify(self.children(dom, handle, path))
    }

    /// Children of `handle` as they come.
    fn children(
        &mut self,
        dom: &PaDom,
        handle: &PaDomHandle,
        path: &NodePath,
    ) -> Vec<Subtree> {
        let mut flow = Flow::default();
        self.inline_children(dom, handle, path, &mut flow);
        flow.finish()
    }

    fn inline_children(
        &mut self,
        dom: &PaDom,
        handle: &PaDomHandle,
        path: &NodePath,
        flow: &mut Flow,
    ) {
        for (i, child) in container_children(dom, handle).iter().enumerate() {
            self.node(dom, child, path.child(i), flow);
        }
    }

    fn with_format(
        &mut self,
        extra: TextFormat,
        f: impl FnOnce(&mut Self),
    ) {
        let saved = self.format;
        self.format = saved | extra;
        f(self);
        self.format = saved;
    }

    fn node(
        &mut self,
        dom: &PaDom,
        handle: &PaDomHandle,
        path: NodePath,
        flow: &mut Flow,
    ) {
        match dom.get_node(handle) {
            PaDomNode::Text(text) => {
                flow.push_text(&text.content, self.format, self.preformatted)
            }
            PaDomNode::Comment => {}
            PaDomNode::Document(_) => {
                self.inline_children(dom, handle, &path, flow)
            }
            PaDomNode::Container(el) => {
                if self.depth >= self.options.max_depth {
                    if !self.depth_cut {
                        self.depth_cut = true;
                        let reason = "markup nested too deeply was dropped";
                        self.warn(path, reason.into());
                    }
                    return;
                }
                self.depth += 1;
                self.element(dom, handle, el, path, flow);
                self.depth -= 1;
            }
        }
    }

    fn element(
        &mut self,
        dom: &PaDom,
        handle: &PaDomHandle,
        el: &PaNodeContainer,
        path: NodePath,
        flow: &mut Flow,
    ) {
        let tag = el.tag();
        if tag == "code" && self.preformatted {
            self.inline_children(dom, handle, &path, flow);
            return;
        }
        if let Some(format) = TextFormat::from_tag(tag) {
            self.with_format(format, |cx| {
                cx.inline_children(dom, handle, &path, flow)
            });
            return;
        }
        if let Some(heading_tag) = heading_tag(tag) {
            let mut heading = Heading::new(heading_tag);
            heading.element = element_attrs(el);
            let children = self.children(dom, handle, &path);
            flow.push(Subtree::with_children(Node::Heading(heading), children));
            return;
        }

        match tag {
            "span" => {
                let format = span_format(el);
                self.with_format(format, |cx| {
                    cx.inline_children(dom, handle, &path, flow)
                });
            }
            "br" => flow.push(Subtree::new(Node::LineBreak)),
            "hr" => flow.push(Subtree::new(Node::HorizontalRule)),
            "p" => {
                let children = self.children(dom, handle, &path);
                flow.push(Subtree::with_children(
                    Node::Paragraph(element_attrs(el)),
                    children,
                ));
            }
            "blockquote" => {
                let children = self.blocks(dom, handle, &path);
                flow.push(Subtree::with_children(
                    Node::Quote(element_attrs(el)),
                    children,
                ));
            }
            "pre" => flow.push(self.code_block(dom, handle, el, &path)),
            "ul" | "ol" => flow.push(self.list(dom, handle, el, &path)),
            "table" => {
                let mut rows = Vec::new();
                self.rows(dom, handle, &path, &mut rows);
                flow.push(Subtree::with_children(Node::table(), rows));
            }
            "a" => self.link(dom, handle, el, path, flow),
            "img" | "video" | "iframe" => {
                let media = self.media_with_source(dom, handle, el, path);
                if let Some(node) = media {
                    flow.push(Subtree::new(node));
                }
            }
            "figure" => self.figure(dom, handle, path, flow),
            "details" => flow.push(self.details(dom, handle, el, &path)),
            _ if DROPPED_TAGS.contains(&tag) => {
                let reason = format!("`{tag}` was dropped with its content");
                self.warn(path, reason);
            }
            _ if TRANSPARENT_TAGS.contains(&tag) => {
                self.inline_children(dom, handle, &path, flow)
            }
            _ => {
                let reason = format!("unknown tag `{tag}` was unwrapped");
                self.warn(path.clone(), reason);
                self.inline_children(dom, handle, &path, flow);
            }
        }
    }

    fn code_block(
        &mut self,
        dom: &PaDom,
        handle: &PaDomHandle,
        el: &PaNodeContainer,
        path: &NodePath,
    ) -> Subtree {
        let language = el.get_attr("data-language").map(str::to_owned).or_else(|| {
            container_children(dom, handle)
                .iter()
                .filter_map(|child| as_element(dom, child))
                .filter(|child| child.tag() == "code")
                .find_map(|code| {
                    code.get_attr("class")?
                        .split_whitespace()
                        .find_map(|class| class.strip_prefix("language-"))
                        .map(str::to_owned)
                })
        });
        let saved = self.preformatted;
        self.preformatted = true;
        let children = self.children(dom, handle, path);
        self.preformatted = saved;
        let code = Code {
            language,
            element: element_attrs(el),
        };
        Subtree::with_children(Node::Code(code), children)
    }

    fn list(
        &mut self,
        dom: &PaDom,
        handle: &PaDomHandle,
        el: &PaNodeContainer,
        path: &NodePath,
    ) -> Subtree {
        let mut list = if el.tag() == "ol" {
            List::new(ListType::Number)
        } else {
            List::new(ListType::Bullet)
        };
        if list.list_type == ListType::Number {
            list.start = el
                .get_attr("start")
                .and_then(|start| start.trim().parse().ok())
                .unwrap_or(1);
        }
        let mut value = list.start;
        let mut items = Vec::new();
        for (i, child) in container_children(dom, handle).iter().enumerate() {
            let child_path = path.child(i);
            let children = match as_element(dom, child) {
                Some(item) if item.tag() == "li" => {
                    self.children(dom, child, &child_path)
                }
                _ => {
                    // Stray content gets an item of its own.
                    let mut flow = Flow::default();
                    self.node(dom, child, child_path, &mut flow);
                    let children = flow.finish();
                    if children.iter().all(is_blank) {
                        continue;
                    }
                    children
                }
            };
            let item = ListItem {
                value,
                ..ListItem::default()
            };
            value = value.saturating_add(1);
            items.push(Subtree::with_children(Node::ListItem(item), children));
        }
        Subtree::with_children(Node::List(list), items)
    }

    fn rows(
        &mut self,
        dom: &PaDom,
        handle: &PaDomHandle,
        path: &NodePath,
        rows: &mut Vec<Subtree>,
    ) {
        for (i, child) in container_children(dom, handle).iter().enumerate() {
            let Some(el) = as_element(dom, child) else {
                continue;
            };
            let child_path = path.child(i);
            match el.tag() {
                "thead" | "tbody" | "tfoot" => {
                    self.rows(dom, child, &child_path, rows)
                }
                "tr" => {
                    let cells = self.cells(dom, child, &child_path);
                    rows.push(Subtree::with_children(Node::table_row(), cells));
                }
                other => self.warn(
                    child_path,
                    format!("`{other}` inside a table was dropped"),
                ),
            }
        }
    }

    fn cells(
        &mut self,
        dom: &PaDom,
        handle: &PaDomHandle,
        path: &NodePath,
    ) -> Vec<Subtree> {
        let mut cells = Vec::new();
        for (i, child) in container_children(dom, handle).iter().enumerate() {
            let Some(el) = as_element(dom, child) else {
                continue;
            };
            let mut cell = match el.tag() {
                "th" => TableCell::header(HeaderState::ROW),
                "td" => TableCell::default(),
                _ => continue,
            };
            cell.col_span = span_attr(el, "colspan");
            cell.row_span = span_attr(el, "rowspan");
            let children = self.blocks(dom, child, &path.child(i));
            cells.push(Subtree::with_children(Node::TableCell(cell), children));
        }
        cells
    }

    fn link(
        &mut self,
        dom: &PaDom,
        handle: &PaDomHandle,
        el: &PaNodeContainer,
        path: NodePath,
        flow: &mut Flow,
    ) {
        let href = el.get_attr("href").map(str::trim);
        match href {
            Some(href) if is_safe_url(href, UrlUse::Link) => {
                let mut link = Link::new(href);
                link.title = el.get_attr("title").map(str::to_owned);
                link.target = el.get_attr("target").map(str::to_owned);
                link.rel = el.get_attr("rel").map(str::to_owned);
                let children = self.children(dom, handle, &path);
                flow.push(Subtree::with_children(Node::Link(link), children));
            }
            Some(href) => {
                let reason = format!("unsafe link `{href}` was unwrapped");
                self.warn(path.clone(), reason);
                self.inline_children(dom, handle, &path, flow);
            }
            None => self.inline_children(dom, handle, &path, flow),
        }
    }

    fn media_src(
        &mut self,
        src: Option<&str>,
        usage: UrlUse,
        path: &NodePath,
    ) -> Option<String> {
        let src = src?.trim();
        let local = src
            .get(..5)
            .map(|scheme| scheme.eq_ignore_ascii_case("file:"))
            .unwrap_or(false);
        if local {
            let reason = format!("local media source `{src}` was ignored");
            self.warn(path.clone(), reason);
            return None;
        }
        let safe = match usage {
            UrlUse::Frame => {
                is_allowed_frame(src, self.options.iframe_hosts.as_deref())
            }
            usage => is_safe_url(src, usage),
        };
        if !safe {
            let reason = format!("media source `{src}` was refused");
            self.warn(path.clone(), reason);
            return None;
        }
        Some(src.to_owned())
    }

    fn media(&mut self, el: &PaNodeContainer, path: NodePath) -> Option<Node> {
        match el.tag() {
            "img" => {
                let src =
                    self.media_src(el.get_attr("src"), UrlUse::Media, &path)?;
                let alt = el.get_attr("alt").unwrap_or("");
                let mut image = Image::new(src, alt);
                image.width = dimension(el, "width");
                image.height = dimension(el, "height");
                Some(Node::Image(image))
            }
            "video" => {
                let src =
                    self.media_src(el.get_attr("src"), UrlUse::Media, &path)?;
                let mut video = Video::new(src).with_alt_text(video_alt(el));
                video.source_kind = SourceKind::File;
                video.set_controls(el.get_attr("controls").is_some());
                video.set_autoplay(el.get_attr("autoplay").is_some());
                video.set_loop(el.get_attr("loop").is_some());
                video.set_muted(el.get_attr("muted").is_some());
                video.set_width_and_height(
                    dimension(el, "width"),
                    dimension(el, "height"),
                );
                Some(Node::Video(video))
            }
            "iframe" => {
                let src =
                    self.media_src(el.get_attr("src"), UrlUse::Frame, &path)?;
                if let Some(youtube) = YouTube::from_url(&src) {
                    return Some(Node::YouTube(youtube));
                }
                let mut video = Video::new(src).with_alt_text(video_alt(el));
                video.source_kind = SourceKind::Embed;
                video.set_width_and_height(
                    dimension(el, "width"),
                    dimension(el, "height"),
                );
                Some(Node::Video(video))
            }
            _ => None,
        }
    }

    /// `<video>` keeps its source in a child `<source>` as often as in its
    /// own `src`.
    fn video_source<'d>(
        dom: &'d PaDom,
        handle: &PaDomHandle,
    ) -> Option<&'d str> {
        container_children(dom, handle)
            .iter()
            .filter_map(|child| as_element(dom, child))
            .filter(|child| child.tag() == "source")
            .find_map(|source| source.get_attr("src"))
    }

    fn figure(
        &mut self,
        dom: &PaDom,
        handle: &PaDomHandle,
        path: NodePath,
        flow: &mut Flow,
    ) {
        let is_media = |child: &PaDomHandle| {
            as_element(dom, child)
                .map(|el| matches!(el.tag(), "img" | "video" | "iframe"))
                .unwrap_or(false)
        };
        let children = container_children(dom, handle);
        if !children.iter().any(is_media) {
            self.inline_children(dom, handle, &path, flow);
            return;
        }

        let mut media = None;
        let mut caption = None;
        for (i, child) in children.iter().enumerate() {
            let Some(el) = as_element(dom, child) else {
                continue;
            };
            let child_path = path.child(i);
            match el.tag() {
                "img" | "video" | "iframe" if media.is_none() => {
                    let found =
                        self.media_with_source(dom, child, el, child_path);
                    media = Some(found);
                }
                "figcaption" if caption.is_none() => {
                    let blocks = self.blocks(dom, child, &child_path);
                    let tree = self.tree(blocks, child_path.clone());
                    caption = Some((tree, child_path));
                }
                other => self.warn(
                    child_path,
                    format!("`{other}` beside figure media was dropped"),
                ),
            }
        }

        let Some(Some(mut node)) = media else {
            return;
        };
        if let Some((tree, caption_path)) = caption {
            match &mut node {
                Node::Image(image) => image.show_caption = true,
                Node::Video(video) => video.set_show_caption(true),
                _ => {
                    let reason = "caption of an embed was dropped";
                    self.warn(caption_path, reason.into())
                }
            }
            if let Some(slot) = node.caption_mut() {
                *slot = Caption::new(tree);
            }
        }
        flow.push(Subtree::new(node));
    }

    fn media_with_source(
        &mut self,
        dom: &PaDom,
        handle: &PaDomHandle,
        el: &PaNodeContainer,
        path: NodePath,
    ) -> Option<Node> {
        if el.tag() == "video" && el.get_attr("src").is_none() {
            let mut with_src = el.clone();
            if let Some(src) = Self::video_source(dom, handle) {
                with_src.attrs.push(("src".to_owned(), src.to_owned()));
            }
            return self.media(&with_src, path);
        }
        self.media(el, path)
    }

    fn details(
        &mut self,
        dom: &PaDom,
        handle: &PaDomHandle,
        el: &PaNodeContainer,
        path: &NodePath,
    ) -> Subtree {
        let collapsible = Collapsible {
            open: el.get_attr("open").is_some(),
            element: ElementAttrs::default(),
        };
        let mut title = None;
        let mut content = Flow::default();
        for (i, child) in container_children(dom, handle).iter().enumerate() {
            let child_path = path.child(i);
            let is_summary = as_element(dom, child)
                .map(|el| el.tag() == "summary")
                .unwrap_or(false);
            if is_summary && title.is_none() {
                title = Some(self.children(dom, child, &child_path));
            } else {
                self.node(dom, child, child_path, &mut content);
            }
        }
        Subtree::with_children(
            Node::CollapsibleContainer(collapsible),
            vec![
                Subtree::with_children(
                    Node::CollapsibleTitle(ElementAttrs::default()),
                    title.unwrap_or_default(),
                ),
                Subtree::with_children(
                    Node::CollapsibleContent(ElementAttrs::default()),
                    blockify(content.finish()),
                ),
            ],
        )
    }
}

#[cfg(test)]
mod test {
    use indoc::indoc;
    use speculoos::{assert_that, prelude::*};

    use super::*;

    fn outline(html: &str) -> String {
        import_html(html, &ImportOptions::default()).tree.to_tree_string()
    }

    #[test]
    fn blocks_and_inline_formatting_are_converted() {
        assert_eq!(
            outline("<h2>Title</h2><p>a <b>bold <i>move</i></b></p>"),
            indoc! {r#"
                root
                ├>heading h2
                │ └>"Title"
                └>paragraph
                  ├>"a "
                  ├>"bold " [1]
                  └>"move" [3]
            "#}
        );
    }

    #[test]
    fn styled_spans_become_formats() {
        assert_eq!(
            outline(r#"<p><span style="font-weight:700; font-style: italic">x</span></p>"#),
            indoc! {r#"
                root
                └>paragraph
                  └>"x" [3]
            "#}
        );
    }

    #[test]
    fn stray_inline_content_is_wrapped_in_paragraphs() {
        assert_eq!(
            outline("loose <em>text</em><hr>more"),
            indoc! {r#"
                root
                ├>paragraph
                │ ├>"loose "
                │ └>"text" [2]
                ├>horizontalrule
                └>paragraph
                  └>"more"
            "#}
        );
    }

    #[test]
    fn lists_keep_their_start() {
        assert_eq!(
            outline("<ol start=\"4\">\n<li>a</li>\n<li>b</li>\n</ol>"),
            indoc! {r#"
                root
                └>list number
                  ├>listitem
                  │ └>"a"
                  └>listitem
                    └>"b"
            "#}
        );
        let imported = import_html("<ol start=\"4\"><li>a</li></ol>", &Default::default());
        let list = imported.tree.children(imported.tree.root())[0];
        match imported.tree.get(list) {
            Some(Node::List(list)) => assert_eq!(list.start, 4),
            other => panic!("expected a list, got {other:?}"),
        }
    }

    #[test]
    fn tables_flatten_their_sections() {
        assert_eq!(
            outline("<table><thead><tr><th>h</th></tr></thead><tbody><tr><td>d</td></tr></tbody></table>"),
            indoc! {r#"
                root
                └>table
                  ├>tablerow
                  │ └>tablecell
                  │   └>paragraph
                  │     └>"h"
                  └>tablerow
                    └>tablecell
                      └>paragraph
                        └>"d"
            "#}
        );
    }

    #[test]
    fn videos_and_iframes_become_video_nodes() {
        assert_eq!(
            outline(indoc! {r#"
                <video controls><source src="https://cdn.example.com/a.mp4"></video>
                <iframe src="https://player.vimeo.com/video/1"></iframe>
                <iframe src="https://www.youtube.com/embed/dQw4w9WgXcQ"></iframe>
            "#}),
            indoc! {r#"
                root
                ├>video https://cdn.example.com/a.mp4 (file)
                ├>video https://player.vimeo.com/video/1 (embed)
                └>youtube dQw4w9WgXcQ
            "#}
        );
    }

    #[test]
    fn untitled_videos_are_called_video() {
        let imported = import_html(
            indoc! {r#"
                <video src="https://cdn.example.com/a.mp4"></video>
                <iframe src="https://player.vimeo.com/video/1" title=" "></iframe>
                <iframe src="https://player.vimeo.com/video/2" title="Launch"></iframe>
            "#},
            &ImportOptions::default(),
        );
        let tree = &imported.tree;
        let alts: Vec<_> = tree
            .children(tree.root())
            .iter()
            .filter_map(|key| match tree.get(*key) {
                Some(Node::Video(video)) => Some(video.alt_text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(alts, vec!["Video", "Video", "Launch"]);
    }

    #[test]
    fn local_and_unsafe_sources_are_ignored() {
        let imported = import_html(
            r#"<video src="file:///home/a.mp4"></video><img src="javascript:x"><iframe src="/rel"></iframe>"#,
            &ImportOptions::default(),
        );
        assert_that!(imported.tree.is_empty()).is_true();
        assert_eq!(imported.warnings.len(), 3);
    }

    #[test]
    fn figures_carry_their_caption() {
        let imported = import_html(
            r#"<figure><img src="/a.png" alt="A"><figcaption>The <b>cap</b></figcaption></figure>"#,
            &ImportOptions::default(),
        );
        let tree = &imported.tree;
        let key = tree.children(tree.root())[0];
        let Some(Node::Image(image)) = tree.get(key) else {
            panic!("expected an image");
        };
        assert!(image.show_caption);
        assert_eq!(image.alt_text, "A");
        assert_eq!(
            image.caption.tree().to_tree_string(),
            indoc! {r#"
                root
                └>paragraph
                  ├>"The "
                  └>"cap" [1]
            "#}
        );
    }

    #[test]
    fn details_become_collapsibles() {
        assert_eq!(
            outline("<details><summary>More</summary><p>x</p></details>"),
            indoc! {r#"
                root
                └>collapsible-container
                  ├>collapsible-title
                  │ └>"More"
                  └>collapsible-content
                    └>paragraph
                      └>"x"
            "#}
        );
    }

    #[test]
    fn preformatted_code_keeps_its_lines() {
        assert_eq!(
            outline("<pre><code class=\"language-rust\">a\nb</code></pre>"),
            indoc! {r#"
                root
                └>code
                  ├>"a"
                  ├>linebreak
                  └>"b"
            "#}
        );
    }

    #[test]
    fn scripts_are_dropped_and_unknown_tags_unwrapped() {
        let imported = import_html(
            "<p>a<script>x()</script><blink>b</blink></p>",
            &ImportOptions::default(),
        );
        assert_eq!(
            imported.tree.to_tree_string(),
            indoc! {r#"
                root
                └>paragraph
                  └>"ab"
            "#}
        );
        assert_eq!(imported.warnings.len(), 2);
        assert_eq!(imported.warnings[0].path.to_string(), "root/0/0/1");
    }

    #[test]
    fn unsafe_links_are_unwrapped() {
        assert_eq!(
            outline(r#"<p><a href="javascript:x">t</a> <a href="/ok">u</a></p>"#),
            indoc! {r#"
                root
                └>paragraph
                  ├>"t "
                  └>link /ok
                    └>"u"
            "#}
        );
    }

    #[test]
    fn deep_nesting_is_cut() {
        let imported = import_html(
            &"<blockquote>".repeat(10),
            &ImportOptions {
                max_depth: 4,
                ..Default::default()
            },
        );
        assert_eq!(imported.warnings.len(), 1);
    }
}
