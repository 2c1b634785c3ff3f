// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

use once_cell::sync::Lazy;
use pulldown_cmark::{
    CodeBlockKind, Event, HeadingLevel, LinkType, Options, Parser, Tag,
};
use regex::Regex;
use tracing::{debug, instrument, warn};

use crate::error::TreeError;
use crate::html::importer::{
    blockify, Flow, DEFAULT_VIDEO_ALT, MAX_IMPORT_DEPTH,
};
use crate::nodes::{
    Code, Equation, HeaderState, HeadingTag, Image, Link, List, ListItem,
    ListType, Node, TableCell, TextFormat, Video,
};
use crate::tree::{Subtree, Tree};

/// Raw HTML that stands for a video.
static IFRAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<iframe[^>]*src="([^"]*)"[^>]*>"#).unwrap());
static IFRAME_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*</iframe>\s*$").unwrap());

/// Width given to videos that come from markdown.
const VIDEO_MAX_WIDTH: u32 = 800;

fn options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_MATH
}

fn heading_tag(level: HeadingLevel) -> HeadingTag {
    match level {
        HeadingLevel::H1 => HeadingTag::H1,
        HeadingLevel::H2 => HeadingTag::H2,
        HeadingLevel::H3 => HeadingTag::H3,
        HeadingLevel::H4 => HeadingTag::H4,
        HeadingLevel::H5 => HeadingTag::H5,
        HeadingLevel::H6 => HeadingTag::H6,
    }
}

/// Parse markdown into a document tree.
#[instrument(skip_all, fields(bytes = markdown.len()))]
pub fn import_markdown(markdown: &str) -> Result<Tree, TreeError> {
    let mut builder = Builder::default();
    for event in Parser::new_ext(markdown, options()) {
        builder.event(event);
    }
    let tree = Tree::from_subtree(blockify(builder.root.finish()))?;
    debug!(nodes = tree.len(), "Imported markdown");
    Ok(tree)
}

struct Frame {
    node: Node,
    flow: Flow,
    /// List items opened so far, for numbering.
    items: u32,
}

struct PendingImage {
    src: String,
    alt: String,
}

/// What an `End` event closes.
enum Opened {
    Frame,
    HtmlBlock,
    Format(TextFormat),
    Image,
    Transparent,
}

#[derive(Default)]
struct Builder {
    root: Flow,
    frames: Vec<Frame>,
    opened: Vec<Opened>,
    format: TextFormat,
    image: Option<PendingImage>,
    code: Option<String>,
    in_table_head: bool,
    depth_cut: bool,
}

impl Builder {
    fn flow(&mut self) -> &mut Flow {
        match self.frames.last_mut() {
            Some(frame) => &mut frame.flow,
            None => &mut self.root,
        }
    }

    fn push(&mut self, subtree: Subtree) {
        self.flow().push(subtree);
    }

    fn text(&mut self, text: &str, format: TextFormat) {
        if let Some(image) = &mut self.image {
            image.alt.push_str(text);
        } else if let Some(code) = &mut self.code {
            code.push_str(text);
        } else {
            self.flow().push_text(text, format, false);
        }
    }

    /// Past [`MAX_IMPORT_DEPTH`] the start tag is dropped and its content
    /// lands in the innermost open frame.
    fn at_depth_limit(&mut self) -> bool {
        if self.frames.len() < MAX_IMPORT_DEPTH {
            return false;
        }
        if !self.depth_cut {
            self.depth_cut = true;
            warn!(
                max_depth = MAX_IMPORT_DEPTH,
                "Markdown nested too deeply was flattened"
            );
        }
        self.opened.push(Opened::Transparent);
        true
    }

    fn open(&mut self, node: Node) -> bool {
        if self.at_depth_limit() {
            return false;
        }
        self.frames.push(Frame {
            node,
            flow: Flow::default(),
            items: 0,
        });
        self.opened.push(Opened::Frame);
        true
    }

    fn with_format(&mut self, extra: TextFormat) {
        self.opened.push(Opened::Format(self.format));
        self.format.insert(extra);
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(_) => self.end(),
            Event::Text(text) => self.text(&text, self.format),
            Event::Code(code) => {
                self.text(&code, self.format | TextFormat::CODE)
            }
            Event::InlineMath(math) => {
                let equation = Equation::new(&*math, true);
                self.push(Subtree::new(Node::Equation(equation)))
            }
            Event::DisplayMath(math) => {
                let equation = Equation::new(&*math, false);
                self.push(Subtree::new(Node::Equation(equation)))
            }
            Event::Html(html) | Event::InlineHtml(html) => self.html(&html),
            Event::SoftBreak => self.text(" ", self.format),
            Event::HardBreak => self.push(Subtree::new(Node::LineBreak)),
            Event::Rule => self.push(Subtree::new(Node::HorizontalRule)),
            Event::TaskListMarker(checked) => self.task(checked),
            Event::FootnoteReference(_) => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {
                self.open(Node::paragraph());
            }
            Tag::Heading { level, .. } => {
                self.open(Node::heading(heading_tag(level)));
            }
            Tag::BlockQuote(_) => {
                self.open(Node::quote());
            }
            Tag::CodeBlock(kind) => {
                let language = match kind {
                    CodeBlockKind::Fenced(info) => {
                        info.split_whitespace().next().map(str::to_owned)
                    }
                    CodeBlockKind::Indented => None,
                };
                let code = Node::Code(Code {
                    language,
                    ..Code::default()
                });
                if self.open(code) {
                    self.code = Some(String::new());
                }
            }
            Tag::HtmlBlock => {
                if self.at_depth_limit() {
                    return;
                }
                self.frames.push(Frame {
                    node: Node::paragraph(),
                    flow: Flow::default(),
                    items: 0,
                });
                self.opened.push(Opened::HtmlBlock);
            }
            Tag::List(Some(start)) => {
                let mut list = List::new(ListType::Number);
                list.start = u32::try_from(start).unwrap_or(u32::MAX);
                self.open(Node::List(list));
            }
            Tag::List(None) => {
                self.open(Node::list(ListType::Bullet));
            }
            Tag::Item => {
                let mut item = ListItem::default();
                if let Some(parent) = self.frames.last_mut() {
                    parent.items += 1;
                    if let Node::List(list) = &parent.node {
                        item.value =
                            list.start.saturating_add(parent.items - 1);
                    }
                }
                self.open(Node::ListItem(item));
            }
            Tag::Table(_) => {
                self.open(Node::table());
            }
            Tag::TableHead => {
                if self.open(Node::table_row()) {
                    self.in_table_head = true;
                }
            }
            Tag::TableRow => {
                self.open(Node::table_row());
            }
            Tag::TableCell => {
                let cell = if self.in_table_head {
                    TableCell::header(HeaderState::ROW)
                } else {
                    TableCell::default()
                };
                self.open(Node::TableCell(cell));
            }
            Tag::Emphasis => self.with_format(TextFormat::ITALIC),
            Tag::Strong => self.with_format(TextFormat::BOLD),
            Tag::Strikethrough => self.with_format(TextFormat::STRIKETHROUGH),
            Tag::Link {
                link_type,
                dest_url,
                title,
                ..
            } => {
                let mut link = Link::new(&*dest_url);
                if !title.is_empty() {
                    link.title = Some(title.to_string());
                }
                let node = match link_type {
                    LinkType::Autolink | LinkType::Email => {
                        Node::AutoLink(link)
                    }
                    _ => Node::Link(link),
                };
                self.open(node);
            }
            Tag::Image { dest_url, .. } => {
                self.image = Some(PendingImage {
                    src: dest_url.to_string(),
                    alt: String::new(),
                });
                self.opened.push(Opened::Image);
            }
            _ => self.opened.push(Opened::Transparent),
        }
    }

    fn end(&mut self) {
        match self.opened.pop() {
            Some(Opened::Frame) => self.close_frame(),
            Some(Opened::HtmlBlock) => {
                if let Some(frame) = self.frames.pop() {
                    for block in blockify(frame.flow.finish()) {
                        self.push(block);
                    }
                }
            }
            Some(Opened::Format(saved)) => self.format = saved,
            Some(Opened::Image) => {
                if let Some(image) = self.image.take() {
                    let image = Image::new(image.src, image.alt);
                    self.push(Subtree::new(Node::Image(image)));
                }
            }
            Some(Opened::Transparent) | None => {}
        }
    }

    fn close_frame(&mut self) {
        let Some(mut frame) = self.frames.pop() else {
            return;
        };
        if let (Node::Code(_), Some(code)) = (&frame.node, self.code.take()) {
            let code = code.trim_end_matches('\n');
            frame.flow.push_text(code, TextFormat::empty(), true);
        }
        let children = frame.flow.finish();
        let children = match &frame.node {
            Node::ListItem(_) => flatten_paragraphs(children),
            Node::Quote(_) | Node::TableCell(_) => blockify(children),
            Node::TableRow(_) => {
                self.in_table_head = false;
                children
            }
            _ => children,
        };
        self.push(Subtree::with_children(frame.node, children));
    }

    fn html(&mut self, html: &str) {
        if let Some(captures) = IFRAME.captures(html) {
            let src = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
            let mut video = Video::new(src).with_alt_text(DEFAULT_VIDEO_ALT);
            video.max_width = VIDEO_MAX_WIDTH;
            video.set_controls(true);
            self.push(Subtree::new(Node::Video(video)));
        } else if !IFRAME_END.is_match(html) {
            self.text(html, self.format);
        }
    }

    fn task(&mut self, checked: bool) {
        for frame in self.frames.iter_mut().rev() {
            match &mut frame.node {
                Node::ListItem(item) if item.checked.is_none() => {
                    item.checked = Some(checked)
                }
                Node::List(list) => {
                    list.list_type = ListType::Check;
                    break;
                }
                _ => {}
            }
        }
    }
}

/// List items hold inline content. Paragraphs of loose lists are merged
/// with a line break between them.
fn flatten_paragraphs(children: Vec<Subtree>) -> Vec<Subtree> {
    let mut flat = Vec::new();
    let mut after_paragraph = false;
    for child in children {
        if let Node::Paragraph(_) = child.node() {
            if after_paragraph {
                flat.push(Subtree::new(Node::LineBreak));
            }
            flat.extend(child.into_parts().1);
            after_paragraph = true;
        } else {
            flat.push(child);
            after_paragraph = false;
        }
    }
    flat
}
