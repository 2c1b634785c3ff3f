// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

use html_escape::encode_double_quoted_attribute;
use tracing::instrument;

use crate::nodes::{ListType, Node, TextFormat, TextNode};
use crate::tree::{NodeKey, Tree};

/// Markers for the formats markdown can express, outermost first.
const MARKERS: [(TextFormat, &str); 3] = [
    (TextFormat::BOLD, "**"),
    (TextFormat::ITALIC, "*"),
    (TextFormat::STRIKETHROUGH, "~~"),
];

/// Write `tree` as markdown. Node types markdown has no syntax for are
/// written as their closest text equivalent.
#[instrument(skip_all, fields(nodes = tree.len()))]
pub fn export_markdown(tree: &Tree) -> String {
    let writer = Writer { tree };
    writer.blocks(tree.root()).join("\n\n")
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '*' | '_' | '`' | '[' | ']' | '~' | '<' | '$') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Backslash-escape whatever would open a block at the start of a line.
fn escape_line_starts(text: &str) -> String {
    text.split('\n').map(escape_line_start).collect::<Vec<_>>().join("\n")
}

fn escape_line_start(line: &str) -> String {
    let body = line.trim_start_matches(|c: char| c == ' ' || c == '\t');
    let indent = &line[..line.len() - body.len()];
    let digits = body.bytes().take_while(u8::is_ascii_digit).count();
    if digits > 0 {
        if matches!(body.as_bytes().get(digits), Some(b'.' | b')')) {
            let (number, rest) = body.split_at(digits);
            return format!("{indent}{number}\\{rest}");
        }
    } else if body
        .starts_with(|c: char| matches!(c, '#' | '>' | '-' | '+' | '='))
    {
        return format!("{indent}\\{body}");
    }
    line.to_owned()
}

/// Inline code fenced by more backticks than any run inside it.
fn code_span(code: &str) -> String {
    let mut longest = 0;
    let mut run = 0;
    for c in code.chars() {
        run = if c == '`' { run + 1 } else { 0 };
        longest = longest.max(run);
    }
    let fence = "`".repeat(longest + 1);
    let stripped_on_read = code.starts_with(' ')
        && code.ends_with(' ')
        && !code.chars().all(|c| c == ' ');
    let touches_fence = code.starts_with('`') || code.ends_with('`');
    let pad = if touches_fence || stripped_on_read { " " } else { "" };
    format!("{fence}{pad}{code}{pad}{fence}")
}

fn formatted(text: &TextNode) -> String {
    if text.text.is_empty() {
        return String::new();
    }
    let inner = if text.format.contains(TextFormat::CODE) {
        code_span(&text.text)
    } else {
        escape(&text.text)
    };
    MARKERS
        .iter()
        .rev()
        .filter(|(flag, _)| text.format.contains(*flag))
        .fold(inner, |inner, (_, marker)| format!("{marker}{inner}{marker}"))
}

fn prefix_lines(text: &str, first: &str, rest: &str) -> String {
    text.lines()
        .enumerate()
        .map(|(i, line)| {
            let prefix = if i == 0 { first } else { rest };
            if line.is_empty() {
                prefix.trim_end().to_owned()
            } else {
                format!("{prefix}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

struct Writer<'t> {
    tree: &'t Tree,
}

impl Writer<'_> {
    /// Blocks of a container. Runs of inline children are written as one
    /// paragraph.
    fn blocks(&self, key: NodeKey) -> Vec<String> {
        let mut blocks = Vec::new();
        let mut run = String::new();
        for child in self.tree.children(key) {
            let Some(node) = self.tree.get(*child) else {
                continue;
            };
            if node.node_type().is_inline() {
                run.push_str(&self.inline_node(*child, node));
                continue;
            }
            if !run.is_empty() {
                blocks.push(escape_line_starts(&std::mem::take(&mut run)));
            }
            if let Some(block) = self.block(*child).filter(|b| !b.is_empty()) {
                blocks.push(block);
            }
        }
        if !run.is_empty() {
            blocks.push(escape_line_starts(&run));
        }
        blocks
    }

    fn block(&self, key: NodeKey) -> Option<String> {
        let node = self.tree.get(key)?;
        Some(match node {
            Node::Paragraph(_) | Node::CollapsibleTitle(_) => {
                escape_line_starts(&self.inline(key))
            }
            Node::Heading(heading) => format!(
                "{} {}",
                "#".repeat(usize::from(heading.tag.level())),
                escape_line_starts(&self.inline(key))
            ),
            Node::Quote(_) => {
                prefix_lines(&self.blocks(key).join("\n\n"), "> ", "> ")
            }
            Node::Code(code) => format!(
                "```{}\n{}\n```",
                code.language.as_deref().unwrap_or_default(),
                self.code_text(key)
            ),
            Node::List(list) => self.list(key, list.list_type, list.start),
            Node::Table(_) => self.table(key),
            Node::CollapsibleContainer(_) | Node::CollapsibleContent(_) => {
                self.blocks(key).join("\n\n")
            }
            Node::HorizontalRule => "***".to_owned(),
            Node::PageBreak | Node::Placeholder(_) => String::new(),
            Node::Equation(equation) if !equation.inline => {
                format!("$$\n{}\n$$", equation.equation)
            }
            Node::Poll(poll) => {
                let mut out = escape_line_starts(&escape(&poll.question));
                for option in &poll.options {
                    out.push_str("\n\n- ");
                    out.push_str(&escape(&option.text));
                }
                out
            }
            _ => self.leaf(node),
        })
    }

    /// Inline content of `key`, one line.
    fn inline(&self, key: NodeKey) -> String {
        self.tree
            .children(key)
            .iter()
            .filter_map(|child| {
                let node = self.tree.get(*child)?;
                Some(self.inline_node(*child, node))
            })
            .collect()
    }

    fn inline_node(&self, key: NodeKey, node: &Node) -> String {
        match node {
            Node::Link(link) => {
                let title = link
                    .title
                    .as_ref()
                    .map(|t| format!(" \"{}\"", t.replace('"', "\\\"")))
                    .unwrap_or_default();
                format!("[{}]({}{title})", self.inline(key), link.url)
            }
            Node::AutoLink(link) => format!("<{}>", link.url),
            _ if node.is_container() => self.inline(key),
            _ => self.leaf(node),
        }
    }

    fn leaf(&self, node: &Node) -> String {
        match node {
            Node::Text(text) => formatted(text),
            Node::Hashtag(text) => text.text.clone(),
            Node::CodeHighlight(token) => token.text.text.clone(),
            Node::LineBreak => "\\\n".to_owned(),
            Node::Image(image) => format!("![{}]({})", escape(&image.alt_text), image.src),
            Node::InlineImage(image) => {
                format!("![{}]({})", escape(&image.alt_text), image.src)
            }
            Node::Video(video) => format!(
                r#"<iframe src="{}" title="{}" width="800" height="450" frameborder="0" allowfullscreen="true" allow="autoplay; fullscreen; picture-in-picture"></iframe>"#,
                encode_double_quoted_attribute(&video.src),
                encode_double_quoted_attribute(&video.alt_text),
            ),
            Node::YouTube(youtube) => {
                format!("<https://www.youtube.com/watch?v={}>", youtube.video_id)
            }
            Node::Figma(figma) => {
                format!("<https://www.figma.com/file/{}>", figma.document_id)
            }
            Node::Tweet(tweet) => {
                format!("<https://twitter.com/i/status/{}>", tweet.id)
            }
            Node::Equation(equation) => format!("${}$", equation.equation),
            Node::HorizontalRule => "***".to_owned(),
            _ => String::new(),
        }
    }

    fn code_text(&self, key: NodeKey) -> String {
        self.tree
            .children(key)
            .iter()
            .filter_map(|child| match self.tree.get(*child)? {
                Node::LineBreak => Some("\n".to_owned()),
                node => node.text_node().map(|text| text.text.clone()),
            })
            .collect()
    }

    fn list(&self, key: NodeKey, list_type: ListType, start: u32) -> String {
        let mut items = Vec::new();
        let mut number = start;
        for child in self.tree.children(key) {
            let Some(Node::ListItem(item)) = self.tree.get(*child) else {
                continue;
            };
            let marker = match list_type {
                ListType::Bullet => "- ".to_owned(),
                ListType::Number => format!("{number}. "),
                ListType::Check if item.checked == Some(true) => "- [x] ".to_owned(),
                ListType::Check => "- [ ] ".to_owned(),
            };
            number = number.saturating_add(1);

            let mut text = String::new();
            let mut nested = Vec::new();
            for grandchild in self.tree.children(*child) {
                match self.tree.get(*grandchild) {
                    Some(Node::List(inner)) => {
                        nested.push(self.list(
                            *grandchild,
                            inner.list_type,
                            inner.start,
                        ))
                    }
                    Some(node) => {
                        text.push_str(&self.inline_node(*grandchild, node))
                    }
                    None => {}
                }
            }
            let indent = " ".repeat(marker.len());
            let text = escape_line_starts(&text);
            let mut entry = prefix_lines(&text, &marker, &indent);
            if entry.is_empty() {
                entry = marker.trim_end().to_owned();
            }
            for list in nested {
                entry.push('\n');
                entry.push_str(&prefix_lines(&list, &indent, &indent));
            }
            items.push(entry);
        }
        items.join("\n")
    }

    fn table(&self, key: NodeKey) -> String {
        let rows: Vec<Vec<String>> = self
            .tree
            .children(key)
            .iter()
            .map(|row| {
                self.tree
                    .children(*row)
                    .iter()
                    .map(|cell| {
                        self.blocks(*cell)
                            .join(" ")
                            .replace('|', "\\|")
                            .replace('\n', " ")
                    })
                    .collect()
            })
            .collect();
        let widest = rows.iter().map(Vec::len).max();
        let Some(columns) = widest.filter(|n| *n > 0) else {
            return String::new();
        };
        let line = |cells: &[String]| {
            let mut out = String::from("|");
            for i in 0..columns {
                out.push(' ');
                let cell = cells.get(i).map(String::as_str);
                out.push_str(cell.unwrap_or_default());
                out.push_str(" |");
            }
            out
        };
        let mut lines = Vec::with_capacity(rows.len() + 1);
        for (i, row) in rows.iter().enumerate() {
            lines.push(line(row));
            if i == 0 {
                lines.push(format!("|{}", " --- |".repeat(columns)));
            }
        }
        lines.join("\n")
    }
}
