//! Markdown rendering for assistant replies.
//!
//! Replies are parsed with `pulldown-cmark` (GFM tables and strikethrough
//! enabled) into a flat list of [`Block`]s, which are then laid out as egui
//! labels.

use eframe::egui;
use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpanStyle {
    pub strong: bool,
    pub emphasis: bool,
    pub strikethrough: bool,
    pub code: bool,
    pub link: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub style: SpanStyle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockKind {
    Paragraph,
    Heading(u8),
    ListItem { depth: usize, marker: String },
    /// Additional paragraphs inside a list item.
    ListContinuation { depth: usize },
    CodeBlock,
    TableRow,
    Rule,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub kind: BlockKind,
    pub spans: Vec<Span>,
}

pub fn parse(markdown: &str) -> Vec<Block> {
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH;
    let mut builder = BlockBuilder::default();
    for event in Parser::new_ext(markdown, options) {
        builder.handle(event);
    }
    builder.finish()
}

pub fn render(ui: &mut egui::Ui, markdown: &str) {
    for block in parse(markdown) {
        render_block(ui, &block);
    }
}

fn render_block(ui: &mut egui::Ui, block: &Block) {
    let indent = match &block.kind {
        BlockKind::ListItem { depth, .. } | BlockKind::ListContinuation { depth } => {
            *depth as f32 * 12.0
        }
        _ => 0.0,
    };

    match &block.kind {
        BlockKind::Rule => {
            ui.separator();
        }
        BlockKind::CodeBlock => {
            let text: String = block.spans.iter().map(|span| span.text.as_str()).collect();
            egui::Frame::group(ui.style()).show(ui, |ui| {
                ui.label(egui::RichText::new(text.trim_end()).monospace());
            });
        }
        kind => {
            let mut job = egui::text::LayoutJob::default();
            if let BlockKind::ListItem { marker, .. } = kind {
                egui::RichText::new(format!("{marker} ")).append_to(
                    &mut job,
                    ui.style(),
                    egui::FontSelection::Default,
                    egui::Align::Center,
                );
            }
            let heading = match kind {
                BlockKind::Heading(level) => Some(*level),
                _ => None,
            };
            for span in &block.spans {
                rich_text(ui, span, heading).append_to(
                    &mut job,
                    ui.style(),
                    egui::FontSelection::Default,
                    egui::Align::Center,
                );
            }
            ui.horizontal_wrapped(|ui| {
                ui.add_space(indent);
                ui.label(job);
            });
        }
    }
}

/// Point size for a heading level; `#` is largest, levels past `###` share one size.
pub fn heading_size(level: u8) -> f32 {
    match level {
        1 => 22.0,
        2 => 19.0,
        3 => 17.0,
        _ => 15.0,
    }
}

fn rich_text(ui: &egui::Ui, span: &Span, heading: Option<u8>) -> egui::RichText {
    let mut text = egui::RichText::new(&span.text);
    if let Some(level) = heading {
        text = text.size(heading_size(level));
    }
    if span.style.strong || heading.is_some() {
        text = text.strong();
    }
    if span.style.emphasis {
        text = text.italics();
    }
    if span.style.strikethrough {
        text = text.strikethrough();
    }
    if span.style.code {
        text = text.code();
    }
    if span.style.link {
        text = text.underline().color(ui.visuals().hyperlink_color);
    }
    text
}

#[derive(Default)]
struct BlockBuilder {
    blocks: Vec<Block>,
    current: Vec<Span>,
    kind: Option<BlockKind>,
    style: SpanStyle,
    /// Next number per open list; `None` for bullet lists.
    lists: Vec<Option<u64>>,
}

impl BlockBuilder {
    fn handle(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => self.push_text(&text),
            Event::Code(code) => {
                let style = SpanStyle {
                    code: true,
                    ..self.style
                };
                self.current.push(Span {
                    text: code.into_string(),
                    style,
                });
            }
            Event::SoftBreak => self.push_text(" "),
            Event::HardBreak => self.push_text("\n"),
            Event::Rule => {
                self.flush();
                self.blocks.push(Block {
                    kind: BlockKind::Rule,
                    spans: Vec::new(),
                });
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {
                if !self.current.is_empty() {
                    self.flush();
                }
            }
            Tag::Heading { level, .. } => {
                self.flush();
                self.kind = Some(BlockKind::Heading(heading_level(level)));
            }
            Tag::List(start) => {
                self.flush();
                self.lists.push(start);
            }
            Tag::Item => {
                self.flush();
                let depth = self.lists.len().saturating_sub(1);
                let marker = match self.lists.last_mut() {
                    Some(Some(next)) => {
                        let marker = format!("{next}.");
                        *next += 1;
                        marker
                    }
                    _ => "•".to_string(),
                };
                self.kind = Some(BlockKind::ListItem { depth, marker });
            }
            Tag::CodeBlock(kind) => {
                self.flush();
                if let CodeBlockKind::Fenced(lang) = &kind {
                    log::trace!("code block language: {lang}");
                }
                self.kind = Some(BlockKind::CodeBlock);
            }
            Tag::TableHead | Tag::TableRow => {
                self.flush();
                self.kind = Some(BlockKind::TableRow);
            }
            Tag::Emphasis => self.style.emphasis = true,
            Tag::Strong => self.style.strong = true,
            Tag::Strikethrough => self.style.strikethrough = true,
            Tag::Link { .. } => self.style.link = true,
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph | TagEnd::Heading(_) | TagEnd::Item | TagEnd::CodeBlock => {
                self.flush()
            }
            TagEnd::TableHead | TagEnd::TableRow => self.flush(),
            TagEnd::TableCell => self.push_text("  |  "),
            TagEnd::List(_) => {
                self.flush();
                self.lists.pop();
            }
            TagEnd::Emphasis => self.style.emphasis = false,
            TagEnd::Strong => self.style.strong = false,
            TagEnd::Strikethrough => self.style.strikethrough = false,
            TagEnd::Link => self.style.link = false,
            _ => {}
        }
    }

    fn push_text(&mut self, text: &str) {
        match self.current.last_mut() {
            Some(last) if last.style == self.style => last.text.push_str(text),
            _ => self.current.push(Span {
                text: text.to_string(),
                style: self.style,
            }),
        }
    }

    fn flush(&mut self) {
        let kind = self.kind.take();
        if self.current.is_empty() {
            // An item whose text has not started yet keeps its marker.
            if matches!(kind, Some(BlockKind::ListItem { .. })) {
                self.kind = kind;
            }
            return;
        }

        let kind = kind.unwrap_or_else(|| self.default_kind());
        let mut spans = std::mem::take(&mut self.current);
        if kind == BlockKind::TableRow {
            trim_cell_separator(&mut spans);
        }
        self.blocks.push(Block { kind, spans });
    }

    fn default_kind(&self) -> BlockKind {
        match self.lists.len() {
            0 => BlockKind::Paragraph,
            n => BlockKind::ListContinuation { depth: n - 1 },
        }
    }

    fn finish(mut self) -> Vec<Block> {
        self.flush();
        self.blocks
    }
}

fn trim_cell_separator(spans: &mut [Span]) {
    if let Some(last) = spans.last_mut() {
        if let Some(stripped) = last.text.strip_suffix("  |  ") {
            last.text = stripped.to_string();
        }
    }
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}
