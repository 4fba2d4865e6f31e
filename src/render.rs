//! Turns message text into display markup.
//!
//! User text is shown verbatim. Assistant text is markdown, parsed with
//! pulldown-cmark into a small block/span tree the view layer can draw.

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Parser, Tag};

use crate::message::{ChatMessage, Sender};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpanStyle {
    pub strong: bool,
    pub emphasis: bool,
    pub code: bool,
    pub strikethrough: bool,
    pub link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub style: SpanStyle,
}

impl Span {
    pub fn plain(text: impl Into<String>) -> Self {
        Span {
            text: text.into(),
            style: SpanStyle::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading { level: u8, spans: Vec<Span> },
    Paragraph(Vec<Span>),
    CodeBlock { language: Option<String>, code: String },
    /// `marker` is empty for continuation paragraphs of the same item.
    ListItem { marker: String, depth: usize, spans: Vec<Span> },
    Quote(Vec<Span>),
    Rule,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Markup {
    pub blocks: Vec<Block>,
}

impl Markup {
    pub fn plain(text: &str) -> Self {
        Markup {
            blocks: vec![Block::Paragraph(vec![Span::plain(text)])],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// The markup flattened back into text, one block per line.
    pub fn plain_text(&self) -> String {
        fn join(spans: &[Span]) -> String {
            spans.iter().map(|s| s.text.as_str()).collect()
        }

        self.blocks
            .iter()
            .map(|block| match block {
                Block::Heading { spans, .. } | Block::Paragraph(spans) => join(spans),
                Block::Quote(spans) => format!("> {}", join(spans)),
                Block::CodeBlock { code, .. } => code.clone(),
                Block::ListItem { marker, depth, spans } => {
                    let indent = "  ".repeat(*depth);
                    if marker.is_empty() {
                        format!("{indent}  {}", join(spans))
                    } else {
                        format!("{indent}{marker} {}", join(spans))
                    }
                }
                Block::Rule => "---".to_string(),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

pub fn render(message: &ChatMessage) -> Markup {
    match message.sender {
        Sender::User => Markup::plain(&message.text),
        Sender::Assistant if message.is_error => Markup::plain(&message.text),
        Sender::Assistant => render_markdown(&message.text),
    }
}

/// Markdown to markup. Anything the parser leaves without displayable
/// content falls back to the raw text.
pub fn render_markdown(source: &str) -> Markup {
    let mut builder = Builder::default();
    for event in Parser::new_ext(source, pulldown_cmark::Options::ENABLE_STRIKETHROUGH) {
        builder.event(event);
    }
    let markup = builder.finish();

    if markup.is_empty() && !source.trim().is_empty() {
        tracing::debug!("markdown produced no blocks, showing raw text");
        return Markup::plain(source);
    }
    markup
}

#[derive(Debug)]
struct ListState {
    next: Option<u64>,
    /// Marker of the current item, taken by its first block.
    pending_marker: Option<String>,
}

#[derive(Debug, Default)]
struct Builder {
    blocks: Vec<Block>,
    spans: Vec<Span>,
    style: SpanStyle,
    strong: usize,
    emphasis: usize,
    strikethrough: usize,
    heading: Option<u8>,
    code: Option<(Option<String>, String)>,
    quote_depth: usize,
    lists: Vec<ListState>,
}

impl Builder {
    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => {
                if let Some((_, code)) = self.code.as_mut() {
                    code.push_str(&text);
                } else {
                    self.push_text(&text, self.style.clone());
                }
            }
            Event::Code(text) => {
                let style = SpanStyle {
                    code: true,
                    ..self.style.clone()
                };
                self.push_text(&text, style);
            }
            Event::Html(html) => {
                if let Some((_, code)) = self.code.as_mut() {
                    code.push_str(&html);
                } else {
                    self.push_text(html.trim_end_matches('\n'), self.style.clone());
                }
            }
            Event::SoftBreak => self.push_text(" ", self.style.clone()),
            Event::HardBreak => self.push_text("\n", self.style.clone()),
            Event::Rule => {
                self.flush();
                self.blocks.push(Block::Rule);
            }
            Event::TaskListMarker(done) => {
                self.push_text(if done { "[x] " } else { "[ ] " }, SpanStyle::default());
            }
            Event::FootnoteReference(label) => {
                self.push_text(&format!("[{label}]"), self.style.clone());
            }
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading(level, _, _) => {
                self.flush();
                self.heading = Some(heading_level(level));
            }
            Tag::CodeBlock(kind) => {
                self.flush();
                let language = match kind {
                    CodeBlockKind::Fenced(lang) if !lang.trim().is_empty() => {
                        Some(lang.trim().to_string())
                    }
                    _ => None,
                };
                self.code = Some((language, String::new()));
            }
            Tag::List(first) => {
                // Text of the parent item comes before its nested list.
                self.flush();
                self.lists.push(ListState {
                    next: first,
                    pending_marker: None,
                });
            }
            Tag::Item => {
                self.flush();
                if let Some(list) = self.lists.last_mut() {
                    let marker = match list.next.as_mut() {
                        Some(n) => {
                            let marker = format!("{}.", n);
                            *n += 1;
                            marker
                        }
                        None => "•".to_string(),
                    };
                    list.pending_marker = Some(marker);
                }
            }
            Tag::BlockQuote => {
                self.flush();
                self.quote_depth += 1;
            }
            Tag::Emphasis => {
                self.emphasis += 1;
                self.restyle();
            }
            Tag::Strong => {
                self.strong += 1;
                self.restyle();
            }
            Tag::Strikethrough => {
                self.strikethrough += 1;
                self.restyle();
            }
            Tag::Link(_, dest, _) => {
                self.style.link = Some(dest.to_string());
            }
            Tag::Paragraph
            | Tag::Image(..)
            | Tag::FootnoteDefinition(_)
            | Tag::Table(_)
            | Tag::TableHead
            | Tag::TableRow
            | Tag::TableCell => {}
        }
    }

    fn end(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading(..) => {
                let level = self.heading.take().unwrap_or(1);
                let spans = std::mem::take(&mut self.spans);
                self.blocks.push(Block::Heading { level, spans });
            }
            Tag::CodeBlock(_) => {
                if let Some((language, mut code)) = self.code.take() {
                    while code.ends_with('\n') {
                        code.pop();
                    }
                    self.blocks.push(Block::CodeBlock { language, code });
                }
            }
            Tag::Paragraph | Tag::Item | Tag::TableRow | Tag::FootnoteDefinition(_) => {
                self.flush()
            }
            Tag::List(_) => {
                self.flush();
                self.lists.pop();
            }
            Tag::BlockQuote => {
                self.flush();
                self.quote_depth = self.quote_depth.saturating_sub(1);
            }
            Tag::Emphasis => {
                self.emphasis = self.emphasis.saturating_sub(1);
                self.restyle();
            }
            Tag::Strong => {
                self.strong = self.strong.saturating_sub(1);
                self.restyle();
            }
            Tag::Strikethrough => {
                self.strikethrough = self.strikethrough.saturating_sub(1);
                self.restyle();
            }
            Tag::Link(..) => self.style.link = None,
            Tag::TableCell => self.push_text(" ", SpanStyle::default()),
            Tag::Image(..) | Tag::Table(_) | Tag::TableHead => {}
        }
    }

    fn restyle(&mut self) {
        self.style.strong = self.strong > 0;
        self.style.emphasis = self.emphasis > 0;
        self.style.strikethrough = self.strikethrough > 0;
    }

    fn push_text(&mut self, text: &str, style: SpanStyle) {
        if text.is_empty() {
            return;
        }
        match self.spans.last_mut() {
            Some(last) if last.style == style => last.text.push_str(text),
            _ => self.spans.push(Span {
                text: text.to_string(),
                style,
            }),
        }
    }

    /// Closes the pending inline run into whatever block context is open.
    fn flush(&mut self) {
        if self.spans.iter().all(|s| s.text.trim().is_empty()) {
            self.spans.clear();
            return;
        }
        let spans = std::mem::take(&mut self.spans);

        if let Some(list) = self.lists.last_mut() {
            let marker = list.pending_marker.take().unwrap_or_default();
            let depth = self.lists.len() - 1;
            self.blocks.push(Block::ListItem { marker, depth, spans });
        } else if self.quote_depth > 0 {
            self.blocks.push(Block::Quote(spans));
        } else {
            self.blocks.push(Block::Paragraph(spans));
        }
    }

    fn finish(mut self) -> Markup {
        if let Some((language, code)) = self.code.take() {
            self.blocks.push(Block::CodeBlock { language, code });
        }
        self.flush();
        Markup {
            blocks: self.blocks,
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
