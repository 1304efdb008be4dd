//! Block/inline tree built from pulldown-cmark events
//!
//! pulldown-cmark produces a flat event stream; the renderers want a tree
//! with source positions so blank-line gaps between blocks can be reproduced.
//! Every block records its byte span and 0-based start line.

use std::ops::Range;

use once_cell::sync::Lazy;
use pulldown_cmark::{
    Alignment as CmarkAlignment, CodeBlockKind, Event, LinkType, Options, Parser, Tag, TagEnd,
};
use ratatui::layout::Alignment;
use regex::Regex;

/// Bare URLs in text become autolinks
static BARE_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"https?://[^\s<>()\[\]]*[^\s<>()\[\].,;:!?'"*_]"#).expect("valid URL regex")
});

#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    Text(String),
    /// `delimiters`: 1 = emphasis, 2 = strong, 3 = both
    Emphasis {
        delimiters: u8,
        children: Vec<Inline>,
    },
    Strikethrough(Vec<Inline>),
    Code(String),
    Link {
        url: String,
        children: Vec<Inline>,
    },
    Image {
        url: String,
        title: String,
        children: Vec<Inline>,
    },
    Autolink(String),
    LineBreak {
        hard: bool,
    },
    Html(String),
    TaskMarker {
        checked: bool,
    },
}

impl Inline {
    pub fn is_line_break(&self) -> bool {
        matches!(self, Inline::LineBreak { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub is_header: bool,
    pub cells: Vec<Vec<Inline>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BlockKind {
    Heading {
        level: u8,
        inlines: Vec<Inline>,
    },
    Paragraph {
        inlines: Vec<Inline>,
    },
    List {
        ordered: bool,
        start: u64,
        items: Vec<Block>,
    },
    ListItem {
        children: Vec<Block>,
    },
    Table {
        alignments: Vec<Alignment>,
        rows: Vec<TableRow>,
    },
    Quote {
        children: Vec<Block>,
    },
    CodeBlock {
        fenced: bool,
        info: String,
        lines: Vec<String>,
    },
    Html {
        text: String,
    },
    ThematicBreak,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub kind: BlockKind,
    /// Byte range in the source
    pub span: Range<usize>,
    /// 0-based source line of the first byte
    pub line: usize,
}

impl Block {
    /// Child blocks of container kinds
    pub fn children(&self) -> Option<&[Block]> {
        match &self.kind {
            BlockKind::List { items, .. } => Some(items),
            BlockKind::ListItem { children } | BlockKind::Quote { children } => Some(children),
            _ => None,
        }
    }
}

/// A parsed document: top-level blocks tagged with their source lines
#[derive(Debug)]
pub struct Document<'s> {
    pub source: &'s str,
    pub blocks: Vec<Block>,
}

impl<'s> Document<'s> {
    pub fn parse(source: &'s str) -> Self {
        let line_starts = line_starts(source);
        let blocks = TreeBuilder::new(&line_starts).build(source);
        Self { source, blocks }
    }

    /// Last source line covered by `block`
    pub fn end_line(&self, block: &Block) -> usize {
        if let Some(last) = block.children().and_then(<[Block]>::last) {
            return self.end_line(last);
        }
        if let BlockKind::CodeBlock {
            fenced: true,
            lines,
            ..
        } = &block.kind
        {
            if !lines.is_empty() {
                return block.line + lines.len() + 1;
            }
        }

        let end = block.span.end.min(self.source.len());
        let start = block.span.start.min(end);
        let text = self.source.get(start..end).unwrap_or("");
        let text = text.trim_end_matches(['\n', '\r']);
        block.line + text.matches('\n').count()
    }
}

fn line_starts(source: &str) -> Vec<usize> {
    std::iter::once(0)
        .chain(source.match_indices('\n').map(|(i, _)| i + 1))
        .collect()
}

fn line_of(line_starts: &[usize], offset: usize) -> usize {
    line_starts
        .partition_point(|&start| start <= offset)
        .saturating_sub(1)
}

pub fn parser_options() -> Options {
    Options::ENABLE_TABLES | Options::ENABLE_TASKLISTS | Options::ENABLE_STRIKETHROUGH
}

#[derive(Debug)]
enum BlockTag {
    Heading(u8),
    Paragraph,
    List { ordered: bool, start: u64 },
    Item,
    Table(Vec<Alignment>),
    TableHead,
    TableRow,
    TableCell,
    Quote,
    Code { fenced: bool, info: String },
    Html,
    /// Constructs with no rendering of their own (footnotes, metadata...)
    Other,
}

#[derive(Debug)]
struct BlockFrame {
    tag: BlockTag,
    span: Range<usize>,
    children: Vec<Block>,
    inlines: Vec<Inline>,
    /// Span of inline content not wrapped in a paragraph (tight list items)
    loose_span: Option<Range<usize>>,
    rows: Vec<TableRow>,
    cells: Vec<Vec<Inline>>,
    text: String,
}

impl BlockFrame {
    fn new(tag: BlockTag, span: Range<usize>) -> Self {
        Self {
            tag,
            span,
            children: Vec::new(),
            inlines: Vec::new(),
            loose_span: None,
            rows: Vec::new(),
            cells: Vec::new(),
            text: String::new(),
        }
    }
}

#[derive(Debug)]
enum InlineTag {
    Emphasis,
    Strong,
    Strikethrough,
    Link { url: String, autolink: bool },
    Image { url: String, title: String },
}

#[derive(Debug)]
struct InlineFrame {
    tag: InlineTag,
    children: Vec<Inline>,
}

struct TreeBuilder<'a> {
    line_starts: &'a [usize],
    blocks: Vec<BlockFrame>,
    inlines: Vec<InlineFrame>,
    root: Vec<Block>,
}

impl<'a> TreeBuilder<'a> {
    fn new(line_starts: &'a [usize]) -> Self {
        Self {
            line_starts,
            blocks: Vec::new(),
            inlines: Vec::new(),
            root: Vec::new(),
        }
    }

    fn build(mut self, source: &str) -> Vec<Block> {
        for (event, range) in Parser::new_ext(source, parser_options()).into_offset_iter() {
            match event {
                Event::Start(tag) => self.start(tag, range),
                Event::End(tag) => self.end(tag, range),
                Event::Text(text) => self.text(&text, range),
                Event::Code(code) => self.push_inline(Inline::Code(code.to_string()), range),
                Event::InlineHtml(html) => self.push_inline(Inline::Html(html.to_string()), range),
                Event::Html(html) => {
                    if matches!(self.blocks.last().map(|f| &f.tag), Some(BlockTag::Html)) {
                        self.append_block_text(&html);
                    } else {
                        self.push_inline(Inline::Html(html.to_string()), range);
                    }
                }
                Event::SoftBreak => self.push_inline(Inline::LineBreak { hard: false }, range),
                Event::HardBreak => self.push_inline(Inline::LineBreak { hard: true }, range),
                Event::Rule => {
                    let block = self.block(BlockKind::ThematicBreak, range);
                    self.attach(block);
                }
                Event::TaskListMarker(checked) => {
                    self.push_inline(Inline::TaskMarker { checked }, range)
                }
                Event::FootnoteReference(label) => {
                    self.push_inline(Inline::Text(format!("[^{}]", label)), range)
                }
                Event::InlineMath(math) | Event::DisplayMath(math) => {
                    self.push_inline(Inline::Text(math.to_string()), range)
                }
            }
        }

        // Unbalanced input cannot happen with pulldown-cmark, but never lose content
        while let Some(frame) = self.blocks.pop() {
            if let Some(block) = self.finish_block(frame) {
                self.attach(block);
            }
        }
        self.root
    }

    fn block(&self, kind: BlockKind, span: Range<usize>) -> Block {
        Block {
            line: line_of(self.line_starts, span.start),
            kind,
            span,
        }
    }

    fn start(&mut self, tag: Tag<'_>, range: Range<usize>) {
        let block_tag = match tag {
            Tag::Emphasis => return self.open_inline(InlineTag::Emphasis),
            Tag::Strong => return self.open_inline(InlineTag::Strong),
            Tag::Strikethrough => return self.open_inline(InlineTag::Strikethrough),
            Tag::Link {
                link_type,
                dest_url,
                ..
            } => {
                return self.open_inline(InlineTag::Link {
                    url: dest_url.to_string(),
                    autolink: matches!(link_type, LinkType::Autolink | LinkType::Email),
                })
            }
            Tag::Image {
                dest_url, title, ..
            } => {
                return self.open_inline(InlineTag::Image {
                    url: dest_url.to_string(),
                    title: title.to_string(),
                })
            }
            Tag::Paragraph => BlockTag::Paragraph,
            Tag::Heading { level, .. } => BlockTag::Heading(level as u8),
            Tag::BlockQuote(_) => BlockTag::Quote,
            Tag::CodeBlock(kind) => match kind {
                CodeBlockKind::Fenced(info) => BlockTag::Code {
                    fenced: true,
                    info: info.to_string(),
                },
                CodeBlockKind::Indented => BlockTag::Code {
                    fenced: false,
                    info: String::new(),
                },
            },
            Tag::HtmlBlock => BlockTag::Html,
            Tag::List(start) => BlockTag::List {
                ordered: start.is_some(),
                start: start.unwrap_or(1),
            },
            Tag::Item => BlockTag::Item,
            Tag::Table(alignments) => BlockTag::Table(
                alignments
                    .into_iter()
                    .map(|a| match a {
                        CmarkAlignment::Center => Alignment::Center,
                        CmarkAlignment::Right => Alignment::Right,
                        CmarkAlignment::Left | CmarkAlignment::None => Alignment::Left,
                    })
                    .collect(),
            ),
            Tag::TableHead => BlockTag::TableHead,
            Tag::TableRow => BlockTag::TableRow,
            Tag::TableCell => BlockTag::TableCell,
            _ => BlockTag::Other,
        };
        self.flush_loose_paragraph();
        self.blocks.push(BlockFrame::new(block_tag, range));
    }

    fn open_inline(&mut self, tag: InlineTag) {
        self.inlines.push(InlineFrame {
            tag,
            children: Vec::new(),
        });
    }

    fn end(&mut self, tag: TagEnd, range: Range<usize>) {
        match tag {
            TagEnd::Emphasis
            | TagEnd::Strong
            | TagEnd::Strikethrough
            | TagEnd::Link
            | TagEnd::Image => {
                if let Some(frame) = self.inlines.pop() {
                    let inline = finish_inline(frame);
                    self.push_inline(inline, range);
                }
            }
            _ => {
                self.flush_loose_paragraph();
                if let Some(frame) = self.blocks.pop() {
                    if let Some(block) = self.finish_block(frame) {
                        self.attach(block);
                    }
                }
            }
        }
    }

    /// Turn a closed frame into a block, or fold it into its parent frame
    fn finish_block(&mut self, frame: BlockFrame) -> Option<Block> {
        let span = frame.span.clone();
        let kind = match frame.tag {
            BlockTag::Heading(level) => BlockKind::Heading {
                level,
                inlines: frame.inlines,
            },
            BlockTag::Paragraph => BlockKind::Paragraph {
                inlines: frame.inlines,
            },
            BlockTag::List { ordered, start } => BlockKind::List {
                ordered,
                start,
                items: frame.children,
            },
            BlockTag::Item => BlockKind::ListItem {
                children: frame.children,
            },
            BlockTag::Table(alignments) => BlockKind::Table {
                alignments,
                rows: frame.rows,
            },
            BlockTag::TableHead | BlockTag::TableRow => {
                let row = TableRow {
                    is_header: matches!(frame.tag, BlockTag::TableHead),
                    cells: frame.cells,
                };
                if let Some(parent) = self.blocks.last_mut() {
                    parent.rows.push(row);
                }
                return None;
            }
            BlockTag::TableCell => {
                if let Some(parent) = self.blocks.last_mut() {
                    parent.cells.push(frame.inlines);
                }
                return None;
            }
            BlockTag::Quote => BlockKind::Quote {
                children: frame.children,
            },
            BlockTag::Code { fenced, info } => {
                let mut lines: Vec<String> = frame.text.split('\n').map(str::to_string).collect();
                if frame.text.ends_with('\n') || frame.text.is_empty() {
                    lines.pop();
                }
                BlockKind::CodeBlock {
                    fenced,
                    info,
                    lines,
                }
            }
            BlockTag::Html => BlockKind::Html { text: frame.text },
            BlockTag::Other => return None,
        };
        Some(self.block(kind, span))
    }

    fn attach(&mut self, block: Block) {
        match self.blocks.last_mut() {
            Some(parent) => parent.children.push(block),
            None => self.root.push(block),
        }
    }

    fn append_block_text(&mut self, text: &str) {
        if let Some(frame) = self.blocks.last_mut() {
            frame.text.push_str(text);
        }
    }

    fn text(&mut self, text: &str, range: Range<usize>) {
        if self.inlines.is_empty() {
            if let Some(BlockTag::Code { .. } | BlockTag::Html) = self.blocks.last().map(|f| &f.tag) {
                self.append_block_text(text);
                return;
            }
        }

        let in_link = self
            .inlines
            .iter()
            .any(|f| matches!(f.tag, InlineTag::Link { .. } | InlineTag::Image { .. }));
        if in_link {
            self.push_inline(Inline::Text(text.to_string()), range);
            return;
        }

        let mut last = 0;
        for found in BARE_URL.find_iter(text) {
            if found.start() > last {
                self.push_inline(Inline::Text(text[last..found.start()].to_string()), range.clone());
            }
            self.push_inline(Inline::Autolink(found.as_str().to_string()), range.clone());
            last = found.end();
        }
        if last < text.len() {
            self.push_inline(Inline::Text(text[last..].to_string()), range);
        }
    }

    fn push_inline(&mut self, inline: Inline, range: Range<usize>) {
        if let Some(frame) = self.inlines.last_mut() {
            frame.children.push(inline);
            return;
        }
        let Some(frame) = self.blocks.last_mut() else {
            return;
        };
        if matches!(frame.tag, BlockTag::Item) {
            let span = frame.loose_span.get_or_insert(range.clone());
            span.start = span.start.min(range.start);
            span.end = span.end.max(range.end);
        }
        if let Inline::Text(text) = &inline {
            if let Some(Inline::Text(previous)) = frame.inlines.last_mut() {
                previous.push_str(text);
                return;
            }
        }
        frame.inlines.push(inline);
    }

    /// Tight list items carry inline content directly; wrap it in a paragraph
    fn flush_loose_paragraph(&mut self) {
        let Some(frame) = self.blocks.last_mut() else {
            return;
        };
        if !matches!(frame.tag, BlockTag::Item) || frame.inlines.is_empty() {
            return;
        }
        let span = frame
            .loose_span
            .take()
            .unwrap_or_else(|| frame.span.clone());
        let inlines = std::mem::take(&mut frame.inlines);
        let block = Block {
            line: line_of(self.line_starts, span.start),
            kind: BlockKind::Paragraph { inlines },
            span,
        };
        if let Some(frame) = self.blocks.last_mut() {
            frame.children.push(block);
        }
    }
}

fn finish_inline(frame: InlineFrame) -> Inline {
    let children = frame.children;
    match frame.tag {
        InlineTag::Emphasis => match children.as_slice() {
            [Inline::Emphasis { delimiters: 2, .. }] => merge_emphasis(children),
            _ => Inline::Emphasis {
                delimiters: 1,
                children,
            },
        },
        InlineTag::Strong => match children.as_slice() {
            [Inline::Emphasis { delimiters: 1, .. }] => merge_emphasis(children),
            _ => Inline::Emphasis {
                delimiters: 2,
                children,
            },
        },
        InlineTag::Strikethrough => Inline::Strikethrough(children),
        InlineTag::Link { url, autolink } => {
            if autolink {
                Inline::Autolink(url)
            } else {
                Inline::Link { url, children }
            }
        }
        InlineTag::Image { url, title } => Inline::Image {
            url,
            title,
            children,
        },
    }
}

/// `***x***` arrives as emphasis wrapping strong (or the reverse)
fn merge_emphasis(mut children: Vec<Inline>) -> Inline {
    match children.pop() {
        Some(Inline::Emphasis { children, .. }) => Inline::Emphasis {
            delimiters: 3,
            children,
        },
        _ => Inline::Emphasis {
            delimiters: 3,
            children: Vec::new(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blocks(source: &str) -> Vec<Block> {
        Document::parse(source).blocks
    }

    #[test]
    fn test_block_lines() {
        let doc = Document::parse("# Title\n\nPara one\ncontinues\n\n\n- item\n");
        let lines: Vec<usize> = doc.blocks.iter().map(|b| b.line).collect();
        assert_eq!(lines, vec![0, 2, 6]);
        assert_eq!(doc.end_line(&doc.blocks[1]), 3);
    }

    #[test]
    fn test_fenced_code_end_line() {
        let doc = Document::parse("```rust\nfn a() {}\nfn b() {}\n```\nafter\n");
        let code = &doc.blocks[0];
        assert!(matches!(&code.kind, BlockKind::CodeBlock { lines, .. } if lines.len() == 2));
        assert_eq!(doc.end_line(code), 3);
        assert_eq!(doc.blocks[1].line, 4);
    }

    #[test]
    fn test_emphasis_levels() {
        let blocks = blocks("*a* **b** ***c***");
        let BlockKind::Paragraph { inlines } = &blocks[0].kind else {
            panic!("expected paragraph");
        };
        let levels: Vec<u8> = inlines
            .iter()
            .filter_map(|i| match i {
                Inline::Emphasis { delimiters, .. } => Some(*delimiters),
                _ => None,
            })
            .collect();
        assert_eq!(levels, vec![1, 2, 3]);
    }

    #[test]
    fn test_tight_list_items_get_paragraphs() {
        let blocks = blocks("- [x] done\n- plain\n");
        let BlockKind::List { items, ordered, .. } = &blocks[0].kind else {
            panic!("expected list");
        };
        assert!(!ordered);
        assert_eq!(items.len(), 2);
        let first = items[0].children().unwrap();
        let BlockKind::Paragraph { inlines } = &first[0].kind else {
            panic!("expected paragraph");
        };
        assert_eq!(inlines[0], Inline::TaskMarker { checked: true });
    }

    #[test]
    fn test_table_rows() {
        let blocks = blocks("| A | B |\n|:--|--:|\n| 1 | 2 |\n| 3 | 4 |\n");
        let BlockKind::Table { alignments, rows } = &blocks[0].kind else {
            panic!("expected table");
        };
        assert_eq!(alignments, &vec![Alignment::Left, Alignment::Right]);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows.iter().filter(|r| r.is_header).count(), 1);
        assert!(rows[0].is_header);
    }

    #[test]
    fn test_bare_urls_become_autolinks() {
        let blocks = blocks("see https://example.com/x. and <https://a.b>");
        let BlockKind::Paragraph { inlines } = &blocks[0].kind else {
            panic!("expected paragraph");
        };
        let links: Vec<&str> = inlines
            .iter()
            .filter_map(|i| match i {
                Inline::Autolink(url) => Some(url.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(links, vec!["https://example.com/x", "https://a.b"]);
    }

    #[test]
    fn test_code_block_lines() {
        let blocks = blocks("    indented\n    code\n");
        assert!(matches!(
            &blocks[0].kind,
            BlockKind::CodeBlock { fenced: false, lines, .. } if lines == &vec!["indented".to_string(), "code".to_string()]
        ));
    }

    #[test]
    fn test_html_block_text() {
        let blocks = blocks("<img src=\"a.png\">\n");
        assert!(matches!(&blocks[0].kind, BlockKind::Html { text } if text.contains("a.png")));
    }

    #[test]
    fn test_quote_children() {
        let doc = Document::parse("> one\n> two\n\nafter\n");
        let quote = &doc.blocks[0];
        assert_eq!(quote.children().unwrap().len(), 1);
        assert_eq!(doc.end_line(quote), 1);
        assert_eq!(doc.blocks[1].line, 3);
    }
}
