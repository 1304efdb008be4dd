//! Markdown document renderer
//!
//! Parses a document into blocks and renders each top-level block with a
//! block-specific renderer. Blank source lines between consecutive blocks
//! are reproduced as exactly that many [`Renderable::Blank`] items, so the
//! vertical rhythm of the source survives.

pub mod code;
pub mod heading;
pub mod html;
pub mod image;
pub mod inline;
pub mod list;
pub mod paragraph;
pub mod table;
pub mod tree;

use ratatui::style::Color;

use self::image::ImageRenderer;
use self::inline::flatten_text;
use self::tree::{Block, BlockKind, Document};
use crate::config::RenderConfig;
use crate::primitives::cache::TextMateCache;
use crate::primitives::grammar_registry::{LoadedTheme, Registry};
use crate::primitives::styler::TokenStyler;
use crate::view::panel::{BorderKind, Panel};
use crate::view::renderable::Renderable;
use crate::view::style::Style;
use crate::view::text::StyledText;

/// Everything a block renderer needs
#[derive(Clone, Copy)]
pub struct MarkdownContext<'a> {
    pub theme: &'a LoadedTheme,
    pub styler: &'a TokenStyler,
    pub config: &'a RenderConfig,
    /// Grammar lookup for code and HTML blocks
    pub cache: &'a TextMateCache,
    pub registry: &'a Registry,
    pub images: &'a ImageRenderer,
}

pub struct DocumentRenderer<'a> {
    ctx: MarkdownContext<'a>,
}

impl<'a> DocumentRenderer<'a> {
    pub fn new(ctx: MarkdownContext<'a>) -> Self {
        Self { ctx }
    }

    /// Render `text` into an ordered list of renderables
    pub fn render(&self, text: &str) -> Vec<Renderable> {
        let doc = Document::parse(text);
        let mut out = Vec::new();
        let mut previous: Option<&Block> = None;

        for (index, block) in doc.blocks.iter().enumerate() {
            // A paragraph sharing its line with a following table is the
            // table's own header text
            if matches!(block.kind, BlockKind::Paragraph { .. })
                && doc
                    .blocks
                    .get(index + 1)
                    .is_some_and(|next| matches!(next.kind, BlockKind::Table { .. }) && next.line == block.line)
            {
                continue;
            }

            if let Some(prev) = previous {
                let gap = block.line.saturating_sub(doc.end_line(prev) + 1);
                out.extend(std::iter::repeat(Renderable::Blank).take(gap));
            }
            out.extend(self.render_block(block));
            previous = Some(block);
        }

        tracing::debug!(
            "Rendered markdown document: {} blocks -> {} renderables",
            doc.blocks.len(),
            out.len()
        );
        out
    }

    fn render_block(&self, block: &Block) -> Vec<Renderable> {
        let ctx = &self.ctx;
        match &block.kind {
            BlockKind::Heading { level, inlines } => vec![heading::render(ctx, *level, inlines)],
            BlockKind::Paragraph { inlines } => paragraph::render(ctx, inlines),
            BlockKind::List {
                ordered,
                start,
                items,
            } => list::render(ctx, *ordered, *start, items),
            BlockKind::Table { alignments, rows } => table::render(ctx, alignments, rows)
                .map(Renderable::Table)
                .into_iter()
                .collect(),
            BlockKind::Quote { children } => vec![quote(children)],
            BlockKind::CodeBlock {
                fenced,
                info,
                lines,
            } => vec![code::render(ctx, *fenced, info, lines)],
            BlockKind::Html { text } => vec![html::render(ctx, text)],
            BlockKind::ThematicBreak => vec![Renderable::Rule(Style::new().fg(Color::Gray))],
            // Items only appear inside lists
            BlockKind::ListItem { .. } => Vec::new(),
        }
    }
}

fn quote(children: &[Block]) -> Renderable {
    let text = children
        .iter()
        .map(quote_text)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    Renderable::Panel(
        Panel::new(Renderable::Text(StyledText::plain(text)))
            .title("quote")
            .border(BorderKind::Heavy),
    )
}

fn quote_text(block: &Block) -> String {
    match &block.kind {
        BlockKind::Paragraph { inlines } | BlockKind::Heading { inlines, .. } => {
            flatten_text(inlines, "\n")
        }
        BlockKind::CodeBlock { lines, .. } => lines.join("\n"),
        BlockKind::Html { text } => text.trim_end().to_string(),
        _ => block
            .children()
            .unwrap_or_default()
            .iter()
            .map(quote_text)
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::primitives::grammar_registry::ThemeId;
    use crate::view::style::line_text;

    /// Run `f` with a context over the default theme
    pub(crate) fn with_context<R>(f: impl FnOnce(&MarkdownContext<'_>) -> R) -> R {
        let cache = TextMateCache::new();
        let (registry, theme) = cache.get_theme(&ThemeId::default()).unwrap();
        let styler = TokenStyler::new();
        let config = RenderConfig::default();
        let images = ImageRenderer::new(&config);
        let ctx = MarkdownContext {
            theme: &theme,
            styler: &styler,
            config: &config,
            cache: &cache,
            registry: &registry,
            images: &images,
        };
        f(&ctx)
    }

    fn render(text: &str) -> Vec<Renderable> {
        with_context(|ctx| DocumentRenderer::new(*ctx).render(text))
    }

    fn blanks(items: &[Renderable]) -> usize {
        items.iter().filter(|r| **r == Renderable::Blank).count()
    }

    #[test]
    fn test_gaps_reproduce_blank_lines() {
        for gap in [0usize, 1, 2, 5] {
            let source = format!("# Title{}Body", "\n".repeat(gap + 1));
            let out = render(&source);
            assert_eq!(out.len(), 2 + gap, "gap {}", gap);
            assert_eq!(blanks(&out), gap);
        }
    }

    #[test]
    fn test_block_dispatch() {
        let out = render("> quoted\n\n---\n\n```py\nx = 1\n```\n");
        assert!(matches!(&out[0], Renderable::Panel(p) if p.title.as_deref() == Some("quote")));
        assert_eq!(out[1], Renderable::Blank);
        assert!(matches!(out[2], Renderable::Rule(_)));
        assert!(matches!(&out[4], Renderable::Panel(p) if p.title.as_deref() == Some("python")));
        assert_eq!(out.len(), 5);
    }

    #[test]
    fn test_quote_joins_paragraphs() {
        let out = render("> one\n>\n> two\n");
        let lines: Vec<String> = out[0].render(40).iter().map(|l| line_text(l)).collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[1].contains("one"));
        assert!(lines[2].contains("two"));
    }

    #[test]
    fn test_empty_document() {
        assert!(render("").is_empty());
        assert!(render("\n\n").is_empty());
    }

    #[test]
    fn test_list_after_paragraph() {
        let out = render("Intro\n\n- a\n- b\n\nOutro\n");
        let texts: Vec<String> = out
            .iter()
            .map(|r| match r {
                Renderable::Text(t) => t.plain_text(),
                Renderable::Blank => String::new(),
                _ => "?".to_string(),
            })
            .collect();
        assert_eq!(texts, vec!["Intro", "", "• a", "• b", "", "Outro"]);
    }
}
