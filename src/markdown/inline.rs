//! Inline content to styled runs

use std::borrow::Cow;

use once_cell::sync::Lazy;
use ratatui::style::{Color, Modifier};
use regex::Regex;

use super::tree::Inline;
use super::MarkdownContext;
use crate::config::EmphasisFallback;
use crate::render::line_renderer::escape_control;
use crate::view::style::Style;
use crate::view::text::StyledText;

static MENTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@[a-zA-Z0-9_-]+").expect("valid mention regex"));

pub const IMAGE_ICON: &str = "🖼️";

/// Control characters shown as visible symbols; line feeds are kept
fn visible(text: &str) -> Cow<'_, str> {
    if !text.contains('\n') {
        return escape_control(text);
    }
    Cow::Owned(
        text.split('\n')
            .map(escape_control)
            .collect::<Vec<_>>()
            .join("\n"),
    )
}

/// Plain text of inline content; line breaks become `line_break`
pub fn flatten_text(inlines: &[Inline], line_break: &str) -> String {
    let mut out = String::new();
    flatten_into(inlines, line_break, &mut out);
    out
}

fn flatten_into(inlines: &[Inline], line_break: &str, out: &mut String) {
    for inline in inlines {
        match inline {
            Inline::Text(text) | Inline::Code(text) | Inline::Html(text) => {
                out.push_str(&visible(text))
            }
            Inline::Autolink(url) => out.push_str(&visible(url)),
            Inline::Emphasis { children, .. }
            | Inline::Strikethrough(children)
            | Inline::Image { children, .. } => flatten_into(children, line_break, out),
            Inline::Link { url, children } => {
                if children.is_empty() {
                    out.push_str(&visible(url));
                } else {
                    flatten_into(children, line_break, out);
                }
            }
            Inline::LineBreak { .. } => out.push_str(line_break),
            Inline::TaskMarker { .. } => {}
        }
    }
}

/// Decoration for an emphasis run with `delimiters` markers
pub fn emphasis_modifier(delimiters: u8, fallback: EmphasisFallback) -> Modifier {
    let single = match fallback {
        EmphasisFallback::Italic => Modifier::ITALIC,
        EmphasisFallback::Underline => Modifier::UNDERLINED,
    };
    match delimiters {
        1 => single,
        2 => Modifier::BOLD,
        3 => Modifier::BOLD | single,
        _ => Modifier::empty(),
    }
}

pub fn code_style(ctx: &MarkdownContext<'_>) -> Style {
    ctx.styler.resolve_with_fallback(
        &["text.html.markdown", "markup.raw.inline.markdown"],
        ctx.theme,
        &Style::new().fg(Color::Yellow).bg(Color::Indexed(234)),
    )
}

pub fn link_style(ctx: &MarkdownContext<'_>, url: &str) -> Style {
    ctx.styler
        .resolve_with_fallback(
            &["text.html.markdown", "markup.underline.link.markdown"],
            ctx.theme,
            &Style::new().fg(Color::Blue),
        )
        .add_modifier(Modifier::UNDERLINED)
        .link(url)
}

/// Builds the styled runs of a paragraph-like inline sequence
pub struct RunBuilder<'c, 'a> {
    ctx: &'c MarkdownContext<'a>,
    /// Render line breaks as a single space (list items stay on one row)
    inline_breaks: bool,
}

impl<'c, 'a> RunBuilder<'c, 'a> {
    pub fn new(ctx: &'c MarkdownContext<'a>) -> Self {
        Self {
            ctx,
            inline_breaks: false,
        }
    }

    pub fn inline_breaks(mut self, inline_breaks: bool) -> Self {
        self.inline_breaks = inline_breaks;
        self
    }

    pub fn build(&self, inlines: &[Inline]) -> StyledText {
        let mut text = StyledText::new();
        self.append(&mut text, inlines);
        text
    }

    pub fn append(&self, text: &mut StyledText, inlines: &[Inline]) {
        self.append_styled(text, inlines, &Style::default(), true);
    }

    fn append_styled(&self, text: &mut StyledText, inlines: &[Inline], base: &Style, top: bool) {
        for (i, inline) in inlines.iter().enumerate() {
            match inline {
                Inline::Text(s) if top => self.push_mentions(text, &visible(s)),
                Inline::Text(s) | Inline::Html(s) => text.push(visible(s), base.clone()),
                Inline::Emphasis {
                    delimiters,
                    children,
                } => {
                    let style = base.clone().add_modifier(emphasis_modifier(
                        *delimiters,
                        self.ctx.config.emphasis_fallback,
                    ));
                    self.append_styled(text, children, &style, false);
                }
                Inline::Strikethrough(children) => {
                    let style = base.clone().add_modifier(Modifier::CROSSED_OUT);
                    self.append_styled(text, children, &style, false);
                }
                Inline::Code(code) => text.push(visible(code), code_style(self.ctx).patch(base)),
                Inline::Link { url, children } => {
                    let label = flatten_text(children, " ");
                    let label = if label.is_empty() {
                        visible(url).into_owned()
                    } else {
                        label
                    };
                    text.push(label, base.clone().patch(&link_style(self.ctx, url)));
                }
                Inline::Autolink(url) => {
                    text.push(visible(url), base.clone().patch(&link_style(self.ctx, url)))
                }
                Inline::Image { url, children, .. } => {
                    let alt = flatten_text(children, " ");
                    let style = Style::new()
                        .fg(Color::Blue)
                        .add_modifier(Modifier::UNDERLINED)
                        .link(url);
                    text.push(format!("{} {}", IMAGE_ICON, alt), style);
                }
                Inline::LineBreak { .. } => {
                    if self.inline_breaks {
                        text.push(" ", base.clone());
                    } else if !inlines[i + 1..].iter().all(Inline::is_line_break) {
                        text.push("\n", base.clone());
                    }
                }
                Inline::TaskMarker { .. } => {}
            }
        }
    }

    /// Plain text with `@name` runs turned into profile links
    fn push_mentions(&self, text: &mut StyledText, s: &str) {
        let mut last = 0;
        for found in MENTION.find_iter(s) {
            text.push(&s[last..found.start()], Style::default());
            let url = format!(
                "{}{}",
                self.ctx.config.mention_base_url,
                &found.as_str()[1..]
            );
            let style = Style::new()
                .fg(Color::Blue)
                .add_modifier(Modifier::UNDERLINED)
                .link(url);
            text.push(found.as_str(), style);
            last = found.end();
        }
        text.push(&s[last..], Style::default());
    }
}
