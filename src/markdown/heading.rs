use ratatui::style::{Color, Modifier};

use super::inline::flatten_text;
use super::tree::Inline;
use super::MarkdownContext;
use crate::view::renderable::Renderable;
use crate::view::style::Style;
use crate::view::text::StyledText;

/// Foreground used when the theme has no heading color
fn level_color(level: u8) -> Option<Color> {
    match level {
        1 => Some(Color::Red),
        2 => Some(Color::Indexed(214)),
        3 => Some(Color::Yellow),
        4 => Some(Color::Green),
        5 => Some(Color::Blue),
        6 => Some(Color::Indexed(129)),
        _ => None,
    }
}

pub fn render(ctx: &MarkdownContext<'_>, level: u8, inlines: &[Inline]) -> Renderable {
    let text = flatten_text(inlines, " ");
    let scopes = [
        "text.html.markdown".to_string(),
        "markup.heading.markdown".to_string(),
        format!("markup.heading.{}.markdown", level),
    ];
    let fallback = Style {
        fg: level_color(level),
        ..Style::default()
    };
    let mut style = ctx.styler.resolve_with_fallback(&scopes, ctx.theme, &fallback);
    if style.modifier.is_empty() {
        style = style.add_modifier(Modifier::BOLD);
    }
    Renderable::Text(StyledText::styled(text, style))
}
