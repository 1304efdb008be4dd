//! Scope stack to style resolution
//!
//! Matching follows syntect's own rule ordering: every theme item whose
//! selector matches the stack is ranked by match power, later items win ties,
//! and each of foreground, background and font style is taken from the best
//! ranked item that defines it.

use std::sync::Arc;

use once_cell::sync::Lazy;
use ratatui::style::{Color, Modifier};
use syntect::highlighting::{self, FontStyle, StyleModifier};
use syntect::parsing::Scope;

use super::cache::ConcurrentCache;
use super::grammar_registry::LoadedTheme;
use crate::view::style::Style;

static GLOBAL_STYLER: Lazy<Arc<TokenStyler>> = Lazy::new(|| Arc::new(TokenStyler::new()));

/// Cached style resolution keyed by (scope signature, theme identity)
#[derive(Debug, Default)]
pub struct TokenStyler {
    cache: ConcurrentCache<(String, u64), Option<Style>>,
}

impl TokenStyler {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide styler
    pub fn global() -> Arc<TokenStyler> {
        Arc::clone(&GLOBAL_STYLER)
    }

    /// Resolve the style for a scope stack, `None` meaning "terminal default"
    pub fn resolve_style<S: AsRef<str>>(&self, scopes: &[S], theme: &LoadedTheme) -> Option<Style> {
        let signature = scopes
            .iter()
            .map(|s| s.as_ref())
            .collect::<Vec<_>>()
            .join("\u{1f}");
        self.cache
            .get_or_insert_with((signature, theme.id()), || compute_style(scopes, theme))
    }

    /// Resolve a style, applying fallbacks for fields the theme leaves unset
    pub fn resolve_with_fallback<S: AsRef<str>>(
        &self,
        scopes: &[S],
        theme: &LoadedTheme,
        fallback: &Style,
    ) -> Style {
        match self.resolve_style(scopes, theme) {
            Some(style) => Style {
                fg: style.fg.or(fallback.fg),
                bg: style.bg.or(fallback.bg),
                modifier: if style.modifier.is_empty() {
                    fallback.modifier
                } else {
                    style.modifier
                },
                link: style.link,
            },
            None => fallback.clone(),
        }
    }

    pub fn clear(&self) {
        self.cache.clear();
    }
}

fn compute_style<S: AsRef<str>>(scopes: &[S], theme: &LoadedTheme) -> Option<Style> {
    let stack: Vec<Scope> = scopes
        .iter()
        .filter_map(|s| Scope::new(s.as_ref()).ok())
        .collect();
    if stack.is_empty() {
        return None;
    }

    let mut matches: Vec<(f64, usize, &StyleModifier)> = theme
        .theme()
        .scopes
        .iter()
        .enumerate()
        .filter_map(|(idx, item)| {
            item.scope
                .does_match(&stack)
                .map(|power| (power.0, idx, &item.style))
        })
        .collect();

    // Highest power first; for equal power the later rule takes precedence
    matches.sort_by(|a, b| b.0.total_cmp(&a.0).then(b.1.cmp(&a.1)));

    let foreground = matches.iter().find_map(|(_, _, m)| m.foreground.and_then(to_color));
    let background = matches.iter().find_map(|(_, _, m)| m.background.and_then(to_color));
    let font_style = matches
        .iter()
        .find_map(|(_, _, m)| m.font_style.filter(|f| !f.is_empty()))
        .unwrap_or_else(FontStyle::empty);

    let style = Style {
        fg: foreground,
        bg: background,
        modifier: to_modifier(font_style),
        link: None,
    };
    (!style.is_plain()).then_some(style)
}

/// Fully transparent colors mean "unset"
pub fn to_color(color: highlighting::Color) -> Option<Color> {
    (color.a != 0).then_some(Color::Rgb(color.r, color.g, color.b))
}

pub fn to_modifier(font_style: FontStyle) -> Modifier {
    let mut modifier = Modifier::empty();
    if font_style.contains(FontStyle::BOLD) {
        modifier |= Modifier::BOLD;
    }
    if font_style.contains(FontStyle::ITALIC) {
        modifier |= Modifier::ITALIC;
    }
    if font_style.contains(FontStyle::UNDERLINE) {
        modifier |= Modifier::UNDERLINED;
    }
    modifier
}
