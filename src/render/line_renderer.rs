//! Tokenize-and-style renderer for plain source lines
//!
//! One renderable per input line, in order. Lexer state flows from each line
//! to the next; empty lines become [`Renderable::Blank`] without touching the
//! tokenizer.

use std::borrow::Cow;

use crate::error::{RenderError, Result, TokenizeError};
use crate::primitives::grammar_registry::{Grammar, LoadedTheme};
use crate::primitives::styler::TokenStyler;
use crate::primitives::syntect_highlighter::LexerState;
use crate::view::renderable::Renderable;
use crate::view::text::StyledText;

pub struct LineRenderer<'a> {
    grammar: &'a Grammar,
    theme: &'a LoadedTheme,
    styler: &'a TokenStyler,
    raw: bool,
}

impl<'a> LineRenderer<'a> {
    pub fn new(grammar: &'a Grammar, theme: &'a LoadedTheme, styler: &'a TokenStyler) -> Self {
        Self {
            grammar,
            theme,
            styler,
            raw: false,
        }
    }

    /// Keep control characters as-is (for text embedded in a code block)
    pub fn raw(mut self, raw: bool) -> Self {
        self.raw = raw;
        self
    }

    pub fn grammar(&self) -> &Grammar {
        self.grammar
    }

    /// Render one line, advancing `state`
    pub fn render_line(
        &self,
        line: &str,
        state: &mut Option<LexerState>,
    ) -> std::result::Result<Renderable, TokenizeError> {
        if line.is_empty() {
            return Ok(Renderable::Blank);
        }

        let (tokens, next) = self.grammar.tokenize_line(line, state.take())?;
        *state = Some(next);

        let mut text = StyledText::new();
        for token in tokens {
            let start = token.start.min(line.len());
            let end = token.end.min(line.len());
            if start >= end {
                continue;
            }
            let Some(slice) = line.get(start..end) else {
                continue;
            };
            let style = self
                .styler
                .resolve_style(&token.scopes, self.theme)
                .unwrap_or_default();
            let slice = if self.raw {
                Cow::Borrowed(slice)
            } else {
                escape_control(slice)
            };
            text.push(slice.into_owned(), style);
        }
        Ok(Renderable::Text(text))
    }

    /// Render every line; any tokenizer failure fails the whole call
    pub fn render<S: AsRef<str>>(&self, lines: &[S]) -> Result<Vec<Renderable>> {
        let mut state = None;
        lines
            .iter()
            .enumerate()
            .map(|(index, line)| {
                self.render_line(line.as_ref(), &mut state)
                    .map_err(|source| self.failure(index, source))
            })
            .collect()
    }

    pub(crate) fn failure(&self, line: usize, source: TokenizeError) -> RenderError {
        tracing::warn!(
            "Tokenizer failed on line {} with grammar {}: {}",
            line,
            self.grammar.name(),
            source
        );
        RenderError::RenderingFailed {
            grammar: self.grammar.name().to_string(),
            line,
            source,
        }
    }
}

/// Replace C0 controls (except tab) and DEL with their visible pictures
pub fn escape_control(text: &str) -> Cow<'_, str> {
    if !text.chars().any(is_escaped) {
        return Cow::Borrowed(text);
    }
    Cow::Owned(
        text.chars()
            .map(|c| match c {
                '\u{7f}' => '\u{2421}',
                c if is_escaped(c) => char::from_u32(0x2400 + c as u32).unwrap_or('\u{fffd}'),
                c => c,
            })
            .collect(),
    )
}

fn is_escaped(c: char) -> bool {
    (c.is_ascii_control() && c != '\t') || c == '\u{7f}'
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::grammar_registry::{Registry, ThemeId};

    fn setup() -> (Grammar, LoadedTheme, TokenStyler) {
        let grammar = Registry::shared().grammar_for_extension("rs").unwrap();
        let theme = LoadedTheme::load(&ThemeId::default()).unwrap();
        (grammar, theme, TokenStyler::new())
    }

    #[test]
    fn test_one_renderable_per_line() {
        let (grammar, theme, styler) = setup();
        let renderer = LineRenderer::new(&grammar, &theme, &styler);
        let lines = ["fn main() {", "", "    let x = 1;", "}"];
        let out = renderer.render(&lines).unwrap();

        assert_eq!(out.len(), 4);
        assert_eq!(out[1], Renderable::Blank);
        match &out[2] {
            Renderable::Text(text) => assert_eq!(text.plain_text(), "    let x = 1;"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_keywords_are_styled() {
        let (grammar, theme, styler) = setup();
        let renderer = LineRenderer::new(&grammar, &theme, &styler);
        let out = renderer.render(&["fn main() {}"]).unwrap();
        let Renderable::Text(text) = &out[0] else {
            panic!("expected text");
        };
        assert!(text.segments().iter().any(|s| s.style.fg.is_some()));
        assert!(text.segments().len() > 1);
    }

    #[test]
    fn test_control_characters_escaped_unless_raw() {
        let (grammar, theme, styler) = setup();
        let escaped = LineRenderer::new(&grammar, &theme, &styler)
            .render(&["a\u{1b}[31mb"])
            .unwrap();
        let raw = LineRenderer::new(&grammar, &theme, &styler)
            .raw(true)
            .render(&["a\u{1b}[31mb"])
            .unwrap();

        let text = |r: &Renderable| match r {
            Renderable::Text(t) => t.plain_text(),
            _ => String::new(),
        };
        assert_eq!(text(&escaped[0]), "a\u{241b}[31mb");
        assert_eq!(text(&raw[0]), "a\u{1b}[31mb");
    }

    #[test]
    fn test_escape_control() {
        assert_eq!(escape_control("plain\ttab"), "plain\ttab");
        assert_eq!(escape_control("\u{7}"), "\u{2407}");
        assert_eq!(escape_control("\u{7f}"), "\u{2421}");
    }
}
