//! Pager footer: key help plus the `start-end/total` counter

use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;
use unicode_width::UnicodeWidthStr;

pub const KEY_HELP: &str =
    "Up/Down: ↑↓  PgUp/PgDn: PgUp/PgDn/Spacebar  Home/End: Home/End  q/Esc: Quit";

/// Renders the footer row
pub struct FooterRenderer;

impl FooterRenderer {
    pub fn counter(start: usize, end: usize, total: usize) -> String {
        format!(" {}-{}/{} ", start, end, total)
    }

    /// Footer laid out for `width` columns
    ///
    /// The counter is right-aligned; the key help is dropped when both do not
    /// fit.
    pub fn line(start: usize, end: usize, total: usize, width: usize) -> Line<'static> {
        let counter = Self::counter(start, end, total);
        let counter_width = counter.width();
        let help_style = Style::default().fg(Color::Black).bg(Color::White);
        let counter_style = Style::default().fg(Color::White).bg(Color::DarkGray);

        if KEY_HELP.width() + counter_width + 1 > width {
            let pad = width.saturating_sub(counter_width);
            return Line::from(vec![
                Span::styled(" ".repeat(pad), help_style),
                Span::styled(counter, counter_style),
            ]);
        }

        let pad = width - KEY_HELP.width() - counter_width;
        Line::from(vec![
            Span::styled(format!("{}{}", KEY_HELP, " ".repeat(pad)), help_style),
            Span::styled(counter, counter_style),
        ])
    }

    pub fn render(frame: &mut Frame, area: Rect, start: usize, end: usize, total: usize) {
        let line = Self::line(start, end, total, area.width as usize);
        frame.render_widget(Paragraph::new(line), area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_counter() {
        assert_eq!(FooterRenderer::counter(1, 23, 140), " 1-23/140 ");
    }

    #[test]
    fn test_footer_fills_width() {
        let line = FooterRenderer::line(5, 9, 10, 120);
        let text = text(&line);
        assert_eq!(text.width(), 120);
        assert!(text.starts_with("Up/Down"));
        assert!(text.ends_with(" 5-9/10 "));
    }

    #[test]
    fn test_narrow_footer_keeps_counter() {
        let text = text(&FooterRenderer::line(1, 2, 3, 20));
        assert_eq!(text.width(), 20);
        assert!(!text.contains("Up/Down"));
        assert!(text.ends_with(" 1-2/3 "));
    }
}
