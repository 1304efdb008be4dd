//! Resolved text styles and styled segments

use std::sync::Arc;

use ratatui::buffer::{Buffer, Cell};
use ratatui::style::{Color, Modifier};
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthStr;

/// Foreground/background/decoration plus an optional hyperlink target
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Style {
    pub fg: Option<Color>,
    pub bg: Option<Color>,
    pub modifier: Modifier,
    pub link: Option<Arc<str>>,
}

impl Style {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fg(mut self, color: Color) -> Self {
        self.fg = Some(color);
        self
    }

    pub fn bg(mut self, color: Color) -> Self {
        self.bg = Some(color);
        self
    }

    pub fn add_modifier(mut self, modifier: Modifier) -> Self {
        self.modifier |= modifier;
        self
    }

    pub fn link(mut self, url: impl AsRef<str>) -> Self {
        self.link = Some(Arc::from(url.as_ref()));
        self
    }

    /// True when drawing with this style looks the same as the terminal default
    pub fn is_plain(&self) -> bool {
        self.fg.is_none() && self.bg.is_none() && self.modifier.is_empty() && self.link.is_none()
    }

    /// Layer `other` on top of `self`: set colors win, decorations accumulate
    pub fn patch(mut self, other: &Style) -> Self {
        if other.fg.is_some() {
            self.fg = other.fg;
        }
        if other.bg.is_some() {
            self.bg = other.bg;
        }
        self.modifier |= other.modifier;
        if other.link.is_some() {
            self.link.clone_from(&other.link);
        }
        self
    }

    /// Convert to a ratatui style (hyperlinks are dropped)
    pub fn to_ratatui(&self) -> ratatui::style::Style {
        let mut style = ratatui::style::Style::default().add_modifier(self.modifier);
        if let Some(fg) = self.fg {
            style = style.fg(fg);
        }
        if let Some(bg) = self.bg {
            style = style.bg(bg);
        }
        style
    }

    /// Style of a drawn buffer cell; `Color::Reset` counts as unset
    fn from_cell(cell: &Cell) -> Self {
        let color = |c: Color| (c != Color::Reset).then_some(c);
        Self {
            fg: color(cell.fg),
            bg: color(cell.bg),
            modifier: cell.modifier,
            link: None,
        }
    }
}

/// A run of text drawn with one style
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub style: Style,
}

impl Segment {
    pub fn new(text: impl Into<String>, style: Style) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, Style::default())
    }

    pub fn width(&self) -> usize {
        self.text.width()
    }
}

/// One terminal row of segments
pub type SegmentLine = Vec<Segment>;

/// Display width of a row
pub fn line_width(line: &[Segment]) -> usize {
    line.iter().map(Segment::width).sum()
}

/// Plain text of a row
pub fn line_text(line: &[Segment]) -> String {
    line.iter().map(|s| s.text.as_str()).collect()
}

/// Convert a row to a ratatui line
pub fn to_ratatui_line(line: &[Segment]) -> Line<'static> {
    Line::from(
        line.iter()
            .map(|segment| Span::styled(segment.text.clone(), segment.style.to_ratatui()))
            .collect::<Vec<_>>(),
    )
}

/// Read columns `x0..x1` of row `y` back out of a drawn buffer
///
/// Cells covered by a preceding wide character are skipped and equal
/// styles are merged into one segment.
pub fn buffer_row(buf: &Buffer, y: u16, x0: u16, x1: u16) -> SegmentLine {
    let mut line: SegmentLine = Vec::new();
    let mut covered = 0;
    for x in x0..x1 {
        let cell = &buf[(x, y)];
        if covered > 0 {
            covered -= 1;
            continue;
        }
        if cell.skip {
            continue;
        }
        let symbol = cell.symbol();
        covered = symbol.width().saturating_sub(1);
        let style = Style::from_cell(cell);
        match line.last_mut() {
            Some(last) if last.style == style => last.text.push_str(symbol),
            _ => line.push(Segment::new(symbol, style)),
        }
    }
    line
}

/// Every row of a drawn buffer
pub fn buffer_lines(buf: &Buffer) -> Vec<SegmentLine> {
    let area = buf.area;
    (area.top()..area.bottom())
        .map(|y| buffer_row(buf, y, area.left(), area.right()))
        .collect()
}

/// Clamp a column or row count to what a ratatui `Rect` can hold
pub(crate) fn to_u16(n: usize) -> u16 {
    u16::try_from(n).unwrap_or(u16::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_detection() {
        assert!(Style::new().is_plain());
        assert!(!Style::new().fg(Color::Red).is_plain());
        assert!(!Style::new().add_modifier(Modifier::BOLD).is_plain());
        assert!(!Style::new().link("https://example.com").is_plain());
    }

    #[test]
    fn test_patch_accumulates_decorations() {
        let base = Style::new().fg(Color::Red).add_modifier(Modifier::ITALIC);
        let top = Style::new().bg(Color::Black).add_modifier(Modifier::BOLD);
        let merged = base.patch(&top);

        assert_eq!(merged.fg, Some(Color::Red));
        assert_eq!(merged.bg, Some(Color::Black));
        assert!(merged.modifier.contains(Modifier::ITALIC | Modifier::BOLD));
    }

    #[test]
    fn test_line_width_counts_wide_chars() {
        let line = vec![Segment::plain("ab"), Segment::plain("漢字")];
        assert_eq!(line_width(&line), 6);
        assert_eq!(line_text(&line), "ab漢字");
    }

    #[test]
    fn test_buffer_rows_merge_styles_and_skip_wide_cells() {
        use ratatui::layout::Rect;

        let mut buf = Buffer::empty(Rect::new(0, 0, 6, 1));
        buf.set_string(0, 0, "漢a", ratatui::style::Style::default().fg(Color::Red));
        buf.set_string(3, 0, "bc", ratatui::style::Style::default());

        let lines = buffer_lines(&buf);
        assert_eq!(lines.len(), 1);
        assert_eq!(line_text(&lines[0]), "漢abc ");
        assert_eq!(lines[0][0].text, "漢a");
        assert_eq!(lines[0][0].style.fg, Some(Color::Red));
        assert!(lines[0][1].style.is_plain());
        assert_eq!(line_width(&lines[0]), 6);
    }
}
