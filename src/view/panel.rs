//! Bordered panel with an optional title in the top border

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::widgets::{Block, BorderType, Padding, Widget};
use unicode_width::UnicodeWidthStr;

use super::renderable::Renderable;
use super::style::{buffer_row, line_width, to_u16, SegmentLine, Style};
use super::text::{pad_line, truncate_line};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BorderKind {
    #[default]
    Rounded,
    Heavy,
}

impl BorderKind {
    pub fn border_type(self) -> BorderType {
        match self {
            Self::Rounded => BorderType::Rounded,
            Self::Heavy => BorderType::Thick,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    pub content: Box<Renderable>,
    pub title: Option<String>,
    pub border: BorderKind,
}

/// Columns taken by the border and the one-space padding on each side
pub const PANEL_CHROME: usize = 4;

impl Panel {
    pub fn new(content: Renderable) -> Self {
        Self {
            content: Box::new(content),
            title: None,
            border: BorderKind::Rounded,
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn border(mut self, border: BorderKind) -> Self {
        self.border = border;
        self
    }

    pub fn render(&self, width: usize) -> Vec<SegmentLine> {
        let available = width.saturating_sub(PANEL_CHROME).max(1);
        let body = self.content.render(available);
        self.frame(body, available)
    }

    fn block(&self) -> Block<'static> {
        let block = Block::bordered()
            .border_type(self.border.border_type())
            .padding(Padding::horizontal(1));
        match self.title.as_deref().filter(|t| !t.is_empty()) {
            Some(title) => block.title(format!(" {} ", title)),
            None => block,
        }
    }

    /// Draw the border around rows already rendered at `available` columns
    ///
    /// The panel shrinks to the widest row (or the title) and body rows are
    /// spliced in as segments, so hyperlinks inside the panel survive.
    pub fn frame(&self, body: Vec<SegmentLine>, available: usize) -> Vec<SegmentLine> {
        let available = available.clamp(1, u16::MAX as usize - PANEL_CHROME);
        let title_width = self.title.as_deref().map(UnicodeWidthStr::width).unwrap_or(0);
        let inner = body
            .iter()
            .map(|l| line_width(l))
            .max()
            .unwrap_or(0)
            .max(title_width)
            .clamp(1, available);

        // Top border, one body row, bottom border
        let area = Rect::new(0, 0, to_u16(inner + PANEL_CHROME), 3);
        let mut buf = Buffer::empty(area);
        let block = self.block();
        let content = block.inner(area);
        block.render(area, &mut buf);

        let left = buffer_row(&buf, content.y, area.left(), content.left());
        let right = buffer_row(&buf, content.y, content.right(), area.right());

        let mut lines = Vec::with_capacity(body.len() + 2);
        lines.push(buffer_row(&buf, area.top(), area.left(), area.right()));
        for row in body {
            let mut line = left.clone();
            line.extend(pad_line(truncate_line(&row, inner), inner, &Style::default()));
            line.extend(right.iter().cloned());
            lines.push(line);
        }
        lines.push(buffer_row(&buf, area.bottom() - 1, area.left(), area.right()));
        lines
    }

    pub fn measure(&self, width: usize) -> (usize, usize) {
        let (min, max) = self
            .content
            .measure(width.saturating_sub(PANEL_CHROME).max(1));
        (min + PANEL_CHROME, max + PANEL_CHROME)
    }
}
