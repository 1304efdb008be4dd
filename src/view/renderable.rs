//! The closed set of terminal renderables produced by the renderers

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::text::Text;
use ratatui::widgets::{Block, Borders, Widget};

use super::image::{ImageError, ImageView};
use super::panel::Panel;
use super::style::{buffer_lines, to_ratatui_line, to_u16, SegmentLine, Style};
use super::table::Table;
use super::text::StyledText;

/// A measurable unit of terminal output
#[derive(Debug, Clone, PartialEq)]
pub enum Renderable {
    /// One empty row
    Blank,
    Text(StyledText),
    Panel(Panel),
    Table(Table),
    /// Full-width horizontal line
    Rule(Style),
    Image(ImageView),
    /// Children stacked vertically
    Rows(Vec<Renderable>),
}

impl Renderable {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(StyledText::plain(text))
    }

    /// Render into rows of at most `width` columns
    ///
    /// Images whose backend fails are drawn as their fallback text.
    pub fn render(&self, width: usize) -> Vec<SegmentLine> {
        match self.try_render(width) {
            Ok(lines) => lines,
            Err(e) => {
                tracing::debug!("Render fell back to text: {}", e);
                self.render_fallback(width)
            }
        }
    }

    pub fn try_render(&self, width: usize) -> Result<Vec<SegmentLine>, ImageError> {
        let width = width.max(1);
        Ok(match self {
            Self::Blank => vec![Vec::new()],
            Self::Text(text) => text.render(width),
            Self::Panel(panel) => panel.render(width),
            Self::Table(table) => table.render(width),
            Self::Rule(style) => rule(width, style),
            Self::Image(image) => image.try_render(width)?,
            Self::Rows(children) => {
                let mut lines = Vec::new();
                for child in children {
                    lines.extend(child.try_render(width)?);
                }
                lines
            }
        })
    }

    fn render_fallback(&self, width: usize) -> Vec<SegmentLine> {
        match self {
            Self::Image(image) => image.fallback().render(width.max(1)),
            Self::Rows(children) => children.iter().flat_map(|c| c.render(width)).collect(),
            other => other.try_render(width).unwrap_or_default(),
        }
    }

    /// Rows this renderable occupies at `width`; failures count as one row
    pub fn height(&self, width: usize) -> usize {
        self.try_render(width).map(|l| l.len().max(1)).unwrap_or(1)
    }

    /// `(min, max)` width needed, capped at `width`
    pub fn measure(&self, width: usize) -> (usize, usize) {
        let (min, max) = match self {
            Self::Blank => (0, 0),
            Self::Text(text) => text.measure(),
            Self::Panel(panel) => panel.measure(width),
            Self::Table(table) => table.measure(),
            Self::Rule(_) => (1, width),
            Self::Image(image) => (1, image.max_width as usize),
            Self::Rows(children) => children
                .iter()
                .map(|c| c.measure(width))
                .fold((0, 0), |(a, b), (c, d)| (a.max(c), b.max(d))),
        };
        (min.min(width), max.min(width))
    }

    /// Whether drawing this may have side effects (terminal graphics)
    pub fn is_image(&self) -> bool {
        match self {
            Self::Image(_) => true,
            Self::Rows(children) => children.iter().any(Renderable::is_image),
            Self::Panel(panel) => panel.content.is_image(),
            _ => false,
        }
    }

    /// Convert to ratatui text for drawing in a frame
    pub fn to_text(&self, width: usize) -> Text<'static> {
        Text::from(
            self.render(width)
                .iter()
                .map(|l| to_ratatui_line(l))
                .collect::<Vec<_>>(),
        )
    }
}

/// A top-only block border across `width` columns
fn rule(width: usize, style: &Style) -> Vec<SegmentLine> {
    let area = Rect::new(0, 0, to_u16(width), 1);
    let mut buf = Buffer::empty(area);
    Block::new()
        .borders(Borders::TOP)
        .border_style(style.to_ratatui())
        .render(area, &mut buf);
    buffer_lines(&buf)
}

impl From<StyledText> for Renderable {
    fn from(text: StyledText) -> Self {
        Self::Text(text)
    }
}

impl From<Panel> for Renderable {
    fn from(panel: Panel) -> Self {
        Self::Panel(panel)
    }
}

impl From<Table> for Renderable {
    fn from(table: Table) -> Self {
        Self::Table(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::image::ImageBackend;
    use crate::view::style::{line_text, Segment};
    use ratatui::style::Color;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    struct FailingBackend;

    impl ImageBackend for FailingBackend {
        fn name(&self) -> &str {
            "failing"
        }

        fn render(&self, _: &Path, _: u16, _: u16) -> Result<Vec<SegmentLine>, ImageError> {
            Err(ImageError::Backend("no graphics".to_string()))
        }
    }

    #[test]
    fn test_blank_is_one_empty_row() {
        assert_eq!(Renderable::Blank.render(10), vec![Vec::<Segment>::new()]);
        assert_eq!(Renderable::Blank.height(10), 1);
    }

    #[test]
    fn test_rule_fills_width() {
        let lines = Renderable::Rule(Style::default()).render(5);
        assert_eq!(line_text(&lines[0]), "─────");

        let styled = Renderable::Rule(Style::new().fg(Color::Gray)).render(3);
        assert_eq!(styled, vec![vec![Segment::new("───", Style::new().fg(Color::Gray))]]);
    }

    #[test]
    fn test_rows_stack_children() {
        let rows = Renderable::Rows(vec![Renderable::text("a\nb"), Renderable::Blank]);
        assert_eq!(rows.height(10), 3);
        assert_eq!(rows.measure(10), (1, 1));
    }

    #[test]
    fn test_failing_image_falls_back_and_measures_one() {
        let image = Renderable::Image(ImageView::new(
            "logo",
            PathBuf::from("logo.png"),
            80,
            30,
            Arc::new(FailingBackend),
            StyledText::plain("🖼️ Image: logo"),
        ));
        assert!(image.is_image());
        assert_eq!(image.height(40), 1);
        assert_eq!(line_text(&image.render(40)[0]), "🖼️ Image: logo");
    }

    #[test]
    fn test_to_text_line_count() {
        let text = Renderable::text("one\ntwo").to_text(10);
        assert_eq!(text.lines.len(), 2);
    }
}
