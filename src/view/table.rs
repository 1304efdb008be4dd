//! Rounded table with per-column alignment

use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Flex, Layout, Rect};
use ratatui::style::Modifier;
use ratatui::text::Text;
use ratatui::widgets::{self, Block, BorderType, Padding, Row, Widget};

use super::style::{buffer_lines, to_ratatui_line, to_u16, SegmentLine, Style};
use super::text::StyledText;

/// Blank columns between two cells
const COLUMN_SPACING: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub header: Vec<StyledText>,
    pub rows: Vec<Vec<StyledText>>,
    pub alignments: Vec<Alignment>,
    pub border_style: Style,
}

impl Table {
    pub fn new(header: Vec<StyledText>) -> Self {
        Self {
            header,
            rows: Vec::new(),
            alignments: Vec::new(),
            border_style: Style::default(),
        }
    }

    pub fn column_count(&self) -> usize {
        self.rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.header.len()))
            .max()
            .unwrap_or(0)
    }

    fn alignment(&self, column: usize) -> Alignment {
        self.alignments.get(column).copied().unwrap_or(Alignment::Left)
    }

    fn cells(&self) -> impl Iterator<Item = (usize, &StyledText)> {
        std::iter::once(&self.header)
            .chain(self.rows.iter())
            .flat_map(|row| row.iter().enumerate())
    }

    /// Natural (unwrapped) and minimal (widest word) width per column
    fn column_widths(&self) -> (Vec<usize>, Vec<usize>) {
        let columns = self.column_count();
        let mut natural = vec![1; columns];
        let mut minimal = vec![1; columns];
        for (col, cell) in self.cells() {
            let (min, max) = cell.measure();
            natural[col] = natural[col].max(max);
            minimal[col] = minimal[col].max(min);
        }
        (natural, minimal)
    }

    /// Border, padding and the gaps between columns
    fn chrome(columns: usize) -> usize {
        4 + COLUMN_SPACING * columns.saturating_sub(1)
    }

    fn block(&self) -> Block<'static> {
        Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(self.border_style.to_ratatui())
            .padding(Padding::horizontal(1))
    }

    /// Column widths inside `inner`: natural widths when they fit, otherwise
    /// shared out in proportion to them
    fn layout_columns(natural: &[usize], inner: Rect) -> Vec<usize> {
        let gaps = COLUMN_SPACING * natural.len().saturating_sub(1);
        let fits = natural.iter().sum::<usize>() + gaps <= inner.width as usize;
        let constraints = natural.iter().map(|&w| {
            if fits {
                Constraint::Length(to_u16(w))
            } else {
                Constraint::Fill(to_u16(w))
            }
        });
        Layout::horizontal(constraints)
            .flex(Flex::Start)
            .spacing(to_u16(COLUMN_SPACING))
            .split(inner)
            .iter()
            .map(|rect| (rect.width as usize).max(1))
            .collect()
    }

    /// Cells wrapped to their column width, and the resulting row height
    fn row(&self, cells: &[StyledText], widths: &[usize]) -> (Row<'static>, usize) {
        let empty = StyledText::new();
        let rendered: Vec<Vec<SegmentLine>> = widths
            .iter()
            .enumerate()
            .map(|(col, width)| cells.get(col).unwrap_or(&empty).render(*width))
            .collect();
        let height = rendered.iter().map(Vec::len).max().unwrap_or(1).max(1);
        let row = Row::new(rendered.into_iter().enumerate().map(|(col, lines)| {
            let lines: Vec<_> = lines.iter().map(|l| to_ratatui_line(l)).collect();
            Text::from(lines).alignment(self.alignment(col))
        }))
        .height(to_u16(height));
        (row, height)
    }

    pub fn render(&self, width: usize) -> Vec<SegmentLine> {
        let columns = self.column_count();
        if columns == 0 {
            return Vec::new();
        }

        let (natural, _) = self.column_widths();
        let table_width = (natural.iter().sum::<usize>() + Self::chrome(columns)).min(width);
        let block = self.block();
        let sizing = Rect::new(0, 0, to_u16(table_width), 2);
        let widths = Self::layout_columns(&natural, block.inner(sizing));

        let (header, header_height) = self.row(&self.header, &widths);
        let header = header.style(ratatui::style::Style::new().add_modifier(Modifier::BOLD));
        let mut height = header_height + 2;
        let rows: Vec<Row> = self
            .rows
            .iter()
            .map(|cells| {
                let (row, h) = self.row(cells, &widths);
                height += h;
                row
            })
            .collect();

        let area = Rect::new(0, 0, to_u16(table_width), to_u16(height));
        let mut buf = Buffer::empty(area);
        widgets::Table::new(rows, widths.iter().map(|&w| Constraint::Length(to_u16(w))))
            .header(header)
            .block(block)
            .column_spacing(to_u16(COLUMN_SPACING))
            .flex(Flex::Start)
            .render(area, &mut buf);
        buffer_lines(&buf)
    }

    pub fn measure(&self) -> (usize, usize) {
        let columns = self.column_count();
        if columns == 0 {
            return (0, 0);
        }
        let (natural, minimal) = self.column_widths();
        let chrome = Self::chrome(columns);
        (
            minimal.iter().sum::<usize>() + chrome,
            natural.iter().sum::<usize>() + chrome,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::style::line_text;

    fn texts(lines: &[SegmentLine]) -> Vec<String> {
        lines.iter().map(|l| line_text(l)).collect()
    }

    fn cells(values: &[&str]) -> Vec<StyledText> {
        values.iter().map(|v| StyledText::plain(*v)).collect()
    }

    #[test]
    fn test_render_with_alignment() {
        let mut table = Table::new(cells(&["Name", "Qty"]));
        table.alignments = vec![Alignment::Left, Alignment::Right];
        table.rows = vec![cells(&["apple", "3"]), cells(&["fig", "12"])];

        assert_eq!(
            texts(&table.render(80)),
            vec![
                "╭────────────╮",
                "│ Name   Qty │",
                "│ apple    3 │",
                "│ fig     12 │",
                "╰────────────╯",
            ]
        );
    }

    #[test]
    fn test_header_is_bold() {
        let mut table = Table::new(cells(&["H"]));
        table.rows = vec![cells(&["v"])];
        let lines = table.render(80);
        let header_cell = lines[1].iter().find(|s| s.text == "H").unwrap();
        assert!(header_cell.style.modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_narrow_table_wraps_cells() {
        let mut table = Table::new(cells(&["a", "b"]));
        table.rows = vec![cells(&["one two", "x"])];
        let lines = texts(&table.render(12));
        assert!(lines.iter().all(|l| unicode_width::UnicodeWidthStr::width(l.as_str()) <= 12));
        assert!(lines.iter().any(|l| l.contains("one")));
        assert!(lines.iter().any(|l| l.contains("two")));
        assert!(!lines.iter().any(|l| l.contains("one two")));
    }

    #[test]
    fn test_border_style_applies_to_border_only() {
        let mut table = Table::new(cells(&["k"]));
        table.border_style = Style::new().fg(ratatui::style::Color::Cyan);
        let lines = table.render(80);
        assert_eq!(lines[0][0].style.fg, Some(ratatui::style::Color::Cyan));
        let cell = lines[1].iter().find(|s| s.text.contains('k')).unwrap();
        assert_ne!(cell.style.fg, Some(ratatui::style::Color::Cyan));
    }

    #[test]
    fn test_ragged_rows_use_widest_column_count() {
        let mut table = Table::new(cells(&["a"]));
        table.rows = vec![cells(&["1", "2", "3"])];
        assert_eq!(table.column_count(), 3);
        assert_eq!(table.measure(), (11, 11));
        assert_eq!(line_text(&table.render(80)[1]), "│ a       │");
    }
}
