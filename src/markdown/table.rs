use ratatui::layout::Alignment;
use ratatui::style::Color;

use super::inline::flatten_text;
use super::tree::{Inline, TableRow};
use super::MarkdownContext;
use crate::view::style::Style;
use crate::view::table::Table;
use crate::view::text::StyledText;

fn cell_text(inlines: &[Inline]) -> String {
    flatten_text(inlines, " ").trim().to_string()
}

/// Header row plus data rows; the first row is promoted when none is marked
fn split_header(rows: &[TableRow]) -> Option<(&TableRow, Vec<&TableRow>)> {
    match rows.iter().position(|r| r.is_header) {
        Some(index) => Some((
            &rows[index],
            rows.iter()
                .enumerate()
                .filter(|(i, _)| *i != index)
                .map(|(_, r)| r)
                .collect(),
        )),
        None => {
            let (first, rest) = rows.split_first()?;
            Some((first, rest.iter().collect()))
        }
    }
}

pub fn render(ctx: &MarkdownContext<'_>, alignments: &[Alignment], rows: &[TableRow]) -> Option<Table> {
    let (header, data) = split_header(rows)?;

    let border_style = ctx.styler.resolve_with_fallback(
        &["text.html.markdown", "punctuation.definition.table.markdown"],
        ctx.theme,
        &Style::new().fg(Color::Gray),
    );
    let cell_style = ctx
        .styler
        .resolve_style(&["text.html.markdown", "markup.table.cell.markdown"], ctx.theme)
        .unwrap_or_default();

    let cells = |row: &TableRow| -> Vec<StyledText> {
        row.cells
            .iter()
            .map(|cell| StyledText::styled(cell_text(cell), cell_style.clone()))
            .collect()
    };

    let mut table = Table::new(cells(header));
    table.rows = data.into_iter().map(cells).collect();
    table.alignments = alignments.to_vec();
    table.border_style = border_style;
    Some(table)
}
