//! Result container returned by the rendering entry points
//!
//! Holds the rendered items plus display options (line-number gutter, panel
//! wrapping). A pager can install a view over a slice of a shared item list
//! instead of copying it; [`ViewScope`] guarantees the view is removed and the
//! numbering restored when the pager is done.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use ratatui::style::Color;
use ratatui::text::Text;
use unicode_width::UnicodeWidthStr;

use super::panel::{BorderKind, Panel, PANEL_CHROME};
use super::renderable::Renderable;
use super::style::{to_ratatui_line, Segment, SegmentLine, Style};

/// A non-owning window `(source, start, count)` over a shared item list
#[derive(Debug, Clone)]
pub struct RenderView {
    source: Arc<[Renderable]>,
    start: usize,
    count: usize,
}

impl RenderView {
    pub fn new(source: Arc<[Renderable]>, start: usize, count: usize) -> Self {
        let start = start.min(source.len());
        let count = count.min(source.len() - start);
        Self {
            source,
            start,
            count,
        }
    }

    pub fn items(&self) -> &[Renderable] {
        &self.source[self.start..self.start + self.count]
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn count(&self) -> usize {
        self.count
    }
}

#[derive(Debug, Clone)]
pub struct HighlightedText {
    renderables: Arc<[Renderable]>,
    pub show_line_numbers: bool,
    /// Number shown next to the first item
    pub line_number_start: usize,
    /// Fixed digit width for the gutter; measured when `None`
    pub line_number_width: Option<usize>,
    pub gutter_separator: String,
    pub wrap_in_panel: bool,
    /// Language or grammar the items were rendered with
    pub language: Option<String>,
    view: Option<RenderView>,
}

impl HighlightedText {
    pub fn new(renderables: Vec<Renderable>) -> Self {
        Self::from_shared(renderables.into())
    }

    /// A container over an already shared item list
    pub fn from_shared(renderables: Arc<[Renderable]>) -> Self {
        Self {
            renderables,
            show_line_numbers: false,
            line_number_start: 1,
            line_number_width: None,
            gutter_separator: " │ ".to_string(),
            wrap_in_panel: false,
            language: None,
            view: None,
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Items currently presented (the view when one is installed)
    pub fn renderables(&self) -> &[Renderable] {
        match &self.view {
            Some(view) => view.items(),
            None => &self.renderables,
        }
    }

    /// The owned item list, shareable without copying
    pub fn source(&self) -> Arc<[Renderable]> {
        Arc::clone(&self.renderables)
    }

    pub fn line_count(&self) -> usize {
        match &self.view {
            Some(view) => view.count(),
            None => self.renderables.len(),
        }
    }

    pub fn set_view(&mut self, source: Arc<[Renderable]>, start: usize, count: usize) {
        self.view = Some(RenderView::new(source, start, count));
    }

    pub fn clear_view(&mut self) {
        self.view = None;
    }

    pub fn has_view(&self) -> bool {
        self.view.is_some()
    }

    /// Borrow the container for windowed display; dropping the scope clears
    /// the view and restores the numbering fields
    pub fn view_scope(&mut self) -> ViewScope<'_> {
        ViewScope {
            line_number_start: self.line_number_start,
            line_number_width: self.line_number_width,
            container: self,
        }
    }

    fn is_single_panel(&self) -> bool {
        matches!(self.renderables(), [Renderable::Panel(_)])
    }

    fn panel_chrome(&self) -> usize {
        if self.wrap_in_panel && !self.is_single_panel() {
            PANEL_CHROME
        } else {
            0
        }
    }

    fn gutter_digits(&self, emitted_lines: usize) -> usize {
        self.line_number_width.unwrap_or_else(|| {
            digit_count(self.line_number_start + emitted_lines.saturating_sub(1))
        })
    }

    /// Width available to each item after gutter and panel chrome
    pub fn content_width(&self, width: usize) -> usize {
        let mut width = width.saturating_sub(self.panel_chrome());
        if self.show_line_numbers {
            let digits = self.gutter_digits(self.line_count());
            width = width.saturating_sub(digits + self.gutter_separator.width());
        }
        width.max(1)
    }

    pub fn render(&self, width: usize) -> Vec<SegmentLine> {
        if self.renderables().is_empty() {
            return Vec::new();
        }

        let inner = width.saturating_sub(self.panel_chrome()).max(1);
        let body = if self.show_line_numbers {
            self.render_numbered(inner)
        } else {
            self.render_items(inner)
        };

        if self.panel_chrome() > 0 {
            let panel = Panel::new(Renderable::Blank).border(BorderKind::Rounded);
            let panel = match &self.language {
                Some(language) => panel.title(language.clone()),
                None => panel,
            };
            panel.frame(body, inner)
        } else {
            body
        }
    }

    fn render_items(&self, width: usize) -> Vec<SegmentLine> {
        self.renderables()
            .iter()
            .flat_map(|item| item.render(width))
            .collect()
    }

    /// Render with a gutter, re-rendering once if the number of emitted
    /// lines changes the digit width of the last line number
    fn render_numbered(&self, width: usize) -> Vec<SegmentLine> {
        let separator_width = self.gutter_separator.width();
        let mut digits = self.gutter_digits(self.line_count());
        let mut lines = self.render_items(width.saturating_sub(digits + separator_width).max(1));

        if self.line_number_width.is_none() {
            let actual = self.gutter_digits(lines.len());
            if actual != digits {
                digits = actual;
                lines = self.render_items(width.saturating_sub(digits + separator_width).max(1));
            }
        }

        let gutter_style = Style::new().fg(Color::DarkGray);
        lines
            .into_iter()
            .enumerate()
            .map(|(i, line)| {
                let number = self.line_number_start + i;
                let mut out = vec![Segment::new(
                    format!("{:>width$}{}", number, self.gutter_separator, width = digits),
                    gutter_style.clone(),
                )];
                out.extend(line);
                out
            })
            .collect()
    }

    /// Rows each presented item occupies at `width`; failures count as one
    pub fn measure_heights(&self, width: usize) -> Vec<usize> {
        let width = self.content_width(width);
        self.renderables()
            .iter()
            .map(|item| item.height(width))
            .collect()
    }

    pub fn to_text(&self, width: usize) -> Text<'static> {
        Text::from(
            self.render(width)
                .iter()
                .map(|l| to_ratatui_line(l))
                .collect::<Vec<_>>(),
        )
    }
}

/// Windowed access to a container; restores it on drop
pub struct ViewScope<'a> {
    container: &'a mut HighlightedText,
    line_number_start: usize,
    line_number_width: Option<usize>,
}

impl ViewScope<'_> {
    /// Present `count` items of the container's own list starting at `start`
    pub fn show_slice(&mut self, start: usize, count: usize) {
        let source = self.container.source();
        self.container.set_view(source, start, count);
        self.container.line_number_start = self.line_number_start + start;
    }
}

impl Deref for ViewScope<'_> {
    type Target = HighlightedText;

    fn deref(&self) -> &Self::Target {
        self.container
    }
}

impl DerefMut for ViewScope<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.container
    }
}

impl Drop for ViewScope<'_> {
    fn drop(&mut self) {
        self.container.clear_view();
        self.container.line_number_start = self.line_number_start;
        self.container.line_number_width = self.line_number_width;
    }
}

pub fn digit_count(n: usize) -> usize {
    n.checked_ilog10().map(|d| d as usize + 1).unwrap_or(1)
}
