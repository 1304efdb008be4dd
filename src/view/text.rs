//! Styled text runs and word wrapping

use textwrap::wrap_algorithms::wrap_first_fit;
use textwrap::WordSeparator;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use super::style::{line_width, Segment, SegmentLine, Style};

const TAB_WIDTH: usize = 4;

/// A sequence of styled runs; `'\n'` inside a run starts a new row
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyledText {
    segments: Vec<Segment>,
}

impl StyledText {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::styled(text, Style::default())
    }

    pub fn styled(text: impl Into<String>, style: Style) -> Self {
        let mut styled = Self::new();
        styled.push(text, style);
        styled
    }

    /// Append a run, merging with the previous run when the style matches
    pub fn push(&mut self, text: impl Into<String>, style: Style) {
        let text = text.into();
        if text.is_empty() {
            return;
        }
        if let Some(last) = self.segments.last_mut() {
            if last.style == style {
                last.text.push_str(&text);
                return;
            }
        }
        self.segments.push(Segment::new(text, style));
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn plain_text(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }

    /// Rows as written, before wrapping; tabs are expanded
    pub fn logical_lines(&self) -> Vec<SegmentLine> {
        let mut lines: Vec<SegmentLine> = vec![Vec::new()];
        for segment in &self.segments {
            for (i, part) in segment.text.split('\n').enumerate() {
                if i > 0 {
                    lines.push(Vec::new());
                }
                if part.is_empty() {
                    continue;
                }
                let text = part.replace('\t', &" ".repeat(TAB_WIDTH));
                if let Some(line) = lines.last_mut() {
                    line.push(Segment::new(text, segment.style.clone()));
                }
            }
        }
        lines
    }

    /// Rows wrapped to `width` columns
    pub fn render(&self, width: usize) -> Vec<SegmentLine> {
        self.logical_lines()
            .iter()
            .flat_map(|line| wrap_line(line, width))
            .collect()
    }

    /// `(min, max)`: widest single word and widest unwrapped row
    pub fn measure(&self) -> (usize, usize) {
        let lines = self.logical_lines();
        let max = lines.iter().map(|l| line_width(l)).max().unwrap_or(0);
        let min = lines
            .iter()
            .flat_map(|l| {
                l.iter()
                    .flat_map(|s| s.text.split_whitespace().map(|w| w.width()))
                    .collect::<Vec<_>>()
            })
            .max()
            .unwrap_or(0);
        (min, max)
    }
}

impl From<&str> for StyledText {
    fn from(text: &str) -> Self {
        Self::plain(text)
    }
}

/// Wrap one row at `width` columns, preferring to break at spaces
///
/// Words wider than a row are split across rows. Indentation on the first
/// row is kept and the spaces at each break are dropped.
pub fn wrap_line(line: &[Segment], width: usize) -> Vec<SegmentLine> {
    let width = width.max(1);
    if line_width(line) <= width {
        return vec![line.to_vec()];
    }

    let text: String = line.iter().map(|s| s.text.as_str()).collect();
    let words = textwrap::core::break_words(WordSeparator::AsciiSpace.find_words(&text), width);

    // Words are contiguous slices of `text`
    let mut spans = Vec::with_capacity(words.len());
    let mut offset = 0;
    for word in &words {
        spans.push((offset, offset + word.word.len()));
        offset += word.word.len() + word.whitespace.len() + word.penalty.len();
    }

    let mut rows = Vec::new();
    let mut first = 0;
    for row in wrap_first_fit(&words, &[width as f64]) {
        if row.is_empty() {
            continue;
        }
        let last = first + row.len() - 1;
        let (start, end) = (spans[first].0, spans[last].1);
        first = last + 1;
        // Skip rows holding only an indent
        if start < end {
            rows.push(slice_line(line, start, end));
        }
    }
    if rows.is_empty() {
        rows.push(Vec::new());
    }
    rows
}

/// Bytes `start..end` of the row's concatenated text, keeping each run's style
fn slice_line(line: &[Segment], start: usize, end: usize) -> SegmentLine {
    let mut out = Vec::new();
    let mut offset = 0;
    for segment in line {
        let (from, to) = (offset, offset + segment.text.len());
        offset = to;
        let (lo, hi) = (start.max(from), end.min(to));
        if lo < hi {
            out.push(Segment::new(
                &segment.text[lo - from..hi - from],
                segment.style.clone(),
            ));
        }
    }
    out
}

/// Cut a row to at most `width` columns
pub fn truncate_line(line: &[Segment], width: usize) -> SegmentLine {
    let mut out = Vec::new();
    let mut used = 0;
    for segment in line {
        if used >= width {
            break;
        }
        let mut text = String::new();
        for ch in segment.text.chars() {
            let w = ch.width().unwrap_or(0);
            if used + w > width {
                break;
            }
            used += w;
            text.push(ch);
        }
        if !text.is_empty() {
            out.push(Segment::new(text, segment.style.clone()));
        }
    }
    out
}

/// Pad a row with spaces (in `style`) up to `width` columns
pub fn pad_line(mut line: SegmentLine, width: usize, style: &Style) -> SegmentLine {
    let current = line_width(&line);
    if current < width {
        line.push(Segment::new(" ".repeat(width - current), style.clone()));
    }
    line
}
