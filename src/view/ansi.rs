//! ANSI output of rendered rows
//!
//! Colors and attributes go through crossterm's style commands; hyperlinks
//! use OSC 8, which terminals without support simply ignore.

use std::io::{self, Write};

use crossterm::queue;
use crossterm::style::{
    Attribute, Color as CColor, Print, SetAttribute, SetBackgroundColor, SetForegroundColor,
};
use ratatui::style::{Color, Modifier};

use super::highlighted_text::HighlightedText;
use super::style::{Segment, SegmentLine};

/// Map a ratatui color to the crossterm color ratatui's backend would emit
pub fn to_crossterm_color(color: Color) -> CColor {
    match color {
        Color::Reset => CColor::Reset,
        Color::Black => CColor::Black,
        Color::Red => CColor::DarkRed,
        Color::Green => CColor::DarkGreen,
        Color::Yellow => CColor::DarkYellow,
        Color::Blue => CColor::DarkBlue,
        Color::Magenta => CColor::DarkMagenta,
        Color::Cyan => CColor::DarkCyan,
        Color::Gray => CColor::Grey,
        Color::DarkGray => CColor::DarkGrey,
        Color::LightRed => CColor::Red,
        Color::LightGreen => CColor::Green,
        Color::LightBlue => CColor::Blue,
        Color::LightYellow => CColor::Yellow,
        Color::LightMagenta => CColor::Magenta,
        Color::LightCyan => CColor::Cyan,
        Color::White => CColor::White,
        Color::Indexed(i) => CColor::AnsiValue(i),
        Color::Rgb(r, g, b) => CColor::Rgb { r, g, b },
    }
}

const ATTRIBUTES: [(Modifier, Attribute); 9] = [
    (Modifier::BOLD, Attribute::Bold),
    (Modifier::DIM, Attribute::Dim),
    (Modifier::ITALIC, Attribute::Italic),
    (Modifier::UNDERLINED, Attribute::Underlined),
    (Modifier::SLOW_BLINK, Attribute::SlowBlink),
    (Modifier::RAPID_BLINK, Attribute::RapidBlink),
    (Modifier::REVERSED, Attribute::Reverse),
    (Modifier::HIDDEN, Attribute::Hidden),
    (Modifier::CROSSED_OUT, Attribute::CrossedOut),
];

fn write_segment<W: Write>(out: &mut W, segment: &Segment) -> io::Result<()> {
    let style = &segment.style;
    if style.is_plain() {
        return queue!(out, Print(&segment.text));
    }

    if let Some(url) = &style.link {
        queue!(out, Print(format!("\x1b]8;;{}\x1b\\", url)))?;
    }
    if let Some(fg) = style.fg {
        queue!(out, SetForegroundColor(to_crossterm_color(fg)))?;
    }
    if let Some(bg) = style.bg {
        queue!(out, SetBackgroundColor(to_crossterm_color(bg)))?;
    }
    for (modifier, attribute) in ATTRIBUTES {
        if style.modifier.contains(modifier) {
            queue!(out, SetAttribute(attribute))?;
        }
    }
    queue!(out, Print(&segment.text), SetAttribute(Attribute::Reset))?;
    if style.link.is_some() {
        queue!(out, Print("\x1b]8;;\x1b\\"))?;
    }
    Ok(())
}

/// Write rows, one terminal line each
pub fn write_lines<W: Write>(out: &mut W, lines: &[SegmentLine]) -> io::Result<()> {
    for line in lines {
        for segment in line {
            write_segment(out, segment)?;
        }
        queue!(out, Print("\n"))?;
    }
    out.flush()
}

impl HighlightedText {
    /// Render at `width` and write the result as ANSI text
    pub fn write_ansi<W: Write>(&self, out: &mut W, width: usize) -> io::Result<()> {
        write_lines(out, &self.render(width))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::style::Style;

    fn ansi(lines: &[SegmentLine]) -> String {
        let mut buf = Vec::new();
        write_lines(&mut buf, lines).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_plain_text_has_no_escapes() {
        let out = ansi(&[vec![Segment::plain("hello")]]);
        assert_eq!(out, "hello\n");
    }

    #[test]
    fn test_styled_segment_resets() {
        let style = Style::new().fg(Color::Rgb(1, 2, 3)).add_modifier(Modifier::BOLD);
        let out = ansi(&[vec![Segment::new("x", style)]]);
        assert!(out.contains("\x1b[38;2;1;2;3m"));
        assert!(out.contains("\x1b[1m"));
        assert!(out.ends_with("x\x1b[0m\n"));
    }

    #[test]
    fn test_hyperlink_is_wrapped_in_osc8() {
        let style = Style::new().link("https://example.com");
        let out = ansi(&[vec![Segment::new("site", style)]]);
        assert!(out.starts_with("\x1b]8;;https://example.com\x1b\\"));
        assert!(out.contains("site"));
        assert!(out.trim_end().ends_with("\x1b]8;;\x1b\\"));
    }
}
