//! ANSI output checked through a virtual terminal

#![cfg(feature = "runtime")]

mod common;

use common::{processor, rust_source};
use textmate_view::{HighlightedText, ThemeId};

/// Feed `container` through a 24x`width` virtual terminal
fn screen(container: &HighlightedText, width: u16) -> vt100::Parser {
    let mut buf = Vec::new();
    container.write_ansi(&mut buf, width as usize).unwrap();
    // The tty would translate LF to CRLF; vt100 does not
    let text = String::from_utf8(buf).unwrap().replace('\n', "\r\n");
    let mut parser = vt100::Parser::new(24, width, 0);
    parser.process(text.as_bytes());
    parser
}

#[test]
fn test_highlighted_source_on_screen() {
    let container = processor()
        .render_lines(&rust_source(), &ThemeId::default(), "rust", false)
        .unwrap()
        .unwrap();
    let parser = screen(&container, 80);
    let contents = parser.screen().contents();
    let rows: Vec<&str> = contents.lines().collect();
    assert_eq!(rows[2], "fn main() {");
    assert_eq!(rows[4], "");
    assert_eq!(rows[6], "}");

    let keyword = parser.screen().cell(2, 0).unwrap();
    assert_ne!(keyword.fgcolor(), vt100::Color::Default);
}

#[test]
fn test_gutter_on_screen() {
    let mut container = processor()
        .render_lines(&rust_source(), &ThemeId::default(), "rust", false)
        .unwrap()
        .unwrap();
    container.show_line_numbers = true;
    container.line_number_start = 9;
    let parser = screen(&container, 80);
    let contents = parser.screen().contents();
    let rows: Vec<&str> = contents.lines().collect();
    assert_eq!(rows[0], " 9 │ /* a comment");
    assert_eq!(rows[6], "15 │ }");
}

#[test]
fn test_mention_is_blue_and_underlined() {
    let doc = processor()
        .render_document("hi @octocat", &ThemeId::default())
        .unwrap()
        .unwrap();
    let parser = screen(&doc, 40);
    assert_eq!(parser.screen().contents().trim_end(), "hi @octocat");
    let cell = parser.screen().cell(0, 3).unwrap();
    assert_eq!(cell.contents(), "@");
    assert_eq!(cell.fgcolor(), vt100::Color::Idx(4));
    assert!(cell.underline());
}

#[test]
fn test_long_lines_wrap_to_width() {
    let line = "x".repeat(50);
    let container = processor()
        .render_lines(&[line.as_str()], &ThemeId::default(), "txt", true)
        .unwrap()
        .unwrap();
    let parser = screen(&container, 20);
    let contents = parser.screen().contents();
    let rows: Vec<&str> = contents.lines().collect();
    assert_eq!(rows[..3], ["x".repeat(20), "x".repeat(20), "x".repeat(10)]);
}
