// Shared helpers for integration tests

#![allow(dead_code)]

pub mod tracing;

use std::sync::Arc;

use textmate_view::primitives::cache::TextMateCache;
use textmate_view::primitives::styler::TokenStyler;
use textmate_view::view::style::line_text;
use textmate_view::{HighlightedText, Renderable, TextMateProcessor};

/// A processor with private caches, so tests do not share state
pub fn processor() -> TextMateProcessor {
    tracing::init_tracing_from_env();
    TextMateProcessor::default()
        .with_caches(Arc::new(TextMateCache::new()), Arc::new(TokenStyler::new()))
}

/// Rendered rows without styling
pub fn plain_rows(container: &HighlightedText, width: usize) -> Vec<String> {
    container
        .render(width)
        .iter()
        .map(|line| line_text(line).trim_end().to_string())
        .collect()
}

pub fn item_text(item: &Renderable, width: usize) -> String {
    item.render(width)
        .iter()
        .map(|line| line_text(line).trim_end().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn rust_source() -> Vec<String> {
    [
        "/* a comment",
        "   that spans lines */",
        "fn main() {",
        "    let greeting = \"hello\";",
        "",
        "    println!(\"{}\", greeting);",
        "}",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
