use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use super::code::{highlighted_panel, plain_panel};
use super::MarkdownContext;
use crate::view::renderable::Renderable;

static IMG_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)^\s*<img\b(?P<attrs>[^>]*?)/?>\s*$").expect("valid img regex")
});

static ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)(?P<name>[a-z][a-z0-9_-]*)\s*=\s*(?:"(?P<dq>[^"]*)"|'(?P<sq>[^']*)'|(?P<bare>[^\s"'>]+))"#)
        .expect("valid attribute regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImgTag {
    pub src: String,
    pub alt: String,
    pub width: Option<u16>,
    pub height: Option<u16>,
}

/// Parse a block holding exactly one `<img>` tag
pub fn parse_img_tag(html: &str) -> Option<ImgTag> {
    let attrs = IMG_TAG.captures(html)?.name("attrs")?.as_str();

    let mut src = None;
    let mut alt = None;
    let mut width = None;
    let mut height = None;
    for caps in ATTRIBUTE.captures_iter(attrs) {
        let value = caps
            .name("dq")
            .or_else(|| caps.name("sq"))
            .or_else(|| caps.name("bare"))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();
        match caps["name"].to_ascii_lowercase().as_str() {
            "src" => src = Some(value),
            "alt" => alt = Some(value),
            "width" => width = positive(&value),
            "height" => height = positive(&value),
            _ => {}
        }
    }

    let src = src.filter(|s| !s.trim().is_empty())?;
    let alt = alt.filter(|a| !a.is_empty()).unwrap_or_else(|| {
        Path::new(src.split(['?', '#']).next().unwrap_or(&src))
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("image")
            .to_string()
    });
    Some(ImgTag {
        src,
        alt,
        width,
        height,
    })
}

fn positive(value: &str) -> Option<u16> {
    value.trim().parse::<u16>().ok().filter(|v| *v > 0)
}

pub fn render(ctx: &MarkdownContext<'_>, html: &str) -> Renderable {
    if let Some(img) = parse_img_tag(html) {
        return ctx.images.render(&img.alt, &img.src, img.width, img.height);
    }

    let mut lines: Vec<String> = html.lines().map(str::to_string).collect();
    while lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }
    highlighted_panel(ctx, "html", &lines, "html").unwrap_or_else(|| plain_panel(ctx, &lines, "html"))
}
