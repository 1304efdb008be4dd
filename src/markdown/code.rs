//! Fenced and indented code blocks

use ratatui::style::Color;

use super::MarkdownContext;
use crate::render::LineRenderer;
use crate::view::panel::{BorderKind, Panel};
use crate::view::renderable::Renderable;
use crate::view::style::Style;
use crate::view::text::StyledText;

const INFO_DELIMITERS: &[char] = &[' ', '\t', '{', '}', '(', ')', '[', ']'];

/// Short fence tags mapped to grammar language ids
const FENCE_ALIASES: &[(&str, &str)] = &[
    ("cs", "csharp"),
    ("c#", "csharp"),
    ("csharp", "csharp"),
    ("js", "javascript"),
    ("jsx", "javascript"),
    ("ts", "typescript"),
    ("tsx", "typescript"),
    ("py", "python"),
    ("ps1", "powershell"),
    ("pwsh", "powershell"),
    ("powershell", "powershell"),
    ("sh", "bash"),
    ("shell", "bash"),
    ("zsh", "bash"),
    ("bash", "bash"),
    ("yml", "yaml"),
    ("md", "markdown"),
    ("rs", "rust"),
    ("rb", "ruby"),
    ("c++", "cpp"),
    ("htm", "html"),
];

/// Language id from a fence info string, e.g. "py {linenos}" -> "python"
pub fn fence_language(info: &str) -> Option<String> {
    let token = info
        .trim()
        .split(INFO_DELIMITERS)
        .next()
        .filter(|t| !t.is_empty())?
        .to_lowercase();
    let language = FENCE_ALIASES
        .iter()
        .find(|(alias, _)| *alias == token)
        .map(|(_, id)| id.to_string())
        .unwrap_or(token);
    Some(language)
}

/// Trailing whitespace trimmed per line, trailing blank lines dropped
pub fn normalize_lines(lines: &[String]) -> Vec<String> {
    let mut lines: Vec<String> = lines.iter().map(|l| l.trim_end().to_string()).collect();
    while lines.last().is_some_and(String::is_empty) {
        lines.pop();
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Highlight `lines` with a known grammar, wrapped in a panel titled `title`
pub fn highlighted_panel(
    ctx: &MarkdownContext<'_>,
    language: &str,
    lines: &[String],
    title: &str,
) -> Option<Renderable> {
    if lines.iter().all(String::is_empty) {
        return None;
    }
    let grammar = ctx
        .cache
        .get_grammar(ctx.registry, language, false)
        .or_else(|| ctx.cache.get_grammar(ctx.registry, language, true))?;
    let renderables = LineRenderer::new(&grammar, ctx.theme, ctx.styler)
        .raw(true)
        .render(lines)
        .map_err(|e| tracing::debug!("Code block highlighting failed: {}", e))
        .ok()?;
    Some(Renderable::Panel(
        Panel::new(Renderable::Rows(renderables))
            .title(title)
            .border(BorderKind::Rounded),
    ))
}

/// Unhighlighted panel with the theme's code block style
pub fn plain_panel(ctx: &MarkdownContext<'_>, lines: &[String], title: &str) -> Renderable {
    let style = ctx.styler.resolve_with_fallback(
        &["text.html.markdown", "markup.fenced_code.block.markdown"],
        ctx.theme,
        &Style::new().fg(Color::Gray).bg(Color::Black),
    );
    Renderable::Panel(
        Panel::new(Renderable::Text(StyledText::styled(lines.join("\n"), style)))
            .title(title)
            .border(BorderKind::Rounded),
    )
}

pub fn render(ctx: &MarkdownContext<'_>, fenced: bool, info: &str, lines: &[String]) -> Renderable {
    let lines = normalize_lines(lines);
    let language = if fenced { fence_language(info) } else { None };
    language
        .and_then(|language| highlighted_panel(ctx, &language, &lines, &language))
        .unwrap_or_else(|| plain_panel(ctx, &lines, "code"))
}
