//! Bulleted, numbered and task lists
//!
//! Each item becomes one renderable row. Nested lists are flattened into
//! indented plain text placed after their parent item.

use super::inline::{flatten_text, RunBuilder};
use super::tree::{Block, BlockKind, Inline};
use super::MarkdownContext;
use crate::view::renderable::Renderable;
use crate::view::text::StyledText;

const NESTED_INDENT: &str = "    ";

/// `Some(checked)` when the item's first paragraph starts with a task marker
fn task_state(item: &Block) -> Option<bool> {
    item.children()?.iter().find_map(|child| match &child.kind {
        BlockKind::Paragraph { inlines } => inlines.iter().find_map(|inline| match inline {
            Inline::TaskMarker { checked } => Some(*checked),
            _ => None,
        }),
        _ => None,
    })
}

/// Bullet or number for an item; `number` advances only for numbered items
fn prefix(item: &Block, ordered: bool, number: &mut u64) -> String {
    match task_state(item) {
        Some(true) => "✅ ".to_string(),
        Some(false) => "⬜ ".to_string(),
        None if ordered => {
            let prefix = format!("{}. ", number);
            *number += 1;
            prefix
        }
        None => "• ".to_string(),
    }
}

pub fn render(ctx: &MarkdownContext<'_>, ordered: bool, start: u64, items: &[Block]) -> Vec<Renderable> {
    let runs = RunBuilder::new(ctx).inline_breaks(true);
    let mut out = Vec::new();
    let mut number = start;

    for item in items {
        let mut text = StyledText::plain(prefix(item, ordered, &mut number));
        let mut nested = Vec::new();
        let mut first = true;

        for child in item.children().unwrap_or_default() {
            match &child.kind {
                BlockKind::List {
                    ordered,
                    start,
                    items,
                } => nested_lines(*ordered, *start, items, 1, &mut nested),
                kind => {
                    if !first {
                        text.push(" ", Default::default());
                    }
                    first = false;
                    match kind {
                        BlockKind::Paragraph { inlines } => runs.append(&mut text, inlines),
                        other => text.push(block_text(other), Default::default()),
                    }
                }
            }
        }

        out.push(Renderable::Text(text));
        if !nested.is_empty() {
            out.push(Renderable::text(nested.join("\n").trim_end()));
        }
    }
    out
}

fn nested_lines(ordered: bool, start: u64, items: &[Block], depth: usize, out: &mut Vec<String>) {
    let mut number = start;
    for item in items {
        let mut line = format!(
            "{}{}",
            NESTED_INDENT.repeat(depth),
            prefix(item, ordered, &mut number)
        );
        let mut children = Vec::new();
        for child in item.children().unwrap_or_default() {
            match &child.kind {
                BlockKind::List {
                    ordered,
                    start,
                    items,
                } => children.push((*ordered, *start, items)),
                other => line.push_str(&block_text(other)),
            }
        }
        out.push(line);
        for (ordered, start, items) in children {
            nested_lines(ordered, start, items, depth + 1, out);
        }
    }
}

/// Plain text of a non-list block inside an item
fn block_text(kind: &BlockKind) -> String {
    match kind {
        BlockKind::Paragraph { inlines } | BlockKind::Heading { inlines, .. } => {
            flatten_text(inlines, " ")
        }
        BlockKind::CodeBlock { lines, .. } => lines.join("\n"),
        BlockKind::Html { text } => text.trim_end().to_string(),
        BlockKind::Quote { children } | BlockKind::ListItem { children } => children
            .iter()
            .map(|c| block_text(&c.kind))
            .collect::<Vec<_>>()
            .join(" "),
        BlockKind::List { .. } | BlockKind::Table { .. } | BlockKind::ThematicBreak => {
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::tests::with_context;
    use crate::markdown::tree::Document;

    fn rows(source: &str) -> Vec<String> {
        with_context(|ctx| {
            let doc = Document::parse(source);
            let BlockKind::List {
                ordered,
                start,
                items,
            } = &doc.blocks[0].kind
            else {
                panic!("expected list");
            };
            render(ctx, *ordered, *start, items)
                .iter()
                .map(|r| match r {
                    Renderable::Text(t) => t.plain_text(),
                    _ => String::new(),
                })
                .collect()
        })
    }

    #[test]
    fn test_task_prefixes() {
        assert_eq!(
            rows("- [x] done\n- [X] also\n- [ ] todo\n- plain\n"),
            vec!["✅ done", "✅ also", "⬜ todo", "• plain"]
        );
    }

    #[test]
    fn test_ordered_counter_starts_at_list_start() {
        assert_eq!(rows("3. c\n4. d\n"), vec!["3. c", "4. d"]);
    }

    #[test]
    fn test_nested_lists_are_indented_text() {
        assert_eq!(
            rows("- top\n  - child\n    1. deep\n- next\n"),
            vec!["• top", "    • child\n        1. deep", "• next"]
        );
    }

    #[test]
    fn test_soft_breaks_stay_on_one_row() {
        assert_eq!(rows("- one\n  two\n"), vec!["• one two"]);
    }
}
