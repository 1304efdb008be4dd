use super::inline::{flatten_text, RunBuilder};
use super::tree::Inline;
use super::MarkdownContext;
use crate::view::renderable::Renderable;

/// The image of a paragraph holding nothing else
fn standalone_image(inlines: &[Inline]) -> Option<(&str, String)> {
    let mut content = inlines.iter().filter(|inline| match inline {
        Inline::LineBreak { .. } => false,
        Inline::Text(text) => !text.trim().is_empty(),
        _ => true,
    });
    match (content.next(), content.next()) {
        (Some(Inline::Image { url, children, .. }), None) => {
            Some((url.as_str(), flatten_text(children, " ")))
        }
        _ => None,
    }
}

pub fn render(ctx: &MarkdownContext<'_>, inlines: &[Inline]) -> Vec<Renderable> {
    if let Some((url, alt)) = standalone_image(inlines) {
        return vec![ctx.images.render(&alt, url, None, None), Renderable::Blank];
    }
    vec![Renderable::Text(RunBuilder::new(ctx).build(inlines))]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::tests::with_context;

    fn image() -> Inline {
        Inline::Image {
            url: "pic.png".into(),
            title: String::new(),
            children: vec![Inline::Text("logo".into())],
        }
    }

    #[test]
    fn test_standalone_image_detection() {
        assert!(standalone_image(&[image()]).is_some());
        assert!(standalone_image(&[
            Inline::Text("  ".into()),
            image(),
            Inline::LineBreak { hard: false }
        ])
        .is_some());
        assert!(standalone_image(&[Inline::Text("see".into()), image()]).is_none());
    }

    #[test]
    fn test_standalone_image_adds_blank() {
        with_context(|ctx| {
            let out = render(ctx, &[image()]);
            assert_eq!(out.len(), 2);
            assert_eq!(out[1], Renderable::Blank);
        });
    }

    #[test]
    fn test_inline_image_is_a_link_run() {
        with_context(|ctx| {
            let out = render(ctx, &[Inline::Text("see ".into()), image()]);
            assert_eq!(out.len(), 1);
            let Renderable::Text(text) = &out[0] else {
                panic!("expected text");
            };
            assert_eq!(text.plain_text(), "see 🖼️ logo");
        });
    }
}
