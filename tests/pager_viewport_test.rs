//! Pager scrolling over real rendered heights

#![cfg(feature = "runtime")]

mod common;

use common::processor;
use proptest::prelude::*;
use textmate_view::pager::footer::FooterRenderer;
use textmate_view::pager::viewport::PagerViewport;
use textmate_view::pager::PagerAction;
use textmate_view::ThemeId;

#[test]
fn test_document_heights_drive_paging() {
    let doc = processor()
        .render_document(
            "# Title\n\n```rust\nfn a() {}\nfn b() {}\n```\n\ntext\n",
            &ThemeId::default(),
        )
        .unwrap()
        .unwrap();
    let heights = doc.measure_heights(40);
    // Heading, blank, four-row code panel, blank, paragraph
    assert_eq!(heights, vec![1, 1, 4, 1, 1]);

    let mut viewport = PagerViewport::new(heights.len(), 4);
    viewport.update_heights(|i| heights[i]);
    assert!(PagerAction::PageDown.apply(&mut viewport));
    // The panel does not fit after the two single rows
    assert_eq!(viewport.top, 2);
    assert_eq!(viewport.position(), (3, 3));
    assert_eq!(
        FooterRenderer::counter(viewport.position().0, viewport.position().1, heights.len()),
        " 3-3/5 "
    );
}

#[test]
fn test_resize_keeps_top_in_range() {
    let mut viewport = PagerViewport::new(30, 10);
    viewport.update_heights(|_| 1);
    viewport.end();
    assert_eq!(viewport.top, 20);
    viewport.resize(25);
    assert_eq!(viewport.top, 5);
}

proptest! {
    #[test]
    fn prop_home_end_round_trip(count in 1usize..200, rows in 1usize..50) {
        let mut viewport = PagerViewport::new(count, rows);
        viewport.update_heights(|_| 1);
        viewport.end();
        prop_assert_eq!(viewport.top, count.saturating_sub(rows));
        let (start, end) = viewport.position();
        prop_assert_eq!(end, count);
        prop_assert!(start >= 1);
        viewport.home();
        prop_assert_eq!(viewport.position().0, 1);
    }

    #[test]
    fn prop_scrolling_stays_in_bounds(
        count in 1usize..100,
        rows in 1usize..30,
        moves in prop::collection::vec(0u8..6, 0..50),
    ) {
        let mut viewport = PagerViewport::new(count, rows);
        viewport.update_heights(|i| 1 + i % 3);
        for m in moves {
            let action = match m {
                0 => PagerAction::Up,
                1 => PagerAction::Down,
                2 => PagerAction::PageUp,
                3 => PagerAction::PageDown,
                4 => PagerAction::Home,
                _ => PagerAction::End,
            };
            action.apply(&mut viewport);
            viewport.update_heights(|i| 1 + i % 3);
            viewport.clamp();
            prop_assert!(viewport.top <= viewport.max_top());
            let range = viewport.visible_range();
            prop_assert!(range.end <= count);
        }
    }
}
