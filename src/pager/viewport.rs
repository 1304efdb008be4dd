//! Pager viewport - which renderables are on screen
//!
//! Positions are in renderable units, not terminal rows. Heights are cached
//! per item; items that were never measured count as one row.

use std::ops::Range;

#[derive(Debug, Clone)]
pub struct PagerViewport {
    /// Index of the first visible item
    pub top: usize,

    /// Rows available for content (terminal height minus the footer row)
    content_rows: usize,

    /// Cached row count per item
    heights: Vec<usize>,

    /// False until the first measurement pass
    measured: bool,
}

impl PagerViewport {
    pub fn new(item_count: usize, content_rows: usize) -> Self {
        Self {
            top: 0,
            content_rows: content_rows.max(1),
            heights: vec![1; item_count],
            measured: false,
        }
    }

    /// Content rows for a terminal of `height` rows; the last row is the footer
    pub fn content_rows_for(height: u16) -> usize {
        (height as usize).saturating_sub(1).max(1)
    }

    pub fn content_rows(&self) -> usize {
        self.content_rows
    }

    pub fn item_count(&self) -> usize {
        self.heights.len()
    }

    /// Update the page size and re-clamp the top item
    pub fn resize(&mut self, content_rows: usize) {
        self.content_rows = content_rows.max(1);
        self.clamp();
    }

    /// Items whose heights are measured: a window around the top item
    pub fn measure_window(&self) -> Range<usize> {
        let start = self.top.saturating_sub(self.content_rows);
        let end = (self.top + 2 * self.content_rows).min(self.item_count());
        start..end.max(start)
    }

    /// Re-measure items in the window; everything else counts as one row
    pub fn update_heights(&mut self, mut measure: impl FnMut(usize) -> usize) {
        let window = self.measure_window();
        for (index, height) in self.heights.iter_mut().enumerate() {
            *height = if window.contains(&index) {
                measure(index).max(1)
            } else {
                1
            };
        }
        self.measured = true;
    }

    pub fn heights(&self) -> &[usize] {
        &self.heights
    }

    /// Largest top index that still fills a whole page
    ///
    /// Returns 0 when all content fits on one page.
    pub fn max_top(&self) -> usize {
        let count = self.item_count();
        if !self.measured {
            return count.saturating_sub(self.content_rows);
        }
        let mut rows = 0;
        for index in (0..count).rev() {
            rows += self.heights[index];
            if rows >= self.content_rows {
                return index;
            }
        }
        0
    }

    pub fn clamp(&mut self) {
        self.top = self.top.min(self.max_top());
    }

    pub fn scroll_up(&mut self) {
        self.top = self.top.saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        self.top = (self.top + 1).min(self.max_top());
    }

    /// Advance by one page without splitting an item across the boundary
    pub fn page_down(&mut self) {
        let mut rows = 0;
        let mut next = self.top;
        while next < self.item_count() {
            let height = self.heights[next];
            if rows + height > self.content_rows && next > self.top {
                break;
            }
            rows += height;
            next += 1;
            if rows >= self.content_rows {
                break;
            }
        }
        self.top = next.min(self.max_top());
    }

    pub fn page_up(&mut self) {
        let mut rows = 0;
        let mut previous = self.top;
        while previous > 0 {
            let height = self.heights[previous - 1];
            if rows + height > self.content_rows && previous < self.top {
                break;
            }
            rows += height;
            previous -= 1;
            if rows >= self.content_rows {
                break;
            }
        }
        self.top = previous;
    }

    pub fn home(&mut self) {
        self.top = 0;
    }

    pub fn end(&mut self) {
        self.top = self.max_top();
    }

    /// Items handed to the renderer for the current page
    pub fn visible_range(&self) -> Range<usize> {
        let start = self.top.min(self.item_count());
        let end = (start + self.content_rows).min(self.item_count());
        start..end
    }

    /// 1-based first and last item fully or partly on screen
    pub fn position(&self) -> (usize, usize) {
        if self.item_count() == 0 {
            return (0, 0);
        }
        let mut rows = 0;
        let mut last = self.top;
        for index in self.visible_range() {
            last = index;
            rows += self.heights[index];
            if rows >= self.content_rows {
                break;
            }
        }
        (self.top + 1, last + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn measured(heights: &[usize], rows: usize) -> PagerViewport {
        let mut vp = PagerViewport::new(heights.len(), rows);
        // Whole list inside the window
        vp.top = 0;
        vp.content_rows = heights.len().max(rows);
        vp.update_heights(|i| heights[i]);
        vp.content_rows = rows;
        vp
    }

    #[test]
    fn test_content_rows_reserve_footer() {
        assert_eq!(PagerViewport::content_rows_for(24), 23);
        assert_eq!(PagerViewport::content_rows_for(1), 1);
        assert_eq!(PagerViewport::content_rows_for(0), 1);
    }

    #[test]
    fn test_max_top_unmeasured() {
        let vp = PagerViewport::new(10, 4);
        assert_eq!(vp.max_top(), 6);
        let short = PagerViewport::new(3, 4);
        assert_eq!(short.max_top(), 0);
    }

    #[test]
    fn test_max_top_keeps_last_page_full() {
        // Suffix sums from the end: 1, 4, 5, 7, 8
        let vp = measured(&[1, 2, 1, 3, 1], 4);
        assert_eq!(vp.max_top(), 3);
    }

    #[test]
    fn test_scroll_is_clamped() {
        let mut vp = measured(&[1; 10], 4);
        vp.scroll_up();
        assert_eq!(vp.top, 0);
        for _ in 0..20 {
            vp.scroll_down();
        }
        assert_eq!(vp.top, 6);
        vp.home();
        assert_eq!(vp.top, 0);
        vp.end();
        assert_eq!(vp.top, 6);
    }

    #[test]
    fn test_page_down_does_not_split_items() {
        let mut vp = measured(&[2, 2, 3, 1, 1, 1, 1, 1, 1, 1], 5);
        vp.page_down();
        // 2 + 2 = 4 rows; the 3-row item would cross the page boundary
        assert_eq!(vp.top, 2);
        vp.page_up();
        assert_eq!(vp.top, 0);
    }

    #[test]
    fn test_measure_window() {
        let mut vp = PagerViewport::new(100, 10);
        assert_eq!(vp.measure_window(), 0..20);
        vp.top = 50;
        assert_eq!(vp.measure_window(), 40..70);
        vp.top = 95;
        assert_eq!(vp.measure_window(), 85..100);

        vp.update_heights(|_| 3);
        assert_eq!(vp.heights()[84], 1);
        assert_eq!(vp.heights()[85], 3);
    }

    #[test]
    fn test_position() {
        let mut vp = measured(&[1; 30], 10);
        assert_eq!(vp.position(), (1, 10));
        vp.end();
        assert_eq!(vp.position(), (21, 30));
        let empty = PagerViewport::new(0, 10);
        assert_eq!(empty.position(), (0, 0));
    }

    proptest! {
        #[test]
        fn prop_last_page_is_full(heights in prop::collection::vec(1usize..5, 1..60), rows in 1usize..20) {
            let vp = measured(&heights, rows);
            let top = vp.max_top();
            let total: usize = heights.iter().sum();
            let suffix: usize = heights[top..].iter().sum();
            if total >= rows {
                prop_assert!(suffix >= rows);
                // No later start would still fill the page
                if top + 1 < heights.len() {
                    prop_assert!(heights[top + 1..].iter().sum::<usize>() < rows);
                }
            } else {
                prop_assert_eq!(top, 0);
            }
        }

        #[test]
        fn prop_page_down_never_passes_end(heights in prop::collection::vec(1usize..5, 1..60), rows in 1usize..20, presses in 1usize..40) {
            let mut vp = measured(&heights, rows);
            for _ in 0..presses {
                vp.page_down();
                prop_assert!(vp.top < heights.len());
                prop_assert!(vp.top <= vp.max_top());
            }
        }
    }
}
