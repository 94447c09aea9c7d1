use core::cmp;

use crate::{Align, HeightOracle, VisibleRange, WindowRange};

/// Maps a scroll position to the index range that has to be materialized.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RangeCalculator {
    overscan: usize,
}

impl RangeCalculator {
    pub fn new(overscan: usize) -> Self {
        Self { overscan }
    }

    pub fn overscan(&self) -> usize {
        self.overscan
    }

    pub fn set_overscan(&mut self, overscan: usize) {
        self.overscan = overscan;
    }

    /// The largest offset at which the viewport is still filled with items.
    pub fn max_scroll_offset(oracle: &HeightOracle, viewport_size: u32) -> u64 {
        oracle.total_extent().saturating_sub(viewport_size as u64)
    }

    pub fn clamp_scroll_offset(oracle: &HeightOracle, offset: u64, viewport_size: u32) -> u64 {
        offset.min(Self::max_scroll_offset(oracle, viewport_size))
    }

    /// Items intersecting `[scroll_offset, scroll_offset + viewport_size)`, without overscan.
    ///
    /// Offsets past the end are clamped so the last page stays filled. A zero-sized viewport
    /// yields the single item at the scroll offset.
    pub fn raw_range(
        &self,
        oracle: &HeightOracle,
        scroll_offset: u64,
        viewport_size: u32,
    ) -> Option<VisibleRange> {
        if oracle.is_empty() {
            return None;
        }
        let offset = Self::clamp_scroll_offset(oracle, scroll_offset, viewport_size);
        let start = oracle.index_at_offset(offset)?;
        if viewport_size == 0 {
            return Some(VisibleRange::single(start));
        }
        let last_visible = offset.saturating_add(viewport_size as u64 - 1);
        let end = oracle.index_at_offset(last_visible)?;
        Some(VisibleRange::new(start, cmp::max(start, end)))
    }

    /// Grows `raw` by the overscan count on both sides, clamped to `[0, item_count - 1]`.
    pub fn expand(&self, raw: VisibleRange, item_count: usize) -> VisibleRange {
        let last = item_count.saturating_sub(1);
        VisibleRange::new(
            raw.start.saturating_sub(self.overscan),
            cmp::min(last, raw.end.saturating_add(self.overscan)),
        )
    }

    pub fn compute_range(
        &self,
        oracle: &HeightOracle,
        scroll_offset: u64,
        viewport_size: u32,
    ) -> Option<WindowRange> {
        let raw = self.raw_range(oracle, scroll_offset, viewport_size)?;
        let expanded = self.expand(raw, oracle.item_count());
        vtrace!(
            scroll_offset,
            viewport_size,
            raw_start = raw.start,
            raw_end = raw.end,
            start = expanded.start,
            end = expanded.end,
            "compute_range"
        );
        Some(WindowRange { raw, expanded })
    }

    /// The scroll offset that places `index` at `align` inside the viewport.
    ///
    /// `index` is clamped to the last item and the result to the scrollable bounds. `None` when
    /// there are no items.
    pub fn scroll_offset_for(
        oracle: &HeightOracle,
        index: usize,
        align: Align,
        viewport_size: u32,
        current_offset: u64,
    ) -> Option<u64> {
        let last = oracle.item_count().checked_sub(1)?;
        let item = oracle.geometry(cmp::min(index, last));
        let view = viewport_size as u64;

        let target = match align {
            Align::Start => item.offset,
            Align::End => item.end().saturating_sub(view),
            Align::Center => {
                let center = item.offset.saturating_add(item.size as u64 / 2);
                center.saturating_sub(view / 2)
            }
            Align::Auto => {
                let cur_end = current_offset.saturating_add(view);
                if item.offset >= current_offset && item.end() <= cur_end {
                    current_offset
                } else if item.offset < current_offset {
                    item.offset
                } else {
                    item.end().saturating_sub(view)
                }
            }
        };

        Some(Self::clamp_scroll_offset(oracle, target, viewport_size))
    }
}
