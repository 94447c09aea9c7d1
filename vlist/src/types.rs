use core::ops::RangeInclusive;

/// Where a scrolled-to item should land inside the viewport.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Align {
    Start,
    Center,
    End,
    /// Keep the current offset when the item is fully visible, otherwise scroll the least.
    Auto,
}

/// An inclusive index range. Always `start <= end`.
///
/// The "no items" case is expressed as `Option<VisibleRange>::None` by the APIs returning it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VisibleRange {
    pub start: usize,
    pub end: usize, // inclusive
}

impl VisibleRange {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "VisibleRange start > end ({start} > {end})");
        Self { start, end }
    }

    pub fn single(index: usize) -> Self {
        Self {
            start: index,
            end: index,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    pub fn contains(&self, index: usize) -> bool {
        self.start <= index && index <= self.end
    }

    pub fn contains_range(&self, other: &VisibleRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn indices(&self) -> RangeInclusive<usize> {
        self.start..=self.end
    }
}

/// The visible range before and after overscan expansion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WindowRange {
    /// Items intersecting the viewport.
    pub raw: VisibleRange,
    /// `raw` grown by the overscan count on both sides, clamped to the item bounds.
    pub expanded: VisibleRange,
}

/// Layout of a single item along the scroll axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemGeometry {
    pub offset: u64,
    pub size: u32,
}

impl ItemGeometry {
    pub fn end(&self) -> u64 {
        self.offset.saturating_add(self.size as u64)
    }
}
