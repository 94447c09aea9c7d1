use alloc::vec::Vec;

/// A snapshot of the host viewport along the scroll axis.
///
/// With `feature = "serde"`, this type implements `Serialize`/`Deserialize`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ViewportState {
    pub scroll_offset: u64,
    pub viewport_size: u32,
}

/// The measured-size cache of a [`crate::HeightOracle`], detached for persistence.
///
/// Entries are `(index, size)` pairs sorted by index. Restoring a snapshot into an oracle with
/// a different item count keeps only the entries that still fit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MeasurementSnapshot {
    pub item_count: usize,
    pub entries: Vec<(usize, u32)>,
}
