use alloc::vec::Vec;
use core::cmp;

use crate::fenwick::Fenwick;
use crate::records::MeasureMap;
use crate::{ConfigError, ItemGeometry, MeasureError, MeasurementSnapshot, Sizing};

/// Answers "how long is item `i`" and "where does item `i` start".
///
/// In uniform mode ([`Sizing::Fixed`]) every query is `O(1)` arithmetic and measurements are
/// ignored. In variable mode ([`Sizing::Estimated`]) measured sizes are kept in a sparse record
/// map and mirrored into a Fenwick tree, so offsets, the inverse offset lookup and the total
/// extent stay `O(log n)` (or `O(1)` for the total) while scrolling.
///
/// The oracle has a single writer: whoever owns it. It holds no interior mutability.
#[derive(Clone, Debug)]
pub struct HeightOracle {
    sizing: Sizing,
    count: usize,
    records: MeasureMap,
    prefix: Option<Fenwick>, // variable mode only
}

impl HeightOracle {
    pub fn new(sizing: Sizing, item_count: usize) -> Result<Self, ConfigError> {
        if sizing.default_size() == 0 {
            return Err(ConfigError::ZeroItemSize);
        }
        let mut oracle = Self {
            sizing,
            count: item_count,
            records: MeasureMap::new(),
            prefix: None,
        };
        oracle.rebuild();
        Ok(oracle)
    }

    pub fn sizing(&self) -> Sizing {
        self.sizing
    }

    pub fn item_count(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Measured size if recorded, otherwise the configured default. Always `>= 1`.
    pub fn height_of(&self, index: usize) -> u32 {
        match self.sizing {
            Sizing::Fixed(size) => size,
            Sizing::Estimated(estimate) => self.records.get(&index).copied().unwrap_or(estimate),
        }
    }

    /// Sum of the sizes of every item strictly before `index`.
    ///
    /// `index` is clamped to the item count, so `offset_of(item_count())` is the total extent.
    pub fn offset_of(&self, index: usize) -> u64 {
        let index = cmp::min(index, self.count);
        match (&self.prefix, self.sizing) {
            (Some(prefix), _) => prefix.prefix_sum(index),
            (None, sizing) => (index as u64).saturating_mul(sizing.default_size() as u64),
        }
    }

    /// The item containing `offset`, clamped to the last item. `None` when there are no items.
    pub fn index_at_offset(&self, offset: u64) -> Option<usize> {
        let last = self.count.checked_sub(1)?;
        let index = match (&self.prefix, self.sizing) {
            (Some(prefix), _) => prefix.lower_bound(offset),
            (None, sizing) => {
                let per = offset / sizing.default_size() as u64;
                usize::try_from(per).unwrap_or(usize::MAX)
            }
        };
        Some(cmp::min(index, last))
    }

    pub fn geometry(&self, index: usize) -> ItemGeometry {
        ItemGeometry {
            offset: self.offset_of(index),
            size: self.height_of(index),
        }
    }

    /// Sum of all item sizes. `0` for an empty list.
    pub fn total_extent(&self) -> u64 {
        if self.count == 0 {
            return 0;
        }
        match (&self.prefix, self.sizing) {
            (Some(prefix), _) => prefix.total(),
            (None, sizing) => (self.count as u64).saturating_mul(sizing.default_size() as u64),
        }
    }

    /// Records the actual size of `index` and returns the size delta applied.
    ///
    /// In uniform mode the fixed size stays authoritative and the delta is always `0`.
    pub fn record_measurement(&mut self, index: usize, size: u32) -> Result<i64, MeasureError> {
        if index >= self.count {
            return Err(MeasureError::IndexOutOfBounds {
                index,
                count: self.count,
            });
        }
        if size == 0 {
            return Err(MeasureError::ZeroSize { index });
        }
        let Some(prefix) = self.prefix.as_mut() else {
            vtrace!(index, size, "record_measurement ignored in uniform mode");
            return Ok(0);
        };

        let prev = self
            .records
            .insert(index, size)
            .unwrap_or(self.sizing.default_size());
        let delta = size as i64 - prev as i64;
        if delta != 0 {
            prefix.add(index, delta);
            vtrace!(index, size, delta, "record_measurement");
        }
        Ok(delta)
    }

    /// Drops every measured size and falls back to the estimate.
    pub fn invalidate_all(&mut self) {
        vdebug!(
            count = self.count,
            cleared = self.records.len(),
            "invalidate_all"
        );
        self.records.clear();
        self.rebuild();
    }

    /// Changes the item count. Every measurement is invalidated.
    pub fn set_item_count(&mut self, item_count: usize) {
        self.count = item_count;
        self.invalidate_all();
    }

    pub fn is_measured(&self, index: usize) -> bool {
        self.records.contains_key(&index)
    }

    /// Number of measured records.
    pub fn measured_len(&self) -> usize {
        self.records.len()
    }

    /// Copies the measured sizes out, sorted by index.
    pub fn export_measurements(&self) -> MeasurementSnapshot {
        let mut entries: Vec<(usize, u32)> = self.records.iter().map(|(&i, &s)| (i, s)).collect();
        entries.sort_unstable_by_key(|&(i, _)| i);
        MeasurementSnapshot {
            item_count: self.count,
            entries,
        }
    }

    /// Replaces the measured sizes with `snapshot`'s entries.
    ///
    /// Entries that are out of range or zero-sized are skipped. Returns how many were applied.
    /// Has no effect in uniform mode.
    pub fn import_measurements(&mut self, snapshot: &MeasurementSnapshot) -> usize {
        if !self.sizing.is_variable() {
            return 0;
        }
        self.records.clear();
        for &(index, size) in &snapshot.entries {
            if index < self.count && size > 0 {
                self.records.insert(index, size);
            } else {
                vwarn!(index, size, count = self.count, "skipping invalid measurement entry");
            }
        }
        self.rebuild();
        vdebug!(entries = self.records.len(), "import_measurements");
        self.records.len()
    }

    fn rebuild(&mut self) {
        self.prefix = match self.sizing {
            Sizing::Fixed(_) => None,
            Sizing::Estimated(estimate) => {
                let records = &self.records;
                Some(Fenwick::from_fn(self.count, |i| {
                    records.get(&i).copied().unwrap_or(estimate)
                }))
            }
        };
    }
}
