#[cfg(not(feature = "std"))]
use alloc::collections::BTreeMap;
#[cfg(feature = "std")]
use std::collections::HashMap;

/// Sparse `index -> measured size` records.
///
/// Only indexes that were rendered (or manually overridden) in variable mode get an entry.
#[cfg(feature = "std")]
pub(crate) type MeasureMap = HashMap<usize, u32>;
#[cfg(not(feature = "std"))]
pub(crate) type MeasureMap = BTreeMap<usize, u32>;
