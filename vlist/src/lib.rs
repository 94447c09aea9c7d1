//! Geometry core for virtualized lists.
//!
//! This crate answers the questions a windowed list asks on every scroll frame:
//! - how long is item `i`, and where does it start ([`HeightOracle`])
//! - which items intersect the viewport, plus overscan ([`RangeCalculator`])
//! - how long is the whole list, so a spacer can size the scrollbar
//!   ([`HeightOracle::total_extent`])
//!
//! Lists are either uniform (every item has a fixed size, all queries are `O(1)`) or variable
//! (items start at an estimate and are corrected by measurements, queries are `O(log n)` over a
//! Fenwick tree).
//!
//! It holds no UI objects. The `vlist-engine` crate drives it against a host scroll container
//! and a renderer.
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

mod config;
mod error;
mod fenwick;
mod oracle;
mod range;
mod records;
mod state;
mod types;


pub use config::{Axis, ListConfig, RawListConfig, Sizing};
pub use error::{ConfigError, MeasureError};
pub use oracle::HeightOracle;
pub use range::RangeCalculator;
pub use state::{MeasurementSnapshot, ViewportState};
pub use types::{Align, ItemGeometry, VisibleRange, WindowRange};
