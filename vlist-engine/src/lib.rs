//! A windowing engine on top of the `vlist` geometry core.
//!
//! `vlist` answers "which items are visible". This crate keeps a set of rendered item
//! handles equal to that answer as the user scrolls:
//!
//! - [`ScrollDriver`] coalesces host scroll/resize signals into one recomputation per frame,
//!   using an injected [`FrameScheduler`].
//! - [`Reconciler`] destroys handles leaving the range, renders handles entering it, and feeds
//!   measured sizes back into the height oracle.
//! - [`Engine`] ties both to a [`HostContainer`] and a [`Renderer`] and exposes the
//!   list-level operations (`set_item_count`, `refresh`, `scroll_to_index`, ...).
//!
//! Everything is single-threaded and cooperative: no background threads, no locks.
#![forbid(unsafe_code)]

#[macro_use]
mod macros;

mod driver;
mod engine;
mod error;
mod host;
mod reconcile;
mod scheduler;

#[cfg(test)]
mod tests;

pub use driver::{FrameSignals, ScrollDriver, SignalKind, SignalSender};
pub use engine::{Engine, EngineState};
pub use error::EngineError;
pub use host::{HostContainer, Subscription};
pub use reconcile::{ReconcileOutcome, Reconciler, RenderedItem, RenderedSet, Renderer};
pub use scheduler::{FrameScheduler, FrameToken, ManualScheduler};

pub use vlist::{Align, ItemGeometry, ListConfig, Sizing, VisibleRange};
