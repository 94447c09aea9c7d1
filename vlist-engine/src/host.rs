use core::fmt;

use crate::SignalSender;

/// The scroll container hosting the list.
///
/// The engine reads geometry from it on every recomputation and never caches it across frames.
pub trait HostContainer {
    /// Current scroll offset along the list axis.
    fn scroll_offset(&self) -> u64;

    /// Current viewport length along the list axis. `0` is a legal transient state.
    fn viewport_size(&self) -> u32;

    /// Moves the scroll position. Hosts typically answer with a scroll signal.
    fn scroll_to(&mut self, offset: u64);

    /// Sizes the scrollable spacer to the list's total extent.
    fn set_content_extent(&mut self, _extent: u64) {}

    /// Starts forwarding scroll-change notifications to `signals`.
    fn subscribe_scroll(&mut self, signals: SignalSender) -> Subscription;

    /// Starts forwarding viewport resize notifications to `signals`.
    fn subscribe_resize(&mut self, signals: SignalSender) -> Subscription;
}

/// A scoped subscription. The cancel callback runs exactly once, when the guard is dropped.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A subscription with nothing to undo.
    pub fn detached() -> Self {
        Self { cancel: None }
    }

    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}
