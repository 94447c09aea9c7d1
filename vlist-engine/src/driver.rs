use std::cell::Cell;
use std::rc::{Rc, Weak};

use crate::{FrameScheduler, FrameToken};

/// Which host signal a [`SignalSender`] forwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SignalKind {
    Scroll,
    Resize,
}

/// Signals received since the last frame ran.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FrameSignals {
    pub scrolls: u32,
    pub resizes: u32,
}

/// Coalesces scroll and resize signals into at most one recomputation per frame.
///
/// The first signal requests a frame and keeps its token. Later signals only bump counters
/// until the engine takes the frame. All state lives in `Cell`s: signals arrive through shared
/// references from host callbacks, on the engine's thread.
pub struct ScrollDriver {
    scheduler: Rc<dyn FrameScheduler>,
    pending: Cell<Option<FrameToken>>,
    signals: Cell<FrameSignals>,
    closed: Cell<bool>,
}

impl ScrollDriver {
    pub(crate) fn new(scheduler: Rc<dyn FrameScheduler>) -> Rc<Self> {
        Rc::new(Self {
            scheduler,
            pending: Cell::new(None),
            signals: Cell::new(FrameSignals::default()),
            closed: Cell::new(false),
        })
    }

    pub fn notify(&self, kind: SignalKind) {
        if self.closed.get() {
            return;
        }
        let mut signals = self.signals.get();
        match kind {
            SignalKind::Scroll => signals.scrolls = signals.scrolls.saturating_add(1),
            SignalKind::Resize => signals.resizes = signals.resizes.saturating_add(1),
        }
        self.signals.set(signals);
        self.request();
    }

    /// Requests a frame unless one is already pending.
    pub(crate) fn request(&self) {
        if self.closed.get() || self.pending.get().is_some() {
            return;
        }
        let token = self.scheduler.request_frame();
        vtrace!(token = token.id(), "frame requested");
        self.pending.set(Some(token));
    }

    pub fn is_pending(&self) -> bool {
        self.pending.get().is_some()
    }

    /// Consumes the pending frame. `None` when nothing was scheduled.
    pub(crate) fn begin_frame(&self) -> Option<FrameSignals> {
        self.pending.take()?;
        Some(self.signals.take())
    }

    /// Drops the pending frame, e.g. because a synchronous recomputation supersedes it.
    pub(crate) fn cancel(&self) {
        if let Some(token) = self.pending.take() {
            self.scheduler.cancel_frame(token);
            vtrace!(token = token.id(), "frame cancelled");
        }
        self.signals.set(FrameSignals::default());
    }

    /// Cancels any pending frame and ignores every later signal.
    pub(crate) fn close(&self) {
        self.cancel();
        self.closed.set(true);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.get()
    }
}

/// The host-side end of a signal subscription.
///
/// Holds only a weak reference: once the engine is destroyed, notifications are dropped.
#[derive(Clone)]
pub struct SignalSender {
    driver: Weak<ScrollDriver>,
    kind: SignalKind,
}

impl SignalSender {
    pub(crate) fn new(driver: &Rc<ScrollDriver>, kind: SignalKind) -> Self {
        Self {
            driver: Rc::downgrade(driver),
            kind,
        }
    }

    pub fn kind(&self) -> SignalKind {
        self.kind
    }

    /// Forwards one notification. Returns `false` if the engine is gone.
    pub fn notify(&self) -> bool {
        match self.driver.upgrade() {
            Some(driver) if !driver.is_closed() => {
                driver.notify(self.kind);
                true
            }
            _ => false,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.driver
            .upgrade()
            .is_some_and(|driver| !driver.is_closed())
    }
}

impl core::fmt::Debug for SignalSender {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SignalSender")
            .field("kind", &self.kind)
            .field("connected", &self.is_connected())
            .finish()
    }
}
