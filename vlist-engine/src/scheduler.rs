use std::cell::{Cell, RefCell};

/// Identifies one requested frame callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameToken(u64);

impl FrameToken {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(self) -> u64 {
        self.0
    }
}

/// A "run once before the next repaint" primitive.
///
/// The embedding loop is expected to call [`crate::Engine::on_frame`] when a requested frame
/// fires. Implementations use interior mutability: requests arrive from signal handlers that
/// only hold a shared reference.
pub trait FrameScheduler {
    fn request_frame(&self) -> FrameToken;

    fn cancel_frame(&self, token: FrameToken);
}

/// A deterministic scheduler for tests and headless hosts.
///
/// Requested frames queue up until [`ManualScheduler::take_due`] is called.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next_id: Cell<u64>,
    pending: RefCell<Vec<FrameToken>>,
    requested: Cell<usize>,
    cancelled: Cell<usize>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_due(&self) -> bool {
        !self.pending.borrow().is_empty()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Fires every pending frame, returning their tokens in request order.
    pub fn take_due(&self) -> Vec<FrameToken> {
        self.pending.take()
    }

    /// Total number of frames ever requested.
    pub fn requested_count(&self) -> usize {
        self.requested.get()
    }

    /// Total number of frames cancelled before firing.
    pub fn cancelled_count(&self) -> usize {
        self.cancelled.get()
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&self) -> FrameToken {
        let token = FrameToken::new(self.next_id.get());
        self.next_id.set(token.id() + 1);
        self.requested.set(self.requested.get() + 1);
        self.pending.borrow_mut().push(token);
        token
    }

    fn cancel_frame(&self, token: FrameToken) {
        let mut pending = self.pending.borrow_mut();
        let before = pending.len();
        pending.retain(|&t| t != token);
        if pending.len() != before {
            self.cancelled.set(self.cancelled.get() + 1);
        }
    }
}
