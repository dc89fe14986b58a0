//! FIFO ready queue for callbacks waiting for their turn.
//!
//! The loop owns exactly one queue and is the only thing that pops from it.
//! Callbacks may push new entries while running; those land behind everything
//! already queued and therefore run on a later turn.

use std::cell::RefCell;
use std::collections::VecDeque;

/// A callback scheduled with [`EventLoop::call_soon`](crate::EventLoop::call_soon).
pub(crate) type Callback = Box<dyn FnOnce()>;

/// Single-threaded FIFO of ready callbacks.
pub(crate) struct ReadyQueue {
    entries: RefCell<VecDeque<Callback>>,
}

impl ReadyQueue {
    /// Creates an empty queue with room for `capacity` entries.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: RefCell::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Appends a callback behind every entry already queued.
    pub(crate) fn push(&self, callback: Callback) {
        self.entries.borrow_mut().push_back(callback);
    }

    /// Removes the oldest entry.
    ///
    /// The borrow is released before returning, so the caller may run the
    /// callback and let it push more work.
    pub(crate) fn pop(&self) -> Option<Callback> {
        self.entries.borrow_mut().pop_front()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}
