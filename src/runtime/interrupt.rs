//! Thread-safe entry point into a single-threaded loop.
//!
//! Interrupt handlers, driver threads and other hosts cannot touch the loop's
//! ready queue directly: it is not `Send`. They push onto an [`InterruptHandle`]
//! instead, whose entries are moved onto the ready queue the next time the loop
//! polls. The swap happens under a short lock, mirroring the "disable
//! interrupts, detach the list, enable interrupts" dance of an ISR queue.
//!
//! ```ignore
//! let event_loop = EventLoop::new();
//! let (completer, future) = event_loop.completer::<u32>();
//!
//! std::thread::spawn(move || completer.complete(Ok(5)));
//! assert_eq!(event_loop.run_until_resolved(&future)?, 5);
//! ```

use crate::error::{Error, Result};

use std::any::Any;
use std::collections::VecDeque;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Outcome of a [`Completer`], boxed so entries of any type share one queue.
pub(crate) type Payload = Box<dyn Any + Send>;

pub(crate) enum Entry {
    /// Run this closure on the loop thread.
    Call(Box<dyn FnOnce() + Send>),
    /// Resolve the future registered under this id.
    Complete(u64, Payload),
}

struct Shared {
    entries: Mutex<VecDeque<Entry>>,
    next_id: AtomicU64,
}

/// Cloneable, `Send` handle for queueing work onto a loop from anywhere.
#[derive(Clone)]
pub struct InterruptHandle {
    shared: Arc<Shared>,
}

impl InterruptHandle {
    pub(crate) fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                entries: Mutex::new(VecDeque::new()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Queues `callback` to run on the loop thread.
    ///
    /// The callback reaches the ready queue at the loop's next poll and runs on
    /// the turn after that.
    pub fn call_soon(&self, callback: impl FnOnce() + Send + 'static) {
        self.push(Entry::Call(Box::new(callback)));
    }

    fn push(&self, entry: Entry) {
        self.shared
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(entry);
    }

    /// Detaches every queued entry at once.
    pub(crate) fn drain(&self) -> VecDeque<Entry> {
        let mut entries = self
            .shared
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        std::mem::take(&mut *entries)
    }

    pub(crate) fn next_id(&self) -> u64 {
        self.shared.next_id.fetch_add(1, Ordering::Relaxed)
    }
}

/// Resolves a loop [`Future`](crate::Future) from another thread.
///
/// Created by [`EventLoop::completer`](crate::EventLoop::completer). A completer
/// dropped without being used resolves its future with [`Error::Cancelled`].
pub struct Completer<T: Send + 'static> {
    handle: InterruptHandle,
    id: u64,
    sent: bool,
    _marker: PhantomData<fn(T)>,
}

impl<T: Send + 'static> Completer<T> {
    pub(crate) fn new(handle: InterruptHandle, id: u64) -> Self {
        Self {
            handle,
            id,
            sent: false,
            _marker: PhantomData,
        }
    }

    /// Delivers the outcome; the future resolves at the loop's next poll.
    pub fn complete(mut self, outcome: Result<T>) {
        self.send(outcome);
    }

    fn send(&mut self, outcome: Result<T>) {
        if self.sent {
            return;
        }
        self.sent = true;

        self.handle
            .push(Entry::Complete(self.id, Box::new(outcome)));
    }
}

impl<T: Send + 'static> Drop for Completer<T> {
    fn drop(&mut self) {
        self.send(Err(Error::Cancelled));
    }
}
