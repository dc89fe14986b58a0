//! Single-assignment futures with completion callbacks.
//!
//! A [`Future`] is created by whoever starts an asynchronous operation and is
//! resolved exactly once, either with a value or with an [`Error`]. Interested
//! parties subscribe with [`Future::add_done_callback`]; callbacks never run
//! inline but are queued on the owning [`EventLoop`] for a later turn.
//!
//! Futures are also awaitable from computations driven by a [`Task`]. Awaiting a
//! pending future does not use the standard waker machinery: instead the future
//! reports itself to the loop as the dependency of the running task, and the
//! task subscribes to it once the current step returns.
//!
//! ```ignore
//! let event_loop = EventLoop::new();
//! let future = event_loop.create_future::<u32>();
//!
//! future.add_done_callback(|f| println!("resolved with {:?}", f.result()));
//! future.set_result(7)?;
//! ```
//!
//! [`Task`]: crate::Task

use crate::error::{Error, Result};
use crate::runtime::EventLoop;

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::mem;
use std::pin::Pin;
use std::rc::{Rc, Weak};
use std::task::{Context, Poll};

/// Type-erased view of a future used by tasks to subscribe their resumption.
pub(crate) trait Subscribe {
    /// Runs `callback` on a later turn once the future is done.
    fn subscribe(&self, callback: Box<dyn FnOnce()>);
}

type Callback<T> = Box<dyn FnOnce(&Future<T>)>;

enum Outcome<T> {
    Pending,
    Value(T),
    Failure(Error),
    // The value was moved out by `take_result`.
    Taken,
}

struct Shared<T> {
    event_loop: EventLoop,
    outcome: RefCell<Outcome<T>>,
    callbacks: RefCell<Vec<(u64, Callback<T>)>>,
    next_callback: Cell<u64>,
    // Released once the future resolves.
    attached: RefCell<Vec<Box<dyn Any>>>,
}

/// A handle to an eventual value or failure.
///
/// Cloning the handle is cheap and every clone observes the same state.
pub struct Future<T> {
    shared: Rc<Shared<T>>,
}

impl<T> Clone for Future<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T: 'static> Future<T> {
    /// Creates a pending future bound to `event_loop`.
    pub fn new(event_loop: &EventLoop) -> Self {
        Self {
            shared: Rc::new(Shared {
                event_loop: event_loop.clone(),
                outcome: RefCell::new(Outcome::Pending),
                callbacks: RefCell::new(Vec::new()),
                next_callback: Cell::new(0),
                attached: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Returns the loop this future schedules its callbacks on.
    pub fn event_loop(&self) -> &EventLoop {
        &self.shared.event_loop
    }

    /// Reports whether the future reached a terminal state.
    pub fn done(&self) -> bool {
        !matches!(*self.shared.outcome.borrow(), Outcome::Pending)
    }

    /// Returns a copy of the stored value or re-raises the stored failure.
    pub fn result(&self) -> Result<T>
    where
        T: Clone,
    {
        match &*self.shared.outcome.borrow() {
            Outcome::Pending => Err(Error::InvalidState("result is not ready")),
            Outcome::Value(value) => Ok(value.clone()),
            Outcome::Failure(error) => Err(error.clone()),
            Outcome::Taken => Err(Error::InvalidState("result was already consumed")),
        }
    }

    /// Moves the stored value out of the future.
    ///
    /// Awaiting and [`result`](Self::result) leave the value in place; this is
    /// the explicit way to take it. Failures stay in place and are returned on
    /// every call. Once a value has been taken, later calls report
    /// [`Error::InvalidState`].
    pub fn take_result(&self) -> Result<T> {
        let mut outcome = self.shared.outcome.borrow_mut();

        match mem::replace(&mut *outcome, Outcome::Taken) {
            Outcome::Pending => {
                *outcome = Outcome::Pending;
                Err(Error::InvalidState("result is not ready"))
            }
            Outcome::Value(value) => Ok(value),
            Outcome::Failure(error) => {
                *outcome = Outcome::Failure(error.clone());
                Err(error)
            }
            Outcome::Taken => Err(Error::InvalidState("result was already consumed")),
        }
    }

    /// Returns the stored failure, if the future failed.
    pub fn exception(&self) -> Option<Error> {
        match &*self.shared.outcome.borrow() {
            Outcome::Failure(error) => Some(error.clone()),
            _ => None,
        }
    }

    /// Resolves the future with a value.
    ///
    /// Fails with [`Error::InvalidState`] if the future is already done.
    pub fn set_result(&self, value: T) -> Result<()> {
        self.resolve(Outcome::Value(value))
    }

    /// Resolves the future with a failure.
    ///
    /// Fails with [`Error::InvalidState`] if the future is already done.
    pub fn set_exception(&self, error: Error) -> Result<()> {
        self.resolve(Outcome::Failure(error))
    }

    /// Resolves the future from a `Result`, picking value or failure.
    pub fn set_outcome(&self, outcome: Result<T>) -> Result<()> {
        match outcome {
            Ok(value) => self.set_result(value),
            Err(error) => self.set_exception(error),
        }
    }

    /// Registers `callback` to run once the future is done.
    ///
    /// Callbacks run in registration order, always on a turn after the one in
    /// which the future was resolved. A callback added to a finished future is
    /// scheduled for the next turn.
    pub fn add_done_callback(&self, callback: impl FnOnce(&Future<T>) + 'static) {
        self.on_done(callback);
    }

    /// Like [`add_done_callback`](Self::add_done_callback), but returns a key
    /// for [`remove_callback`](Self::remove_callback) while still pending.
    pub(crate) fn on_done(&self, callback: impl FnOnce(&Future<T>) + 'static) -> Option<u64> {
        if self.done() {
            let future = self.clone();
            self.shared.event_loop.call_soon(move || callback(&future));
            return None;
        }

        Some(self.shared.push_callback(Box::new(callback)))
    }

    /// Drops a callback that has not been scheduled yet.
    pub(crate) fn remove_callback(&self, key: u64) -> bool {
        let mut callbacks = self.shared.callbacks.borrow_mut();
        let before = callbacks.len();
        callbacks.retain(|(id, _)| *id != key);
        callbacks.len() != before
    }

    /// Keeps `value` alive until the future resolves, then drops it.
    pub(crate) fn attach(&self, value: impl Any) {
        if self.done() {
            return;
        }
        self.shared.attached.borrow_mut().push(Box::new(value));
    }

    fn resolve(&self, outcome: Outcome<T>) -> Result<()> {
        {
            let mut slot = self.shared.outcome.borrow_mut();
            if !matches!(*slot, Outcome::Pending) {
                return Err(Error::InvalidState("future is already resolved"));
            }
            *slot = outcome;
        }

        let callbacks = mem::take(&mut *self.shared.callbacks.borrow_mut());
        for (_, callback) in callbacks {
            let future = self.clone();
            self.shared.event_loop.call_soon(move || callback(&future));
        }

        // Dropped outside the borrow: attachments may touch other futures.
        let attached = mem::take(&mut *self.shared.attached.borrow_mut());
        drop(attached);

        Ok(())
    }

    /// Returns a copy of the outcome if done, otherwise records this future
    /// as the dependency of the step currently being driven.
    pub(crate) fn poll_outcome(&self) -> Poll<Result<T>>
    where
        T: Clone,
    {
        if self.done() {
            return Poll::Ready(self.result());
        }

        self.shared.event_loop.note_awaiting(self.shared.clone());
        Poll::Pending
    }

    pub(crate) fn downgrade(&self) -> WeakFuture<T> {
        WeakFuture(Rc::downgrade(&self.shared))
    }
}

impl<T> Shared<T> {
    fn push_callback(&self, callback: Callback<T>) -> u64 {
        let key = self.next_callback.get();
        self.next_callback.set(key.wrapping_add(1));
        self.callbacks.borrow_mut().push((key, callback));
        key
    }
}

impl<T: 'static> Subscribe for Shared<T> {
    fn subscribe(&self, callback: Box<dyn FnOnce()>) {
        if matches!(*self.outcome.borrow(), Outcome::Pending) {
            self.push_callback(Box::new(move |_| callback()));
        } else {
            self.event_loop.call_soon(callback);
        }
    }
}

/// Awaiting yields a copy of the outcome; the value stays readable through
/// [`Future::result`] and by every other awaiter.
impl<T: Clone + 'static> std::future::Future for Future<T> {
    type Output = Result<T>;

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.poll_outcome()
    }
}

impl<T> std::fmt::Debug for Future<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match &*self.shared.outcome.borrow() {
            Outcome::Pending => "pending",
            Outcome::Value(_) => "resolved",
            Outcome::Failure(_) => "failed",
            Outcome::Taken => "consumed",
        };
        f.debug_struct("Future").field("state", &state).finish()
    }
}

/// Non-owning reference held by pending operations, so that an operation
/// nobody waits for anymore can be reaped.
pub(crate) struct WeakFuture<T>(Weak<Shared<T>>);

impl<T> WeakFuture<T> {
    pub(crate) fn upgrade(&self) -> Option<Future<T>> {
        self.0.upgrade().map(|shared| Future { shared })
    }
}
