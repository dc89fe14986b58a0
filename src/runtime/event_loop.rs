//! The event loop: a ready queue plus an external poll step.
//!
//! One *turn* runs every callback that was queued when the turn started;
//! callbacks queued during the turn wait for the next one. Between turns the
//! loop polls once for external progress:
//!
//! 1. entries pushed through the [`InterruptHandle`] are moved onto the ready
//!    queue (or resolve their futures directly);
//! 2. every pending device operation is retried once;
//! 3. the optional user poll hook runs.
//!
//! When the ready queue is still empty afterwards the loop idles according to
//! its [`IdleStrategy`] and polls again. Nothing here ever blocks on an OS
//! primitive.

use crate::builder::{IdleStrategy, LoopBuilder};
use crate::error::{Error, Result};
use crate::future::{Future, Subscribe};
use crate::reactor::registry::{PendingOperation, Registry};
use crate::runtime::interrupt::{Completer, Entry, InterruptHandle, Payload};
use crate::runtime::queue::ReadyQueue;
use crate::task::Task;

use log::{trace, warn};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

type Resolver = Box<dyn FnOnce(Payload)>;

/// Handle to a single-threaded cooperative event loop.
///
/// The handle is cheap to clone; every clone drives the same loop. Futures,
/// tasks and streams keep a clone so they can schedule work without any
/// ambient "current loop".
#[derive(Clone)]
pub struct EventLoop {
    inner: Rc<Inner>,
}

struct Inner {
    ready: ReadyQueue,
    waits: Registry,
    interrupts: InterruptHandle,
    resolvers: RefCell<HashMap<u64, Resolver>>,
    poll_hook: RefCell<Option<Box<dyn FnMut()>>>,
    // Futures awaited during the task step currently being driven.
    awaiting: RefCell<Vec<Rc<dyn Subscribe>>>,
    idle: IdleStrategy,
    running: Cell<bool>,
    stopping: Cell<bool>,
    next_task_id: Cell<u64>,
    turns: Cell<u64>,
}

/// Clears the running flag even if a callback panics.
struct RunningGuard<'a>(&'a Cell<bool>);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl EventLoop {
    /// Creates a loop with the default configuration.
    pub fn new() -> Self {
        LoopBuilder::new().build()
    }

    /// Returns a builder for a customised loop.
    pub fn builder() -> LoopBuilder {
        LoopBuilder::new()
    }

    pub(crate) fn with_config(builder: LoopBuilder) -> Self {
        Self {
            inner: Rc::new(Inner {
                ready: ReadyQueue::with_capacity(builder.queue_capacity),
                waits: Registry::new(),
                interrupts: InterruptHandle::new(),
                resolvers: RefCell::new(HashMap::new()),
                poll_hook: RefCell::new(builder.poll_hook),
                awaiting: RefCell::new(Vec::new()),
                idle: builder.idle,
                running: Cell::new(false),
                stopping: Cell::new(false),
                next_task_id: Cell::new(1),
                turns: Cell::new(0),
            }),
        }
    }

    /// Schedules `callback` for the next turn.
    ///
    /// Callbacks queued during the same turn run in the order they were queued.
    pub fn call_soon(&self, callback: impl FnOnce() + 'static) {
        self.inner.ready.push(Box::new(callback));
    }

    /// Creates a pending future bound to this loop.
    pub fn create_future<T: 'static>(&self) -> Future<T> {
        Future::new(self)
    }

    /// Wraps `computation` in a [`Task`] and schedules its first step.
    pub fn create_task<T, F>(&self, computation: F) -> Task<T>
    where
        T: 'static,
        F: std::future::Future<Output = Result<T>> + 'static,
    {
        Task::new(self, computation)
    }

    /// Returns a `Send` handle for queueing callbacks from other threads.
    pub fn interrupt_handle(&self) -> InterruptHandle {
        self.inner.interrupts.clone()
    }

    /// Creates a future that another thread resolves through the returned
    /// [`Completer`].
    pub fn completer<T: Send + 'static>(&self) -> (Completer<T>, Future<T>) {
        let future = self.create_future::<T>();
        let id = self.inner.interrupts.next_id();

        let target = future.clone();
        let resolver: Resolver = Box::new(move |payload| match payload.downcast::<Result<T>>() {
            Ok(outcome) => {
                if let Err(error) = target.set_outcome(*outcome) {
                    warn!("completion {} dropped: {}", id, error);
                }
            }
            Err(_) => warn!("completion {} carried an unexpected payload", id),
        });
        self.inner.resolvers.borrow_mut().insert(id, resolver);

        (Completer::new(self.inner.interrupts.clone(), id), future)
    }

    /// Replaces the hook polled once per idle pass.
    pub fn set_poll_hook(&self, hook: impl FnMut() + 'static) {
        *self.inner.poll_hook.borrow_mut() = Some(Box::new(hook));
    }

    /// Asks a running loop to return after the callback currently running.
    pub fn stop(&self) {
        self.inner.stopping.set(true);
    }

    /// Reports whether [`run_forever`](Self::run_forever) is on the stack.
    pub fn is_running(&self) -> bool {
        self.inner.running.get()
    }

    /// Number of device operations waiting for the poll step.
    pub fn pending_waits(&self) -> usize {
        self.inner.waits.len()
    }

    /// Number of completed turns, useful for ordering assertions.
    pub fn turns(&self) -> u64 {
        self.inner.turns.get()
    }

    /// Runs turns until [`stop`](Self::stop) is called.
    ///
    /// Fails with [`Error::InvalidState`] if the loop is already running.
    pub fn run_forever(&self) -> Result<()> {
        if self.inner.running.get() {
            return Err(Error::InvalidState("event loop is already running"));
        }

        self.inner.running.set(true);
        self.inner.stopping.set(false);
        let _running = RunningGuard(&self.inner.running);

        loop {
            if !self.run_turn() {
                return Ok(());
            }

            self.poll();

            while self.inner.ready.is_empty() {
                if self.inner.stopping.get() {
                    return Ok(());
                }
                self.inner.idle.pause();
                self.poll();
            }
        }
    }

    /// Runs `computation` as a task until it finishes and returns its outcome.
    pub fn run_until_complete<T, F>(&self, computation: F) -> Result<T>
    where
        T: 'static,
        F: std::future::Future<Output = Result<T>> + 'static,
    {
        let task = self.create_task(computation);
        self.run_until_done(&task)?;

        // Nobody else holds the task, so the value can be moved out.
        task.take_result()
    }

    /// Runs the loop until `future` is done and returns a copy of its outcome.
    ///
    /// The value stays in `future` for other observers. If the loop is stopped
    /// by someone else first, fails with [`Error::InvalidState`].
    pub fn run_until_resolved<T: Clone + 'static>(&self, future: &Future<T>) -> Result<T> {
        self.run_until_done(future)?;
        future.result()
    }

    fn run_until_done<T: 'static>(&self, future: &Future<T>) -> Result<()> {
        let event_loop = self.clone();
        future.add_done_callback(move |_| event_loop.stop());

        self.run_forever()?;

        if !future.done() {
            return Err(Error::InvalidState(
                "event loop stopped before the future completed",
            ));
        }

        Ok(())
    }

    /// Polls once, then runs at most one ready callback.
    ///
    /// Meant for hosts that own the blocking wait (an interrupt tick, another
    /// event loop). Returns whether a callback ran.
    pub fn run_one(&self) -> bool {
        self.poll();

        match self.inner.ready.pop() {
            Some(callback) => {
                callback();
                true
            }
            None => false,
        }
    }

    /// Runs one turn. Returns `false` if the loop was asked to stop.
    fn run_turn(&self) -> bool {
        let count = self.inner.ready.len();
        let turn = self.inner.turns.get() + 1;
        self.inner.turns.set(turn);

        if count > 0 {
            trace!("turn {}: {} callbacks", turn, count);
        }

        for _ in 0..count {
            let Some(callback) = self.inner.ready.pop() else {
                break;
            };
            callback();

            if self.inner.stopping.get() {
                return false;
            }
        }

        !self.inner.stopping.get()
    }

    /// Single external poll: interrupts, device operations, user hook.
    fn poll(&self) {
        for entry in self.inner.interrupts.drain() {
            match entry {
                Entry::Call(callback) => self.call_soon(callback),
                Entry::Complete(id, payload) => {
                    let resolver = self.inner.resolvers.borrow_mut().remove(&id);
                    match resolver {
                        Some(resolver) => resolver(payload),
                        None => warn!("completion {} has no pending future", id),
                    }
                }
            }
        }

        self.inner.waits.poll();

        // Taken out while running so the hook may replace itself.
        let hook = self.inner.poll_hook.borrow_mut().take();
        if let Some(mut hook) = hook {
            hook();
            let mut slot = self.inner.poll_hook.borrow_mut();
            if slot.is_none() {
                *slot = Some(hook);
            }
        }
    }

    pub(crate) fn register_wait(&self, operation: Box<dyn PendingOperation>) {
        self.inner.waits.register(operation);
    }

    pub(crate) fn next_task_id(&self) -> u64 {
        let id = self.inner.next_task_id.get();
        self.inner.next_task_id.set(id + 1);
        id
    }

    pub(crate) fn note_awaiting(&self, dependency: Rc<dyn Subscribe>) {
        self.inner.awaiting.borrow_mut().push(dependency);
    }

    pub(crate) fn begin_step(&self) {
        self.inner.awaiting.borrow_mut().clear();
    }

    pub(crate) fn end_step(&self) -> Vec<Rc<dyn Subscribe>> {
        std::mem::take(&mut *self.inner.awaiting.borrow_mut())
    }
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLoop")
            .field("ready", &self.inner.ready.len())
            .field("pending_waits", &self.inner.waits.len())
            .field("running", &self.inner.running.get())
            .field("turns", &self.inner.turns.get())
            .finish()
    }
}
