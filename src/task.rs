//! Tasks: futures that drive a suspended computation to completion.
//!
//! A task owns a computation (any `async` block whose output is a
//! [`Result`]) and resumes it one step at a time from the loop's ready queue.
//! Each step ends in one of four ways:
//!
//! 1. the computation awaits one or more pending [`Future`]s: the task
//!    subscribes its next resumption to each of them;
//! 2. the computation suspends without a recorded dependency (for example
//!    [`yield_now`](crate::yield_now)): the task re-enqueues itself;
//! 3. the computation returns `Ok(value)`: the task resolves with the value;
//! 4. the computation returns `Err(error)`: the task resolves with the error.
//!
//! # Cancellation
//!
//! [`Task::cancel`] invalidates every resumption already handed out and
//! schedules a final one that drops the computation and resolves the task with
//! [`Error::Cancelled`]. The futures the task was waiting on are left alone.
//!
//! ```ignore
//! let event_loop = EventLoop::new();
//! let task = event_loop.create_task(async { Ok(42) });
//!
//! assert_eq!(event_loop.run_until_resolved(&task)?, 42);
//! ```

use crate::error::{Error, Result};
use crate::future::Future;
use crate::runtime::EventLoop;

use log::{debug, error};
use std::cell::{Cell, RefCell};
use std::ops::Deref;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

type Computation<T> = Pin<Box<dyn std::future::Future<Output = Result<T>>>>;

/// A [`Future`] that drives a computation.
///
/// Dereferences to the underlying [`Future`], so `done`, `result` and
/// `add_done_callback` are available directly on the task.
pub struct Task<T> {
    inner: Rc<TaskInner<T>>,
}

struct TaskInner<T> {
    id: u64,
    future: Future<T>,
    computation: RefCell<Option<Computation<T>>>,
    cancelled: Cell<bool>,
    // Bumped whenever resumptions are handed out; stale ones are ignored.
    generation: Cell<u64>,
}

impl<T> Clone for Task<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: 'static> Task<T> {
    /// Wraps `computation` and schedules its first step.
    pub(crate) fn new<F>(event_loop: &EventLoop, computation: F) -> Self
    where
        F: std::future::Future<Output = Result<T>> + 'static,
    {
        let inner = Rc::new(TaskInner {
            id: event_loop.next_task_id(),
            future: Future::new(event_loop),
            computation: RefCell::new(Some(Box::pin(computation))),
            cancelled: Cell::new(false),
            generation: Cell::new(0),
        });

        debug!("task {} created", inner.id);
        inner.schedule();

        Self { inner }
    }

    /// Loop-unique identifier, mostly useful in logs.
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Returns the future this task resolves.
    pub fn future(&self) -> &Future<T> {
        &self.inner.future
    }

    /// Requests cancellation.
    ///
    /// Returns `false` if the task already finished or was already cancelled.
    /// Otherwise the computation is never resumed again and the task resolves
    /// with [`Error::Cancelled`] on a later turn.
    pub fn cancel(&self) -> bool {
        if self.inner.future.done() || self.inner.cancelled.get() {
            return false;
        }

        debug!("task {} cancelled", self.inner.id);
        self.inner.cancelled.set(true);
        self.inner.schedule();

        true
    }

    /// Reports whether [`cancel`](Self::cancel) was requested.
    pub fn cancelled(&self) -> bool {
        self.inner.cancelled.get()
    }
}

impl<T: 'static> TaskInner<T> {
    fn next_generation(&self) -> u64 {
        let generation = self.generation.get().wrapping_add(1);
        self.generation.set(generation);
        generation
    }

    /// Queues a resumption for the next turn.
    fn schedule(self: &Rc<Self>) {
        let generation = self.next_generation();
        let task = self.clone();

        self.future
            .event_loop()
            .call_soon(move || task.run(generation));
    }

    /// Resumes the computation for one step.
    fn run(self: &Rc<Self>, generation: u64) {
        if generation != self.generation.get() || self.future.done() {
            return;
        }

        if self.cancelled.get() {
            // Released outside the borrow: its guards may touch other tasks.
            let computation = self.computation.borrow_mut().take();
            drop(computation);
            self.finish(Err(Error::Cancelled));
            return;
        }

        let Some(mut computation) = self.computation.borrow_mut().take() else {
            return;
        };

        let event_loop = self.future.event_loop().clone();
        let mut cx = Context::from_waker(Waker::noop());

        event_loop.begin_step();
        let poll = computation.as_mut().poll(&mut cx);
        let awaiting = event_loop.end_step();

        match poll {
            Poll::Ready(_) if self.cancelled.get() => {
                self.finish(Err(Error::Cancelled));
            }
            Poll::Ready(outcome) => {
                self.finish(outcome);
            }
            Poll::Pending => {
                *self.computation.borrow_mut() = Some(computation);

                // A cancel() issued during the step already queued the final run.
                if self.cancelled.get() {
                    return;
                }

                if awaiting.is_empty() {
                    self.schedule();
                    return;
                }

                let generation = self.next_generation();
                for dependency in awaiting {
                    let task = self.clone();
                    dependency.subscribe(Box::new(move || task.run(generation)));
                }
            }
        }
    }

    fn finish(&self, outcome: Result<T>) {
        if let Err(error) = &outcome {
            debug!("task {} failed: {}", self.id, error);
        } else {
            debug!("task {} completed", self.id);
        }

        if let Err(error) = self.future.set_outcome(outcome) {
            error!("task {} was resolved from outside: {}", self.id, error);
        }
    }
}

impl<T> Deref for Task<T> {
    type Target = Future<T>;

    fn deref(&self) -> &Future<T> {
        &self.inner.future
    }
}

impl<T: Clone + 'static> std::future::Future for Task<T> {
    type Output = Result<T>;

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.future.poll_outcome()
    }
}

impl<T> std::fmt::Debug for Task<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.inner.id)
            .field("cancelled", &self.inner.cancelled.get())
            .field("future", &self.inner.future)
            .finish()
    }
}

/// Cancels the wrapped task when dropped.
///
/// Used to tie the lifetime of helper tasks to the computation that spawned
/// them, so that cancelling the parent cancels its children too.
pub struct CancelOnDrop<T: 'static>(pub Task<T>);

impl<T: 'static> Deref for CancelOnDrop<T> {
    type Target = Task<T>;

    fn deref(&self) -> &Task<T> {
        &self.0
    }
}

impl<T: 'static> Drop for CancelOnDrop<T> {
    fn drop(&mut self) {
        self.0.cancel();
    }
}
