//! Turning non-blocking attempts into awaitable futures.
//!
//! [`poll_wait`] is the primitive everything else is built on: it makes one
//! attempt right away and, if that would block, hands the attempt to the loop,
//! which retries it once per poll pass until it succeeds or fails for real.
//! One pass services any number of pending operations on any number of
//! devices; no thread is ever parked on a device.
//!
//! ```ignore
//! let ready = wait_until(&event_loop, move || fifo.free_space() >= 512);
//! let (conn, peer) = stream_wait(&event_loop, move || listener.accept()).await?;
//! ```

use crate::error::Result;
use crate::future::Future;
use crate::reactor::device::would_block;
use crate::reactor::registry::Operation;
use crate::runtime::EventLoop;

use std::io;
use std::task::Poll;

/// Which transitions of a sampled level resolve an edge wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// Low to high.
    Rising,
    /// High to low.
    Falling,
    /// Either direction.
    Any,
}

impl Edge {
    pub(crate) fn matches(self, previous: bool, current: bool) -> bool {
        match self {
            Edge::Rising => !previous && current,
            Edge::Falling => previous && !current,
            Edge::Any => previous != current,
        }
    }
}

/// Resolves once `attempt` returns `Poll::Ready`.
///
/// The attempt runs immediately; if it is already ready the returned future is
/// resolved before this function returns. Otherwise it is retried on every
/// poll pass. Dropping every handle to the returned future abandons the
/// operation: the next pass removes it without calling `attempt` again.
pub fn poll_wait<T, F>(event_loop: &EventLoop, mut attempt: F) -> Future<T>
where
    T: 'static,
    F: FnMut() -> Poll<Result<T>> + 'static,
{
    let future = event_loop.create_future();

    match attempt() {
        Poll::Ready(outcome) => {
            // Freshly created, so it cannot already be resolved.
            let _ = future.set_outcome(outcome);
        }
        Poll::Pending => {
            event_loop.register_wait(Box::new(Operation::new(future.downgrade(), attempt)));
        }
    }

    future
}

/// Resolves once the non-blocking `operation` stops reporting would-block.
///
/// Errors other than [`io::ErrorKind::WouldBlock`] and
/// [`io::ErrorKind::Interrupted`] resolve the future with
/// [`Error::Device`](crate::Error::Device).
pub fn stream_wait<T, F>(event_loop: &EventLoop, mut operation: F) -> Future<T>
where
    T: 'static,
    F: FnMut() -> io::Result<T> + 'static,
{
    poll_wait(event_loop, move || match operation() {
        Ok(value) => Poll::Ready(Ok(value)),
        Err(error) if would_block(&error) => Poll::Pending,
        Err(error) => Poll::Ready(Err(error.into())),
    })
}

/// Level-triggered wait: resolves once `predicate` holds.
///
/// The predicate is re-evaluated on every poll pass.
pub fn wait_until<F>(event_loop: &EventLoop, mut predicate: F) -> Future<()>
where
    F: FnMut() -> bool + 'static,
{
    poll_wait(event_loop, move || {
        if predicate() {
            Poll::Ready(Ok(()))
        } else {
            Poll::Pending
        }
    })
}

/// Edge-triggered wait: resolves on the first transition of `sample` that
/// matches `edge`.
///
/// The first sample only establishes the baseline, so a level that is
/// already high never satisfies [`Edge::Rising`] by itself.
pub fn wait_edge<F>(event_loop: &EventLoop, edge: Edge, mut sample: F) -> Future<()>
where
    F: FnMut() -> io::Result<bool> + 'static,
{
    let mut previous: Option<bool> = None;

    poll_wait(event_loop, move || {
        let current = match sample() {
            Ok(level) => level,
            Err(error) if would_block(&error) => return Poll::Pending,
            Err(error) => return Poll::Ready(Err(error.into())),
        };

        let triggered = previous.is_some_and(|previous| edge.matches(previous, current));
        previous = Some(current);

        if triggered {
            Poll::Ready(Ok(()))
        } else {
            Poll::Pending
        }
    })
}
