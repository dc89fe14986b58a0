//! Deadlines and racing futures against each other.

use crate::error::Error;
use crate::future::Future;
use crate::reactor::wait::poll_wait;
use crate::runtime::EventLoop;

use std::task::Poll;
use std::time::{Duration, Instant};

/// Returns a future that fails with [`Error::TimedOut`] once `duration` has
/// elapsed. It never resolves with a value.
pub fn deadline<T: 'static>(event_loop: &EventLoop, duration: Duration) -> Future<T> {
    let at = Instant::now() + duration;

    poll_wait(event_loop, move || {
        if Instant::now() >= at {
            Poll::Ready(Err(Error::TimedOut))
        } else {
            Poll::Pending
        }
    })
}

/// Resolves with the outcome of whichever of `first` and `second` finishes
/// first; the other outcome is discarded.
///
/// The returned future owns both contenders until it resolves, while their
/// callbacks only point back weakly. Once it resolves, or is dropped while
/// still pending, the contenders are released and forget its callbacks, so a
/// pending device operation behind them is reaped on the next poll pass
/// unless someone else still holds it.
pub fn race<T: Clone + 'static>(first: Future<T>, second: Future<T>) -> Future<T> {
    let winner = first.event_loop().create_future();
    let mut contenders = Contenders(Vec::with_capacity(2));

    for contender in [first, second] {
        let weak = winner.downgrade();

        let key = contender.on_done(move |done| {
            if let Some(winner) = weak.upgrade() {
                if !winner.done() {
                    // Checked just above; resolution cannot fail here.
                    let _ = winner.set_outcome(done.result());
                }
            }
        });

        contenders.0.push((contender, key));
    }

    winner.attach(contenders);
    winner
}

/// Futures held by a pending [`race`], with the keys of the callbacks it
/// registered on them.
struct Contenders<T: 'static>(Vec<(Future<T>, Option<u64>)>);

impl<T: 'static> Drop for Contenders<T> {
    fn drop(&mut self) {
        for (contender, key) in &self.0 {
            if let Some(key) = key {
                contender.remove_callback(*key);
            }
        }
    }
}

/// Resolves like `future`, or fails with [`Error::TimedOut`] if `future` is
/// still pending after `duration`.
///
/// Timing out does not cancel whoever resolves `future`; for a task, cancel it
/// explicitly.
pub fn timeout<T: Clone + 'static>(
    event_loop: &EventLoop,
    duration: Duration,
    future: Future<T>,
) -> Future<T> {
    race(future, deadline(event_loop, duration))
}
