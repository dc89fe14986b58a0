//! Delays.

use crate::future::Future;
use crate::reactor::wait::wait_until;
use crate::runtime::EventLoop;

use std::time::{Duration, Instant};

/// Returns a future that resolves once `duration` has elapsed.
///
/// A zero duration resolves immediately, before this function returns.
pub fn sleep(event_loop: &EventLoop, duration: Duration) -> Future<()> {
    sleep_until(event_loop, Instant::now() + duration)
}

/// Returns a future that resolves once `instant` has been reached.
pub fn sleep_until(event_loop: &EventLoop, instant: Instant) -> Future<()> {
    wait_until(event_loop, move || Instant::now() >= instant)
}
