//! Time utilities built on the poll step.
//!
//! Deadlines are checked against [`Instant::now`] on every poll pass, so their
//! resolution is bounded by how often the loop polls (and by the idle
//! strategy when it has nothing else to do).
//!
//! - [`sleep`] resolves after a delay
//! - [`deadline`] fails with [`Error::TimedOut`] after a delay
//! - [`race`] resolves with whichever of two futures finishes first
//! - [`timeout`] races a future against a deadline
//!
//! # Example
//!
//! ```ignore
//! let event_loop = EventLoop::new();
//! let uart = Stream::new(&event_loop, FdDevice::open("/dev/ttyUSB0")?)?;
//!
//! event_loop.run_until_complete({
//!     let event_loop = event_loop.clone();
//!     async move {
//!         sleep(&event_loop, Duration::from_millis(50)).await?;
//!         let read = uart.read(vec![0; 64]);
//!         let (buf, n) = timeout(&event_loop, Duration::from_secs(1), read).await?;
//!         Ok(buf[..n].to_vec())
//!     }
//! })?;
//! ```
//!
//! [`Instant::now`]: std::time::Instant::now
//! [`Error::TimedOut`]: crate::Error::TimedOut

pub mod sleep;
pub mod timeout;

pub use sleep::{sleep, sleep_until};
pub use timeout::{deadline, race, timeout};
