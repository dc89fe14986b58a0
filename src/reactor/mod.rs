//! Bridge between non-blocking devices and loop futures.
//!
//! This module turns blocking-style device operations into awaitable futures
//! without dedicating a thread to any of them:
//! - [`device`]: capability traits a device implements
//! - [`wait`]: the generic poll-driven wait primitives
//! - [`stream`]: [`Stream`], a device bound to a loop with one method per operation
//! - `registry`: the pending operations retried by the loop's poll step
//!
//! [`Stream`]: stream::Stream

pub mod device;
pub(crate) mod registry;
pub mod stream;
pub mod wait;
