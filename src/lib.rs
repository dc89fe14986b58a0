//! Single-threaded cooperative event loop with non-blocking device bridging.
//!
//! This crate runs many concurrent activities on one thread of control
//! without threads, locks or OS-level blocking. Work is expressed as
//! `async` computations driven by tasks; devices (serial ports, sockets,
//! audio FIFOs, buttons) are switched to zero-timeout mode and retried from
//! the loop's poll step until they are ready.
//!
//! # Architecture
//!
//! - **EventLoop**: FIFO ready queue processed in turns, plus a poll step for
//!   interrupts, pending device operations and an optional user hook
//! - **Future**: single-assignment result with completion callbacks that
//!   always run on a later turn
//! - **Task**: a future driving an `async` computation step by step, with
//!   cancellation
//! - **Stream**: a device bound to a loop, exposing read, write, drain,
//!   accept and pin waits as futures
//! - **Pipelines**: ready-made computations such as [`stream_copy`],
//!   [`duplex`], [`serve_bridge`] and audio [`play`]
//! - **LoopBuilder**: fluent configuration of the idle strategy, queue
//!   capacity and poll hook
//!
//! # Example
//!
//! ```ignore
//! use streamloop::{EventLoop, FdDevice, Stream, stream_copy};
//!
//! let event_loop = EventLoop::new();
//! let (reader, writer) = FdDevice::pipe()?;
//! let src = Stream::new(&event_loop, reader)?;
//! let dst = Stream::new(&event_loop, FdDevice::open("/dev/ttyUSB0")?)?;
//!
//! let copied = event_loop.run_until_complete(stream_copy(dst, src, 64))?;
//! ```

mod builder;
mod error;
mod future;
mod task;

pub mod fd;
pub mod net;
pub mod pipeline;
pub mod reactor;
pub mod runtime;
pub mod time;

pub use builder::{IdleStrategy, LoopBuilder};
pub use error::{Error, Result};
pub use fd::FdDevice;
pub use future::Future;
pub use pipeline::{
    AudioFormat, DuplexStats, duplex, play, play_with_control, serve_bridge, stream_copy,
    toggle_on_edge,
};
pub use reactor::device::{
    AcceptDevice, AudioSink, Device, DrainDevice, PinInput, ReadDevice, WriteDevice,
};
pub use reactor::stream::{CloseOnDrop, Stream};
pub use reactor::wait::{Edge, poll_wait, stream_wait, wait_edge, wait_until};
pub use runtime::{Completer, EventLoop, InterruptHandle, YieldNow, yield_now};
pub use task::{CancelOnDrop, Task};
pub use time::{deadline, race, sleep, sleep_until, timeout};
