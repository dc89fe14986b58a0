//! Runtime subsystem: the event loop and what feeds its ready queue.

mod event_loop;
pub(crate) mod interrupt;
pub(crate) mod queue;
pub mod yield_now;

pub use event_loop::EventLoop;
pub use interrupt::{Completer, InterruptHandle};
pub use yield_now::{YieldNow, yield_now};
