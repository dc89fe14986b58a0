//! Ready-made computations built from stream operations.
//!
//! Each pipeline is a plain `async fn` meant to be handed to
//! [`EventLoop::create_task`](crate::EventLoop::create_task) or
//! [`EventLoop::run_until_complete`](crate::EventLoop::run_until_complete):
//! - [`copy`]: [`stream_copy`], one direction from a source to a sink
//! - [`duplex`]: [`duplex`](duplex::duplex), both directions between two devices
//!   and [`serve_bridge`], an accept loop bridging each client to a device
//! - [`audio`]: [`play`], feeding PCM from a source into an [`AudioSink`], and
//!   the button-driven pause control around it
//!
//! [`AudioSink`]: crate::AudioSink

pub mod audio;
pub mod copy;
pub mod duplex;

pub use audio::{AudioFormat, play, play_with_control, toggle_on_edge};
pub use copy::stream_copy;
pub use duplex::{DuplexStats, duplex, serve_bridge};
