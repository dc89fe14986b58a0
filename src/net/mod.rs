//! TCP devices.
//!
//! Thin wrappers over `std::net` sockets that implement the device traits, so
//! a listener or a connection can be wrapped in a [`Stream`] like any other
//! device:
//! - [`tcp_listener`]: [`TcpListener`], an [`AcceptDevice`] yielding connections
//! - [`tcp_stream`]: [`TcpStream`], a readable and writable connection
//!
//! # Example
//!
//! ```ignore
//! let listener = Stream::new(&event_loop, TcpListener::bind("127.0.0.1:0")?)?;
//! let (conn, peer) = listener.accept().await?;
//! let conn = Stream::new(&event_loop, conn)?;
//! ```
//!
//! [`Stream`]: crate::Stream
//! [`AcceptDevice`]: crate::AcceptDevice
//! [`TcpListener`]: tcp_listener::TcpListener
//! [`TcpStream`]: tcp_stream::TcpStream

pub mod tcp_listener;
pub mod tcp_stream;

pub use tcp_listener::TcpListener;
pub use tcp_stream::TcpStream;
