//! Capabilities a device must offer to be driven by the loop.
//!
//! Every method must return immediately once [`Device::set_nonblocking`] has
//! been called. "Not ready yet" is reported as an [`io::Error`] of kind
//! [`io::ErrorKind::WouldBlock`]; anything else is treated as a real failure.

use std::io;
use std::net::SocketAddr;

/// Base capability: zero-timeout mode and an idempotent close.
pub trait Device {
    /// Switches the device to zero-timeout mode.
    fn set_nonblocking(&self) -> io::Result<()>;

    /// Releases the device. Closing twice is a no-op.
    fn close(&self) -> io::Result<()>;
}

/// A device bytes can be read from.
pub trait ReadDevice: Device {
    /// Reads whatever is available. `Ok(0)` means end of stream.
    fn try_read(&self, buf: &mut [u8]) -> io::Result<usize>;
}

/// A device bytes can be written to.
pub trait WriteDevice: Device {
    /// Writes as much of `buf` as fits right now.
    fn try_write(&self, buf: &[u8]) -> io::Result<usize>;
}

/// A device with an internal queue that can be waited on until empty, such as
/// the FIFO in front of an audio DAC.
pub trait DrainDevice: Device {
    /// Succeeds once everything written so far has been consumed.
    fn try_drain(&self) -> io::Result<()>;
}

/// A listening device producing connections.
pub trait AcceptDevice: Device {
    type Connection;

    /// Accepts one pending connection.
    fn try_accept(&self) -> io::Result<(Self::Connection, SocketAddr)>;
}

/// A digital input sampled by the loop.
pub trait PinInput: Device {
    /// Returns the current logic level.
    fn level(&self) -> io::Result<bool>;
}

/// An audio output fed with PCM bytes.
pub trait AudioSink: WriteDevice + DrainDevice {
    /// Starts (or resumes) playback of the queued samples.
    fn start(&self) -> io::Result<()>;

    /// Pauses playback; queued samples are kept.
    fn stop(&self) -> io::Result<()>;
}

/// Reports whether an error only means "try again later".
pub(crate) fn would_block(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}
