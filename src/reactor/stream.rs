//! Awaitable operations on a device.
//!
//! [`Stream`] puts a device into zero-timeout mode once and then exposes each
//! blocking-style operation as a method returning a loop [`Future`].
//! Buffers are moved into the pending operation and handed back with the
//! result, so a buffer can never be shared by two operations in flight.
//!
//! ```ignore
//! let uart = Stream::new(&event_loop, FdDevice::open("/dev/ttyUSB0")?)?;
//!
//! let (buf, n) = uart.read(vec![0; 64]).await?;
//! let (buf, _) = uart.write_all(buf, n).await?;
//! ```

use crate::error::{Error, Result};
use crate::future::Future;
use crate::reactor::device::{
    AcceptDevice, Device, DrainDevice, PinInput, ReadDevice, WriteDevice, would_block,
};
use crate::reactor::wait::{Edge, poll_wait, stream_wait, wait_edge};
use crate::runtime::EventLoop;

use log::warn;
use std::io;
use std::net::SocketAddr;
use std::ops::Deref;
use std::rc::Rc;
use std::task::Poll;

/// A device bound to a loop.
///
/// Cloning is cheap; clones share the device, which is how the two directions
/// of a bridge read and write the same handle.
pub struct Stream<D> {
    event_loop: EventLoop,
    device: Rc<D>,
}

impl<D> Clone for Stream<D> {
    fn clone(&self) -> Self {
        Self {
            event_loop: self.event_loop.clone(),
            device: self.device.clone(),
        }
    }
}

impl<D: Device + 'static> Stream<D> {
    /// Takes ownership of `device` and switches it to zero-timeout mode.
    pub fn new(event_loop: &EventLoop, device: D) -> Result<Self> {
        Self::from_shared(event_loop, Rc::new(device))
    }

    /// Like [`new`](Self::new) for a device shared with other code.
    pub fn from_shared(event_loop: &EventLoop, device: Rc<D>) -> Result<Self> {
        device.set_nonblocking()?;

        Ok(Self {
            event_loop: event_loop.clone(),
            device,
        })
    }

    pub fn device(&self) -> &Rc<D> {
        &self.device
    }

    pub fn event_loop(&self) -> &EventLoop {
        &self.event_loop
    }

    /// Closes the underlying device. Safe to call more than once.
    pub fn close(&self) -> Result<()> {
        self.device.close()?;
        Ok(())
    }
}

impl<D: ReadDevice + 'static> Stream<D> {
    /// Reads whatever arrives first into `buf`.
    ///
    /// Resolves with the buffer and the byte count; a count of zero means the
    /// device reached end of stream.
    pub fn read(&self, buf: Vec<u8>) -> Future<(Vec<u8>, usize)> {
        let device = self.device.clone();
        let mut buf = Some(buf);

        poll_wait(&self.event_loop, move || {
            let Some(bytes) = buf.as_mut() else {
                return Poll::Ready(Err(Error::InvalidState("read already completed")));
            };

            match device.try_read(bytes) {
                Ok(n) => Poll::Ready(Ok((buf.take().unwrap_or_default(), n))),
                Err(error) if would_block(&error) => Poll::Pending,
                Err(error) => Poll::Ready(Err(error.into())),
            }
        })
    }

    /// Fills `buf` completely, accumulating partial reads across polls.
    ///
    /// Fails with [`io::ErrorKind::UnexpectedEof`] if the stream ends first.
    pub fn read_exact(&self, buf: Vec<u8>) -> Future<Vec<u8>> {
        let device = self.device.clone();
        let mut buf = Some(buf);
        let mut filled = 0;

        poll_wait(&self.event_loop, move || {
            let Some(bytes) = buf.as_mut() else {
                return Poll::Ready(Err(Error::InvalidState("read already completed")));
            };

            while filled < bytes.len() {
                match device.try_read(&mut bytes[filled..]) {
                    Ok(0) => return Poll::Ready(Err(io::ErrorKind::UnexpectedEof.into())),
                    Ok(n) => filled += n,
                    Err(error) if would_block(&error) => return Poll::Pending,
                    Err(error) => return Poll::Ready(Err(error.into())),
                }
            }

            Poll::Ready(Ok(buf.take().unwrap_or_default()))
        })
    }
}

impl<D: WriteDevice + 'static> Stream<D> {
    /// Writes as much of `buf[..len]` as the device accepts in one go.
    pub fn write(&self, buf: Vec<u8>, len: usize) -> Future<(Vec<u8>, usize)> {
        if len > buf.len() {
            return self.rejected(io::ErrorKind::InvalidInput);
        }

        let device = self.device.clone();
        let mut buf = Some(buf);

        poll_wait(&self.event_loop, move || {
            let Some(bytes) = buf.as_ref() else {
                return Poll::Ready(Err(Error::InvalidState("write already completed")));
            };

            match device.try_write(&bytes[..len]) {
                Ok(n) => Poll::Ready(Ok((buf.take().unwrap_or_default(), n))),
                Err(error) if would_block(&error) => Poll::Pending,
                Err(error) => Poll::Ready(Err(error.into())),
            }
        })
    }

    /// Writes exactly `buf[..len]`, accumulating partial writes across polls.
    ///
    /// Resolves with the buffer and `len`. A device that accepts zero bytes
    /// for a non-empty write fails with [`io::ErrorKind::WriteZero`].
    pub fn write_all(&self, buf: Vec<u8>, len: usize) -> Future<(Vec<u8>, usize)> {
        if len > buf.len() {
            return self.rejected(io::ErrorKind::InvalidInput);
        }

        let device = self.device.clone();
        let mut buf = Some(buf);
        let mut written = 0;

        poll_wait(&self.event_loop, move || {
            let Some(bytes) = buf.as_ref() else {
                return Poll::Ready(Err(Error::InvalidState("write already completed")));
            };

            while written < len {
                match device.try_write(&bytes[written..len]) {
                    Ok(0) => return Poll::Ready(Err(io::ErrorKind::WriteZero.into())),
                    Ok(n) => written += n,
                    Err(error) if would_block(&error) => return Poll::Pending,
                    Err(error) => return Poll::Ready(Err(error.into())),
                }
            }

            Poll::Ready(Ok((buf.take().unwrap_or_default(), len)))
        })
    }

    fn rejected<T: 'static>(&self, kind: io::ErrorKind) -> Future<T> {
        poll_wait(&self.event_loop, move || Poll::Ready(Err(kind.into())))
    }
}

impl<D: DrainDevice + 'static> Stream<D> {
    /// Resolves once the device consumed everything written to it.
    pub fn drain(&self) -> Future<()> {
        let device = self.device.clone();
        stream_wait(&self.event_loop, move || device.try_drain())
    }
}

impl<D> Stream<D>
where
    D: AcceptDevice + 'static,
    D::Connection: 'static,
{
    /// Resolves with the next incoming connection and its peer address.
    pub fn accept(&self) -> Future<(D::Connection, SocketAddr)> {
        let device = self.device.clone();
        stream_wait(&self.event_loop, move || device.try_accept())
    }
}

impl<D: PinInput + 'static> Stream<D> {
    /// Resolves once the pin reads `level`.
    pub fn wait_level(&self, level: bool) -> Future<()> {
        let device = self.device.clone();
        stream_wait(&self.event_loop, move || match device.level()? {
            current if current == level => Ok(()),
            _ => Err(io::ErrorKind::WouldBlock.into()),
        })
    }

    /// Resolves on the next matching transition of the pin.
    pub fn wait_edge(&self, edge: Edge) -> Future<()> {
        let device = self.device.clone();
        wait_edge(&self.event_loop, edge, move || device.level())
    }
}

impl<D> std::fmt::Debug for Stream<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stream")
            .field("device", &std::any::type_name::<D>())
            .finish()
    }
}

/// Closes the wrapped stream's device when dropped.
///
/// Holding one inside a computation ties the device to it: when the
/// computation finishes, fails or is cancelled, the device is released.
pub struct CloseOnDrop<D: Device + 'static>(pub Stream<D>);

impl<D: Device + 'static> Deref for CloseOnDrop<D> {
    type Target = Stream<D>;

    fn deref(&self) -> &Stream<D> {
        &self.0
    }
}

impl<D: Device + 'static> Drop for CloseOnDrop<D> {
    fn drop(&mut self) {
        if let Err(error) = self.0.close() {
            warn!("failed to close {:?}: {}", self.0, error);
        }
    }
}
