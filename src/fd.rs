//! Raw file-descriptor devices.
//!
//! [`FdDevice`] wraps any readable/writable descriptor (a serial tty, a FIFO,
//! one end of a pipe) and implements the device traits on top of the plain
//! `read(2)`/`write(2)` calls. Once [`Device::set_nonblocking`] has run, every
//! call returns immediately and `EAGAIN` surfaces as
//! [`io::ErrorKind::WouldBlock`].
//!
//! ```ignore
//! let uart = Stream::new(&event_loop, FdDevice::open("/dev/ttyACM0")?)?;
//! ```

use crate::reactor::device::{Device, ReadDevice, WriteDevice};

use libc::{F_GETFL, F_SETFL, O_CLOEXEC, O_NOCTTY, O_NONBLOCK, O_RDWR, c_void, fcntl};
use log::{trace, warn};
use std::cell::Cell;
use std::ffi::CString;
use std::io;
use std::os::fd::{AsRawFd, FromRawFd, RawFd};
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

/// An owned file descriptor driven by the loop.
///
/// The descriptor is closed by [`Device::close`] or on drop, whichever comes
/// first. After closing, every operation fails with
/// [`io::ErrorKind::NotConnected`].
pub struct FdDevice {
    file_descriptor: Cell<Option<RawFd>>,
}

impl FdDevice {
    /// Opens `path` for reading and writing without making it the
    /// controlling terminal.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = CString::new(path.as_ref().as_os_str().as_bytes())
            .map_err(|_| io::Error::from(io::ErrorKind::InvalidInput))?;

        let file_descriptor = unsafe { libc::open(path.as_ptr(), O_RDWR | O_NOCTTY | O_CLOEXEC) };
        if file_descriptor < 0 {
            return Err(io::Error::last_os_error());
        }

        Ok(unsafe { Self::from_raw_fd(file_descriptor) })
    }

    /// Creates an anonymous pipe, returning `(reader, writer)`.
    pub fn pipe() -> io::Result<(Self, Self)> {
        let mut fds = [0; 2];
        if unsafe { libc::pipe(fds.as_mut_ptr()) } < 0 {
            return Err(io::Error::last_os_error());
        }

        Ok(unsafe { (Self::from_raw_fd(fds[0]), Self::from_raw_fd(fds[1])) })
    }

    /// Returns the descriptor, or `NotConnected` once closed.
    fn fd(&self) -> io::Result<RawFd> {
        self.file_descriptor
            .get()
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotConnected))
    }

    pub fn is_closed(&self) -> bool {
        self.file_descriptor.get().is_none()
    }
}

impl FromRawFd for FdDevice {
    /// Takes ownership of `fd`; it is closed when the device is.
    unsafe fn from_raw_fd(fd: RawFd) -> Self {
        Self {
            file_descriptor: Cell::new(Some(fd)),
        }
    }
}

impl AsRawFd for FdDevice {
    /// Returns `-1` once the device is closed.
    fn as_raw_fd(&self) -> RawFd {
        self.file_descriptor.get().unwrap_or(-1)
    }
}

impl Device for FdDevice {
    fn set_nonblocking(&self) -> io::Result<()> {
        let fd = self.fd()?;

        let flags = unsafe { fcntl(fd, F_GETFL) };
        if flags < 0 {
            return Err(io::Error::last_os_error());
        }
        if flags & O_NONBLOCK != 0 {
            return Ok(());
        }
        if unsafe { fcntl(fd, F_SETFL, flags | O_NONBLOCK) } < 0 {
            return Err(io::Error::last_os_error());
        }

        Ok(())
    }

    fn close(&self) -> io::Result<()> {
        let Some(fd) = self.file_descriptor.take() else {
            return Ok(());
        };

        trace!("closing fd {fd}");
        if unsafe { libc::close(fd) } < 0 {
            return Err(io::Error::last_os_error());
        }

        Ok(())
    }
}

impl ReadDevice for FdDevice {
    fn try_read(&self, buf: &mut [u8]) -> io::Result<usize> {
        let fd = self.fd()?;

        let n = unsafe { libc::read(fd, buf.as_mut_ptr() as *mut c_void, buf.len()) };
        if n < 0 {
            return Err(io::Error::last_os_error());
        }

        Ok(n as usize)
    }
}

impl WriteDevice for FdDevice {
    fn try_write(&self, buf: &[u8]) -> io::Result<usize> {
        let fd = self.fd()?;

        let n = unsafe { libc::write(fd, buf.as_ptr() as *const c_void, buf.len()) };
        if n < 0 {
            return Err(io::Error::last_os_error());
        }

        Ok(n as usize)
    }
}

impl Drop for FdDevice {
    fn drop(&mut self) {
        if let Err(error) = Device::close(self) {
            warn!("failed to close fd on drop: {error}");
        }
    }
}

impl std::fmt::Debug for FdDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FdDevice")
            .field("fd", &self.file_descriptor.get())
            .finish()
    }
}
