//! Listening TCP socket.

use crate::net::tcp_stream::TcpStream;
use crate::reactor::device::{AcceptDevice, Device};

use std::cell::RefCell;
use std::io;
use std::net::{self, SocketAddr, ToSocketAddrs};

/// A TCP listener that hands out [`TcpStream`] connections.
///
/// Accepted connections are already in zero-timeout mode. Closing the
/// listener drops the socket; further accepts fail with
/// [`io::ErrorKind::NotConnected`].
pub struct TcpListener {
    socket: RefCell<Option<net::TcpListener>>,
}

impl TcpListener {
    /// Binds a listener to `addr`. Port `0` picks a free port; see
    /// [`local_addr`](Self::local_addr).
    pub fn bind(addr: impl ToSocketAddrs) -> io::Result<Self> {
        Ok(Self::from_std(net::TcpListener::bind(addr)?))
    }

    pub fn from_std(socket: net::TcpListener) -> Self {
        Self {
            socket: RefCell::new(Some(socket)),
        }
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.with_socket(|socket| socket.local_addr())
    }

    fn with_socket<R>(&self, f: impl FnOnce(&net::TcpListener) -> io::Result<R>) -> io::Result<R> {
        match self.socket.borrow().as_ref() {
            Some(socket) => f(socket),
            None => Err(io::ErrorKind::NotConnected.into()),
        }
    }
}

impl Device for TcpListener {
    fn set_nonblocking(&self) -> io::Result<()> {
        self.with_socket(|socket| socket.set_nonblocking(true))
    }

    fn close(&self) -> io::Result<()> {
        self.socket.borrow_mut().take();
        Ok(())
    }
}

impl AcceptDevice for TcpListener {
    type Connection = TcpStream;

    fn try_accept(&self) -> io::Result<(TcpStream, SocketAddr)> {
        let (socket, peer) = self.with_socket(|socket| socket.accept())?;
        socket.set_nonblocking(true)?;

        Ok((TcpStream::from_std(socket), peer))
    }
}

impl std::fmt::Debug for TcpListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpListener")
            .field("local_addr", &self.local_addr().ok())
            .finish()
    }
}
