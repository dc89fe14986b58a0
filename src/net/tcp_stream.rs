//! Connected TCP socket.

use crate::reactor::device::{Device, ReadDevice, WriteDevice};

use log::debug;
use std::cell::RefCell;
use std::io::{self, Read, Write};
use std::net::{self, Shutdown, SocketAddr, ToSocketAddrs};

/// A TCP connection usable as a read and write device.
///
/// [`connect`](Self::connect) blocks until the handshake completes; it is
/// meant for clients and tests. Connections produced by
/// [`TcpListener`](crate::net::TcpListener) never block.
pub struct TcpStream {
    socket: RefCell<Option<net::TcpStream>>,
}

impl TcpStream {
    pub fn connect(addr: impl ToSocketAddrs) -> io::Result<Self> {
        Ok(Self::from_std(net::TcpStream::connect(addr)?))
    }

    pub fn from_std(socket: net::TcpStream) -> Self {
        Self {
            socket: RefCell::new(Some(socket)),
        }
    }

    pub fn peer_addr(&self) -> io::Result<SocketAddr> {
        self.with_socket(|socket| socket.peer_addr())
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.with_socket(|socket| socket.local_addr())
    }

    fn with_socket<R>(&self, f: impl FnOnce(&net::TcpStream) -> io::Result<R>) -> io::Result<R> {
        match self.socket.borrow().as_ref() {
            Some(socket) => f(socket),
            None => Err(io::ErrorKind::NotConnected.into()),
        }
    }
}

impl Device for TcpStream {
    fn set_nonblocking(&self) -> io::Result<()> {
        self.with_socket(|socket| socket.set_nonblocking(true))
    }

    fn close(&self) -> io::Result<()> {
        let Some(socket) = self.socket.borrow_mut().take() else {
            return Ok(());
        };

        // The peer may already be gone; the socket is released either way.
        if let Err(error) = socket.shutdown(Shutdown::Both) {
            debug!("shutdown on close: {error}");
        }

        Ok(())
    }
}

impl ReadDevice for TcpStream {
    fn try_read(&self, buf: &mut [u8]) -> io::Result<usize> {
        self.with_socket(|mut socket| socket.read(buf))
    }
}

impl WriteDevice for TcpStream {
    fn try_write(&self, buf: &[u8]) -> io::Result<usize> {
        self.with_socket(|mut socket| socket.write(buf))
    }
}

impl std::fmt::Debug for TcpStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpStream")
            .field("peer_addr", &self.peer_addr().ok())
            .finish()
    }
}
