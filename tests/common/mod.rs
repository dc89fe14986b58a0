#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::io;
use std::net::SocketAddr;
use std::rc::Rc;

use streamloop::{AcceptDevice, AudioSink, Device, DrainDevice, PinInput, ReadDevice, WriteDevice};

/// What the next read of a [`MockDevice`] returns.
pub enum Chunk {
    Data(Vec<u8>),
    Eof,
    Fail(io::ErrorKind),
}

#[derive(Default)]
struct MockState {
    incoming: RefCell<VecDeque<Chunk>>,
    written: RefCell<Vec<u8>>,
    // `None` accepts everything; `Some(n)` accepts n more bytes, then blocks.
    write_budget: Cell<Option<usize>>,
    read_attempts: Cell<usize>,
    write_calls: Cell<usize>,
    nonblocking: Cell<bool>,
    closed: Cell<bool>,
}

/// In-memory byte device. Clones share state so a test can keep a handle on
/// a device it moved into a stream.
#[derive(Clone, Default)]
pub struct MockDevice(Rc<MockState>);

impl MockDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chunks(chunks: impl IntoIterator<Item = Chunk>) -> Self {
        let device = Self::new();
        device.0.incoming.borrow_mut().extend(chunks);
        device
    }

    pub fn push(&self, chunk: Chunk) {
        self.0.incoming.borrow_mut().push_back(chunk);
    }

    pub fn push_data(&self, bytes: &[u8]) {
        self.push(Chunk::Data(bytes.to_vec()));
    }

    pub fn set_write_budget(&self, budget: Option<usize>) {
        self.0.write_budget.set(budget);
    }

    pub fn written(&self) -> Vec<u8> {
        self.0.written.borrow().clone()
    }

    pub fn read_attempts(&self) -> usize {
        self.0.read_attempts.get()
    }

    pub fn write_calls(&self) -> usize {
        self.0.write_calls.get()
    }

    pub fn is_nonblocking(&self) -> bool {
        self.0.nonblocking.get()
    }

    pub fn is_closed(&self) -> bool {
        self.0.closed.get()
    }
}

impl Device for MockDevice {
    fn set_nonblocking(&self) -> io::Result<()> {
        self.0.nonblocking.set(true);
        Ok(())
    }

    fn close(&self) -> io::Result<()> {
        self.0.closed.set(true);
        Ok(())
    }
}

impl ReadDevice for MockDevice {
    fn try_read(&self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read_attempts.set(self.0.read_attempts.get() + 1);

        if self.0.closed.get() {
            return Err(io::ErrorKind::NotConnected.into());
        }

        let mut incoming = self.0.incoming.borrow_mut();
        match incoming.pop_front() {
            None => Err(io::ErrorKind::WouldBlock.into()),
            Some(Chunk::Eof) => {
                incoming.push_front(Chunk::Eof);
                Ok(0)
            }
            Some(Chunk::Fail(kind)) => Err(kind.into()),
            Some(Chunk::Data(mut bytes)) => {
                let n = bytes.len().min(buf.len());
                buf[..n].copy_from_slice(&bytes[..n]);
                if n < bytes.len() {
                    incoming.push_front(Chunk::Data(bytes.split_off(n)));
                }
                Ok(n)
            }
        }
    }
}

impl WriteDevice for MockDevice {
    fn try_write(&self, buf: &[u8]) -> io::Result<usize> {
        self.0.write_calls.set(self.0.write_calls.get() + 1);

        if self.0.closed.get() {
            return Err(io::ErrorKind::NotConnected.into());
        }

        let n = match self.0.write_budget.get() {
            None => buf.len(),
            Some(0) => return Err(io::ErrorKind::WouldBlock.into()),
            Some(budget) => {
                let n = budget.min(buf.len());
                self.0.write_budget.set(Some(budget - n));
                n
            }
        };

        self.0.written.borrow_mut().extend_from_slice(&buf[..n]);
        Ok(n)
    }
}

pub enum Incoming {
    Connection(MockDevice),
    Fail(io::ErrorKind),
}

/// Listener handing out queued [`MockDevice`] connections.
#[derive(Clone, Default)]
pub struct MockListener {
    incoming: Rc<RefCell<VecDeque<Incoming>>>,
    closed: Rc<Cell<bool>>,
}

impl MockListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, incoming: Incoming) {
        self.incoming.borrow_mut().push_back(incoming);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.get()
    }
}

impl Device for MockListener {
    fn set_nonblocking(&self) -> io::Result<()> {
        Ok(())
    }

    fn close(&self) -> io::Result<()> {
        self.closed.set(true);
        Ok(())
    }
}

impl AcceptDevice for MockListener {
    type Connection = MockDevice;

    fn try_accept(&self) -> io::Result<(MockDevice, SocketAddr)> {
        match self.incoming.borrow_mut().pop_front() {
            None => Err(io::ErrorKind::WouldBlock.into()),
            Some(Incoming::Fail(kind)) => Err(kind.into()),
            Some(Incoming::Connection(device)) => {
                Ok((device, SocketAddr::from(([127, 0, 0, 1], 4000))))
            }
        }
    }
}

/// Digital input replaying a scripted sequence of levels; the last level
/// sticks once the script runs out.
#[derive(Clone)]
pub struct MockPin {
    levels: Rc<RefCell<VecDeque<bool>>>,
    last: Rc<Cell<bool>>,
    closed: Rc<Cell<bool>>,
}

impl MockPin {
    pub fn new(levels: impl IntoIterator<Item = bool>) -> Self {
        let levels: VecDeque<bool> = levels.into_iter().collect();
        let last = levels.front().copied().unwrap_or(false);

        Self {
            levels: Rc::new(RefCell::new(levels)),
            last: Rc::new(Cell::new(last)),
            closed: Rc::new(Cell::new(false)),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.get()
    }
}

impl Device for MockPin {
    fn set_nonblocking(&self) -> io::Result<()> {
        Ok(())
    }

    fn close(&self) -> io::Result<()> {
        self.closed.set(true);
        Ok(())
    }
}

impl PinInput for MockPin {
    fn level(&self) -> io::Result<bool> {
        if let Some(level) = self.levels.borrow_mut().pop_front() {
            self.last.set(level);
        }
        Ok(self.last.get())
    }
}

#[derive(Default)]
struct SinkState {
    written: RefCell<Vec<u8>>,
    queued_at_start: Cell<Option<usize>>,
    starts: Cell<usize>,
    stops: Cell<usize>,
    // Drain attempts that still report would-block.
    drain_polls: Cell<usize>,
    drained: Cell<bool>,
    closed: Cell<bool>,
}

/// Audio output recording what it was fed and how it was controlled.
#[derive(Clone, Default)]
pub struct MockSink(Rc<SinkState>);

impl MockSink {
    pub fn new(drain_polls: usize) -> Self {
        let sink = Self::default();
        sink.0.drain_polls.set(drain_polls);
        sink
    }

    pub fn written(&self) -> Vec<u8> {
        self.0.written.borrow().clone()
    }

    /// Bytes already queued when `start` was first called.
    pub fn queued_at_start(&self) -> Option<usize> {
        self.0.queued_at_start.get()
    }

    pub fn starts(&self) -> usize {
        self.0.starts.get()
    }

    pub fn stops(&self) -> usize {
        self.0.stops.get()
    }

    pub fn drained(&self) -> bool {
        self.0.drained.get()
    }

    pub fn is_closed(&self) -> bool {
        self.0.closed.get()
    }
}

impl Device for MockSink {
    fn set_nonblocking(&self) -> io::Result<()> {
        Ok(())
    }

    fn close(&self) -> io::Result<()> {
        self.0.closed.set(true);
        Ok(())
    }
}

impl WriteDevice for MockSink {
    fn try_write(&self, buf: &[u8]) -> io::Result<usize> {
        self.0.written.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }
}

impl DrainDevice for MockSink {
    fn try_drain(&self) -> io::Result<()> {
        match self.0.drain_polls.get() {
            0 => {
                self.0.drained.set(true);
                Ok(())
            }
            remaining => {
                self.0.drain_polls.set(remaining - 1);
                Err(io::ErrorKind::WouldBlock.into())
            }
        }
    }
}

impl AudioSink for MockSink {
    fn start(&self) -> io::Result<()> {
        if self.0.queued_at_start.get().is_none() {
            self.0.queued_at_start.set(Some(self.0.written.borrow().len()));
        }
        self.0.starts.set(self.0.starts.get() + 1);
        Ok(())
    }

    fn stop(&self) -> io::Result<()> {
        self.0.stops.set(self.0.stops.get() + 1);
        Ok(())
    }
}
