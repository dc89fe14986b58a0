//! Exposes a serial device to one TCP client at a time.
//!
//! ```text
//! cargo run --example remote_serial -- /dev/ttyUSB0 8080
//! nc localhost 8080
//! ```
//!
//! A new client replaces the current one.

use log::{LevelFilter, Log, Metadata, Record};
use streamloop::net::TcpListener;
use streamloop::{EventLoop, FdDevice, IdleStrategy, Stream, serve_bridge};

use std::time::Duration;

struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{:<5} {}] {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    log::set_logger(&LOGGER).map_err(|error| error.to_string())?;
    log::set_max_level(LevelFilter::Info);

    let mut args = std::env::args().skip(1);
    let path = args.next().unwrap_or_else(|| "/dev/ttyUSB0".to_string());
    let port: u16 = args.next().map(|port| port.parse()).transpose()?.unwrap_or(8080);

    let event_loop = EventLoop::builder()
        .idle(IdleStrategy::Sleep(Duration::from_millis(1)))
        .build();

    let device = Stream::new(&event_loop, FdDevice::open(&path)?)?;
    let listener = Stream::new(&event_loop, TcpListener::bind(("0.0.0.0", port))?)?;
    println!("bridging {} on port {}", path, port);

    event_loop.run_until_complete(serve_bridge(listener, device, 64))?;

    Ok(())
}
