//! Streaming PCM audio into an output device.
//!
//! [`play`] is the write loop: prime the sink with one buffer, start it, then
//! keep it fed until the source runs dry and wait for the queue to drain.
//! [`toggle_on_edge`] is the matching control loop that pauses and resumes
//! the sink whenever a button is pressed, and [`play_with_control`] runs both
//! together.

use crate::error::Result;
use crate::reactor::device::{AudioSink, PinInput, ReadDevice};
use crate::reactor::stream::{CloseOnDrop, Stream};
use crate::reactor::wait::Edge;
use crate::runtime::yield_now;
use crate::task::CancelOnDrop;

use log::{debug, info};
use std::io;
use std::time::Instant;

/// Layout of the PCM samples fed to a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    pub channels: u16,
    pub sample_rate: u32,
    pub bytes_per_sample: u16,
}

impl AudioFormat {
    /// Builds a format from a bit depth, rounding up to whole bytes.
    pub fn from_bits(channels: u16, sample_rate: u32, bits_per_sample: u16) -> Self {
        Self {
            channels,
            sample_rate,
            bytes_per_sample: bits_per_sample.div_ceil(8),
        }
    }

    /// Bytes consumed per second of playback.
    pub fn byte_rate(&self) -> u64 {
        u64::from(self.channels) * u64::from(self.sample_rate) * u64::from(self.bytes_per_sample)
    }
}

/// Plays everything `source` yields through `sink`.
///
/// The first buffer is written before the sink is started so playback does
/// not begin on an empty queue. The loop yields to other tasks once per second
/// of audio written, then waits for the sink to drain. Resolves with the
/// number of bytes played.
pub async fn play<R, S>(
    source: Stream<R>,
    sink: Stream<S>,
    format: AudioFormat,
    buf_size: usize,
) -> Result<u64>
where
    R: ReadDevice + 'static,
    S: AudioSink + 'static,
{
    if buf_size == 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "audio buffer must not be empty",
        )
        .into());
    }

    let byte_rate = format.byte_rate().max(1);
    debug!(
        "playing {} channels, {} Hz, {} bytes per sample",
        format.channels, format.sample_rate, format.bytes_per_sample
    );

    let (buf, read) = source.read(vec![0; buf_size]).await?;
    let (mut buf, mut written) = sink.write_all(buf, read).await?;
    let mut total = written as u64;
    let mut next_mark = byte_rate;

    sink.device().start()?;
    let started = Instant::now();

    while written > 0 {
        let (filled, read) = source.read(buf).await?;
        (buf, written) = sink.write_all(filled, read).await?;
        total += written as u64;

        if total > next_mark {
            debug!("played {} s", total / byte_rate);
            next_mark += byte_rate;
            yield_now().await;
        }
    }

    sink.drain().await?;
    debug!("played {} bytes in {:?}", total, started.elapsed());

    Ok(total)
}

/// Pauses `sink` on the first matching `edge` of `pin`, resumes it on the
/// next one, and so on. Runs until cancelled or until the pin fails.
pub async fn toggle_on_edge<P, S>(pin: Stream<P>, sink: Stream<S>, edge: Edge) -> Result<()>
where
    P: PinInput + 'static,
    S: AudioSink + 'static,
{
    let mut stopped = false;

    loop {
        pin.wait_edge(edge).await?;

        if stopped {
            sink.device().start()?;
            info!("resumed");
        } else {
            sink.device().stop()?;
            info!("paused");
        }
        stopped = !stopped;
    }
}

/// [`play`] with a [`toggle_on_edge`] control task alongside.
///
/// The control task is cancelled when playback ends for any reason, after
/// which the source, the pin and the sink are closed.
pub async fn play_with_control<R, S, P>(
    source: Stream<R>,
    sink: Stream<S>,
    pin: Stream<P>,
    edge: Edge,
    format: AudioFormat,
    buf_size: usize,
) -> Result<u64>
where
    R: ReadDevice + 'static,
    S: AudioSink + 'static,
    P: PinInput + 'static,
{
    let _closing = (
        CloseOnDrop(source.clone()),
        CloseOnDrop(pin.clone()),
        CloseOnDrop(sink.clone()),
    );

    let event_loop = sink.event_loop().clone();
    let _control = CancelOnDrop(event_loop.create_task(toggle_on_edge(pin, sink.clone(), edge)));

    play(source, sink, format, buf_size).await
}
