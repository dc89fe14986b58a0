//! One-directional copy between two streams.

use crate::error::Result;
use crate::reactor::device::{ReadDevice, WriteDevice};
use crate::reactor::stream::Stream;

use log::trace;
use std::cell::Cell;
use std::io;

/// Copies from `src` to `dst` until `src` reaches end of stream.
///
/// Reads up to `buf_size` bytes at a time and writes exactly the bytes read
/// before reading again. A zero-byte read ends the copy without a further
/// write. Resolves with the number of bytes copied.
pub async fn stream_copy<W, R>(dst: Stream<W>, src: Stream<R>, buf_size: usize) -> Result<u64>
where
    W: WriteDevice + 'static,
    R: ReadDevice + 'static,
{
    let copied = Cell::new(0);
    copy_counted(&dst, &src, buf_size, &copied).await?;
    Ok(copied.get())
}

/// Like [`stream_copy`], but publishes progress in `copied` as it goes, so the
/// count survives the computation being dropped midway.
pub(crate) async fn copy_counted<W, R>(
    dst: &Stream<W>,
    src: &Stream<R>,
    buf_size: usize,
    copied: &Cell<u64>,
) -> Result<()>
where
    W: WriteDevice + 'static,
    R: ReadDevice + 'static,
{
    if buf_size == 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "copy buffer must not be empty",
        )
        .into());
    }

    let mut buf = vec![0; buf_size];

    loop {
        let (filled, n) = src.read(buf).await?;
        if n == 0 {
            trace!("copy finished after {} bytes", copied.get());
            return Ok(());
        }

        let (drained, _) = dst.write_all(filled, n).await?;
        copied.set(copied.get() + n as u64);
        buf = drained;
    }
}
