//! Bidirectional bridges.
//!
//! [`duplex`] runs one copy task per direction and tears both down as soon
//! as either side finishes. [`serve_bridge`] builds on it to expose a local
//! device (typically a serial port) to one network client at a time.

use crate::error::{Error, Result};
use crate::pipeline::copy::copy_counted;
use crate::reactor::device::{AcceptDevice, ReadDevice, WriteDevice};
use crate::reactor::stream::{CloseOnDrop, Stream};
use crate::task::{CancelOnDrop, Task};

use log::{debug, info};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Bytes moved in each direction by a [`duplex`] bridge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DuplexStats {
    pub a_to_b: u64,
    pub b_to_a: u64,
}

/// Copies `a` to `b` and `b` to `a` concurrently until either direction
/// reaches end of stream or fails.
///
/// Whichever direction finishes first cancels the other. Resolves with the
/// byte counts of both directions, or with the first failure that was not a
/// cancellation. Dropping the computation cancels both directions.
pub async fn duplex<A, B>(a: Stream<A>, b: Stream<B>, buf_size: usize) -> Result<DuplexStats>
where
    A: ReadDevice + WriteDevice + 'static,
    B: ReadDevice + WriteDevice + 'static,
{
    let event_loop = a.event_loop().clone();
    let a_to_b = Rc::new(Cell::new(0));
    let b_to_a = Rc::new(Cell::new(0));
    let failure: Rc<RefCell<Option<Error>>> = Rc::new(RefCell::new(None));

    let forward = CancelOnDrop(event_loop.create_task(direction(
        b.clone(),
        a.clone(),
        buf_size,
        a_to_b.clone(),
        failure.clone(),
    )));
    let backward = CancelOnDrop(event_loop.create_task(direction(
        a,
        b,
        buf_size,
        b_to_a.clone(),
        failure.clone(),
    )));

    cancel_sibling_on_done(&forward, &backward);
    cancel_sibling_on_done(&backward, &forward);

    // Outcomes are in `failure`; a cancelled sibling is expected here.
    let _ = forward.0.clone().await;
    let _ = backward.0.clone().await;

    if let Some(error) = failure.borrow_mut().take() {
        return Err(error);
    }

    Ok(DuplexStats {
        a_to_b: a_to_b.get(),
        b_to_a: b_to_a.get(),
    })
}

async fn direction<W, R>(
    dst: Stream<W>,
    src: Stream<R>,
    buf_size: usize,
    copied: Rc<Cell<u64>>,
    failure: Rc<RefCell<Option<Error>>>,
) -> Result<()>
where
    W: WriteDevice + 'static,
    R: ReadDevice + 'static,
{
    let outcome = copy_counted(&dst, &src, buf_size, &copied).await;

    if let Err(error) = &outcome {
        failure.borrow_mut().get_or_insert_with(|| error.clone());
    }

    outcome
}

fn cancel_sibling_on_done(task: &Task<()>, sibling: &Task<()>) {
    let sibling = sibling.clone();
    task.add_done_callback(move |_| {
        sibling.cancel();
    });
}

/// Serves `device` to network clients accepted on `listener`, one at a time.
///
/// Every accepted connection is bridged to `device` with [`duplex`]. A new
/// client replaces the current one: the previous session is cancelled and its
/// connection closed before the new session starts. Only returns if accepting
/// fails; the listener is closed on the way out.
pub async fn serve_bridge<L, D>(
    listener: Stream<L>,
    device: Stream<D>,
    buf_size: usize,
) -> Result<()>
where
    L: AcceptDevice + 'static,
    L::Connection: ReadDevice + WriteDevice + 'static,
    D: ReadDevice + WriteDevice + 'static,
{
    let event_loop = listener.event_loop().clone();
    let listener = CloseOnDrop(listener);
    let mut session: Option<CancelOnDrop<DuplexStats>> = None;

    info!("listening");

    loop {
        let (connection, peer) = listener.accept().await?;

        if let Some(previous) = session.take() {
            debug!("session {} replaced by {}", previous.id(), peer);
        }

        info!("connected {}", peer);
        let connection = Stream::new(&event_loop, connection)?;
        let device = device.clone();

        session = Some(CancelOnDrop(event_loop.create_task(async move {
            let connection = CloseOnDrop(connection);
            let outcome = duplex(connection.0.clone(), device, buf_size).await;

            match &outcome {
                Ok(stats) => info!(
                    "closed {} ({} bytes in, {} bytes out)",
                    peer, stats.a_to_b, stats.b_to_a
                ),
                Err(error) => info!("closed {}: {}", peer, error),
            }

            outcome
        })));
    }
}
