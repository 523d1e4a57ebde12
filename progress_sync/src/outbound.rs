//! Bounded per-session outbound queue and its writer task.
//!
//! Every frame a session receives, broadcasts and control replies alike, goes
//! through one queue, so frames reach the client in the order they were queued.

use crate::error::{Error, ErrorKind};
use futures::SinkExt;
use log::*;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWrite;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::codec::{FramedWrite, LinesCodec};
use tokio_util::sync::CancellationToken;
use wire::common::{ErrorCode, ErrorPayload};
use wire::progress::ProgressKind;

/// Sending side of a session's outbound queue.
///
/// Cloning is cheap; all clones feed the same writer task. `closed` is the
/// session's own cancellation token: cancelling it stops the writer and the
/// session's read loop.
#[derive(Debug, Clone)]
pub struct Outbound {
    tx: mpsc::Sender<Arc<str>>,
    closed: CancellationToken,
}

impl Outbound {
    pub fn new(tx: mpsc::Sender<Arc<str>>, closed: CancellationToken) -> Self {
        Self { tx, closed }
    }

    /// Queues an encoded frame without waiting.
    ///
    /// A full queue marks the session as a slow consumer and closes it.
    pub fn enqueue(&self, frame: Arc<str>) -> Result<(), Error> {
        if self.closed.is_cancelled() {
            return Err(Error::closed());
        }

        self.tx.try_send(frame).map_err(|e| {
            let err = Error::from(e);
            if err.error_kind == ErrorKind::QueueFull {
                self.closed.cancel();
            }
            err
        })
    }

    pub fn send<T: Serialize>(&self, kind: ProgressKind, data: &T) -> Result<(), Error> {
        let frame = wire::encode(kind, data)?;
        self.enqueue(frame.into())
    }

    pub fn send_error(&self, code: ErrorCode, message: impl Into<String>) -> Result<(), Error> {
        self.send(ProgressKind::Error, &ErrorPayload::new(code, message))
    }

    pub fn close(&self) {
        self.closed.cancel();
    }
}

/// Spawns the writer task for a session and returns the queue feeding it.
///
/// The writer exits when `closed` is cancelled, when a write fails or exceeds
/// `write_timeout`, or once every [`Outbound`] clone is dropped and the queue
/// has been drained.
pub fn spawn_writer<W>(
    writer: W,
    capacity: usize,
    write_timeout: Duration,
    closed: CancellationToken,
) -> (Outbound, JoinHandle<()>)
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(capacity);
    let sink = FramedWrite::new(writer, LinesCodec::new());
    let handle = tokio::spawn(write_pump(sink, rx, closed.clone(), write_timeout));

    (Outbound::new(tx, closed), handle)
}

async fn write_pump<W>(
    mut sink: FramedWrite<W, LinesCodec>,
    mut rx: mpsc::Receiver<Arc<str>>,
    closed: CancellationToken,
    write_timeout: Duration,
) where
    W: AsyncWrite + Unpin,
{
    loop {
        let frame = tokio::select! {
            biased;
            _ = closed.cancelled() => break,
            frame = rx.recv() => match frame {
                Some(frame) => frame,
                None => break,
            },
        };

        match timeout(write_timeout, sink.send(frame)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                debug!("Write failed, closing session: {e}");
                closed.cancel();
                break;
            }
            Err(_) => {
                warn!("Write exceeded {write_timeout:?}, evicting session");
                closed.cancel();
                break;
            }
        }
    }

    let _ = timeout(write_timeout, SinkExt::<Arc<str>>::close(&mut sink)).await;
}
