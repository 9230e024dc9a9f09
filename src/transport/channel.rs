//! In-memory connection pair.
//!
//! Frames sent on one side arrive, in order, on the other. Closing a
//! sender (or dropping it) makes the other side's receiver return `None`
//! once the queued frames are drained.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::{Connection, FrameReceiver, FrameSender};
use crate::config::DEFAULT_CHANNEL_CAPACITY;
use crate::error::{OcppError, Result};
use crate::handler::BoxFuture;

/// Two connected in-memory connections sharing `subprotocol`.
pub fn pair(subprotocol: &str) -> (Connection, Connection) {
    pair_with_capacity(subprotocol, DEFAULT_CHANNEL_CAPACITY)
}

/// Like [`pair`], with `capacity` frames buffered per direction.
pub fn pair_with_capacity(subprotocol: &str, capacity: usize) -> (Connection, Connection) {
    let (a_tx, a_rx) = mpsc::channel(capacity.max(1));
    let (b_tx, b_rx) = mpsc::channel(capacity.max(1));

    let a = Connection::new(
        subprotocol,
        Arc::new(ChannelSender::new(a_tx)),
        Box::new(ChannelReceiver { rx: b_rx }),
    );
    let b = Connection::new(
        subprotocol,
        Arc::new(ChannelSender::new(b_tx)),
        Box::new(ChannelReceiver { rx: a_rx }),
    );
    (a, b)
}

/// Sending half of an in-memory connection.
pub struct ChannelSender {
    tx: Mutex<Option<mpsc::Sender<String>>>,
}

impl ChannelSender {
    fn new(tx: mpsc::Sender<String>) -> Self {
        Self {
            tx: Mutex::new(Some(tx)),
        }
    }
}

impl FrameSender for ChannelSender {
    fn send(&self, frame: String) -> BoxFuture<'_, Result<()>> {
        let tx = self.tx.lock().clone();
        Box::pin(async move {
            let tx = tx.ok_or(OcppError::ConnectionClosed)?;
            tx.send(frame).await.map_err(|_| OcppError::ConnectionClosed)
        })
    }

    fn close(&self) -> BoxFuture<'_, Result<()>> {
        self.tx.lock().take();
        Box::pin(async { Ok(()) })
    }
}

/// Receiving half of an in-memory connection.
pub struct ChannelReceiver {
    rx: mpsc::Receiver<String>,
}

impl FrameReceiver for ChannelReceiver {
    fn receive(&mut self) -> BoxFuture<'_, Result<Option<String>>> {
        Box::pin(async move { Ok(self.rx.recv().await) })
    }
}
