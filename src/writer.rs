//! Dedicated writer task for newline-delimited text frames.
//!
//! Senders never touch the stream directly: frames go through an mpsc
//! channel to a single task that owns the write half. The task drains
//! whatever is already queued and writes it with one vectored write.
//!
//! # Architecture
//!
//! ```text
//! call()    ─┐
//! replies   ─┼─► mpsc::Sender<OutboundFrame> ─► Writer Task ─► stream
//! handlers  ─┘
//! ```
//!
//! Each frame is written as its text followed by a single `\n`.

use std::io::IoSlice;

use bytes::Bytes;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::DEFAULT_CHANNEL_CAPACITY;
use crate::error::{OcppError, Result};

/// Default maximum frames written by one vectored write.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 64;

const DELIMITER: &[u8] = b"\n";

/// A frame ready to be written, without its delimiter.
#[derive(Debug, Clone)]
pub struct OutboundFrame {
    /// Frame text.
    pub payload: Bytes,
}

impl OutboundFrame {
    /// Create a frame from text.
    ///
    /// # Errors
    ///
    /// `Transport` if the text contains the frame delimiter.
    pub fn new(text: String) -> Result<Self> {
        if text.contains('\n') {
            return Err(OcppError::Transport(
                "frame text must not contain a newline".to_string(),
            ));
        }
        Ok(Self {
            payload: Bytes::from(text),
        })
    }

    /// Bytes on the wire, delimiter included.
    #[inline]
    pub fn size(&self) -> usize {
        self.payload.len() + DELIMITER.len()
    }
}

/// Configuration for the writer task.
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Frames that can be queued before senders wait.
    pub channel_capacity: usize,
    /// Maximum frames written by one vectored write.
    pub max_batch_size: usize,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
        }
    }
}

/// Handle for sending frames to the writer task.
///
/// Cheap to clone. The task stops once every handle is dropped.
#[derive(Clone)]
pub struct WriterHandle {
    tx: mpsc::Sender<OutboundFrame>,
}

impl WriterHandle {
    /// Queue a frame, waiting while the queue is full.
    ///
    /// # Errors
    ///
    /// `ConnectionClosed` if the writer task has stopped.
    pub async fn send(&self, frame: OutboundFrame) -> Result<()> {
        self.tx
            .send(frame)
            .await
            .map_err(|_| OcppError::ConnectionClosed)
    }

    /// Whether the writer task has stopped.
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Spawn the writer task and return a handle for sending frames.
///
/// The returned `JoinHandle` resolves when every handle has been dropped
/// and the queue is drained (`Ok`), or on the first write error.
pub fn spawn_writer_task<W>(
    writer: W,
    config: WriterConfig,
) -> (WriterHandle, JoinHandle<Result<()>>)
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(config.channel_capacity.max(1));
    let task = tokio::spawn(writer_loop(rx, writer, config.max_batch_size.max(1)));
    (WriterHandle { tx }, task)
}

async fn writer_loop<W>(
    mut rx: mpsc::Receiver<OutboundFrame>,
    mut writer: W,
    max_batch_size: usize,
) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut batch = Vec::with_capacity(max_batch_size);

    loop {
        let first = match rx.recv().await {
            Some(frame) => frame,
            None => {
                let _ = writer.shutdown().await;
                return Ok(());
            }
        };

        batch.clear();
        batch.push(first);
        while batch.len() < max_batch_size {
            match rx.try_recv() {
                Ok(frame) => batch.push(frame),
                Err(_) => break,
            }
        }

        if let Err(e) = write_batch(&mut writer, &batch).await {
            tracing::error!(error = %e, frames = batch.len(), "writer task failed");
            return Err(e);
        }
        tracing::trace!(frames = batch.len(), "wrote batch");
    }
}

/// Write a batch with as few vectored writes as the stream allows.
async fn write_batch<W>(writer: &mut W, batch: &[OutboundFrame]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let total_size: usize = batch.iter().map(OutboundFrame::size).sum();
    let mut total_written = 0;

    while total_written < total_size {
        let slices = build_remaining_slices(batch, total_written);
        let written = writer.write_vectored(&slices).await?;
        if written == 0 {
            return Err(OcppError::Io(std::io::Error::new(
                std::io::ErrorKind::WriteZero,
                "write_vectored returned 0",
            )));
        }
        total_written += written;
    }

    writer.flush().await?;
    Ok(())
}

/// Slices for the part of `batch` after the first `skip_bytes` bytes.
fn build_remaining_slices(batch: &[OutboundFrame], skip_bytes: usize) -> Vec<IoSlice<'_>> {
    let mut slices = Vec::with_capacity(batch.len() * 2);
    let mut offset = 0;

    for frame in batch {
        for part in [&frame.payload[..], DELIMITER] {
            let end = offset + part.len();
            if skip_bytes < end && !part.is_empty() {
                let start = skip_bytes.saturating_sub(offset);
                slices.push(IoSlice::new(&part[start..]));
            }
            offset = end;
        }
    }

    slices
}
