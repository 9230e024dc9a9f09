//! Newline-delimited frames over a byte stream.
//!
//! Each OCPP-J message travels as one line of compact JSON. Reads go
//! through a buffered line reader owned by the read loop; writes go through
//! the dedicated writer task (see [`crate::writer`]).
//!
//! The optional handshake mirrors subprotocol negotiation: the connecting
//! side sends one line listing the tokens it offers, comma separated, and
//! the accepting side answers with one line naming the token it picked (an
//! empty line if none is acceptable).
//!
//! # Example
//!
//! ```no_run
//! # async fn demo() -> ocpp_rpc::error::Result<()> {
//! use ocpp_rpc::protocol::ProtocolVersion;
//! use ocpp_rpc::transport::stream::LineTransport;
//! use tokio::net::TcpStream;
//!
//! let stream = TcpStream::connect("127.0.0.1:9000").await?;
//! let connection = LineTransport::offer(stream, &[ProtocolVersion::V16]).await?;
//! assert_eq!(connection.subprotocol, "ocpp1.6");
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::io::{
    AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, Lines, ReadHalf, WriteHalf,
};

use super::{Connection, FrameReceiver, FrameSender};
use crate::error::{OcppError, Result};
use crate::handler::BoxFuture;
use crate::protocol::ProtocolVersion;
use crate::writer::{spawn_writer_task, OutboundFrame, WriterConfig, WriterHandle};

/// Constructors for line-framed connections.
pub struct LineTransport;

impl LineTransport {
    /// Wrap a stream whose subprotocol is already agreed.
    pub fn new<S>(stream: S, subprotocol: &str) -> Connection
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        Self::with_config(stream, subprotocol, WriterConfig::default())
    }

    /// Like [`new`](Self::new), with explicit writer settings.
    pub fn with_config<S>(stream: S, subprotocol: &str, config: WriterConfig) -> Connection
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (read_half, write_half) = tokio::io::split(stream);
        assemble(BufReader::new(read_half), write_half, subprotocol, config)
    }

    /// Connecting side of the handshake: offer `versions` in order of
    /// preference and wait for the peer's pick.
    ///
    /// # Errors
    ///
    /// `UnsupportedSubprotocol` if the peer accepts none of them or answers
    /// with a token that was not offered, `ConnectionClosed` if it hangs up.
    pub async fn offer<S>(stream: S, versions: &[ProtocolVersion]) -> Result<Connection>
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (read_half, mut write_half) = tokio::io::split(stream);
        let mut reader = BufReader::new(read_half);

        let offered = versions
            .iter()
            .map(|v| v.subprotocol())
            .collect::<Vec<_>>()
            .join(",");
        write_half.write_all(offered.as_bytes()).await?;
        write_half.write_all(b"\n").await?;
        write_half.flush().await?;

        let mut answer = String::new();
        if reader.read_line(&mut answer).await? == 0 {
            return Err(OcppError::ConnectionClosed);
        }
        let chosen = answer.trim();

        match ProtocolVersion::from_subprotocol(chosen) {
            Some(version) if versions.contains(&version) => {
                tracing::debug!(%version, "subprotocol accepted by peer");
                Ok(assemble(
                    reader,
                    write_half,
                    version.subprotocol(),
                    WriterConfig::default(),
                ))
            }
            _ => Err(OcppError::UnsupportedSubprotocol(if chosen.is_empty() {
                offered
            } else {
                chosen.to_string()
            })),
        }
    }

    /// Accepting side of the handshake: pick the first offered token found
    /// in `supported` and confirm it to the peer.
    ///
    /// # Errors
    ///
    /// `UnsupportedSubprotocol` (after answering with an empty line) if no
    /// offered token is supported, `ConnectionClosed` if the peer hangs up.
    pub async fn accept<S>(stream: S, supported: &[ProtocolVersion]) -> Result<Connection>
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (read_half, mut write_half) = tokio::io::split(stream);
        let mut reader = BufReader::new(read_half);

        let mut offer = String::new();
        if reader.read_line(&mut offer).await? == 0 {
            return Err(OcppError::ConnectionClosed);
        }

        let chosen = offer
            .trim()
            .split(',')
            .filter_map(ProtocolVersion::from_subprotocol)
            .find(|v| supported.contains(v));

        let answer = chosen.map(ProtocolVersion::subprotocol).unwrap_or_default();
        write_half.write_all(answer.as_bytes()).await?;
        write_half.write_all(b"\n").await?;
        write_half.flush().await?;

        match chosen {
            Some(version) => {
                tracing::debug!(%version, "subprotocol negotiated");
                Ok(assemble(
                    reader,
                    write_half,
                    version.subprotocol(),
                    WriterConfig::default(),
                ))
            }
            None => Err(OcppError::UnsupportedSubprotocol(offer.trim().to_string())),
        }
    }
}

fn assemble<S>(
    reader: BufReader<ReadHalf<S>>,
    writer: WriteHalf<S>,
    subprotocol: &str,
    config: WriterConfig,
) -> Connection
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (handle, _task) = spawn_writer_task(writer, config);
    Connection::new(
        subprotocol,
        Arc::new(LineSender {
            writer: Mutex::new(Some(handle)),
        }),
        Box::new(LineReceiver {
            lines: reader.lines(),
        }),
    )
}

/// Sending half of a line-framed connection.
pub struct LineSender {
    writer: Mutex<Option<WriterHandle>>,
}

impl FrameSender for LineSender {
    fn send(&self, frame: String) -> BoxFuture<'_, Result<()>> {
        let writer = self.writer.lock().clone();
        Box::pin(async move {
            let writer = writer.ok_or(OcppError::ConnectionClosed)?;
            writer.send(OutboundFrame::new(frame)?).await
        })
    }

    fn close(&self) -> BoxFuture<'_, Result<()>> {
        // The writer task flushes what is queued and shuts the stream down
        // once the last handle is gone.
        self.writer.lock().take();
        Box::pin(async { Ok(()) })
    }
}

/// Receiving half of a line-framed connection.
pub struct LineReceiver<S> {
    lines: Lines<BufReader<ReadHalf<S>>>,
}

impl<S> FrameReceiver for LineReceiver<S>
where
    S: AsyncRead + Send + 'static,
{
    fn receive(&mut self) -> BoxFuture<'_, Result<Option<String>>> {
        Box::pin(async move {
            loop {
                match self.lines.next_line().await? {
                    Some(line) if line.trim().is_empty() => continue,
                    other => return Ok(other),
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{duplex, AsyncReadExt};

    #[tokio::test]
    async fn test_send_writes_line() {
        let (local, mut remote) = duplex(4096);
        let connection = LineTransport::new(local, "ocpp1.6");

        connection
            .sender
            .send("[2,\"1\",\"Heartbeat\",{}]".to_string())
            .await
            .unwrap();
        connection.sender.close().await.unwrap();

        let mut out = String::new();
        remote.read_to_string(&mut out).await.unwrap();
        assert_eq!(out, "[2,\"1\",\"Heartbeat\",{}]\n");
    }

    #[tokio::test]
    async fn test_receive_splits_lines() {
        let (local, mut remote) = duplex(4096);
        let mut connection = LineTransport::new(local, "ocpp1.6");

        remote
            .write_all(b"[3,\"1\",{}]\r\n\n[3,\"2\",{}]\n")
            .await
            .unwrap();
        drop(remote);

        let receiver = &mut connection.receiver;
        assert_eq!(receiver.receive().await.unwrap().as_deref(), Some("[3,\"1\",{}]"));
        assert_eq!(receiver.receive().await.unwrap().as_deref(), Some("[3,\"2\",{}]"));
        assert_eq!(receiver.receive().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_send_rejects_embedded_newline() {
        let (local, _remote) = duplex(4096);
        let connection = LineTransport::new(local, "ocpp1.6");
        let result = connection.sender.send("a\nb".to_string()).await;
        assert!(matches!(result, Err(OcppError::Transport(_))));
    }

    #[tokio::test]
    async fn test_send_after_close() {
        let (local, _remote) = duplex(4096);
        let connection = LineTransport::new(local, "ocpp1.6");
        connection.sender.close().await.unwrap();
        let result = connection.sender.send("[3,\"1\",{}]".to_string()).await;
        assert!(matches!(result, Err(OcppError::ConnectionClosed)));
    }

    #[tokio::test]
    async fn test_handshake_picks_first_supported() {
        let (a, b) = duplex(4096);
        let (offered, accepted) = tokio::join!(
            LineTransport::offer(a, &[ProtocolVersion::V20, ProtocolVersion::V16]),
            LineTransport::accept(b, &[ProtocolVersion::V16]),
        );

        assert_eq!(offered.unwrap().subprotocol, "ocpp1.6");
        assert_eq!(accepted.unwrap().subprotocol, "ocpp1.6");
    }

    #[tokio::test]
    async fn test_handshake_without_common_version() {
        let (a, b) = duplex(4096);
        let (offered, accepted) = tokio::join!(
            LineTransport::offer(a, &[ProtocolVersion::V20]),
            LineTransport::accept(b, &[ProtocolVersion::V16]),
        );

        assert!(matches!(offered, Err(OcppError::UnsupportedSubprotocol(_))));
        match accepted {
            Err(OcppError::UnsupportedSubprotocol(token)) => assert_eq!(token, "ocpp2.0"),
            other => panic!("unexpected {:?}", other.map(|c| c.subprotocol)),
        }
    }

    #[tokio::test]
    async fn test_frames_after_handshake() {
        let (a, b) = duplex(4096);
        let (offered, accepted) = tokio::join!(
            LineTransport::offer(a, &[ProtocolVersion::V16]),
            LineTransport::accept(b, &[ProtocolVersion::V16, ProtocolVersion::V20]),
        );
        let station = offered.unwrap();
        let mut server = accepted.unwrap();

        station
            .sender
            .send("[2,\"7\",\"Heartbeat\",{}]".to_string())
            .await
            .unwrap();
        assert_eq!(
            server.receiver.receive().await.unwrap().as_deref(),
            Some("[2,\"7\",\"Heartbeat\",{}]")
        );
    }
}
