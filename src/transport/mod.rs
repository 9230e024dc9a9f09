//! Transport interface consumed by the endpoint.
//!
//! A connection is a pair of text-frame halves plus the subprotocol token
//! negotiated when it was opened:
//!
//! - [`FrameSender`] sends one text frame; shared by every task that
//!   replies or calls
//! - [`FrameReceiver`] yields the next inbound frame; owned by the read
//!   loop
//!
//! Two implementations ship with the crate:
//!
//! - [`channel::pair`] - two connected in-memory endpoints
//! - [`stream::LineTransport`] - newline-delimited frames over any byte
//!   stream, e.g. a `TcpStream`
//!
//! # Example
//!
//! ```
//! # async fn demo() -> ocpp_rpc::error::Result<()> {
//! use ocpp_rpc::transport::channel;
//!
//! let (station, mut server) = channel::pair("ocpp1.6");
//! station.sender.send("[2,\"1\",\"Heartbeat\",{}]".to_string()).await?;
//! assert!(server.receiver.receive().await?.is_some());
//! # Ok(())
//! # }
//! ```

pub mod channel;
pub mod stream;

use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::handler::BoxFuture;

/// Sending half of a connection.
pub trait FrameSender: Send + Sync + 'static {
    /// Send one text frame.
    ///
    /// Fails with `ConnectionClosed` once the connection is gone.
    fn send(&self, frame: String) -> BoxFuture<'_, Result<()>>;

    /// Close the sending direction. Later sends fail.
    fn close(&self) -> BoxFuture<'_, Result<()>>;
}

/// Receiving half of a connection.
pub trait FrameReceiver: Send + 'static {
    /// Next inbound text frame, or `None` once the peer has closed.
    ///
    /// Must be cancel safe: dropping the future before it completes loses
    /// no frame.
    fn receive(&mut self) -> BoxFuture<'_, Result<Option<String>>>;
}

/// An open connection handed to [`EndpointBuilder::connect`](crate::EndpointBuilder::connect).
pub struct Connection {
    /// Negotiated subprotocol token, e.g. `ocpp1.6`.
    pub subprotocol: String,
    /// Sending half.
    pub sender: Arc<dyn FrameSender>,
    /// Receiving half.
    pub receiver: Box<dyn FrameReceiver>,
}

impl Connection {
    /// Bundle two halves with their subprotocol token.
    pub fn new(
        subprotocol: impl Into<String>,
        sender: Arc<dyn FrameSender>,
        receiver: Box<dyn FrameReceiver>,
    ) -> Self {
        Self {
            subprotocol: subprotocol.into(),
            sender,
            receiver,
        }
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("subprotocol", &self.subprotocol)
            .finish_non_exhaustive()
    }
}
