//! # ocpp-rpc
//!
//! Message correlation, action routing and payload validation for OCPP-J,
//! the JSON request/response protocol between EV charge points and central
//! systems.
//!
//! Either side of a connection can send requests and serve them. This crate
//! provides the machinery both sides share:
//!
//! - **Codec** ([`codec`]): the three wire shapes `[2, id, action, payload]`,
//!   `[3, id, payload]` and `[4, id, code, description, details]`
//! - **Catalog** ([`catalog`]): per-version payload contracts for OCPP 1.6
//!   and OCPP 2.0
//! - **Correlation** ([`correlation`]): pending outbound calls, matched to
//!   their replies or timed out
//! - **Routing** ([`handler`]): inbound Calls validated and handed to the
//!   handler registered for their action
//! - **Endpoint** ([`Endpoint`]): all of the above bound to one
//!   [`Connection`](transport::Connection)
//!
//! The WebSocket layer is not part of the crate. Anything that can send and
//! receive text frames can carry a connection; see [`transport`].
//!
//! ## Example
//!
//! ```ignore
//! use ocpp_rpc::payloads::v16::{BootNotificationRequest, RegistrationStatus};
//! use ocpp_rpc::protocol::ProtocolVersion;
//! use ocpp_rpc::transport::stream::LineTransport;
//! use ocpp_rpc::Endpoint;
//!
//! #[tokio::main]
//! async fn main() -> ocpp_rpc::error::Result<()> {
//!     let stream = tokio::net::TcpStream::connect("127.0.0.1:9000").await?;
//!     let connection = LineTransport::offer(stream, &[ProtocolVersion::V16]).await?;
//!
//!     let endpoint = Endpoint::builder()
//!         .on(ProtocolVersion::V16, "CancelReservation", |_: serde_json::Value, _ctx| async {
//!             Ok(serde_json::json!({"status": "Accepted"}))
//!         })
//!         .connect(connection)?;
//!
//!     let runner = endpoint.clone();
//!     tokio::spawn(async move { runner.run().await });
//!
//!     let reply = endpoint.send(&BootNotificationRequest::new("Optimus", "Tesla")).await?;
//!     assert_eq!(reply.status, RegistrationStatus::Accepted);
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod codec;
pub mod config;
pub mod correlation;
pub mod error;
pub mod handler;
pub mod payloads;
pub mod protocol;
pub mod transport;
pub mod writer;

mod endpoint;

pub use config::EndpointConfig;
pub use endpoint::{ConnectionState, Endpoint, EndpointBuilder};
pub use error::OcppError;
pub use handler::{CallContext, HandlerError};
pub use protocol::{ErrorCode, Message, ProtocolVersion};
pub use writer::WriterConfig;
