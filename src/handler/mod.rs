//! Handler module - inbound request routing and dispatch.
//!
//! Provides:
//! - [`ActionRouter`] - maps (version, action) to handlers and turns each
//!   inbound Call into the reply to send
//! - [`CallContext`] - what a handler knows about the Call it serves
//! - [`HandlerError`] - how a handler reports failure
//!
//! # Example
//!
//! ```
//! use ocpp_rpc::catalog::UnknownFieldPolicy;
//! use ocpp_rpc::handler::{ActionRouter, CallContext};
//! use ocpp_rpc::protocol::ProtocolVersion;
//! use serde_json::{json, Value};
//!
//! let mut router = ActionRouter::new(UnknownFieldPolicy::Strict);
//!
//! router
//!     .register("Heartbeat", ProtocolVersion::V16, |_: Value, _ctx: CallContext| async {
//!         Ok(json!({"currentTime": "2024-01-01T00:00:00Z"}))
//!     })
//!     .unwrap();
//!
//! assert!(router.contains("Heartbeat", ProtocolVersion::V16));
//! ```

mod context;
mod router;

pub use context::CallContext;
pub use router::{ActionRouter, BoxFuture, Handler, HandlerError, HandlerResult, TypedHandler};
