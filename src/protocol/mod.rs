//! Protocol module - OCPP-J message model.
//!
//! This module holds the types that travel over the wire:
//! - [`Message`] - the Call / CallResult / CallError envelope
//! - [`ErrorCode`] - OCPP-J error codes carried by CallError
//! - [`ProtocolVersion`] - the negotiated OCPP version
//!
//! Encoding and decoding live in [`crate::codec`].

mod error_code;
mod message;
mod version;

pub use error_code::{CustomCode, ErrorCode};
pub use message::{message_type, Message, MAX_UNIQUE_ID_LEN};
pub use version::ProtocolVersion;
