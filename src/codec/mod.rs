//! Codec module - text encoding of OCPP-J messages.
//!
//! - [`MessageCodec`] - JSON array form of [`Message`](crate::protocol::Message)
//!
//! # Design
//!
//! The codec is a marker struct with static methods rather than a trait
//! object; transports only ever see `String` frames.
//!
//! # Example
//!
//! ```
//! use ocpp_rpc::codec::MessageCodec;
//! use ocpp_rpc::protocol::Message;
//! use serde_json::json;
//!
//! let msg = Message::call("19223201", "Heartbeat", json!({}));
//! let text = MessageCodec::encode(&msg).unwrap();
//! assert_eq!(text, r#"[2,"19223201","Heartbeat",{}]"#);
//! assert_eq!(MessageCodec::decode(&text).unwrap(), msg);
//! ```

mod json;

pub use json::MessageCodec;
