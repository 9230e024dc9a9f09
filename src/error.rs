//! Error types for ocpp-rpc.

use serde_json::Value;
use thiserror::Error;

use crate::catalog::FieldViolation;
use crate::protocol::{ErrorCode, ProtocolVersion};

/// Main error type for all endpoint operations.
#[derive(Debug, Error)]
pub enum OcppError {
    /// I/O error on the underlying stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Inbound text does not match any of the three message shapes.
    ///
    /// Connection fatal when raised by the read loop.
    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    /// A CallResult or CallError arrived for an id with no pending call.
    #[error("Unknown correlation id: {0}")]
    UnknownCorrelationId(String),

    /// An outbound call did not settle before its deadline.
    #[error("Call {unique_id} ({action}) timed out")]
    Timeout {
        /// Action of the call.
        action: String,
        /// Correlation id of the call.
        unique_id: String,
    },

    /// The peer answered an outbound call with a CallError.
    #[error("Peer returned {code}: {description}")]
    ErrorResponse {
        /// Error code sent by the peer.
        code: ErrorCode,
        /// Free-form description sent by the peer.
        description: String,
        /// Error details object sent by the peer.
        details: Value,
    },

    /// Connection closed before the operation completed.
    #[error("Connection closed")]
    ConnectionClosed,

    /// Two handlers were registered for the same action and version.
    #[error("Handler for {action} already registered for {version}")]
    DuplicateHandler {
        /// Action name.
        action: String,
        /// Protocol version.
        version: ProtocolVersion,
    },

    /// The negotiated subprotocol does not name a supported version.
    #[error("Unsupported subprotocol: {0}")]
    UnsupportedSubprotocol(String),

    /// Outbound payload failed catalog validation; nothing was sent.
    #[error("Invalid payload for {action}: {} violation(s)", violations.len())]
    InvalidPayload {
        /// Action name.
        action: String,
        /// Every violation found.
        violations: Vec<FieldViolation>,
    },

    /// Outbound action is not in the catalog of the negotiated version.
    #[error("Action {action} is not defined for {version}")]
    UnknownAction {
        /// Action name.
        action: String,
        /// Protocol version.
        version: ProtocolVersion,
    },

    /// `run` was called while another read loop owns the connection.
    #[error("Read loop already running")]
    AlreadyRunning,

    /// Transport-specific failure.
    #[error("Transport error: {0}")]
    Transport(String),
}

impl OcppError {
    /// Whether this error ends the connection when raised by the read loop.
    pub fn is_connection_fatal(&self) -> bool {
        matches!(
            self,
            OcppError::MalformedMessage(_)
                | OcppError::ConnectionClosed
                | OcppError::Io(_)
                | OcppError::Transport(_)
        )
    }
}

/// Result type alias using OcppError.
pub type Result<T> = std::result::Result<T, OcppError>;
