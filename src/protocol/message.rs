//! The OCPP-J message envelope.
//!
//! Every frame on the wire is a JSON array whose first element selects
//! the message kind:
//!
//! ```text
//! [2, "<uniqueId>", "<action>", {payload}]                        Call
//! [3, "<uniqueId>", {payload}]                                    CallResult
//! [4, "<uniqueId>", "<errorCode>", "<description>", {details}]    CallError
//! ```

use serde_json::{Map, Value};

use super::ErrorCode;

/// Maximum unique id length allowed by OCPP-J.
pub const MAX_UNIQUE_ID_LEN: usize = 36;

/// Message type ids (first element of every frame).
pub mod message_type {
    /// Request.
    pub const CALL: u64 = 2;
    /// Successful reply.
    pub const CALL_RESULT: u64 = 3;
    /// Failed reply.
    pub const CALL_ERROR: u64 = 4;
}

/// One decoded OCPP-J message.
///
/// The variant decides which fields exist: only `Call` has an action,
/// only `CallError` has error fields.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// A request.
    Call {
        /// Correlation id chosen by the sender.
        unique_id: String,
        /// Action name, e.g. `BootNotification`.
        action: String,
        /// Request payload (a JSON object).
        payload: Value,
    },
    /// A successful reply to a Call.
    CallResult {
        /// Correlation id of the originating Call.
        unique_id: String,
        /// Response payload (a JSON object).
        payload: Value,
    },
    /// A failed reply to a Call.
    CallError {
        /// Correlation id of the originating Call.
        unique_id: String,
        /// Error code.
        error_code: ErrorCode,
        /// Free-form description, may be empty.
        error_description: String,
        /// Error details (a JSON object, `{}` when there are none).
        error_details: Value,
    },
}

impl Message {
    /// Build a Call.
    pub fn call(unique_id: impl Into<String>, action: impl Into<String>, payload: Value) -> Self {
        Message::Call {
            unique_id: unique_id.into(),
            action: action.into(),
            payload,
        }
    }

    /// Build a CallResult.
    pub fn call_result(unique_id: impl Into<String>, payload: Value) -> Self {
        Message::CallResult {
            unique_id: unique_id.into(),
            payload,
        }
    }

    /// Build a CallError.
    ///
    /// `details` of `None` becomes an empty object.
    pub fn call_error(
        unique_id: impl Into<String>,
        error_code: ErrorCode,
        error_description: impl Into<String>,
        details: Option<Value>,
    ) -> Self {
        Message::CallError {
            unique_id: unique_id.into(),
            error_code,
            error_description: error_description.into(),
            error_details: details.unwrap_or_else(|| Value::Object(Map::new())),
        }
    }

    /// Get the correlation id.
    #[inline]
    pub fn unique_id(&self) -> &str {
        match self {
            Message::Call { unique_id, .. }
            | Message::CallResult { unique_id, .. }
            | Message::CallError { unique_id, .. } => unique_id,
        }
    }

    /// Get the wire type id.
    #[inline]
    pub fn type_id(&self) -> u64 {
        match self {
            Message::Call { .. } => message_type::CALL,
            Message::CallResult { .. } => message_type::CALL_RESULT,
            Message::CallError { .. } => message_type::CALL_ERROR,
        }
    }

    /// Get the action (Call only).
    #[inline]
    pub fn action(&self) -> Option<&str> {
        match self {
            Message::Call { action, .. } => Some(action),
            _ => None,
        }
    }

    /// Whether this message is a reply (CallResult or CallError).
    #[inline]
    pub fn is_response(&self) -> bool {
        !matches!(self, Message::Call { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_accessors() {
        let call = Message::call("19223201", "Heartbeat", json!({}));
        assert_eq!(call.unique_id(), "19223201");
        assert_eq!(call.action(), Some("Heartbeat"));
        assert_eq!(call.type_id(), message_type::CALL);
        assert!(!call.is_response());

        let result = Message::call_result("19223201", json!({"currentTime": "T"}));
        assert_eq!(result.action(), None);
        assert_eq!(result.type_id(), message_type::CALL_RESULT);
        assert!(result.is_response());
    }

    #[test]
    fn test_call_error_defaults_details() {
        let err = Message::call_error("1", ErrorCode::InternalError, "boom", None);
        match err {
            Message::CallError { error_details, .. } => assert_eq!(error_details, json!({})),
            other => panic!("unexpected {:?}", other),
        }
    }
}
