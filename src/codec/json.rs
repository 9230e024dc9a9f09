//! JSON codec for the OCPP-J envelope.
//!
//! Shape checks only: payload contents are validated later against the
//! [`PayloadCatalog`](crate::catalog::PayloadCatalog).

use serde_json::Value;

use crate::error::{OcppError, Result};
use crate::protocol::{message_type, ErrorCode, Message, MAX_UNIQUE_ID_LEN};

/// Encoder/decoder for OCPP-J text frames.
pub struct MessageCodec;

impl MessageCodec {
    /// Encode a message to its wire text.
    ///
    /// # Errors
    ///
    /// Returns `MalformedMessage` if the message is internally
    /// inconsistent (empty unique id or action, non-object error details).
    pub fn encode(message: &Message) -> Result<String> {
        if message.unique_id().is_empty() {
            return Err(malformed("unique id is empty"));
        }

        let frame = match message {
            Message::Call {
                unique_id,
                action,
                payload,
            } => {
                if action.is_empty() {
                    return Err(malformed("action is empty"));
                }
                Value::Array(vec![
                    Value::from(message_type::CALL),
                    Value::String(unique_id.clone()),
                    Value::String(action.clone()),
                    payload.clone(),
                ])
            }
            Message::CallResult { unique_id, payload } => Value::Array(vec![
                Value::from(message_type::CALL_RESULT),
                Value::String(unique_id.clone()),
                payload.clone(),
            ]),
            Message::CallError {
                unique_id,
                error_code,
                error_description,
                error_details,
            } => {
                if !error_details.is_object() {
                    return Err(malformed("error details must be an object"));
                }
                Value::Array(vec![
                    Value::from(message_type::CALL_ERROR),
                    Value::String(unique_id.clone()),
                    Value::String(error_code.as_str().to_string()),
                    Value::String(error_description.clone()),
                    error_details.clone(),
                ])
            }
        };

        Ok(serde_json::to_string(&frame)?)
    }

    /// Decode wire text to a message.
    ///
    /// # Errors
    ///
    /// Returns `MalformedMessage` if the text is not one of the three
    /// known shapes.
    pub fn decode(text: &str) -> Result<Message> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| malformed(format!("invalid JSON: {}", e)))?;

        let items = match value {
            Value::Array(items) => items,
            _ => return Err(malformed("frame is not a JSON array")),
        };

        let type_id = items
            .first()
            .and_then(Value::as_u64)
            .ok_or_else(|| malformed("missing message type id"))?;

        let expected_len = match type_id {
            message_type::CALL => 4,
            message_type::CALL_RESULT => 3,
            message_type::CALL_ERROR => 5,
            other => return Err(malformed(format!("unknown message type id {}", other))),
        };

        let unique_id = match items.get(1) {
            Some(Value::String(id)) if !id.is_empty() => id.clone(),
            Some(_) => return Err(malformed("unique id is not a non-empty string")),
            None => return Err(malformed("missing unique id")),
        };

        if items.len() != expected_len {
            return Err(malformed(format!(
                "message type {} expects {} elements, got {}",
                type_id,
                expected_len,
                items.len()
            )));
        }

        if unique_id.len() > MAX_UNIQUE_ID_LEN {
            tracing::warn!(unique_id = %unique_id, "unique id exceeds {} characters", MAX_UNIQUE_ID_LEN);
        }

        let mut rest = items.into_iter().skip(2);
        let mut next = || rest.next().unwrap_or(Value::Null);

        match type_id {
            message_type::CALL => {
                let action = match next() {
                    Value::String(action) if !action.is_empty() => action,
                    _ => return Err(malformed("action is not a non-empty string")),
                };
                Ok(Message::Call {
                    unique_id,
                    action,
                    payload: next(),
                })
            }
            message_type::CALL_RESULT => Ok(Message::CallResult {
                unique_id,
                payload: next(),
            }),
            _ => {
                let error_code = match next() {
                    Value::String(code) => ErrorCode::from(code.as_str()),
                    _ => return Err(malformed("error code is not a string")),
                };
                let error_description = match next() {
                    Value::String(desc) => desc,
                    _ => return Err(malformed("error description is not a string")),
                };
                let error_details = next();
                if !error_details.is_object() {
                    return Err(malformed("error details are not an object"));
                }
                Ok(Message::CallError {
                    unique_id,
                    error_code,
                    error_description,
                    error_details,
                })
            }
        }
    }
}

fn malformed(reason: impl Into<String>) -> OcppError {
    OcppError::MalformedMessage(reason.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_encode_call() {
        let msg = Message::call(
            "19223201",
            "BootNotification",
            json!({"chargePointVendor": "VendorX", "chargePointModel": "SingleSocketCharger"}),
        );
        let text = MessageCodec::encode(&msg).unwrap();
        assert_eq!(
            text,
            r#"[2,"19223201","BootNotification",{"chargePointModel":"SingleSocketCharger","chargePointVendor":"VendorX"}]"#
        );
    }

    #[test]
    fn test_encode_call_result() {
        let msg = Message::call_result("19223201", json!({"currentTime": "T"}));
        assert_eq!(
            MessageCodec::encode(&msg).unwrap(),
            r#"[3,"19223201",{"currentTime":"T"}]"#
        );
    }

    #[test]
    fn test_encode_call_error() {
        let msg = Message::call_error(
            "162376037",
            ErrorCode::NotSupported,
            "SetDisplayMessageRequest not implemented",
            None,
        );
        assert_eq!(
            MessageCodec::encode(&msg).unwrap(),
            r#"[4,"162376037","NotSupported","SetDisplayMessageRequest not implemented",{}]"#
        );
    }

    #[test]
    fn test_encode_rejects_inconsistent() {
        let empty_id = Message::call("", "Heartbeat", json!({}));
        assert!(matches!(
            MessageCodec::encode(&empty_id),
            Err(OcppError::MalformedMessage(_))
        ));

        let empty_action = Message::call("1", "", json!({}));
        assert!(matches!(
            MessageCodec::encode(&empty_action),
            Err(OcppError::MalformedMessage(_))
        ));

        let bad_details = Message::CallError {
            unique_id: "1".into(),
            error_code: ErrorCode::GenericError,
            error_description: String::new(),
            error_details: json!([1, 2]),
        };
        assert!(matches!(
            MessageCodec::encode(&bad_details),
            Err(OcppError::MalformedMessage(_))
        ));
    }

    #[test]
    fn test_decode_each_kind() {
        let call = MessageCodec::decode(r#"[2, "19223201", "Heartbeat", {}]"#).unwrap();
        assert_eq!(call, Message::call("19223201", "Heartbeat", json!({})));

        let result =
            MessageCodec::decode(r#"[3, "19223201", {"currentTime": "2013-02-01T20:53:32.486Z"}]"#)
                .unwrap();
        assert_eq!(
            result,
            Message::call_result("19223201", json!({"currentTime": "2013-02-01T20:53:32.486Z"}))
        );

        let error =
            MessageCodec::decode(r#"[4, "19223201", "FormatViolation", "bad", {"field": "x"}]"#)
                .unwrap();
        assert_eq!(
            error,
            Message::call_error(
                "19223201",
                ErrorCode::FormationViolation,
                "bad",
                Some(json!({"field": "x"}))
            )
        );
    }

    #[test]
    fn test_decode_keeps_non_object_payload() {
        // Payload shape is the catalog's concern, not the codec's.
        let msg = MessageCodec::decode(r#"[2, "1", "Heartbeat", null]"#).unwrap();
        assert_eq!(msg, Message::call("1", "Heartbeat", Value::Null));
    }

    #[test]
    fn test_decode_malformed() {
        let cases = [
            "not json",
            r#"{"id": "1"}"#,
            "[]",
            r#"["2", "1", "Heartbeat", {}]"#,
            r#"[5, "1", {}]"#,
            r#"[2, 1, "Heartbeat", {}]"#,
            r#"[2, "", "Heartbeat", {}]"#,
            r#"[2]"#,
            r#"[2, "1", {}]"#,
            r#"[2, "1", 7, {}]"#,
            r#"[2, "1", "Heartbeat"]"#,
            r#"[3, "1"]"#,
            r#"[3, "1", {}, {}]"#,
            r#"[4, "1", "GenericError", "x"]"#,
            r#"[4, "1", 500, "x", {}]"#,
            r#"[4, "1", "GenericError", null, {}]"#,
            r#"[4, "1", "GenericError", "x", "details"]"#,
        ];

        for case in cases {
            assert!(
                matches!(MessageCodec::decode(case), Err(OcppError::MalformedMessage(_))),
                "expected MalformedMessage for {}",
                case
            );
        }
    }

    #[test]
    fn test_round_trip() {
        let messages = [
            Message::call("a", "Authorize", json!({"idTag": "ABC", "nested": {"list": [1, 2.5]}})),
            Message::call_result("b", json!({})),
            Message::call_error(
                "c",
                ErrorCode::other("VendorCode"),
                "",
                Some(json!({"k": null})),
            ),
            Message::call_error("d", ErrorCode::other("FormatViolation"), "bad", None),
        ];

        for msg in messages {
            let text = MessageCodec::encode(&msg).unwrap();
            assert_eq!(MessageCodec::decode(&text).unwrap(), msg);
        }
    }
}
