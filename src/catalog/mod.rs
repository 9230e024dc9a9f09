//! Payload catalog - per-version payload contracts.
//!
//! Each supported [`ProtocolVersion`] has one immutable [`PayloadCatalog`]
//! mapping action names to request and response [`PayloadSchema`]s. The
//! catalogs are built once per process on first use and shared by every
//! endpoint without locking.
//!
//! Schemas declare field names in snake_case; wire keys are normalised
//! with [`camel_to_snake`] before matching, so `reservationId` and
//! `reservation_id` name the same field.
//!
//! # Example
//!
//! ```
//! use ocpp_rpc::catalog::{PayloadCatalog, UnknownFieldPolicy};
//! use ocpp_rpc::protocol::ProtocolVersion;
//! use serde_json::json;
//!
//! let catalog = PayloadCatalog::for_version(ProtocolVersion::V16);
//! let schema = catalog.request("CancelReservation").unwrap();
//!
//! assert!(schema.validate(&json!({"reservationId": 1}), UnknownFieldPolicy::Strict).is_ok());
//!
//! let violations = schema.validate(&json!({}), UnknownFieldPolicy::Strict).unwrap_err();
//! assert_eq!(violations[0].field, "reservation_id");
//! ```

mod keys;
mod v16;
mod v20;

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use once_cell::sync::Lazy;
use serde_json::{json, Value};

use crate::error::{OcppError, Result};
use crate::protocol::{ErrorCode, ProtocolVersion};

pub use keys::camel_to_snake;

/// JSON type a field must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// Integral number.
    Integer,
    /// Any number (decimal or integral).
    Number,
    /// String (also used for enumerations and date-times).
    String,
    /// `true` / `false`.
    Boolean,
    /// Nested object; its contents are not checked.
    Object,
    /// Array; its elements are not checked.
    Array,
    /// Any JSON value.
    Any,
}

impl FieldType {
    /// Whether `value` satisfies this type.
    pub fn matches(self, value: &Value) -> bool {
        match self {
            FieldType::Integer => value.is_i64() || value.is_u64(),
            FieldType::Number => value.is_number(),
            FieldType::String => value.is_string(),
            FieldType::Boolean => value.is_boolean(),
            FieldType::Object => value.is_object(),
            FieldType::Array => value.is_array(),
            FieldType::Any => true,
        }
    }

    /// Lowercase name used in violation reports.
    pub fn name(self) -> &'static str {
        match self {
            FieldType::Integer => "integer",
            FieldType::Number => "number",
            FieldType::String => "string",
            FieldType::Boolean => "boolean",
            FieldType::Object => "object",
            FieldType::Array => "array",
            FieldType::Any => "any",
        }
    }
}

/// Name of the JSON type of `value`, for violation reports.
fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// One declared field of a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// snake_case field name.
    pub name: &'static str,
    /// Whether the field must be present.
    pub required: bool,
    /// Declared type.
    pub ty: FieldType,
}

/// Declare a required field.
pub const fn required(name: &'static str, ty: FieldType) -> FieldSpec {
    FieldSpec {
        name,
        required: true,
        ty,
    }
}

/// Declare an optional field.
pub const fn optional(name: &'static str, ty: FieldType) -> FieldSpec {
    FieldSpec {
        name,
        required: false,
        ty,
    }
}

/// What to do with payload keys the schema does not declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownFieldPolicy {
    /// Reject unknown fields with a FormationViolation.
    #[default]
    Strict,
    /// Ignore unknown fields.
    Lenient,
}

/// Whether a schema describes the request or the response of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Payload of a Call.
    Request,
    /// Payload of the CallResult answering it.
    Response,
}

/// Why a field failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationKind {
    /// Required field absent (or `null`).
    Missing,
    /// Field present with the wrong JSON type.
    WrongType {
        /// Declared type.
        expected: FieldType,
        /// JSON type found.
        found: &'static str,
    },
    /// Field not declared by the schema (strict policy only).
    Unexpected,
    /// Two wire keys normalise to the same field name.
    Duplicate,
    /// The payload itself is not a JSON object.
    NotAnObject {
        /// JSON type found.
        found: &'static str,
    },
}

/// A single validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    /// snake_case name of the offending field (`payload` for
    /// [`ViolationKind::NotAnObject`]).
    pub field: String,
    /// What went wrong.
    pub kind: ViolationKind,
}

impl FieldViolation {
    fn new(field: impl Into<String>, kind: ViolationKind) -> Self {
        Self {
            field: field.into(),
            kind,
        }
    }

    /// CallError code reporting this violation.
    pub fn error_code(&self) -> ErrorCode {
        match self.kind {
            ViolationKind::WrongType { .. } => ErrorCode::TypeConstraintViolation,
            _ => ErrorCode::FormationViolation,
        }
    }

    /// Human-readable reason, without the field name.
    pub fn reason(&self) -> String {
        match &self.kind {
            ViolationKind::Missing => "required field is missing".to_string(),
            ViolationKind::WrongType { expected, found } => {
                format!("expected {}, found {}", expected.name(), found)
            }
            ViolationKind::Unexpected => "field is not allowed".to_string(),
            ViolationKind::Duplicate => "field appears more than once".to_string(),
            ViolationKind::NotAnObject { found } => {
                format!("payload must be an object, found {}", found)
            }
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason())
    }
}

/// Build the `error_details` object for a list of violations.
///
/// `field` names the first violation; `violations` lists all of them.
pub fn violation_details(violations: &[FieldViolation]) -> Value {
    let list: Vec<Value> = violations
        .iter()
        .map(|v| json!({"field": v.field, "reason": v.reason()}))
        .collect();
    json!({
        "field": violations.first().map(|v| v.field.as_str()).unwrap_or_default(),
        "violations": list,
    })
}

/// Contract for one action's payload in one direction.
#[derive(Debug, Clone, Copy)]
pub struct PayloadSchema {
    /// Action name.
    pub action: &'static str,
    /// Declared fields, in declaration order.
    pub fields: &'static [FieldSpec],
}

impl PayloadSchema {
    /// Look up a declared field by snake_case name.
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Validate a payload against this schema.
    ///
    /// Violations are reported in a stable order: declared fields
    /// (missing or wrongly typed) in declaration order, then undeclared
    /// fields sorted by name, then duplicates.
    pub fn validate(
        &self,
        payload: &Value,
        policy: UnknownFieldPolicy,
    ) -> std::result::Result<(), Vec<FieldViolation>> {
        let object = match payload.as_object() {
            Some(object) => object,
            None => {
                return Err(vec![FieldViolation::new(
                    "payload",
                    ViolationKind::NotAnObject {
                        found: json_type_name(payload),
                    },
                )])
            }
        };

        let mut present: BTreeMap<String, &Value> = BTreeMap::new();
        let mut duplicates = Vec::new();
        for (key, value) in object {
            let name = camel_to_snake(key).into_owned();
            if present.contains_key(&name) {
                duplicates.push(FieldViolation::new(name, ViolationKind::Duplicate));
            } else {
                present.insert(name, value);
            }
        }

        let mut violations = Vec::new();
        for spec in self.fields {
            match present.get(spec.name) {
                None | Some(Value::Null) => {
                    if spec.required {
                        violations.push(FieldViolation::new(spec.name, ViolationKind::Missing));
                    }
                }
                Some(value) if !spec.ty.matches(value) => {
                    violations.push(FieldViolation::new(
                        spec.name,
                        ViolationKind::WrongType {
                            expected: spec.ty,
                            found: json_type_name(value),
                        },
                    ));
                }
                Some(_) => {}
            }
        }

        if policy == UnknownFieldPolicy::Strict {
            for name in present.keys() {
                if self.field(name).is_none() {
                    violations.push(FieldViolation::new(name.clone(), ViolationKind::Unexpected));
                }
            }
        }

        violations.extend(duplicates);

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

type SchemaTable = &'static [(&'static str, &'static [FieldSpec])];

/// Immutable action-to-schema registry for one protocol version.
#[derive(Debug)]
pub struct PayloadCatalog {
    version: ProtocolVersion,
    requests: HashMap<&'static str, PayloadSchema>,
    responses: HashMap<&'static str, PayloadSchema>,
}

static V16_CATALOG: Lazy<PayloadCatalog> =
    Lazy::new(|| PayloadCatalog::build(ProtocolVersion::V16, v16::REQUESTS, v16::RESPONSES));

static V20_CATALOG: Lazy<PayloadCatalog> =
    Lazy::new(|| PayloadCatalog::build(ProtocolVersion::V20, v20::REQUESTS, &[]));

impl PayloadCatalog {
    /// Get the process-wide catalog for a version.
    pub fn for_version(version: ProtocolVersion) -> &'static PayloadCatalog {
        match version {
            ProtocolVersion::V16 => &V16_CATALOG,
            ProtocolVersion::V20 => &V20_CATALOG,
        }
    }

    fn build(version: ProtocolVersion, requests: SchemaTable, responses: SchemaTable) -> Self {
        let index = |table: SchemaTable| {
            table
                .iter()
                .map(|&(action, fields)| (action, PayloadSchema { action, fields }))
                .collect::<HashMap<_, _>>()
        };

        Self {
            version,
            requests: index(requests),
            responses: index(responses),
        }
    }

    /// Version this catalog describes.
    #[inline]
    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    /// Request schema for an action.
    pub fn request(&self, action: &str) -> Option<&PayloadSchema> {
        self.requests.get(action)
    }

    /// Response schema for an action, if the catalog carries one.
    pub fn response(&self, action: &str) -> Option<&PayloadSchema> {
        self.responses.get(action)
    }

    /// Schema for an action in the given direction.
    pub fn schema(&self, action: &str, direction: Direction) -> Option<&PayloadSchema> {
        match direction {
            Direction::Request => self.request(action),
            Direction::Response => self.response(action),
        }
    }

    /// All actions with a request schema, sorted by name.
    pub fn actions(&self) -> Vec<&'static str> {
        let mut actions: Vec<_> = self.requests.keys().copied().collect();
        actions.sort_unstable();
        actions
    }

    /// Validate a payload for an action.
    ///
    /// # Errors
    ///
    /// `UnknownAction` if the catalog has no schema for the action in that
    /// direction, `InvalidPayload` listing every violation otherwise.
    pub fn validate(
        &self,
        action: &str,
        direction: Direction,
        payload: &Value,
        policy: UnknownFieldPolicy,
    ) -> Result<()> {
        let schema = self
            .schema(action, direction)
            .ok_or_else(|| OcppError::UnknownAction {
                action: action.to_string(),
                version: self.version,
            })?;

        schema
            .validate(payload, policy)
            .map_err(|violations| OcppError::InvalidPayload {
                action: action.to_string(),
                violations,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const STRICT: UnknownFieldPolicy = UnknownFieldPolicy::Strict;

    fn v16() -> &'static PayloadCatalog {
        PayloadCatalog::for_version(ProtocolVersion::V16)
    }

    fn v20() -> &'static PayloadCatalog {
        PayloadCatalog::for_version(ProtocolVersion::V20)
    }

    #[test]
    fn test_catalog_sizes() {
        assert_eq!(v16().actions().len(), 28);
        assert_eq!(v16().responses.len(), 28);
        assert_eq!(v20().actions().len(), 67);
        assert_eq!(v16().version(), ProtocolVersion::V16);
        assert_eq!(v20().version(), ProtocolVersion::V20);
    }

    #[test]
    fn test_field_names_unique_and_snake_case() {
        for catalog in [v16(), v20()] {
            for schema in catalog.requests.values().chain(catalog.responses.values()) {
                let mut seen = HashSet::new();
                for field in schema.fields {
                    assert!(
                        seen.insert(field.name),
                        "{} declares {} twice",
                        schema.action,
                        field.name
                    );
                    assert_eq!(camel_to_snake(field.name), field.name);
                }
            }
        }
    }

    #[test]
    fn test_every_v16_request_has_response() {
        for action in v16().actions() {
            assert!(v16().response(action).is_some(), "no response for {}", action);
        }
    }

    #[test]
    fn test_cancel_reservation() {
        for catalog in [v16(), v20()] {
            let schema = catalog.request("CancelReservation").unwrap();
            assert!(schema.validate(&json!({"reservation_id": 1}), STRICT).is_ok());

            let violations = schema.validate(&json!({}), STRICT).unwrap_err();
            assert_eq!(violations.len(), 1);
            assert_eq!(violations[0].field, "reservation_id");
            assert_eq!(violations[0].kind, ViolationKind::Missing);
            assert_eq!(violations[0].error_code(), ErrorCode::FormationViolation);
        }
    }

    #[test]
    fn test_removing_each_required_field() {
        let payload = json!({
            "connectorId": 1,
            "idTag": "04E91C5A123484",
            "meterStart": 0,
            "timestamp": "2024-01-01T00:00:00Z",
            "reservationId": 7,
        });
        let schema = v16().request("StartTransaction").unwrap();
        assert!(schema.validate(&payload, STRICT).is_ok());

        for (key, field) in [
            ("connectorId", "connector_id"),
            ("idTag", "id_tag"),
            ("meterStart", "meter_start"),
            ("timestamp", "timestamp"),
        ] {
            let mut reduced = payload.clone();
            reduced.as_object_mut().unwrap().remove(key);
            let violations = schema.validate(&reduced, STRICT).unwrap_err();
            assert_eq!(violations.len(), 1);
            assert_eq!(violations[0].field, field);
            assert_eq!(violations[0].error_code(), ErrorCode::FormationViolation);
        }

        // Optional field may go.
        let mut reduced = payload.clone();
        reduced.as_object_mut().unwrap().remove("reservationId");
        assert!(schema.validate(&reduced, STRICT).is_ok());
    }

    #[test]
    fn test_wrong_type() {
        let schema = v16().request("CancelReservation").unwrap();
        let violations = schema
            .validate(&json!({"reservationId": "1"}), STRICT)
            .unwrap_err();
        assert_eq!(
            violations[0].kind,
            ViolationKind::WrongType {
                expected: FieldType::Integer,
                found: "string"
            }
        );
        assert_eq!(violations[0].error_code(), ErrorCode::TypeConstraintViolation);

        let violations = schema
            .validate(&json!({"reservationId": 1.5}), STRICT)
            .unwrap_err();
        assert_eq!(violations[0].error_code(), ErrorCode::TypeConstraintViolation);
    }

    #[test]
    fn test_unknown_field_policy() {
        let schema = v16().request("Heartbeat").unwrap();
        let payload = json!({"vendorExtra": true});

        let violations = schema.validate(&payload, STRICT).unwrap_err();
        assert_eq!(violations[0].field, "vendor_extra");
        assert_eq!(violations[0].kind, ViolationKind::Unexpected);

        assert!(schema
            .validate(&payload, UnknownFieldPolicy::Lenient)
            .is_ok());
    }

    #[test]
    fn test_null_optional_is_absent() {
        let schema = v16().request("DataTransfer").unwrap();
        assert!(schema
            .validate(&json!({"vendorId": "Acme", "messageId": null}), STRICT)
            .is_ok());

        let violations = schema.validate(&json!({"vendorId": null}), STRICT).unwrap_err();
        assert_eq!(violations[0].kind, ViolationKind::Missing);
    }

    #[test]
    fn test_duplicate_after_normalisation() {
        let schema = v16().request("CancelReservation").unwrap();
        let violations = schema
            .validate(&json!({"reservationId": 1, "reservation_id": 2}), STRICT)
            .unwrap_err();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::Duplicate);
    }

    #[test]
    fn test_payload_not_object() {
        let schema = v16().request("Heartbeat").unwrap();
        let violations = schema.validate(&json!([1]), STRICT).unwrap_err();
        assert_eq!(violations[0].field, "payload");
        assert_eq!(
            violations[0].kind,
            ViolationKind::NotAnObject { found: "array" }
        );
    }

    #[test]
    fn test_violation_order_and_details() {
        let schema = v16().request("StatusNotification").unwrap();
        let violations = schema
            .validate(&json!({"connectorId": "two", "zzz": 1, "aaa": 2}), STRICT)
            .unwrap_err();
        let fields: Vec<_> = violations.iter().map(|v| v.field.as_str()).collect();
        assert_eq!(fields, ["connector_id", "error_code", "status", "aaa", "zzz"]);

        let details = violation_details(&violations);
        assert_eq!(details["field"], "connector_id");
        assert_eq!(details["violations"].as_array().unwrap().len(), 5);
        assert_eq!(details["violations"][1]["reason"], "required field is missing");
    }

    #[test]
    fn test_catalog_validate_errors() {
        let err = v16()
            .validate("NoSuchAction", Direction::Request, &json!({}), STRICT)
            .unwrap_err();
        assert!(matches!(err, OcppError::UnknownAction { .. }));

        let err = v16()
            .validate("Authorize", Direction::Request, &json!({}), STRICT)
            .unwrap_err();
        match err {
            OcppError::InvalidPayload { action, violations } => {
                assert_eq!(action, "Authorize");
                assert_eq!(violations[0].field, "id_tag");
            }
            other => panic!("unexpected {:?}", other),
        }

        assert!(v16()
            .validate(
                "BootNotification",
                Direction::Response,
                &json!({"currentTime": "T", "interval": 10, "status": "Accepted"}),
                STRICT
            )
            .is_ok());
    }

    #[test]
    fn test_v20_iso15118_fields() {
        let schema = v20().request("Get15118EVCertificate").unwrap();
        assert!(schema
            .validate(
                &json!({"iso15118SchemaVersion": "urn:iso:15118:2:2013:MsgDef", "exiRequest": "AAA="}),
                STRICT
            )
            .is_ok());
    }

    #[test]
    fn test_v20_has_no_response_schemas() {
        assert!(v20().response("Heartbeat").is_none());
        assert!(v20().request("Heartbeat").is_some());
    }
}
