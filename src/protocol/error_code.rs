//! OCPP-J CallError codes.

use std::fmt;
use std::str::FromStr;

/// Error code carried in a CallError.
///
/// Codes a peer sends that are not part of the standard set are kept
/// verbatim in [`ErrorCode::Other`]. A [`CustomCode`] can only be built by
/// parsing, so `Other` never holds a standard name and every code has one
/// representation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Action is not known by the receiver.
    NotImplemented,
    /// Action is recognized but not supported by the receiver.
    NotSupported,
    /// An internal error kept the receiver from processing the action.
    InternalError,
    /// Payload for the action is incomplete.
    ProtocolError,
    /// A security issue kept the receiver from completing the action.
    SecurityError,
    /// Payload is syntactically incorrect or does not conform to the schema.
    ///
    /// OCPP 2.0 spells this `FormatViolation`; both decode to this variant.
    FormationViolation,
    /// A field contains an invalid value.
    PropertyConstraintViolation,
    /// A field violates occurrence constraints.
    OccurenceConstraintViolation,
    /// A field violates its data type constraint.
    TypeConstraintViolation,
    /// Any other error.
    GenericError,
    /// A code outside the standard set.
    Other(CustomCode),
}

/// Error code text outside the standard set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CustomCode(String);

impl CustomCode {
    /// Code text as sent on the wire.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CustomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl ErrorCode {
    /// Code for arbitrary text; standard names map to their own variant.
    ///
    /// ```
    /// use ocpp_rpc::protocol::ErrorCode;
    ///
    /// assert_eq!(ErrorCode::other("NotImplemented"), ErrorCode::NotImplemented);
    /// assert_eq!(ErrorCode::other("VendorCode").as_str(), "VendorCode");
    /// ```
    pub fn other(code: impl Into<String>) -> Self {
        let code = code.into();
        match code.parse() {
            Ok(ErrorCode::Other(_)) => ErrorCode::Other(CustomCode(code)),
            Ok(standard) => standard,
            Err(never) => match never {},
        }
    }

    /// Wire representation of this code.
    pub fn as_str(&self) -> &str {
        match self {
            ErrorCode::NotImplemented => "NotImplemented",
            ErrorCode::NotSupported => "NotSupported",
            ErrorCode::InternalError => "InternalError",
            ErrorCode::ProtocolError => "ProtocolError",
            ErrorCode::SecurityError => "SecurityError",
            ErrorCode::FormationViolation => "FormationViolation",
            ErrorCode::PropertyConstraintViolation => "PropertyConstraintViolation",
            ErrorCode::OccurenceConstraintViolation => "OccurenceConstraintViolation",
            ErrorCode::TypeConstraintViolation => "TypeConstraintViolation",
            ErrorCode::GenericError => "GenericError",
            ErrorCode::Other(code) => code.as_str(),
        }
    }
}

impl FromStr for ErrorCode {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "NotImplemented" => ErrorCode::NotImplemented,
            "NotSupported" => ErrorCode::NotSupported,
            "InternalError" => ErrorCode::InternalError,
            "ProtocolError" => ErrorCode::ProtocolError,
            "SecurityError" => ErrorCode::SecurityError,
            "FormationViolation" | "FormatViolation" => ErrorCode::FormationViolation,
            "PropertyConstraintViolation" => ErrorCode::PropertyConstraintViolation,
            "OccurenceConstraintViolation" | "OccurrenceConstraintViolation" => {
                ErrorCode::OccurenceConstraintViolation
            }
            "TypeConstraintViolation" => ErrorCode::TypeConstraintViolation,
            "GenericError" => ErrorCode::GenericError,
            other => ErrorCode::Other(CustomCode(other.to_string())),
        })
    }
}

impl From<&str> for ErrorCode {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(code) => code,
            Err(never) => match never {},
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
