//! Negotiated protocol version.

use std::fmt;
use std::str::FromStr;

use crate::error::OcppError;

/// OCPP version selected by the connection's subprotocol token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProtocolVersion {
    /// OCPP 1.6 (`ocpp1.6`).
    V16,
    /// OCPP 2.0 (`ocpp2.0`).
    V20,
}

impl ProtocolVersion {
    /// Every supported version, oldest first.
    pub const ALL: [ProtocolVersion; 2] = [ProtocolVersion::V16, ProtocolVersion::V20];

    /// The WebSocket subprotocol token for this version.
    pub fn subprotocol(self) -> &'static str {
        match self {
            ProtocolVersion::V16 => "ocpp1.6",
            ProtocolVersion::V20 => "ocpp2.0",
        }
    }

    /// Select a version from a negotiated subprotocol token.
    pub fn from_subprotocol(token: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|v| v.subprotocol().eq_ignore_ascii_case(token.trim()))
    }
}

impl FromStr for ProtocolVersion {
    type Err = OcppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_subprotocol(s).ok_or_else(|| OcppError::UnsupportedSubprotocol(s.to_string()))
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.subprotocol())
    }
}
