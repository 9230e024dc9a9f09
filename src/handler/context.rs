//! Call context for handlers.
//!
//! Carries the identity of the inbound Call being served and, when the
//! endpoint allows nested calls, a handle for issuing outbound calls on
//! the same connection before replying.
//!
//! # Example
//!
//! ```ignore
//! async fn on_boot(req: Value, ctx: CallContext) -> HandlerResult<Value> {
//!     if let Some(caller) = ctx.caller() {
//!         caller.call("GetConfiguration", json!({})).await?;
//!     }
//!     Ok(json!({"status": "Accepted", "currentTime": now(), "interval": 300}))
//! }
//! ```

use crate::endpoint::Endpoint;
use crate::protocol::ProtocolVersion;

/// Context passed to request handlers.
///
/// `CallContext` is `Clone` and can be moved into spawned tasks.
#[derive(Clone)]
pub struct CallContext {
    /// Unique id of the inbound Call.
    unique_id: String,
    /// Action of the inbound Call.
    action: String,
    /// Negotiated protocol version.
    version: ProtocolVersion,
    /// Endpoint handle for nested calls, if enabled.
    caller: Option<Endpoint>,
}

impl CallContext {
    /// Create a context without nested-call capability.
    pub fn new(
        unique_id: impl Into<String>,
        action: impl Into<String>,
        version: ProtocolVersion,
    ) -> Self {
        Self {
            unique_id: unique_id.into(),
            action: action.into(),
            version,
            caller: None,
        }
    }

    /// Attach an endpoint handle for nested calls.
    pub fn with_caller(mut self, caller: Endpoint) -> Self {
        self.caller = Some(caller);
        self
    }

    /// Get the unique id of the Call being served.
    #[inline]
    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    /// Get the action of the Call being served.
    #[inline]
    pub fn action(&self) -> &str {
        &self.action
    }

    /// Get the negotiated protocol version.
    #[inline]
    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    /// Endpoint for outbound calls made while serving this Call.
    ///
    /// `None` unless the endpoint was built with nested calls enabled.
    #[inline]
    pub fn caller(&self) -> Option<&Endpoint> {
        self.caller.as_ref()
    }
}

impl std::fmt::Debug for CallContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallContext")
            .field("unique_id", &self.unique_id)
            .field("action", &self.action)
            .field("version", &self.version)
            .field("nested_calls", &self.caller.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_creation() {
        let ctx = CallContext::new("42", "Heartbeat", ProtocolVersion::V16);
        assert_eq!(ctx.unique_id(), "42");
        assert_eq!(ctx.action(), "Heartbeat");
        assert_eq!(ctx.version(), ProtocolVersion::V16);
        assert!(ctx.caller().is_none());
    }

    #[test]
    fn test_context_is_clone() {
        let ctx = CallContext::new("42", "Reset", ProtocolVersion::V20);
        let ctx2 = ctx.clone();
        assert_eq!(ctx.unique_id(), ctx2.unique_id());
        assert_eq!(ctx.action(), ctx2.action());
    }
}
