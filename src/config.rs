//! Endpoint configuration.
//!
//! Every knob has a named default. Configure through
//! [`EndpointBuilder`](crate::EndpointBuilder) setters or by passing a whole
//! [`EndpointConfig`].
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use ocpp_rpc::config::{EndpointConfig, DEFAULT_CALL_TIMEOUT};
//!
//! let config = EndpointConfig::default();
//! assert_eq!(config.call_timeout, DEFAULT_CALL_TIMEOUT);
//!
//! let config = EndpointConfig {
//!     call_timeout: Duration::from_secs(5),
//!     ..EndpointConfig::default()
//! };
//! assert_eq!(config.call_timeout, Duration::from_secs(5));
//! ```

use std::time::Duration;

use crate::catalog::UnknownFieldPolicy;

/// Default time an outbound call waits for its reply.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Default period of the read loop's timeout sweep.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// Shortest sweep period; smaller values are raised to this.
pub const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(1);

/// Default maximum concurrently running handler tasks.
pub const DEFAULT_MAX_CONCURRENT_HANDLERS: usize = 256;

/// Default capacity of outbound frame queues in the bundled transports.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Per-endpoint settings.
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    /// How long `call` waits before failing with `Timeout`.
    pub call_timeout: Duration,
    /// How often the read loop expires overdue calls.
    pub sweep_interval: Duration,
    /// Cap on concurrently running handler tasks when `nested_calls` is on.
    pub max_concurrent_handlers: usize,
    /// What to do with payload fields the catalog does not declare.
    pub unknown_fields: UnknownFieldPolicy,
    /// Validate outbound Call payloads before sending.
    pub validate_outbound: bool,
    /// Validate inbound CallResult payloads against the response schema.
    pub validate_responses: bool,
    /// Dispatch each inbound Call on its own task so handlers can issue
    /// outbound calls through [`CallContext::caller`](crate::handler::CallContext::caller).
    pub nested_calls: bool,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            call_timeout: DEFAULT_CALL_TIMEOUT,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            max_concurrent_handlers: DEFAULT_MAX_CONCURRENT_HANDLERS,
            unknown_fields: UnknownFieldPolicy::Strict,
            validate_outbound: false,
            validate_responses: false,
            nested_calls: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EndpointConfig::default();
        assert_eq!(config.call_timeout, Duration::from_secs(30));
        assert_eq!(config.sweep_interval, Duration::from_secs(1));
        assert_eq!(config.max_concurrent_handlers, 256);
        assert_eq!(config.unknown_fields, UnknownFieldPolicy::Strict);
        assert!(!config.validate_outbound);
        assert!(!config.validate_responses);
        assert!(!config.nested_calls);
    }
}
