//! Typed payload records.
//!
//! Records are plain serde structs whose wire keys are camelCase. They
//! carry shape only; the catalog still decides what a valid payload is.
//! [`Endpoint::send`](crate::Endpoint::send) uses [`OcppRequest`] to find
//! the action name and the response record for a request.
//!
//! # Example
//!
//! ```
//! use ocpp_rpc::payloads::{v16, OcppRequest};
//!
//! let request = v16::BootNotificationRequest::new("Optimus", "Tesla");
//! assert_eq!(v16::BootNotificationRequest::ACTION, "BootNotification");
//!
//! let wire = serde_json::to_value(&request).unwrap();
//! assert_eq!(wire["chargePointVendor"], "Tesla");
//! ```

pub mod v16;

use serde::de::DeserializeOwned;
use serde::Serialize;

/// A request record bound to its action and response record.
pub trait OcppRequest: Serialize + Send + Sync {
    /// Action name on the wire.
    const ACTION: &'static str;

    /// Record the peer answers with.
    type Response: DeserializeOwned + Send;
}
