//! Action router for inbound Calls.
//!
//! The router maps `(version, action)` to a handler and turns every
//! inbound Call into exactly one reply:
//!
//! 1. no request schema in the catalog → `NotImplemented`
//! 2. no handler registered → `NotImplemented`
//! 3. payload fails validation → `FormationViolation` /
//!    `TypeConstraintViolation` naming the offending field
//! 4. handler returns `Ok` → CallResult; `HandlerError::Call` → CallError
//!    with the handler's code; `HandlerError::Internal` or a panic →
//!    `InternalError`
//!
//! Nothing a handler does escapes the router.

use std::collections::HashMap;
use std::future::Future;
use std::marker::PhantomData;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;

use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

use super::CallContext;
use crate::catalog::{violation_details, PayloadCatalog, UnknownFieldPolicy};
use crate::error::{OcppError, Result};
use crate::protocol::{ErrorCode, Message, ProtocolVersion};

/// Failure reported by a handler.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// A recognized domain error, sent to the peer with this code.
    #[error("{code}: {description}")]
    Call {
        /// Error code for the CallError.
        code: ErrorCode,
        /// Description for the CallError.
        description: String,
        /// Details object for the CallError.
        details: Option<Value>,
    },

    /// An unexpected failure, sent to the peer as `InternalError`.
    #[error("handler failed: {0}")]
    Internal(String),
}

impl HandlerError {
    /// Domain error with the given code.
    pub fn new(code: ErrorCode, description: impl Into<String>) -> Self {
        HandlerError::Call {
            code,
            description: description.into(),
            details: None,
        }
    }

    /// Attach a details object (domain errors only).
    pub fn with_details(self, details: Value) -> Self {
        match self {
            HandlerError::Call {
                code, description, ..
            } => HandlerError::Call {
                code,
                description,
                details: Some(details),
            },
            other => other,
        }
    }

    /// Unexpected failure.
    pub fn internal(message: impl Into<String>) -> Self {
        HandlerError::Internal(message.into())
    }
}

impl From<OcppError> for HandlerError {
    fn from(err: OcppError) -> Self {
        HandlerError::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(err: serde_json::Error) -> Self {
        HandlerError::Internal(err.to_string())
    }
}

/// Result type for handler functions.
pub type HandlerResult<T = Value> = std::result::Result<T, HandlerError>;

/// Boxed future for handler results.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Trait for handler functions.
pub trait Handler: Send + Sync + 'static {
    /// Handle a validated request payload.
    fn call(&self, payload: Value, ctx: CallContext) -> BoxFuture<'static, HandlerResult>;
}

/// Wrapper that deserializes the payload into a record before calling the
/// handler and serializes the record it returns.
pub struct TypedHandler<F, T, R, Fut>
where
    F: Fn(T, CallContext) -> Fut + Send + Sync + 'static,
    T: DeserializeOwned + Send + 'static,
    R: Serialize + Send + 'static,
    Fut: Future<Output = HandlerResult<R>> + Send + 'static,
{
    handler: F,
    _phantom: PhantomData<fn(T) -> Fut>,
}

impl<F, T, R, Fut> TypedHandler<F, T, R, Fut>
where
    F: Fn(T, CallContext) -> Fut + Send + Sync + 'static,
    T: DeserializeOwned + Send + 'static,
    R: Serialize + Send + 'static,
    Fut: Future<Output = HandlerResult<R>> + Send + 'static,
{
    /// Create a new typed handler.
    pub fn new(handler: F) -> Self {
        Self {
            handler,
            _phantom: PhantomData,
        }
    }
}

impl<F, T, R, Fut> Handler for TypedHandler<F, T, R, Fut>
where
    F: Fn(T, CallContext) -> Fut + Send + Sync + 'static,
    T: DeserializeOwned + Send + 'static,
    R: Serialize + Send + 'static,
    Fut: Future<Output = HandlerResult<R>> + Send + 'static,
{
    fn call(&self, payload: Value, ctx: CallContext) -> BoxFuture<'static, HandlerResult> {
        let parsed: T = match serde_json::from_value(payload) {
            Ok(v) => v,
            Err(e) => {
                let err = HandlerError::new(ErrorCode::TypeConstraintViolation, e.to_string());
                return Box::pin(async move { Err(err) });
            }
        };

        let fut = (self.handler)(parsed, ctx);
        Box::pin(async move {
            let reply = fut.await?;
            Ok(serde_json::to_value(reply)?)
        })
    }
}

/// Router mapping `(version, action)` to handlers.
///
/// Built once before the connection starts; read-only afterwards.
pub struct ActionRouter {
    /// Handlers by version and action.
    routes: HashMap<(ProtocolVersion, String), Box<dyn Handler>>,
    /// Policy for undeclared payload fields.
    policy: UnknownFieldPolicy,
}

impl ActionRouter {
    /// Create an empty router.
    pub fn new(policy: UnknownFieldPolicy) -> Self {
        Self {
            routes: HashMap::new(),
            policy,
        }
    }

    /// Policy applied to undeclared payload fields.
    #[inline]
    pub fn policy(&self) -> UnknownFieldPolicy {
        self.policy
    }

    /// Change the policy for undeclared payload fields.
    pub fn set_policy(&mut self, policy: UnknownFieldPolicy) {
        self.policy = policy;
    }

    /// Register a handler for one action of one version.
    ///
    /// # Errors
    ///
    /// `DuplicateHandler` if a handler is already bound to the pair.
    pub fn register<F, T, R, Fut>(
        &mut self,
        action: &str,
        version: ProtocolVersion,
        handler: F,
    ) -> Result<()>
    where
        F: Fn(T, CallContext) -> Fut + Send + Sync + 'static,
        T: DeserializeOwned + Send + 'static,
        R: Serialize + Send + 'static,
        Fut: Future<Output = HandlerResult<R>> + Send + 'static,
    {
        self.register_boxed(action, version, Box::new(TypedHandler::new(handler)))
    }

    /// Register an already boxed handler.
    ///
    /// # Errors
    ///
    /// `DuplicateHandler` if a handler is already bound to the pair.
    pub fn register_boxed(
        &mut self,
        action: &str,
        version: ProtocolVersion,
        handler: Box<dyn Handler>,
    ) -> Result<()> {
        let key = (version, action.to_string());
        if self.routes.contains_key(&key) {
            return Err(OcppError::DuplicateHandler {
                action: action.to_string(),
                version,
            });
        }

        if PayloadCatalog::for_version(version).request(action).is_none() {
            tracing::warn!(action, %version, "handler registered for action missing from the catalog");
        }

        self.routes.insert(key, handler);
        Ok(())
    }

    /// Whether a handler is bound to the pair.
    pub fn contains(&self, action: &str, version: ProtocolVersion) -> bool {
        self.routes.contains_key(&(version, action.to_string()))
    }

    /// Actions with a handler for `version`, sorted by name.
    pub fn actions(&self, version: ProtocolVersion) -> Vec<&str> {
        let mut actions: Vec<&str> = self
            .routes
            .keys()
            .filter(|(v, _)| *v == version)
            .map(|(_, action)| action.as_str())
            .collect();
        actions.sort_unstable();
        actions
    }

    /// Number of registered handlers across all versions.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether no handler is registered.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Turn an inbound Call into the reply to send.
    ///
    /// Never fails: every outcome, including a panicking handler, becomes
    /// a CallResult or CallError carrying the Call's unique id.
    pub async fn dispatch(&self, ctx: CallContext, payload: Value) -> Message {
        let unique_id = ctx.unique_id().to_string();
        let action = ctx.action().to_string();
        let version = ctx.version();

        let schema = match PayloadCatalog::for_version(version).request(&action) {
            Some(schema) => schema,
            None => {
                tracing::debug!(unique_id = %unique_id, action = %action, %version, "action not in catalog");
                return Message::call_error(
                    unique_id,
                    ErrorCode::NotImplemented,
                    format!("{} is not defined for {}", action, version),
                    Some(json!({"action": action})),
                );
            }
        };

        let handler = match self.routes.get(&(version, action.clone())) {
            Some(handler) => handler,
            None => {
                tracing::debug!(unique_id = %unique_id, action = %action, %version, "no handler registered");
                return Message::call_error(
                    unique_id,
                    ErrorCode::NotImplemented,
                    format!("No handler for {} registered", action),
                    Some(json!({"action": action})),
                );
            }
        };

        if let Err(violations) = schema.validate(&payload, self.policy) {
            let first = &violations[0];
            tracing::debug!(
                unique_id = %unique_id,
                action = %action,
                field = %first.field,
                count = violations.len(),
                "inbound payload rejected"
            );
            return Message::call_error(
                unique_id,
                first.error_code(),
                format!("Payload for {} is invalid: {}", action, first),
                Some(violation_details(&violations)),
            );
        }

        let outcome = AssertUnwindSafe(async { handler.call(payload, ctx).await })
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(reply)) => Message::call_result(unique_id, reply),
            Ok(Err(HandlerError::Call {
                code,
                description,
                details,
            })) => {
                tracing::debug!(unique_id = %unique_id, action = %action, %code, "handler returned error");
                Message::call_error(unique_id, code, description, details)
            }
            Ok(Err(HandlerError::Internal(reason))) => {
                tracing::warn!(unique_id = %unique_id, action = %action, reason = %reason, "handler failed");
                Message::call_error(
                    unique_id,
                    ErrorCode::InternalError,
                    format!("An unexpected error occurred while handling {}", action),
                    None,
                )
            }
            Err(panic) => {
                let reason = if let Some(s) = panic.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "unknown panic".to_string()
                };
                tracing::warn!(unique_id = %unique_id, action = %action, reason = %reason, "handler panicked");
                Message::call_error(
                    unique_id,
                    ErrorCode::InternalError,
                    format!("An unexpected error occurred while handling {}", action),
                    None,
                )
            }
        }
    }
}

impl Default for ActionRouter {
    fn default() -> Self {
        Self::new(UnknownFieldPolicy::default())
    }
}
