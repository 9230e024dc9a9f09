//! Endpoint builder and read loop.
//!
//! An [`Endpoint`] is one side of one OCPP-J connection. It owns the
//! correlation table for its outbound calls and the action router for the
//! Calls its peer sends. Lifecycle:
//!
//! 1. Register handlers on an [`EndpointBuilder`]
//! 2. [`connect`](EndpointBuilder::connect) it to a [`Connection`], which
//!    picks the protocol version from the negotiated subprotocol
//! 3. Drive [`run`](Endpoint::run) on a task; issue [`call`](Endpoint::call)s
//!    from anywhere
//! 4. The loop ends when the peer closes, on [`shutdown`](Endpoint::shutdown),
//!    or on a fatal error; every pending call then fails with
//!    `ConnectionClosed`
//!
//! # Example
//!
//! ```
//! # async fn demo() -> ocpp_rpc::error::Result<()> {
//! use ocpp_rpc::protocol::ProtocolVersion;
//! use ocpp_rpc::transport::channel;
//! use ocpp_rpc::Endpoint;
//! use serde_json::{json, Value};
//!
//! let (station_side, server_side) = channel::pair("ocpp1.6");
//!
//! let server = Endpoint::builder()
//!     .on(ProtocolVersion::V16, "Heartbeat", |_: Value, _ctx| async {
//!         Ok(json!({"currentTime": "2024-01-01T00:00:00Z"}))
//!     })
//!     .connect(server_side)?;
//! let station = Endpoint::builder().connect(station_side)?;
//!
//! tokio::spawn({
//!     let server = server.clone();
//!     async move { server.run().await }
//! });
//! tokio::spawn({
//!     let station = station.clone();
//!     async move { station.run().await }
//! });
//!
//! let reply = station.call("Heartbeat", json!({})).await?;
//! assert_eq!(reply["currentTime"], "2024-01-01T00:00:00Z");
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{Notify, Semaphore};
use tokio::time::MissedTickBehavior;

use crate::catalog::{violation_details, Direction, PayloadCatalog, UnknownFieldPolicy};
use crate::codec::MessageCodec;
use crate::config::{EndpointConfig, MIN_SWEEP_INTERVAL};
use crate::correlation::CorrelationTable;
use crate::error::{OcppError, Result};
use crate::handler::{ActionRouter, CallContext, HandlerResult};
use crate::payloads::OcppRequest;
use crate::protocol::{ErrorCode, Message, ProtocolVersion};
use crate::transport::{Connection, FrameReceiver, FrameSender};

/// Connection state of an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Calls may be issued and inbound frames are processed.
    Open,
    /// Local shutdown requested; the read loop is winding down.
    Closing,
    /// The connection is gone; every pending call has failed.
    Closed,
}

/// Builder for configuring handlers and creating an [`Endpoint`].
pub struct EndpointBuilder {
    router: ActionRouter,
    config: EndpointConfig,
    /// First registration failure, reported by `connect`.
    error: Option<OcppError>,
}

impl EndpointBuilder {
    /// Create a builder with default configuration and no handlers.
    pub fn new() -> Self {
        Self {
            router: ActionRouter::default(),
            config: EndpointConfig::default(),
            error: None,
        }
    }

    /// Register a handler for `action` under `version`.
    ///
    /// The handler receives the payload deserialized into `T` (use
    /// `serde_json::Value` for the raw object) and returns a record that is
    /// serialized into the CallResult. Registering the same pair twice makes
    /// [`connect`](Self::connect) fail with `DuplicateHandler`.
    pub fn on<F, T, R, Fut>(mut self, version: ProtocolVersion, action: &str, handler: F) -> Self
    where
        F: Fn(T, CallContext) -> Fut + Send + Sync + 'static,
        T: DeserializeOwned + Send + 'static,
        R: Serialize + Send + 'static,
        Fut: Future<Output = HandlerResult<R>> + Send + 'static,
    {
        if let Err(e) = self.router.register(action, version, handler) {
            self.error.get_or_insert(e);
        }
        self
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: EndpointConfig) -> Self {
        self.config = config;
        self
    }

    /// Set how long `call` waits for a reply.
    ///
    /// Default: 30 seconds
    pub fn call_timeout(mut self, timeout: Duration) -> Self {
        self.config.call_timeout = timeout;
        self
    }

    /// Set how often the read loop expires overdue calls.
    ///
    /// Default: 1 second. Periods below 1 ms are raised to 1 ms.
    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.config.sweep_interval = interval;
        self
    }

    /// Set the maximum number of concurrently running handler tasks.
    ///
    /// Only used with `nested_calls`. At the limit, new Calls are answered
    /// with `InternalError`.
    /// Default: 256
    pub fn max_concurrent_handlers(mut self, limit: usize) -> Self {
        self.config.max_concurrent_handlers = limit;
        self
    }

    /// Set the policy for payload fields the catalog does not declare.
    ///
    /// Default: `Strict`
    pub fn unknown_fields(mut self, policy: UnknownFieldPolicy) -> Self {
        self.config.unknown_fields = policy;
        self
    }

    /// Validate outbound Call payloads before sending.
    ///
    /// Default: off
    pub fn validate_outbound(mut self, enabled: bool) -> Self {
        self.config.validate_outbound = enabled;
        self
    }

    /// Validate CallResult payloads against the response schema.
    ///
    /// Default: off
    pub fn validate_responses(mut self, enabled: bool) -> Self {
        self.config.validate_responses = enabled;
        self
    }

    /// Dispatch each inbound Call on its own task and expose the endpoint
    /// to handlers through [`CallContext::caller`].
    ///
    /// Default: off
    pub fn nested_calls(mut self, enabled: bool) -> Self {
        self.config.nested_calls = enabled;
        self
    }

    /// Bind the endpoint to an open connection.
    ///
    /// # Errors
    ///
    /// `UnsupportedSubprotocol` if the connection's subprotocol names no
    /// supported version, or the first error raised while registering
    /// handlers.
    pub fn connect(self, connection: Connection) -> Result<Endpoint> {
        if let Some(e) = self.error {
            return Err(e);
        }

        let version: ProtocolVersion = connection.subprotocol.parse()?;
        let Connection {
            subprotocol,
            sender,
            receiver,
        } = connection;

        let mut router = self.router;
        router.set_policy(self.config.unknown_fields);

        tracing::debug!(
            %version,
            handlers = router.len(),
            "endpoint connected"
        );

        Ok(Endpoint {
            inner: Arc::new(Inner {
                version,
                subprotocol,
                table: CorrelationTable::new(self.config.call_timeout),
                handler_slots: Arc::new(Semaphore::new(self.config.max_concurrent_handlers)),
                config: self.config,
                router,
                sender,
                receiver: tokio::sync::Mutex::new(receiver),
                state: Mutex::new(ConnectionState::Open),
                shutdown: Notify::new(),
            }),
        })
    }
}

impl Default for EndpointBuilder {
    fn default() -> Self {
        Self::new()
    }
}

struct Inner {
    version: ProtocolVersion,
    subprotocol: String,
    config: EndpointConfig,
    router: ActionRouter,
    table: CorrelationTable,
    sender: Arc<dyn FrameSender>,
    /// Held by the running read loop.
    receiver: tokio::sync::Mutex<Box<dyn FrameReceiver>>,
    state: Mutex<ConnectionState>,
    shutdown: Notify,
    handler_slots: Arc<Semaphore>,
}

/// One side of an OCPP-J connection.
///
/// Cheap to clone; clones share the connection.
#[derive(Clone)]
pub struct Endpoint {
    inner: Arc<Inner>,
}

impl Endpoint {
    /// Create a new endpoint builder.
    pub fn builder() -> EndpointBuilder {
        EndpointBuilder::new()
    }

    /// Negotiated protocol version.
    #[inline]
    pub fn version(&self) -> ProtocolVersion {
        self.inner.version
    }

    /// Negotiated subprotocol token.
    #[inline]
    pub fn subprotocol(&self) -> &str {
        &self.inner.subprotocol
    }

    /// Active configuration.
    #[inline]
    pub fn config(&self) -> &EndpointConfig {
        &self.inner.config
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.inner.state.lock()
    }

    /// Number of outbound calls waiting for a reply.
    pub fn pending_calls(&self) -> usize {
        self.inner.table.len()
    }

    /// Send a Call and wait for the peer's reply.
    ///
    /// # Errors
    ///
    /// - `ConnectionClosed` if the endpoint is not open, or closes before
    ///   the reply arrives
    /// - `UnknownAction` / `InvalidPayload` if outbound validation is on
    ///   and the payload fails it; nothing is sent
    /// - `Timeout` if no reply arrives within the call timeout
    /// - `ErrorResponse` if the peer answers with a CallError
    pub async fn call(&self, action: &str, payload: Value) -> Result<Value> {
        if self.state() != ConnectionState::Open {
            return Err(OcppError::ConnectionClosed);
        }

        if self.inner.config.validate_outbound {
            PayloadCatalog::for_version(self.inner.version).validate(
                action,
                Direction::Request,
                &payload,
                self.inner.config.unknown_fields,
            )?;
        }

        let pending = self.inner.table.register(action)?;
        let text = MessageCodec::encode(&Message::call(pending.unique_id(), action, payload))?;

        tracing::debug!(
            unique_id = %pending.unique_id(),
            action,
            version = %self.inner.version,
            "sending call"
        );
        self.inner.sender.send(text).await?;

        pending.wait().await
    }

    /// Send a typed request and decode the typed response.
    ///
    /// # Errors
    ///
    /// Everything [`call`](Self::call) returns, plus `Json` if the reply
    /// does not fit the response record.
    pub async fn send<R: OcppRequest>(&self, request: &R) -> Result<R::Response> {
        let payload = serde_json::to_value(request)?;
        let reply = self.call(R::ACTION, payload).await?;
        Ok(serde_json::from_value(reply)?)
    }

    /// Ask the read loop to stop.
    ///
    /// The loop finishes the frame it is processing, fails every pending
    /// call with `ConnectionClosed` and closes the transport.
    pub fn shutdown(&self) {
        {
            let mut state = self.inner.state.lock();
            if *state != ConnectionState::Open {
                return;
            }
            *state = ConnectionState::Closing;
        }
        tracing::debug!(version = %self.inner.version, "shutdown requested");
        self.inner.shutdown.notify_one();
    }

    /// Run the read loop until the connection ends.
    ///
    /// Returns `Ok` when the peer closes or after [`shutdown`](Self::shutdown).
    ///
    /// # Errors
    ///
    /// - `AlreadyRunning` if another `run` owns the connection
    /// - `ConnectionClosed` if the endpoint has already closed
    /// - `MalformedMessage` if an inbound frame cannot be decoded
    /// - transport errors from receiving or sending
    pub async fn run(&self) -> Result<()> {
        let mut receiver = self
            .inner
            .receiver
            .try_lock()
            .map_err(|_| OcppError::AlreadyRunning)?;

        match self.state() {
            ConnectionState::Closed => return Err(OcppError::ConnectionClosed),
            ConnectionState::Closing => {
                self.close().await;
                return Ok(());
            }
            ConnectionState::Open => {}
        }

        let period = self.inner.config.sweep_interval.max(MIN_SWEEP_INTERVAL);
        let mut sweep = tokio::time::interval(period);
        sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let outcome = loop {
            tokio::select! {
                _ = self.inner.shutdown.notified() => break Ok(()),
                _ = sweep.tick() => {
                    let expired = self.inner.table.expire_due();
                    if !expired.is_empty() {
                        tracing::debug!(count = expired.len(), "expired pending calls");
                    }
                }
                frame = receiver.receive() => match frame {
                    Ok(Some(text)) => {
                        if let Err(e) = self.handle_frame(&text).await {
                            break Err(e);
                        }
                    }
                    Ok(None) => {
                        tracing::debug!(version = %self.inner.version, "peer closed connection");
                        break Ok(());
                    }
                    Err(e) => break Err(e),
                },
            }
        };

        if let Err(e) = &outcome {
            tracing::error!(error = %e, version = %self.inner.version, "read loop failed");
        }
        self.close().await;
        outcome
    }

    async fn close(&self) {
        *self.inner.state.lock() = ConnectionState::Closing;
        let failed = self.inner.table.close_all();
        *self.inner.state.lock() = ConnectionState::Closed;
        if let Err(e) = self.inner.sender.close().await {
            tracing::debug!(error = %e, "transport close failed");
        }
        tracing::debug!(failed, version = %self.inner.version, "endpoint closed");
    }

    async fn handle_frame(&self, text: &str) -> Result<()> {
        let message = MessageCodec::decode(text)?;

        match message {
            Message::Call {
                unique_id,
                action,
                payload,
            } => self.handle_call(unique_id, action, payload).await,
            Message::CallResult { unique_id, payload } => {
                self.handle_result(&unique_id, payload);
                Ok(())
            }
            Message::CallError {
                unique_id,
                error_code,
                error_description,
                error_details,
            } => {
                tracing::debug!(unique_id = %unique_id, code = %error_code, "received call error");
                if let Err(e) = self.inner.table.reject(
                    &unique_id,
                    error_code,
                    error_description,
                    error_details,
                ) {
                    tracing::warn!(unique_id = %unique_id, error = %e, "dropping call error");
                }
                Ok(())
            }
        }
    }

    async fn handle_call(&self, unique_id: String, action: String, payload: Value) -> Result<()> {
        tracing::debug!(
            unique_id = %unique_id,
            action = %action,
            version = %self.inner.version,
            "received call"
        );
        let ctx = CallContext::new(unique_id, action, self.inner.version);

        if !self.inner.config.nested_calls {
            let reply = self.inner.router.dispatch(ctx, payload).await;
            return self.send_message(&reply).await;
        }

        let permit = match self.inner.handler_slots.clone().try_acquire_owned() {
            Ok(p) => p,
            Err(_) => {
                tracing::warn!(
                    unique_id = %ctx.unique_id(),
                    action = %ctx.action(),
                    "handler capacity reached, refusing call"
                );
                let reply = Message::call_error(
                    ctx.unique_id(),
                    ErrorCode::InternalError,
                    "Too many concurrent requests",
                    None,
                );
                return self.send_message(&reply).await;
            }
        };

        let endpoint = self.clone();
        let ctx = ctx.with_caller(self.clone());
        tokio::spawn(async move {
            let _permit = permit;
            let reply = endpoint.inner.router.dispatch(ctx, payload).await;
            if let Err(e) = endpoint.send_message(&reply).await {
                tracing::debug!(unique_id = %reply.unique_id(), error = %e, "reply not sent");
            }
        });
        Ok(())
    }

    fn handle_result(&self, unique_id: &str, payload: Value) {
        if self.inner.config.validate_responses {
            if let Some(rejection) = self.check_response(unique_id, &payload) {
                let (code, description, details) = rejection;
                if let Err(e) = self.inner.table.reject(unique_id, code, description, details) {
                    tracing::warn!(unique_id, error = %e, "dropping call result");
                }
                return;
            }
        }

        if let Err(e) = self.inner.table.resolve(unique_id, payload) {
            tracing::warn!(unique_id, error = %e, "dropping call result");
        }
    }

    /// Rejection for a CallResult that fails its response schema.
    fn check_response(&self, unique_id: &str, payload: &Value) -> Option<(ErrorCode, String, Value)> {
        let action = self.inner.table.action(unique_id)?;
        let schema = PayloadCatalog::for_version(self.inner.version).response(&action)?;
        let violations = schema
            .validate(payload, self.inner.config.unknown_fields)
            .err()?;

        let first = violations.first()?;
        tracing::debug!(unique_id, action = %action, field = %first.field, "call result rejected");
        Some((
            first.error_code(),
            format!("Response to {} is invalid: {}", action, first),
            violation_details(&violations),
        ))
    }

    async fn send_message(&self, message: &Message) -> Result<()> {
        let text = MessageCodec::encode(message)?;
        tracing::debug!(
            unique_id = %message.unique_id(),
            message_type = message.type_id(),
            "sending reply"
        );
        self.inner.sender.send(text).await
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("version", &self.inner.version)
            .field("state", &self.state())
            .field("pending_calls", &self.pending_calls())
            .finish()
    }
}
