//! Correlation table for outbound calls.
//!
//! Every outbound Call registers a pending entry keyed by its unique id.
//! The entry is settled exactly once, by whichever of these reaches it
//! first:
//!
//! - [`CorrelationTable::resolve`] - a CallResult arrived
//! - [`CorrelationTable::reject`] - a CallError arrived
//! - [`CorrelationTable::expire_due`] or the waiter's own deadline - timeout
//! - [`CorrelationTable::cancel`] or dropping the [`PendingResponse`] - abandoned
//! - [`CorrelationTable::close_all`] - the connection went away
//!
//! Settlement removes the entry, so any later operation on the same id
//! reports `UnknownCorrelationId` (or is a no-op). Once `close_all` has run
//! the table refuses new registrations.
//!
//! # Architecture
//!
//! ```text
//! call() ──register──► shard[hash(id)] ◄──resolve/reject── read loop
//!    │                      │
//!    └──── wait() ◄─oneshot─┘
//! ```
//!
//! The table is split into independently locked shards so that calls on
//! unrelated ids do not contend on a single lock.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::oneshot;
use tokio::time::Instant;
use uuid::Uuid;

use crate::error::{OcppError, Result};
use crate::protocol::ErrorCode;

/// Number of independently locked shards.
const SHARD_COUNT: usize = 16;

type Outcome = Result<Value>;

/// An outbound call waiting for its reply.
struct PendingCall {
    action: String,
    deadline: Instant,
    slot: oneshot::Sender<Outcome>,
}

struct Inner {
    shards: Vec<Mutex<HashMap<String, PendingCall>>>,
    timeout: Duration,
    closed: AtomicBool,
}

/// Per-connection map from correlation id to pending outbound call.
///
/// Cheaply cloneable; clones share the same entries.
#[derive(Clone)]
pub struct CorrelationTable {
    inner: Arc<Inner>,
}

impl CorrelationTable {
    /// Create an empty table whose calls time out after `timeout`.
    pub fn new(timeout: Duration) -> Self {
        let shards = (0..SHARD_COUNT).map(|_| Mutex::new(HashMap::new())).collect();
        Self {
            inner: Arc::new(Inner {
                shards,
                timeout,
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Configured call timeout.
    #[inline]
    pub fn timeout(&self) -> Duration {
        self.inner.timeout
    }

    fn shard(&self, unique_id: &str) -> &Mutex<HashMap<String, PendingCall>> {
        let mut hasher = DefaultHasher::new();
        unique_id.hash(&mut hasher);
        let index = (hasher.finish() as usize) % self.inner.shards.len();
        &self.inner.shards[index]
    }

    fn take(&self, unique_id: &str) -> Option<PendingCall> {
        self.shard(unique_id).lock().remove(unique_id)
    }

    /// Register a new outbound call.
    ///
    /// Generates a UUIDv4 id unique among the currently outstanding ids and
    /// returns the handle the caller waits on.
    ///
    /// # Errors
    ///
    /// `ConnectionClosed` once [`close_all`](Self::close_all) has run.
    pub fn register(&self, action: &str) -> Result<PendingResponse> {
        let deadline = Instant::now() + self.inner.timeout;

        loop {
            let unique_id = Uuid::new_v4().to_string();
            let mut shard = self.shard(&unique_id).lock();
            // Checked under the shard lock: close_all sets the flag before
            // draining, so an entry inserted here is either refused or drained.
            if self.inner.closed.load(Ordering::Acquire) {
                return Err(OcppError::ConnectionClosed);
            }
            if shard.contains_key(&unique_id) {
                continue;
            }

            let (tx, rx) = oneshot::channel();
            shard.insert(
                unique_id.clone(),
                PendingCall {
                    action: action.to_string(),
                    deadline,
                    slot: tx,
                },
            );
            drop(shard);

            tracing::trace!(unique_id = %unique_id, action, "registered pending call");

            return Ok(PendingResponse {
                unique_id,
                action: action.to_string(),
                deadline,
                rx,
                table: self.clone(),
            });
        }
    }

    /// Settle a pending call with a successful payload.
    ///
    /// # Errors
    ///
    /// `UnknownCorrelationId` if no call with this id is pending.
    pub fn resolve(&self, unique_id: &str, payload: Value) -> Result<()> {
        let call = self
            .take(unique_id)
            .ok_or_else(|| OcppError::UnknownCorrelationId(unique_id.to_string()))?;
        tracing::trace!(unique_id, action = %call.action, "resolved pending call");
        // The waiter may have gone away; nothing to deliver then.
        let _ = call.slot.send(Ok(payload));
        Ok(())
    }

    /// Settle a pending call with the peer's CallError.
    ///
    /// # Errors
    ///
    /// `UnknownCorrelationId` if no call with this id is pending.
    pub fn reject(
        &self,
        unique_id: &str,
        code: ErrorCode,
        description: impl Into<String>,
        details: Value,
    ) -> Result<()> {
        let call = self
            .take(unique_id)
            .ok_or_else(|| OcppError::UnknownCorrelationId(unique_id.to_string()))?;
        tracing::trace!(unique_id, action = %call.action, %code, "rejected pending call");
        let _ = call.slot.send(Err(OcppError::ErrorResponse {
            code,
            description: description.into(),
            details,
        }));
        Ok(())
    }

    /// Time out every call whose deadline has passed.
    ///
    /// Returns the expired ids.
    pub fn expire_due(&self) -> Vec<String> {
        let now = Instant::now();
        let mut expired = Vec::new();

        for shard in &self.inner.shards {
            let mut shard = shard.lock();
            let due: Vec<String> = shard
                .iter()
                .filter(|(_, call)| call.deadline <= now)
                .map(|(id, _)| id.clone())
                .collect();
            for id in due {
                if let Some(call) = shard.remove(&id) {
                    expired.push((id, call));
                }
            }
        }

        expired
            .into_iter()
            .map(|(unique_id, call)| {
                tracing::debug!(unique_id = %unique_id, action = %call.action, "pending call timed out");
                let _ = call.slot.send(Err(OcppError::Timeout {
                    action: call.action,
                    unique_id: unique_id.clone(),
                }));
                unique_id
            })
            .collect()
    }

    /// Drop a pending call without settling it.
    ///
    /// Returns `false` if the call was already settled.
    pub fn cancel(&self, unique_id: &str) -> bool {
        let removed = self.take(unique_id).is_some();
        if removed {
            tracing::debug!(unique_id, "pending call cancelled");
        }
        removed
    }

    /// Fail every pending call with `ConnectionClosed` and refuse further
    /// registrations.
    ///
    /// Returns the number of calls failed.
    pub fn close_all(&self) -> usize {
        self.inner.closed.store(true, Ordering::Release);

        let mut drained = Vec::new();
        for shard in &self.inner.shards {
            drained.extend(shard.lock().drain().map(|(_, call)| call));
        }

        let count = drained.len();
        for call in drained {
            let _ = call.slot.send(Err(OcppError::ConnectionClosed));
        }
        count
    }

    /// Action of a pending call.
    pub fn action(&self, unique_id: &str) -> Option<String> {
        self.shard(unique_id)
            .lock()
            .get(unique_id)
            .map(|call| call.action.clone())
    }

    /// Whether a call with this id is pending.
    pub fn contains(&self, unique_id: &str) -> bool {
        self.shard(unique_id).lock().contains_key(unique_id)
    }

    /// Whether [`close_all`](Self::close_all) has run.
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Number of pending calls.
    pub fn len(&self) -> usize {
        self.inner.shards.iter().map(|s| s.lock().len()).sum()
    }

    /// Whether no call is pending.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Handle for one pending outbound call.
///
/// Dropping the handle before the call settles cancels the call.
pub struct PendingResponse {
    unique_id: String,
    action: String,
    deadline: Instant,
    rx: oneshot::Receiver<Outcome>,
    table: CorrelationTable,
}

impl PendingResponse {
    /// Correlation id to put in the outbound Call.
    #[inline]
    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    /// Action of the call.
    #[inline]
    pub fn action(&self) -> &str {
        &self.action
    }

    /// Instant after which the call times out.
    #[inline]
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Wait for the call to settle.
    ///
    /// Races settlement against the deadline. If the deadline fires while
    /// the entry is still pending, the entry is removed and `Timeout` is
    /// returned; if something else removed it first, its outcome wins.
    pub async fn wait(mut self) -> Result<Value> {
        match tokio::time::timeout_at(self.deadline, &mut self.rx).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => Err(OcppError::ConnectionClosed),
            Err(_) => {
                if self.table.take(&self.unique_id).is_some() {
                    tracing::debug!(unique_id = %self.unique_id, action = %self.action, "pending call timed out");
                    return Err(OcppError::Timeout {
                        action: self.action.clone(),
                        unique_id: self.unique_id.clone(),
                    });
                }
                // Whoever removed the entry sends (or drops the sender) right
                // after releasing the shard lock.
                (&mut self.rx)
                    .await
                    .unwrap_or(Err(OcppError::ConnectionClosed))
            }
        }
    }
}

impl Drop for PendingResponse {
    fn drop(&mut self) {
        self.table.cancel(&self.unique_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table() -> CorrelationTable {
        CorrelationTable::new(Duration::from_secs(30))
    }

    #[tokio::test]
    async fn test_resolve_delivers_payload_once() {
        let table = table();
        let pending = table.register("BootNotification").unwrap();
        let id = pending.unique_id().to_string();
        assert!(table.contains(&id));
        assert_eq!(table.action(&id).as_deref(), Some("BootNotification"));

        table
            .resolve(&id, json!({"status": "Accepted"}))
            .unwrap();
        assert!(!table.contains(&id));

        let second = table.resolve(&id, json!({}));
        assert!(matches!(second, Err(OcppError::UnknownCorrelationId(ref s)) if *s == id));
        let third = table.reject(&id, ErrorCode::GenericError, "", json!({}));
        assert!(matches!(third, Err(OcppError::UnknownCorrelationId(_))));

        assert_eq!(pending.wait().await.unwrap(), json!({"status": "Accepted"}));
    }

    #[tokio::test]
    async fn test_reject_delivers_error_response() {
        let table = table();
        let pending = table.register("Reset").unwrap();
        let id = pending.unique_id().to_string();

        table
            .reject(&id, ErrorCode::NotSupported, "nope", json!({"why": "x"}))
            .unwrap();

        match pending.wait().await {
            Err(OcppError::ErrorResponse {
                code,
                description,
                details,
            }) => {
                assert_eq!(code, ErrorCode::NotSupported);
                assert_eq!(description, "nope");
                assert_eq!(details, json!({"why": "x"}));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unknown_id() {
        let table = table();
        assert!(matches!(
            table.resolve("nope", json!({})),
            Err(OcppError::UnknownCorrelationId(_))
        ));
    }

    #[test]
    fn test_ids_unique() {
        let table = table();
        let handles: Vec<_> = (0..200).map(|_| table.register("Heartbeat").unwrap()).collect();
        let ids: std::collections::HashSet<_> =
            handles.iter().map(|h| h.unique_id().to_string()).collect();
        assert_eq!(ids.len(), 200);
        assert_eq!(table.len(), 200);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_times_out_then_late_resolve_unknown() {
        let table = CorrelationTable::new(Duration::from_secs(5));
        let pending = table.register("Heartbeat").unwrap();
        let id = pending.unique_id().to_string();

        let result = pending.wait().await;
        assert!(matches!(result, Err(OcppError::Timeout { ref action, .. }) if action == "Heartbeat"));
        assert!(table.is_empty());

        assert!(matches!(
            table.resolve(&id, json!({})),
            Err(OcppError::UnknownCorrelationId(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expire_due() {
        let table = CorrelationTable::new(Duration::from_secs(5));
        let pending = table.register("Heartbeat").unwrap();
        let id = pending.unique_id().to_string();

        assert!(table.expire_due().is_empty());

        tokio::time::advance(Duration::from_secs(6)).await;
        assert_eq!(table.expire_due(), vec![id.clone()]);
        assert!(table.is_empty());

        assert!(matches!(pending.wait().await, Err(OcppError::Timeout { .. })));
        assert!(matches!(
            table.reject(&id, ErrorCode::GenericError, "", json!({})),
            Err(OcppError::UnknownCorrelationId(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolve_before_deadline_wins() {
        let table = CorrelationTable::new(Duration::from_secs(5));
        let pending = table.register("Heartbeat").unwrap();
        let id = pending.unique_id().to_string();

        tokio::time::advance(Duration::from_secs(4)).await;
        table.resolve(&id, json!({"currentTime": "T"})).unwrap();
        tokio::time::advance(Duration::from_secs(4)).await;

        assert!(table.expire_due().is_empty());
        assert_eq!(pending.wait().await.unwrap(), json!({"currentTime": "T"}));
    }

    #[test]
    fn test_drop_cancels() {
        let table = table();
        let pending = table.register("Heartbeat").unwrap();
        let id = pending.unique_id().to_string();
        drop(pending);

        assert!(!table.contains(&id));
        assert!(matches!(
            table.resolve(&id, json!({})),
            Err(OcppError::UnknownCorrelationId(_))
        ));
    }

    #[tokio::test]
    async fn test_close_all() {
        let table = table();
        let a = table.register("Heartbeat").unwrap();
        let b = table.register("Authorize").unwrap();

        assert_eq!(table.close_all(), 2);
        assert!(table.is_empty());
        assert!(matches!(a.wait().await, Err(OcppError::ConnectionClosed)));
        assert!(matches!(b.wait().await, Err(OcppError::ConnectionClosed)));
    }

    #[tokio::test]
    async fn test_concurrent_resolves() {
        let table = table();
        let pending: Vec<_> = (0..64).map(|_| table.register("MeterValues").unwrap()).collect();
        let ids: Vec<String> = pending.iter().map(|p| p.unique_id().to_string()).collect();

        let mut tasks = Vec::new();
        for (i, id) in ids.into_iter().enumerate() {
            let table = table.clone();
            tasks.push(tokio::spawn(async move {
                table.resolve(&id, json!({"n": i})).unwrap();
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        for (i, p) in pending.into_iter().enumerate() {
            assert_eq!(p.wait().await.unwrap(), json!({"n": i}));
        }
    }

    #[tokio::test]
    async fn test_register_after_close_refused() {
        let table = table();
        assert!(!table.is_closed());
        table.close_all();

        assert!(table.is_closed());
        assert!(matches!(
            table.register("Heartbeat"),
            Err(OcppError::ConnectionClosed)
        ));
        assert!(table.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_expire_racing_own_deadline_reports_timeout() {
        for _ in 0..2000 {
            let table = CorrelationTable::new(Duration::ZERO);
            let pending = table.register("Heartbeat").unwrap();

            let sweeper = table.clone();
            let sweep = std::thread::spawn(move || sweeper.expire_due());

            let result = pending.wait().await;
            assert!(
                matches!(result, Err(OcppError::Timeout { .. })),
                "unexpected {:?}",
                result
            );
            sweep.join().unwrap();
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_resolve_racing_deadline_never_reports_closed() {
        for _ in 0..2000 {
            let table = CorrelationTable::new(Duration::ZERO);
            let pending = table.register("Heartbeat").unwrap();
            let id = pending.unique_id().to_string();

            let resolver = table.clone();
            let resolve =
                std::thread::spawn(move || resolver.resolve(&id, json!({"currentTime": "T"})));

            match pending.wait().await {
                Ok(payload) => assert_eq!(payload, json!({"currentTime": "T"})),
                Err(OcppError::Timeout { .. }) => {}
                other => panic!("unexpected {:?}", other),
            }
            let _ = resolve.join().unwrap();
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_register_racing_close_all_settles_every_call() {
        for _ in 0..200 {
            let table = table();

            let registrars: Vec<_> = (0..4)
                .map(|_| {
                    let table = table.clone();
                    tokio::spawn(async move {
                        let mut accepted = Vec::new();
                        for _ in 0..50 {
                            match table.register("StatusNotification") {
                                Ok(pending) => accepted.push(pending),
                                Err(OcppError::ConnectionClosed) => break,
                                Err(other) => panic!("unexpected {:?}", other),
                            }
                            tokio::task::yield_now().await;
                        }
                        accepted
                    })
                })
                .collect();

            tokio::task::yield_now().await;
            table.close_all();

            for registrar in registrars {
                for pending in registrar.await.unwrap() {
                    let result = tokio::time::timeout(Duration::from_secs(5), pending.wait())
                        .await
                        .expect("call left pending after close_all");
                    assert!(matches!(result, Err(OcppError::ConnectionClosed)));
                }
            }
            assert!(table.is_empty());
        }
    }
}
