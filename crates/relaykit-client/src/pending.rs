//! The correlation table mapping request IDs to in-flight callers.

use std::collections::HashMap;
use std::sync::Mutex;

use relaykit_wire::ExecuteResponse;
use tokio::sync::oneshot;
use tracing::warn;

/// Concurrency-safe map from request ID to the caller waiting on it.
///
/// Each entry is removed by exactly one of: a matching response
/// ([`resolve`](Self::resolve)), a deadline ([`remove`](Self::remove) from
/// the timeout path), or a connection failure
/// ([`fail_all`](Self::fail_all)). Completion is delivered over a `oneshot`
/// channel, so a caller can never be woken twice; dropping the sender makes
/// the waiting receiver fail, which callers classify as a lost connection.
///
/// One table per connection — never process-global — so multiple clients in
/// one process cannot collide.
#[derive(Debug, Default)]
pub struct PendingTable {
    entries: Mutex<HashMap<u64, oneshot::Sender<ExecuteResponse>>>,
}

impl PendingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a request and obtain the receiver its response will arrive
    /// on. Must be called strictly before the request frame is written, so a
    /// fast response can never race an unregistered ID.
    pub fn register(&self, request_id: u64) -> oneshot::Receiver<ExecuteResponse> {
        let (tx, rx) = oneshot::channel();
        let mut entries = self.lock();
        if entries.insert(request_id, tx).is_some() {
            // IDs are issued monotonically, so this indicates a counter bug.
            // The displaced waiter observes a dropped sender and fails.
            warn!(request_id, "displaced existing pending entry with same id");
        }
        rx
    }

    /// Deliver a response to the caller that issued `request_id`.
    ///
    /// Returns `false` when no entry exists — a response for a call that
    /// already timed out or failed. That is not an error; the caller of this
    /// method logs it and moves on.
    pub fn resolve(&self, request_id: u64, response: ExecuteResponse) -> bool {
        let sender = self.lock().remove(&request_id);
        match sender {
            // A send error means the receiver was dropped after its timeout
            // fired; the entry is gone either way.
            Some(tx) => tx.send(response).is_ok(),
            None => false,
        }
    }

    /// Remove an entry without completing it (the timeout path owns the
    /// completion). Returns `false` if a resolve got there first.
    pub fn remove(&self, request_id: u64) -> bool {
        self.lock().remove(&request_id).is_some()
    }

    /// Drain every pending entry on connection failure or close.
    ///
    /// Dropping the senders fails every waiting receiver, completing each
    /// call with a connection-lost (transient) error. Returns how many
    /// entries were drained. Draining an already-empty table is a no-op, so
    /// the close path and the read-loop exit path cannot double-complete.
    pub fn fail_all(&self) -> usize {
        let drained: Vec<_> = {
            let mut entries = self.lock();
            entries.drain().collect()
        };
        drained.len()
    }

    /// Number of in-flight requests.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<u64, oneshot::Sender<ExecuteResponse>>> {
        self.entries
            .lock()
            .expect("pending table mutex poisoned")
    }
}
