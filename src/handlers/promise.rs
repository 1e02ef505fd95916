//! Promise resolution: correlating responses to in-flight requests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::oneshot;

use crate::dispatch::{MessageHandler, Outcome};
use crate::message::{keys, Message, MessageKind};

/// Resolution of one correlated request: remote output or remote error text.
pub type PromiseOutcome = std::result::Result<String, String>;

/// Registry of in-flight correlated requests.
///
/// A sender registers before writing its Command and awaits the receiver;
/// the [`PromiseHandler`] resolves the matching entry when the response
/// frame arrives. Cheap to clone.
#[derive(Clone)]
pub struct PendingRequests {
    inner: Arc<Mutex<HashMap<u64, oneshot::Sender<PromiseOutcome>>>>,
    next_id: Arc<AtomicU64>,
}

impl PendingRequests {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Allocate a request id and register its resolution slot.
    pub fn register(&self) -> (u64, oneshot::Receiver<PromiseOutcome>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.inner.lock().unwrap().insert(id, tx);
        (id, rx)
    }

    /// Resolve a registered request. Returns false for an unknown id.
    pub fn resolve(&self, id: u64, outcome: PromiseOutcome) -> bool {
        match self.inner.lock().unwrap().remove(&id) {
            Some(tx) => tx.send(outcome).is_ok(),
            None => false,
        }
    }

    /// Drop a registration whose caller gave up (e.g. timed out).
    pub fn abandon(&self, id: u64) {
        self.inner.lock().unwrap().remove(&id);
    }

    /// Number of in-flight requests.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    /// Check whether nothing is in flight.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().is_empty()
    }
}

impl Default for PendingRequests {
    fn default() -> Self {
        Self::new()
    }
}

/// Chain link resolving Promise messages against [`PendingRequests`].
pub struct PromiseHandler {
    pending: PendingRequests,
}

impl PromiseHandler {
    /// Create a handler over the shared pending-request registry.
    pub fn new(pending: PendingRequests) -> Self {
        Self { pending }
    }
}

impl MessageHandler for PromiseHandler {
    fn name(&self) -> &'static str {
        "promise"
    }

    fn handle(&self, message: &Message) -> Outcome {
        if message.kind != MessageKind::Promise {
            return Outcome::Continue;
        }

        let Some(id) = message.request_id() else {
            tracing::warn!("promise message without a usable request id");
            return Outcome::Consumed;
        };

        let outcome = match message.attachment(keys::ERROR) {
            Some(error) => Err(error.to_string()),
            None => Ok(message
                .attachment(keys::RESULT)
                .unwrap_or_default()
                .to_string()),
        };

        if !self.pending.resolve(id, outcome) {
            tracing::warn!(request_id = id, "promise for unknown or expired request");
        }
        Outcome::Consumed
    }
}
