//! Correlation ids and the waiter registry behind the relay transports.
//!
//! A relay read cannot match replies to requests by connection: the
//! payload comes back tagged with the callback name the request carried.
//! Each in-flight call registers a waiter under a fresh id; whatever
//! reply invokes that id resolves that waiter and nobody else.

use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::oneshot;

/// Mints a correlation id: prefix, unix millis, random hex suffix.
/// Collisions within one session are not a practical concern.
#[must_use]
pub fn correlation_id(prefix: &str) -> String {
    let millis = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    format!("{}_{}_{:x}", prefix, millis, rand::random::<u32>())
}

/// Waiters keyed by correlation id. One slot per in-flight relay call;
/// every exit path removes the slot via [`WaiterSlot`].
#[derive(Clone, Default)]
pub struct RelayRegistry {
    inner: Arc<Mutex<HashMap<String, oneshot::Sender<Value>>>>,
}

impl RelayRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a waiter under `id`. Dropping the returned slot removes
    /// the entry again, whichever path the caller leaves by.
    pub fn register(&self, id: &str) -> (WaiterSlot, oneshot::Receiver<Value>) {
        let (tx, rx) = oneshot::channel();
        self.inner.lock().insert(id.to_string(), tx);
        let slot = WaiterSlot {
            registry: self.clone(),
            id: id.to_string(),
        };
        (slot, rx)
    }

    /// Routes a payload to the waiter registered under `id`. Returns
    /// false when no such waiter exists, which is what a stale or
    /// misaddressed reply looks like.
    pub fn deliver(&self, id: &str, payload: Value) -> bool {
        let sender = self.inner.lock().remove(id);
        match sender {
            Some(tx) => tx.send(payload).is_ok(),
            None => false,
        }
    }

    /// Number of waiters currently registered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Scoped registration in a [`RelayRegistry`].
pub struct WaiterSlot {
    registry: RelayRegistry,
    id: String,
}

impl WaiterSlot {
    /// The correlation id this slot occupies.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Drop for WaiterSlot {
    fn drop(&mut self) {
        self.registry.inner.lock().remove(&self.id);
    }
}
