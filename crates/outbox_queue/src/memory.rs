//! In-memory queue store for testing.

use crate::error::StoreResult;
use crate::record::{Method, MutationId, QueuedMutation};
use crate::store::QueueStore;
use parking_lot::Mutex;

/// An in-memory queue store.
///
/// This store keeps all records in memory and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral queues that don't need to survive a restart
///
/// # Thread Safety
///
/// All operations lock a single internal mutex, so producers and consumers
/// serialize exactly as they do against the persistent store.
///
/// # Example
///
/// ```rust
/// use outbox_queue::{MemoryStore, Method, QueueStore};
///
/// let store = MemoryStore::new();
/// store.enqueue(Method::Post, "/api/orders", None).unwrap();
/// assert_eq!(store.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Vec<QueuedMutation>>,
}

impl MemoryStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-seeded with records.
    ///
    /// Useful for testing replay scenarios.
    #[must_use]
    pub fn with_records(records: Vec<QueuedMutation>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }
}

impl QueueStore for MemoryStore {
    fn enqueue(
        &self,
        method: Method,
        url: &str,
        payload: Option<Vec<u8>>,
    ) -> StoreResult<MutationId> {
        let record = QueuedMutation::new(method, url, payload);
        let id = record.id;
        self.records.lock().push(record);
        Ok(id)
    }

    fn list(&self) -> Vec<QueuedMutation> {
        self.records.lock().clone()
    }

    fn remove(&self, id: MutationId) -> StoreResult<bool> {
        let mut records = self.records.lock();
        let before = records.len();
        records.retain(|r| r.id != id);
        Ok(records.len() < before)
    }

    fn record_failure(&self, id: MutationId, error: &str) -> StoreResult<u32> {
        let mut records = self.records.lock();
        match records.iter_mut().find(|r| r.id == id) {
            Some(record) => {
                record.attempts += 1;
                record.last_error = Some(error.to_string());
                Ok(record.attempts)
            }
            None => Ok(0),
        }
    }

    fn clear(&self) -> StoreResult<()> {
        self.records.lock().clear();
        Ok(())
    }

    fn len(&self) -> usize {
        self.records.lock().len()
    }
}
