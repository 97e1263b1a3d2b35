//! Queue store trait definition.

use crate::error::StoreResult;
use crate::record::{Method, MutationId, QueuedMutation};

/// A durable, ordered store of pending write mutations.
///
/// The store is the single resource shared between the producer (the write
/// interceptor) and the consumer (the sync engine). Every mutating
/// operation executes inside one critical section, so an enqueue and a
/// remove can never interleave in a way that drops a record or corrupts
/// ordering.
///
/// # Invariants
///
/// - `list` returns records in insertion order
/// - `enqueue` returns only after the record is durable
/// - Implementors must be `Send + Sync`
///
/// # Implementors
///
/// - [`crate::MemoryStore`] - For testing and ephemeral queues
/// - [`crate::JournalStore`] - For crash-safe persistent storage
pub trait QueueStore: Send + Sync {
    /// Appends a mutation, returning its assigned id.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be made durable.
    fn enqueue(
        &self,
        method: Method,
        url: &str,
        payload: Option<Vec<u8>>,
    ) -> StoreResult<MutationId>;

    /// Returns an ordered snapshot of the pending mutations.
    ///
    /// The snapshot is safe to iterate while the store is concurrently
    /// mutated; later changes do not affect it.
    fn list(&self) -> Vec<QueuedMutation>;

    /// Removes the mutation with the given id.
    ///
    /// Returns `true` if a record was removed, `false` if no such record
    /// exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the removal cannot be persisted.
    fn remove(&self, id: MutationId) -> StoreResult<bool>;

    /// Records a failed replay attempt against a mutation.
    ///
    /// Increments the attempt count, stores the error message, and returns
    /// the new count. Returns `Ok(0)` if the record no longer exists.
    ///
    /// Attempt bookkeeping is in-memory only; it is not written to the
    /// durable medium.
    fn record_failure(&self, id: MutationId, error: &str) -> StoreResult<u32>;

    /// Removes all mutations.
    ///
    /// # Errors
    ///
    /// Returns an error if the removal cannot be persisted.
    fn clear(&self) -> StoreResult<()>;

    /// Returns the number of pending mutations.
    fn len(&self) -> usize;

    /// Returns true if no mutations are pending.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
