//! Ordered, single-flight replay of queued mutations.

use crate::client::{ApiClient, ApiError, ApiRequest};
use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use outbox_queue::{QueueStore, QueuedMutation};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of one sync pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// Mutations confirmed by the remote service and removed.
    pub succeeded: u64,
    /// Mutations that hit the retry ceiling this pass.
    pub failed: u64,
    /// Mutations still pending after the pass.
    pub remaining: usize,
    /// True when the trigger found a pass already running and did nothing.
    pub coalesced: bool,
}

impl SyncReport {
    fn coalesced(remaining: usize) -> Self {
        Self {
            succeeded: 0,
            failed: 0,
            remaining,
            coalesced: true,
        }
    }
}

/// A mutation that exhausted its retry ceiling.
///
/// Terminal failures leave the active replay path but stay queryable here;
/// they are reported, never silently discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct FailedMutation {
    /// The failed record, with its final attempt count and error.
    pub mutation: QueuedMutation,
    /// The error from the last replay attempt.
    pub error: String,
}

/// Cumulative statistics across sync passes.
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    /// Sync passes run to completion.
    pub passes_completed: u64,
    /// Total successful replays.
    pub replayed: u64,
    /// Total terminal failures.
    pub terminally_failed: u64,
    /// Error from the most recent failed replay, if any.
    pub last_error: Option<String>,
}

/// Replays queued mutations against the remote service.
///
/// The engine is triggered by the connectivity monitor's OFFLINE→ONLINE
/// transition or by an explicit [`run`](SyncEngine::run) call. A pass
/// snapshots the queue and replays each entry sequentially in insertion
/// order; concurrent replay is deliberately avoided because it could
/// reorder dependent writes and flood the backend at reconnect.
///
/// At most one pass is active at a time; a trigger that arrives mid-pass
/// coalesces into a no-op report.
pub struct SyncEngine<C: ApiClient, S: QueueStore> {
    config: SyncConfig,
    client: Arc<C>,
    store: Arc<S>,
    running: AtomicBool,
    cancelled: AtomicBool,
    terminal: Mutex<Vec<FailedMutation>>,
    stats: Mutex<SyncStats>,
}

impl<C: ApiClient, S: QueueStore> SyncEngine<C, S> {
    /// Creates a new engine over the given client and store.
    pub fn new(config: SyncConfig, client: Arc<C>, store: Arc<S>) -> Self {
        Self {
            config,
            client,
            store,
            running: AtomicBool::new(false),
            cancelled: AtomicBool::new(false),
            terminal: Mutex::new(Vec::new()),
            stats: Mutex::new(SyncStats::default()),
        }
    }

    /// Runs one sync pass.
    ///
    /// If a pass is already running the trigger coalesces: the returned
    /// report has `coalesced` set and no calls are made.
    ///
    /// # Errors
    ///
    /// Returns an error only if the queue store itself fails; replay
    /// failures are accounted in the report, not propagated.
    pub fn run(&self) -> SyncResult<SyncReport> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("sync pass already running; trigger coalesced");
            return Ok(SyncReport::coalesced(self.store.len()));
        }

        self.cancelled.store(false, Ordering::SeqCst);
        let result = self.drain();
        self.running.store(false, Ordering::SeqCst);
        result
    }

    /// Requests cancellation of the running pass.
    ///
    /// The in-flight replay call finishes; no further queue entries are
    /// processed until the next trigger. Removal happens only after a call
    /// settles, so no record is left half-updated.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Returns true while a pass is active.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Returns the mutations that exhausted the retry ceiling.
    pub fn terminal_failures(&self) -> Vec<FailedMutation> {
        self.terminal.lock().clone()
    }

    /// Drains and returns the recorded terminal failures.
    pub fn take_terminal_failures(&self) -> Vec<FailedMutation> {
        std::mem::take(&mut *self.terminal.lock())
    }

    /// Returns cumulative statistics.
    pub fn stats(&self) -> SyncStats {
        self.stats.lock().clone()
    }

    fn drain(&self) -> SyncResult<SyncReport> {
        let snapshot = self.store.list();
        debug!(pending = snapshot.len(), "starting sync pass");

        let mut succeeded = 0u64;
        let mut failed = 0u64;
        let mut last_error = None;

        for mutation in snapshot {
            if self.cancelled.load(Ordering::SeqCst) {
                debug!("sync pass cancelled; leaving remaining entries for the next trigger");
                break;
            }

            match self.replay(&mutation) {
                Ok(()) => {
                    self.store.remove(mutation.id)?;
                    succeeded += 1;
                }
                Err(err) => {
                    let message = err.to_string();
                    let attempts = self.store.record_failure(mutation.id, &message)?;
                    last_error = Some(message.clone());

                    if attempts >= self.config.retry_ceiling {
                        self.store.remove(mutation.id)?;
                        warn!(
                            id = %mutation.id,
                            url = %mutation.url,
                            attempts,
                            error = %message,
                            "mutation exhausted retry ceiling; recording terminal failure"
                        );
                        let mut record = mutation.clone();
                        record.attempts = attempts;
                        record.last_error = Some(message.clone());
                        self.terminal.lock().push(FailedMutation {
                            mutation: record,
                            error: message,
                        });
                        failed += 1;
                    } else {
                        debug!(
                            id = %mutation.id,
                            attempts,
                            error = %message,
                            "replay failed; left in queue for next pass"
                        );
                    }
                }
            }
        }

        let remaining = self.store.len();
        {
            let mut stats = self.stats.lock();
            stats.passes_completed += 1;
            stats.replayed += succeeded;
            stats.terminally_failed += failed;
            stats.last_error = last_error;
        }

        info!(succeeded, failed, remaining, "sync pass finished");
        Ok(SyncReport {
            succeeded,
            failed,
            remaining,
            coalesced: false,
        })
    }

    /// Replays one mutation, classifying the outcome.
    fn replay(&self, mutation: &QueuedMutation) -> SyncResult<()> {
        let request = ApiRequest::write(mutation.method, &mutation.url, mutation.payload.clone());

        match self.client.execute(&request, self.config.replay_timeout) {
            Ok(response) if response.is_success() => Ok(()),
            Ok(response) => Err(SyncError::Rejected {
                status: response.status,
                message: String::from_utf8_lossy(&response.body).into_owned(),
            }),
            Err(ApiError::Timeout) => Err(SyncError::Timeout),
            Err(ApiError::Connection(message)) => Err(SyncError::transport_retryable(message)),
        }
    }
}
