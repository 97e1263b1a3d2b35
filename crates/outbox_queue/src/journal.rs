//! File-backed journal store for persistent queues.

use crate::error::{StoreError, StoreResult};
use crate::record::{Method, MutationId, QueuedMutation};
use crate::store::QueueStore;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

/// The durable form of a queued mutation, one JSON object per journal line.
///
/// Attempt bookkeeping is deliberately absent: a reopened journal starts
/// every record at zero attempts.
#[derive(Debug, Serialize, Deserialize)]
struct JournalRecord {
    id: MutationId,
    method: Method,
    url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<Vec<u8>>,
    enqueued_at: u64,
}

impl From<&QueuedMutation> for JournalRecord {
    fn from(record: &QueuedMutation) -> Self {
        Self {
            id: record.id,
            method: record.method,
            url: record.url.clone(),
            data: record.payload.clone(),
            enqueued_at: record.enqueued_at,
        }
    }
}

impl From<JournalRecord> for QueuedMutation {
    fn from(record: JournalRecord) -> Self {
        Self {
            id: record.id,
            method: record.method,
            url: record.url,
            payload: record.data,
            enqueued_at: record.enqueued_at,
            attempts: 0,
            last_error: None,
        }
    }
}

struct Inner {
    records: Vec<QueuedMutation>,
    file: File,
}

/// A crash-safe, file-backed queue store.
///
/// Records are stored as a JSON-lines journal. `enqueue` appends one line
/// and syncs the file before returning, so a write survives immediate
/// process termination. Removals rewrite the journal through a temporary
/// file and an atomic rename.
///
/// An unreadable or corrupt journal is reset to empty on open; the error
/// is logged and never reaches the write path.
///
/// # Thread Safety
///
/// All operations, in-memory and on-disk alike, run inside one mutex
/// critical section.
///
/// # Example
///
/// ```no_run
/// use outbox_queue::{JournalStore, Method, QueueStore};
///
/// let store = JournalStore::open("queue.jsonl").unwrap();
/// store.enqueue(Method::Post, "/api/orders", Some(b"{}".to_vec())).unwrap();
/// ```
pub struct JournalStore {
    path: PathBuf,
    inner: Mutex<Inner>,
}

impl JournalStore {
    /// Opens or creates a journal at the given path.
    ///
    /// Existing records are loaded in journal order. If the journal cannot
    /// be parsed, the queue is reset to empty and the corruption is logged.
    ///
    /// # Errors
    ///
    /// Returns an error only if the file itself cannot be created or
    /// opened.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let records = match Self::load(&path) {
            Ok(records) => records,
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "queue journal unreadable; resetting to empty"
                );
                File::create(&path)?;
                Vec::new()
            }
        };

        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            path,
            inner: Mutex::new(Inner { records, file }),
        })
    }

    /// Returns the path to the underlying journal file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(path: &Path) -> StoreResult<Vec<QueuedMutation>> {
        if !path.exists() {
            return Ok(Vec::new());
        }

        let reader = BufReader::new(File::open(path)?);
        let mut records = Vec::new();
        for (lineno, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record: JournalRecord = serde_json::from_str(&line)
                .map_err(|e| StoreError::Corrupted(format!("line {}: {}", lineno + 1, e)))?;
            records.push(record.into());
        }
        Ok(records)
    }

    /// Rewrites the whole journal from the in-memory records.
    ///
    /// Writes a temporary file, syncs it, then renames it over the
    /// journal so a crash mid-rewrite leaves the previous journal intact.
    fn rewrite(&self, inner: &mut Inner) -> StoreResult<()> {
        let temp_path = self.path.with_extension("tmp");

        let mut temp = File::create(&temp_path)?;
        for record in &inner.records {
            let line = serde_json::to_string(&JournalRecord::from(record))?;
            writeln!(temp, "{line}")?;
        }
        temp.sync_all()?;
        fs::rename(&temp_path, &self.path)?;

        // The rename replaced the inode the append handle points at.
        inner.file = OpenOptions::new().append(true).open(&self.path)?;
        Ok(())
    }
}

impl QueueStore for JournalStore {
    fn enqueue(
        &self,
        method: Method,
        url: &str,
        payload: Option<Vec<u8>>,
    ) -> StoreResult<MutationId> {
        let record = QueuedMutation::new(method, url, payload);
        let id = record.id;
        let line = serde_json::to_string(&JournalRecord::from(&record))?;

        let mut inner = self.inner.lock();
        writeln!(inner.file, "{line}")?;
        inner.file.sync_all()?;
        inner.records.push(record);
        Ok(id)
    }

    fn list(&self) -> Vec<QueuedMutation> {
        self.inner.lock().records.clone()
    }

    fn remove(&self, id: MutationId) -> StoreResult<bool> {
        let mut inner = self.inner.lock();
        let before = inner.records.len();
        inner.records.retain(|r| r.id != id);
        if inner.records.len() == before {
            return Ok(false);
        }
        self.rewrite(&mut inner)?;
        Ok(true)
    }

    fn record_failure(&self, id: MutationId, error: &str) -> StoreResult<u32> {
        let mut inner = self.inner.lock();
        match inner.records.iter_mut().find(|r| r.id == id) {
            Some(record) => {
                record.attempts += 1;
                record.last_error = Some(error.to_string());
                Ok(record.attempts)
            }
            None => Ok(0),
        }
    }

    fn clear(&self) -> StoreResult<()> {
        let mut inner = self.inner.lock();
        inner.records.clear();
        self.rewrite(&mut inner)
    }

    fn len(&self) -> usize {
        self.inner.lock().records.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn open_creates_empty_journal() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("queue.jsonl");

        let store = JournalStore::open(&path).unwrap();
        assert!(store.is_empty());
        assert!(path.exists());
        assert_eq!(store.path(), path);
    }

    #[test]
    fn enqueue_is_durable_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("queue.jsonl");

        let id = {
            let store = JournalStore::open(&path).unwrap();
            store
                .enqueue(Method::Post, "/api/orders", Some(b"{\"items\":[]}".to_vec()))
                .unwrap()
        };

        // Simulated restart: reopen and check the record survived.
        let store = JournalStore::open(&path).unwrap();
        let records = store.list();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, id);
        assert_eq!(records[0].method, Method::Post);
        assert_eq!(records[0].url, "/api/orders");
        assert_eq!(records[0].payload.as_deref(), Some(&b"{\"items\":[]}"[..]));
    }

    #[test]
    fn reopen_preserves_insertion_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("queue.jsonl");

        let ids = {
            let store = JournalStore::open(&path).unwrap();
            vec![
                store.enqueue(Method::Post, "/a", None).unwrap(),
                store.enqueue(Method::Put, "/b", None).unwrap(),
                store.enqueue(Method::Delete, "/c", None).unwrap(),
            ]
        };

        let store = JournalStore::open(&path).unwrap();
        let loaded: Vec<_> = store.list().into_iter().map(|r| r.id).collect();
        assert_eq!(loaded, ids);
    }

    #[test]
    fn remove_is_durable_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("queue.jsonl");

        let keep = {
            let store = JournalStore::open(&path).unwrap();
            let drop_id = store.enqueue(Method::Post, "/a", None).unwrap();
            let keep = store.enqueue(Method::Post, "/b", None).unwrap();
            assert!(store.remove(drop_id).unwrap());
            keep
        };

        let store = JournalStore::open(&path).unwrap();
        let records = store.list();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, keep);
    }

    #[test]
    fn corrupt_journal_resets_to_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("queue.jsonl");
        fs::write(&path, b"this is not json\n").unwrap();

        let store = JournalStore::open(&path).unwrap();
        assert!(store.is_empty());

        // The store must remain usable after the reset.
        store.enqueue(Method::Post, "/a", None).unwrap();
        drop(store);

        let store = JournalStore::open(&path).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn partial_trailing_record_resets_to_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("queue.jsonl");

        {
            let store = JournalStore::open(&path).unwrap();
            store.enqueue(Method::Post, "/a", None).unwrap();
        }
        // Torn write: truncate the journal mid-record.
        let contents = fs::read(&path).unwrap();
        fs::write(&path, &contents[..contents.len() / 2]).unwrap();

        let store = JournalStore::open(&path).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn attempts_are_not_persisted() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("queue.jsonl");

        let id = {
            let store = JournalStore::open(&path).unwrap();
            let id = store.enqueue(Method::Post, "/a", None).unwrap();
            store.record_failure(id, "timeout").unwrap();
            store.record_failure(id, "timeout").unwrap();
            assert_eq!(store.list()[0].attempts, 2);
            id
        };

        let store = JournalStore::open(&path).unwrap();
        let record = &store.list()[0];
        assert_eq!(record.id, id);
        assert_eq!(record.attempts, 0);
        assert!(record.last_error.is_none());
    }

    #[test]
    fn clear_is_durable_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("queue.jsonl");

        {
            let store = JournalStore::open(&path).unwrap();
            store.enqueue(Method::Post, "/a", None).unwrap();
            store.enqueue(Method::Post, "/b", None).unwrap();
            store.clear().unwrap();
        }

        let store = JournalStore::open(&path).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn blank_lines_are_tolerated() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("queue.jsonl");

        {
            let store = JournalStore::open(&path).unwrap();
            store.enqueue(Method::Post, "/a", None).unwrap();
        }
        let mut contents = fs::read(&path).unwrap();
        contents.extend_from_slice(b"\n\n");
        fs::write(&path, contents).unwrap();

        let store = JournalStore::open(&path).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn enqueue_after_remove_appends_at_the_end() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("queue.jsonl");

        let store = JournalStore::open(&path).unwrap();
        let a = store.enqueue(Method::Post, "/a", None).unwrap();
        store.enqueue(Method::Post, "/b", None).unwrap();
        store.remove(a).unwrap();
        let c = store.enqueue(Method::Post, "/c", None).unwrap();

        let urls: Vec<_> = store.list().into_iter().map(|r| r.url).collect();
        assert_eq!(urls, vec!["/b", "/c"]);
        drop(store);

        let store = JournalStore::open(&path).unwrap();
        assert_eq!(store.list()[1].id, c);
    }
}
