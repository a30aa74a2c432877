//! In-memory ledger store (testing and ephemeral use)
//!
//! `MemoryLedgerStore` satisfies the `LedgerStore` contract without any
//! external dependencies, and exposes counters and fault switches so
//! callers can observe how the store was used.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use futures::stream::{self, StreamExt};
use tracing::debug;

use crate::error::StorageError;
use crate::storage_traits::*;

#[derive(Debug, Default)]
struct Faults {
    fail_reads: bool,
    fail_writes: bool,
    fail_history_after: Option<usize>,
}

#[derive(Debug, Default)]
struct Ledger {
    /// Per-key history, newest last.
    entries: HashMap<String, Vec<KeyModification>>,
    last_commit: Option<DateTime<Utc>>,
}

impl Ledger {
    /// Commit timestamps are strictly increasing within one store.
    fn next_timestamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let ts = match self.last_commit {
            Some(last) if now <= last => last + Duration::nanoseconds(1),
            _ => now,
        };
        self.last_commit = Some(ts);
        ts
    }

    fn append(&mut self, key: &str, value: Option<Vec<u8>>) {
        let timestamp = self.next_timestamp();
        let entry = KeyModification {
            tx_id: uuid::Uuid::new_v4().to_string(),
            is_delete: value.is_none(),
            value,
            timestamp,
        };
        self.entries.entry(key.to_string()).or_default().push(entry);
    }
}

/// Decrements the open-cursor gauge when a history stream is dropped.
struct CursorGuard {
    open: Arc<AtomicUsize>,
}

impl CursorGuard {
    fn acquire(open: &Arc<AtomicUsize>) -> Self {
        open.fetch_add(1, Ordering::SeqCst);
        Self { open: open.clone() }
    }
}

impl Drop for CursorGuard {
    fn drop(&mut self) {
        self.open.fetch_sub(1, Ordering::SeqCst);
    }
}

struct Cursor {
    key: String,
    entries: std::vec::IntoIter<KeyModification>,
    fail_after: Option<usize>,
    yielded: usize,
    failed: bool,
    _guard: CursorGuard,
}

/// In-memory ledger backed by a `HashMap<key, Vec<KeyModification>>`.
#[derive(Debug, Default)]
pub struct MemoryLedgerStore {
    ledger: Mutex<Ledger>,
    faults: Mutex<Faults>,
    reads: AtomicUsize,
    writes: AtomicUsize,
    open_cursors: Arc<AtomicUsize>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `get` and `history_of` calls made so far.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of `put` and `delete` calls made so far.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// History cursors handed out and not yet dropped.
    pub fn open_cursors(&self) -> usize {
        self.open_cursors.load(Ordering::SeqCst)
    }

    /// Make every subsequent `get` and `history_of` fail.
    pub fn fail_reads(&self, fail: bool) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.fail_reads = fail;
        }
    }

    /// Make every subsequent `put` and `delete` fail.
    pub fn fail_writes(&self, fail: bool) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.fail_writes = fail;
        }
    }

    /// Make history cursors fail after yielding `n` entries.
    pub fn fail_history_after(&self, n: Option<usize>) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.fail_history_after = n;
        }
    }

    /// Store raw bytes under `key` without going through the counters.
    pub fn seed_raw(&self, key: &str, value: &[u8]) {
        if let Ok(mut ledger) = self.ledger.lock() {
            ledger.append(key, Some(value.to_vec()));
        }
    }

    fn ledger(&self) -> StorageResult<MutexGuard<'_, Ledger>> {
        self.ledger
            .lock()
            .map_err(|_| StorageError::Backend("memory ledger lock poisoned".to_string()))
    }

    fn faults(&self) -> StorageResult<MutexGuard<'_, Faults>> {
        self.faults
            .lock()
            .map_err(|_| StorageError::Backend("memory ledger lock poisoned".to_string()))
    }

    fn check_write(&self, key: &str) -> StorageResult<()> {
        check_key(key)?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.faults()?.fail_writes {
            return Err(StorageError::Backend(format!(
                "injected write failure for key {key}"
            )));
        }
        Ok(())
    }

    fn check_read(&self, key: &str) -> StorageResult<()> {
        check_key(key)?;
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.faults()?.fail_reads {
            return Err(StorageError::Backend(format!(
                "injected read failure for key {key}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        self.check_read(key)?;
        let ledger = self.ledger()?;
        Ok(ledger
            .entries
            .get(key)
            .and_then(|history| history.last())
            .and_then(|latest| latest.value.clone()))
    }

    async fn put(&self, key: &str, value: &[u8]) -> StorageResult<()> {
        self.check_write(key)?;
        self.ledger()?.append(key, Some(value.to_vec()));
        Ok(())
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.check_write(key)?;
        self.ledger()?.append(key, None);
        Ok(())
    }

    async fn history_of(&self, key: &str) -> StorageResult<HistoryStream> {
        self.check_read(key)?;
        let mut entries = self
            .ledger()?
            .entries
            .get(key)
            .cloned()
            .unwrap_or_default();
        entries.reverse(); // newest first

        debug!(key, entries = entries.len(), "opening history cursor");

        let cursor = Cursor {
            key: key.to_string(),
            entries: entries.into_iter(),
            fail_after: self.faults()?.fail_history_after,
            yielded: 0,
            failed: false,
            _guard: CursorGuard::acquire(&self.open_cursors),
        };

        let stream = stream::unfold(cursor, |mut cursor| async move {
            if cursor.failed {
                return None;
            }
            if cursor.fail_after == Some(cursor.yielded) {
                cursor.failed = true;
                let err = StorageError::CursorFailed {
                    key: cursor.key.clone(),
                    reason: format!("injected failure after {} entries", cursor.yielded),
                };
                return Some((Err(err), cursor));
            }
            match cursor.entries.next() {
                Some(entry) => {
                    cursor.yielded += 1;
                    Some((Ok(entry), cursor))
                }
                None => None,
            }
        });

        Ok(stream.boxed())
    }
}
