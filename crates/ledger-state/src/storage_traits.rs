//! Storage trait definitions for the item ledger
//!
//! `LedgerStore` is the only capability the record core consumes:
//! - point read and point write by key
//! - an append-only, per-key version history (including delete markers)
//!
//! The trait is async and backend-agnostic. An in-memory implementation
//! is provided for testing via the `fakes` module.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// Result type for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// One past write to a key, as recorded by the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyModification {
    /// Identifier of the transaction that produced this version
    pub tx_id: String,
    /// Value written, `None` for a delete marker
    pub value: Option<Vec<u8>>,
    /// Commit time of the write
    pub timestamp: DateTime<Utc>,
    /// True when this entry is a store-level delete marker
    pub is_delete: bool,
}

/// Lazy, single-pass cursor over a key's history, newest first.
///
/// The cursor is released when the stream is dropped, so every exit path of
/// a consumer (including `?` on a failed entry) gives it back to the backend.
pub type HistoryStream = BoxStream<'static, StorageResult<KeyModification>>;

/// Ordered key-value ledger.
///
/// Guarantees:
/// - `get` returns the bytes of the latest write, or `None` if the key was
///   never written or its latest entry is a delete marker.
/// - Every `put` and `delete` appends exactly one history entry with a
///   fresh transaction id.
/// - `history_of` yields every entry for the key, most recent first. An
///   unknown key yields an empty stream.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Read the current value for `key`.
    async fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>>;

    /// Write `value` as the new current value for `key`.
    async fn put(&self, key: &str, value: &[u8]) -> StorageResult<()>;

    /// Append a delete marker for `key`.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Open a history cursor for `key`.
    async fn history_of(&self, key: &str) -> StorageResult<HistoryStream>;
}

#[async_trait]
impl<T: LedgerStore + ?Sized> LedgerStore for Arc<T> {
    async fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        (**self).get(key).await
    }

    async fn put(&self, key: &str, value: &[u8]) -> StorageResult<()> {
        (**self).put(key, value).await
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        (**self).delete(key).await
    }

    async fn history_of(&self, key: &str) -> StorageResult<HistoryStream> {
        (**self).history_of(key).await
    }
}

/// Reject empty keys before they reach a backend.
pub(crate) fn check_key(key: &str) -> StorageResult<()> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey {
            key: key.to_string(),
        });
    }
    Ok(())
}
