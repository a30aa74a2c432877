//! SurrealDB-backed LedgerStore implementation
//!
//! Every write appends a `schema::LedgerEntryRecord` row; the current value
//! of a key is its highest-`seq` row, and history is the rows in descending
//! `seq` order. History is fetched a page at a time as the stream is polled,
//! so memory stays bounded by the page size.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use surrealdb::engine::any::Any;
use surrealdb::opt::auth::{Database, Root};
use surrealdb::Surreal;
use tracing::{debug, info};

use crate::config::{CloudConfig, ConnectTarget, DEFAULT_DATABASE, DEFAULT_NAMESPACE};
use crate::error::{StateError, StorageError};
use crate::migrations;
use crate::schema::LedgerEntryRecord as DbEntry;
use crate::storage_traits::{check_key, HistoryStream, KeyModification, LedgerStore, StorageResult};

const TABLE: &str = "ledger_entries";

/// Rows fetched per history round-trip.
pub const DEFAULT_HISTORY_PAGE: usize = 64;

/// Walks a key's rows in descending `seq` order, one page per query.
struct HistoryPager {
    db: Surreal<Any>,
    key: String,
    /// Only rows with `seq` below this are fetched next.
    before: Option<u64>,
    page_size: usize,
}

impl HistoryPager {
    async fn next_page(&self) -> StorageResult<Vec<DbEntry>> {
        let filter = if self.before.is_some() {
            "key = $key AND seq < $before"
        } else {
            "key = $key"
        };
        let sql = format!(
            "SELECT * FROM type::table($table) WHERE {filter} ORDER BY seq DESC LIMIT {}",
            self.page_size
        );

        let cursor_failed = |e: surrealdb::Error| StorageError::CursorFailed {
            key: self.key.clone(),
            reason: e.to_string(),
        };

        let mut res = self
            .db
            .query(sql)
            .bind(("table", TABLE))
            .bind(("key", self.key.clone()))
            .bind(("before", self.before.unwrap_or_default()))
            .await
            .map_err(cursor_failed)?;
        res.take(0).map_err(cursor_failed)
    }
}

/// SurrealDB-backed implementation of [`LedgerStore`].
#[derive(Clone)]
pub struct SurrealLedgerStore {
    db: Surreal<Any>,
    history_page: usize,
}

impl SurrealLedgerStore {
    /// Create an in-memory instance for testing.
    ///
    /// Connects to `mem://`, selects the default namespace/database, and runs
    /// `init_schema`.
    pub async fn in_memory() -> crate::Result<Self> {
        Self::connect("mem://").await
    }

    /// Connect to any SurrealDB URL without authentication.
    pub async fn connect(url: &str) -> crate::Result<Self> {
        let db = surrealdb::engine::any::connect(url)
            .await
            .map_err(|e| StateError::Connection(format!("Failed to connect to {}: {}", url, e)))?;

        db.use_ns(DEFAULT_NAMESPACE)
            .use_db(DEFAULT_DATABASE)
            .await
            .map_err(|e| StateError::Connection(e.to_string()))?;

        migrations::init_schema(&db).await?;
        info!("SurrealLedgerStore connected ({})", url);
        Ok(Self {
            db,
            history_page: DEFAULT_HISTORY_PAGE,
        })
    }

    /// Connect with credentials.
    pub async fn connect_cloud(config: &CloudConfig) -> crate::Result<Self> {
        let db = surrealdb::engine::any::connect(&config.endpoint)
            .await
            .map_err(|e| {
                StateError::Connection(format!("Failed to connect to {}: {}", config.endpoint, e))
            })?;

        if config.is_root {
            db.signin(Root {
                username: &config.username,
                password: &config.password,
            })
            .await
            .map_err(|e| StateError::Connection(format!("Root auth failed: {e}")))?;
        } else {
            db.signin(Database {
                namespace: &config.namespace,
                database: &config.database,
                username: &config.username,
                password: &config.password,
            })
            .await
            .map_err(|e| StateError::Connection(format!("DB auth failed: {e}")))?;
        }

        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await
            .map_err(|e| StateError::Connection(e.to_string()))?;

        migrations::init_schema(&db).await?;
        info!(endpoint = %config.endpoint, "SurrealLedgerStore connected (cloud)");
        Ok(Self {
            db,
            history_page: DEFAULT_HISTORY_PAGE,
        })
    }

    /// Connect to a resolved [`ConnectTarget`].
    pub async fn open(target: &ConnectTarget) -> crate::Result<Self> {
        match target {
            ConnectTarget::Cloud(config) => Self::connect_cloud(config).await,
            ConnectTarget::Url(url) => Self::connect(url).await,
            ConnectTarget::Local(path) => {
                tokio::fs::create_dir_all(path).await.map_err(|e| {
                    StateError::Connection(format!(
                        "Failed to create database directory {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                Self::connect(&format!("surrealkv://{}", path.display())).await
            }
        }
    }

    /// Create from environment variables (see [`crate::config`]).
    pub async fn from_env() -> crate::Result<Self> {
        Self::open(&ConnectTarget::from_env()).await
    }

    /// Set how many rows each history query fetches (minimum 1).
    pub fn with_history_page_size(mut self, rows: usize) -> Self {
        self.history_page = rows.max(1);
        self
    }

    // -- private helpers -----------------------------------------------------

    /// Fetch the highest-`seq` row for a key.
    async fn latest(&self, key: &str) -> StorageResult<Option<DbEntry>> {
        let mut res = self
            .db
            .query("SELECT * FROM type::table($table) WHERE key = $key ORDER BY seq DESC LIMIT 1")
            .bind(("table", TABLE))
            .bind(("key", key.to_string()))
            .await
            .map_err(StorageError::backend)?;

        let rows: Vec<DbEntry> = res.take(0).map_err(StorageError::backend)?;
        Ok(rows.into_iter().next())
    }

    /// Append a row as the next version of its key.
    async fn append(&self, row: DbEntry) -> StorageResult<()> {
        let key = row.key.clone();
        debug!(key = %key, seq = row.seq, tx_id = %row.tx_id, "appending ledger entry");

        let created: Option<DbEntry> = self
            .db
            .create(TABLE)
            .content(row)
            .await
            .map_err(|e| classify_write_error(&key, e))?;

        if created.is_none() {
            return Err(StorageError::Backend(format!(
                "ledger entry for key {key} was not created"
            )));
        }
        Ok(())
    }

    async fn next_seq(&self, key: &str) -> StorageResult<u64> {
        Ok(self.latest(key).await?.map(|row| row.seq + 1).unwrap_or(1))
    }
}

/// A unique-index violation or a transaction conflict means another writer
/// took this version first.
fn classify_write_error(key: &str, err: surrealdb::Error) -> StorageError {
    let msg = err.to_string();
    if msg.contains("already contains") || msg.contains("read or write conflict") {
        StorageError::Conflict {
            key: key.to_string(),
        }
    } else {
        StorageError::Backend(msg)
    }
}

#[async_trait]
impl LedgerStore for SurrealLedgerStore {
    async fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        check_key(key)?;
        Ok(self.latest(key).await?.and_then(|row| row.current_value()))
    }

    async fn put(&self, key: &str, value: &[u8]) -> StorageResult<()> {
        check_key(key)?;
        let seq = self.next_seq(key).await?;
        self.append(DbEntry::value(key, seq, value)?).await
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        check_key(key)?;
        let seq = self.next_seq(key).await?;
        self.append(DbEntry::delete_marker(key, seq)).await
    }

    async fn history_of(&self, key: &str) -> StorageResult<HistoryStream> {
        check_key(key)?;
        debug!(key, page_size = self.history_page, "opening history cursor");

        let pager = HistoryPager {
            db: self.db.clone(),
            key: key.to_string(),
            before: None,
            page_size: self.history_page,
        };

        // Each state is the pager for the next page, or `None` once exhausted.
        let pages = stream::unfold(Some(pager), |state| async move {
            let mut pager = match state {
                Some(pager) => pager,
                None => return None,
            };
            match pager.next_page().await {
                Ok(rows) if rows.is_empty() => None,
                Ok(rows) => {
                    let exhausted = rows.len() < pager.page_size;
                    pager.before = rows.last().map(|row| row.seq);
                    let entries: Vec<StorageResult<KeyModification>> = rows
                        .into_iter()
                        .map(|row| Ok(row.into_modification()))
                        .collect();
                    Some((entries, if exhausted { None } else { Some(pager) }))
                }
                Err(err) => Some((vec![Err(err)], None)),
            }
        });

        Ok(pages.flat_map(stream::iter).boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;

    #[tokio::test]
    async fn duplicate_version_is_a_conflict() {
        let store = SurrealLedgerStore::in_memory().await.unwrap();
        store.append(DbEntry::value("k", 1, b"first").unwrap()).await.unwrap();

        let err = store
            .append(DbEntry::value("k", 1, b"second").unwrap())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            StorageError::Conflict {
                key: "k".to_string()
            }
        );
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some(&b"first"[..]));
    }

    #[tokio::test]
    async fn racing_writers_commit_distinct_versions_or_conflict() {
        let store = SurrealLedgerStore::in_memory().await.unwrap();
        let (a, b) = tokio::join!(store.put("k", b"a"), store.put("k", b"b"));

        for result in [&a, &b] {
            assert!(matches!(
                result,
                Ok(()) | Err(StorageError::Conflict { .. })
            ));
        }
        assert!(a.is_ok() || b.is_ok());

        let committed = a.is_ok() as usize + b.is_ok() as usize;
        let history: Vec<KeyModification> =
            store.history_of("k").await.unwrap().try_collect().await.unwrap();
        assert_eq!(history.len(), committed);
    }

    #[tokio::test]
    async fn history_spans_pages_in_order() {
        let store = SurrealLedgerStore::in_memory()
            .await
            .unwrap()
            .with_history_page_size(2);
        for n in 1..=5 {
            store.put("k", format!("v{n}").as_bytes()).await.unwrap();
        }

        let history: Vec<KeyModification> =
            store.history_of("k").await.unwrap().try_collect().await.unwrap();
        let values: Vec<&[u8]> = history
            .iter()
            .map(|h| h.value.as_deref().unwrap())
            .collect();
        assert_eq!(
            values,
            vec![&b"v5"[..], &b"v4"[..], &b"v3"[..], &b"v2"[..], &b"v1"[..]]
        );
    }

    #[tokio::test]
    async fn history_of_exact_page_multiple_ends_cleanly() {
        let store = SurrealLedgerStore::in_memory()
            .await
            .unwrap()
            .with_history_page_size(2);
        for n in 1..=4 {
            store.put("k", format!("v{n}").as_bytes()).await.unwrap();
        }
        store.put("other", b"x").await.unwrap();

        let history: Vec<KeyModification> =
            store.history_of("k").await.unwrap().try_collect().await.unwrap();
        assert_eq!(history.len(), 4);
    }

    #[tokio::test]
    async fn history_cursor_fetches_on_demand() {
        let store = SurrealLedgerStore::in_memory()
            .await
            .unwrap()
            .with_history_page_size(1);
        store.put("k", b"old").await.unwrap();
        let mut cursor = store.history_of("k").await.unwrap();

        // Written after the cursor opened but before the first poll.
        store.put("k", b"new").await.unwrap();

        let first = cursor.try_next().await.unwrap().unwrap();
        assert_eq!(first.value.as_deref(), Some(&b"new"[..]));
        let second = cursor.try_next().await.unwrap().unwrap();
        assert_eq!(second.value.as_deref(), Some(&b"old"[..]));
        assert!(cursor.try_next().await.unwrap().is_none());
    }
}
