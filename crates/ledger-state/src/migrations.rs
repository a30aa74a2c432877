//! SurrealDB schema migrations and initialization
//!
//! Sets up the append-only `ledger_entries` table with the indexes the
//! backend relies on for ordering and write-conflict detection.

use crate::error::StateError;
use crate::Result;
use surrealdb::engine::any::Any;
use surrealdb::Surreal;
use tracing::{debug, info};

/// Initialize all ledger tables in SurrealDB
///
/// Safe to call multiple times (idempotent).
pub async fn init_schema(db: &Surreal<Any>) -> Result<()> {
    info!("Initializing ledger SurrealDB schema");
    init_ledger_entries_table(db).await?;
    info!("Ledger schema initialization complete");
    Ok(())
}

/// Initialize `ledger_entries` table with constraints and indexes
///
/// Schema:
/// ```text
/// TABLE ledger_entries {
///   key:        STRING (indexed)
///   seq:        INT    (per-key monotonic version number)
///   tx_id:      STRING (unique)
///   value:      STRING? (absent for delete markers)
///   is_delete:  BOOL
///   timestamp:  DATETIME
/// }
/// ```
///
/// Constraints:
/// - `(key, seq)` is unique: two writers racing for the same next version
///   cannot both commit
/// - rows are never updated or deleted (append-only)
async fn init_ledger_entries_table(db: &Surreal<Any>) -> Result<()> {
    debug!("Initializing ledger_entries table");

    let sql = r#"
        DEFINE TABLE IF NOT EXISTS ledger_entries
            SCHEMALESS
            PERMISSIONS
                FOR create FULL
                FOR select FULL
                FOR update NONE
                FOR delete NONE;

        -- One row per (key, version)
        DEFINE INDEX IF NOT EXISTS idx_key_seq ON TABLE ledger_entries COLUMNS key, seq UNIQUE;

        -- Transaction ids identify exactly one write
        DEFINE INDEX IF NOT EXISTS idx_tx_id ON TABLE ledger_entries COLUMNS tx_id UNIQUE;
    "#;

    db.query(sql)
        .await
        .map_err(|e| StateError::SchemaSetup(e.to_string()))?
        .check()
        .map_err(|e| StateError::SchemaSetup(e.to_string()))?;
    info!("ledger_entries table initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn mem_db() -> Surreal<Any> {
        let db = surrealdb::engine::any::connect("mem://").await.unwrap();
        db.use_ns("test").use_db("test").await.unwrap();
        db
    }

    #[tokio::test]
    async fn schema_parses_and_applies() {
        let db = mem_db().await;
        init_schema(&db).await.unwrap();

        let mut res = db.query("INFO FOR TABLE ledger_entries").await.unwrap();
        let info: surrealdb::Value = res.take(0).unwrap();
        let info = format!("{info:?}");
        assert!(info.contains("idx_key_seq"));
        assert!(info.contains("idx_tx_id"));
    }

    #[tokio::test]
    async fn schema_init_is_idempotent() {
        let db = mem_db().await;
        init_schema(&db).await.unwrap();
        init_schema(&db).await.unwrap();
    }
}
