//! Schema definitions for ledger SurrealDB tables
//!
//! Tables:
//! - ledger_entries: append-only per-key version log (values and delete markers)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::storage_traits::{KeyModification, StorageResult};

/// Module for serializing chrono DateTime to SurrealDB datetime format
mod surreal_datetime {
    use chrono::{DateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};
    use surrealdb::sql::Datetime as SurrealDatetime;

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let sd = SurrealDatetime::from(*date);
        serde::Serialize::serialize(&sd, serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let sd = SurrealDatetime::deserialize(deserializer)?;
        Ok(DateTime::from(sd))
    }
}

/// One row of the `ledger_entries` table
///
/// `(key, seq)` is unique; `seq` starts at 1 and grows by one per write to
/// the key, so the highest `seq` is the current version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntryRecord {
    pub key: String,
    pub seq: u64,
    pub tx_id: String,
    /// UTF-8 value text, absent for delete markers
    pub value: Option<String>,
    pub is_delete: bool,
    #[serde(with = "surreal_datetime")]
    pub timestamp: DateTime<Utc>,
}

impl LedgerEntryRecord {
    /// Build a value row. Fails if the bytes are not UTF-8.
    pub fn value(key: &str, seq: u64, value: &[u8]) -> StorageResult<Self> {
        let text = std::str::from_utf8(value).map_err(|e| StorageError::InvalidValue {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            key: key.to_string(),
            seq,
            tx_id: uuid::Uuid::new_v4().to_string(),
            value: Some(text.to_string()),
            is_delete: false,
            timestamp: Utc::now(),
        })
    }

    /// Build a delete-marker row.
    pub fn delete_marker(key: &str, seq: u64) -> Self {
        Self {
            key: key.to_string(),
            seq,
            tx_id: uuid::Uuid::new_v4().to_string(),
            value: None,
            is_delete: true,
            timestamp: Utc::now(),
        }
    }

    /// Current value carried by this row, if any.
    pub fn current_value(&self) -> Option<Vec<u8>> {
        if self.is_delete {
            return None;
        }
        self.value.as_ref().map(|v| v.as_bytes().to_vec())
    }

    pub fn into_modification(self) -> KeyModification {
        let value = if self.is_delete {
            None
        } else {
            self.value.map(String::into_bytes)
        };
        KeyModification {
            tx_id: self.tx_id,
            value,
            timestamp: self.timestamp,
            is_delete: self.is_delete,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_row_rejects_non_utf8() {
        let err = LedgerEntryRecord::value("k", 1, &[0xff, 0xfe]).unwrap_err();
        assert!(matches!(err, StorageError::InvalidValue { .. }));
    }

    #[test]
    fn delete_marker_has_no_current_value() {
        let row = LedgerEntryRecord::delete_marker("k", 3);
        assert!(row.current_value().is_none());

        let modification = row.into_modification();
        assert!(modification.is_delete);
        assert!(modification.value.is_none());
    }

    #[test]
    fn value_row_round_trips_bytes() {
        let row = LedgerEntryRecord::value("k", 1, br#"{"id":"k"}"#).unwrap();
        assert_eq!(row.current_value().as_deref(), Some(&br#"{"id":"k"}"#[..]));
        assert_ne!(row.tx_id, LedgerEntryRecord::value("k", 2, b"x").unwrap().tx_id);
    }
}
