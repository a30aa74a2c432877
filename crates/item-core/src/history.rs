//! History reconstruction.
//!
//! Drains a ledger history cursor into [`HistoryEntry`] values, newest
//! first, in the order the store yields them. The serialized shape is a
//! compatibility surface:
//!
//! ```text
//! [{"TxId":"…","Value":{…record…}|null,"Timestamp":"…","IsDelete":"false"}, …]
//! ```

use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use ledger_state::{HistoryStream, KeyModification};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use tracing::debug;

use crate::domain::{Item, ItemError, Result};

/// One version of a record as reported by the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(rename = "TxId")]
    pub tx_id: String,

    /// The stored record JSON, embedded verbatim; `None` for delete markers.
    #[serde(rename = "Value")]
    pub value: Option<Box<RawValue>>,

    #[serde(rename = "Timestamp")]
    pub timestamp: String,

    #[serde(rename = "IsDelete", with = "bool_string")]
    pub is_delete: bool,
}

impl HistoryEntry {
    /// Convert one ledger entry. Non-delete values must be valid JSON.
    pub fn from_modification(modification: KeyModification) -> Result<Self> {
        let value = match (modification.is_delete, modification.value) {
            (true, _) | (false, None) => None,
            (false, Some(bytes)) => {
                let text = String::from_utf8(bytes).map_err(|e| {
                    ItemError::Deserialization(format!(
                        "history value in tx {} is not UTF-8: {e}",
                        modification.tx_id
                    ))
                })?;
                let raw = RawValue::from_string(text).map_err(|e| {
                    ItemError::Deserialization(format!(
                        "history value in tx {} is not JSON: {e}",
                        modification.tx_id
                    ))
                })?;
                Some(raw)
            }
        };

        Ok(Self {
            tx_id: modification.tx_id,
            value,
            timestamp: render_timestamp(&modification.timestamp),
            is_delete: modification.is_delete,
        })
    }

    /// Decode the embedded record, if this entry carries one.
    pub fn item(&self) -> Result<Option<Item>> {
        self.value
            .as_ref()
            .map(|raw| Item::from_slice(raw.get().as_bytes()))
            .transpose()
    }
}

/// Human-readable commit time, e.g. `2024-01-02 03:04:05.123456789 +0000 UTC`.
///
/// The fraction always carries nine digits.
pub fn render_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S%.9f %z %Z").to_string()
}

/// Consume a history cursor fully.
///
/// The cursor is dropped, and so released, on every return path, including
/// a failure part-way through.
pub async fn collect_history(mut cursor: HistoryStream, id: &str) -> Result<Vec<HistoryEntry>> {
    let mut entries = Vec::new();
    while let Some(modification) = cursor
        .try_next()
        .await
        .map_err(ItemError::store("Failed to read the Item history"))?
    {
        entries.push(HistoryEntry::from_modification(modification)?);
    }
    debug!(id, entries = entries.len(), "history collected");
    Ok(entries)
}

/// Serialize a history as the JSON array callers receive.
pub fn to_json(entries: &[HistoryEntry]) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(entries)?)
}

/// `IsDelete` travels as `"true"` / `"false"`.
mod bool_string {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &bool, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(if *value { "true" } else { "false" })
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse::<bool>().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use futures::stream::{self, StreamExt};
    use ledger_state::StorageError;

    fn at(nanos: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap() + Duration::nanoseconds(nanos)
    }

    fn write(tx: &str, value: &[u8], nanos: i64) -> KeyModification {
        KeyModification {
            tx_id: tx.to_string(),
            value: Some(value.to_vec()),
            timestamp: at(nanos),
            is_delete: false,
        }
    }

    fn delete_marker(tx: &str) -> KeyModification {
        KeyModification {
            tx_id: tx.to_string(),
            value: None,
            timestamp: at(0),
            is_delete: true,
        }
    }

    #[test]
    fn timestamp_rendering() {
        assert_eq!(
            render_timestamp(&at(123_456_789)),
            "2024-01-02 03:04:05.123456789 +0000 UTC"
        );
    }

    #[test]
    fn timestamp_fraction_is_fixed_width() {
        assert_eq!(
            render_timestamp(&at(0)),
            "2024-01-02 03:04:05.000000000 +0000 UTC"
        );
        assert_eq!(
            render_timestamp(&at(500_000_000)),
            "2024-01-02 03:04:05.500000000 +0000 UTC"
        );
        assert_eq!(
            render_timestamp(&at(1_000)),
            "2024-01-02 03:04:05.000001000 +0000 UTC"
        );
    }

    #[test]
    fn entry_serializes_with_exact_field_names_and_order() {
        let entry = HistoryEntry::from_modification(write(
            "tx1",
            br#"{"id":"i1","name":"Widget","description":"A widget","price":"9.99","state":"ACTIVE"}"#,
            123_456_789,
        ))
        .unwrap();

        let json = String::from_utf8(to_json(&[entry]).unwrap()).unwrap();
        assert_eq!(
            json,
            concat!(
                r#"[{"TxId":"tx1","#,
                r#""Value":{"id":"i1","name":"Widget","description":"A widget","price":"9.99","state":"ACTIVE"},"#,
                r#""Timestamp":"2024-01-02 03:04:05.123456789 +0000 UTC","#,
                r#""IsDelete":"false"}]"#
            )
        );
    }

    #[test]
    fn delete_marker_serializes_null_value() {
        let entry = HistoryEntry::from_modification(delete_marker("tx9")).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&to_json(&[entry]).unwrap()).unwrap();
        assert!(json[0]["Value"].is_null());
        assert_eq!(json[0]["IsDelete"], "true");
    }

    #[test]
    fn entries_deserialize_back() {
        let entries = vec![
            HistoryEntry::from_modification(delete_marker("tx2")).unwrap(),
            HistoryEntry::from_modification(write("tx1", br#"{"id":"i1","name":"n","description":"d","price":"1","state":"S"}"#, 5)).unwrap(),
        ];
        let decoded: Vec<HistoryEntry> = serde_json::from_slice(&to_json(&entries).unwrap()).unwrap();
        assert!(decoded[0].is_delete);
        assert!(decoded[0].item().unwrap().is_none());
        assert_eq!(decoded[1].item().unwrap().unwrap().id, "i1");
    }

    #[test]
    fn non_json_value_is_a_deserialization_error() {
        let err = HistoryEntry::from_modification(write("tx1", b"garbage{", 0)).unwrap_err();
        assert!(matches!(err, ItemError::Deserialization(_)));
    }

    #[tokio::test]
    async fn collect_preserves_store_order() {
        let cursor = stream::iter(vec![
            Ok(write("tx3", b"3", 3)),
            Ok(write("tx1", b"1", 1)),
            Ok(write("tx2", b"2", 2)),
        ])
        .boxed();
        let entries = collect_history(cursor, "k").await.unwrap();
        let ids: Vec<&str> = entries.iter().map(|e| e.tx_id.as_str()).collect();
        assert_eq!(ids, vec!["tx3", "tx1", "tx2"]);
    }

    #[tokio::test]
    async fn cursor_error_becomes_store_error() {
        let cursor = stream::iter(vec![
            Ok(write("tx1", b"1", 1)),
            Err(StorageError::CursorFailed {
                key: "k".to_string(),
                reason: "boom".to_string(),
            }),
        ])
        .boxed();
        let err = collect_history(cursor, "k").await.unwrap_err();
        assert!(matches!(
            err,
            ItemError::Store {
                source: StorageError::CursorFailed { .. },
                ..
            }
        ));
    }

    #[tokio::test]
    async fn empty_cursor_is_empty_history() {
        let cursor = stream::iter(Vec::new()).boxed();
        assert!(collect_history(cursor, "k").await.unwrap().is_empty());
    }
}
