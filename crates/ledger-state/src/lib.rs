//! Ledger-State: Ordered Key-Value Ledger Backends
//!
//! This crate provides the persistence layer for the item ledger. It
//! defines the `LedgerStore` capability the record core consumes and ships
//! two implementations of it.
//!
//! ## Layer 0 - Data/Persistence
//!
//! Focus: point reads and writes, append-only per-key history.
//!
//! ## Key Components
//!
//! - `LedgerStore`: get / put / delete / history_of
//! - `MemoryLedgerStore`: in-memory store with counters and fault injection
//! - `SurrealLedgerStore`: SurrealDB-backed store (`mem://`, SurrealKV, remote)

pub mod config;
mod error;
pub mod fakes;
mod migrations;
mod schema;
pub mod storage_traits;
pub mod surreal_ledger;

pub use config::{CloudConfig, ConnectTarget};
pub use error::{StateError, StorageError};
pub use fakes::MemoryLedgerStore;
pub use schema::LedgerEntryRecord;
pub use storage_traits::{HistoryStream, KeyModification, LedgerStore, StorageResult};
pub use surreal_ledger::SurrealLedgerStore;

/// Result type for ledger-state setup operations
pub type Result<T> = std::result::Result<T, StateError>;
