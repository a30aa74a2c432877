//! Error types for ledger-state

use thiserror::Error;

/// Errors that can occur while connecting to or preparing a ledger backend
#[derive(Error, Debug)]
pub enum StateError {
    /// Database connection error
    #[error("Database connection failed: {0}")]
    Connection(String),

    /// Database query error
    #[error("Database query failed: {0}")]
    Query(String),

    /// Schema setup error
    #[error("Schema setup failed: {0}")]
    SchemaSetup(String),

    /// Missing or malformed configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<surrealdb::Error> for StateError {
    fn from(err: surrealdb::Error) -> Self {
        StateError::Query(err.to_string())
    }
}

/// Errors returned by [`crate::LedgerStore`] operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Substrate-level failure (read, write, query)
    #[error("ledger backend error: {0}")]
    Backend(String),

    /// Keys must be non-empty
    #[error("invalid ledger key: {key:?}")]
    InvalidKey { key: String },

    /// The value cannot be stored by this backend
    #[error("invalid value for key {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    /// A concurrent writer committed a conflicting version first
    #[error("write conflict on key {key}")]
    Conflict { key: String },

    /// The history cursor failed part-way through
    #[error("history cursor for key {key} failed: {reason}")]
    CursorFailed { key: String, reason: String },
}

impl StorageError {
    pub(crate) fn backend(err: impl std::fmt::Display) -> Self {
        StorageError::Backend(err.to_string())
    }
}
