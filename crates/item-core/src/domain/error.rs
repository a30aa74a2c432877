//! Domain-level error taxonomy for the item ledger.

use ledger_state::StorageError;

/// Errors produced by argument validation. Never reach the store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{message}")]
    Arity {
        operation: &'static str,
        actual: usize,
        message: &'static str,
    },

    #[error("{message}")]
    EmptyArgument {
        operation: &'static str,
        field: &'static str,
        message: &'static str,
    },
}

/// Item ledger domain errors.
#[derive(Debug, thiserror::Error)]
pub enum ItemError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("An Item already exists for this ID: {id}")]
    Conflict { id: String },

    #[error("An Item does not exist for this ID: {id}")]
    NotFound { id: String },

    #[error("stored Item is malformed: {0}")]
    Deserialization(String),

    #[error("{context}: {source}")]
    Store {
        context: String,
        #[source]
        source: StorageError,
    },

    #[error("Received unknown function invocation: {0}")]
    UnknownOperation(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ItemError {
    pub(crate) fn store(context: impl Into<String>) -> impl FnOnce(StorageError) -> Self {
        let context = context.into();
        move |source| ItemError::Store { context, source }
    }
}

/// Result type for item ledger operations.
pub type Result<T> = std::result::Result<T, ItemError>;
