//! The ledger record: one `Item` per id.

use serde::{Deserialize, Serialize};

use super::error::{ItemError, Result};

/// Terminal lifecycle state written by soft-delete.
pub const REMOVED_STATE: &str = "REMOVED";

/// A record stored under its `id` in the ledger.
///
/// Serialized as a flat JSON object with the fields `id`, `name`,
/// `description`, `price`, `state`, in that order. `price` and `state` are
/// opaque strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: String,
    pub state: String,
}

impl Item {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        price: impl Into<String>,
        state: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            price: price.into(),
            state: state.into(),
        }
    }

    /// Decode a stored payload. Every field must be present.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| ItemError::Deserialization(e.to_string()))
    }

    pub fn to_vec(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Copy of this item with a new price; every other field is kept.
    pub fn with_price(self, price: impl Into<String>) -> Self {
        Self {
            price: price.into(),
            ..self
        }
    }

    /// Copy of this item in the terminal `REMOVED` state.
    pub fn removed(self) -> Self {
        Self {
            state: REMOVED_STATE.to_string(),
            ..self
        }
    }

    pub fn is_removed(&self) -> bool {
        self.state == REMOVED_STATE
    }
}
