//! Record repository over a [`LedgerStore`].
//!
//! Each operation touches exactly one key. Mutations are read-modify-write
//! of the whole record: read, decode, change one field, encode, write back.
//! Any failure before the write leaves the store unchanged.

use ledger_state::LedgerStore;
use tracing::{debug, info, instrument};

use crate::domain::{Item, ItemError, Result};
use crate::history::{collect_history, HistoryEntry};

/// Record lifecycle operations against a ledger backend.
pub struct ItemRepository<S> {
    store: S,
}

impl<S> ItemRepository<S>
where
    S: LedgerStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Store a new item. Fails with `Conflict` if the id already has a value.
    ///
    /// Returns the serialized item as written.
    #[instrument(skip_all, fields(id = %item.id))]
    pub async fn create(&self, item: Item) -> Result<Vec<u8>> {
        debug!("start create");
        if self.read(&item.id).await?.is_some() {
            info!("An Item already exists for this ID");
            return Err(ItemError::Conflict { id: item.id });
        }

        let bytes = item.to_vec()?;
        self.write(&item.id, &bytes).await?;
        debug!("end create");
        Ok(bytes)
    }

    /// Replace the price of an existing item, keeping every other field.
    #[instrument(skip(self))]
    pub async fn update_price(&self, id: &str, price: &str) -> Result<Vec<u8>> {
        debug!("start update_price");
        let bytes = self.modify(id, |item| item.with_price(price)).await?;
        debug!("end update_price");
        Ok(bytes)
    }

    /// Move an existing item to the terminal `REMOVED` state.
    ///
    /// Repeating the call rewrites the same state and adds a history entry.
    #[instrument(skip(self))]
    pub async fn soft_delete(&self, id: &str) -> Result<Vec<u8>> {
        debug!("start soft_delete");
        let bytes = self.modify(id, Item::removed).await?;
        debug!("end soft_delete");
        Ok(bytes)
    }

    /// Return the stored bytes for `id` exactly as written.
    #[instrument(skip(self))]
    pub async fn query(&self, id: &str) -> Result<Vec<u8>> {
        debug!("start query");
        let bytes = self
            .store
            .get(id)
            .await
            .map_err(ItemError::store(format!(
                "Failed to get the Item for this ID: {id}"
            )))?
            .ok_or_else(|| ItemError::NotFound { id: id.to_string() })?;
        debug!("end query");
        Ok(bytes)
    }

    /// Full version history for `id`, newest first. Unknown ids yield an
    /// empty history.
    #[instrument(skip(self))]
    pub async fn history(&self, id: &str) -> Result<Vec<HistoryEntry>> {
        debug!("start history");
        let cursor = self
            .store
            .history_of(id)
            .await
            .map_err(ItemError::store("Failed to read the Item history"))?;
        collect_history(cursor, id).await
    }

    // -- private helpers -----------------------------------------------------

    async fn read(&self, id: &str) -> Result<Option<Vec<u8>>> {
        self.store
            .get(id)
            .await
            .map_err(ItemError::store("Failed to get the Item"))
    }

    async fn write(&self, id: &str, bytes: &[u8]) -> Result<()> {
        self.store
            .put(id, bytes)
            .await
            .map_err(ItemError::store("Failed to write the Item"))
    }

    async fn require(&self, id: &str) -> Result<Vec<u8>> {
        self.read(id).await?.ok_or_else(|| ItemError::NotFound {
            id: id.to_string(),
        })
    }

    async fn modify<F>(&self, id: &str, change: F) -> Result<Vec<u8>>
    where
        F: FnOnce(Item) -> Item,
    {
        let current = Item::from_slice(&self.require(id).await?)?;
        let bytes = change(current).to_vec()?;
        self.write(id, &bytes).await?;
        Ok(bytes)
    }
}
