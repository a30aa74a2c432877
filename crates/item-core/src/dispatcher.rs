//! Dispatcher: (operation name, string arguments) → response envelope.
//!
//! Stateless routing over an [`ItemRepository`]. Each invocation resolves
//! the operation, validates its arguments, runs the repository call and
//! wraps the outcome. Nothing is retried or queued.

use ledger_state::LedgerStore;
use serde::Serialize;
use tracing::{info, warn};

use crate::domain::{validate, Item, Operation, Request, Result};
use crate::history;
use crate::repository::ItemRepository;

/// Status code of a successful response.
pub const OK: i32 = 200;
/// Status code of a failed response.
pub const ERROR: i32 = 500;

/// Outcome of one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Response {
    pub status: i32,
    /// Failure description; empty on success.
    pub message: String,
    /// Serialized record or history; empty on failure.
    pub payload: Vec<u8>,
}

impl Response {
    pub fn success(payload: Vec<u8>) -> Self {
        Self {
            status: OK,
            message: String::new(),
            payload,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ERROR,
            message: message.into(),
            payload: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == OK
    }

    /// Payload as UTF-8 text (lossy).
    pub fn payload_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }
}

/// Routes invocations to an [`ItemRepository`].
pub struct Dispatcher<S> {
    repository: ItemRepository<S>,
}

impl<S> Dispatcher<S>
where
    S: LedgerStore,
{
    pub fn new(store: S) -> Self {
        Self {
            repository: ItemRepository::new(store),
        }
    }

    pub fn repository(&self) -> &ItemRepository<S> {
        &self.repository
    }

    /// Lifecycle hook run once when the ledger instantiates the handler.
    /// Touches no state.
    pub fn init(&self) -> Response {
        info!("init called");
        Response::success(Vec::new())
    }

    /// Run `function` with `args` and wrap the outcome.
    pub async fn invoke<A>(&self, function: &str, args: &[A]) -> Response
    where
        A: AsRef<str>,
    {
        info!(function, args = args.len(), "invoke");
        match self.execute(function, args).await {
            Ok(payload) => Response::success(payload),
            Err(err) => {
                warn!(function, error = %err, "invocation failed");
                Response::error(err.to_string())
            }
        }
    }

    /// Like [`Self::invoke`], keeping the typed error.
    pub async fn execute<A>(&self, function: &str, args: &[A]) -> Result<Vec<u8>>
    where
        A: AsRef<str>,
    {
        let operation: Operation = function.parse()?;
        let request = validate(operation, args)?;

        match request {
            Request::Create {
                id,
                name,
                description,
                price,
                state,
            } => {
                self.repository
                    .create(Item::new(id, name, description, price, state))
                    .await
            }
            Request::UpdatePrice { id, price } => self.repository.update_price(id, price).await,
            Request::SoftDelete { id } => self.repository.soft_delete(id).await,
            Request::Query { id } => self.repository.query(id).await,
            Request::History { id } => {
                let entries = self.repository.history(id).await?;
                history::to_json(&entries)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ItemError;
    use ledger_state::MemoryLedgerStore;

    fn dispatcher() -> Dispatcher<MemoryLedgerStore> {
        Dispatcher::new(MemoryLedgerStore::new())
    }

    #[test]
    fn init_succeeds_without_payload() {
        let d = dispatcher();
        let response = d.init();
        assert!(response.is_success());
        assert!(response.payload.is_empty());
        assert_eq!(d.repository().store().reads(), 0);
    }

    #[tokio::test]
    async fn unknown_function_is_an_error_envelope() {
        let d = dispatcher();
        let response = d.invoke("transfer", &["i1"]).await;
        assert_eq!(response.status, ERROR);
        assert_eq!(
            response.message,
            "Received unknown function invocation: transfer"
        );
        assert!(matches!(
            d.execute("transfer", &["i1"]).await,
            Err(ItemError::UnknownOperation(_))
        ));
    }

    #[tokio::test]
    async fn validation_failure_never_touches_the_store() {
        let d = dispatcher();
        let response = d.invoke("create", &["i1", "Widget", "", "9.99", "ACTIVE"]).await;
        assert!(!response.is_success());
        assert_eq!(response.message, "The description must be a non-empty string");

        let none: [&str; 0] = [];
        assert!(!d.invoke("query", &none).await.is_success());
        assert!(!d.invoke("updatePrice", &["i1"]).await.is_success());

        let store = d.repository().store();
        assert_eq!(store.reads(), 0);
        assert_eq!(store.writes(), 0);
    }

    #[tokio::test]
    async fn legacy_names_route_to_the_same_operations() {
        let d = dispatcher();
        let created = d
            .invoke("addItem", &["i1", "Widget", "A widget", "9.99", "ACTIVE"])
            .await;
        assert!(created.is_success());

        let updated = d.invoke("modifyPrice", &["i1", "1.00"]).await;
        assert_eq!(Item::from_slice(&updated.payload).unwrap().price, "1.00");

        let removed = d.invoke("removeItem", &["i1"]).await;
        assert!(Item::from_slice(&removed.payload).unwrap().is_removed());

        let queried = d.invoke("queryItem", &["i1"]).await;
        assert_eq!(queried.payload, removed.payload);
    }

    #[tokio::test]
    async fn success_payload_is_text() {
        let d = dispatcher();
        let response = d
            .invoke("create", &["i1", "Widget", "A widget", "9.99", "ACTIVE"])
            .await;
        assert!(response.message.is_empty());
        assert!(response.payload_str().contains("\"price\":\"9.99\""));
    }
}
