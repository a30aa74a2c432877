//! Item Ledger Core Library
//!
//! Record lifecycle and audit history over an ordered key-value ledger:
//! - `domain`: the `Item` record, the operation table and argument validation
//! - `repository`: create / update price / soft delete / query / history
//! - `history`: reconstruction of a key's version log
//! - `dispatcher`: operation name + string arguments → response envelope

pub mod dispatcher;
pub mod domain;
pub mod history;
pub mod repository;
pub mod telemetry;

pub use dispatcher::{Dispatcher, Response};
pub use domain::{
    validate, Arity, Item, ItemError, Operation, Request, Result, ValidationError, REMOVED_STATE,
};
pub use history::{collect_history, render_timestamp, HistoryEntry};
pub use repository::ItemRepository;
pub use telemetry::init_tracing;

pub use ledger_state::{LedgerStore, MemoryLedgerStore, SurrealLedgerStore};
