//! Domain models for the item ledger.
//!
//! - `Item`: the record stored under each id
//! - `Operation`: the routable operations and their argument table
//! - `Request`: a validated, typed invocation

pub mod error;
pub mod item;
pub mod operation;
pub mod validation;

pub use error::{ItemError, Result, ValidationError};
pub use item::{Item, REMOVED_STATE};
pub use operation::{ArgSpec, Arity, Operation, OperationSpec, OPERATIONS};
pub use validation::{validate, Request};
