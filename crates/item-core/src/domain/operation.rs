//! Operation table.
//!
//! Each operation is declared once, with its names, arity and the ordered
//! argument labels used by validation. The validator and the dispatcher
//! both read this table instead of hard-coding per-handler checks.

use std::fmt;
use std::str::FromStr;

use super::error::ItemError;

/// An operation the dispatcher can route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    UpdatePrice,
    SoftDelete,
    Query,
    History,
}

/// Accepted argument counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    /// Extra arguments beyond the minimum are ignored.
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Exactly(n) => count == n,
            Arity::AtLeast(n) => count >= n,
        }
    }

    /// Number of leading arguments the operation consumes.
    pub fn used(self) -> usize {
        match self {
            Arity::Exactly(n) | Arity::AtLeast(n) => n,
        }
    }
}

/// One positional argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgSpec {
    pub field: &'static str,
    /// Reported when the argument is blank after trimming.
    pub empty_message: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationSpec {
    pub operation: Operation,
    /// Canonical name.
    pub name: &'static str,
    /// Name used by older callers.
    pub alias: &'static str,
    pub arity: Arity,
    pub arity_message: &'static str,
    pub args: &'static [ArgSpec],
}

const ID_ONLY: &[ArgSpec] = &[ArgSpec {
    field: "id",
    empty_message: "The Item ID must be a non-empty string.",
}];

const EXPECTING_ID: &str = "Incorrect number of arguments. Expecting the ID of the Item.";

pub const OPERATIONS: &[OperationSpec] = &[
    OperationSpec {
        operation: Operation::Create,
        name: "create",
        alias: "addItem",
        arity: Arity::Exactly(5),
        arity_message: "Incorrect number of arguments. Expecting 5 arguments.",
        args: &[
            ArgSpec {
                field: "id",
                empty_message: "The id must be a non-empty string",
            },
            ArgSpec {
                field: "name",
                empty_message: "The name must be a non-empty string",
            },
            ArgSpec {
                field: "description",
                empty_message: "The description must be a non-empty string",
            },
            ArgSpec {
                field: "price",
                empty_message: "The price argument must be a non-empty string",
            },
            ArgSpec {
                field: "state",
                empty_message: "The state argument must be a non-empty string",
            },
        ],
    },
    OperationSpec {
        operation: Operation::UpdatePrice,
        name: "updatePrice",
        alias: "modifyPrice",
        arity: Arity::AtLeast(2),
        arity_message: "Incorrect number of arguments. Expecting 2 arguments.",
        args: &[
            ArgSpec {
                field: "id",
                empty_message: "The Item ID must be a non-empty string.",
            },
            ArgSpec {
                field: "price",
                empty_message: "The Item price must be a non-empty string.",
            },
        ],
    },
    OperationSpec {
        operation: Operation::SoftDelete,
        name: "softDelete",
        alias: "removeItem",
        arity: Arity::Exactly(1),
        arity_message: EXPECTING_ID,
        args: ID_ONLY,
    },
    OperationSpec {
        operation: Operation::Query,
        name: "query",
        alias: "queryItem",
        arity: Arity::Exactly(1),
        arity_message: EXPECTING_ID,
        args: ID_ONLY,
    },
    OperationSpec {
        operation: Operation::History,
        name: "history",
        alias: "history",
        arity: Arity::Exactly(1),
        arity_message: EXPECTING_ID,
        args: ID_ONLY,
    },
];

impl Operation {
    /// Resolve a canonical name or alias.
    pub fn lookup(name: &str) -> Option<Self> {
        OPERATIONS
            .iter()
            .find(|spec| spec.name == name || spec.alias == name)
            .map(|spec| spec.operation)
    }

    pub fn spec(self) -> &'static OperationSpec {
        // Row order follows variant order; checked by `table_covers_every_operation`.
        let row = match self {
            Operation::Create => 0,
            Operation::UpdatePrice => 1,
            Operation::SoftDelete => 2,
            Operation::Query => 3,
            Operation::History => 4,
        };
        &OPERATIONS[row]
    }

    pub fn name(self) -> &'static str {
        self.spec().name
    }
}

impl FromStr for Operation {
    type Err = ItemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::lookup(s).ok_or_else(|| ItemError::UnknownOperation(s.to_string()))
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
