//! Argument validation.
//!
//! Checks, in order, against the operation's row in [`OPERATIONS`]:
//! 1. the argument count satisfies the declared arity
//! 2. each consumed argument is non-empty after trimming
//!
//! The first failure is reported. Validation is pure; it runs before any
//! store access and a failure short-circuits the operation.
//!
//! [`OPERATIONS`]: super::operation::OPERATIONS

use super::error::ValidationError;
use super::operation::Operation;

/// A validated invocation, borrowing its arguments untrimmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request<'a> {
    Create {
        id: &'a str,
        name: &'a str,
        description: &'a str,
        price: &'a str,
        state: &'a str,
    },
    UpdatePrice {
        id: &'a str,
        price: &'a str,
    },
    SoftDelete {
        id: &'a str,
    },
    Query {
        id: &'a str,
    },
    History {
        id: &'a str,
    },
}

impl Request<'_> {
    pub fn operation(&self) -> Operation {
        match self {
            Request::Create { .. } => Operation::Create,
            Request::UpdatePrice { .. } => Operation::UpdatePrice,
            Request::SoftDelete { .. } => Operation::SoftDelete,
            Request::Query { .. } => Operation::Query,
            Request::History { .. } => Operation::History,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Request::Create { id, .. }
            | Request::UpdatePrice { id, .. }
            | Request::SoftDelete { id }
            | Request::Query { id }
            | Request::History { id } => id,
        }
    }
}

/// Validate `args` for `operation` and bind them to a [`Request`].
pub fn validate<'a, A>(operation: Operation, args: &'a [A]) -> Result<Request<'a>, ValidationError>
where
    A: AsRef<str>,
{
    let spec = operation.spec();

    if !spec.arity.accepts(args.len()) {
        return Err(ValidationError::Arity {
            operation: spec.name,
            actual: args.len(),
            message: spec.arity_message,
        });
    }

    let used: Vec<&'a str> = args[..spec.arity.used()]
        .iter()
        .map(AsRef::as_ref)
        .collect();

    for (value, arg) in used.iter().zip(spec.args) {
        if value.trim().is_empty() {
            return Err(ValidationError::EmptyArgument {
                operation: spec.name,
                field: arg.field,
                message: arg.empty_message,
            });
        }
    }

    Ok(match (operation, used.as_slice()) {
        (Operation::Create, &[id, name, description, price, state]) => Request::Create {
            id,
            name,
            description,
            price,
            state,
        },
        (Operation::UpdatePrice, &[id, price]) => Request::UpdatePrice { id, price },
        (Operation::SoftDelete, &[id]) => Request::SoftDelete { id },
        (Operation::Query, &[id]) => Request::Query { id },
        (Operation::History, &[id]) => Request::History { id },
        _ => {
            // The table's arity and the variants' shapes disagree.
            return Err(ValidationError::Arity {
                operation: spec.name,
                actual: args.len(),
                message: spec.arity_message,
            });
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_binds_all_five_fields() {
        let args = ["i1", "Widget", "A widget", "9.99", "ACTIVE"];
        let request = validate(Operation::Create, &args).unwrap();
        assert_eq!(
            request,
            Request::Create {
                id: "i1",
                name: "Widget",
                description: "A widget",
                price: "9.99",
                state: "ACTIVE",
            }
        );
        assert_eq!(request.operation(), Operation::Create);
        assert_eq!(request.id(), "i1");
    }

    #[test]
    fn create_rejects_wrong_arity() {
        let err = validate(Operation::Create, &["i1", "Widget"]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Incorrect number of arguments. Expecting 5 arguments."
        );

        let six = ["a", "b", "c", "d", "e", "f"];
        assert!(matches!(
            validate(Operation::Create, &six),
            Err(ValidationError::Arity { actual: 6, .. })
        ));
    }

    #[test]
    fn create_reports_first_blank_field() {
        let err = validate(Operation::Create, &["i1", "Widget", "   ", "", "ACTIVE"]).unwrap_err();
        assert_eq!(err.to_string(), "The description must be a non-empty string");
        assert!(matches!(
            err,
            ValidationError::EmptyArgument {
                field: "description",
                ..
            }
        ));
    }

    #[test]
    fn blank_state_and_price_messages() {
        let err = validate(Operation::Create, &["i1", "n", "d", "1", "\t"]).unwrap_err();
        assert_eq!(err.to_string(), "The state argument must be a non-empty string");

        let err = validate(Operation::Create, &["i1", "n", "d", " ", "S"]).unwrap_err();
        assert_eq!(err.to_string(), "The price argument must be a non-empty string");
    }

    #[test]
    fn update_price_accepts_and_ignores_extra_arguments() {
        let request = validate(Operation::UpdatePrice, &["i1", "12.50", "ignored"]).unwrap();
        assert_eq!(
            request,
            Request::UpdatePrice {
                id: "i1",
                price: "12.50"
            }
        );
    }

    #[test]
    fn update_price_requires_two_arguments() {
        let err = validate(Operation::UpdatePrice, &["i1"]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Incorrect number of arguments. Expecting 2 arguments."
        );

        let err = validate(Operation::UpdatePrice, &["i1", " "]).unwrap_err();
        assert_eq!(err.to_string(), "The Item price must be a non-empty string.");
    }

    #[test]
    fn single_id_operations() {
        for op in [Operation::SoftDelete, Operation::Query, Operation::History] {
            let none: [&str; 0] = [];
            let err = validate(op, &none).unwrap_err();
            assert_eq!(
                err.to_string(),
                "Incorrect number of arguments. Expecting the ID of the Item."
            );

            let err = validate(op, &[" "]).unwrap_err();
            assert_eq!(err.to_string(), "The Item ID must be a non-empty string.");

            assert_eq!(validate(op, &["i1"]).unwrap().id(), "i1");
        }
    }

    #[test]
    fn arguments_are_not_trimmed_once_valid() {
        let request = validate(Operation::Query, &[" i1 "]).unwrap();
        assert_eq!(request.id(), " i1 ");
    }

    #[test]
    fn accepts_owned_strings() {
        let args = vec!["i1".to_string()];
        assert_eq!(
            validate(Operation::History, &args).unwrap(),
            Request::History { id: "i1" }
        );
    }
}
