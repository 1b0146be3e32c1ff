//! Grid list queries: request format, validation and the pipeline that
//! shapes the ticket list.

mod field;
pub mod pipeline;
mod predicate;
mod request;
mod types;

pub use field::{FieldKind, FieldValue, TicketField};
pub use pipeline::{Group, GroupItems, QueryOutput};
pub use predicate::{Condition, FilterOperator, LeafPredicate, Operand, Predicate};
pub use request::{DataManagerRequest, SearchFilter, Sort, WhereFilter};
pub use types::{SearchTerm, SortDirection, SortKey, TicketQuery};

use thiserror::Error;

/// Reasons a list request is rejected before the store is read.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Unknown filter operator: {0}")]
    UnknownOperator(String),

    #[error("Unknown sort direction: {0}")]
    UnknownDirection(String),

    #[error("Unknown filter condition: {0}")]
    UnknownCondition(String),

    #[error("Filter predicate is missing a field")]
    MissingField,

    #[error("Filter predicate on {0} is missing an operator")]
    MissingOperator(String),
}
