//! Ticket storage trait and error type.

use thiserror::Error;

use crate::ticket::Ticket;

/// Error type for ticket operations.
#[derive(Debug, Error)]
pub enum TicketError {
    /// Update attempted without a positive ticket id.
    #[error("Invalid ticket id: {0}")]
    InvalidId(i64),

    /// Public id scheme could not be compiled.
    #[error("Invalid public id configuration: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),
}

/// Trait for ticket storage backends.
///
/// Every method is a single round trip. Nothing spans more than one
/// statement, so a failing caller sequence leaves earlier calls committed.
pub trait TicketStore: Send + Sync {
    /// Every ticket, ordered by ticket id ascending.
    fn list_all(&self) -> Result<Vec<Ticket>, TicketError>;

    /// Insert a ticket.
    ///
    /// The store assigns the ticket id, generates a public id when none was
    /// given and defaults both timestamps to now.
    fn insert(&self, ticket: Ticket) -> Result<Ticket, TicketError>;

    /// Overwrite every mutable field of an existing ticket.
    ///
    /// A blank or absent public id keeps the stored one, and the returned
    /// ticket carries it. Ids that match no row are not an error; the ticket
    /// is returned as given.
    fn update(&self, ticket: Ticket) -> Result<Ticket, TicketError>;

    /// Delete by ticket id. Returns the number of rows removed (0 or 1).
    fn delete(&self, ticket_id: i64) -> Result<usize, TicketError>;

    /// Number of stored tickets.
    fn count(&self) -> Result<usize, TicketError>;

    /// Public id the next insert without one would receive.
    fn next_public_id(&self) -> Result<String, TicketError>;
}
