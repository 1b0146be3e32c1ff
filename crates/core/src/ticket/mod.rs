//! Ticket records and their storage.

mod public_id;
mod sqlite_store;
mod store;
mod types;

pub use public_id::PublicIdGenerator;
pub use sqlite_store::SqliteTicketStore;
pub use store::{TicketError, TicketStore};
pub use types::{parse_timestamp, Ticket};
