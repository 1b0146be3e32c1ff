pub mod config;
pub mod query;
pub mod ticket;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, CorsConfig,
    DatabaseConfig, FilterMode, PublicIdConfig, QueryConfig, ServerConfig,
};
pub use query::{DataManagerRequest, QueryError, QueryOutput, TicketQuery};
pub use ticket::{PublicIdGenerator, SqliteTicketStore, Ticket, TicketError, TicketStore};
