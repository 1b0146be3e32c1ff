use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub public_id: PublicIdConfig,
    #[serde(default)]
    pub query: QueryConfig,
    #[serde(default)]
    pub cors: CorsConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8080
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("ticketdesk.db")
}

/// Human-readable ticket identifier scheme (`<prefix><separator><number>`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PublicIdConfig {
    #[serde(default = "default_prefix")]
    pub prefix: String,
    #[serde(default = "default_separator")]
    pub separator: String,
    /// Number handed out when no existing identifier matches the scheme.
    #[serde(default = "default_start_number")]
    pub start_number: u64,
}

impl Default for PublicIdConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            separator: default_separator(),
            start_number: default_start_number(),
        }
    }
}

fn default_prefix() -> String {
    "NET".to_string()
}

fn default_separator() -> String {
    "-".to_string()
}

fn default_start_number() -> u64 {
    1001
}

/// List query behaviour.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct QueryConfig {
    #[serde(default)]
    pub filter_mode: FilterMode,
}

/// How filter predicates pick the operator they are evaluated with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    /// Every predicate is evaluated with its own operator.
    #[default]
    PerPredicate,
    /// The first declared operator is used for every predicate.
    FirstOperator,
}

/// Cross-origin settings for the browser client.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CorsConfig {
    /// Allowed origins. Empty allows any origin.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}
