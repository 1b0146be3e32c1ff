//! Common test utilities for in-process API testing.
//!
//! The fixture builds the real router over a file-backed SQLite store in a
//! temporary directory, so every test starts from an empty ticket table.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use ticketdesk_core::{Config, DatabaseConfig, FilterMode, SqliteTicketStore, TicketStore};
use ticketdesk_server::{create_router, AppState};

/// Test fixture holding an in-process router and its database directory.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_insert() {
///     let fixture = TestFixture::new();
///
///     let response = fixture
///         .post("/api/tickets/insert", json!({ "value": { "Title": "VPN down" } }))
///         .await;
///
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Temporary directory for the test database
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Create a fixture with default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create a fixture that evaluates filters with the first declared operator.
    pub fn with_filter_mode(mode: FilterMode) -> Self {
        let mut config = Config::default();
        config.query.filter_mode = mode;
        Self::with_config(config)
    }

    /// Create a fixture with custom configuration. The database path is
    /// always redirected into the fixture's temp dir.
    pub fn with_config(mut config: Config) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        config.database = DatabaseConfig {
            path: temp_dir.path().join("test.db"),
        };

        let ticket_store: Arc<dyn TicketStore> = Arc::new(
            SqliteTicketStore::new(&config.database.path, config.public_id.clone())
                .expect("Failed to create ticket store"),
        );

        let state = Arc::new(AppState::new(config, ticket_store));
        let router = create_router(state);

        Self { router, temp_dir }
    }

    /// Make a GET request.
    pub async fn get(&self, uri: &str) -> TestResponse {
        self.request("GET", uri, None).await
    }

    /// Make a POST request with a JSON body.
    pub async fn post(&self, uri: &str, body: Value) -> TestResponse {
        self.request("POST", uri, Some(body)).await
    }

    /// Make a POST request with a raw (possibly malformed) body.
    pub async fn post_raw(&self, uri: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("Failed to build request");
        self.send(request).await
    }

    async fn request(&self, method: &str, uri: &str, body: Option<Value>) -> TestResponse {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("Failed to build request");
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Request failed");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read body")
            .to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }

    /// Insert a ticket and return the stored record.
    pub async fn insert(&self, ticket: Value) -> Value {
        let response = self
            .post("/api/tickets/insert", json!({ "value": ticket }))
            .await;
        assert_eq!(response.status, StatusCode::OK, "insert failed: {:?}", response.body);
        response.body
    }

    /// Run a list query.
    pub async fn list(&self, query: Value) -> TestResponse {
        self.post("/api/tickets", query).await
    }
}

/// Ticket fixtures.
pub mod fixtures {
    use serde_json::{json, Value};

    pub fn ticket(title: &str, status: &str, priority: &str) -> Value {
        json!({
            "Title": title,
            "Status": status,
            "Priority": priority,
            "Category": "Network",
            "Department": "IT",
            "CreatedBy": "alice"
        })
    }

    /// Five tickets: three Open, two Closed, mixed priorities.
    pub fn five_tickets() -> Vec<Value> {
        vec![
            ticket("Printer jam", "Open", "Low"),
            ticket("VPN outage", "Closed", "High"),
            ticket("Email bounce", "Open", "Medium"),
            ticket("Laptop battery", "Closed", "Low"),
            ticket("Wifi drops", "Open", "High"),
        ]
    }
}
