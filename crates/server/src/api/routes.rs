use axum::{
    http::HeaderValue,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use ticketdesk_core::CorsConfig;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use super::{handlers, middleware::request_middleware, tickets};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config().cors);

    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Tickets (grid URL adaptor)
        .route("/tickets", post(tickets::list_tickets))
        .route("/tickets/ping", get(tickets::ping))
        .route("/tickets/insert", post(tickets::insert_ticket))
        .route("/tickets/update", post(tickets::update_ticket))
        .route("/tickets/remove", post(tickets::remove_ticket))
        .route("/tickets/batch", post(tickets::batch_tickets));

    Router::new()
        .nest("/api", api_routes)
        .route("/metrics", get(handlers::get_metrics))
        .with_state(state)
        .layer(middleware::from_fn(request_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Any origin when the list is empty, otherwise exactly the listed ones.
fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if config.allowed_origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring CORS origin {:?}: {}", origin, e);
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(origins))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, http::StatusCode};
    use ticketdesk_core::{Config, PublicIdConfig, SqliteTicketStore, TicketStore};
    use tower::ServiceExt;

    fn test_router(config: Config) -> Router {
        let store: Arc<dyn TicketStore> =
            Arc::new(SqliteTicketStore::in_memory(PublicIdConfig::default()).unwrap());
        create_router(Arc::new(AppState::new(config, store)))
    }

    #[tokio::test]
    async fn test_cors_allows_any_origin_by_default() {
        let app = test_router(Config::default());

        let request = Request::builder()
            .uri("/api/health")
            .header("Origin", "http://localhost:4200")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn test_cors_echoes_listed_origin_only() {
        let mut config = Config::default();
        config.cors.allowed_origins = vec!["https://desk.example.com".to_string()];
        let app = test_router(config);

        let allowed = Request::builder()
            .uri("/api/health")
            .header("Origin", "https://desk.example.com")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(allowed).await.unwrap();
        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "https://desk.example.com"
        );

        let other = Request::builder()
            .uri("/api/health")
            .header("Origin", "https://elsewhere.example.com")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(other).await.unwrap();
        assert!(response
            .headers()
            .get("access-control-allow-origin")
            .is_none());
    }

    #[tokio::test]
    async fn test_metrics_route_serves_text() {
        let app = test_router(Config::default());

        let request = Request::builder()
            .uri("/metrics")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers().get("content-type").unwrap();
        assert!(content_type.to_str().unwrap().starts_with("text/plain"));
    }
}
