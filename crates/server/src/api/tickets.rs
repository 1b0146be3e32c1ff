//! Ticket API handlers.
//!
//! The grid's URL adaptor drives everything through POST: list requests carry
//! a query object, mutations carry `{value}`, `{key}` or a batch envelope.

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use ticketdesk_core::query::pipeline;
use ticketdesk_core::{DataManagerRequest, QueryOutput, Ticket, TicketError, TicketQuery};
use tracing::{debug, error, info};

use crate::metrics::{QUERY_REQUESTS_TOTAL, TICKET_MUTATIONS_TOTAL};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Mutation envelope for insert, update and remove.
///
/// The grid also sends `keyColumn` and `action`; routing already tells the
/// handlers both, so they are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct CrudBody {
    /// Record to insert or update
    pub value: Option<Ticket>,
    /// Primary key of the record to remove, number or numeric string
    pub key: Option<Value>,
}

/// Batch envelope. Each list is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchBody {
    pub changed: Option<Vec<Ticket>>,
    pub added: Option<Vec<Ticket>>,
    pub deleted: Option<Vec<Ticket>>,
}

/// Records as they stand after a batch was applied.
#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub changed: Vec<Ticket>,
    pub added: Vec<Ticket>,
    pub deleted: Vec<Ticket>,
}

#[derive(Debug, Serialize)]
pub struct RemoveResponse {
    #[serde(rename = "TicketId")]
    pub ticket_id: i64,
}

#[derive(Debug, Serialize)]
pub struct PingResponse {
    pub ok: bool,
    pub time: DateTime<Utc>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct TicketErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<TicketErrorResponse>);

fn bad_request(message: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(TicketErrorResponse {
            error: message.into(),
        }),
    )
}

fn store_error(operation: &str, e: TicketError) -> ApiError {
    match e {
        TicketError::InvalidId(_) => bad_request(e.to_string()),
        e => {
            error!("Ticket {} failed: {}", operation, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(TicketErrorResponse {
                    error: e.to_string(),
                }),
            )
        }
    }
}

/// Extract an integer key from a number or a numeric string.
fn parse_key(key: &Value) -> Option<i64> {
    match key {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Run a grid query over the ticket list.
pub async fn list_tickets(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DataManagerRequest>,
) -> Result<Json<QueryOutput>, ApiError> {
    let query = TicketQuery::try_from(&request).map_err(|e| {
        debug!("Rejected list request: {}", e);
        bad_request(e.to_string())
    })?;

    let tickets = state
        .ticket_store()
        .list_all()
        .map_err(|e| store_error("list", e))?;

    let output = pipeline::run(tickets, &query, state.filter_mode());
    QUERY_REQUESTS_TOTAL
        .with_label_values(&[output.shape()])
        .inc();

    Ok(Json(output))
}

/// Liveness probe used by the client.
pub async fn ping() -> Json<PingResponse> {
    Json(PingResponse {
        ok: true,
        time: Utc::now(),
    })
}

pub async fn insert_ticket(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CrudBody>,
) -> Result<Json<Ticket>, ApiError> {
    let ticket = body.value.ok_or_else(|| bad_request("Invalid payload."))?;

    let created = state
        .ticket_store()
        .insert(ticket)
        .map_err(|e| store_error("insert", e))?;
    TICKET_MUTATIONS_TOTAL.with_label_values(&["insert"]).inc();

    info!(
        "Inserted ticket {} ({})",
        created.ticket_id,
        created.public_ticket_id.as_deref().unwrap_or("")
    );
    Ok(Json(created))
}

pub async fn update_ticket(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CrudBody>,
) -> Result<Json<Ticket>, ApiError> {
    let ticket = body.value.ok_or_else(|| bad_request("Invalid payload."))?;
    if ticket.ticket_id <= 0 {
        return Err(bad_request("TicketId is required for update."));
    }

    let updated = state
        .ticket_store()
        .update(ticket)
        .map_err(|e| store_error("update", e))?;
    TICKET_MUTATIONS_TOTAL.with_label_values(&["update"]).inc();

    Ok(Json(updated))
}

pub async fn remove_ticket(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CrudBody>,
) -> Result<Json<RemoveResponse>, ApiError> {
    let key = body.key.ok_or_else(|| bad_request("Key is required."))?;
    let ticket_id = parse_key(&key).ok_or_else(|| bad_request("Invalid key format."))?;

    let removed = state
        .ticket_store()
        .delete(ticket_id)
        .map_err(|e| store_error("remove", e))?;
    TICKET_MUTATIONS_TOTAL.with_label_values(&["remove"]).inc();

    debug!("Remove of ticket {} affected {} row(s)", ticket_id, removed);
    Ok(Json(RemoveResponse { ticket_id }))
}

/// Apply changed, then added, then deleted records.
///
/// Not transactional: a storage failure returns 500 with earlier operations
/// already committed.
pub async fn batch_tickets(
    State(state): State<Arc<AppState>>,
    Json(body): Json<BatchBody>,
) -> Result<Json<BatchResponse>, ApiError> {
    let changed = body.changed.unwrap_or_default();
    let added = body.added.unwrap_or_default();
    let deleted = body.deleted.unwrap_or_default();

    if let Some(ticket) = changed.iter().find(|t| t.ticket_id <= 0) {
        return Err(bad_request(format!(
            "TicketId is required for update (got {}).",
            ticket.ticket_id
        )));
    }

    let store = state.ticket_store();

    let mut updated = Vec::with_capacity(changed.len());
    for ticket in changed {
        updated.push(store.update(ticket).map_err(|e| store_error("update", e))?);
        TICKET_MUTATIONS_TOTAL.with_label_values(&["update"]).inc();
    }

    let mut inserted = Vec::with_capacity(added.len());
    for ticket in added {
        inserted.push(store.insert(ticket).map_err(|e| store_error("insert", e))?);
        TICKET_MUTATIONS_TOTAL.with_label_values(&["insert"]).inc();
    }

    for ticket in &deleted {
        store
            .delete(ticket.ticket_id)
            .map_err(|e| store_error("remove", e))?;
        TICKET_MUTATIONS_TOTAL.with_label_values(&["remove"]).inc();
    }

    info!(
        "Batch applied: {} changed, {} added, {} deleted",
        updated.len(),
        inserted.len(),
        deleted.len()
    );

    Ok(Json(BatchResponse {
        changed: updated,
        added: inserted,
        deleted,
    }))
}
