use super::ErrorResponse;
use crate::config::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use billing_core::Lookup;
use serde::Serialize;
use std::sync::Arc;

/// Found records go out as-is; misses become 404 with the miss message
fn lookup_response<T: Serialize>(lookup: Lookup<T>) -> Response {
    match lookup {
        Lookup::Found(record) => Json(record).into_response(),
        Lookup::NotFound(miss) => {
            (StatusCode::NOT_FOUND, Json(ErrorResponse::new(miss.message()))).into_response()
        }
    }
}

/// Get a customer's tier by email
pub async fn get_customer_tier(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
) -> Response {
    lookup_response(state.service.get_tier(&email))
}

/// Get the contract SLA for a customer id
pub async fn get_contract_sla(
    State(state): State<Arc<AppState>>,
    Path(customer_id): Path<String>,
) -> Response {
    lookup_response(state.service.get_sla(&customer_id))
}

/// MCP over HTTP: one JSON-RPC message per POST
pub async fn mcp(State(state): State<Arc<AppState>>, body: String) -> Response {
    match state.mcp.handle_message(&body).await {
        Some(response) => Json(response).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}
