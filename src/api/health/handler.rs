use axum::{extract::State, http::StatusCode};
use serde_json::json;
use tracing::{error, instrument};

use crate::config::state::AppState;
use crate::utils::response_handler::HandlerResponse;

/// Reports whether the backing store answers
#[instrument(name = "health_check", skip(state))]
pub async fn health_handler(State(state): State<AppState>) -> HandlerResponse {
    match state.store.health().await {
        Ok(()) => HandlerResponse::new(StatusCode::OK)
            .data(json!({ "storage": "connected" }))
            .message("Service is healthy"),
        Err(e) => {
            error!("Health check failed: {}", e);
            HandlerResponse::new(StatusCode::SERVICE_UNAVAILABLE)
                .data(json!({ "storage": "unavailable", "error": e.to_string() }))
                .message("Storage is unavailable")
        }
    }
}
