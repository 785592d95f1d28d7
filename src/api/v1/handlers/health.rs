/*
 * Responsibility
 * - GET /health (liveness)
 * - Reports background work still registered with the cleanup barrier
 */
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;

use crate::state::AppState;

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "pending_cleanup": state.cleanup.outstanding(),
        })),
    )
}
