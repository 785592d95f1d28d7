/*
 * Responsibility
 * - GET /hooks/{event}: hook identifiers configured for an identity event
 * - Unknown / unconfigured event -> 404
 */
use axum::{
    Json,
    extract::{Path, State},
};

use crate::api::v1::dto::hooks::HookListResponse;
use crate::error::AppError;
use crate::state::AppState;

pub async fn get_hooks(
    State(state): State<AppState>,
    Path(event): Path<String>,
) -> Result<Json<HookListResponse>, AppError> {
    let hooks = state.hooks.get(&event);
    if hooks.is_empty() {
        return Err(AppError::not_found("hook event"));
    }

    Ok(Json(HookListResponse {
        hooks: hooks.to_vec(),
        event,
    }))
}
