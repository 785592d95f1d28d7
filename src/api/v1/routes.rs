/*
 * Responsibility
 * - v1 URL layout
 * - Identity flows that need a solved captcha are mounted by their owners
 *   through `middleware::captcha::apply`
 */
use axum::{Router, routing::get};

use crate::state::AppState;

use crate::api::v1::handlers::{health::health, hooks::get_hooks};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/hooks/{event}", get(get_hooks))
}
