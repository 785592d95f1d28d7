/*
 * Responsibility
 * - Response DTO for hook lookups
 */
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HookListResponse {
    pub event: String,
    /// Invocation order.
    pub hooks: Vec<String>,
}
