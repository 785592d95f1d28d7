/*
 * Responsibility
 * - Shared context attached to the Router (AppState)
 *   - captcha gate, hook table, cleanup barrier
 * - Clone is cheap (Arc / handle types inside)
 */
use std::sync::Arc;

use crate::config::FunctionHooks;
use crate::middleware::captcha::CaptchaGate;
use crate::services::cleanup::Cleanup;

#[derive(Clone, Debug)]
pub struct AppState {
    pub captcha: Arc<CaptchaGate>,
    pub hooks: Arc<FunctionHooks>,
    pub cleanup: Cleanup,
}

impl AppState {
    pub fn new(captcha: Arc<CaptchaGate>, hooks: Arc<FunctionHooks>, cleanup: Cleanup) -> Self {
        Self {
            captcha,
            hooks,
            cleanup,
        }
    }
}
