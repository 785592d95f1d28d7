//! Captcha gate: require a solved challenge unless the caller holds the
//! privileged role.
//!
//! Order of checks:
//! 1. captcha disabled            -> pass (body untouched)
//! 2. bearer token with bypass role -> pass (body untouched)
//! 3. unknown provider / no secret  -> 500 "server misconfigured"
//! 4. read body, pull `security_metadata.captcha_token`, put the same bytes back
//! 5. provider says no / unreachable -> 500 "request validation failure"
//!
//! Bearer tokens that fail verification are not an error here; the caller is
//! simply not privileged and goes through the captcha check.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    body::{Body, Bytes},
    extract::{ConnectInfo, Request, State},
    http::HeaderMap,
    middleware::{self, Next},
    response::Response,
};
use http_body_util::BodyExt;

use crate::config::{CaptchaConfig, CaptchaSettings};
use crate::error::AppError;
use crate::services::auth::ClaimsExtractor;
use crate::services::captcha::CaptchaProviders;
use crate::state::AppState;

/// Apply the captcha gate to every route of `router`.
///
/// Example:
/// ```ignore
/// let signup = Router::new().route("/signup", post(signup));
/// let signup = middleware::captcha::apply(signup, state.clone());
/// app = app.nest("/api/v1", signup);
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    router.layer(middleware::from_fn_with_state(state, captcha_middleware))
}

async fn captcha_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let req = state.captcha.authorize(req).await?;

    Ok(next.run(req).await)
}

/// What the gate does with a request before any provider is involved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Captcha turned off in configuration.
    Disabled,
    /// Caller presented a valid token carrying the bypass role.
    Bypassed,
    /// A solved challenge is required.
    Verify,
}

#[derive(Clone, Debug)]
pub struct CaptchaGate {
    settings: CaptchaSettings,
    claims: Arc<ClaimsExtractor>,
    providers: CaptchaProviders,
    bypass_role: String,
}

impl CaptchaGate {
    pub fn new(
        settings: CaptchaSettings,
        claims: Arc<ClaimsExtractor>,
        providers: CaptchaProviders,
        bypass_role: impl Into<String>,
    ) -> Self {
        Self {
            settings,
            claims,
            providers,
            bypass_role: bypass_role.into(),
        }
    }

    /// Live settings handle; `replace` on it takes effect from the next request.
    pub fn settings(&self) -> &CaptchaSettings {
        &self.settings
    }

    pub fn decide(&self, config: &CaptchaConfig, headers: &HeaderMap) -> GateDecision {
        if !config.enabled {
            return GateDecision::Disabled;
        }

        match self.claims.extract(headers) {
            Ok(Some(claims)) if claims.has_role(&self.bypass_role) => GateDecision::Bypassed,
            Ok(_) => GateDecision::Verify,
            Err(err) => {
                tracing::debug!(error = %err, "bearer token not usable for captcha bypass");
                GateDecision::Verify
            }
        }
    }

    /// Let `req` through or fail it.
    ///
    /// On success the returned request carries the same headers, extensions
    /// and body bytes as the one passed in.
    pub async fn authorize(&self, req: Request) -> Result<Request, AppError> {
        // Fresh snapshot per request, reloads are picked up without restart.
        let config = self.settings.snapshot();

        match self.decide(&config, req.headers()) {
            GateDecision::Disabled | GateDecision::Bypassed => return Ok(req),
            GateDecision::Verify => {}
        }

        let provider = config
            .provider_kind()
            .and_then(|kind| self.providers.get(kind))
            .ok_or_else(|| {
                tracing::warn!(provider = %config.provider, "unsupported captcha provider");
                AppError::ServerMisconfigured
            })?;

        let secret = config.secret().ok_or_else(|| {
            tracing::warn!(provider = provider.name(), "captcha secret is not configured");
            AppError::ServerMisconfigured
        })?;

        let remote_ip = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());

        let (parts, body) = req.into_parts();
        let bytes = body
            .collect()
            .await
            .map_err(|err| {
                tracing::warn!(error = %err, "failed to read request body for captcha");
                AppError::RequestValidationFailure
            })?
            .to_bytes();

        let token = captcha_token(&bytes);
        let req = Request::from_parts(parts, Body::from(bytes));

        match provider.verify(&token, secret, remote_ip).await {
            Ok(verification) if verification.success => Ok(req),
            Ok(verification) => {
                tracing::info!(
                    provider = provider.name(),
                    error_codes = ?verification.error_codes,
                    "captcha verification rejected"
                );
                Err(AppError::RequestValidationFailure)
            }
            Err(err) => {
                tracing::warn!(
                    provider = provider.name(),
                    timeout = err.is_timeout(),
                    error = %err,
                    "captcha verification call failed"
                );
                Err(AppError::RequestValidationFailure)
            }
        }
    }
}

/// `security_metadata.captcha_token` from a JSON body.
///
/// Anything unexpected (not JSON, field missing, not a string) yields an
/// empty token, which providers reject without a network call.
fn captcha_token(body: &Bytes) -> String {
    let Ok(value) = serde_json::from_slice::<serde_json::Value>(body) else {
        return String::new();
    };

    value
        .get("security_metadata")
        .and_then(|v| v.get("captcha_token"))
        .and_then(|v| v.as_str())
        .map(str::to_owned)
        .unwrap_or_default()
}
