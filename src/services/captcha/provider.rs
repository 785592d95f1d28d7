//! Captcha provider interface used by the captcha gate.
use async_trait::async_trait;
use std::net::IpAddr;
use thiserror::Error;

/// Result type for provider calls.
pub type CaptchaResult<T> = Result<T, CaptchaError>;

/// Provider-call errors (the provider could not give an answer at all).
///
/// Note:
/// - A provider that answers "no" is NOT an error: that's `Verification { success: false, .. }`.
/// - The gate maps both to the same external failure, but logs them differently.
#[derive(Debug, Error)]
pub enum CaptchaError {
    #[error("captcha provider transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("captcha provider returned an unreadable response: {0}")]
    InvalidResponse(String),
}

impl CaptchaError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_timeout())
    }
}

/// Provider verdict for one challenge-response token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    pub success: bool,
    pub error_codes: Vec<String>,
}

impl Verification {
    pub fn verified() -> Self {
        Self {
            success: true,
            error_codes: Vec::new(),
        }
    }

    pub fn rejected<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            success: false,
            error_codes: codes.into_iter().map(Into::into).collect(),
        }
    }

    /// Verdict for an empty/missing token. Implementations return this
    /// without calling out to the provider.
    pub fn missing_response() -> Self {
        Self::rejected(["missing-input-response"])
    }
}

/// A human-verification provider (hCaptcha, ...).
///
/// Implementations must be cheap to share (`Arc<dyn CaptchaProvider>`).
#[async_trait]
pub trait CaptchaProvider: Send + Sync + 'static {
    // Provider name (for logging).
    fn name(&self) -> &'static str;

    // Verify `response_token` with the shared `secret`.
    //
    // Returns:
    // - `Ok(v)` with `v.success == true`  => solved
    // - `Ok(v)` with `v.success == false` => provider rejected the token
    // - `Err(_)`                          => provider unreachable / unreadable answer
    async fn verify(
        &self,
        response_token: &str,
        secret: &str,
        remote_ip: Option<IpAddr>,
    ) -> CaptchaResult<Verification>;
}
