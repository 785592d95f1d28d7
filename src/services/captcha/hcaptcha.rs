use async_trait::async_trait;
use serde::Deserialize;
use std::net::IpAddr;
use std::time::Duration;
use url::Url;

use crate::services::captcha::provider::{
    CaptchaError, CaptchaProvider, CaptchaResult, Verification,
};

/// hCaptcha `siteverify` client.
///
/// `POST <verify_url>` with a form body (`secret`, `response`, `remoteip`),
/// JSON answer `{ "success": bool, "error-codes": [..] }`.
#[derive(Clone, Debug)]
pub struct HCaptchaProvider {
    client: reqwest::Client,
    verify_url: Url,
}

#[derive(Debug, Deserialize)]
struct SiteVerifyResponse {
    success: bool,
    #[serde(rename = "error-codes", default)]
    error_codes: Vec<String>,
    #[serde(default)]
    hostname: Option<String>,
}

impl HCaptchaProvider {
    /// `timeout` bounds the whole call (connect + response); a slow provider
    /// surfaces as `CaptchaError::Transport` with `is_timeout() == true`.
    pub fn new(verify_url: Url, timeout: Duration) -> Result<Self, CaptchaError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self { client, verify_url })
    }

    pub fn verify_url(&self) -> &Url {
        &self.verify_url
    }
}

#[async_trait]
impl CaptchaProvider for HCaptchaProvider {
    fn name(&self) -> &'static str {
        "hcaptcha"
    }

    async fn verify(
        &self,
        response_token: &str,
        secret: &str,
        remote_ip: Option<IpAddr>,
    ) -> CaptchaResult<Verification> {
        let response_token = response_token.trim();
        if response_token.is_empty() {
            return Ok(Verification::missing_response());
        }

        let remote_ip = remote_ip.map(|ip| ip.to_string());
        let mut form = vec![("secret", secret), ("response", response_token)];
        if let Some(ip) = remote_ip.as_deref() {
            form.push(("remoteip", ip));
        }

        let res = self
            .client
            .post(self.verify_url.clone())
            .form(&form)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            return Err(CaptchaError::InvalidResponse(format!(
                "unexpected status {status}"
            )));
        }

        let body: SiteVerifyResponse = res.json().await.map_err(|e| {
            if e.is_decode() {
                CaptchaError::InvalidResponse(e.to_string())
            } else {
                CaptchaError::Transport(e)
            }
        })?;

        tracing::debug!(
            success = body.success,
            hostname = body.hostname.as_deref().unwrap_or(""),
            "hcaptcha siteverify answered"
        );

        if body.success {
            Ok(Verification::verified())
        } else {
            Ok(Verification::rejected(body.error_codes))
        }
    }
}
