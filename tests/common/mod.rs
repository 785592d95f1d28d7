#![allow(dead_code)]

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Form, Json, Router,
    body::{Body, Bytes},
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use http_body_util::BodyExt;
use jsonwebtoken::{EncodingKey, Header};
use serde_json::{Value, json};
use url::Url;

use identity_gate::config::{CaptchaConfig, CaptchaProviderKind, CaptchaSettings, FunctionHooks};
use identity_gate::middleware::captcha::CaptchaGate;
use identity_gate::services::auth::ClaimsExtractor;
use identity_gate::services::captcha::{
    CaptchaProvider, CaptchaProviders, CaptchaResult, HCaptchaProvider, Verification,
};
use identity_gate::services::cleanup::Cleanup;
use identity_gate::state::AppState;

// hCaptcha's published test key pair.
pub const HCAPTCHA_SECRET: &str = "0x0000000000000000000000000000000000000000";
pub const HCAPTCHA_RESPONSE: &str = "10000000-aaaa-bbbb-cccc-000000000001";

pub const JWT_SECRET: &str = "integration-jwt-secret";
pub const BYPASS_ROLE: &str = "service_admin";

pub fn captcha(enabled: bool, provider: &str, secret: &str) -> CaptchaConfig {
    CaptchaConfig {
        enabled,
        provider: provider.to_string(),
        secret: secret.to_string(),
    }
}

pub fn gate_state(config: CaptchaConfig, providers: CaptchaProviders) -> AppState {
    let gate = CaptchaGate::new(
        CaptchaSettings::new(config),
        Arc::new(ClaimsExtractor::new(JWT_SECRET, None, None)),
        providers,
        BYPASS_ROLE,
    );

    AppState::new(
        Arc::new(gate),
        Arc::new(FunctionHooks::default()),
        Cleanup::new(),
    )
}

pub fn hcaptcha_at(verify_url: Url) -> CaptchaProviders {
    let provider = HCaptchaProvider::new(verify_url, Duration::from_secs(5)).unwrap();
    CaptchaProviders::new().with(CaptchaProviderKind::HCaptcha, Arc::new(provider))
}

pub fn counting(provider: Arc<CountingProvider>) -> CaptchaProviders {
    CaptchaProviders::new().with(CaptchaProviderKind::HCaptcha, provider)
}

pub fn sign(role: &str, secret: &str) -> String {
    jsonwebtoken::encode(
        &Header::default(),
        &json!({
            "role": role,
            "sub": "00000000-0000-0000-0000-000000000001",
            "exp": jsonwebtoken::get_current_timestamp() + 600,
        }),
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

/// Same layout a signup form posts.
pub fn signup_body(captcha_token: &str) -> String {
    json!({
        "email": "test@example.com",
        "password": "secret",
        "security_metadata": {
            "captcha_token": captcha_token,
        },
    })
    .to_string()
}

/// A body that records whether anything polled it.
pub fn watched_body(payload: &str) -> (Body, Arc<AtomicBool>) {
    let polled = Arc::new(AtomicBool::new(false));
    let flag = polled.clone();
    let payload = Bytes::copy_from_slice(payload.as_bytes());

    let stream = futures::stream::once(async move {
        flag.store(true, Ordering::SeqCst);
        Ok::<_, std::io::Error>(payload)
    });

    (Body::from_stream(stream), polled)
}

pub async fn body_bytes(body: Body) -> Bytes {
    body.collect().await.unwrap().to_bytes()
}

/// Status and `error.message` of an error response.
pub async fn error_of(res: Response) -> (StatusCode, String) {
    let status = res.status();
    let body: Value = serde_json::from_slice(&body_bytes(res.into_body()).await).unwrap();
    (status, body["error"]["message"].as_str().unwrap_or_default().to_string())
}

/// In-process provider double that counts calls.
pub struct CountingProvider {
    calls: AtomicUsize,
    accept: bool,
}

impl CountingProvider {
    pub fn accepting() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            accept: true,
        })
    }

    pub fn rejecting() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            accept: false,
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CaptchaProvider for CountingProvider {
    fn name(&self) -> &'static str {
        "counting"
    }

    async fn verify(
        &self,
        _response_token: &str,
        _secret: &str,
        _remote_ip: Option<IpAddr>,
    ) -> CaptchaResult<Verification> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.accept {
            Ok(Verification::verified())
        } else {
            Ok(Verification::rejected(["invalid-input-response"]))
        }
    }
}

/// Local stand-in for the hCaptcha `siteverify` endpoint.
///
/// - `/siteverify`: accepts only the published test key pair
/// - `/slow`: answers after 2 seconds
/// - `/unavailable`: 503
/// - `/garbage`: 200 with a non-JSON body
#[derive(Clone, Default)]
pub struct SiteVerify {
    requests: Arc<Mutex<Vec<HashMap<String, String>>>>,
    base: Option<Url>,
}

impl SiteVerify {
    pub async fn spawn() -> Self {
        let mut server = Self::default();

        let app = Router::new()
            .route("/siteverify", post(siteverify))
            .route("/slow", post(slow))
            .route("/unavailable", post(unavailable))
            .route("/garbage", post(garbage))
            .with_state(server.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        server.base = Some(Url::parse(&format!("http://{addr}/")).unwrap());
        server
    }

    pub fn url(&self, path: &str) -> Url {
        self.base.as_ref().unwrap().join(path).unwrap()
    }

    pub fn requests(&self) -> Vec<HashMap<String, String>> {
        self.requests.lock().unwrap().clone()
    }
}

async fn siteverify(
    State(server): State<SiteVerify>,
    Form(form): Form<HashMap<String, String>>,
) -> Json<Value> {
    server.requests.lock().unwrap().push(form.clone());

    let secret = form.get("secret").map(String::as_str);
    let response = form.get("response").map(String::as_str);

    if secret != Some(HCAPTCHA_SECRET) {
        return Json(json!({"success": false, "error-codes": ["invalid-input-secret"]}));
    }
    if response != Some(HCAPTCHA_RESPONSE) {
        return Json(json!({"success": false, "error-codes": ["invalid-input-response"]}));
    }
    Json(json!({"success": true, "hostname": "dummy-key-pass"}))
}

async fn slow() -> Json<Value> {
    tokio::time::sleep(Duration::from_secs(2)).await;
    Json(json!({"success": true}))
}

async fn unavailable() -> impl IntoResponse {
    StatusCode::SERVICE_UNAVAILABLE
}

async fn garbage() -> &'static str {
    "<html>not json</html>"
}

/// URL on which nothing listens.
pub async fn closed_url() -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    Url::parse(&format!("http://{addr}/siteverify")).unwrap()
}
