/*
 * Responsibility
 * - Load process configuration from the environment (.env supported)
 * - Validate values up front (missing/invalid -> startup fails)
 * - Hook lists are decoded here, before the service accepts traffic
 */
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use std::{error::Error as StdError, fmt};

use url::Url;

pub mod captcha;
pub mod hooks;

pub use captcha::{CaptchaConfig, CaptchaProviderKind, CaptchaSettings};
pub use hooks::FunctionHooks;

pub const HCAPTCHA_VERIFY_URL: &str = "https://hcaptcha.com/siteverify";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(value: Option<String>) -> Self {
        match value
            .unwrap_or_else(|| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
    Hooks(serde_json::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
            ConfigError::Hooks(e) => write!(f, "invalid configuration: FUNCTIONS_HOOKS: {}", e),
        }
    }
}

impl StdError for ConfigError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ConfigError::Hooks(e) => Some(e),
            _ => None,
        }
    }
}

/// Bearer-token verification settings.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub audience: Option<String>,
    pub issuer: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    pub jwt: JwtConfig,

    pub captcha: CaptchaConfig,
    pub captcha_bypass_role: String,
    pub captcha_verify_url: Url,
    pub captcha_timeout: Duration,

    pub hooks: FunctionHooks,

    pub request_body_limit_bytes: usize,
    pub request_timeout: Duration,
    pub shutdown_grace: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// `from_env` is the production entry point; tests feed a map instead of
    /// mutating the process environment.
    pub fn from_vars<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port: u16 = match var("PORT") {
            Some(s) => s.trim().parse().map_err(|_| ConfigError::Invalid("PORT"))?,
            None => 9999,
        };

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::parse(var("APP_ENV"));

        let secret = var("JWT_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let jwt = JwtConfig {
            secret,
            audience: non_empty(var("JWT_AUD")),
            issuer: non_empty(var("JWT_ISSUER")),
        };

        let captcha = CaptchaConfig {
            enabled: parse_bool(var("CAPTCHA_ENABLED"), "CAPTCHA_ENABLED")?.unwrap_or(false),
            provider: var("CAPTCHA_PROVIDER").unwrap_or_else(|| "hcaptcha".to_string()),
            secret: var("CAPTCHA_SECRET").unwrap_or_default(),
        };

        let captcha_bypass_role =
            non_empty(var("CAPTCHA_BYPASS_ROLE")).unwrap_or_else(|| "service_admin".to_string());

        let captcha_verify_url = Url::parse(
            &var("CAPTCHA_VERIFY_URL").unwrap_or_else(|| HCAPTCHA_VERIFY_URL.to_string()),
        )
        .map_err(|_| ConfigError::Invalid("CAPTCHA_VERIFY_URL"))?;

        let captcha_timeout = Duration::from_secs(
            parse_num(var("CAPTCHA_TIMEOUT_SECONDS"), "CAPTCHA_TIMEOUT_SECONDS")?.unwrap_or(10),
        );

        let hooks = match non_empty(var("FUNCTIONS_HOOKS")) {
            Some(raw) => serde_json::from_str(&raw).map_err(ConfigError::Hooks)?,
            None => FunctionHooks::default(),
        };

        let request_body_limit_bytes =
            parse_num(var("REQUEST_BODY_LIMIT_BYTES"), "REQUEST_BODY_LIMIT_BYTES")?
                .unwrap_or(1024 * 1024);

        let request_timeout = Duration::from_secs(
            parse_num(var("REQUEST_TIMEOUT_SECONDS"), "REQUEST_TIMEOUT_SECONDS")?.unwrap_or(30),
        );

        let shutdown_grace = Duration::from_secs(
            parse_num(var("SHUTDOWN_GRACE_SECONDS"), "SHUTDOWN_GRACE_SECONDS")?.unwrap_or(10),
        );

        Ok(Self {
            addr,
            app_env,
            jwt,
            captcha,
            captcha_bypass_role,
            captcha_verify_url,
            captcha_timeout,
            hooks,
            request_body_limit_bytes,
            request_timeout,
            shutdown_grace,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn parse_bool(value: Option<String>, key: &'static str) -> Result<Option<bool>, ConfigError> {
    let Some(raw) = non_empty(value) else {
        return Ok(None);
    };
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        _ => Err(ConfigError::Invalid(key)),
    }
}

fn parse_num<T: FromStr>(value: Option<String>, key: &'static str) -> Result<Option<T>, ConfigError> {
    non_empty(value)
        .map(|s| s.parse::<T>().map_err(|_| ConfigError::Invalid(key)))
        .transpose()
}
