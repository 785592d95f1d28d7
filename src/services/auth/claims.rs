use axum::http::{HeaderMap, header};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use std::{error::Error as StdError, fmt};

use crate::config::JwtConfig;

// Errors returned while reading/verifying the bearer token.
#[derive(Debug)]
pub enum ClaimsError {
    MalformedHeader,
    Jwt(jsonwebtoken::errors::Error),
}

impl fmt::Display for ClaimsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedHeader => write!(f, "authorization header is not a bearer token"),
            Self::Jwt(e) => write!(f, "jwt verification failed: {}", e),
        }
    }
}

impl StdError for ClaimsError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Jwt(e) => Some(e),
            _ => None,
        }
    }
}

impl From<jsonwebtoken::errors::Error> for ClaimsError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        Self::Jwt(e)
    }
}

/// The part of a verified bearer token this service reads.
///
/// NOTE:
/// - `exp` (and `aud`/`iss` when configured) are checked by `jsonwebtoken::Validation`.
/// - A token without `role` verifies fine; it just never matches a privileged role.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SignedClaims {
    #[serde(default)]
    pub role: String,

    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub iss: Option<String>,
    pub exp: u64,
}

impl SignedClaims {
    pub fn has_role(&self, role: &str) -> bool {
        !self.role.is_empty() && self.role == role
    }
}

/// HS256 bearer-token verifier.
///
/// - Key material is intentionally not printable via Debug.
#[derive(Clone)]
pub struct ClaimsExtractor {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl fmt::Debug for ClaimsExtractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print key material
        f.debug_struct("ClaimsExtractor")
            .field("validation", &self.validation)
            .finish()
    }
}

impl ClaimsExtractor {
    pub fn new(secret: &str, audience: Option<&str>, issuer: Option<&str>) -> Self {
        let decoding_key = DecodingKey::from_secret(secret.as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        match audience {
            Some(aud) => validation.set_audience(&[aud]),
            // Tokens issued for other audiences are still acceptable here.
            None => validation.validate_aud = false,
        }
        if let Some(iss) = issuer {
            validation.set_issuer(&[iss]);
        }

        Self {
            decoding_key,
            validation,
        }
    }

    pub fn from_config(config: &JwtConfig) -> Self {
        Self::new(
            &config.secret,
            config.audience.as_deref(),
            config.issuer.as_deref(),
        )
    }

    // Verify and decode a JWT.
    pub fn verify(&self, token: &str) -> Result<SignedClaims, ClaimsError> {
        let data =
            jsonwebtoken::decode::<SignedClaims>(token, &self.decoding_key, &self.validation)?;

        Ok(data.claims)
    }

    /// Read `Authorization: Bearer <token>` and verify it.
    ///
    /// - no header => `Ok(None)`
    /// - header present but not a bearer token, or token invalid/expired => `Err(_)`
    pub fn extract(&self, headers: &HeaderMap) -> Result<Option<SignedClaims>, ClaimsError> {
        let Some(value) = headers.get(header::AUTHORIZATION) else {
            return Ok(None);
        };

        let token = bearer_token(value.to_str().map_err(|_| ClaimsError::MalformedHeader)?)
            .ok_or(ClaimsError::MalformedHeader)?;

        self.verify(token).map(Some)
    }
}

fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty() && !token.contains(char::is_whitespace)).then_some(token)
}
