/*
 * Responsibility
 * - Application-wide AppError
 * - IntoResponse (HTTP status / JSON error body)
 * - Internal details (provider error codes, transport errors) stay in the logs
 */
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AppError {
    /// Deployment problem: unknown captcha provider, missing secret.
    #[error("server misconfigured")]
    ServerMisconfigured,
    /// Captcha could not be verified (rejected by the provider or unreachable).
    #[error("request validation failure")]
    RequestValidationFailure,
    #[error("{resource} not found")]
    NotFound { resource: &'static str },
}

impl AppError {
    pub fn not_found(resource: &'static str) -> Self {
        Self::NotFound { resource }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            // Captcha failures are 500 on purpose, see DESIGN.md before changing.
            AppError::ServerMisconfigured | AppError::RequestValidationFailure => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            AppError::ServerMisconfigured => "SERVER_MISCONFIGURED",
            AppError::RequestValidationFailure => "REQUEST_VALIDATION_FAILURE",
            AppError::NotFound { .. } => "NOT_FOUND",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.code(),
                message: self.to_string(),
            },
        };

        (self.status(), Json(body)).into_response()
    }
}
