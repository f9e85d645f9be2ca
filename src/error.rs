/*
 * Responsibility
 * - Per-request authentication failures (AuthError), kept distinct from each other
 * - AppError for the demo handlers
 * - IntoResponse for both (HTTP status / JSON error body)
 */
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::services::token::FetchError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

fn error_response(status: StatusCode, code: &'static str, message: String) -> Response {
    let body = ErrorResponse {
        error: ErrorBody { code, message },
    };

    (status, Json(body)).into_response()
}

/// Why a request failed authentication. Each kind stays distinguishable for callers and logs.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no authentication token found")]
    NoTokenFound,
    #[error("invalid token")]
    InvalidToken,
    #[error("account not found")]
    AccountNotFound,
    #[error("account lookup failed")]
    Lookup(#[source] FetchError),
}

impl AuthError {
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::NoTokenFound => "NO_TOKEN",
            AuthError::InvalidToken => "INVALID_TOKEN",
            AuthError::AccountNotFound => "ACCOUNT_NOT_FOUND",
            AuthError::Lookup(_) => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::Lookup(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        // Lookup details stay in the logs
        let message = match &self {
            AuthError::Lookup(_) => "internal server error".to_string(),
            other => other.to_string(),
        };
        error_response(self.status(), self.code(), message)
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{code}: {message}")]
    BadRequest { code: &'static str, message: String },
    #[error("not found: {resource}")]
    NotFound { resource: &'static str },
    #[error("internal server error")]
    Internal,
}

impl AppError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &'static str) -> Self {
        Self::NotFound { resource }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::BadRequest { code, message } => {
                error_response(StatusCode::BAD_REQUEST, code, message)
            }
            AppError::NotFound { resource } => error_response(
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("{resource} not found."),
            ),
            AppError::Internal => error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_SERVER_ERROR",
                "internal server error".into(),
            ),
        }
    }
}
