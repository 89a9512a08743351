// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Failure reported by the backend platform (credential store or data API).
///
/// Backends normalize the platform's error shapes into the `code`
/// constants below so callers can branch on kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct StoreError {
    pub code: String,
    pub message: String,
}

impl StoreError {
    pub const DUPLICATE_IDENTITY: &'static str = "duplicate_identity";
    pub const INVALID_CREDENTIALS: &'static str = "invalid_credentials";
    pub const INVALID_GRANT: &'static str = "invalid_grant";
    pub const NOT_FOUND: &'static str = "not_found";
    pub const UNIQUE_VIOLATION: &'static str = "unique_violation";
    pub const TIMEOUT: &'static str = "timeout";
    pub const TRANSPORT: &'static str = "transport";
    pub const DECODE: &'static str = "decode";

    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn is(&self, code: &str) -> bool {
        self.code == code
    }
}

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("User already registered")]
    DuplicateIdentity,

    #[error("Invalid login credentials")]
    InvalidCredentials,

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("No refresh token")]
    NoRefreshToken,

    #[error("Invalid refresh token")]
    RefreshRejected,

    #[error("Failed to create profile")]
    ProfileCreationFailed,

    #[error("Signup failed")]
    SignupFailed,

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Already in favorites")]
    AlreadyFavorited,

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::DuplicateIdentity
            | AppError::ProfileCreationFailed
            | AppError::SignupFailed
            | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials
            | AppError::NotAuthenticated
            | AppError::NoRefreshToken
            | AppError::RefreshRejected => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::AlreadyFavorited => StatusCode::CONFLICT,
            AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::BadRequest(errors.to_string())
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Platform messages stay in the logs.
        let error = match &self {
            AppError::Store(err) => {
                tracing::error!(code = %err.code, error = %err.message, "Store error");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(ErrorResponse { error })).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
