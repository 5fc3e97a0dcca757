//! Error types for Libretto server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application error codes carried in every error response body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Success = 0,
    Failure = 1,
    NotAuthorized = 2,
    DbFailure = 3,
    NoSuchUser = 4,
    NoSuchBook = 5,
    Duplicate = 6,
    BadValue = 7,
    InvalidCredentials = 8,
    AccountDeactivated = 9,
    TokenExpired = 10,
    TokenInvalid = 11,
    NoCopiesAvailable = 12,
    AlreadyReturned = 13,
    PersistenceFault = 14,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account is deactivated")]
    AccountDeactivated,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token has expired")]
    ExpiredToken,

    #[error("Authorization failed: {0}")]
    Authorization(String),

    #[error("No copies available")]
    NoCopiesAvailable,

    #[error("Item already returned")]
    AlreadyReturned,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Persistence fault: {0}")]
    Persistence(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, ErrorCode::BadValue, msg.clone())
            }
            // The register contract reports identity conflicts as 400, not 409
            AppError::Duplicate(msg) => {
                (StatusCode::BAD_REQUEST, ErrorCode::Duplicate, msg.clone())
            }
            AppError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, ErrorCode::NoSuchUser, msg.clone())
            }
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                ErrorCode::InvalidCredentials,
                "Invalid credentials. Please check your password.".to_string(),
            ),
            AppError::AccountDeactivated => (
                StatusCode::UNAUTHORIZED,
                ErrorCode::AccountDeactivated,
                "Account is deactivated".to_string(),
            ),
            AppError::InvalidToken(msg) => {
                (StatusCode::UNAUTHORIZED, ErrorCode::TokenInvalid, msg.clone())
            }
            AppError::ExpiredToken => (
                StatusCode::UNAUTHORIZED,
                ErrorCode::TokenExpired,
                "Token has expired".to_string(),
            ),
            AppError::Authorization(msg) => {
                (StatusCode::FORBIDDEN, ErrorCode::NotAuthorized, msg.clone())
            }
            AppError::NoCopiesAvailable => (
                StatusCode::CONFLICT,
                ErrorCode::NoCopiesAvailable,
                "No copies of this book are currently available".to_string(),
            ),
            AppError::AlreadyReturned => (
                StatusCode::CONFLICT,
                ErrorCode::AlreadyReturned,
                "This borrow has already been returned".to_string(),
            ),
            AppError::Conflict(msg) => {
                (StatusCode::CONFLICT, ErrorCode::Failure, msg.clone())
            }
            AppError::Persistence(msg) => {
                tracing::error!("Persistence fault: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::PersistenceFault,
                    "Internal server error".to_string(),
                )
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::DbFailure,
                    "Database error".to_string(),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::Failure,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
