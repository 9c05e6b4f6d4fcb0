//! Error types for Bookshelf server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Authorization failed: {0}")]
    Authorization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error")]
    Validation(Vec<String>),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error message payload: a single message or a field-level message list
#[derive(Serialize, utoipa::ToSchema)]
#[serde(untagged)]
pub enum ErrorMessage {
    Single(String),
    Many(Vec<String>),
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub error: String,
    pub message: ErrorMessage,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Authentication(msg) => {
                (StatusCode::UNAUTHORIZED, ErrorMessage::Single(msg))
            }
            // An acting identity that no longer resolves to a real account is
            // reported the same way as a bad token.
            AppError::Authorization(msg) => {
                (StatusCode::UNAUTHORIZED, ErrorMessage::Single(msg))
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorMessage::Single(msg)),
            AppError::Validation(messages) => {
                (StatusCode::BAD_REQUEST, ErrorMessage::Many(messages))
            }
            AppError::Conflict(msg) => (StatusCode::BAD_REQUEST, ErrorMessage::Single(msg)),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ErrorMessage::Single(msg)),
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorMessage::Single("Database error".to_string()),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorMessage::Single("Internal server error".to_string()),
                )
            }
        };

        let body = Json(ErrorResponse {
            status_code: status.as_u16(),
            error: status.canonical_reason().unwrap_or("Unknown").to_string(),
            message,
        });

        (status, body).into_response()
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(msg) => msg.to_string(),
                    None => format!("{} is invalid", field),
                })
            })
            .collect();
        messages.sort();
        AppError::Validation(messages)
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
