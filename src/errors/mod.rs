//! Unified error handling with consistent API response envelope.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::media::MediaError;

/// Success envelope for JSON endpoints.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
    pub timestamp: DateTime<Utc>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Wrap a successful result in the envelope.
    pub fn success(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data,
            timestamp: Utc::now(),
        })
    }
}

/// Failure envelope: `{ success: false, error, message, details? }`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Plain acknowledgement returned by delete endpoints.
#[derive(Debug, Serialize)]
pub struct Ack {
    pub success: bool,
    pub message: String,
}

impl Ack {
    pub fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.into(),
        })
    }
}

/// Application error type mapping to HTTP status codes.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Media host error: {0}")]
    Upstream(#[from] MediaError),

    /// The blob reached the media host but its local record could not be written.
    #[error("Stored {file_url} remotely but failed to record it: {source}")]
    PersistedButUnindexed {
        file_url: String,
        source: sqlx::Error,
    },

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Check if this error represents a not-found condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if this error represents a rejected input.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Timeout(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Upstream(_)
            | AppError::PersistedButUnindexed { .. }
            | AppError::Database(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (code, message, details) = match &self {
            AppError::NotFound(msg) => ("NOT_FOUND", msg.clone(), None),
            AppError::Validation(msg) => ("VALIDATION_ERROR", msg.clone(), None),
            AppError::Unauthorized => (
                "UNAUTHORIZED",
                "Authentication required".to_string(),
                None,
            ),
            AppError::Forbidden(msg) => ("FORBIDDEN", msg.clone(), None),
            AppError::Conflict(msg) => ("CONFLICT", msg.clone(), None),
            AppError::Upstream(e) => {
                tracing::error!(error = %e, "Media host error");
                (
                    "UPSTREAM_ERROR",
                    "The media host rejected the request".to_string(),
                    None,
                )
            }
            AppError::PersistedButUnindexed { file_url, source } => {
                tracing::error!(
                    error = %source,
                    file_url = %file_url,
                    "File stored remotely but not recorded; manual reconciliation required"
                );
                (
                    "PERSISTED_BUT_UNINDEXED",
                    "File was uploaded but could not be recorded".to_string(),
                    Some(serde_json::json!({ "fileUrl": file_url })),
                )
            }
            AppError::Timeout(msg) => {
                tracing::error!(error = %msg, "Operation timed out");
                ("TIMEOUT", msg.clone(), None)
            }
            AppError::Database(e) => {
                tracing::error!(error = %e, "Database error");
                (
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = ErrorBody {
            success: false,
            error: code.to_string(),
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Map a unique-key violation to `Conflict`, everything else to `Database`.
pub fn conflict_on_unique(e: sqlx::Error, message: impl FnOnce() -> String) -> AppError {
    match e {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            AppError::Conflict(message())
        }
        sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
            AppError::NotFound(format!(
                "Referenced record does not exist ({})",
                db_err.constraint().unwrap_or("foreign key")
            ))
        }
        _ => AppError::Database(e),
    }
}
