//! Error handling for the bookshelf HTTP layer

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use uuid::Uuid;

/// Standard error response format for all HTTP errors that carry a body
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    /// Human-readable description of the failure
    pub message: String,
    /// Offending input echoed back, when there is one
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub data: Option<Value>,
    /// Stable machine-readable error kind
    pub code: String,
    /// Identifier also written to the server log
    pub trace_id: String,
    /// RFC 3339 time the error was produced
    pub timestamp: String,
}

/// Application error kinds and their HTTP status
#[derive(Error, Debug)]
pub enum AppError {
    /// Request payload failed validation (400)
    #[error("validation error: {message}")]
    Validation { message: String, data: Option<Value> },

    /// Resource with the same identity already exists (400)
    #[error("duplicate: {message}")]
    Duplicate { message: String, data: Option<Value> },

    /// Malformed request or a store failure reported to the client (400)
    #[error("bad request: {message}")]
    BadRequest { message: String, data: Option<Value> },

    /// Nothing matched (404, empty body)
    #[error("not found")]
    NotFound,

    /// Infrastructure failure (500, no detail in the body)
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Create a validation error echoing the rejected value
    pub fn validation(message: impl Into<String>, data: Option<Value>) -> Self {
        Self::Validation {
            message: message.into(),
            data,
        }
    }

    /// Create a duplicate-resource error
    pub fn duplicate(message: impl Into<String>, data: Option<Value>) -> Self {
        Self::Duplicate {
            message: message.into(),
            data,
        }
    }

    /// Create a bad request error without detail
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
            data: None,
        }
    }

    /// Create a bad request error carrying the underlying error text
    pub fn bad_request_with(message: impl Into<String>, source: &dyn std::error::Error) -> Self {
        Self::BadRequest {
            message: message.into(),
            data: Some(Value::String(source.to_string())),
        }
    }

    /// Create an internal error from any error type
    pub fn internal(source: impl Into<anyhow::Error>) -> Self {
        Self::Internal(source.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } | AppError::Duplicate { .. } | AppError::BadRequest { .. } => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation { .. } => "validation_error",
            AppError::Duplicate { .. } => "already_exists",
            AppError::BadRequest { .. } => "bad_request",
            AppError::NotFound => "not_found",
            AppError::Internal(_) => "internal_error",
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::bad_request(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let error_id = Uuid::now_v7();
        let status = self.status();
        let code = self.code();

        let (message, data) = match self {
            AppError::Validation { message, data }
            | AppError::Duplicate { message, data }
            | AppError::BadRequest { message, data } => {
                tracing::warn!(
                    error_id = %error_id,
                    error_code = code,
                    status_code = status.as_u16(),
                    %message,
                    "request rejected"
                );
                (message, data)
            }
            AppError::NotFound => {
                tracing::debug!(error_id = %error_id, status_code = status.as_u16(), "not found");
                return status.into_response();
            }
            AppError::Internal(e) => {
                tracing::error!(
                    error_id = %error_id,
                    error_code = code,
                    status_code = status.as_u16(),
                    error = ?e,
                    "request error"
                );
                ("internal server error".to_string(), None)
            }
        };

        let now = OffsetDateTime::now_utc();
        let body = ErrorBody {
            message,
            data,
            code: code.to_string(),
            trace_id: error_id.to_string(),
            timestamp: now.format(&Rfc3339).unwrap_or_else(|_| now.to_string()),
        };

        (status, Json(body)).into_response()
    }
}
