use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;

use crate::platform::PlatformError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// Application-level failure taxonomy. Platform errors are classified into
/// one of these at the boundary; everything that maps to a 500 is answered
/// with a generic message so internal detail never reaches the client.
#[derive(Debug)]
pub enum AppError {
    Unauthenticated(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    BadRequest(String),
    Validation(Vec<String>),
    TooManyRequests(String),
    Storage(anyhow::Error),
    Database(anyhow::Error),
    Internal(anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::BadRequest(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::Storage(_) | AppError::Database(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

const GENERIC_SERVER_ERROR: &str = "An internal server error occurred.";

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (error_message, code, details) = match self {
            AppError::Unauthenticated(msg) => (msg, "UNAUTHORIZED", None),
            AppError::Forbidden(msg) => (msg, "FORBIDDEN", None),
            AppError::NotFound(msg) => (msg, "NOT_FOUND", None),
            AppError::Conflict(msg) => (msg, "CONFLICT", None),
            AppError::BadRequest(msg) => (msg, "BAD_REQUEST", None),
            AppError::Validation(errors) => (
                "Validation failed".to_string(),
                "VALIDATION_ERROR",
                Some(serde_json::json!({ "errors": errors })),
            ),
            AppError::TooManyRequests(msg) => (msg, "TOO_MANY_REQUESTS", None),
            AppError::Storage(err) => {
                tracing::error!("Storage error: {:?}", err);
                (GENERIC_SERVER_ERROR.to_string(), "STORAGE_ERROR", None)
            }
            AppError::Database(err) => {
                tracing::error!("Platform query error: {:?}", err);
                (GENERIC_SERVER_ERROR.to_string(), "DATABASE_ERROR", None)
            }
            AppError::Internal(err) => {
                tracing::error!("Internal server error: {:?}", err);
                (
                    GENERIC_SERVER_ERROR.to_string(),
                    "INTERNAL_SERVER_ERROR",
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_message,
            code: code.to_string(),
            details,
        });

        (status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}

impl From<PlatformError> for AppError {
    fn from(err: PlatformError) -> Self {
        match err {
            PlatformError::Api { status, .. } if status == 404 => {
                AppError::NotFound("Resource not found.".to_string())
            }
            PlatformError::Api { status, .. } if status == 429 => AppError::TooManyRequests(
                "Too many attempts. Please wait before trying again.".to_string(),
            ),
            ref api @ PlatformError::Api { .. } if api.is_unique_violation() => {
                AppError::Conflict("The resource already exists.".to_string())
            }
            PlatformError::RowNotFound => AppError::NotFound("Resource not found.".to_string()),
            PlatformError::Api { .. } => AppError::Database(err.into()),
            PlatformError::Transport(_) | PlatformError::Decode(_) => AppError::Internal(err.into()),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| {
                    let code = e.code.as_ref();
                    format!("{}: {}", field, code)
                })
            })
            .collect();
        AppError::Validation(messages)
    }
}
