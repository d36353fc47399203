use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kid_core::error::{self, ApiError};

use crate::backend::BackendError;

/// Internal error type that converts to structured API responses
#[derive(Debug)]
pub enum AppError {
    /// Client input error (400)
    Validation {
        message: String,
        field: Option<String>,
        details: Option<String>,
    },
    /// Backend could not produce a reply (500)
    BackendUnavailable(BackendError),
}

impl AppError {
    pub fn message_required() -> Self {
        AppError::Validation {
            message: "Message is required".to_string(),
            field: Some("message".to_string()),
            details: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let request_id = uuid::Uuid::now_v7().to_string();

        let (status, api_error) = match self {
            AppError::Validation {
                message,
                field,
                details,
            } => (
                StatusCode::BAD_REQUEST,
                ApiError {
                    error: message,
                    code: error::codes::VALIDATION_FAILED.to_string(),
                    details,
                    field,
                    request_id,
                },
            ),
            AppError::BackendUnavailable(err) => {
                tracing::error!(error = %err, request_id = %request_id, "backend call failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError {
                        error: "Failed to get AI response".to_string(),
                        code: error::codes::BACKEND_UNAVAILABLE.to_string(),
                        details: Some(err.to_string()),
                        field: None,
                        request_id,
                    },
                )
            }
        };

        (status, Json(api_error)).into_response()
    }
}

impl From<BackendError> for AppError {
    fn from(err: BackendError) -> Self {
        AppError::BackendUnavailable(err)
    }
}
