use serde::Serialize;
use utoipa::ToSchema;

/// Structured error body returned by every failing endpoint.
///
/// `error` is the human-readable summary the web client shows as-is
/// (e.g. "Message is required"); `code` is the stable machine identifier.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiError {
    /// Human-readable summary of what went wrong
    pub error: String,
    /// Machine-readable error code (e.g. "validation_failed", "backend_unavailable")
    pub code: String,
    /// Non-sensitive detail about the failure (backend errors, malformed bodies)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Which field caused the error (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Request ID for tracing and debugging
    pub request_id: String,
}

/// Error codes used across the API
pub mod codes {
    pub const VALIDATION_FAILED: &str = "validation_failed";
    pub const BACKEND_UNAVAILABLE: &str = "backend_unavailable";
    pub const INTERNAL_ERROR: &str = "internal_error";
    pub const RATE_LIMITED: &str = "rate_limited";
}
