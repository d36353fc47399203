use axum::Json;
use axum::http::{HeaderValue, Response, StatusCode};
use axum::response::IntoResponse;
use kid_core::error::{ApiError, codes};
use tower_governor::{
    GovernorError, GovernorLayer, governor::GovernorConfigBuilder,
    key_extractor::SmartIpKeyExtractor,
};

use crate::config::ConfigError;

pub type RateLimitLayer =
    GovernorLayer<SmartIpKeyExtractor, governor::middleware::NoOpMiddleware, axum::body::Body>;

/// Per-IP limit for POST /chat: `per_minute` sustained, `burst` at once.
pub fn chat_layer(per_minute: u32, burst: u32) -> Result<RateLimitLayer, ConfigError> {
    let replenish_ms = (60_000 / u64::from(per_minute.max(1))).max(1);

    let config = GovernorConfigBuilder::default()
        .per_millisecond(replenish_ms)
        .burst_size(burst)
        .key_extractor(SmartIpKeyExtractor)
        .finish()
        .ok_or_else(|| ConfigError::Invalid {
            name: "KID_CHAT_RATE_BURST",
            value: burst.to_string(),
            reason: "rate limit needs a non-zero burst and period".to_string(),
        })?;

    Ok(GovernorLayer::new(config).error_handler(json_error_handler))
}

/// JSON error body in the shared ApiError format, with Retry-After.
fn json_error_handler(err: GovernorError) -> Response<axum::body::Body> {
    let (status, retry_after, message) = match err {
        GovernorError::TooManyRequests { wait_time, .. } => (
            StatusCode::TOO_MANY_REQUESTS,
            Some(wait_time),
            "Too many requests".to_string(),
        ),
        GovernorError::UnableToExtractKey => (
            StatusCode::INTERNAL_SERVER_ERROR,
            None,
            "Unable to determine client identity for rate limiting".to_string(),
        ),
        GovernorError::Other { code, msg, .. } => (code, None, msg.unwrap_or_default()),
    };

    let details = retry_after.map(|secs| format!("Retry after {secs} seconds."));
    let code = if status == StatusCode::TOO_MANY_REQUESTS {
        codes::RATE_LIMITED
    } else {
        codes::INTERNAL_ERROR
    };
    let body = ApiError {
        error: message,
        code: code.to_string(),
        details,
        field: None,
        request_id: uuid::Uuid::now_v7().to_string(),
    };

    let mut response = (status, Json(body)).into_response();
    if let Some(secs) = retry_after {
        response
            .headers_mut()
            .insert("retry-after", HeaderValue::from(secs));
    }
    response
}
