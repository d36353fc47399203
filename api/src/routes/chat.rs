use axum::extract::State;
use axum::{Json, Router, routing::post};
use kid_core::chat::{ChatRequest, ChatResponse};

use crate::error::AppError;
use crate::extract::AppJson;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/chat", post(chat))
}

/// Answer one chat message.
///
/// The reply is routed to a response mode (clarification, information or
/// analysis) and checked against that mode's rules before it is returned.
#[utoipa::path(
    post,
    path = "/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Agent reply", body = ChatResponse),
        (status = 400, description = "Message missing, blank, or body is not JSON", body = kid_core::error::ApiError),
        (status = 429, description = "Rate limited", body = kid_core::error::ApiError),
        (status = 500, description = "Backend failed or timed out", body = kid_core::error::ApiError)
    ),
    tag = "chat"
)]
pub async fn chat(
    State(state): State<AppState>,
    AppJson(request): AppJson<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let reply = state.agent.respond(&request).await?;
    tracing::debug!(
        forwarded_turns = reply.forwarded_turns,
        identifier_source = ?reply.decision.identifier_source,
        adjusted = !reply.violations.is_empty(),
        "chat handled"
    );
    Ok(Json(reply.response))
}
