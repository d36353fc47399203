use kid_core::chat::{ChatRequest, ConversationTurn};

use crate::util::{api_request, exit_error, read_json_from_file};

/// Load conversation history from a file or stdin ("-").
///
/// Accepts a bare array of turns or a full request body with
/// `conversationHistory`.
pub fn load_history(path: &str) -> Result<Vec<ConversationTurn>, String> {
    let value = read_json_from_file(path)?;
    let turns = match value {
        serde_json::Value::Object(mut body) => body
            .remove("conversationHistory")
            .unwrap_or(serde_json::Value::Array(Vec::new())),
        other => other,
    };
    serde_json::from_value(turns).map_err(|e| format!("Invalid conversation history in '{path}': {e}"))
}

pub async fn run(api_url: &str, message: &str, history: Option<&str>, raw: bool) -> i32 {
    let mut request = ChatRequest::new(message);
    if let Some(path) = history {
        let turns = load_history(path).unwrap_or_else(|e| {
            exit_error(&e, Some("History must be a JSON array of {\"role\", \"content\"} objects"))
        });
        request = request.with_history(turns);
    }

    let body = serde_json::to_value(&request)
        .unwrap_or_else(|e| exit_error(&format!("Failed to encode request: {e}"), None));

    api_request(api_url, reqwest::Method::POST, "/chat", Some(body), raw).await
}
