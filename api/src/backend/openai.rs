//! OpenAI-compatible chat completions backend.

use async_trait::async_trait;
use kid_core::chat::preview;
use kid_core::prompt::{Prompt, PromptMessage};
use serde::Serialize;
use serde_json::Value;

use super::{BackendError, BackendReply, LlmBackend, ResponseAdapter};
use crate::config::OpenAiSettings;

/// Reads `choices[0].message.content`, either a string or a list of text parts.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChatCompletionsAdapter;

impl ResponseAdapter for ChatCompletionsAdapter {
    fn extract_text(&self, raw: &Value) -> Option<String> {
        let content = &raw["choices"][0]["message"]["content"];
        let text = match content {
            Value::String(text) => text.clone(),
            Value::Array(parts) => parts
                .iter()
                .filter_map(|part| part["text"].as_str())
                .collect::<Vec<_>>()
                .join(""),
            _ => return None,
        };
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [PromptMessage],
    temperature: f32,
    max_tokens: u32,
}

pub struct OpenAiBackend {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    adapter: ChatCompletionsAdapter,
}

impl OpenAiBackend {
    pub fn new(settings: &OpenAiSettings) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("kid-api/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| BackendError::Init(err.to_string()))?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/chat/completions",
                settings.base_url.as_str().trim_end_matches('/')
            ),
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            adapter: ChatCompletionsAdapter,
        })
    }
}

/// `error.message` from an OpenAI-style error body, else the body itself.
fn error_message(body: &str) -> String {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| value["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string());
    preview(&message, 200).to_string()
}

#[async_trait]
impl LlmBackend for OpenAiBackend {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn complete(&self, prompt: &Prompt) -> Result<BackendReply, BackendError> {
        let body = CompletionRequest {
            model: &self.model,
            messages: &prompt.messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| BackendError::Network(err.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                401 | 403 => BackendError::Auth {
                    status: status.as_u16(),
                },
                429 => BackendError::Quota,
                code => BackendError::Status {
                    status: code,
                    message: error_message(&text),
                },
            });
        }

        let raw: Value = response
            .json()
            .await
            .map_err(|err| BackendError::Decode(err.without_url().to_string()))?;

        if let Some(model) = raw["model"].as_str() {
            tracing::debug!(model, "completion received");
        }

        Ok(BackendReply::from_raw(&self.adapter, &raw))
    }
}
