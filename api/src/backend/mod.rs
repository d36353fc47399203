//! Text-generation backends behind a single trait.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use kid_core::prompt::Prompt;

use crate::config::BackendConfig;

pub mod offline;
pub mod openai;

pub use offline::OfflineBackend;
pub use openai::OpenAiBackend;

pub use kid_core::chat::EXTRACTION_PLACEHOLDER;

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("backend did not respond within {}s", .0.as_secs())]
    Timeout(Duration),
    #[error("backend rejected the configured credentials (HTTP {status})")]
    Auth { status: u16 },
    #[error("backend quota or rate limit exhausted (HTTP 429)")]
    Quota,
    #[error("backend returned HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("could not reach backend: {0}")]
    Network(String),
    #[error("backend response was not valid JSON: {0}")]
    Decode(String),
    #[error("backend could not be initialised: {0}")]
    Init(String),
}

/// One generated reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendReply {
    pub text: String,
    /// False when `text` is [`EXTRACTION_PLACEHOLDER`]
    pub extracted: bool,
}

impl BackendReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            extracted: true,
        }
    }

    pub fn placeholder() -> Self {
        Self {
            text: EXTRACTION_PLACEHOLDER.to_string(),
            extracted: false,
        }
    }

    /// Pull reply text out of a raw wire response.
    pub fn from_raw<A: ResponseAdapter + ?Sized>(adapter: &A, raw: &serde_json::Value) -> Self {
        match adapter.extract_text(raw) {
            Some(text) => Self::text(text),
            None => Self::placeholder(),
        }
    }
}

/// Knows where one wire format keeps the generated text.
pub trait ResponseAdapter: Send + Sync {
    fn extract_text(&self, raw: &serde_json::Value) -> Option<String>;
}

#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Short identifier reported by /health and in logs.
    fn name(&self) -> &'static str;

    async fn complete(&self, prompt: &Prompt) -> Result<BackendReply, BackendError>;
}

/// Construct the configured backend. Called once at startup.
pub fn build(config: &BackendConfig) -> Result<Arc<dyn LlmBackend>, BackendError> {
    let backend: Arc<dyn LlmBackend> = match config {
        BackendConfig::OpenAi(settings) => Arc::new(OpenAiBackend::new(settings)?),
        BackendConfig::Offline => Arc::new(OfflineBackend),
    };
    Ok(backend)
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-test backends.

    use std::sync::Mutex;

    use super::*;

    /// Returns a fixed reply and keeps every prompt it was given.
    pub struct RecordingBackend {
        reply: Result<BackendReply, fn() -> BackendError>,
        prompts: Mutex<Vec<Prompt>>,
    }

    impl RecordingBackend {
        pub fn replying(text: &str) -> Self {
            Self {
                reply: Ok(BackendReply::text(text)),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn with_reply(reply: BackendReply) -> Self {
            Self {
                reply: Ok(reply),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn failing(error: fn() -> BackendError) -> Self {
            Self {
                reply: Err(error),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> usize {
            self.prompts.lock().expect("prompt log poisoned").len()
        }

        pub fn last_prompt(&self) -> Option<Prompt> {
            self.prompts.lock().expect("prompt log poisoned").last().cloned()
        }
    }

    #[async_trait]
    impl LlmBackend for RecordingBackend {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn complete(&self, prompt: &Prompt) -> Result<BackendReply, BackendError> {
            self.prompts
                .lock()
                .expect("prompt log poisoned")
                .push(prompt.clone());
            match &self.reply {
                Ok(reply) => Ok(reply.clone()),
                Err(make_error) => Err(make_error()),
            }
        }
    }

    /// Never answers within any reasonable timeout.
    pub struct SlowBackend(pub Duration);

    #[async_trait]
    impl LlmBackend for SlowBackend {
        fn name(&self) -> &'static str {
            "slow"
        }

        async fn complete(&self, _prompt: &Prompt) -> Result<BackendReply, BackendError> {
            tokio::time::sleep(self.0).await;
            Ok(BackendReply::text("too late"))
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::config::AppConfig;

    struct FieldAdapter;

    impl ResponseAdapter for FieldAdapter {
        fn extract_text(&self, raw: &serde_json::Value) -> Option<String> {
            raw["text"].as_str().map(str::to_string)
        }
    }

    #[test]
    fn from_raw_falls_back_to_placeholder() {
        let reply = BackendReply::from_raw(&FieldAdapter, &json!({"text": "hai"}));
        assert_eq!(reply, BackendReply::text("hai"));

        let reply = BackendReply::from_raw(&FieldAdapter, &json!({"other": 1}));
        assert!(!reply.extracted);
        assert_eq!(reply.text, EXTRACTION_PLACEHOLDER);
    }

    #[test]
    fn build_follows_configuration() {
        let offline = AppConfig::from_lookup(|_| None).expect("defaults are valid");
        assert_eq!(build(&offline.backend).expect("offline builds").name(), "offline");

        let openai = AppConfig::from_lookup(|name| {
            (name == "OPENAI_API_KEY").then(|| "sk-test".to_string())
        })
        .expect("valid");
        assert_eq!(build(&openai.backend).expect("openai builds").name(), "openai");
    }

    #[test]
    fn error_messages_do_not_carry_credentials() {
        let message = BackendError::Auth { status: 401 }.to_string();
        assert_eq!(message, "backend rejected the configured credentials (HTTP 401)");
        assert_eq!(
            BackendError::Timeout(Duration::from_secs(30)).to_string(),
            "backend did not respond within 30s"
        );
    }
}
