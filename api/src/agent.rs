//! Request-to-reply pipeline for one chat turn.

use std::sync::Arc;
use std::time::{Duration, Instant};

use kid_core::chat::{ChatRequest, ChatResponse, preview, recent_turns};
use kid_core::enforce::Violation;
use kid_core::mode::{ModeDecision, ModeRouter};
use kid_core::prompt::build_prompt;

use crate::backend::{BackendError, LlmBackend};
use crate::config::AppConfig;
use crate::error::AppError;

const LOG_PREVIEW_CHARS: usize = 100;

#[derive(Debug, Clone, Copy)]
pub struct AgentSettings {
    pub history_window: usize,
    pub backend_timeout: Duration,
    pub identifier_from_history: bool,
}

impl From<&AppConfig> for AgentSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            history_window: config.history_window,
            backend_timeout: config.backend_timeout,
            identifier_from_history: config.identifier_from_history,
        }
    }
}

/// A finished turn: the wire response plus what happened on the way.
#[derive(Debug)]
pub struct ChatReply {
    pub response: ChatResponse,
    pub decision: ModeDecision,
    pub forwarded_turns: usize,
    pub violations: Vec<Violation>,
}

pub struct KidAgent {
    backend: Arc<dyn LlmBackend>,
    router: ModeRouter,
    history_window: usize,
    backend_timeout: Duration,
}

impl KidAgent {
    pub fn new(backend: Arc<dyn LlmBackend>, settings: AgentSettings) -> Self {
        Self {
            backend,
            router: ModeRouter::new(settings.identifier_from_history),
            history_window: settings.history_window,
            backend_timeout: settings.backend_timeout,
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Validate, route, generate and enforce one turn. Exactly one backend
    /// call is made for a valid request and none for an invalid one.
    pub async fn respond(&self, request: &ChatRequest) -> Result<ChatReply, AppError> {
        let message = request.message().ok_or_else(AppError::message_required)?;
        let history = recent_turns(request.history(), self.history_window);
        let decision = self.router.route(message, &history);

        tracing::info!(
            preview = preview(message, LOG_PREVIEW_CHARS),
            mode = %decision.mode,
            history = history.len(),
            backend = self.backend.name(),
            "chat message received"
        );

        let prompt = build_prompt(&decision, &history, message);
        let started = Instant::now();
        let reply = tokio::time::timeout(self.backend_timeout, self.backend.complete(&prompt))
            .await
            .map_err(|_| BackendError::Timeout(self.backend_timeout))??;
        let latency_ms = started.elapsed().as_millis() as u64;

        if !reply.extracted {
            tracing::warn!(latency_ms, "backend reply had no extractable text");
            return Ok(ChatReply {
                response: ChatResponse {
                    response: reply.text,
                    mode: decision.mode,
                    assessment: None,
                },
                forwarded_turns: history.len(),
                decision,
                violations: Vec::new(),
            });
        }

        let enforced = decision.constraints.enforce(&reply.text);
        if !enforced.violations.is_empty() {
            tracing::warn!(
                mode = %decision.mode,
                violations = ?enforced.violations,
                "reply adjusted to mode constraints"
            );
        }

        tracing::info!(
            latency_ms,
            mode = %decision.mode,
            response = preview(&enforced.text, LOG_PREVIEW_CHARS),
            "chat reply ready"
        );

        Ok(ChatReply {
            response: ChatResponse {
                response: enforced.text,
                mode: decision.mode,
                assessment: enforced.assessment,
            },
            forwarded_turns: history.len(),
            decision,
            violations: enforced.violations,
        })
    }
}

#[cfg(test)]
mod tests {
    use kid_core::chat::ConversationTurn;
    use kid_core::enforce::{CLARIFICATION_FALLBACK, has_all_sections};
    use kid_core::mode::{IdentifierSource, ResponseMode};
    use kid_core::prompt::PromptRole;
    use kid_core::risk::RiskLevel;

    use super::*;
    use crate::backend::testing::{RecordingBackend, SlowBackend};
    use crate::backend::{BackendReply, EXTRACTION_PLACEHOLDER, OfflineBackend};

    fn settings(window: usize) -> AgentSettings {
        AgentSettings {
            history_window: window,
            backend_timeout: Duration::from_secs(5),
            identifier_from_history: true,
        }
    }

    fn agent_with(backend: Arc<RecordingBackend>, window: usize) -> KidAgent {
        KidAgent::new(backend, settings(window))
    }

    #[tokio::test]
    async fn blank_message_never_reaches_backend() {
        let backend = Arc::new(RecordingBackend::replying("unused"));
        let agent = agent_with(backend.clone(), 10);

        for request in [ChatRequest::default(), ChatRequest::new("   \n")] {
            let err = agent.respond(&request).await.expect_err("blank is rejected");
            assert!(matches!(err, AppError::Validation { .. }));
        }
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn only_the_configured_window_is_forwarded() {
        let backend = Arc::new(RecordingBackend::replying("Halo! Ada yang bisa saya bantu?"));
        let agent = agent_with(backend.clone(), 5);

        let history: Vec<ConversationTurn> = (0..12)
            .map(|i| {
                if i % 2 == 0 {
                    ConversationTurn::user(format!("pesan {i}"))
                } else {
                    ConversationTurn::assistant(format!("balasan {i}"))
                }
            })
            .collect();
        let reply = agent
            .respond(&ChatRequest::new("halo").with_history(history))
            .await
            .expect("valid request");
        assert_eq!(reply.forwarded_turns, 5);

        let prompt = backend.last_prompt().expect("backend called once");
        assert_eq!(backend.calls(), 1);
        assert_eq!(prompt.history_len(), 5);
        let forwarded: Vec<&str> = prompt
            .messages
            .iter()
            .filter(|m| m.role != PromptRole::System)
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(
            forwarded,
            vec!["balasan 7", "pesan 8", "balasan 9", "pesan 10", "balasan 11", "halo"]
        );
    }

    #[tokio::test]
    async fn timeout_becomes_backend_unavailable() {
        let agent = KidAgent::new(
            Arc::new(SlowBackend(Duration::from_secs(60))),
            AgentSettings {
                backend_timeout: Duration::from_millis(20),
                ..settings(10)
            },
        );
        let err = agent
            .respond(&ChatRequest::new("halo"))
            .await
            .expect_err("backend is too slow");
        match err {
            AppError::BackendUnavailable(BackendError::Timeout(limit)) => {
                assert_eq!(limit, Duration::from_millis(20));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn clarification_reply_with_score_is_replaced() {
        let backend = Arc::new(RecordingBackend::replying(
            "Kelihatannya aman. Score: 82 / 100. Risk Level: Low",
        ));
        let agent = agent_with(backend, 10);

        let reply = agent
            .respond(&ChatRequest::new("is this airdrop legit?"))
            .await
            .expect("valid request");
        assert_eq!(reply.response.mode, ResponseMode::Clarification);
        assert_eq!(reply.response.response, CLARIFICATION_FALLBACK);
        assert!(reply.response.assessment.is_none());
        assert!(!reply.violations.is_empty());
    }

    #[tokio::test]
    async fn identifier_from_history_enables_analysis() {
        let agent = KidAgent::new(Arc::new(OfflineBackend), settings(10));
        let history = vec![
            ConversationTurn::user("0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913"),
            ConversationTurn::assistant("Apa yang ingin Anda ketahui tentang kontrak ini?"),
        ];

        let reply = agent
            .respond(&ChatRequest::new("apakah ini scam?").with_history(history))
            .await
            .expect("valid request");
        assert_eq!(reply.decision.identifier_source, Some(IdentifierSource::History));
        assert_eq!(reply.response.mode, ResponseMode::Analysis);
        assert!(has_all_sections(&reply.response.response));
        assert_eq!(
            reply.response.assessment.map(|a| a.risk_level),
            Some(RiskLevel::High)
        );
    }

    #[tokio::test]
    async fn placeholder_is_returned_as_is() {
        let backend = Arc::new(RecordingBackend::with_reply(BackendReply::placeholder()));
        let agent = agent_with(backend, 10);

        let reply = agent
            .respond(&ChatRequest::new("Is uniswap safe?"))
            .await
            .expect("extraction failure is not an error");
        assert_eq!(reply.response.response, EXTRACTION_PLACEHOLDER);
        assert_eq!(reply.response.mode, ResponseMode::Analysis);
        assert!(reply.response.assessment.is_none());
    }
}
