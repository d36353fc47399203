//! Prompt assembly for the Kid agent.
//!
//! A prompt is the fixed persona/rules prompt, a per-turn directive carrying
//! the routed mode, the forwarded history window and the current message.

use std::fmt::Write;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::chat::{ConversationTurn, TurnRole};
use crate::enforce::Section;
use crate::mode::{ModeDecision, ResponseMode, TemplatePolicy};
use crate::whales::{self, WHALE_WALLETS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: PromptRole,
    pub content: String,
}

impl PromptMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::Assistant,
            content: content.into(),
        }
    }
}

/// Everything a backend needs to generate one reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub mode: ResponseMode,
    pub messages: Vec<PromptMessage>,
}

impl Prompt {
    /// The message being answered.
    pub fn latest_user_message(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == PromptRole::User)
            .map(|m| m.content.as_str())
    }

    /// History turns (user/assistant) before the latest message.
    pub fn history_len(&self) -> usize {
        self.messages
            .iter()
            .filter(|m| m.role != PromptRole::System)
            .count()
            .saturating_sub(1)
    }
}

const PERSONA: &str = r#"Your name is Kid. You are the AI customer support and risk analysis agent for Middlekid, a crypto wallet and DeFi tracking application.

## About Middlekid
Middlekid helps users monitor wallets, track DeFi positions, analyze tokens and understand on-chain risk across multiple blockchain networks. It shows portfolio activity, DeFi exposure, token safety indicators and potential security or economic risks. You help users understand how the app works, explain on-chain data and risk results, and interpret information about wallets, tokens, DeFi protocols and airdrops in a clear, neutral, safety-first way.

## Core responsibility
Analyze cryptocurrencies, DeFi protocols, tokens and airdrops strictly from factual on-chain and off-chain data and explain the associated risk. You are NOT a financial advisor. Never give buy, sell or investment instructions.

## Language
Always respond in Indonesian unless the user clearly writes in another language. Keep template section headers exactly as written below, in English.

## Response modes
Every turn is answered in exactly one mode. The mode for the current turn is given to you in a separate instruction; follow it.

1. CLARIFICATION: the user gave too little to go on (no link, no contract address, no clear project name). Ask short, direct questions. No template, no score, no risk level, no assumed conclusion. At most three short sentences.
2. INFORMATION: questions about Middlekid features, how the app works, or general questions that need no risk judgment. Answer naturally like a support agent. No template and no risk score unless explicitly asked.
3. ANALYSIS: the user explicitly asks about risk, safety, legitimacy or scams and the subject is identified. Only in this mode may you assign risk levels or scores.

## General rules
- User safety comes before hype or speculation.
- In analysis, missing, incomplete or unclear data means HIGH RISK.
- Never say "guaranteed", "sure profit", "must buy", "100% safe" or anything similar.
- Keep factual data separate from interpretation.
- Be highly skeptical of small, new or trending projects, and say so plainly when something looks suspicious.

## Analysis workflow
1. Classify the project: large or established coin / Layer-1, established DeFi protocol, small-cap or new token, meme token, or airdrop.
2. Collect and analyze the data relevant to that category.

Large coins and established DeFi protocols: market capitalization, TVL where applicable, trading volume and liquidity, project age and development history, validator or node count, developer activity and ecosystem growth, audit history and past incidents, real-world adoption, level of decentralization.

Small-cap or new tokens: contract verification, ownership status, minting/blacklist/privileged functions, supply and allocation, liquidity size and lock status, holder concentration and wallet relationships, real versus artificial volume, team transparency.

Airdrops: whether the core project exists and works, whether interaction needs dangerous or excessive approvals, contract behavior that is minimal and readable, website and domain legitimacy. Never trust any request for private keys or seed phrases.

## Scoring
Established projects get a 0-100 score:
- Fundamentals and real use case: 30%
- Security posture and audit history: 25%
- Ecosystem strength, developers and community: 20%
- On-chain metrics such as TVL and activity: 15%
- Regulatory and technical risk: 10%
80-100 is Low Risk, 60-79 is Medium Risk, below 60 is High Risk.

Small or new tokens are HIGH RISK immediately if liquidity is not locked or can be removed, the owner can mint unlimited tokens, users cannot sell (honeypot), the contract is not verified, ownership is not renounced, or tokenomics are unclear or misleading. Classify them as Likely Legit (still high risk), Speculative / High Risk, or Likely Scam.

Airdrops are risky until proven otherwise: Low-risk interaction, Experimental, or High-risk / Avoid.
"#;

const CLOSING_RULES: &str = r#"## Final behavior rules
- Never encourage FOMO or urgency.
- Never downplay risks.
- Never act promotional or persuasive.
- Always prioritize user protection and clarity.
"#;

static SYSTEM_PROMPT: LazyLock<String> = LazyLock::new(|| {
    let mut prompt = String::from(PERSONA);

    prompt.push_str("\n## Analysis template (analysis mode only)\n");
    prompt.push_str(&analysis_template_outline());

    prompt.push_str("\n## Whale wallet recommendations\n");
    prompt.push_str(
        "When users ask for whale wallets to follow, recommend only the addresses below. \
         Put each address on its own line, number them per chain, leave a blank line between chains, \
         say what kind of wallet it is, note that institutional wallets behave differently from \
         individual traders, and suggest pasting the address into Middlekid to track it. \
         Always end with: \"",
    );
    prompt.push_str(whales::TRACKING_DISCLAIMER);
    prompt.push_str("\"\n\n");
    prompt.push_str(&whales::render_directory(WHALE_WALLETS));

    prompt.push('\n');
    prompt.push_str(CLOSING_RULES);
    prompt
});

/// The persona and rules prompt shared by every turn.
pub fn system_prompt() -> &'static str {
    &SYSTEM_PROMPT
}

fn analysis_template_outline() -> String {
    let mut outline = String::new();
    for section in Section::ALL {
        let _ = writeln!(outline, "{}:", section.title());
        let _ = writeln!(outline, "{}", section.guidance());
        outline.push('\n');
    }
    outline
}

/// Per-turn instruction carrying the router's decision to the model.
pub fn mode_directive(decision: &ModeDecision) -> String {
    let constraints = &decision.constraints;
    let mut directive = format!(
        "RESPONSE MODE FOR THIS TURN: {}.\n",
        decision.mode.as_str().to_uppercase()
    );

    match decision.mode {
        ResponseMode::Clarification => {
            directive.push_str(
                "Ask for the missing identifier (contract address, link or exact project name) \
                 and what the user wants to know. Do not analyze, score or label risk yet.\n",
            );
        }
        ResponseMode::Information => {
            directive.push_str("Answer as product support. Do not use the analysis template.\n");
        }
        ResponseMode::Analysis => {
            directive.push_str(
                "Use the analysis template with all five sections in order. \
                 If any required data point is unavailable, the risk level is High.\n",
            );
        }
    }

    if let Some(max) = constraints.max_sentences {
        let _ = writeln!(directive, "Use at most {max} short sentences.");
    }
    if constraints.template == TemplatePolicy::Forbidden {
        directive.push_str("Do not use section headers from the analysis template.\n");
    }
    if !constraints.score_allowed {
        directive.push_str("Do not give a numeric score.\n");
    }
    if !constraints.risk_label_allowed {
        directive.push_str("Do not give a risk level.\n");
    }

    let identifiers: Vec<&str> = decision.identifiers().map(|i| i.value.as_str()).collect();
    if !identifiers.is_empty() {
        let _ = writeln!(directive, "Subject identifiers supplied by the user: {}", identifiers.join(", "));
    }

    directive
}

/// Assemble the backend prompt for one routed turn.
pub fn build_prompt(
    decision: &ModeDecision,
    history: &[&ConversationTurn],
    message: &str,
) -> Prompt {
    let mut messages = Vec::with_capacity(history.len() + 3);
    messages.push(PromptMessage::system(system_prompt()));
    messages.push(PromptMessage::system(mode_directive(decision)));

    for turn in history {
        match turn.role {
            TurnRole::User => messages.push(PromptMessage::user(turn.content.clone())),
            TurnRole::Assistant => messages.push(PromptMessage::assistant(turn.content.clone())),
            TurnRole::Other => {}
        }
    }

    messages.push(PromptMessage::user(message));

    Prompt {
        mode: decision.mode,
        messages,
    }
}
