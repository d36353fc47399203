//! Response-mode routing.
//!
//! Every turn is routed to exactly one of three modes from the latest message
//! and, optionally, identifiers the user already supplied earlier in the
//! forwarded history window. Routing is a pure function; nothing about a
//! previous turn's mode is remembered.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::chat::{ConversationTurn, TurnRole};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResponseMode {
    /// Not enough to go on: ask a short question back
    Clarification,
    /// Product usage or general question: answer like support staff
    Information,
    /// Explicit risk question about an identified subject: full template
    Analysis,
}

impl ResponseMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ResponseMode::Clarification => "clarification",
            ResponseMode::Information => "information",
            ResponseMode::Analysis => "analysis",
        }
    }
}

impl fmt::Display for ResponseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierKind {
    Url,
    Domain,
    EvmAddress,
    SolanaAddress,
    KnownProject,
}

/// A concrete reference to the subject of a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identifier {
    pub kind: IdentifierKind,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierSource {
    Message,
    History,
}

static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:https?://|www\.)[^\s<>()]+").expect("url pattern is valid")
});

static DOMAIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b[a-z0-9][a-z0-9-]*\.(?:io|xyz|finance|fi|app|com|org|net|exchange|network|money|trade|co|gg)\b",
    )
    .expect("domain pattern is valid")
});

static EVM_ADDRESS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b0x[0-9a-fA-F]{40}\b").expect("evm pattern is valid"));

static BASE58_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[1-9A-HJ-NP-Za-km-z]{32,44}\b").expect("base58 pattern is valid")
});

// Names that identify exactly one project. Short tickers that collide with
// everyday English or Indonesian words ("ada", "link", "near", "base") are left out.
static KNOWN_PROJECT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:bitcoin|btc|ethereum|eth|solana|bnb|binance coin|avalanche|avax|polygon|matic|arbitrum|optimism|cardano|polkadot|xrp|ripple|tron|trx|litecoin|ltc|dogecoin|doge|toncoin|aptos|sui|cosmos|atom|uniswap|aave|makerdao|lido|chainlink|pancakeswap|sushiswap|curve finance|compound finance|gmx|balancer|stargate|tether|usdt|usdc)\b",
    )
    .expect("project pattern is valid")
});

static RISK_INTENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:risk\w*|safe|safety|unsafe|scam\w*|rug\s*pull\w*|rugs?|honeypot\w*|legit\w*|trustworth\w*|fraud\w*|ponzi|analy[sz]\w*|audit\w*|aman|keamanan|risiko|resiko|berisiko|penipuan|menipu|tipu\w*|bahaya|berbahaya|analisis|analisa|cek\s+(?:keamanan|risiko|resiko|tokens?|koin|coins?|kontrak|contracts?|scam|legit\w*|proyek|projects?|airdrops?))\b",
    )
    .expect("risk pattern is valid")
});

static GENERAL_INTENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:middlekid|app|aplikasi|fitur|features?|how\s+(?:do|to|can|does)|what\s+is|what\s+are|what\s+can|cara|bagaimana|gimana|apa\s+itu|jelaskan|explain|help|bantu\w*|tutorial|dashboard|tab|portfolio|portofolio|track\w*|lacak|pantau|monitor\w*|nft\w*|positions?|posisi|whales?|paus|connect|hubungkan|search)\b",
    )
    .expect("general pattern is valid")
});

static ASSET_MENTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:\b(?:tokens?|coins?|koin|airdrops?|projects?|proyek|projek|contracts?|kontrak|meme\w*|presale|ico|launchpad)\b|\$[a-z][a-z0-9]{1,9}\b)",
    )
    .expect("asset pattern is valid")
});

static SCORE_REQUEST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:score|skor|rating|nilai)\b").expect("score pattern is valid")
});

/// Everything the router needs to know about one piece of text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MessageSignals {
    pub identifiers: Vec<Identifier>,
    pub risk_intent: bool,
    pub general_intent: bool,
    pub asset_mention: bool,
    pub score_requested: bool,
}

impl MessageSignals {
    pub fn extract(text: &str) -> Self {
        Self {
            identifiers: find_identifiers(text),
            risk_intent: RISK_INTENT_RE.is_match(text),
            general_intent: GENERAL_INTENT_RE.is_match(text),
            asset_mention: ASSET_MENTION_RE.is_match(text),
            score_requested: SCORE_REQUEST_RE.is_match(text),
        }
    }

    pub fn has_identifier(&self) -> bool {
        !self.identifiers.is_empty()
    }
}

fn find_identifiers(text: &str) -> Vec<Identifier> {
    let mut found = Vec::new();
    let mut push = |kind, value: &str| {
        if !found.iter().any(|i: &Identifier| i.value == value) {
            found.push(Identifier {
                kind,
                value: value.to_string(),
            });
        }
    };

    for m in URL_RE.find_iter(text) {
        push(IdentifierKind::Url, m.as_str());
    }
    for m in EVM_ADDRESS_RE.find_iter(text) {
        push(IdentifierKind::EvmAddress, m.as_str());
    }
    for m in DOMAIN_RE.find_iter(text) {
        if !URL_RE.is_match(text) || !text_has_url_containing(text, m.as_str()) {
            push(IdentifierKind::Domain, m.as_str());
        }
    }
    for m in BASE58_RE.find_iter(text) {
        let candidate = m.as_str();
        // Real addresses mix digits and letters; a 32+ letter word does not.
        let has_digit = candidate.chars().any(|c| c.is_ascii_digit());
        let has_alpha = candidate.chars().any(|c| c.is_ascii_alphabetic());
        if has_digit && has_alpha && !candidate.starts_with("0x") {
            push(IdentifierKind::SolanaAddress, candidate);
        }
    }
    for m in KNOWN_PROJECT_RE.find_iter(text) {
        push(IdentifierKind::KnownProject, &m.as_str().to_lowercase());
    }

    found
}

fn text_has_url_containing(text: &str, needle: &str) -> bool {
    URL_RE.find_iter(text).any(|url| url.as_str().contains(needle))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplatePolicy {
    Forbidden,
    Required,
}

/// What a reply in a given mode may and must contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReplyConstraints {
    pub mode: ResponseMode,
    /// Upper bound on sentences, if any
    pub max_sentences: Option<usize>,
    pub template: TemplatePolicy,
    pub score_allowed: bool,
    pub risk_label_allowed: bool,
}

impl ReplyConstraints {
    pub fn clarification() -> Self {
        Self {
            mode: ResponseMode::Clarification,
            max_sentences: Some(3),
            template: TemplatePolicy::Forbidden,
            score_allowed: false,
            risk_label_allowed: false,
        }
    }

    pub fn information(score_requested: bool) -> Self {
        Self {
            mode: ResponseMode::Information,
            max_sentences: None,
            template: TemplatePolicy::Forbidden,
            score_allowed: score_requested,
            risk_label_allowed: score_requested,
        }
    }

    pub fn analysis() -> Self {
        Self {
            mode: ResponseMode::Analysis,
            max_sentences: None,
            template: TemplatePolicy::Required,
            score_allowed: true,
            risk_label_allowed: true,
        }
    }
}

/// The router's verdict for one turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModeDecision {
    pub mode: ResponseMode,
    pub signals: MessageSignals,
    /// Where the identifier that enabled analysis came from, if any
    pub identifier_source: Option<IdentifierSource>,
    /// Identifiers found in earlier user turns of the window
    pub history_identifiers: Vec<Identifier>,
    pub constraints: ReplyConstraints,
}

impl ModeDecision {
    pub fn scoring_permitted(&self) -> bool {
        self.constraints.score_allowed
    }

    /// All identifiers available for this turn, message first.
    pub fn identifiers(&self) -> impl Iterator<Item = &Identifier> {
        self.signals
            .identifiers
            .iter()
            .chain(self.history_identifiers.iter())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ModeRouter {
    identifier_from_history: bool,
}

impl Default for ModeRouter {
    fn default() -> Self {
        Self {
            identifier_from_history: true,
        }
    }
}

impl ModeRouter {
    pub fn new(identifier_from_history: bool) -> Self {
        Self {
            identifier_from_history,
        }
    }

    /// Route one turn. `history` is the window that will be forwarded to the
    /// backend; only its user turns are scanned, and only for identifiers.
    pub fn route(&self, message: &str, history: &[&ConversationTurn]) -> ModeDecision {
        let signals = MessageSignals::extract(message);

        let history_identifiers: Vec<Identifier> = if self.identifier_from_history {
            history
                .iter()
                .filter(|turn| turn.role == TurnRole::User)
                .flat_map(|turn| find_identifiers(&turn.content))
                .collect()
        } else {
            Vec::new()
        };

        let identifier_source = if signals.has_identifier() {
            Some(IdentifierSource::Message)
        } else if !history_identifiers.is_empty() {
            Some(IdentifierSource::History)
        } else {
            None
        };
        let has_identifier = identifier_source.is_some();
        let needs_analysis =
            signals.risk_intent || (signals.asset_mention && !signals.general_intent);

        let mode = if !has_identifier && needs_analysis {
            ResponseMode::Clarification
        } else if signals.general_intent && !signals.risk_intent {
            ResponseMode::Information
        } else if signals.risk_intent && has_identifier {
            ResponseMode::Analysis
        } else {
            ResponseMode::Clarification
        };

        let constraints = match mode {
            ResponseMode::Clarification => ReplyConstraints::clarification(),
            ResponseMode::Information => ReplyConstraints::information(signals.score_requested),
            ResponseMode::Analysis => ReplyConstraints::analysis(),
        };

        ModeDecision {
            mode,
            signals,
            identifier_source,
            history_identifiers,
            constraints,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const USDC_BASE: &str = "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913";

    fn route(message: &str) -> ModeDecision {
        ModeRouter::default().route(message, &[])
    }

    #[test]
    fn detects_evm_address_and_url() {
        let signals =
            MessageSignals::extract(&format!("cek {USDC_BASE} di https://basescan.org/token"));
        let kinds: Vec<IdentifierKind> = signals.identifiers.iter().map(|i| i.kind).collect();
        assert!(kinds.contains(&IdentifierKind::EvmAddress));
        assert!(kinds.contains(&IdentifierKind::Url));
        assert!(!kinds.contains(&IdentifierKind::Domain));
    }

    #[test]
    fn detects_solana_address_but_not_long_words() {
        let signals = MessageSignals::extract("is EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v safe?");
        assert_eq!(signals.identifiers[0].kind, IdentifierKind::SolanaAddress);

        let signals =
            MessageSignals::extract("supercalifragilisticexpialidociousandthensome is a word");
        assert!(signals.identifiers.is_empty());
    }

    #[test]
    fn vague_scam_question_asks_for_clarification() {
        let decision = route("is this token a scam?");
        assert_eq!(decision.mode, ResponseMode::Clarification);
        assert!(!decision.scoring_permitted());
        assert_eq!(decision.constraints.max_sentences, Some(3));
    }

    #[test]
    fn indonesian_safety_question_without_identifier_asks_for_clarification() {
        let decision = route("token ini aman gak?");
        assert_eq!(decision.mode, ResponseMode::Clarification);
    }

    #[test]
    fn product_question_is_information() {
        let decision = route("Bagaimana cara melihat posisi DeFi saya di Middlekid?");
        assert_eq!(decision.mode, ResponseMode::Information);
        assert_eq!(decision.constraints.template, TemplatePolicy::Forbidden);
        assert!(!decision.scoring_permitted());
    }

    #[test]
    fn checking_something_in_the_app_is_information() {
        for message in [
            "Cara cek portfolio saya di Middlekid?",
            "Bagaimana cara cek posisi DeFi saya?",
        ] {
            let decision = route(message);
            assert!(!decision.signals.risk_intent, "{message}");
            assert_eq!(decision.mode, ResponseMode::Information, "{message}");
        }
    }

    #[test]
    fn checking_a_token_is_still_risk_intent() {
        assert!(MessageSignals::extract("tolong cek token ini").risk_intent);
        assert!(MessageSignals::extract("bisa cek keamanan kontraknya?").risk_intent);
        let decision = route(&format!("cek kontrak {USDC_BASE}"));
        assert_eq!(decision.mode, ResponseMode::Analysis);
    }

    #[test]
    fn greeting_defaults_to_clarification() {
        assert_eq!(route("halo").mode, ResponseMode::Clarification);
        assert_eq!(route("").mode, ResponseMode::Clarification);
    }

    #[test]
    fn risk_question_with_address_is_analysis() {
        let decision = route(&format!("Is {USDC_BASE} a scam?"));
        assert_eq!(decision.mode, ResponseMode::Analysis);
        assert_eq!(decision.identifier_source, Some(IdentifierSource::Message));
        assert!(decision.scoring_permitted());
        assert_eq!(decision.constraints.template, TemplatePolicy::Required);
    }

    #[test]
    fn risk_question_about_known_project_is_analysis() {
        let decision = route("How risky is Uniswap?");
        assert_eq!(decision.mode, ResponseMode::Analysis);
        assert_eq!(decision.signals.identifiers[0].value, "uniswap");
    }

    #[test]
    fn identifier_without_risk_question_is_not_assumed_to_be_analysis() {
        let decision = route(&format!("token {USDC_BASE}"));
        assert_eq!(decision.mode, ResponseMode::Clarification);
    }

    #[test]
    fn history_identifier_enables_analysis_when_allowed() {
        let earlier = ConversationTurn::user(format!("contract-nya {USDC_BASE}"));
        let reply = ConversationTurn::assistant("Apa yang ingin Anda ketahui?");
        let history = vec![&earlier, &reply];

        let decision = ModeRouter::new(true).route("apakah ini scam?", &history);
        assert_eq!(decision.mode, ResponseMode::Analysis);
        assert_eq!(decision.identifier_source, Some(IdentifierSource::History));
        assert_eq!(decision.identifiers().count(), 1);

        let decision = ModeRouter::new(false).route("apakah ini scam?", &history);
        assert_eq!(decision.mode, ResponseMode::Clarification);
    }

    #[test]
    fn assistant_turns_do_not_supply_identifiers() {
        let reply = ConversationTurn::assistant(format!("Contoh alamat: {USDC_BASE}"));
        let decision = ModeRouter::default().route("is it safe?", &[&reply]);
        assert_eq!(decision.mode, ResponseMode::Clarification);
    }

    #[test]
    fn information_allows_score_only_when_requested() {
        let decision = route("how does the health score feature work in the app?");
        assert_eq!(decision.mode, ResponseMode::Information);
        assert!(decision.scoring_permitted());
    }
}
